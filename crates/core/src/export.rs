use std::fmt::Write as _;

use crate::color::{ColorMap, Rgb, FALLBACK};
use crate::error::ExportError;
use crate::scene::{num, Canvas, Element};
use crate::treemap::PositionedLeaf;
use crate::view::ViewController;

pub fn to_svg(canvas: &Canvas) -> String {
    let mut out = String::with_capacity(64 * 1024);
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}">"#,
        num(canvas.width),
        num(canvas.height)
    );
    out.push_str("<title>");
    escape_xml_into(&mut out, &canvas.title);
    out.push_str("</title><desc>");
    escape_xml_into(&mut out, &canvas.description);
    out.push_str("</desc>");
    for el in &canvas.children {
        write_element(&mut out, el);
    }
    out.push_str("</svg>\n");
    out
}

fn write_element(out: &mut String, el: &Element) {
    out.push('<');
    out.push_str(el.tag);
    for (k, v) in &el.attrs {
        out.push(' ');
        out.push_str(k);
        out.push_str("=\"");
        escape_xml_into(out, v);
        out.push('"');
    }
    if el.text.is_none() && el.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    if let Some(text) = &el.text {
        escape_xml_into(out, text);
    }
    for c in &el.children {
        write_element(out, c);
    }
    out.push_str("</");
    out.push_str(el.tag);
    out.push('>');
}

fn escape_xml_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}

pub fn to_json(view: &ViewController) -> serde_json::Value {
    let kind = view.active();
    let dataset = view.dataset(kind);
    serde_json::json!({
        "dataset": kind.key(),
        "title": dataset.title(),
        "description": dataset.description(),
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "width": view.canvas().width,
        "height": view.canvas().height,
        "leaves": view.leaves().iter().map(|l| serde_json::json!({
            "index": l.index,
            "name": l.name,
            "category": l.category,
            "value": l.value_text(),
            "weight": l.aggregate_value,
            "rect": l.rect,
            "fill": view.colors().for_category(l.category.as_deref()),
        })).collect::<Vec<_>>(),
        "legend": view.colors().entries().map(|(name, color)| serde_json::json!({
            "category": name,
            "fill": color,
        })).collect::<Vec<_>>(),
    })
}

pub fn to_csv(
    leaves: &[PositionedLeaf],
    colors: &ColorMap,
    mut w: impl std::io::Write,
) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(&mut w);
    writer.write_record(["index", "name", "category", "value", "x0", "y0", "x1", "y1", "fill"])?;
    for l in leaves {
        writer.write_record([
            l.index.to_string(),
            l.name.clone(),
            l.category.clone().unwrap_or_default(),
            l.value_text(),
            num(l.rect.x0),
            num(l.rect.y0),
            num(l.rect.x1),
            num(l.rect.y1),
            colors.for_category(l.category.as_deref()).to_hex(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Canvas pixels at 96 dpi.
const PX_TO_MM: f64 = 25.4 / 96.0;

pub fn to_pdf(canvas: &Canvas, out: &std::path::Path) -> Result<(), ExportError> {
    use printpdf::{path::PaintMode, BuiltinFont, Color, Mm, PdfDocument};

    let pdf = |e: printpdf::Error| ExportError::Pdf(e.to_string());
    let page_w = canvas.width * PX_TO_MM;
    let page_h = canvas.height * PX_TO_MM;
    let (doc, page1, layer1) = PdfDocument::new(
        canvas.title.as_str(),
        Mm(page_w as f32),
        Mm(page_h as f32),
        "Treemap",
    );
    let layer = doc.get_page(page1).get_layer(layer1);
    let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf)?;

    // pdf origin is bottom-left
    let rect_mm = |x: f64, y: f64, w: f64, h: f64| {
        printpdf::Rect::new(
            Mm((x * PX_TO_MM) as f32),
            Mm((page_h - (y + h) * PX_TO_MM) as f32),
            Mm(((x + w) * PX_TO_MM) as f32),
            Mm((page_h - y * PX_TO_MM) as f32),
        )
        .with_mode(PaintMode::Fill)
    };
    let fill = |el: &Element| {
        let c = el.get("fill").and_then(Rgb::from_hex).unwrap_or(FALLBACK);
        Color::Rgb(printpdf::Rgb::new(
            c.0 as f32 / 255.0,
            c.1 as f32 / 255.0,
            c.2 as f32 / 255.0,
            None,
        ))
    };
    let black = Color::Rgb(printpdf::Rgb::new(0.0, 0.0, 0.0, None));

    for group in &canvas.children {
        let (gx, gy) = group.translation();
        for el in &group.children {
            match el.tag {
                "rect" => {
                    let w = el.number("width", 0.0);
                    let h = el.number("height", 0.0);
                    if w <= 0.0 || h <= 0.0 {
                        continue;
                    }
                    let x = gx + el.number("x", 0.0);
                    let y = gy + el.number("y", 0.0);
                    layer.set_fill_color(fill(el));
                    layer.add_rect(rect_mm(x, y, w, h));
                }
                "text" if el.has_class("legend-label") => {
                    let x = gx + el.number("x", 0.0);
                    let y = gy + el.number("y", 0.0);
                    layer.set_fill_color(black.clone());
                    if let Some(text) = &el.text {
                        layer.use_text(
                            text.as_str(),
                            10.0,
                            Mm((x * PX_TO_MM) as f32),
                            Mm((page_h - y * PX_TO_MM) as f32),
                            &font,
                        );
                    }
                }
                _ => {}
            }
        }
    }

    layer.set_fill_color(black);
    layer.use_text(canvas.title.as_str(), 14.0, Mm(5.0), Mm((page_h - 8.0) as f32), &font);

    let file = std::fs::File::create(out)?;
    let mut buf = std::io::BufWriter::new(file);
    doc.save(&mut buf).map_err(pdf)?;
    tracing::info!(path = %out.display(), "wrote pdf");
    Ok(())
}
