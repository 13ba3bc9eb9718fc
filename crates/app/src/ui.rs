use eframe::egui::{self, Align2, Color32, FontId, Id, LayerId, Order, Pos2, Rect, Stroke, Ui};
use treeviz_core::color::{Rgb, FALLBACK};
use treeviz_core::scene::Element;
use treeviz_core::{DatasetKind, ViewController};

use crate::state::AppState;

pub fn draw(app: &mut AppState, ctx: &egui::Context) {
    poll_load(app, ctx);

    if app.load_rx.is_some() {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.centered_and_justified(|ui| ui.spinner());
        });
        return;
    }

    // a failed load is terminal: no partial UI, no retry
    if let Some(err) = app.load_error.clone() {
        egui::CentralPanel::default().show(ctx, |_| {});
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("There was an error loading the data");
                ui.small(err);
            });
        return;
    }

    egui::TopBottomPanel::top("top").show(ctx, |ui| {
        top_bar(ui, app);
    });

    egui::CentralPanel::default().show(ctx, |ui| {
        egui::ScrollArea::both().show(ui, |ui| {
            let matches = app.matches.clone();
            if let Some(view) = app.view.as_mut() {
                ui.heading(view.canvas().title.as_str());
                ui.label(view.canvas().description.as_str());
                ui.add_space(8.0);
                treemap(ui, ctx, view, &matches);
            }
        });
    });
}

fn top_bar(ui: &mut Ui, app: &mut AppState) {
    ui.horizontal(|ui| {
        let active = app.view.as_ref().map(|v| v.active());
        for kind in DatasetKind::ALL {
            if ui
                .selectable_label(active == Some(kind), kind.title())
                .on_hover_text(kind.description())
                .clicked()
            {
                app.select(kind);
            }
        }
        ui.separator();
        ui.label("Search:");
        if ui.text_edit_singleline(&mut app.search).changed() {
            app.refresh_matches();
        }
        if let (Some(best), Some(view)) = (app.matches.first(), &app.view) {
            if let Some(leaf) = view.leaves().iter().find(|l| l.index == *best) {
                ui.label(format!("{} matches, best: {}", app.matches.len(), leaf.name));
            }
        }
        ui.separator();
        if ui.button("Export SVG").clicked() {
            let picked = rfd::FileDialog::new()
                .add_filter("SVG", &["svg"])
                .set_file_name(app.default_export_name())
                .save_file();
            if let Some(path) = picked {
                if let Err(e) = app.export_svg(&path) {
                    tracing::warn!(error = %e, "svg export failed");
                    app.status = Some(format!("Export failed: {e}"));
                }
            }
        }
        ui.checkbox(&mut app.open_after_export, "Open after export");
        if let Some(status) = &app.status {
            ui.separator();
            ui.label(status.as_str());
        }
    });
}

fn poll_load(app: &mut AppState, ctx: &egui::Context) {
    let Some(rx) = app.load_rx.take() else {
        return;
    };
    match rx.try_recv() {
        Ok(msg) => {
            app.finish_load(msg);
            ctx.request_repaint();
        }
        Err(crossbeam_channel::TryRecvError::Empty) => {
            app.load_rx = Some(rx);
            ctx.request_repaint();
        }
        Err(crossbeam_channel::TryRecvError::Disconnected) => {
            app.load_error = Some("loader stopped unexpectedly".into());
        }
    }
}

fn fill_of(el: &Element) -> Color32 {
    let c = el.get("fill").and_then(Rgb::from_hex).unwrap_or(FALLBACK);
    Color32::from_rgb(c.0, c.1, c.2)
}

/// CSS `rem`/`px` sizes to points, 1rem = 16px.
fn font_px(size: Option<&str>, default: f32) -> f32 {
    let Some(size) = size.map(str::trim) else {
        return default;
    };
    if let Some(rem) = size.strip_suffix("rem") {
        return rem.parse::<f32>().map(|r| r * 16.0).unwrap_or(default);
    }
    size.trim_end_matches("px").parse().unwrap_or(default)
}

fn treemap(ui: &mut Ui, ctx: &egui::Context, view: &mut ViewController, matches: &[usize]) {
    let canvas = view.canvas();
    let size = egui::vec2(canvas.width as f32, canvas.height as f32);
    let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());
    let origin = response.rect.min;
    let at = |x: f64, y: f64| origin + egui::vec2(x as f32, y as f32);

    for group in &canvas.children {
        let (gx, gy) = group.translation();
        let mut tile: Option<Rect> = None;
        for el in &group.children {
            match el.tag {
                "rect" => {
                    let min = at(gx + el.number("x", 0.0), gy + el.number("y", 0.0));
                    let r = Rect::from_min_size(
                        min,
                        egui::vec2(el.number("width", 0.0) as f32, el.number("height", 0.0) as f32),
                    );
                    painter.rect_filled(r, 0.0, fill_of(el));
                    if el.has_class("tile") {
                        let index = el.number("data-index", -1.0);
                        if matches.iter().any(|m| *m as f64 == index) {
                            painter.rect_stroke(r.shrink(1.0), 0.0, Stroke::new(2.0, Color32::BLACK));
                        }
                        tile = Some(r);
                    }
                }
                "text" if el.has_class("legend-label") => {
                    if let Some(text) = &el.text {
                        let pos = at(gx + el.number("x", 0.0), gy + el.number("y", 0.0));
                        painter.text(
                            pos,
                            Align2::LEFT_CENTER,
                            text,
                            FontId::proportional(font_px(el.get("font-size"), 16.0)),
                            ui.visuals().text_color(),
                        );
                    }
                }
                "text" => {
                    let Some(clip) = tile else { continue };
                    let clipped = painter.with_clip_rect(clip);
                    let mut y = gy + el.number("y", 0.0);
                    for span in &el.children {
                        let px = font_px(span.get("font-size"), 7.2);
                        let Some(word) = &span.text else { continue };
                        let pos = at(gx + span.number("x", 0.0), y);
                        clipped.text(
                            pos,
                            Align2::LEFT_TOP,
                            word,
                            FontId::proportional(px),
                            Color32::BLACK,
                        );
                        y += px as f64;
                    }
                }
                _ => {}
            }
        }
    }

    let now = ctx.input(|i| i.time);
    match response.hover_pos() {
        Some(pos) => {
            let local = pos - origin;
            view.pointer_move(local.x as f64, local.y as f64, now);
        }
        None => view.pointer_leave(now),
    }
    paint_tooltip(ctx, view, origin, now);
}

fn paint_tooltip(ctx: &egui::Context, view: &ViewController, origin: Pos2, now: f64) {
    let tooltip = view.tooltip();
    if tooltip.is_animating(now) {
        ctx.request_repaint();
    }
    let opacity = tooltip.opacity(now);
    let Some(content) = tooltip.content() else {
        return;
    };
    if opacity <= 0.0 {
        return;
    }

    let painter = ctx.layer_painter(LayerId::new(Order::Tooltip, Id::new("treemap-tooltip")));
    let (x, y) = tooltip.position();
    let pos = origin + egui::vec2(x as f32, y as f32);
    let galley = painter.layout_no_wrap(
        content.lines().join("\n"),
        FontId::proportional(13.0),
        Color32::BLACK.gamma_multiply(opacity),
    );
    let bg = Rect::from_min_size(pos, galley.size() + egui::vec2(16.0, 12.0));
    painter.rect_filled(
        bg.translate(egui::vec2(0.0, 4.0)),
        4.0,
        Color32::from_black_alpha(50).gamma_multiply(opacity),
    );
    painter.rect_filled(
        bg,
        4.0,
        Color32::from_rgb(255, 255, 224).gamma_multiply(opacity),
    );
    painter.galley(pos + egui::vec2(8.0, 6.0), galley, Color32::BLACK);
}
