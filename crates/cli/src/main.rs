use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use treeviz_core::config::VizConfig;
use treeviz_core::export;
use treeviz_core::loader::{spawn_load, LoadMsg};
use treeviz_core::{DatasetKind, ViewController};

#[derive(Parser, Debug)]
#[command(name = "treeviz-cli", about = "Treemap renderer for the sales, movie and pledge datasets")]
struct Args {
    /// Dataset to render: video, movies or kickstarter
    #[arg(short, long, default_value = "video")]
    dataset: DatasetKind,
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Source for the video game dataset (URL or path)
    #[arg(long)]
    video: Option<String>,
    /// Source for the movie dataset (URL or path)
    #[arg(long)]
    movies: Option<String>,
    /// Source for the kickstarter dataset (URL or path)
    #[arg(long)]
    kickstarter: Option<String>,
    /// Output SVG path
    #[arg(long)]
    svg: Option<PathBuf>,
    /// Output JSON report path
    #[arg(short, long)]
    json: Option<PathBuf>,
    /// Output CSV path
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Output PDF path
    #[arg(long)]
    pdf: Option<PathBuf>,
}

fn main() -> ExitCode {
    treeviz_core::logging::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match VizConfig::from_path(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => VizConfig::default(),
    };
    for (kind, source) in [
        (DatasetKind::Video, &args.video),
        (DatasetKind::Movies, &args.movies),
        (DatasetKind::Kickstarter, &args.kickstarter),
    ] {
        if let Some(source) = source {
            config.sources.set(kind, source.clone());
        }
    }

    let (tx, rx) = crossbeam_channel::bounded::<LoadMsg>(1);
    spawn_load(config.sources.clone(), tx);
    let datasets = match rx.recv() {
        Ok(LoadMsg::Done(datasets)) => *datasets,
        Ok(LoadMsg::Error(e)) => {
            eprintln!("There was an error loading the data: {e}");
            return ExitCode::FAILURE;
        }
        Err(_) => {
            eprintln!("There was an error loading the data");
            return ExitCode::FAILURE;
        }
    };

    let mut view = match ViewController::new(datasets, &config) {
        Ok(view) => view,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = view.select(args.dataset) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    if let Err(e) = write_outputs(&args, &view) {
        eprintln!("export failed: {e}");
        return ExitCode::FAILURE;
    }

    println!(
        "Rendered {}: {} tiles, {} categories",
        view.canvas().title,
        view.leaves().len(),
        view.colors().len()
    );
    ExitCode::SUCCESS
}

fn write_outputs(args: &Args, view: &ViewController) -> Result<(), treeviz_core::Error> {
    use treeviz_core::error::ExportError;

    if let Some(path) = &args.svg {
        std::fs::write(path, export::to_svg(view.canvas())).map_err(ExportError::from)?;
        tracing::info!(path = %path.display(), "wrote svg");
    }
    if let Some(path) = &args.json {
        let json = serde_json::to_string_pretty(&export::to_json(view)).map_err(ExportError::from)?;
        std::fs::write(path, json).map_err(ExportError::from)?;
        tracing::info!(path = %path.display(), "wrote json");
    }
    if let Some(path) = &args.csv {
        let file = std::fs::File::create(path).map_err(ExportError::from)?;
        export::to_csv(view.leaves(), view.colors(), file)?;
        tracing::info!(path = %path.display(), "wrote csv");
    }
    if let Some(path) = &args.pdf {
        export::to_pdf(view.canvas(), path)?;
    }
    Ok(())
}
