use bpmn_print::{ConvertOptions, pretty_print};
use clap::Parser;
use log::{LevelFilter, error, info};
use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    path::PathBuf,
    process::ExitCode,
};

extern crate pretty_env_logger;

/// Generate PDF reports from BPMN files.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Folder with the *.bpmn files
    input_folder: PathBuf,

    /// Folder for the generated PDF files, created when missing
    output_folder: PathBuf,

    /// Keep the rendered PNG diagrams next to the PDF files
    #[arg(short, long = "keep")]
    keep_png: bool,

    /// Diagram width in pixels above which the diagram page is landscape
    #[arg(
        short = 't',
        long = "diagram-landscape-threshold",
        value_name = "PIXELS",
        default_value_t = 2200
    )]
    landscape_threshold: u32,

    /// Graphviz dot executable
    #[arg(long, value_name = "PATH", env = "GRAPHVIZ_DOT", default_value = "dot")]
    dot: PathBuf,

    /// Debug log output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    fn options(&self) -> ConvertOptions {
        ConvertOptions {
            keep_png: self.keep_png,
            landscape_threshold: self.landscape_threshold,
            dot: self.dot.clone(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    pretty_env_logger::formatted_builder()
        .filter_level(cli.level())
        .parse_default_env()
        .init();

    let options = cli.options();
    let run = catch_unwind(AssertUnwindSafe(|| {
        pretty_print(&cli.input_folder, &cli.output_folder, &options)
    }));

    match run {
        Ok(Ok(summary)) => {
            info!("{summary}");
            if summary.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Ok(Err(err)) => {
            error!("{} error: {err}", err.kind());
            ExitCode::from(2)
        }
        Err(_) => {
            error!("Unexpected failure while generating reports");
            ExitCode::from(3)
        }
    }
}
