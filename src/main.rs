//! assytics-graph - chart per-frame subtitle rendering statistics.
//!
//! Reads the CSV written by the libass profiler (assytics) and draws four
//! stacked time series: total bitmap size, largest bitmap size, bitmap
//! count and render time. The chart is saved to an image file or shown in
//! an interactive terminal viewer.

mod axis;
mod dataset;
mod display;
mod error;
mod figure;
mod plot;
mod summary;
mod timecode;

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use dataset::Dataset;
use figure::Figure;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use summary::Summary;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Graph data from libass_profiler_graph (assytics)
#[derive(Parser, Debug)]
#[command(name = "assytics-graph")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Name of the CSV file
    #[arg(short = 'i', long = "inputcsv", default_value = "statistics.csv")]
    input_csv: PathBuf,

    /// Output image file (png, jpg, bmp or svg); opens the viewer when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Major tick interval on the x axis in seconds
    #[arg(long, default_value = "180", value_parser = clap::value_parser!(u32).range(1..))]
    xtick_interval: u32,

    /// Print a per-column summary to stdout
    #[arg(long)]
    summary: bool,

    /// Write the per-column summary as JSON
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(args: &Args) -> Result<()> {
    // Reject an unusable output path before doing any work
    if let Some(ref output) = args.output {
        plot::ImageFormat::from_path(output)?;
    }

    info!(path = %args.input_csv.display(), "loading frame statistics");
    let dataset = Dataset::load(&args.input_csv)?;
    let figure = Figure::build(&dataset, args.xtick_interval)?;
    info!(
        frames = dataset.len(),
        start = figure.x_range.0,
        end = figure.x_range.1,
        "figure ready"
    );

    if args.summary || args.summary_json.is_some() {
        let summary = Summary::from_figure(&figure, dataset.title(), Local::now());
        if args.summary {
            summary.write_text(&mut io::stdout().lock())?;
        }
        if let Some(ref path) = args.summary_json {
            summary.write_json(path)?;
            eprintln!("Summary written to: {}", path.display());
        }
    }

    match args.output {
        Some(ref output) => {
            plot::save_figure(&figure, output)?;
            eprintln!("Chart saved to: {}", output.display());
        }
        None => display::show(&figure)?,
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["assytics-graph"]).unwrap();
        assert_eq!(args.input_csv, PathBuf::from("statistics.csv"));
        assert_eq!(args.output, None);
        assert_eq!(args.xtick_interval, 180);
        assert!(!args.summary);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn documented_flags() {
        let args = Args::try_parse_from([
            "assytics-graph",
            "-i",
            "run.csv",
            "-o",
            "run.png",
            "--xtick-interval",
            "60",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.input_csv, PathBuf::from("run.csv"));
        assert_eq!(args.output, Some(PathBuf::from("run.png")));
        assert_eq!(args.xtick_interval, 60);
        assert_eq!(args.verbose, 2);

        let long = Args::try_parse_from(["assytics-graph", "--inputcsv", "a.csv", "--output", "b.svg"])
            .unwrap();
        assert_eq!(long.input_csv, PathBuf::from("a.csv"));
        assert_eq!(long.output, Some(PathBuf::from("b.svg")));
    }

    #[test]
    fn zero_tick_interval_is_rejected() {
        assert!(Args::try_parse_from(["assytics-graph", "--xtick-interval", "0"]).is_err());
        assert!(Args::try_parse_from(["assytics-graph", "--xtick-interval", "abc"]).is_err());
    }

    #[test]
    fn malformed_row_fails_before_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("statistics.csv");
        let output = dir.path().join("chart.png");
        std::fs::write(&input, "t\nh\n0:00:00.00,1,2,3,0.1\n0:00:01.00,1,2,3\n").unwrap();

        let args = Args::try_parse_from([
            "assytics-graph",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .unwrap();

        let err = run(&args).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<error::StatsError>(),
            Some(error::StatsError::MalformedRow { found: 4, .. })
        ));
        assert!(!output.exists());
    }

    #[test]
    fn unsupported_output_fails_before_loading() {
        let args = Args::try_parse_from([
            "assytics-graph",
            "-i",
            "/nonexistent/statistics.csv",
            "-o",
            "chart.gif",
        ])
        .unwrap();
        let err = run(&args).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<error::StatsError>(),
            Some(error::StatsError::Argument(_))
        ));
    }
}
