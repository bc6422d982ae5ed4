//! Solar System orbit plotter
//!
//! Fetches the most recent full orbit of every planet from JPL Horizons and
//! writes an inclined projection of the system for the given date.
//!
//! Usage:
//!   cargo run --bin orrery -- --date 2023-10-10 [--format png] [--export-json orbits.json]

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};

use clap::Parser;
use log::info;
use orrery::horizons::{get_cache_dir, CachedSource, EphemerisSource, HorizonsClient};
use orrery::orbit::{parse_reference_date, OrbitDataset};
use orrery::render::{render_to_file, OutputFormat, PlotConfig};
use orrery::{OrreryError, Result};

/// Solar System orbit plotter
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Plots the last full orbit of each planet from JPL Horizons ephemerides",
    long_about = None
)]
struct Args {
    /// Reference date (YYYY-MM-DD); defaults to today
    #[arg(short, long)]
    date: Option<String>,

    /// Tilt of the ecliptic in degrees, 0 for face on
    #[arg(short, long, default_value_t = 55.0)]
    inclination: f64,

    /// Power applied to semi-major axes when scaling orbits; 1 is linear
    #[arg(short = 'k', long, default_value_t = 0.2)]
    scale_power: f64,

    /// Figure width in inches
    #[arg(long, default_value_t = 9.0)]
    figsize: f64,

    /// Output image format (svg or png)
    #[arg(short, long, default_value_t = OutputFormat::Svg)]
    format: OutputFormat,

    /// Directory to write the figure into
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Always query Horizons instead of reusing cached responses
    #[arg(long)]
    no_cache: bool,

    /// Cache directory (default: ~/.cache/orrery)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Retries per request after a transfer failure
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Also write the orbit coordinates as JSON
    #[arg(long)]
    export_json: Option<PathBuf>,
}

/// Message printed when a run fails
fn error_message(err: &OrreryError) -> String {
    format!("Error: {}", err)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match run(&args) {
        Ok(path) => println!("{}", path.display()),
        Err(err) => {
            eprintln!("{}", error_message(&err));
            process::exit(1);
        }
    }
}

/// Build the dataset and render it, returning the figure's path
fn run(args: &Args) -> Result<PathBuf> {
    let reference_date = match &args.date {
        Some(date) => parse_reference_date(date)?,
        None => chrono::Local::now().date_naive(),
    };

    let config = PlotConfig {
        inclination_deg: args.inclination,
        scale_power: args.scale_power,
        fig_width_in: args.figsize,
        ..PlotConfig::default()
    };
    config.validate()?;

    let client = HorizonsClient::new()?.with_retries(args.retries, Duration::from_secs(1));
    let source: Box<dyn EphemerisSource> = if args.no_cache {
        Box::new(client)
    } else {
        let dir = args.cache_dir.clone().unwrap_or_else(get_cache_dir);
        Box::new(CachedSource::new(client).with_cache_dir(dir))
    };

    let start_time = Instant::now();
    let dataset = OrbitDataset::build(reference_date, &source)?;
    info!("Dataset ready in {:.2?}", start_time.elapsed());

    if let Some(json_path) = &args.export_json {
        dataset.write_json(BufWriter::new(File::create(json_path)?))?;
        info!("Exported coordinates to {}", json_path.display());
    }

    render_to_file(&dataset, &config, &args.output_dir, args.format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery::Body;

    #[test]
    fn test_error_message_uses_display() {
        let err = OrreryError::InsufficientData {
            body: Body::Saturn,
            expected: 1074,
            received: 12,
        };
        let msg = error_message(&err);
        assert!(msg.starts_with("Error: Insufficient data for body 6 (Saturn)"));
        assert!(!msg.contains("InsufficientData {"), "{}", msg);
    }

    #[test]
    fn test_invalid_date_fails_run() {
        let args = Args::parse_from(["orrery", "--date", "2023-13-40", "--no-cache"]);
        match run(&args) {
            Err(err @ OrreryError::InvalidDate(_)) => {
                assert!(error_message(&err).starts_with("Error: Invalid date:"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
