//! spotdiff CLI — command-line front end for the spot-the-difference core.

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use spotdiff::{
    CompareConfig, CompareOutcome, Comparator, Rect, ScoredBox, Settings,
    DEFAULT_MIN_AREA_PERCENT,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "spotdiff")]
#[command(about = "Find the rectangular regions where two photos of the same scene differ")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two images and report difference regions.
    Compare(CliCompareArgs),
}

#[derive(Debug, Clone, Args)]
struct CliCompareArgs {
    /// Path to the left (reference) image.
    #[arg(long)]
    left: PathBuf,

    /// Path to the right image.
    #[arg(long)]
    right: PathBuf,

    /// Path to write comparison results (JSON).
    #[arg(long)]
    out: PathBuf,

    /// Normalized left crop as `left,top,width,height` in 0..1.
    #[arg(long)]
    left_crop: Option<String>,

    /// Normalized right crop as `left,top,width,height` in 0..1.
    #[arg(long)]
    right_crop: Option<String>,

    /// Detection precision level (1..=7, higher is more permissive).
    #[arg(long, default_value = "3")]
    precision: u8,

    /// Minimum region area as a percentage of the analysis area.
    #[arg(long, default_value_t = DEFAULT_MIN_AREA_PERCENT)]
    min_area_percent: f32,

    /// Optional path to write the normalized difference map as a PNG.
    #[arg(long)]
    diff_map_out: Option<PathBuf>,
}

/// JSON output schema: boxes plus the overlay scaling context.
#[derive(Debug, Serialize)]
struct CompareReport<'a> {
    boxes: &'a [ScoredBox],
    analysis_size: [u32; 2],
    alignment: &'a spotdiff::AlignmentReport,
    left_crop: spotdiff::IntRect,
    right_crop: spotdiff::IntRect,
}

fn parse_crop(spec: &str) -> CliResult<Rect> {
    let parts: Vec<f32> = spec
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid crop `{}`: {}", spec, e))?;
    if parts.len() != 4 {
        return Err(format!("crop `{}` must have 4 comma-separated values", spec).into());
    }
    Ok(Rect::new(parts[0], parts[1], parts[2], parts[3]))
}

fn write_diff_map_png(outcome: &CompareOutcome, path: &PathBuf) -> CliResult<()> {
    let map = &outcome.diff_map;
    let img = image::GrayImage::from_fn(map.width, map.height, |x, y| {
        image::Luma([(map.at(x, y).clamp(0.0, 1.0) * 255.0).round() as u8])
    });
    img.save(path)?;
    tracing::info!("Difference map written to {}", path.display());
    Ok(())
}

fn run_compare(args: &CliCompareArgs) -> CliResult<()> {
    let left = image::open(&args.left)?.to_rgba8();
    let right = image::open(&args.right)?.to_rgba8();
    tracing::info!(
        "Comparing {} ({}x{}) against {} ({}x{})",
        args.left.display(),
        left.width(),
        left.height(),
        args.right.display(),
        right.width(),
        right.height(),
    );

    let left_crop = match &args.left_crop {
        Some(spec) => parse_crop(spec)?,
        None => Rect::FULL,
    };
    let right_crop = match &args.right_crop {
        Some(spec) => parse_crop(spec)?,
        None => Rect::FULL,
    };

    let settings = Settings::new(args.precision, args.min_area_percent)?;
    let comparator = Comparator::with_config(CompareConfig::default());
    let outcome = comparator.compare_with_crops(&left, left_crop, &right, right_crop, settings)?;

    tracing::info!(
        "Found {} difference regions (alignment degraded: {})",
        outcome.boxes.len(),
        outcome.alignment.degraded,
    );

    let report = CompareReport {
        boxes: &outcome.boxes,
        analysis_size: outcome.analysis_size,
        alignment: &outcome.alignment,
        left_crop: outcome.left_crop,
        right_crop: outcome.right_crop,
    };
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&args.out, &json)?;
    tracing::info!("Results written to {}", args.out.display());

    if let Some(path) = &args.diff_map_out {
        write_diff_map_png(&outcome, path)?;
    }

    Ok(())
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compare(args) => run_compare(&args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_spec_parses_four_fields() {
        let r = parse_crop("0.1, 0.2, 0.5, 0.4").unwrap();
        assert!((r.left - 0.1).abs() < 1e-6);
        assert!((r.height - 0.4).abs() < 1e-6);
    }

    #[test]
    fn malformed_crop_specs_are_rejected() {
        assert!(parse_crop("0.1,0.2,0.5").is_err());
        assert!(parse_crop("a,b,c,d").is_err());
    }
}
