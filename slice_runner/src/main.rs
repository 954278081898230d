use anyhow::{Context, Result};
use clap::Parser;
use flexi_logger::{Duplicate, FileSpec, Logger};
use fmri_slicer::batch;
use fmri_slicer::{DedupePolicy, ParallelPipeline, PipelineConfig};
use std::path::{Path, PathBuf};

/// Splits fMRI slice sheets into slices and counts activation clusters per slice.
#[derive(Parser, Debug)]
#[command(name = "slice_runner", version, about)]
struct Args {
    /// TOML configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the composite sheets
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output directory for cropped slices
    #[arg(long)]
    slices: Option<PathBuf>,

    /// Output directory for cluster images and CSV reports
    #[arg(long)]
    clusters: Option<PathBuf>,

    /// Only files ending with this suffix are processed
    #[arg(long)]
    suffix: Option<String>,

    /// Minimum pixels for a cluster to count
    #[arg(long)]
    min_pixels: Option<usize>,

    /// Resolve overlapping boxes in contour discovery order instead of by area
    #[arg(long, default_value_t = false)]
    discovery_order: bool,

    /// Worker count (0 = one per CPU)
    #[arg(long)]
    workers: Option<usize>,

    /// Log specification, e.g. "info" or "fmri_slicer=debug"
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Also write rotating log files into this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn setup_logging(spec: &str, log_dir: Option<&Path>) -> Result<flexi_logger::LoggerHandle> {
    let logger = Logger::try_with_str(spec).with_context(|| format!("invalid log specification '{spec}'"))?;
    let logger = match log_dir {
        Some(dir) => logger
            .log_to_file(FileSpec::default().directory(dir))
            .duplicate_to_stderr(Duplicate::All)
            .rotate(
                flexi_logger::Criterion::Size(1024 * 1024), //1MB
                flexi_logger::Naming::Timestamps,
                flexi_logger::Cleanup::KeepLogFiles(5),
            ),
        None => logger.log_to_stderr(),
    };
    logger.start().context("logger initialization failed")
}

fn load_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_toml_file(path)?,
        None => PipelineConfig::default(),
    };

    let batch = &mut config.batch;
    if let Some(input) = &args.input {
        batch.input_dir = input.to_string_lossy().into_owned();
    }
    if let Some(slices) = &args.slices {
        batch.slices_dir = slices.to_string_lossy().into_owned();
    }
    if let Some(clusters) = &args.clusters {
        batch.clusters_dir = clusters.to_string_lossy().into_owned();
    }
    if let Some(suffix) = &args.suffix {
        batch.file_suffix = suffix.clone();
    }
    if let Some(workers) = args.workers {
        batch.workers = workers;
    }
    if let Some(min_pixels) = args.min_pixels {
        config.clusters.min_pixels = min_pixels;
    }
    if args.discovery_order {
        config.slicer.dedupe_policy = DedupePolicy::DiscoveryOrder;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Argument Parsing & Setup ---
    let args = Args::parse();
    let _logger = setup_logging(&args.log_level, args.log_dir.as_deref())?;
    let config = load_config(&args)?;

    let input_dir = Path::new(&config.batch.input_dir);
    let slices_dir = Path::new(&config.batch.slices_dir);
    let clusters_dir = Path::new(&config.batch.clusters_dir);

    // --- 2. Output Directories ---
    batch::prepare_output_dir(slices_dir)?;
    batch::prepare_output_dir(clusters_dir)?;

    // --- 3. Sheet Discovery & Loading ---
    let paths = batch::discover_sheets(input_dir, &config.batch.file_suffix)
        .with_context(|| format!("cannot list sheets in '{}'", input_dir.display()))?;
    if paths.is_empty() {
        log::warn!(
            "no sheets ending in '{}' found in '{}'",
            config.batch.file_suffix,
            input_dir.display()
        );
        return Ok(());
    }

    let mut sheets = Vec::with_capacity(paths.len());
    for path in &paths {
        sheets.push(batch::load_sheet(path)?);
    }

    // --- 4. Parallel Processing ---
    let pipeline = ParallelPipeline::new(&config);
    log::info!("processing {} sheets on {} workers", sheets.len(), pipeline.worker_count());
    let reports = pipeline.process_batch(sheets).await?;
    pipeline.shutdown().await;

    // --- 5. Write Outputs ---
    for report in &reports {
        let report_path =
            batch::write_sheet_outputs(slices_dir, clusters_dir, report, &config.batch.image_extension)?;
        log::info!("wrote {}", report_path.display());
    }

    log::info!(
        "processing complete: {} sheets, {} slices",
        reports.len(),
        reports.iter().map(|report| report.slices.len()).sum::<usize>()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_defaults() {
        let args = Args::parse_from([
            "slice_runner",
            "--input",
            "sheets",
            "--min-pixels",
            "50",
            "--discovery-order",
            "--workers",
            "2",
        ]);
        let config = load_config(&args).expect("config");
        assert_eq!(config.batch.input_dir, "sheets");
        assert_eq!(config.batch.slices_dir, "Slices");
        assert_eq!(config.batch.workers, 2);
        assert_eq!(config.clusters.min_pixels, 50);
        assert_eq!(config.slicer.dedupe_policy, DedupePolicy::DiscoveryOrder);
    }

    #[test]
    fn no_flags_means_default_config() {
        let args = Args::parse_from(["slice_runner"]);
        assert_eq!(load_config(&args).expect("config"), PipelineConfig::default());
    }
}
