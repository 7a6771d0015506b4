use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use globfire_core::export::{export_name, spawn_export_worker, ExportJob};
use globfire_core::plan::{PipelineConfig, PipelinePlan};
use globfire_core::query::GeoJsonSource;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Query GlobFire final perimeters for one year inside the contiguous USA,
/// enrich them with area/centroid/date attributes and export a CSV.
#[derive(Parser, Debug)]
#[command(author, version, about = "GlobFire perimeter export pipeline", long_about = None)]
struct Cli {
    /// Year selecting the ignition window (Jan 1 to Dec 31, both exclusive)
    #[arg(long, default_value_t = 2018)]
    year: i32,

    /// Minimum fire area in square meters (exclusive lower bound)
    #[arg(long, default_value_t = 1e7)]
    min_size: f64,

    /// GeoJSON file holding the perimeter dataset
    #[arg(long)]
    dataset: PathBuf,

    /// Directory the export worker writes CSV files into
    #[arg(long, default_value = "exports")]
    out_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig {
        year: cli.year,
        min_size: cli.min_size,
    };

    let plan = PipelinePlan::for_config(&config)?;
    let source = GeoJsonSource::new(cli.dataset);
    let collection = plan
        .execute(&source)
        .context("pipeline execution failed")?;
    info!(features = collection.len(), "submitting export");

    let (queue, worker) = spawn_export_worker(cli.out_dir);
    queue.submit(ExportJob::csv(
        export_name(config.year, config.min_size),
        collection,
    ))?;

    // drop our handle so the worker drains the queue and exits; outcomes are
    // only reported through the worker's logs
    drop(queue);
    worker.await?;
    Ok(())
}
