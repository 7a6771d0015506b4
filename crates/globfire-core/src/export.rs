use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::feature::{AttrValue, FeatureCollection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
}

impl ExportFormat {
    fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
        }
    }
}

/// Destination name for a run: `us_fire_<year>_<min_size>`, with `min_size`
/// rendered in plain decimal (`1e7` becomes `10000000`).
pub fn export_name(year: i32, min_size: f64) -> String {
    format!("us_fire_{}_{}", year, min_size)
}

/// One materialization request. Submitted once, then owned entirely by the
/// export worker.
#[derive(Debug)]
pub struct ExportJob {
    pub id: Uuid,
    pub name: String,
    pub format: ExportFormat,
    pub collection: FeatureCollection,
}

impl ExportJob {
    pub fn csv(name: String, collection: FeatureCollection) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            format: ExportFormat::Csv,
            collection,
        }
    }
}

/// Fire-and-forget submission handle. `submit` only reports whether the job
/// was accepted into the queue; job outcomes appear in the worker's logs and
/// are never returned to the submitter.
#[derive(Clone)]
pub struct ExportQueue {
    tx: mpsc::UnboundedSender<ExportJob>,
}

impl ExportQueue {
    pub fn submit(&self, job: ExportJob) -> Result<()> {
        let id = job.id;
        let name = job.name.clone();
        self.tx
            .send(job)
            .map_err(|_| PipelineError::Submit("export queue is closed".to_string()))?;
        info!(%id, %name, "export job queued");
        Ok(())
    }
}

/// Spawn the worker draining the export queue. The worker exits once every
/// submission handle has been dropped and the queue is empty.
pub fn spawn_export_worker(out_dir: PathBuf) -> (ExportQueue, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<ExportJob>();
    let handle = tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            match run_export(&out_dir, &job) {
                Ok(path) => info!(
                    id = %job.id,
                    path = %path.display(),
                    rows = job.collection.len(),
                    "export job succeeded"
                ),
                Err(err) => warn!(id = %job.id, name = %job.name, %err, "export job failed"),
            }
        }
    });
    (ExportQueue { tx }, handle)
}

fn run_export(out_dir: &Path, job: &ExportJob) -> Result<PathBuf> {
    let mut df = collection_to_dataframe(&job.collection)?;
    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(format!("{}.{}", job.name, job.format.extension()));
    let file = File::create(&path)?;
    match job.format {
        ExportFormat::Csv => {
            CsvWriter::new(file).include_header(true).finish(&mut df)?;
        }
    }
    Ok(path)
}

enum ColumnKind {
    Int,
    Float,
    Str,
}

/// One column per attribute name (sorted), one row per feature. Numeric
/// columns stay numeric; anything mixed or textual falls back to strings.
pub fn collection_to_dataframe(collection: &FeatureCollection) -> Result<DataFrame> {
    let names: BTreeSet<&str> = collection
        .features()
        .iter()
        .flat_map(|f| f.attributes().keys().map(String::as_str))
        .collect();

    let mut columns: Vec<Column> = Vec::with_capacity(names.len());
    for name in names {
        columns.push(build_column(collection, name).into());
    }
    Ok(DataFrame::new(columns)?)
}

fn build_column(collection: &FeatureCollection, name: &str) -> Series {
    let mut kind = ColumnKind::Int;
    for feature in collection.features() {
        match feature.attr(name) {
            Some(AttrValue::Int(_)) | None => {}
            Some(AttrValue::Float(_)) => {
                if matches!(kind, ColumnKind::Int) {
                    kind = ColumnKind::Float;
                }
            }
            Some(AttrValue::Text(_)) | Some(AttrValue::Date(_)) => {
                kind = ColumnKind::Str;
                break;
            }
        }
    }

    match kind {
        ColumnKind::Int => {
            let values: Vec<Option<i64>> = collection
                .features()
                .iter()
                .map(|f| match f.attr(name) {
                    Some(AttrValue::Int(v)) => Some(*v),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        ColumnKind::Float => {
            let values: Vec<Option<f64>> = collection
                .features()
                .iter()
                .map(|f| match f.attr(name) {
                    Some(AttrValue::Float(v)) => Some(*v),
                    Some(AttrValue::Int(v)) => Some(*v as f64),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        ColumnKind::Str => {
            let values: Vec<Option<String>> = collection
                .features()
                .iter()
                .map(|f| f.attr(name).map(|v| v.to_string()))
                .collect();
            Series::new(name.into(), values)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Feature, AREA, LAT, LON};
    use chrono::NaiveDate;
    use geo::{polygon, MultiPolygon};
    use std::collections::HashMap;

    fn sample_collection() -> FeatureCollection {
        let geometry = MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ]]);
        let feature = Feature::new(geometry, HashMap::new())
            .with_attr("Id", AttrValue::Int(17))
            .with_attr(AREA, AttrValue::Float(2e7))
            .with_attr(LON, AttrValue::Float(0.5))
            .with_attr(LAT, AttrValue::Float(0.5))
            .with_attr(
                "start_date",
                AttrValue::Date(NaiveDate::from_ymd_opt(2018, 6, 15).unwrap()),
            );
        FeatureCollection::new(vec![feature])
    }

    #[test]
    fn name_template_renders_min_size_as_plain_decimal() {
        assert_eq!(export_name(2018, 1e7), "us_fire_2018_10000000");
        assert_eq!(export_name(2020, 5e6), "us_fire_2020_5000000");
    }

    #[test]
    fn dataframe_has_one_sorted_column_per_attribute() {
        let df = collection_to_dataframe(&sample_collection()).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(
            df.get_column_names_str(),
            &["Id", AREA, LAT, LON, "start_date"]
        );
        assert_eq!(df.column(AREA).unwrap().f64().unwrap().get(0), Some(2e7));
        assert_eq!(df.column("Id").unwrap().i64().unwrap().get(0), Some(17));
        assert_eq!(
            df.column("start_date").unwrap().str().unwrap().get(0),
            Some("2018-06-15")
        );
    }

    #[tokio::test]
    async fn worker_writes_the_csv_and_exits_when_the_queue_closes() {
        let out_dir = std::env::temp_dir().join(format!("globfire-export-{}", Uuid::new_v4()));
        let (queue, worker) = spawn_export_worker(out_dir.clone());

        queue
            .submit(ExportJob::csv(
                export_name(2018, 1e7),
                sample_collection(),
            ))
            .unwrap();
        drop(queue);
        worker.await.unwrap();

        let path = out_dir.join("us_fire_2018_10000000.csv");
        let mut reader = csv::Reader::from_path(&path).expect("exported file readable");
        let headers = reader.headers().unwrap().clone();
        assert!(headers.iter().any(|h| h == AREA));
        assert!(headers.iter().any(|h| h == "start_date"));
        assert_eq!(reader.records().count(), 1);

        std::fs::remove_dir_all(&out_dir).ok();
    }
}
