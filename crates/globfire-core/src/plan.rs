use serde::{Deserialize, Serialize};
use tracing::info;

use crate::enrich;
use crate::error::Result;
use crate::feature::{FeatureCollection, AREA};
use crate::query::{FeatureQuery, FeatureSource, TemporalWindow};
use crate::region::conus_boundary;

/// Sentinel above which a computed area is considered degenerate
/// (self-intersecting or otherwise invalid perimeters).
pub const MAX_VALID_AREA: f64 = 1e20;

/// Run parameters. `min_size` is an exclusive lower bound in square meters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub year: i32,
    pub min_size: f64,
}

/// One per-feature transform or predicate. Every stage is a pure function of
/// a single feature, so applying a stage to a collection is independent of
/// per-feature order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stage {
    ComputeArea,
    KeepAreaAbove(f64),
    KeepAreaBelow(f64),
    ComputeCentroid,
    ComputeDates,
}

/// An immutable query-plus-stages plan. Building the plan performs no work;
/// `execute` evaluates it against a source.
#[derive(Debug, Clone)]
pub struct PipelinePlan {
    query: FeatureQuery,
    stages: Vec<Stage>,
}

impl PipelinePlan {
    /// The fixed GlobFire plan: year window and CONUS bounds, then area,
    /// area band, centroid, dates.
    pub fn for_config(config: &PipelineConfig) -> Result<Self> {
        let window = TemporalWindow::for_year(config.year)?;
        Ok(Self {
            query: FeatureQuery::new(window, conus_boundary()),
            stages: vec![
                Stage::ComputeArea,
                Stage::KeepAreaAbove(config.min_size),
                Stage::KeepAreaBelow(MAX_VALID_AREA),
                Stage::ComputeCentroid,
                Stage::ComputeDates,
            ],
        })
    }

    pub fn query(&self) -> &FeatureQuery {
        &self.query
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn execute(&self, source: &dyn FeatureSource) -> Result<FeatureCollection> {
        let mut collection = source.query(&self.query)?;
        let fetched = collection.len();
        for stage in &self.stages {
            collection = apply_stage(stage, collection)?;
        }
        info!(fetched, surviving = collection.len(), "pipeline plan executed");
        Ok(collection)
    }
}

fn apply_stage(stage: &Stage, collection: FeatureCollection) -> Result<FeatureCollection> {
    match stage {
        Stage::ComputeArea => Ok(collection.map_features(enrich::compute_area)),
        Stage::KeepAreaAbove(min) => Ok(collection
            .filter_features(|f| f.f64_attr(AREA).map(|a| a > *min).unwrap_or(false))),
        Stage::KeepAreaBelow(max) => Ok(collection
            .filter_features(|f| f.f64_attr(AREA).map(|a| a < *max).unwrap_or(false))),
        Stage::ComputeCentroid => collection.try_map_features(enrich::compute_centroid),
        Stage::ComputeDates => collection.try_map_features(enrich::compute_dates),
    }
}
