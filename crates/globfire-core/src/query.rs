use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use geo::{Intersects, MultiPolygon, Polygon};
use geojson::GeoJson;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::feature::{AttrValue, Feature, FeatureCollection, IGNITION_DATE};

/// Upstream collection id of the GlobFire final perimeters.
pub const GLOBFIRE_FINAL_PERIMETERS: &str = "JRC/GWIS/GlobFire/v2/FinalPerimeters";

/// Epoch-millisecond interval with strict bounds on both ends.
///
/// Derived from a year as `(Jan 1 00:00, Dec 31 00:00)`. Note the upper
/// bound is the start of Dec 31, so Dec 31 ignitions are excluded. That
/// matches the upstream query exactly and is kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalWindow {
    after_ms: i64,
    before_ms: i64,
}

impl TemporalWindow {
    pub fn for_year(year: i32) -> Result<Self> {
        Ok(Self {
            after_ms: day_start_millis(year, 1, 1)?,
            before_ms: day_start_millis(year, 12, 31)?,
        })
    }

    pub fn accepts(&self, epoch_ms: i64) -> bool {
        epoch_ms > self.after_ms && epoch_ms < self.before_ms
    }
}

fn day_start_millis(year: i32, month: u32, day: u32) -> Result<i64> {
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| PipelineError::Config(format!("invalid date {}-{}-{}", year, month, day)))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| PipelineError::Config(format!("invalid midnight for {}", date)))?;
    Ok(midnight.and_utc().timestamp_millis())
}

/// What to ask a source for: which dataset, which ignition window, and the
/// region the geometry has to intersect.
#[derive(Debug, Clone)]
pub struct FeatureQuery {
    pub dataset: String,
    pub window: TemporalWindow,
    pub bounds: Polygon<f64>,
}

impl FeatureQuery {
    pub fn new(window: TemporalWindow, bounds: Polygon<f64>) -> Self {
        Self {
            dataset: GLOBFIRE_FINAL_PERIMETERS.to_string(),
            window,
            bounds,
        }
    }
}

/// A backend exposing the perimeter dataset. The in-memory implementation
/// below is the reference; a hosted backend slots in behind the same trait.
pub trait FeatureSource {
    fn query(&self, query: &FeatureQuery) -> Result<FeatureCollection>;
}

impl FeatureSource for FeatureCollection {
    fn query(&self, query: &FeatureQuery) -> Result<FeatureCollection> {
        let kept = self
            .features()
            .iter()
            .filter(|f| {
                // an attribute filter drops features lacking the attribute
                let ignited = match f.i64_attr(IGNITION_DATE) {
                    Ok(ms) => query.window.accepts(ms),
                    Err(_) => false,
                };
                ignited && f.geometry().intersects(&query.bounds)
            })
            .cloned()
            .collect();
        Ok(kept)
    }
}

/// Loads a GeoJSON FeatureCollection from disk and serves queries from it.
pub struct GeoJsonSource {
    path: PathBuf,
}

impl GeoJsonSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<FeatureCollection> {
        let raw = std::fs::read_to_string(&self.path)?;
        let geojson: GeoJson = raw.parse()?;
        let collection = collection_from_geojson(geojson)?;
        info!(
            path = %self.path.display(),
            features = collection.len(),
            "loaded perimeter dataset"
        );
        Ok(collection)
    }
}

impl FeatureSource for GeoJsonSource {
    fn query(&self, query: &FeatureQuery) -> Result<FeatureCollection> {
        self.load()?.query(query)
    }
}

fn collection_from_geojson(geojson: GeoJson) -> Result<FeatureCollection> {
    let GeoJson::FeatureCollection(fc) = geojson else {
        return Err(PipelineError::Geometry(
            "expected a GeoJSON FeatureCollection".to_string(),
        ));
    };

    let mut features = Vec::with_capacity(fc.features.len());
    for gj_feature in fc.features {
        let geometry = gj_feature
            .geometry
            .ok_or_else(|| PipelineError::Geometry("feature without geometry".to_string()))?;
        let multi_polygon = multi_polygon_from_geojson(geometry.value)?;

        let mut attributes = HashMap::new();
        if let Some(properties) = gj_feature.properties {
            for (name, value) in &properties {
                attributes.insert(name.clone(), AttrValue::from_json(value));
            }
        }
        features.push(Feature::new(multi_polygon, attributes));
    }
    Ok(FeatureCollection::new(features))
}

fn multi_polygon_from_geojson(value: geojson::Value) -> Result<MultiPolygon<f64>> {
    match value {
        geojson::Value::Polygon(_) => {
            let polygon: Polygon<f64> = value.try_into()?;
            Ok(MultiPolygon(vec![polygon]))
        }
        geojson::Value::MultiPolygon(_) => Ok(value.try_into()?),
        other => Err(PipelineError::Geometry(format!(
            "unsupported geometry type: {}",
            geometry_kind(&other)
        ))),
    }
}

fn geometry_kind(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}
