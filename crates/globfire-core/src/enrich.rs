use chrono::{DateTime, NaiveDate};
use geo::{Centroid, GeodesicArea};

use crate::error::{PipelineError, Result};
use crate::feature::{
    AttrValue, Feature, AREA, END_DATE, EXTINGUISH_DATE, IGNITION_DATE, LAT, LON, START_DATE,
};

/// Set `area` to the geodesic area of the perimeter in square meters.
pub fn compute_area(feature: Feature) -> Feature {
    let area = feature.geometry().geodesic_area_unsigned();
    feature.with_attr(AREA, AttrValue::Float(area))
}

/// Set `lon`/`lat` to the perimeter centroid coordinates.
pub fn compute_centroid(feature: Feature) -> Result<Feature> {
    let centroid = feature
        .geometry()
        .centroid()
        .ok_or_else(|| PipelineError::Geometry("empty geometry has no centroid".to_string()))?;
    Ok(feature
        .with_attr(LON, AttrValue::Float(centroid.x()))
        .with_attr(LAT, AttrValue::Float(centroid.y())))
}

/// Parse the `IDate`/`FDate` epoch-millisecond attributes into typed
/// `start_date`/`end_date` values. A feature without parseable timestamps is
/// an upstream data defect and fails the run.
pub fn compute_dates(feature: Feature) -> Result<Feature> {
    let start = date_from_millis(feature.i64_attr(IGNITION_DATE)?)?;
    let end = date_from_millis(feature.i64_attr(EXTINGUISH_DATE)?)?;
    Ok(feature
        .with_attr(START_DATE, AttrValue::Date(start))
        .with_attr(END_DATE, AttrValue::Date(end)))
}

fn date_from_millis(epoch_ms: i64) -> Result<NaiveDate> {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| {
            PipelineError::Attribute(format!("timestamp {} out of range", epoch_ms))
        })
}
