use std::collections::HashMap;

use chrono::NaiveDate;
use geo::MultiPolygon;
use serde_json::Value;

use crate::error::{PipelineError, Result};

/// Ignition timestamp attribute carried by the source dataset (epoch millis).
pub const IGNITION_DATE: &str = "IDate";
/// Extinguish timestamp attribute carried by the source dataset (epoch millis).
pub const EXTINGUISH_DATE: &str = "FDate";

/// Attributes added by the enrichment stages.
pub const AREA: &str = "area";
pub const LON: &str = "lon";
pub const LAT: &str = "lat";
pub const START_DATE: &str = "start_date";
pub const END_DATE: &str = "end_date";

/// A typed attribute cell. Dates are typed values, not strings.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

impl AttrValue {
    /// Convert a GeoJSON property into an attribute cell. Non-scalar
    /// properties are carried as their JSON text.
    pub fn from_json(value: &Value) -> AttrValue {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    AttrValue::Int(i)
                } else {
                    AttrValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => AttrValue::Text(s.clone()),
            Value::Bool(b) => AttrValue::Text(b.to_string()),
            other => AttrValue::Text(other.to_string()),
        }
    }
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Float(v) => write!(f, "{}", v),
            AttrValue::Text(v) => write!(f, "{}", v),
            AttrValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
        }
    }
}

/// A perimeter geometry plus its named attributes. Enrichment is additive
/// and by value: `with_attr` hands back a new feature, existing attributes
/// are never removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    geometry: MultiPolygon<f64>,
    attributes: HashMap<String, AttrValue>,
}

impl Feature {
    pub fn new(geometry: MultiPolygon<f64>, attributes: HashMap<String, AttrValue>) -> Self {
        Self {
            geometry,
            attributes,
        }
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    pub fn attributes(&self) -> &HashMap<String, AttrValue> {
        &self.attributes
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    /// Set an attribute, yielding a new feature (GEE `f.set` semantics).
    pub fn with_attr(mut self, name: &str, value: AttrValue) -> Self {
        self.attributes.insert(name.to_string(), value);
        self
    }

    pub fn i64_attr(&self, name: &str) -> Result<i64> {
        match self.attributes.get(name) {
            Some(AttrValue::Int(v)) => Ok(*v),
            Some(AttrValue::Float(v)) => Ok(*v as i64),
            _ => Err(PipelineError::Attribute(format!(
                "attribute '{}' missing or not numeric",
                name
            ))),
        }
    }

    pub fn f64_attr(&self, name: &str) -> Result<f64> {
        match self.attributes.get(name) {
            Some(AttrValue::Float(v)) => Ok(*v),
            Some(AttrValue::Int(v)) => Ok(*v as f64),
            _ => Err(PipelineError::Attribute(format!(
                "attribute '{}' missing or not numeric",
                name
            ))),
        }
    }
}

/// An unordered collection of features, closed under map and filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection(Vec<Feature>);

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self(features)
    }

    pub fn features(&self) -> &[Feature] {
        &self.0
    }

    pub fn into_features(self) -> Vec<Feature> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn map_features<F>(self, f: F) -> Self
    where
        F: Fn(Feature) -> Feature,
    {
        Self(self.0.into_iter().map(f).collect())
    }

    pub fn try_map_features<F>(self, f: F) -> Result<Self>
    where
        F: Fn(Feature) -> Result<Feature>,
    {
        let mut mapped = Vec::with_capacity(self.0.len());
        for feature in self.0 {
            mapped.push(f(feature)?);
        }
        Ok(Self(mapped))
    }

    pub fn filter_features<F>(self, pred: F) -> Self
    where
        F: Fn(&Feature) -> bool,
    {
        Self(self.0.into_iter().filter(|f| pred(f)).collect())
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
