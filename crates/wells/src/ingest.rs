//! Ingestion boundary for the data service's raw records.
//!
//! Raw layers arrive as positional tuples. They are parsed into [`RawLayer`]
//! immediately and malformed tuples are rejected here, so nothing downstream
//! touches positional JSON.

use std::collections::BTreeSet;

use foundation::{GeoBounds, LatLon};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::IngestError;
use crate::gap_fill::gap_fill;
use crate::material::{MaterialSet, parse_material_field};
use crate::record::{ChunkData, Layer, SubChunk, WellRecord};

/// Tuple arity accepted for a raw layer.
pub const MIN_LAYER_FIELDS: usize = 4;
pub const MAX_LAYER_FIELDS: usize = 8;

/// Wire shape of a rectangle: `{topLeft:{lat,lon}, bottomRight:{lat,lon}}`.
///
/// `top_left` carries the minimum corner.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBounds {
    pub top_left: LatLon,
    pub bottom_right: LatLon,
}

impl From<RawBounds> for GeoBounds {
    fn from(b: RawBounds) -> Self {
        GeoBounds::from_corners(
            b.top_left.lat.min(b.bottom_right.lat),
            b.top_left.lon.min(b.bottom_right.lon),
            b.top_left.lat.max(b.bottom_right.lat),
            b.top_left.lon.max(b.bottom_right.lon),
        )
    }
}

impl From<GeoBounds> for RawBounds {
    fn from(b: GeoBounds) -> Self {
        RawBounds {
            top_left: b.min,
            bottom_right: b.max,
        }
    }
}

/// One well record as sent by the data service, after field validation.
///
/// Records stay untyped JSON until [`RawWellRecord::from_value`], so one bad
/// record is dropped on its own instead of failing the whole response.
#[derive(Debug, Clone, PartialEq)]
pub struct RawWellRecord {
    pub longitude: f64,
    pub latitude: f64,
    pub start_depth: Option<f64>,
    pub end_depth: Option<f64>,
    /// String or number on the wire.
    pub id: Option<Value>,
    pub report_link: Option<String>,
    pub layers: Vec<Value>,
}

impl RawWellRecord {
    /// Validate a camelCase record object.
    ///
    /// Position and depths accept numbers or numeric strings. A null or
    /// absent `layers` is empty.
    pub fn from_value(value: &Value) -> Result<Self, IngestError> {
        let Value::Object(fields) = value else {
            return Err(IngestError::MalformedRecord(format!(
                "expected an object, got {value}"
            )));
        };
        let coord = |name: &str| {
            fields.get(name).and_then(depth_field).ok_or_else(|| {
                IngestError::MalformedRecord(format!(
                    "{name} missing or not a number: {}",
                    fields.get(name).unwrap_or(&Value::Null)
                ))
            })
        };
        let layers = match fields.get("layers") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(tuples)) => tuples.clone(),
            Some(other) => {
                return Err(IngestError::MalformedRecord(format!(
                    "layers is not an array: {other}"
                )));
            }
        };

        Ok(Self {
            longitude: coord("longitude")?,
            latitude: coord("latitude")?,
            start_depth: fields.get("startDepth").and_then(depth_field),
            end_depth: fields.get("endDepth").and_then(depth_field),
            id: fields.get("id").filter(|v| !v.is_null()).cloned(),
            report_link: fields.get("reportLink").and_then(text_field),
            layers,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawSubChunk {
    pub location: RawBounds,
    /// Raw record objects, validated one by one during normalization.
    #[serde(default)]
    pub wells: Vec<Value>,
}

/// Chunk data response. Callers branch on the `sub_chunks` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawChunkData {
    SubChunks { sub_chunks: Vec<RawSubChunk> },
    Flat(Vec<Value>),
}

/// A validated layer tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLayer {
    pub start_depth: f64,
    pub end_depth: f64,
    pub description: Option<String>,
    pub material_field: String,
    pub extra: Vec<Value>,
}

fn depth_field(v: &Value) -> Option<f64> {
    let d = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    d.is_finite().then_some(d)
}

fn text_field(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl RawLayer {
    /// Parse tuple `(startDepth, endDepth, description, materialCode, …)`.
    pub fn parse(index: usize, value: &Value) -> Result<Self, IngestError> {
        let malformed = |reason: String| IngestError::MalformedLayer { index, reason };

        let Value::Array(fields) = value else {
            return Err(malformed("expected an array".to_string()));
        };
        if !(MIN_LAYER_FIELDS..=MAX_LAYER_FIELDS).contains(&fields.len()) {
            return Err(malformed(format!(
                "expected {MIN_LAYER_FIELDS}..={MAX_LAYER_FIELDS} fields, got {}",
                fields.len()
            )));
        }

        let start = depth_field(&fields[0])
            .ok_or_else(|| malformed(format!("start depth {} is not a number", fields[0])))?;
        let end = depth_field(&fields[1])
            .ok_or_else(|| malformed(format!("end depth {} is not a number", fields[1])))?;

        Ok(Self {
            start_depth: start.min(end),
            end_depth: start.max(end),
            description: text_field(&fields[2]),
            material_field: text_field(&fields[3]).unwrap_or_default(),
            extra: fields[MIN_LAYER_FIELDS..].to_vec(),
        })
    }

    fn into_layer(self, unmapped: &mut BTreeSet<String>) -> Layer {
        let parsed = parse_material_field(&self.material_field);
        unmapped.extend(parsed.unmapped);
        let materials: MaterialSet = parsed.materials;
        let mut layer = Layer::new(materials, self.start_depth, self.end_depth, self.description);
        layer.extra = self.extra;
        layer
    }
}

fn id_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Turn one raw record into a gap-filled `WellRecord`.
///
/// Malformed tuples are skipped with a warning; gap-filling then covers their
/// interval with `NA`. Fails only when the record has no usable position.
pub fn normalize_record(raw: RawWellRecord) -> Result<WellRecord, IngestError> {
    if !raw.longitude.is_finite() || !raw.latitude.is_finite() {
        return Err(IngestError::MalformedRecord(format!(
            "non-finite position ({}, {})",
            raw.longitude, raw.latitude
        )));
    }
    let id = raw.id.as_ref().and_then(id_string);

    let mut unmapped = BTreeSet::new();
    let mut layers = Vec::with_capacity(raw.layers.len());
    for (index, value) in raw.layers.iter().enumerate() {
        match RawLayer::parse(index, value) {
            Ok(parsed) => layers.push(parsed.into_layer(&mut unmapped)),
            Err(err) => warn!("well {}: {err}", id.as_deref().unwrap_or("?")),
        }
    }
    if !unmapped.is_empty() {
        debug!(
            "well {}: unmapped material codes {unmapped:?} degraded to NA",
            id.as_deref().unwrap_or("?")
        );
    }

    let derived_start = layers.iter().map(|l| l.start_depth).reduce(f64::min);
    let derived_end = layers.iter().map(|l| l.end_depth).reduce(f64::max);
    let start = raw
        .start_depth
        .filter(|d| d.is_finite())
        .or(derived_start)
        .unwrap_or(0.0);
    let end = raw
        .end_depth
        .filter(|d| d.is_finite())
        .or(derived_end)
        .unwrap_or(start);

    let mut well = WellRecord {
        longitude: raw.longitude,
        latitude: raw.latitude,
        start_depth: start.min(end),
        end_depth: start.max(end),
        id,
        report_link: raw.report_link,
        layers: Vec::new(),
        surface_elevation: None,
    };
    well.layers = gap_fill(&well, &layers);
    Ok(well)
}

fn normalize_wells(raw: Vec<Value>) -> Vec<WellRecord> {
    raw.iter()
        .filter_map(|v| match RawWellRecord::from_value(v).and_then(normalize_record) {
            Ok(w) => Some(w),
            Err(err) => {
                warn!("dropping record: {err}");
                None
            }
        })
        .collect()
}

/// Normalize a whole chunk response, keeping its grouping shape.
pub fn normalize_chunk(raw: RawChunkData) -> ChunkData {
    match raw {
        RawChunkData::Flat(wells) => ChunkData::Flat(normalize_wells(wells)),
        RawChunkData::SubChunks { sub_chunks } => ChunkData::SubChunks(
            sub_chunks
                .into_iter()
                .map(|s| SubChunk {
                    location: s.location.into(),
                    wells: normalize_wells(s.wells),
                })
                .collect(),
        ),
    }
}
