use foundation::GeoBounds;
use serde::Serialize;

use crate::material::{MaterialSet, MaterialType, Rgb, color_for};

/// One depth interval of a well log.
///
/// `start_depth`/`end_depth` are relative (below surface) until terrain
/// adjustment rewrites them to absolute elevations. The `unadjusted_*` pair
/// always holds the relative values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub material_types: MaterialSet,
    pub color: Rgb,
    pub start_depth: f64,
    pub end_depth: f64,
    pub unadjusted_start_depth: f64,
    pub unadjusted_end_depth: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Auxiliary tuple values (positions 4..8), kept verbatim.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<serde_json::Value>,
}

impl Layer {
    pub fn new(
        material_types: MaterialSet,
        start_depth: f64,
        end_depth: f64,
        description: Option<String>,
    ) -> Self {
        Self {
            color: color_for(&material_types),
            material_types,
            start_depth,
            end_depth,
            unadjusted_start_depth: start_depth,
            unadjusted_end_depth: end_depth,
            description,
            extra: Vec::new(),
        }
    }

    /// Synthetic "no data" layer used by gap-filling.
    pub fn no_data(start_depth: f64, end_depth: f64) -> Self {
        Self::new(
            MaterialSet::from([MaterialType::Na]),
            start_depth,
            end_depth,
            None,
        )
    }

    pub fn is_no_data(&self) -> bool {
        self.material_types.len() == 1 && self.material_types.contains(&MaterialType::Na)
    }

    pub fn thickness(&self) -> f64 {
        self.unadjusted_end_depth - self.unadjusted_start_depth
    }

    /// Copy of this layer re-spanned to a relative interval.
    pub(crate) fn with_relative_span(&self, start: f64, end: f64) -> Self {
        Self {
            start_depth: start,
            end_depth: end,
            unadjusted_start_depth: start,
            unadjusted_end_depth: end,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WellRecord {
    pub longitude: f64,
    pub latitude: f64,
    pub start_depth: f64,
    pub end_depth: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_link: Option<String>,
    pub layers: Vec<Layer>,
    /// Sampled ground height, set once terrain adjustment succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_elevation: Option<f64>,
}

impl WellRecord {
    pub fn is_terrain_adjusted(&self) -> bool {
        self.surface_elevation.is_some()
    }
}

/// Nested location returned by the data service for dense chunks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubChunk {
    pub location: GeoBounds,
    pub wells: Vec<WellRecord>,
}

/// Processed contents of one chunk.
///
/// The two shapes carry different grouping: `Flat` is one location, while
/// `SubChunks` keeps the service's nested locations apart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChunkData {
    Flat(Vec<WellRecord>),
    SubChunks(Vec<SubChunk>),
}

impl ChunkData {
    pub fn well_count(&self) -> usize {
        match self {
            ChunkData::Flat(wells) => wells.len(),
            ChunkData::SubChunks(subs) => subs.iter().map(|s| s.wells.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.well_count() == 0
    }

    pub fn wells(&self) -> Box<dyn Iterator<Item = &WellRecord> + '_> {
        match self {
            ChunkData::Flat(wells) => Box::new(wells.iter()),
            ChunkData::SubChunks(subs) => Box::new(subs.iter().flat_map(|s| s.wells.iter())),
        }
    }

    pub fn wells_mut(&mut self) -> Box<dyn Iterator<Item = &mut WellRecord> + '_> {
        match self {
            ChunkData::Flat(wells) => Box::new(wells.iter_mut()),
            ChunkData::SubChunks(subs) => {
                Box::new(subs.iter_mut().flat_map(|s| s.wells.iter_mut()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use foundation::GeoBounds;

    use super::{ChunkData, Layer, SubChunk, WellRecord};

    fn well(id: &str) -> WellRecord {
        WellRecord {
            longitude: -120.0,
            latitude: 34.0,
            start_depth: 0.0,
            end_depth: 5.0,
            id: Some(id.to_string()),
            report_link: None,
            layers: vec![Layer::no_data(0.0, 5.0)],
            surface_elevation: None,
        }
    }

    #[test]
    fn sub_chunk_wells_flatten_in_order() {
        let loc = GeoBounds::from_corners(34.0, -121.0, 34.5, -120.5);
        let data = ChunkData::SubChunks(vec![
            SubChunk {
                location: loc,
                wells: vec![well("a"), well("b")],
            },
            SubChunk {
                location: loc,
                wells: vec![well("c")],
            },
        ]);
        let ids: Vec<_> = data.wells().filter_map(|w| w.id.as_deref()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(data.well_count(), 3);
    }

    #[test]
    fn no_data_layer_is_flagged() {
        let l = Layer::no_data(1.0, 3.0);
        assert!(l.is_no_data());
        assert_eq!(l.thickness(), 2.0);
    }
}
