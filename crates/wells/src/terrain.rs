//! Relative depth → absolute elevation using sampled ground heights.

use foundation::BoxFuture;
use serde::Serialize;
use tracing::warn;

use crate::error::TerrainError;
use crate::record::{ChunkData, WellRecord};

/// One sampling position.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerrainQuery {
    pub lon: f64,
    pub lat: f64,
    pub approx_depth: f64,
}

impl TerrainQuery {
    pub fn for_well(well: &WellRecord) -> Self {
        Self {
            lon: well.longitude,
            lat: well.latitude,
            approx_depth: well.start_depth,
        }
    }
}

/// External terrain-elevation capability.
///
/// Returns one entry per query, in order. Entries may be `None` (or the vector
/// may be short) when individual samples fail.
pub trait TerrainSampler: Send + Sync {
    fn sample<'a>(
        &'a self,
        positions: &'a [TerrainQuery],
    ) -> BoxFuture<'a, Result<Vec<Option<f64>>, TerrainError>>;
}

/// Sampler that reports the same ground height everywhere.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FlatTerrain(pub f64);

impl TerrainSampler for FlatTerrain {
    fn sample<'a>(
        &'a self,
        positions: &'a [TerrainQuery],
    ) -> BoxFuture<'a, Result<Vec<Option<f64>>, TerrainError>> {
        let heights = vec![Some(self.0); positions.len()];
        Box::pin(async move { Ok::<_, TerrainError>(heights) })
    }
}

/// Rewrite a well's layer depths as `surface - relative_depth`.
///
/// Always computed from the `unadjusted_*` pair, so adjusting twice with the
/// same height is stable.
pub fn adjust_well(well: &mut WellRecord, surface: f64) {
    for layer in &mut well.layers {
        layer.start_depth = surface - layer.unadjusted_start_depth;
        layer.end_depth = surface - layer.unadjusted_end_depth;
    }
    well.surface_elevation = Some(surface);
}

/// Apply sampled heights to wells, pairing by index.
///
/// Wells without a usable sample keep their relative depths. Returns how many
/// wells were adjusted.
pub fn adjust_wells<'a>(
    wells: impl IntoIterator<Item = &'a mut WellRecord>,
    heights: &[Option<f64>],
) -> usize {
    let mut adjusted = 0;
    for (i, well) in wells.into_iter().enumerate() {
        match heights.get(i).copied().flatten().filter(|h| h.is_finite()) {
            Some(h) => {
                adjust_well(well, h);
                adjusted += 1;
            }
            None => warn!(
                "no terrain sample for well {} at ({}, {}); keeping relative depths",
                well.id.as_deref().unwrap_or("?"),
                well.longitude,
                well.latitude
            ),
        }
    }
    adjusted
}

/// Sample terrain for every well in a chunk and adjust in one batch.
///
/// A failed batch leaves every well relative; it never fails the chunk.
pub async fn apply_terrain(sampler: &dyn TerrainSampler, data: &mut ChunkData) -> usize {
    let queries: Vec<TerrainQuery> = data.wells().map(TerrainQuery::for_well).collect();
    if queries.is_empty() {
        return 0;
    }

    let heights = match sampler.sample(&queries).await {
        Ok(h) => h,
        Err(err) => {
            warn!("{err}; {} wells keep relative depths", queries.len());
            Vec::new()
        }
    };
    if heights.len() < queries.len() {
        warn!(
            "terrain sampler returned {} of {} samples",
            heights.len(),
            queries.len()
        );
    }
    adjust_wells(data.wells_mut(), &heights)
}

#[cfg(test)]
mod tests {
    use foundation::{BoxFuture, GeoBounds};
    use pretty_assertions::assert_eq;

    use super::{FlatTerrain, TerrainQuery, TerrainSampler, adjust_well, adjust_wells, apply_terrain};
    use crate::error::TerrainError;
    use crate::material::{MaterialSet, MaterialType};
    use crate::record::{ChunkData, Layer, SubChunk, WellRecord};

    fn well(id: &str, lon: f64) -> WellRecord {
        WellRecord {
            longitude: lon,
            latitude: 34.0,
            start_depth: 0.0,
            end_depth: 30.0,
            id: Some(id.to_string()),
            report_link: None,
            layers: vec![
                Layer::new(MaterialSet::from([MaterialType::Sand]), 0.0, 10.0, None),
                Layer::new(MaterialSet::from([MaterialType::Clay]), 10.0, 30.0, None),
            ],
            surface_elevation: None,
        }
    }

    /// Misses every well west of `cutoff_lon`.
    struct PatchyTerrain {
        cutoff_lon: f64,
    }

    impl TerrainSampler for PatchyTerrain {
        fn sample<'a>(
            &'a self,
            positions: &'a [TerrainQuery],
        ) -> BoxFuture<'a, Result<Vec<Option<f64>>, TerrainError>> {
            Box::pin(async move {
                let heights: Vec<Option<f64>> = positions
                    .iter()
                    .map(|q| (q.lon >= self.cutoff_lon).then_some(100.0))
                    .collect();
                Ok::<_, TerrainError>(heights)
            })
        }
    }

    struct BrokenTerrain;

    impl TerrainSampler for BrokenTerrain {
        fn sample<'a>(
            &'a self,
            _positions: &'a [TerrainQuery],
        ) -> BoxFuture<'a, Result<Vec<Option<f64>>, TerrainError>> {
            Box::pin(async { Err::<Vec<Option<f64>>, _>(TerrainError::new("offline")) })
        }
    }

    #[test]
    fn adjusts_to_absolute_elevation() {
        let mut w = well("a", 0.0);
        adjust_well(&mut w, 250.0);
        let depths: Vec<_> = w.layers.iter().map(|l| (l.start_depth, l.end_depth)).collect();
        assert_eq!(depths, vec![(250.0, 240.0), (240.0, 220.0)]);
        assert_eq!(w.layers[1].unadjusted_end_depth, 30.0);
        assert_eq!(w.surface_elevation, Some(250.0));

        adjust_well(&mut w, 250.0);
        assert_eq!(w.layers[0].start_depth, 250.0);
    }

    #[test]
    fn short_or_non_finite_samples_leave_wells_relative() {
        let mut wells = vec![well("a", 0.0), well("b", 1.0), well("c", 2.0)];
        let n = adjust_wells(wells.iter_mut(), &[Some(f64::NAN), Some(10.0)]);
        assert_eq!(n, 1);
        assert_eq!(wells[0].layers[0].start_depth, 0.0);
        assert_eq!(wells[1].layers[0].start_depth, 10.0);
        assert!(!wells[2].is_terrain_adjusted());
    }

    #[tokio::test]
    async fn missing_sample_skips_only_that_well() {
        let mut data = ChunkData::Flat(vec![well("west", -121.0), well("east", -119.0)]);
        let n = apply_terrain(&PatchyTerrain { cutoff_lon: -120.0 }, &mut data).await;
        assert_eq!(n, 1);

        let ChunkData::Flat(wells) = &data else {
            panic!("shape changed");
        };
        assert_eq!(wells[0].layers[1].end_depth, 30.0);
        assert!(!wells[0].is_terrain_adjusted());
        assert_eq!(wells[1].layers[1].end_depth, 70.0);
    }

    #[tokio::test]
    async fn samples_pair_with_wells_across_sub_chunks() {
        let loc = GeoBounds::from_corners(34.0, -122.0, 35.0, -118.0);
        let mut data = ChunkData::SubChunks(vec![
            SubChunk {
                location: loc,
                wells: vec![well("west", -121.0), well("east-1", -119.5)],
            },
            SubChunk {
                location: loc,
                wells: Vec::new(),
            },
            SubChunk {
                location: loc,
                wells: vec![well("far-west", -121.5), well("east-2", -118.5)],
            },
        ]);
        let n = apply_terrain(&PatchyTerrain { cutoff_lon: -120.0 }, &mut data).await;
        assert_eq!(n, 2);

        let adjusted: Vec<_> = data
            .wells()
            .map(|w| (w.id.as_deref().unwrap_or("?"), w.is_terrain_adjusted()))
            .collect();
        assert_eq!(
            adjusted,
            vec![("west", false), ("east-1", true), ("far-west", false), ("east-2", true)]
        );
        let ChunkData::SubChunks(subs) = &data else {
            panic!("shape changed");
        };
        assert_eq!(subs[2].wells[1].layers[0].start_depth, 100.0);
    }

    #[tokio::test]
    async fn failed_batch_is_not_fatal() {
        let mut data = ChunkData::Flat(vec![well("a", 0.0)]);
        let before = data.clone();
        assert_eq!(apply_terrain(&BrokenTerrain, &mut data).await, 0);
        assert_eq!(data, before);
    }

    #[tokio::test]
    async fn flat_terrain_adjusts_everything() {
        let mut data = ChunkData::Flat(vec![well("a", 0.0), well("b", 1.0)]);
        assert_eq!(apply_terrain(&FlatTerrain(5.0), &mut data).await, 2);
        assert!(data.wells().all(|w| w.surface_elevation == Some(5.0)));
    }
}
