use tracing::debug;
use wells::{ChunkData, TerrainSampler, apply_terrain, normalize_chunk};

use crate::error::StreamError;
use crate::fetch::{ChunkFetcher, ChunkRequest};

/// Fetch one chunk and run it through normalization, gap-fill and terrain
/// adjustment.
///
/// Only the fetch can fail; malformed records and missing terrain samples
/// degrade inside the pipeline.
pub async fn process_chunk(
    fetcher: &dyn ChunkFetcher,
    terrain: &dyn TerrainSampler,
    request: &ChunkRequest,
) -> Result<ChunkData, StreamError> {
    let raw = fetcher
        .fetch_chunk(request)
        .await
        .map_err(|source| StreamError::ChunkFetchFailed {
            key: request.key,
            source,
        })?;

    let mut data = normalize_chunk(raw);
    let adjusted = apply_terrain(terrain, &mut data).await;
    debug!(
        "fetch {} for {}: {} wells, {adjusted} terrain-adjusted",
        request.id.0,
        request.key,
        data.well_count()
    );
    Ok(data)
}
