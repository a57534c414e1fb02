//! Wire types for the remote chunk service.
//!
//! - Listing endpoint: no parameters → `[{topLeft:{lat,lon}, bottomRight:{lat,lon}}]`
//! - Data endpoint: `{key: "location:(lat1, lon1)-(lat2, lon2)"}` → either an
//!   array of raw well records or `{sub_chunks: [{location, wells}]}`
//!
//! Record-level shapes live in `wells::ingest`; this module holds the
//! request envelope.

use serde::{Deserialize, Serialize};

pub use wells::{RawBounds, RawChunkData, RawSubChunk, RawWellRecord};

/// Response of the listing endpoint.
pub type ChunkListing = Vec<RawBounds>;

/// Body of a chunk data request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkDataRequest {
    pub key: String,
}

#[cfg(test)]
mod tests {
    use foundation::LatLon;
    use serde_json::json;

    use super::{ChunkDataRequest, ChunkListing, RawChunkData};
    use crate::grid::GridChunk;

    #[test]
    fn request_carries_location_key() {
        let chunk = GridChunk::new(LatLon::new(34.5, -120.5), LatLon::new(35.0, -120.0));
        let body = ChunkDataRequest {
            key: chunk.key().location_key(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"key": "location:(34.5, -120.5)-(35, -120)"})
        );
    }

    #[test]
    fn listing_parses() {
        let listing: ChunkListing = serde_json::from_value(json!([
            {"topLeft": {"lat": 34.0, "lon": -121.0}, "bottomRight": {"lat": 34.5, "lon": -120.5}}
        ]))
        .unwrap();
        assert_eq!(listing[0].bottom_right, LatLon::new(34.5, -120.5));
    }

    #[test]
    fn data_response_shapes_are_distinguished() {
        let flat: RawChunkData = serde_json::from_value(json!([])).unwrap();
        assert!(matches!(flat, RawChunkData::Flat(w) if w.is_empty()));

        let nested: RawChunkData = serde_json::from_value(json!({"sub_chunks": []})).unwrap();
        assert!(matches!(nested, RawChunkData::SubChunks { sub_chunks } if sub_chunks.is_empty()));
    }
}
