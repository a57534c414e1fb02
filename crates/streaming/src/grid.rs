//! Fixed N×N partition of the bounding region and the chunk locator.

use std::fmt;

use foundation::{BoxFuture, GeoBounds, LatLon, dequantize_deg, quantize_deg};
use serde::Serialize;
use wells::RawBounds;

use crate::fetch::FetchError;
use crate::registry::ChunkListingSource;

/// Canonical chunk identity: the four corners in integer micro-degrees.
///
/// Order is `(lat1, lon1, lat2, lon2)` with `1` the minimum corner.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkKey {
    pub lat1: i64,
    pub lon1: i64,
    pub lat2: i64,
    pub lon2: i64,
}

impl ChunkKey {
    pub fn from_corners(top_left: LatLon, bottom_right: LatLon) -> Self {
        Self {
            lat1: quantize_deg(top_left.lat),
            lon1: quantize_deg(top_left.lon),
            lat2: quantize_deg(bottom_right.lat),
            lon2: quantize_deg(bottom_right.lon),
        }
    }

    /// Key string for the chunk data endpoint:
    /// `location:(lat1, lon1)-(lat2, lon2)`.
    pub fn location_key(&self) -> String {
        format!(
            "location:({}, {})-({}, {})",
            dequantize_deg(self.lat1),
            dequantize_deg(self.lon1),
            dequantize_deg(self.lat2),
            dequantize_deg(self.lon2)
        )
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            dequantize_deg(self.lat1),
            dequantize_deg(self.lon1),
            dequantize_deg(self.lat2),
            dequantize_deg(self.lon2)
        )
    }
}

/// One rectangular cell. Corners are stored already rounded to six digits.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridChunk {
    /// Minimum (south-west) corner.
    pub top_left: LatLon,
    /// Maximum (north-east) corner.
    pub bottom_right: LatLon,
}

impl GridChunk {
    pub fn new(top_left: LatLon, bottom_right: LatLon) -> Self {
        let key = ChunkKey::from_corners(top_left, bottom_right);
        Self {
            top_left: LatLon::new(dequantize_deg(key.lat1), dequantize_deg(key.lon1)),
            bottom_right: LatLon::new(dequantize_deg(key.lat2), dequantize_deg(key.lon2)),
        }
    }

    pub fn key(&self) -> ChunkKey {
        ChunkKey::from_corners(self.top_left, self.bottom_right)
    }

    pub fn bounds(&self) -> GeoBounds {
        GeoBounds::new(self.top_left, self.bottom_right)
    }
}

impl From<RawBounds> for GridChunk {
    fn from(raw: RawBounds) -> Self {
        let b: GeoBounds = raw.into();
        GridChunk::new(b.min, b.max)
    }
}

/// Output of the chunk locator.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LocatedChunk {
    pub lat_index: usize,
    pub lon_index: usize,
    pub key: ChunkKey,
    pub chunk: GridChunk,
}

fn cell_index(v: f64, min: f64, step: f64, n: usize) -> usize {
    // Float-to-int casts saturate and map NaN to 0.
    let raw = ((v - min) / step).floor() as i64;
    raw.clamp(0, n as i64 - 1) as usize
}

/// Map a continuous position to its grid cell.
///
/// Total: indices are clamped to `[0, n-1]`, so positions outside the region
/// land in the nearest edge chunk.
pub fn locate(
    lat: f64,
    lon: f64,
    min_lat: f64,
    min_lon: f64,
    lat_step: f64,
    lon_step: f64,
    n: usize,
) -> LocatedChunk {
    let n = n.max(1);
    let lat_index = cell_index(lat, min_lat, lat_step, n);
    let lon_index = cell_index(lon, min_lon, lon_step, n);
    let chunk = GridChunk::new(
        LatLon::new(
            min_lat + lat_index as f64 * lat_step,
            min_lon + lon_index as f64 * lon_step,
        ),
        LatLon::new(
            min_lat + (lat_index + 1) as f64 * lat_step,
            min_lon + (lon_index + 1) as f64 * lon_step,
        ),
    );
    LocatedChunk {
        lat_index,
        lon_index,
        key: chunk.key(),
        chunk,
    }
}

/// The region partition, fixed at startup.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GridIndex {
    bounds: GeoBounds,
    splits: usize,
    lat_step: f64,
    lon_step: f64,
}

impl GridIndex {
    pub fn new(bounds: GeoBounds, splits: usize) -> Self {
        let splits = splits.max(1);
        Self {
            bounds,
            splits,
            lat_step: bounds.lat_span() / splits as f64,
            lon_step: bounds.lon_span() / splits as f64,
        }
    }

    pub fn bounds(&self) -> GeoBounds {
        self.bounds
    }

    pub fn splits(&self) -> usize {
        self.splits
    }

    pub fn lat_step(&self) -> f64 {
        self.lat_step
    }

    pub fn lon_step(&self) -> f64 {
        self.lon_step
    }

    pub fn locate(&self, lat: f64, lon: f64) -> LocatedChunk {
        locate(
            lat,
            lon,
            self.bounds.min.lat,
            self.bounds.min.lon,
            self.lat_step,
            self.lon_step,
            self.splits,
        )
    }

    pub fn chunk_at(&self, lat_index: usize, lon_index: usize) -> Option<GridChunk> {
        if lat_index >= self.splits || lon_index >= self.splits {
            return None;
        }
        let min = self.bounds.min;
        Some(GridChunk::new(
            LatLon::new(
                min.lat + lat_index as f64 * self.lat_step,
                min.lon + lon_index as f64 * self.lon_step,
            ),
            LatLon::new(
                min.lat + (lat_index + 1) as f64 * self.lat_step,
                min.lon + (lon_index + 1) as f64 * self.lon_step,
            ),
        ))
    }

    /// All cells, row-major by latitude index.
    pub fn chunks(&self) -> impl Iterator<Item = GridChunk> + '_ {
        (0..self.splits)
            .flat_map(move |i| (0..self.splits).filter_map(move |j| self.chunk_at(i, j)))
    }
}

impl ChunkListingSource for GridIndex {
    fn list_chunks(&self) -> BoxFuture<'_, Result<Vec<RawBounds>, FetchError>> {
        let listing: Vec<RawBounds> = self.chunks().map(|c| RawBounds::from(c.bounds())).collect();
        Box::pin(async move { Ok::<_, FetchError>(listing) })
    }
}
