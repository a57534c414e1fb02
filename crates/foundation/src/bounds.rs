use serde::{Deserialize, Serialize};

/// Geographic point in WGS84 degrees.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Axis-aligned lat/lon rectangle.
///
/// `min` is the south-west corner and `max` the north-east corner. Containment
/// is half-open (`min <= p < max`) so adjacent rectangles never both claim a
/// shared edge.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min: LatLon,
    pub max: LatLon,
}

impl GeoBounds {
    pub const fn new(min: LatLon, max: LatLon) -> Self {
        Self { min, max }
    }

    pub fn from_corners(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self::new(LatLon::new(min_lat, min_lon), LatLon::new(max_lat, max_lon))
    }

    pub fn lat_span(&self) -> f64 {
        self.max.lat - self.min.lat
    }

    pub fn lon_span(&self) -> f64 {
        self.max.lon - self.min.lon
    }

    /// True when the box has no positive area (or any corner is non-finite).
    pub fn is_empty(&self) -> bool {
        !(self.lat_span() > 0.0 && self.lon_span() > 0.0)
    }

    pub fn contains(&self, p: LatLon) -> bool {
        p.lat >= self.min.lat && p.lat < self.max.lat && p.lon >= self.min.lon && p.lon < self.max.lon
    }

    /// Containment that also accepts points on the north/east edges.
    pub fn contains_inclusive(&self, p: LatLon) -> bool {
        p.lat >= self.min.lat
            && p.lat <= self.max.lat
            && p.lon >= self.min.lon
            && p.lon <= self.max.lon
    }
}
