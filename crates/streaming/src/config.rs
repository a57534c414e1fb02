use std::time::Duration;

use foundation::GeoBounds;
use serde::{Deserialize, Serialize};

/// Configuration for viewport-driven chunk streaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Region covered by the grid.
    pub bounds: GeoBounds,

    /// Grid resolution: the region is split into `splits × splits` chunks.
    pub splits: usize,

    /// Polling cadence while the viewport is moving (ms).
    pub poll_interval_ms: u64,

    /// Records are hidden when the camera is at or above this height (m).
    pub records_max_height_m: f64,

    /// The aggregated view is shown when the camera is at or above this height (m).
    pub aggregated_min_height_m: f64,

    /// Clear displayed records immediately on a chunk change instead of
    /// keeping them until the replacement arrives.
    pub clear_on_chunk_change: bool,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            bounds: GeoBounds::from_corners(32.5, -124.5, 42.0, -114.0),
            splits: 16,
            poll_interval_ms: 200,
            records_max_height_m: 50_000.0,
            aggregated_min_height_m: 500_000.0,
            clear_on_chunk_change: true,
        }
    }
}

impl StreamingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.splits == 0 {
            return Err(ConfigError::ZeroSplits);
        }
        if self.bounds.is_empty() {
            return Err(ConfigError::EmptyBounds(self.bounds));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ZeroSplits,
    EmptyBounds(GeoBounds),
    ZeroPollInterval,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ZeroSplits => write!(f, "splits must be at least 1"),
            ConfigError::EmptyBounds(b) => write!(
                f,
                "bounds have no area: ({}, {})-({}, {})",
                b.min.lat, b.min.lon, b.max.lat, b.max.lon
            ),
            ConfigError::ZeroPollInterval => write!(f, "poll_interval_ms must be positive"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use foundation::GeoBounds;

    use super::{ConfigError, StreamingConfig};

    #[test]
    fn default_is_valid() {
        assert_eq!(StreamingConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: StreamingConfig =
            serde_json::from_str(r#"{"splits": 4, "clear_on_chunk_change": false}"#).unwrap();
        assert_eq!(cfg.splits, 4);
        assert!(!cfg.clear_on_chunk_change);
        assert_eq!(cfg.poll_interval_ms, 200);
    }

    #[test]
    fn rejects_degenerate_configs() {
        let cfg = StreamingConfig {
            splits: 0,
            ..StreamingConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroSplits));

        let flat = GeoBounds::from_corners(34.0, -121.0, 34.0, -120.0);
        let cfg = StreamingConfig {
            bounds: flat,
            ..StreamingConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyBounds(flat)));
    }
}
