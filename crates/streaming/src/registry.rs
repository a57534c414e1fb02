use std::collections::BTreeMap;

use foundation::BoxFuture;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};
use wells::RawBounds;

use crate::error::StreamError;
use crate::fetch::FetchError;
use crate::grid::{ChunkKey, GridChunk};

/// Source of the chunk bounds listing (normally the remote listing endpoint).
pub trait ChunkListingSource: Send + Sync {
    fn list_chunks(&self) -> BoxFuture<'_, Result<Vec<RawBounds>, FetchError>>;
}

/// Key → chunk table, populated at most once.
///
/// `initialize` runs the listing once; later calls are no-ops whether the first
/// attempt succeeded or not. A failed attempt leaves the table empty and every
/// lookup misses. After initialization the table is read-only, so shared
/// readers need no locking.
#[derive(Debug, Default)]
pub struct ChunkRegistry {
    table: OnceCell<BTreeMap<ChunkKey, GridChunk>>,
}

fn build_table(entries: Vec<RawBounds>) -> BTreeMap<ChunkKey, GridChunk> {
    let mut table = BTreeMap::new();
    for raw in entries {
        let chunk = GridChunk::from(raw);
        if table.insert(chunk.key(), chunk).is_some() {
            debug!("duplicate chunk {} in listing", chunk.key());
        }
    }
    table
}

impl ChunkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that is already initialized with `chunks`.
    pub fn from_chunks(chunks: impl IntoIterator<Item = GridChunk>) -> Self {
        let table = chunks.into_iter().map(|c| (c.key(), c)).collect();
        Self {
            table: OnceCell::new_with(Some(table)),
        }
    }

    /// Fetch the listing and build the table, once.
    ///
    /// Returns the number of known chunks. A listing failure is logged and
    /// reported as `RegistryUnavailable`; the registry stays usable (empty).
    pub async fn initialize(&self, source: &dyn ChunkListingSource) -> Result<usize, StreamError> {
        let mut failure: Option<FetchError> = None;
        let failure_slot = &mut failure;
        let table = self
            .table
            .get_or_init(move || async move {
                match source.list_chunks().await {
                    Ok(entries) => {
                        let table = build_table(entries);
                        info!("chunk registry initialized with {} chunks", table.len());
                        table
                    }
                    Err(err) => {
                        error!("chunk listing failed, registry left empty: {err}");
                        *failure_slot = Some(err);
                        BTreeMap::new()
                    }
                }
            })
            .await;

        match failure {
            Some(err) => Err(StreamError::RegistryUnavailable(err)),
            None => Ok(table.len()),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.table.initialized()
    }

    /// Lookup by canonical key. A miss is a normal outcome.
    pub fn lookup(&self, key: &ChunkKey) -> Option<&GridChunk> {
        self.table.get()?.get(key)
    }

    pub fn len(&self) -> usize {
        self.table.get().map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn chunks(&self) -> impl Iterator<Item = &GridChunk> {
        self.table.get().into_iter().flat_map(|t| t.values())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use foundation::{BoxFuture, GeoBounds, LatLon};
    use wells::RawBounds;

    use super::{ChunkListingSource, ChunkRegistry};
    use crate::error::StreamError;
    use crate::fetch::{FetchError, FetchErrorKind};
    use crate::grid::{ChunkKey, GridIndex};

    struct CountingListing {
        calls: AtomicUsize,
        fail: bool,
    }

    impl ChunkListingSource for CountingListing {
        fn list_chunks(&self) -> BoxFuture<'_, Result<Vec<RawBounds>, FetchError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail;
            Box::pin(async move {
                if fail {
                    return Err(FetchError::new(
                        FetchErrorKind::Status(503),
                        "listing endpoint down",
                    ));
                }
                Ok(vec![
                    RawBounds {
                        top_left: LatLon::new(34.500_000_04, -120.5),
                        bottom_right: LatLon::new(35.0, -119.999_999_97),
                    },
                    RawBounds {
                        top_left: LatLon::new(34.5, -120.5),
                        bottom_right: LatLon::new(35.0, -120.0),
                    },
                ])
            })
        }
    }

    #[tokio::test]
    async fn initializes_once_with_quantized_keys() {
        let listing = CountingListing {
            calls: AtomicUsize::new(0),
            fail: false,
        };
        let registry = ChunkRegistry::new();
        assert!(registry.lookup(&ChunkKey::from_corners(LatLon::new(0.0, 0.0), LatLon::new(1.0, 1.0))).is_none());

        assert_eq!(registry.initialize(&listing).await.unwrap(), 1);
        assert_eq!(registry.initialize(&listing).await.unwrap(), 1);
        assert_eq!(listing.calls.load(Ordering::SeqCst), 1);

        let key = ChunkKey::from_corners(LatLon::new(34.5, -120.5), LatLon::new(35.0, -120.0));
        let chunk = registry.lookup(&key).expect("chunk registered");
        assert_eq!(chunk.top_left, LatLon::new(34.5, -120.5));
    }

    #[tokio::test]
    async fn failed_listing_leaves_registry_empty() {
        let listing = CountingListing {
            calls: AtomicUsize::new(0),
            fail: true,
        };
        let registry = ChunkRegistry::new();
        assert!(matches!(
            registry.initialize(&listing).await,
            Err(StreamError::RegistryUnavailable(_))
        ));
        assert!(registry.is_initialized());
        assert!(registry.is_empty());

        // Guarded: no second listing call.
        assert_eq!(registry.initialize(&listing).await.unwrap(), 0);
        assert_eq!(listing.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn grid_can_serve_as_listing() {
        let grid = GridIndex::new(GeoBounds::from_corners(34.0, -121.0, 36.0, -119.0), 4);
        let registry = ChunkRegistry::new();
        assert_eq!(registry.initialize(&grid).await.unwrap(), 16);

        let hit = grid.locate(34.6, -120.3);
        assert_eq!(registry.lookup(&hit.key), Some(&hit.chunk));
    }
}
