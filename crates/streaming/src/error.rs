use crate::fetch::FetchError;
use crate::grid::ChunkKey;

/// Failures absorbed at the streaming boundary.
///
/// None of these reach the display layer; they are logged and turned into an
/// empty display for the affected region.
#[derive(Debug)]
pub enum StreamError {
    /// The chunk listing could not be fetched; the registry stays empty.
    RegistryUnavailable(FetchError),
    /// A per-chunk data fetch failed.
    ChunkFetchFailed { key: ChunkKey, source: FetchError },
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamError::RegistryUnavailable(err) => {
                write!(f, "chunk registry unavailable: {err}")
            }
            StreamError::ChunkFetchFailed { key, source } => {
                write!(f, "fetch for chunk {key} failed: {source}")
            }
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::RegistryUnavailable(err) => Some(err),
            StreamError::ChunkFetchFailed { source, .. } => Some(source),
        }
    }
}
