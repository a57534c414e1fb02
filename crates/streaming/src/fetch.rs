use foundation::BoxFuture;
use wells::RawChunkData;

use crate::grid::{ChunkKey, GridChunk};

/// How a data service call went wrong.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// No usable response: connect, DNS, timeout or a dropped body.
    Transport,
    /// The service answered with a non-success status.
    Status(u16),
    /// The body did not decode as the expected wire shape.
    Malformed,
}

/// Failure of a listing, chunk data or terrain call.
#[derive(Debug)]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
    /// Endpoint URL, when the call went over the network.
    pub endpoint: Option<String>,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let FetchErrorKind::Status(code) = self.kind {
            write!(f, " (HTTP {code})")?;
        }
        if let Some(endpoint) = &self.endpoint {
            write!(f, " at {endpoint}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            endpoint: None,
            source: None,
        }
    }

    pub fn with_source(
        kind: FetchErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            source: Some(Box::new(source)),
            ..Self::new(kind, message)
        }
    }

    /// Tag the error with the endpoint that produced it.
    pub fn at(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

/// Monotonic id of an issued fetch, for tracing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchId(pub u64);

/// One chunk-change fetch, tagged with the key that was current when issued.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRequest {
    pub id: FetchId,
    pub key: ChunkKey,
    pub chunk: GridChunk,
}

impl ChunkRequest {
    /// Key sent to the chunk data endpoint.
    pub fn location_key(&self) -> String {
        self.key.location_key()
    }
}

/// Remote chunk data service.
///
/// Implementations must be `Send + Sync`; each call runs in its own task.
pub trait ChunkFetcher: Send + Sync {
    fn fetch_chunk<'a>(
        &'a self,
        request: &'a ChunkRequest,
    ) -> BoxFuture<'a, Result<RawChunkData, FetchError>>;
}
