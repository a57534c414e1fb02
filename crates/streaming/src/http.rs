//! HTTP clients for the remote chunk service and terrain sampler.

use foundation::BoxFuture;
use reqwest::Client;
use serde::de::DeserializeOwned;
use wells::{RawBounds, RawChunkData, TerrainError, TerrainQuery, TerrainSampler};

use crate::fetch::{ChunkFetcher, ChunkRequest, FetchError, FetchErrorKind};
use crate::protocol::ChunkDataRequest;
use crate::registry::ChunkListingSource;

async fn read_json<T: DeserializeOwned>(
    what: &str,
    url: &str,
    resp: Result<reqwest::Response, reqwest::Error>,
) -> Result<T, FetchError> {
    let resp = resp.and_then(|r| r.error_for_status()).map_err(|e| {
        let kind = e
            .status()
            .map_or(FetchErrorKind::Transport, |s| FetchErrorKind::Status(s.as_u16()));
        FetchError::with_source(kind, format!("{what} request failed"), e).at(url)
    })?;
    resp.json::<T>().await.map_err(|e| {
        let kind = if e.is_decode() {
            FetchErrorKind::Malformed
        } else {
            FetchErrorKind::Transport
        };
        FetchError::with_source(kind, format!("{what} response malformed"), e).at(url)
    })
}

/// Chunk listing + chunk data endpoints.
#[derive(Debug, Clone)]
pub struct HttpChunkService {
    http: Client,
    listing_url: String,
    data_url: String,
}

impl HttpChunkService {
    pub fn new(http: Client, listing_url: impl Into<String>, data_url: impl Into<String>) -> Self {
        Self {
            http,
            listing_url: listing_url.into(),
            data_url: data_url.into(),
        }
    }

    /// Endpoints at `{base}/chunks` and `{base}/chunk`.
    pub fn from_base_url(http: Client, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self::new(http, format!("{base}/chunks"), format!("{base}/chunk"))
    }

    pub fn listing_url(&self) -> &str {
        &self.listing_url
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }
}

impl ChunkListingSource for HttpChunkService {
    fn list_chunks(&self) -> BoxFuture<'_, Result<Vec<RawBounds>, FetchError>> {
        Box::pin(async move {
            let resp = self.http.get(&self.listing_url).send().await;
            read_json::<Vec<RawBounds>>("chunk listing", &self.listing_url, resp).await
        })
    }
}

impl ChunkFetcher for HttpChunkService {
    fn fetch_chunk<'a>(
        &'a self,
        request: &'a ChunkRequest,
    ) -> BoxFuture<'a, Result<RawChunkData, FetchError>> {
        Box::pin(async move {
            let body = ChunkDataRequest {
                key: request.location_key(),
            };
            let resp = self.http.post(&self.data_url).json(&body).send().await;
            read_json::<RawChunkData>("chunk data", &self.data_url, resp).await
        })
    }
}

/// Terrain sampler backed by an HTTP endpoint.
///
/// POSTs `[{lon, lat, approxDepth}]` and expects `[height | null]` in the
/// same order.
#[derive(Debug, Clone)]
pub struct HttpTerrainSampler {
    http: Client,
    url: String,
}

impl HttpTerrainSampler {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

impl TerrainSampler for HttpTerrainSampler {
    fn sample<'a>(
        &'a self,
        positions: &'a [TerrainQuery],
    ) -> BoxFuture<'a, Result<Vec<Option<f64>>, TerrainError>> {
        Box::pin(async move {
            let resp = self.http.post(&self.url).json(positions).send().await;
            read_json::<Vec<Option<f64>>>("terrain sample", &self.url, resp)
                .await
                .map_err(|e| match &e.source {
                    Some(src) => TerrainError::new(format!("{e}: {src}")),
                    None => TerrainError::new(e.to_string()),
                })
        })
    }
}
