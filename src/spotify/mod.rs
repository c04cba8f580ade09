//! # Spotify Catalog Module
//!
//! The integration layer between the recommendation server and the Spotify Web
//! API. It owns the service-level access token and exposes the read-only
//! queries the strategies and the connection handler need.
//!
//! ## Architecture
//!
//! ```text
//! Connection handler / Recommendation strategies
//!          ↓
//!     Catalog trait
//!          ↓
//!     CatalogClient
//!     ├── Token lifecycle (client credentials, single-flight refresh)
//!     ├── Track search
//!     ├── Artist lookup and top tracks
//!     └── Audio features (single and batch)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## Authentication Strategy
//!
//! The client authenticates with the OAuth 2.0 client-credentials flow: the
//! client id and secret go out as a Basic `Authorization` header and the token
//! endpoint answers with a bearer token and its lifetime. The token is shared
//! by every connection. When it is missing or expired, exactly one caller
//! performs the exchange while the others wait and reuse the result.
//!
//! ## Error Handling
//!
//! - **Transient failures**: timeouts, connection errors, 429 and 5xx gateway
//!   statuses are retried a bounded number of times with exponential backoff.
//!   429 responses honour `Retry-After`.
//! - **Rejected token**: a 401 invalidates the token used and retries once.
//! - **Everything else** surfaces as a [`CatalogError`] carrying the cause.
//!
//! ## API Coverage
//!
//! - `POST /api/token` - client-credentials exchange
//! - `GET /search?type=track` - free-text track search
//! - `GET /search?type=artist` - best artist match for a name
//! - `GET /artists/{id}/top-tracks` - an artist's top tracks in a market
//! - `GET /audio-features/{id}` and `GET /audio-features?ids=` - descriptors

mod artists;
mod audio;
mod client;
mod tracks;

use async_trait::async_trait;

pub use audio::AUDIO_FEATURES_BATCH_SIZE;
pub use client::{CatalogClient, CatalogConfig};
pub use tracks::MAX_SEARCH_LIMIT;

use crate::{
    error::CatalogError,
    types::{AudioFeatures, Track},
};

/// Read-only catalog queries used by the strategies and the request handler.
///
/// [`CatalogClient`] is the production implementation; tests and in-process
/// embedders can provide their own.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn search_tracks(&self, query: &str, limit: usize) -> Result<Vec<Track>, CatalogError>;

    async fn get_artist_id(&self, name: &str) -> Result<Option<String>, CatalogError>;

    async fn get_artist_top_tracks(&self, artist_id: &str) -> Result<Vec<Track>, CatalogError>;

    async fn get_audio_features(&self, track_id: &str) -> Result<AudioFeatures, CatalogError>;

    async fn get_batch_audio_features(
        &self,
        ids: &[String],
    ) -> Result<Vec<AudioFeatures>, CatalogError>;
}

#[async_trait]
impl Catalog for CatalogClient {
    async fn search_tracks(&self, query: &str, limit: usize) -> Result<Vec<Track>, CatalogError> {
        CatalogClient::search_tracks(self, query, limit).await
    }

    async fn get_artist_id(&self, name: &str) -> Result<Option<String>, CatalogError> {
        CatalogClient::get_artist_id(self, name).await
    }

    async fn get_artist_top_tracks(&self, artist_id: &str) -> Result<Vec<Track>, CatalogError> {
        CatalogClient::get_artist_top_tracks(self, artist_id).await
    }

    async fn get_audio_features(&self, track_id: &str) -> Result<AudioFeatures, CatalogError> {
        CatalogClient::get_audio_features(self, track_id).await
    }

    async fn get_batch_audio_features(
        &self,
        ids: &[String],
    ) -> Result<Vec<AudioFeatures>, CatalogError> {
        CatalogClient::get_batch_audio_features(self, ids).await
    }
}
