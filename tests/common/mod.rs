#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use tokio::sync::Notify;
use tunerec::{
    error::CatalogError,
    spotify::Catalog,
    types::{AudioFeatures, Track},
};

// In-memory catalog with canned answers
#[derive(Default)]
pub struct StubCatalog {
    pub search_results: Vec<Track>,
    pub artist_id: Option<String>,
    pub top_tracks: Vec<Track>,
    pub features: HashMap<String, AudioFeatures>,
    pub fail_search: bool,
    pub search_calls: AtomicUsize,
    pub batch_requests: Mutex<Vec<Vec<String>>>,
    pub search_entered: Option<Arc<Notify>>,
    pub search_gate: Option<Arc<Notify>>,
    pub drops: Option<DropCounter>,
}

// Counts how often the owning catalog is dropped
pub struct DropCounter(pub Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

impl StubCatalog {
    pub fn with_search(results: Vec<Track>) -> Self {
        Self {
            search_results: results,
            ..Self::default()
        }
    }

    pub fn with_features(mut self, features: Vec<AudioFeatures>) -> Self {
        self.features = features
            .into_iter()
            .map(|f| (f.track_id.clone(), f))
            .collect();
        self
    }
}

#[async_trait]
impl Catalog for StubCatalog {
    // ignores `limit` on purpose so callers have to enforce it
    async fn search_tracks(&self, _query: &str, _limit: usize) -> Result<Vec<Track>, CatalogError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(entered) = &self.search_entered {
            entered.notify_one();
        }
        if let Some(gate) = &self.search_gate {
            gate.notified().await;
        }
        if self.fail_search {
            return Err(CatalogError::Status {
                status: 503,
                message: "catalog down".to_string(),
            });
        }
        Ok(self.search_results.clone())
    }

    async fn get_artist_id(&self, _name: &str) -> Result<Option<String>, CatalogError> {
        Ok(self.artist_id.clone())
    }

    async fn get_artist_top_tracks(&self, _artist_id: &str) -> Result<Vec<Track>, CatalogError> {
        Ok(self.top_tracks.clone())
    }

    async fn get_audio_features(&self, track_id: &str) -> Result<AudioFeatures, CatalogError> {
        self.features
            .get(track_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(track_id.to_string()))
    }

    async fn get_batch_audio_features(
        &self,
        ids: &[String],
    ) -> Result<Vec<AudioFeatures>, CatalogError> {
        self.batch_requests.lock().unwrap().push(ids.to_vec());
        Ok(ids
            .iter()
            .filter_map(|id| self.features.get(id).cloned())
            .collect())
    }
}

pub fn track(id: &str, artist: &str, popularity: u32) -> Track {
    Track::new(
        id,
        format!("Song {id}"),
        vec![artist.to_string()],
        "Album",
    )
    .with_popularity(popularity)
    .with_duration_ms(180_000)
}

pub fn features(id: &str, level: f64, tempo: f64) -> AudioFeatures {
    AudioFeatures {
        track_id: id.to_string(),
        danceability: level,
        energy: level,
        valence: level,
        tempo,
        acousticness: 1.0 - level,
        instrumentalness: 0.0,
        liveness: 0.1,
        speechiness: 0.05,
        key: 5,
        mode: 1,
    }
}
