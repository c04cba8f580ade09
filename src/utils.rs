use std::{collections::HashSet, time::Duration};

use base64::{Engine, engine::general_purpose::STANDARD};
use rand::Rng;

use crate::types::Track;

const BACKOFF_CAP: Duration = Duration::from_secs(8);
const MAX_JITTER_MS: u64 = 100;

/// `Authorization` header value for the client-credentials exchange.
pub fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    let raw = format!("{client_id}:{client_secret}");
    format!("Basic {}", STANDARD.encode(raw.as_bytes()))
}

/// Exponential backoff for the given zero-based retry attempt, plus up to
/// 100ms of random jitter, capped at 8 seconds before jitter.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.min(16));
    let delay = base.saturating_mul(factor).min(BACKOFF_CAP);
    let jitter = rand::rng().random_range(0..=MAX_JITTER_MS);
    delay + Duration::from_millis(jitter)
}

/// Parses a `Retry-After` header given in whole seconds.
pub fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Drops every track whose identifier equals `seed_id`.
pub fn exclude_seed(tracks: &mut Vec<Track>, seed_id: &str) {
    tracks.retain(|track| track.id != seed_id);
}

/// Keeps the first occurrence of every track identifier, preserving order.
pub fn dedup_by_id(tracks: &mut Vec<Track>) {
    let mut seen = HashSet::new();
    tracks.retain(|track| seen.insert(track.id.clone()));
}

/// Sorts by popularity, most popular first. The sort is stable, so tracks with
/// equal popularity keep the order the catalog returned them in.
pub fn sort_by_popularity(tracks: &mut [Track]) {
    tracks.sort_by(|a, b| b.popularity.cmp(&a.popularity));
}

/// Shared tail of the popularity-ordered strategies: exclude, sort, limit.
pub fn rank_by_popularity(mut candidates: Vec<Track>, seed_id: &str, count: usize) -> Vec<Track> {
    exclude_seed(&mut candidates, seed_id);
    sort_by_popularity(&mut candidates);
    candidates.truncate(count);
    candidates
}
