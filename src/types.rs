use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Seconds shaved off every token lifetime so a token is refreshed before the
/// catalog starts rejecting it.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Lower bound of the tempo range used for normalization, in BPM.
pub const TEMPO_MIN_BPM: f64 = 50.0;
/// Width of the tempo range used for normalization, in BPM.
pub const TEMPO_RANGE_BPM: f64 = 150.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album_name: String,
    pub duration_ms: u64,
    pub popularity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio_features: Option<AudioFeatures>,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        artists: Vec<String>,
        album_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            artists,
            album_name: album_name.into(),
            duration_ms: 0,
            popularity: 0,
            preview_url: None,
            audio_features: None,
        }
    }

    /// Builds the minimal seed a RECOMMEND request carries: only the primary
    /// artist survives the trip over the wire.
    pub fn seed(
        id: impl Into<String>,
        name: impl Into<String>,
        artist: impl Into<String>,
        album_name: impl Into<String>,
    ) -> Self {
        Self::new(id, name, vec![artist.into()], album_name)
    }

    pub fn with_popularity(mut self, popularity: u32) -> Self {
        self.popularity = popularity;
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn primary_artist(&self) -> Option<&str> {
        self.artists
            .first()
            .map(String::as_str)
            .filter(|a| !a.trim().is_empty())
    }

    pub fn audio_features(&self) -> Option<&AudioFeatures> {
        self.audio_features.as_ref()
    }

    /// Attaches descriptors to the track. Features owned by another track are
    /// rejected and handed back to the caller.
    pub fn attach_features(&mut self, features: AudioFeatures) -> Result<(), AudioFeatures> {
        if features.track_id != self.id {
            return Err(features);
        }
        self.audio_features = Some(features);
        Ok(())
    }

    /// Duration rendered as `m:ss`.
    pub fn duration_label(&self) -> String {
        let total_secs = self.duration_ms / 1000;
        format!("{}:{:02}", total_secs / 60, total_secs % 60)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFeatures {
    #[serde(alias = "id")]
    pub track_id: String,
    pub danceability: f64,
    pub energy: f64,
    pub valence: f64,
    pub tempo: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    #[serde(default)]
    pub liveness: f64,
    #[serde(default)]
    pub speechiness: f64,
    #[serde(default)]
    pub key: i8,
    #[serde(default)]
    pub mode: u8,
}

impl AudioFeatures {
    pub fn normalized_tempo(&self) -> f64 {
        normalize_tempo(self.tempo)
    }

    /// Euclidean distance over danceability, energy, valence, normalized tempo,
    /// acousticness and instrumentalness. Lower means more similar.
    pub fn distance(&self, other: &AudioFeatures) -> f64 {
        [
            self.danceability - other.danceability,
            self.energy - other.energy,
            self.valence - other.valence,
            self.normalized_tempo() - other.normalized_tempo(),
            self.acousticness - other.acousticness,
            self.instrumentalness - other.instrumentalness,
        ]
        .iter()
        .map(|d| d * d)
        .sum::<f64>()
        .sqrt()
    }
}

/// Rescales a tempo from the assumed 50-200 BPM domain onto [0, 1].
pub fn normalize_tempo(bpm: f64) -> f64 {
    (bpm - TEMPO_MIN_BPM) / TEMPO_RANGE_BPM
}

/// Service-level bearer token. Replaced wholesale on refresh.
#[derive(Clone, PartialEq)]
pub struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Token valid for `expires_in` seconds from now, minus the refresh margin.
    pub fn from_lifetime(value: impl Into<String>, expires_in: u64) -> Self {
        let lifetime = i64::try_from(expires_in)
            .unwrap_or(i64::MAX)
            .saturating_sub(TOKEN_EXPIRY_MARGIN_SECS)
            .max(0);
        let expires_at = Utc::now()
            .checked_add_signed(Duration::seconds(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::new(value, expires_at)
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub expires_in: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackSearchResponse {
    pub tracks: Option<TrackPage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackPage {
    #[serde(default)]
    pub items: Vec<ApiTrack>,
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopTracksResponse {
    #[serde(default)]
    pub tracks: Vec<ApiTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTrack {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ApiArtist>,
    pub album: Option<ApiAlbum>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub popularity: u32,
    pub preview_url: Option<String>,
}

impl From<ApiTrack> for Track {
    fn from(api: ApiTrack) -> Self {
        Track {
            id: api.id,
            name: api.name,
            artists: api.artists.into_iter().map(|a| a.name).collect(),
            album_name: api.album.map(|a| a.name).unwrap_or_default(),
            duration_ms: api.duration_ms,
            popularity: api.popularity,
            preview_url: api.preview_url,
            audio_features: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiArtist {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiAlbum {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistSearchResponse {
    pub artists: Option<ArtistPage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistPage {
    #[serde(default)]
    pub items: Vec<ApiArtist>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeaturesBatchResponse {
    #[serde(default)]
    pub audio_features: Vec<Option<AudioFeatures>>,
}

#[derive(Tabled)]
pub struct TrackTableRow {
    #[tabled(rename = "#")]
    pub position: usize,
    pub name: String,
    pub artists: String,
    pub album: String,
    pub duration: String,
    pub popularity: u32,
}

impl TrackTableRow {
    pub fn from_track(position: usize, track: &Track) -> Self {
        Self {
            position,
            name: track.name.clone(),
            artists: track.artists.join(", "),
            album: track.album_name.clone(),
            duration: track.duration_label(),
            popularity: track.popularity,
        }
    }
}
