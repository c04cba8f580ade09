//! Newline-delimited JSON envelopes exchanged with clients.
//!
//! Requests look like `{"action":"SEARCH","query":"Imagine","limit":5}`;
//! responses are either `{"status":"success","action":..,"data":[..]}` or
//! `{"status":"error","message":..}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::Track;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Search,
    Recommend,
}

/// A request line the server could not accept. The display text is what the
/// client receives in the error envelope.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    #[error("Invalid request: {0}")]
    InvalidJson(String),

    #[error("Invalid request: line too long")]
    LineTooLong,

    #[error("Missing action")]
    MissingAction,

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid field {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    pub track_id: String,
    pub track_name: String,
    pub track_artist: String,
    pub track_album: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl RecommendRequest {
    /// Request for recommendations seeded by `track`. Only the primary artist
    /// is sent.
    pub fn for_track(track: &Track, count: Option<usize>) -> Self {
        Self {
            track_id: track.id.clone(),
            track_name: track.name.clone(),
            track_artist: track.primary_artist().unwrap_or_default().to_string(),
            track_album: track.album_name.clone(),
            count,
        }
    }

    pub fn seed_track(&self) -> Track {
        Track::seed(
            self.track_id.as_str(),
            self.track_name.as_str(),
            self.track_artist.as_str(),
            self.track_album.as_str(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "UPPERCASE")]
pub enum Request {
    Search(SearchRequest),
    Recommend(RecommendRequest),
}

impl Request {
    /// Parses one request line.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let value: Value =
            serde_json::from_str(line).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
        let Value::Object(fields) = value else {
            return Err(ProtocolError::InvalidJson(
                "expected a JSON object".to_string(),
            ));
        };

        let action = match fields.get("action") {
            None | Some(Value::Null) => return Err(ProtocolError::MissingAction),
            Some(Value::String(action)) => action.as_str(),
            Some(other) => return Err(ProtocolError::UnknownAction(other.to_string())),
        };

        match action {
            "SEARCH" => Ok(Request::Search(SearchRequest {
                query: non_empty_string(&fields, "query")?,
                limit: optional_count(&fields, "limit")?,
            })),
            "RECOMMEND" => Ok(Request::Recommend(RecommendRequest {
                track_id: non_empty_string(&fields, "trackId")?,
                track_name: string(&fields, "trackName")?,
                track_artist: non_empty_string(&fields, "trackArtist")?,
                track_album: string(&fields, "trackAlbum")?,
                count: optional_count(&fields, "count")?,
            })),
            other => Err(ProtocolError::UnknownAction(other.to_string())),
        }
    }

    pub fn action(&self) -> Action {
        match self {
            Request::Search(_) => Action::Search,
            Request::Recommend(_) => Action::Recommend,
        }
    }

    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn string(fields: &Map<String, Value>, field: &'static str) -> Result<String, ProtocolError> {
    match fields.get(field) {
        None | Some(Value::Null) => Err(ProtocolError::MissingField(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ProtocolError::InvalidField {
            field,
            reason: "expected a string",
        }),
    }
}

fn non_empty_string(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<String, ProtocolError> {
    let value = string(fields, field)?;
    if value.trim().is_empty() {
        return Err(ProtocolError::MissingField(field));
    }
    Ok(value)
}

fn optional_count(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<usize>, ProtocolError> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or(ProtocolError::InvalidField {
                field,
                reason: "expected a non-negative integer",
            }),
        Some(_) => Err(ProtocolError::InvalidField {
            field,
            reason: "expected a non-negative integer",
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Success {
        action: Action,
        data: Vec<Track>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        strategy: Option<String>,
    },
    Error {
        message: String,
    },
}

impl Response {
    pub fn success(action: Action, data: Vec<Track>) -> Self {
        Response::Success {
            action,
            data,
            strategy: None,
        }
    }

    pub fn recommended(data: Vec<Track>, strategy: &str) -> Self {
        Response::Success {
            action: Action::Recommend,
            data,
            strategy: Some(strategy.to_string()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }

    /// Serializes the envelope as a single line, without the trailing newline.
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"status":"error","message":"Failed to encode response"}"#.to_string()
        })
    }
}
