use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{Value, json};
use tunerec::{
    error::CatalogError,
    spotify::{CatalogClient, CatalogConfig},
    types::AccessToken,
};

const EXPECTED_BASIC: &str = "Basic Y2xpZW50OnNlY3JldA==";
const REVOKED_TOKEN: &str = "revoked-token";

// Fake Spotify: token endpoint plus the handful of Web API routes the client uses
#[derive(Default)]
struct FakeSpotify {
    token_calls: AtomicUsize,
    search_calls: AtomicUsize,
    flaky_failures: AtomicUsize,
    reject_credentials: AtomicBool,
    last_limit: std::sync::Mutex<Option<String>>,
}

async fn token(State(state): State<Arc<FakeSpotify>>, headers: HeaderMap) -> Response {
    let n = state.token_calls.fetch_add(1, Ordering::SeqCst) + 1;
    // widen the window in which concurrent callers could race
    tokio::time::sleep(Duration::from_millis(50)).await;

    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(EXPECTED_BASIC);
    if !authorized || state.reject_credentials.load(Ordering::SeqCst) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_client"})),
        )
            .into_response();
    }

    Json(json!({
        "access_token": format!("token-{n}"),
        "token_type": "Bearer",
        "expires_in": 3600
    }))
    .into_response()
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn api_track(id: &str, popularity: u32) -> Value {
    json!({
        "id": id,
        "name": format!("Song {id}"),
        "artists": [{"id": "artist-1", "name": "Ado"}, {"id": "artist-2", "name": "Guest"}],
        "album": {"name": "Kyougen"},
        "duration_ms": 201_000,
        "popularity": popularity,
        "preview_url": null
    })
}

async fn search(
    State(state): State<Arc<FakeSpotify>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.search_calls.fetch_add(1, Ordering::SeqCst);

    match bearer(&headers).as_deref() {
        None => return StatusCode::UNAUTHORIZED.into_response(),
        Some(REVOKED_TOKEN) => return StatusCode::UNAUTHORIZED.into_response(),
        Some(_) => {}
    }

    let query = params.get("q").cloned().unwrap_or_default();
    *state.last_limit.lock().unwrap() = params.get("limit").cloned();

    if params.get("type").map(String::as_str) == Some("artist") {
        let items = if query == "Nobody" {
            json!([])
        } else {
            json!([{"id": "artist-1", "name": query}])
        };
        return Json(json!({"artists": {"items": items, "total": 1}})).into_response();
    }

    match query.as_str() {
        "nothing" => Json(json!({"tracks": {"items": [], "total": 0}})).into_response(),
        "down" => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        "flaky" if state.flaky_failures.fetch_add(1, Ordering::SeqCst) < 2 => {
            StatusCode::BAD_GATEWAY.into_response()
        }
        _ => {
            let items: Vec<Value> = (1..=7).map(|i| api_track(&format!("t{i}"), i * 10)).collect();
            Json(json!({"tracks": {"items": items, "total": 7}})).into_response()
        }
    }
}

async fn top_tracks(Path(artist_id): Path<String>) -> Response {
    if artist_id != "artist-1" {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!({
        "tracks": [api_track("x", 40), api_track("y", 90), api_track("z", 60)]
    }))
    .into_response()
}

fn features_json(id: &str) -> Value {
    json!({
        "id": id,
        "danceability": 0.6,
        "energy": 0.7,
        "valence": 0.4,
        "tempo": 128.0,
        "acousticness": 0.1,
        "instrumentalness": 0.0,
        "liveness": 0.2,
        "speechiness": 0.05,
        "key": 5,
        "mode": 1
    })
}

async fn single_features(Path(track_id): Path<String>) -> Response {
    if track_id == "missing" {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(features_json(&track_id)).into_response()
}

async fn batch_features(Query(params): Query<HashMap<String, String>>) -> Response {
    let ids = params.get("ids").cloned().unwrap_or_default();
    let features: Vec<Value> = ids
        .split(',')
        .map(|id| {
            if id == "missing" {
                Value::Null
            } else {
                features_json(id)
            }
        })
        .collect();
    Json(json!({"audio_features": features})).into_response()
}

async fn start_fake_spotify() -> (SocketAddr, Arc<FakeSpotify>) {
    let state = Arc::new(FakeSpotify::default());
    let app = Router::new()
        .route("/token", post(token))
        .route("/v1/search", get(search))
        .route("/v1/artists/{id}/top-tracks", get(top_tracks))
        .route("/v1/audio-features", get(batch_features))
        .route("/v1/audio-features/{id}", get(single_features))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

fn client_for(addr: SocketAddr) -> CatalogClient {
    CatalogClient::new(CatalogConfig {
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        token_url: format!("http://{addr}/token"),
        api_url: format!("http://{addr}/v1"),
        retry_backoff: Duration::from_millis(10),
        ..CatalogConfig::default()
    })
    .unwrap()
}

async fn search_concurrently(client: Arc<CatalogClient>, callers: usize) {
    let handles: Vec<_> = (0..callers)
        .map(|_| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.search_tracks("Ado", 5).await })
        })
        .collect();

    for handle in handles {
        let tracks = handle.await.unwrap().unwrap();
        assert_eq!(tracks.len(), 5);
    }
}

#[tokio::test]
async fn test_concurrent_callers_share_one_token_refresh() {
    let (addr, state) = start_fake_spotify().await;
    let client = Arc::new(client_for(addr));

    search_concurrently(client, 10).await;

    assert_eq!(state.token_calls.load(Ordering::SeqCst), 1);
    assert_eq!(state.search_calls.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn test_expired_token_is_refreshed_once() {
    let (addr, state) = start_fake_spotify().await;
    let client = Arc::new(client_for(addr));
    client
        .set_token(AccessToken::new("old", Utc::now() - ChronoDuration::seconds(1)))
        .await;

    search_concurrently(Arc::clone(&client), 10).await;

    assert_eq!(state.token_calls.load(Ordering::SeqCst), 1);
    let current = client.tokens().current_token().await.unwrap();
    assert_eq!(current.value(), "token-1");
}

#[tokio::test]
async fn test_valid_token_is_reused() {
    let (addr, state) = start_fake_spotify().await;
    let client = client_for(addr);
    client
        .set_token(AccessToken::new("primed", Utc::now() + ChronoDuration::minutes(30)))
        .await;

    let token = client.ensure_valid_token().await.unwrap();
    client.search_tracks("Ado", 3).await.unwrap();

    assert_eq!(token.value(), "primed");
    assert_eq!(state.token_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rejected_credentials_surface_as_auth_error() {
    let (addr, state) = start_fake_spotify().await;
    state.reject_credentials.store(true, Ordering::SeqCst);
    let client = client_for(addr);

    let err = client.search_tracks("Ado", 5).await.unwrap_err();
    assert!(err.is_auth(), "unexpected error: {err}");
    assert_eq!(state.search_calls.load(Ordering::SeqCst), 0);

    // nothing is cached after a failure, the next call tries again
    state.reject_credentials.store(false, Ordering::SeqCst);
    let tracks = client.search_tracks("Ado", 5).await.unwrap();
    assert_eq!(tracks.len(), 5);
    assert_eq!(state.token_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failed_refresh_is_shared_by_waiting_callers() {
    let (addr, state) = start_fake_spotify().await;
    state.reject_credentials.store(true, Ordering::SeqCst);
    let client = Arc::new(client_for(addr));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.search_tracks("Ado", 5).await })
        })
        .collect();

    for handle in handles {
        let err = handle.await.unwrap().unwrap_err();
        assert!(err.is_auth(), "unexpected error: {err}");
    }
    assert_eq!(state.token_calls.load(Ordering::SeqCst), 1);
    assert_eq!(client.tokens().refresh_count(), 1);
    assert_eq!(state.search_calls.load(Ordering::SeqCst), 0);

    // a caller arriving after the failure gets a fresh attempt
    state.reject_credentials.store(false, Ordering::SeqCst);
    let tracks = client.search_tracks("Ado", 5).await.unwrap();
    assert_eq!(tracks.len(), 5);
    assert_eq!(state.token_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_search_without_matches_is_empty() {
    let (addr, _state) = start_fake_spotify().await;
    let client = client_for(addr);

    let tracks = client.search_tracks("nothing", 10).await.unwrap();
    assert!(tracks.is_empty());
}

#[tokio::test]
async fn test_search_limit_and_track_fields() {
    let (addr, state) = start_fake_spotify().await;
    let client = client_for(addr);

    let tracks = client.search_tracks("Ado", 5).await.unwrap();
    assert_eq!(tracks.len(), 5);
    assert_eq!(state.last_limit.lock().unwrap().as_deref(), Some("5"));

    let first = &tracks[0];
    assert_eq!(first.id, "t1");
    assert_eq!(first.name, "Song t1");
    assert_eq!(first.artists, vec!["Ado", "Guest"]);
    assert_eq!(first.album_name, "Kyougen");
    assert_eq!(first.duration_ms, 201_000);
    assert_eq!(first.popularity, 10);
    assert!(first.audio_features().is_none());

    // oversized limits are clamped to what the endpoint accepts
    client.search_tracks("Ado", 500).await.unwrap();
    assert_eq!(state.last_limit.lock().unwrap().as_deref(), Some("50"));
}

#[tokio::test]
async fn test_zero_limit_skips_the_catalog() {
    let (addr, state) = start_fake_spotify().await;
    let client = client_for(addr);

    let tracks = client.search_tracks("Ado", 0).await.unwrap();

    assert!(tracks.is_empty());
    assert_eq!(state.search_calls.load(Ordering::SeqCst), 0);
    assert_eq!(state.token_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_artist_lookup() {
    let (addr, _state) = start_fake_spotify().await;
    let client = client_for(addr);

    assert_eq!(
        client.get_artist_id("Ado").await.unwrap().as_deref(),
        Some("artist-1")
    );
    assert_eq!(client.get_artist_id("Nobody").await.unwrap(), None);
}

#[tokio::test]
async fn test_top_tracks_keep_catalog_order() {
    let (addr, _state) = start_fake_spotify().await;
    let client = client_for(addr);

    let tracks = client.get_artist_top_tracks("artist-1").await.unwrap();

    let ids: Vec<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["x", "y", "z"]);
}

#[tokio::test]
async fn test_audio_features() {
    let (addr, _state) = start_fake_spotify().await;
    let client = client_for(addr);

    let features = client.get_audio_features("t1").await.unwrap();
    assert_eq!(features.track_id, "t1");
    assert_eq!(features.tempo, 128.0);
    assert_eq!(features.key, 5);

    let err = client.get_audio_features("missing").await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn test_batch_audio_features_skip_unresolved_ids() {
    let (addr, _state) = start_fake_spotify().await;
    let client = client_for(addr);
    let ids = vec!["a".to_string(), "missing".to_string(), "b".to_string()];

    let features = client.get_batch_audio_features(&ids).await.unwrap();

    let resolved: Vec<&str> = features.iter().map(|f| f.track_id.as_str()).collect();
    assert_eq!(resolved, vec!["a", "b"]);
}

#[tokio::test]
async fn test_gateway_errors_are_retried() {
    let (addr, state) = start_fake_spotify().await;
    let client = client_for(addr);

    let tracks = client.search_tracks("flaky", 3).await.unwrap();

    assert_eq!(tracks.len(), 3);
    assert_eq!(state.search_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retries_are_capped() {
    let (addr, state) = start_fake_spotify().await;
    let client = client_for(addr);

    let err = client.search_tracks("down", 3).await.unwrap_err();

    assert!(matches!(err, CatalogError::Status { status: 503, .. }));
    // first attempt plus the default three retries
    assert_eq!(state.search_calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_revoked_token_triggers_reauthentication() {
    let (addr, state) = start_fake_spotify().await;
    let client = client_for(addr);
    client
        .set_token(AccessToken::new(
            REVOKED_TOKEN,
            Utc::now() + ChronoDuration::minutes(30),
        ))
        .await;

    let tracks = client.search_tracks("Ado", 2).await.unwrap();

    assert_eq!(tracks.len(), 2);
    assert_eq!(state.token_calls.load(Ordering::SeqCst), 1);
    assert_eq!(state.search_calls.load(Ordering::SeqCst), 2);
    let current = client.tokens().current_token().await.unwrap();
    assert_eq!(current.value(), "token-1");
}
