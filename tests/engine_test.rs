mod common;

use std::sync::{Arc, atomic::Ordering};

use common::{StubCatalog, track};
use tokio::sync::Notify;
use tunerec::{
    recommend::{RecommendationEngine, StrategyKind},
    spotify::Catalog,
    types::Track,
};

fn seed() -> Track {
    Track::seed("seed", "Odo", "Ado", "Kyougen")
}

#[tokio::test]
async fn test_strategy_swap_does_not_affect_call_in_flight() {
    let entered = Arc::new(Notify::new());
    let gate = Arc::new(Notify::new());
    let catalog: Arc<dyn Catalog> = Arc::new(StubCatalog {
        search_results: vec![track("a", "Ado", 30), track("b", "Ado", 70)],
        artist_id: Some("artist-1".to_string()),
        top_tracks: vec![track("top", "Ado", 99)],
        search_entered: Some(Arc::clone(&entered)),
        search_gate: Some(Arc::clone(&gate)),
        ..StubCatalog::default()
    });
    let engine = Arc::new(RecommendationEngine::new(
        StrategyKind::Popularity.build(50),
        catalog,
    ));

    let in_flight = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.get_recommendations(&seed(), 10).await })
    };

    entered.notified().await;
    engine.set_strategy(StrategyKind::Artist.build(50));
    gate.notify_one();

    let first = in_flight.await.unwrap().unwrap();
    assert_eq!(first.strategy, "Popularity-Based");
    let ids: Vec<&str> = first.tracks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);

    let second = engine.get_recommendations(&seed(), 10).await.unwrap();
    assert_eq!(second.strategy, "Artist's Top Tracks");
    assert_eq!(second.tracks.len(), 1);
    assert_eq!(second.tracks[0].id, "top");
}

#[tokio::test]
async fn test_zero_count_skips_catalog() {
    let stub = Arc::new(StubCatalog::with_search(vec![track("a", "Ado", 30)]));
    let catalog: Arc<dyn Catalog> = stub.clone();
    let engine = RecommendationEngine::new(StrategyKind::Popularity.build(50), catalog);

    let recs = engine.get_recommendations(&seed(), 0).await.unwrap();

    assert!(recs.tracks.is_empty());
    assert_eq!(recs.strategy, "Popularity-Based");
    assert_eq!(stub.search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_strategy_name_follows_swaps() {
    let catalog: Arc<dyn Catalog> = Arc::new(StubCatalog::default());
    let engine = RecommendationEngine::new(StrategyKind::Popularity.build(50), catalog);
    assert_eq!(engine.strategy_name(), "Popularity-Based");

    engine.set_strategy(StrategyKind::Audio.build(50));
    assert_eq!(engine.strategy_name(), "Audio Similarity-Based");

    engine.set_strategy(StrategyKind::Artist.build(50));
    assert_eq!(engine.strategy_name(), "Artist's Top Tracks");
}

#[tokio::test]
async fn test_concurrent_calls_share_one_engine() {
    let catalog: Arc<dyn Catalog> = Arc::new(StubCatalog::with_search(vec![
        track("a", "Ado", 10),
        track("b", "Ado", 20),
        track("c", "Ado", 30),
    ]));
    let engine = Arc::new(RecommendationEngine::new(
        StrategyKind::Popularity.build(50),
        catalog,
    ));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.get_recommendations(&seed(), 2).await })
        })
        .collect();

    for handle in handles {
        let recs = handle.await.unwrap().unwrap();
        let ids: Vec<&str> = recs.tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }
}
