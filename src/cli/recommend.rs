use crate::{
    cli::{ServerConnection, print_tracks, spinner},
    error, info, success, warning,
};

/// Searches for `query`, takes the `pick`-th result (1-based) as seed and asks
/// the server for `count` recommendations.
pub async fn recommend(address: &str, query: &str, pick: usize, count: usize) {
    let mut conn = match ServerConnection::connect(address).await {
        Ok(conn) => conn,
        Err(e) => error!("Cannot connect to server at {}. Err: {}", address, e),
    };

    let pb = spinner(&format!("Searching for {query:?}..."));
    let found = conn.search_tracks(query, pick.max(5)).await;
    pb.finish_and_clear();

    let candidates = match found {
        Ok(reply) => reply.tracks,
        Err(message) => error!("Search failed: {}", message),
    };

    let Some(seed) = candidates.get(pick.saturating_sub(1)) else {
        warning!(
            "Only {} results for {:?}, cannot pick #{}.",
            candidates.len(),
            query,
            pick
        );
        return;
    };
    info!("Seed: {} - {}", seed.name, seed.artists.join(", "));

    let pb = spinner("Fetching recommendations...");
    let result = conn.recommendations(seed, count).await;
    pb.finish_and_clear();
    conn.disconnect().await;

    match result {
        Ok(reply) if reply.tracks.is_empty() => warning!("No recommendations for this seed."),
        Ok(reply) => {
            success!(
                "{} recommendations ({}):",
                reply.tracks.len(),
                reply.strategy.as_deref().unwrap_or("unknown strategy")
            );
            print_tracks(&reply.tracks);
        }
        Err(message) => warning!("Recommendation failed: {}", message),
    }
}
