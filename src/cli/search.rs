use crate::{
    cli::{ServerConnection, print_tracks, spinner},
    error, success, warning,
};

pub async fn search(address: &str, query: &str, limit: usize) {
    let mut conn = match ServerConnection::connect(address).await {
        Ok(conn) => conn,
        Err(e) => error!("Cannot connect to server at {}. Err: {}", address, e),
    };

    let pb = spinner(&format!("Searching for {query:?}..."));
    let result = conn.search_tracks(query, limit).await;
    pb.finish_and_clear();
    conn.disconnect().await;

    match result {
        Ok(reply) if reply.tracks.is_empty() => warning!("No results found for {:?}.", query),
        Ok(reply) => {
            success!("Found {} tracks.", reply.tracks.len());
            print_tracks(&reply.tracks);
        }
        Err(message) => warning!("Search failed: {}", message),
    }
}
