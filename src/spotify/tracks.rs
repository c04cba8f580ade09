use crate::{
    error::CatalogError,
    spotify::CatalogClient,
    types::{Track, TrackSearchResponse},
};

/// Upper bound the search endpoint accepts for `limit`.
pub const MAX_SEARCH_LIMIT: usize = 50;

impl CatalogClient {
    /// Searches the catalog for tracks matching a free-text query.
    ///
    /// Returns at most `limit` tracks in the catalog's own ranking. Zero
    /// matches is an empty list, not an error. The limit is clamped to what
    /// the search endpoint accepts; a limit of zero skips the call entirely.
    pub async fn search_tracks(&self, query: &str, limit: usize) -> Result<Vec<Track>, CatalogError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = limit.min(MAX_SEARCH_LIMIT);
        let url = self.endpoint("search");
        let limit_param = limit.to_string();

        let res: TrackSearchResponse = self
            .get_json(|http| {
                http.get(&url).query(&[
                    ("q", query),
                    ("type", "track"),
                    ("limit", limit_param.as_str()),
                ])
            })
            .await?;

        let mut tracks: Vec<Track> = res
            .tracks
            .map(|page| page.items.into_iter().map(Track::from).collect())
            .unwrap_or_default();
        tracks.truncate(limit);
        Ok(tracks)
    }
}
