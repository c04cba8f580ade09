use crate::{
    error::CatalogError,
    spotify::CatalogClient,
    types::{ArtistSearchResponse, TopTracksResponse, Track},
};

impl CatalogClient {
    /// Resolves an artist name to the catalog identifier of the best textual
    /// match. `Ok(None)` means the catalog knows no such artist.
    pub async fn get_artist_id(&self, name: &str) -> Result<Option<String>, CatalogError> {
        let url = self.endpoint("search");

        let res: ArtistSearchResponse = self
            .get_json(|http| {
                http.get(&url)
                    .query(&[("q", name), ("type", "artist"), ("limit", "1")])
            })
            .await?;

        Ok(res
            .artists
            .and_then(|page| page.items.into_iter().next())
            .and_then(|artist| artist.id))
    }

    /// Returns the artist's top tracks in the order the catalog ranks them,
    /// which is not necessarily by popularity.
    pub async fn get_artist_top_tracks(&self, artist_id: &str) -> Result<Vec<Track>, CatalogError> {
        let url = self.endpoint(&format!("artists/{artist_id}/top-tracks"));
        let market = self.config.market.as_str();

        let res: TopTracksResponse = self
            .get_json(|http| http.get(&url).query(&[("market", market)]))
            .await?;

        Ok(res.tracks.into_iter().map(Track::from).collect())
    }
}
