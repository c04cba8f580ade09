use async_trait::async_trait;

use crate::{
    error::CatalogError, recommend::RecommendationStrategy, spotify::Catalog, types::Track, utils,
};

pub(super) const NAME: &str = "Artist's Top Tracks";

/// Recommends from the primary artist's top tracks, most popular first.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtistSimilarity;

#[async_trait]
impl RecommendationStrategy for ArtistSimilarity {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn recommend(
        &self,
        seed: &Track,
        catalog: &dyn Catalog,
        count: usize,
    ) -> Result<Vec<Track>, CatalogError> {
        let Some(artist) = seed.primary_artist() else {
            return Ok(Vec::new());
        };

        let Some(artist_id) = catalog.get_artist_id(artist).await? else {
            return Ok(Vec::new());
        };

        let candidates = catalog.get_artist_top_tracks(&artist_id).await?;
        Ok(utils::rank_by_popularity(candidates, &seed.id, count))
    }
}
