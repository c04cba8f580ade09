use async_trait::async_trait;

use crate::{
    error::CatalogError, recommend::RecommendationStrategy, spotify::Catalog, types::Track, utils,
};

pub(super) const NAME: &str = "Popularity-Based";

/// Searches the catalog for the seed's primary artist and returns the most
/// popular hits.
#[derive(Debug, Clone)]
pub struct PopularityBased {
    pool_size: usize,
}

impl PopularityBased {
    pub fn new(pool_size: usize) -> Self {
        Self { pool_size }
    }
}

#[async_trait]
impl RecommendationStrategy for PopularityBased {
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

        let candidates = catalog.search_tracks(artist, self.pool_size).await?;
        Ok(utils::rank_by_popularity(candidates, &seed.id, count))
    }
}
