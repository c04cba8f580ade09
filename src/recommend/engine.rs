use std::sync::{Arc, PoisonError, RwLock};

use crate::{
    error::CatalogError, info, recommend::RecommendationStrategy, spotify::Catalog, types::Track,
};

/// Result of one engine call, tagged with the strategy that produced it.
#[derive(Debug, Clone)]
pub struct Recommendations {
    pub strategy: &'static str,
    pub tracks: Vec<Track>,
}

/// Runs recommendation requests against the currently active strategy.
///
/// The active strategy can be swapped at any time. Each call captures the
/// strategy once on entry, so a swap never changes the algorithm of a call
/// that already started; it applies to every call started afterwards.
pub struct RecommendationEngine {
    strategy: RwLock<Arc<dyn RecommendationStrategy>>,
    catalog: Arc<dyn Catalog>,
}

impl RecommendationEngine {
    pub fn new(strategy: Arc<dyn RecommendationStrategy>, catalog: Arc<dyn Catalog>) -> Self {
        Self {
            strategy: RwLock::new(strategy),
            catalog,
        }
    }

    pub fn set_strategy(&self, strategy: Arc<dyn RecommendationStrategy>) {
        let name = strategy.name();
        *self
            .strategy
            .write()
            .unwrap_or_else(PoisonError::into_inner) = strategy;
        info!("Switched recommendation strategy to: {}", name);
    }

    pub fn current_strategy(&self) -> Arc<dyn RecommendationStrategy> {
        self.strategy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn strategy_name(&self) -> &'static str {
        self.current_strategy().name()
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    pub async fn get_recommendations(
        &self,
        seed: &Track,
        count: usize,
    ) -> Result<Recommendations, CatalogError> {
        let strategy = self.current_strategy();
        if count == 0 {
            return Ok(Recommendations {
                strategy: strategy.name(),
                tracks: Vec::new(),
            });
        }

        let tracks = strategy
            .recommend(seed, self.catalog.as_ref(), count)
            .await?;
        Ok(Recommendations {
            strategy: strategy.name(),
            tracks,
        })
    }
}
