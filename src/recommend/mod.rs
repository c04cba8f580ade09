//! Recommendation strategies and the engine that runs the active one.
//!
//! Every strategy follows the same contract: given a seed track and a catalog,
//! return at most `count` tracks, never the seed itself, in an order that only
//! depends on what the catalog answered.

mod artist;
mod audio;
mod engine;
mod popularity;

use std::{fmt, str::FromStr, sync::Arc};

use async_trait::async_trait;
use clap::ValueEnum;

pub use artist::ArtistSimilarity;
pub use audio::AudioSimilarity;
pub use engine::{RecommendationEngine, Recommendations};
pub use popularity::PopularityBased;

use crate::{error::CatalogError, spotify::Catalog, types::Track};

/// Default number of candidates fetched before scoring.
pub const DEFAULT_POOL_SIZE: usize = 50;

#[async_trait]
pub trait RecommendationStrategy: Send + Sync {
    /// Stable, human-readable name used in responses and logs.
    fn name(&self) -> &'static str;

    async fn recommend(
        &self,
        seed: &Track,
        catalog: &dyn Catalog,
        count: usize,
    ) -> Result<Vec<Track>, CatalogError>;
}

/// The closed set of available strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyKind {
    Popularity,
    Artist,
    Audio,
}

impl StrategyKind {
    pub fn build(self, pool_size: usize) -> Arc<dyn RecommendationStrategy> {
        match self {
            StrategyKind::Popularity => Arc::new(PopularityBased::new(pool_size)),
            StrategyKind::Artist => Arc::new(ArtistSimilarity),
            StrategyKind::Audio => Arc::new(AudioSimilarity::new(pool_size)),
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            StrategyKind::Popularity => popularity::NAME,
            StrategyKind::Artist => artist::NAME,
            StrategyKind::Audio => audio::NAME,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    /// Accepts the short identifiers (`popularity`, `artist`, `audio`) as well
    /// as the display names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        [
            StrategyKind::Popularity,
            StrategyKind::Artist,
            StrategyKind::Audio,
        ]
        .into_iter()
        .find(|kind| {
            kind.display_name().eq_ignore_ascii_case(wanted)
                || kind
                    .to_possible_value()
                    .is_some_and(|v| v.get_name().eq_ignore_ascii_case(wanted))
        })
        .ok_or_else(|| format!("unknown strategy: {wanted}"))
    }
}
