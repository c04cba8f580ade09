use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    error::CatalogError,
    recommend::RecommendationStrategy,
    spotify::Catalog,
    types::{AudioFeatures, Track},
    utils,
};

pub(super) const NAME: &str = "Audio Similarity-Based";

/// Ranks the primary artist's tracks by how close their audio features are to
/// the seed's. Candidates the catalog has no features for are skipped.
#[derive(Debug, Clone)]
pub struct AudioSimilarity {
    pool_size: usize,
}

impl AudioSimilarity {
    pub fn new(pool_size: usize) -> Self {
        Self { pool_size }
    }
}

#[async_trait]
impl RecommendationStrategy for AudioSimilarity {
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

        let seed_features = catalog.get_audio_features(&seed.id).await?;

        let mut candidates = catalog.search_tracks(artist, self.pool_size).await?;
        utils::exclude_seed(&mut candidates, &seed.id);
        // one feature lookup and one ranked slot per track
        utils::dedup_by_id(&mut candidates);
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let ids: Vec<String> = candidates.iter().map(|t| t.id.clone()).collect();
        let mut features: HashMap<String, AudioFeatures> = catalog
            .get_batch_audio_features(&ids)
            .await?
            .into_iter()
            .map(|f| (f.track_id.clone(), f))
            .collect();

        Ok(rank_by_distance(candidates, &mut features, &seed_features, count))
    }
}

/// Attaches features to each candidate, drops the ones without any, and keeps
/// the `count` closest to `seed`. Equal distances keep catalog order.
fn rank_by_distance(
    candidates: Vec<Track>,
    features: &mut HashMap<String, AudioFeatures>,
    seed: &AudioFeatures,
    count: usize,
) -> Vec<Track> {
    let mut scored: Vec<(f64, Track)> = candidates
        .into_iter()
        .filter_map(|mut track| {
            let f = features.remove(&track.id)?;
            let distance = seed.distance(&f);
            track.attach_features(f).ok()?;
            Some((distance, track))
        })
        .collect();

    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored.into_iter().take(count).map(|(_, t)| t).collect()
}
