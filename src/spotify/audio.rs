use crate::{
    error::CatalogError,
    spotify::CatalogClient,
    types::{AudioFeatures, AudioFeaturesBatchResponse},
};

/// Most ids the batch endpoint accepts per request.
pub const AUDIO_FEATURES_BATCH_SIZE: usize = 100;

impl CatalogClient {
    pub async fn get_audio_features(&self, track_id: &str) -> Result<AudioFeatures, CatalogError> {
        let url = self.endpoint(&format!("audio-features/{track_id}"));
        self.get_json(|http| http.get(&url)).await
    }

    /// Fetches features for many tracks. Ids the catalog cannot resolve come
    /// back as `null` and are left out of the result instead of failing the
    /// whole call.
    pub async fn get_batch_audio_features(
        &self,
        ids: &[String],
    ) -> Result<Vec<AudioFeatures>, CatalogError> {
        let url = self.endpoint("audio-features");
        let mut features = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(AUDIO_FEATURES_BATCH_SIZE) {
            let joined = chunk.join(",");
            let res: AudioFeaturesBatchResponse = self
                .get_json(|http| http.get(&url).query(&[("ids", joined.as_str())]))
                .await?;
            features.extend(res.audio_features.into_iter().flatten());
        }

        Ok(features)
    }
}
