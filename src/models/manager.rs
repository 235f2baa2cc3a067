//! Model registry
//!
//! Explicitly created models accumulate training examples and recompute
//! their accuracy from the feedback those examples carry. Per-user models
//! (`user_<userId>_<type>`) are get-or-create: supervised ingestion feeds
//! them correctness scores that are folded in with an exponential moving
//! average, so recent examples weigh more than old ones.

use crate::config::EngineConfig;
use crate::error::{MetisError, Result};
use crate::types::{LearningModel, ModelId, RecordType, TrainingExample};
use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Registry of named learning models
pub struct ModelManager {
    neutral_accuracy: f32,
    accuracy_smoothing: f32,
    models: RwLock<HashMap<ModelId, LearningModel>>,
}

impl ModelManager {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            neutral_accuracy: config.neutral_accuracy,
            accuracy_smoothing: config.accuracy_smoothing,
            models: RwLock::new(HashMap::new()),
        }
    }

    /// Create a model with a fresh random id
    pub async fn create(
        &self,
        model_type: RecordType,
        parameters: BTreeMap<String, Value>,
    ) -> LearningModel {
        let now = Utc::now();
        let model = LearningModel {
            id: ModelId::random(),
            model_type,
            version: 1,
            parameters,
            training_data: Vec::new(),
            accuracy: self.calculate_accuracy(&[]),
            created_at: now,
            updated_at: now,
        };

        info!(model_id = %model.id, model_type = %model.model_type, "Created learning model");
        let mut models = self.models.write().await;
        models.insert(model.id.clone(), model.clone());
        model
    }

    /// Append training data to an existing model
    ///
    /// Bumps the version, stamps `updated_at`, and recomputes accuracy from
    /// the full accumulated data. Fails with `ModelNotFound` for unknown ids.
    pub async fn update(
        &self,
        model_id: &ModelId,
        new_training_data: Vec<TrainingExample>,
    ) -> Result<LearningModel> {
        let mut models = self.models.write().await;
        let model = models
            .get_mut(model_id)
            .ok_or_else(|| MetisError::ModelNotFound(model_id.clone()))?;

        model.training_data.extend(new_training_data);
        model.version += 1;
        model.updated_at = Utc::now();
        model.accuracy = self.calculate_accuracy(&model.training_data);

        debug!(
            model_id = %model.id,
            version = model.version,
            accuracy = model.accuracy,
            examples = model.training_data.len(),
            "Updated learning model"
        );
        Ok(model.clone())
    }

    /// Accuracy derived from feedback-bearing training examples
    ///
    /// Helpful count over feedback-bearing count; the neutral prior when no
    /// example carries feedback.
    fn calculate_accuracy(&self, training_data: &[TrainingExample]) -> f32 {
        let with_feedback: Vec<_> = training_data
            .iter()
            .filter_map(|example| example.feedback.as_ref())
            .collect();

        if with_feedback.is_empty() {
            return self.neutral_accuracy;
        }

        let helpful = with_feedback
            .iter()
            .filter(|f| f.helpful == Some(true))
            .count();
        helpful as f32 / with_feedback.len() as f32
    }

    /// Get-or-create the per-user model for `record_type` and fold in a
    /// correctness score
    ///
    /// This is the one place models come into existence implicitly; the
    /// canonical `user_<userId>_<type>` id keeps the side effect observable
    /// through `get`/`list`. The version is untouched: only training-data
    /// appends bump it.
    pub async fn update_user_model(
        &self,
        user_id: &str,
        record_type: RecordType,
        score: f32,
    ) -> LearningModel {
        let id = ModelId::for_user(user_id, &record_type);
        let now = Utc::now();

        let mut models = self.models.write().await;
        let model = models.entry(id.clone()).or_insert_with(|| {
            info!(model_id = %id, user_id, "Creating user model");
            LearningModel {
                id: id.clone(),
                model_type: record_type,
                version: 1,
                parameters: BTreeMap::new(),
                training_data: Vec::new(),
                accuracy: self.neutral_accuracy,
                created_at: now,
                updated_at: now,
            }
        });

        model.accuracy = smoothed_accuracy(model.accuracy, score, self.accuracy_smoothing);
        model.updated_at = now;
        model.clone()
    }

    /// Pure lookup; never creates
    pub async fn get(&self, model_id: &ModelId) -> Option<LearningModel> {
        let models = self.models.read().await;
        models.get(model_id).cloned()
    }

    /// All models, unordered
    pub async fn list(&self) -> Vec<LearningModel> {
        let models = self.models.read().await;
        models.values().cloned().collect()
    }

    /// Model id → accuracy, for analytics
    pub async fn accuracy_by_model(&self) -> BTreeMap<String, f32> {
        let models = self.models.read().await;
        models
            .values()
            .map(|m| (m.id.to_string(), m.accuracy))
            .collect()
    }

    /// All models for snapshot export
    pub async fn snapshot(&self) -> Vec<LearningModel> {
        let mut all = self.list().await;
        all.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        all
    }

    /// Rebuild the registry from a snapshot
    pub async fn restore(&self, snapshot: Vec<LearningModel>) {
        let rebuilt = snapshot.into_iter().map(|m| (m.id.clone(), m)).collect();
        let mut models = self.models.write().await;
        *models = rebuilt;
    }
}

/// Exponential moving average of accuracy, clamped to [0, 1]
fn smoothed_accuracy(previous: f32, score: f32, smoothing: f32) -> f32 {
    ((1.0 - smoothing) * previous + smoothing * score).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Feedback;
    use proptest::prelude::*;
    use serde_json::json;

    fn manager() -> ModelManager {
        ModelManager::new(&EngineConfig::default())
    }

    fn with_feedback(helpful: bool) -> TrainingExample {
        TrainingExample {
            feedback: Some(Feedback {
                helpful: Some(helpful),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fresh_model_is_neutral() {
        let manager = manager();
        let model = manager.create(RecordType::Supervised, BTreeMap::new()).await;

        assert_eq!(model.version, 1);
        assert!(model.training_data.is_empty());
        assert_eq!(model.accuracy, 0.5);
    }

    #[tokio::test]
    async fn test_update_appends_and_bumps_version() {
        let manager = manager();
        let model = manager.create(RecordType::Supervised, BTreeMap::new()).await;

        let updated = manager
            .update(&model.id, vec![with_feedback(true), with_feedback(false)])
            .await
            .unwrap();

        assert_eq!(updated.version, 2);
        assert_eq!(updated.training_data.len(), 2);
        // One helpful of two feedback-bearing entries
        assert_eq!(updated.accuracy, 0.5);
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn test_update_unknown_model_is_not_found() {
        let manager = manager();
        let err = manager
            .update(&ModelId::from("missing"), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, MetisError::ModelNotFound(_)));
    }

    #[tokio::test]
    async fn test_feedbackless_data_keeps_neutral_accuracy() {
        let manager = manager();
        let model = manager.create(RecordType::Supervised, BTreeMap::new()).await;

        let example = TrainingExample {
            input: Some(json!("x")),
            ..Default::default()
        };
        let updated = manager.update(&model.id, vec![example]).await.unwrap();

        assert_eq!(updated.accuracy, 0.5);
        assert_eq!(updated.version, 2);
    }

    #[tokio::test]
    async fn test_accuracy_counts_only_feedback_entries() {
        let manager = manager();
        let model = manager.create(RecordType::Supervised, BTreeMap::new()).await;

        let examples = vec![
            with_feedback(true),
            with_feedback(true),
            with_feedback(false),
            TrainingExample::default(),
        ];
        let updated = manager.update(&model.id, examples).await.unwrap();

        // 2 helpful of 3 feedback-bearing; the bare entry is ignored
        assert!((updated.accuracy - 2.0 / 3.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_user_model_get_or_create_and_ema() {
        let manager = manager();
        let model = manager
            .update_user_model("u1", RecordType::Supervised, 1.0)
            .await;

        assert_eq!(model.id.as_str(), "user_u1_supervised");
        // 0.9 * 0.5 + 0.1 * 1.0
        assert!((model.accuracy - 0.55).abs() < 1e-6);
        assert_eq!(model.version, 1);

        let again = manager
            .update_user_model("u1", RecordType::Supervised, 0.0)
            .await;
        // 0.9 * 0.55 + 0.1 * 0.0
        assert!((again.accuracy - 0.495).abs() < 1e-6);
        // Still the same model, visible through explicit lookup
        assert_eq!(manager.list().await.len(), 1);
        assert!(manager.get(&again.id).await.is_some());
    }

    #[tokio::test]
    async fn test_user_model_does_not_bump_version() {
        let manager = manager();
        for _ in 0..5 {
            manager
                .update_user_model("u1", RecordType::Supervised, 0.8)
                .await;
        }
        let model = manager
            .get(&ModelId::for_user("u1", &RecordType::Supervised))
            .await
            .unwrap();
        assert_eq!(model.version, 1);
    }

    #[tokio::test]
    async fn test_accuracy_by_model() {
        let manager = manager();
        let a = manager.create(RecordType::Supervised, BTreeMap::new()).await;
        manager
            .update(&a.id, vec![with_feedback(true)])
            .await
            .unwrap();
        manager
            .update_user_model("u1", RecordType::Supervised, 1.0)
            .await;

        let accuracies = manager.accuracy_by_model().await;
        assert_eq!(accuracies.len(), 2);
        assert_eq!(accuracies.get(a.id.as_str()), Some(&1.0));
    }

    #[tokio::test]
    async fn test_snapshot_restore_round_trip() {
        let manager = manager();
        let model = manager.create(RecordType::Supervised, BTreeMap::new()).await;
        manager
            .update(&model.id, vec![with_feedback(true)])
            .await
            .unwrap();

        let snapshot = manager.snapshot().await;
        let restored = ModelManager::new(&EngineConfig::default());
        restored.restore(snapshot.clone()).await;

        assert_eq!(restored.snapshot().await, snapshot);
    }

    proptest! {
        #[test]
        fn prop_smoothed_accuracy_stays_bounded(
            start in 0.0f32..=1.0,
            scores in proptest::collection::vec(0.0f32..=1.0, 0..100),
        ) {
            let mut accuracy = start;
            for score in scores {
                accuracy = smoothed_accuracy(accuracy, score, 0.1);
                prop_assert!((0.0..=1.0).contains(&accuracy));
            }
        }
    }
}
