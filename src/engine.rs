//! Learning engine facade
//!
//! Wires the record history, atom sink, behavior tracker, predictor,
//! strategy manager, model manager, and personalization store behind one
//! entry surface. Every ingestion entry point writes through the record
//! store and then dispatches to the component whose state it updates;
//! queries are pure reads.

use crate::adaptation::{PersonalizationStore, StrategyManager};
use crate::analytics::LearningStats;
use crate::behavior::{ActionPredictor, BehaviorTracker};
use crate::config::EngineConfig;
use crate::error::{MetisError, Result};
use crate::feedback::determine_priority;
use crate::models::ModelManager;
use crate::store::{AtomSink, MemoryAtomStore, RecordHistory};
use crate::types::{
    AdaptationStrategy, Atom, Context, Feedback, LearningModel, LearningRecord, ModelId,
    NewLearningRecord, PersonalizationProfile, PredictedAction, RecordType, TrainingExample,
    UserBehaviorPattern,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// The learning-and-adaptation core
///
/// Cheap to share: wrap in an `Arc` and call from as many request handlers
/// as needed. Each logical record (one pattern, one strategy, one model, one
/// profile) is updated atomically; updates to different records only contend
/// on their component's map lock.
pub struct LearningEngine {
    config: EngineConfig,
    history: RecordHistory,
    atoms: Arc<dyn AtomSink>,
    tracker: BehaviorTracker,
    predictor: ActionPredictor,
    strategies: StrategyManager,
    models: ModelManager,
    profiles: PersonalizationStore,
}

impl LearningEngine {
    /// Engine with the bundled in-memory atom store
    pub fn new(config: EngineConfig) -> Self {
        Self::with_atom_sink(config, Arc::new(MemoryAtomStore::new()))
    }

    /// Engine writing atoms through a host-provided knowledge store
    pub fn with_atom_sink(config: EngineConfig, atoms: Arc<dyn AtomSink>) -> Self {
        Self {
            tracker: BehaviorTracker::new(&config),
            predictor: ActionPredictor::new(&config),
            strategies: StrategyManager::new(&config),
            models: ModelManager::new(&config),
            profiles: PersonalizationStore::new(),
            history: RecordHistory::new(),
            atoms,
            config,
        }
    }

    // === Ingestion ===

    /// Ingest a learning event
    ///
    /// Enriches the draft (timestamp, session id), appends it to the
    /// history, dispatches by record type, and records a "learning
    /// occurred" atom. A rejected atom write fails the call.
    pub async fn learn(&self, draft: NewLearningRecord) -> Result<()> {
        if let RecordType::Other(tag) = &draft.record_type {
            if tag.trim().is_empty() {
                return Err(MetisError::InvalidInput(
                    "learning record is missing a type".to_string(),
                ));
            }
        }

        let record = draft.finalize();
        debug!(
            record_id = %record.id,
            record_type = %record.record_type,
            session_id = %record.session_id,
            "Ingesting learning record"
        );

        self.history.append(record.clone()).await;

        match record.record_type {
            RecordType::Supervised => self.process_supervised(&record).await,
            RecordType::Behavioral => self.process_behavioral(&record).await,
            // Recorded but otherwise inert at this layer
            _ => {}
        }

        let atom = Atom::for_learning_record(&record, self.config.record_truth);
        self.atoms.add_atom(atom).await?;
        Ok(())
    }

    /// Supervised examples feed the owning user's model accuracy
    async fn process_supervised(&self, record: &LearningRecord) {
        let (Some(expected), Some(user_id)) =
            (&record.expected_output, record.context.user_id())
        else {
            return;
        };

        // Correctness from comparing the realized outcome to the expected
        // output; neutral when no outcome was carried with the record.
        let score = match record.feedback.as_ref().and_then(|f| f.outcome.as_ref()) {
            Some(outcome) if outcome == expected => 1.0,
            Some(_) => 0.0,
            None => self.config.neutral_accuracy,
        };

        self.models
            .update_user_model(user_id, RecordType::Supervised, score)
            .await;
    }

    /// Behavioral records carrying an `{"action": ...}` payload feed the
    /// pattern tracker
    async fn process_behavioral(&self, record: &LearningRecord) {
        let Some(user_id) = record.context.user_id() else {
            return;
        };
        let Some(action) = record.input.get("action").and_then(Value::as_str) else {
            return;
        };

        self.tracker
            .update_behavior_patterns(user_id, action, &record.context)
            .await;
    }

    /// Route caller feedback through the record store and into adaptation
    ///
    /// The record is supervised-typed with a classified priority. When the
    /// context names a user, the matching strategy's effectiveness is
    /// adjusted; a pair that was never adapted is skipped silently.
    pub async fn learn_from_feedback(&self, feedback: Feedback, context: Context) -> Result<()> {
        let priority = determine_priority(&feedback);

        let mut draft = NewLearningRecord::new(
            RecordType::Supervised,
            json!({ "feedback": feedback.clone(), "context": context.clone() }),
        );
        draft.feedback = Some(feedback.clone());
        draft.context = context.clone();
        draft.priority = Some(priority);
        self.learn(draft).await?;

        if let Some(user_id) = context.user_id() {
            self.strategies
                .apply_feedback(user_id, &feedback, &context)
                .await;
        }

        Ok(())
    }

    /// Observe a user action
    ///
    /// Records a behavioral event (context enriched with the user) and
    /// updates the pattern for (user, action). The action travels as a
    /// plain string payload, so the record-store dispatch stays inert and
    /// the pattern is counted exactly once per call.
    pub async fn learn_user_behavior(
        &self,
        user_id: &str,
        action: &str,
        context: Context,
    ) -> Result<()> {
        let mut draft = NewLearningRecord::new(RecordType::Behavioral, json!(action));
        draft.context = context.with_user(user_id);
        self.learn(draft).await?;

        self.tracker
            .update_behavior_patterns(user_id, action, &context)
            .await;
        Ok(())
    }

    /// Evolve the (user, domain) strategy with new data
    ///
    /// Creates the strategy on first use, merges `data`, and bumps its
    /// effectiveness. The adjustment is also recorded as an adaptive event.
    pub async fn adapt_to_user(
        &self,
        user_id: &str,
        domain: &str,
        data: BTreeMap<String, Value>,
    ) -> Result<AdaptationStrategy> {
        let mut draft = NewLearningRecord::new(RecordType::Adaptive, json!(data.clone()));
        draft.context = [
            ("user_id", Value::String(user_id.to_string())),
            ("current_task", Value::String(domain.to_string())),
        ]
        .into_iter()
        .collect();
        self.learn(draft).await?;

        Ok(self.strategies.adapt(user_id, domain, data).await)
    }

    /// Merge preferences into the user's profile
    ///
    /// The update is also recorded as a personalization event for audit.
    pub async fn personalize(
        &self,
        user_id: &str,
        preferences: BTreeMap<String, Value>,
    ) -> Result<()> {
        self.profiles.merge(user_id, preferences.clone()).await;

        let mut draft =
            NewLearningRecord::new(RecordType::Personalization, json!(preferences));
        draft.context = [("user_id", Value::String(user_id.to_string()))]
            .into_iter()
            .collect();
        self.learn(draft).await
    }

    // === Model management ===

    /// Explicitly create a model
    pub async fn create_learning_model(
        &self,
        model_type: RecordType,
        parameters: BTreeMap<String, Value>,
    ) -> LearningModel {
        self.models.create(model_type, parameters).await
    }

    /// Append training data to an existing model
    pub async fn update_learning_model(
        &self,
        model_id: &ModelId,
        training_data: Vec<TrainingExample>,
    ) -> Result<LearningModel> {
        self.models.update(model_id, training_data).await
    }

    pub async fn get_learning_model(&self, model_id: &ModelId) -> Option<LearningModel> {
        self.models.get(model_id).await
    }

    pub async fn list_learning_models(&self) -> Vec<LearningModel> {
        self.models.list().await
    }

    // === Queries ===

    /// All recognized patterns for a user; empty for unknown users
    pub async fn get_user_behavior_patterns(&self, user_id: &str) -> Vec<UserBehaviorPattern> {
        self.tracker.patterns_for_user(user_id).await
    }

    /// Ranked next-action predictions for a user in a context
    pub async fn predict_user_action(
        &self,
        user_id: &str,
        context: &Context,
    ) -> Vec<PredictedAction> {
        let patterns = self.tracker.patterns_for_user(user_id).await;
        self.predictor.rank(&patterns, context)
    }

    /// The (user, domain) strategy, if one was ever adapted
    pub async fn get_adaptation_strategy(
        &self,
        user_id: &str,
        domain: &str,
    ) -> Option<AdaptationStrategy> {
        self.strategies.get(user_id, domain).await
    }

    /// The user's preference map; empty for unknown users
    pub async fn get_personalization(&self, user_id: &str) -> BTreeMap<String, Value> {
        self.profiles.preferences(user_id).await
    }

    /// Aggregate counts and accuracies across all components
    pub async fn learning_stats(&self) -> LearningStats {
        LearningStats {
            total_learning_records: self.history.len().await,
            model_accuracy: self.models.accuracy_by_model().await,
            user_adaptations: self.strategies.count().await,
            behavior_patterns: self.tracker.total_patterns().await,
        }
    }

    // === Snapshot ===

    /// Export the full engine state
    pub async fn export_snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            history: self.history.snapshot().await,
            patterns: self.tracker.snapshot().await,
            strategies: self.strategies.snapshot().await,
            models: self.models.snapshot().await,
            profiles: self.profiles.snapshot().await,
        }
    }

    /// Replace the engine state wholesale with a snapshot
    pub async fn import_snapshot(&self, snapshot: EngineSnapshot) {
        self.history.restore(snapshot.history).await;
        self.tracker.restore(snapshot.patterns).await;
        self.strategies.restore(snapshot.strategies).await;
        self.models.restore(snapshot.models).await;
        self.profiles.restore(snapshot.profiles).await;
    }
}

/// Serializable snapshot of the full engine state
///
/// Round-trips losslessly through `export_snapshot`/`import_snapshot`; how
/// and where it is persisted is the host's business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub history: Vec<LearningRecord>,
    pub patterns: Vec<UserBehaviorPattern>,
    pub strategies: Vec<AdaptationStrategy>,
    pub models: Vec<LearningModel>,
    pub profiles: Vec<PersonalizationProfile>,
}

impl EngineSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
