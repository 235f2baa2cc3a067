//! Adaptation strategy management
//!
//! One strategy per (user, domain) pair, created lazily on the first
//! explicit adaptation and then evolved in place. Feedback adjusts the
//! effectiveness score but never creates a strategy: feedback may
//! legitimately arrive for a pair that was never adapted, and that case is
//! skipped rather than erroring.

use crate::config::EngineConfig;
use crate::types::{AdaptationStrategy, Context, Feedback, StrategyKey};
use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

/// Fallback domain when feedback context names no task
const GENERAL_DOMAIN: &str = "general";

/// Registry of per-(user, domain) adaptation strategies
pub struct StrategyManager {
    initial_effectiveness: f32,
    effectiveness_step: f32,
    strategies: RwLock<HashMap<StrategyKey, AdaptationStrategy>>,
}

impl StrategyManager {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            initial_effectiveness: config.initial_effectiveness,
            effectiveness_step: config.effectiveness_step,
            strategies: RwLock::new(HashMap::new()),
        }
    }

    /// Get-or-create the strategy for (user, domain) and fold in `data`
    ///
    /// Shallow merge, last write wins per key; effectiveness rises by one
    /// step, capped at 1.0. Returns a clone of the updated strategy.
    pub async fn adapt(
        &self,
        user_id: &str,
        domain: &str,
        data: BTreeMap<String, Value>,
    ) -> AdaptationStrategy {
        let key = StrategyKey::new(user_id, domain);
        let now = Utc::now();

        let mut strategies = self.strategies.write().await;
        let strategy = strategies.entry(key.clone()).or_insert_with(|| {
            debug!(user_id, domain, "Creating adaptation strategy");
            AdaptationStrategy {
                id: key.to_string(),
                user_id: user_id.to_string(),
                domain: domain.to_string(),
                strategy: BTreeMap::new(),
                effectiveness: self.initial_effectiveness,
                last_updated: now,
            }
        });

        strategy.strategy.extend(data);
        strategy.effectiveness = adjusted(strategy.effectiveness, true, self.effectiveness_step);
        strategy.last_updated = now;
        strategy.clone()
    }

    /// Adjust the effectiveness of an existing strategy from feedback
    ///
    /// The domain is the context's current task, falling back to "general".
    /// Returns the updated strategy, or `None` when no strategy exists for
    /// the pair (best-effort: skipped, never created).
    pub async fn apply_feedback(
        &self,
        user_id: &str,
        feedback: &Feedback,
        context: &Context,
    ) -> Option<AdaptationStrategy> {
        let domain = context.current_task().unwrap_or(GENERAL_DOMAIN);
        let key = StrategyKey::new(user_id, domain);

        let mut strategies = self.strategies.write().await;
        match strategies.get_mut(&key) {
            Some(strategy) => {
                let helpful = feedback.helpful == Some(true);
                strategy.effectiveness =
                    adjusted(strategy.effectiveness, helpful, self.effectiveness_step);
                strategy.last_updated = Utc::now();
                debug!(
                    user_id,
                    domain,
                    helpful,
                    effectiveness = strategy.effectiveness,
                    "Adjusted strategy from feedback"
                );
                Some(strategy.clone())
            }
            None => {
                debug!(user_id, domain, "No strategy for feedback, skipping");
                None
            }
        }
    }

    /// Pure lookup; never creates
    pub async fn get(&self, user_id: &str, domain: &str) -> Option<AdaptationStrategy> {
        let strategies = self.strategies.read().await;
        strategies.get(&StrategyKey::new(user_id, domain)).cloned()
    }

    /// Number of live strategies
    pub async fn count(&self) -> usize {
        self.strategies.read().await.len()
    }

    /// All strategies for snapshot export
    pub async fn snapshot(&self) -> Vec<AdaptationStrategy> {
        let strategies = self.strategies.read().await;
        let mut all: Vec<AdaptationStrategy> = strategies.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Rebuild the registry from a snapshot
    pub async fn restore(&self, snapshot: Vec<AdaptationStrategy>) {
        let rebuilt = snapshot.into_iter().map(|s| (s.key(), s)).collect();
        let mut strategies = self.strategies.write().await;
        *strategies = rebuilt;
    }
}

/// Effectiveness after one adjustment, clamped to [0, 1]
fn adjusted(effectiveness: f32, helpful: bool, step: f32) -> f32 {
    let delta = if helpful { step } else { -step };
    (effectiveness + delta).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn manager() -> StrategyManager {
        StrategyManager::new(&EngineConfig::default())
    }

    fn data(pairs: &[(&str, serde_json::Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn feedback(helpful: bool) -> Feedback {
        Feedback {
            helpful: Some(helpful),
            ..Default::default()
        }
    }

    fn task_ctx(task: &str) -> Context {
        [("current_task", json!(task))].into_iter().collect()
    }

    #[tokio::test]
    async fn test_adapt_creates_with_bumped_effectiveness() {
        let manager = manager();
        let strategy = manager
            .adapt("u1", "debugging", data(&[("verbose", json!(true))]))
            .await;

        assert_eq!(strategy.id, "u1_debugging");
        // Created at 0.5, bumped to 0.6 by the adaptation itself
        assert!((strategy.effectiveness - 0.6).abs() < 1e-6);
        assert_eq!(strategy.strategy.get("verbose"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_adapt_merges_last_write_wins() {
        let manager = manager();
        manager
            .adapt("u1", "debugging", data(&[("verbose", json!(true))]))
            .await;
        let updated = manager
            .adapt(
                "u1",
                "debugging",
                data(&[("verbose", json!(false)), ("depth", json!(2))]),
            )
            .await;

        assert_eq!(updated.strategy.get("verbose"), Some(&json!(false)));
        assert_eq!(updated.strategy.get("depth"), Some(&json!(2)));
        assert!((updated.effectiveness - 0.7).abs() < 1e-6);
        assert_eq!(manager.count().await, 1);
    }

    #[tokio::test]
    async fn test_effectiveness_caps_at_one() {
        let manager = manager();
        for _ in 0..10 {
            manager.adapt("u1", "debugging", BTreeMap::new()).await;
        }
        let strategy = manager.get("u1", "debugging").await.unwrap();
        assert_eq!(strategy.effectiveness, 1.0);
    }

    #[tokio::test]
    async fn test_feedback_adjusts_existing() {
        let manager = manager();
        manager.adapt("u1", "debugging", BTreeMap::new()).await;

        let up = manager
            .apply_feedback("u1", &feedback(true), &task_ctx("debugging"))
            .await
            .unwrap();
        assert!((up.effectiveness - 0.7).abs() < 1e-6);

        let down = manager
            .apply_feedback("u1", &feedback(false), &task_ctx("debugging"))
            .await
            .unwrap();
        assert!((down.effectiveness - 0.6).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_feedback_without_task_targets_general() {
        let manager = manager();
        manager.adapt("u1", "general", BTreeMap::new()).await;

        let updated = manager
            .apply_feedback("u1", &feedback(true), &Context::new())
            .await
            .unwrap();
        assert_eq!(updated.domain, "general");
    }

    #[tokio::test]
    async fn test_feedback_never_creates() {
        let manager = manager();
        let result = manager
            .apply_feedback("u1", &feedback(true), &task_ctx("debugging"))
            .await;

        assert!(result.is_none());
        assert_eq!(manager.count().await, 0);
        assert!(manager.get("u1", "debugging").await.is_none());
    }

    #[tokio::test]
    async fn test_absent_helpful_counts_as_unhelpful() {
        let manager = manager();
        manager.adapt("u1", "debugging", BTreeMap::new()).await;

        let updated = manager
            .apply_feedback("u1", &Feedback::default(), &task_ctx("debugging"))
            .await
            .unwrap();
        assert!((updated.effectiveness - 0.5).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_effectiveness_floors_at_zero() {
        let manager = manager();
        manager.adapt("u1", "debugging", BTreeMap::new()).await;
        for _ in 0..10 {
            manager
                .apply_feedback("u1", &feedback(false), &task_ctx("debugging"))
                .await;
        }
        let strategy = manager.get("u1", "debugging").await.unwrap();
        assert_eq!(strategy.effectiveness, 0.0);
    }

    #[tokio::test]
    async fn test_snapshot_restore_round_trip() {
        let manager = manager();
        manager
            .adapt("u1", "debugging", data(&[("verbose", json!(true))]))
            .await;
        manager.adapt("u2", "general", BTreeMap::new()).await;

        let snapshot = manager.snapshot().await;
        let restored = StrategyManager::new(&EngineConfig::default());
        restored.restore(snapshot.clone()).await;

        assert_eq!(restored.snapshot().await, snapshot);
        assert!(restored.get("u1", "debugging").await.is_some());
    }

    proptest! {
        #[test]
        fn prop_effectiveness_stays_bounded(
            start in 0.0f32..=1.0,
            votes in proptest::collection::vec(any::<bool>(), 0..200),
        ) {
            let mut effectiveness = start;
            for helpful in votes {
                effectiveness = adjusted(effectiveness, helpful, 0.1);
                prop_assert!((0.0..=1.0).contains(&effectiveness));
            }
        }
    }
}
