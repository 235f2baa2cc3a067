//! Behavior pattern tracking
//!
//! Maintains one live pattern per distinct (user, action) pair. Repeat
//! observations bump frequency and confidence and replace the stored context
//! snapshot; patterns are never deleted. Each upsert happens under a single
//! write-lock acquisition, so a pattern is always updated as one atomic
//! read-modify-write unit.

use crate::config::EngineConfig;
use crate::types::{Context, UserBehaviorPattern};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Per-user registry of recognized action patterns
pub struct BehaviorTracker {
    initial_confidence: f32,
    confidence_step: f32,
    // user id → action label → pattern
    patterns: RwLock<HashMap<String, HashMap<String, UserBehaviorPattern>>>,
}

impl BehaviorTracker {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            initial_confidence: config.initial_pattern_confidence,
            confidence_step: config.pattern_confidence_step,
            patterns: RwLock::new(HashMap::new()),
        }
    }

    /// Upsert the pattern for (user, action)
    ///
    /// Returns a clone of the pattern after the update.
    pub async fn update_behavior_patterns(
        &self,
        user_id: &str,
        action: &str,
        context: &Context,
    ) -> UserBehaviorPattern {
        let now = Utc::now();
        let mut patterns = self.patterns.write().await;
        let user_patterns = patterns.entry(user_id.to_string()).or_default();

        match user_patterns.get_mut(action) {
            Some(existing) => {
                existing.frequency += 1;
                existing.last_seen = now;
                existing.confidence = bumped_confidence(existing.confidence, self.confidence_step);
                existing.context = context.clone();
                debug!(
                    user_id,
                    action,
                    frequency = existing.frequency,
                    "Reinforced behavior pattern"
                );
                existing.clone()
            }
            None => {
                let fresh = UserBehaviorPattern {
                    id: Uuid::new_v4(),
                    user_id: user_id.to_string(),
                    pattern: action.to_string(),
                    frequency: 1,
                    context: context.clone(),
                    confidence: self.initial_confidence,
                    discovered: now,
                    last_seen: now,
                };
                debug!(user_id, action, "Discovered behavior pattern");
                user_patterns.insert(action.to_string(), fresh.clone());
                fresh
            }
        }
    }

    /// All patterns for a user; empty if the user is unknown
    pub async fn patterns_for_user(&self, user_id: &str) -> Vec<UserBehaviorPattern> {
        let patterns = self.patterns.read().await;
        patterns
            .get(user_id)
            .map(|p| p.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Total pattern count across all users
    pub async fn total_patterns(&self) -> usize {
        let patterns = self.patterns.read().await;
        patterns.values().map(HashMap::len).sum()
    }

    /// Flatten all patterns for snapshot export
    pub async fn snapshot(&self) -> Vec<UserBehaviorPattern> {
        let patterns = self.patterns.read().await;
        let mut all: Vec<UserBehaviorPattern> = patterns
            .values()
            .flat_map(|p| p.values().cloned())
            .collect();
        all.sort_by(|a, b| (&a.user_id, &a.pattern).cmp(&(&b.user_id, &b.pattern)));
        all
    }

    /// Rebuild the registry from a snapshot
    pub async fn restore(&self, snapshot: Vec<UserBehaviorPattern>) {
        let mut rebuilt: HashMap<String, HashMap<String, UserBehaviorPattern>> = HashMap::new();
        for pattern in snapshot {
            rebuilt
                .entry(pattern.user_id.clone())
                .or_default()
                .insert(pattern.pattern.clone(), pattern);
        }
        let mut patterns = self.patterns.write().await;
        *patterns = rebuilt;
    }
}

/// Confidence after one repeat observation, capped at 1.0
fn bumped_confidence(confidence: f32, step: f32) -> f32 {
    (confidence + step).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn tracker() -> BehaviorTracker {
        BehaviorTracker::new(&EngineConfig::default())
    }

    fn ctx(file_type: &str) -> Context {
        [("file_type", json!(file_type))].into_iter().collect()
    }

    #[tokio::test]
    async fn test_first_occurrence_creates_pattern() {
        let tracker = tracker();
        let pattern = tracker
            .update_behavior_patterns("u1", "save-file", &ctx("ts"))
            .await;

        assert_eq!(pattern.frequency, 1);
        assert_eq!(pattern.confidence, 0.5);
        assert_eq!(pattern.pattern, "save-file");
        assert_eq!(pattern.user_id, "u1");
        assert_eq!(pattern.discovered, pattern.last_seen);
    }

    #[tokio::test]
    async fn test_repeat_occurrences_reinforce() {
        let tracker = tracker();
        tracker
            .update_behavior_patterns("u1", "save-file", &ctx("ts"))
            .await;
        tracker
            .update_behavior_patterns("u1", "save-file", &ctx("ts"))
            .await;
        let third = tracker
            .update_behavior_patterns("u1", "save-file", &ctx("rs"))
            .await;

        assert_eq!(third.frequency, 3);
        assert!((third.confidence - 0.52).abs() < 1e-6);
        // Context is replaced with the latest snapshot
        assert_eq!(third.context.get("file_type"), Some(&json!("rs")));
        assert!(third.last_seen >= third.discovered);

        // Still a single live pattern for the pair
        let all = tracker.patterns_for_user("u1").await;
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_actions_are_distinct_patterns() {
        let tracker = tracker();
        tracker
            .update_behavior_patterns("u1", "save-file", &ctx("ts"))
            .await;
        tracker
            .update_behavior_patterns("u1", "run-tests", &ctx("ts"))
            .await;
        tracker
            .update_behavior_patterns("u2", "save-file", &ctx("ts"))
            .await;

        assert_eq!(tracker.patterns_for_user("u1").await.len(), 2);
        assert_eq!(tracker.patterns_for_user("u2").await.len(), 1);
        assert_eq!(tracker.total_patterns().await, 3);
    }

    #[tokio::test]
    async fn test_unknown_user_is_empty() {
        let tracker = tracker();
        assert!(tracker.patterns_for_user("nobody").await.is_empty());
    }

    #[tokio::test]
    async fn test_confidence_caps_at_one() {
        let tracker = tracker();
        for _ in 0..60 {
            tracker
                .update_behavior_patterns("u1", "save-file", &ctx("ts"))
                .await;
        }
        let patterns = tracker.patterns_for_user("u1").await;
        assert_eq!(patterns[0].frequency, 60);
        assert!(patterns[0].confidence <= 1.0);
    }

    #[tokio::test]
    async fn test_snapshot_restore_round_trip() {
        let tracker = tracker();
        tracker
            .update_behavior_patterns("u1", "save-file", &ctx("ts"))
            .await;
        tracker
            .update_behavior_patterns("u2", "run-tests", &ctx("rs"))
            .await;

        let snapshot = tracker.snapshot().await;
        let restored = BehaviorTracker::new(&EngineConfig::default());
        restored.restore(snapshot.clone()).await;

        assert_eq!(restored.snapshot().await, snapshot);
    }

    proptest! {
        #[test]
        fn prop_confidence_stays_bounded_and_non_decreasing(
            start in 0.0f32..=1.0,
            steps in proptest::collection::vec(0.0f32..=0.1, 0..100),
        ) {
            let mut confidence = start;
            for step in steps {
                let next = bumped_confidence(confidence, step);
                prop_assert!(next >= confidence);
                prop_assert!(next <= 1.0);
                confidence = next;
            }
        }
    }
}
