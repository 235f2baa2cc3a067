//! Aggregate learning analytics
//!
//! Purely derived counts and accuracies over the engine's stores; assembling
//! a report never mutates anything.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of learning activity across all components
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningStats {
    /// Records ingested since startup (or snapshot import)
    pub total_learning_records: usize,

    /// Model id → current accuracy estimate
    pub model_accuracy: BTreeMap<String, f32>,

    /// Live (user, domain) adaptation strategies
    pub user_adaptations: usize,

    /// Recognized behavior patterns across all users
    pub behavior_patterns: usize,
}
