//! Next-action prediction
//!
//! Ranks a user's recognized patterns against a query context. A pattern
//! participates only when its stored context snapshot is similar enough to
//! the query; its prediction confidence is that similarity scaled by the
//! pattern's own confidence.

use crate::config::EngineConfig;
use crate::types::{Context, PredictedAction, UserBehaviorPattern};

/// Similarity between two context maps
///
/// `matches / max(|keys1|, |keys2|)` over exact-equal shared keys. Extra
/// unrelated keys in either context dilute the score via the denominator,
/// but only exact-equal shared keys contribute to the numerator. An empty
/// context on either side scores 0.
pub fn context_similarity(a: &Context, b: &Context) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let mut common = 0usize;
    let mut matches = 0usize;
    for (key, value) in &a.0 {
        if let Some(other) = b.0.get(key) {
            common += 1;
            if value == other {
                matches += 1;
            }
        }
    }

    if common == 0 {
        return 0.0;
    }

    matches as f32 / a.len().max(b.len()) as f32
}

/// Ranks candidate next actions for a user
pub struct ActionPredictor {
    similarity_threshold: f32,
    max_predictions: usize,
}

impl ActionPredictor {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold,
            max_predictions: config.max_predictions,
        }
    }

    /// Rank patterns against the query context
    ///
    /// Keeps patterns whose similarity strictly exceeds the threshold,
    /// sorts descending by scaled confidence, and truncates to the
    /// configured limit.
    pub fn rank(
        &self,
        patterns: &[UserBehaviorPattern],
        context: &Context,
    ) -> Vec<PredictedAction> {
        let mut predictions: Vec<PredictedAction> = patterns
            .iter()
            .filter_map(|pattern| {
                let similarity = context_similarity(&pattern.context, context);
                if similarity > self.similarity_threshold {
                    Some(PredictedAction {
                        action: pattern.pattern.clone(),
                        confidence: similarity * pattern.confidence,
                    })
                } else {
                    None
                }
            })
            .collect();

        predictions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        predictions.truncate(self.max_predictions);
        predictions
    }
}
