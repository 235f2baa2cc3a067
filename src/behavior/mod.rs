//! User behavior tracking and next-action prediction
//!
//! - **BehaviorTracker**: per-user upsert of (user, action) patterns with
//!   frequency, confidence, and recency
//! - **ActionPredictor**: ranks candidate next actions by context similarity
//!   scaled with pattern confidence

pub mod predictor;
pub mod tracker;

pub use predictor::{context_similarity, ActionPredictor};
pub use tracker::BehaviorTracker;
