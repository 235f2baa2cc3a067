//! Metis - Adaptive Learning Core for IDE Cognitive Assistance
//!
//! A Rust-based learning-and-adaptation engine that ingests signals about
//! what a user does and how they react to suggestions, and turns them into:
//! - Recognized behavior patterns with frequency/confidence/recency
//! - Ranked predictions of a user's next action
//! - Per-(user, domain) adaptation strategies with bounded effectiveness
//! - Lightweight learning models whose accuracy tracks feedback over time
//!
//! # Architecture
//!
//! The system is organized into several layers:
//! - **Types**: Core data structures (LearningRecord, UserBehaviorPattern, etc.)
//! - **Store**: Append-only record history and the atom-sink boundary to the
//!   host's knowledge store
//! - **Behavior / Adaptation / Models**: The stateful learning components
//! - **Engine**: The facade tying ingestion, dispatch, queries, and
//!   snapshots together
//!
//! # Example
//!
//! ```ignore
//! use metis_core::{Context, EngineConfig, LearningEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = LearningEngine::new(EngineConfig::default());
//!
//!     // Observe a user action
//!     let ctx: Context = [("file_type", serde_json::json!("rs"))]
//!         .into_iter()
//!         .collect();
//!     engine.learn_user_behavior("u1", "save-file", ctx.clone()).await?;
//!
//!     // Predict what the user does next
//!     let predictions = engine.predict_user_action("u1", &ctx).await;
//!
//!     Ok(())
//! }
//! ```

pub mod adaptation;
pub mod analytics;
pub mod behavior;
pub mod config;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod models;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use analytics::LearningStats;
pub use config::EngineConfig;
pub use engine::{EngineSnapshot, LearningEngine};
pub use error::{MetisError, Result};
pub use store::{AtomSink, MemoryAtomStore};
pub use types::{
    AdaptationStrategy, Atom, AtomId, AtomType, Context, Feedback, FeedbackPriority,
    LearningModel, LearningRecord, ModelId, NewLearningRecord, PersonalizationProfile,
    PredictedAction, RecordType, StrategyKey, TrainingExample, TruthValue, UserBehaviorPattern,
};
