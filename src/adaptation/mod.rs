//! Per-user adaptation
//!
//! - **StrategyManager**: evolving per-(user, domain) strategies with a
//!   bounded effectiveness score, adjusted by adaptation calls and feedback
//! - **PersonalizationStore**: per-user free-form preference maps

pub mod personalization;
pub mod strategies;

pub use personalization::PersonalizationStore;
pub use strategies::StrategyManager;
