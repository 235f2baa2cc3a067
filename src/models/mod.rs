//! Learning model management
//!
//! Lightweight accuracy trackers over accumulated training examples. Models
//! are not numerical optimizers: accuracy is derived from feedback signals
//! in the accumulated data, or smoothed from supervised correctness scores
//! for per-user models.

pub mod manager;

pub use manager::ModelManager;
