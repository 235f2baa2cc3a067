//! Feedback priority classification
//!
//! Low ratings always escalate; a middling rating is worth a look; anything
//! explicitly marked unhelpful escalates even when unrated.

use crate::types::{Feedback, FeedbackPriority};

/// Classify incoming feedback into a routing priority
pub fn determine_priority(feedback: &Feedback) -> FeedbackPriority {
    match feedback.rating {
        Some(rating) if rating <= 2 => FeedbackPriority::High,
        Some(3) => FeedbackPriority::Medium,
        _ => {
            if feedback.helpful == Some(false) {
                FeedbackPriority::High
            } else {
                FeedbackPriority::Low
            }
        }
    }
}
