//! Append-only learning record history
//!
//! Insertion order is the total order; record timestamps are informational.
//! Appends are O(1) with a minimal critical section so concurrent ingestion
//! paths contend as little as possible.

use crate::types::LearningRecord;
use tokio::sync::RwLock;

/// Ordered, append-only history of ingested records
pub struct RecordHistory {
    records: RwLock<Vec<LearningRecord>>,
}

impl RecordHistory {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Append a record; records are never mutated or deleted afterwards
    pub async fn append(&self, record: LearningRecord) {
        let mut records = self.records.write().await;
        records.push(record);
    }

    /// Number of records ingested so far
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Clone of the full history in insertion order
    pub async fn snapshot(&self) -> Vec<LearningRecord> {
        self.records.read().await.clone()
    }

    /// Replace the history wholesale (snapshot import)
    pub async fn restore(&self, records: Vec<LearningRecord>) {
        let mut guard = self.records.write().await;
        *guard = records;
    }
}

impl Default for RecordHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewLearningRecord, RecordType};
    use serde_json::json;

    #[tokio::test]
    async fn test_append_preserves_insertion_order() {
        let history = RecordHistory::new();
        for i in 0..3 {
            let record =
                NewLearningRecord::new(RecordType::Behavioral, json!(format!("action-{}", i)))
                    .finalize();
            history.append(record).await;
        }

        let snapshot = history.snapshot().await;
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].input, json!("action-0"));
        assert_eq!(snapshot[2].input, json!("action-2"));
    }

    #[tokio::test]
    async fn test_restore_replaces_contents() {
        let history = RecordHistory::new();
        history
            .append(NewLearningRecord::new(RecordType::Adaptive, json!({})).finalize())
            .await;

        let replacement =
            vec![NewLearningRecord::new(RecordType::Supervised, json!({})).finalize()];
        history.restore(replacement).await;

        let snapshot = history.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].record_type, RecordType::Supervised);
    }
}
