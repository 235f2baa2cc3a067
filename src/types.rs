//! Core data types for the Metis learning core
//!
//! This module defines the fundamental data structures used throughout metis:
//! learning records, behavior patterns, adaptation strategies, learning models,
//! and the symbolic atoms written into the knowledge store. These types form
//! the shared vocabulary between the engine and its host IDE service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Truth value attached to a symbolic atom
///
/// Strength expresses how strongly the fact holds, confidence how much
/// evidence backs it. Both are kept in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TruthValue {
    /// How strongly the fact holds (0.0 - 1.0)
    pub strength: f32,

    /// How much evidence backs it (0.0 - 1.0)
    pub confidence: f32,
}

impl TruthValue {
    /// Create a truth value, clamping both components into range
    pub fn new(strength: f32, confidence: f32) -> Self {
        Self {
            strength: strength.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Unique identifier for atoms
///
/// Wraps a UUID to provide type safety and prevent mixing atom IDs with
/// other UUID-based identifiers in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AtomId(pub Uuid);

impl AtomId {
    /// Create a new random atom ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AtomId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AtomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Atom type classification
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AtomType {
    /// Records that a learning event occurred
    LearningRecord,

    /// Any other symbolic fact category
    Other(String),
}

impl From<String> for AtomType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "learning_record" => AtomType::LearningRecord,
            _ => AtomType::Other(s),
        }
    }
}

impl From<AtomType> for String {
    fn from(t: AtomType) -> Self {
        t.to_string()
    }
}

impl std::fmt::Display for AtomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtomType::LearningRecord => write!(f, "learning_record"),
            AtomType::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Symbolic fact written into the knowledge store
///
/// Immutable once created; owned exclusively by the atom sink. The learning
/// core only emits atoms, it never queries or reasons over them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atom {
    /// Unique identifier
    pub id: AtomId,

    /// Fact category
    pub atom_type: AtomType,

    /// Human-readable atom name
    pub name: String,

    /// Strength/confidence pair
    pub truth_value: TruthValue,

    /// Links to other atoms
    #[serde(default)]
    pub outgoing: Vec<AtomId>,

    /// Free-form annotations
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl Atom {
    /// Build the "learning occurred" atom for an ingested record
    pub fn for_learning_record(record: &LearningRecord, truth_value: TruthValue) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(
            "record_type".to_string(),
            Value::String(record.record_type.to_string()),
        );
        metadata.insert(
            "session_id".to_string(),
            Value::String(record.session_id.clone()),
        );

        Self {
            id: AtomId::new(),
            atom_type: AtomType::LearningRecord,
            name: format!("learning-record-{}", record.id),
            truth_value,
            outgoing: Vec::new(),
            metadata,
        }
    }
}

/// Learning record classification
///
/// A closed set of known record kinds with an explicit escape arm for
/// categories this layer records but does not interpret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordType {
    /// Example with an expected output, feeds per-user model accuracy
    Supervised,

    /// Observed user action, feeds behavior patterns
    Behavioral,

    /// Preference update, recorded for audit
    Personalization,

    /// Strategy adjustment, recorded for audit
    Adaptive,

    /// Recorded but otherwise inert at this layer
    Other(String),
}

impl RecordType {
    /// String form used on the wire and in model identifiers
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::Supervised => "supervised",
            RecordType::Behavioral => "behavioral",
            RecordType::Personalization => "personalization",
            RecordType::Adaptive => "adaptive",
            RecordType::Other(s) => s,
        }
    }
}

impl From<String> for RecordType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "supervised" => RecordType::Supervised,
            "behavioral" => RecordType::Behavioral,
            "personalization" => RecordType::Personalization,
            "adaptive" => RecordType::Adaptive,
            _ => RecordType::Other(s),
        }
    }
}

impl From<RecordType> for String {
    fn from(t: RecordType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Free-form context map attached to records, patterns, and queries
///
/// Well-known keys: `user_id` identifies the acting user and `current_task`
/// names the active task domain. Everything else is opaque to the engine and
/// only participates in exact-value similarity comparisons.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(pub BTreeMap<String, Value>);

impl Context {
    /// Empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// The acting user, if the context names one
    pub fn user_id(&self) -> Option<&str> {
        self.0.get("user_id").and_then(Value::as_str)
    }

    /// The active task domain, if the context names one
    pub fn current_task(&self) -> Option<&str> {
        self.0.get("current_task").and_then(Value::as_str)
    }

    /// Look up an arbitrary key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Insert or replace a key
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no keys are present
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Clone of this context with `user_id` set
    pub fn with_user(&self, user_id: &str) -> Self {
        let mut ctx = self.clone();
        ctx.insert("user_id", Value::String(user_id.to_string()));
        ctx
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<BTreeMap<String, Value>> for Context {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

/// Caller feedback about a suggestion or outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    /// 1-5 star rating
    #[serde(default)]
    pub rating: Option<u8>,

    /// Whether the suggestion helped
    #[serde(default)]
    pub helpful: Option<bool>,

    /// Realized outcome, compared against expected output when present
    #[serde(default)]
    pub outcome: Option<Value>,

    /// Free-form comment
    #[serde(default)]
    pub comment: Option<String>,
}

/// Priority assigned to routed feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackPriority {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for FeedbackPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedbackPriority::Low => write!(f, "low"),
            FeedbackPriority::Medium => write!(f, "medium"),
            FeedbackPriority::High => write!(f, "high"),
        }
    }
}

/// Fully enriched learning event, append-only once ingested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningRecord {
    // === Identity ===
    /// Unique identifier
    pub id: Uuid,

    /// Record classification, drives ingestion dispatch
    pub record_type: RecordType,

    /// Session this record belongs to
    pub session_id: String,

    /// When the event happened (informational; history order is insertion order)
    pub timestamp: DateTime<Utc>,

    // === Payload ===
    /// Event payload; shape depends on the record type
    pub input: Value,

    /// Expected output for supervised examples
    #[serde(default)]
    pub expected_output: Option<Value>,

    /// Feedback carried with the event
    #[serde(default)]
    pub feedback: Option<Feedback>,

    /// Context the event occurred in
    #[serde(default)]
    pub context: Context,

    /// Routing priority, set by the feedback router
    #[serde(default)]
    pub priority: Option<FeedbackPriority>,
}

/// Caller-facing draft of a learning event
///
/// `timestamp` and `session_id` are optional here; ingestion fills them in
/// (wall clock, fresh v4 UUID) when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLearningRecord {
    /// Record classification
    pub record_type: RecordType,

    /// Event payload
    pub input: Value,

    /// Expected output for supervised examples
    #[serde(default)]
    pub expected_output: Option<Value>,

    /// Feedback carried with the event
    #[serde(default)]
    pub feedback: Option<Feedback>,

    /// Context the event occurred in
    #[serde(default)]
    pub context: Context,

    /// Event time, defaults to now
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    /// Session identifier, defaults to a fresh v4 UUID
    #[serde(default)]
    pub session_id: Option<String>,

    /// Routing priority
    #[serde(default)]
    pub priority: Option<FeedbackPriority>,
}

impl NewLearningRecord {
    /// Minimal draft with just a type and payload
    pub fn new(record_type: RecordType, input: Value) -> Self {
        Self {
            record_type,
            input,
            expected_output: None,
            feedback: None,
            context: Context::new(),
            timestamp: None,
            session_id: None,
            priority: None,
        }
    }

    /// Enrich the draft into a full record
    pub fn finalize(self) -> LearningRecord {
        LearningRecord {
            id: Uuid::new_v4(),
            record_type: self.record_type,
            session_id: self
                .session_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            input: self.input,
            expected_output: self.expected_output,
            feedback: self.feedback,
            context: self.context,
            priority: self.priority,
        }
    }
}

/// Recognized (user, action) pattern with frequency and recency
///
/// One live instance per distinct (user, action) pair; created on first
/// occurrence, updated in place on repeats, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBehaviorPattern {
    /// Unique identifier
    pub id: Uuid,

    /// Owning user
    pub user_id: String,

    /// Action label
    pub pattern: String,

    /// Times observed, monotonically non-decreasing
    pub frequency: u64,

    /// Last-seen context snapshot
    pub context: Context,

    /// Recognition confidence (0.0 - 1.0)
    pub confidence: f32,

    /// First observation
    pub discovered: DateTime<Utc>,

    /// Most recent observation
    pub last_seen: DateTime<Utc>,
}

/// Ranked next-action prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedAction {
    /// Predicted action label
    pub action: String,

    /// Prediction confidence: context similarity scaled by pattern confidence
    pub confidence: f32,
}

/// Composite key for adaptation strategies
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrategyKey {
    /// Owning user
    pub user_id: String,

    /// Task domain (e.g. "debugging", "general")
    pub domain: String,
}

impl StrategyKey {
    pub fn new(user_id: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            domain: domain.into(),
        }
    }
}

impl std::fmt::Display for StrategyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.user_id, self.domain)
    }
}

/// Evolving per-(user, domain) adaptation strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationStrategy {
    /// Stable identifier, `<user>_<domain>`
    pub id: String,

    /// Owning user
    pub user_id: String,

    /// Task domain
    pub domain: String,

    /// Strategy fields, shallow-merged on each adaptation
    pub strategy: BTreeMap<String, Value>,

    /// Bounded effectiveness score (0.0 - 1.0)
    pub effectiveness: f32,

    /// Last mutation time
    pub last_updated: DateTime<Utc>,
}

impl AdaptationStrategy {
    /// Key this strategy is stored under
    pub fn key(&self) -> StrategyKey {
        StrategyKey::new(self.user_id.clone(), self.domain.clone())
    }
}

/// Identifier for learning models
///
/// Per-user models use the canonical `user_<userId>_<type>` form so implicit
/// and explicit lookups agree on the same model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    /// Fresh random identifier for explicitly created models
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Canonical identifier for a user-scoped model of the given type
    pub fn for_user(user_id: &str, record_type: &RecordType) -> Self {
        Self(format!("user_{}_{}", user_id, record_type))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ModelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Single accumulated training example
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    /// Example input
    #[serde(default)]
    pub input: Option<Value>,

    /// Realized or expected output
    #[serde(default)]
    pub output: Option<Value>,

    /// Feedback on the example; only feedback-bearing entries count toward accuracy
    #[serde(default)]
    pub feedback: Option<Feedback>,
}

/// Named accumulator of training examples with a derived accuracy estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningModel {
    /// Model identifier
    pub id: ModelId,

    /// Record type this model learns from
    pub model_type: RecordType,

    /// Bumped on every training-data append, monotonically increasing
    pub version: u32,

    /// Free-form model parameters
    pub parameters: BTreeMap<String, Value>,

    /// Accumulated examples, insertion order
    pub training_data: Vec<TrainingExample>,

    /// Derived accuracy estimate (0.0 - 1.0)
    pub accuracy: f32,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

/// Per-user preference map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizationProfile {
    /// Owning user
    pub user_id: String,

    /// Preference key → value, shallow-merged on each update
    pub preferences: BTreeMap<String, Value>,

    /// Last mutation time
    pub last_updated: DateTime<Utc>,
}
