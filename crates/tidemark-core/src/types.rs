//! Core record and result types

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tidemark_telemetry::estimate_tokens;

/// Observation category. Open set: unrecognised values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObservationType {
    Decision,
    Bugfix,
    Feature,
    Refactor,
    Discovery,
    Change,
    Other(String),
}

impl ObservationType {
    /// Category weights below this are reported as low priority
    pub const LOW_PRIORITY_BELOW: f64 = 0.6;

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "decision" => ObservationType::Decision,
            "bugfix" => ObservationType::Bugfix,
            "feature" => ObservationType::Feature,
            "refactor" => ObservationType::Refactor,
            "discovery" => ObservationType::Discovery,
            "change" => ObservationType::Change,
            _ => ObservationType::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ObservationType::Decision => "decision",
            ObservationType::Bugfix => "bugfix",
            ObservationType::Feature => "feature",
            ObservationType::Refactor => "refactor",
            ObservationType::Discovery => "discovery",
            ObservationType::Change => "change",
            ObservationType::Other(raw) => raw,
        }
    }

    /// Importance weight of the category; unknown categories sit at the midpoint
    pub fn weight(&self) -> f64 {
        match self {
            ObservationType::Decision => 1.0,
            ObservationType::Bugfix => 0.9,
            ObservationType::Feature => 0.8,
            ObservationType::Refactor => 0.7,
            ObservationType::Discovery => 0.5,
            ObservationType::Change => 0.4,
            ObservationType::Other(_) => 0.5,
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            ObservationType::Decision => "⚖️",
            ObservationType::Bugfix => "🔴",
            ObservationType::Feature => "🟣",
            ObservationType::Refactor => "🔄",
            ObservationType::Discovery => "🔵",
            ObservationType::Change => "✅",
            ObservationType::Other(_) => "•",
        }
    }
}

impl From<String> for ObservationType {
    fn from(raw: String) -> Self {
        ObservationType::parse(&raw)
    }
}

impl From<ObservationType> for String {
    fn from(t: ObservationType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for ObservationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic concept tag attached to an observation. Open set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConceptTag {
    ProblemSolution,
    TradeOff,
    WhyItExists,
    Gotcha,
    HowItWorks,
    Pattern,
    WhatChanged,
    Other(String),
}

impl ConceptTag {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "problem-solution" => ConceptTag::ProblemSolution,
            "trade-off" => ConceptTag::TradeOff,
            "why-it-exists" => ConceptTag::WhyItExists,
            "gotcha" => ConceptTag::Gotcha,
            "how-it-works" => ConceptTag::HowItWorks,
            "pattern" => ConceptTag::Pattern,
            "what-changed" => ConceptTag::WhatChanged,
            _ => ConceptTag::Other(raw.to_string()),
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            ConceptTag::ProblemSolution => 1.0,
            ConceptTag::TradeOff => 0.9,
            ConceptTag::WhyItExists | ConceptTag::Gotcha => 0.8,
            ConceptTag::HowItWorks => 0.7,
            ConceptTag::Pattern => 0.6,
            ConceptTag::WhatChanged => 0.4,
            ConceptTag::Other(_) => 0.5,
        }
    }
}

/// Decode a serialized string list; `None` when absent or malformed
fn decode_list(raw: Option<&str>) -> Option<Vec<String>> {
    serde_json::from_str(raw?).ok()
}

/// A stored unit of work knowledge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: i64,
    pub project: String,
    #[serde(rename = "type")]
    pub obs_type: ObservationType,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub narrative: Option<String>,
    /// JSON array of strings, as stored
    pub facts: Option<String>,
    /// JSON array of tag names, as stored
    pub concepts: Option<String>,
    /// Tokens spent producing the observation, 0 when unknown
    #[serde(default)]
    pub discovery_tokens: i64,
    /// Epoch milliseconds
    pub created_at_epoch: i64,
}

impl Observation {
    pub fn facts_list(&self) -> Option<Vec<String>> {
        decode_list(self.facts.as_deref())
    }

    pub fn concept_names(&self) -> Option<Vec<String>> {
        decode_list(self.concepts.as_deref())
    }

    pub fn concept_tags(&self) -> Option<Vec<ConceptTag>> {
        self.concept_names()
            .map(|tags| tags.iter().map(|t| ConceptTag::parse(t)).collect())
    }

    pub fn narrative_len(&self) -> usize {
        self.narrative.as_deref().map_or(0, |n| n.chars().count())
    }

    /// Title, subtitle, narrative, facts and concepts joined by single spaces
    pub fn content_text(&self) -> String {
        [
            self.title.as_deref(),
            self.subtitle.as_deref(),
            self.narrative.as_deref(),
            self.facts.as_deref(),
            self.concepts.as_deref(),
        ]
        .iter()
        .map(|part| part.unwrap_or(""))
        .collect::<Vec<_>>()
        .join(" ")
    }

    pub fn token_estimate(&self) -> usize {
        estimate_tokens(&self.content_text())
    }

    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("(untitled)")
    }

    pub fn key(&self) -> TimelineKey {
        TimelineKey::new(self.created_at_epoch, RecordKind::Observation, self.id)
    }
}

/// Observation payload before the store assigns an id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewObservation {
    pub project: String,
    #[serde(rename = "type")]
    pub obs_type: ObservationType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub narrative: Option<String>,
    #[serde(default)]
    pub facts: Vec<String>,
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub discovery_tokens: i64,
    pub created_at_epoch: i64,
}

/// Session marker; only its position in time matters to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub project: String,
    pub request: Option<String>,
    pub summary: Option<String>,
    pub created_at_epoch: i64,
}

impl SessionRecord {
    pub fn display_title(&self) -> &str {
        self.request
            .as_deref()
            .or(self.summary.as_deref())
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("(session)")
    }

    pub fn content_text(&self) -> String {
        format!(
            "{} {}",
            self.request.as_deref().unwrap_or(""),
            self.summary.as_deref().unwrap_or("")
        )
    }

    pub fn key(&self) -> TimelineKey {
        TimelineKey::new(self.created_at_epoch, RecordKind::Session, self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSession {
    pub project: String,
    #[serde(default)]
    pub request: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    pub created_at_epoch: i64,
}

/// User prompt marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRecord {
    pub id: i64,
    pub project: String,
    pub prompt_text: String,
    pub created_at_epoch: i64,
}

impl PromptRecord {
    pub fn key(&self) -> TimelineKey {
        TimelineKey::new(self.created_at_epoch, RecordKind::Prompt, self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPrompt {
    pub project: String,
    pub prompt_text: String,
    pub created_at_epoch: i64,
}

/// Record kind; declaration order is the tie-break order at equal timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Session,
    Prompt,
    Observation,
}

impl RecordKind {
    pub fn rank(self) -> i64 {
        match self {
            RecordKind::Session => 0,
            RecordKind::Prompt => 1,
            RecordKind::Observation => 2,
        }
    }
}

/// Position of a record in the merged chronological stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimelineKey {
    pub created_at_epoch: i64,
    pub kind: RecordKind,
    pub id: i64,
}

impl TimelineKey {
    pub fn new(created_at_epoch: i64, kind: RecordKind, id: i64) -> Self {
        Self {
            created_at_epoch,
            kind,
            id,
        }
    }
}

/// One entry of the merged observation/session/prompt stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TimelineItem {
    Session(SessionRecord),
    Prompt(PromptRecord),
    Observation(Observation),
}

impl TimelineItem {
    pub fn key(&self) -> TimelineKey {
        match self {
            TimelineItem::Session(s) => s.key(),
            TimelineItem::Prompt(p) => p.key(),
            TimelineItem::Observation(o) => o.key(),
        }
    }

    pub fn project(&self) -> &str {
        match self {
            TimelineItem::Session(s) => &s.project,
            TimelineItem::Prompt(p) => &p.project,
            TimelineItem::Observation(o) => &o.project,
        }
    }
}

/// Lightweight search result: identity and cost, no content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRow {
    pub kind: RecordKind,
    pub id: i64,
    pub created_at_epoch: i64,
    pub glyph: String,
    pub title: String,
    pub read_tokens: usize,
    pub work_tokens: usize,
}

/// Which record kind a search targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Observations,
    Sessions,
    Prompts,
}

impl FromStr for SearchType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "observations" => Ok(SearchType::Observations),
            "sessions" => Ok(SearchType::Sessions),
            "prompts" => Ok(SearchType::Prompts),
            other => Err(Error::invalid(
                "type",
                format!("expected observations, sessions or prompts, got {other:?}"),
            )),
        }
    }
}

/// Result ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    #[default]
    DateDesc,
    DateAsc,
    Relevance,
}

impl FromStr for OrderBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date_desc" => Ok(OrderBy::DateDesc),
            "date_asc" => Ok(OrderBy::DateAsc),
            "relevance" => Ok(OrderBy::Relevance),
            other => Err(Error::invalid(
                "orderBy",
                format!("expected date_desc, date_asc or relevance, got {other:?}"),
            )),
        }
    }
}

/// Project partition a query runs against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectScope {
    Project(String),
    All,
}

impl ProjectScope {
    pub fn as_filter(&self) -> Option<&str> {
        match self {
            ProjectScope::Project(p) => Some(p),
            ProjectScope::All => None,
        }
    }
}

/// A scored observation proposed for removal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShrinkCandidate {
    pub id: i64,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub obs_type: ObservationType,
    pub project: String,
    pub created_at_epoch: i64,
    pub score: f64,
    pub reasons: Vec<String>,
    pub token_count: usize,
}

/// Result of one analyze pass. Candidates are least important first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShrinkAnalysis {
    pub candidates: Vec<ShrinkCandidate>,
    pub total_tokens_saved: usize,
    pub observations_to_remove: usize,
    pub total_observations: usize,
}

impl ShrinkAnalysis {
    pub fn candidate_ids(&self) -> Vec<i64> {
        self.candidates.iter().map(|c| c.id).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShrinkMode {
    Delete,
    Summarize,
}

impl ShrinkMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ShrinkMode::Delete => "delete",
            ShrinkMode::Summarize => "summarize",
        }
    }
}

impl FromStr for ShrinkMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delete" => Ok(ShrinkMode::Delete),
            "summarize" => Ok(ShrinkMode::Summarize),
            other => Err(Error::invalid(
                "mode",
                format!("expected delete or summarize, got {other:?}"),
            )),
        }
    }
}

/// Per-batch accounting from execute; `deleted + failed` equals the input size
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShrinkOutcome {
    pub deleted: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summarized: Option<usize>,
}

impl ShrinkOutcome {
    pub fn total(&self) -> usize {
        self.deleted + self.failed
    }
}
