//! Poem and progress data model
//!
//! These types are the JSON wire format shared by the server and the trainer,
//! and the on-disk format of `poems.json` / `progress.json`. Field names are
//! camelCase on the wire.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored poem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poem {
    /// Opaque identifier minted by the server
    pub id: String,
    pub title: String,
    pub author: String,
    /// Free-form year, empty when not given
    #[serde(default)]
    pub year: String,
    /// Ordered stanza texts
    pub stanzas: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Upload body for a new poem
///
/// Every field is optional at the decoding level so that validation can
/// report which field is missing instead of a generic decode failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPoem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default)]
    pub stanzas: Option<Vec<String>>,
}

impl NewPoem {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        year: Option<String>,
        stanzas: Vec<String>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            author: Some(author.into()),
            year,
            stanzas: Some(stanzas),
        }
    }
}

/// Learning round: first pass without hints, second pass with hints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Round {
    First,
    Second,
}

impl Round {
    /// Round number as stored (1 or 2)
    pub fn number(self) -> u8 {
        match self {
            Round::First => 1,
            Round::Second => 2,
        }
    }
}

impl From<Round> for u8 {
    fn from(round: Round) -> u8 {
        round.number()
    }
}

impl TryFrom<u8> for Round {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Round::First),
            2 => Ok(Round::Second),
            other => Err(format!("invalid round {}, expected 1 or 2", other)),
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// How a word hint was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintOrigin {
    /// Revealed by the idle timer
    Auto,
    /// Explicitly clicked
    Click,
    /// Peeked at by hovering
    Hover,
}

impl fmt::Display for HintOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            HintOrigin::Auto => "auto",
            HintOrigin::Click => "click",
            HintOrigin::Hover => "hover",
        };
        f.write_str(tag)
    }
}

/// One completed pass over a stanza
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub stanza_index: usize,
    pub round: Round,
    pub correct: bool,
    pub repeat: u8,
}

/// stanza index -> word index -> origin of the first hint for that word
pub type ProblemWords = BTreeMap<usize, BTreeMap<usize, HintOrigin>>;

/// stanza index -> word index -> try number the hint was used in
pub type WordHintTries = BTreeMap<usize, BTreeMap<usize, u32>>;

/// Persisted Learning mode state for one poem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningProgress {
    pub current_round: Round,
    pub current_stanza_index: usize,
    pub repeat_count: u8,
    #[serde(default)]
    pub attempts: Vec<Attempt>,
    #[serde(default)]
    pub problem_words: ProblemWords,
    #[serde(default)]
    pub word_hint_tries: WordHintTries,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Answer to one stanza in Test mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub stanza_index: usize,
    pub correct: bool,
    pub user_answer: String,
}

/// Aggregate Test mode statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStats {
    pub total_answers: usize,
    pub correct_answers: usize,
    /// Rounded percentage (0-100)
    pub percentage: u32,
}

/// Aggregate Learning mode statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStats {
    pub total_attempts: usize,
    pub correct_attempts: usize,
    /// Rounded percentage (0-100)
    pub percentage: u32,
}

/// Persisted Test mode outcome for one poem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestProgress {
    pub results: Vec<TestResult>,
    pub stats: TestStats,
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Everything stored for one user and one poem
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoemProgress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning: Option<LearningProgress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<TestProgress>,
    /// Stamped by the server on every write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// poem id -> progress, for one user
pub type UserProgress = BTreeMap<String, PoemProgress>;

/// user id -> poem id -> progress; the layout of `progress.json`
pub type ProgressDocument = BTreeMap<String, UserProgress>;
