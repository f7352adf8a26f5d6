//! Test mode: recall each stanza from memory
//!
//! Answers are compared with the stanza after `normalize_text`, so spacing
//! never matters and case and punctuation matter only when the settings say so.

use tracing::debug;

use crate::learning::LearningSettings;
use crate::model::{TestProgress, TestResult};
use crate::stats;
use crate::text::normalize_text;
use crate::time;

/// What a submitted answer led to
#[derive(Debug, Clone, PartialEq)]
pub enum TestStep {
    /// Blank answer, nothing recorded
    Ignored,
    /// Answer recorded; the next stanza is up
    Next { stanza_index: usize, correct: bool },
    /// Last answer recorded; the test is over
    Finished(TestProgress),
}

#[derive(Debug, Clone)]
pub struct TestSession {
    stanzas: Vec<String>,
    settings: LearningSettings,
    stanza_index: usize,
    results: Vec<TestResult>,
}

impl TestSession {
    pub fn new(stanzas: Vec<String>, settings: LearningSettings) -> Self {
        Self {
            stanzas,
            settings,
            stanza_index: 0,
            results: Vec::new(),
        }
    }

    pub fn stanza_index(&self) -> usize {
        self.stanza_index
    }

    pub fn stanza_count(&self) -> usize {
        self.stanzas.len()
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn is_finished(&self) -> bool {
        self.stanza_index >= self.stanzas.len()
    }

    /// True if `answer` matches stanza `index` under the session settings
    pub fn is_correct(&self, index: usize, answer: &str) -> bool {
        let Some(stanza) = self.stanzas.get(index) else {
            return false;
        };
        let LearningSettings {
            case_sensitive,
            require_punctuation,
        } = self.settings;
        normalize_text(answer, case_sensitive, require_punctuation)
            == normalize_text(stanza, case_sensitive, require_punctuation)
    }

    /// Grade the answer for the current stanza
    pub fn submit(&mut self, answer: &str) -> TestStep {
        if answer.trim().is_empty() || self.is_finished() {
            return TestStep::Ignored;
        }

        let index = self.stanza_index;
        let correct = self.is_correct(index, answer);
        self.results.push(TestResult {
            stanza_index: index,
            correct,
            user_answer: answer.to_string(),
        });
        self.stanza_index += 1;
        debug!(stanza = index, correct, "Test answer graded");

        if self.is_finished() {
            return TestStep::Finished(TestProgress {
                results: self.results.clone(),
                stats: stats::test_stats(&self.results),
                completed_at: time::now(),
                last_updated: None,
            });
        }
        TestStep::Next {
            stanza_index: self.stanza_index,
            correct,
        }
    }
}
