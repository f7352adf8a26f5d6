//! Typing-practice state machine (Learning mode)
//!
//! A session walks every stanza of a poem twice. Round 1 is plain
//! copy-typing. In round 2 only the first letter of each word is visible and
//! the user can reveal words by clicking, hovering, or waiting for the idle
//! clock. Each stanza has to be completed three times per round (repeats);
//! within a repeat, a pass that used new hints is followed by another try
//! that reveals only the previous try's hints (fade-out).
//!
//! The session is synchronous and owns no timers: callers feed key events,
//! pointer events and elapsed time.

mod clock;
mod view;


use std::collections::BTreeSet;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::model::{
    Attempt, HintOrigin, LearningProgress, LearningStats, Poem, ProblemWords, Round,
    WordHintTries,
};
use crate::stats::{self, PASSING_PERCENTAGE, REPEATS_PER_STANZA};
use crate::text;

pub use clock::{HintClock, AUTO_HINT_DELAY, TICK_INTERVAL};
pub use view::Cell;

const LAST_REPEAT: u8 = (REPEATS_PER_STANZA - 1) as u8;

/// Comparison rules chosen before a session starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LearningSettings {
    pub case_sensitive: bool,
    pub require_punctuation: bool,
}

/// A single keyboard event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Backspace,
    Space,
    Enter,
}

/// Outcome of one typed character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypedChar {
    /// The target char when correct, the typed char otherwise
    pub ch: char,
    pub correct: bool,
}

/// What a key press did
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    Ignored,
    /// Correct char, cursor advanced
    Correct,
    /// Wrong char recorded, cursor unchanged
    Wrong,
    /// Backspace cleared an outcome
    Erased,
    /// The last target char was typed
    PassComplete(Transition),
}

/// Where a completed pass led
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Same stanza and repeat again, showing the previous try's hints
    NextTry { try_number: u32 },
    /// Same stanza, next repeat
    NextRepeat { repeat: u8 },
    NextStanza { stanza_index: usize },
    /// Round 1 done, round 2 starts at the first stanza
    NextRound,
    Completed(Completion),
}

/// Result of finishing the last stanza of round 2
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Accuracy passed; this progress should be saved
    Persist {
        progress: LearningProgress,
        stats: LearningStats,
    },
    /// Accuracy failed; the session was reset to the beginning
    Discarded { stats: LearningStats },
}

/// In-memory learning state for one poem
#[derive(Debug, Clone)]
pub struct LearningSession {
    stanzas: Vec<String>,
    settings: LearningSettings,

    round: Round,
    stanza_index: usize,
    repeat_count: u8,
    try_number: u32,

    cursor: usize,
    typed: Vec<Option<TypedChar>>,

    hinted_words: BTreeSet<usize>,
    current_try_hints: BTreeSet<usize>,
    hovered_word: Option<usize>,

    attempts: Vec<Attempt>,
    problem_words: ProblemWords,
    word_hint_tries: WordHintTries,

    clock: HintClock,
    finished: bool,

    // Derived from the current stanza
    chars: Vec<char>,
    targets: Vec<usize>,
    words: Vec<usize>,
    word_starts: Vec<bool>,
}

impl LearningSession {
    /// Fresh session at round 1, first stanza
    pub fn new(stanzas: Vec<String>, settings: LearningSettings) -> Self {
        let mut session = Self {
            stanzas,
            settings,
            round: Round::First,
            stanza_index: 0,
            repeat_count: 0,
            try_number: 0,
            cursor: 0,
            typed: Vec::new(),
            hinted_words: BTreeSet::new(),
            current_try_hints: BTreeSet::new(),
            hovered_word: None,
            attempts: Vec::new(),
            problem_words: ProblemWords::new(),
            word_hint_tries: WordHintTries::new(),
            clock: HintClock::default(),
            finished: false,
            chars: Vec::new(),
            targets: Vec::new(),
            words: Vec::new(),
            word_starts: Vec::new(),
        };
        session.load_stanza();
        session
    }

    pub fn for_poem(poem: &Poem, settings: LearningSettings) -> Self {
        Self::new(poem.stanzas.clone(), settings)
    }

    /// Continue from saved progress, or start fresh when there is none
    ///
    /// Only the persisted fields are restored; cursor, typed chars, hints and
    /// the try counter start clean. Progress that does not fit the poem is
    /// ignored.
    pub fn resume(
        stanzas: Vec<String>,
        settings: LearningSettings,
        progress: Option<&LearningProgress>,
    ) -> Self {
        let mut session = Self::new(stanzas, settings);
        let Some(progress) = progress else {
            return session;
        };

        if progress.current_stanza_index >= session.stanzas.len()
            || progress.repeat_count > LAST_REPEAT
        {
            warn!(
                stanza_index = progress.current_stanza_index,
                repeat_count = progress.repeat_count,
                stanza_count = session.stanzas.len(),
                "Saved learning progress does not fit the poem, starting fresh"
            );
            return session;
        }

        session.round = progress.current_round;
        session.stanza_index = progress.current_stanza_index;
        session.repeat_count = progress.repeat_count;
        session.attempts = progress.attempts.clone();
        session.problem_words = progress.problem_words.clone();
        session.word_hint_tries = progress.word_hint_tries.clone();
        session.load_stanza();
        session
    }

    /// Back to round 1, stanza 1, with all history dropped
    pub fn reset(&mut self) {
        self.round = Round::First;
        self.stanza_index = 0;
        self.repeat_count = 0;
        self.try_number = 0;
        self.attempts.clear();
        self.problem_words.clear();
        self.word_hint_tries.clear();
        self.hinted_words.clear();
        self.finished = false;
        self.load_stanza();
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn settings(&self) -> LearningSettings {
        self.settings
    }

    pub fn stanza_count(&self) -> usize {
        self.stanzas.len()
    }

    pub fn round(&self) -> Round {
        self.round
    }

    pub fn stanza_index(&self) -> usize {
        self.stanza_index
    }

    pub fn repeat_count(&self) -> u8 {
        self.repeat_count
    }

    pub fn try_number(&self) -> u32 {
        self.try_number
    }

    /// Position in the target subsequence
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of chars to type in the current stanza
    pub fn target_len(&self) -> usize {
        self.targets.len()
    }

    pub fn current_stanza(&self) -> &str {
        self.stanzas
            .get(self.stanza_index)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn typed(&self, position: usize) -> Option<TypedChar> {
        self.typed.get(position).copied().flatten()
    }

    pub fn hinted_words(&self) -> &BTreeSet<usize> {
        &self.hinted_words
    }

    /// Hints newly used in the current try
    pub fn current_try_hints(&self) -> &BTreeSet<usize> {
        &self.current_try_hints
    }

    pub fn hovered_word(&self) -> Option<usize> {
        self.hovered_word
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    pub fn problem_words(&self) -> &ProblemWords {
        &self.problem_words
    }

    pub fn word_hint_tries(&self) -> &WordHintTries {
        &self.word_hint_tries
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Time spent idle on the current char
    pub fn time_on_char(&self) -> Duration {
        self.clock.elapsed()
    }

    pub fn clock(&self) -> &HintClock {
        &self.clock
    }

    /// Word under the cursor, if any chars are left to type
    pub fn current_word(&self) -> Option<usize> {
        self.targets
            .get(self.cursor)
            .and_then(|pos| self.words.get(*pos))
            .copied()
    }

    pub fn word_count(&self) -> usize {
        text::word_count(self.current_stanza())
    }

    pub fn stats(&self) -> LearningStats {
        stats::learning_stats(&self.attempts)
    }

    /// Completion percentage for display
    pub fn progress_percent(&self) -> f64 {
        stats::progress_percent(
            self.stanzas.len(),
            self.round,
            self.stanza_index,
            self.repeat_count,
        )
    }

    /// The persisted part of the session
    pub fn progress(&self) -> LearningProgress {
        LearningProgress {
            current_round: self.round,
            current_stanza_index: self.stanza_index,
            repeat_count: self.repeat_count,
            attempts: self.attempts.clone(),
            problem_words: self.problem_words.clone(),
            word_hint_tries: self.word_hint_tries.clone(),
            last_updated: None,
        }
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Handle one key press
    pub fn press(&mut self, key: KeyInput) -> KeyOutcome {
        if self.finished {
            return KeyOutcome::Ignored;
        }

        match key {
            KeyInput::Enter if self.targets.is_empty() => {
                // Nothing to type in this stanza; Enter acknowledges it
                self.record_attempt();
                KeyOutcome::PassComplete(self.complete_pass())
            }
            KeyInput::Space | KeyInput::Enter => KeyOutcome::Ignored,
            KeyInput::Backspace => self.backspace(),
            KeyInput::Char(c) if c.is_whitespace() => KeyOutcome::Ignored,
            KeyInput::Char(c) => self.type_char(c),
        }
    }

    fn backspace(&mut self) -> KeyOutcome {
        if let Some(slot) = self.typed.get_mut(self.cursor) {
            if slot.take().is_some() {
                return KeyOutcome::Erased;
            }
        }
        if self.cursor == 0 {
            return KeyOutcome::Ignored;
        }
        self.cursor -= 1;
        self.typed[self.cursor] = None;
        self.rearm_clock();
        KeyOutcome::Erased
    }

    fn type_char(&mut self, c: char) -> KeyOutcome {
        let Some(&position) = self.targets.get(self.cursor) else {
            return KeyOutcome::Ignored;
        };
        let target = self.chars[position];
        let correct = text::chars_match(c, target, self.settings.case_sensitive);

        self.typed[self.cursor] = Some(TypedChar {
            ch: if correct { target } else { c },
            correct,
        });

        if !correct {
            return KeyOutcome::Wrong;
        }

        self.cursor += 1;
        if self.cursor >= self.targets.len() {
            self.record_attempt();
            return KeyOutcome::PassComplete(self.complete_pass());
        }
        self.rearm_clock();
        KeyOutcome::Correct
    }

    /// Reveal a word on explicit request
    ///
    /// Returns true when this counted as a new hint for the current try.
    pub fn click_word(&mut self, word: usize) -> bool {
        if !self.hints_enabled() || word >= self.word_count() {
            return false;
        }
        let new_hint = self.record_hint(word, HintOrigin::Click, true);
        if self.hinted_words.insert(word) {
            self.rearm_clock();
        }
        new_hint
    }

    /// Pointer entered or left a word
    ///
    /// Entering shows the word while hovered and counts as a hint unless the
    /// word is already revealed or was already used in this try.
    pub fn hover_word(&mut self, word: usize, entering: bool) -> bool {
        if !self.hints_enabled() || word >= self.word_count() {
            return false;
        }
        if !entering {
            self.hovered_word = None;
            return false;
        }
        self.hovered_word = Some(word);
        if self.hinted_words.contains(&word) {
            return false;
        }
        self.record_hint(word, HintOrigin::Hover, false)
    }

    /// Feed elapsed time to the idle clock
    ///
    /// Returns the word revealed by the automatic hint, if it fired.
    pub fn tick(&mut self, elapsed: Duration) -> Option<usize> {
        if !self.hints_enabled() || !self.clock.advance(elapsed) {
            return None;
        }
        let word = self.current_word()?;
        self.record_hint(word, HintOrigin::Auto, false);
        self.hinted_words.insert(word);
        self.rearm_clock();
        debug!(
            stanza = self.stanza_index,
            word,
            try_number = self.try_number,
            "Automatic hint revealed word"
        );
        Some(word)
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    fn hints_enabled(&self) -> bool {
        self.round == Round::Second && !self.finished
    }

    fn record_attempt(&mut self) {
        self.attempts.push(Attempt {
            stanza_index: self.stanza_index,
            round: self.round,
            correct: true,
            repeat: self.repeat_count,
        });
    }

    /// Mark `word` as used in this try; false if it already was
    fn record_hint(&mut self, word: usize, origin: HintOrigin, overwrite_origin: bool) -> bool {
        if !self.current_try_hints.insert(word) {
            return false;
        }
        self.word_hint_tries
            .entry(self.stanza_index)
            .or_default()
            .insert(word, self.try_number);
        let origins = self.problem_words.entry(self.stanza_index).or_default();
        if overwrite_origin {
            origins.insert(word, origin);
        } else {
            origins.entry(word).or_insert(origin);
        }
        true
    }

    fn complete_pass(&mut self) -> Transition {
        let had_new_hints = self.round == Round::Second && !self.current_try_hints.is_empty();
        self.reset_pass();

        if had_new_hints {
            self.try_number += 1;
            let previous_try = self.try_number - 1;
            self.hinted_words = self
                .word_hint_tries
                .get(&self.stanza_index)
                .map(|tries| {
                    tries
                        .iter()
                        .filter(|(_, used_in)| **used_in == previous_try)
                        .map(|(word, _)| *word)
                        .collect()
                })
                .unwrap_or_default();
            self.rearm_clock();
            debug!(
                stanza = self.stanza_index,
                repeat = self.repeat_count,
                try_number = self.try_number,
                revealed = self.hinted_words.len(),
                "Hints used, repeating try"
            );
            return Transition::NextTry {
                try_number: self.try_number,
            };
        }

        self.try_number = 0;

        if self.repeat_count < LAST_REPEAT {
            self.hinted_words = self
                .problem_words
                .get(&self.stanza_index)
                .map(|words| words.keys().copied().collect())
                .unwrap_or_default();
            self.repeat_count += 1;
            self.rearm_clock();
            return Transition::NextRepeat {
                repeat: self.repeat_count,
            };
        }

        self.hinted_words.clear();
        self.word_hint_tries.clear();

        if self.stanza_index + 1 < self.stanzas.len() {
            self.stanza_index += 1;
            self.repeat_count = 0;
            self.load_stanza();
            return Transition::NextStanza {
                stanza_index: self.stanza_index,
            };
        }

        if self.round == Round::First {
            self.round = Round::Second;
            self.stanza_index = 0;
            self.repeat_count = 0;
            self.load_stanza();
            info!("Round 1 complete, starting round 2");
            return Transition::NextRound;
        }

        Transition::Completed(self.finish())
    }

    fn finish(&mut self) -> Completion {
        let stats = self.stats();
        if stats.percentage >= PASSING_PERCENTAGE {
            self.finished = true;
            self.clock.disarm();
            info!(
                percentage = stats.percentage,
                attempts = stats.total_attempts,
                "Learning session complete"
            );
            Completion::Persist {
                progress: self.progress(),
                stats,
            }
        } else {
            info!(
                percentage = stats.percentage,
                required = PASSING_PERCENTAGE,
                "Learning session below passing accuracy, discarding"
            );
            self.reset();
            Completion::Discarded { stats }
        }
    }

    /// Clear per-pass state: cursor, typed chars, this try's hints, hover
    fn reset_pass(&mut self) {
        self.cursor = 0;
        self.typed = vec![None; self.targets.len()];
        self.current_try_hints.clear();
        self.hovered_word = None;
        self.clock.disarm();
    }

    fn load_stanza(&mut self) {
        let stanza = self.current_stanza().to_string();
        self.chars = stanza.chars().collect();
        self.targets = text::target_indices(&stanza, self.settings.require_punctuation);
        self.words = text::word_map(&stanza);
        self.word_starts = text::word_starts(&stanza);
        self.reset_pass();
        self.rearm_clock();
    }

    /// Arm the idle clock for the char under the cursor, or disarm it when
    /// hints are off, nothing is left to type, or the word is revealed
    fn rearm_clock(&mut self) {
        let word = self.current_word();
        match word {
            Some(word) if self.hints_enabled() && !self.hinted_words.contains(&word) => {
                self.clock.arm()
            }
            _ => self.clock.disarm(),
        }
    }
}
