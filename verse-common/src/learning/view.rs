//! What each character of the current stanza should look like
//!
//! Visibility rules live here so every front-end renders the same thing.

use super::LearningSession;
use crate::model::Round;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Not typed (whitespace, or punctuation that is not required)
    Plain(char),
    /// Already typed
    Typed { ch: char, correct: bool },
    /// Round 1: not typed yet, shown in full
    Pending { ch: char, current: bool },
    /// Round 2: first letter of a word, always shown
    Visible { ch: char, word: usize, current: bool },
    /// Round 2: revealed by a hint or hover, shown de-emphasized
    Hinted { ch: char, word: usize, current: bool },
    /// Round 2: concealed
    Hidden { word: usize, current: bool },
}

impl Cell {
    /// True for the cell under the cursor
    pub fn is_current(&self) -> bool {
        match self {
            Cell::Pending { current, .. }
            | Cell::Visible { current, .. }
            | Cell::Hinted { current, .. }
            | Cell::Hidden { current, .. } => *current,
            Cell::Plain(_) | Cell::Typed { .. } => false,
        }
    }
}

impl LearningSession {
    /// One cell per char of the current stanza
    pub fn cells(&self) -> Vec<Cell> {
        let mut target_slot = 0;

        self.chars
            .iter()
            .enumerate()
            .map(|(pos, &ch)| {
                let is_target = self.targets.get(target_slot) == Some(&pos);
                if !is_target {
                    return Cell::Plain(ch);
                }
                let slot = target_slot;
                target_slot += 1;

                if let Some(typed) = self.typed(slot) {
                    return Cell::Typed {
                        ch: typed.ch,
                        correct: typed.correct,
                    };
                }

                let current = slot == self.cursor && !self.finished;
                if self.round == Round::First {
                    return Cell::Pending { ch, current };
                }

                let word = self.words[pos];
                if self.word_starts[pos] {
                    Cell::Visible { ch, word, current }
                } else if self.hinted_words.contains(&word) || self.hovered_word == Some(word) {
                    Cell::Hinted { ch, word, current }
                } else {
                    Cell::Hidden { word, current }
                }
            })
            .collect()
    }
}
