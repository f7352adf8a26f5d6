//! Progress and accuracy calculations

use crate::model::{Attempt, LearningStats, Round, TestResult, TestStats};

/// Completions required per stanza within a round
pub const REPEATS_PER_STANZA: usize = 3;

/// Rounds in a full learning session
pub const ROUNDS: usize = 2;

/// Minimum accuracy (percent) for a finished session to be kept
pub const PASSING_PERCENTAGE: u32 = 90;

/// Learning completion as a percentage (0-100)
///
/// Display only; nothing gates on it.
pub fn progress_percent(stanza_count: usize, round: Round, stanza_index: usize, repeat_count: u8) -> f64 {
    if stanza_count == 0 {
        return 0.0;
    }
    let total = stanza_count * REPEATS_PER_STANZA * ROUNDS;
    let done = (round.number() as usize - 1) * stanza_count * REPEATS_PER_STANZA
        + stanza_index * REPEATS_PER_STANZA
        + repeat_count as usize;
    done as f64 / total as f64 * 100.0
}

fn rounded_percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u32
}

pub fn learning_stats(attempts: &[Attempt]) -> LearningStats {
    let correct = attempts.iter().filter(|a| a.correct).count();
    LearningStats {
        total_attempts: attempts.len(),
        correct_attempts: correct,
        percentage: rounded_percentage(correct, attempts.len()),
    }
}

pub fn test_stats(results: &[TestResult]) -> TestStats {
    let correct = results.iter().filter(|r| r.correct).count();
    TestStats {
        total_answers: results.len(),
        correct_answers: correct,
        percentage: rounded_percentage(correct, results.len()),
    }
}
