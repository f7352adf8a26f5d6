//! Text rules shared by Learning and Test mode
//!
//! Positions are char indices into a stanza (not byte offsets). A stanza's
//! *target characters* are the chars the user has to type: letters, plus
//! punctuation when punctuation is required. Whitespace is never typed.
//!
//! Words are maximal runs of non-whitespace chars. Punctuation attached to a
//! word belongs to it, so `"Hello,` is one word no matter which chars are
//! targets.

use unicode_normalization::UnicodeNormalization;

/// Punctuation that can be required in Learning and Test mode
pub const PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':', '\'', '"', '(', ')', '-'];

/// True for alphabetic chars (any script)
pub fn is_letter(c: char) -> bool {
    c.is_alphabetic()
}

/// True for the configurable punctuation set
pub fn is_punctuation(c: char) -> bool {
    PUNCTUATION.contains(&c)
}

/// True if `c` has to be typed under the given punctuation setting
pub fn is_target(c: char, require_punctuation: bool) -> bool {
    is_letter(c) || (require_punctuation && is_punctuation(c))
}

/// Lowercase `c` unless case matters
pub fn normalize_char(c: char, case_sensitive: bool) -> String {
    if case_sensitive {
        c.to_string()
    } else {
        c.to_lowercase().collect()
    }
}

/// Compare a typed char with a target char under the case rule
pub fn chars_match(typed: char, target: char, case_sensitive: bool) -> bool {
    if case_sensitive {
        typed == target
    } else {
        typed.to_lowercase().eq(target.to_lowercase())
    }
}

/// Char positions of the target characters of `text`, in order
pub fn target_indices(text: &str, require_punctuation: bool) -> Vec<usize> {
    text.chars()
        .enumerate()
        .filter(|(_, c)| is_target(*c, require_punctuation))
        .map(|(i, _)| i)
        .collect()
}

/// Index of the word containing char position `pos`
///
/// Whitespace positions report the index of the next word.
pub fn word_index_for_char(text: &str, pos: usize) -> usize {
    let mut word = 0;
    let mut in_word = false;
    for (i, c) in text.chars().enumerate() {
        if c.is_whitespace() {
            if in_word {
                word += 1;
                in_word = false;
            }
        } else {
            in_word = true;
        }
        if i == pos {
            return word;
        }
    }
    word
}

/// Word index for every char position of `text`
pub fn word_map(text: &str) -> Vec<usize> {
    let mut map = Vec::with_capacity(text.len());
    let mut word = 0;
    let mut in_word = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if in_word {
                word += 1;
                in_word = false;
            }
        } else {
            in_word = true;
        }
        map.push(word);
    }
    map
}

/// Number of words in `text`
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// For every char position of `text`, whether it holds the first letter of
/// its word
pub fn word_starts(text: &str) -> Vec<bool> {
    let mut starts = Vec::with_capacity(text.len());
    let mut letter_seen = false;
    for c in text.chars() {
        if c.is_whitespace() {
            letter_seen = false;
            starts.push(false);
        } else if is_letter(c) {
            starts.push(!letter_seen);
            letter_seen = true;
        } else {
            starts.push(false);
        }
    }
    starts
}

/// Normalize a whole answer for Test mode comparison
///
/// Drops the punctuation set unless it is required, drops all whitespace,
/// and lowercases unless case matters.
pub fn normalize_text(text: &str, case_sensitive: bool, require_punctuation: bool) -> String {
    let kept = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .filter(|c| require_punctuation || !is_punctuation(*c));
    if case_sensitive {
        kept.collect()
    } else {
        kept.flat_map(char::to_lowercase).collect()
    }
}

/// Normalize a title or author for duplicate detection
///
/// Lowercases, strips diacritics, drops everything except alphanumerics,
/// `_` and whitespace, collapses whitespace and trims.
pub fn normalize_for_comparison(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a plain-text poem into stanzas on blank lines
pub fn split_stanzas(text: &str) -> Vec<String> {
    let mut stanzas = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                stanzas.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        stanzas.push(current.join("\n"));
    }
    stanzas
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
