//! Request validation
//!
//! Field limits for uploaded poems, identifier formats, and the structural
//! checks applied to progress documents before they are decoded.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::model::{NewPoem, PoemProgress};

/// Length limits for a string field (trimmed, in chars)
#[derive(Debug, Clone, Copy)]
pub struct StringRule {
    pub required: bool,
    pub min_length: usize,
    pub max_length: usize,
}

pub const TITLE_RULE: StringRule = StringRule {
    required: true,
    min_length: 1,
    max_length: 200,
};

pub const AUTHOR_RULE: StringRule = StringRule {
    required: true,
    min_length: 1,
    max_length: 100,
};

pub const YEAR_RULE: StringRule = StringRule {
    required: false,
    min_length: 0,
    max_length: 50,
};

pub const STANZA_MIN_COUNT: usize = 1;
pub const STANZA_MAX_COUNT: usize = 50;
pub const STANZA_MIN_LENGTH: usize = 1;
pub const STANZA_MAX_LENGTH: usize = 5000;

static USER_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^user_\d+_[a-z0-9]+$").expect("user id pattern is valid"));

/// A rejected request, naming the offending field when there is one
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: Option<String>,
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    pub fn for_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

/// Check one string field against its rule
pub fn validate_string(
    value: Option<&str>,
    field: &str,
    rule: StringRule,
) -> Result<(), ValidationError> {
    let trimmed = value.map(str::trim).unwrap_or("");

    if trimmed.is_empty() {
        if rule.required {
            return Err(ValidationError::for_field(field, format!("{} is required", field)));
        }
        return Ok(());
    }

    let length = trimmed.chars().count();
    if length < rule.min_length {
        return Err(ValidationError::for_field(
            field,
            format!("{} must be at least {} characters long", field, rule.min_length),
        ));
    }
    if length > rule.max_length {
        return Err(ValidationError::for_field(
            field,
            format!("{} must be at most {} characters long", field, rule.max_length),
        ));
    }
    Ok(())
}

/// Check the stanza list of an uploaded poem
pub fn validate_stanzas(stanzas: Option<&[String]>) -> Result<(), ValidationError> {
    let Some(stanzas) = stanzas else {
        return Err(ValidationError::for_field("stanzas", "stanzas must be an array"));
    };

    if stanzas.len() < STANZA_MIN_COUNT {
        return Err(ValidationError::for_field(
            "stanzas",
            format!("at least {} stanza is required", STANZA_MIN_COUNT),
        ));
    }
    if stanzas.len() > STANZA_MAX_COUNT {
        return Err(ValidationError::for_field(
            "stanzas",
            format!("at most {} stanzas are allowed", STANZA_MAX_COUNT),
        ));
    }

    for (index, stanza) in stanzas.iter().enumerate() {
        let field = format!("stanzas[{}]", index);
        let length = stanza.trim().chars().count();
        if length == 0 {
            return Err(ValidationError::for_field(
                field,
                format!("stanza {} is empty", index + 1),
            ));
        }
        if length < STANZA_MIN_LENGTH {
            return Err(ValidationError::for_field(
                field,
                format!("stanza {} is too short", index + 1),
            ));
        }
        if length > STANZA_MAX_LENGTH {
            return Err(ValidationError::for_field(
                field,
                format!(
                    "stanza {} is too long (max {} characters)",
                    index + 1,
                    STANZA_MAX_LENGTH
                ),
            ));
        }
    }
    Ok(())
}

/// Check an uploaded poem, field by field in declaration order
pub fn validate_poem(poem: &NewPoem) -> Result<(), ValidationError> {
    validate_string(poem.title.as_deref(), "title", TITLE_RULE)?;
    validate_string(poem.author.as_deref(), "author", AUTHOR_RULE)?;
    validate_string(poem.year.as_deref(), "year", YEAR_RULE)?;
    validate_stanzas(poem.stanzas.as_deref())
}

/// User ids look like `user_<digits>_<lowercase alphanumerics>`
pub fn validate_user_id(user_id: &str) -> Result<(), ValidationError> {
    if user_id.is_empty() {
        return Err(ValidationError::new("user id is missing"));
    }
    if !USER_ID_PATTERN.is_match(user_id) {
        return Err(ValidationError::new(format!("malformed user id: {}", user_id)));
    }
    Ok(())
}

pub fn validate_poem_id(poem_id: &str) -> Result<(), ValidationError> {
    if poem_id.trim().is_empty() {
        return Err(ValidationError::new("poem id is missing"));
    }
    Ok(())
}

/// Structural checks on a raw progress body, then decode it
pub fn validate_progress(body: &Value) -> Result<PoemProgress, ValidationError> {
    let Some(object) = body.as_object() else {
        return Err(ValidationError::new("progress must be a JSON object"));
    };

    if let Some(learning) = object.get("learning").filter(|v| !v.is_null()) {
        let numeric = ["currentRound", "currentStanzaIndex", "repeatCount"]
            .iter()
            .all(|key| learning.get(*key).map_or(false, Value::is_number));
        if !numeric {
            return Err(ValidationError::for_field(
                "learning",
                "learning progress is malformed",
            ));
        }
    }

    if let Some(test) = object.get("test").filter(|v| !v.is_null()) {
        let results_ok = test.get("results").map_or(false, Value::is_array);
        let stats_ok = test.get("stats").map_or(false, Value::is_object);
        if !results_ok || !stats_ok {
            return Err(ValidationError::for_field("test", "test progress is malformed"));
        }
    }

    serde_json::from_value(body.clone())
        .map_err(|e| ValidationError::new(format!("progress is malformed: {}", e)))
}
