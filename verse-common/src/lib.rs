//! # Verse Common Library
//!
//! Shared code for the verse server and trainer including:
//! - Poem and progress data model (JSON wire format)
//! - Text rules (target characters, word tokenization, normalization)
//! - Request validation
//! - The typing-practice state machine (Learning mode)
//! - Test mode and statistics
//! - Configuration loading and data folder resolution

pub mod config;
pub mod error;
pub mod learning;
pub mod model;
pub mod stats;
pub mod test_mode;
pub mod text;
pub mod time;
pub mod validation;

pub use error::{Error, Result};
pub use learning::{LearningSession, LearningSettings};
pub use model::{Poem, PoemProgress};
