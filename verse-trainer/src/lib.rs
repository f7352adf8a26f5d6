//! verse-trainer library
//!
//! Terminal client for the verse server:
//! - HTTP API client with timeout, retry and error taxonomy
//! - Client identity (per-installation user id)
//! - Learning and Test mode drivers over line-based input

pub mod catalog;
pub mod client;
pub mod identity;
pub mod learn;
pub mod recall;
pub mod render;

pub use client::{ApiClient, ClientError, ErrorKind, RetryPolicy};
