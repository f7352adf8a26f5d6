//! Client identity
//!
//! Progress on the server is keyed by an opaque id generated once per
//! installation and kept in `identity.toml` in the client state folder.

use std::path::Path;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use verse_common::validation::validate_user_id;
use verse_common::{time, Error, Result};

pub const IDENTITY_FILE: &str = "identity.toml";

const SUFFIX_LEN: usize = 9;
const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    pub fn generate() -> Self {
        Self {
            user_id: generate_user_id(),
            created_at: time::now(),
        }
    }
}

/// `user_<unix millis>_<9 lowercase alphanumerics>`
pub fn generate_user_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("user_{}_{}", time::now_millis(), suffix)
}

/// Read the identity in `dir`, creating it on first use
///
/// An unreadable or malformed identity file is replaced.
pub fn load_or_create(dir: &Path) -> Result<Identity> {
    let path = dir.join(IDENTITY_FILE);

    if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        match toml::from_str::<Identity>(&content) {
            Ok(identity) if validate_user_id(&identity.user_id).is_ok() => return Ok(identity),
            Ok(identity) => {
                warn!(user_id = %identity.user_id, "Stored user id is malformed, generating a new one");
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Identity file is unreadable, generating a new one");
            }
        }
    }

    let identity = Identity::generate();
    std::fs::create_dir_all(dir)?;
    let content = toml::to_string(&identity)
        .map_err(|e| Error::Internal(format!("Failed to encode identity: {}", e)))?;
    std::fs::write(&path, content)?;

    info!(user_id = %identity.user_id, path = %path.display(), "Created client identity");
    Ok(identity)
}
