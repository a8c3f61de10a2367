//! Config content hashing for the deploy cache key.

use crate::error::DeployError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 of the raw string bytes, base64-encoded with `+` replaced by `-`
/// so the digest is usable as a stage-variable value.
pub fn hash_str(input: &str) -> String {
    STANDARD
        .encode(Sha256::digest(input.as_bytes()))
        .replace('+', "-")
}

/// Hash of a config value: serialized to JSON text as constructed, then
/// hashed as a string. Key order is NOT normalized, so two configs with the
/// same keys in different order hash differently. The insertion-order
/// sensitivity is part of the cache contract; do not canonicalize here.
pub fn hash_config<T: Serialize>(config: &T) -> Result<String, DeployError> {
    Ok(hash_str(&serde_json::to_string(config)?))
}
