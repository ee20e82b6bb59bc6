//! Shared API key for the external tracking endpoint.

use std::path::Path;

use rand::RngCore;

use crate::Result;

/// Read the API key from the secret file, generating and persisting a fresh
/// 32-byte hex key on first use.
pub fn load_or_generate(path: &Path) -> Result<String> {
    if path.exists() {
        return Ok(std::fs::read_to_string(path)?.trim().to_string());
    }

    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let key = hex::encode(bytes);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &key)?;
    tracing::info!("Generated API key at {}", path.display());
    Ok(key)
}

/// Constant-time key comparison to prevent timing attacks.
pub fn verify_key(expected: &str, provided: &str) -> bool {
    let (a, b) = (expected.as_bytes(), provided.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    // XOR all bytes and accumulate - takes same time regardless of where
    // a mismatch occurs.
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
