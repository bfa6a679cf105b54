//! Token signing key resolution.
//!
//! An explicitly configured secret wins. Otherwise a random 256-bit key is
//! generated once, written hex-encoded to the key file, and reused on every
//! later start so tokens survive restarts.

use anyhow::{Context, Result};
use rand::RngCore;
use std::io::Write;
use std::path::Path;

/// Generated key length in bytes.
const KEY_BYTES: usize = 32;

/// Resolve the signing key bytes.
pub fn resolve_signing_key(configured: Option<&str>, key_file: &Path) -> Result<Vec<u8>> {
    if let Some(secret) = configured.map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(secret.as_bytes().to_vec());
    }

    if key_file.exists() {
        return load_key_file(key_file);
    }

    generate_key_file(key_file)
}

fn load_key_file(path: &Path) -> Result<Vec<u8>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read signing key {}", path.display()))?;
    let key = hex::decode(raw.trim())
        .with_context(|| format!("signing key {} is not valid hex", path.display()))?;
    if key.len() < KEY_BYTES {
        anyhow::bail!(
            "signing key {} too short: {} bytes, need at least {KEY_BYTES}",
            path.display(),
            key.len()
        );
    }
    Ok(key)
}

fn generate_key_file(path: &Path) -> Result<Vec<u8>> {
    let mut key = vec![0u8; KEY_BYTES];
    rand::rng().fill_bytes(&mut key);

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    // Temp files are created owner-only on unix, so the key is never
    // readable by others, not even before the rename.
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    tmp.write_all(hex::encode(&key).as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to write signing key {}", path.display()))?;

    tracing::info!(path = %path.display(), "Generated new token signing key");
    Ok(key)
}
