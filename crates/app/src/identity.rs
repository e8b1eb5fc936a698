//! Local identity key management
//!
//! The CLI signs every submission with an Ed25519 identity key stored as PEM
//! in the user config directory. `shroud keygen` mints it; everything else
//! loads it.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use common::crypto::SecretKey;

/// Default on-disk location of the identity PEM
pub fn default_identity_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shroud")
        .join("identity.pem")
}

/// Load the identity key from `path`
pub fn load(path: &Path) -> Result<SecretKey> {
    let pem = std::fs::read_to_string(path).with_context(|| {
        format!(
            "no identity at {} (run `shroud keygen` first)",
            path.display()
        )
    })?;
    SecretKey::from_pem(&pem).map_err(|e| anyhow!("invalid identity PEM: {}", e))
}

/// Generate a fresh identity key and persist it to `path`
///
/// Refuses to overwrite an existing key unless `force` is set; losing the key
/// means losing membership of every net it ever joined.
pub fn generate(path: &Path, force: bool) -> Result<SecretKey> {
    if path.exists() && !force {
        return Err(anyhow!(
            "identity already exists at {} (pass --force to replace it)",
            path.display()
        ));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let key = SecretKey::generate();
    std::fs::write(path, key.to_pem())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(key)
}
