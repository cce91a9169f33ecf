//! Derivation of the shadow path.
//!
//! id = URL-safe base64 (no padding) of SHA-256 over the canonical path bytes.
//! Одинаковый canonical path -> тот же shadow path, пока не меняется temp root.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Filesystem-safe identifier of a canonical path (43 chars).
pub fn shadow_id(canonical: &Path) -> String {
    let digest = Sha256::digest(canonical.as_os_str().as_encoded_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

pub fn derive_shadow_path(temp_root: &Path, canonical: &Path) -> PathBuf {
    temp_root.join(shadow_id(canonical))
}
