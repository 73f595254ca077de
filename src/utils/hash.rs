use std::{fs, path::Path};

use sha2::{Digest, Sha256};

use crate::model::IconSource;

pub(crate) const HASH_MARKER: &str = "// Icon hash (SHA-256):";

/// Digest the icon set; the result is embedded in the generated module
/// and drives the up-to-date check.
pub(crate) fn icon_set_hash(icons: &[IconSource]) -> String {
    let mut hasher = Sha256::new();
    for icon in icons {
        hasher.update(icon.name.as_bytes());
        hasher.update([0]);
        hasher.update(icon.svg.as_bytes());
        hasher.update([0]);
    }
    hex_upper(hasher.finalize())
}

/// Read the hash recorded in a previously generated module.
pub(crate) fn extract_hash(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    for line in content.lines() {
        if let Some(rest) = line.trim().strip_prefix(HASH_MARKER) {
            return Some(rest.trim().to_string());
        }
    }
    None
}

pub(crate) fn hex_upper(bytes: impl AsRef<[u8]>) -> String {
    let bytes = bytes.as_ref();
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        use std::fmt::Write;
        write!(&mut out, "{:02X}", byte).expect("write to string");
    }
    out
}
