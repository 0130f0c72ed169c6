//! Whole-file reads with content fingerprinting.
//!
//! The fingerprint feeds the emission manifest: if no module's fingerprint
//! changed since the last build, the bundle is not rewritten.

use std::fs;
use std::path::Path;

use crate::{Error, Result};

/// Read a module fully and fingerprint the exact bytes read.
pub fn read(path: &Path) -> Result<(String, String)> {
    let bytes = fs::read(path).map_err(|e| Error::Io {
        message: format!("failed to read module '{}'", path.display()),
        source: e,
    })?;
    let hash = fingerprint(&bytes);
    let text = String::from_utf8(bytes).map_err(|e| Error::Io {
        message: format!("module '{}' is not valid UTF-8", path.display()),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })?;
    Ok((text, hash))
}

/// BLAKE3 digest truncated to 128 bits, rendered as uppercase hex.
pub fn fingerprint(bytes: &[u8]) -> String {
    let digest = blake3::hash(bytes);
    digest.as_bytes()[..16]
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_uppercase_hex() {
        let a = fingerprint(b"module.exports = 1");
        let b = fingerprint(b"module.exports = 1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn fingerprint_differs_per_content() {
        assert_ne!(fingerprint(b"a"), fingerprint(b"b"));
    }

    #[test]
    fn read_returns_text_and_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.js");
        fs::write(&path, "module.exports = 1").unwrap();

        let (text, hash) = read(&path).unwrap();
        assert_eq!(text, "module.exports = 1");
        assert_eq!(hash, fingerprint(b"module.exports = 1"));
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let err = read(Path::new("/nonexistent/m.js")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
