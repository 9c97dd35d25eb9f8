//! Content fingerprinting for uploaded images.
//!
//! The fingerprint is the cache key for OCR results: byte-identical uploads
//! always map to the same key, and distinct uploads collide only with
//! cryptographically negligible probability.

use sha2::{Digest, Sha256};

/// Compute the content fingerprint for an upload: lowercase hex SHA-256 of
/// the raw bytes. Pure and deterministic; empty input is valid.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let bytes = b"\xFF\xD8\xFF\xE0 fake jpeg payload";
        assert_eq!(fingerprint(bytes), fingerprint(bytes));
    }

    #[test]
    fn test_distinct_inputs_get_distinct_fingerprints() {
        assert_ne!(fingerprint(b"image one"), fingerprint(b"image two"));
        // A single flipped bit is enough.
        assert_ne!(fingerprint(&[0x00]), fingerprint(&[0x01]));
    }

    #[test]
    fn test_fingerprint_of_empty_input() {
        // SHA-256 of the empty string is a fixed, well-known value.
        assert_eq!(
            fingerprint(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_fingerprint_is_lowercase_hex() {
        let fp = fingerprint(b"sample");
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
