//! Archive and entry naming conventions.
//!
//! This module is the single source of truth for the filenames the pipeline
//! produces:
//! - Archive filenames (e.g., `sunset_a3f09c1e.zip`)
//! - Entry filenames inside an archive (e.g., `sunset_70.jpg`)
//!
//! Archive names embed a 4-byte cryptographically random identifier so that
//! concurrent requests uploading identically named files never collide
//! without any cross-request coordination. Display names are filename stems
//! and identifiers are hex, so produced names never contain path separators.

use std::fmt::Write as _;

use rand::RngCore;

/// Length of the random archive identifier in bytes (8 hex characters).
const IDENTIFIER_BYTES: usize = 4;

/// Generate a random 8-character hex identifier.
pub fn random_identifier() -> String {
    let mut bytes = [0u8; IDENTIFIER_BYTES];
    rand::rng().fill_bytes(&mut bytes);

    let mut id = String::with_capacity(IDENTIFIER_BYTES * 2);
    for byte in bytes {
        let _ = write!(id, "{:02x}", byte);
    }
    id
}

/// Generate the archive filename for a display name.
///
/// # Format
///
/// `{name}_{identifier}.zip`
pub fn archive_filename(name: &str) -> String {
    format!("{}_{}.zip", name, random_identifier())
}

/// Generate the entry filename for one quality tier inside an archive.
///
/// # Format
///
/// `{name}_{quality}.jpg`
pub fn entry_filename(name: &str, quality: u8) -> String {
    format!("{}_{}.jpg", name, quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identifier_is_eight_hex_chars() {
        let id = random_identifier();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_identifiers_do_not_collide() {
        let ids: HashSet<String> = (0..1000).map(|_| random_identifier()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_archive_filename_format() {
        let name = archive_filename("sunset");
        assert!(name.starts_with("sunset_"));
        assert!(name.ends_with(".zip"));
        assert_eq!(name.len(), "sunset_".len() + 8 + ".zip".len());
    }

    #[test]
    fn test_archive_filename_has_no_path_separators() {
        for _ in 0..100 {
            let name = archive_filename("photo");
            assert!(!name.contains('/'));
            assert!(!name.contains('\\'));
        }
    }

    #[test]
    fn test_entry_filename_format() {
        assert_eq!(entry_filename("sunset", 50), "sunset_50.jpg");
        assert_eq!(entry_filename("sunset", 90), "sunset_90.jpg");
    }
}
