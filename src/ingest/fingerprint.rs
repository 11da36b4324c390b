use sha2::{Digest, Sha256};

use crate::models::FeedEntry;

/// Stable identifier of a feed entry: SHA-256 over title and guid, as
/// lower-case hex.
///
/// A salt, when configured, is hashed first. Changing the salt (or this
/// formula) invalidates the stored cursor: every entry still in the feed
/// looks new once and is stored again under its new fingerprint. Entries
/// fingerprinted the same way are never stored twice.
#[derive(Debug, Clone, Default)]
pub struct Fingerprinter {
    salt: Option<String>,
}

impl Fingerprinter {
    pub fn new(salt: Option<String>) -> Self {
        Self {
            salt: salt.filter(|s| !s.is_empty()),
        }
    }

    pub fn fingerprint(&self, entry: &FeedEntry) -> String {
        let mut hasher = Sha256::new();
        if let Some(salt) = &self.salt {
            hasher.update(salt.as_bytes());
            hasher.update([0u8]);
        }
        hasher.update(entry.title.as_bytes());
        hasher.update([0u8]);
        hasher.update(entry.guid.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
