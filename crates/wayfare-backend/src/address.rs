use sha2::{Digest, Sha256};

/// Content addressing for uploaded media
pub struct ContentAddress;

impl ContentAddress {
    /// SHA-256 of `content` with a "sha256:" prefix
    pub fn hash(content: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content);
        format!("sha256:{:x}", hasher.finalize())
    }

    /// Hash value without the "sha256:" prefix
    pub fn extract_hash_value(hash: &str) -> &str {
        hash.strip_prefix("sha256:").unwrap_or(hash)
    }

    /// Public id of an uploaded file: `media/<hash>` plus the extension, if any
    ///
    /// Example: "media/3a7bd3e2360a3d29eea436fcfb7e44c735d117c42d1c1835420b6b9942dd4f1b.jpg"
    pub fn media_key(hash: &str, extension: Option<&str>) -> String {
        let hash_value = Self::extract_hash_value(hash);
        match extension {
            Some(ext) if !ext.is_empty() => format!("media/{}.{}", hash_value, ext),
            _ => format!("media/{}", hash_value),
        }
    }

    pub fn is_valid_hash(hash: &str) -> bool {
        let Some(hash_value) = hash.strip_prefix("sha256:") else {
            return false;
        };

        // SHA-256 produces 64 hex characters
        hash_value.len() == 64 && hash_value.chars().all(|c| c.is_ascii_hexdigit())
    }
}
