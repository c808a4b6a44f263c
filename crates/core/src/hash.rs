use sha2::{Digest, Sha256};

/// SHA-256 of the given bytes as a lowercase hex string.
pub fn content_hash(bytes: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(bytes);
  hex::encode(hasher.finalize())
}

/// First 8 hex characters of the SHA-256 of `bytes`.
///
/// Used as the content-hash suffix of chunk identifiers.
pub fn short_hash(bytes: &[u8]) -> String {
  content_hash(bytes)[..8].to_string()
}

/// First 16 hex characters of the SHA-256 of `bytes`.
///
/// Used for symbol/reference identifiers and the config hash.
pub fn short_hash16(bytes: &[u8]) -> String {
  content_hash(bytes)[..16].to_string()
}
