use sha2::{Digest, Sha256};

/// Hex SHA-256 of an in-memory payload. Used as the content address of uploads.
pub fn compute_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    // feed in 64KB chunks so very large payloads hash the same way files do
    for chunk in bytes.chunks(64 * 1024) {
        hasher.update(chunk);
    }
    format!("{:x}", hasher.finalize())
}
