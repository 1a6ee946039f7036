//! Content-hash integrity verification (§4.5 step 6, §6.2).

use mlld_errors::ImportError;
use sha2::{Digest, Sha256};

/// `sha256:<hex>` digest of `content`, the format stored in the lock file's
/// `integrity` field.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("sha256:{:x}", hasher.finalize())
}

/// Compare a freshly fetched hash against the lock-pinned one. Mismatch is
/// fatal unless `force_refresh` is set (§4.5 step 6).
pub fn verify(
    reference: &str,
    expected: &str,
    actual_content: &str,
    force_refresh: bool,
) -> Result<(), ImportError> {
    let actual = content_hash(actual_content);
    if force_refresh || actual == expected {
        Ok(())
    } else {
        Err(ImportError::IntegrityMismatch {
            reference: reference.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}
