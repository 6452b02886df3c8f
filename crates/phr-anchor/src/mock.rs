//! Mock anchoring: a plausible transaction id with no network activity.
//!
//! The id is `0x` + SHA-256 over the caller identity, the digest and 16
//! fresh bytes from the OS random source, so repeated calls with the same
//! inputs never collide. The only failure is an unavailable random source.

use phr_core::ContentDigest;
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::error::AnchorError;

/// Bytes of fresh entropy mixed into every mock id.
pub const MOCK_NONCE_LEN: usize = 16;

/// Stateless mock strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockAnchorer;

impl MockAnchorer {
    pub fn new() -> Self {
        Self
    }

    /// Fabricate a transaction id for `digest` on behalf of `identity`.
    ///
    /// # Errors
    ///
    /// `AnchorError::Fatal` if the OS random source fails.
    pub fn anchor(&self, identity: &str, digest: &ContentDigest) -> Result<String, AnchorError> {
        let mut nonce = [0u8; MOCK_NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|e| AnchorError::Fatal(format!("randomness source unavailable: {e}")))?;

        let mut hasher = Sha256::new();
        hasher.update(identity.as_bytes());
        hasher.update(digest.as_bytes());
        hasher.update(nonce);
        let tx_id = format!("0x{}", hex::encode(hasher.finalize()));

        tracing::info!(
            mode = "mock",
            identity,
            digest = %digest,
            tx_id = %tx_id,
            "anchored payload digest"
        );
        Ok(tx_id)
    }
}

/// True for `0x` followed by 64 lowercase hex digits.
pub fn is_transaction_id(s: &str) -> bool {
    s.len() == 66
        && s.starts_with("0x")
        && s[2..].bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
