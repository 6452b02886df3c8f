//! # Transaction Signing
//!
//! `SignerKey` holds the secp256k1 key for the backend wallet and turns an
//! [`UnsignedTransaction`] into a [`SignedTransaction`].
//!
//! ## Security
//!
//! - The key is parsed once, from configuration, and lives inside a
//!   `k256::ecdsa::SigningKey`, which zeroizes on drop. Intermediate
//!   decoded bytes are held in `Zeroizing` buffers.
//! - `Debug` prints only the derived address. No error produced here names
//!   or echoes the key text.
//! - Signatures are deterministic (RFC 6979) and normalised to low-S.

use k256::ecdsa::SigningKey;
use rlp::RlpStream;
use zeroize::Zeroizing;

use crate::address::{keccak256, Address};
use crate::error::{AnchorError, ConfigError};
use crate::tx::UnsignedTransaction;

/// Environment variable the key is read from; named in errors instead of
/// the key itself.
pub(crate) const KEY_VAR: &str = "BACKEND_PRIVATE_KEY";

/// Secret key of the signing wallet.
pub struct SignerKey {
    key: SigningKey,
    address: Address,
}

impl SignerKey {
    /// Parse 64 hex digits, with or without `0x`.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidKey` for wrong length, non-hex text, or a
    /// scalar outside the curve order. The error carries no detail.
    pub fn from_hex(text: &str) -> Result<Self, ConfigError> {
        let text = text.trim();
        let body = text.strip_prefix("0x").unwrap_or(text);
        let mut bytes = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(body, bytes.as_mut_slice())
            .map_err(|_| ConfigError::InvalidKey { var: KEY_VAR })?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, ConfigError> {
        let key =
            SigningKey::from_slice(bytes).map_err(|_| ConfigError::InvalidKey { var: KEY_VAR })?;
        let address = Address::from_verifying_key(key.verifying_key());
        Ok(Self { key, address })
    }

    /// Account controlled by this key.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign with EIP-155 replay protection.
    ///
    /// # Errors
    ///
    /// `AnchorError::Fatal` if the signing primitive fails, which for a
    /// valid key and a 32-byte prehash does not happen in practice.
    pub fn sign(&self, tx: &UnsignedTransaction) -> Result<SignedTransaction, AnchorError> {
        let sighash = tx.sighash();
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(&sighash)
            .map_err(|_| AnchorError::Fatal("transaction signing failed".to_string()))?;

        let v = u128::from(recovery_id.is_y_odd()) + 35 + 2 * u128::from(tx.chain_id);
        let (r, s) = signature.split_bytes();

        let mut stream = RlpStream::new_list(9);
        tx.append_common(&mut stream);
        stream.append(&v);
        stream.append(&scalar_bytes(&r));
        stream.append(&scalar_bytes(&s));
        let raw = stream.out().to_vec();
        let hash = keccak256(&raw);

        Ok(SignedTransaction {
            raw,
            hash,
            nonce: tx.nonce,
            from: self.address,
        })
    }
}

/// Signature scalar as an RLP integer: big-endian without leading zeros.
fn scalar_bytes(be: &[u8]) -> Vec<u8> {
    let start = be.iter().position(|&b| b != 0).unwrap_or(be.len());
    be[start..].to_vec()
}

impl std::fmt::Debug for SignerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerKey")
            .field("address", &self.address)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// A signed legacy transaction envelope. Produced once per submission
/// attempt and never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    raw: Vec<u8>,
    hash: [u8; 32],
    nonce: u64,
    from: Address,
}

impl SignedTransaction {
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// `0x`-prefixed envelope, as `eth_sendRawTransaction` expects it.
    pub fn raw_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.raw))
    }

    pub fn hash(&self) -> &[u8; 32] {
        &self.hash
    }

    /// keccak256 of the envelope, the id the ledger assigns.
    pub fn transaction_id(&self) -> String {
        format!("0x{}", hex::encode(self.hash))
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn from(&self) -> Address {
        self.from
    }
}
