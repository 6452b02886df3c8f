//! # Account Addresses
//!
//! 20-byte EVM account addresses with EIP-55 mixed-case checksums.
//!
//! Parsing accepts `0x` followed by 40 hex digits. Input in a single case
//! (all lower or all upper) carries no checksum and is accepted as is;
//! mixed-case input must match the EIP-55 checksum exactly, which catches
//! transcription errors in configured contract and signer addresses.

use std::fmt;
use std::str::FromStr;

use k256::ecdsa::VerifyingKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha3::{Digest, Keccak256};
use thiserror::Error;

/// Keccak-256, the hash used throughout the EVM.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("address must start with 0x")]
    MissingPrefix,
    #[error("address must be 40 hex digits, got {0}")]
    WrongLength(usize),
    #[error("address contains non-hex characters")]
    InvalidHex,
    #[error("address fails EIP-55 checksum")]
    BadChecksum,
}

/// An EVM account or contract address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Address controlled by a secp256k1 public key: the last 20 bytes of
    /// keccak256 over the uncompressed point without its `0x04` tag.
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.as_affine().to_encoded_point(false);
        let hash = keccak256(&point.as_bytes()[1..]);
        let mut out = [0u8; 20];
        out.copy_from_slice(&hash[12..]);
        Self(out)
    }

    /// EIP-55 checksummed form, `0x`-prefixed.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let body = s.strip_prefix("0x").ok_or(AddressError::MissingPrefix)?;
        if body.len() != 40 {
            return Err(AddressError::WrongLength(body.len()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(body, &mut bytes).map_err(|_| AddressError::InvalidHex)?;
        let addr = Self(bytes);

        let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && addr.to_checksum()[2..] != *body {
            return Err(AddressError::BadChecksum);
        }
        Ok(addr)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl serde::Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUMMED: &[&str] = &[
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];

    #[test]
    fn keccak_of_empty_input() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn checksum_vectors_roundtrip_through_display() {
        for s in CHECKSUMMED {
            let addr: Address = s.parse().unwrap();
            assert_eq!(addr.to_string(), *s);
        }
    }

    #[test]
    fn single_case_input_accepted() {
        for s in CHECKSUMMED {
            let lower = format!("0x{}", s[2..].to_ascii_lowercase());
            let upper = format!("0x{}", s[2..].to_ascii_uppercase());
            assert_eq!(lower.parse::<Address>().unwrap().to_string(), *s);
            assert_eq!(upper.parse::<Address>().unwrap().to_string(), *s);
        }
    }

    #[test]
    fn bad_checksum_rejected() {
        // Flip the case of one letter in a valid checksummed address.
        let tampered = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD";
        assert_eq!(tampered.parse::<Address>(), Err(AddressError::BadChecksum));
    }

    #[test]
    fn malformed_addresses_rejected() {
        assert_eq!(
            "5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".parse::<Address>(),
            Err(AddressError::MissingPrefix)
        );
        assert_eq!("0x123".parse::<Address>(), Err(AddressError::WrongLength(3)));
        assert_eq!(
            "0xGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGG".parse::<Address>(),
            Err(AddressError::InvalidHex)
        );
        assert!("".parse::<Address>().is_err());
    }

    #[test]
    fn address_from_known_key() {
        let secret =
            hex::decode("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80").unwrap();
        let key = k256::ecdsa::SigningKey::from_slice(&secret).unwrap();
        let addr = Address::from_verifying_key(key.verifying_key());
        assert_eq!(addr.to_string(), "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    }
}
