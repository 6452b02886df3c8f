//! # Anchor Transaction Assembly
//!
//! Builds the unsigned legacy (type-0) transaction that calls the registry
//! contract's anchor function with a payload digest.
//!
//! ## Contract Interface
//!
//! ```solidity
//! event HealthDataAnchored(address indexed caller, bytes32 digest, uint256 timestamp);
//! function anchorData(bytes32 digest) external;
//! ```
//!
//! The emitted event is the durable record of the anchor. Nothing is
//! persisted locally.
//!
//! ## Signing Payload
//!
//! Replay protection follows EIP-155: the hash that gets signed is
//! `keccak256(rlp([nonce, gasPrice, gasLimit, to, 0, data, chainId, 0, 0]))`.

use phr_core::ContentDigest;
use rlp::RlpStream;

use crate::address::{keccak256, Address};
use crate::error::ConfigError;

/// Solidity signature of the registry's anchor function.
pub const ANCHOR_FUNCTION_SIGNATURE: &str = "anchorData(bytes32)";

/// First four bytes of `keccak256("anchorData(bytes32)")`.
pub const ANCHOR_SELECTOR: [u8; 4] = [0x53, 0x36, 0x3c, 0x5e];

/// Solidity signature of the event emitted on every anchor.
pub const ANCHORED_EVENT_SIGNATURE: &str = "HealthDataAnchored(address,bytes32,uint256)";

/// `topic0` of the anchored event, for log filters.
pub const ANCHORED_EVENT_TOPIC: [u8; 32] = [
    0x36, 0x2c, 0xc3, 0xe0, 0xe0, 0x25, 0xd2, 0xd6, 0xf6, 0x49, 0x06, 0x54, 0x21, 0x0f, 0x09, 0x24,
    0x71, 0x60, 0xe9, 0xb0, 0xe5, 0x53, 0xcb, 0x01, 0x68, 0xc4, 0xbc, 0xb1, 0x32, 0xaa, 0x87, 0xdf,
];

/// ABI calldata for `anchorData(digest)`: selector followed by the 32-byte
/// digest. A `bytes32` argument needs no padding.
pub fn encode_anchor_calldata(digest: &ContentDigest) -> Vec<u8> {
    let mut data = Vec::with_capacity(36);
    data.extend_from_slice(&ANCHOR_SELECTOR);
    data.extend_from_slice(digest.as_bytes());
    data
}

/// A fully parameterised transaction, ready to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    /// Registry contract.
    pub to: Address,
    /// Signer account. Not part of the encoding; the ledger recovers it
    /// from the signature.
    pub from: Address,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

impl UnsignedTransaction {
    /// Append the six fields shared by the signing payload and the signed
    /// envelope. Value is always zero.
    pub(crate) fn append_common(&self, stream: &mut RlpStream) {
        stream.append(&self.nonce);
        stream.append(&self.gas_price);
        stream.append(&self.gas_limit);
        stream.append(&self.to.as_bytes().to_vec());
        stream.append(&0u8);
        stream.append(&self.data);
    }

    /// EIP-155 signing payload.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(9);
        self.append_common(&mut stream);
        stream.append(&self.chain_id);
        stream.append(&0u8);
        stream.append(&0u8);
        stream.out().to_vec()
    }

    /// Hash that the signer signs.
    pub fn sighash(&self) -> [u8; 32] {
        keccak256(&self.signing_payload())
    }
}

/// Assembles anchor transactions for one registry contract and signer.
///
/// Addresses are validated once, at construction; `build` is pure.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    contract: Address,
    from: Address,
    gas_limit: u64,
    chain_id: u64,
}

impl TransactionBuilder {
    /// Validate addresses given as text.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidAddress` if either address is not `0x` plus 40
    /// hex digits or fails its EIP-55 checksum.
    pub fn new(
        contract_address: &str,
        from_address: &str,
        gas_limit: u64,
        chain_id: u64,
    ) -> Result<Self, ConfigError> {
        let contract = contract_address
            .parse()
            .map_err(|source| ConfigError::InvalidAddress {
                var: "PHR_REGISTRY_ADDRESS",
                source,
            })?;
        let from = from_address
            .parse()
            .map_err(|source| ConfigError::InvalidAddress {
                var: "BACKEND_WALLET_ADDRESS",
                source,
            })?;
        Ok(Self::from_addresses(contract, from, gas_limit, chain_id))
    }

    pub fn from_addresses(contract: Address, from: Address, gas_limit: u64, chain_id: u64) -> Self {
        Self {
            contract,
            from,
            gas_limit,
            chain_id,
        }
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn from_address(&self) -> Address {
        self.from
    }

    /// Build the anchor call for `digest` with freshly queried chain state.
    pub fn build(&self, digest: &ContentDigest, nonce: u64, gas_price: u128) -> UnsignedTransaction {
        UnsignedTransaction {
            nonce,
            gas_price,
            gas_limit: self.gas_limit,
            to: self.contract,
            from: self.from,
            data: encode_anchor_calldata(digest),
            chain_id: self.chain_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const SIGNER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn vitals_digest() -> ContentDigest {
        ContentDigest::from_hex("e68b318d07b3dcc8e3e2b2c370b8628f4b9c61ac5b1f4b6dee28eb04f5f6ccc2")
            .unwrap()
    }

    #[test]
    fn selector_matches_signature() {
        assert_eq!(
            keccak256(ANCHOR_FUNCTION_SIGNATURE.as_bytes())[..4],
            ANCHOR_SELECTOR
        );
    }

    #[test]
    fn event_topic_matches_signature() {
        assert_eq!(
            keccak256(ANCHORED_EVENT_SIGNATURE.as_bytes()),
            ANCHORED_EVENT_TOPIC
        );
    }

    #[test]
    fn calldata_is_selector_then_digest() {
        let data = encode_anchor_calldata(&vitals_digest());
        assert_eq!(data.len(), 36);
        assert_eq!(
            hex::encode(&data),
            "53363c5ee68b318d07b3dcc8e3e2b2c370b8628f4b9c61ac5b1f4b6dee28eb04f5f6ccc2"
        );
    }

    #[test]
    fn build_uses_chain_parameters() {
        let builder = TransactionBuilder::new(REGISTRY, SIGNER, 100_000, 84532).unwrap();
        let tx = builder.build(&vitals_digest(), 5, 1_000_000_000);
        assert_eq!(tx.nonce, 5);
        assert_eq!(tx.gas_price, 1_000_000_000);
        assert_eq!(tx.gas_limit, 100_000);
        assert_eq!(tx.chain_id, 84532);
        assert_eq!(tx.to.to_string(), REGISTRY);
        assert_eq!(tx.from.to_string(), SIGNER);
    }

    #[test]
    fn sighash_known_vector() {
        let builder = TransactionBuilder::new(REGISTRY, SIGNER, 100_000, 84532).unwrap();
        let tx = builder.build(&vitals_digest(), 5, 1_000_000_000);
        assert_eq!(
            hex::encode(tx.sighash()),
            "7b051983dca951eb9187e7265e22e758924c8539b389edbbd1318d36198ac7ea"
        );
    }

    #[test]
    fn signing_payload_layout() {
        // Parameters of the EIP-155 worked example with a zero value. Anchors
        // never transfer value.
        let tx = UnsignedTransaction {
            nonce: 9,
            gas_price: 20_000_000_000,
            gas_limit: 21_000,
            to: Address::from_bytes([0x35; 20]),
            from: Address::from_bytes([0; 20]),
            data: Vec::new(),
            chain_id: 1,
        };
        let payload = tx.signing_payload();
        // 0xe4 list header, nonce 0x09, gas price 0x8504a817c800.
        assert_eq!(&payload[..8], &[0xe4, 0x09, 0x85, 0x04, 0xa8, 0x17, 0xc8, 0x00]);
        assert_eq!(&payload[payload.len() - 3..], &[0x01, 0x80, 0x80]);
        assert_eq!(
            hex::encode(&payload),
            "e4098504a817c8008252089435353535353535353535353535353535353535358080018080"
        );
    }

    #[test]
    fn malformed_contract_address_is_configuration_error() {
        let err = TransactionBuilder::new("0x1234", SIGNER, 100_000, 84532).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidAddress { var: "PHR_REGISTRY_ADDRESS", .. }
        ));
    }

    #[test]
    fn bad_checksum_from_address_is_configuration_error() {
        let err = TransactionBuilder::new(
            REGISTRY,
            "0xF39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            100_000,
            84532,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidAddress { var: "BACKEND_WALLET_ADDRESS", .. }
        ));
    }
}
