//! # phr-core — Foundational Types for Health Record Anchoring
//!
//! This crate is the leaf of the workspace. It turns an arbitrary health
//! record into the 32-byte value that ends up in the on-chain registry, and
//! nothing else: no network, no async, no key material.
//!
//! ## Key Design Principles
//!
//! 1. **Typed payload.** A record is a [`Payload`]: a mapping from string keys
//!    to [`PayloadValue`], a tagged union of scalars, arrays and nested
//!    mappings. Malformed input is rejected at the canonicalization boundary,
//!    not somewhere in the submission path.
//!
//! 2. **`CanonicalBytes` newtype.** ALL digest computation flows through
//!    [`CanonicalBytes::new()`]. Two payloads that differ only in key order
//!    produce identical bytes, so any verifier holding the original record can
//!    recompute the anchored value.
//!
//! 3. **`sha256_digest()` accepts only `&CanonicalBytes`.** Compile-time
//!    enforcement that the anchored digest is always computed over the
//!    canonical form.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `phr-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod payload;

// Re-export primary types for ergonomic imports.
pub use canonical::{CanonicalBytes, MAX_DEPTH};
pub use digest::{sha256_digest, sha256_hex, ContentDigest};
pub use error::CanonicalizationError;
pub use payload::{Payload, PayloadValue};
