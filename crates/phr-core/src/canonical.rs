//! # Canonical Serialization — Sorted-Key JSON Byte Production
//!
//! This module defines `CanonicalBytes`, the sole construction path for bytes
//! used in digest computation.
//!
//! ## Security Invariant
//!
//! The `CanonicalBytes` newtype has a private inner field. The only way to
//! construct it is through `CanonicalBytes::new()`, which validates the
//! payload (finite numbers, bounded depth) before serialization. Any
//! function requiring canonical bytes must accept `&CanonicalBytes`, so the
//! anchored digest can never be computed over an ad hoc encoding.
//!
//! ## Encoding (matching Python `json.dumps(record, sort_keys=True)`)
//!
//! Digests already anchored by deployed services were computed over this
//! form, so verifiers reproduce it byte for byte:
//!
//! - Object keys sorted by code point at every nesting level.
//! - `", "` between items and `": "` between key and value.
//! - Everything outside printable ASCII escaped as `\uXXXX` (lowercase hex,
//!   UTF-16 surrogate pairs above the BMP); `\n`, `\t` and friends keep their
//!   short escapes.
//! - Floats in shortest round-trip form: fixed notation with at least one
//!   fractional digit (`72.0`), switching to exponent notation with a signed
//!   two-digit exponent (`1e-05`, `1e+16`) below `1e-4` and from `1e16`.
//! - Integers written as-is.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Number, Value};

use crate::error::CanonicalizationError;
use crate::payload::{Payload, PayloadValue};

/// Maximum nesting depth accepted by the canonicalizer.
///
/// Matches the recursion limit `serde_json` applies when parsing, so any
/// record that could be parsed can also be canonicalized.
pub const MAX_DEPTH: usize = 128;

/// Bytes produced exclusively by canonicalization of a [`Payload`].
///
/// # Invariants
///
/// - The only constructor is `CanonicalBytes::new()`.
/// - Object keys are sorted by code point at every level.
/// - All numbers are finite.
/// - Output is pure ASCII.
/// - Payloads equal under key-order-independent comparison produce
///   byte-identical output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize a payload.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::NonFiniteNumber` if any number is NaN
    /// or infinite, `CanonicalizationError::DepthExceeded` if the record nests
    /// deeper than [`MAX_DEPTH`], and `CanonicalizationError::SerializationFailed`
    /// if the writer fails.
    pub fn new(payload: &Payload) -> Result<Self, CanonicalizationError> {
        let mut root = Map::new();
        for (k, v) in payload.as_map() {
            let path = pointer_child("", k);
            root.insert(k.clone(), to_json(v, &path, 1)?);
        }
        let bytes = serialize_canonical(&Value::Object(root))?;
        Ok(Self(bytes))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The canonical form as text. Output is always ASCII.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Convert a payload value into a `serde_json::Value`, rejecting anything
/// that has no canonical JSON form.
fn to_json(value: &PayloadValue, path: &str, depth: usize) -> Result<Value, CanonicalizationError> {
    if depth > MAX_DEPTH {
        return Err(CanonicalizationError::DepthExceeded {
            path: path.to_string(),
            max: MAX_DEPTH,
        });
    }
    match value {
        PayloadValue::Null => Ok(Value::Null),
        PayloadValue::Bool(b) => Ok(Value::Bool(*b)),
        PayloadValue::Int(i) => Ok(Value::Number((*i).into())),
        PayloadValue::Uint(u) => Ok(Value::Number((*u).into())),
        PayloadValue::Float(f) => Number::from_f64(*f).map(Value::Number).ok_or_else(|| {
            CanonicalizationError::NonFiniteNumber {
                path: path.to_string(),
                value: *f,
            }
        }),
        PayloadValue::String(s) => Ok(Value::String(s.clone())),
        PayloadValue::Array(arr) => {
            let mut out = Vec::with_capacity(arr.len());
            for (i, item) in arr.iter().enumerate() {
                out.push(to_json(item, &format!("{path}/{i}"), depth + 1)?);
            }
            Ok(Value::Array(out))
        }
        PayloadValue::Object(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                out.insert(k.clone(), to_json(v, &pointer_child(path, k), depth + 1)?);
            }
            Ok(Value::Object(out))
        }
    }
}

/// Append an escaped key to a JSON pointer (RFC 6901).
fn pointer_child(parent: &str, key: &str) -> String {
    format!("{parent}/{}", key.replace('~', "~0").replace('/', "~1"))
}

/// Serialize a JSON value in canonical form.
///
/// Key order comes from the inserting side: `to_json` walks `BTreeMap`s,
/// whose `String` order is code-point order.
fn serialize_canonical(value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, SortedKeysFormatter);
    value.serialize(&mut ser)?;
    Ok(out)
}

/// `serde_json` formatter for the canonical separators, escaping and float
/// notation. Structure and short escapes come from the default impls.
struct SortedKeysFormatter;

impl Formatter for SortedKeysFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_f64<W: ?Sized + io::Write>(&mut self, writer: &mut W, value: f64) -> io::Result<()> {
        writer.write_all(format_float(value).as_bytes())
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        for c in fragment.chars() {
            if (' '..='~').contains(&c) {
                let mut buf = [0u8; 1];
                writer.write_all(c.encode_utf8(&mut buf).as_bytes())?;
            } else {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}

/// Shortest round-trip text for a finite float.
///
/// Rust's `{:e}` yields the shortest digits that round-trip; they are laid
/// out in fixed notation for decimal exponents in `-4..16` and in exponent
/// notation otherwise.
fn format_float(value: f64) -> String {
    let sci = format!("{:e}", value.abs());
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let sign = if value.is_sign_negative() { "-" } else { "" };

    if !(-4..16).contains(&exp) {
        let (lead, rest) = digits.split_at(1);
        let exp_sign = if exp < 0 { '-' } else { '+' };
        return if rest.is_empty() {
            format!("{sign}{lead}e{exp_sign}{:02}", exp.abs())
        } else {
            format!("{sign}{lead}.{rest}e{exp_sign}{:02}", exp.abs())
        };
    }

    if exp < 0 {
        let zeros = "0".repeat((-exp - 1) as usize);
        return format!("{sign}0.{zeros}{digits}");
    }

    let int_len = exp as usize + 1;
    if digits.len() <= int_len {
        let zeros = "0".repeat(int_len - digits.len());
        format!("{sign}{digits}{zeros}.0")
    } else {
        let (int_part, frac_part) = digits.split_at(int_len);
        format!("{sign}{int_part}.{frac_part}")
    }
}
