//! # phr-cli — Command-Line Front End
//!
//! Provides the `phr` binary.
//!
//! ## Subcommands
//!
//! - `phr anchor`: anchor a payload file in mock or live mode.
//! - `phr digest`: print a payload's canonical form and digest, optionally
//!   checking it against an anchored value.
//!
//! ```bash
//! phr digest --payload record.json --expect 0xe68b318d...
//! USE_MOCK_BLOCKCHAIN=false phr anchor --identity 0xABC --payload record.json --retries 3
//! ```
//!
//! Configuration is read from the process environment once, at startup,
//! and passed down by reference.

pub mod anchor;
pub mod digest;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use phr_core::Payload;

/// Read a JSON payload from a file, or from stdin when `path` is `-`.
pub fn read_payload(path: &Path) -> Result<Payload> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read payload from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read payload file {}", path.display()))?
    };
    parse_payload(&text)
}

/// Parse payload text. The document must be a JSON object.
pub fn parse_payload(text: &str) -> Result<Payload> {
    let value: serde_json::Value =
        serde_json::from_str(text).context("payload is not valid JSON")?;
    Ok(Payload::from_json(value)?)
}
