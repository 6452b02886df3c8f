//! `phr digest`: recompute the anchored value of a payload.
//!
//! A verifier holding the original record runs this and compares the
//! output with the `digest` field of the on-chain `HealthDataAnchored`
//! event.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use phr_core::{sha256_digest, CanonicalBytes, ContentDigest};

/// Arguments for `phr digest`.
#[derive(Args, Debug)]
pub struct DigestArgs {
    /// Payload JSON file, or `-` for stdin.
    #[arg(long)]
    pub payload: PathBuf,

    /// Expected digest (hex, optional 0x). Exit status 1 on mismatch.
    #[arg(long)]
    pub expect: Option<String>,
}

#[derive(Debug, Serialize)]
struct DigestOutput<'a> {
    canonical: &'a str,
    digest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    matches: Option<bool>,
}

/// Execute `phr digest`.
pub fn run_digest(args: &DigestArgs) -> Result<u8> {
    let payload = crate::read_payload(&args.payload)?;
    let canonical = CanonicalBytes::new(&payload)?;
    let digest = sha256_digest(&canonical);

    let matches = args
        .expect
        .as_deref()
        .map(|expected| -> Result<bool> {
            let expected: ContentDigest = expected
                .parse()
                .with_context(|| format!("--expect is not a 32-byte hex digest: {expected}"))?;
            Ok(expected == digest)
        })
        .transpose()?;

    let output = DigestOutput {
        canonical: canonical.as_str(),
        digest: digest.to_string(),
        matches,
    };
    println!("{}", serde_json::to_string(&output)?);

    if matches == Some(false) {
        tracing::error!(digest = %digest, "payload does not match the expected digest");
        return Ok(1);
    }
    Ok(0)
}
