//! `phr anchor`: anchor a payload and print the transaction id.
//!
//! Prints one JSON object on success:
//!
//! ```json
//! {"mode":"mock","digest":"0xe68b...","transaction_id":"0x...","explorer_url":"https://.../tx/0x..."}
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;

use phr_anchor::{
    explorer_tx_url, payload_digest, retry_connectivity, AnchorConfig, Anchorer, Mode,
    RetryPolicy,
};

/// Mode override on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Mock,
    Live,
}

impl From<ModeArg> for Mode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Mock => Mode::Mock,
            ModeArg::Live => Mode::Live,
        }
    }
}

/// Arguments for `phr anchor`.
#[derive(Args, Debug)]
pub struct AnchorArgs {
    /// Identity of the submitter (recorded in logs, mixed into mock ids).
    #[arg(long)]
    pub identity: String,

    /// Payload JSON file, or `-` for stdin.
    #[arg(long)]
    pub payload: PathBuf,

    /// Override USE_MOCK_BLOCKCHAIN.
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Retry connectivity failures this many times with a fresh nonce.
    #[arg(long, default_value_t = 0)]
    pub retries: u32,

    /// Base backoff between retries, in milliseconds. Doubles per retry.
    #[arg(long, default_value_t = 200)]
    pub retry_delay_ms: u64,
}

#[derive(Debug, Serialize)]
struct AnchorOutput {
    mode: Mode,
    digest: String,
    transaction_id: String,
    explorer_url: String,
}

/// Execute `phr anchor` against a configuration loaded at startup.
pub async fn run_anchor(args: &AnchorArgs, config: &AnchorConfig) -> Result<u8> {
    let payload = crate::read_payload(&args.payload)?;
    let digest = payload_digest(&payload)?;

    let config = match args.mode {
        Some(mode) => config.clone().with_mode(mode.into()),
        None => config.clone(),
    };
    let anchorer = Anchorer::from_config(&config).context("anchoring is misconfigured")?;
    tracing::info!(mode = %anchorer.mode(), digest = %digest, "anchoring payload");

    let policy = RetryPolicy::default()
        .with_max_retries(args.retries)
        .with_base_delay(Duration::from_millis(args.retry_delay_ms));
    let result = retry_connectivity(policy, || anchorer.anchor_digest(&args.identity, &digest))
        .await
        .map_err(|e| {
            let kind = e.kind();
            anyhow::Error::new(e).context(format!("anchor failed ({kind})"))
        })?;

    let output = AnchorOutput {
        mode: anchorer.mode(),
        digest: digest.to_string(),
        explorer_url: explorer_tx_url(&config.explorer_url, &result.transaction_id),
        transaction_id: result.transaction_id,
    };
    println!("{}", serde_json::to_string(&output)?);
    Ok(0)
}
