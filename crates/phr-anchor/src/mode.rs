//! Mock/live mode selection.
//!
//! The flag defaults to [`Mode::Mock`] when unset or unparseable. An
//! operator has to say "false" explicitly before anything is spent on chain.

use serde::Serialize;

/// How an anchor call is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Fabricate a transaction id locally. No network.
    #[default]
    Mock,
    /// Sign and submit to the ledger.
    Live,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Live => "live",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a boolean-like flag: `true/1/yes/on` or `false/0/no/off`,
/// case-insensitive, surrounding whitespace ignored.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Select the mode from the raw `USE_MOCK_BLOCKCHAIN` value.
pub fn select_mode(use_mock: Option<&str>) -> Mode {
    let Some(raw) = use_mock else {
        return Mode::Mock;
    };
    match parse_flag(raw) {
        Some(true) => Mode::Mock,
        Some(false) => Mode::Live,
        None => {
            tracing::warn!(
                value = raw,
                "unrecognised USE_MOCK_BLOCKCHAIN value, falling back to mock mode"
            );
            Mode::Mock
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_flag_selects_mock() {
        assert_eq!(select_mode(None), Mode::Mock);
        assert_eq!(Mode::default(), Mode::Mock);
    }

    #[test]
    fn explicit_values() {
        for v in ["true", "TRUE", " 1 ", "yes", "On"] {
            assert_eq!(select_mode(Some(v)), Mode::Mock, "{v}");
        }
        for v in ["false", "False", "0", "no", " OFF"] {
            assert_eq!(select_mode(Some(v)), Mode::Live, "{v}");
        }
    }

    #[test]
    fn unparseable_flag_selects_mock() {
        for v in ["", "maybe", "2", "live"] {
            assert_eq!(select_mode(Some(v)), Mode::Mock, "{v}");
        }
    }

    #[test]
    fn mode_display() {
        assert_eq!(Mode::Live.to_string(), "live");
        assert_eq!(serde_json::to_string(&Mode::Mock).unwrap(), "\"mock\"");
    }
}
