//! # Error Types
//!
//! Failures raised while turning a payload into canonical bytes. Every
//! variant names the JSON-pointer path of the offending value so that the
//! caller can point the submitter at the broken field.

use thiserror::Error;

/// Error during canonical serialization of a payload.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// NaN and infinities have no JSON representation.
    #[error("non-finite number at {path}: {value}")]
    NonFiniteNumber {
        /// JSON-pointer path of the value (`""` for the root).
        path: String,
        /// The rejected value.
        value: f64,
    },

    /// The payload nests deeper than the canonicalizer accepts.
    #[error("payload nesting exceeds {max} levels at {path}")]
    DepthExceeded {
        /// JSON-pointer path where the limit was hit.
        path: String,
        /// The configured limit.
        max: usize,
    },

    /// A payload must be a key-value mapping at the top level.
    #[error("payload must be a JSON object, got {found}")]
    NotAMapping {
        /// JSON type name of what was supplied instead.
        found: &'static str,
    },

    /// The JSON writer failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_display_names_path() {
        let err = CanonicalizationError::NonFiniteNumber {
            path: "/vitals/temperature".to_string(),
            value: f64::NAN,
        };
        let msg = err.to_string();
        assert!(msg.contains("/vitals/temperature"));
        assert!(msg.contains("NaN"));
    }

    #[test]
    fn depth_exceeded_display() {
        let err = CanonicalizationError::DepthExceeded {
            path: "/a/b".to_string(),
            max: 128,
        };
        assert_eq!(err.to_string(), "payload nesting exceeds 128 levels at /a/b");
    }

    #[test]
    fn not_a_mapping_display() {
        let err = CanonicalizationError::NotAMapping { found: "array" };
        assert_eq!(err.to_string(), "payload must be a JSON object, got array");
    }
}
