//! Structured-content recovery.
//!
//! Extracted bytes that should hold a JSON document sometimes arrive wrapped
//! in junk: padding, stray control bytes, or extended-attribute records that
//! leaked out of the archive metadata. [`recover`] runs an ordered list of
//! [`Strategy`] values and returns the first document one of them produces.

use serde_json::Value;
use tracing::debug;

use crate::error::RecoveryError;

/// Substrings that only ever appear in archive metadata attribute records.
pub const CONTAMINATION_SIGNATURES: &[&str] = &[
    "LIBARCHIVE.xattr.",
    "SCHILY.xattr.",
    "com.apple.quarantine",
    "com.apple.provenance",
    "com.apple.metadata:",
    "PaxHeader",
];

/// One step of the recovery chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Parse the text as-is
    StrictParse,
    /// Give up early if the text is archive metadata
    ContaminationCheck,
    /// Drop control characters and parse the outermost `{ .. }` span
    BraceTrim,
}

/// Strategies in the order [`recover`] tries them.
pub const STRATEGIES: &[Strategy] = &[
    Strategy::StrictParse,
    Strategy::ContaminationCheck,
    Strategy::BraceTrim,
];

/// Result of running a single strategy.
#[derive(Debug)]
pub enum Outcome {
    /// The strategy produced a document
    Recovered(Value),
    /// The strategy did not apply or its parse failed; try the next one
    Declined(Option<serde_json::Error>),
    /// Stop the chain with this error
    Abort(RecoveryError),
}

impl Strategy {
    /// Run this strategy against decoded text.
    pub fn apply(self, text: &str) -> Outcome {
        match self {
            Strategy::StrictParse => match strict_parse(text) {
                Ok(value) => Outcome::Recovered(value),
                Err(e) => Outcome::Declined(Some(e)),
            },
            Strategy::ContaminationCheck => match find_contamination(text) {
                Some(signature) => Outcome::Abort(RecoveryError::ContaminationDetected { signature }),
                None => Outcome::Declined(None),
            },
            Strategy::BraceTrim => {
                let cleaned = strip_control(text);
                match brace_span(&cleaned).map(strict_parse) {
                    Some(Ok(value)) => Outcome::Recovered(value),
                    _ => Outcome::Declined(None),
                }
            }
        }
    }
}

/// Recover a JSON document from extracted bytes.
///
/// # Errors
///
/// [`RecoveryError::ContaminationDetected`] when the bytes carry a metadata
/// signature, [`RecoveryError::ParseFailed`] when no strategy succeeds.
pub fn recover(bytes: &[u8]) -> Result<Value, RecoveryError> {
    let text = String::from_utf8_lossy(bytes);
    // First parse error wins; that is the one from the unmodified text
    let mut failure = None;

    for strategy in STRATEGIES {
        match strategy.apply(&text) {
            Outcome::Recovered(value) => {
                debug!(?strategy, "recovered structured content");
                return Ok(value);
            }
            Outcome::Abort(err) => {
                debug!(?strategy, error = %err, "recovery aborted");
                return Err(err);
            }
            Outcome::Declined(err) => {
                if failure.is_none() {
                    failure = err;
                }
            }
        }
    }

    let source = failure.unwrap_or_else(|| {
        <serde_json::Error as serde::de::Error>::custom("no recovery strategy produced a document")
    });
    Err(RecoveryError::ParseFailed { source })
}

fn strict_parse(text: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(text.strip_prefix('\u{feff}').unwrap_or(text))
}

pub fn find_contamination(text: &str) -> Option<&'static str> {
    CONTAMINATION_SIGNATURES
        .iter()
        .copied()
        .find(|sig| text.contains(sig))
}

/// Remove control characters other than tab, newline and carriage return
pub fn strip_control(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

/// Text from the first `{` through the last `}`, if the first comes first
pub fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strict_parse_wins() {
        assert_eq!(recover(br#"{"name":"app","version":3}"#).unwrap(), json!({"name": "app", "version": 3}));
        assert_eq!(recover(b"[1,2]").unwrap(), json!([1, 2]));
        assert_eq!(recover("\u{feff}{\"a\":1}".as_bytes()).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_brace_trim_recovers_wrapped_object() {
        let value = recover(br#"garbage-prefix{"a":1}garbage-suffix"#).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_brace_trim_drops_control_bytes() {
        let mut bytes = b"\x00\x00{\"a\":\x01 [1,\x07 2]}".to_vec();
        bytes.extend_from_slice(&[0u8; 64]);
        assert_eq!(recover(&bytes).unwrap(), json!({"a": [1, 2]}));
    }

    #[test]
    fn test_contamination_beats_valid_span() {
        let text = "30 SCHILY.xattr.user.foo=bar\n{\"a\":1}";
        let err = recover(text.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            RecoveryError::ContaminationDetected { signature: "SCHILY.xattr." }
        ));
    }

    #[test]
    fn test_no_span_fails_with_parse_error() {
        let err = recover(b"not json at all").unwrap_err();
        assert!(matches!(err, RecoveryError::ParseFailed { .. }));

        let err = recover(b"} backwards {").unwrap_err();
        assert!(matches!(err, RecoveryError::ParseFailed { .. }));
    }

    #[test]
    fn test_invalid_span_fails_with_parse_error() {
        let err = recover(b"xx{\"a\": }yy").unwrap_err();
        // Reported error comes from the strict parse, not the trimmed span
        match err {
            RecoveryError::ParseFailed { source } => assert_eq!((source.line(), source.column()), (1, 1)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_strategies_individually() {
        assert!(matches!(Strategy::StrictParse.apply("{}"), Outcome::Recovered(_)));
        assert!(matches!(Strategy::StrictParse.apply("x{}"), Outcome::Declined(Some(_))));
        assert!(matches!(
            Strategy::ContaminationCheck.apply("com.apple.quarantine"),
            Outcome::Abort(RecoveryError::ContaminationDetected { .. })
        ));
        assert!(matches!(Strategy::ContaminationCheck.apply("{}"), Outcome::Declined(None)));
        assert!(matches!(Strategy::BraceTrim.apply("--{}--"), Outcome::Recovered(_)));
        assert!(matches!(Strategy::BraceTrim.apply("--"), Outcome::Declined(None)));
    }

    #[test]
    fn test_brace_span() {
        assert_eq!(brace_span("a{b}c}d"), Some("{b}c}"));
        assert_eq!(brace_span("}{"), None);
        assert_eq!(brace_span("{"), None);
    }
}
