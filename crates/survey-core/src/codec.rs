//! Record codec: one `SurveyAnswer` per JSON line.
//!
//! Encoded lines never contain a newline; the journal adds the terminator.

use thiserror::Error;

use crate::model::SurveyAnswer;

/// Errors from encoding or decoding a single record.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The line is not a valid answer record.
    #[error("malformed answer record: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The record cannot be represented faithfully.
    #[error("unencodable answer record: {0}")]
    Unencodable(String),
}

/// Serialize an answer to a JSON line (no trailing newline).
pub fn encode(answer: &SurveyAnswer) -> Result<String, CodecError> {
    // JSON has no representation for NaN or infinity
    if !answer.selection_pr.is_finite() {
        return Err(CodecError::Unencodable(format!(
            "selection probability {} is not finite",
            answer.selection_pr
        )));
    }
    serde_json::to_string(answer).map_err(|e| CodecError::Unencodable(e.to_string()))
}

/// Parse an answer from a JSON line.
pub fn decode(line: &str) -> Result<SurveyAnswer, CodecError> {
    serde_json::from_str(line).map_err(CodecError::Malformed)
}
