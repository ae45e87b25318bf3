//! Answer records: one respondent's submission for one clone.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The outcome of one question in a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Answer {
    /// The respondent left the question blank
    NotAnswered,
    /// The submitted value failed validation
    Invalid,
    /// A multiple choice option was picked
    Selected {
        /// Index into the question's choices
        choice: usize,
        /// Submitted form value of that choice
        value: String,
    },
    /// A free response answer
    FreeText { text: String },
}

impl Answer {
    /// Legacy integer status code (`-1` not answered, `-2` invalid,
    /// `-3` free text, `>= 0` selected option).
    #[must_use]
    pub fn code(&self) -> i64 {
        match self {
            Self::NotAnswered => -1,
            Self::Invalid => -2,
            Self::FreeText { .. } => -3,
            Self::Selected { choice, .. } => i64::try_from(*choice).unwrap_or(i64::MAX),
        }
    }

    #[must_use]
    pub const fn is_answered(&self) -> bool {
        matches!(self, Self::Selected { .. } | Self::FreeText { .. })
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnswered => write!(f, "Not Answered"),
            Self::Invalid => write!(f, "Bad Answer"),
            Self::Selected { value, .. } => write!(f, "{value}"),
            Self::FreeText { text } => write!(f, "{text}"),
        }
    }
}

/// One answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Position of the question in the question list
    pub question: usize,
    #[serde(flatten)]
    pub answer: Answer,
}

impl Response {
    #[must_use]
    pub const fn new(question: usize, answer: Answer) -> Self {
        Self { question, answer }
    }
}

/// One respondent's full submission for one clone.
///
/// The clone's identifier, location and selection probability are copied at
/// submission time and never looked up again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyAnswer {
    /// Respondent identity (email or equivalent)
    pub respondent: String,
    /// Index into the clone catalog
    pub clone_index: usize,
    pub clone_ext_id: String,
    pub clone_dir: PathBuf,
    pub selection_pr: f64,
    /// One response per question, in question order
    pub responses: Vec<Response>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl SurveyAnswer {
    /// Number of questions that received a usable answer.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.responses
            .iter()
            .filter(|r| r.answer.is_answered())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Answer::NotAnswered.code(), -1);
        assert_eq!(Answer::Invalid.code(), -2);
        assert_eq!(
            Answer::FreeText {
                text: "x".to_string()
            }
            .code(),
            -3
        );
        assert_eq!(
            Answer::Selected {
                choice: 2,
                value: "c".to_string()
            }
            .code(),
            2
        );
    }

    #[test]
    fn test_response_serialization_is_flat() {
        let r = Response::new(
            1,
            Answer::Selected {
                choice: 0,
                value: "yes".to_string(),
            },
        );
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(
            json,
            r#"{"question":1,"status":"selected","choice":0,"value":"yes"}"#
        );

        let na = serde_json::to_string(&Response::new(0, Answer::NotAnswered)).unwrap();
        assert_eq!(na, r#"{"question":0,"status":"not_answered"}"#);
    }

    #[test]
    fn test_answered_count() {
        let answer = SurveyAnswer {
            respondent: "a@example.com".to_string(),
            clone_index: 0,
            clone_ext_id: "0".to_string(),
            clone_dir: PathBuf::from("/clones/0"),
            selection_pr: 0.5,
            responses: vec![
                Response::new(0, Answer::NotAnswered),
                Response::new(
                    1,
                    Answer::FreeText {
                        text: "looks copied".to_string(),
                    },
                ),
                Response::new(2, Answer::Invalid),
            ],
            submitted_at: None,
        };
        assert_eq!(answer.answered_count(), 1);
        assert_eq!(answer.responses[1].answer.to_string(), "looks copied");
    }
}
