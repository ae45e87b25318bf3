//! Decoding a submitted form into an answer record.
//!
//! Every question gets exactly one response, in question order, whether or
//! not the submitted value was usable. Problems are reported per field so the
//! caller can decide between re-asking and recording the answer as is.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;

use crate::catalog::CloneRef;
use crate::model::{Answer, Question, QuestionKind, Response, SurveyAnswer};

const REQUIRED: &str = "This is a required question";
const NOT_A_CHOICE: &str = "Not a valid answer";
const TOO_LONG: &str = "Response was too long";

/// Validation messages keyed by question name.
pub type FieldErrors = BTreeMap<String, String>;

/// Result of decoding one form submission.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedForm {
    pub answer: SurveyAnswer,
    pub errors: FieldErrors,
}

impl DecodedForm {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Build an answer for `clone` from submitted `fields` (question name → value).
#[must_use]
pub fn decode_form(
    questions: &[Question],
    respondent: &str,
    clone: &CloneRef,
    fields: &BTreeMap<String, String>,
) -> DecodedForm {
    let mut errors = FieldErrors::new();
    let mut responses = Vec::with_capacity(questions.len());

    for (index, question) in questions.iter().enumerate() {
        let submitted = fields.get(&question.name).map(String::as_str);

        // An empty free response counts as blank; an empty choice is a value
        let answer = match (submitted, &question.kind) {
            (Some(value), QuestionKind::MultipleChoice { .. }) => {
                match question.choice_index(value) {
                    Some(choice) => Answer::Selected {
                        choice,
                        value: value.to_string(),
                    },
                    None => {
                        errors.insert(question.name.clone(), NOT_A_CHOICE.to_string());
                        Answer::Invalid
                    }
                }
            }
            (Some(text), QuestionKind::FreeResponse { max_length }) if !text.is_empty() => {
                if text.chars().count() > *max_length {
                    errors.insert(question.name.clone(), TOO_LONG.to_string());
                    Answer::Invalid
                } else {
                    Answer::FreeText {
                        text: text.to_string(),
                    }
                }
            }
            _ => {
                if question.required {
                    errors.insert(question.name.clone(), REQUIRED.to_string());
                }
                Answer::NotAnswered
            }
        };

        responses.push(Response::new(index, answer));
    }

    DecodedForm {
        answer: SurveyAnswer {
            respondent: respondent.to_string(),
            clone_index: clone.index,
            clone_ext_id: clone.ext_id.clone(),
            clone_dir: clone.dir.clone(),
            selection_pr: clone.selection_pr,
            responses,
            submitted_at: Some(Utc::now()),
        },
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Choice;
    use std::path::PathBuf;

    fn questions() -> Vec<Question> {
        vec![
            Question::multiple_choice(
                "is_clone",
                "Is this a clone?",
                true,
                vec![Choice::new("yes", "Yes"), Choice::new("no", "No")],
            ),
            Question::multiple_choice(
                "useful",
                "Would refactoring help?",
                false,
                vec![Choice::new("y", "Yes"), Choice::new("n", "No")],
            ),
            Question::free_response("notes", "Notes", false, 10),
            Question::free_response("why", "Why?", true, 10),
        ]
    }

    fn clone_ref() -> CloneRef {
        CloneRef {
            index: 4,
            ext_id: "pattern-4".to_string(),
            dir: PathBuf::from("/clones/4"),
            selection_pr: 0.75,
        }
    }

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_valid_submission() {
        let decoded = decode_form(
            &questions(),
            "r@example.com",
            &clone_ref(),
            &fields(&[("is_clone", "no"), ("why", "renamed")]),
        );

        assert!(decoded.is_valid());
        let answer = &decoded.answer;
        assert_eq!(answer.respondent, "r@example.com");
        assert_eq!(answer.clone_index, 4);
        assert_eq!(answer.clone_ext_id, "pattern-4");
        assert_eq!(answer.clone_dir, PathBuf::from("/clones/4"));
        assert!(answer.submitted_at.is_some());

        let got: Vec<_> = answer.responses.iter().map(|r| r.answer.clone()).collect();
        assert_eq!(
            got,
            vec![
                Answer::Selected {
                    choice: 1,
                    value: "no".to_string()
                },
                Answer::NotAnswered,
                Answer::NotAnswered,
                Answer::FreeText {
                    text: "renamed".to_string()
                },
            ]
        );
        for (i, r) in answer.responses.iter().enumerate() {
            assert_eq!(r.question, i);
        }
    }

    #[test]
    fn test_missing_required_fields() {
        let decoded = decode_form(&questions(), "r", &clone_ref(), &fields(&[("why", "")]));

        assert!(!decoded.is_valid());
        assert_eq!(decoded.errors.get("is_clone").unwrap(), REQUIRED);
        assert_eq!(decoded.errors.get("why").unwrap(), REQUIRED);
        assert!(!decoded.errors.contains_key("notes"));
        assert_eq!(decoded.answer.responses[3].answer, Answer::NotAnswered);
    }

    #[test]
    fn test_unknown_choice_is_invalid() {
        let decoded = decode_form(
            &questions(),
            "r",
            &clone_ref(),
            &fields(&[("is_clone", "maybe"), ("why", "x")]),
        );

        assert_eq!(decoded.errors.get("is_clone").unwrap(), NOT_A_CHOICE);
        assert_eq!(decoded.answer.responses[0].answer, Answer::Invalid);
    }

    #[test]
    fn test_empty_choice_value_is_invalid() {
        let decoded = decode_form(
            &questions(),
            "r",
            &clone_ref(),
            &fields(&[("is_clone", "yes"), ("useful", ""), ("why", "x")]),
        );

        assert_eq!(decoded.errors.len(), 1);
        assert_eq!(decoded.errors.get("useful").unwrap(), NOT_A_CHOICE);
        assert_eq!(decoded.answer.responses[1].answer, Answer::Invalid);
    }

    #[test]
    fn test_empty_string_can_be_a_choice() {
        let questions = vec![Question::multiple_choice(
            "opt",
            "Pick one",
            false,
            vec![Choice::new("", "None of these"), Choice::new("a", "A")],
        )];

        let decoded = decode_form(&questions, "r", &clone_ref(), &fields(&[("opt", "")]));

        assert!(decoded.is_valid());
        assert_eq!(
            decoded.answer.responses[0].answer,
            Answer::Selected {
                choice: 0,
                value: String::new()
            }
        );
    }

    #[test]
    fn test_free_response_length_counts_characters() {
        let decoded = decode_form(
            &questions(),
            "r",
            &clone_ref(),
            &fields(&[("is_clone", "yes"), ("why", "éééééééééé"), ("notes", "01234567890")]),
        );

        assert_eq!(decoded.errors.len(), 1);
        assert_eq!(decoded.errors.get("notes").unwrap(), TOO_LONG);
        assert_eq!(decoded.answer.responses[2].answer, Answer::Invalid);
        assert!(matches!(
            decoded.answer.responses[3].answer,
            Answer::FreeText { .. }
        ));
    }
}
