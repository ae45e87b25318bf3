//! Question definitions.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::answers::Answer;

/// One survey question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Stable identifier, also the form field name
    pub name: String,
    /// Display text
    pub text: String,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

/// Question variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionKind {
    /// Pick exactly one of an ordered list of options
    MultipleChoice { choices: Vec<Choice> },
    /// Free text up to `max_length` characters
    FreeResponse { max_length: usize },
}

/// One option of a multiple choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Submitted form value
    pub value: String,
    /// Display label
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

impl Question {
    pub fn multiple_choice(
        name: impl Into<String>,
        text: impl Into<String>,
        required: bool,
        choices: Vec<Choice>,
    ) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            required,
            kind: QuestionKind::MultipleChoice { choices },
        }
    }

    pub fn free_response(
        name: impl Into<String>,
        text: impl Into<String>,
        required: bool,
        max_length: usize,
    ) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            required,
            kind: QuestionKind::FreeResponse { max_length },
        }
    }

    /// The stable key of this question.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.name
    }

    /// Position of `value` among this question's choices.
    ///
    /// Always `None` for free response questions.
    #[must_use]
    pub fn choice_index(&self, value: &str) -> Option<usize> {
        match &self.kind {
            QuestionKind::MultipleChoice { choices } => {
                choices.iter().position(|c| c.value == value)
            }
            QuestionKind::FreeResponse { .. } => None,
        }
    }

    /// Check that `answer` is something this question could have produced.
    ///
    /// `NotAnswered` and `Invalid` fit any question. A selection must name an
    /// existing choice by both index and value; free text must fit a free
    /// response question's length limit.
    pub fn check_answer(&self, answer: &Answer) -> Result<(), String> {
        match (answer, &self.kind) {
            (Answer::NotAnswered | Answer::Invalid, _) => Ok(()),
            (Answer::Selected { choice, value }, QuestionKind::MultipleChoice { choices }) => {
                match choices.get(*choice) {
                    Some(c) if c.value == *value => Ok(()),
                    Some(c) => Err(format!(
                        "choice {choice} of '{}' is '{}', not '{value}'",
                        self.name, c.value
                    )),
                    None => Err(format!(
                        "'{}' has {} choices, got choice {choice}",
                        self.name,
                        choices.len()
                    )),
                }
            }
            (Answer::FreeText { text }, QuestionKind::FreeResponse { max_length }) => {
                let len = text.chars().count();
                if len > *max_length {
                    Err(format!(
                        "answer to '{}' is {len} characters, limit is {max_length}",
                        self.name
                    ))
                } else {
                    Ok(())
                }
            }
            (Answer::Selected { .. }, QuestionKind::FreeResponse { .. }) => {
                Err(format!("'{}' is free response, got a selection", self.name))
            }
            (Answer::FreeText { .. }, QuestionKind::MultipleChoice { .. }) => {
                Err(format!("'{}' is multiple choice, got free text", self.name))
            }
        }
    }
}

/// Check that a question list is usable as a survey.
///
/// Returns a description of the first problem found.
pub fn validate_questions(questions: &[Question]) -> Result<(), String> {
    if questions.is_empty() {
        return Err("question list is empty".to_string());
    }

    let mut names = HashSet::new();
    for q in questions {
        if q.name.trim().is_empty() {
            return Err("question name must not be empty".to_string());
        }
        if !names.insert(q.name.as_str()) {
            return Err(format!("duplicate question name: {}", q.name));
        }
        match &q.kind {
            QuestionKind::MultipleChoice { choices } => {
                if choices.is_empty() {
                    return Err(format!("question {} has no choices", q.name));
                }
                let mut values = HashSet::new();
                for c in choices {
                    if !values.insert(c.value.as_str()) {
                        return Err(format!(
                            "question {} has duplicate choice value: {}",
                            q.name, c.value
                        ));
                    }
                }
            }
            QuestionKind::FreeResponse { max_length } => {
                if *max_length == 0 {
                    return Err(format!("question {} has a zero max_length", q.name));
                }
            }
        }
    }

    Ok(())
}
