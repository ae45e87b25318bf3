//! Survey data model.
//!
//! Questions are fixed at store creation. Answers are the unit of append to
//! the journal and are serialized as JSON Lines.

pub mod answers;
pub mod questions;

pub use answers::{Answer, Response, SurveyAnswer};
pub use questions::{validate_questions, Choice, Question, QuestionKind};
