//! Domain logic for the clone survey.
//!
//! This crate owns the answer model, the append-only answer journal, the
//! replayed survey view, and the transaction coordinator that serializes
//! read-modify-append cycles against the journal.

pub mod catalog;
pub mod codec;
pub mod form;
pub mod identity;
pub mod journal;
pub mod model;
pub mod projection;
pub mod store;

pub use catalog::{CloneCatalog, CloneRef};
pub use model::{Answer, Choice, Question, QuestionKind, Response, SurveyAnswer};
pub use projection::Survey;
pub use store::{StoreError, StoreResult, SurveyStore, SurveyTxn};
