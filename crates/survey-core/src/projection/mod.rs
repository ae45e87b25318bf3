//! Materialized survey view.
//!
//! Projects answer records from the journal into an in-memory [`Survey`].
//! The view is never persisted and can be rebuilt from the journal at any
//! time; [`Survey::apply`] is the single step used both by full replay and by
//! committing new answers, so the two can never disagree.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::catalog::CloneCatalog;
use crate::model::{Question, SurveyAnswer};
use crate::store::StoreResult;

/// Who has answered what.
#[derive(Debug, Clone, PartialEq)]
pub struct Survey {
    questions: Arc<[Question]>,
    catalog: Arc<CloneCatalog>,
    /// Catalog indices with no recorded answer
    unanswered: BTreeSet<usize>,
    /// Every recorded answer, in append order
    answers: Vec<SurveyAnswer>,
}

impl Survey {
    /// A view with no answers: every clone is unanswered.
    #[must_use]
    pub fn empty(questions: Arc<[Question]>, catalog: Arc<CloneCatalog>) -> Self {
        let unanswered = catalog.indices().collect();
        Self {
            questions,
            catalog,
            unanswered,
            answers: Vec::new(),
        }
    }

    /// Record one answer.
    ///
    /// Duplicate answers for a clone are all retained; answered status is
    /// set membership and unaffected by repeats.
    pub fn apply(&mut self, answer: SurveyAnswer) {
        self.unanswered.remove(&answer.clone_index);
        self.answers.push(answer);
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn catalog(&self) -> &CloneCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn unanswered(&self) -> &BTreeSet<usize> {
        &self.unanswered
    }

    #[must_use]
    pub fn answers(&self) -> &[SurveyAnswer] {
        &self.answers
    }

    #[must_use]
    pub fn answer_count(&self) -> usize {
        self.answers.len()
    }

    /// Whether at least one answer exists for the clone.
    #[must_use]
    pub fn is_answered(&self, clone_index: usize) -> bool {
        clone_index < self.catalog.count() && !self.unanswered.contains(&clone_index)
    }

    /// Answers recorded for one clone, in append order.
    pub fn answers_for(&self, clone_index: usize) -> impl Iterator<Item = &SurveyAnswer> {
        self.answers
            .iter()
            .filter(move |a| a.clone_index == clone_index)
    }

    /// Whether `respondent` already answered the clone.
    #[must_use]
    pub fn has_answered(&self, respondent: &str, clone_index: usize) -> bool {
        self.answers_for(clone_index)
            .any(|a| a.respondent == respondent)
    }
}

/// Replay records into a fresh view.
///
/// Returns the view and the number of records consumed. Stops at the first
/// error.
pub fn build_view<I>(
    questions: Arc<[Question]>,
    catalog: Arc<CloneCatalog>,
    records: I,
) -> StoreResult<(Survey, usize)>
where
    I: IntoIterator<Item = StoreResult<SurveyAnswer>>,
{
    let mut survey = Survey::empty(questions, catalog);
    for record in records {
        survey.apply(record?);
    }
    let count = survey.answer_count();
    Ok((survey, count))
}
