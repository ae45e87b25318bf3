//! Implementation of `survey answers` command.

use std::path::Path;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use survey_core::{Question, Survey, SurveyAnswer};

use super::helpers::open_store;
use crate::output::{Formatter, OutputFormat};

/// One recorded answer, flattened for display.
#[derive(Debug, Serialize)]
pub struct AnswerRow {
    /// 1-based position in the journal
    pub record: usize,
    pub clone_index: usize,
    pub clone_ext_id: String,
    pub respondent: String,
    pub submitted_at: Option<DateTime<Utc>>,
    pub responses: Vec<String>,
}

impl AnswerRow {
    fn new(record: usize, answer: &SurveyAnswer, questions: &[Question]) -> Self {
        let responses = answer
            .responses
            .iter()
            .map(|r| {
                let name = questions.get(r.question).map_or("?", |q| q.name.as_str());
                format!("{name}={}", r.answer)
            })
            .collect();

        Self {
            record,
            clone_index: answer.clone_index,
            clone_ext_id: answer.clone_ext_id.clone(),
            respondent: answer.respondent.clone(),
            submitted_at: answer.submitted_at,
            responses,
        }
    }
}

fn collect_rows(survey: &Survey, clone_index: Option<usize>) -> Vec<AnswerRow> {
    survey
        .answers()
        .iter()
        .enumerate()
        .filter(|(_, a)| clone_index.map_or(true, |i| a.clone_index == i))
        .map(|(pos, a)| AnswerRow::new(pos + 1, a, survey.questions()))
        .collect()
}

/// Run the answers command.
pub fn run_answers(
    store_dir: &Path,
    clones_dir: &Path,
    clone_index: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let store = open_store(store_dir, clones_dir)?;
    if let Some(index) = clone_index {
        if store.catalog().get(index).is_none() {
            bail!(
                "Unknown clone index {index} (catalog has {} clones)",
                store.catalog().count()
            );
        }
    }

    let survey = store.snapshot()?;
    let rows = collect_rows(&survey, clone_index);
    Formatter::new(format).print_list(&rows, "No answers recorded", "answers")
}
