//! Implementation of `survey status` command.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use survey_core::Survey;

use super::helpers::open_store;
use crate::output::{Formatter, OutputFormat};

/// Survey progress summary.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub questions: usize,
    pub clones: usize,
    pub answers: usize,
    pub respondents: usize,
    pub answered_clones: usize,
    pub unanswered: Vec<usize>,
}

impl StatusReport {
    fn from_survey(survey: &Survey) -> Self {
        let respondents: BTreeSet<&str> = survey
            .answers()
            .iter()
            .map(|a| a.respondent.as_str())
            .collect();
        let clones = survey.catalog().count();
        let unanswered: Vec<usize> = survey.unanswered().iter().copied().collect();

        Self {
            questions: survey.questions().len(),
            clones,
            answers: survey.answer_count(),
            respondents: respondents.len(),
            answered_clones: clones - unanswered.len(),
            unanswered,
        }
    }
}

/// Run the status command.
pub fn run_status(store_dir: &Path, clones_dir: &Path, format: OutputFormat) -> Result<()> {
    let store = open_store(store_dir, clones_dir)?;
    let survey = store.snapshot()?;
    Formatter::new(format).print(&StatusReport::from_survey(&survey))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::helpers::fixtures;
    use crate::cli::commands::init::run_init;
    use crate::cli::commands::submit::{run_submit, SubmitArgs};
    use tempfile::TempDir;

    #[test]
    fn test_status_counts() {
        let temp = TempDir::new().unwrap();
        let (store, questions, clones) = fixtures::setup(temp.path(), 4);
        run_init(&store, &questions, &clones, OutputFormat::Text).unwrap();

        let raw = vec!["is_clone=no".to_string()];
        for (clone_index, respondent) in [(0, "a"), (2, "b"), (2, "a")] {
            let args = SubmitArgs {
                clone_index,
                respondent: Some(respondent),
                answers: &raw,
                allow_partial: false,
            };
            run_submit(&store, &clones, args, OutputFormat::Text).unwrap();
        }

        let survey = open_store(&store, &clones).unwrap().snapshot().unwrap();
        let report = StatusReport::from_survey(&survey);

        assert_eq!(report.questions, 2);
        assert_eq!(report.clones, 4);
        assert_eq!(report.answers, 3);
        assert_eq!(report.respondents, 2);
        assert_eq!(report.answered_clones, 2);
        assert_eq!(report.unanswered, vec![1, 3]);

        run_status(&store, &clones, OutputFormat::Json).unwrap();
    }

    #[test]
    fn test_status_empty_survey() {
        let temp = TempDir::new().unwrap();
        let (store, questions, clones) = fixtures::setup(temp.path(), 2);
        run_init(&store, &questions, &clones, OutputFormat::Text).unwrap();

        let survey = open_store(&store, &clones).unwrap().snapshot().unwrap();
        let report = StatusReport::from_survey(&survey);

        assert_eq!(report.answers, 0);
        assert_eq!(report.answered_clones, 0);
        assert_eq!(report.unanswered, vec![0, 1]);
    }
}
