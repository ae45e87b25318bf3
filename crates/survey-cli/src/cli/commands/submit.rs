//! Implementation of `survey submit` command.

use std::path::Path;

use anyhow::{anyhow, bail, Result};
use serde::Serialize;
use survey_core::form::{decode_form, FieldErrors};
use survey_core::identity::get_respondent;

use super::helpers::{open_store, parse_fields};
use crate::output::{Formatter, OutputFormat};

#[derive(Debug, Serialize)]
struct Submitted {
    record: usize,
    clone_index: usize,
    clone_ext_id: String,
    respondent: String,
    answered: usize,
    unanswered_remaining: usize,
    errors: FieldErrors,
}

/// Options for one submission.
#[derive(Debug, Clone, Copy)]
pub struct SubmitArgs<'a> {
    pub clone_index: usize,
    pub respondent: Option<&'a str>,
    pub answers: &'a [String],
    pub allow_partial: bool,
}

/// Run the submit command.
///
/// Decodes the answers against the question list and appends one record.
/// Submissions with field errors are refused unless `allow_partial` is set.
#[tracing::instrument(skip_all, fields(clone = args.clone_index))]
pub fn run_submit(
    store_dir: &Path,
    clones_dir: &Path,
    args: SubmitArgs<'_>,
    format: OutputFormat,
) -> Result<()> {
    let store = open_store(store_dir, clones_dir)?;
    let respondent = get_respondent(args.respondent)?;
    let fields = parse_fields(args.answers)?;

    let unknown: Vec<&str> = fields
        .keys()
        .filter(|name| !store.questions().iter().any(|q| &q.name == *name))
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        bail!("Unknown question(s): {}", unknown.join(", "));
    }

    let clone = store.catalog().get(args.clone_index).ok_or_else(|| {
        anyhow!(
            "Unknown clone index {} (catalog has {} clones)",
            args.clone_index,
            store.catalog().count()
        )
    })?;

    let decoded = decode_form(store.questions(), &respondent, clone, &fields);
    if !decoded.is_valid() && !args.allow_partial {
        let details: Vec<String> = decoded
            .errors
            .iter()
            .map(|(name, msg)| format!("{name}: {msg}"))
            .collect();
        bail!(
            "Submission has invalid fields ({}). Fix them or pass --allow-partial.",
            details.join("; ")
        );
    }

    let answer = decoded.answer;
    let answered = answer.answered_count();
    let clone_ext_id = answer.clone_ext_id.clone();

    let (record, unanswered_remaining) = store.transact(|txn| {
        if txn.survey().has_answered(&respondent, args.clone_index) {
            tracing::info!(respondent = %respondent, "respondent already answered this clone");
        }
        let survey = txn.survey();
        let record = survey.answer_count() + 1;
        let mut remaining = survey.unanswered().len();
        if survey.unanswered().contains(&args.clone_index) {
            remaining -= 1;
        }
        txn.record(answer)?;
        Ok((record, remaining))
    })?;

    let summary = Submitted {
        record,
        clone_index: args.clone_index,
        clone_ext_id,
        respondent,
        answered,
        unanswered_remaining,
        errors: decoded.errors,
    };
    Formatter::new(format).print(&summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::helpers::{fixtures, open_store};
    use crate::cli::commands::init::run_init;
    use survey_core::Answer;
    use tempfile::TempDir;

    fn answers(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn args<'a>(clone_index: usize, answers: &'a [String], allow_partial: bool) -> SubmitArgs<'a> {
        SubmitArgs {
            clone_index,
            respondent: Some("r@example.com"),
            answers,
            allow_partial,
        }
    }

    // ========================================================================
    // Submission
    // ========================================================================

    #[test]
    fn test_submit_records_answer() {
        let temp = TempDir::new().unwrap();
        let (store, questions, clones) = fixtures::setup(temp.path(), 3);
        run_init(&store, &questions, &clones, OutputFormat::Text).unwrap();

        let raw = answers(&["is_clone=yes", "notes=same loop body"]);
        run_submit(&store, &clones, args(1, &raw, false), OutputFormat::Json).unwrap();

        let survey = open_store(&store, &clones).unwrap().snapshot().unwrap();
        assert_eq!(survey.answer_count(), 1);
        assert!(survey.is_answered(1));
        let recorded = &survey.answers()[0];
        assert_eq!(recorded.respondent, "r@example.com");
        assert_eq!(recorded.clone_ext_id, "pattern-1");
        assert_eq!(
            recorded.responses[0].answer,
            Answer::Selected {
                choice: 0,
                value: "yes".to_string()
            }
        );
    }

    #[test]
    fn test_submit_refuses_invalid_fields() {
        let temp = TempDir::new().unwrap();
        let (store, questions, clones) = fixtures::setup(temp.path(), 3);
        run_init(&store, &questions, &clones, OutputFormat::Text).unwrap();

        let raw = answers(&["notes=missing the required one"]);
        let err = run_submit(&store, &clones, args(0, &raw, false), OutputFormat::Text).unwrap_err();
        assert!(err.to_string().contains("is_clone"));

        let survey = open_store(&store, &clones).unwrap().snapshot().unwrap();
        assert_eq!(survey.answer_count(), 0);
    }

    #[test]
    fn test_submit_allow_partial_records_errors() {
        let temp = TempDir::new().unwrap();
        let (store, questions, clones) = fixtures::setup(temp.path(), 3);
        run_init(&store, &questions, &clones, OutputFormat::Text).unwrap();

        let raw = answers(&["is_clone=maybe"]);
        run_submit(&store, &clones, args(2, &raw, true), OutputFormat::Text).unwrap();

        let survey = open_store(&store, &clones).unwrap().snapshot().unwrap();
        assert_eq!(survey.answer_count(), 1);
        assert_eq!(survey.answers()[0].responses[0].answer, Answer::Invalid);
        assert!(!survey.unanswered().contains(&2));
    }

    #[test]
    fn test_submit_rejects_unknown_question_and_clone() {
        let temp = TempDir::new().unwrap();
        let (store, questions, clones) = fixtures::setup(temp.path(), 2);
        run_init(&store, &questions, &clones, OutputFormat::Text).unwrap();

        let raw = answers(&["is_clone=yes", "colour=blue"]);
        let err = run_submit(&store, &clones, args(0, &raw, false), OutputFormat::Text).unwrap_err();
        assert!(err.to_string().contains("colour"));

        let raw = answers(&["is_clone=yes"]);
        let err = run_submit(&store, &clones, args(9, &raw, false), OutputFormat::Text).unwrap_err();
        assert!(err.to_string().contains("Unknown clone index 9"));
    }

    #[test]
    fn test_submit_requires_init() {
        let temp = TempDir::new().unwrap();
        let (store, _questions, clones) = fixtures::setup(temp.path(), 1);

        let raw = answers(&["is_clone=yes"]);
        let err = run_submit(&store, &clones, args(0, &raw, false), OutputFormat::Text).unwrap_err();
        assert!(format!("{err:#}").contains("survey init"));
    }
}
