//! Implementation of `survey doctor` health check command.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use survey_core::journal::{read_all, FileJournal, Journal};
use survey_core::model::{validate_questions, Question};
use survey_core::store::{answers_path, load_questions};
use survey_core::{StoreError, SurveyAnswer};

use crate::output::{Formatter, OutputFormat};

/// Result of a single health check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl CheckResult {
    fn pass(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: "pass".to_string(),
            message: message.to_string(),
            remediation: None,
        }
    }

    fn fail(name: &str, message: &str, remediation: &str) -> Self {
        Self {
            name: name.to_string(),
            status: "fail".to_string(),
            message: message.to_string(),
            remediation: Some(remediation.to_string()),
        }
    }

    fn warn(name: &str, message: &str, remediation: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            status: "warn".to_string(),
            message: message.to_string(),
            remediation: remediation.map(ToString::to_string),
        }
    }
}

/// Overall health status.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub checks: Vec<CheckResult>,
}

/// Run the doctor health check.
///
/// Returns whether the store is healthy; the caller maps that to the exit code.
pub fn run_doctor(store_dir: &Path, format: OutputFormat) -> Result<bool> {
    let report = build_report(store_dir);
    Formatter::new(format).print(&report)?;
    Ok(report.healthy)
}

fn build_report(store_dir: &Path) -> HealthReport {
    let mut checks = Vec::new();

    let (check, questions) = check_questions(store_dir);
    checks.push(check);

    if let Some(questions) = questions {
        let journal = FileJournal::new(answers_path(store_dir));
        let (check, records) = check_journal(&journal);
        checks.push(check);

        if let Some(records) = records {
            checks.push(check_response_shape(&questions, &records));
        }
    }

    let healthy = checks.iter().all(|c| c.status != "fail");
    HealthReport { healthy, checks }
}

/// Check the question file exists, parses and is usable.
fn check_questions(store_dir: &Path) -> (CheckResult, Option<Vec<Question>>) {
    match load_questions(store_dir) {
        Ok(questions) => match validate_questions(&questions) {
            Ok(()) => (
                CheckResult::pass(
                    "questions",
                    &format!("{} questions defined", questions.len()),
                ),
                Some(questions),
            ),
            Err(reason) => (
                CheckResult::fail(
                    "questions",
                    &format!("Question file is invalid: {reason}"),
                    "Recreate the survey with a corrected question file",
                ),
                None,
            ),
        },
        Err(StoreError::NotInitialized { .. }) => (
            CheckResult::fail(
                "questions",
                &format!("No survey at {}", store_dir.display()),
                "Run 'survey init --questions <FILE> --clones <DIR>'",
            ),
            None,
        ),
        Err(e) => (
            CheckResult::fail(
                "questions",
                &e.to_string(),
                "Check the question file for syntax errors",
            ),
            None,
        ),
    }
}

/// Replay the whole journal.
fn check_journal(journal: &FileJournal) -> (CheckResult, Option<Vec<SurveyAnswer>>) {
    if !journal.path().exists() {
        return (
            CheckResult::warn("journal", "No answer journal yet", None),
            Some(Vec::new()),
        );
    }

    match read_all(journal) {
        Ok(records) => (
            CheckResult::pass("journal", &format!("{} records replayed", records.len())),
            Some(records),
        ),
        Err(e @ StoreError::CorruptRecord { torn: true, .. }) => (
            CheckResult::fail(
                "journal",
                &e.to_string(),
                "Run 'survey repair' to drop the unfinished final record",
            ),
            None,
        ),
        Err(StoreError::CorruptRecord { line, reason, .. }) => (
            CheckResult::fail(
                "journal",
                &format!("Line {line} is not a valid record: {reason}"),
                &format!(
                    "Inspect line {line} of {} manually",
                    journal.path().display()
                ),
            ),
            None,
        ),
        Err(e) => (
            CheckResult::fail("journal", &e.to_string(), "Check file permissions"),
            None,
        ),
    }
}

/// Every record should carry one response per question.
fn check_response_shape(questions: &[Question], records: &[SurveyAnswer]) -> CheckResult {
    let mismatched: Vec<String> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.responses.len() != questions.len())
        .map(|(i, _)| (i + 1).to_string())
        .collect();

    if mismatched.is_empty() {
        CheckResult::pass("responses", "All records match the question list")
    } else {
        CheckResult::warn(
            "responses",
            &format!(
                "{} record(s) do not match the question list: {}",
                mismatched.len(),
                mismatched.join(", ")
            ),
            Some("Records written under a different question file are kept as is"),
        )
    }
}
