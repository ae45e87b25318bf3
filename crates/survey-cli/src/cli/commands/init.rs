//! Implementation of `survey init` command.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use survey_core::model::Question;
use survey_core::store::answers_path;
use survey_core::{CloneCatalog, SurveyStore};

use crate::output::{Formatter, OutputFormat};

#[derive(Debug, Serialize)]
struct InitSummary {
    store: PathBuf,
    journal: PathBuf,
    questions: usize,
    clones: usize,
}

/// Run the init command.
///
/// Validates the question file and the clone catalog, then writes the
/// question list into a fresh store directory.
#[tracing::instrument(skip_all, fields(store = %store_dir.display()))]
pub fn run_init(
    store_dir: &Path,
    questions_file: &Path,
    clones_dir: &Path,
    format: OutputFormat,
) -> Result<()> {
    let content = fs::read_to_string(questions_file)
        .with_context(|| format!("Failed to read questions: {}", questions_file.display()))?;
    let questions: Vec<Question> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse questions: {}", questions_file.display()))?;

    let catalog = CloneCatalog::load_dir(clones_dir)?;
    let clones = catalog.count();

    let store = SurveyStore::create(store_dir, questions, catalog)?;

    let summary = InitSummary {
        store: store_dir.to_path_buf(),
        journal: answers_path(store_dir),
        questions: store.questions().len(),
        clones,
    };
    Formatter::new(format).print(&summary)
}
