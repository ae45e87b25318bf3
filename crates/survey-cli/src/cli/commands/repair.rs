//! Implementation of `survey repair` command.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::Serialize;
use survey_core::journal::FileJournal;
use survey_core::store::{answers_path, is_initialized};

use crate::output::{Formatter, OutputFormat};

#[derive(Debug, Serialize)]
struct RepairSummary {
    journal: PathBuf,
    removed_bytes: u64,
    len: u64,
    repaired: bool,
}

/// Run the repair command.
///
/// Only an unterminated final line is removed; complete records are kept
/// even when they fail to decode.
#[tracing::instrument(skip_all, fields(store = %store_dir.display()))]
pub fn run_repair(store_dir: &Path, format: OutputFormat) -> Result<()> {
    if !is_initialized(store_dir) {
        bail!(
            "No survey at {}. Run 'survey init' first.",
            store_dir.display()
        );
    }

    let path = answers_path(store_dir);
    let report = FileJournal::new(&path).repair()?;

    let summary = RepairSummary {
        journal: path,
        removed_bytes: report.removed_bytes,
        len: report.len,
        repaired: report.removed_bytes > 0,
    };
    Formatter::new(format).print(&summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::helpers::{fixtures, open_store};
    use crate::cli::commands::init::run_init;
    use crate::cli::commands::submit::{run_submit, SubmitArgs};
    use std::fs::{self, OpenOptions};
    use std::io::Write;
    use survey_core::StoreError;
    use tempfile::TempDir;

    #[test]
    fn test_repair_restores_clean_prefix() {
        let temp = TempDir::new().unwrap();
        let (store, questions, clones) = fixtures::setup(temp.path(), 2);
        run_init(&store, &questions, &clones, OutputFormat::Text).unwrap();

        let raw = vec!["is_clone=no".to_string()];
        let args = SubmitArgs {
            clone_index: 1,
            respondent: Some("r"),
            answers: &raw,
            allow_partial: false,
        };
        run_submit(&store, &clones, args, OutputFormat::Text).unwrap();
        let clean = fs::read(answers_path(&store)).unwrap();

        let mut file = OpenOptions::new()
            .append(true)
            .open(answers_path(&store))
            .unwrap();
        file.write_all(b"{\"respondent\":\"cut off").unwrap();
        drop(file);

        let err = open_store(&store, &clones).unwrap().snapshot().unwrap_err();
        assert!(matches!(err, StoreError::CorruptRecord { torn: true, .. }));

        run_repair(&store, OutputFormat::Json).unwrap();

        assert_eq!(fs::read(answers_path(&store)).unwrap(), clean);
        let survey = open_store(&store, &clones).unwrap().snapshot().unwrap();
        assert_eq!(survey.answer_count(), 1);

        // Second run has nothing to do
        run_repair(&store, OutputFormat::Text).unwrap();
        assert_eq!(fs::read(answers_path(&store)).unwrap(), clean);
    }

    #[test]
    fn test_repair_requires_init() {
        let temp = TempDir::new().unwrap();
        assert!(run_repair(temp.path(), OutputFormat::Text).is_err());
    }
}
