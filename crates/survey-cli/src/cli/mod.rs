//! CLI command definitions and handlers.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

pub mod commands;

/// Record and inspect code clone survey answers
#[derive(Parser, Debug)]
#[command(name = "survey")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Survey store directory
    #[arg(long, global = true, env = "SURVEY_STORE", default_value = "survey-data")]
    pub store: PathBuf,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new survey from a question file
    Init {
        /// JSON file holding the question list
        #[arg(long)]
        questions: PathBuf,

        /// Clone catalog directory
        #[arg(long)]
        clones: PathBuf,
    },

    /// Record one answer for a clone
    Submit {
        /// Clone catalog directory
        #[arg(long)]
        clones: PathBuf,

        /// Clone index being answered
        #[arg(long = "clone")]
        clone_index: usize,

        /// Override respondent identity (default: $SURVEY_RESPONDENT or $USER)
        #[arg(long)]
        respondent: Option<String>,

        /// Answer as question=value (repeatable)
        #[arg(short = 'a', long = "answer")]
        answers: Vec<String>,

        /// Record the answer even when some fields are invalid or missing
        #[arg(long)]
        allow_partial: bool,
    },

    /// Show survey progress
    Status {
        /// Clone catalog directory
        #[arg(long)]
        clones: PathBuf,
    },

    /// List recorded answers
    Answers {
        /// Clone catalog directory
        #[arg(long)]
        clones: PathBuf,

        /// Only answers for this clone index
        #[arg(long = "clone")]
        clone_index: Option<usize>,
    },

    /// Health check - verify the question file and replay the answer journal
    Doctor,

    /// Truncate a torn final line from the answer journal
    Repair,
}
