//! survey - record and inspect code clone survey answers.

mod cli;
mod output;
mod telemetry;

use anyhow::Result;
use clap::Parser;

use cli::commands::submit::SubmitArgs;
use cli::commands::{run_answers, run_doctor, run_init, run_repair, run_status, run_submit};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.log_json);

    let store = cli.store;
    let format = cli.format;
    tracing::debug!(store = %store.display(), "survey starting");

    match cli.command {
        Commands::Init { questions, clones } => {
            run_init(&store, &questions, &clones, format)?;
        }

        Commands::Submit {
            clones,
            clone_index,
            respondent,
            answers,
            allow_partial,
        } => {
            let args = SubmitArgs {
                clone_index,
                respondent: respondent.as_deref(),
                answers: &answers,
                allow_partial,
            };
            run_submit(&store, &clones, args, format)?;
        }

        Commands::Status { clones } => {
            run_status(&store, &clones, format)?;
        }

        Commands::Answers {
            clones,
            clone_index,
        } => {
            run_answers(&store, &clones, clone_index, format)?;
        }

        Commands::Doctor => {
            // Exit with error code if unhealthy
            if !run_doctor(&store, format)? {
                std::process::exit(1);
            }
        }

        Commands::Repair => {
            run_repair(&store, format)?;
        }
    }

    Ok(())
}
