//! `tourdesk`: browse and moderate the admin dashboard tables from a terminal.

mod cli;
mod commands;
mod context;
mod output;
mod timing;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser as _;
use tracing::{error, instrument};

use crate::cli::{Cli, Commands, TourCommands, UserCommands};
use crate::commands::users::moderation_action;
use crate::context::{CliContext, business_config};
use crate::output::Output;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    timing::init_tracing(cli.verbose, cli.timing);

    let out = Output::new();
    match run(cli, &out).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = ?err, "command failed");
            out.error(format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

#[instrument(skip_all, name = "tourdesk")]
async fn run(cli: Cli, out: &Output) -> Result<()> {
    let ctx = CliContext::new(business_config(&cli)?);

    match cli.command {
        Commands::Tours { command } => match command {
            TourCommands::List(args) => commands::run_tours_list(&ctx, &args, out).await,
            TourCommands::Delete { ids } => commands::run_tours_delete(&ctx, &ids, out).await,
        },
        Commands::Users { command } => {
            if let UserCommands::List { tab, list } = &command {
                return commands::run_users_list(&ctx, *tab, list, out).await;
            }
            match moderation_action(command) {
                Some(action) => commands::run_moderation(&ctx, &action, out).await,
                None => Ok(()),
            }
        }
    }
}
