mod cli;
mod commands;
mod context;
mod output;
mod timing;

use anyhow::Result;
use clap::Parser as _;

use crate::cli::{Cli, Commands};
use crate::commands::{RegisterArgs, run_positions, run_register, run_users};
use crate::context::{build_session, load_config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    timing::init_tracing(cli.verbose, cli.timing);

    let config = load_config(cli.api_url.as_deref())?;
    let session = build_session(config)?;

    match cli.command {
        Commands::Users { pages } => run_users(session, pages).await,
        Commands::Positions => run_positions(session).await,
        Commands::Register {
            name,
            email,
            phone,
            position_id,
            photo,
        } => {
            run_register(
                session,
                RegisterArgs {
                    name,
                    email,
                    phone,
                    position_id,
                    photo,
                },
            )
            .await
        }
    }
}
