//! motorhub-cli: command-line front end for the Motorhub API.
//! Every command goes through the library facade, so lists page through the
//! same collection cache an interactive client would use.
#![deny(clippy::all, clippy::pedantic)]

mod args;
mod client;
mod handlers;
mod io;
mod print;

use clap::Parser;

use args::{Cli, Commands};
use client::{CliError, build_ctx_from_cli};
use handlers::{auth, comments, events, listings, posts, users};

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let ctx = build_ctx_from_cli(&cli)?;

    match cli.command {
        Commands::Login(cmd) => auth::login(&ctx, cmd).await?,
        Commands::Logout => auth::logout(&ctx).await?,
        Commands::Me => auth::me(&ctx).await?,
        Commands::Listings(cmd) => listings::handle(&ctx, cmd.action).await?,
        Commands::Posts(cmd) => posts::handle(&ctx, cmd.action).await?,
        Commands::Comments(cmd) => comments::handle(&ctx, cmd.action).await?,
        Commands::Events(cmd) => events::handle(&ctx, cmd.action).await?,
        Commands::Users(cmd) => users::handle(&ctx, cmd.action).await?,
    }

    Ok(())
}
