#![deny(clippy::all, clippy::pedantic)]

use crate::args::UsersCmd;
use crate::client::{CliError, Ctx};
use crate::handlers::collect_pages;
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: UsersCmd) -> Result<(), CliError> {
    match cmd {
        UsersCmd::Search { search, pages } => {
            ctx.signed_in().await?;
            let users = ctx.hub.buyer_users(search.as_deref());
            print_json(&collect_pages(&users, pages).await?)
        }
    }
}
