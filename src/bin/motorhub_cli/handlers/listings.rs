#![deny(clippy::all, clippy::pedantic)]

use crate::args::ListingsCmd;
use crate::client::{CliError, Ctx};
use crate::handlers::collect_pages;
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: ListingsCmd) -> Result<(), CliError> {
    match cmd {
        ListingsCmd::List { search, pages } => list(ctx, search.as_deref(), pages).await,
        ListingsCmd::Get { id } => {
            let listing = ctx.hub.listing(id).await?;
            print_json(listing.as_ref())
        }
        ListingsCmd::Sell { id, buyer } => {
            ctx.signed_in().await?;
            print_json(&ctx.hub.sell_listing(id, buyer).await?)
        }
        ListingsCmd::Delete { id } => {
            ctx.signed_in().await?;
            print_json(&ctx.hub.delete_listing(id).await?)
        }
    }
}

async fn list(ctx: &Ctx, search: Option<&str>, pages: u32) -> Result<(), CliError> {
    let listings = ctx.hub.listings(search);
    print_json(&collect_pages(&listings, pages).await?)
}
