#![deny(clippy::all, clippy::pedantic)]

use crate::args::PostsCmd;
use crate::client::{CliError, Ctx};
use crate::handlers::collect_pages;
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: PostsCmd) -> Result<(), CliError> {
    match cmd {
        PostsCmd::List { mine, pages } => list(ctx, mine, pages).await,
        PostsCmd::Upvote { id } => {
            ctx.signed_in().await?;
            print_json(&ctx.hub.toggle_post_upvote(id).await?)
        }
        PostsCmd::Delete { id } => {
            ctx.signed_in().await?;
            print_json(&ctx.hub.delete_post(id).await?)
        }
    }
}

async fn list(ctx: &Ctx, mine: bool, pages: u32) -> Result<(), CliError> {
    let posts = if mine {
        ctx.signed_in().await?;
        ctx.hub.my_posts()?
    } else {
        ctx.hub.posts()
    };
    print_json(&collect_pages(&posts, pages).await?)
}
