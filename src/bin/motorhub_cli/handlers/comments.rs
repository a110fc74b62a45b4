#![deny(clippy::all, clippy::pedantic)]

use motorhub_api_types::NewCommentData;

use crate::args::CommentsCmd;
use crate::client::{CliError, Ctx};
use crate::handlers::collect_pages;
use crate::io::read_value;
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: CommentsCmd) -> Result<(), CliError> {
    match cmd {
        CommentsCmd::List { post, pages } => {
            let comments = ctx.hub.post_comments(post);
            print_json(&collect_pages(&comments, pages).await?)
        }
        CommentsCmd::Add {
            post,
            content,
            content_file,
        } => {
            let content = read_value(content, content_file, "comment content")?;
            ctx.signed_in().await?;
            print_json(&ctx.hub.add_comment(post, &NewCommentData { content }).await?)
        }
        CommentsCmd::Upvote { post, comment } => {
            ctx.signed_in().await?;
            print_json(&ctx.hub.toggle_comment_upvote(post, comment).await?)
        }
    }
}
