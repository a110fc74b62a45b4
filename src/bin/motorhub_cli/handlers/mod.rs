#![deny(clippy::all, clippy::pedantic)]

pub mod auth;
pub mod comments;
pub mod events;
pub mod listings;
pub mod posts;
pub mod users;

use motorhub::cache::{FetchOutcome, InfiniteCollection};
use serde::Serialize;
use tracing::debug;

use crate::client::CliError;

/// Items loaded so far plus whether the server has more.
#[derive(Debug, Serialize)]
pub struct PageDump<T> {
    pub items: Vec<T>,
    pub pages: usize,
    pub has_more: bool,
}

/// Load up to `pages` pages into the collection, stopping early once it is
/// exhausted.
pub async fn collect_pages<T>(collection: &InfiniteCollection<T>, pages: u32) -> Result<PageDump<T>, CliError>
where
    T: Clone + Send + Sync + 'static,
{
    for _ in 0..pages.max(1) {
        match collection.get_next_page().await? {
            FetchOutcome::Appended { exhausted: false, .. } => {}
            outcome => {
                debug!(key = %collection.key(), ?outcome, "Stopped paging");
                break;
            }
        }
    }
    let items = collection.flattened_items();
    Ok(PageDump {
        pages: items.page_count(),
        items: items.to_vec(),
        has_more: collection.has_more(),
    })
}
