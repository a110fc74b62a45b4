//! Scroll-driven paging through the public facade against a mocked backend.

use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use motorhub::application::client::Motorhub;
use motorhub::cache::{CacheConfig, CollectionState, FetchOutcome, Sentinel, TriggerOutcome, Viewport};
use motorhub::config::ApiSettings;
use motorhub::infra::http::ApiClient;
use motorhub::infra::token_store::TokenStore;
use tempfile::TempDir;
use url::Url;

const USER_JSON: &str = r#"{"id":7,"firstname":"Ada","lastname":"Lovelace","username":"ada","email":"ada@example.com","profile_picture":null,"role":"REGULAR"}"#;

fn hub(server: &MockServer, dir: &TempDir, config: CacheConfig) -> Motorhub {
    let settings = ApiSettings {
        base_url: Url::parse(&server.url("/api/")).expect("base url"),
        asset_url: Url::parse(&server.url("/")).expect("asset url"),
        timeout: Duration::from_secs(5),
    };
    let tokens = TokenStore::new(dir.path().join("token.json"));
    let api = Arc::new(ApiClient::new(&settings, tokens).expect("client"));
    Motorhub::with_client(api, config)
}

fn post_json(id: i64) -> String {
    format!(
        r#"{{"id":{id},"title":"Post {id}","content":"body","author":{USER_JSON},"comments_count":0,"upvotes_count":3,"upvoted_by_user":false,"created_at":"2024-05-01T10:00:00.000000Z","updated_at":"2024-05-01T10:00:00.000000Z"}}"#
    )
}

fn envelope(items: &[String], current: u32, last: u32, total: u64) -> String {
    format!(
        r#"{{"data":[{}],"meta":{{"current_page":{current},"last_page":{last},"total":{total},"per_page":2,"from":null,"to":null}},"links":{{"first":null,"last":null,"next":null,"prev":null}}}}"#,
        items.join(",")
    )
}

fn mock_feed_page<'a>(server: &'a MockServer, page: u32, ids: &[i64]) -> httpmock::Mock<'a> {
    let items: Vec<String> = ids.iter().map(|id| post_json(*id)).collect();
    let body = envelope(&items, page, 3, 6);
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/posts")
            .query_param("page", page.to_string());
        then.status(200).body(body);
    })
}

#[tokio::test]
async fn viewport_signals_walk_the_feed_to_its_last_page() {
    let server = MockServer::start();
    let dir = TempDir::new().expect("temp dir");
    let hub = hub(&server, &dir, CacheConfig::default());
    let first = mock_feed_page(&server, 1, &[1, 2]);
    let second = mock_feed_page(&server, 2, &[3, 4]);
    let third = mock_feed_page(&server, 3, &[5, 6]);

    let feed = hub.posts();
    let outcome = feed.get_next_page().await.expect("first page");
    assert!(matches!(outcome, FetchOutcome::Appended { page: 1, exhausted: false, .. }));

    let trigger = hub.viewport_trigger(feed.clone(), Sentinel::new(1200.0));
    let bottom = Viewport::new(600.0, 800.0);

    assert_eq!(
        trigger.evaluate(&Viewport::new(0.0, 800.0)).await,
        TriggerOutcome::NotVisible
    );
    assert!(matches!(
        trigger.evaluate(&bottom).await,
        TriggerOutcome::Fetched(FetchOutcome::Appended { page: 2, .. })
    ));
    assert!(matches!(
        trigger.evaluate(&bottom).await,
        TriggerOutcome::Fetched(FetchOutcome::Appended { page: 3, exhausted: true, .. })
    ));
    assert_eq!(
        trigger.evaluate(&bottom).await,
        TriggerOutcome::Idle(CollectionState::Exhausted)
    );

    first.assert_calls(1);
    second.assert_calls(1);
    third.assert_calls(1);

    let ids: Vec<i64> = feed.flattened_items().iter().map(|post| post.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    assert!(!feed.has_more());
}

#[tokio::test]
async fn deletion_resets_the_feed_until_next_read() {
    let server = MockServer::start();
    let dir = TempDir::new().expect("temp dir");
    let hub = hub(&server, &dir, CacheConfig::default());
    let items = [post_json(1), post_json(2)];
    let first = server.mock(|when, then| {
        when.method(GET).path("/api/posts").query_param("page", "1");
        then.status(200)
            .delay(Duration::from_millis(100))
            .body(envelope(&items, 1, 3, 6));
    });
    server.mock(|when, then| {
        when.method(DELETE).path("/api/posts/1");
        then.status(200).body(r#"{"message":"Post deleted"}"#);
    });

    let feed = hub.posts();
    feed.get_next_page().await.expect("first page");
    assert_eq!(feed.state(), CollectionState::Loaded);

    hub.delete_post(1).await.expect("delete");
    assert_eq!(feed.state(), CollectionState::Empty);

    let refetch = feed.get_next_page();
    let in_flight = async {
        loop {
            let state = feed.state();
            if state != CollectionState::Empty {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    };
    let (outcome, seen) = tokio::join!(refetch, in_flight);

    assert_eq!(seen, CollectionState::Loading);
    assert!(matches!(outcome, Ok(FetchOutcome::Appended { page: 1, .. })));
    assert_eq!(feed.state(), CollectionState::Loaded);
    first.assert_calls(2);
}

#[tokio::test]
async fn settled_search_fetches_once_for_final_text() {
    let server = MockServer::start();
    let dir = TempDir::new().expect("temp dir");
    let config = CacheConfig {
        search_debounce_ms: 50,
        ..CacheConfig::default()
    };
    let hub = hub(&server, &dir, config);
    let searched = server.mock(|when, then| {
        when.method(GET)
            .path("/api/listings")
            .query_param("search", "abc");
        then.status(200).body(envelope(&[], 1, 1, 0));
    });

    let mut listings = hub.listings(None);
    let (input, mut settled) = hub.search_input();
    for text in ["a", "ab", "abc"] {
        input.set(Some(text.to_string()));
    }

    let search = settled.settled().await.expect("settled value");
    assert_eq!(search.as_deref(), Some("abc"));
    hub.search_listings(&mut listings, search.as_deref());
    assert_eq!(listings.state(), CollectionState::Empty);
    listings.get_next_page().await.expect("search page");

    searched.assert_calls(1);
}
