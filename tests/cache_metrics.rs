use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use metrics_util::debugging::DebuggingRecorder;
use motorhub::application::client::Motorhub;
use motorhub::cache::CacheConfig;
use motorhub::config::ApiSettings;
use motorhub::infra::http::ApiClient;
use motorhub::infra::telemetry;
use motorhub::infra::token_store::TokenStore;
use serde_json::json;
use tempfile::TempDir;
use url::Url;

const USER_JSON: &str = r#"{"id":7,"firstname":"Ada","lastname":"Lovelace","username":"ada","email":"ada@example.com","profile_picture":null,"role":"REGULAR"}"#;

fn post_json(id: i64) -> String {
    format!(
        r#"{{"id":{id},"title":"Post {id}","content":"body","author":{USER_JSON},"comments_count":0,"upvotes_count":3,"upvoted_by_user":false,"created_at":"2024-05-01T10:00:00.000000Z","updated_at":"2024-05-01T10:00:00.000000Z"}}"#
    )
}

#[tokio::test]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    telemetry::describe_metrics();

    let server = MockServer::start();
    let dir = TempDir::new().expect("temp dir");
    let settings = ApiSettings {
        base_url: Url::parse(&server.url("/api/")).expect("base url"),
        asset_url: Url::parse(&server.url("/")).expect("asset url"),
        timeout: Duration::from_secs(5),
    };
    let api = Arc::new(
        ApiClient::new(&settings, TokenStore::new(dir.path().join("token.json"))).expect("client"),
    );
    let hub = Motorhub::with_client(
        api,
        CacheConfig {
            query_limit: 1,
            ..CacheConfig::default()
        },
    );

    server.mock(|when, then| {
        when.method(GET).path("/api/posts").query_param("page", "1");
        then.status(200).body(format!(
            r#"{{"data":[{}],"meta":{{"current_page":1,"last_page":2,"total":2,"per_page":1,"from":null,"to":null}},"links":{{"first":null,"last":null,"next":null,"prev":null}}}}"#,
            post_json(1)
        ));
    });
    for id in [1, 2] {
        server.mock(|when, then| {
            when.method(GET).path(format!("/api/posts/{id}"));
            then.status(200).body(post_json(id));
        });
    }
    server.mock(|when, then| {
        when.method(POST).path("/api/posts/1/toggle-upvote");
        then.status(503).json_body(json!({"message": "maintenance"}));
    });
    server.mock(|when, then| {
        when.method(DELETE).path("/api/posts/2");
        then.status(200).json_body(json!({"message": "Post deleted"}));
    });

    // Page fetch
    let feed = hub.posts();
    feed.get_next_page().await.expect("page");

    // Query miss, hit, then eviction at capacity one
    hub.post(1).await.expect("miss");
    hub.post(1).await.expect("hit");
    hub.post(2).await.expect("evicts post 1");

    // Rollback
    hub.toggle_post_upvote(1).await.expect_err("503");

    // Invalidation through the event queue and consumer
    hub.delete_post(2).await.expect("delete");

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "motorhub_page_fetch_total",
        "motorhub_page_fetch_ms",
        "motorhub_query_hit_total",
        "motorhub_query_miss_total",
        "motorhub_optimistic_rollback_total",
        "motorhub_cache_invalidated_total",
        "motorhub_cache_event_queue_len",
        "motorhub_cache_consume_ms",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
