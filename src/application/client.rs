//! Client facade.
//!
//! `Motorhub` owns one store per entity family, registers each with the
//! invalidation registry, and pairs every mutation with the cache event it
//! implies. Reads hand out `InfiniteCollection` handles or cached query
//! values; writes go to the backend first and invalidate afterwards.

use std::sync::Arc;

use motorhub_api_types::{
    Comment, CommentId, EditListing, EditVehicleData, Event, EventId, Listing, ListingId,
    LoginData, Message, NewCommentData, NewEventData, NewListing, NewPostData, NewVehicleData,
    Post, PostId, RegisterData, SellData, User, UserId, Vehicle, VehicleId,
};
use tracing::{debug, info};

use super::debounce::{Debounced, Debouncer};
use super::error::ApiError;
use super::session::SessionContext;
use super::validation::Validate;
use crate::cache::{
    CacheConfig, CacheConsumer, CacheKey, CacheRegistry, CacheTrigger, CollectionStore,
    EventQueue, InfiniteCollection, OptimisticMutator, PageSource, QueryStore, Sentinel,
    ViewportTrigger, names,
};
use crate::config::Settings;
use crate::domain::calendar::EventMonth;
use crate::infra::http::{
    ApiClient, PhotoUpload, comments_source, listings_source, posts_source, user_listings_source,
    user_posts_source, users_source,
};
use crate::infra::token_store::TokenStore;

/// Paginated collections, grouped by item type.
struct Collections {
    listings: Arc<CollectionStore<Listing>>,
    posts: Arc<CollectionStore<Post>>,
    comments: Arc<CollectionStore<Comment>>,
    users: Arc<CollectionStore<User>>,
}

/// Single-value queries.
struct Queries {
    me: Arc<QueryStore<User>>,
    listing: Arc<QueryStore<Listing>>,
    post: Arc<QueryStore<Post>>,
    event: Arc<QueryStore<Event>>,
    month_events: Arc<QueryStore<Vec<Event>>>,
    vehicles: Arc<QueryStore<Vec<Vehicle>>>,
    vehicle: Arc<QueryStore<Vehicle>>,
}

struct Mutators {
    post_upvotes: OptimisticMutator<Post>,
    comment_upvotes: OptimisticMutator<Comment>,
    attendance: OptimisticMutator<Event>,
}

pub struct Motorhub {
    config: CacheConfig,
    api: Arc<ApiClient>,
    registry: Arc<CacheRegistry>,
    trigger: Arc<CacheTrigger>,
    session: SessionContext,
    collections: Collections,
    queries: Queries,
    mutators: Mutators,
}

/// Trimmed search text, or `None` when blank.
fn search_param(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

impl Motorhub {
    /// Build the REST client, token store and cache from resolved settings.
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        let tokens = TokenStore::new(settings.session.token_path.clone());
        let api = Arc::new(ApiClient::new(&settings.api, tokens)?);
        Ok(Self::with_client(api, CacheConfig::from(&settings.cache)))
    }

    pub fn with_client(api: Arc<ApiClient>, config: CacheConfig) -> Self {
        let collection_limit = config.collection_limit_non_zero();
        let query_limit = config.query_limit_non_zero();

        let collections = Collections {
            listings: Arc::new(CollectionStore::new("listings", collection_limit)),
            posts: Arc::new(CollectionStore::new("posts", collection_limit)),
            comments: Arc::new(CollectionStore::new("comments", collection_limit)),
            users: Arc::new(CollectionStore::new("users", collection_limit)),
        };
        let queries = Queries {
            me: Arc::new(QueryStore::new("me", query_limit)),
            listing: Arc::new(QueryStore::new("listing", query_limit)),
            post: Arc::new(QueryStore::new("post", query_limit)),
            event: Arc::new(QueryStore::new("event", query_limit)),
            month_events: Arc::new(QueryStore::new("month_events", query_limit)),
            vehicles: Arc::new(QueryStore::new("vehicles", query_limit)),
            vehicle: Arc::new(QueryStore::new("vehicle", query_limit)),
        };

        let registry = Arc::new(CacheRegistry::new());
        registry.register(collections.listings.clone());
        registry.register(collections.posts.clone());
        registry.register(collections.comments.clone());
        registry.register(collections.users.clone());
        registry.register(queries.me.clone());
        registry.register(queries.listing.clone());
        registry.register(queries.post.clone());
        registry.register(queries.event.clone());
        registry.register(queries.month_events.clone());
        registry.register(queries.vehicles.clone());
        registry.register(queries.vehicle.clone());

        let rollback = config.rollback_on_failure;
        let mutators = Mutators {
            post_upvotes: OptimisticMutator::new("post_upvote", rollback)
                .with_target(collections.posts.clone())
                .with_target(queries.post.clone()),
            comment_upvotes: OptimisticMutator::new("comment_upvote", rollback)
                .with_target(collections.comments.clone()),
            attendance: OptimisticMutator::new("event_attendance", rollback)
                .with_target(queries.event.clone())
                .with_target(queries.month_events.clone()),
        };

        let queue = Arc::new(EventQueue::new());
        let consumer = Arc::new(CacheConsumer::new(
            config.clone(),
            registry.clone(),
            queue.clone(),
        ));
        let trigger = Arc::new(CacheTrigger::new(config.clone(), queue, consumer));
        let session = SessionContext::new(api.clone(), trigger.clone());

        info!(
            stores = registry.len(),
            cache_enabled = config.is_enabled(),
            base_url = %api.base_url(),
            "Motorhub client ready"
        );

        Self {
            config,
            api,
            registry,
            trigger,
            session,
            collections,
            queries,
            mutators,
        }
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<CacheRegistry> {
        &self.registry
    }

    pub fn trigger(&self) -> &Arc<CacheTrigger> {
        &self.trigger
    }

    fn require_user(&self) -> Result<UserId, ApiError> {
        self.session
            .current_user()
            .map(|user| user.id)
            .ok_or_else(|| ApiError::Auth("not signed in".to_string()))
    }

    /// Drop collection entries no handle observes any more.
    pub fn collect_garbage(&self) -> usize {
        let removed = self.collections.listings.collect_garbage()
            + self.collections.posts.collect_garbage()
            + self.collections.comments.collect_garbage()
            + self.collections.users.collect_garbage();
        debug!(removed, "Collection garbage collected");
        removed
    }

    /// Debounced search input using the configured quiescence window.
    pub fn search_input(&self) -> (Debouncer<Option<String>>, Debounced<Option<String>>) {
        Debouncer::new(None, self.config.search_debounce())
    }

    /// Scroll trigger for a collection with the configured root margin.
    pub fn viewport_trigger<T: Send + Sync>(
        &self,
        collection: InfiniteCollection<T>,
        sentinel: Sentinel,
    ) -> ViewportTrigger<T> {
        ViewportTrigger::new(collection, sentinel, self.config.viewport_root_margin)
    }

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    pub async fn restore_session(&self) -> Result<Option<User>, ApiError> {
        self.session.restore().await
    }

    pub async fn login(&self, data: &LoginData) -> Result<User, ApiError> {
        self.session.login(data).await
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.session.logout().await
    }

    pub async fn register(&self, data: &RegisterData) -> Result<Message, ApiError> {
        data.validate()?;
        self.api.register(data).await
    }

    /// The signed-in user, cached until the session ends.
    pub async fn me(&self) -> Result<Arc<User>, ApiError> {
        let session = self.session.clone();
        self.queries
            .me
            .load(&CacheKey::new(names::ME), || async move { session.refresh().await })
            .await
    }

    // ------------------------------------------------------------------
    // Collections
    // ------------------------------------------------------------------

    fn collection<T, S>(store: &Arc<CollectionStore<T>>, key: CacheKey, source: S) -> InfiniteCollection<T>
    where
        S: PageSource<T> + 'static,
    {
        InfiniteCollection::new(key, store.clone(), Arc::new(source))
    }

    fn listings_key(search: Option<&str>) -> CacheKey {
        CacheKey::new(names::LISTINGS).with(search_param(search))
    }

    /// Marketplace listings, optionally filtered by search text.
    pub fn listings(&self, search: Option<&str>) -> InfiniteCollection<Listing> {
        let search = search_param(search);
        Self::collection(
            &self.collections.listings,
            Self::listings_key(search.as_deref()),
            listings_source(self.api.clone(), search.as_deref()),
        )
    }

    /// Point an existing listings handle at new search text. The previous
    /// entry is left for garbage collection.
    pub fn search_listings(&self, collection: &mut InfiniteCollection<Listing>, search: Option<&str>) {
        let search = search_param(search);
        let key = Self::listings_key(search.as_deref());
        if collection.key() == &key {
            return;
        }
        debug!(from = %collection.key(), to = %key, "Listings search re-keyed");
        collection.rekey(key, Arc::new(listings_source(self.api.clone(), search.as_deref())));
    }

    pub fn my_listings(&self) -> Result<InfiniteCollection<Listing>, ApiError> {
        let user_id = self.require_user()?;
        Ok(Self::collection(
            &self.collections.listings,
            CacheKey::new(names::MY_LISTINGS).with(user_id),
            user_listings_source(self.api.clone(), user_id),
        ))
    }

    pub fn posts(&self) -> InfiniteCollection<Post> {
        Self::collection(
            &self.collections.posts,
            CacheKey::new(names::POSTS),
            posts_source(self.api.clone()),
        )
    }

    pub fn my_posts(&self) -> Result<InfiniteCollection<Post>, ApiError> {
        let user_id = self.require_user()?;
        Ok(Self::collection(
            &self.collections.posts,
            CacheKey::new(names::MY_POSTS).with(user_id),
            user_posts_source(self.api.clone(), user_id),
        ))
    }

    pub fn user_posts(&self, user_id: UserId) -> InfiniteCollection<Post> {
        Self::collection(
            &self.collections.posts,
            CacheKey::new(names::USER_POSTS).with(user_id),
            user_posts_source(self.api.clone(), user_id),
        )
    }

    pub fn post_comments(&self, post_id: PostId) -> InfiniteCollection<Comment> {
        Self::collection(
            &self.collections.comments,
            CacheKey::new(names::POST_COMMENTS).with(post_id),
            comments_source(self.api.clone(), post_id),
        )
    }

    /// Users to pick a buyer from when marking a listing sold.
    pub fn buyer_users(&self, search: Option<&str>) -> InfiniteCollection<User> {
        let search = search_param(search);
        Self::collection(
            &self.collections.users,
            CacheKey::new(names::BUYER_USERS).with(search.clone()),
            users_source(self.api.clone(), search.as_deref()),
        )
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub async fn listing(&self, id: ListingId) -> Result<Arc<Listing>, ApiError> {
        let api = self.api.clone();
        self.queries
            .listing
            .load(&CacheKey::new(names::LISTING).with(id), || async move {
                api.listing(id).await
            })
            .await
    }

    pub async fn post(&self, id: PostId) -> Result<Arc<Post>, ApiError> {
        let api = self.api.clone();
        self.queries
            .post
            .load(&CacheKey::new(names::POST).with(id), || async move {
                api.post_details(id).await
            })
            .await
    }

    pub async fn event(&self, id: EventId) -> Result<Arc<Event>, ApiError> {
        let api = self.api.clone();
        self.queries
            .event
            .load(&CacheKey::new(names::EVENT).with(id), || async move {
                api.event(id).await
            })
            .await
    }

    pub async fn events_for_month(&self, month: EventMonth) -> Result<Arc<Vec<Event>>, ApiError> {
        let api = self.api.clone();
        let key = CacheKey::new(names::EVENTS)
            .with(u32::from(month.month()))
            .with(i64::from(month.year()));
        self.queries
            .month_events
            .load(&key, || async move { api.month_events(month).await })
            .await
    }

    pub async fn my_vehicles(&self) -> Result<Arc<Vec<Vehicle>>, ApiError> {
        let user_id = self.require_user()?;
        let api = self.api.clone();
        self.queries
            .vehicles
            .load(&CacheKey::new(names::MY_VEHICLES).with(user_id), || async move {
                api.user_vehicles(user_id).await
            })
            .await
    }

    pub async fn vehicle(&self, id: VehicleId) -> Result<Arc<Vehicle>, ApiError> {
        let api = self.api.clone();
        self.queries
            .vehicle
            .load(&CacheKey::new(names::VEHICLE).with(id), || async move {
                api.vehicle(id).await
            })
            .await
    }

    // ------------------------------------------------------------------
    // Marketplace mutations
    // ------------------------------------------------------------------

    pub async fn create_listing(&self, data: &NewListing) -> Result<Listing, ApiError> {
        data.validate()?;
        let listing = self.api.create_listing(data).await?;
        self.trigger.listing_created();
        Ok(listing)
    }

    pub async fn edit_listing(&self, id: ListingId, data: &EditListing) -> Result<Listing, ApiError> {
        data.validate()?;
        let listing = self.api.edit_listing(id, data).await?;
        self.trigger.listing_edited(id);
        Ok(listing)
    }

    pub async fn delete_listing(&self, id: ListingId) -> Result<Message, ApiError> {
        let message = self.api.delete_listing(id).await?;
        self.trigger.listing_deleted(id);
        Ok(message)
    }

    pub async fn sell_listing(&self, id: ListingId, buyer: UserId) -> Result<Message, ApiError> {
        let data = SellData { buyer };
        data.validate()?;
        let message = self.api.sell_listing(id, &data).await?;
        self.trigger.listing_sold(id);
        Ok(message)
    }

    pub async fn create_vehicle(&self, data: &NewVehicleData, photos: Vec<PhotoUpload>) -> Result<Vehicle, ApiError> {
        data.validate()?;
        let vehicle = self.api.create_vehicle(data, photos).await?;
        self.trigger.vehicle_created();
        Ok(vehicle)
    }

    pub async fn edit_vehicle(
        &self,
        id: VehicleId,
        data: &EditVehicleData,
        photos: Vec<PhotoUpload>,
    ) -> Result<Vehicle, ApiError> {
        data.validate()?;
        let vehicle = self.api.edit_vehicle(id, data, photos).await?;
        self.trigger.vehicle_edited(id);
        Ok(vehicle)
    }

    pub async fn delete_vehicle(&self, id: VehicleId) -> Result<Message, ApiError> {
        let message = self.api.delete_vehicle(id).await?;
        self.trigger.vehicle_deleted(id);
        Ok(message)
    }

    // ------------------------------------------------------------------
    // Community mutations
    // ------------------------------------------------------------------

    pub async fn create_post(&self, data: &NewPostData) -> Result<Post, ApiError> {
        data.validate()?;
        let post = self.api.create_post(data).await?;
        self.trigger.post_created();
        Ok(post)
    }

    pub async fn edit_post(&self, id: PostId, data: &NewPostData) -> Result<Post, ApiError> {
        data.validate()?;
        let post = self.api.edit_post(id, data).await?;
        self.trigger.post_edited(id);
        Ok(post)
    }

    pub async fn delete_post(&self, id: PostId) -> Result<Message, ApiError> {
        let message = self.api.delete_post(id).await?;
        self.trigger.post_deleted(id);
        Ok(message)
    }

    pub async fn add_comment(&self, post_id: PostId, data: &NewCommentData) -> Result<Message, ApiError> {
        data.validate()?;
        let message = self.api.add_comment(post_id, data).await?;
        self.trigger.comment_created(post_id);
        Ok(message)
    }

    pub async fn delete_comment(&self, post_id: PostId, comment_id: CommentId) -> Result<Message, ApiError> {
        let message = self.api.delete_comment(post_id, comment_id).await?;
        self.trigger.comment_deleted(post_id);
        Ok(message)
    }

    /// Flip the upvote on every cached copy of the post, then call the
    /// backend.
    pub async fn toggle_post_upvote(&self, id: PostId) -> Result<Message, ApiError> {
        let api = self.api.clone();
        self.mutators
            .post_upvotes
            .toggle(id, || async move { api.toggle_post_upvote(id).await })
            .await
    }

    pub async fn toggle_comment_upvote(&self, post_id: PostId, comment_id: CommentId) -> Result<Message, ApiError> {
        let api = self.api.clone();
        self.mutators
            .comment_upvotes
            .toggle(comment_id, || async move {
                api.toggle_comment_upvote(post_id, comment_id).await
            })
            .await
    }

    // ------------------------------------------------------------------
    // Calendar mutations
    // ------------------------------------------------------------------

    /// Optimistic attendance toggle; the event the backend returns replaces
    /// the optimistic copy.
    pub async fn toggle_attendance(&self, id: EventId) -> Result<Event, ApiError> {
        let api = self.api.clone();
        let event = self
            .mutators
            .attendance
            .toggle(id, || async move { api.toggle_attendance(id).await })
            .await?;
        self.mutators.attendance.reconcile(&event);
        Ok(event)
    }

    pub async fn create_event(&self, data: &NewEventData) -> Result<Event, ApiError> {
        data.validate()?;
        let event = self.api.create_event(data).await?;
        self.trigger.event_created();
        Ok(event)
    }

    pub async fn edit_event(&self, id: EventId, data: &NewEventData) -> Result<Event, ApiError> {
        data.validate()?;
        let event = self.api.edit_event(id, data).await?;
        self.trigger.event_edited(id);
        Ok(event)
    }

    pub async fn delete_event(&self, id: EventId) -> Result<Message, ApiError> {
        let message = self.api.delete_event(id).await?;
        self.trigger.event_deleted(id);
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::cache::{CollectionState, FetchOutcome};
    use crate::infra::http::testing::{USER_JSON, client, envelope, event_json, post_json};

    fn hub(server: &MockServer, dir: &TempDir) -> Motorhub {
        Motorhub::with_client(client(server, dir), CacheConfig::default())
    }

    #[test]
    fn search_text_is_trimmed_into_the_key() {
        let server = MockServer::start();
        let dir = TempDir::new().expect("temp dir");
        let hub = hub(&server, &dir);

        let blank = hub.listings(Some("  "));
        let none = hub.listings(None);
        let golf = hub.listings(Some(" golf "));

        assert_eq!(blank.key(), none.key());
        assert_eq!(golf.key().to_string(), "listings/\"golf\"");
    }

    #[test]
    fn personal_collections_require_a_session() {
        let server = MockServer::start();
        let dir = TempDir::new().expect("temp dir");
        let hub = hub(&server, &dir);

        assert!(matches!(hub.my_posts(), Err(ApiError::Auth(_))));
        assert!(matches!(hub.my_listings(), Err(ApiError::Auth(_))));
    }

    #[tokio::test]
    async fn rekeyed_search_starts_empty() {
        let server = MockServer::start();
        let dir = TempDir::new().expect("temp dir");
        let hub = hub(&server, &dir);
        server.mock(|when, then| {
            when.method(GET).path("/api/listings").query_param("page", "1");
            then.status(200).body(envelope(&[], 1, 1, 0));
        });

        let mut listings = hub.listings(None);
        listings.get_next_page().await.expect("page");
        assert_eq!(listings.state(), CollectionState::Exhausted);

        hub.search_listings(&mut listings, Some("golf"));
        assert_eq!(listings.state(), CollectionState::Empty);
    }

    #[tokio::test]
    async fn deleting_a_post_invalidates_the_feed() {
        let server = MockServer::start();
        let dir = TempDir::new().expect("temp dir");
        let hub = hub(&server, &dir);
        let page = server.mock(|when, then| {
            when.method(GET).path("/api/posts").query_param("page", "1");
            then.status(200)
                .body(envelope(&[post_json(1), post_json(2)], 1, 2, 4));
        });
        server.mock(|when, then| {
            when.method(DELETE).path("/api/posts/2");
            then.status(200).json_body(json!({"message": "Post deleted"}));
        });

        let feed = hub.posts();
        feed.get_next_page().await.expect("page 1");
        assert_eq!(feed.state(), CollectionState::Loaded);

        hub.delete_post(2).await.expect("delete");
        assert_eq!(feed.state(), CollectionState::Empty);
        assert!(feed.flattened_items().is_empty());

        let outcome = feed.get_next_page().await.expect("refetch");
        assert!(matches!(outcome, FetchOutcome::Appended { .. }));
        page.assert_calls(2);
    }

    #[tokio::test]
    async fn failed_upvote_rolls_back_feed_and_detail() {
        let server = MockServer::start();
        let dir = TempDir::new().expect("temp dir");
        let hub = hub(&server, &dir);
        server.mock(|when, then| {
            when.method(GET).path("/api/posts").query_param("page", "1");
            then.status(200).body(envelope(&[post_json(1)], 1, 1, 1));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/posts/1");
            then.status(200).body(post_json(1));
        });
        server.mock(|when, then| {
            when.method(POST).path("/api/posts/1/toggle-upvote");
            then.status(500).json_body(json!({"message": "down"}));
        });

        let feed = hub.posts();
        feed.get_next_page().await.expect("page");
        hub.post(1).await.expect("detail");

        let err = hub.toggle_post_upvote(1).await.expect_err("server error");
        assert!(matches!(err, ApiError::Server { status: 500, .. }));

        let cached = feed.flattened_items().to_vec();
        assert_eq!((cached[0].upvoted_by_user, cached[0].upvotes_count), (false, 3));
        let detail = hub.post(1).await.expect("cached detail");
        assert_eq!((detail.upvoted_by_user, detail.upvotes_count), (false, 3));
    }

    #[tokio::test]
    async fn failed_upvote_restores_copies_with_different_counts() {
        let server = MockServer::start();
        let dir = TempDir::new().expect("temp dir");
        let hub = hub(&server, &dir);
        server.mock(|when, then| {
            when.method(GET).path("/api/posts").query_param("page", "1");
            then.status(200).body(envelope(&[post_json(1)], 1, 1, 1));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/posts/1");
            then.status(200)
                .body(post_json(1).replace(r#""upvotes_count":3"#, r#""upvotes_count":5"#));
        });
        server.mock(|when, then| {
            when.method(POST).path("/api/posts/1/toggle-upvote");
            then.status(500).json_body(json!({"message": "down"}));
        });

        let feed = hub.posts();
        feed.get_next_page().await.expect("page");
        hub.post(1).await.expect("detail");

        hub.toggle_post_upvote(1).await.expect_err("server error");

        let cached = feed.flattened_items().to_vec();
        assert_eq!((cached[0].upvoted_by_user, cached[0].upvotes_count), (false, 3));
        let detail = hub.post(1).await.expect("cached detail");
        assert_eq!((detail.upvoted_by_user, detail.upvotes_count), (false, 5));
    }

    #[tokio::test]
    async fn attendance_reconciles_with_returned_event() {
        let server = MockServer::start();
        let dir = TempDir::new().expect("temp dir");
        let hub = hub(&server, &dir);
        let month = EventMonth::new(5, 2024).expect("month");
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/events")
                .query_param("month", "5")
                .query_param("year", "2024");
            then.status(200).body(format!("[{}]", event_json(1, false, 2)));
        });
        server.mock(|when, then| {
            when.method(POST).path("/api/events/1/attend");
            then.status(200).body(event_json(1, true, 10));
        });

        hub.events_for_month(month).await.expect("month");
        let event = hub.toggle_attendance(1).await.expect("attend");
        assert_eq!(event.attendance_count, 10);

        let cached = hub.events_for_month(month).await.expect("cached month");
        assert!(cached[0].attended_by_user);
        assert_eq!(cached[0].attendance_count, 10);
    }

    #[tokio::test]
    async fn invalid_post_is_rejected_before_sending() {
        let server = MockServer::start();
        let dir = TempDir::new().expect("temp dir");
        let hub = hub(&server, &dir);
        let create = server.mock(|when, then| {
            when.method(POST).path("/api/posts");
            then.status(201);
        });

        let err = hub
            .create_post(&NewPostData {
                title: String::new(),
                content: "body".into(),
            })
            .await
            .expect_err("invalid");
        assert!(matches!(err, ApiError::Validation { .. }));
        create.assert_calls(0);
    }

    #[tokio::test]
    async fn me_is_cached_and_updates_session() {
        let server = MockServer::start();
        let dir = TempDir::new().expect("temp dir");
        let hub = hub(&server, &dir);
        let me = server.mock(|when, then| {
            when.method(GET).path("/api/users/me");
            then.status(200).body(USER_JSON);
        });

        hub.me().await.expect("me");
        hub.me().await.expect("me again");

        me.assert_calls(1);
        assert_eq!(hub.session().current_user().map(|u| u.id), Some(7));
        assert!(hub.my_posts().is_ok());
    }
}
