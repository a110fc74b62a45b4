//! REST plumbing for the Motorhub backend.
//!
//! `ApiClient` owns the reqwest client and the token store; each resource
//! file adds its endpoints as inherent methods, and `ApiPageSource` adapts
//! paginated list endpoints to the cache's `PageSource`.

mod auth;
mod client;
mod comments;
mod events;
mod listings;
mod pages;
mod posts;
mod users;
mod vehicles;

pub use client::{ApiClient, Query, UnauthorizedHook, image_url, register_hook};
pub use comments::comments_source;
pub use listings::listings_source;
pub use pages::ApiPageSource;
pub use posts::posts_source;
pub use users::{user_listings_source, user_posts_source, users_source};
pub use vehicles::PhotoUpload;
