//! Shared request and response types for the Motorhub marketplace API.
//!
//! Field names follow the backend's snake_case JSON. Timestamps are RFC 3339;
//! event dates are kept as the strings the backend sends because the calendar
//! endpoints mix plain dates and datetimes.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub type UserId = i64;
pub type ListingId = i64;
pub type VehicleId = i64;
pub type PostId = i64;
pub type CommentId = i64;
pub type EventId = i64;

// ============================================================================
// Envelopes
// ============================================================================

/// Wrapper returned by every paginated list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
    #[serde(default)]
    pub links: PageLinks,
}

/// Position metadata of a single page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub current_page: u32,
    pub last_page: u32,
    pub total: u64,
    pub per_page: u32,
    #[serde(default)]
    pub from: Option<u64>,
    #[serde(default)]
    pub to: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    #[serde(default)]
    pub first: Option<String>,
    #[serde(default)]
    pub last: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
}

/// Plain acknowledgement body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

// ============================================================================
// Users and auth
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Regular,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub firstname: String,
    pub lastname: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
    pub role: UserRole,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginData {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterData {
    pub firstname: String,
    pub lastname: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

// ============================================================================
// Vehicles
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleImage {
    pub id: i64,
    pub image_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub description: String,
    #[serde(default)]
    pub images: Vec<VehicleImage>,
    /// Present on endpoints that embed the owning user.
    #[serde(default)]
    pub owner: Option<User>,
}

/// Text fields of a vehicle form. Photos travel as multipart parts and are
/// attached by the client from local files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVehicleData {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditVehicleData {
    #[serde(flatten)]
    pub fields: NewVehicleData,
    /// Ids of existing images to remove.
    #[serde(default, rename = "deletedPhotos")]
    pub deleted_photos: Vec<i64>,
}

// ============================================================================
// Listings
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ListingStatus {
    ForSale,
    Sold,
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForSale => f.write_str("FORSALE"),
            Self::Sold => f.write_str("SOLD"),
        }
    }
}

/// Listing with its vehicle and author, as returned by list and detail endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub price: f64,
    pub mileage: u32,
    pub description: String,
    pub status: ListingStatus,
    pub vehicle: Vehicle,
    pub author: User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewListing {
    pub price: f64,
    pub mileage: u32,
    pub description: String,
    pub vehicle: VehicleId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditListing {
    pub price: f64,
    pub mileage: u32,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellData {
    pub buyer: UserId,
}

// ============================================================================
// Community
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub author: User,
    pub comments_count: u32,
    pub upvotes_count: u32,
    pub upvoted_by_user: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPostData {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub author: User,
    pub upvotes_count: u32,
    pub upvoted_by_user: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCommentData {
    pub content: String,
}

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    pub location: String,
    pub attendance_count: u32,
    pub attended_by_user: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEventData {
    pub title: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    pub location: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER_JSON: &str = r#"{"id":7,"firstname":"Ada","lastname":"Lovelace","username":"ada","email":"ada@example.com","profile_picture":null,"role":"ADMIN"}"#;

    #[test]
    fn paginated_envelope_decodes_meta_and_links() {
        let body = r#"{
            "data": [{"message": "one"}, {"message": "two"}],
            "meta": {"current_page": 1, "last_page": 3, "total": 6, "per_page": 2, "from": 1, "to": 2, "path": "/posts"},
            "links": {"first": "/posts?page=1", "last": "/posts?page=3", "next": "/posts?page=2", "prev": null}
        }"#;

        let page: Paginated<Message> = serde_json::from_str(body).expect("envelope");
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.meta.current_page, 1);
        assert_eq!(page.meta.last_page, 3);
        assert_eq!(page.links.next.as_deref(), Some("/posts?page=2"));
        assert!(page.links.prev.is_none());
    }

    #[test]
    fn envelope_without_links_still_decodes() {
        let body = r#"{"data": [], "meta": {"current_page": 1, "last_page": 1, "total": 0, "per_page": 15}}"#;
        let page: Paginated<Message> = serde_json::from_str(body).expect("envelope");
        assert!(page.data.is_empty());
        assert_eq!(page.links, PageLinks::default());
    }

    #[test]
    fn user_role_uses_uppercase_wire_names() {
        let user: User = serde_json::from_str(USER_JSON).expect("user");
        assert!(user.is_admin());
        assert_eq!(user.full_name(), "Ada Lovelace");
    }

    #[test]
    fn listing_status_wire_names() {
        let status: ListingStatus = serde_json::from_str(r#""FORSALE""#).expect("status");
        assert_eq!(status, ListingStatus::ForSale);
        assert_eq!(ListingStatus::Sold.to_string(), "SOLD");
    }

    #[test]
    fn post_timestamps_accept_backend_fraction_format() {
        let body = format!(
            r#"{{"id":1,"title":"t","content":"c","author":{USER_JSON},"comments_count":0,"upvotes_count":3,"upvoted_by_user":false,"created_at":"2024-05-01T10:00:00.000000Z","updated_at":"2024-05-01T10:00:00.000000Z"}}"#
        );
        let post: Post = serde_json::from_str(&body).expect("post");
        assert_eq!(post.upvotes_count, 3);
        assert_eq!(post.created_at.year(), 2024);
    }

    #[test]
    fn edit_vehicle_flattens_fields_and_renames_deleted_photos() {
        let data = EditVehicleData {
            fields: NewVehicleData {
                make: "Fiat".into(),
                model: "Panda".into(),
                year: 2004,
                description: "red".into(),
            },
            deleted_photos: vec![4, 5],
        };
        let value = serde_json::to_value(&data).expect("serialize");
        assert_eq!(value["make"], "Fiat");
        assert_eq!(value["deletedPhotos"], serde_json::json!([4, 5]));
    }
}
