//! Cache key definitions.
//!
//! A `CacheKey` is a logical collection name plus ordered filter parameters,
//! e.g. `postComments/12` or `events/5/2024`. `KeyPattern` selects keys for
//! invalidation, either exactly or by prefix.

use std::fmt;

/// Logical collection and query names.
pub mod names {
    pub const ME: &str = "me";
    pub const LISTINGS: &str = "listings";
    pub const LISTING: &str = "listing";
    pub const MY_LISTINGS: &str = "myListings";
    pub const MY_VEHICLES: &str = "myVehicles";
    pub const VEHICLE: &str = "vehicle";
    pub const POSTS: &str = "posts";
    pub const MY_POSTS: &str = "myPosts";
    pub const USER_POSTS: &str = "userPosts";
    pub const POST: &str = "post";
    pub const POST_COMMENTS: &str = "postComments";
    pub const EVENTS: &str = "events";
    pub const EVENT: &str = "event";
    pub const BUYER_USERS: &str = "buyerUsers";
}

/// One filter parameter of a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyParam {
    Int(i64),
    Text(String),
    /// An unset optional filter (e.g. no search text).
    None,
}

impl From<i64> for KeyParam {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for KeyParam {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for KeyParam {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for KeyParam {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<KeyParam>> From<Option<T>> for KeyParam {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Into::into)
    }
}

impl fmt::Display for KeyParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value:?}"),
            Self::None => f.write_str("-"),
        }
    }
}

/// Identifies one collection or query entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    name: &'static str,
    params: Vec<KeyParam>,
}

impl CacheKey {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            params: Vec::new(),
        }
    }

    /// Append a filter parameter.
    #[must_use]
    pub fn with(mut self, param: impl Into<KeyParam>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn params(&self) -> &[KeyParam] {
        &self.params
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)?;
        for param in &self.params {
            write!(f, "/{param}")?;
        }
        Ok(())
    }
}

/// Selects cache keys for invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPattern {
    /// Every key in every store.
    All,
    /// Exactly this key.
    Exact(CacheKey),
    /// Keys with the same name whose params start with these params.
    Prefix(CacheKey),
}

impl KeyPattern {
    /// Prefix pattern over a whole logical collection.
    pub fn collection(name: &'static str) -> Self {
        Self::Prefix(CacheKey::new(name))
    }

    pub fn matches(&self, key: &CacheKey) -> bool {
        match self {
            Self::All => true,
            Self::Exact(exact) => exact == key,
            Self::Prefix(prefix) => {
                prefix.name == key.name && key.params.starts_with(&prefix.params)
            }
        }
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("*"),
            Self::Exact(key) => write!(f, "{key}"),
            Self::Prefix(key) => write!(f, "{key}/*"),
        }
    }
}
