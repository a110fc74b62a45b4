//! Typed client for the Motorhub marketplace and community API.
//!
//! Paginated reads are accumulated into infinite-scroll collections held in
//! a client-side cache; mutations invalidate what they make stale.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
