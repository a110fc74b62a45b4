//! Client services: the `Motorhub` facade, session handling, validation and
//! search debouncing on top of the cache and the REST client.

pub mod client;
pub mod debounce;
pub mod error;
pub mod pagination;
pub mod session;
pub mod validation;
