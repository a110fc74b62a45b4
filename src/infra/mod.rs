//! Infrastructure adapters: REST transport, token persistence and telemetry.

pub mod error;
pub mod http;
pub mod telemetry;
pub mod token_store;
