//! Domain layer: cache behaviour of backend entities and calendar rules.

pub mod calendar;
pub mod entities;
