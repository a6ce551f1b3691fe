//! HTTP route handlers.

pub mod bookings;
pub mod duplicates;
pub mod health;
pub mod metrics;
pub mod payments;
pub mod search;
pub mod webhooks;
