//! Budget-triggered shutdown function.
//!
//! Exposes the building blocks (config, state, routes, invocation
//! handling) so integration tests and the binary entrypoint can both
//! access them.

pub mod app;
pub mod config;
pub mod handler;
pub mod logging;
pub mod pubsub;
pub mod routes;
pub mod state;
