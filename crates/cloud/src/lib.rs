//! Compute control-plane integration.
//!
//! Defines the [`provider::ComputeProvider`] seam, a Compute Engine REST
//! implementation of it, and the [`executor::ShutdownExecutor`] that turns
//! a threshold evaluation into at most one stop request.

pub mod executor;
pub mod gce;
pub mod provider;
pub mod token;
