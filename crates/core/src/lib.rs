//! Domain logic for budget-triggered compute shutdown.
//!
//! Pure types and functions only -- no network access. The cloud crate
//! owns the control-plane client and the function crate owns event
//! ingress.

pub mod error;
pub mod notification;
pub mod outcome;
pub mod target;
pub mod threshold;
pub mod types;
