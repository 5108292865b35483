//! Application layer: the workflow controller and the catalog search it uses.
//!
//! The controller owns the session record and mediates every transition. All
//! remote work goes through the ports in `domain::ports`; search and the
//! balance lookup run on spawned `tokio` tasks and report back through
//! channels.

pub mod controller;
pub mod search;
