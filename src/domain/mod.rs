//! Domain layer: value objects, the session record and the gateway ports.
//!
//! Nothing in here performs I/O. The ports describe the remote services the
//! application layer talks to; adapters live in `infrastructure`.

pub mod catalog;
pub mod line_item;
pub mod money;
pub mod payment;
pub mod phone;
pub mod ports;
pub mod requests;
pub mod session;
