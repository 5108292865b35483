//! Gateway adapters: HTTP for production, in-memory for offline mode and tests.

pub mod http;
pub mod in_memory;
