//! HTTP/WebSocket front end for TheDecree game server.
//!
//! Exposed as a library so integration tests can build the router directly
//! against an in-memory [`decree_engine::Hub`], the same way `main` builds it
//! for a real listener.

pub mod api;
pub mod config;
pub mod logging;
