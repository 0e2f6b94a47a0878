//! dsoguard gateway library entry.
//!
//! Wires config, the in-process metadata catalog, session lookup, the
//! enforcement engine and the executor seam into an HTTP service. Used by the
//! binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod catalog;
pub mod config;
pub mod context;
pub mod executor;
pub mod obs;
pub mod ops;
pub mod router;
pub mod transport;
