//! Top-level facade crate for dsoguard.
//!
//! Re-exports the enforcement engine and the gateway library so users can depend on a single crate.

pub mod core {
    pub use dsoguard_core::*;
}

pub mod gateway {
    pub use dsoguard_gateway::*;
}
