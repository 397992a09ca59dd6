//! Top-level facade crate for bubblechat.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use bubblechat_core::*;
}

pub mod gateway {
    pub use bubblechat_gateway::*;
}
