//! Top-level facade crate for promstats.
//!
//! Re-exports the core store and the exporter library so users can depend on a single crate.

pub mod core {
    pub use promstats_core::*;
}

pub mod exporter {
    pub use promstats_exporter::*;
}
