//! promstats exporter library entry.
//!
//! Wires the core metric store to the outside world: the Prometheus handler
//! and text exposition, HTTP client instrumentation, strict YAML config and
//! the `/metrics` endpoint. Consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app_state;
pub mod config;
pub mod httpstats;
pub mod obs;
pub mod ops;
pub mod router;
