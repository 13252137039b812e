//! # crypsis-core
//!
//! Core types shared across the crypsis workspace:
//! - **Errors**: unified error handling with `CrypsisError`
//! - **Configuration**: clustering and refinement parameter sets
//!
//! The detection and refinement algorithms themselves live in
//! `crypsis-engine`; this crate carries only what both the engine and the
//! front end need to agree on.

pub mod config;
pub mod errors;

pub use config::{ClusteringConfig, EngineConfig, RefinementConfig};
pub use errors::{CrypsisError, Result};
