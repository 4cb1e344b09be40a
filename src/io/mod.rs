//! Input/output helpers.
//!
//! - data directory ingest (`ingest`)
//! - engine config file (`config`)
//! - curve and metric exports (CSV/JSON) (`export`)

pub mod config;
pub mod export;
pub mod ingest;

pub use config::*;
pub use export::*;
pub use ingest::*;
