//! `automation-diffusion` library crate.
//!
//! The binary (`autodiff`) is a thin wrapper around this library so that:
//!
//! - the correction, metrics and ranking engine is testable without spawning processes
//! - data sources and front-ends stay swappable behind `data::OccupationSource`
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod correct;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod io;
pub mod metrics;
pub mod plot;
pub mod rank;
pub mod report;
pub mod store;

pub use engine::AutomationEngine;
pub use error::{AppError, EngineError};
