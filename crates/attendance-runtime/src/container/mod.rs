//! # Service Container
//!
//! Configuration and dependency wiring for the attendance engine.

pub mod config;
pub mod courses;
pub mod services;

pub use config::{ConfigError, RuntimeConfig};
pub use services::ServiceContainer;
