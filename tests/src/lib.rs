//! # Roll-Call Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks for the hot paths
//! └── src/integration/  # Engine + adapters + bus, end to end
//!     ├── support.rs    # Shared fixtures
//!     ├── flows.rs      # Full classroom scenarios
//!     └── races.rs      # Concurrent redemption
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p attendance-tests
//! cargo bench -p attendance-tests
//! ```

#![allow(dead_code)]

pub mod integration;
