//! Cross-crate integration tests.

pub mod flows;
pub mod races;
pub mod support;
