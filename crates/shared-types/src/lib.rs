//! # Shared Types Crate
//!
//! Identifiers and value types shared by every crate in the workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-crate types are defined here.
//! - **Opaque Identity**: `CourseId` and `UserId` are assigned by the
//!   external document store; nothing here parses them.
//! - **Trusted Caller**: a `Caller` is produced by upstream authentication
//!   and carries identity plus role.

pub mod entities;

pub use entities::*;
