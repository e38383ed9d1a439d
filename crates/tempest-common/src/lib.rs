//! # Tempest Common
//!
//! Common types, utilities, and shared abstractions for the Tempest
//! world simulation.
//!
//! This crate provides foundational types used across all Tempest
//! subsystems:
//! - Weather tag identifier type
//! - Version information for snapshot schemas
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod tag;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::tag::*;
    pub use crate::version::*;
}

pub use prelude::*;
