//! # Tempest Sim
//!
//! World clock and weather simulation for Project Tempest.
//!
//! This crate provides the server-authoritative environment layer:
//! - Game clock with asymmetric day/night pacing and a 30/360 calendar
//! - Weather catalog with transition constraints and month windows
//! - Shortest-path planner for goal-directed weather steering
//! - Weather state machine (stable/transitioning) with one-shot rolls
//! - Parameter interpolation onto a persistent board
//! - Versioned binary world snapshots for replication and saves
//! - Event bus for boundary and weather change notification
//!
//! One [`EnvironmentController`] per world instance ties it together;
//! observers run the same controller with [`Role::Observer`] and sync
//! via snapshots.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod catalog;
pub mod clock;
pub mod controller;
pub mod events;
pub mod interpolate;
pub mod machine;
pub mod planner;
pub mod rng;
pub mod snapshot;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::catalog::*;
    pub use crate::clock::*;
    pub use crate::controller::*;
    pub use crate::events::*;
    pub use crate::interpolate::*;
    pub use crate::machine::*;
    pub use crate::planner::*;
    pub use crate::rng::*;
    pub use crate::snapshot::*;
    pub use tempest_common::prelude::*;
}

pub use prelude::*;
