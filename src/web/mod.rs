//! The web module serving the simulator over Axum.
//! This file declares the other files in this directory as sub-modules.

pub mod api;
pub mod registry;
pub mod socket;
