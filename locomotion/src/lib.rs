//! Dive locomotion — pinch swimming and two-handed stroke impulses for a
//! VR diving simulation.

pub mod backend;
pub mod config;
pub mod ipc;
pub mod state;
pub mod vr;

pub use config::LocomotionConfig;
pub use state::{LocomotionState, TickReport};
