//! VR locomotion — hand-gesture swimming for the dive simulation.
//!
//! Provides:
//! - `hand_tracking`: joint pose snapshot and the `PoseSource` trait
//! - `pinch`: hysteresis pinch detector
//! - `swim`: continuous pinch-held swim driver
//! - `stroke`: trigger zones and left/right touch correlation
//! - `impulse`: cooldown-gated stroke impulses
//! - `motion`: displacement application and character controllers
//! - `aim`: forward-direction sources

pub mod aim;
pub mod hand_tracking;
pub mod impulse;
pub mod motion;
pub mod pinch;
pub mod stroke;
pub mod swim;

pub use hand_tracking::{HandJoint, HandSide, HandTrackingState, PoseSource};
pub use impulse::ImpulseStart;
