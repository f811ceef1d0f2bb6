//! Displacement application — the one place drivers move the player.
//!
//! `PlayerRig` owns the rig origin position.  When a character controller
//! is attached, enabled, and allowed by `use_character_controller`, each
//! displacement is resolved by the controller first; otherwise it is added
//! to the position as-is.

use glam::Vec3;
use tracing::debug;

/// Target that accepts per-tick displacements.
pub trait Mover {
    /// Apply `delta` (meters, world space) for the current tick.
    fn move_by(&mut self, delta: Vec3);
}

/// Physics-aware mover that may shorten or redirect a displacement.
pub trait CharacterController {
    fn enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    /// Resolve `delta` starting from `position` and return the displacement
    /// actually travelled.
    fn resolve(&mut self, position: Vec3, delta: Vec3) -> Vec3;
}

/// Keeps the diver inside an axis-aligned dive volume (seabed to surface).
#[derive(Debug, Clone)]
pub struct BoundedController {
    pub min: Vec3,
    pub max: Vec3,
    pub enabled: bool,
    /// Number of moves that hit a wall.
    pub blocked_moves: u64,
}

impl BoundedController {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
            enabled: true,
            blocked_moves: 0,
        }
    }
}

impl CharacterController for BoundedController {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn resolve(&mut self, position: Vec3, delta: Vec3) -> Vec3 {
        let target = position + delta;
        let clamped = target.clamp(self.min, self.max);
        if clamped != target {
            self.blocked_moves += 1;
            debug!(
                "Dive volume blocked move to ({:.2}, {:.2}, {:.2})",
                target.x, target.y, target.z,
            );
        }
        clamped - position
    }
}

/// The player's rig origin.
pub struct PlayerRig {
    pub position: Vec3,
    pub use_character_controller: bool,
    controller: Option<Box<dyn CharacterController>>,
    /// Sum of all applied displacement lengths (meters).
    pub distance_travelled: f32,
}

impl Default for PlayerRig {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl PlayerRig {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            use_character_controller: true,
            controller: None,
            distance_travelled: 0.0,
        }
    }

    pub fn with_controller(mut self, controller: Box<dyn CharacterController>) -> Self {
        self.controller = Some(controller);
        self
    }

    pub fn set_controller(&mut self, controller: Option<Box<dyn CharacterController>>) {
        self.controller = controller;
    }

    pub fn controller(&self) -> Option<&dyn CharacterController> {
        self.controller.as_deref()
    }

    pub fn controller_mut(&mut self) -> Option<&mut (dyn CharacterController + 'static)> {
        self.controller.as_deref_mut()
    }

    /// Whether the next move goes through the controller.
    pub fn uses_controller(&self) -> bool {
        self.use_character_controller
            && self.controller.as_ref().is_some_and(|c| c.enabled())
    }
}

impl Mover for PlayerRig {
    fn move_by(&mut self, delta: Vec3) {
        let applied = match self.controller.as_mut() {
            Some(cc) if self.use_character_controller && cc.enabled() => {
                cc.resolve(self.position, delta)
            }
            _ => delta,
        };
        self.position += applied;
        self.distance_travelled += applied.length();
    }
}
