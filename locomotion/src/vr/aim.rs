//! Aim sources — where "forward" comes from when the diver swims.
//!
//! An optional primary aim orientation (e.g. a hand aim pose) takes
//! precedence over the head/camera orientation.  Both are in world space,
//! OpenXR convention: -Z forward, +Y up.

use glam::{EulerRot, Quat, Vec3};

/// Below this squared length the horizontal forward is treated as undefined
/// (looking straight up or down).
pub const MIN_HORIZONTAL_SQ: f32 = 1e-6;

#[derive(Debug, Clone)]
pub struct AimSources {
    /// Preferred source; `None` when no aim pose is bound.
    pub primary: Option<Quat>,
    /// Head/camera orientation, always available.
    pub head: Quat,
}

impl Default for AimSources {
    fn default() -> Self {
        Self {
            primary: None,
            head: Quat::IDENTITY,
        }
    }
}

impl AimSources {
    /// World-space forward of the active source.
    pub fn forward(&self) -> Vec3 {
        self.primary.unwrap_or(self.head) * Vec3::NEG_Z
    }

    /// Forward projected onto the horizontal plane and normalized, or `None`
    /// when the source points (nearly) straight up or down.
    pub fn horizontal_forward(&self) -> Option<Vec3> {
        horizontal(self.forward())
    }

    /// Source name for status output.
    pub fn active_name(&self) -> &'static str {
        if self.primary.is_some() {
            "aim"
        } else {
            "head"
        }
    }
}

/// Zero the vertical component and normalize.
pub fn horizontal(dir: Vec3) -> Option<Vec3> {
    let flat = Vec3::new(dir.x, 0.0, dir.z);
    if flat.length_squared() < MIN_HORIZONTAL_SQ {
        return None;
    }
    Some(flat.normalize())
}

/// Orientation from yaw (about +Y) and pitch (about +X), in degrees.
pub fn orientation_from_yaw_pitch(yaw_deg: f32, pitch_deg: f32) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        yaw_deg.to_radians(),
        pitch_deg.to_radians(),
        0.0,
    )
}
