//! Continuous swim — glide forward at constant speed while pinching.

use glam::Vec3;

use super::aim::AimSources;
use super::hand_tracking::PoseSource;
use super::motion::Mover;
use super::pinch::{PinchConfig, PinchDetector, PinchTransition};

#[derive(Debug, Clone)]
pub struct SwimConfig {
    /// Glide speed in m/s.
    pub speed: f32,
}

impl Default for SwimConfig {
    fn default() -> Self {
        Self { speed: 1.6 }
    }
}

/// Pinch-held swim driver.  Owns the pinch detector it reads.
#[derive(Debug)]
pub struct SwimDriver {
    config: SwimConfig,
    pinch: PinchDetector,
}

impl SwimDriver {
    pub fn new(config: SwimConfig, pinch: PinchConfig) -> Self {
        Self {
            config,
            pinch: PinchDetector::new(pinch),
        }
    }

    pub fn pinch(&self) -> &PinchDetector {
        &self.pinch
    }

    /// Refresh the pinch from `source`.  Run before `tick` each frame.
    pub fn update_pinch(&mut self, source: &impl PoseSource) -> Option<PinchTransition> {
        self.pinch.update(source)
    }

    /// Displacement for this frame, or `None` when not pinching or when the
    /// aim has no horizontal component.
    pub fn displacement(&self, aim: &AimSources, dt_s: f32) -> Option<Vec3> {
        if !self.pinch.is_pinching() {
            return None;
        }
        let forward = aim.horizontal_forward()?;
        Some(forward * self.config.speed * dt_s)
    }

    /// Advance one frame, moving `mover` if the pinch is held.
    /// Returns the displacement submitted.
    pub fn tick(&mut self, aim: &AimSources, dt_s: f32, mover: &mut impl Mover) -> Option<Vec3> {
        let delta = self.displacement(aim, dt_s)?;
        mover.move_by(delta);
        Some(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vr::aim::orientation_from_yaw_pitch;
    use crate::vr::hand_tracking::{tracked_hand, HandSide, HandTrackingState};
    use crate::vr::motion::PlayerRig;

    fn pinching_driver() -> SwimDriver {
        let mut hands = HandTrackingState::default();
        tracked_hand(&mut hands, HandSide::Left, Vec3::new(0.01, 0.0, 0.0), Vec3::ZERO);
        let mut swim = SwimDriver::new(SwimConfig::default(), PinchConfig::default());
        swim.update_pinch(&hands);
        assert!(swim.pinch().is_pinching());
        swim
    }

    fn swim_for(seconds: f32, hz: u32) -> Vec3 {
        let mut swim = pinching_driver();
        let aim = AimSources::default();
        let mut rig = PlayerRig::default();
        let dt = 1.0 / hz as f32;
        let ticks = (seconds * hz as f32).round() as u32;
        for _ in 0..ticks {
            swim.tick(&aim, dt, &mut rig);
        }
        rig.position
    }

    #[test]
    fn test_no_motion_without_pinch() {
        let mut swim = SwimDriver::new(SwimConfig::default(), PinchConfig::default());
        let mut rig = PlayerRig::default();
        assert!(swim.tick(&AimSources::default(), 0.1, &mut rig).is_none());
        assert_eq!(rig.position, Vec3::ZERO);
    }

    #[test]
    fn test_moves_along_aim_at_speed() {
        let mut swim = pinching_driver();
        let mut rig = PlayerRig::default();
        let delta = swim.tick(&AimSources::default(), 0.5, &mut rig).unwrap();
        assert!((delta - Vec3::new(0.0, 0.0, -0.8)).length() < 1e-5);
        assert_eq!(rig.position, delta);
    }

    #[test]
    fn test_degenerate_aim_skips_frame() {
        let mut swim = pinching_driver();
        let mut rig = PlayerRig::default();
        let aim = AimSources {
            primary: Some(orientation_from_yaw_pitch(0.0, 90.0)),
            head: glam::Quat::IDENTITY,
        };
        assert!(swim.tick(&aim, 0.1, &mut rig).is_none());
        assert_eq!(rig.position, Vec3::ZERO);
    }

    #[test]
    fn test_frame_rate_independent() {
        let at_30 = swim_for(2.0, 30);
        let at_90 = swim_for(2.0, 90);
        assert!((at_30 - at_90).length() < 1e-3, "{:?} vs {:?}", at_30, at_90);
        assert!((at_90.length() - 3.2).abs() < 1e-3);
    }
}
