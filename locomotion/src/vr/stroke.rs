//! Swim-stroke recognition — both hands sweeping past the hips together.
//!
//! `StrokeZone`s are the trigger volumes beside the body; each reports a
//! touch on entry.  `StrokeCorrelator` pairs left and right touches that land
//! within `window_s` of each other into a single stroke.

use glam::Vec3;
use tracing::debug;

use super::hand_tracking::{HandJoint, HandSide, PoseSource};

#[derive(Debug, Clone)]
pub struct StrokeConfig {
    /// Max seconds between left and right touches for them to pair.
    pub window_s: f64,
}

impl Default for StrokeConfig {
    fn default() -> Self {
        Self { window_s: 0.5 }
    }
}

// ── Correlator ─────────────────────────────────────────────

/// Pairs side-tagged touches into strokes.
///
/// A touch with no partner stays pending until either the other side
/// touches (however late) or the same side touches again and replaces it.
#[derive(Debug)]
pub struct StrokeCorrelator {
    config: StrokeConfig,
    last_left_s: Option<f64>,
    last_right_s: Option<f64>,
    strokes_detected: u64,
}

impl StrokeCorrelator {
    pub fn new(config: StrokeConfig) -> Self {
        Self {
            config,
            last_left_s: None,
            last_right_s: None,
            strokes_detected: 0,
        }
    }

    /// Record a touch from `side` at `now_s`.  Returns true when it completes
    /// a stroke, in which case both sides are cleared and two fresh touches
    /// are needed for the next one.
    pub fn notify_touch(&mut self, side: HandSide, now_s: f64) -> bool {
        match side {
            HandSide::Left => self.last_left_s = Some(now_s),
            HandSide::Right => self.last_right_s = Some(now_s),
        }

        let (Some(left), Some(right)) = (self.last_left_s, self.last_right_s) else {
            return false;
        };
        if (left - right).abs() > self.config.window_s {
            debug!(
                "Stroke touches {:.3}s apart, outside {:.3}s window",
                (left - right).abs(),
                self.config.window_s,
            );
            return false;
        }

        self.last_left_s = None;
        self.last_right_s = None;
        self.strokes_detected += 1;
        debug!("Stroke detected (left {:.3}s, right {:.3}s)", left, right);
        true
    }

    /// Pending touch time for `side`, if any.
    pub fn pending(&self, side: HandSide) -> Option<f64> {
        match side {
            HandSide::Left => self.last_left_s,
            HandSide::Right => self.last_right_s,
        }
    }

    pub fn strokes_detected(&self) -> u64 {
        self.strokes_detected
    }

    pub fn reset(&mut self) {
        self.last_left_s = None;
        self.last_right_s = None;
    }

    /// Generate s-expression for status queries.
    pub fn status_sexp(&self) -> String {
        let fmt = |t: Option<f64>| {
            t.map(|t| format!("{:.3}", t))
                .unwrap_or_else(|| "nil".to_string())
        };
        format!(
            "(:window {:.3} :pending-left {} :pending-right {} :strokes {})",
            self.config.window_s,
            fmt(self.last_left_s),
            fmt(self.last_right_s),
            self.strokes_detected,
        )
    }
}

// ── Trigger zones ──────────────────────────────────────────

/// Spherical trigger volume in tracking space, bound to one hand.
///
/// Fires once on entry; the hand must leave before it can fire again.
#[derive(Debug, Clone)]
pub struct StrokeZone {
    /// Side reported to the correlator.
    pub side: HandSide,
    /// Hand whose palm can trigger this zone; other hands pass through.
    pub target: HandSide,
    pub center: Vec3,
    pub radius_m: f32,
    inside: bool,
}

impl StrokeZone {
    pub fn new(side: HandSide, center: Vec3, radius_m: f32) -> Self {
        Self {
            side,
            target: side,
            center,
            radius_m,
            inside: false,
        }
    }

    /// Default hip-height zone for `side`.
    pub fn hip(side: HandSide) -> Self {
        let x = match side {
            HandSide::Left => -0.30,
            HandSide::Right => 0.30,
        };
        Self::new(side, Vec3::new(x, 0.90, 0.05), 0.15)
    }

    pub fn is_occupied(&self) -> bool {
        self.inside
    }

    /// Test the target hand's palm against the volume.  Returns true on the
    /// frame the palm enters.  An untracked hand counts as having left.
    pub fn update(&mut self, source: &impl PoseSource) -> bool {
        let palm = source
            .try_get_pose(self.target, HandJoint::Palm)
            .map(|p| p.position);
        self.update_point(palm)
    }

    pub fn update_point(&mut self, point: Option<Vec3>) -> bool {
        let now_inside = point
            .map(|p| p.distance_squared(self.center) <= self.radius_m * self.radius_m)
            .unwrap_or(false);
        let entered = now_inside && !self.inside;
        self.inside = now_inside;
        if entered {
            debug!("{:?} hand entered {:?} stroke zone", self.target, self.side);
        }
        entered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vr::hand_tracking::{HandTrackingState, JointPose};

    fn correlator() -> StrokeCorrelator {
        StrokeCorrelator::new(StrokeConfig::default())
    }

    #[test]
    fn test_pair_within_window() {
        let mut c = correlator();
        assert!(!c.notify_touch(HandSide::Left, 0.10));
        assert!(c.notify_touch(HandSide::Right, 0.40));
        assert_eq!(c.strokes_detected(), 1);

        // Timestamps were cleared, so a lone touch does not pair again.
        assert!(!c.notify_touch(HandSide::Right, 0.50));
        assert_eq!(c.strokes_detected(), 1);
        assert_eq!(c.pending(HandSide::Right), Some(0.50));
        assert_eq!(c.pending(HandSide::Left), None);
    }

    #[test]
    fn test_outside_window() {
        let mut c = correlator();
        assert!(!c.notify_touch(HandSide::Left, 0.0));
        assert!(!c.notify_touch(HandSide::Right, 0.6));
        assert_eq!(c.strokes_detected(), 0);
    }

    #[test]
    fn test_order_does_not_matter() {
        let mut c = correlator();
        assert!(!c.notify_touch(HandSide::Right, 1.0));
        assert!(c.notify_touch(HandSide::Left, 1.5));
    }

    #[test]
    fn test_same_side_overwrites() {
        let mut c = correlator();
        c.notify_touch(HandSide::Left, 0.0);
        c.notify_touch(HandSide::Left, 2.0);
        assert!(c.notify_touch(HandSide::Right, 2.2));
    }

    #[test]
    fn test_lone_touch_waits_for_partner() {
        let mut c = correlator();
        c.notify_touch(HandSide::Left, 0.0);
        assert!(!c.notify_touch(HandSide::Right, 5.0));
        // Right at 5.0 is now pending; a late left touch pairs with it.
        assert!(c.notify_touch(HandSide::Left, 5.3));
    }

    #[test]
    fn test_status_sexp() {
        let mut c = correlator();
        c.notify_touch(HandSide::Left, 0.25);
        let sexp = c.status_sexp();
        assert!(sexp.contains(":window 0.500"));
        assert!(sexp.contains(":pending-left 0.250"));
        assert!(sexp.contains(":pending-right nil"));
    }

    #[test]
    fn test_zone_fires_on_entry_only() {
        let mut zone = StrokeZone::new(HandSide::Left, Vec3::ZERO, 0.1);
        assert!(!zone.update_point(Some(Vec3::new(0.5, 0.0, 0.0))));
        assert!(zone.update_point(Some(Vec3::new(0.05, 0.0, 0.0))));
        assert!(!zone.update_point(Some(Vec3::ZERO)));
        assert!(zone.is_occupied());
        assert!(!zone.update_point(None));
        assert!(zone.update_point(Some(Vec3::ZERO)));
    }

    #[test]
    fn test_zone_ignores_other_hand() {
        let mut hands = HandTrackingState::default();
        let mut joints = vec![JointPose::at(Vec3::new(5.0, 5.0, 5.0)); 26];
        joints[HandJoint::Palm.index()] = JointPose::at(Vec3::new(-0.30, 0.90, 0.05));
        hands.update_hand(HandSide::Right, joints.clone(), 1, 0.9);

        let mut left_zone = StrokeZone::hip(HandSide::Left);
        assert!(!left_zone.update(&hands));

        hands.update_hand(HandSide::Left, joints, 2, 0.9);
        assert!(left_zone.update(&hands));
    }
}
