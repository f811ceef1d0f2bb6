//! Hand tracking snapshot — the pose source the locomotion drivers read.
//!
//! Models the 26 XR_EXT_hand_tracking joints per hand.  The tracking runtime
//! pushes skeletons in through `update_hand`; gesture code only ever reads
//! through the `PoseSource` trait.

use glam::{Quat, Vec3};
use tracing::debug;

// ── Joint definitions ──────────────────────────────────────

/// The 26 hand joints defined by XR_EXT_hand_tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandJoint {
    Palm,
    Wrist,
    ThumbMetacarpal,
    ThumbProximal,
    ThumbDistal,
    ThumbTip,
    IndexMetacarpal,
    IndexProximal,
    IndexIntermediate,
    IndexDistal,
    IndexTip,
    MiddleMetacarpal,
    MiddleProximal,
    MiddleIntermediate,
    MiddleDistal,
    MiddleTip,
    RingMetacarpal,
    RingProximal,
    RingIntermediate,
    RingDistal,
    RingTip,
    LittleMetacarpal,
    LittleProximal,
    LittleIntermediate,
    LittleDistal,
    LittleTip,
}

/// Total number of joints per hand.
pub const JOINT_COUNT: usize = 26;

const ALL_JOINTS: [HandJoint; JOINT_COUNT] = [
    HandJoint::Palm,
    HandJoint::Wrist,
    HandJoint::ThumbMetacarpal,
    HandJoint::ThumbProximal,
    HandJoint::ThumbDistal,
    HandJoint::ThumbTip,
    HandJoint::IndexMetacarpal,
    HandJoint::IndexProximal,
    HandJoint::IndexIntermediate,
    HandJoint::IndexDistal,
    HandJoint::IndexTip,
    HandJoint::MiddleMetacarpal,
    HandJoint::MiddleProximal,
    HandJoint::MiddleIntermediate,
    HandJoint::MiddleDistal,
    HandJoint::MiddleTip,
    HandJoint::RingMetacarpal,
    HandJoint::RingProximal,
    HandJoint::RingIntermediate,
    HandJoint::RingDistal,
    HandJoint::RingTip,
    HandJoint::LittleMetacarpal,
    HandJoint::LittleProximal,
    HandJoint::LittleIntermediate,
    HandJoint::LittleDistal,
    HandJoint::LittleTip,
];

impl HandJoint {
    /// Convert joint enum to array index (0-25).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Name used in command scripts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Palm => "palm",
            Self::Wrist => "wrist",
            Self::ThumbMetacarpal => "thumb-metacarpal",
            Self::ThumbProximal => "thumb-proximal",
            Self::ThumbDistal => "thumb-distal",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMetacarpal => "index-metacarpal",
            Self::IndexProximal => "index-proximal",
            Self::IndexIntermediate => "index-intermediate",
            Self::IndexDistal => "index-distal",
            Self::IndexTip => "index-tip",
            Self::MiddleMetacarpal => "middle-metacarpal",
            Self::MiddleProximal => "middle-proximal",
            Self::MiddleIntermediate => "middle-intermediate",
            Self::MiddleDistal => "middle-distal",
            Self::MiddleTip => "middle-tip",
            Self::RingMetacarpal => "ring-metacarpal",
            Self::RingProximal => "ring-proximal",
            Self::RingIntermediate => "ring-intermediate",
            Self::RingDistal => "ring-distal",
            Self::RingTip => "ring-tip",
            Self::LittleMetacarpal => "little-metacarpal",
            Self::LittleProximal => "little-proximal",
            Self::LittleIntermediate => "little-intermediate",
            Self::LittleDistal => "little-distal",
            Self::LittleTip => "little-tip",
        }
    }

    /// Parse a script joint name ("index-tip", "palm", ...).
    pub fn parse(s: &str) -> Option<HandJoint> {
        ALL_JOINTS.iter().copied().find(|j| j.as_str() == s)
    }
}

// ── Hand side ──────────────────────────────────────────────

/// Which physical hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandSide {
    Left,
    Right,
}

impl HandSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn parse(s: &str) -> Option<HandSide> {
        match s {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

// ── Poses ──────────────────────────────────────────────────

/// A resolved joint pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

/// Raw pose data for a single joint as delivered by the runtime.
#[derive(Debug, Clone)]
pub struct JointPose {
    /// Position in meters (x, y, z).
    pub position: [f32; 3],
    /// Orientation quaternion (x, y, z, w).
    pub orientation: [f32; 4],
    /// Joint radius in meters.
    pub radius: f32,
    /// Whether this joint has valid tracking data.
    pub valid: bool,
}

impl Default for JointPose {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            orientation: [0.0, 0.0, 0.0, 1.0],
            radius: 0.01,
            valid: false,
        }
    }
}

impl JointPose {
    /// A valid joint at `position` with identity orientation.
    pub fn at(position: Vec3) -> Self {
        Self {
            position: position.to_array(),
            valid: true,
            ..Self::default()
        }
    }

    fn to_pose(&self) -> Pose {
        Pose {
            position: Vec3::from_array(self.position),
            rotation: Quat::from_array(self.orientation).normalize(),
        }
    }
}

/// Read-only view of hand tracking, one snapshot per tick.
pub trait PoseSource {
    /// Whether the hand is currently tracked.
    fn is_tracked(&self, side: HandSide) -> bool;

    /// Pose of `joint`, or `None` when the hand is untracked or the joint
    /// has no valid data this frame.
    fn try_get_pose(&self, side: HandSide, joint: HandJoint) -> Option<Pose>;
}

// ── Hand skeleton ──────────────────────────────────────────

/// Complete skeleton data for one hand.
#[derive(Debug, Clone)]
pub struct HandSkeleton {
    pub side: HandSide,
    /// 26 joint poses indexed by HandJoint.
    pub joints: Vec<JointPose>,
    /// Timestamp of last update in nanoseconds.
    pub timestamp_ns: u64,
    pub tracking_active: bool,
    /// Overall tracking confidence (0.0-1.0).
    pub confidence: f32,
}

impl HandSkeleton {
    pub fn new(side: HandSide) -> Self {
        Self {
            side,
            joints: vec![JointPose::default(); JOINT_COUNT],
            timestamp_ns: 0,
            tracking_active: false,
            confidence: 0.0,
        }
    }

    pub fn reset(&mut self) {
        for joint in &mut self.joints {
            *joint = JointPose::default();
        }
        self.timestamp_ns = 0;
        self.tracking_active = false;
        self.confidence = 0.0;
    }
}

// ── Config ─────────────────────────────────────────────────

/// Configuration for hand tracking intake.
#[derive(Debug, Clone)]
pub struct HandTrackingConfig {
    /// Minimum confidence (0.0-1.0) to consider a hand tracked.
    pub min_confidence: f32,
    /// Positional smoothing factor (0.0 = none, 1.0 = frozen).
    pub smoothing: f32,
}

impl Default for HandTrackingConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            smoothing: 0.0,
        }
    }
}

// ── State ──────────────────────────────────────────────────

/// Latest skeletons for both hands.
pub struct HandTrackingState {
    pub config: HandTrackingConfig,
    pub left: HandSkeleton,
    pub right: HandSkeleton,
}

impl Default for HandTrackingState {
    fn default() -> Self {
        Self::new(HandTrackingConfig::default())
    }
}

impl HandTrackingState {
    pub fn new(config: HandTrackingConfig) -> Self {
        Self {
            config,
            left: HandSkeleton::new(HandSide::Left),
            right: HandSkeleton::new(HandSide::Right),
        }
    }

    pub fn skeleton(&self, side: HandSide) -> &HandSkeleton {
        match side {
            HandSide::Left => &self.left,
            HandSide::Right => &self.right,
        }
    }

    fn skeleton_mut(&mut self, side: HandSide) -> &mut HandSkeleton {
        match side {
            HandSide::Left => &mut self.left,
            HandSide::Right => &mut self.right,
        }
    }

    /// Replace a hand's skeleton with new joint data.
    ///
    /// `joints` must contain exactly 26 entries (one per HandJoint); anything
    /// else is dropped.  Smoothing only applies when the previous frame was
    /// tracked and the joint was valid in both frames.
    pub fn update_hand(
        &mut self,
        side: HandSide,
        joints: Vec<JointPose>,
        timestamp_ns: u64,
        confidence: f32,
    ) {
        if joints.len() != JOINT_COUNT {
            debug!(
                "Hand tracking: expected {} joints, got {} for {:?}",
                JOINT_COUNT,
                joints.len(),
                side,
            );
            return;
        }

        let alpha = self.config.smoothing;
        let min_confidence = self.config.min_confidence;
        let skel = self.skeleton_mut(side);

        if skel.tracking_active && alpha > 0.0 {
            for (old, new_joint) in skel.joints.iter_mut().zip(joints) {
                if new_joint.valid && old.valid {
                    let from = Vec3::from_array(old.position);
                    let to = Vec3::from_array(new_joint.position);
                    *old = JointPose {
                        position: from.lerp(to, 1.0 - alpha).to_array(),
                        ..new_joint
                    };
                } else {
                    *old = new_joint;
                }
            }
        } else {
            skel.joints = joints;
        }

        skel.timestamp_ns = timestamp_ns;
        skel.confidence = confidence;
        skel.tracking_active = confidence >= min_confidence;
    }

    /// Push a frame that changes only `updates`; every other joint carries
    /// over from the current skeleton.  Goes through `update_hand`, so
    /// smoothing and confidence gating apply.
    pub fn update_joints(
        &mut self,
        side: HandSide,
        updates: &[(HandJoint, JointPose)],
        timestamp_ns: u64,
        confidence: f32,
    ) {
        let mut joints = self.skeleton(side).joints.clone();
        for (joint, pose) in updates {
            joints[joint.index()] = pose.clone();
        }
        self.update_hand(side, joints, timestamp_ns, confidence);
    }

    /// Mark a hand tracked or lost without touching its joints.
    pub fn set_tracked(&mut self, side: HandSide, tracked: bool, confidence: f32) {
        let skel = self.skeleton_mut(side);
        skel.tracking_active = tracked;
        skel.confidence = confidence;
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }

    /// Generate s-expression for status queries.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:min-confidence {:.2} :smoothing {:.2} :left (:tracking {} :confidence {:.2} :timestamp {}) :right (:tracking {} :confidence {:.2} :timestamp {}))",
            self.config.min_confidence,
            self.config.smoothing,
            if self.left.tracking_active { "t" } else { "nil" },
            self.left.confidence,
            self.left.timestamp_ns,
            if self.right.tracking_active { "t" } else { "nil" },
            self.right.confidence,
            self.right.timestamp_ns,
        )
    }
}

impl PoseSource for HandTrackingState {
    fn is_tracked(&self, side: HandSide) -> bool {
        let skel = self.skeleton(side);
        skel.tracking_active && skel.confidence >= self.config.min_confidence
    }

    fn try_get_pose(&self, side: HandSide, joint: HandJoint) -> Option<Pose> {
        if !self.is_tracked(side) {
            return None;
        }
        let raw = &self.skeleton(side).joints[joint.index()];
        raw.valid.then(|| raw.to_pose())
    }
}

// ── Test helpers ───────────────────────────────────────────

#[cfg(test)]
pub(crate) fn tracked_hand(state: &mut HandTrackingState, side: HandSide, index_tip: Vec3, thumb_tip: Vec3) {
    let mut joints: Vec<JointPose> = (0..JOINT_COUNT).map(|_| JointPose::at(Vec3::ZERO)).collect();
    joints[HandJoint::IndexTip.index()] = JointPose::at(index_tip);
    joints[HandJoint::ThumbTip.index()] = JointPose::at(thumb_tip);
    state.update_hand(side, joints, 1000, 0.9);
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_untracked() {
        let state = HandTrackingState::default();
        assert!(!state.is_tracked(HandSide::Left));
        assert!(!state.is_tracked(HandSide::Right));
        assert_eq!(state.left.joints.len(), JOINT_COUNT);
        assert!(state.try_get_pose(HandSide::Left, HandJoint::IndexTip).is_none());
    }

    #[test]
    fn test_joint_parse_roundtrip() {
        assert_eq!(HandJoint::parse("index-tip"), Some(HandJoint::IndexTip));
        assert_eq!(HandJoint::parse("little-tip"), Some(HandJoint::LittleTip));
        assert_eq!(HandJoint::parse("elbow"), None);
        assert_eq!(HandJoint::LittleTip.index(), 25);
    }

    #[test]
    fn test_update_hand_low_confidence() {
        let mut state = HandTrackingState::default();
        let joints = vec![JointPose::at(Vec3::ONE); JOINT_COUNT];
        state.update_hand(HandSide::Left, joints, 1000, 0.2);
        assert!(!state.is_tracked(HandSide::Left));
        assert!(state.try_get_pose(HandSide::Left, HandJoint::Palm).is_none());
    }

    #[test]
    fn test_update_hand_wrong_joint_count() {
        let mut state = HandTrackingState::default();
        state.update_hand(HandSide::Left, vec![JointPose::at(Vec3::ONE); 10], 1000, 0.9);
        assert!(!state.is_tracked(HandSide::Left));
    }

    #[test]
    fn test_tracked_pose_readback() {
        let mut state = HandTrackingState::default();
        tracked_hand(
            &mut state,
            HandSide::Right,
            Vec3::new(3.0, 4.0, 0.0),
            Vec3::ZERO,
        );
        let tip = state.try_get_pose(HandSide::Right, HandJoint::IndexTip).unwrap();
        assert_eq!(tip.position, Vec3::new(3.0, 4.0, 0.0));
        assert_eq!(tip.rotation, Quat::IDENTITY);
        assert!(state.try_get_pose(HandSide::Left, HandJoint::IndexTip).is_none());
    }

    #[test]
    fn test_invalid_joint_has_no_pose() {
        let mut state = HandTrackingState::default();
        tracked_hand(&mut state, HandSide::Left, Vec3::X, Vec3::ZERO);
        state.update_joints(
            HandSide::Left,
            &[(HandJoint::ThumbTip, JointPose::default())],
            2000,
            0.9,
        );
        assert!(state.is_tracked(HandSide::Left));
        assert!(state.try_get_pose(HandSide::Left, HandJoint::ThumbTip).is_none());
        assert!(state.try_get_pose(HandSide::Left, HandJoint::IndexTip).is_some());
    }

    #[test]
    fn test_smoothing() {
        let mut state = HandTrackingState::new(HandTrackingConfig {
            smoothing: 0.5,
            ..HandTrackingConfig::default()
        });

        // First update has no previous data to smooth against.
        state.update_hand(HandSide::Left, vec![JointPose::at(Vec3::X); JOINT_COUNT], 1000, 0.9);
        assert!((state.left.joints[0].position[0] - 1.0).abs() < 0.001);

        // lerp(1.0, 2.0, 0.5) = 1.5
        state.update_hand(
            HandSide::Left,
            vec![JointPose::at(Vec3::new(2.0, 0.0, 0.0)); JOINT_COUNT],
            2000,
            0.9,
        );
        let x = state.left.joints[0].position[0];
        assert!((x - 1.5).abs() < 0.001, "Expected ~1.5 after smoothing, got {}", x);
    }

    #[test]
    fn test_update_joints_keeps_others_and_smooths() {
        let mut state = HandTrackingState::new(HandTrackingConfig {
            smoothing: 0.5,
            ..HandTrackingConfig::default()
        });
        tracked_hand(&mut state, HandSide::Right, Vec3::X, Vec3::ZERO);
        state.update_joints(
            HandSide::Right,
            &[(HandJoint::IndexTip, JointPose::at(Vec3::new(3.0, 0.0, 0.0)))],
            2000,
            0.9,
        );
        let skel = state.skeleton(HandSide::Right);
        assert!((skel.joints[HandJoint::IndexTip.index()].position[0] - 2.0).abs() < 0.001);
        assert_eq!(skel.joints[HandJoint::ThumbTip.index()].position, [0.0, 0.0, 0.0]);
        assert_eq!(skel.timestamp_ns, 2000);
    }

    #[test]
    fn test_set_tracked_drops_poses() {
        let mut state = HandTrackingState::default();
        tracked_hand(&mut state, HandSide::Left, Vec3::X, Vec3::ZERO);
        state.set_tracked(HandSide::Left, false, 0.0);
        assert!(state.try_get_pose(HandSide::Left, HandJoint::IndexTip).is_none());
    }

    #[test]
    fn test_reset() {
        let mut state = HandTrackingState::default();
        tracked_hand(&mut state, HandSide::Left, Vec3::X, Vec3::ZERO);
        state.reset();
        assert!(!state.is_tracked(HandSide::Left));
        assert_eq!(state.left.timestamp_ns, 0);
    }

    #[test]
    fn test_status_sexp() {
        let state = HandTrackingState::default();
        let sexp = state.status_sexp();
        assert!(sexp.contains(":min-confidence 0.50"));
        assert!(sexp.contains(":left (:tracking nil"));
        assert!(sexp.contains(":right (:tracking nil"));
    }

    #[test]
    fn test_hand_side_parse() {
        assert_eq!(HandSide::parse("left"), Some(HandSide::Left));
        assert_eq!(HandSide::parse("right"), Some(HandSide::Right));
        assert_eq!(HandSide::parse("both"), None);
        assert_eq!(HandSide::Right.as_str(), "right");
    }
}
