//! Pinch detection — index/thumb tip proximity with a hysteresis band.
//!
//! A pinch starts once the tips come within `start_distance_m` and only ends
//! once they separate past `end_distance_m`.  Distances in between leave the
//! state alone so tracking jitter at the boundary does not chatter.

use tracing::{debug, warn};

use super::hand_tracking::{HandJoint, HandSide, PoseSource};

/// Pinch thresholds.
#[derive(Debug, Clone)]
pub struct PinchConfig {
    /// Hand whose pinch drives swimming.
    pub hand: HandSide,
    /// Tip distance (meters) at or below which a pinch starts.
    pub start_distance_m: f32,
    /// Tip distance (meters) at or above which a pinch ends.  Must exceed
    /// `start_distance_m`.
    pub end_distance_m: f32,
}

impl Default for PinchConfig {
    fn default() -> Self {
        Self {
            hand: HandSide::Left,
            start_distance_m: 0.035,
            end_distance_m: 0.050,
        }
    }
}

impl PinchConfig {
    /// Whether the band is non-empty.  Without it the state flips every frame
    /// a distance sits between the thresholds.
    pub fn hysteresis_ok(&self) -> bool {
        self.end_distance_m > self.start_distance_m
    }
}

/// Edge reported by a pinch update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinchTransition {
    Started,
    Ended,
}

/// Schmitt-trigger pinch state for one hand.
#[derive(Debug)]
pub struct PinchDetector {
    config: PinchConfig,
    is_pinching: bool,
    last_distance_m: Option<f32>,
}

impl PinchDetector {
    pub fn new(config: PinchConfig) -> Self {
        if !config.hysteresis_ok() {
            warn!(
                "Pinch end distance {:.3}m does not exceed start distance {:.3}m; pinch will oscillate",
                config.end_distance_m, config.start_distance_m,
            );
        }
        Self {
            config,
            is_pinching: false,
            last_distance_m: None,
        }
    }

    pub fn is_pinching(&self) -> bool {
        self.is_pinching
    }

    /// Read the configured hand from `source` and update the pinch state.
    pub fn update(&mut self, source: &impl PoseSource) -> Option<PinchTransition> {
        let hand = self.config.hand;
        let distance = if source.is_tracked(hand) {
            source
                .try_get_pose(hand, HandJoint::IndexTip)
                .zip(source.try_get_pose(hand, HandJoint::ThumbTip))
                .map(|(index, thumb)| index.position.distance(thumb.position))
        } else {
            None
        };
        self.update_distance(distance)
    }

    /// Feed one distance sample; `None` means the hand (or one of its tips)
    /// is not tracked this frame, which always clears the pinch.
    pub fn update_distance(&mut self, distance_m: Option<f32>) -> Option<PinchTransition> {
        self.last_distance_m = distance_m;

        let Some(d) = distance_m else {
            if self.is_pinching {
                self.is_pinching = false;
                debug!("Pinch lost with tracking on {:?}", self.config.hand);
                return Some(PinchTransition::Ended);
            }
            return None;
        };

        if !self.is_pinching && d <= self.config.start_distance_m {
            self.is_pinching = true;
            debug!("Pinch started on {:?} at {:.3}m", self.config.hand, d);
            Some(PinchTransition::Started)
        } else if self.is_pinching && d >= self.config.end_distance_m {
            self.is_pinching = false;
            debug!("Pinch released on {:?} at {:.3}m", self.config.hand, d);
            Some(PinchTransition::Ended)
        } else {
            None
        }
    }

    /// Generate s-expression for status queries.
    pub fn status_sexp(&self) -> String {
        let distance = self
            .last_distance_m
            .map(|d| format!("{:.4}", d))
            .unwrap_or_else(|| "nil".to_string());
        format!(
            "(:hand :{} :pinching {} :distance {})",
            self.config.hand.as_str(),
            if self.is_pinching { "t" } else { "nil" },
            distance,
        )
    }
}
