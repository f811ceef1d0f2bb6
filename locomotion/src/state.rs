//! Locomotion state — the central struct holding every driver.
//!
//! Single `LocomotionState` owns everything and is ticked once per frame.
//! Frame order: clock → pinch → stroke zones → swim → impulse/cooldown.
//! Touches reported from outside (`notify_touch`) apply immediately.

use glam::Vec3;
use tracing::{debug, info};

use crate::config::LocomotionConfig;
use crate::ipc::sexp::t_or_nil;
use crate::vr::aim::AimSources;
use crate::vr::hand_tracking::{HandSide, HandTrackingState};
use crate::vr::impulse::{ImpulseScheduler, ImpulseStart};
use crate::vr::motion::{BoundedController, PlayerRig};
use crate::vr::pinch::PinchTransition;
use crate::vr::stroke::{StrokeCorrelator, StrokeZone};
use crate::vr::swim::SwimDriver;

/// What happened during one `tick`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickReport {
    pub pinch: Option<PinchTransition>,
    /// Start attempts triggered by stroke zones this frame.
    pub strokes: Vec<ImpulseStart>,
    pub swim: Option<Vec3>,
    pub impulse: Option<Vec3>,
}

impl TickReport {
    /// Total displacement requested this frame.
    pub fn displacement(&self) -> Vec3 {
        self.swim.unwrap_or(Vec3::ZERO) + self.impulse.unwrap_or(Vec3::ZERO)
    }
}

pub struct LocomotionState {
    pub config: LocomotionConfig,
    pub hands: HandTrackingState,
    pub aim: AimSources,
    pub rig: PlayerRig,
    pub swim: SwimDriver,
    pub strokes: StrokeCorrelator,
    /// Left and right hip zones.
    pub zones: [StrokeZone; 2],
    pub impulses: ImpulseScheduler,
    /// Seconds since start, advanced by `tick`.
    pub clock_s: f64,
    pub frame: u64,
}

impl Default for LocomotionState {
    fn default() -> Self {
        Self::new(LocomotionConfig::default())
    }
}

impl LocomotionState {
    pub fn new(config: LocomotionConfig) -> Self {
        let mut rig = PlayerRig::default();
        rig.use_character_controller = config.use_character_controller;
        if let Some(volume) = &config.dive_volume {
            rig.set_controller(Some(Box::new(BoundedController::new(volume.min, volume.max))));
        }

        info!(
            "LocomotionState initialized (pinch hand {:?}, controller {})",
            config.pinch.hand,
            if rig.uses_controller() { "on" } else { "off" },
        );

        Self {
            hands: HandTrackingState::new(config.hand_tracking.clone()),
            aim: AimSources::default(),
            rig,
            swim: SwimDriver::new(config.swim.clone(), config.pinch.clone()),
            strokes: StrokeCorrelator::new(config.stroke.clone()),
            zones: [
                StrokeZone::hip(HandSide::Left),
                StrokeZone::hip(HandSide::Right),
            ],
            impulses: ImpulseScheduler::new(config.impulse.clone()),
            clock_s: 0.0,
            frame: 0,
            config,
        }
    }

    /// Advance one frame of `dt_s` seconds.
    pub fn tick(&mut self, dt_s: f32) -> TickReport {
        let dt_s = dt_s.max(0.0);
        self.clock_s += f64::from(dt_s);
        self.frame += 1;

        let mut report = TickReport {
            pinch: self.swim.update_pinch(&self.hands),
            ..TickReport::default()
        };
        if let Some(edge) = report.pinch {
            debug!("Frame {}: pinch {:?}", self.frame, edge);
        }

        for i in 0..self.zones.len() {
            if self.zones[i].update(&self.hands) {
                let side = self.zones[i].side;
                if let Some(outcome) = self.notify_touch(side) {
                    report.strokes.push(outcome);
                }
            }
        }

        report.swim = self.swim.tick(&self.aim, dt_s, &mut self.rig);
        report.impulse = self.impulses.tick(dt_s, self.clock_s, &mut self.rig);
        report
    }

    /// A stroke zone on `side` was touched now.  Returns the impulse start
    /// outcome when the touch completed a stroke.
    pub fn notify_touch(&mut self, side: HandSide) -> Option<ImpulseStart> {
        self.notify_touch_at(side, self.clock_s)
    }

    /// Touch stamped at `now_s`.  The same time drives both the left/right
    /// pairing and the cooldown check.
    pub fn notify_touch_at(&mut self, side: HandSide, now_s: f64) -> Option<ImpulseStart> {
        if !self.strokes.notify_touch(side, now_s) {
            return None;
        }
        // Forward is taken at trigger time, independent of any pinch.
        Some(self.impulses.try_start(self.aim.horizontal_forward(), now_s))
    }

    /// Drop pending touches, any in-flight impulse and its cooldown, and
    /// both hand skeletons.  Position and clock are kept.
    pub fn reset(&mut self) {
        self.strokes.reset();
        self.impulses.reset();
        self.hands.reset();
        info!("Locomotion state reset at frame {}", self.frame);
    }

    /// Generate s-expression for status queries.
    pub fn status_sexp(&self) -> String {
        let p = self.rig.position;
        format!(
            "(:frame {} :clock {:.3} :position (:x {:.3} :y {:.3} :z {:.3}) :travelled {:.3} :controller {} :volume {} :aim :{} :zones (:left {} :right {}) :pinch {} :stroke {} :impulse {})",
            self.frame,
            self.clock_s,
            p.x,
            p.y,
            p.z,
            self.rig.distance_travelled,
            t_or_nil(self.rig.uses_controller()),
            match self.rig.controller() {
                Some(cc) => t_or_nil(cc.enabled()),
                None => "none",
            },
            self.aim.active_name(),
            t_or_nil(self.zones[0].is_occupied()),
            t_or_nil(self.zones[1].is_occupied()),
            self.swim.pinch().status_sexp(),
            self.strokes.status_sexp(),
            self.impulses.status_sexp(),
        )
    }
}
