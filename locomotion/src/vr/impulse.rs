//! Stroke impulses — a timed, constant-rate forward push plus a cooldown.
//!
//! At most one impulse plays at a time; a new one replaces whatever is in
//! flight.  The cooldown is an expiry time on the same clock as the stroke
//! timestamps, independent of how long the impulse lasts, and gates new
//! starts only.

use glam::Vec3;
use tracing::{debug, info};

use super::motion::Mover;

/// Remaining time below which an impulse counts as finished.  Absorbs
/// float drift from summing tick deltas.
const FINISH_EPSILON_S: f32 = 1e-6;

#[derive(Debug, Clone)]
pub struct ImpulseConfig {
    /// Meters travelled per stroke.
    pub distance_m: f32,
    /// Seconds the travel is spread over.
    pub duration_s: f32,
    /// Seconds after a start before another start is accepted.
    pub cooldown_s: f32,
}

impl Default for ImpulseConfig {
    fn default() -> Self {
        Self {
            distance_m: 2.4,
            duration_s: 0.25,
            cooldown_s: 0.35,
        }
    }
}

/// The single in-flight impulse.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveImpulse {
    pub id: u64,
    /// Unit horizontal direction.
    pub forward: Vec3,
    pub total_distance_m: f32,
    pub duration_s: f32,
    pub elapsed_s: f32,
}

impl ActiveImpulse {
    /// Meters per second.
    pub fn rate(&self) -> f32 {
        self.total_distance_m / self.duration_s
    }

    /// Advance by `dt_s` and return this tick's displacement, plus whether
    /// the impulse has now finished.  The last tick is clipped to the time
    /// left so the run covers exactly `total_distance_m`.
    fn advance(&mut self, dt_s: f32) -> (Vec3, bool) {
        if self.duration_s <= 0.0 {
            self.elapsed_s = 0.0;
            return (self.forward * self.total_distance_m, true);
        }
        let step_s = dt_s.max(0.0).min(self.duration_s - self.elapsed_s);
        self.elapsed_s += step_s;
        let step = self.forward * (self.rate() * step_s);
        (step, self.duration_s - self.elapsed_s <= FINISH_EPSILON_S)
    }
}

/// Outcome of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpulseStart {
    Started { id: u64 },
    /// Started and cut short the impulse `replaced`.
    Preempted { id: u64, replaced: u64 },
    OnCooldown,
    /// The aim had no horizontal component.
    NoDirection,
}

impl ImpulseStart {
    pub fn accepted(&self) -> bool {
        matches!(self, Self::Started { .. } | Self::Preempted { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Preempted { .. } => "preempted",
            Self::OnCooldown => "cooldown",
            Self::NoDirection => "no-direction",
        }
    }
}

#[derive(Debug)]
pub struct ImpulseScheduler {
    config: ImpulseConfig,
    active: Option<ActiveImpulse>,
    /// Clock time at which the cooldown ends; `None` when ready.
    cooldown_until_s: Option<f64>,
    next_id: u64,
    pub started: u64,
    pub rejected: u64,
}

impl ImpulseScheduler {
    pub fn new(config: ImpulseConfig) -> Self {
        Self {
            config,
            active: None,
            cooldown_until_s: None,
            next_id: 1,
            started: 0,
            rejected: 0,
        }
    }

    pub fn active(&self) -> Option<&ActiveImpulse> {
        self.active.as_ref()
    }

    /// Whether a start at `now_s` would be refused by the cooldown.
    pub fn on_cooldown(&self, now_s: f64) -> bool {
        self.cooldown_until_s.is_some_and(|until| now_s < until)
    }

    /// Try to start an impulse at clock time `now_s` along `forward`
    /// (already horizontal and normalized; `None` if the aim was
    /// degenerate).  Rejections leave all state untouched.
    pub fn try_start(&mut self, forward: Option<Vec3>, now_s: f64) -> ImpulseStart {
        if self.on_cooldown(now_s) {
            self.rejected += 1;
            debug!("Stroke impulse rejected: on cooldown");
            return ImpulseStart::OnCooldown;
        }
        let Some(forward) = forward else {
            self.rejected += 1;
            debug!("Stroke impulse rejected: no horizontal aim");
            return ImpulseStart::NoDirection;
        };

        let id = self.next_id;
        self.next_id += 1;
        let replaced = self.active.replace(ActiveImpulse {
            id,
            forward,
            total_distance_m: self.config.distance_m,
            duration_s: self.config.duration_s,
            elapsed_s: 0.0,
        });
        self.cooldown_until_s = Some(now_s + f64::from(self.config.cooldown_s));
        self.started += 1;

        info!(
            "Stroke impulse {} started: {:.2}m over {:.2}s toward ({:.2}, {:.2})",
            id, self.config.distance_m, self.config.duration_s, forward.x, forward.z,
        );
        match replaced {
            Some(old) => {
                debug!("Impulse {} pre-empted at {:.3}s", old.id, old.elapsed_s);
                ImpulseStart::Preempted {
                    id,
                    replaced: old.id,
                }
            }
            None => ImpulseStart::Started { id },
        }
    }

    /// Advance the active impulse by one frame ending at clock time `now_s`,
    /// moving `mover`, and expire the cooldown once `now_s` reaches it.
    /// Returns the impulse displacement applied this frame.
    pub fn tick(&mut self, dt_s: f32, now_s: f64, mover: &mut impl Mover) -> Option<Vec3> {
        let applied = self.active.as_mut().map(|imp| imp.advance(dt_s));
        let step = match applied {
            Some((step, finished)) => {
                mover.move_by(step);
                if finished {
                    if let Some(done) = self.active.take() {
                        debug!("Impulse {} finished", done.id);
                    }
                }
                Some(step)
            }
            None => None,
        };

        if self.cooldown_until_s.is_some() && !self.on_cooldown(now_s) {
            self.cooldown_until_s = None;
            debug!("Stroke cooldown expired");
        }

        step
    }

    /// Drop any in-flight impulse and cooldown.
    pub fn reset(&mut self) {
        self.active = None;
        self.cooldown_until_s = None;
    }

    /// Generate s-expression for status queries.
    pub fn status_sexp(&self) -> String {
        let active = match &self.active {
            Some(imp) => format!(
                "(:id {} :elapsed {:.3} :duration {:.3} :distance {:.3})",
                imp.id, imp.elapsed_s, imp.duration_s, imp.total_distance_m,
            ),
            None => "nil".to_string(),
        };
        format!(
            "(:active {} :cooldown-until {} :started {} :rejected {})",
            active,
            self.cooldown_until_s
                .map(|r| format!("{:.3}", r))
                .unwrap_or_else(|| "nil".to_string()),
            self.started,
            self.rejected,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vr::motion::PlayerRig;

    /// Tick from clock time `start_s` until idle; returns (distance, ticks).
    fn run_to_idle(
        sched: &mut ImpulseScheduler,
        start_s: f64,
        dt: f32,
        rig: &mut PlayerRig,
    ) -> (f32, u32) {
        let mut total = 0.0;
        let mut ticks = 0;
        let mut now = start_s;
        while sched.active().is_some() {
            now += f64::from(dt);
            if let Some(step) = sched.tick(dt, now, rig) {
                total += step.length();
            }
            ticks += 1;
            assert!(ticks < 10_000, "impulse never finished");
        }
        (total, ticks)
    }

    #[test]
    fn test_distance_conserved_for_even_ticks() {
        for n in [1u32, 5, 10, 25, 50] {
            let mut sched = ImpulseScheduler::new(ImpulseConfig::default());
            let mut rig = PlayerRig::default();
            assert!(sched.try_start(Some(Vec3::NEG_Z), 0.0).accepted());
            let dt = 0.25 / n as f32;
            let (total, ticks) = run_to_idle(&mut sched, 0.0, dt, &mut rig);
            assert!((total - 2.4).abs() < 1e-4, "n={} total={}", n, total);
            assert!((rig.position.z + 2.4).abs() < 1e-4);
            assert!(ticks == n || ticks == n + 1, "n={} ticks={}", n, ticks);
        }
    }

    #[test]
    fn test_distance_conserved_for_uneven_ticks() {
        let mut sched = ImpulseScheduler::new(ImpulseConfig::default());
        let mut rig = PlayerRig::default();
        sched.try_start(Some(Vec3::X), 0.0);
        let (total, _) = run_to_idle(&mut sched, 0.0, 1.0 / 90.0, &mut rig);
        assert!((total - 2.4).abs() < 1e-4, "total={}", total);
    }

    #[test]
    fn test_constant_rate() {
        let mut sched = ImpulseScheduler::new(ImpulseConfig::default());
        let mut rig = PlayerRig::default();
        sched.try_start(Some(Vec3::NEG_Z), 0.0);
        let a = sched.tick(0.05, 0.05, &mut rig).unwrap().length();
        let b = sched.tick(0.05, 0.10, &mut rig).unwrap().length();
        assert!((a - 0.48).abs() < 1e-5);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn test_cooldown_gates_second_start() {
        let mut sched = ImpulseScheduler::new(ImpulseConfig::default());
        let mut rig = PlayerRig::default();
        assert_eq!(
            sched.try_start(Some(Vec3::NEG_Z), 0.0),
            ImpulseStart::Started { id: 1 }
        );
        sched.tick(0.1, 0.1, &mut rig);
        assert_eq!(sched.try_start(Some(Vec3::NEG_Z), 0.1), ImpulseStart::OnCooldown);
        assert_eq!(sched.started, 1);
        assert_eq!(sched.rejected, 1);
        assert_eq!(sched.active().map(|a| a.id), Some(1));

        // Cooldown outlives the 0.25s impulse.
        sched.tick(0.2, 0.3, &mut rig);
        assert!(sched.active().is_none());
        assert!(sched.on_cooldown(0.3));

        sched.tick(0.1, 0.4, &mut rig);
        assert!(!sched.on_cooldown(0.4));
        assert!(sched.status_sexp().contains(":cooldown-until nil"));
        assert!(sched.try_start(Some(Vec3::NEG_Z), 0.4).accepted());
    }

    #[test]
    fn test_cooldown_measured_against_start_time() {
        let mut sched = ImpulseScheduler::new(ImpulseConfig::default());
        assert!(sched.try_start(Some(Vec3::NEG_Z), 0.1).accepted());
        assert_eq!(sched.try_start(Some(Vec3::NEG_Z), 0.44), ImpulseStart::OnCooldown);
        // No tick in between: expiry depends only on the start times.
        assert_eq!(
            sched.try_start(Some(Vec3::X), 1.1),
            ImpulseStart::Preempted { id: 2, replaced: 1 }
        );
    }

    #[test]
    fn test_zero_cooldown_never_blocks() {
        let mut sched = ImpulseScheduler::new(ImpulseConfig {
            cooldown_s: 0.0,
            ..ImpulseConfig::default()
        });
        assert!(sched.try_start(Some(Vec3::X), 1.0).accepted());
        assert!(sched.try_start(Some(Vec3::X), 1.0).accepted());
        assert_eq!(sched.started, 2);
    }

    #[test]
    fn test_no_direction_does_not_start_cooldown() {
        let mut sched = ImpulseScheduler::new(ImpulseConfig::default());
        assert_eq!(sched.try_start(None, 0.0), ImpulseStart::NoDirection);
        assert!(!sched.on_cooldown(0.0));
        assert!(sched.active().is_none());
    }

    #[test]
    fn test_preemption_replaces_in_flight_impulse() {
        let mut sched = ImpulseScheduler::new(ImpulseConfig {
            cooldown_s: 0.0,
            ..ImpulseConfig::default()
        });
        let mut rig = PlayerRig::default();
        sched.try_start(Some(Vec3::NEG_Z), 0.0);
        sched.tick(0.1, 0.1, &mut rig);
        let after_a = rig.position;
        assert!(after_a.z < 0.0);

        assert_eq!(
            sched.try_start(Some(Vec3::X), 0.1),
            ImpulseStart::Preempted { id: 2, replaced: 1 }
        );
        assert_eq!(sched.active().map(|a| a.id), Some(2));
        assert_eq!(sched.active().map(|a| a.elapsed_s), Some(0.0));

        let (total, _) = run_to_idle(&mut sched, 0.1, 0.05, &mut rig);
        // Only B moved the rig from here on: no further travel along -Z.
        assert!((rig.position.z - after_a.z).abs() < 1e-6);
        assert!((total - 2.4).abs() < 1e-4);
        assert!((rig.position.x - 2.4).abs() < 1e-4);
    }

    #[test]
    fn test_zero_duration_applies_in_one_tick() {
        let mut sched = ImpulseScheduler::new(ImpulseConfig {
            duration_s: 0.0,
            ..ImpulseConfig::default()
        });
        let mut rig = PlayerRig::default();
        sched.try_start(Some(Vec3::X), 0.0);
        let step = sched.tick(0.011, 0.011, &mut rig).unwrap();
        assert!((step.x - 2.4).abs() < 1e-6);
        assert!(sched.active().is_none());
    }

    #[test]
    fn test_reset_clears_impulse_and_cooldown() {
        let mut sched = ImpulseScheduler::new(ImpulseConfig::default());
        sched.try_start(Some(Vec3::X), 0.0);
        sched.reset();
        assert!(sched.active().is_none());
        assert!(!sched.on_cooldown(0.0));
        assert_eq!(sched.started, 1);
    }

    #[test]
    fn test_status_sexp() {
        let mut sched = ImpulseScheduler::new(ImpulseConfig::default());
        assert!(sched.status_sexp().contains(":active nil :cooldown-until nil"));
        sched.try_start(Some(Vec3::X), 0.0);
        let sexp = sched.status_sexp();
        assert!(sexp.contains(":active (:id 1"));
        assert!(sexp.contains(":cooldown-until 0.350"));
        assert!(sexp.contains(":started 1"));
    }
}
