//! Locomotion configuration — set once at startup, read-only afterwards.
//!
//! Loaded from an s-expression plist file; any key left out keeps its
//! default:
//!
//! ```text
//! (:pinch-hand left :pinch-start-distance 0.035 :pinch-end-distance 0.050
//!  :speed 1.6 :stroke-window 0.5 :stroke-distance 2.4
//!  :stroke-duration 0.25 :stroke-cooldown 0.35 :tick-hz 90)
//! ```

use std::path::Path;

use anyhow::{bail, Context};
use glam::Vec3;
use lexpr::Value;
use tracing::{info, warn};

use crate::ipc::sexp::{get_bool, get_float, get_string, get_vec3, t_or_nil};
use crate::vr::hand_tracking::{HandSide, HandTrackingConfig};
use crate::vr::impulse::ImpulseConfig;
use crate::vr::pinch::PinchConfig;
use crate::vr::stroke::StrokeConfig;
use crate::vr::swim::SwimConfig;

/// Dive volume bounds for the character controller.
#[derive(Debug, Clone)]
pub struct DiveVolume {
    pub min: Vec3,
    pub max: Vec3,
}

#[derive(Debug, Clone)]
pub struct LocomotionConfig {
    pub hand_tracking: HandTrackingConfig,
    pub pinch: PinchConfig,
    pub swim: SwimConfig,
    pub stroke: StrokeConfig,
    pub impulse: ImpulseConfig,
    /// Route moves through the character controller when one is attached.
    pub use_character_controller: bool,
    /// Attach a bounded controller for this volume.
    pub dive_volume: Option<DiveVolume>,
    /// Frame rate a scripted `run` uses when it names none.
    pub tick_hz: f64,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            hand_tracking: HandTrackingConfig::default(),
            pinch: PinchConfig::default(),
            swim: SwimConfig::default(),
            stroke: StrokeConfig::default(),
            impulse: ImpulseConfig::default(),
            use_character_controller: true,
            dive_volume: None,
            tick_hz: 90.0,
        }
    }
}

impl LocomotionConfig {
    /// Pinch band sanity; a violation is logged, not rejected.
    pub fn hysteresis_ok(&self) -> bool {
        self.pinch.hysteresis_ok()
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_sexp_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!("Loaded locomotion config from {}", path.display());
        Ok(config)
    }

    pub fn from_sexp_str(text: &str) -> anyhow::Result<Self> {
        let value = lexpr::from_str(text).context("malformed s-expression")?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(hand) = get_string(value, "pinch-hand") {
            config.pinch.hand = match HandSide::parse(&hand) {
                Some(side) => side,
                None => bail!("unknown :pinch-hand {}", hand),
            };
        }
        let f32_field = |key: &str| get_float(value, key).map(|f| f as f32);

        if let Some(v) = f32_field("pinch-start-distance") {
            config.pinch.start_distance_m = v;
        }
        if let Some(v) = f32_field("pinch-end-distance") {
            config.pinch.end_distance_m = v;
        }
        if let Some(v) = f32_field("speed") {
            config.swim.speed = v;
        }
        if let Some(v) = get_float(value, "stroke-window") {
            config.stroke.window_s = v;
        }
        if let Some(v) = f32_field("stroke-distance") {
            config.impulse.distance_m = v;
        }
        if let Some(v) = f32_field("stroke-duration") {
            config.impulse.duration_s = v;
        }
        if let Some(v) = f32_field("stroke-cooldown") {
            config.impulse.cooldown_s = v;
        }
        if let Some(v) = f32_field("min-confidence") {
            config.hand_tracking.min_confidence = v;
        }
        if let Some(v) = f32_field("smoothing") {
            config.hand_tracking.smoothing = v;
        }
        if let Some(v) = get_float(value, "tick-hz") {
            config.tick_hz = v;
        }
        if let Some(v) = get_bool(value, "use-character-controller") {
            config.use_character_controller = v;
        }
        match (get_vec3(value, "volume-min"), get_vec3(value, "volume-max")) {
            (Some(min), Some(max)) => config.dive_volume = Some(DiveVolume { min, max }),
            (None, None) => {}
            _ => bail!(":volume-min and :volume-max must be given together"),
        }

        if config.impulse.duration_s < 0.0 || config.impulse.cooldown_s < 0.0 {
            bail!("stroke duration and cooldown must not be negative");
        }
        if config.tick_hz <= 0.0 {
            bail!(":tick-hz must be positive");
        }
        if !config.hysteresis_ok() {
            warn!(
                "Config: pinch-end-distance {:.3} <= pinch-start-distance {:.3}",
                config.pinch.end_distance_m, config.pinch.start_distance_m,
            );
        }
        Ok(config)
    }

    /// Generate s-expression for config queries.
    pub fn config_sexp(&self) -> String {
        format!(
            "(:pinch-hand :{} :pinch-start-distance {:.3} :pinch-end-distance {:.3} :speed {:.2} :stroke-window {:.3} :stroke-distance {:.2} :stroke-duration {:.3} :stroke-cooldown {:.3} :tick-hz {:.1} :use-character-controller {} :dive-volume {})",
            self.pinch.hand.as_str(),
            self.pinch.start_distance_m,
            self.pinch.end_distance_m,
            self.swim.speed,
            self.stroke.window_s,
            self.impulse.distance_m,
            self.impulse.duration_s,
            self.impulse.cooldown_s,
            self.tick_hz,
            t_or_nil(self.use_character_controller),
            t_or_nil(self.dive_volume.is_some()),
        )
    }
}
