//! Command dispatch — parse s-expressions and route to handlers.
//!
//! Every message is a plist with a `:type`; an optional `:id` is echoed in
//! the response.

use lexpr::Value;
use tracing::{debug, warn};

use super::sexp::{
    as_vec3, error_response, get_bool, get_float, get_int, get_keyword, get_string,
    ok_response, plist_pairs, t_or_nil,
};
use crate::state::LocomotionState;
use crate::vr::aim::orientation_from_yaw_pitch;
use crate::vr::hand_tracking::{HandJoint, HandSide, JointPose};

/// Upper bound on ticks a single `run` may expand to.
const MAX_RUN_TICKS: u64 = 1_000_000;

/// Keys of a `hand` message that are not joint names.
const HAND_MESSAGE_KEYS: [&str; 5] = ["type", "id", "hand", "tracked", "confidence"];

/// Parse an s-expression message and dispatch to the appropriate handler.
/// Returns an optional response string (s-expression).
pub fn handle_message(state: &mut LocomotionState, raw: &str) -> Option<String> {
    let value = match lexpr::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("malformed s-expression: {}", e);
            return Some(error_response(0, &format!("malformed s-expression: {e}")));
        }
    };

    let msg_type = get_keyword(&value, "type");
    let msg_id = get_int(&value, "id").unwrap_or(0);
    debug!(msg_id, "dispatch {:?}", msg_type);

    match msg_type.as_deref() {
        Some("tick") => handle_tick(state, msg_id, &value),
        Some("run") => handle_run(state, msg_id, &value),
        Some("hand") => handle_hand(state, msg_id, &value),
        Some("touch") => handle_touch(state, msg_id, &value),
        Some("aim") => handle_aim(state, msg_id, &value),
        Some("head") => handle_head(state, msg_id, &value),
        Some("controller") => handle_controller(state, msg_id, &value),
        Some("reset") => {
            state.reset();
            Some(ok_response(msg_id))
        }
        Some("status") => handle_status(state, msg_id),
        Some("config") => handle_config(state, msg_id),
        Some(other) => Some(error_response(
            msg_id,
            &format!("unknown message type: {}", other),
        )),
        None => Some(error_response(msg_id, "missing :type")),
    }
}

fn handle_tick(state: &mut LocomotionState, msg_id: i64, value: &Value) -> Option<String> {
    let dt = match get_float(value, "dt") {
        Some(dt) if dt >= 0.0 => dt as f32,
        Some(_) => return Some(error_response(msg_id, ":dt must not be negative")),
        None => return Some(error_response(msg_id, "missing :dt")),
    };
    let report = state.tick(dt);
    let d = report.displacement();
    let strokes: Vec<&str> = report.strokes.iter().map(|s| s.as_str()).collect();
    Some(format!(
        "(:type :response :id {} :status :ok :frame {} :displacement (:x {:.4} :y {:.4} :z {:.4}) :strokes ({}))",
        msg_id,
        state.frame,
        d.x,
        d.y,
        d.z,
        strokes.join(" "),
    ))
}

/// Expand into fixed-rate ticks covering `:seconds` at `:hz` (default from
/// config).
fn handle_run(state: &mut LocomotionState, msg_id: i64, value: &Value) -> Option<String> {
    let seconds = match get_float(value, "seconds") {
        Some(s) if s >= 0.0 => s,
        _ => return Some(error_response(msg_id, "missing or negative :seconds")),
    };
    let hz = get_float(value, "hz").unwrap_or(state.config.tick_hz);
    if hz <= 0.0 {
        return Some(error_response(msg_id, ":hz must be positive"));
    }
    let ticks = (seconds * hz).round() as u64;
    if ticks > MAX_RUN_TICKS {
        return Some(error_response(msg_id, "run too long"));
    }

    let dt = (1.0 / hz) as f32;
    let mut strokes = 0usize;
    for _ in 0..ticks {
        strokes += state.tick(dt).strokes.len();
    }
    let p = state.rig.position;
    Some(format!(
        "(:type :response :id {} :status :ok :ticks {} :strokes {} :position (:x {:.4} :y {:.4} :z {:.4}))",
        msg_id, ticks, strokes, p.x, p.y, p.z,
    ))
}

/// Update one hand: `:tracked nil` drops it, otherwise every other key
/// names a joint (`:index-tip (x y z)`, `:palm (...)`).  The joints are
/// pushed as one frame, so smoothing applies; joints not named keep their
/// last pose.
fn handle_hand(state: &mut LocomotionState, msg_id: i64, value: &Value) -> Option<String> {
    let side = match get_string(value, "hand").as_deref().and_then(HandSide::parse) {
        Some(s) => s,
        None => return Some(error_response(msg_id, "missing :hand (left or right)")),
    };

    if get_bool(value, "tracked") == Some(false) {
        state.hands.set_tracked(side, false, 0.0);
        return Some(ok_response(msg_id));
    }

    let mut updates = Vec::new();
    for (key, val) in plist_pairs(value) {
        if HAND_MESSAGE_KEYS.iter().any(|k| *k == key) {
            continue;
        }
        let Some(joint) = HandJoint::parse(key) else {
            return Some(error_response(msg_id, &format!("unknown joint: {}", key)));
        };
        let Some(pos) = as_vec3(val) else {
            return Some(error_response(msg_id, &format!(":{} needs (x y z)", key)));
        };
        updates.push((joint, JointPose::at(pos)));
    }
    let confidence = get_float(value, "confidence").unwrap_or(1.0) as f32;
    let timestamp_ns = (state.clock_s * 1e9) as u64;
    state
        .hands
        .update_joints(side, &updates, timestamp_ns, confidence);

    Some(format!(
        "(:type :response :id {} :status :ok :hand :{} :joints {})",
        msg_id,
        side.as_str(),
        updates.len(),
    ))
}

fn handle_touch(state: &mut LocomotionState, msg_id: i64, value: &Value) -> Option<String> {
    let hand = match get_string(value, "hand") {
        Some(h) => h,
        None => return Some(error_response(msg_id, "missing :hand (left or right)")),
    };
    let side = match HandSide::parse(&hand) {
        Some(s) => s,
        None => {
            return Some(error_response(
                msg_id,
                &format!("unknown hand: {}", hand),
            ))
        }
    };
    let stroke = match get_float(value, "at") {
        Some(at) => state.notify_touch_at(side, at),
        None => state.notify_touch(side),
    };
    Some(format!(
        "(:type :response :id {} :status :ok :stroke {})",
        msg_id,
        stroke.map(|s| format!(":{}", s.as_str())).unwrap_or_else(|| "nil".to_string()),
    ))
}

fn handle_aim(state: &mut LocomotionState, msg_id: i64, value: &Value) -> Option<String> {
    if get_bool(value, "clear") == Some(true) {
        state.aim.primary = None;
        return Some(ok_response(msg_id));
    }
    let yaw = get_float(value, "yaw").unwrap_or(0.0) as f32;
    let pitch = get_float(value, "pitch").unwrap_or(0.0) as f32;
    state.aim.primary = Some(orientation_from_yaw_pitch(yaw, pitch));
    Some(ok_response(msg_id))
}

fn handle_head(state: &mut LocomotionState, msg_id: i64, value: &Value) -> Option<String> {
    let yaw = get_float(value, "yaw").unwrap_or(0.0) as f32;
    let pitch = get_float(value, "pitch").unwrap_or(0.0) as f32;
    state.aim.head = orientation_from_yaw_pitch(yaw, pitch);
    Some(ok_response(msg_id))
}

/// `:enabled` toggles routing through the controller; `:volume` switches
/// the dive-volume controller itself on or off.
fn handle_controller(state: &mut LocomotionState, msg_id: i64, value: &Value) -> Option<String> {
    let enabled = get_bool(value, "enabled");
    let volume = get_bool(value, "volume");
    if enabled.is_none() && volume.is_none() {
        return Some(error_response(msg_id, "missing :enabled or :volume"));
    }

    if let Some(on) = volume {
        match state.rig.controller_mut() {
            Some(cc) => cc.set_enabled(on),
            None => return Some(error_response(msg_id, "no dive volume configured")),
        }
    }
    if let Some(on) = enabled {
        state.rig.use_character_controller = on;
    }
    debug!(
        "Controller: toggle {}, in use {}",
        state.rig.use_character_controller,
        state.rig.uses_controller(),
    );
    Some(format!(
        "(:type :response :id {} :status :ok :controller {})",
        msg_id,
        t_or_nil(state.rig.uses_controller()),
    ))
}

fn handle_status(state: &mut LocomotionState, msg_id: i64) -> Option<String> {
    Some(format!(
        "(:type :response :id {} :status :ok :locomotion {} :hands {})",
        msg_id,
        state.status_sexp(),
        state.hands.status_sexp(),
    ))
}

fn handle_config(state: &mut LocomotionState, msg_id: i64) -> Option<String> {
    Some(format!(
        "(:type :response :id {} :status :ok :config {})",
        msg_id,
        state.config.config_sexp(),
    ))
}
