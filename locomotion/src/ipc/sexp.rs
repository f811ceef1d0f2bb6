//! Plist helpers over `lexpr` values, shared by command dispatch and config.

use glam::Vec3;
use lexpr::Value;

pub fn ok_response(id: i64) -> String {
    format!("(:type :response :id {} :status :ok)", id)
}

pub fn error_response(id: i64, reason: &str) -> String {
    format!(
        "(:type :response :id {} :status :error :reason \"{}\")",
        id,
        escape_string(reason)
    )
}

/// Escape a string for s-expression output.
pub fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Key name of a plist key cell, without its colon.
fn key_name(cell: &Value) -> Option<&str> {
    match cell {
        Value::Keyword(k) => Some(&**k),
        Value::Symbol(s) => s.strip_prefix(':'),
        _ => None,
    }
}

/// Walk a plist as (key, value) pairs.  Stops at the first cell that is not
/// a key or has no value after it.
pub fn plist_pairs(value: &Value) -> Vec<(&str, &Value)> {
    let mut pairs = Vec::new();
    let mut current = value;
    while let Value::Cons(pair) = current {
        let Some(key) = key_name(pair.car()) else {
            break;
        };
        let Value::Cons(rest) = pair.cdr() else {
            break;
        };
        pairs.push((key, rest.car()));
        current = rest.cdr();
    }
    pairs
}

/// Find the value following `:key` in a plist.
/// Handles both `Value::Keyword("key")` (elisp parser) and
/// `Value::Symbol(":key")` (default parser) forms.  Values are stepped
/// over, so `(:type :hand :hand left)` finds `left` for `hand`.
pub fn find_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    plist_pairs(value)
        .into_iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Extract a plist value rendered as a string; keywords lose their colon.
pub fn get_keyword(value: &Value, key: &str) -> Option<String> {
    let val = find_value(value, key)?;
    Some(match val {
        Value::Keyword(v) => v.to_string(),
        Value::Symbol(v) => {
            let s: &str = v;
            s.strip_prefix(':').unwrap_or(s).to_string()
        }
        Value::String(v) => v.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => t_or_nil(*b).to_string(),
        Value::Null | Value::Nil => "nil".to_string(),
        _ => val.to_string(),
    })
}

pub fn get_int(value: &Value, key: &str) -> Option<i64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

pub fn get_string(value: &Value, key: &str) -> Option<String> {
    get_keyword(value, key)
}

/// Treats anything but "nil" as true.
pub fn get_bool(value: &Value, key: &str) -> Option<bool> {
    get_keyword(value, key).map(|s| s != "nil")
}

pub fn get_float(value: &Value, key: &str) -> Option<f64> {
    match find_value(value, key)? {
        Value::Number(n) => n.as_f64(),
        _ => get_keyword(value, key).and_then(|s| s.parse().ok()),
    }
}

/// Extract a `(x y z)` list as a vector.
pub fn get_vec3(value: &Value, key: &str) -> Option<Vec3> {
    as_vec3(find_value(value, key)?)
}

/// Read a `(x y z)` list value.
pub fn as_vec3(value: &Value) -> Option<Vec3> {
    let nums: Vec<f32> = flatten_list(value)
        .into_iter()
        .filter_map(|v| v.as_f64())
        .map(|f| f as f32)
        .collect();
    match nums.as_slice() {
        [x, y, z] => Some(Vec3::new(*x, *y, *z)),
        _ => None,
    }
}

/// Flatten a possibly nested list/cons structure into its leaf values.
pub fn flatten_list(value: &Value) -> Vec<&Value> {
    let mut result = Vec::new();
    fn walk<'a>(v: &'a Value, out: &mut Vec<&'a Value>) {
        match v {
            Value::Cons(pair) => {
                walk(pair.car(), out);
                walk(pair.cdr(), out);
            }
            Value::Null => {}
            other => out.push(other),
        }
    }
    walk(value, &mut result);
    result
}

/// Format a bool the elisp way.
pub fn t_or_nil(b: bool) -> &'static str {
    if b {
        "t"
    } else {
        "nil"
    }
}
