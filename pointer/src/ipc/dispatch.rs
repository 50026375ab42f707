//! Control message dispatch — parse s-expressions and route to handlers.

use crate::geometry::{Rect, Viewport};
use crate::hand::mapper::SmoothingMode;
use crate::headless::HeadlessSession;
use crate::layout::PanelId;
use crate::ui::ElementKind;
use lexpr::Value;
use tracing::{debug, warn};

/// Parse an s-expression message and dispatch to the appropriate handler.
/// Returns an optional response string (s-expression).
pub fn handle_message(session: &mut HeadlessSession, raw: &str) -> Option<String> {
    let value = match lexpr::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("malformed s-expression: {}", e);
            return Some(error_response(0, &format!("malformed s-expression: {e}")));
        }
    };

    let msg_type = get_keyword(&value, "type");
    let msg_id = get_int(&value, "id").unwrap_or(0);

    match msg_type.as_deref() {
        Some("frame") => handle_frame(session, msg_id, &value),
        Some("set-sensitivity") => handle_set_sensitivity(session, msg_id, &value),
        Some("layout-edit") => handle_layout_edit(session, msg_id, &value),
        Some("set-smoothing") => handle_set_smoothing(session, msg_id, &value),
        Some("resize") => handle_resize(session, msg_id, &value),
        Some("stop-tracking") => handle_stop_tracking(session, msg_id),
        Some("element-add") => handle_element_add(session, msg_id, &value),
        Some("element-remove") => handle_element_remove(session, msg_id, &value),
        Some("status") => handle_status(session, msg_id),
        Some("layout") => handle_layout(session, msg_id),
        Some(other) => {
            debug!("unknown message type: {}", other);
            Some(error_response(msg_id, &format!("unknown message type: {other}")))
        }
        None => Some(error_response(msg_id, "missing :type")),
    }
}

// ── Frame ──────────────────────────────────────────────────

/// `(:type :frame :id N :dt-ms 16 :landmarks (x0 y0 x1 y1 ...))`
///
/// `:landmarks nil` (or absent) means no hand this frame. A list with the
/// wrong number of coordinates is dropped and also treated as no hand.
fn handle_frame(session: &mut HeadlessSession, msg_id: i64, value: &Value) -> Option<String> {
    let dt_ms = match (get_value(value, "dt-ms"), get_float(value, "dt-ms")) {
        (None, _) => 0.0,
        (Some(_), Some(dt)) if dt >= 0.0 => dt,
        (Some(_), _) => {
            return Some(error_response(msg_id, ":dt-ms must be a non-negative number"));
        }
    };

    let landmarks = match get_value(value, "landmarks") {
        None => None,
        Some(v) if is_nil(v) => None,
        Some(v) => {
            let leaves = flatten_list(v);
            let mut flat = Vec::with_capacity(leaves.len());
            for leaf in leaves {
                match leaf.as_f64().map(|n| n as f32).filter(|n| n.is_finite()) {
                    Some(n) => flat.push(n),
                    None => {
                        return Some(error_response(msg_id, "non-numeric :landmarks entry"));
                    }
                }
            }
            session.decode_landmarks(&flat)
        }
    };

    session.frame(landmarks.as_ref(), dt_ms);

    let cursor = session.engine.adjusted_point();
    Some(format!(
        "(:type :response :id {} :status :ok :x {:.1} :y {:.1} :tracking {})",
        msg_id,
        cursor.x,
        cursor.y,
        if landmarks.is_some() { "t" } else { "nil" }
    ))
}

// ── Settings ───────────────────────────────────────────────

fn handle_set_sensitivity(
    session: &mut HeadlessSession,
    msg_id: i64,
    value: &Value,
) -> Option<String> {
    let sensitivity = match get_f32(value, "value") {
        Some(v) => v,
        None => return Some(error_response(msg_id, "missing :value")),
    };
    session.set_sensitivity(sensitivity);
    Some(ok_response(msg_id))
}

fn handle_layout_edit(session: &mut HeadlessSession, msg_id: i64, value: &Value) -> Option<String> {
    let enabled = match get_bool(value, "enable") {
        Some(b) => b,
        None => return Some(error_response(msg_id, "missing :enable")),
    };
    session.set_layout_edit(enabled);
    Some(ok_response(msg_id))
}

/// `(:type :set-smoothing :mode :per-frame :factor 0.2)` or
/// `(:type :set-smoothing :mode :time-scaled :tau-ms 50)`.
fn handle_set_smoothing(
    session: &mut HeadlessSession,
    msg_id: i64,
    value: &Value,
) -> Option<String> {
    let mode = match get_keyword(value, "mode").as_deref() {
        Some("per-frame") => {
            let factor = get_f32(value, "factor").unwrap_or(0.2);
            if !(0.0..=1.0).contains(&factor) {
                return Some(error_response(msg_id, ":factor must be within [0, 1]"));
            }
            SmoothingMode::PerFrame { factor }
        }
        Some("time-scaled") => match get_float(value, "tau-ms") {
            Some(tau_ms) if tau_ms > 0.0 => SmoothingMode::TimeScaled { tau_ms },
            _ => return Some(error_response(msg_id, "time-scaled requires positive :tau-ms")),
        },
        Some(other) => {
            return Some(error_response(
                msg_id,
                &format!("unknown smoothing mode: {other}"),
            ))
        }
        None => return Some(error_response(msg_id, "missing :mode")),
    };
    session.set_smoothing(mode);
    Some(ok_response(msg_id))
}

fn handle_resize(session: &mut HeadlessSession, msg_id: i64, value: &Value) -> Option<String> {
    let width = get_f32(value, "width").unwrap_or(0.0);
    let height = get_f32(value, "height").unwrap_or(0.0);
    if width <= 0.0 || height <= 0.0 {
        return Some(error_response(msg_id, "resize requires positive :width and :height"));
    }
    session.resize(Viewport::new(width, height));
    Some(ok_response(msg_id))
}

fn handle_stop_tracking(session: &mut HeadlessSession, msg_id: i64) -> Option<String> {
    session.stop_tracking();
    Some(ok_response(msg_id))
}

// ── UI tree ────────────────────────────────────────────────

/// `(:type :element-add :id N :element 5 :kind :button :x 0 :y 0 :w 80 :h 40
///   :parent 1 :panel :chat)`. `:panel` makes the element a drag handle.
fn handle_element_add(session: &mut HeadlessSession, msg_id: i64, value: &Value) -> Option<String> {
    let element = match get_int(value, "element") {
        Some(id) if id >= 0 => id as u64,
        _ => return Some(error_response(msg_id, "missing :element")),
    };
    let mut coords = [0.0f32; 4];
    for (slot, key) in coords.iter_mut().zip(["x", "y", "w", "h"]) {
        match (get_value(value, key), get_f32(value, key)) {
            (None, _) => {}
            (Some(_), Some(v)) => *slot = v,
            (Some(_), None) => {
                return Some(error_response(msg_id, &format!("invalid :{key}")));
            }
        }
    }
    let [x, y, w, h] = coords;
    let bounds = Rect::new(x, y, w, h);

    if let Some(panel_name) = get_keyword(value, "panel") {
        let panel = match PanelId::from_str(&panel_name) {
            Some(p) => p,
            None => {
                return Some(error_response(
                    msg_id,
                    &format!("unknown panel: {panel_name}"),
                ))
            }
        };
        session.ui.add_panel_handle(element, panel, bounds);
        return Some(ok_response(msg_id));
    }

    let kind_name = get_keyword(value, "kind").unwrap_or_else(|| "static".to_string());
    let kind = match ElementKind::from_str(&kind_name) {
        Some(k) => k,
        None => {
            return Some(error_response(
                msg_id,
                &format!("unknown element kind: {kind_name}"),
            ))
        }
    };
    let parent = match (get_value(value, "parent"), get_int(value, "parent")) {
        (None, _) => None,
        (Some(_), Some(p)) if p >= 0 => Some(p as u64),
        (Some(v), _) if is_nil(v) => None,
        (Some(_), _) => return Some(error_response(msg_id, "invalid :parent")),
    };
    session.ui.add(element, kind, bounds, parent);
    Some(ok_response(msg_id))
}

fn handle_element_remove(
    session: &mut HeadlessSession,
    msg_id: i64,
    value: &Value,
) -> Option<String> {
    let element = match get_int(value, "element") {
        Some(id) if id >= 0 => id as u64,
        _ => return Some(error_response(msg_id, "missing :element")),
    };
    if !session.ui.remove(element) {
        return Some(error_response(msg_id, &format!("unknown element: {element}")));
    }
    Some(ok_response(msg_id))
}

// ── Queries ────────────────────────────────────────────────

fn handle_status(session: &mut HeadlessSession, msg_id: i64) -> Option<String> {
    let viewport = session.viewport();
    Some(format!(
        "(:type :response :id {} :status :ok :viewport (:width {:.0} :height {:.0}) :layout-edit {} :elements {} :engine {})",
        msg_id,
        viewport.width,
        viewport.height,
        if session.layout_edit() { "t" } else { "nil" },
        session.ui.len(),
        session.engine.status_sexp()
    ))
}

fn handle_layout(session: &mut HeadlessSession, msg_id: i64) -> Option<String> {
    Some(format!(
        "(:type :response :id {} :status :ok :panels {})",
        msg_id,
        session.engine.layout().status_sexp()
    ))
}

// ── Helpers ────────────────────────────────────────────────

fn ok_response(id: i64) -> String {
    format!("(:type :response :id {} :status :ok)", id)
}

fn error_response(id: i64, reason: &str) -> String {
    format!(
        "(:type :response :id {} :status :error :reason \"{}\")",
        id,
        escape_string(reason)
    )
}

/// Escape a string for s-expression output.
fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Find the raw value following `:key` in an s-expression plist.
/// Handles both `Value::Keyword("key")` (elisp parser) and
/// `Value::Symbol(":key")` (default parser) forms.
fn get_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        if is_key {
            return match pair.cdr() {
                Value::Cons(next) => Some(next.car()),
                _ => None,
            };
        }
        current = pair.cdr();
    }
    None
}

/// Extract a keyword value from an s-expression plist as a string.
fn get_keyword(value: &Value, key: &str) -> Option<String> {
    let val = get_value(value, key)?;
    Some(match val {
        Value::Keyword(v) => v.to_string(),
        Value::Symbol(v) => {
            let s = v.to_string();
            s.strip_prefix(':').unwrap_or(&s).to_string()
        }
        Value::String(v) => v.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => if *b { "t" } else { "nil" }.to_string(),
        Value::Null | Value::Nil => "nil".to_string(),
        _ => val.to_string(),
    })
}

/// Extract an integer value from an s-expression plist.
fn get_int(value: &Value, key: &str) -> Option<i64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

/// Extract a boolean value from an s-expression plist.
/// Treats "t" as true, "nil" as false.
fn get_bool(value: &Value, key: &str) -> Option<bool> {
    get_keyword(value, key).map(|s| s != "nil")
}

/// Extract a finite floating-point value from an s-expression plist.
/// `nan` and `inf` parse as floats but are rejected.
fn get_float(value: &Value, key: &str) -> Option<f64> {
    get_keyword(value, key)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// [`get_float`] narrowed to `f32`; values that overflow are rejected.
fn get_f32(value: &Value, key: &str) -> Option<f32> {
    get_float(value, key)
        .map(|v| v as f32)
        .filter(|v| v.is_finite())
}

/// `nil`, `()` or `#f`.
fn is_nil(value: &Value) -> bool {
    match value {
        Value::Null | Value::Nil => true,
        Value::Bool(b) => !b,
        Value::Symbol(s) => s.as_ref() == "nil",
        _ => false,
    }
}

/// Flatten a possibly nested list/cons structure into a Vec of leaf values.
fn flatten_list(value: &Value) -> Vec<&Value> {
    let mut result = Vec::new();
    fn walk<'a>(v: &'a Value, out: &mut Vec<&'a Value>) {
        match v {
            Value::Cons(pair) => {
                walk(pair.car(), out);
                walk(pair.cdr(), out);
            }
            Value::Vector(items) => {
                for item in items.iter() {
                    walk(item, out);
                }
            }
            Value::Null => {} // end of list
            other => out.push(other),
        }
    }
    walk(value, &mut result);
    result
}

/// Format an IPC event s-expression.
pub fn format_event(event_type: &str, fields: &[(&str, &str)]) -> String {
    let mut s = format!("(:type :event :event :{}", event_type);
    for (key, val) in fields {
        s.push_str(&format!(" :{} {}", key, val));
    }
    s.push(')');
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::headless::HeadlessConfig;
    use crate::hand::landmarks::make_open_hand;

    fn make_session() -> HeadlessSession {
        let mut config = HeadlessConfig::default();
        config.viewport = Viewport::new(1000.0, 1000.0);
        config.sensitivity = 1.0;
        HeadlessSession::new(config)
    }

    /// A frame message carrying the open test hand.
    fn open_hand_message(id: i64) -> String {
        let frame = make_open_hand();
        let coords: Vec<String> = frame
            .points()
            .iter()
            .flat_map(|p| [p.x.to_string(), p.y.to_string()])
            .collect();
        format!(
            "(:type :frame :id {} :dt-ms 16 :landmarks ({}))",
            id,
            coords.join(" ")
        )
    }

    // ── ok_response / error_response ────────────────────────

    #[test]
    fn test_ok_response_format() {
        let r = ok_response(42);
        assert!(r.contains(":type :response"));
        assert!(r.contains(":id 42"));
        assert!(r.contains(":status :ok"));
    }

    #[test]
    fn test_error_response_escapes_quotes() {
        let r = error_response(1, "say \"hello\"");
        assert!(r.contains("say \\\"hello\\\""));
    }

    #[test]
    fn test_escape_string_backslash() {
        assert_eq!(escape_string("a\\b"), "a\\\\b");
    }

    // ── get_keyword / get_value ─────────────────────────────

    #[test]
    fn test_get_keyword_from_plist() {
        let v = lexpr::from_str("(:type :frame :dt-ms 16)").unwrap();
        assert_eq!(get_keyword(&v, "type"), Some("frame".to_string()));
        assert_eq!(get_keyword(&v, "dt-ms"), Some("16".to_string()));
        assert_eq!(get_keyword(&v, "missing"), None);
    }

    #[test]
    fn test_get_value_returns_list() {
        let v = lexpr::from_str("(:type :frame :landmarks (0.5 0.25))").unwrap();
        let list = get_value(&v, "landmarks").unwrap();
        let leaves: Vec<f64> = flatten_list(list)
            .iter()
            .filter_map(|l| l.as_f64())
            .collect();
        assert_eq!(leaves, vec![0.5, 0.25]);
    }

    #[test]
    fn test_get_bool_nil() {
        let v = lexpr::from_str("(:enable nil)").unwrap();
        assert_eq!(get_bool(&v, "enable"), Some(false));
        let v = lexpr::from_str("(:enable t)").unwrap();
        assert_eq!(get_bool(&v, "enable"), Some(true));
    }

    #[test]
    fn test_get_float_integer() {
        let v = lexpr::from_str("(:value 3)").unwrap();
        assert_eq!(get_float(&v, "value"), Some(3.0));
    }

    #[test]
    fn test_get_float_rejects_non_finite() {
        let v = lexpr::from_str("(:a nan :b inf :c -inf :d 2.5)").unwrap();
        assert_eq!(get_float(&v, "a"), None);
        assert_eq!(get_float(&v, "b"), None);
        assert_eq!(get_float(&v, "c"), None);
        assert_eq!(get_float(&v, "d"), Some(2.5));

        let v = lexpr::from_str("(:big 1e300)").unwrap();
        assert!(get_float(&v, "big").is_some());
        assert_eq!(get_f32(&v, "big"), None);
    }

    #[test]
    fn test_flatten_nested_pairs() {
        let v = lexpr::from_str("((1 2) (3 4))").unwrap();
        assert_eq!(flatten_list(&v).len(), 4);
    }

    #[test]
    fn test_format_event_is_valid_sexp() {
        let e = format_event("pointer", &[("x", "1.0"), ("pinched", "nil")]);
        assert_eq!(e, "(:type :event :event :pointer :x 1.0 :pinched nil)");
        assert!(lexpr::from_str(&e).is_ok());
    }

    // ── handle_message ──────────────────────────────────────

    #[test]
    fn test_malformed_message() {
        let mut session = make_session();
        let r = handle_message(&mut session, "(:type :frame").unwrap();
        assert!(r.contains(":status :error"));
    }

    #[test]
    fn test_unknown_type() {
        let mut session = make_session();
        let r = handle_message(&mut session, "(:type :teleport :id 9)").unwrap();
        assert!(r.contains(":id 9"));
        assert!(r.contains("unknown message type: teleport"));
    }

    #[test]
    fn test_frame_with_landmarks() {
        let mut session = make_session();
        let r = handle_message(&mut session, &open_hand_message(1)).unwrap();
        assert!(r.starts_with("(:type :response :id 1 :status :ok"));
        assert!(r.contains(":tracking t"));
        assert!(session.engine.is_tracking());
        let events = session.drain_events();
        assert!(events.iter().any(|e| e.contains(":tracking-resumed")));
    }

    #[test]
    fn test_frame_nil_landmarks() {
        let mut session = make_session();
        let r = handle_message(&mut session, "(:type :frame :id 2 :dt-ms 16 :landmarks nil)")
            .unwrap();
        assert!(r.contains(":tracking nil"));
        assert!(!session.engine.is_tracking());
    }

    #[test]
    fn test_frame_wrong_landmark_count_is_no_hand() {
        let mut session = make_session();
        let r = handle_message(&mut session, "(:type :frame :id 3 :dt-ms 16 :landmarks (0.5 0.5))")
            .unwrap();
        assert!(r.contains(":status :ok"));
        assert!(r.contains(":tracking nil"));
    }

    #[test]
    fn test_frame_negative_dt_rejected() {
        let mut session = make_session();
        let r = handle_message(&mut session, "(:type :frame :id 4 :dt-ms -5)").unwrap();
        assert!(r.contains(":status :error"));
    }

    #[test]
    fn test_frame_nan_dt_rejected() {
        let mut session = make_session();
        session.set_smoothing(SmoothingMode::TimeScaled { tau_ms: 50.0 });
        let msg = open_hand_message(4).replace(":dt-ms 16", ":dt-ms nan");
        let r = handle_message(&mut session, &msg).unwrap();
        assert!(r.contains(":status :error"));

        for id in 0..5 {
            let r = handle_message(&mut session, &open_hand_message(id)).unwrap();
            assert!(!r.contains("NaN"), "{}", r);
        }
        let c = session.engine.cursor().smoothed;
        assert!(c.x.is_finite() && c.y.is_finite());
    }

    #[test]
    fn test_set_sensitivity_rejects_nan() {
        let mut session = make_session();
        let r = handle_message(&mut session, "(:type :set-sensitivity :id 5 :value nan)").unwrap();
        assert!(r.contains(":status :error"));
        assert_eq!(session.sensitivity(), 1.0);
    }

    #[test]
    fn test_set_sensitivity() {
        let mut session = make_session();
        let r = handle_message(&mut session, "(:type :set-sensitivity :id 5 :value 3.5)").unwrap();
        assert!(r.contains(":status :ok"));
        assert_eq!(session.sensitivity(), 3.5);

        let r = handle_message(&mut session, "(:type :set-sensitivity :id 6)").unwrap();
        assert!(r.contains("missing :value"));
    }

    #[test]
    fn test_layout_edit_toggle() {
        let mut session = make_session();
        handle_message(&mut session, "(:type :layout-edit :id 7 :enable t)");
        assert!(session.layout_edit());
        handle_message(&mut session, "(:type :layout-edit :id 8 :enable nil)");
        assert!(!session.layout_edit());
    }

    #[test]
    fn test_set_smoothing() {
        let mut session = make_session();
        let r = handle_message(
            &mut session,
            "(:type :set-smoothing :id 9 :mode :time-scaled :tau-ms 50)",
        )
        .unwrap();
        assert!(r.contains(":status :ok"));
        assert_eq!(
            session.engine.smoothing(),
            SmoothingMode::TimeScaled { tau_ms: 50.0 }
        );

        let r = handle_message(&mut session, "(:type :set-smoothing :id 10 :mode :time-scaled)")
            .unwrap();
        assert!(r.contains(":status :error"));
    }

    #[test]
    fn test_resize() {
        let mut session = make_session();
        let r = handle_message(&mut session, "(:type :resize :id 11 :width 800 :height 600)")
            .unwrap();
        assert!(r.contains(":status :ok"));
        assert_eq!(session.viewport(), Viewport::new(800.0, 600.0));

        let r = handle_message(&mut session, "(:type :resize :id 12 :width 0 :height 600)")
            .unwrap();
        assert!(r.contains(":status :error"));

        for bad in ["nan", "inf"] {
            let msg = format!("(:type :resize :id 13 :width {} :height 600)", bad);
            let r = handle_message(&mut session, &msg).unwrap();
            assert!(r.contains(":status :error"), "{}", r);
        }
        assert_eq!(session.viewport(), Viewport::new(800.0, 600.0));
    }

    #[test]
    fn test_element_add_and_remove() {
        let mut session = make_session();
        let r = handle_message(
            &mut session,
            "(:type :element-add :id 13 :element 5 :kind :button :x 10 :y 20 :w 80 :h 40)",
        )
        .unwrap();
        assert!(r.contains(":status :ok"));
        let el = session.ui.get(5).unwrap();
        assert_eq!(el.kind, ElementKind::Button);
        assert_eq!(el.bounds.center(), Point::new(50.0, 40.0));

        let r = handle_message(
            &mut session,
            "(:type :element-add :id 14 :element 6 :panel :cad :x 0 :y 0 :w 100 :h 20)",
        )
        .unwrap();
        assert!(r.contains(":status :ok"));
        assert_eq!(session.ui.draggable_regions()[0].panel, PanelId::Cad);

        let r = handle_message(&mut session, "(:type :element-add :id 15 :element 7 :kind :canvas)")
            .unwrap();
        assert!(r.contains("unknown element kind: canvas"));

        let r = handle_message(
            &mut session,
            "(:type :element-add :id 18 :element 8 :kind :button :parent -1)",
        )
        .unwrap();
        assert!(r.contains("invalid :parent"));
        let r = handle_message(&mut session, "(:type :element-add :id 19 :element 8 :kind :button :w nan)")
            .unwrap();
        assert!(r.contains("invalid :w"));
        assert!(session.ui.get(8).is_none());

        let r = handle_message(&mut session, "(:type :element-remove :id 16 :element 5)").unwrap();
        assert!(r.contains(":status :ok"));
        let r = handle_message(&mut session, "(:type :element-remove :id 17 :element 5)").unwrap();
        assert!(r.contains("unknown element: 5"));
    }

    #[test]
    fn test_stop_tracking_emits_events() {
        let mut session = make_session();
        handle_message(&mut session, &open_hand_message(18));
        session.drain_events();
        let r = handle_message(&mut session, "(:type :stop-tracking :id 19)").unwrap();
        assert!(r.contains(":status :ok"));
        let events = session.drain_events();
        assert!(events.iter().any(|e| e.contains(":tracking-lost")));
        assert!(!session.engine.is_tracking());
    }

    #[test]
    fn test_status_and_layout_queries() {
        let mut session = make_session();
        let r = handle_message(&mut session, "(:type :status :id 20)").unwrap();
        assert!(r.contains(":viewport (:width 1000 :height 1000)"));
        assert!(r.contains(":engine (:tracking nil"));
        assert!(lexpr::from_str(&r).is_ok());

        let r = handle_message(&mut session, "(:type :layout :id 21)").unwrap();
        assert!(r.contains(":panels ((:panel :video"));
        assert!(lexpr::from_str(&r).is_ok());
    }
}
