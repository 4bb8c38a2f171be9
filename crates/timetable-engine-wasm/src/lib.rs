//! WASM bindings for timetable-engine.
//!
//! Lets the scheduling UI run the same conflict detection, invigilator check,
//! and free-window computation in the browser before anything is saved. All
//! structured values cross the boundary as JSON strings.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p timetable-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir web/wasm/ \
//!   target/wasm32-unknown-unknown/release/timetable_engine_wasm.wasm
//! ```

use chrono::NaiveDate;
use serde::Serialize;
use timetable_engine::conflict::summarize;
use timetable_engine::slot::parse_time;
use timetable_engine::{
    detect_conflicts, faculty_conflicts, find_free_windows, Conflict, ExamSlot, Resource,
};
use wasm_bindgen::prelude::*;

/// Result of a full timetable check.
#[derive(Serialize)]
struct CheckReport<'a> {
    conflicts: &'a [Conflict],
    summary: String,
    publishable: bool,
}

// ---------------------------------------------------------------------------
// JSON-in, JSON-out implementations (plain `String` errors, testable natively)
// ---------------------------------------------------------------------------

fn parse_slots(json: &str) -> Result<Vec<ExamSlot>, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid slots JSON: {e}"))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {e}"))
}

fn detect_conflicts_json(slots_json: &str) -> Result<String, String> {
    let slots = parse_slots(slots_json)?;
    to_json(&detect_conflicts(&slots))
}

fn check_timetable_json(slots_json: &str, preview_limit: usize) -> Result<String, String> {
    let slots = parse_slots(slots_json)?;
    let conflicts = detect_conflicts(&slots);
    let report = CheckReport {
        conflicts: &conflicts,
        summary: summarize(&conflicts, preview_limit),
        publishable: !slots.is_empty() && conflicts.is_empty(),
    };
    to_json(&report)
}

fn check_invigilator_json(
    slots_json: &str,
    slot_id: &str,
    faculty_id: &str,
) -> Result<String, String> {
    let faculty_id = faculty_id.trim();
    if faculty_id.is_empty() {
        return Err("faculty_id must not be empty".to_string());
    }
    let slots = parse_slots(slots_json)?;
    let target = slots
        .iter()
        .find(|s| s.id == slot_id)
        .ok_or_else(|| format!("slot not found: {slot_id}"))?;
    to_json(&faculty_conflicts(target, &slots, faculty_id))
}

fn find_free_windows_json(
    slots_json: &str,
    kind: &str,
    id: &str,
    date: &str,
    day_start: &str,
    day_end: &str,
) -> Result<String, String> {
    let slots = parse_slots(slots_json)?;
    let resource = Resource::from_parts(kind, id)
        .ok_or_else(|| format!("Invalid resource '{kind}' / '{id}'"))?;
    let date: NaiveDate = date
        .trim()
        .parse()
        .map_err(|e| format!("Invalid date '{date}': {e}"))?;
    let day_start = parse_time(day_start)?;
    let day_end = parse_time(day_end)?;
    to_json(&find_free_windows(&slots, &resource, date, day_start, day_end))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Detect room, batch, and invigilator conflicts in a JSON array of slots.
///
/// Returns a JSON array of conflict objects with `type`, `slot1`, `slot2`,
/// `message`, and `overlap_minutes`.
#[wasm_bindgen(js_name = "detectConflicts")]
pub fn detect_conflicts_js(slots_json: &str) -> Result<String, JsValue> {
    detect_conflicts_json(slots_json).map_err(|e| JsValue::from_str(&e))
}

/// Conflicts plus a one-line summary quoting up to `preview_limit` messages.
#[wasm_bindgen(js_name = "checkTimetable")]
pub fn check_timetable(slots_json: &str, preview_limit: usize) -> Result<String, JsValue> {
    check_timetable_json(slots_json, preview_limit).map_err(|e| JsValue::from_str(&e))
}

/// Conflicts that assigning `faculty_id` to `slot_id` would create. An empty
/// array means the assignment is allowed.
#[wasm_bindgen(js_name = "checkInvigilator")]
pub fn check_invigilator(
    slots_json: &str,
    slot_id: &str,
    faculty_id: &str,
) -> Result<String, JsValue> {
    check_invigilator_json(slots_json, slot_id, faculty_id).map_err(|e| JsValue::from_str(&e))
}

/// Free windows of a room, batch, or faculty member on `date` between
/// `day_start` and `day_end` (`HH:MM`).
///
/// `kind` is `room`, `batch`, or `faculty`. Returns a JSON array of
/// `{start, end, duration_minutes}` objects.
#[wasm_bindgen(js_name = "findFreeWindows")]
pub fn find_free_windows_js(
    slots_json: &str,
    kind: &str,
    id: &str,
    date: &str,
    day_start: &str,
    day_end: &str,
) -> Result<String, JsValue> {
    find_free_windows_json(slots_json, kind, id, date, day_start, day_end)
        .map_err(|e| JsValue::from_str(&e))
}
