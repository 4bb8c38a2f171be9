//! Tests for free window computation per room, batch, and invigilator.

use chrono::{NaiveDate, NaiveTime};
use timetable_engine::freebusy::busy_intervals;
use timetable_engine::{find_first_free_window, find_free_windows, ExamSlot, NewExamSlot, Resource};

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap()
}

fn room_slot(id: &str, day: &str, start: &str, end: &str, room: &str) -> ExamSlot {
    ExamSlot::from_new(
        id,
        NewExamSlot::new("mid-2025", date(day), time(start), time(end)).with_room(room),
    )
}

fn spans(slots: &[ExamSlot], resource: &Resource) -> Vec<(String, String, i64)> {
    find_free_windows(slots, resource, date("2025-06-10"), time("08:00"), time("17:00"))
        .into_iter()
        .map(|w| {
            (
                w.start.format("%H:%M").to_string(),
                w.end.format("%H:%M").to_string(),
                w.duration_minutes,
            )
        })
        .collect()
}

fn span(start: &str, end: &str, minutes: i64) -> (String, String, i64) {
    (start.to_string(), end.to_string(), minutes)
}

#[test]
fn single_exam_splits_the_day_in_two() {
    // Window 08:00-17:00, exam 10:00-11:00
    let slots = vec![room_slot("A", "2025-06-10", "10:00", "11:00", "R1")];

    assert_eq!(
        spans(&slots, &Resource::Room("R1".into())),
        vec![span("08:00", "10:00", 120), span("11:00", "17:00", 360)]
    );
}

#[test]
fn overlapping_exams_are_merged() {
    let slots = vec![
        room_slot("A", "2025-06-10", "10:00", "11:30", "R1"),
        room_slot("B", "2025-06-10", "11:00", "12:00", "R1"),
    ];

    assert_eq!(
        spans(&slots, &Resource::Room("R1".into())),
        vec![span("08:00", "10:00", 120), span("12:00", "17:00", 300)]
    );
}

#[test]
fn back_to_back_exams_leave_no_gap() {
    let slots = vec![
        room_slot("A", "2025-06-10", "09:00", "11:00", "R1"),
        room_slot("B", "2025-06-10", "11:00", "13:00", "R1"),
    ];

    let busy = busy_intervals(
        &slots,
        &Resource::Room("R1".into()),
        date("2025-06-10"),
        time("08:00"),
        time("17:00"),
    );
    assert_eq!(busy, vec![(time("09:00"), time("13:00"))]);
}

#[test]
fn other_rooms_and_days_are_ignored() {
    let slots = vec![
        room_slot("A", "2025-06-10", "09:00", "11:00", "R2"),
        room_slot("B", "2025-06-11", "09:00", "11:00", "R1"),
    ];

    assert_eq!(
        spans(&slots, &Resource::Room("R1".into())),
        vec![span("08:00", "17:00", 540)]
    );
}

#[test]
fn exams_crossing_the_window_edges_are_clipped() {
    let slots = vec![
        room_slot("A", "2025-06-10", "07:00", "09:00", "R1"),
        room_slot("B", "2025-06-10", "16:00", "18:30", "R1"),
    ];

    assert_eq!(
        spans(&slots, &Resource::Room("R1".into())),
        vec![span("09:00", "16:00", 420)]
    );
}

#[test]
fn fully_booked_day_has_no_free_window() {
    let slots = vec![room_slot("A", "2025-06-10", "08:00", "17:00", "R1")];
    assert!(spans(&slots, &Resource::Room("R1".into())).is_empty());
}

#[test]
fn batch_and_faculty_resources_follow_their_own_slots() {
    let mut a = room_slot("A", "2025-06-10", "09:00", "10:00", "R1");
    a.batch_section = Some("CS-A".into());
    let mut b = room_slot("B", "2025-06-10", "13:00", "15:00", "R2");
    b.invigilators.insert("F7".into());
    let slots = vec![a, b];

    assert_eq!(
        spans(&slots, &Resource::Batch("CS-A".into())),
        vec![span("08:00", "09:00", 60), span("10:00", "17:00", 420)]
    );
    assert_eq!(
        spans(&slots, &Resource::Faculty("F7".into())),
        vec![span("08:00", "13:00", 300), span("15:00", "17:00", 120)]
    );
}

#[test]
fn inverted_window_yields_nothing() {
    let free = find_free_windows(
        &[],
        &Resource::Room("R1".into()),
        date("2025-06-10"),
        time("17:00"),
        time("08:00"),
    );
    assert!(free.is_empty());
}

#[test]
fn first_window_respects_minimum_duration() {
    let slots = vec![
        room_slot("A", "2025-06-10", "08:30", "10:00", "R1"),
        room_slot("B", "2025-06-10", "11:00", "14:00", "R1"),
    ];

    let found = find_first_free_window(
        &slots,
        &Resource::Room("R1".into()),
        date("2025-06-10"),
        time("08:00"),
        time("17:00"),
        90,
    )
    .unwrap();
    assert_eq!(found.start, time("14:00"));
    assert_eq!(found.duration_minutes, 180);

    let none = find_first_free_window(
        &slots,
        &Resource::Room("R1".into()),
        date("2025-06-10"),
        time("08:00"),
        time("17:00"),
        240,
    );
    assert!(none.is_none());
}

#[test]
fn resource_parses_kind_names() {
    assert_eq!(Resource::from_parts("Room", " R1 "), Some(Resource::Room("R1".into())));
    assert_eq!(
        Resource::from_parts("invigilator", "F1"),
        Some(Resource::Faculty("F1".into()))
    );
    assert_eq!(Resource::from_parts("batch", "  "), None);
    assert_eq!(Resource::from_parts("lab", "L1"), None);
}
