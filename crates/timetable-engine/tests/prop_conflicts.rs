//! Property-based tests for conflict detection using proptest.
//!
//! These tests verify invariants that should hold for *any* slot list, not just
//! the hand-picked cases in `conflict_tests.rs`.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveTime};
use proptest::prelude::*;
use timetable_engine::{detect_conflicts, ConflictType, ExamSlot, NewExamSlot};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..3).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap() + Duration::days(offset)
    })
}

/// Start in quarter hours between 08:00 and 16:45, length 15 minutes to 3 hours.
fn arb_window() -> impl Strategy<Value = (NaiveTime, NaiveTime)> {
    (32u32..68, 1u32..=12).prop_map(|(start_q, len_q)| {
        let start = NaiveTime::from_hms_opt(start_q / 4, (start_q % 4) * 15, 0).unwrap();
        (start, start + Duration::minutes(i64::from(len_q) * 15))
    })
}

fn arb_label(prefix: &'static str) -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        (0u8..3).prop_map(move |n| Some(format!("{prefix}{n}"))),
    ]
}

fn arb_invigilators() -> impl Strategy<Value = BTreeSet<String>> {
    proptest::collection::btree_set((0u8..4).prop_map(|n| format!("F{n}")), 0..3)
}

fn arb_slot(id: usize) -> impl Strategy<Value = ExamSlot> {
    (
        arb_date(),
        arb_window(),
        arb_label("R"),
        arb_label("B"),
        arb_invigilators(),
    )
        .prop_map(move |(date, (start, end), room, batch, invigilators)| {
            let mut slot =
                ExamSlot::from_new(format!("S{id}"), NewExamSlot::new("a", date, start, end));
            slot.room = room;
            slot.batch_section = batch;
            slot.invigilators = invigilators;
            slot
        })
}

fn arb_slots() -> impl Strategy<Value = Vec<ExamSlot>> {
    (0usize..8).prop_flat_map(|n| (0..n).map(arb_slot).collect::<Vec<_>>())
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn conflicts_only_join_same_day_overlapping_slots(slots in arb_slots()) {
        for c in detect_conflicts(&slots) {
            prop_assert_eq!(c.slot1.exam_date, c.slot2.exam_date);
            prop_assert!(c.slot1.starts_at() < c.slot2.ends_at());
            prop_assert!(c.slot2.starts_at() < c.slot1.ends_at());
            prop_assert!(c.overlap_minutes > 0);
        }
    }

    #[test]
    fn conflicts_name_a_genuinely_shared_resource(slots in arb_slots()) {
        for c in detect_conflicts(&slots) {
            match c.kind {
                ConflictType::Room => {
                    prop_assert!(c.slot1.room().is_some());
                    prop_assert_eq!(c.slot1.room(), c.slot2.room());
                }
                ConflictType::StudentBatch => {
                    prop_assert!(c.slot1.batch().is_some());
                    prop_assert_eq!(c.slot1.batch(), c.slot2.batch());
                }
                ConflictType::Faculty => {
                    prop_assert!(!c.shared_invigilators.is_empty());
                    for f in &c.shared_invigilators {
                        prop_assert!(c.slot1.has_invigilator(f) && c.slot2.has_invigilator(f));
                    }
                }
            }
        }
    }

    #[test]
    fn each_pair_yields_at_most_one_record_per_type(slots in arb_slots()) {
        let conflicts = detect_conflicts(&slots);
        let mut seen = BTreeSet::new();
        for c in &conflicts {
            let key = (c.slot1.id.clone(), c.slot2.id.clone(), c.kind.as_str());
            prop_assert!(seen.insert(key), "duplicate record for one pair and type");
        }
        let n = slots.len();
        prop_assert!(conflicts.len() <= 3 * n * n.saturating_sub(1) / 2);
    }

    #[test]
    fn input_order_does_not_change_the_result_set(slots in arb_slots()) {
        let forward = detect_conflicts(&slots);
        let mut reversed_input = slots.clone();
        reversed_input.reverse();
        let backward = detect_conflicts(&reversed_input);

        let normalize = |list: &[timetable_engine::Conflict]| {
            let mut keys: Vec<(String, String, &'static str)> = list
                .iter()
                .map(|c| {
                    let (a, b) = if c.slot1.id <= c.slot2.id {
                        (c.slot1.id.clone(), c.slot2.id.clone())
                    } else {
                        (c.slot2.id.clone(), c.slot1.id.clone())
                    };
                    (a, b, c.kind.as_str())
                })
                .collect();
            keys.sort();
            keys
        };

        prop_assert_eq!(normalize(&forward[..]), normalize(&backward[..]));
    }

    #[test]
    fn back_to_back_slots_never_conflict(
        date in arb_date(),
        (start, end) in arb_window(),
        extra in 1i64..=8,
    ) {
        let follow_end = end + Duration::minutes(extra * 15);
        let mut first = ExamSlot::from_new("first", NewExamSlot::new("a", date, start, end));
        let mut second = ExamSlot::from_new("second", NewExamSlot::new("a", date, end, follow_end));
        for s in [&mut first, &mut second] {
            s.room = Some("R1".into());
            s.batch_section = Some("CS-A".into());
            s.invigilators.insert("F1".into());
        }

        prop_assert!(detect_conflicts(&[first, second]).is_empty());
    }
}
