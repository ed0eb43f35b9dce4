use super::*;
use shared::domain::{EventId, SubGroup};

fn event(class_id: &str, day: &str, start: &str, sub_groups: Option<&[&str]>) -> ScheduleEvent {
    ScheduleEvent {
        id: EventId::generate(),
        class_id: class_id.to_string(),
        kind: None,
        day: day.to_string(),
        group: "ИТ24-11".to_string(),
        topic: format!("topic-{class_id}"),
        start: start.to_string(),
        end: "23:59".to_string(),
        room: "101".to_string(),
        color: String::new(),
        title: String::new(),
        sub_groups: sub_groups.map(|ids| {
            ids.iter()
                .map(|id| SubGroup {
                    class_id: class_id.to_string(),
                    subgroup_id: id.to_string(),
                    category_id: "1".to_string(),
                    topic: String::new(),
                    title: id.to_string(),
                })
                .collect()
        }),
    }
}

fn class_ids(schedule: &DaySchedule) -> Vec<String> {
    schedule
        .days()
        .iter()
        .flat_map(|group| group.events.iter().map(|e| e.class_id.clone()))
        .collect()
}

#[test]
fn groups_by_day_in_ascending_order() {
    let response = ScheduleResponse {
        events: vec![
            event("b", "2025-09-22", "10:00", None),
            event("c", "2025-09-21", "12:00", None),
            event("a", "2025-09-22", "08:00", None),
        ],
    };

    let schedule = reconcile(response, "*");
    assert_eq!(schedule.sorted_days(), vec!["2025-09-21", "2025-09-22"]);
    let starts: Vec<&str> = schedule
        .events_for("2025-09-22")
        .expect("day")
        .iter()
        .map(|e| e.start.as_str())
        .collect();
    assert_eq!(starts, vec!["08:00", "10:00"]);
    assert_eq!(schedule.event_count(), 3);
}

#[test]
fn equal_keys_keep_response_order() {
    let response = ScheduleResponse {
        events: vec![
            event("first", "2025-09-22", "08:00", None),
            event("early", "2025-09-22", "07:00", None),
            event("second", "2025-09-22", "08:00", None),
            event("third", "2025-09-22", "08:00", None),
        ],
    };

    let schedule = reconcile(response, "*");
    assert_eq!(class_ids(&schedule), vec!["early", "first", "second", "third"]);
}

#[test]
fn unrestricted_events_survive_any_subgroup_filter() {
    let response = ScheduleResponse {
        events: vec![
            event("absent", "2025-09-22", "08:00", None),
            event("empty", "2025-09-22", "09:00", Some(&[])),
        ],
    };

    for subgroup in ["*", "BE", "A1.21"] {
        let schedule = reconcile(response.clone(), subgroup);
        assert_eq!(class_ids(&schedule), vec!["absent", "empty"], "{subgroup}");
    }
}

#[test]
fn restricted_events_only_reach_listed_subgroups() {
    let response = ScheduleResponse {
        events: vec![event("x-only", "2025-09-22", "08:00", Some(&["X"]))],
    };

    assert_eq!(class_ids(&reconcile(response.clone(), "*")), vec!["x-only"]);
    assert_eq!(class_ids(&reconcile(response.clone(), "X")), vec!["x-only"]);
    assert!(reconcile(response, "Y").is_empty());
}

#[test]
fn filtering_drops_days_left_without_events() {
    let response = ScheduleResponse {
        events: vec![
            event("fe", "2025-09-23", "08:00", Some(&["FE"])),
            event("be", "2025-09-24", "08:00", Some(&["BE", "SA"])),
        ],
    };

    let schedule = reconcile(response, "SA");
    assert_eq!(schedule.sorted_days(), vec!["2025-09-24"]);
    assert!(schedule.events_for("2025-09-23").is_none());
}

#[test]
fn empty_response_yields_empty_schedule() {
    let schedule = reconcile(ScheduleResponse { events: Vec::new() }, "*");
    assert!(schedule.is_empty());
    assert_eq!(schedule, DaySchedule::default());
}
