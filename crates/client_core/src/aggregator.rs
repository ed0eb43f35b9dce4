//! Turns a raw schedule response into the day-grouped view the session
//! publishes.

use std::collections::BTreeMap;

use shared::{domain::ScheduleEvent, protocol::ScheduleResponse};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayGroup {
    pub day: String,
    pub events: Vec<ScheduleEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DaySchedule {
    days: Vec<DayGroup>,
}

impl DaySchedule {
    pub fn days(&self) -> &[DayGroup] {
        &self.days
    }

    pub fn sorted_days(&self) -> Vec<&str> {
        self.days.iter().map(|group| group.day.as_str()).collect()
    }

    pub fn events_for(&self, day: &str) -> Option<&[ScheduleEvent]> {
        self.days
            .iter()
            .find(|group| group.day == day)
            .map(|group| group.events.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn event_count(&self) -> usize {
        self.days.iter().map(|group| group.events.len()).sum()
    }
}

/// Filters by `subgroup`, sorts by `(day, start)` and groups by day.
///
/// The sort is stable: events sharing a `(day, start)` key keep their
/// response order.
pub fn reconcile(response: ScheduleResponse, subgroup: &str) -> DaySchedule {
    let mut events: Vec<ScheduleEvent> = response
        .events
        .into_iter()
        .filter(|event| event.is_visible_to(subgroup))
        .collect();

    events.sort_by(|a, b| (&a.day, &a.start).cmp(&(&b.day, &b.start)));

    let mut by_day: BTreeMap<String, Vec<ScheduleEvent>> = BTreeMap::new();
    for event in events {
        by_day.entry(event.day.clone()).or_default().push(event);
    }

    DaySchedule {
        days: by_day
            .into_iter()
            .map(|(day, events)| DayGroup { day, events })
            .collect(),
    }
}

#[cfg(test)]
#[path = "tests/aggregator_tests.rs"]
mod tests;
