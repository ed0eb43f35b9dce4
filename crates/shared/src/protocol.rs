use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ScheduleEvent;

pub const SCHEDULE_PATH: &str = "/api/v1/schedule";

/// Canonical day key format, shared by the query parameters and the `Day`
/// field of every event.
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Formats an instant as a UTC day key. Locale independent.
pub fn day_key(at: DateTime<Utc>) -> String {
    at.format(DAY_KEY_FORMAT).to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub events: Vec<ScheduleEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleQuery {
    pub group: String,
    pub subgroup: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ScheduleQuery {
    /// Query parameters in wire order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("group", self.group.clone()),
            ("subgroup", self.subgroup.clone()),
            ("start", day_key(self.start)),
            ("end", day_key(self.end)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn day_key_uses_utc_calendar_date() {
        let at = Utc.with_ymd_and_hms(2025, 9, 21, 23, 59, 0).unwrap();
        assert_eq!(day_key(at), "2025-09-21");
    }

    #[test]
    fn decodes_events_with_and_without_subgroups() {
        let raw = r##"{
            "events": [
                {"ClID": "10", "type": "lec", "Day": "2025-09-22", "group": "ИТ24-11",
                 "topic": "Базы данных", "start": "10:00", "end": "11:30", "room": "204",
                 "color": "#ff0000", "title": "Лекция"},
                {"ClID": "11", "Day": "2025-09-22", "group": "ИТ24-11",
                 "topic": "Backend", "start": "12:00", "end": "13:30", "room": "—",
                 "color": "", "title": "",
                 "SubGroup": [{"SClID": "11", "SGrID": "BE", "SGCaID": "2",
                               "STopic": "Backend", "STitle": "BE"}]}
            ]
        }"##;

        let response: ScheduleResponse = serde_json::from_str(raw).expect("decode");
        assert_eq!(response.events.len(), 2);
        assert_eq!(response.events[0].kind.as_deref(), Some("lec"));
        assert!(response.events[0].sub_groups.is_none());
        let subs = response.events[1].sub_groups.as_ref().expect("subgroups");
        assert_eq!(subs[0].subgroup_id, "BE");
        assert_ne!(response.events[0].id, response.events[1].id);
    }

    #[test]
    fn rejects_event_missing_day() {
        let raw = r#"{"events": [{"ClID": "1", "group": "g", "topic": "t", "start": "08:00",
            "end": "09:00", "room": "r", "color": "c", "title": "x"}]}"#;
        assert!(serde_json::from_str::<ScheduleResponse>(raw).is_err());
    }

    #[test]
    fn query_pairs_format_dates_as_day_keys() {
        let query = ScheduleQuery {
            group: "ИТ25-11".into(),
            subgroup: "*".into(),
            start: Utc.with_ymd_and_hms(2025, 9, 22, 6, 30, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 9, 24, 6, 30, 0).unwrap(),
        };
        let pairs = query.query_pairs();
        assert_eq!(pairs[2], ("start", "2025-09-22".to_string()));
        assert_eq!(pairs[3], ("end", "2025-09-24".to_string()));
    }
}
