use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subgroup value meaning "the whole group, no partition filter".
pub const ALL_SUBGROUPS: &str = "*";

/// Client-side identity of a decoded event. Never sent to or received from the
/// server; two decodes of the same payload produce different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::generate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubGroup {
    #[serde(rename = "SClID")]
    pub class_id: String,
    #[serde(rename = "SGrID")]
    pub subgroup_id: String,
    #[serde(rename = "SGCaID")]
    pub category_id: String,
    #[serde(rename = "STopic")]
    pub topic: String,
    #[serde(rename = "STitle")]
    pub title: String,
}

/// One class as delivered by the schedule endpoint.
///
/// `day`, `start` and `end` are kept as the server sent them. Ordering compares
/// them as strings, so the server must use sortable canonical forms
/// (`yyyy-MM-dd` for days, zero padded `HH:mm` for times).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEvent {
    #[serde(skip, default = "EventId::generate")]
    pub id: EventId,
    #[serde(rename = "ClID")]
    pub class_id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(rename = "Day")]
    pub day: String,
    pub group: String,
    pub topic: String,
    pub start: String,
    pub end: String,
    pub room: String,
    pub color: String,
    pub title: String,
    #[serde(rename = "SubGroup", default, skip_serializing_if = "Option::is_none")]
    pub sub_groups: Option<Vec<SubGroup>>,
}

impl ScheduleEvent {
    /// True when the event carries no subgroup breakdown and so applies to the
    /// whole group.
    pub fn is_unrestricted(&self) -> bool {
        self.sub_groups.as_ref().map_or(true, |groups| groups.is_empty())
    }

    pub fn is_visible_to(&self, subgroup: &str) -> bool {
        if subgroup == ALL_SUBGROUPS || self.is_unrestricted() {
            return true;
        }
        self.sub_groups
            .iter()
            .flatten()
            .any(|sub| sub.subgroup_id == subgroup)
    }
}

/// Inclusive date range with `start <= end`. Constructed values are never
/// mutated; a change of range replaces the whole value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    /// `now .. now + days`. Negative counts produce a range ending at `now`.
    /// Counts past chrono's representable range clamp to its bounds.
    pub fn days_from(now: DateTime<Utc>, days: i64) -> Self {
        let other = Duration::try_days(days)
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(if days < 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            });
        Self::new(now, other)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub group: String,
    pub subgroup: String,
    pub date_range: DateRange,
}
