//! Presentational helpers: Russian day labels, lesson counts and subgroup
//! names. Nothing here feeds back into loading or filtering.

use chrono::{Locale, NaiveDate};
use shared::{
    domain::{DateRange, ScheduleEvent},
    protocol::DAY_KEY_FORMAT,
};

const DISPLAY_DAY_FORMAT: &str = "%-d %b, %a";

/// Renders a `yyyy-MM-dd` day key as e.g. "22 сен, Пн". Unparsable keys are
/// returned unchanged.
pub fn format_day(day_key: &str) -> String {
    NaiveDate::parse_from_str(day_key, DAY_KEY_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| {
            at.and_utc()
                .format_localized(DISPLAY_DAY_FORMAT, Locale::ru_RU)
                .to_string()
        })
        .unwrap_or_else(|| day_key.to_string())
}

pub fn format_range(range: &DateRange) -> String {
    format!(
        "{} — {}",
        range
            .start()
            .format_localized(DISPLAY_DAY_FORMAT, Locale::ru_RU),
        range.end().format_localized(DISPLAY_DAY_FORMAT, Locale::ru_RU)
    )
}

pub fn lessons_label(count: usize) -> &'static str {
    let last_two = count % 100;
    if (11..=14).contains(&last_two) {
        return "занятий";
    }
    match count % 10 {
        1 => "занятие",
        2..=4 => "занятия",
        _ => "занятий",
    }
}

pub fn profile_name(code: &str) -> &str {
    match code {
        "BE" => "Backend",
        "FE" => "Frontend",
        "GD" => "Game Dev",
        "PM" => "Project Management",
        "SA" => "System Administration",
        "CD" => "UX/UI Design",
        other => other,
    }
}

pub fn is_known_profile(code: &str) -> bool {
    profile_name(code) != code
}

/// Subgroups an event is meant for, "Все" when it applies to everyone.
pub fn subgroup_summary(event: &ScheduleEvent) -> String {
    let titles: Vec<&str> = event
        .sub_groups
        .iter()
        .flatten()
        .map(|sub| {
            if sub.title.is_empty() {
                sub.topic.as_str()
            } else {
                sub.title.as_str()
            }
        })
        .filter(|title| !title.is_empty())
        .collect();

    if titles.is_empty() {
        "Все".to_string()
    } else {
        titles.join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickRange {
    Today,
    ThreeDays,
    Week,
}

impl QuickRange {
    pub const ALL: [QuickRange; 3] = [Self::Today, Self::ThreeDays, Self::Week];

    pub fn days_from_today(self) -> i64 {
        match self {
            Self::Today => 0,
            Self::ThreeDays => 2,
            Self::Week => 6,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Today => "Сегодня",
            Self::ThreeDays => "3 дня",
            Self::Week => "Неделя",
        }
    }
}

#[cfg(test)]
#[path = "tests/display_tests.rs"]
mod tests;
