//! Static group catalog and the group/subgroup compatibility table.
//!
//! The tables are plain data; the functions below only look things up. The
//! year a group belongs to is the first run of exactly two digits in its code,
//! so `ИТ24-11` is a year-24 group.

use shared::domain::ALL_SUBGROUPS;

pub const GROUPS: &[&str] = &[
    "ИТ25-11", "ИТ25-12", "ИТ25-13", "ИТ25-14", //
    "ИТ24-11", "ИТ24-12", "ИТ24-13", "ИТ24-14", //
    "ИТ23-11", "ИТ23-12", "ИТ23-13", //
    "ИТ22-11", "ИТ22-12",
];

const FIRST_YEAR_SUBGROUPS: &[&str] = &["Подгр1", "Подгр2", "Подгр3", "Подгр4"];

const PROFILES: &[&str] = &["BE", "FE", "GD", "PM", "SA", "CD"];

const LANGUAGE_TRACKS: &[(&str, &[&str])] = &[
    (
        "25",
        &["A0.11", "A0.12", "A1.11", "A1.12", "A2.11", "A2.12", "B1.11", "B1.12"],
    ),
    (
        "24",
        &["A0.21", "A1.21", "A1.22", "A1.23", "A2.21", "A2.22", "B1.21", "B1.22"],
    ),
    ("23", &["A1.31", "A2.31", "B1.31"]),
    ("22", &["A1.41", "A2.41", "B1.41"]),
];

const FIRST_YEAR: &str = "25";
const PROFILE_YEARS: &[&str] = &["24", "23", "22"];

pub fn default_group() -> &'static str {
    GROUPS[0]
}

pub fn is_known_group(group: &str) -> bool {
    GROUPS.contains(&group)
}

/// First run of exactly two ASCII digits in `group`.
pub fn year_token(group: &str) -> Option<&str> {
    group
        .split(|c: char| !c.is_ascii_digit())
        .find(|run| run.len() == 2)
}

fn language_tracks(year: &str) -> &'static [&'static str] {
    LANGUAGE_TRACKS
        .iter()
        .find(|(y, _)| *y == year)
        .map(|(_, tracks)| *tracks)
        .unwrap_or(&[])
}

/// Subgroups selectable for `group`, always led by `"*"`.
pub fn available_subgroups(group: &str) -> Vec<&'static str> {
    let mut subgroups = vec![ALL_SUBGROUPS];
    let Some(year) = year_token(group) else {
        return subgroups;
    };

    if year == FIRST_YEAR {
        subgroups.extend_from_slice(FIRST_YEAR_SUBGROUPS);
        subgroups.extend_from_slice(language_tracks(year));
    } else if PROFILE_YEARS.contains(&year) {
        subgroups.extend_from_slice(PROFILES);
        subgroups.extend_from_slice(language_tracks(year));
    }

    subgroups
}

pub fn is_valid_subgroup(subgroup: &str, group: &str) -> bool {
    available_subgroups(group).contains(&subgroup)
}

pub fn validated_subgroup(current: &str, group: &str) -> String {
    if is_valid_subgroup(current, group) {
        current.to_string()
    } else {
        ALL_SUBGROUPS.to_string()
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
