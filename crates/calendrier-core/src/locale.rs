//! French calendar vocabulary, computed from fixed tables so the output never
//! depends on the host locale.

use chrono::{Datelike, Duration, NaiveDate};

/// Weekday names indexed from Monday (0) to Sunday (6).
pub const WEEKDAYS: [&str; 7] = [
    "Lundi", "Mardi", "Mercredi", "Jeudi", "Vendredi", "Samedi", "Dimanche",
];

/// Month names indexed from January (0) to December (11).
pub const MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// Label used in place of a week range when there is nothing to schedule.
pub const NO_EVENTS_LABEL: &str = "Aucun événement";

pub fn weekday_name(date: NaiveDate) -> &'static str {
    WEEKDAYS[date.weekday().num_days_from_monday() as usize]
}

pub fn month_name(date: NaiveDate) -> &'static str {
    MONTHS[date.month0() as usize]
}

/// `"{day} {month}"`, e.g. `"1 septembre"`.
pub fn short_date(date: NaiveDate) -> String {
    format!("{} {}", date.day(), month_name(date))
}

/// Monday-to-Friday label for the week containing the first date.
///
/// Only the first date is sampled: callers are expected to pass dates from a
/// single working week, in which case any ordering yields the same label.
pub fn week_label(dates: &[NaiveDate]) -> String {
    let Some(&sample) = dates.first() else {
        return NO_EVENTS_LABEL.to_string();
    };

    let monday = sample - Duration::days(sample.weekday().num_days_from_monday() as i64);
    let friday = monday + Duration::days(4);

    format!(
        "Semaine du {} au {} {}",
        short_date(monday),
        short_date(friday),
        friday.year()
    )
}
