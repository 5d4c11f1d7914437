//! Business-day arithmetic, UTC. The rest of the crate stays on [`Ms`];
//! chrono never leaks out of this module.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};

use crate::model::Ms;

pub(crate) fn now_ms() -> Ms {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as Ms
}

fn date_of(ms: Ms) -> NaiveDate {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .expect("timestamp within validated range")
        .date_naive()
}

fn start_of(date: NaiveDate) -> Ms {
    date.and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
        .timestamp_millis()
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().expect("date within validated range")
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Midnight of the first business day strictly after `reference` —
/// the earliest reservable moment is never same-day.
pub fn next_business_day_start(reference: Ms) -> Ms {
    let mut d = next_day(date_of(reference));
    while is_weekend(d) {
        d = next_day(d);
    }
    start_of(d)
}

/// Midnight `days` business days after `start`'s date, weekends skipped.
pub fn add_business_days(start: Ms, days: u32) -> Ms {
    let mut d = date_of(start);
    for _ in 0..days {
        d = next_day(d);
        while is_weekend(d) {
            d = next_day(d);
        }
    }
    start_of(d)
}

/// Business days separating `start`'s date from `end`'s date
/// (0 when both fall on the same day).
pub fn business_days_between(start: Ms, end: Ms) -> u32 {
    let target = date_of(end);
    let mut d = date_of(start);
    let mut count = 0;
    while d < target {
        d = next_day(d);
        if !is_weekend(d) {
            count += 1;
        }
    }
    count
}
