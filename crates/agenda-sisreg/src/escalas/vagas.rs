//! Vacancy-occurrence calculator.
//!
//! Turns a recurring weekly schedule (slots per day, weekday set, validity
//! window) into the total number of bookable slots. Every malformed input
//! degrades to zero instead of erroring.

use super::domain::{Weekday, WeekdaySet};
use chrono::{Datelike, NaiveDate};

/// Total slots for loosely formatted inputs, as they arrive from forms and
/// spreadsheet rows.
///
/// Dates may be `YYYY-MM-DD`, a full ISO datetime, or `DD/MM/YYYY`.
pub fn calculate_total_slots(
    slots_per_day: u32,
    weekdays_text: &str,
    start_date: &str,
    end_date: &str,
) -> u64 {
    if [weekdays_text, start_date, end_date]
        .iter()
        .any(|value| value.trim().is_empty())
    {
        return 0;
    }

    let (Some(start), Some(end)) = (
        parse_schedule_date(start_date),
        parse_schedule_date(end_date),
    ) else {
        return 0;
    };

    total_slots(slots_per_day, WeekdaySet::parse(weekdays_text), start, end)
}

/// Typed variant of [`calculate_total_slots`].
pub fn total_slots(
    slots_per_day: u32,
    weekdays: WeekdaySet,
    start: NaiveDate,
    end: NaiveDate,
) -> u64 {
    u64::from(slots_per_day) * count_occurrences(weekdays, start, end)
}

/// Days in `start..=end` whose weekday is in `weekdays`. Constant time:
/// whole weeks contribute `weekdays.len()` each, then the leftover days are
/// checked from `start`'s weekday on.
pub fn count_occurrences(weekdays: WeekdaySet, start: NaiveDate, end: NaiveDate) -> u64 {
    if weekdays.is_empty() || start > end {
        return 0;
    }

    let days = (end - start).num_days().unsigned_abs() + 1;
    let whole_weeks = days / 7 * weekdays.len() as u64;

    let first = usize::from(Weekday::from_chrono(start.weekday()).index());
    let ordered = Weekday::ordered();
    let leftover = (0..(days % 7) as usize)
        .filter(|offset| weekdays.contains(ordered[(first + offset) % 7]))
        .count() as u64;

    whole_weeks + leftover
}

/// Parses `DD/MM/YYYY` when the text contains a slash, otherwise the date
/// part of an ISO date or datetime.
pub fn parse_schedule_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.contains('/') {
        let parts: Vec<&str> = trimmed.split('/').collect();
        let [day, month, year] = parts.as_slice() else {
            return None;
        };
        let day = day.trim().parse::<u32>().ok()?;
        let month = month.trim().parse::<u32>().ok()?;
        let year = year.trim().parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let date_part = trimmed
        .split(|c: char| c == 'T' || c == ' ')
        .next()
        .unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn single_monday_counts_once() {
        assert_eq!(calculate_total_slots(5, "SEG", "2024-01-01", "2024-01-01"), 5);
    }

    #[test]
    fn single_tuesday_is_not_monday() {
        assert_eq!(calculate_total_slots(5, "SEG", "2024-01-02", "2024-01-02"), 0);
    }

    #[test]
    fn january_2024_mondays_and_fridays() {
        // Five Mondays (1, 8, 15, 22, 29) and four Fridays (5, 12, 19, 26).
        assert_eq!(
            calculate_total_slots(3, "SEG SEX", "2024-01-01", "2024-01-31"),
            27
        );
    }

    #[test]
    fn reversed_window_is_zero() {
        assert_eq!(calculate_total_slots(2, "DOM", "2024-01-10", "2024-01-05"), 0);
    }

    #[test]
    fn missing_weekdays_is_zero() {
        assert_eq!(calculate_total_slots(4, "", "2024-01-01", "2024-01-31"), 0);
        assert_eq!(calculate_total_slots(4, "XYZ FOO", "2024-01-01", "2024-01-31"), 0);
    }

    #[test]
    fn brazilian_dates_match_iso_dates() {
        assert_eq!(
            calculate_total_slots(1, "SEG", "01/01/2024", "31/01/2024"),
            calculate_total_slots(1, "SEG", "2024-01-01", "2024-01-31")
        );
    }

    #[test]
    fn unparseable_or_missing_dates_are_zero() {
        assert_eq!(calculate_total_slots(3, "SEG", "", "2024-01-31"), 0);
        assert_eq!(calculate_total_slots(3, "SEG", "ontem", "2024-01-31"), 0);
        assert_eq!(calculate_total_slots(3, "SEG", "31/02/2024", "2024-03-31"), 0);
        assert_eq!(calculate_total_slots(3, "SEG", "01/2024", "2024-03-31"), 0);
    }

    #[test]
    fn iso_datetimes_use_the_date_part() {
        assert_eq!(
            parse_schedule_date("2024-01-31T03:00:00.000Z"),
            Some(date(2024, 1, 31))
        );
        assert_eq!(parse_schedule_date(" 05/02/2024 "), Some(date(2024, 2, 5)));
    }

    #[test]
    fn zero_slots_per_day_yields_zero() {
        assert_eq!(
            calculate_total_slots(0, "SEG TER QUA", "2024-01-01", "2024-12-31"),
            0
        );
    }

    #[test]
    fn full_week_counts_every_day_in_leap_year() {
        let all = WeekdaySet::parse("DOM SEG TER QUA QUI SEX SAB");
        assert_eq!(count_occurrences(all, date(2024, 1, 1), date(2024, 12, 31)), 366);
    }

    #[test]
    fn closed_form_matches_a_day_by_day_walk() {
        let start = date(2023, 12, 27);
        for token in ["DOM", "SEG", "QUA SEX", "TER QUI SAB", "DOM SEG TER QUA QUI SEX SAB"] {
            let weekdays = WeekdaySet::parse(token);
            for span in 0..40 {
                let end = start + chrono::Duration::days(span);
                let walked = start
                    .iter_days()
                    .take_while(|day| *day <= end)
                    .filter(|day| weekdays.contains(Weekday::from_chrono(day.weekday())))
                    .count() as u64;
                assert_eq!(count_occurrences(weekdays, start, end), walked, "{token} +{span}");
            }
        }
    }

    #[test]
    fn last_representable_date_is_counted() {
        let max = NaiveDate::MAX;
        let weekday = WeekdaySet::from_iter([Weekday::from_chrono(max.weekday())]);
        assert_eq!(count_occurrences(weekday, max, max), 1);

        let all = WeekdaySet::parse("DOM SEG TER QUA QUI SEX SAB");
        let before = max.pred_opt().expect("day before max");
        assert_eq!(count_occurrences(all, before, max), 2);

        let text = max.format("%d/%m/%Y").to_string();
        let token = Weekday::from_chrono(max.weekday()).token();
        assert_eq!(calculate_total_slots(1, token, &text, &text), 1);
    }

    #[test]
    fn huge_windows_are_counted_without_walking() {
        let started = std::time::Instant::now();
        assert_eq!(
            calculate_total_slots(1, "SEG", "01/01/-200000", "31/12/200000"),
            20_871_052
        );

        let all = WeekdaySet::parse("DOM SEG TER QUA QUI SEX SAB");
        let (min, max) = (NaiveDate::MIN, NaiveDate::MAX);
        let span = (max - min).num_days() as u64 + 1;
        assert_eq!(count_occurrences(all, min, max), span);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn repeated_calls_are_identical() {
        let first = calculate_total_slots(7, "TER,QUI", "2024-03-01", "2024-05-31");
        let second = calculate_total_slots(7, "TER,QUI", "2024-03-01", "2024-05-31");
        assert_eq!(first, second);
        assert_eq!(first % 7, 0);
    }
}
