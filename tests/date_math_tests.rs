mod common;

use chrono::{Datelike, Duration};
use common::{date, ym};
use fintrack_core::ledger::{
    clamp_day, last_day_of_month, month_key, parse_date, shift_months, DateWindow, YearMonth,
};

#[test]
fn shift_round_trips_away_from_month_end() {
    let mut day = date(2019, 1, 1);
    let end = date(2026, 12, 31);
    while day <= end {
        if day.day() <= 28 {
            for n in [-25, -13, -1, 1, 2, 11, 12, 30] {
                assert_eq!(shift_months(shift_months(day, n), -n), day, "{day} by {n}");
            }
        }
        day += Duration::days(3);
    }
}

#[test]
fn clamping_is_idempotent_at_zero_shift() {
    for raw in [date(2024, 2, 29), date(2023, 2, 28), date(2024, 4, 30), date(2024, 12, 31)] {
        let clamped = shift_months(raw, 0);
        assert_eq!(clamped, raw);
        assert_eq!(shift_months(clamped, 0), clamped);
    }
}

#[test]
fn january_end_lands_on_february_end() {
    assert_eq!(shift_months(date(2024, 1, 31), 1), date(2024, 2, 29));
    assert_eq!(shift_months(date(2023, 1, 31), 1), date(2023, 2, 28));
    assert_eq!(shift_months(date(2024, 3, 31), -1), date(2024, 2, 29));
    assert_eq!(shift_months(date(2024, 1, 29), 13), date(2025, 2, 28));
}

#[test]
fn thirty_first_maps_to_thirtieth_in_short_months() {
    assert_eq!(shift_months(date(2024, 5, 31), 1), date(2024, 6, 30));
    assert_eq!(clamp_day(31, 2024, 9), 30);
    assert_eq!(clamp_day(30, 2023, 2), 28);
    assert_eq!(clamp_day(15, 2023, 2), 15);
}

#[test]
fn month_helpers_follow_the_calendar() {
    assert_eq!(month_key(date(2024, 3, 9)), "2024-03");
    assert_eq!(last_day_of_month(2024, 2), 29);
    assert_eq!(last_day_of_month(1900, 2), 28);
    assert_eq!(last_day_of_month(2000, 2), 29);
    assert_eq!(ym(2024, 12).succ(), ym(2025, 1));
    assert_eq!(ym(2024, 1).pred(), ym(2023, 12));
    assert_eq!("2024-07".parse::<YearMonth>().unwrap(), ym(2024, 7));
    assert!("2024-13".parse::<YearMonth>().is_err());
}

#[test]
fn windows_are_inclusive_and_enumerate_months() {
    let window = DateWindow::new(date(2024, 1, 15), date(2024, 3, 1)).unwrap();
    assert!(window.contains(date(2024, 1, 15)));
    assert!(window.contains(date(2024, 3, 1)));
    assert!(!window.contains(date(2024, 3, 2)));
    assert_eq!(window.months(), vec![ym(2024, 1), ym(2024, 2), ym(2024, 3)]);
    assert!(DateWindow::new(date(2024, 2, 1), date(2024, 1, 1)).is_err());

    let trailing = DateWindow::trailing_months(ym(2024, 6), 12);
    assert_eq!(trailing.start, date(2023, 7, 1));
    assert_eq!(trailing.end, date(2024, 6, 30));
    assert_eq!(trailing.months().len(), 12);
}

#[test]
fn dates_parse_from_plain_components() {
    assert_eq!(parse_date("2024-02-29").unwrap(), date(2024, 2, 29));
    assert!(parse_date("2023-02-29").is_err());
    assert!(parse_date("29/02/2024").is_err());
}
