use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::FinanceError;

/// A calendar month, the unit every aggregate is bucketed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, FinanceError> {
        if !(1..=12).contains(&month) {
            return Err(FinanceError::validation(format!(
                "month must be within 1..=12, got {month}"
            )));
        }
        if !(min_year()..=max_year()).contains(&year) {
            return Err(FinanceError::validation(format!(
                "year {year} is outside the supported calendar range"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn succ(&self) -> Self {
        self.add_months(1)
    }

    pub fn pred(&self) -> Self {
        self.add_months(-1)
    }

    /// Moves by `months`, saturating at the first or last month chrono can represent.
    pub fn add_months(&self, months: i32) -> Self {
        let (lowest, highest) = index_bounds();
        Self::from_index(self.shifted_index(months).clamp(lowest, highest))
    }

    /// Moves by `months`, or `None` when the result leaves the supported range.
    pub fn checked_add_months(&self, months: i32) -> Option<Self> {
        let (lowest, highest) = index_bounds();
        let index = self.shifted_index(months);
        (lowest..=highest).contains(&index).then(|| Self::from_index(index))
    }

    /// Number of months from `self` to `other` (negative when `other` is earlier).
    pub fn months_until(&self, other: YearMonth) -> i32 {
        other.index() - self.index()
    }

    pub fn first_day(&self) -> NaiveDate {
        ymd(self.year, self.month, 1)
    }

    pub fn last_day(&self) -> NaiveDate {
        ymd(self.year, self.month, last_day_of_month(self.year, self.month))
    }

    /// Inclusive range `self..=end`; empty when `end` precedes `self`.
    pub fn months_through(&self, end: YearMonth) -> Vec<YearMonth> {
        let count = self.months_until(end);
        if count < 0 {
            return Vec::new();
        }
        (0..=count).map(|offset| self.add_months(offset)).collect()
    }

    /// Short English month label used by history charts.
    pub fn short_label(&self) -> &'static str {
        month_label(self.month)
    }

    fn index(&self) -> i32 {
        self.year * 12 + self.month as i32 - 1
    }

    fn shifted_index(&self, months: i32) -> i64 {
        i64::from(self.index()) + i64::from(months)
    }

    fn from_index(index: i64) -> Self {
        Self {
            year: index.div_euclid(12) as i32,
            month: (index.rem_euclid(12) + 1) as u32,
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = FinanceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || FinanceError::validation(format!("invalid month key `{raw}`"));
        let (year, month) = raw.trim().split_once('-').ok_or_else(invalid)?;
        if month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        YearMonth::new(year, month)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = FinanceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// Inclusive date range scoping a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, FinanceError> {
        if end < start {
            return Err(FinanceError::validation(
                "window end must not precede its start",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn month(month: YearMonth) -> Self {
        Self {
            start: month.first_day(),
            end: month.last_day(),
        }
    }

    /// The `count` calendar months ending with (and including) `last`.
    pub fn trailing_months(last: YearMonth, count: u32) -> Self {
        let first = last.add_months(1 - count.max(1) as i32);
        Self {
            start: first.first_day(),
            end: last.last_day(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn first_month(&self) -> YearMonth {
        YearMonth::of(self.start)
    }

    pub fn last_month(&self) -> YearMonth {
        YearMonth::of(self.end)
    }

    pub fn months(&self) -> Vec<YearMonth> {
        self.first_month().months_through(self.last_month())
    }

    /// Same window widened to whole calendar months.
    pub fn covering_months(&self) -> Self {
        Self {
            start: self.first_month().first_day(),
            end: self.last_month().last_day(),
        }
    }
}

/// Returns `date` moved by `months`, keeping its day-of-month clamped to the target
/// month's last day (Jan 31 + 1 month lands on Feb 28/29, Mar 31 - 1 on Feb 28/29).
///
/// Saturates at the ends of chrono's calendar; use [`checked_shift_months`] where that
/// must be detected.
pub fn shift_months(date: NaiveDate, months: i32) -> NaiveDate {
    let target = YearMonth::of(date).add_months(months);
    occurrence_date(date.day(), target)
}

pub fn checked_shift_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let target = YearMonth::of(date).checked_add_months(months)?;
    Some(occurrence_date(date.day(), target))
}

/// Date a series anchored on `anchor_day` falls on within `month`.
pub fn occurrence_date(anchor_day: u32, month: YearMonth) -> NaiveDate {
    let day = clamp_day(anchor_day, month.year(), month.month());
    ymd(month.year(), month.month(), day)
}

/// Day-of-month clamping: 31 falls back to 30 in thirty-day months, 29..=31 fall back
/// to February's last day, and any day past the month end lands on that end.
pub fn clamp_day(day: u32, year: i32, month: u32) -> u32 {
    let last = last_day_of_month(year, month);
    match day {
        31 if last < 31 => last.min(30),
        29 if last < 29 => last,
        d if d > last => last,
        d => d.max(1),
    }
}

pub fn month_key(date: NaiveDate) -> String {
    YearMonth::of(date).to_string()
}

pub fn last_day_of_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 30,
    }
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Parses a plain `YYYY-MM-DD` date; no timezone is ever involved.
pub fn parse_date(raw: &str) -> Result<NaiveDate, FinanceError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| FinanceError::validation(format!("invalid date `{raw}`, expected YYYY-MM-DD")))
}

fn min_year() -> i32 {
    NaiveDate::MIN.year()
}

fn max_year() -> i32 {
    NaiveDate::MAX.year()
}

fn index_bounds() -> (i64, i64) {
    (i64::from(min_year()) * 12, i64::from(max_year()) * 12 + 11)
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    // `YearMonth` keeps years within chrono's range and callers clamp `day`, so every
    // input here is a valid date.
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MAX)
}

fn month_label(month: u32) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        12 => "Dec",
        _ => "",
    }
}
