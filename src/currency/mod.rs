use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::errors::FinanceError;

/// Exact monetary amount stored as integer minor units (cents).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn from_major(units: i64) -> Self {
        Self(units * 100)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Splits the amount into `parts` equal shares; the final share absorbs whatever
    /// remainder integer division leaves, so the shares always sum to `self`.
    pub fn split_even(&self, parts: u32) -> Vec<Money> {
        if parts == 0 {
            return Vec::new();
        }
        let base = self.0 / parts as i64;
        let mut shares = vec![Money(base); parts as usize];
        let assigned = base * (parts as i64 - 1);
        if let Some(last) = shares.last_mut() {
            *last = Money(self.0 - assigned);
        }
        shares
    }

    /// `self * percent / 100`, rounded half away from zero to the nearest cent.
    pub fn percent(&self, percent: u8) -> Money {
        let scaled = self.0 as i128 * percent as i128;
        let rounded = if scaled >= 0 {
            (scaled + 50) / 100
        } else {
            (scaled - 50) / 100
        };
        Money(rounded as i64)
    }

    /// Share of `self` within `whole`, as a percentage; zero when `whole` is zero.
    pub fn ratio_percent(&self, whole: Money) -> f64 {
        if whole.0 == 0 {
            return 0.0;
        }
        self.0 as f64 / whole.0 as f64 * 100.0
    }

    pub fn to_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Parses user-entered amount text using the locale's separators.
    ///
    /// Grouping separators are ignored, the decimal separator may be followed by at
    /// most two digits, and a leading currency symbol or surrounding spaces are
    /// tolerated. `"1.234,56"` with a pt-BR locale and `"1,234.56"` with en-US both
    /// yield 123456 cents.
    pub fn parse(raw: &str, locale: &LocaleConfig) -> Result<Money, FinanceError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FinanceError::validation("amount is required"));
        }
        let invalid = || FinanceError::validation(format!("invalid amount `{raw}`"));
        // Only a symbol prefix is dropped; a leading separator still marks the fraction.
        let body = trimmed.trim_start_matches(|c: char| {
            !c.is_ascii_digit() && c != '-' && c != locale.decimal_separator
        });
        let (negative, body) = match body.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, body),
        };

        let mut whole: i64 = 0;
        let mut fraction = String::new();
        let mut seen_decimal = false;
        let mut digits = 0usize;
        for ch in body.chars() {
            if ch == locale.decimal_separator && !seen_decimal {
                seen_decimal = true;
            } else if ch == locale.grouping_separator && !seen_decimal {
                continue;
            } else if ch.is_ascii_digit() {
                digits += 1;
                if seen_decimal {
                    fraction.push(ch);
                } else {
                    whole = whole
                        .checked_mul(10)
                        .and_then(|w| w.checked_add(ch.to_digit(10).unwrap_or(0) as i64))
                        .ok_or_else(invalid)?;
                }
            } else {
                return Err(invalid());
            }
        }
        if digits == 0 || fraction.len() > 2 {
            return Err(invalid());
        }
        while fraction.len() < 2 {
            fraction.push('0');
        }
        let cents_part = fraction.parse::<i64>().map_err(|_| invalid())?;
        let cents = whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(cents_part))
            .ok_or_else(invalid)?;
        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Renders the amount with the locale's separators, e.g. `1.234,56`.
    pub fn format(&self, locale: &LocaleConfig) -> String {
        let abs = self.0.unsigned_abs();
        let whole = group_digits(&(abs / 100).to_string(), locale.grouping_separator);
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{sign}{whole}{}{:02}", locale.decimal_separator, abs % 100)
    }

    pub fn format_currency(&self, code: &str, locale: &LocaleConfig) -> String {
        let symbol = symbol_for(code);
        if self.is_negative() {
            format!("-{} {}", symbol, self.abs().format(locale))
        } else {
            format!("{} {}", symbol, self.format(locale))
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

/// Locale-aware number formatting preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleConfig {
    pub language_tag: String,
    pub decimal_separator: char,
    pub grouping_separator: char,
}

impl LocaleConfig {
    pub fn pt_br() -> Self {
        Self {
            language_tag: "pt-BR".into(),
            decimal_separator: ',',
            grouping_separator: '.',
        }
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language_tag: "en-US".into(),
            decimal_separator: '.',
            grouping_separator: ',',
        }
    }
}

pub fn symbol_for(code: &str) -> String {
    match code {
        "USD" => "$".into(),
        "BRL" => "R$".into(),
        "EUR" => "€".into(),
        "GBP" => "£".into(),
        _ => code.into(),
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::new();
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, separator);
        }
        grouped.insert(0, ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_even_absorbs_remainder_in_last_share() {
        let shares = Money::from_cents(10_000).split_even(3);
        assert_eq!(
            shares,
            vec![Money::from_cents(3333), Money::from_cents(3333), Money::from_cents(3334)]
        );
        assert_eq!(shares.iter().sum::<Money>(), Money::from_cents(10_000));
    }

    #[test]
    fn percent_rounds_half_away_from_zero() {
        assert_eq!(Money::from_major(2000).percent(30), Money::from_major(600));
        assert_eq!(Money::from_cents(5).percent(50), Money::from_cents(3));
        assert_eq!(Money::from_cents(-5).percent(50), Money::from_cents(-3));
    }

    #[test]
    fn parses_locale_specific_input() {
        let br = LocaleConfig::pt_br();
        assert_eq!(Money::parse("1.234,56", &br).unwrap(), Money::from_cents(123_456));
        assert_eq!(Money::parse("R$ 10", &br).unwrap(), Money::from_cents(1000));
        let us = LocaleConfig::default();
        assert_eq!(Money::parse("1,234.5", &us).unwrap(), Money::from_cents(123_450));
        assert_eq!(Money::parse("$0.07", &us).unwrap(), Money::from_cents(7));
    }

    #[test]
    fn leading_decimal_separator_reads_as_fraction() {
        assert_eq!(Money::parse(".50", &LocaleConfig::default()).unwrap(), Money::from_cents(50));
        assert_eq!(Money::parse(",50", &LocaleConfig::pt_br()).unwrap(), Money::from_cents(50));
        assert_eq!(Money::parse("$.5", &LocaleConfig::default()).unwrap(), Money::from_cents(50));
        assert!(Money::parse(".", &LocaleConfig::default()).is_err());
    }

    #[test]
    fn rejects_non_numeric_input() {
        let us = LocaleConfig::default();
        assert!(Money::parse("", &us).is_err());
        assert!(Money::parse("abc", &us).is_err());
        assert!(Money::parse("1.234", &us).is_err());
        assert!(Money::parse("12x", &us).is_err());
    }

    #[test]
    fn formats_with_grouping() {
        let br = LocaleConfig::pt_br();
        assert_eq!(Money::from_cents(123_456_789).format(&br), "1.234.567,89");
        assert_eq!(Money::from_cents(-5).format(&LocaleConfig::default()), "-0.05");
        assert_eq!(Money::from_cents(123_456).format_currency("BRL", &br), "R$ 1.234,56");
        assert_eq!(Money::from_cents(-1050).to_string(), "-10.50");
    }
}
