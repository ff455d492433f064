use std::{fmt, ops::Sub, str::FromStr};

use crate::{EngineError, ResultEngine};

/// Money amount in integer cents.
///
/// Every monetary value in the engine (expense amounts, goal targets and
/// progress) goes through this type. Totals use [`MoneyCents::checked_add`].
///
/// # Examples
///
/// ```rust
/// use engine::MoneyCents;
///
/// let amount = MoneyCents::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator, at most
/// two decimals):
///
/// ```rust
/// use engine::MoneyCents;
///
/// assert_eq!("50".parse::<MoneyCents>().unwrap().cents(), 5000);
/// assert_eq!("10,5".parse::<MoneyCents>().unwrap().cents(), 1050);
/// assert!("12.345".parse::<MoneyCents>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    /// Largest amount a single expense or goal target may carry.
    ///
    /// About nine million of these still sum inside `i64`.
    pub const MAX_AMOUNT: MoneyCents = MoneyCents(1_000_000_000_000);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_add(rhs.0).map(MoneyCents)
    }

    /// Parse a decimal string, reporting failures against `field`.
    pub fn parse_decimal(s: &str, field: &'static str) -> ResultEngine<Self> {
        let empty = || EngineError::invalid(field, "empty amount");
        let invalid = || EngineError::invalid(field, format!("'{}' is not a decimal amount", s.trim()));
        let overflow = || EngineError::invalid(field, "amount too large");

        let trimmed = s.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let rest = rest.trim().replace(',', ".");
        if rest.is_empty() {
            return Err(empty());
        }

        let (units_str, frac_str) = match rest.split_once('.') {
            Some((units, frac)) => (units, frac),
            None => (rest.as_str(), ""),
        };
        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if units_str.is_empty() || !all_digits(units_str) || !all_digits(frac_str) {
            return Err(invalid());
        }
        if frac_str.len() > 2 {
            return Err(EngineError::invalid(field, "too many decimals"));
        }

        let units: i64 = units_str.parse().map_err(|_| overflow())?;
        let cents: i64 = match frac_str.len() {
            0 => 0,
            1 => frac_str.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac_str.parse::<i64>().map_err(|_| invalid())?,
        };

        let total = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(overflow)?;
        Ok(MoneyCents(if negative { -total } else { total }))
    }

    /// Percentage of `self` over `whole`, rounded half-up to two decimals.
    ///
    /// Returns `0.0` when `whole` is not positive.
    #[must_use]
    pub fn percent_of(self, whole: MoneyCents) -> f64 {
        if whole.0 <= 0 {
            return 0.0;
        }
        // basis points first, so the rounding happens on integers
        let bps = (i128::from(self.0) * 10_000 * 2 + i128::from(whole.0)) / (2 * i128::from(whole.0));
        bps as f64 / 100.0
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}{units}.{cents:02}")
    }
}

impl FromStr for MoneyCents {
    type Err = EngineError;

    /// Parses a decimal string into cents, e.g. `"10.5"` or `"10,50"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_decimal(s, "amount")
    }
}

impl Sub for MoneyCents {
    type Output = MoneyCents;

    fn sub(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0 - rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_two_decimals() {
        assert_eq!(MoneyCents::new(0).to_string(), "0.00");
        assert_eq!(MoneyCents::new(1).to_string(), "0.01");
        assert_eq!(MoneyCents::new(5000).to_string(), "50.00");
        assert_eq!(MoneyCents::new(11000).to_string(), "110.00");
        assert_eq!(MoneyCents::new(-1050).to_string(), "-10.50");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("50".parse::<MoneyCents>().unwrap().cents(), 5000);
        assert_eq!("10.5".parse::<MoneyCents>().unwrap().cents(), 1050);
        assert_eq!("10,50".parse::<MoneyCents>().unwrap().cents(), 1050);
        assert_eq!("-5".parse::<MoneyCents>().unwrap().cents(), -500);
        assert_eq!("  2.30 ".parse::<MoneyCents>().unwrap().cents(), 230);
        assert_eq!("7.".parse::<MoneyCents>().unwrap().cents(), 700);
    }

    #[test]
    fn parse_rejects_bad_input() {
        for raw in ["12.345", "abc", "", "-", "1.2.3", ".5", "1e3"] {
            let err = raw.parse::<MoneyCents>().unwrap_err();
            assert!(
                matches!(err, EngineError::InvalidArgument { field: "amount", .. }),
                "{raw}: {err:?}"
            );
        }
    }

    #[test]
    fn parse_reports_the_given_field() {
        let err = MoneyCents::parse_decimal("x", "target_amount").unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidArgument {
                field: "target_amount",
                ..
            }
        ));
    }

    #[test]
    fn parse_rejects_overflow() {
        assert!("92233720368547758.08".parse::<MoneyCents>().is_err());
        assert!("99999999999999999999".parse::<MoneyCents>().is_err());
    }

    #[test]
    fn checked_add_detects_overflow() {
        let half = MoneyCents::new(i64::MAX / 2 + 1);
        assert_eq!(half.checked_add(half), None);
        assert_eq!(
            MoneyCents::new(1).checked_add(MoneyCents::new(2)),
            Some(MoneyCents::new(3))
        );
    }

    #[test]
    fn percent_of_rounds_half_up() {
        assert_eq!(MoneyCents::new(5000).percent_of(MoneyCents::new(10000)), 50.0);
        assert_eq!(MoneyCents::new(1).percent_of(MoneyCents::new(3)), 33.33);
        assert_eq!(MoneyCents::new(2).percent_of(MoneyCents::new(3)), 66.67);
        assert_eq!(MoneyCents::new(100).percent_of(MoneyCents::ZERO), 0.0);
    }
}
