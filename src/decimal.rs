use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};
use std::str::FromStr;

/// decimal places carried by every stored currency amount
pub const MONEY_SCALE: u32 = 2;

/// round half-up to currency precision
pub fn round_currency(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Money type with 2 decimal places, rounded half-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);
    pub const ONE: Money = Money(Decimal::ONE);
    /// smallest representable amount (one cent)
    pub const CENT: Money = Money(Decimal::from_parts(1, 0, 0, false, MONEY_SCALE));

    /// create from decimal, rounding half-up to cents
    pub fn from_decimal(d: Decimal) -> Self {
        Money(round_currency(d))
    }

    /// create from string with exact parsing
    pub fn from_str_exact(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Money::from_decimal(Decimal::from_str(s)?))
    }

    /// create from integer amount (dollars, rupees, etc)
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// create from minor amount (cents, paise, etc)
    pub fn from_minor(amount: i64) -> Self {
        Money(Decimal::new(amount, MONEY_SCALE))
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// multiply by a whole number of periods, None on overflow
    pub fn checked_times(&self, periods: u32) -> Option<Money> {
        self.0
            .checked_mul(Decimal::from(periods))
            .map(Money::from_decimal)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_str_exact(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl From<i32> for Money {
    fn from(i: i32) -> Self {
        Money::from_major(i as i64)
    }
}

impl From<u32> for Money {
    fn from(i: u32) -> Self {
        Money::from_major(i as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money::from_decimal(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 = round_currency(self.0 + other.0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money::from_decimal(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 = round_currency(self.0 - other.0);
    }
}

impl Mul<Decimal> for Money {
    type Output = Money;

    fn mul(self, other: Decimal) -> Money {
        Money::from_decimal(self.0 * other)
    }
}

impl Div<Decimal> for Money {
    type Output = Money;

    fn div(self, other: Decimal) -> Money {
        Money::from_decimal(self.0 / other)
    }
}

/// annual interest rate, stored as a fraction (0.105 for 10.5%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);

    /// create from fraction (e.g., 0.05 for 5%)
    pub fn from_decimal(d: Decimal) -> Self {
        Rate(d)
    }

    /// create from percentage (e.g., 10.5 for 10.5%)
    pub fn from_percentage(p: Decimal) -> Self {
        Rate(p / Decimal::ONE_HUNDRED)
    }

    /// create from basis points (e.g., 500 for 5%)
    pub fn from_bps(bps: u32) -> Self {
        Rate(Decimal::from(bps) / Decimal::from(10000))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// get as percentage, trailing zeros stripped
    ///
    /// Panics for fractions beyond `Decimal::MAX / 100`; use
    /// [`Rate::checked_percentage`] for unvalidated rates.
    pub fn as_percentage(&self) -> Decimal {
        (self.0 * Decimal::ONE_HUNDRED).normalize()
    }

    pub fn checked_percentage(&self) -> Option<Decimal> {
        self.0
            .checked_mul(Decimal::ONE_HUNDRED)
            .map(|p| p.normalize())
    }

    /// monthly rate from annual rate
    pub fn monthly_rate(&self) -> Rate {
        Rate(self.0 / Decimal::from(12))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.checked_percentage() {
            Some(percent) => write!(f, "{}%", percent),
            None => write!(f, "{} (fraction)", self.0),
        }
    }
}

impl From<Decimal> for Rate {
    fn from(d: Decimal) -> Self {
        Rate::from_decimal(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_rounds_half_up() {
        assert_eq!(Money::from_decimal(dec!(10.005)).as_decimal(), dec!(10.01));
        assert_eq!(Money::from_decimal(dec!(10.004)).as_decimal(), dec!(10.00));
        // banker's rounding would give 0.12 here
        assert_eq!(Money::from_decimal(dec!(0.125)).as_decimal(), dec!(0.13));
    }

    #[test]
    fn test_money_display_two_places() {
        assert_eq!(Money::from_major(1000).to_string(), "1000.00");
        assert_eq!(Money::from_minor(123456).to_string(), "1234.56");
        assert_eq!(Money::CENT.to_string(), "0.01");
    }

    #[test]
    fn test_checked_times() {
        let emi = Money::from_str_exact("10549.91").unwrap();
        assert_eq!(emi.checked_times(12), Some(Money::from_str_exact("126598.92").unwrap()));
    }

    #[test]
    fn test_rate_conversions() {
        let rate = Rate::from_percentage(dec!(10.5));
        assert_eq!(rate.as_decimal(), dec!(0.105));
        assert_eq!(rate.as_percentage(), dec!(10.5));
        assert_eq!(rate.to_string(), "10.5%");
        assert_eq!(Rate::from_bps(1200).monthly_rate().as_decimal(), dec!(0.01));
    }

    #[test]
    fn test_huge_rate_displays_without_overflow() {
        let rate = Rate::from_decimal(Decimal::MAX);
        assert_eq!(rate.checked_percentage(), None);
        assert_eq!(rate.to_string(), format!("{} (fraction)", Decimal::MAX));
    }
}
