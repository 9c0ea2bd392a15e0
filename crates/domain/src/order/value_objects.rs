//! Value objects for the order domain.

use serde::{Deserialize, Serialize};

/// Money amount represented in cents to avoid floating point issues.
///
/// Downstream services exchange amounts as decimal numbers (`12.5`), so the
/// serialized form is a decimal while arithmetic stays in integer cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "f64", from = "f64")]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates a new Money amount from a whole dollar value.
    pub fn from_dollars(dollars: i64) -> Self {
        Self {
            cents: dollars * 100,
        }
    }

    /// Creates a Money amount from a decimal value, rounding to the nearest cent.
    pub fn from_decimal(amount: f64) -> Self {
        Self {
            cents: (amount * 100.0).round() as i64,
        }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the amount as a decimal value.
    pub fn to_decimal(&self) -> f64 {
        self.cents as f64 / 100.0
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            cents: self.cents * i64::from(quantity),
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl From<f64> for Money {
    fn from(amount: f64) -> Self {
        Money::from_decimal(amount)
    }
}

impl From<Money> for f64 {
    fn from(money: Money) -> Self {
        money.to_decimal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_dollars() {
        assert_eq!(Money::from_dollars(100).cents(), 10_000);
    }

    #[test]
    fn test_money_from_decimal_rounds_to_cents() {
        assert_eq!(Money::from_decimal(999.99).cents(), 99_999);
        assert_eq!(Money::from_decimal(0.105).cents(), 11);
        assert_eq!(Money::from_decimal(5.0).cents(), 500);
    }

    #[test]
    fn test_money_multiply() {
        assert_eq!(Money::from_dollars(100).multiply(3), Money::from_dollars(300));
    }

    #[test]
    fn test_money_add() {
        let total = Money::from_cents(1050) + Money::from_cents(500);
        assert_eq!(total.cents(), 1550);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "$12.34");
        assert_eq!(Money::from_cents(-505).to_string(), "-$5.05");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }

    #[test]
    fn test_money_serializes_as_decimal() {
        let json = serde_json::to_string(&Money::from_cents(2550)).unwrap();
        assert_eq!(json, "25.5");

        let parsed: Money = serde_json::from_str("1299.99").unwrap();
        assert_eq!(parsed.cents(), 129_999);
    }
}
