//! Currency and money amounts.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Currencies the booking core prices in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Aed,
    Sar,
    Gbp,
    Kwd,
    Jpy,
}

impl Currency {
    /// Number of minor-unit digits used when rounding prices.
    pub fn decimal_digits(&self) -> u32 {
        match self {
            Currency::Jpy => 0,
            Currency::Kwd => 3,
            _ => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Aed => "AED",
            Currency::Sar => "SAR",
            Currency::Gbp => "GBP",
            Currency::Kwd => "KWD",
            Currency::Jpy => "JPY",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Currency {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "AED" => Ok(Currency::Aed),
            "SAR" => Ok(Currency::Sar),
            "GBP" => Ok(Currency::Gbp),
            "KWD" => Ok(Currency::Kwd),
            "JPY" => Ok(Currency::Jpy),
            _ => Err(ParseError::UnknownCurrency(s.to_string())),
        }
    }
}

/// A decimal amount tagged with its currency.
///
/// Arithmetic between two amounts is only defined for the same currency;
/// callers that sum prices of one offer tree rely on the tree having a single
/// currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Zero in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Builds an amount from minor units, e.g. `from_minor(1050, Usd)` is 10.50 USD.
    pub fn from_minor(minor: i64, currency: Currency) -> Self {
        Self {
            amount: Decimal::new(minor, currency.decimal_digits()),
            currency,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Adds another amount. The currency of `self` is kept.
    pub fn add(&self, other: Money) -> Money {
        Money {
            amount: self.amount + other.amount,
            currency: self.currency,
        }
    }

    pub fn subtract(&self, other: Money) -> Money {
        Money {
            amount: self.amount - other.amount,
            currency: self.currency,
        }
    }

    pub fn with_amount(&self, amount: Decimal) -> Money {
        Money {
            amount,
            currency: self.currency,
        }
    }

    /// Rounds up to the currency's minor unit.
    pub fn ceil(&self) -> Money {
        Money {
            amount: self
                .amount
                .round_dp_with_strategy(self.currency.decimal_digits(), RoundingStrategy::AwayFromZero),
            currency: self.currency,
        }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}
