use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{AllocationError, Result};

/// three-letter ISO 4217 style currency code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    pub fn new(code: &str) -> Result<Self> {
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_uppercase) {
            return Err(AllocationError::InvalidCurrencyCode {
                code: code.to_string(),
            });
        }
        Ok(Self([bytes[0], bytes[1], bytes[2]]))
    }

    pub fn as_str(&self) -> &str {
        // constructor only admits ascii
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = AllocationError;

    fn try_from(code: String) -> Result<Self> {
        CurrencyCode::new(&code)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.as_str().to_string()
    }
}

/// a currency together with the number of fraction digits amounts are kept at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency {
    pub code: CurrencyCode,
    pub digits: u8,
}

impl Currency {
    pub fn new(code: &str, digits: u8) -> Result<Self> {
        Ok(Self {
            code: CurrencyCode::new(code)?,
            digits,
        })
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.code, self.digits)
    }
}

/// Currency-scoped monetary amount.
///
/// Every value is rounded half-up to the currency's fraction digits. Binary
/// operations require both sides to share currency and scale and fail with
/// [`AllocationError::CurrencyMismatch`] otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "MoneyRepr")]
pub struct Money {
    amount: Decimal,
    currency: CurrencyCode,
    scale: u8,
}

/// wire form of [`Money`]; amounts are re-rounded to `scale` on the way in
#[derive(Deserialize)]
struct MoneyRepr {
    amount: Decimal,
    currency: CurrencyCode,
    scale: u8,
}

impl From<MoneyRepr> for Money {
    fn from(repr: MoneyRepr) -> Self {
        Money::at_scale(repr.amount, repr.currency, repr.scale)
    }
}

impl Money {
    /// create from decimal, rounding half-up to the currency digits
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self::at_scale(amount, currency.code, currency.digits)
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// create from integer amount (dollars, euros, etc)
    pub fn from_major(amount: i64, currency: Currency) -> Self {
        Self::new(Decimal::from(amount), currency)
    }

    /// create from string with exact parsing
    pub fn parse(s: &str, currency: Currency) -> Result<Self> {
        let amount = Decimal::from_str(s).map_err(|e| AllocationError::InvalidConfiguration {
            message: format!("invalid amount '{s}': {e}"),
        })?;
        Ok(Self::new(amount, currency))
    }

    fn at_scale(amount: Decimal, currency: CurrencyCode, scale: u8) -> Self {
        let mut amount =
            amount.round_dp_with_strategy(scale as u32, RoundingStrategy::MidpointAwayFromZero);
        amount.rescale(scale as u32);
        Self {
            amount,
            currency,
            scale,
        }
    }

    fn same(&self, amount: Decimal) -> Self {
        Self::at_scale(amount, self.currency, self.scale)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        Currency {
            code: self.currency,
            digits: self.scale,
        }
    }

    pub fn currency_code(&self) -> CurrencyCode {
        self.currency
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_greater_than_zero(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// fails when `other` is in a different currency or scale
    pub fn ensure_same_currency(&self, other: &Money) -> Result<()> {
        self.ensure_currency(other.currency())
    }

    pub fn ensure_currency(&self, currency: Currency) -> Result<()> {
        if self.currency() != currency {
            return Err(AllocationError::CurrencyMismatch {
                expected: currency.to_string(),
                found: self.currency().to_string(),
            });
        }
        Ok(())
    }

    pub fn plus(self, other: Money) -> Result<Money> {
        self.ensure_same_currency(&other)?;
        Ok(self.same(self.amount + other.amount))
    }

    /// subtract, never going below zero
    pub fn minus(self, other: Money) -> Result<Money> {
        self.ensure_same_currency(&other)?;
        Ok(self.same((self.amount - other.amount).max(Decimal::ZERO)))
    }

    /// subtract allowing a negative result, for diffing two allocations
    pub fn minus_unbounded(self, other: Money) -> Result<Money> {
        self.ensure_same_currency(&other)?;
        Ok(self.same(self.amount - other.amount))
    }

    pub fn min(self, other: Money) -> Result<Money> {
        self.ensure_same_currency(&other)?;
        Ok(if other.amount < self.amount { other } else { self })
    }

    pub fn is_greater_than(&self, other: &Money) -> Result<bool> {
        self.ensure_same_currency(other)?;
        Ok(self.amount > other.amount)
    }

    /// sum of an iterator of amounts, all in `currency`
    pub fn total<I>(currency: Currency, amounts: I) -> Result<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(currency), |acc, m| acc.plus(m))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency, self.amount)
    }
}
