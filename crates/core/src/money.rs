//! Monetary values: a decimal amount tagged with a currency code.
//!
//! Amounts in different currencies are never combined. Addition is only
//! offered through [`Money::checked_add`] / [`Money::try_add_assign`], which
//! report a [`DomainError::CurrencyMismatch`] instead of producing a number
//! that mixes units.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// ISO-4217 style currency code (e.g. "USD", "EUR").
///
/// Codes are stored upper-cased; construction rejects empty or non-alphanumeric
/// input so two spellings of the same currency always compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl AsRef<str>) -> DomainResult<Self> {
        let code = code.as_ref().trim();
        if code.is_empty() {
            return Err(DomainError::validation("currency code cannot be empty"));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::validation(format!(
                "currency code must be alphanumeric: {code:?}"
            )));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.0
    }
}

impl ValueObject for CurrencyCode {}

/// A decimal amount paired with a currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: CurrencyCode,
}

impl Money {
    pub fn new(amount: Decimal, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    /// Zero in the given currency; the identity for addition within it.
    pub fn zero(currency: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn same_currency(&self, other: &Money) -> bool {
        self.currency == other.currency
    }

    /// Sum of two amounts in the same currency.
    pub fn checked_add(&self, other: &Money) -> DomainResult<Money> {
        if !self.same_currency(other) {
            return Err(DomainError::currency_mismatch(
                self.currency.as_str(),
                other.currency.as_str(),
            ));
        }
        let amount = self.amount.checked_add(other.amount).ok_or_else(|| {
            DomainError::overflow(format!("{self} + {other}"))
        })?;
        Ok(Money {
            amount,
            currency: self.currency.clone(),
        })
    }

    /// In-place variant of [`Money::checked_add`]; `self` is unchanged on error.
    pub fn try_add_assign(&mut self, other: &Money) -> DomainResult<()> {
        *self = self.checked_add(other)?;
        Ok(())
    }

    /// Scale a unit price by a quantity (same currency).
    pub fn times(&self, quantity: Decimal) -> DomainResult<Money> {
        let amount = self
            .amount
            .checked_mul(quantity)
            .ok_or_else(|| DomainError::overflow(format!("{self} x {quantity}")))?;
        Ok(Money {
            amount,
            currency: self.currency.clone(),
        })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

impl ValueObject for Money {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn usd() -> CurrencyCode {
        CurrencyCode::new("USD").unwrap()
    }

    fn eur() -> CurrencyCode {
        CurrencyCode::new("EUR").unwrap()
    }

    #[test]
    fn currency_codes_are_normalized() {
        assert_eq!(CurrencyCode::new(" usd ").unwrap(), usd());
        assert!(CurrencyCode::new("").is_err());
        assert!(CurrencyCode::new("US$").is_err());
    }

    #[test]
    fn currency_code_deserialization_validates() {
        let code: CurrencyCode = serde_json::from_str("\"eur\"").unwrap();
        assert_eq!(code, eur());
        assert!(serde_json::from_str::<CurrencyCode>("\"\"").is_err());
    }

    #[test]
    fn adding_same_currency_sums_amounts() {
        let a = Money::new(dec!(10.50), usd());
        let b = Money::new(dec!(4.25), usd());
        assert_eq!(a.checked_add(&b).unwrap(), Money::new(dec!(14.75), usd()));
    }

    #[test]
    fn adding_different_currencies_is_rejected() {
        let mut a = Money::new(dec!(10), usd());
        let b = Money::new(dec!(1), eur());

        let err = a.try_add_assign(&b).unwrap_err();
        assert_eq!(err, DomainError::currency_mismatch("USD", "EUR"));
        assert_eq!(a.amount, dec!(10));
    }

    #[test]
    fn times_scales_by_quantity() {
        let price = Money::new(dec!(2.5), usd());
        assert_eq!(price.times(dec!(4)).unwrap(), Money::new(dec!(10.0), usd()));
        assert_eq!(price.to_string(), "2.5 USD");
    }

    #[test]
    fn out_of_range_results_are_errors() {
        let price = Money::new(dec!(10000000000000), usd());
        let err = price.times(dec!(10000000000000000)).unwrap_err();
        assert!(matches!(err, DomainError::Overflow(_)));

        let mut big = Money::new(Decimal::MAX, usd());
        let err = big.try_add_assign(&Money::new(dec!(1), usd())).unwrap_err();
        assert!(matches!(err, DomainError::Overflow(_)));
        assert_eq!(big.amount, Decimal::MAX);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: zero is the identity for addition within a currency.
        #[test]
        fn zero_is_additive_identity(cents in -1_000_000i64..1_000_000i64) {
            let m = Money::new(Decimal::new(cents, 2), usd());
            let sum = Money::zero(usd()).checked_add(&m).unwrap();
            prop_assert_eq!(sum, m);
        }
    }
}
