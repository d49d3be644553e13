//! Prices in Mexican pesos.
//!
//! Amounts use decimal arithmetic so cart totals never pick up float drift.
//! On the wire the amount is a plain JSON number, which is what the
//! storefront backend sends and expects.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (pesos, not centavos).
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// ISO 4217 currency code.
    #[serde(default)]
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Price in Mexican pesos.
    #[must_use]
    pub const fn mxn(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::MXN)
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

/// Formats as `$598.00 MXN`.
impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:.2} {}",
            self.currency_code.symbol(),
            self.amount.round_dp(2),
            self.currency_code.code()
        )
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    MXN,
    USD,
}

impl CurrencyCode {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MXN => "MXN",
            Self::USD => "USD",
        }
    }

    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::MXN | Self::USD => "$",
        }
    }
}
