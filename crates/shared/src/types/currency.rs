//! Currency allow-list.
//!
//! Accounts carry a 3-letter ISO 4217 code. Only the codes below are accepted;
//! amounts are never converted between them.

use serde::{Deserialize, Serialize};

/// ISO 4217 currency codes supported by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US Dollar
    Usd,
    /// Euro
    Eur,
    /// Pound Sterling
    Gbp,
    /// Indonesian Rupiah
    Idr,
    /// Japanese Yen
    Jpy,
    /// Singapore Dollar
    Sgd,
    /// Canadian Dollar
    Cad,
    /// Australian Dollar
    Aud,
}

impl Currency {
    /// Every accepted currency, in display order.
    pub const ALL: [Self; 8] = [
        Self::Usd,
        Self::Eur,
        Self::Gbp,
        Self::Idr,
        Self::Jpy,
        Self::Sgd,
        Self::Cad,
        Self::Aud,
    ];

    /// Returns the ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Idr => "IDR",
            Self::Jpy => "JPY",
            Self::Sgd => "SGD",
            Self::Cad => "CAD",
            Self::Aud => "AUD",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| c.code() == upper)
            .ok_or_else(|| format!("Unknown currency: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case("USD", Currency::Usd)]
    #[case("usd", Currency::Usd)]
    #[case(" eur ", Currency::Eur)]
    #[case("IDR", Currency::Idr)]
    #[case("aud", Currency::Aud)]
    fn test_currency_from_str(#[case] input: &str, #[case] expected: Currency) {
        assert_eq!(Currency::from_str(input).unwrap(), expected);
    }

    #[rstest]
    #[case("XXX")]
    #[case("")]
    #[case("US")]
    fn test_currency_rejects_unknown(#[case] input: &str) {
        assert!(Currency::from_str(input).is_err());
    }

    #[test]
    fn test_currency_display_round_trips() {
        for currency in Currency::ALL {
            assert_eq!(Currency::from_str(&currency.to_string()).unwrap(), currency);
        }
    }
}
