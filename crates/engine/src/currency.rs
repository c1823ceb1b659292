use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Currency code of an account and of every amount booked against it.
///
/// Amounts are always stored as an `i64` number of **minor units**; the
/// engine never converts between currencies, a transfer only moves money
/// between two accounts sharing the same code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Ksh,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Usd, Currency::Eur, Currency::Ksh];

    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Ksh => "KSH",
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "KSH" => Ok(Currency::Ksh),
            other => Err(EngineError::CurrencyMismatch(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Currency::try_from("usd").unwrap(), Currency::Usd);
        assert_eq!(Currency::try_from(" Ksh ").unwrap(), Currency::Ksh);
    }

    #[test]
    fn unsupported_code_is_rejected() {
        assert_eq!(
            Currency::try_from("GBP").unwrap_err(),
            EngineError::CurrencyMismatch("unsupported currency: GBP".to_string())
        );
    }

    #[test]
    fn codes_roundtrip() {
        for currency in Currency::ALL {
            assert_eq!(Currency::try_from(currency.code()).unwrap(), currency);
        }
    }
}
