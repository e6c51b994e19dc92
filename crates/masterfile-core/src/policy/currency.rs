use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Cny,
    Nzd,
    Jpy,
    Php,
    Eur,
    Jod,
    Ils,
}

impl Currency {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Cny => "CNY",
            Self::Nzd => "NZD",
            Self::Jpy => "JPY",
            Self::Php => "PHP",
            Self::Eur => "EUR",
            Self::Jod => "JOD",
            Self::Ils => "ILS",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Currency {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "CNY" | "RMB" => Ok(Self::Cny),
            "NZD" => Ok(Self::Nzd),
            "JPY" => Ok(Self::Jpy),
            "PHP" => Ok(Self::Php),
            "EUR" => Ok(Self::Eur),
            "JOD" => Ok(Self::Jod),
            "ILS" => Ok(Self::Ils),
            _ => Err(crate::Error::InvalidCurrency(s.to_string())),
        }
    }
}

/// A literal, case-sensitive token that identifies a currency in policy text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyToken {
    pub token: String,
    pub currency: Currency,
}

impl CurrencyToken {
    #[must_use]
    pub fn new(token: impl Into<String>, currency: Currency) -> Self {
        Self {
            token: token.into(),
            currency,
        }
    }
}

/// Scan order matters: `NZ$` has to be tried before the bare `$`.
pub fn default_tokens() -> Vec<CurrencyToken> {
    vec![
        CurrencyToken::new("¥", Currency::Cny),
        CurrencyToken::new("￥", Currency::Cny),
        CurrencyToken::new("RMB", Currency::Cny),
        CurrencyToken::new("Yuan", Currency::Cny),
        CurrencyToken::new("NZ$", Currency::Nzd),
        CurrencyToken::new("JPY", Currency::Jpy),
        CurrencyToken::new("PHP", Currency::Php),
        CurrencyToken::new("$", Currency::Usd),
    ]
}

pub fn detect(text: &str, tokens: &[CurrencyToken]) -> Option<Currency> {
    tokens
        .iter()
        .find(|t| text.contains(t.token.as_str()))
        .map(|t| t.currency)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_token_in_scan_order_wins() {
        let tokens = default_tokens();
        assert_eq!(detect("NZ$40 per night", &tokens), Some(Currency::Nzd));
        assert_eq!(detect("RMB 200, or $30", &tokens), Some(Currency::Cny));
        assert_eq!(detect("$30 per stay", &tokens), Some(Currency::Usd));
    }

    #[test]
    fn test_no_token_leaves_currency_absent() {
        assert_eq!(detect("A fee of 30 applies", &default_tokens()), None);
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!("RMB".parse::<Currency>().unwrap(), Currency::Cny);
        assert!("doubloons".parse::<Currency>().is_err());
    }
}
