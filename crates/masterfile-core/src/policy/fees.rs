//! Labelled fee lines such as `75.00 USD Per Stay` or `150 Deposit`.
//!
//! Marriott exports list fees this way instead of prose, so amounts are read
//! by their label rather than by the keyword heuristics of the free-text path.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Currency, FeeInterval};

static LABELLED_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,]*(?:\.\d+)?)\s*(USD|JOD|EUR|ILS)?\s*(per stay|per night|deposit)?")
        .expect("fee pattern is valid")
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub per_night: Option<Decimal>,
    pub per_stay: Option<Decimal>,
    pub deposit: Option<Decimal>,
    pub currency: Option<Currency>,
    pub interval: Option<FeeInterval>,
    pub has_deposit: bool,
    pub deposit_refundable: Option<bool>,
    pub raw: Option<String>,
}

impl FeeSchedule {
    /// Unlabelled numbers are ignored. An amount without a currency code is USD.
    pub fn parse(text: Option<&str>) -> Self {
        let Some(raw) = text.filter(|t| !t.trim().is_empty()) else {
            return Self::default();
        };

        let mut schedule = Self {
            raw: Some(raw.to_string()),
            deposit_refundable: Some(!raw.to_lowercase().contains("non-refundable")),
            ..Self::default()
        };

        for caps in LABELLED_AMOUNT.captures_iter(raw) {
            let Some(label) = caps.get(3).map(|m| m.as_str().to_lowercase()) else {
                continue;
            };
            let Some(amount) = caps
                .get(1)
                .and_then(|m| Decimal::from_str(&m.as_str().replace(',', "")).ok())
            else {
                continue;
            };

            schedule.currency = caps
                .get(2)
                .and_then(|m| m.as_str().parse().ok())
                .or(Some(Currency::Usd));

            match label.as_str() {
                "per night" => {
                    schedule.per_night = Some(amount);
                    schedule.interval = Some(FeeInterval::PerNight);
                }
                "per stay" => {
                    schedule.per_stay = Some(amount);
                    schedule.interval = Some(FeeInterval::PerStay);
                }
                _ => {
                    schedule.deposit = Some(amount);
                    schedule.has_deposit = true;
                }
            }
        }

        schedule
    }

    /// The raw text wrapped the way the masterfile stores fee variations.
    pub fn variations(&self) -> Option<serde_json::Value> {
        self.raw
            .as_ref()
            .map(|raw| serde_json::json!({ "raw": raw }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labelled_amounts() {
        let schedule =
            FeeSchedule::parse(Some("75 USD Per Stay, 100 Deposit (non-refundable)"));

        assert_eq!(schedule.per_stay, Some(Decimal::from(75)));
        assert_eq!(schedule.deposit, Some(Decimal::from(100)));
        assert_eq!(schedule.per_night, None);
        assert_eq!(schedule.currency, Some(Currency::Usd));
        assert_eq!(schedule.interval, Some(FeeInterval::PerStay));
        assert!(schedule.has_deposit);
        assert_eq!(schedule.deposit_refundable, Some(false));
    }

    #[test]
    fn test_currency_code_and_night_rate() {
        let schedule = FeeSchedule::parse(Some("Pet fee: 35.50 EUR per night"));

        assert_eq!(schedule.per_night, Some(Decimal::from_str("35.50").unwrap()));
        assert_eq!(schedule.currency, Some(Currency::Eur));
        assert_eq!(schedule.deposit_refundable, Some(true));
        assert!(!schedule.has_deposit);
    }

    #[test]
    fn test_unlabelled_numbers_ignored() {
        let schedule = FeeSchedule::parse(Some("2 pets, 25 lbs"));

        assert_eq!(schedule.per_stay, None);
        assert_eq!(schedule.currency, None);
        assert_eq!(
            schedule.variations(),
            Some(serde_json::json!({ "raw": "2 pets, 25 lbs" }))
        );
    }

    #[test]
    fn test_thousands_separator() {
        let schedule = FeeSchedule::parse(Some("1,500 PHP cleaning, 1,000 USD Per Stay"));

        assert_eq!(schedule.per_stay, Some(Decimal::from(1000)));
        assert_eq!(schedule.currency, Some(Currency::Usd));
        assert_eq!(schedule.deposit, None);
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(FeeSchedule::parse(None), FeeSchedule::default());
        assert_eq!(FeeSchedule::parse(Some("")).variations(), None);
    }
}
