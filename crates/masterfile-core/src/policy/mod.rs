//! Free-text pet policy normalization.
//!
//! Chains publish pet policies as prose ("Dogs up to 25 lbs are welcome for a
//! $75 non-refundable fee per stay"). [`PolicyNormalizer`] turns that prose into
//! a [`ParsedPolicy`] with permissive heuristics: it never fails, and a field it
//! cannot determine is left absent instead of guessed.

mod currency;
pub mod fees;

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use currency::{Currency, CurrencyToken};
pub use fees::FeeSchedule;

const FREE_PHRASES: &[&str] = &[
    "no extra charge",
    "no additional charge",
    "free of charge",
    "at no charge",
];

static AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("amount pattern is valid"));

static WEIGHT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+\s*(?:kgs|kg|lbs|lb|pounds)\b").expect("weight pattern is valid")
});

const DEFAULT_MAX_PETS_ANCHORS: &[&str] = &[
    r"(?i)maximum number of pets is\s*(\d+)",
    r"(?i)up to\s*(\d+)\s*(?:pets?|cats?|dogs?)\b",
    r"(?i)(\d+)\s*pets\b",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeInterval {
    PerStay,
    PerNight,
}

impl FeeInterval {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerStay => "per_stay",
            Self::PerNight => "per_night",
        }
    }
}

impl std::fmt::Display for FeeInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeeInterval {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(' ', "_").as_str() {
            "per_stay" => Ok(Self::PerStay),
            "per_night" => Ok(Self::PerNight),
            _ => Err(crate::Error::InvalidInterval(s.to_string())),
        }
    }
}

/// Which extracted number becomes the fee or deposit when a policy mentions
/// several. The same rule is applied to both fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountRule {
    #[default]
    FirstNumberWins,
    LastNumberWins,
}

impl AmountRule {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstNumberWins => "first",
            Self::LastNumberWins => "last",
        }
    }

    pub fn select(self, amounts: &[Decimal]) -> Option<Decimal> {
        match self {
            Self::FirstNumberWins => amounts.first().copied(),
            Self::LastNumberWins => amounts.last().copied(),
        }
    }
}

impl std::fmt::Display for AmountRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AmountRule {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "first-number-wins" => Ok(Self::FirstNumberWins),
            "last" | "last-number-wins" => Ok(Self::LastNumberWins),
            _ => Err(crate::Error::InvalidAmountRule(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPolicy {
    pub fee: Option<Decimal>,
    pub deposit: Option<Decimal>,
    pub currency: Option<Currency>,
    pub interval: Option<FeeInterval>,
    pub pet_types: Option<String>,
    pub weight_limit: Option<String>,
    pub max_pets: Option<u32>,
    pub is_free: bool,
}

impl ParsedPolicy {
    #[must_use]
    pub fn free() -> Self {
        Self {
            fee: Some(Decimal::ZERO),
            is_free: true,
            ..Self::default()
        }
    }

    pub fn has_deposit(&self) -> bool {
        self.deposit.is_some_and(|d| !d.is_zero())
    }
}

#[derive(Debug, Clone)]
pub struct PolicyNormalizer {
    currencies: Vec<CurrencyToken>,
    amount_rule: AmountRule,
    max_pets_anchors: Vec<Regex>,
}

impl PolicyNormalizer {
    #[must_use]
    pub fn new() -> Self {
        let mut normalizer = Self {
            currencies: currency::default_tokens(),
            amount_rule: AmountRule::default(),
            max_pets_anchors: Vec::new(),
        };

        for pattern in DEFAULT_MAX_PETS_ANCHORS {
            if let Ok(re) = Regex::new(pattern) {
                normalizer.max_pets_anchors.push(re);
            }
        }

        normalizer
    }

    #[must_use]
    pub fn with_amount_rule(mut self, rule: AmountRule) -> Self {
        self.amount_rule = rule;
        self
    }

    /// Appends a token to the end of the currency scan order.
    #[must_use]
    pub fn with_currency_token(mut self, token: CurrencyToken) -> Self {
        self.currencies.push(token);
        self
    }

    /// Adds a max-pets anchor. The pattern's first capture group must be the count.
    pub fn with_max_pets_anchor(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.max_pets_anchors.push(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn amount_rule(&self) -> AmountRule {
        self.amount_rule
    }

    pub fn normalize(&self, text: Option<&str>) -> ParsedPolicy {
        let Some(raw) = text.filter(|t| !t.trim().is_empty()) else {
            return ParsedPolicy::default();
        };

        let lower = raw.to_lowercase();

        if FREE_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
            return ParsedPolicy::free();
        }

        let amounts = extract_amounts(raw);

        let (fee, deposit) = if lower.contains("deposit") {
            (None, self.amount_rule.select(&amounts))
        } else if lower.contains("fee") {
            (self.amount_rule.select(&amounts), None)
        } else {
            (None, None)
        };

        ParsedPolicy {
            fee,
            deposit,
            currency: currency::detect(raw, &self.currencies),
            interval: detect_interval(&lower),
            pet_types: detect_pet_types(&lower),
            weight_limit: WEIGHT.find(raw).map(|m| m.as_str().to_string()),
            max_pets: self.detect_max_pets(raw),
            is_free: false,
        }
    }

    fn detect_max_pets(&self, text: &str) -> Option<u32> {
        self.max_pets_anchors.iter().find_map(|anchor| {
            anchor
                .captures(text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse().ok())
        })
    }
}

impl Default for PolicyNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalizes with the default vocabulary and first-number-wins amounts.
pub fn normalize(text: Option<&str>) -> ParsedPolicy {
    static DEFAULT: LazyLock<PolicyNormalizer> = LazyLock::new(PolicyNormalizer::new);
    DEFAULT.normalize(text)
}

/// Every decimal in the text, left to right. Tokens that do not parse are dropped.
pub fn extract_amounts(text: &str) -> Vec<Decimal> {
    AMOUNT
        .find_iter(text)
        .filter_map(|m| Decimal::from_str(&m.as_str().replace(',', "")).ok())
        .collect()
}

fn detect_interval(lower: &str) -> Option<FeeInterval> {
    if lower.contains("per night") {
        Some(FeeInterval::PerNight)
    } else if lower.contains("per stay") {
        Some(FeeInterval::PerStay)
    } else {
        None
    }
}

fn detect_pet_types(lower: &str) -> Option<String> {
    let types: Vec<&str> = ["dog", "cat"]
        .into_iter()
        .filter(|kind| lower.contains(kind))
        .collect();

    if types.is_empty() {
        None
    } else {
        Some(types.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn test_absent_and_empty_text() {
        assert_eq!(normalize(None), ParsedPolicy::default());
        assert_eq!(normalize(Some("")), ParsedPolicy::default());
        assert!(!normalize(Some("   ")).is_free);
    }

    #[test]
    fn test_free_phrase_suppresses_numbers() {
        let parsed = normalize(Some("Up to 2 dogs, 50 lbs, FREE OF CHARGE, deposit $100"));
        assert_eq!(parsed, ParsedPolicy::free());
        assert_eq!(parsed.fee, Some(Decimal::ZERO));
        assert!(parsed.is_free);
        assert!(parsed.pet_types.is_none());
    }

    #[test]
    fn test_deposit_per_night_usd() {
        let parsed = normalize(Some("$50 per night deposit"));
        assert_eq!(parsed.currency, Some(Currency::Usd));
        assert_eq!(parsed.deposit, Some(dec(50)));
        assert_eq!(parsed.fee, None);
        assert_eq!(parsed.interval, Some(FeeInterval::PerNight));
    }

    #[test]
    fn test_pet_types_weight_and_count() {
        let parsed = normalize(Some("Dogs and cats allowed, up to 2 pets, 25 lbs weight limit"));
        assert_eq!(parsed.pet_types.as_deref(), Some("dog, cat"));
        assert_eq!(parsed.max_pets, Some(2));
        assert_eq!(parsed.weight_limit.as_deref(), Some("25 lbs"));
    }

    #[test]
    fn test_numbers_without_keyword_are_not_assigned() {
        let parsed = normalize(Some("Dogs under 30 lbs welcome, $25 per stay"));
        assert_eq!(parsed.fee, None);
        assert_eq!(parsed.deposit, None);
        assert_eq!(parsed.interval, Some(FeeInterval::PerStay));
    }

    #[test]
    fn test_amount_rule_applies_to_fee() {
        let text = "Pet fee: $1,250.50 for the first week, $75 thereafter";
        let first = PolicyNormalizer::new().normalize(Some(text));
        let last = PolicyNormalizer::new()
            .with_amount_rule(AmountRule::LastNumberWins)
            .normalize(Some(text));

        assert_eq!(first.fee, Some(Decimal::from_str("1250.50").unwrap()));
        assert_eq!(last.fee, Some(dec(75)));
    }

    #[test]
    fn test_per_night_checked_before_per_stay() {
        let parsed = normalize(Some("Fee of 20 per night, max 100 per stay"));
        assert_eq!(parsed.interval, Some(FeeInterval::PerNight));
    }

    #[test]
    fn test_max_pets_anchor_variants() {
        assert_eq!(
            normalize(Some("The maximum number of pets is 3.")).max_pets,
            Some(3)
        );
        assert_eq!(normalize(Some("Up to 1 dog per room")).max_pets, Some(1));
        assert_eq!(normalize(Some("2 pets per room")).max_pets, Some(2));
        assert_eq!(normalize(Some("Pets welcome")).max_pets, None);
    }

    #[test]
    fn test_weight_units() {
        assert_eq!(
            normalize(Some("Dogs under 10kgs")).weight_limit.as_deref(),
            Some("10kgs")
        );
        assert_eq!(
            normalize(Some("Pets up to 40 Pounds")).weight_limit.as_deref(),
            Some("40 Pounds")
        );
    }

    #[test]
    fn test_unparseable_amounts_are_dropped() {
        let amounts = extract_amounts("fee 99999999999999999999999999999999999 or 40");
        assert_eq!(amounts, vec![dec(40)]);
    }

    #[test]
    fn test_extra_currency_token() {
        let normalizer =
            PolicyNormalizer::new().with_currency_token(CurrencyToken::new("P ", Currency::Php));
        let parsed = normalizer.normalize(Some("Pet fee P 500 per stay"));
        assert_eq!(parsed.currency, Some(Currency::Php));
        assert_eq!(parsed.fee, Some(dec(500)));
    }

    #[test]
    fn test_custom_max_pets_anchor() {
        let normalizer = PolicyNormalizer::new()
            .with_max_pets_anchor(r"(?i)limit of (\d+) animals")
            .unwrap();
        assert_eq!(
            normalizer.normalize(Some("A limit of 4 animals")).max_pets,
            Some(4)
        );
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let text = Some("Non-refundable pet fee of NZ$80 per stay. Maximum number of pets is 2.");
        assert_eq!(normalize(text), normalize(text));
    }

    #[test]
    fn test_amount_rule_from_str() {
        assert_eq!("last".parse::<AmountRule>().unwrap(), AmountRule::LastNumberWins);
        assert_eq!(
            "first-number-wins".parse::<AmountRule>().unwrap(),
            AmountRule::FirstNumberWins
        );
        assert!("middle".parse::<AmountRule>().is_err());
    }
}
