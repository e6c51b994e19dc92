//! Scraped hotel exports, one JSON array per chain.
//!
//! Each chain's scraper names its fields differently and encodes nested data
//! either inline or as JSON strings. Records are decoded per chain and then
//! turned into masterfile rows with [`SourceRecord::into_hotel`].

pub mod fields;
mod records;

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::hotel::HotelRecord;
use crate::identity::IdentityKey;
use crate::policy::{AmountRule, Currency, CurrencyToken, PolicyNormalizer};
use crate::{Error, Result};

pub use records::{HiltonRecord, HyattRecord, IhgRecord, MarriottRecord};

use fields::{non_empty, parse_timestamp, split_locality, Scalar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chain {
    Hyatt,
    Hilton,
    Ihg,
    Marriott,
}

impl Chain {
    pub const ALL: [Self; 4] = [Self::Hyatt, Self::Hilton, Self::Ihg, Self::Marriott];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hyatt => "hyatt",
            Self::Hilton => "hilton",
            Self::Ihg => "ihg",
            Self::Marriott => "marriott",
        }
    }

    /// Value of the `chain_code` column.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Hyatt => "HYATT",
            Self::Hilton => "HILTON",
            Self::Ihg => "IHG",
            Self::Marriott => "MAR",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Hyatt => "Hyatt",
            Self::Hilton => "Hilton Hotels",
            Self::Ihg => "IHG",
            Self::Marriott => "Marriott International",
        }
    }

    pub fn source_name(&self) -> &'static str {
        match self {
            Self::Hyatt => "hyatt_hotels",
            Self::Hilton => "hilton_hotels",
            Self::Ihg => "ihg_scraper",
            Self::Marriott => "marriott_scraper",
        }
    }

    /// Where minted hotel codes start. `None` for chains whose export already
    /// carries a usable hotel code.
    pub fn first_counter(&self) -> Option<u64> {
        match self {
            Self::Hyatt => None,
            Self::Hilton => Some(5000),
            Self::Ihg => Some(1500),
            Self::Marriott => Some(1000),
        }
    }

    /// Whether a record matching a stored row by name and locality reuses
    /// that row's code instead of minting a new one.
    pub fn reuses_existing_codes(&self) -> bool {
        matches!(self, Self::Hilton)
    }

    pub fn format_code(&self, n: u64, base: Option<&str>) -> String {
        match self {
            Self::Hyatt => base.unwrap_or_default().to_string(),
            Self::Hilton => format!("{n}-{}", base.unwrap_or_default()),
            Self::Ihg => format!("{n}-{}", base.unwrap_or("unknown")),
            Self::Marriott => format!("{n}-MAR-{}", base.unwrap_or("UNKNOWN")),
        }
    }

    /// Hilton's Manila and Makati listings price in `P 1,500` style.
    pub fn policy_normalizer(&self, rule: AmountRule) -> PolicyNormalizer {
        let normalizer = PolicyNormalizer::new().with_amount_rule(rule);
        match self {
            Self::Hilton => normalizer.with_currency_token(CurrencyToken::new("P ", Currency::Php)),
            _ => normalizer,
        }
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Chain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hyatt" => Ok(Self::Hyatt),
            "hilton" => Ok(Self::Hilton),
            "ihg" => Ok(Self::Ihg),
            "marriott" | "mar" => Ok(Self::Marriott),
            _ => Err(Error::InvalidChain(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceRecord {
    Hyatt(HyattRecord),
    Hilton(HiltonRecord),
    Ihg(IhgRecord),
    Marriott(MarriottRecord),
}

impl SourceRecord {
    pub fn chain(&self) -> Chain {
        match self {
            Self::Hyatt(_) => Chain::Hyatt,
            Self::Hilton(_) => Chain::Hilton,
            Self::Ihg(_) => Chain::Ihg,
            Self::Marriott(_) => Chain::Marriott,
        }
    }

    /// The scraper's own property code.
    pub fn base_code(&self) -> Option<String> {
        let code = match self {
            Self::Hyatt(r) => r.hotel_code.as_ref(),
            Self::Hilton(r) => r.hotel_code.as_ref(),
            Self::Ihg(r) => r.hotel_code.as_ref(),
            Self::Marriott(r) => r.hotel_code.as_ref(),
        };
        code.and_then(Scalar::as_text)
    }

    pub fn hotel_name(&self) -> Option<String> {
        let name = match self {
            Self::Hyatt(r) => r.hotel_name.as_deref(),
            Self::Hilton(r) => r.hotel_name.as_deref(),
            Self::Ihg(r) => r.hotel_name.as_deref(),
            Self::Marriott(r) => r.hotel_name.as_deref(),
        };
        non_empty(name)
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        let raw = match self {
            Self::Hyatt(r) => r.last_updated.as_deref(),
            Self::Hilton(r) => r.last_updated.as_deref(),
            Self::Ihg(r) => r.last_updated.as_deref(),
            Self::Marriott(r) => r.last_updated.as_deref(),
        };
        parse_timestamp(raw)
    }

    /// The free-text pet policy as it will be stored.
    pub fn pet_policy(&self) -> Option<String> {
        match self {
            Self::Hyatt(r) => r.combined_pet_policy(),
            Self::Hilton(r) => r.pet_policy(),
            Self::Ihg(r) => r.pet_policy(),
            Self::Marriott(r) => r.pet_policy(),
        }
    }

    /// Lookup key for an already-stored row of the same property.
    pub fn identity_key(&self) -> Option<IdentityKey> {
        let name = self.hotel_name()?;
        let key = IdentityKey::new(self.chain().code(), &name);

        let key = match self {
            Self::Hyatt(r) => {
                let parts = split_locality(r.address_line_2.as_deref());
                key.with_locality(
                    parts.city.as_deref(),
                    parts.state.as_deref(),
                    parts.country.as_deref(),
                )
            }
            Self::Hilton(r) => key.with_locality(
                r.city.as_deref(),
                r.state.as_deref(),
                r.country.as_deref(),
            ),
            Self::Ihg(_) => key,
            Self::Marriott(r) => key.with_locality(
                r.city.as_deref(),
                r.state.as_deref(),
                r.country.as_deref(),
            ),
        };

        Some(key)
    }

    /// Builds the masterfile row under `code`. Fails when the record has no
    /// hotel name.
    pub fn into_hotel(&self, code: String, normalizer: &PolicyNormalizer) -> Result<HotelRecord> {
        let name = self.hotel_name().ok_or_else(|| Error::InvalidRecord {
            chain: self.chain().to_string(),
            reason: "missing hotel_name".to_string(),
        })?;

        let mut hotel = match self {
            Self::Hyatt(r) => r.to_hotel(code, name, normalizer),
            Self::Hilton(r) => r.to_hotel(code, name, normalizer),
            Self::Ihg(r) => r.to_hotel(code, name, normalizer),
            Self::Marriott(r) => r.to_hotel(code, name, normalizer),
        };
        hotel.last_updated = self.last_updated();

        Ok(hotel)
    }
}

fn decode_record(chain: Chain, value: Value) -> serde_json::Result<SourceRecord> {
    Ok(match chain {
        Chain::Hyatt => SourceRecord::Hyatt(serde_json::from_value(value)?),
        Chain::Hilton => SourceRecord::Hilton(serde_json::from_value(value)?),
        Chain::Ihg => SourceRecord::Ihg(serde_json::from_value(value)?),
        Chain::Marriott => SourceRecord::Marriott(serde_json::from_value(value)?),
    })
}

/// Decodes a chain export. Elements that do not fit the chain's layout are
/// logged and skipped; a document that is not a JSON array is an error.
pub fn parse_records(chain: Chain, json: &str) -> Result<Vec<SourceRecord>> {
    let values: Vec<Value> = serde_json::from_str(json)?;
    let total = values.len();

    let records: Vec<SourceRecord> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match decode_record(chain, value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(%chain, index, error = %e, "Skipping malformed record");
                None
            }
        })
        .collect();

    tracing::debug!(%chain, total, decoded = records.len(), "Decoded export");
    Ok(records)
}

pub async fn load_records(chain: Chain, path: impl AsRef<Path>) -> Result<Vec<SourceRecord>> {
    let json = tokio::fs::read_to_string(path.as_ref()).await?;
    parse_records(chain, &json)
}
