//! The canonical property list (one CSV row per property) and how its values
//! overlay a matched masterfile row.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::hotel::HotelRecord;
use crate::identity::normalize_hotel_code;
use crate::matching::Matchable;
use crate::Result;

/// `source` of rows rewritten from a reference match.
pub const MAPPED_SOURCE: &str = "CSL_EXCEL_SCRAPING_MAPPED";

pub const MAX_SABRE_RATING: f64 = 99.9;
pub const MAX_PETS_CAP: u32 = 150;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceProperty {
    #[serde(rename = "Global Property ID")]
    pub property_id: Option<String>,
    #[serde(rename = "Global Property Name")]
    pub name: Option<String>,
    #[serde(rename = "Global Chain Code")]
    pub chain_code: Option<String>,
    #[serde(rename = "Property Country Code")]
    pub country_code: Option<String>,
    #[serde(rename = "Property State/Province")]
    pub state: Option<String>,
    #[serde(rename = "Property City Name")]
    pub city: Option<String>,
    #[serde(rename = "Property Zip/Postal")]
    pub postal_code: Option<String>,
    #[serde(rename = "Property Address 1")]
    pub address_line_1: Option<String>,
    #[serde(rename = "Property Address 2")]
    pub address_line_2: Option<String>,
    #[serde(rename = "Property Latitude", default, deserialize_with = "csv::invalid_option")]
    pub latitude: Option<f64>,
    #[serde(rename = "Property Longitude", default, deserialize_with = "csv::invalid_option")]
    pub longitude: Option<f64>,
    #[serde(rename = "Primary Airport Code")]
    pub primary_airport_code: Option<String>,
    #[serde(rename = "Property Phone Number")]
    pub phone_number: Option<String>,
    #[serde(rename = "Property Fax Number")]
    pub fax_number: Option<String>,
    #[serde(rename = "Sabre Property Rating", default, deserialize_with = "csv::invalid_option")]
    pub sabre_rating: Option<f64>,
}

impl Matchable for ReferenceProperty {
    fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn country_code(&self) -> Option<&str> {
        self.country_code.as_deref()
    }

    fn chain_code(&self) -> Option<&str> {
        self.chain_code.as_deref()
    }
}

fn overlay(reference: Option<&String>, master: Option<&String>) -> Option<String> {
    reference
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| master.cloned())
}

/// Reference values win wherever they are present. The rating and pet count
/// are clipped to what the masterfile columns accept.
pub fn merge(master: &HotelRecord, reference: &ReferenceProperty) -> HotelRecord {
    let mut merged = master.clone();

    merged.hotel_code = reference
        .property_id
        .as_deref()
        .and_then(normalize_hotel_code)
        .or_else(|| normalize_hotel_code(&master.hotel_code))
        .unwrap_or_else(|| master.hotel_code.clone());

    if let Some(name) = overlay(reference.name.as_ref(), None) {
        merged.name = name;
    }

    merged.chain_code = overlay(reference.chain_code.as_ref(), master.chain_code.as_ref());
    merged.state_code = overlay(reference.state.as_ref(), master.state_code.as_ref());
    merged.country_code = overlay(reference.country_code.as_ref(), master.country_code.as_ref());
    merged.city = overlay(reference.city.as_ref(), master.city.as_ref());
    merged.postal_code = overlay(reference.postal_code.as_ref(), master.postal_code.as_ref());
    merged.address_line_1 =
        overlay(reference.address_line_1.as_ref(), master.address_line_1.as_ref());
    merged.address_line_2 =
        overlay(reference.address_line_2.as_ref(), master.address_line_2.as_ref());
    merged.primary_airport_code = overlay(
        reference.primary_airport_code.as_ref(),
        master.primary_airport_code.as_ref(),
    );
    merged.phone_number = overlay(reference.phone_number.as_ref(), master.phone_number.as_ref());
    merged.fax_number = overlay(reference.fax_number.as_ref(), master.fax_number.as_ref());
    merged.latitude = reference.latitude.or(master.latitude);
    merged.longitude = reference.longitude.or(master.longitude);

    merged.sabre_rating = reference
        .sabre_rating
        .or(master.sabre_rating)
        .map(|r| r.min(MAX_SABRE_RATING));
    merged.max_pets = master.max_pets.map(|n| n.min(MAX_PETS_CAP));
    merged.source = Some(MAPPED_SOURCE.to_string());

    merged
}

/// Reads reference rows. Rows that fail to decode or have no property name
/// are skipped.
pub fn read_references<R: io::Read>(reader: R) -> Result<Vec<ReferenceProperty>> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut references = Vec::new();
    for (line, row) in csv.deserialize::<ReferenceProperty>().enumerate() {
        match row {
            Ok(reference) if reference.name.as_deref().is_some_and(|n| !n.is_empty()) => {
                references.push(reference);
            }
            Ok(_) => tracing::debug!(line, "Skipping reference row without a name"),
            Err(e) => tracing::warn!(line, error = %e, "Skipping malformed reference row"),
        }
    }

    tracing::info!(count = references.len(), "Loaded reference properties");
    Ok(references)
}

pub fn load_references(path: impl AsRef<Path>) -> Result<Vec<ReferenceProperty>> {
    let file = std::fs::File::open(path.as_ref())?;
    read_references(io::BufReader::new(file))
}
