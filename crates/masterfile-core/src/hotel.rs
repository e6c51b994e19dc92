use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::matching::Matchable;
use crate::policy::{Currency, FeeInterval, FeeSchedule, ParsedPolicy};

/// One row of the hotel masterfile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotelRecord {
    pub hotel_code: String,
    pub chain_code: Option<String>,
    pub chain: Option<String>,
    pub name: String,
    pub state_code: Option<String>,
    pub state: Option<String>,
    pub country_code: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub full_address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub primary_airport_code: Option<String>,
    pub description: Option<String>,
    pub phone_number: Option<String>,
    pub fax_number: Option<String>,
    pub sabre_rating: Option<f64>,
    pub links: Option<serde_json::Value>,
    pub parking: Option<serde_json::Value>,
    pub is_pet_friendly: Option<bool>,
    pub pet_policy: Option<String>,
    pub pet_fee_night: Option<Decimal>,
    pub pet_fee_total_max: Option<Decimal>,
    pub pet_fee_deposit: Option<Decimal>,
    pub pet_fee_currency: Option<Currency>,
    pub pet_fee_interval: Option<FeeInterval>,
    pub pet_fee_variations: Option<serde_json::Value>,
    pub has_pet_deposit: Option<bool>,
    pub is_deposit_refundable: Option<bool>,
    pub allowed_pet_types: Option<String>,
    pub weight_limit: Option<String>,
    pub max_pets: Option<u32>,
    pub has_pet_friendly_rooms: Option<bool>,
    pub pet_amenities: Option<serde_json::Value>,
    pub nearby_parks: Option<serde_json::Value>,
    pub source: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl HotelRecord {
    #[must_use]
    pub fn new(hotel_code: String, name: String) -> Self {
        Self {
            hotel_code,
            name,
            ..Self::default()
        }
    }

    /// Copies the normalized pet policy into the pet-fee columns.
    pub fn apply_policy(&mut self, policy: &ParsedPolicy) {
        self.pet_fee_total_max = policy.fee;
        self.pet_fee_deposit = policy.deposit;
        self.pet_fee_currency = policy.currency;
        self.pet_fee_interval = policy.interval;
        self.allowed_pet_types.clone_from(&policy.pet_types);
        self.weight_limit.clone_from(&policy.weight_limit);
        self.max_pets = policy.max_pets;
        self.has_pet_deposit = Some(policy.has_deposit());
    }

    /// Overrides the fee columns with a labelled fee schedule.
    pub fn apply_fee_schedule(&mut self, schedule: &FeeSchedule) {
        self.pet_fee_night = schedule.per_night;
        self.pet_fee_total_max = schedule.per_stay;
        self.pet_fee_deposit = schedule.deposit;
        self.pet_fee_currency = schedule.currency;
        self.pet_fee_interval = schedule.interval;
        self.pet_fee_variations = schedule.variations();
        self.has_pet_deposit = Some(schedule.has_deposit);
        self.is_deposit_refundable = schedule.deposit_refundable;
    }
}

impl Matchable for HotelRecord {
    fn display_name(&self) -> Option<&str> {
        Some(self.name.as_str())
    }

    fn country_code(&self) -> Option<&str> {
        self.country_code.as_deref()
    }

    fn chain_code(&self) -> Option<&str> {
        self.chain_code.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::normalize;

    #[test]
    fn test_apply_policy() {
        let mut hotel = HotelRecord::new("1500-ABC".into(), "Test Inn".into());
        hotel.apply_policy(&normalize(Some(
            "A refundable deposit of $150 is required. Up to 2 dogs under 40 lbs.",
        )));

        assert_eq!(hotel.pet_fee_deposit, Some(Decimal::from(150)));
        assert_eq!(hotel.pet_fee_total_max, None);
        assert_eq!(hotel.pet_fee_currency, Some(Currency::Usd));
        assert_eq!(hotel.allowed_pet_types.as_deref(), Some("dog"));
        assert_eq!(hotel.weight_limit.as_deref(), Some("40 lbs"));
        assert_eq!(hotel.max_pets, Some(2));
        assert_eq!(hotel.has_pet_deposit, Some(true));
    }

    #[test]
    fn test_apply_fee_schedule() {
        let mut hotel = HotelRecord::new("1000-MAR-XYZ".into(), "Test Suites".into());
        hotel.apply_fee_schedule(&FeeSchedule::parse(Some("25 USD Per Night")));

        assert_eq!(hotel.pet_fee_night, Some(Decimal::from(25)));
        assert_eq!(hotel.pet_fee_interval, Some(FeeInterval::PerNight));
        assert_eq!(hotel.has_pet_deposit, Some(false));
        assert_eq!(hotel.is_deposit_refundable, Some(true));
        assert!(hotel.pet_fee_variations.is_some());
    }
}
