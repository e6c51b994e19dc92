use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::fields::{
    decode_json, non_empty, normalize_phone, primary_airport_code, split_locality, Scalar,
};
use super::Chain;
use crate::hotel::HotelRecord;
use crate::policy::{FeeSchedule, PolicyNormalizer};

/// Pulls the policy sentence out of a decoded `pets_json` object, trying each
/// key in order and then falling back to the first string value.
fn policy_text(pets: Option<&Value>, keys: &[&str], any_value: bool) -> Option<String> {
    let pets = decode_json(pets)?;
    let map = pets.as_object()?;

    let keyed = keys
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str).and_then(|s| non_empty(Some(s))));

    if keyed.is_some() || !any_value {
        return keyed;
    }

    map.values()
        .find_map(|v| v.as_str().and_then(|s| non_empty(Some(s))))
}

fn base_hotel(chain: Chain, code: String, name: String) -> HotelRecord {
    let mut hotel = HotelRecord::new(code, name);
    hotel.chain_code = Some(chain.code().to_string());
    hotel.chain = Some(chain.name().to_string());
    hotel.source = Some(chain.source_name().to_string());
    hotel
}

fn link(key: &str, url: Option<&str>) -> Option<Value> {
    non_empty(url).map(|url| json!({ key: url }))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HyattRecord {
    pub hotel_code: Option<Scalar>,
    pub hotel_name: Option<String>,
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub phone: Option<String>,
    pub hotel_url: Option<String>,
    pub pet_policy_description: Option<String>,
    pub pet_fees_json: Option<Value>,
    pub amenities_json: Option<Value>,
    pub last_updated: Option<String>,
}

impl HyattRecord {
    /// The description followed by one line per listed fee.
    pub fn combined_pet_policy(&self) -> Option<String> {
        let mut policy = self.pet_policy_description.clone().unwrap_or_default();

        let fees: Vec<String> = decode_json(self.pet_fees_json.as_ref())
            .and_then(|v| v.as_array().cloned())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();

        if !fees.is_empty() {
            policy.push('\n');
            policy.push_str(&fees.join("\n"));
        }

        non_empty(Some(&policy)).map(|_| policy)
    }

    pub(super) fn to_hotel(
        &self,
        code: String,
        name: String,
        normalizer: &PolicyNormalizer,
    ) -> HotelRecord {
        let mut hotel = base_hotel(Chain::Hyatt, code, name);
        let locality = split_locality(self.address_line_2.as_deref());
        let pet_policy = self.combined_pet_policy();

        hotel.city = locality.city;
        hotel.state = locality.state;
        hotel.country = locality.country;
        hotel.postal_code = locality.postal_code;
        hotel.address_line_1 = non_empty(self.address_line_1.as_deref());
        hotel.address_line_2 = non_empty(self.address_line_2.as_deref());
        hotel.full_address = match (&hotel.address_line_1, &hotel.address_line_2) {
            (Some(l1), Some(l2)) => Some(format!("{l1}, {l2}")),
            (l1, l2) => l1.clone().or_else(|| l2.clone()),
        };
        hotel.phone_number = normalize_phone(self.phone.as_deref());
        hotel.links = link("property_url", self.hotel_url.as_deref());
        hotel.pet_amenities = decode_json(self.amenities_json.as_ref());
        hotel.is_pet_friendly = Some(pet_policy.is_some());
        hotel.apply_policy(&normalizer.normalize(pet_policy.as_deref()));
        hotel.pet_policy = pet_policy;
        hotel
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HiltonRecord {
    pub hotel_code: Option<Scalar>,
    pub hotel_name: Option<String>,
    pub address: Option<String>,
    pub address_map_url: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub rating: Option<Scalar>,
    pub description: Option<String>,
    pub is_pet_friendly: Option<Scalar>,
    pub pets_json: Option<Value>,
    pub parking_json: Option<Value>,
    pub amenities_json: Option<Value>,
    pub nearby_json: Option<Value>,
    pub airport_json: Option<Value>,
    pub last_updated: Option<String>,
}

impl HiltonRecord {
    pub fn pet_policy(&self) -> Option<String> {
        policy_text(self.pets_json.as_ref(), &["Pets", "policy"], true)
    }

    /// Street address, else the map link, else name and locality joined.
    pub fn full_address(&self) -> Option<String> {
        non_empty(self.address.as_deref())
            .or_else(|| non_empty(self.address_map_url.as_deref()))
            .or_else(|| {
                let parts: Vec<String> = [&self.hotel_name, &self.city, &self.state, &self.country]
                    .into_iter()
                    .filter_map(|p| non_empty(p.as_deref()))
                    .collect();
                non_empty(Some(&parts.join(", ")))
            })
    }

    pub(super) fn to_hotel(
        &self,
        code: String,
        name: String,
        normalizer: &PolicyNormalizer,
    ) -> HotelRecord {
        let mut hotel = base_hotel(Chain::Hilton, code, name);
        let pet_policy = self.pet_policy();

        hotel.full_address = self.full_address();
        hotel.city = non_empty(self.city.as_deref());
        hotel.state = non_empty(self.state.as_deref());
        hotel.country = non_empty(self.country.as_deref());
        hotel.phone_number = normalize_phone(self.phone.as_deref());
        hotel.sabre_rating = self.rating.as_ref().and_then(Scalar::as_rating);
        hotel.description = non_empty(self.description.as_deref());
        hotel.parking = decode_json(self.parking_json.as_ref());
        hotel.is_pet_friendly = Some(self.is_pet_friendly.as_ref().is_some_and(Scalar::is_true));
        hotel.pet_amenities = decode_json(self.amenities_json.as_ref());
        hotel.nearby_parks = decode_json(self.nearby_json.as_ref());
        hotel.primary_airport_code = primary_airport_code(self.airport_json.as_ref());
        hotel.links = link("map_url", self.address_map_url.as_deref());
        hotel.has_pet_friendly_rooms = pet_policy.as_ref().map(|_| true);
        hotel.apply_policy(&normalizer.normalize(pet_policy.as_deref()));
        hotel.pet_policy = pet_policy;
        hotel
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IhgRecord {
    pub hotel_code: Option<Scalar>,
    pub hotel_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub rating: Option<Scalar>,
    pub description: Option<String>,
    pub is_pet_friendly: Option<Scalar>,
    pub pets_json: Option<Value>,
    pub parking_json: Option<Value>,
    pub amenities_json: Option<Value>,
    pub nearby_json: Option<Value>,
    pub last_updated: Option<String>,
}

impl IhgRecord {
    pub fn pet_policy(&self) -> Option<String> {
        policy_text(self.pets_json.as_ref(), &["policy"], false)
    }

    pub(super) fn to_hotel(
        &self,
        code: String,
        name: String,
        normalizer: &PolicyNormalizer,
    ) -> HotelRecord {
        let mut hotel = base_hotel(Chain::Ihg, code, name);
        let pet_policy = self.pet_policy();

        hotel.full_address = non_empty(self.address.as_deref());
        hotel.phone_number = normalize_phone(self.phone.as_deref());
        hotel.sabre_rating = self.rating.as_ref().and_then(Scalar::as_rating);
        hotel.description = non_empty(self.description.as_deref());
        hotel.parking = decode_json(self.parking_json.as_ref());
        hotel.is_pet_friendly = Some(self.is_pet_friendly.as_ref().is_some_and(Scalar::is_true));
        hotel.pet_amenities = decode_json(self.amenities_json.as_ref());
        hotel.nearby_parks = decode_json(self.nearby_json.as_ref());
        hotel.has_pet_friendly_rooms = pet_policy.as_ref().map(|_| true);
        hotel.apply_policy(&normalizer.normalize(pet_policy.as_deref()));
        hotel.pet_policy = pet_policy;
        hotel
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarriottRecord {
    pub hotel_code: Option<Scalar>,
    pub hotel_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub rating: Option<Scalar>,
    pub description: Option<String>,
    pub property_website: Option<String>,
    pub is_pet_friendly: Option<Scalar>,
    pub pets_json: Option<Value>,
    pub last_updated: Option<String>,
}

impl MarriottRecord {
    pub fn pet_policy(&self) -> Option<String> {
        policy_text(self.pets_json.as_ref(), &["raw"], false)
    }

    pub(super) fn to_hotel(
        &self,
        code: String,
        name: String,
        normalizer: &PolicyNormalizer,
    ) -> HotelRecord {
        let mut hotel = base_hotel(Chain::Marriott, code, name);
        let pet_policy = self.pet_policy();
        let pet_friendly = self.is_pet_friendly.as_ref().is_some_and(Scalar::is_true);

        // Exports mix ISO codes and full names in the same field.
        match non_empty(self.country.as_deref()) {
            Some(c) if (2..=3).contains(&c.len()) && c.chars().all(|ch| ch.is_ascii_uppercase()) => {
                hotel.country_code = Some(c);
            }
            other => hotel.country = other,
        }

        hotel.state = non_empty(self.state.as_deref());
        hotel.city = non_empty(self.city.as_deref());
        hotel.address_line_1 = non_empty(self.address.as_deref());
        hotel.full_address = hotel.address_line_1.clone();
        hotel.description = non_empty(self.description.as_deref());
        hotel.links = link("property_website", self.property_website.as_deref());
        hotel.phone_number = normalize_phone(self.phone.as_deref());
        hotel.sabre_rating = self.rating.as_ref().and_then(Scalar::as_rating);
        hotel.is_pet_friendly = Some(pet_friendly);
        hotel.has_pet_friendly_rooms = Some(pet_friendly);

        hotel.apply_policy(&normalizer.normalize(pet_policy.as_deref()));
        hotel.apply_fee_schedule(&FeeSchedule::parse(pet_policy.as_deref()));
        hotel.pet_policy = pet_policy;
        hotel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    use crate::policy::{Currency, FeeInterval};

    fn hyatt() -> HyattRecord {
        serde_json::from_value(json!({
            "hotel_code": "jaxrj",
            "hotel_name": "Hyatt Regency Jacksonville",
            "address_line_1": "225 E Coastline Dr",
            "address_line_2": "Jacksonville, Florida, United States, 32202",
            "phone": "+1 904 588 1234",
            "hotel_url": "https://hyatt.example/jaxrj",
            "pet_policy_description": "Dogs up to 50 lbs are welcome.",
            "pet_fees_json": "[\"$100 fee per stay\"]",
            "amenities_json": ["Bowls", "Beds"],
            "last_updated": "2025-06-01T12:00:00"
        }))
        .unwrap()
    }

    #[test]
    fn test_hyatt_combined_policy() {
        assert_eq!(
            hyatt().combined_pet_policy().as_deref(),
            Some("Dogs up to 50 lbs are welcome.\n$100 fee per stay")
        );

        let bare = HyattRecord::default();
        assert_eq!(bare.combined_pet_policy(), None);
    }

    #[test]
    fn test_hyatt_to_hotel() {
        let record = hyatt();
        let hotel = record.to_hotel(
            "jaxrj".into(),
            "Hyatt Regency Jacksonville".into(),
            &PolicyNormalizer::new(),
        );

        assert_eq!(hotel.chain_code.as_deref(), Some("HYATT"));
        assert_eq!(hotel.city.as_deref(), Some("Jacksonville"));
        assert_eq!(hotel.postal_code.as_deref(), Some("32202"));
        assert_eq!(
            hotel.full_address.as_deref(),
            Some("225 E Coastline Dr, Jacksonville, Florida, United States, 32202")
        );
        assert_eq!(hotel.pet_fee_total_max, Some(Decimal::from(50)));
        assert_eq!(hotel.pet_fee_currency, Some(Currency::Usd));
        assert_eq!(hotel.pet_fee_interval, Some(FeeInterval::PerStay));
        assert_eq!(hotel.weight_limit.as_deref(), Some("50 lbs"));
        assert_eq!(hotel.is_pet_friendly, Some(true));
        assert_eq!(hotel.links, Some(json!({ "property_url": "https://hyatt.example/jaxrj" })));
    }

    #[test]
    fn test_hilton_policy_and_address_fallback() {
        let record: HiltonRecord = serde_json::from_value(json!({
            "hotel_name": "Hilton Tokyo",
            "city": "Tokyo",
            "country": "Japan",
            "pets_json": { "Service animals": "Allowed" },
            "is_pet_friendly": "True",
            "rating": "Rating: 4.5 out of 5.0",
            "airport_json": "[{\"airport\": \"Haneda (HND)\"}]"
        }))
        .unwrap();

        assert_eq!(record.pet_policy().as_deref(), Some("Allowed"));
        assert_eq!(record.full_address().as_deref(), Some("Hilton Tokyo, Tokyo, Japan"));

        let hotel = record.to_hotel(
            "5000-".into(),
            "Hilton Tokyo".into(),
            &PolicyNormalizer::new(),
        );
        assert_eq!(hotel.sabre_rating, Some(4.5));
        assert_eq!(hotel.primary_airport_code.as_deref(), Some("HND"));
        assert_eq!(hotel.is_pet_friendly, Some(true));
        assert_eq!(hotel.has_pet_friendly_rooms, Some(true));
    }

    #[test]
    fn test_ihg_only_reads_policy_key() {
        let record: IhgRecord = serde_json::from_value(json!({
            "hotel_name": "Holiday Inn",
            "pets_json": "{\"Pets\": \"Dogs allowed\"}"
        }))
        .unwrap();

        assert_eq!(record.pet_policy(), None);

        let hotel = record.to_hotel(
            "1500-unknown".into(),
            "Holiday Inn".into(),
            &PolicyNormalizer::new(),
        );
        assert_eq!(hotel.has_pet_friendly_rooms, None);
        assert_eq!(hotel.is_pet_friendly, Some(false));
    }

    #[test]
    fn test_marriott_fee_schedule_and_country() {
        let record: MarriottRecord = serde_json::from_value(json!({
            "hotel_code": "AMMJW",
            "hotel_name": "JW Marriott Amman",
            "country": "JO",
            "is_pet_friendly": "true",
            "rating": 4.2,
            "pets_json": "{\"raw\": \"Dogs allowed. 50 JOD Per Stay, 100 JOD Deposit (non-refundable)\"}"
        }))
        .unwrap();

        let hotel = record.to_hotel(
            "1000-MAR-AMMJW".into(),
            "JW Marriott Amman".into(),
            &PolicyNormalizer::new(),
        );

        assert_eq!(hotel.country_code.as_deref(), Some("JO"));
        assert_eq!(hotel.country, None);
        assert_eq!(hotel.pet_fee_total_max, Some(Decimal::from(50)));
        assert_eq!(hotel.pet_fee_deposit, Some(Decimal::from(100)));
        assert_eq!(hotel.pet_fee_currency, Some(Currency::Jod));
        assert_eq!(hotel.is_deposit_refundable, Some(false));
        assert_eq!(hotel.allowed_pet_types.as_deref(), Some("dog"));
        assert_eq!(hotel.sabre_rating, Some(4.2));
        assert_eq!(hotel.has_pet_friendly_rooms, Some(true));
    }
}
