//! Hotel code generation and lookup keys.

use std::collections::HashSet;

use crate::matching::normalize_name;

/// Mints the first code at or after `counter` that is not in `used`.
///
/// Returns the code and the counter to pass to the next call. The caller owns
/// both the counter and the used set; `mint` must embed the counter in the
/// code it returns.
pub fn next_id<F>(counter: u64, used: &HashSet<String>, mint: F) -> (String, u64)
where
    F: Fn(u64) -> String,
{
    let mut n = counter;
    loop {
        let code = mint(n);
        n = n.saturating_add(1);
        if !used.contains(&code) || n == u64::MAX {
            return (code, n);
        }
    }
}

/// Spreadsheet exports turn integer ids into floats (`100207330.0`).
pub fn normalize_hotel_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let code = trimmed
        .strip_suffix(".0")
        .filter(|head| !head.is_empty() && head.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(trimmed);

    Some(code.to_string())
}

/// Identifies an already-stored property of the same chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub chain_code: String,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl IdentityKey {
    #[must_use]
    pub fn new(chain_code: &str, name: &str) -> Self {
        Self {
            chain_code: chain_code.to_string(),
            name: name.trim().to_string(),
            city: None,
            state: None,
            country: None,
        }
    }

    #[must_use]
    pub fn with_locality(
        mut self,
        city: Option<&str>,
        state: Option<&str>,
        country: Option<&str>,
    ) -> Self {
        self.city = city.map(str::to_string);
        self.state = state.map(str::to_string);
        self.country = country.map(str::to_string);
        self
    }

    /// Name normalized the same way the matcher compares names.
    pub fn normalized_name(&self) -> Option<String> {
        normalize_name(&self.name)
    }

    /// The key with its name normalized, so two spellings of one property
    /// compare equal. `None` when the name normalizes to nothing.
    pub fn canonical(&self) -> Option<Self> {
        Some(Self {
            name: self.normalized_name()?,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_id_skips_used_codes() {
        let used: HashSet<String> = ["1500-A".to_string(), "1501-A".to_string()].into();

        let (code, next) = next_id(1500, &used, |n| format!("{n}-A"));

        assert_eq!(code, "1502-A");
        assert_eq!(next, 1503);
    }

    #[test]
    fn test_next_id_threads_counter() {
        let mut used = HashSet::new();
        let mut counter = 1000;
        let mut codes = Vec::new();

        for base in ["X", "X", "Y"] {
            let (code, next) = next_id(counter, &used, |n| format!("{n}-MAR-{base}"));
            counter = next;
            used.insert(code.clone());
            codes.push(code);
        }

        assert_eq!(codes, vec!["1000-MAR-X", "1001-MAR-X", "1002-MAR-Y"]);
        assert_eq!(counter, 1003);
    }

    #[test]
    fn test_normalize_hotel_code() {
        assert_eq!(normalize_hotel_code("100207330.0").as_deref(), Some("100207330"));
        assert_eq!(normalize_hotel_code(" ABC123 ").as_deref(), Some("ABC123"));
        assert_eq!(normalize_hotel_code("v1.0").as_deref(), Some("v1.0"));
        assert_eq!(normalize_hotel_code(""), None);
    }

    #[test]
    fn test_identity_key_normalized_name() {
        let key = IdentityKey::new("HILTON", " Hilton Garden Inn - Austin ")
            .with_locality(Some("Austin"), Some("TX"), None);

        assert_eq!(key.name, "Hilton Garden Inn - Austin");
        assert_eq!(
            key.normalized_name().as_deref(),
            Some("hilton garden inn austin")
        );
        assert_eq!(key.city.as_deref(), Some("Austin"));
    }

    #[test]
    fn test_canonical_keys_compare_equal() {
        let in_city = |name: &str, city: &str| {
            IdentityKey::new("HILTON", name).with_locality(Some(city), None, None)
        };
        let a = in_city("Hilton Austin!", "Austin");
        let b = in_city("hilton  austin", "Austin");
        let elsewhere = in_city("Hilton Austin", "Dallas");

        assert_eq!(a.canonical(), b.canonical());
        assert_ne!(a.canonical(), elsewhere.canonical());
        assert_eq!(IdentityKey::new("HILTON", "***").canonical(), None);
    }
}
