use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use masterfile_core::{
    load_records, next_id, Chain, HotelRecord, IdentityKey, SourceRecord, Storage,
};

use crate::config::Settings;

/// Hands out hotel codes for one ingestion run.
struct CodeAllocator {
    chain: Chain,
    counter: Option<u64>,
    used: HashSet<String>,
    /// Codes handed out earlier in this run, by canonical identity.
    assigned: HashMap<IdentityKey, String>,
}

impl CodeAllocator {
    async fn new(chain: Chain, storage: &Storage) -> Result<Self> {
        let mut used = HashSet::new();
        if chain.reuses_existing_codes() {
            used.extend(storage.hotel_codes().await?);
        }

        Ok(Self {
            chain,
            counter: chain.first_counter(),
            used,
            assigned: HashMap::new(),
        })
    }

    async fn code_for(
        &mut self,
        record: &SourceRecord,
        storage: &Storage,
    ) -> Result<Option<String>> {
        let base = record.base_code();

        let Some(counter) = self.counter else {
            return Ok(base);
        };

        let identity = if self.chain.reuses_existing_codes() {
            record.identity_key()
        } else {
            None
        };
        let canonical = identity.as_ref().and_then(IdentityKey::canonical);

        if let Some(code) = canonical.as_ref().and_then(|key| self.assigned.get(key)) {
            return Ok(Some(code.clone()));
        }

        let code = match identity {
            Some(ref key) => storage.find_hotel_code(key).await?,
            None => None,
        };

        let code = if let Some(existing) = code {
            existing
        } else {
            let chain = self.chain;
            let (code, next) = next_id(counter, &self.used, |n| {
                chain.format_code(n, base.as_deref())
            });
            self.counter = Some(next);
            self.used.insert(code.clone());
            code
        };

        if let Some(key) = canonical {
            self.assigned.insert(key, code.clone());
        }

        Ok(Some(code))
    }
}

pub async fn run(
    settings: &Settings,
    chain: Chain,
    file: &Path,
    skip_stale: bool,
    dry_run: bool,
) -> Result<()> {
    let records = load_records(chain, file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;

    let storage = settings.open_storage().await?;
    let normalizer = chain.policy_normalizer(settings.amount_rule);

    let cutoff = if skip_stale {
        storage.last_updated_for_chain(chain.code()).await?
    } else {
        None
    };

    let mut allocator = CodeAllocator::new(chain, &storage).await?;
    let mut hotels: Vec<HotelRecord> = Vec::with_capacity(records.len());
    let mut skipped = 0usize;

    for record in &records {
        if let (Some(cutoff), Some(updated)) = (cutoff, record.last_updated()) {
            if updated <= cutoff {
                tracing::debug!(name = ?record.hotel_name(), %updated, "Skipping stale record");
                skipped += 1;
                continue;
            }
        }

        let Some(code) = allocator.code_for(record, &storage).await? else {
            tracing::warn!(name = ?record.hotel_name(), "Skipping record without a hotel code");
            skipped += 1;
            continue;
        };

        match record.into_hotel(code, &normalizer) {
            Ok(hotel) => hotels.push(hotel),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping record");
                skipped += 1;
            }
        }
    }

    if dry_run {
        for hotel in &hotels {
            println!("{}", serde_json::to_string(hotel)?);
        }
    } else {
        storage.upsert_hotels(&hotels).await?;
    }

    tracing::info!(%chain, written = hotels.len(), skipped, dry_run, "Ingestion finished");
    eprintln!(
        "{} {} {} hotels ({skipped} skipped)",
        if dry_run { "Parsed" } else { "Ingested" },
        hotels.len(),
        chain.name()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use masterfile_core::parse_records;

    #[tokio::test]
    async fn test_repeated_hilton_property_keeps_one_code() {
        let storage = Storage::open_memory().await.unwrap();
        let records = parse_records(
            Chain::Hilton,
            r#"[
                {"hotel_code": "AUS", "hotel_name": "Hilton Austin", "city": "Austin", "state": "TX"},
                {"hotel_code": "AUS", "hotel_name": "HILTON AUSTIN", "city": "Austin", "state": "TX"},
                {"hotel_code": "AUS", "hotel_name": "Hilton Austin", "city": "Dallas", "state": "TX"}
            ]"#,
        )
        .unwrap();

        let mut allocator = CodeAllocator::new(Chain::Hilton, &storage).await.unwrap();
        let mut codes = Vec::new();
        for record in &records {
            codes.push(allocator.code_for(record, &storage).await.unwrap());
        }

        assert_eq!(
            codes,
            vec![
                Some("5000-AUS".to_string()),
                Some("5000-AUS".to_string()),
                Some("5001-AUS".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_ihg_codes_never_repeat() {
        let storage = Storage::open_memory().await.unwrap();
        let records = parse_records(
            Chain::Ihg,
            r#"[
                {"hotel_code": "AUSIH", "hotel_name": "Holiday Inn Austin"},
                {"hotel_code": "AUSIH", "hotel_name": "Holiday Inn Austin"}
            ]"#,
        )
        .unwrap();

        let mut allocator = CodeAllocator::new(Chain::Ihg, &storage).await.unwrap();
        let first = allocator.code_for(&records[0], &storage).await.unwrap();
        let second = allocator.code_for(&records[1], &storage).await.unwrap();

        assert_eq!(first.as_deref(), Some("1500-AUSIH"));
        assert_eq!(second.as_deref(), Some("1501-AUSIH"));
    }
}
