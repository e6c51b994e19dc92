use std::path::Path;

use anyhow::{Context, Result};
use masterfile_core::{load_references, merge, Chain, FuzzyMatcher, HotelRecord, MatchOutcome};

use crate::config::Settings;

pub async fn run(
    settings: &Settings,
    reference: &Path,
    chain: Option<Chain>,
    dry_run: bool,
) -> Result<()> {
    let references = load_references(reference)
        .with_context(|| format!("reading {}", reference.display()))?;

    let storage = settings.open_storage().await?;
    let hotels = storage.list_hotels(chain.as_ref().map(Chain::code)).await?;

    let matcher = FuzzyMatcher::new(settings.match_config.clone());
    tracing::info!(
        strategy = %matcher.strategy(),
        threshold = matcher.config().threshold,
        hotels = hotels.len(),
        references = references.len(),
        "Matching against reference list"
    );
    let outcomes = matcher.match_all(&hotels, &references);

    let mut merged: Vec<HotelRecord> = Vec::new();
    for outcome in &outcomes {
        match outcome {
            MatchOutcome::Matched {
                source,
                reference,
                score,
            } => {
                let row = merge(source, reference);
                tracing::debug!(from = %source.hotel_code, to = %row.hotel_code, score, "Matched");

                if dry_run {
                    println!(
                        "{}",
                        serde_json::json!({
                            "hotel_code": source.hotel_code,
                            "name": source.name,
                            "reference_code": row.hotel_code,
                            "reference_name": row.name,
                            "score": score,
                        })
                    );
                }
                merged.push(row);
            }
            MatchOutcome::Unmatched { source } => {
                tracing::debug!(hotel_code = %source.hotel_code, "No reference match");
            }
        }
    }

    if !dry_run {
        storage.upsert_hotels(&merged).await?;
    }

    eprintln!(
        "Matched {} of {} hotels against {} reference properties",
        merged.len(),
        hotels.len(),
        references.len()
    );

    Ok(())
}
