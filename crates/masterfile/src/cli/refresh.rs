use std::path::Path;

use anyhow::{Context, Result};
use masterfile_core::{load_records, Chain};

use crate::config::Settings;

pub async fn run(settings: &Settings, file: &Path) -> Result<()> {
    let records = load_records(Chain::Hyatt, file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;

    let storage = settings.open_storage().await?;
    let mut updated = 0usize;
    let mut missing = 0usize;

    for record in &records {
        let Some(code) = record.base_code() else {
            continue;
        };
        let policy = record.pet_policy().unwrap_or_default();

        tracing::debug!(%code, length = policy.len(), "Refreshing pet policy");

        if storage.update_pet_policy(&code, &policy).await? {
            updated += 1;
        } else {
            missing += 1;
        }
    }

    eprintln!("Updated {updated} pet policies ({missing} codes not in the masterfile)");
    Ok(())
}
