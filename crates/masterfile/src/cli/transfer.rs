use anyhow::{Context, Result};
use masterfile_core::{transfer, Storage};

use crate::config::Settings;

pub async fn run(settings: &Settings, to: &str, table: &str) -> Result<()> {
    let from = settings.open_storage().await?;
    let target = Storage::open(to)
        .await
        .with_context(|| format!("opening {to}"))?;

    let report = transfer(&from, &target, table).await?;

    eprintln!(
        "Copied {} rows ({} columns) into {to}",
        report.rows, report.columns
    );
    Ok(())
}
