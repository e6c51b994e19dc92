use anyhow::Result;
use masterfile_core::Chain;

use crate::config::Settings;

pub async fn run(settings: &Settings, chain: Option<Chain>) -> Result<()> {
    let storage = settings.open_storage().await?;

    for hotel in storage.list_hotels(chain.as_ref().map(Chain::code)).await? {
        println!("{}", serde_json::to_string(&hotel)?);
    }

    Ok(())
}
