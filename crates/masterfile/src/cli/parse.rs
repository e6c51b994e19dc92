use anyhow::Result;
use masterfile_core::{Chain, PolicyNormalizer};

use crate::config::Settings;

pub fn run(settings: &Settings, text: &str, chain: Option<Chain>) -> Result<()> {
    let normalizer = chain.map_or_else(
        || PolicyNormalizer::new().with_amount_rule(settings.amount_rule),
        |c| c.policy_normalizer(settings.amount_rule),
    );

    let parsed = normalizer.normalize(Some(text));
    println!("{}", serde_json::to_string_pretty(&parsed)?);

    Ok(())
}
