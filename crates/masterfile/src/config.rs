use masterfile_core::{AmountRule, MatchConfig, Storage};
use thiserror::Error;

use crate::cli::GlobalOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("database path must not be empty")]
    EmptyDatabase,

    #[error("invalid amount rule '{0}' (expected 'first' or 'last')")]
    AmountRule(String),

    #[error("invalid match scorer '{0}' (expected 'token-sort', 'levenshtein' or 'exact')")]
    Scorer(String),

    #[error("match threshold {threshold} is unreachable with a chain bonus of {bonus}")]
    UnreachableThreshold { threshold: u32, bonus: u32 },
}

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database: String,
    pub amount_rule: AmountRule,
    pub match_config: MatchConfig,
}

impl Settings {
    pub fn from_options(options: &GlobalOptions) -> Result<Self, ConfigError> {
        let database = options.database.trim();
        if database.is_empty() {
            return Err(ConfigError::EmptyDatabase);
        }

        let amount_rule = options
            .amount_rule
            .parse()
            .map_err(|_| ConfigError::AmountRule(options.amount_rule.clone()))?;

        let strategy = options
            .match_scorer
            .parse()
            .map_err(|_| ConfigError::Scorer(options.match_scorer.clone()))?;

        if options.match_threshold > 100 + options.chain_bonus {
            return Err(ConfigError::UnreachableThreshold {
                threshold: options.match_threshold,
                bonus: options.chain_bonus,
            });
        }

        let match_config = MatchConfig {
            threshold: options.match_threshold,
            chain_bonus: options.chain_bonus,
            privileged_chains: options
                .privileged_chains
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            strategy,
        };

        Ok(Self {
            database: database.to_string(),
            amount_rule,
            match_config,
        })
    }

    pub async fn open_storage(&self) -> masterfile_core::Result<Storage> {
        tracing::debug!(database = %self.database, "Opening masterfile");
        Storage::open(&self.database).await
    }
}
