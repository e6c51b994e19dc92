pub mod ingest;
pub mod list;
pub mod matching;
pub mod parse;
pub mod refresh;
pub mod transfer;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use masterfile_core::storage::HOTEL_TABLE;
use masterfile_core::Chain;

#[derive(Parser)]
#[command(
    name = "mfile",
    about = "Hotel masterfile ingestion, pet-policy normalization and reference matching",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub options: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalOptions {
    /// SQLite masterfile database
    #[arg(long, env = "MASTERFILE_DATABASE", default_value = "masterfile.db", global = true)]
    pub database: String,

    /// Minimum match score, chain bonus included
    #[arg(long, env = "MATCH_THRESHOLD", default_value_t = 80, global = true)]
    pub match_threshold: u32,

    /// Score bonus for reference rows of a privileged chain
    #[arg(long, env = "MATCH_CHAIN_BONUS", default_value_t = 5, global = true)]
    pub chain_bonus: u32,

    /// Reference chain codes that receive the bonus
    #[arg(
        long,
        env = "MATCH_PRIVILEGED_CHAINS",
        value_delimiter = ',',
        default_value = "HY,HI",
        global = true
    )]
    pub privileged_chains: Vec<String>,

    /// Name similarity: token-sort, levenshtein or exact
    #[arg(long, env = "MATCH_SCORER", default_value = "token-sort", global = true)]
    pub match_scorer: String,

    /// Which number becomes the fee or deposit: first or last
    #[arg(long, env = "AMOUNT_RULE", default_value = "first", global = true)]
    pub amount_rule: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a chain's scraped JSON export into the masterfile
    Ingest {
        /// hyatt, hilton, ihg or marriott
        chain: Chain,
        /// JSON array exported by the chain scraper
        file: PathBuf,
        /// Skip records not newer than the chain's latest stored row
        #[arg(long)]
        skip_stale: bool,
        /// Print rows as JSON lines instead of writing them
        #[arg(long)]
        dry_run: bool,
    },
    /// Rewrite Hyatt pet policies from an export's description and fee lines
    RefreshPolicy {
        /// Hyatt JSON export
        file: PathBuf,
    },
    /// Match stored hotels against the reference property list
    Match {
        /// Reference CSV
        reference: PathBuf,
        /// Only match hotels of this chain
        #[arg(long)]
        chain: Option<Chain>,
        /// Report matches without writing them
        #[arg(long)]
        dry_run: bool,
    },
    /// Copy the masterfile into another database, replacing its rows
    Transfer {
        /// Target SQLite database
        #[arg(long)]
        to: String,
        /// Table to copy
        #[arg(long, default_value = HOTEL_TABLE)]
        table: String,
    },
    /// Print stored hotels as JSON lines
    List {
        /// Only hotels of this chain
        #[arg(long)]
        chain: Option<Chain>,
    },
    /// Normalize one pet-policy text and print the result
    ParsePolicy {
        /// Policy text
        text: String,
        /// Use this chain's currency vocabulary
        #[arg(long)]
        chain: Option<Chain>,
    },
}
