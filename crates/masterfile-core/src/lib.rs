#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::option_if_let_else)]

pub mod error;
pub mod hotel;
pub mod identity;
pub mod matching;
pub mod policy;
pub mod reference;
pub mod source;
pub mod storage;
pub mod transfer;

pub use error::{Error, Result};
pub use hotel::HotelRecord;
pub use identity::{next_id, normalize_hotel_code, IdentityKey};
pub use matching::{
    ExactScorer, FuzzyMatcher, LevenshteinScorer, MatchConfig, MatchOutcome, Matchable,
    NameScorer, ScoringStrategy, TokenSortScorer,
};
pub use policy::{
    AmountRule, Currency, CurrencyToken, FeeInterval, FeeSchedule, ParsedPolicy, PolicyNormalizer,
};
pub use reference::{load_references, merge, ReferenceProperty};
pub use source::{load_records, parse_records, Chain, SourceRecord};
pub use storage::Storage;
pub use transfer::{transfer, TransferReport};
