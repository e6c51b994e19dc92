//! Best-candidate record linkage between scraped hotels and the canonical
//! property list.

use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Anything that can take part in name matching.
pub trait Matchable {
    fn display_name(&self) -> Option<&str>;

    fn country_code(&self) -> Option<&str> {
        None
    }

    fn chain_code(&self) -> Option<&str> {
        None
    }
}

/// How two normalized names are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringStrategy {
    /// Indel ratio over alphabetically sorted tokens.
    #[default]
    TokenSort,
    /// Normalized edit distance over sorted tokens.
    Levenshtein,
    Exact,
}

impl ScoringStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TokenSort => "token-sort",
            Self::Levenshtein => "levenshtein",
            Self::Exact => "exact",
        }
    }

    pub fn scorer(self) -> Box<dyn NameScorer> {
        match self {
            Self::TokenSort => Box::new(TokenSortScorer),
            Self::Levenshtein => Box::new(LevenshteinScorer),
            Self::Exact => Box::new(ExactScorer),
        }
    }
}

impl std::fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "token-sort" | "token_sort" => Ok(Self::TokenSort),
            "levenshtein" => Ok(Self::Levenshtein),
            "exact" => Ok(Self::Exact),
            _ => Err(Error::InvalidScorer(s.to_string())),
        }
    }
}

pub trait NameScorer: Send + Sync {
    fn strategy(&self) -> ScoringStrategy;

    /// Similarity of two already-normalized names, 0 to 100.
    fn score(&self, a: &str, b: &str) -> u32;
}

fn sorted_tokens(name: &str) -> String {
    let mut tokens: Vec<&str> = name.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(ratio: f64) -> u32 {
    (ratio * 100.0).round() as u32
}

/// Length of the longest common subsequence of two char sequences.
fn lcs_length(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// `2 * lcs / (len_a + len_b)`: one minus the insert/delete distance over
/// the combined length.
pub fn indel_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();

    if total == 0 {
        return 1.0;
    }

    (2 * lcs_length(&a, &b)) as f64 / total as f64
}

/// Word-order-insensitive similarity: tokens are sorted, then compared by
/// indel ratio.
pub struct TokenSortScorer;

impl NameScorer for TokenSortScorer {
    fn strategy(&self) -> ScoringStrategy {
        ScoringStrategy::TokenSort
    }

    fn score(&self, a: &str, b: &str) -> u32 {
        let a = sorted_tokens(a);
        let b = sorted_tokens(b);

        if a.is_empty() || b.is_empty() {
            return 0;
        }

        percent(indel_ratio(&a, &b))
    }
}

pub struct LevenshteinScorer;

impl NameScorer for LevenshteinScorer {
    fn strategy(&self) -> ScoringStrategy {
        ScoringStrategy::Levenshtein
    }

    fn score(&self, a: &str, b: &str) -> u32 {
        let a = sorted_tokens(a);
        let b = sorted_tokens(b);

        if a.is_empty() || b.is_empty() {
            return 0;
        }

        percent(strsim::normalized_levenshtein(&a, &b))
    }
}

pub struct ExactScorer;

impl NameScorer for ExactScorer {
    fn strategy(&self) -> ScoringStrategy {
        ScoringStrategy::Exact
    }

    fn score(&self, a: &str, b: &str) -> u32 {
        if !a.is_empty() && a == b {
            100
        } else {
            0
        }
    }
}

/// Lower-cases, replaces anything outside `[a-z0-9 ]` with a space and
/// collapses whitespace. Returns `None` when nothing is left.
pub fn normalize_name(name: &str) -> Option<String> {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                ' '
            }
        })
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Minimum (bonus-inclusive) score for a candidate to be accepted.
    pub threshold: u32,
    /// Added to the score of candidates from a privileged chain.
    pub chain_bonus: u32,
    /// Reference chain codes that receive the bonus.
    pub privileged_chains: HashSet<String>,
    pub strategy: ScoringStrategy,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: 80,
            chain_bonus: 5,
            privileged_chains: ["HY", "HI"].into_iter().map(String::from).collect(),
            strategy: ScoringStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome<'a, S, R> {
    Matched {
        source: &'a S,
        reference: &'a R,
        score: u32,
    },
    Unmatched {
        source: &'a S,
    },
}

impl<'a, S, R> MatchOutcome<'a, S, R> {
    pub fn source(&self) -> &'a S {
        match self {
            Self::Matched { source, .. } | Self::Unmatched { source } => *source,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

pub struct FuzzyMatcher {
    scorer: Box<dyn NameScorer>,
    config: MatchConfig,
}

impl FuzzyMatcher {
    #[must_use]
    pub fn new(config: MatchConfig) -> Self {
        Self {
            scorer: config.strategy.scorer(),
            config,
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn strategy(&self) -> ScoringStrategy {
        self.scorer.strategy()
    }

    /// Bonus-inclusive score of one pair of normalized names.
    pub fn pair_score<R: Matchable>(
        &self,
        source_name: &str,
        reference_name: &str,
        reference: &R,
    ) -> u32 {
        let mut score = self.scorer.score(source_name, reference_name);

        if reference
            .chain_code()
            .is_some_and(|code| self.config.privileged_chains.contains(code.trim()))
        {
            score += self.config.chain_bonus;
        }

        score
    }

    /// One outcome per source record, in source order. Ties go to the
    /// reference encountered first.
    pub fn match_all<'a, S, R>(
        &self,
        sources: &'a [S],
        references: &'a [R],
    ) -> Vec<MatchOutcome<'a, S, R>>
    where
        S: Matchable,
        R: Matchable,
    {
        let pool: Vec<(&R, String)> = references
            .iter()
            .filter_map(|r| r.display_name().and_then(normalize_name).map(|n| (r, n)))
            .collect();

        sources
            .iter()
            .map(|source| self.best_match(source, &pool))
            .collect()
    }

    fn best_match<'a, S, R>(
        &self,
        source: &'a S,
        pool: &[(&'a R, String)],
    ) -> MatchOutcome<'a, S, R>
    where
        S: Matchable,
        R: Matchable,
    {
        let Some(name) = source.display_name().and_then(normalize_name) else {
            tracing::debug!("Source record has no usable name");
            return MatchOutcome::Unmatched { source };
        };

        let country = source
            .country_code()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let mut best: Option<(&'a R, u32)> = None;

        for (reference, reference_name) in pool {
            if let Some(country) = country {
                let same_country = reference
                    .country_code()
                    .is_some_and(|c| c.trim().eq_ignore_ascii_case(country));
                if !same_country {
                    continue;
                }
            }

            let score = self.pair_score(&name, reference_name, *reference);

            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((*reference, score));
            }
        }

        match best {
            Some((reference, score)) if score >= self.config.threshold => MatchOutcome::Matched {
                source,
                reference,
                score,
            },
            _ => MatchOutcome::Unmatched { source },
        }
    }
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Property {
        name: &'static str,
        country: Option<&'static str>,
        chain: Option<&'static str>,
    }

    impl Property {
        const fn new(
            name: &'static str,
            country: Option<&'static str>,
            chain: Option<&'static str>,
        ) -> Self {
            Self {
                name,
                country,
                chain,
            }
        }
    }

    impl Matchable for Property {
        fn display_name(&self) -> Option<&str> {
            Some(self.name)
        }

        fn country_code(&self) -> Option<&str> {
            self.country
        }

        fn chain_code(&self) -> Option<&str> {
            self.chain
        }
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(
            normalize_name("  Hyatt Regency -- Orlando (MCO)! ").as_deref(),
            Some("hyatt regency orlando mco")
        );
        assert_eq!(normalize_name("***"), None);
        assert_eq!(normalize_name("Café Zürich").as_deref(), Some("caf z rich"));
    }

    #[test]
    fn test_token_sort_ignores_word_order() {
        let scorer = TokenSortScorer;
        assert_eq!(scorer.score("regency hyatt orlando", "hyatt regency orlando"), 100);
        assert_eq!(scorer.score("", "hyatt"), 0);
        assert!(scorer.score("hyatt regency orlando", "hilton tokyo bay") < 50);
    }

    #[test]
    fn test_token_sort_uses_indel_ratio() {
        let scorer = TokenSortScorer;

        assert_eq!(
            scorer.score("hyatt regency orlando", "hyatt regency orlando airport"),
            84
        );
        assert_eq!(
            LevenshteinScorer.score("hyatt regency orlando", "hyatt regency orlando airport"),
            72
        );
    }

    #[test]
    fn test_indel_ratio() {
        assert!((indel_ratio("abc", "abc") - 1.0).abs() < f64::EPSILON);
        assert!((indel_ratio("abcd", "acbd") - 0.75).abs() < f64::EPSILON);
        assert!(indel_ratio("abc", "xyz").abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_scoring_strategy() {
        assert_eq!(
            "token-sort".parse::<ScoringStrategy>().unwrap(),
            ScoringStrategy::TokenSort
        );
        assert_eq!(" Exact ".parse::<ScoringStrategy>().unwrap(), ScoringStrategy::Exact);
        assert!("soundex".parse::<ScoringStrategy>().is_err());
    }

    #[test]
    fn test_pair_accepted_at_default_threshold() {
        let sources = [Property::new("Hyatt Regency Orlando", None, None)];
        let references = [Property::new("Hyatt Regency Orlando Airport", None, Some("XX"))];

        let outcomes = FuzzyMatcher::default().match_all(&sources, &references);

        match &outcomes[0] {
            MatchOutcome::Matched { score, .. } => assert_eq!(*score, 84),
            MatchOutcome::Unmatched { .. } => panic!("expected a match"),
        }
    }

    #[test]
    fn test_exact_match_with_chain_bonus() {
        let sources = [Property::new("Hyatt Regency Orlando", Some("US"), None)];
        let references = [Property::new("hyatt regency orlando", Some("US"), Some("HY"))];

        let outcomes = FuzzyMatcher::default().match_all(&sources, &references);

        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            MatchOutcome::Matched { reference, score, .. } => {
                assert_eq!(reference.name, "hyatt regency orlando");
                assert!(*score >= 85);
            }
            MatchOutcome::Unmatched { .. } => panic!("expected a match"),
        }
    }

    #[test]
    fn test_country_filter_excludes_better_candidate() {
        let sources = [Property::new("Grand Plaza Hotel", Some("US"), None)];
        let references = [
            Property::new("Grand Plaza Hotel", Some("CA"), None),
            Property::new("Seaside Motor Inn", Some("US"), None),
        ];

        let outcomes = FuzzyMatcher::default().match_all(&sources, &references);

        assert!(!outcomes[0].is_matched());
    }

    #[test]
    fn test_missing_country_searches_full_pool() {
        let sources = [Property::new("Grand Plaza Hotel", None, None)];
        let references = [
            Property::new("Seaside Motor Inn", Some("US"), None),
            Property::new("Grand Plaza Hotel", Some("CA"), None),
        ];

        let outcomes = FuzzyMatcher::default().match_all(&sources, &references);

        match &outcomes[0] {
            MatchOutcome::Matched { reference, .. } => assert_eq!(reference.country, Some("CA")),
            MatchOutcome::Unmatched { .. } => panic!("expected a match"),
        }
    }

    #[test]
    fn test_ties_go_to_first_candidate() {
        let sources = [Property::new("Park Hotel", None, None)];
        let references = [
            Property::new("Park Hotel", Some("DE"), None),
            Property::new("park hotel", Some("FR"), None),
        ];

        let outcomes = FuzzyMatcher::default().match_all(&sources, &references);

        match &outcomes[0] {
            MatchOutcome::Matched { reference, .. } => assert_eq!(reference.country, Some("DE")),
            MatchOutcome::Unmatched { .. } => panic!("expected a match"),
        }
    }

    #[test]
    fn test_bonus_can_lift_candidate_over_threshold() {
        let config = MatchConfig {
            threshold: 101,
            ..MatchConfig::default()
        };
        let sources = [Property::new("Hilton Tokyo", None, None)];
        let plain = [Property::new("Hilton Tokyo", None, Some("XX"))];
        let privileged = [Property::new("Hilton Tokyo", None, Some("HI"))];

        let matcher = FuzzyMatcher::new(config);

        assert!(!matcher.match_all(&sources, &plain)[0].is_matched());
        assert!(matcher.match_all(&sources, &privileged)[0].is_matched());
    }

    #[test]
    fn test_empty_inputs() {
        let matcher = FuzzyMatcher::default();
        let none: [Property; 0] = [];
        let some = [Property::new("Park Hotel", None, None)];

        assert!(matcher.match_all(&none, &some).is_empty());

        let outcomes = matcher.match_all(&some, &none);
        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].is_matched());
    }

    #[test]
    fn test_exact_scorer_strategy() {
        let matcher = FuzzyMatcher::new(MatchConfig {
            strategy: ScoringStrategy::Exact,
            ..MatchConfig::default()
        });
        assert_eq!(matcher.strategy(), ScoringStrategy::Exact);

        let sources = [Property::new("Park Hotel", None, None)];
        let references = [Property::new("Park Hotel Berlin", None, None)];

        assert!(!matcher.match_all(&sources, &references)[0].is_matched());
    }
}
