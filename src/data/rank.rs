use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use super::model::{Dataset, ScoredRecord, SeasonYear};
use crate::error::{BoardError, Result};

/// Bounds offered by the "Show Top N Players" selector.
pub const TOP_N_CHOICES: [usize; 5] = [10, 20, 30, 40, 50];
pub const DEFAULT_TOP_N: usize = 30;

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Which partitions a query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SeasonChoice {
    /// Every season, each truncated to its own Top N.
    #[default]
    All,
    Season(SeasonYear),
}

impl fmt::Display for SeasonChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeasonChoice::All => f.write_str("All Seasons"),
            SeasonChoice::Season(year) => write!(f, "{year}"),
        }
    }
}

impl FromStr for SeasonChoice {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") || s.eq_ignore_ascii_case("all seasons") {
            return Ok(SeasonChoice::All);
        }
        s.parse::<i64>()
            .map(|y| SeasonChoice::Season(SeasonYear(y)))
            .map_err(|_| {
                BoardError::invalid_parameter(format!(
                    "season must be `all` or a year, got `{s}`"
                ))
            })
    }
}

/// A validated, strictly positive Top-N bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TopN(NonZeroUsize);

impl TopN {
    pub fn new(n: i64) -> Result<Self> {
        usize::try_from(n)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(TopN)
            .ok_or_else(|| {
                BoardError::invalid_parameter(format!("top_n must be positive, got {n}"))
            })
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for TopN {
    fn default() -> Self {
        TopN(NonZeroUsize::new(DEFAULT_TOP_N).unwrap_or(NonZeroUsize::MIN))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryParameters {
    pub season_choice: SeasonChoice,
    pub top_n: TopN,
}

impl QueryParameters {
    /// Fails with `InvalidParameter` when `top_n <= 0`.
    pub fn new(season_choice: SeasonChoice, top_n: i64) -> Result<Self> {
        Ok(QueryParameters {
            season_choice,
            top_n: TopN::new(top_n)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Display order: probability descending, then player name ascending (unnamed
/// rows after named ones), then source row ascending.
pub fn rank_order(a: &ScoredRecord, b: &ScoredRecord) -> Ordering {
    b.probability
        .total_cmp(&a.probability)
        .then_with(|| match (&a.player, &b.player) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.row.cmp(&b.row))
}

/// Sort descending and keep the first `n`.
fn top(mut records: Vec<&ScoredRecord>, n: usize) -> Vec<&ScoredRecord> {
    records.sort_by(|a, b| rank_order(a, b));
    records.truncate(n);
    records
}

/// Run a query over the dataset.
///
/// Per-season truncation decides which rows are in the view; the final sort
/// decides the order they are shown in. A season with no rows yields an
/// empty view.
pub fn select<'a>(dataset: &'a Dataset, params: &QueryParameters) -> Vec<&'a ScoredRecord> {
    let n = params.top_n.get();

    let mut view = match params.season_choice {
        SeasonChoice::Season(season) => top(
            dataset
                .records()
                .iter()
                .filter(|r| r.season == season)
                .collect(),
            n,
        ),
        SeasonChoice::All => {
            let mut partitions: BTreeMap<SeasonYear, Vec<&ScoredRecord>> = BTreeMap::new();
            for record in dataset.records() {
                partitions.entry(record.season).or_default().push(record);
            }
            partitions
                .into_values()
                .flat_map(|partition| top(partition, n))
                .collect()
        }
    };
    view.sort_by(|a, b| rank_order(a, b));

    log::debug!(
        "select season={} top_n={n}: {} of {} rows",
        params.season_choice,
        view.len(),
        dataset.len()
    );
    view
}
