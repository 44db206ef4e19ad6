use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::{
    Dataset, FieldValue, PLAYER_COLUMN, PROBABILITY_COLUMN, RawTable, SEASON_COLUMN, ScoredRecord,
    SeasonYear,
};
use crate::error::{BoardError, Result};

// ---------------------------------------------------------------------------
// Source naming conventions
// ---------------------------------------------------------------------------

/// Scale of the probability column as the source stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbabilityScale {
    /// 0–100, divided by 100 exactly once on load.
    Percent,
    /// Already 0–1.
    Decimal,
}

impl ProbabilityScale {
    fn upper_bound(self) -> f64 {
        match self {
            ProbabilityScale::Percent => 100.0,
            ProbabilityScale::Decimal => 1.0,
        }
    }

    fn to_decimal(self, value: f64) -> f64 {
        match self {
            ProbabilityScale::Percent => value / 100.0,
            ProbabilityScale::Decimal => value,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ProbabilityScale::Percent => "percent",
            ProbabilityScale::Decimal => "decimal",
        }
    }
}

impl fmt::Display for ProbabilityScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One known way the data source names its columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConvention {
    pub name: String,
    pub season_column: String,
    pub probability_column: String,
    pub probability_scale: ProbabilityScale,
    /// Display identity column; the dataset is still valid without it.
    #[serde(default)]
    pub player_column: Option<String>,
}

impl SourceConvention {
    /// The exported model results: `SEASON`, `STICK %` on the 0–100 scale.
    pub fn percentage() -> Self {
        SourceConvention {
            name: "percentage".into(),
            season_column: "SEASON".into(),
            probability_column: "STICK %".into(),
            probability_scale: ProbabilityScale::Percent,
            player_column: Some("PLAYER".into()),
        }
    }

    /// The canonical schema itself, probabilities already on the 0–1 scale.
    pub fn decimal() -> Self {
        SourceConvention {
            name: "decimal".into(),
            season_column: SEASON_COLUMN.into(),
            probability_column: PROBABILITY_COLUMN.into(),
            probability_scale: ProbabilityScale::Decimal,
            player_column: Some(PLAYER_COLUMN.into()),
        }
    }

    pub fn builtin() -> Vec<Self> {
        vec![Self::percentage(), Self::decimal()]
    }

    fn matches(&self, table: &RawTable) -> bool {
        table.column_index(&self.season_column).is_some()
            && table.column_index(&self.probability_column).is_some()
    }

    /// First required column this convention cannot find in `table`.
    fn first_missing<'a>(&'a self, table: &RawTable) -> Option<&'a str> {
        [&self.season_column, &self.probability_column]
            .into_iter()
            .find(|c| table.column_index(c).is_none())
            .map(String::as_str)
    }
}

/// How the probability scale is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalePolicy {
    /// Trust the matched convention's scale and reject data that contradicts it.
    #[default]
    Declared,
    /// Decide from the data: any value above 1 means percent.
    Infer,
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOptions {
    /// Tried in order; the first one whose season and probability columns are
    /// both present wins.
    pub conventions: Vec<SourceConvention>,
    pub scale_policy: ScalePolicy,
    /// The season still accumulating games, if any.
    pub provisional_season: Option<SeasonYear>,
    /// Drop rows of `provisional_season`.
    pub drop_provisional: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        NormalizeOptions {
            conventions: SourceConvention::builtin(),
            scale_policy: ScalePolicy::Declared,
            provisional_season: None,
            drop_provisional: false,
        }
    }
}

// ---------------------------------------------------------------------------
// normalize
// ---------------------------------------------------------------------------

/// Map a raw table onto the canonical schema and bring probabilities to the
/// 0–1 scale.
///
/// The percent→decimal division happens only for a percent-scale column, so
/// feeding back [`Dataset::to_table`] yields the same probabilities. Any bad
/// cell fails the whole table; there are no partial results.
pub fn normalize(table: &RawTable, options: &NormalizeOptions) -> Result<Dataset> {
    let convention = resolve_convention(table, &options.conventions)?;
    let season_idx = required_index(table, &convention.season_column)?;
    let prob_idx = required_index(table, &convention.probability_column)?;
    let player_idx = convention
        .player_column
        .as_deref()
        .and_then(|c| table.column_index(c));

    let raw_probabilities = table
        .rows
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            read_probability(row, &convention.probability_column, cell(cells, prob_idx))
        })
        .collect::<Result<Vec<f64>>>()?;

    let scale = decide_scale(convention, options.scale_policy, &raw_probabilities)?;
    let upper = scale.upper_bound();
    if let Some((row, &value)) = raw_probabilities
        .iter()
        .enumerate()
        .find(|(_, v)| !(0.0..=upper).contains(*v))
    {
        return Err(BoardError::ScaleMismatch {
            row,
            column: convention.probability_column.clone(),
            scale: scale.label(),
            value,
        });
    }

    let feature_idx: Vec<usize> = (0..table.columns.len())
        .filter(|&i| i != season_idx && i != prob_idx && Some(i) != player_idx)
        .collect();
    let drop_season = options
        .provisional_season
        .filter(|_| options.drop_provisional);

    let mut records = Vec::with_capacity(table.len());
    let mut dropped = 0usize;
    for (row, cells) in table.rows.iter().enumerate() {
        let season = read_season(row, &convention.season_column, cell(cells, season_idx))?;
        if Some(season) == drop_season {
            dropped += 1;
            continue;
        }
        let player = player_idx.and_then(|i| match cell(cells, i) {
            FieldValue::Null => None,
            other => Some(other.to_string()),
        });
        let features: BTreeMap<String, FieldValue> = feature_idx
            .iter()
            .map(|&i| (table.columns[i].clone(), cell(cells, i).clone()))
            .collect();

        records.push(ScoredRecord {
            season,
            probability: scale.to_decimal(raw_probabilities[row]),
            player,
            features,
            row,
        });
    }

    if let Some(season) = drop_season.filter(|_| dropped > 0) {
        log::warn!("Dropped {dropped} rows of provisional season {season}");
    }

    let feature_columns = feature_idx.iter().map(|&i| table.columns[i].clone()).collect();
    let dataset = Dataset::from_records(records, feature_columns);
    log::info!(
        "Normalized {} rows via `{}` convention ({} scale), {} seasons",
        dataset.len(),
        convention.name,
        scale,
        dataset.seasons().len()
    );
    Ok(dataset)
}

fn resolve_convention<'a>(
    table: &RawTable,
    conventions: &'a [SourceConvention],
) -> Result<&'a SourceConvention> {
    if let Some(found) = conventions.iter().find(|c| c.matches(table)) {
        return Ok(found);
    }

    // Report against the convention the table comes closest to.
    let closest = conventions
        .iter()
        .find(|c| {
            table.column_index(&c.season_column).is_some()
                || table.column_index(&c.probability_column).is_some()
        })
        .or_else(|| conventions.first());
    let column = closest
        .and_then(|c| c.first_missing(table))
        .unwrap_or(SEASON_COLUMN)
        .to_string();

    Err(BoardError::MissingColumn {
        column,
        available: table.columns.clone(),
    })
}

static NULL_CELL: FieldValue = FieldValue::Null;

/// Rows pushed without [`RawTable::push_row`] may be short.
fn cell(cells: &[FieldValue], idx: usize) -> &FieldValue {
    cells.get(idx).unwrap_or(&NULL_CELL)
}

fn required_index(table: &RawTable, column: &str) -> Result<usize> {
    table
        .column_index(column)
        .ok_or_else(|| BoardError::MissingColumn {
            column: column.to_string(),
            available: table.columns.clone(),
        })
}

fn decide_scale(
    convention: &SourceConvention,
    policy: ScalePolicy,
    values: &[f64],
) -> Result<ProbabilityScale> {
    match policy {
        ScalePolicy::Declared => {
            // A percent column whose largest value is at most 1 already holds
            // decimals; dividing again would shrink it a hundredfold.
            let largest = values
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.total_cmp(b));
            if let (ProbabilityScale::Percent, Some((row, &value))) =
                (convention.probability_scale, largest)
            {
                if value <= 1.0 {
                    return Err(BoardError::ScaleMismatch {
                        row,
                        column: convention.probability_column.clone(),
                        scale: ProbabilityScale::Percent.label(),
                        value,
                    });
                }
            }
            Ok(convention.probability_scale)
        }
        ScalePolicy::Infer => {
            let inferred = if values.iter().any(|&v| v > 1.0) {
                ProbabilityScale::Percent
            } else {
                ProbabilityScale::Decimal
            };
            if inferred != convention.probability_scale {
                log::warn!(
                    "Column `{}` is declared {} scale but reads as {}",
                    convention.probability_column,
                    convention.probability_scale,
                    inferred
                );
            }
            Ok(inferred)
        }
    }
}

fn read_probability(row: usize, column: &str, cell: &FieldValue) -> Result<f64> {
    cell.as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| BoardError::InvalidValue {
            row,
            column: column.to_string(),
            value: cell.to_string(),
            expected: "a finite number",
        })
}

fn read_season(row: usize, column: &str, cell: &FieldValue) -> Result<SeasonYear> {
    cell.as_i64().map(SeasonYear).ok_or_else(|| BoardError::InvalidValue {
        row,
        column: column.to_string(),
        value: cell.to_string(),
        expected: "an integer season",
    })
}
