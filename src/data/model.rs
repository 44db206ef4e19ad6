use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical column names every normalized dataset exposes.
pub const SEASON_COLUMN: &str = "Season_Year";
pub const PROBABILITY_COLUMN: &str = "Pred_Stick_Proba";
pub const PLAYER_COLUMN: &str = "Player";

// ---------------------------------------------------------------------------
// FieldValue – a single cell of a raw table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the common dataframe dtypes.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Null => Ok(()),
        }
    }
}

impl FieldValue {
    /// Numeric view of the cell. Numeric strings count, since CSV exports
    /// sometimes quote them.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Integer view of the cell; floats qualify only when they are whole.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            FieldValue::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            FieldValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

// ---------------------------------------------------------------------------
// RawTable – a loaded table before normalization
// ---------------------------------------------------------------------------

/// A table exactly as the data source supplied it: column names are not yet
/// mapped to the canonical schema and probabilities may be on either scale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Column names in source order.
    pub columns: Vec<String>,
    /// One `Vec` per row, aligned with `columns`.
    pub rows: Vec<Vec<FieldValue>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        RawTable {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a row, padding with nulls or dropping extra cells so it lines
    /// up with the header.
    pub fn push_row(&mut self, mut row: Vec<FieldValue>) {
        row.resize(self.columns.len(), FieldValue::Null);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SeasonYear – the partition key
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeasonYear(pub i64);

impl fmt::Display for SeasonYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ScoredRecord – one row of the normalized dataset
// ---------------------------------------------------------------------------

/// A single scored player-season.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub season: SeasonYear,
    /// Stick probability on the 0–1 scale.
    pub probability: f64,
    /// Display identity; never used for filtering.
    pub player: Option<String>,
    /// Pass-through feature columns: column_name → value.
    pub features: BTreeMap<String, FieldValue>,
    /// Position of the row in the source table.
    pub row: usize,
}

// ---------------------------------------------------------------------------
// Dataset – the complete normalized dataset
// ---------------------------------------------------------------------------

/// The normalized dataset. Read-only once built: every query produces a new
/// view over it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<ScoredRecord>,
    feature_columns: Vec<String>,
    seasons: BTreeSet<SeasonYear>,
}

impl Dataset {
    /// Build the season index from the records.
    pub fn from_records(records: Vec<ScoredRecord>, feature_columns: Vec<String>) -> Self {
        let seasons = records.iter().map(|r| r.season).collect();
        Dataset {
            records,
            feature_columns,
            seasons,
        }
    }

    pub fn records(&self) -> &[ScoredRecord] {
        &self.records
    }

    /// Feature column names in source order.
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Observed seasons, ascending.
    pub fn seasons(&self) -> &BTreeSet<SeasonYear> {
        &self.seasons
    }

    pub fn has_players(&self) -> bool {
        self.records.iter().any(|r| r.player.is_some())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render the dataset back into a table using the canonical decimal-scale
    /// column names.
    pub fn to_table(&self) -> RawTable {
        let with_player = self.has_players();
        let mut columns = vec![SEASON_COLUMN.to_string(), PROBABILITY_COLUMN.to_string()];
        if with_player {
            columns.push(PLAYER_COLUMN.to_string());
        }
        columns.extend(self.feature_columns.iter().cloned());

        let mut table = RawTable::new(columns);
        for record in &self.records {
            let mut row = vec![
                FieldValue::Integer(record.season.0),
                FieldValue::Float(record.probability),
            ];
            if with_player {
                row.push(
                    record
                        .player
                        .clone()
                        .map_or(FieldValue::Null, FieldValue::String),
                );
            }
            for col in &self.feature_columns {
                row.push(record.features.get(col).cloned().unwrap_or(FieldValue::Null));
            }
            table.push_row(row);
        }
        table
    }
}
