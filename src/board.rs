use std::collections::BTreeSet;
use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use palette::Srgba;

use crate::color::Highlight;
use crate::config::BoardConfig;
use crate::data::model::{
    Dataset, FieldValue, PLAYER_COLUMN, PROBABILITY_COLUMN, RawTable, SEASON_COLUMN, ScoredRecord,
};
use crate::data::normalize::normalize;
use crate::data::rank::{QueryParameters, SeasonChoice, select};
use crate::error::{BoardError, Result};

pub const RANK_COLUMN: &str = "Rank";
pub const WEIGHT_COLUMN: &str = "Display_Weight";

// ---------------------------------------------------------------------------
// Board – what the presentation layer talks to
// ---------------------------------------------------------------------------

/// A normalized dataset plus the styling needed to hand out ranked views.
///
/// The board owns its dataset explicitly; callers that want caching keep the
/// board around between queries.
#[derive(Debug, Clone)]
pub struct Board {
    dataset: Dataset,
    highlight: Highlight,
}

impl Board {
    pub fn new(dataset: Dataset, config: &BoardConfig) -> Result<Self> {
        config.validate()?;
        Ok(Board {
            dataset,
            highlight: config.highlight()?,
        })
    }

    /// Normalize a raw table with the config's options and wrap it.
    pub fn from_table(table: &RawTable, config: &BoardConfig) -> Result<Self> {
        let dataset = normalize(table, &config.normalize_options())?;
        Board::new(dataset, config)
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn highlight(&self) -> &Highlight {
        &self.highlight
    }

    /// The season selector's entries: "All Seasons" then each observed
    /// season ascending.
    pub fn season_options(&self) -> Vec<SeasonChoice> {
        std::iter::once(SeasonChoice::All)
            .chain(self.dataset.seasons().iter().map(|&s| SeasonChoice::Season(s)))
            .collect()
    }

    /// Rank the dataset for one selector state.
    ///
    /// Fails with `InvalidParameter` for `top_n <= 0` or a season that is not
    /// one of [`Board::season_options`].
    pub fn query(&self, season_choice: SeasonChoice, top_n: i64) -> Result<RankedTable<'_>> {
        if let SeasonChoice::Season(season) = season_choice {
            if !self.dataset.seasons().contains(&season) {
                return Err(BoardError::invalid_parameter(format!(
                    "season {season} is not in the dataset"
                )));
            }
        }
        let params = QueryParameters::new(season_choice, top_n)?;

        let rows = select(&self.dataset, &params)
            .into_iter()
            .enumerate()
            .map(|(i, record)| RankedRow {
                rank: i + 1,
                record,
                weight: self.highlight.mapper().weight(record.probability),
                highlight: self.highlight.color_for(record.probability),
            })
            .collect();

        Ok(RankedTable {
            params,
            rows,
            feature_columns: self.dataset.feature_columns(),
        })
    }
}

// ---------------------------------------------------------------------------
// Ranked view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RankedRow<'a> {
    /// 1-based position in the view.
    pub rank: usize,
    pub record: &'a ScoredRecord,
    /// Display weight in `[0, cap]`.
    pub weight: f64,
    pub highlight: Srgba<u8>,
}

/// An ordered view ready for rendering; callers must not reorder it.
#[derive(Debug, Clone)]
pub struct RankedTable<'a> {
    pub params: QueryParameters,
    pub rows: Vec<RankedRow<'a>>,
    feature_columns: &'a [String],
}

/// Headline numbers for a view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSummary {
    pub rows: usize,
    pub seasons: usize,
    pub mean_probability: Option<f64>,
    pub best_player: Option<String>,
}

impl<'a> RankedTable<'a> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &'a ScoredRecord> + '_ {
        self.rows.iter().map(|r| r.record)
    }

    pub fn summary(&self) -> ViewSummary {
        let seasons: BTreeSet<_> = self.records().map(|r| r.season).collect();
        let mean_probability = (!self.rows.is_empty()).then(|| {
            self.records().map(|r| r.probability).sum::<f64>() / self.rows.len() as f64
        });
        ViewSummary {
            rows: self.rows.len(),
            seasons: seasons.len(),
            mean_probability,
            best_player: self.rows.first().and_then(|r| r.record.player.clone()),
        }
    }

    /// Arrow batch in display order: rank, player, season, probability,
    /// formatted percentage, weight, then the feature columns.
    pub fn to_record_batch(&self) -> Result<RecordBatch, ArrowError> {
        let mut columns: Vec<(String, ArrayRef)> = vec![
            (
                RANK_COLUMN.to_string(),
                Arc::new(Int64Array::from_iter_values(self.rows.iter().map(|r| r.rank as i64))),
            ),
            (
                PLAYER_COLUMN.to_string(),
                Arc::new(StringArray::from_iter(
                    self.records().map(|r| r.player.as_deref()),
                )),
            ),
            (
                SEASON_COLUMN.to_string(),
                Arc::new(Int64Array::from_iter_values(self.records().map(|r| r.season.0))),
            ),
            (
                PROBABILITY_COLUMN.to_string(),
                Arc::new(Float64Array::from_iter_values(
                    self.records().map(|r| r.probability),
                )),
            ),
            (
                "Stick".to_string(),
                Arc::new(StringArray::from_iter_values(
                    self.records().map(|r| format_probability(r.probability)),
                )),
            ),
            (
                WEIGHT_COLUMN.to_string(),
                Arc::new(Float64Array::from_iter_values(self.rows.iter().map(|r| r.weight))),
            ),
        ];
        for col in self.feature_columns {
            let cells: Vec<&FieldValue> = self
                .records()
                .map(|r| r.features.get(col).unwrap_or(&FieldValue::Null))
                .collect();
            columns.push((col.clone(), feature_array(&cells)));
        }
        RecordBatch::try_from_iter(columns)
    }

    /// Export the view as CSV in display order.
    pub fn write_csv<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        let mut header = vec![
            RANK_COLUMN,
            PLAYER_COLUMN,
            SEASON_COLUMN,
            PROBABILITY_COLUMN,
            WEIGHT_COLUMN,
        ];
        header.extend(self.feature_columns.iter().map(String::as_str));
        out.write_record(&header).context("writing CSV header")?;

        for row in &self.rows {
            let record = row.record;
            let mut fields = vec![
                row.rank.to_string(),
                record.player.clone().unwrap_or_default(),
                record.season.to_string(),
                record.probability.to_string(),
                format!("{:.4}", row.weight),
            ];
            fields.extend(self.feature_columns.iter().map(|col| {
                record
                    .features
                    .get(col)
                    .map(FieldValue::to_string)
                    .unwrap_or_default()
            }));
            out.write_record(&fields)
                .with_context(|| format!("writing CSV row {}", row.rank))?;
        }
        out.flush().context("flushing CSV")?;
        Ok(())
    }
}

/// Two-decimal percentage, `0.9134 → "91.34%"`.
pub fn format_probability(probability: f64) -> String {
    format!("{:.2}%", probability * 100.0)
}

/// Pick the narrowest Arrow type that holds every non-null cell.
fn feature_array(cells: &[&FieldValue]) -> ArrayRef {
    let present = || cells.iter().filter(|c| !c.is_null());
    if present().all(|c| matches!(c, FieldValue::Integer(_))) {
        Arc::new(Int64Array::from_iter(cells.iter().map(|c| c.as_i64())))
    } else if present().all(|c| matches!(c, FieldValue::Integer(_) | FieldValue::Float(_))) {
        Arc::new(Float64Array::from_iter(cells.iter().map(|c| c.as_f64())))
    } else if present().all(|c| matches!(c, FieldValue::Bool(_))) {
        Arc::new(BooleanArray::from_iter(cells.iter().map(|c| match c {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        })))
    } else {
        Arc::new(StringArray::from_iter(cells.iter().map(|c| match c {
            FieldValue::Null => None,
            other => Some(other.to_string()),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::SeasonYear;
    use crate::error::ErrorKind;
    use arrow::array::Array;

    fn sample_table() -> RawTable {
        crate::data::loader::read_csv(
            "PLAYER,SEASON,STICK %,PTS,POS\n\
             Ada Moss,2022,91,18.2,G\n\
             Bo Lane,2022,40,9,F\n\
             Cy Hart,2023,77,12,C\n\
             Di Park,2025,65,,G\n"
                .as_bytes(),
        )
        .unwrap()
    }

    fn board() -> Board {
        Board::from_table(&sample_table(), &BoardConfig::default()).unwrap()
    }

    #[test]
    fn season_options_start_with_all() {
        let options = board().season_options();
        assert_eq!(options[0], SeasonChoice::All);
        assert_eq!(options[1], SeasonChoice::Season(SeasonYear(2022)));
        assert_eq!(options.len(), 4);
    }

    #[test]
    fn query_attaches_rank_and_weight() {
        let board = board();
        let view = board.query(SeasonChoice::All, 1).unwrap();
        let players: Vec<_> = view.records().map(|r| r.player.as_deref().unwrap()).collect();
        assert_eq!(players, vec!["Ada Moss", "Cy Hart", "Di Park"]);
        assert_eq!(view.rows[0].rank, 1);
        assert!((view.rows[0].weight - 0.91 * 0.35).abs() < 1e-12);
        assert_eq!(view.rows[0].highlight.alpha, 81);
    }

    #[test]
    fn unknown_season_is_an_invalid_parameter() {
        let err = board()
            .query(SeasonChoice::Season(SeasonYear(1990)), 10)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn from_table_rejects_an_invalid_config() {
        let config = BoardConfig {
            highlight_color: "not-a-colour".into(),
            ..BoardConfig::default()
        };
        let err = Board::from_table(&sample_table(), &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn provisional_season_can_be_dropped() {
        let config = BoardConfig {
            provisional_season: Some(SeasonYear(2025)),
            drop_provisional: true,
            ..BoardConfig::default()
        };
        let board = Board::from_table(&sample_table(), &config).unwrap();
        assert!(!board
            .season_options()
            .contains(&SeasonChoice::Season(SeasonYear(2025))));
    }

    #[test]
    fn record_batch_types_features() {
        let board = board();
        let view = board.query(SeasonChoice::All, 50).unwrap();
        let batch = view.to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 4);
        let schema = batch.schema();
        let pts = schema.index_of("PTS").unwrap();
        assert_eq!(schema.field(pts).data_type(), &arrow::datatypes::DataType::Float64);
        assert_eq!(batch.column(pts).null_count(), 1);
        let pos = schema.index_of("POS").unwrap();
        assert_eq!(schema.field(pos).data_type(), &arrow::datatypes::DataType::Utf8);
    }

    #[test]
    fn csv_export_keeps_display_order() {
        let board = board();
        let view = board.query(SeasonChoice::Season(SeasonYear(2022)), 10).unwrap();
        let mut buf = Vec::new();
        view.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Rank,Player,Season_Year,Pred_Stick_Proba,Display_Weight,PTS,POS");
        assert!(lines[1].starts_with("1,Ada Moss,2022,0.91,0.3185"));
        assert!(lines[2].starts_with("2,Bo Lane,2022,0.4,"));
    }

    #[test]
    fn summary_of_view() {
        let board = board();
        let view = board.query(SeasonChoice::Season(SeasonYear(2022)), 10).unwrap();
        let summary = view.summary();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.seasons, 1);
        assert_eq!(summary.best_player.as_deref(), Some("Ada Moss"));
        assert!((summary.mean_probability.unwrap() - 0.655).abs() < 1e-12);
    }

    #[test]
    fn probability_formatting() {
        assert_eq!(format_probability(0.9134), "91.34%");
        assert_eq!(format_probability(0.4), "40.00%");
    }
}
