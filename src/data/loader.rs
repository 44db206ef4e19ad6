use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{FieldValue, RawTable};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a raw prospect table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row followed by one row per player-season
/// * `.json`    – `[{ "SEASON": 2022, "STICK %": 91.3, ... }, ...]`
/// * `.parquet` – flat columns (strings, ints, floats, bools)
///
/// Column names are kept verbatim; mapping them onto the canonical schema is
/// the normalizer's job.
pub fn load_file(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening CSV {}", path.display()))?;
            read_csv(file)
        }
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }?;

    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        table.len(),
        table.columns,
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Read a CSV table from any reader.  The first row is the header; every
/// cell's type is guessed independently.
pub fn read_csv<R: Read>(source: R) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(source);
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut table = RawTable::new(columns);
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        table.push_row(record.iter().map(parse_cell).collect());
    }
    Ok(table)
}

fn parse_cell(s: &str) -> FieldValue {
    let s = s.trim();
    if s.is_empty() {
        return FieldValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return FieldValue::Integer(i);
    }
    // `parse::<f64>` also accepts "nan" and "inf", which are names here.
    if let Some(f) = s.parse::<f64>().ok().filter(|f| f.is_finite()) {
        return FieldValue::Float(f);
    }
    match s {
        "true" | "True" | "TRUE" => FieldValue::Bool(true),
        "false" | "False" | "FALSE" => FieldValue::Bool(false),
        _ => FieldValue::String(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient="records")`).  Columns are the
/// union of all object keys in first-seen order; missing keys become nulls.
fn load_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json_records(&text)
}

pub(crate) fn parse_json_records(text: &str) -> Result<RawTable> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let mut table = RawTable::new(columns);
    for rec in records {
        // Shape was checked above.
        let Some(obj) = rec.as_object() else { continue };
        let row = table
            .columns
            .iter()
            .map(|col| obj.get(col).map_or(FieldValue::Null, json_to_field))
            .collect();
        table.push_row(row);
    }
    Ok(table)
}

fn json_to_field(val: &JsonValue) -> FieldValue {
    match val {
        JsonValue::String(s) => FieldValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                FieldValue::Float(f)
            } else {
                FieldValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => FieldValue::Bool(*b),
        JsonValue::Null => FieldValue::Null,
        other => FieldValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).  Columns of an unsupported type are
/// read as their display string.
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut table = RawTable::new(columns);
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| extract_field(col, row))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Row {row}"))?;
            table.push_row(cells);
        }
    }
    Ok(table)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_field(col: &ArrayRef, row: usize) -> Result<FieldValue> {
    if col.is_null(row) {
        return Ok(FieldValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => FieldValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => FieldValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => FieldValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => FieldValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => {
            FieldValue::Float(col.as_primitive::<Float32Type>().value(row) as f64)
        }
        DataType::Float64 => FieldValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => FieldValue::Bool(col.as_boolean().value(row)),
        _ => FieldValue::String(
            array_value_to_string(col.as_ref(), row).context("formatting parquet cell")?,
        ),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_cells_are_typed() {
        let text = "SEASON,PLAYER,STICK %,Freshman\n2022,Ada Moss,91.3,true\n2023,,40,\n";
        let table = read_csv(text.as_bytes()).unwrap();
        assert_eq!(table.columns, vec!["SEASON", "PLAYER", "STICK %", "Freshman"]);
        assert_eq!(table.rows[0][0], FieldValue::Integer(2022));
        assert_eq!(table.rows[0][1], FieldValue::String("Ada Moss".into()));
        assert_eq!(table.rows[0][2], FieldValue::Float(91.3));
        assert_eq!(table.rows[0][3], FieldValue::Bool(true));
        assert_eq!(table.rows[1][1], FieldValue::Null);
        assert_eq!(table.rows[1][2], FieldValue::Integer(40));
    }

    #[test]
    fn csv_non_finite_words_stay_strings() {
        let table = read_csv("PLAYER,NOTE\nNan Okafor,inf\n".as_bytes()).unwrap();
        assert_eq!(table.rows[0][0], FieldValue::String("Nan Okafor".into()));
        assert_eq!(table.rows[0][1], FieldValue::String("inf".into()));
        assert_eq!(parse_cell("Nan"), FieldValue::String("Nan".into()));
        assert_eq!(parse_cell("1e3"), FieldValue::Float(1000.0));
    }

    #[test]
    fn csv_ragged_rows_line_up_with_header() {
        let table = read_csv("a,b,c\n1,2\n".as_bytes()).unwrap();
        assert_eq!(table.rows[0].len(), 3);
        assert!(table.rows[0][2].is_null());
    }

    #[test]
    fn json_columns_are_the_union_of_keys() {
        let text = r#"[{"SEASON": 2022, "STICK %": 91.3}, {"SEASON": 2023, "PLAYER": "Bo"}]"#;
        let table = parse_json_records(text).unwrap();
        assert_eq!(table.columns.len(), 3);
        let player = table.column_index("PLAYER").unwrap();
        assert!(table.rows[0][player].is_null());
        assert_eq!(table.rows[1][player], FieldValue::String("Bo".into()));
    }

    #[test]
    fn json_must_be_an_array_of_objects() {
        assert!(parse_json_records(r#"{"SEASON": 2022}"#).is_err());
        assert!(parse_json_records("[1, 2]").is_err());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("prospects.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }
}
