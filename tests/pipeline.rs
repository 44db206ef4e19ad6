use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int32Array, StringArray};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use prospect_board::data::loader::load_file;
use prospect_board::{
    Board, BoardConfig, ErrorKind, NormalizeOptions, SeasonChoice, SeasonYear, normalize,
};

const EXPORT_CSV: &str = "PLAYER,SEASON,STICK %,PTS\n\
Ada Moss,2022,91,18.2\n\
Bo Lane,2022,40,9.5\n\
Cy Hart,2023,77,12.0\n";

fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("temp file should be writable");
    file.write_all(contents.as_bytes()).expect("temp file should be writable");
    path
}

fn seasons_and_probs(board: &Board, season: SeasonChoice, top_n: i64) -> Vec<(i64, f64)> {
    board
        .query(season, top_n)
        .expect("query should succeed")
        .records()
        .map(|r| (r.season.0, r.probability))
        .collect()
}

#[test]
fn csv_export_ranks_like_the_dashboard() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(&dir, "prospects.csv", EXPORT_CSV);
    let table = load_file(&path).unwrap();
    let board = Board::from_table(&table, &BoardConfig::default()).unwrap();

    assert_eq!(
        seasons_and_probs(&board, SeasonChoice::All, 1),
        vec![(2022, 0.91), (2023, 0.77)]
    );
    assert_eq!(
        seasons_and_probs(&board, SeasonChoice::Season(SeasonYear(2022)), 1),
        vec![(2022, 0.91)]
    );
    assert_eq!(
        seasons_and_probs(&board, SeasonChoice::Season(SeasonYear(2022)), 5).len(),
        2
    );
}

#[test]
fn zero_top_n_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(&dir, "prospects.csv", EXPORT_CSV);
    let board = Board::from_table(&load_file(&path).unwrap(), &BoardConfig::default()).unwrap();
    let err = board.query(SeasonChoice::All, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
}

#[test]
fn json_in_canonical_decimal_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(
        &dir,
        "prospects.json",
        r#"[
            {"Player": "Ada Moss", "Season_Year": 2022, "Pred_Stick_Proba": 0.91},
            {"Player": "Bo Lane", "Season_Year": 2022, "Pred_Stick_Proba": 0.4},
            {"Player": "Cy Hart", "Season_Year": 2023, "Pred_Stick_Proba": 0.77}
        ]"#,
    );
    let dataset = normalize(&load_file(&path).unwrap(), &NormalizeOptions::default()).unwrap();
    let probs: Vec<f64> = dataset.records().iter().map(|r| r.probability).collect();
    assert_eq!(probs, vec![0.91, 0.4, 0.77]);
}

#[test]
fn percent_values_under_decimal_names_are_a_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(
        &dir,
        "prospects.csv",
        "Season_Year,Pred_Stick_Proba\n2022,91\n",
    );
    let err = Board::from_table(&load_file(&path).unwrap(), &BoardConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
}

#[test]
fn parquet_round_trip_through_the_board() {
    let batch = RecordBatch::try_from_iter([
        (
            "PLAYER",
            Arc::new(StringArray::from(vec![Some("Ada Moss"), None, Some("Cy Hart")])) as ArrayRef,
        ),
        ("SEASON", Arc::new(Int32Array::from(vec![2022, 2022, 2023])) as ArrayRef),
        ("STICK %", Arc::new(Float64Array::from(vec![91.0, 40.0, 77.0])) as ArrayRef),
    ])
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prospects.parquet");
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let board = Board::from_table(&load_file(&path).unwrap(), &BoardConfig::default()).unwrap();
    let view = board.query(SeasonChoice::All, 10).unwrap();
    let players: Vec<Option<&str>> = view.records().map(|r| r.player.as_deref()).collect();
    assert_eq!(players, vec![Some("Ada Moss"), Some("Cy Hart"), None]);
}

#[test]
fn config_file_drives_provisional_drop_and_cap() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_temp(
        &dir,
        "prospects.csv",
        "PLAYER,SEASON,STICK %\nAda Moss,2022,91\nNew Kid,2025,99\n",
    );
    let config = write_temp(
        &dir,
        "board.json",
        r#"{"provisional_season": 2025, "drop_provisional": true, "weight_cap": 0.33}"#,
    );
    let config = BoardConfig::from_path(&config).unwrap();
    let board = Board::from_table(&load_file(&data).unwrap(), &config).unwrap();

    let view = board.query(SeasonChoice::All, 30).unwrap();
    assert_eq!(view.len(), 1);
    assert!((view.rows[0].weight - 0.91 * 0.33).abs() < 1e-12);
    assert_eq!(
        board.query(SeasonChoice::Season(SeasonYear(2025)), 30).unwrap_err().kind(),
        ErrorKind::InvalidParameter
    );
}
