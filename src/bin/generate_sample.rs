//! Writes a deterministic sample prospect table in the exported-results
//! layout (`PLAYER`, `SEASON`, `STICK %`, features) as both CSV and Parquet.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const SEASONS: [i64; 4] = [2022, 2023, 2024, 2025];
const PLAYERS_PER_SEASON: usize = 60;

const FIRST: [&str; 12] = [
    "Ada", "Bo", "Cy", "Di", "Eli", "Fay", "Gus", "Hal", "Ike", "Jo", "Kai", "Lou",
];
const LAST: [&str; 10] = [
    "Moss", "Lane", "Hart", "Park", "Reed", "Cole", "Vance", "Ware", "Quinn", "Shaw",
];
const POSITIONS: [&str; 5] = ["PG", "SG", "SF", "PF", "C"];

/// splitmix64: enough randomness for fixtures, identical output every run.
struct SplitMix(u64);

impl SplitMix {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[lo, hi)`.
    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        let unit = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        lo + unit * (hi - lo)
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn main() -> Result<()> {
    let mut rng = SplitMix(2025);

    let mut players = Vec::new();
    let mut seasons = Vec::new();
    let mut stick = Vec::new();
    let mut positions = Vec::new();
    let mut points = Vec::new();
    let mut rebounds = Vec::new();
    let mut bpm = Vec::new();

    for &season in &SEASONS {
        for _ in 0..PLAYERS_PER_SEASON {
            let pts = rng.range(4.0, 24.0);
            let box_plus_minus = rng.range(-2.0, 12.0);
            // Production drives the score, with noise on top.
            let score = (pts / 24.0) * 45.0 + (box_plus_minus + 2.0) / 14.0 * 40.0
                + rng.range(0.0, 15.0);

            players.push(format!("{} {}", rng.pick(&FIRST), rng.pick(&LAST)));
            seasons.push(season);
            stick.push(round1(score.clamp(0.0, 100.0)));
            positions.push(rng.pick(&POSITIONS).to_string());
            points.push(round1(pts));
            rebounds.push(round1(rng.range(1.0, 12.0)));
            bpm.push(round1(box_plus_minus));
        }
    }

    let batch = RecordBatch::try_from_iter([
        ("PLAYER", Arc::new(StringArray::from(players)) as ArrayRef),
        ("SEASON", Arc::new(Int64Array::from(seasons)) as ArrayRef),
        ("STICK %", Arc::new(Float64Array::from(stick)) as ArrayRef),
        ("POS", Arc::new(StringArray::from(positions)) as ArrayRef),
        ("PTS", Arc::new(Float64Array::from(points)) as ArrayRef),
        ("REB", Arc::new(Float64Array::from(rebounds)) as ArrayRef),
        ("BPM", Arc::new(Float64Array::from(bpm)) as ArrayRef),
    ])
    .context("building sample batch")?;

    let parquet_path = "sample_prospects.parquet";
    let file = std::fs::File::create(parquet_path).context("creating parquet output")?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
        .context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;

    let csv_path = "sample_prospects.csv";
    let file = std::fs::File::create(csv_path).context("creating CSV output")?;
    let mut writer = arrow::csv::WriterBuilder::new().with_header(true).build(file);
    writer.write(&batch).context("writing CSV")?;

    println!(
        "Wrote {} prospects over {} seasons to {parquet_path} and {csv_path}",
        batch.num_rows(),
        SEASONS.len()
    );
    Ok(())
}
