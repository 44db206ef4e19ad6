use std::path::PathBuf;

use anyhow::{Context, Result};
use arrow::util::pretty::pretty_format_batches;
use clap::Parser;

use prospect_board::data::loader::load_file;
use prospect_board::data::rank::DEFAULT_TOP_N;
use prospect_board::{Board, BoardConfig, SeasonChoice, SeasonYear, format_probability};

#[derive(Parser)]
#[command(name = "prospect-board")]
#[command(about = "Rank college prospects by predicted NBA stick probability")]
struct Cli {
    /// Prospect table (.csv, .json or .parquet)
    #[arg(short, long)]
    data: PathBuf,

    /// JSON board configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// `all` or a season year
    #[arg(short, long, default_value = "all")]
    season: SeasonChoice,

    /// Players kept per season
    #[arg(short = 'n', long, default_value_t = DEFAULT_TOP_N as i64, allow_negative_numbers = true)]
    top_n: i64,

    /// Exclude this still-in-progress season
    #[arg(long)]
    drop_provisional: Option<i64>,

    /// Also write the ranked view to this CSV file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Print the season selector entries and exit
    #[arg(long)]
    list_seasons: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => BoardConfig::from_path(path)?,
        None => BoardConfig::default(),
    };
    if let Some(season) = cli.drop_provisional {
        config.provisional_season = Some(SeasonYear(season));
        config.drop_provisional = true;
    }

    let table = load_file(&cli.data)?;
    let board = Board::from_table(&table, &config)
        .with_context(|| format!("normalizing {}", cli.data.display()))?;

    if cli.list_seasons {
        for option in board.season_options() {
            println!("{option}");
        }
        return Ok(());
    }

    let view = board.query(cli.season, cli.top_n)?;
    let batch = view.to_record_batch().context("building result table")?;
    println!("{}", pretty_format_batches(&[batch]).context("formatting result table")?);

    let summary = view.summary();
    println!(
        "{} players across {} season(s), mean stick {}",
        summary.rows,
        summary.seasons,
        summary
            .mean_probability
            .map(format_probability)
            .unwrap_or_else(|| "n/a".to_string())
    );

    if let Some(path) = &cli.export {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        view.write_csv(file)?;
        log::info!("Exported {} rows to {}", view.len(), path.display());
    }

    Ok(())
}
