/// Data layer: core types, loading, normalization and ranking.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize  │  rename columns, percent → 0–1, drop provisional season
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<ScoredRecord>, season index
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   rank    │  season filter, per-season Top N, final order
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod normalize;
pub mod rank;
