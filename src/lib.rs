//! Season filtering, Top-N ranking and display weighting for college
//! prospect stick probabilities.
//!
//! ```text
//!  RawTable ──normalize──► Dataset ──select──► ranked records ──weight──► RankedTable
//! ```
//!
//! Loading files and rendering are left to callers; [`board::Board`] is the
//! entry point a presentation layer holds on to.

pub mod board;
pub mod color;
pub mod config;
pub mod data;
pub mod error;

pub use board::{Board, RankedRow, RankedTable, ViewSummary, format_probability};
pub use color::{Highlight, WeightMapper};
pub use config::BoardConfig;
pub use data::model::{Dataset, FieldValue, RawTable, ScoredRecord, SeasonYear};
pub use data::normalize::{
    NormalizeOptions, ProbabilityScale, ScalePolicy, SourceConvention, normalize,
};
pub use data::rank::{QueryParameters, SeasonChoice, TopN, select};
pub use error::{BoardError, ErrorKind};
