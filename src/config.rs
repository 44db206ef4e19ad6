//! Board configuration.
//!
//! Everything is optional in the JSON file; missing fields fall back to the
//! values the published dashboard uses.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::color::{DEFAULT_HIGHLIGHT, DEFAULT_WEIGHT_CAP, Highlight, WeightMapper};
use crate::data::model::SeasonYear;
use crate::data::normalize::{NormalizeOptions, ScalePolicy, SourceConvention};
use crate::error::{BoardError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Known source naming conventions, tried in order.
    pub conventions: Vec<SourceConvention>,
    pub scale_policy: ScalePolicy,
    /// Season still accumulating games.
    pub provisional_season: Option<SeasonYear>,
    /// Exclude `provisional_season` rows on load.
    pub drop_provisional: bool,
    /// Upper bound of the display weight.
    pub weight_cap: f64,
    /// `#rrggbb` row highlight colour.
    pub highlight_color: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            conventions: SourceConvention::builtin(),
            scale_policy: ScalePolicy::Declared,
            provisional_season: None,
            drop_provisional: false,
            weight_cap: DEFAULT_WEIGHT_CAP,
            highlight_color: DEFAULT_HIGHLIGHT.to_string(),
        }
    }
}

impl BoardConfig {
    /// Read and validate a JSON config file.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: BoardConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.conventions.is_empty() {
            return Err(BoardError::invalid_parameter(
                "at least one source convention is required",
            ));
        }
        if self.drop_provisional && self.provisional_season.is_none() {
            return Err(BoardError::invalid_parameter(
                "drop_provisional is set but no provisional_season is configured",
            ));
        }
        self.highlight()?;
        Ok(())
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            conventions: self.conventions.clone(),
            scale_policy: self.scale_policy,
            provisional_season: self.provisional_season,
            drop_provisional: self.drop_provisional,
        }
    }

    pub fn weight_mapper(&self) -> Result<WeightMapper> {
        WeightMapper::new(self.weight_cap)
    }

    pub fn highlight(&self) -> Result<Highlight> {
        Highlight::from_hex(&self.highlight_color, self.weight_mapper()?)
    }
}
