use palette::{Srgb, Srgba};

use crate::error::{BoardError, Result};

/// Upper bound of the display weight when none is configured.
pub const DEFAULT_WEIGHT_CAP: f64 = 0.35;

/// Row highlight base colour, `rgb(46, 204, 113)`.
pub const DEFAULT_HIGHLIGHT: &str = "#2ecc71";

// ---------------------------------------------------------------------------
// Display weight
// ---------------------------------------------------------------------------

/// Maps a stick probability to a visual intensity in `[0, cap]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightMapper {
    cap: f64,
}

impl WeightMapper {
    /// `cap` must be a finite value in `(0, 1]`.
    pub fn new(cap: f64) -> Result<Self> {
        if cap.is_finite() && cap > 0.0 && cap <= 1.0 {
            Ok(WeightMapper { cap })
        } else {
            Err(BoardError::invalid_parameter(format!(
                "weight cap must be in (0, 1], got {cap}"
            )))
        }
    }

    pub fn cap(&self) -> f64 {
        self.cap
    }

    /// `clamp(probability, 0, 1) * cap`. Total: NaN maps to zero.
    pub fn weight(&self, probability: f64) -> f64 {
        if probability.is_nan() {
            return 0.0;
        }
        probability.clamp(0.0, 1.0) * self.cap
    }
}

impl Default for WeightMapper {
    fn default() -> Self {
        WeightMapper {
            cap: DEFAULT_WEIGHT_CAP,
        }
    }
}

// ---------------------------------------------------------------------------
// Highlight colour: probability → translucent row background
// ---------------------------------------------------------------------------

/// Row background whose opacity is the display weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Highlight {
    base: Srgb<u8>,
    mapper: WeightMapper,
}

impl Highlight {
    pub fn new(base: Srgb<u8>, mapper: WeightMapper) -> Self {
        Highlight { base, mapper }
    }

    /// Parse a `#rrggbb` base colour.
    pub fn from_hex(hex: &str, mapper: WeightMapper) -> Result<Self> {
        let base = hex.parse::<Srgb<u8>>().map_err(|e| {
            BoardError::invalid_parameter(format!("highlight colour `{hex}`: {e}"))
        })?;
        Ok(Highlight::new(base, mapper))
    }

    pub fn mapper(&self) -> &WeightMapper {
        &self.mapper
    }

    pub fn color_for(&self, probability: f64) -> Srgba<u8> {
        let alpha = (self.mapper.weight(probability) * 255.0).round() as u8;
        Srgba::new(self.base.red, self.base.green, self.base.blue, alpha)
    }

    /// CSS declaration for the row, e.g.
    /// `background-color: rgba(46, 204, 113, 0.3185);`.
    pub fn css_background(&self, probability: f64) -> String {
        format!(
            "background-color: rgba({}, {}, {}, {:.4});",
            self.base.red,
            self.base.green,
            self.base.blue,
            self.mapper.weight(probability)
        )
    }
}

impl Default for Highlight {
    fn default() -> Self {
        Highlight::new(Srgb::new(46, 204, 113), WeightMapper::default())
    }
}
