// ============================================================================
// CONFIGURATION
// ============================================================================

use std::path::PathBuf;

use bon::Builder;

use crate::error::ConfigError;

/// Color representation for gauge elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::new(0xff, 0xff, 0xff);
    pub const RED: Color = Color::new(0xff, 0x00, 0x00);
    pub const AZURE: Color = Color::new(0x00, 0x7f, 0xff);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// The value span covered by the dial face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    /// Checked constructor; `min` must be strictly below `max`.
    pub fn new(min: f64, max: f64) -> Result<Self, ConfigError> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ConfigError::NonFiniteRange {
                min: self.min,
                max: self.max,
            });
        }
        if self.min >= self.max {
            return Err(ConfigError::InvalidRange {
                min: self.min,
                max: self.max,
            });
        }
        if !self.span().is_finite() {
            return Err(ConfigError::RangeTooWide {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Inclusive at both ends.
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Position of `value` along the range, unclamped.
    pub fn fraction(&self, value: f64) -> f64 {
        (value - self.min) / self.span()
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

impl Default for Range {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
        }
    }
}

/// Highlight band bounds forced from the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightBounds {
    pub lower: f64,
    pub upper: f64,
}

impl HighlightBounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }
}

/// What happens to fields a line does not mention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Retention {
    /// Unmentioned fields keep their previous target.
    #[default]
    Persist,
    /// Every accepted line replaces the whole target; unmentioned fields
    /// disappear.
    PerLine,
}

#[derive(Debug, Clone, Builder)]
pub struct InstrumentConfig {
    #[builder(default = "Instrument".to_string())]
    pub title: String,
    #[builder(default)]
    pub range: Range,
    /// Always wins over `highlightlower`/`highlightupper` from the input.
    pub highlight: Option<HighlightBounds>,
    #[builder(default)]
    pub retention: Retention,

    // Motion
    /// Fraction of the remaining gap closed on each tick.
    #[builder(default = 0.1)]
    pub convergence_rate: f64,
    /// Gap, as a fraction of the range span, below which a value snaps onto its target.
    #[builder(default = 1e-5)]
    pub snap_epsilon: f64,

    // Window configuration
    #[builder(default = 300)]
    pub window_width: usize,
    #[builder(default = 300)]
    pub window_height: usize,
    #[builder(default = 60.0)]
    pub max_framerate: f64,

    // Main dial configuration
    #[builder(default = 45)]
    pub dial_margin: i32,
    #[builder(default = 4)]
    pub dial_thickness: i32,
    #[builder(default = 30.0)]
    pub dial_numbers_font_size: f32,
    #[builder(default = 30.0)]
    pub dial_ticks_to_numbers_distance: f64,

    // Tick configuration
    #[builder(default = 11)]
    pub ticks_count: usize,
    #[builder(default = 5)]
    pub minor_ticks_per_interval: usize,
    #[builder(default = 40)]
    pub major_tick_length: i32,
    #[builder(default = 25)]
    pub minor_tick_length: i32,
    #[builder(default = 2.0)]
    pub major_tick_thickness: f32,
    #[builder(default = 0.5)]
    pub minor_tick_thickness: f32,

    // Needle configuration
    #[builder(default = 1.05)]
    pub needle_length_factor: f64,
    #[builder(default = 80.0)]
    pub needle_back_length: f64,
    #[builder(default = 4.0)]
    pub needle_width: f32,
    #[builder(default = 6)]
    pub dot_radius: i32,

    // Labels
    pub needle1_label: Option<String>,
    pub needle2_label: Option<String>,
    #[builder(default = 16.0)]
    pub label_font_size: f32,

    // Readout configuration
    #[builder(default = 0.69)]
    pub readout_x_factor: f64,
    #[builder(default = 0.75)]
    pub readout_y_factor: f64,
    #[builder(default = 54.0)]
    pub readout_big_font_size: f32,
    #[builder(default = 28.0)]
    pub readout_small_font_size: f32,
    #[builder(default = 30)]
    pub readout_box_padding: i32,
    #[builder(default = 4.0)]
    pub readout_box_thickness: f32,

    // Curved caption along the top of the dial
    pub caption: Option<String>,
    #[builder(default = 30.0)]
    pub caption_font_size: f32,
    #[builder(default = 15.0)]
    pub caption_radius_offset: f64,
    #[builder(default = std::f64::consts::PI * 0.23)]
    pub caption_arc_span: f64,
    #[builder(default = 3.0 * std::f64::consts::PI / 2.0)]
    pub caption_angle: f64,

    // Highlight band configuration
    #[builder(default = 20)]
    pub highlight_band_width: i32,
    #[builder(default = 1.0)]
    pub highlight_band_alpha: f64,
    #[builder(default = 0.005)]
    pub highlight_band_edge_softness: f64,

    // Colors
    #[builder(default = Color::WHITE)]
    pub background_color: Color,
    #[builder(default = Color::BLACK)]
    pub dial_color: Color,
    #[builder(default = Color::BLACK)]
    pub text_color: Color,
    #[builder(default = Color::BLACK)]
    pub needle1_color: Color,
    #[builder(default = Color::AZURE)]
    pub needle2_color: Color,
    #[builder(default = Color::RED)]
    pub alert_color: Color,
    #[builder(default = Color::RED)]
    pub highlight_color: Color,

    // Font configuration
    /// Font file for all text; common system fonts are tried when unset.
    pub font_path: Option<PathBuf>,
    #[builder(default = 50.0)]
    pub exclamation_mark_size: f32,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl InstrumentConfig {
    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.range.validate()?;

        if let Some(HighlightBounds { lower, upper }) = self.highlight {
            if !lower.is_finite() || !upper.is_finite() {
                return Err(ConfigError::NonFiniteHighlight { lower, upper });
            }
        }

        if !(self.convergence_rate > 0.0 && self.convergence_rate <= 1.0) {
            return Err(ConfigError::InvalidConvergenceRate(self.convergence_rate));
        }
        if !(self.snap_epsilon.is_finite() && self.snap_epsilon > 0.0) {
            return Err(ConfigError::InvalidSnapEpsilon(self.snap_epsilon));
        }
        if !(self.max_framerate.is_finite() && self.max_framerate > 0.0) {
            return Err(ConfigError::InvalidFramerate(self.max_framerate));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(ConfigError::InvalidWindowSize {
                width: self.window_width,
                height: self.window_height,
            });
        }
        Ok(())
    }

    /// Absolute snap distance in value units.
    pub fn snap_distance(&self) -> f64 {
        self.snap_epsilon * self.range.span()
    }
}
