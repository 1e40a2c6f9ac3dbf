// ============================================================================
// RENDER CONTRACT
// ============================================================================
//
// Each frame is a FrameRequest composed from the display state and its
// assessment, emitted into a Surface. Scene records the intents for replay
// and headless tests; raster::Canvas turns them into pixels.

pub mod raster;

use std::f64::consts::{FRAC_PI_2, PI};

use crate::config::{Color, InstrumentConfig, Range};
use crate::field::Field;
use crate::state::DisplayState;
use crate::validity::Assessment;

/// Angle of the range minimum, in screen radians (y grows downward).
pub const DIAL_START_ANGLE: f64 = FRAC_PI_2;
/// Sweep of the dial from minimum to maximum.
pub const DIAL_ARC_SPAN: f64 = PI * 1.5;

/// Needle angle for a position along the range; positions outside `[0, 1]`
/// pin to the end stops.
pub fn angle_for_fraction(fraction: f64) -> f64 {
    DIAL_START_ANGLE + DIAL_ARC_SPAN * fraction.clamp(0.0, 1.0)
}

// ============================================================================
// DRAW INTENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub angle: f64,
    pub major: bool,
    pub label: Option<String>,
}

/// The fixed dial face, scaled to the configured range.
#[derive(Debug, Clone, PartialEq)]
pub struct DialFace {
    pub range: Range,
    pub start_angle: f64,
    pub arc_span: f64,
    pub ticks: Vec<Tick>,
    pub caption: Option<String>,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NeedleIntent {
    pub field: Field,
    pub value: f64,
    pub angle: f64,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightArc {
    pub start_angle: f64,
    pub end_angle: f64,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSlot {
    /// Numeric readout, formatted `whole.fff`.
    Readout,
    /// Caption for one of the needles.
    NeedleLabel(Field),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextIntent {
    pub slot: TextSlot,
    pub text: String,
    pub color: Color,
}

/// Capabilities a drawing backend must offer.
pub trait Surface {
    fn clear(&mut self, color: Color);
    fn draw_dial(&mut self, face: &DialFace);
    fn draw_arc(&mut self, arc: &HighlightArc);
    fn draw_needle(&mut self, needle: &NeedleIntent);
    fn draw_text(&mut self, text: &TextIntent);
    fn draw_warning(&mut self, color: Color);
}

// ============================================================================
// FRAME REQUEST
// ============================================================================

/// Everything one frame draws, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRequest {
    pub background: Color,
    pub dial: DialFace,
    pub highlight: Option<HighlightArc>,
    pub needles: Vec<NeedleIntent>,
    pub texts: Vec<TextIntent>,
    pub warning: Option<Color>,
}

impl FrameRequest {
    pub fn compose(
        display: &DisplayState,
        assessment: &Assessment,
        config: &InstrumentConfig,
    ) -> Self {
        let range = config.range;
        let alert = assessment.warning();
        let face_color = if alert {
            config.alert_color
        } else {
            config.dial_color
        };

        let highlight = assessment.highlight.map(|(lower, upper)| HighlightArc {
            start_angle: angle_for_fraction(range.fraction(lower)),
            end_angle: angle_for_fraction(range.fraction(upper)),
            color: config.highlight_color,
        });

        let mut needles = Vec::with_capacity(2);
        let mut texts = Vec::new();
        let needle_specs = [
            (Field::Needle1, config.needle1_color, &config.needle1_label),
            (Field::Needle2, config.needle2_color, &config.needle2_label),
        ];
        for (field, normal, label) in needle_specs {
            let Some(value) = display.get(field) else {
                continue;
            };
            let out_of_range = assessment
                .needle(field)
                .is_some_and(|status| status.is_out_of_range());
            let color = if out_of_range { config.alert_color } else { normal };
            needles.push(NeedleIntent {
                field,
                value,
                angle: angle_for_fraction(range.fraction(value)),
                color,
            });
            if let Some(label) = label {
                texts.push(TextIntent {
                    slot: TextSlot::NeedleLabel(field),
                    text: label.clone(),
                    color,
                });
            }
        }

        if let Some(value) = display.get(Field::Readout) {
            texts.push(TextIntent {
                slot: TextSlot::Readout,
                text: format_readout(value),
                color: if assessment.readout_alert() {
                    config.alert_color
                } else {
                    config.text_color
                },
            });
        }

        Self {
            background: config.background_color,
            dial: dial_face(config, face_color),
            highlight,
            needles,
            texts,
            warning: alert.then_some(config.alert_color),
        }
    }

    /// Draw the frame back to front.
    pub fn emit<S: Surface + ?Sized>(&self, surface: &mut S) {
        surface.clear(self.background);
        if let Some(arc) = &self.highlight {
            surface.draw_arc(arc);
        }
        surface.draw_dial(&self.dial);
        for needle in &self.needles {
            surface.draw_needle(needle);
        }
        for text in &self.texts {
            surface.draw_text(text);
        }
        if let Some(color) = self.warning {
            surface.draw_warning(color);
        }
    }
}

fn dial_face(config: &InstrumentConfig, color: Color) -> DialFace {
    let range = config.range;
    let mut ticks = Vec::new();
    let major_count = config.ticks_count.max(2);
    let intervals = (major_count - 1) as f64;
    for i in 0..major_count {
        let t = i as f64 / intervals;
        ticks.push(Tick {
            angle: angle_for_fraction(t),
            major: true,
            label: Some(format!("{}", (range.min + t * range.span()).round() as i64)),
        });
        if i + 1 < major_count {
            let minor = config.minor_ticks_per_interval;
            for j in 1..=minor {
                let minor_t = t + j as f64 / ((minor + 1) as f64 * intervals);
                ticks.push(Tick {
                    angle: angle_for_fraction(minor_t),
                    major: false,
                    label: None,
                });
            }
        }
    }

    DialFace {
        range,
        start_angle: DIAL_START_ANGLE,
        arc_span: DIAL_ARC_SPAN,
        ticks,
        caption: config.caption.clone(),
        color,
    }
}

/// `42.5` becomes `"42.500"`; the sign survives values in `(-1, 0)`.
pub fn format_readout(value: f64) -> String {
    let thousandths = (value.abs() * 1000.0).round();
    let whole = (thousandths / 1000.0).trunc();
    let frac = thousandths - whole * 1000.0;
    let sign = if value < 0.0 && thousandths > 0.0 { "-" } else { "" };
    format!("{sign}{}.{:03}", whole as u64, frac as u64)
}

// ============================================================================
// RECORDING SURFACE
// ============================================================================

/// A recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Dial(DialFace),
    Arc(HighlightArc),
    Needle(NeedleIntent),
    Text(TextIntent),
    Warning(Color),
}

/// Retained list of draw intents, replayable into any surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn needles(&self) -> impl Iterator<Item = &NeedleIntent> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Needle(n) => Some(n),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextIntent> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text(t) => Some(t),
            _ => None,
        })
    }

    pub fn has_warning(&self) -> bool {
        self.commands
            .iter()
            .any(|c| matches!(c, DrawCommand::Warning(_)))
    }

    pub fn replay<S: Surface + ?Sized>(&self, surface: &mut S) {
        for command in &self.commands {
            match command {
                DrawCommand::Clear(color) => surface.clear(*color),
                DrawCommand::Dial(face) => surface.draw_dial(face),
                DrawCommand::Arc(arc) => surface.draw_arc(arc),
                DrawCommand::Needle(needle) => surface.draw_needle(needle),
                DrawCommand::Text(text) => surface.draw_text(text),
                DrawCommand::Warning(color) => surface.draw_warning(*color),
            }
        }
    }
}

impl Surface for Scene {
    fn clear(&mut self, color: Color) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear(color));
    }

    fn draw_dial(&mut self, face: &DialFace) {
        self.commands.push(DrawCommand::Dial(face.clone()));
    }

    fn draw_arc(&mut self, arc: &HighlightArc) {
        self.commands.push(DrawCommand::Arc(*arc));
    }

    fn draw_needle(&mut self, needle: &NeedleIntent) {
        self.commands.push(DrawCommand::Needle(needle.clone()));
    }

    fn draw_text(&mut self, text: &TextIntent) {
        self.commands.push(DrawCommand::Text(text.clone()));
    }

    fn draw_warning(&mut self, color: Color) {
        self.commands.push(DrawCommand::Warning(color));
    }
}
