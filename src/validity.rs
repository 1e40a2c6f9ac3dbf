// ============================================================================
// RANGE / VALIDITY
// ============================================================================

use crate::config::Range;
use crate::field::Field;
use crate::state::DisplayState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeStatus {
    InRange,
    OutOfRange,
}

impl RangeStatus {
    pub fn of(value: f64, range: &Range) -> Self {
        if range.contains(value) {
            RangeStatus::InRange
        } else {
            RangeStatus::OutOfRange
        }
    }

    pub fn is_out_of_range(self) -> bool {
        self == RangeStatus::OutOfRange
    }
}

/// Validity of the displayed values for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub needle1: Option<RangeStatus>,
    pub needle2: Option<RangeStatus>,
    pub readout: Option<RangeStatus>,
    /// Highlight bounds ordered and clipped to the dial range; `None` when
    /// either bound is missing or nothing of the band lies on the dial.
    pub highlight: Option<(f64, f64)>,
}

impl Assessment {
    pub fn evaluate(display: &DisplayState, range: &Range) -> Self {
        let status = |field| display.get(field).map(|v| RangeStatus::of(v, range));
        Self {
            needle1: status(Field::Needle1),
            needle2: status(Field::Needle2),
            readout: status(Field::Readout),
            highlight: clip_highlight(display, range),
        }
    }

    pub fn needle(&self, field: Field) -> Option<RangeStatus> {
        match field {
            Field::Needle1 => self.needle1,
            Field::Needle2 => self.needle2,
            _ => None,
        }
    }

    fn any_needle_out_of_range(&self) -> bool {
        [self.needle1, self.needle2]
            .into_iter()
            .flatten()
            .any(RangeStatus::is_out_of_range)
    }

    /// The readout goes to alert color with its own value or with any needle.
    pub fn readout_alert(&self) -> bool {
        self.any_needle_out_of_range() || self.readout.is_some_and(RangeStatus::is_out_of_range)
    }

    /// Whether the dial shows its warning glyph.
    pub fn warning(&self) -> bool {
        self.readout_alert()
    }
}

fn clip_highlight(display: &DisplayState, range: &Range) -> Option<(f64, f64)> {
    let lower = display.get(Field::HighlightLower)?;
    let upper = display.get(Field::HighlightUpper)?;
    let (start, end) = (range.clamp(lower.min(upper)), range.clamp(lower.max(upper)));
    (end > start).then_some((start, end))
}
