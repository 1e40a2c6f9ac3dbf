// ============================================================================
// TARGET & DISPLAY STATE
// ============================================================================
//
// TargetState is what the producer last asked for, DisplayState is what is
// currently drawn. Every present field reaches its target exactly in a finite
// number of ticks and never overshoots.

use crate::config::{HighlightBounds, InstrumentConfig, Retention};
use crate::field::{Field, FieldSet};

// ============================================================================
// TARGET STATE & RESOLVER
// ============================================================================

/// The parts of the configuration that steer target resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvePolicy {
    pub forced_highlight: Option<HighlightBounds>,
    pub retention: Retention,
}

impl ResolvePolicy {
    pub fn from_config(config: &InstrumentConfig) -> Self {
        Self {
            forced_highlight: config.highlight,
            retention: config.retention,
        }
    }
}

/// The most recently resolved set of field values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TargetState {
    fields: FieldSet,
}

impl TargetState {
    /// Starting target: nothing reported yet, forced highlight already in place.
    pub fn initial(policy: &ResolvePolicy) -> Self {
        let mut fields = FieldSet::new();
        apply_forced_highlight(&mut fields, policy);
        Self { fields }
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        self.fields.get(field)
    }

    /// Merge one parsed line into a new target.
    ///
    /// The result replaces `self` wholesale; a line either lands completely or,
    /// when it carries nothing usable, leaves the target untouched.
    pub fn resolve(&self, line: &FieldSet, policy: &ResolvePolicy) -> TargetState {
        if line.is_empty() {
            return *self;
        }

        let mut fields = match policy.retention {
            Retention::Persist => self.fields,
            Retention::PerLine => FieldSet::new(),
        };
        for (field, value) in line.iter() {
            if field.is_highlight() && policy.forced_highlight.is_some() {
                continue;
            }
            fields.set(field, value);
        }
        apply_forced_highlight(&mut fields, policy);

        TargetState { fields }
    }
}

fn apply_forced_highlight(fields: &mut FieldSet, policy: &ResolvePolicy) {
    if let Some(bounds) = policy.forced_highlight {
        fields.set(Field::HighlightLower, bounds.lower);
        fields.set(Field::HighlightUpper, bounds.upper);
    }
}

// ============================================================================
// INTERPOLATION
// ============================================================================

/// Per-tick approach toward a target value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    /// Fraction of the remaining gap closed per tick, in `(0, 1]`.
    pub rate: f64,
    /// Absolute gap at or below which the value snaps onto the target.
    pub snap: f64,
}

impl Motion {
    pub fn from_config(config: &InstrumentConfig) -> Self {
        Self {
            rate: config.convergence_rate,
            snap: config.snap_distance(),
        }
    }

    pub fn step(&self, current: f64, target: f64) -> f64 {
        let gap = target - current;
        if gap.abs() <= self.snap {
            return target;
        }
        let next = current + gap * self.rate;
        // rounding must neither carry the value past the target nor stall it
        // short of it once the step drops below float spacing
        if next == current || (target - next) * gap <= 0.0 {
            target
        } else {
            next
        }
    }
}

/// The values currently drawn. Hidden elements are simply absent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DisplayState {
    fields: FieldSet,
}

impl DisplayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        self.fields.get(field)
    }

    /// Advance every field one tick toward `target`.
    ///
    /// New fields appear directly at their target value; fields missing from
    /// the target are dropped at once.
    pub fn tick(&mut self, target: &TargetState, motion: &Motion) {
        for field in Field::ALL {
            match (target.get(field), self.fields.get(field)) {
                (None, _) => {
                    self.fields.remove(field);
                }
                (Some(goal), None) => self.fields.set(field, goal),
                (Some(goal), Some(current)) => self.fields.set(field, motion.step(current, goal)),
            }
        }
    }

    pub fn has_converged(&self, target: &TargetState) -> bool {
        self.fields == target.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::parse_line;
    use proptest::prelude::*;

    fn persist() -> ResolvePolicy {
        ResolvePolicy {
            forced_highlight: None,
            retention: Retention::Persist,
        }
    }

    fn motion() -> Motion {
        Motion {
            rate: 0.1,
            snap: 1e-3,
        }
    }

    fn feed(lines: &[&str], policy: &ResolvePolicy) -> TargetState {
        lines.iter().fold(TargetState::initial(policy), |target, line| {
            target.resolve(&parse_line(line), policy)
        })
    }

    #[test]
    fn mentioned_fields_overwrite_and_others_persist() {
        let target = feed(&["needle1=10 needle2=20 readout=1", "needle2=25"], &persist());
        assert_eq!(target.get(Field::Needle1), Some(10.0));
        assert_eq!(target.get(Field::Needle2), Some(25.0));
        assert_eq!(target.get(Field::Readout), Some(1.0));
    }

    #[test]
    fn highlight_persists_until_set_again() {
        let target = feed(
            &["highlightlower=70 highlightupper=90", "needle1=5", "highlightupper=95"],
            &persist(),
        );
        assert_eq!(target.get(Field::HighlightLower), Some(70.0));
        assert_eq!(target.get(Field::HighlightUpper), Some(95.0));
    }

    #[test]
    fn legacy_line_leaves_needle2_and_highlight_alone() {
        let target = feed(
            &["needle2=3 highlightlower=1 highlightupper=2", "42.5"],
            &persist(),
        );
        assert_eq!(target.get(Field::Needle1), Some(42.5));
        assert_eq!(target.get(Field::Readout), Some(42.5));
        assert_eq!(target.get(Field::Needle2), Some(3.0));
        assert_eq!(target.get(Field::HighlightLower), Some(1.0));
        assert_eq!(target.get(Field::HighlightUpper), Some(2.0));
    }

    #[test]
    fn forced_highlight_ignores_input_bounds() {
        let policy = ResolvePolicy {
            forced_highlight: Some(HighlightBounds::new(80.0, 100.0)),
            retention: Retention::Persist,
        };
        let initial = TargetState::initial(&policy);
        assert_eq!(initial.get(Field::HighlightLower), Some(80.0));
        assert_eq!(initial.get(Field::HighlightUpper), Some(100.0));

        let target = feed(&["highlightlower=1 highlightupper=2 needle1=50"], &policy);
        assert_eq!(target.get(Field::HighlightLower), Some(80.0));
        assert_eq!(target.get(Field::HighlightUpper), Some(100.0));
        assert_eq!(target.get(Field::Needle1), Some(50.0));
    }

    #[test]
    fn empty_line_is_a_no_op() {
        let before = feed(&["needle1=4"], &persist());
        assert_eq!(before.resolve(&FieldSet::new(), &persist()), before);
    }

    #[test]
    fn per_line_retention_drops_unmentioned_fields() {
        let policy = ResolvePolicy {
            forced_highlight: Some(HighlightBounds::new(10.0, 20.0)),
            retention: Retention::PerLine,
        };
        let target = feed(&["needle1=1 needle2=2", "needle1=3", ""], &policy);
        assert_eq!(target.get(Field::Needle1), Some(3.0));
        assert_eq!(target.get(Field::Needle2), None);
        assert_eq!(target.get(Field::HighlightLower), Some(10.0));
    }

    #[test]
    fn first_appearance_jumps_straight_to_target() {
        let target = feed(&["needle1=73"], &persist());
        let mut display = DisplayState::new();
        display.tick(&target, &motion());
        assert_eq!(display.get(Field::Needle1), Some(73.0));
    }

    #[test]
    fn fixed_target_converges_exactly_in_bounded_ticks() {
        let policy = persist();
        let mut target = feed(&["needle1=0 needle2=100 readout=0"], &policy);
        let mut display = DisplayState::new();
        display.tick(&target, &motion());

        target = target.resolve(&parse_line("needle1=100 needle2=0 readout=55.5"), &policy);
        // 100 * 0.9^k <= 1e-3 needs k >= 110
        let mut ticks = 0;
        while !display.has_converged(&target) {
            display.tick(&target, &motion());
            ticks += 1;
            assert!(ticks <= 120, "did not converge");
        }
        assert_eq!(display.get(Field::Needle1), Some(100.0));
        assert_eq!(display.get(Field::Needle2), Some(0.0));
        assert_eq!(display.get(Field::Readout), Some(55.5));
    }

    #[test]
    fn absent_target_field_disappears_on_next_tick() {
        let policy = ResolvePolicy {
            forced_highlight: None,
            retention: Retention::PerLine,
        };
        let mut target = feed(&["needle1=10 needle2=20"], &policy);
        let mut display = DisplayState::new();
        display.tick(&target, &motion());
        assert_eq!(display.get(Field::Needle2), Some(20.0));

        target = target.resolve(&parse_line("needle1=12"), &policy);
        display.tick(&target, &motion());
        assert_eq!(display.get(Field::Needle2), None);
        assert!(display.get(Field::Needle1).is_some());
    }

    #[test]
    fn step_below_float_spacing_still_lands_on_target() {
        let motion = Motion::from_config(&InstrumentConfig::default());
        let target = 1_000_000_000_000_000.5;
        let mut current = 1e15;
        for _ in 0..10 {
            current = motion.step(current, target);
        }
        assert_eq!(current, target);
    }

    #[test]
    fn unit_rate_reaches_target_in_one_tick() {
        let motion = Motion { rate: 1.0, snap: 1e-9 };
        assert_eq!(motion.step(3.0, 17.25), 17.25);
    }

    proptest! {
        #[test]
        fn approach_is_monotone_and_never_overshoots(
            start in -1000.0f64..1000.0,
            goal in -1000.0f64..1000.0,
            rate in 0.01f64..=1.0,
        ) {
            let motion = Motion { rate, snap: 1e-6 };
            let mut current = start;
            let mut gap = (goal - start).abs();
            for _ in 0..10_000 {
                if current == goal {
                    break;
                }
                let next = motion.step(current, goal);
                let next_gap = (goal - next).abs();
                prop_assert!(next_gap < gap, "gap grew from {} to {}", gap, next_gap);
                prop_assert!((goal - next) * (goal - start) >= 0.0, "overshot {} -> {}", next, goal);
                current = next;
                gap = next_gap;
            }
            prop_assert_eq!(current, goal);
        }

        #[test]
        fn approach_terminates_at_large_magnitudes(
            start in -1e15f64..1e15,
            offset in -10.0f64..10.0,
            rate in 0.01f64..=1.0,
        ) {
            let motion = Motion { rate, snap: 1e-3 };
            let goal = start + offset;
            let mut current = start;
            for _ in 0..10_000 {
                if current == goal {
                    break;
                }
                current = motion.step(current, goal);
            }
            prop_assert_eq!(current, goal);
        }
    }
}
