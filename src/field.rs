// ============================================================================
// FIELDS
// ============================================================================

use std::fmt;

/// One of the named values a producer can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Needle1,
    Needle2,
    Readout,
    HighlightLower,
    HighlightUpper,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Needle1,
        Field::Needle2,
        Field::Readout,
        Field::HighlightLower,
        Field::HighlightUpper,
    ];

    /// The key used for this field on the wire.
    pub const fn key(self) -> &'static str {
        match self {
            Field::Needle1 => "needle1",
            Field::Needle2 => "needle2",
            Field::Readout => "readout",
            Field::HighlightLower => "highlightlower",
            Field::HighlightUpper => "highlightupper",
        }
    }

    /// Case-sensitive lookup of a wire key. Unknown keys yield `None`.
    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.key() == key)
    }

    pub const fn is_highlight(self) -> bool {
        matches!(self, Field::HighlightLower | Field::HighlightUpper)
    }

    const fn index(self) -> usize {
        match self {
            Field::Needle1 => 0,
            Field::Needle2 => 1,
            Field::Readout => 2,
            Field::HighlightLower => 3,
            Field::HighlightUpper => 4,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A sparse set of field values: each field is either absent or present
/// with a number. Absent is never the same thing as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FieldSet {
    values: [Option<f64>; 5],
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        self.values[field.index()]
    }

    /// Non-finite values are ignored; a field never holds NaN or infinity.
    pub fn set(&mut self, field: Field, value: f64) {
        if value.is_finite() {
            self.values[field.index()] = Some(value);
        }
    }

    /// Builder-style `set`.
    pub fn with(mut self, field: Field, value: f64) -> Self {
        self.set(field, value);
        self
    }

    pub fn remove(&mut self, field: Field) -> Option<f64> {
        self.values[field.index()].take()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.get(field).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    pub fn len(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Present fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, f64)> + '_ {
        Field::ALL
            .into_iter()
            .filter_map(move |field| self.get(field).map(|value| (field, value)))
    }
}

impl FromIterator<(Field, f64)> for FieldSet {
    fn from_iter<I: IntoIterator<Item = (Field, f64)>>(iter: I) -> Self {
        let mut set = FieldSet::new();
        for (field, value) in iter {
            set.set(field, value);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_resolve_back_to_their_field() {
        for field in Field::ALL {
            assert_eq!(Field::from_key(field.key()), Some(field));
        }
    }

    #[test]
    fn unknown_and_miscased_keys_are_rejected() {
        assert_eq!(Field::from_key("needle3"), None);
        assert_eq!(Field::from_key("Needle1"), None);
        assert_eq!(Field::from_key(""), None);
    }

    #[test]
    fn zero_is_present_not_absent() {
        let set = FieldSet::new().with(Field::Needle2, 0.0);
        assert!(set.contains(Field::Needle2));
        assert_eq!(set.get(Field::Needle2), Some(0.0));
        assert!(!set.contains(Field::Needle1));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn iter_yields_present_fields_in_order() {
        let set: FieldSet = [(Field::Readout, 3.0), (Field::Needle1, 1.0)]
            .into_iter()
            .collect();
        let items: Vec<_> = set.iter().collect();
        assert_eq!(items, vec![(Field::Needle1, 1.0), (Field::Readout, 3.0)]);
    }

    #[test]
    fn non_finite_values_leave_the_field_unchanged() {
        let mut set = FieldSet::new().with(Field::Needle1, 4.0);
        set.set(Field::Needle1, f64::NAN);
        set.set(Field::Needle2, f64::NEG_INFINITY);
        assert_eq!(set.get(Field::Needle1), Some(4.0));
        assert!(!set.contains(Field::Needle2));
        let collected: FieldSet = [(Field::Readout, f64::INFINITY)].into_iter().collect();
        assert!(collected.is_empty());
    }

    #[test]
    fn remove_clears_a_field() {
        let mut set = FieldSet::new().with(Field::HighlightLower, 5.0);
        assert_eq!(set.remove(Field::HighlightLower), Some(5.0));
        assert!(set.is_empty());
        assert_eq!(set.remove(Field::HighlightLower), None);
    }
}
