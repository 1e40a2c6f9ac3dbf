// ============================================================================
// LINE PROTOCOL
// ============================================================================
//
// Two grammars per line:
//
//   needle1=42.5 needle2=-3 readout=42.5 highlightlower=80 highlightupper=100
//   42.5
//
// A bare number sets both needle1 and readout. Tokens that fit neither form
// are dropped one at a time; the rest of the line still applies.

use crate::field::{Field, FieldSet};

/// Parse one input line into the sparse set of fields it mentions.
///
/// Returns an empty set for blank or fully unparseable lines.
pub fn parse_line(line: &str) -> FieldSet {
    let line = line.trim();
    if line.is_empty() {
        return FieldSet::new();
    }

    if !line.contains('=') {
        return match parse_number(line) {
            Some(value) => FieldSet::new()
                .with(Field::Needle1, value)
                .with(Field::Readout, value),
            None => FieldSet::new(),
        };
    }

    line.split_whitespace().filter_map(parse_token).collect()
}

fn parse_token(token: &str) -> Option<(Field, f64)> {
    let (key, value) = token.split_once('=')?;
    let field = Field::from_key(key)?;
    Some((field, parse_number(value)?))
}

// `nan` and `inf` parse as f64 but can never be displayed or converged on.
fn parse_number(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}
