//! Deterministic float formatting.
//!
//! Two backends (a Rust CPU evaluator and a GLSL text emitter) must agree
//! bit-for-bit on every literal they write, and the emitted function *names*
//! must be valid GLSL identifiers that still uniquely encode their
//! parameters. Both needs are served by the same routine: format with 9
//! decimal digits, trim trailing zeros (keeping at least one digit after the
//! point so the text stays a valid float literal), then optionally run a
//! name-safe character substitution over the result.

/// Default substitution table used when composing identifiers:
/// `-` → `n`, `.` → `p` (so `-1.25` becomes `n1p25`).
pub const DEFAULT_NAME_SUBSTITUTIONS: &[(char, char)] = &[('-', 'n'), ('.', 'p')];

/// Format `f` with 9 decimal digits, trailing zeros trimmed, keeping at
/// least one fractional digit so the result is always a valid float literal.
#[must_use]
pub fn format_float(f: f32) -> String {
    // Normalize -0.0 to 0.0 so two floats that compare equal always format
    // identically (otherwise "-0.0" and "0.0" would hash to different names
    // for the same SDF value).
    let f: f32 = if f == 0.0 { 0.0 } else { f };
    let s = format!("{f:.9}");
    let trimmed = s.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}

/// Format `f` the way [`format_float`] does, then apply a name-safe
/// substitution table so the result can be embedded in a shader function
/// identifier.
#[must_use]
pub fn format_float_for_name(f: f32, substitutions: &[(char, char)]) -> String {
    let mut s = format_float(f);
    for &(from, to) in substitutions {
        s = s.replace(from, &to.to_string());
    }
    s
}

/// [`format_float_for_name`] with the default substitution table.
#[must_use]
pub fn name_encode_float(f: f32) -> String {
    format_float_for_name(f, DEFAULT_NAME_SUBSTITUTIONS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_zeros() {
        assert_eq!(format_float(1.25), "1.25");
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(0.0), "0.0");
    }

    #[test]
    fn negative_zero_normalizes() {
        assert_eq!(format_float(-0.0), format_float(0.0));
    }

    #[test]
    fn name_encoding_matches_spec_example() {
        assert_eq!(name_encode_float(-1.25), "n1p25");
    }

    #[test]
    fn name_encoding_is_deterministic() {
        assert_eq!(name_encode_float(2.5), name_encode_float(2.5));
    }
}
