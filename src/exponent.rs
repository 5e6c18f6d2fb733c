//! Damage exponent decoding.
//!
//! The storm database stores each damage figure as a magnitude plus a
//! one-character code giving its power of ten (`K` for thousands, `5` for
//! 10^5 and so on). Decoding never fails: a blank, unknown or malformed
//! code counts as a multiplier of 1.

/// Multiplier for a single exponent code, case-insensitive.
pub fn multiplier(code: Option<char>) -> u64 {
    let Some(c) = code else {
        return 1;
    };
    match c.to_ascii_uppercase() {
        '?' | '0' => 1,
        '1' => 10,
        '2' | 'H' => 100,
        '3' | 'K' => 1_000,
        '4' => 10_000,
        '5' => 100_000,
        '6' | 'M' => 1_000_000,
        '7' => 10_000_000,
        '8' => 100_000_000,
        'B' => 1_000_000_000,
        // `+`, `-` and anything else the source happens to contain
        _ => 1,
    }
}

/// Decode a raw exponent cell. Blank cells decode as absent; cells holding
/// more than one character are unrecognized.
pub fn decode_field(raw: Option<&str>) -> u64 {
    let trimmed = raw.map(str::trim).unwrap_or("");
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (None, _) => multiplier(None),
        (Some(c), None) => multiplier(Some(c)),
        (Some(_), Some(_)) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_codes_decode_exactly() {
        let table = [
            ('?', 1),
            ('0', 1),
            ('1', 10),
            ('2', 100),
            ('3', 1_000),
            ('4', 10_000),
            ('5', 100_000),
            ('6', 1_000_000),
            ('7', 10_000_000),
            ('8', 100_000_000),
            ('H', 100),
            ('K', 1_000),
            ('M', 1_000_000),
            ('B', 1_000_000_000),
        ];
        for (code, expected) in table {
            assert_eq!(multiplier(Some(code)), expected, "code {code}");
            assert_eq!(
                multiplier(Some(code.to_ascii_lowercase())),
                expected,
                "lowercase code {code}"
            );
        }
    }

    #[test]
    fn unknown_or_absent_codes_fall_back_to_one() {
        assert_eq!(multiplier(None), 1);
        for code in ['+', '-', 'X', 'z', ' ', '9'] {
            assert_eq!(multiplier(Some(code)), 1, "code {code:?}");
        }
    }

    #[test]
    fn raw_fields_are_trimmed_and_length_checked() {
        assert_eq!(decode_field(Some(" k ")), 1_000);
        assert_eq!(decode_field(Some("")), 1);
        assert_eq!(decode_field(None), 1);
        assert_eq!(decode_field(Some("KM")), 1);
        assert_eq!(decode_field(Some("b")), 1_000_000_000);
    }
}
