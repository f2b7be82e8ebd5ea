use crate::vocab::Unit;

/// Converts a raw captured number plus its source unit into the core's
/// canonical numeric representation (spec §4.1):
/// - Hertz values pass through as integer Hz.
/// - Centimeters convert to inches (`cm * 0.3937`), rounded to one
///   decimal place; inches round to one decimal place too, so repeated
///   normalization is idempotent (spec §8 round-trip law).
pub fn normalize_numeric(raw: f64, unit: Unit) -> f64 {
    match unit {
        Unit::Hertz => raw.round(),
        Unit::Inches => round_to_tenth(raw),
        Unit::Centimeters => round_to_tenth(raw * 0.3937),
    }
}

fn round_to_tenth(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cm_converts_to_inches() {
        let inches = normalize_numeric(81.28, Unit::Centimeters);
        assert!((inches - 32.0).abs() < 0.1);
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_numeric(81.28, Unit::Centimeters);
        let twice = normalize_numeric(once, Unit::Inches);
        assert_eq!(once, twice);

        let hz_once = normalize_numeric(144.3, Unit::Hertz);
        let hz_twice = normalize_numeric(hz_once, Unit::Hertz);
        assert_eq!(hz_once, hz_twice);
    }

    #[test]
    fn hz_rounds_to_integer() {
        assert_eq!(normalize_numeric(144.0, Unit::Hertz), 144.0);
        assert_eq!(normalize_numeric(143.6, Unit::Hertz), 144.0);
    }
}
