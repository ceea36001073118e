//! Number formatting shared by manifests and display helpers.

/// Format a float for the manifest: shortest round-trip digits, always with
/// a decimal point or exponent so that readers see a float, never an integer.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        let text = if value > 0.0 { "inf" } else { "-inf" };
        text.to_string()
    } else {
        format!("{value:?}")
    }
}

/// Format a float like C's `%.{precision}g`: `precision` significant digits,
/// trailing zeros removed, scientific notation for very small or large
/// magnitudes.
pub fn format_general(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let precision = precision.max(1);
    // Rounding to the requested digits first gives the exponent `%g` uses
    let sci = format!("{:.*e}", precision - 1, value);
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return sci;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{value:.decimals$}"))
    }
}

fn trim_fraction(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_float_keeps_float_shape() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(0.5), "0.5");
        assert_eq!(format_float(-2.25), "-2.25");
        assert_eq!(format_float(f64::NAN), "nan");
        assert_eq!(format_float(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_format_general_fixed() {
        assert_eq!(format_general(1.0, 3), "1");
        assert_eq!(format_general(0.5, 3), "0.5");
        assert_eq!(format_general(0.1, 3), "0.1");
        assert_eq!(format_general(12.345, 3), "12.3");
        assert_eq!(format_general(-0.8, 3), "-0.8");
        assert_eq!(format_general(0.0, 3), "0");
    }

    #[test]
    fn test_format_general_scientific() {
        assert_eq!(format_general(1234.0, 3), "1.23e+03");
        assert_eq!(format_general(0.00001, 3), "1e-05");
        assert_eq!(format_general(2.5e10, 3), "2.5e+10");
    }
}
