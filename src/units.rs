//! Unit normalization for user supplied values
//!
//! Lengths and feeds accept an optional `mm` or `in` suffix and default to
//! millimetres. Resolutions accept `dpi`, `dpin`, `dpmm`, `in` or `mm` and
//! default to dots per inch.

use crate::error::{RasterError, RasterResult};

/// Millimetres per inch
pub const MM_PER_INCH: f64 = 25.4;

fn parse_number(text: &str, what: &str) -> RasterResult<f64> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| RasterError::config(format!("invalid {}: '{}'", what, text)))?;
    if !value.is_finite() {
        return Err(RasterError::config(format!("invalid {}: '{}'", what, text)));
    }
    Ok(value)
}

/// Length in millimetres, e.g. `"10in"`, `"12.5mm"`, `"12.5"`
pub fn parse_length_mm(input: &str) -> RasterResult<f64> {
    let input = input.trim();
    if let Some(inches) = input.strip_suffix("in") {
        Ok(parse_number(inches, "length")? * MM_PER_INCH)
    } else if let Some(mm) = input.strip_suffix("mm") {
        parse_number(mm, "length")
    } else {
        parse_number(input, "length")
    }
}

/// Feed rate in mm/min; an `in` suffix means inches per minute
pub fn parse_feed_mm_per_min(input: &str) -> RasterResult<f64> {
    parse_length_mm(input)
}

/// Resolution in dots per millimetre, e.g. `"254dpi"`, `"10dpmm"`, `"100"`
pub fn parse_resolution_dpmm(input: &str) -> RasterResult<f64> {
    let input = input.trim();
    let (number, per_mm) = if let Some(n) = input.strip_suffix("dpmm") {
        (n, true)
    } else if let Some(n) = input.strip_suffix("dpin") {
        (n, false)
    } else if let Some(n) = input.strip_suffix("dpi") {
        (n, false)
    } else if let Some(n) = input.strip_suffix("mm") {
        (n, true)
    } else if let Some(n) = input.strip_suffix("in") {
        (n, false)
    } else {
        (input, false)
    };

    let value = parse_number(number, "resolution")?;
    Ok(if per_mm { value } else { value / MM_PER_INCH })
}

/// Percent to fraction, rejecting values outside `[0, 100]`
pub fn percent_to_fraction(percent: f64, what: &str) -> RasterResult<f64> {
    if !(0.0..=100.0).contains(&percent) {
        return Err(RasterError::config(format!(
            "{} {}% outside 0..100%",
            what, percent
        )));
    }
    Ok(percent / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_parse_length() {
        assert!(approx(parse_length_mm("10in").unwrap(), 254.0));
        assert!(approx(parse_length_mm("12.5mm").unwrap(), 12.5));
        assert!(approx(parse_length_mm(" 7 ").unwrap(), 7.0));
        assert!(parse_length_mm("ten").is_err());
        assert!(parse_length_mm("").is_err());
    }

    #[test]
    fn test_parse_feed() {
        assert!(approx(parse_feed_mm_per_min("1800").unwrap(), 1800.0));
        assert!(approx(parse_feed_mm_per_min("10in").unwrap(), 254.0));
    }

    #[test]
    fn test_parse_resolution() {
        assert!(approx(parse_resolution_dpmm("254").unwrap(), 10.0));
        assert!(approx(parse_resolution_dpmm("254dpi").unwrap(), 10.0));
        assert!(approx(parse_resolution_dpmm("254dpin").unwrap(), 10.0));
        assert!(approx(parse_resolution_dpmm("254in").unwrap(), 10.0));
        assert!(approx(parse_resolution_dpmm("10.5dpmm").unwrap(), 10.5));
        assert!(approx(parse_resolution_dpmm("10.5mm").unwrap(), 10.5));
        assert!(parse_resolution_dpmm("dpi").is_err());
    }

    #[test]
    fn test_percent_to_fraction() {
        assert!(approx(percent_to_fraction(50.0, "power").unwrap(), 0.5));
        assert!(approx(percent_to_fraction(0.0, "power").unwrap(), 0.0));
        assert!(approx(percent_to_fraction(100.0, "power").unwrap(), 1.0));
        assert!(percent_to_fraction(100.5, "power").is_err());
        assert!(percent_to_fraction(-1.0, "power").is_err());
    }
}
