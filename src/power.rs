//! Pixel intensity to laser power mapping.

/// Maps 8-bit samples to a power fraction, darker is stronger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerQuantizer {
    power_min: f64,
    power_max: f64,
    bit_depth: u8,
}

impl PowerQuantizer {
    /// Ranges are checked by [`crate::RasterOptions::validate`]; out-of-range
    /// bit depths are clamped here.
    pub fn new(power_min: f64, power_max: f64, bit_depth: u8) -> Self {
        Self {
            power_min,
            power_max,
            bit_depth: bit_depth.clamp(1, 8),
        }
    }

    pub fn bit_depth(&self) -> u8 {
        self.bit_depth
    }

    /// Number of distinct grey levels
    pub fn levels(&self) -> u32 {
        1 << self.bit_depth
    }

    /// Drop the low bits, truncating to the level below.
    pub fn quantize(&self, sample: u8) -> u8 {
        let shift = 8 - self.bit_depth;
        (sample >> shift) << shift
    }

    /// Power fraction in `[power_min, power_max]`
    pub fn power(&self, sample: u8) -> f64 {
        let level = self.quantize(sample) as f64;
        self.power_min + ((255.0 - level) / 255.0) * (self.power_max - self.power_min)
    }

    /// Power as the byte sent in a pad stream
    pub fn power_byte(&self, sample: u8) -> u8 {
        (self.power(sample) * 255.0).round().clamp(0.0, 255.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_endpoints() {
        let q = PowerQuantizer::new(0.1, 0.6, 8);
        assert!((q.power(255) - 0.1).abs() < 1e-12);
        assert!((q.power(0) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_full_depth_is_linear() {
        let q = PowerQuantizer::new(0.0, 0.5, 8);
        for s in 0..=255u8 {
            let expected = (255.0 - s as f64) / 255.0 * 0.5;
            assert!((q.power(s) - expected).abs() < 1e-12, "sample {}", s);
        }
    }

    #[test]
    fn test_monotonic_non_increasing() {
        for bits in 1..=8 {
            let q = PowerQuantizer::new(0.2, 0.9, bits);
            for s in 0..255u8 {
                assert!(q.power(s) >= q.power(s + 1), "bits {} sample {}", bits, s);
            }
        }
    }

    #[test]
    fn test_one_bit_has_two_levels() {
        let q = PowerQuantizer::new(0.0, 1.0, 1);
        let bytes: BTreeSet<u8> = (0..=255u8).map(|s| q.power_byte(s)).collect();
        assert_eq!(bytes.len(), 2);
        assert_eq!(q.levels(), 2);
    }

    #[test]
    fn test_bit_depth_clamped() {
        assert_eq!(PowerQuantizer::new(0.0, 1.0, 0).bit_depth(), 1);
        assert_eq!(PowerQuantizer::new(0.0, 1.0, 5).bit_depth(), 5);
        assert_eq!(PowerQuantizer::new(0.0, 1.0, 12).bit_depth(), 8);
        assert_eq!(PowerQuantizer::new(0.0, 1.0, 12).levels(), 256);
    }

    #[test]
    fn test_quantize_truncates() {
        let q = PowerQuantizer::new(0.0, 1.0, 2);
        assert_eq!(q.quantize(63), 0);
        assert_eq!(q.quantize(64), 64);
        assert_eq!(q.quantize(191), 128);
        assert_eq!(q.quantize(255), 192);
        // 255 at two bits is not white any more
        assert!(q.power(255) > 0.0);
    }

    #[test]
    fn test_power_byte() {
        let q = PowerQuantizer::new(0.0, 1.0, 8);
        assert_eq!(q.power_byte(0), 255);
        assert_eq!(q.power_byte(255), 0);
        let half = PowerQuantizer::new(0.0, 0.5, 8);
        // 127.5 rounds away from zero
        assert_eq!(half.power_byte(0), 128);
    }
}
