//! Fixed-point quantization for geographic coordinates.
//!
//! Chunk corners are compared and hashed as integer micro-degrees (1e-6
//! degrees, six decimal digits). Two corners computed through different float
//! paths that agree to six digits produce the same quantized value.

/// Quantization scale: 1e-6 degrees.
pub const MICRO_DEGREES_PER_DEGREE: f64 = 1_000_000.0;

/// Canonicalize a float before quantizing.
///
/// - `-0.0` becomes `0.0`
/// - non-finite values become `0.0`
pub fn canonical_coord(v: f64) -> f64 {
    if v == 0.0 || !v.is_finite() { 0.0 } else { v }
}

/// Quantize degrees to integer micro-degrees (round half away from zero).
#[inline]
pub fn quantize_deg(v: f64) -> i64 {
    (canonical_coord(v) * MICRO_DEGREES_PER_DEGREE).round() as i64
}

#[inline]
pub fn dequantize_deg(q: i64) -> f64 {
    q as f64 / MICRO_DEGREES_PER_DEGREE
}

/// Round degrees to six decimal digits, returning a float.
#[inline]
pub fn round6(v: f64) -> f64 {
    dequantize_deg(quantize_deg(v))
}

#[cfg(test)]
mod tests {
    use super::{canonical_coord, dequantize_deg, quantize_deg, round6};

    #[test]
    fn quantizes_to_six_digits() {
        assert_eq!(quantize_deg(34.5), 34_500_000);
        assert_eq!(quantize_deg(-120.123_456_7), -120_123_457);
        assert_eq!(dequantize_deg(-120_000_000), -120.0);
    }

    #[test]
    fn float_noise_collapses() {
        let a = 0.1 + 0.2;
        let b = 0.3;
        assert_ne!(a, b);
        assert_eq!(quantize_deg(a), quantize_deg(b));
        assert_eq!(round6(a), 0.3);
    }

    #[test]
    fn negative_zero_and_nan_are_canonical() {
        assert_eq!(quantize_deg(-0.0), 0);
        assert_eq!(canonical_coord(f64::NAN), 0.0);
        assert_eq!(quantize_deg(f64::INFINITY), 0);
    }
}
