use std::f64::consts::PI;

/// Rounds half away from zero to `decimals` places.
#[inline]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Maps `value` on a cycle of length `period` onto the unit circle.
/// Hour 23 and hour 0 end up neighbours instead of 23 apart.
#[inline]
pub fn cyclical(value: f64, period: f64) -> (f64, f64) {
    let angle = 2.0 * PI * value / period;
    (angle.sin(), angle.cos())
}

/// Linear interpolation between `a` and `b` at `t` in `[0, 1]`. Exact at both ends.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding() {
        assert_eq!(round_to(0.12345, 3), 0.123);
        assert_eq!(round_to(1.25, 1), 1.3);
        assert_eq!(round_to(-1.25, 1), -1.3);
    }

    #[test]
    fn cyclical_wraps() {
        let (s0, c0) = cyclical(0.0, 24.0);
        let (s24, c24) = cyclical(24.0, 24.0);
        assert!((s0 - s24).abs() < 1e-12);
        assert!((c0 - c24).abs() < 1e-12);

        let (s6, c6) = cyclical(6.0, 24.0);
        assert!((s6 - 1.0).abs() < 1e-12);
        assert!(c6.abs() < 1e-12);
    }

    #[test]
    fn interpolation_endpoints() {
        assert_eq!(lerp(10.0, 20.0, 0.0), 10.0);
        assert_eq!(lerp(10.0, 20.0, 1.0), 20.0);
        assert_eq!(lerp(10.0, 20.0, 0.5), 15.0);
        assert_eq!(lerp(37.7749, 37.8044, 1.0), 37.8044);
    }
}
