//! Angle helpers for the interaction code.

/// Heading of the vector from `(x0, y0)` to `(x1, y1)`.
///
/// Returns 0 when both components are below `epsilon`, so a click without a
/// drag reads as "no heading".
#[inline]
pub fn heading_or_zero(x0: f64, y0: f64, x1: f64, y1: f64, epsilon: f64) -> f64 {
    let dx = x1 - x0;
    let dy = y1 - y0;
    if dx.abs() < epsilon && dy.abs() < epsilon {
        0.0
    } else {
        dy.atan2(dx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    #[test]
    fn test_heading_diagonal() {
        assert_relative_eq!(heading_or_zero(0.0, 0.0, 1.0, 1.0, 1e-4), FRAC_PI_4);
    }

    #[test]
    fn test_heading_click_is_zero() {
        assert_eq!(heading_or_zero(2.0, 3.0, 2.0, 3.0, 1e-4), 0.0);
        assert_eq!(heading_or_zero(2.0, 3.0, 2.00005, 2.99995, 1e-4), 0.0);
    }

    #[test]
    fn test_heading_single_axis_above_epsilon() {
        // Only one component needs to exceed epsilon
        assert_relative_eq!(heading_or_zero(0.0, 0.0, 0.0, -0.5, 1e-4), -FRAC_PI_2);
    }
}
