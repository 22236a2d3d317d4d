//! Testing utilities shared by unit and integration tests.
//!
//! ```ignore
//! use cycleboost::testing::{assert_slices_approx_eq, DEFAULT_TOLERANCE};
//! ```

use approx::AbsDiffEq;

/// Default tolerance for exact floating-point paths (additions, residuals).
pub const DEFAULT_TOLERANCE: f32 = 1e-5;

/// Tolerance for values that pass through the approximate exponential in
/// [`crate::math`]. Sized from its documented maximum relative error with
/// headroom for error accumulation across a softmax denominator.
pub const EXP_APPROX_TOLERANCE: f32 = 0.05;

/// Assert that two f32 values are approximately equal.
///
/// # Examples
///
/// ```
/// # use cycleboost::assert_approx_eq;
/// assert_approx_eq!(1.0f32, 1.0001f32, 0.001);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $tolerance:expr) => {{
        let left_val = $left;
        let right_val = $right;
        let tol = $tolerance;
        let diff = (left_val - right_val).abs();
        if diff > tol {
            panic!(
                "assertion failed: `{} ≈ {}` (diff {} > tolerance {})",
                left_val, right_val, diff, tol
            );
        }
    }};
}

/// Assert element-wise approximate equality of two f32 slices.
///
/// # Panics
///
/// Panics on length mismatch or any element pair differing by more than
/// `tolerance`.
pub fn assert_slices_approx_eq(left: &[f32], right: &[f32], tolerance: f32) {
    assert_eq!(
        left.len(),
        right.len(),
        "slice length mismatch: {} vs {}",
        left.len(),
        right.len()
    );
    for (i, (l, r)) in left.iter().zip(right).enumerate() {
        assert!(
            l.abs_diff_eq(r, tolerance),
            "element {i}: {l} vs {r} (tolerance {tolerance})"
        );
    }
}
