//! Per-sample gradient and hessian math for the update kernels.
//!
//! These are the innermost numeric policies, selected once per call by the
//! dispatcher in [`super::update`] and then invoked branch-free per sample.
//! Conventions:
//!
//! - Regression (squared error) carries its state in the gradient buffer as
//!   a residual; there is no hessian (the second derivative is constant and
//!   folded into the term fitting outside this crate).
//! - Binary classification works on a single logit; the hessian is derived
//!   from the gradient so only one sigmoid is evaluated per sample.
//! - Multiclass works on `K` logits with softmax probabilities computed from
//!   the caller-supplied exponentials and their sum.

use crate::math::sigmoid_approx;

/// Squared-error residual update: the new gradient is the old gradient minus
/// the applied score delta. Exact (no transcendental involved).
#[inline]
pub(crate) fn gradient_regression(old_gradient: f32, update_delta: f32) -> f32 {
    old_gradient - update_delta
}

/// Binary-classification gradient `sigmoid(score) - target` for a {0, 1}
/// target.
#[inline]
pub(crate) fn gradient_binary(score: f32, target: u32) -> f32 {
    debug_assert!(target <= 1, "binary target must be 0 or 1, got {target}");
    sigmoid_approx(score) - target as f32
}

/// Binary-classification hessian `p * (1 - p)`, recovered from the gradient.
///
/// For target 0 the gradient is `p`, for target 1 it is `p - 1`; in both
/// cases `|g| * (1 - |g|) = p * (1 - p)`, so no second sigmoid is needed.
#[inline]
pub(crate) fn hessian_from_gradient_binary(gradient: f32) -> f32 {
    let p = gradient.abs();
    p * (1.0 - p)
}

/// Multiclass softmax gradient and hessian for one class slot.
///
/// `class_exp` is the (approximate) exponential of the class's updated score
/// and `sum_exp` the sum over all classes for the same sample, so
/// `p = class_exp / sum_exp` is the softmax probability. The gradient is
/// `p - 1` for the true class and `p` otherwise; the hessian is `p * (1 - p)`
/// for every class.
#[inline]
pub(crate) fn gradient_hessian_multiclass(
    sum_exp: f32,
    class_exp: f32,
    target: usize,
    class: usize,
) -> (f32, f32) {
    let p = class_exp / sum_exp;
    let gradient = if class == target { p - 1.0 } else { p };
    (gradient, p * (1.0 - p))
}
