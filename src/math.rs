//! Approximate transcendental math for hot training loops.
//!
//! The update kernels evaluate one exponential per sample (binary) or one per
//! sample per class (multiclass) every boosting round, which makes `exp` the
//! dominant transcendental cost of training. This module trades accuracy for
//! throughput with the Schraudolph bit-manipulation approximation: one
//! multiply-add plus a float reinterpretation instead of a polynomial `exp`.
//!
//! The approximation has a maximum relative error of about 3%. That is
//! acceptable here because the consumers are link functions: softmax
//! probabilities are normalized by the sum of the same approximate
//! exponentials (and therefore still sum to exactly 1), and gradient noise at
//! this scale is far below the shrinkage applied by the outer boosting loop.
//! Callers that need full IEEE accuracy should use `f32::exp` directly.

/// Scale factor `2^23 / ln 2` mapping the exponent into the f32 bit layout.
const SCHRAUDOLPH_SCALE: f32 = 12_102_203.0;

/// Exponent bias term, tuned to balance the maximum relative error.
const SCHRAUDOLPH_OFFSET: f32 = 1_064_866_805.0;

/// Inputs below this produce a subnormal-range result; clamp to keep the bit
/// arithmetic inside the finite exponent range.
const EXP_INPUT_MIN: f32 = -87.0;

/// Inputs above this would overflow the u32 intermediate.
const EXP_INPUT_MAX: f32 = 88.0;

/// Maximum relative error of [`exp_approx`] over its clamped domain.
pub const EXP_APPROX_MAX_REL_ERROR: f32 = 0.031;

/// Bounded approximate `e^x` via the Schraudolph bit trick.
///
/// The result is always finite, positive, and within
/// [`EXP_APPROX_MAX_REL_ERROR`] of the true exponential for inputs in
/// `[-87, 88]`; inputs outside that range are clamped to it.
#[inline]
pub fn exp_approx(x: f32) -> f32 {
    let x = x.clamp(EXP_INPUT_MIN, EXP_INPUT_MAX);
    f32::from_bits((SCHRAUDOLPH_SCALE * x + SCHRAUDOLPH_OFFSET) as u32)
}

/// Approximate logistic sigmoid `1 / (1 + e^{ -x })`.
///
/// Evaluated in the numerically stable branch for each sign so the
/// intermediate exponential never overflows. The result stays strictly
/// inside `(0, 1)`, so probabilities and the hessians derived from them
/// never collapse to exactly 0 or 1. Inherits the relative error of
/// [`exp_approx`], which translates to an absolute probability error below
/// `0.25 * EXP_APPROX_MAX_REL_ERROR`.
#[inline]
pub fn sigmoid_approx(x: f32) -> f32 {
    if x >= 0.0 {
        // Past x ~ 17 the exponential drops below f32 epsilon and the
        // quotient rounds to exactly 1.0; cap it just underneath.
        (1.0 / (1.0 + exp_approx(-x))).min(1.0 - f32::EPSILON)
    } else {
        let e = exp_approx(x);
        e / (1.0 + e)
    }
}
