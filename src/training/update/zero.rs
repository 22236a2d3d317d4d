//! Intercept-only (zero-feature) update paths.
//!
//! An intercept term has exactly one tensor bin, so every sample receives
//! the same delta row and no index stream exists to decode. These loops are
//! otherwise the same per-sample work as the packed paths; keeping them
//! separate removes the word-decode machinery from a case the outer loop
//! runs every round.

use crate::math::exp_approx;
use crate::training::stats;
use crate::training::term::TermUpdate;

use super::DYNAMIC_CLASSES;

/// Regression: fold the single delta into every sample's residual gradient.
/// The score buffer is not touched (see the module docs in [`super`]).
pub(super) fn regression(update: &TermUpdate, n_samples: usize, gradients: &mut [f32]) {
    let delta = update.scalar(0);
    for gradient in gradients[..n_samples].iter_mut() {
        *gradient = stats::gradient_regression(*gradient, delta);
    }
}

/// Binary classification: shift every logit by the single delta, then emit
/// the gradient/hessian pair for the new logit.
pub(super) fn binary(
    update: &TermUpdate,
    n_samples: usize,
    targets: &[u32],
    scores: &mut [f32],
    grad_hess: &mut [f32],
) {
    let delta = update.scalar(0);
    let scores = &mut scores[..n_samples];
    let targets = &targets[..n_samples];
    let pairs = grad_hess[..2 * n_samples].chunks_exact_mut(2);
    for ((score, &target), pair) in scores.iter_mut().zip(targets).zip(pairs) {
        let new_score = *score + delta;
        *score = new_score;
        let gradient = stats::gradient_binary(new_score, target);
        pair[0] = gradient;
        pair[1] = stats::hessian_from_gradient_binary(gradient);
    }
}

/// Multiclass: shift all `K` logits by the delta row, softmax the updated
/// logits, and emit a gradient/hessian pair per class.
///
/// `K` is the compile-time class count; `DYNAMIC_CLASSES` selects the
/// runtime-sized variant, which keeps its exponentials in `scratch` instead
/// of a stack array.
#[allow(clippy::too_many_arguments)]
pub(super) fn multiclass<const K: usize>(
    n_classes: usize,
    update: &TermUpdate,
    n_samples: usize,
    targets: &[u32],
    scores: &mut [f32],
    grad_hess: &mut [f32],
    scratch: &mut [f32],
) {
    let n = if K == DYNAMIC_CLASSES { n_classes } else { K };
    debug_assert_eq!(n, n_classes, "specialization does not match runtime class count");

    let mut local = [0.0f32; K];
    let exps: &mut [f32] = if K == DYNAMIC_CLASSES {
        &mut scratch[..n]
    } else {
        &mut local[..]
    };

    let row = update.row(0);
    for sample in 0..n_samples {
        let target = targets[sample] as usize;
        debug_assert!(target < n, "target {target} out of range for {n} classes");
        let base = sample * n;

        let mut sum_exp = 0.0f32;
        for class in 0..n {
            let new_score = scores[base + class] + row[class];
            scores[base + class] = new_score;
            let e = exp_approx(new_score);
            exps[class] = e;
            sum_exp += e;
        }
        for class in 0..n {
            let (gradient, hessian) =
                stats::gradient_hessian_multiclass(sum_exp, exps[class], target, class);
            grad_hess[2 * (base + class)] = gradient;
            grad_hess[2 * (base + class) + 1] = hessian;
        }
    }
}
