//! Term-update application: the per-round training hot path.
//!
//! [`apply_term_update`] is invoked once per boosting round per term. It adds
//! the term's per-bin score deltas to every sample's running score and
//! recomputes the gradients (and, for classification, hessians) the next
//! round will fit against.
//!
//! # Dispatch
//!
//! The entry point makes a two-level decision once per call, outside all
//! sample loops:
//!
//! 1. **Term shape**: an intercept-only term (single bin, no index stream)
//!    routes to [`zero`]; a general term routes to the block-structured
//!    decoder loops in [`packed`].
//! 2. **Objective family**: regression, binary, or multiclass. Multiclass
//!    additionally probes the runtime class count against the variants
//!    monomorphized for `3..=MAX_SPECIALIZED_CLASSES` classes and falls back
//!    to the runtime-sized variant above that, which is the only path that
//!    touches the caller's softmax scratch buffer.
//!
//! The kernels are monomorphized over small constants (class count, items
//! per word) with `0` as the "runtime-determined" value, so the common small
//! cases carry no runtime class-count parameter in their inner loops.
//!
//! # Contract
//!
//! The hot path trusts its caller: preconditions (buffer lengths, descriptor
//! validity, tensor row coverage of every decodable bin) are enforced with
//! `debug_assert!` only and violating them in a release build is out-of-
//! bounds territory. Buffers are exclusively owned for the duration of the
//! call; the call runs to completion with no suspension or internal locking.

mod packed;
mod parallel;
mod zero;

pub use parallel::{apply_term_update_parallel, Parallelism};

use crate::data::PackedIndexStream;
use crate::training::objective::{Objective, MAX_SPECIALIZED_CLASSES};
use crate::training::term::TermUpdate;

/// Class-count value selecting the runtime-sized multiclass kernel.
pub(crate) const DYNAMIC_CLASSES: usize = 0;

/// Items-per-word value selecting the runtime-width decoder.
pub(crate) const DYNAMIC_PACK: usize = 0;

/// Borrowed buffers for one term-update application.
///
/// All buffers are caller-owned and already sized; the kernels allocate
/// nothing. Layouts are sample-major:
///
/// - `scores`: `n_samples * n_scores` running scores, updated in place.
///   Regression never reads or writes scores here (the gradient buffer
///   carries the residual), so the slice may be empty.
/// - `grad_hess`: regression writes `n_samples` gradients; classification
///   writes `2 * n_samples * n_scores` interleaved `(grad, hess)` pairs.
///   Entries are overwritten, not accumulated.
/// - `targets`: one class id per sample for classification; unused (may be
///   empty) for regression.
/// - `scratch`: softmax exponent scratch of length `>= n_classes`, required
///   only when `n_classes > MAX_SPECIALIZED_CLASSES`; otherwise unused.
pub struct TermUpdateJob<'a> {
    /// The fitted per-bin delta tensor.
    pub update: &'a TermUpdate,
    /// Number of samples in this partition.
    pub n_samples: usize,
    /// Packed bin index per sample; `None` for an intercept-only term.
    pub bin_indices: Option<&'a PackedIndexStream>,
    /// Class ids (classification only).
    pub targets: &'a [u32],
    /// Running score accumulator, updated in place.
    pub scores: &'a mut [f32],
    /// Gradient (regression) or interleaved gradient/hessian output.
    pub grad_hess: &'a mut [f32],
    /// Softmax scratch for the runtime-sized multiclass path.
    pub scratch: &'a mut [f32],
}

/// Apply one term update and recompute gradients for every sample.
///
/// Postconditions: classification scores reflect the addition of the
/// sample's delta row, and `grad_hess` holds values for the *new* scores;
/// regression gradients hold `old_gradient - delta`. Nothing else changes.
///
/// # Example
///
/// ```
/// use cycleboost::data::PackedIndexStream;
/// use cycleboost::training::{apply_term_update, Objective, TermUpdate, TermUpdateJob};
///
/// let update = TermUpdate::new(vec![0.1, -0.2], 1).unwrap();
/// let bins = PackedIndexStream::pack(&[0, 1, 0], 32).unwrap();
/// let mut scores = vec![0.0f32; 3];
/// let mut grad_hess = vec![0.0f32; 6];
///
/// apply_term_update(
///     Objective::BinaryClassification,
///     TermUpdateJob {
///         update: &update,
///         n_samples: 3,
///         bin_indices: Some(&bins),
///         targets: &[1, 0, 1],
///         scores: &mut scores,
///         grad_hess: &mut grad_hess,
///         scratch: &mut [],
///     },
/// );
/// assert_eq!(scores, vec![0.1, -0.2, 0.1]);
/// ```
pub fn apply_term_update(objective: Objective, job: TermUpdateJob<'_>) {
    let TermUpdateJob {
        update,
        n_samples,
        bin_indices,
        targets,
        scores,
        grad_hess,
        scratch,
    } = job;
    let packed = bin_indices.map(|stream| {
        debug_assert_eq!(
            stream.len(),
            n_samples,
            "index stream covers a different sample count"
        );
        (stream.items_per_word(), stream.words())
    });
    dispatch(
        objective, update, n_samples, packed, targets, scores, grad_hess, scratch,
    );
}

/// Shared dispatch body for the public entry point and the shard driver,
/// which hands in raw word sub-slices instead of a whole stream.
#[allow(clippy::too_many_arguments)]
pub(crate) fn dispatch(
    objective: Objective,
    update: &TermUpdate,
    n_samples: usize,
    packed: Option<(usize, &[u64])>,
    targets: &[u32],
    scores: &mut [f32],
    grad_hess: &mut [f32],
    scratch: &mut [f32],
) {
    debug_assert!(n_samples >= 1, "n_samples must be at least 1");
    debug_assert_eq!(
        update.n_scores(),
        objective.n_scores(),
        "update tensor row length does not match the objective"
    );
    debug_assert!(grad_hess.len() >= n_samples * objective.grad_hess_stride());
    if objective.is_classification() {
        debug_assert!(targets.len() >= n_samples);
        debug_assert!(scores.len() >= n_samples * objective.n_scores());
    }

    match packed {
        None => {
            debug_assert_eq!(update.n_bins(), 1, "intercept term must have one bin");
            match objective {
                Objective::Regression => zero::regression(update, n_samples, grad_hess),
                Objective::BinaryClassification => {
                    zero::binary(update, n_samples, targets, scores, grad_hess)
                }
                Objective::MulticlassClassification { n_classes } => match n_classes {
                    // Probe arms must cover 3..=MAX_SPECIALIZED_CLASSES.
                    3 => zero::multiclass::<3>(3, update, n_samples, targets, scores, grad_hess, scratch),
                    4 => zero::multiclass::<4>(4, update, n_samples, targets, scores, grad_hess, scratch),
                    5 => zero::multiclass::<5>(5, update, n_samples, targets, scores, grad_hess, scratch),
                    6 => zero::multiclass::<6>(6, update, n_samples, targets, scores, grad_hess, scratch),
                    7 => zero::multiclass::<7>(7, update, n_samples, targets, scores, grad_hess, scratch),
                    8 => zero::multiclass::<8>(8, update, n_samples, targets, scores, grad_hess, scratch),
                    n => {
                        debug_assert!(n > MAX_SPECIALIZED_CLASSES, "multiclass needs n_classes >= 3");
                        debug_assert!(scratch.len() >= n, "dynamic multiclass requires scratch");
                        zero::multiclass::<DYNAMIC_CLASSES>(
                            n, update, n_samples, targets, scores, grad_hess, scratch,
                        )
                    }
                },
            }
        }
        Some((items_per_word, words)) => match objective {
            Objective::Regression => packed::regression::<DYNAMIC_PACK>(
                items_per_word, words, update, n_samples, grad_hess,
            ),
            Objective::BinaryClassification => packed::binary::<DYNAMIC_PACK>(
                items_per_word, words, update, n_samples, targets, scores, grad_hess,
            ),
            Objective::MulticlassClassification { n_classes } => match n_classes {
                3 => packed::multiclass::<3, DYNAMIC_PACK>(
                    3, items_per_word, words, update, n_samples, targets, scores, grad_hess, scratch,
                ),
                4 => packed::multiclass::<4, DYNAMIC_PACK>(
                    4, items_per_word, words, update, n_samples, targets, scores, grad_hess, scratch,
                ),
                5 => packed::multiclass::<5, DYNAMIC_PACK>(
                    5, items_per_word, words, update, n_samples, targets, scores, grad_hess, scratch,
                ),
                6 => packed::multiclass::<6, DYNAMIC_PACK>(
                    6, items_per_word, words, update, n_samples, targets, scores, grad_hess, scratch,
                ),
                7 => packed::multiclass::<7, DYNAMIC_PACK>(
                    7, items_per_word, words, update, n_samples, targets, scores, grad_hess, scratch,
                ),
                8 => packed::multiclass::<8, DYNAMIC_PACK>(
                    8, items_per_word, words, update, n_samples, targets, scores, grad_hess, scratch,
                ),
                n => {
                    debug_assert!(n > MAX_SPECIALIZED_CLASSES, "multiclass needs n_classes >= 3");
                    debug_assert!(scratch.len() >= n, "dynamic multiclass requires scratch");
                    packed::multiclass::<DYNAMIC_CLASSES, DYNAMIC_PACK>(
                        n, items_per_word, words, update, n_samples, targets, scores, grad_hess,
                        scratch,
                    )
                }
            },
        },
    }
}
