//! Block-structured update paths over a packed bin-index stream.
//!
//! Samples are processed in blocks of `items_per_word`, each block consuming
//! exactly one storage word of the index stream. The **first** block is the
//! only one that may be short: it holds `((n_samples - 1) % k) + 1` items
//! (the stream was packed remainder-first, see [`crate::data`]). After it,
//! every block runs with the same trip count `k`, so the loop body is
//! unroll- and vectorization-friendly without any per-sample bounds branch.
//! When `n_samples <= k` the structure collapses to that single short block.
//!
//! Indices are extracted from a word by shifting the slot's field down and
//! masking the low `bits_per_item` bits, low slots first, matching the
//! reference decoder in [`crate::data::PackedIndexStream::iter`].

use crate::data::{first_block_len, word_count, WORD_BITS};
use crate::math::exp_approx;
use crate::training::stats;
use crate::training::term::TermUpdate;

use super::{DYNAMIC_CLASSES, DYNAMIC_PACK};

/// Resolve the compile-time/runtime items-per-word pair and derive the
/// field width and extraction mask.
#[inline]
fn pack_geometry<const P: usize>(items_per_word: usize) -> (usize, usize, u64) {
    let k = if P == DYNAMIC_PACK { items_per_word } else { P };
    debug_assert_eq!(k, items_per_word, "specialization does not match runtime pack width");
    debug_assert!(1 <= k && k <= WORD_BITS, "items_per_word out of range");
    let bits = WORD_BITS / k;
    let mask = u64::MAX >> (WORD_BITS - bits);
    (k, bits, mask)
}

/// Regression over a packed stream: decode each sample's bin, fold that
/// bin's delta into the residual gradient. Scores and targets are not read.
pub(super) fn regression<const P: usize>(
    items_per_word: usize,
    words: &[u64],
    update: &TermUpdate,
    n_samples: usize,
    gradients: &mut [f32],
) {
    let (k, bits, mask) = pack_geometry::<P>(items_per_word);
    debug_assert!(words.len() >= word_count(n_samples, k));
    let gradients = &mut gradients[..n_samples];

    let mut word_idx = 0;
    let mut sample = 0;
    let mut block_len = first_block_len(n_samples, k);
    while sample < n_samples {
        let word = words[word_idx];
        word_idx += 1;
        for slot in 0..block_len {
            let bin = ((word >> (slot * bits)) & mask) as usize;
            let delta = update.scalar(bin);
            gradients[sample] = stats::gradient_regression(gradients[sample], delta);
            sample += 1;
        }
        block_len = k;
    }
}

/// Binary classification over a packed stream.
#[allow(clippy::too_many_arguments)]
pub(super) fn binary<const P: usize>(
    items_per_word: usize,
    words: &[u64],
    update: &TermUpdate,
    n_samples: usize,
    targets: &[u32],
    scores: &mut [f32],
    grad_hess: &mut [f32],
) {
    let (k, bits, mask) = pack_geometry::<P>(items_per_word);
    debug_assert!(words.len() >= word_count(n_samples, k));

    let mut word_idx = 0;
    let mut sample = 0;
    let mut block_len = first_block_len(n_samples, k);
    while sample < n_samples {
        let word = words[word_idx];
        word_idx += 1;
        for slot in 0..block_len {
            let bin = ((word >> (slot * bits)) & mask) as usize;
            let new_score = scores[sample] + update.scalar(bin);
            scores[sample] = new_score;
            let gradient = stats::gradient_binary(new_score, targets[sample]);
            grad_hess[2 * sample] = gradient;
            grad_hess[2 * sample + 1] = stats::hessian_from_gradient_binary(gradient);
            sample += 1;
        }
        block_len = k;
    }
}

/// Multiclass classification over a packed stream.
///
/// `K` is the compile-time class count (`DYNAMIC_CLASSES` for runtime-sized,
/// using `scratch`); `P` the compile-time items-per-word (`DYNAMIC_PACK` for
/// runtime width).
#[allow(clippy::too_many_arguments)]
pub(super) fn multiclass<const K: usize, const P: usize>(
    n_classes: usize,
    items_per_word: usize,
    words: &[u64],
    update: &TermUpdate,
    n_samples: usize,
    targets: &[u32],
    scores: &mut [f32],
    grad_hess: &mut [f32],
    scratch: &mut [f32],
) {
    let n = if K == DYNAMIC_CLASSES { n_classes } else { K };
    debug_assert_eq!(n, n_classes, "specialization does not match runtime class count");
    let (k, bits, mask) = pack_geometry::<P>(items_per_word);
    debug_assert!(words.len() >= word_count(n_samples, k));

    let mut local = [0.0f32; K];
    let exps: &mut [f32] = if K == DYNAMIC_CLASSES {
        &mut scratch[..n]
    } else {
        &mut local[..]
    };

    let mut word_idx = 0;
    let mut sample = 0;
    let mut block_len = first_block_len(n_samples, k);
    while sample < n_samples {
        let word = words[word_idx];
        word_idx += 1;
        for slot in 0..block_len {
            let bin = ((word >> (slot * bits)) & mask) as usize;
            let row = update.row(bin);
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
            sample += 1;
        }
        block_len = k;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PackedIndexStream;

    /// Regression with delta[bin] = bin recovers the decoded index sequence
    /// as negated gradients, giving a direct decode-order oracle.
    fn decode_via_regression<const P: usize>(stream: &PackedIndexStream) -> Vec<usize> {
        let n_bins = stream.iter().max().unwrap() + 1;
        let deltas: Vec<f32> = (0..n_bins).map(|b| b as f32).collect();
        let update = TermUpdate::new(deltas, 1).unwrap();
        let mut gradients = vec![0.0f32; stream.len()];
        regression::<P>(
            stream.items_per_word(),
            stream.words(),
            &update,
            stream.len(),
            &mut gradients,
        );
        gradients.iter().map(|g| (-g) as usize).collect()
    }

    #[test]
    fn block_loop_decodes_in_reference_order() {
        // k = 8: exercise one short block, exact fit, and remainder cases.
        let k = 8;
        for n in [1usize, k, k + 1, 2 * k + 3] {
            let indices: Vec<usize> = (0..n).map(|i| (i * 13 + 5) % 200).collect();
            let stream = PackedIndexStream::pack(&indices, k).unwrap();
            let naive: Vec<usize> = stream.iter().collect();
            assert_eq!(naive, indices);
            assert_eq!(decode_via_regression::<DYNAMIC_PACK>(&stream), naive, "n={n}");
        }
    }

    #[test]
    fn const_width_and_runtime_width_agree() {
        let indices: Vec<usize> = (0..19).map(|i| i % 6).collect();
        let stream = PackedIndexStream::pack(&indices, 8).unwrap();
        assert_eq!(
            decode_via_regression::<8>(&stream),
            decode_via_regression::<DYNAMIC_PACK>(&stream),
        );
    }

    #[test]
    fn full_width_single_item_words() {
        // k = 1: 64-bit fields, one sample per word.
        let indices = vec![1usize, 0, 3, 2];
        let stream = PackedIndexStream::pack(&indices, 1).unwrap();
        assert_eq!(decode_via_regression::<DYNAMIC_PACK>(&stream), indices);
    }

    #[test]
    fn binary_packed_matches_per_sample_math() {
        let update = TermUpdate::new(vec![0.4, -0.6], 1).unwrap();
        let indices = [0usize, 1, 1, 0, 1];
        let stream = PackedIndexStream::pack(&indices, 4).unwrap();
        let targets = [1u32, 0, 1, 0, 1];
        let mut scores = vec![0.2f32; 5];
        let mut grad_hess = vec![0.0f32; 10];

        binary::<DYNAMIC_PACK>(
            stream.items_per_word(),
            stream.words(),
            &update,
            5,
            &targets,
            &mut scores,
            &mut grad_hess,
        );

        for (i, &bin) in indices.iter().enumerate() {
            let expected = 0.2 + update.scalar(bin);
            assert_eq!(scores[i], expected);
            let g = stats::gradient_binary(expected, targets[i]);
            assert_eq!(grad_hess[2 * i], g);
            assert_eq!(grad_hess[2 * i + 1], stats::hessian_from_gradient_binary(g));
        }
    }
}
