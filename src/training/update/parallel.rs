//! Disjoint-shard parallel driver for term updates.
//!
//! The kernel itself is strictly single-threaded; the only sound way to
//! parallelize a term update is to partition the samples into disjoint
//! ranges with disjoint score/gradient regions and run the kernel once per
//! range. This module does exactly that on top of `rayon`.
//!
//! Shard boundaries must respect the packed stream's block structure: full
//! blocks are word-aligned, so every shard after the first covers a multiple
//! of `items_per_word` samples, and the first shard absorbs the global
//! remainder block. Each shard is then itself a well-formed remainder-first
//! stream and the sequential kernel runs on it unchanged, producing
//! bit-identical results to a single sequential call.

use crate::data::{first_block_len, word_count};
use crate::training::objective::{Objective, MAX_SPECIALIZED_CLASSES};

use super::{apply_term_update, dispatch, TermUpdateJob};

/// Below this many samples per thread, sharding overhead dominates and the
/// driver runs sequentially.
const MIN_SHARD_SAMPLES: usize = 4 * 1024;

/// Parallelism hint for [`apply_term_update_parallel`].
///
/// This is a hint, not a mandate: the driver downgrades to sequential when
/// the workload is too small to benefit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Parallelism {
    /// Strictly sequential execution (no thread spawning).
    #[default]
    Sequential,
    /// Parallel execution with up to `n` shards.
    Parallel(usize),
}

impl Parallelism {
    /// From a thread count: `0` uses rayon's current pool size, `1` is
    /// sequential.
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        match n_threads {
            0 => Self::Parallel(rayon::current_num_threads()),
            1 => Self::Sequential,
            n => Self::Parallel(n),
        }
    }

    /// Thread count hint (1 for sequential).
    #[inline]
    pub fn n_threads(self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Parallel(n) => n.max(1),
        }
    }
}

/// One shard's borrowed slice of the overall job.
struct Shard<'a> {
    n_samples: usize,
    packed: Option<(usize, &'a [u64])>,
    targets: &'a [u32],
    scores: &'a mut [f32],
    grad_hess: &'a mut [f32],
}

/// Apply a term update across sample shards in parallel.
///
/// Observable behavior is identical to [`apply_term_update`]; only the
/// execution strategy differs. On the runtime-sized multiclass path each
/// shard allocates its own softmax scratch (the job's `scratch` field is
/// used only if the driver falls back to a single sequential call).
pub fn apply_term_update_parallel(
    objective: Objective,
    job: TermUpdateJob<'_>,
    parallelism: Parallelism,
) {
    let want = parallelism
        .n_threads()
        .min(job.n_samples / MIN_SHARD_SAMPLES);
    if want <= 1 {
        apply_term_update(objective, job);
        return;
    }

    let TermUpdateJob {
        update,
        n_samples,
        bin_indices,
        targets,
        scores,
        grad_hess,
        scratch,
    } = job;

    let items_per_word = bin_indices.map(|s| {
        debug_assert_eq!(s.len(), n_samples);
        s.items_per_word()
    });
    let counts = shard_sample_counts(n_samples, items_per_word, want);
    if counts.len() <= 1 {
        let packed = bin_indices.map(|s| (s.items_per_word(), s.words()));
        dispatch(
            objective, update, n_samples, packed, targets, scores, grad_hess, scratch,
        );
        return;
    }

    // Carve the buffers into per-shard regions.
    let n_scores = objective.n_scores();
    let score_stride = if objective.is_classification() { n_scores } else { 0 };
    let target_stride = if objective.is_classification() { 1 } else { 0 };
    let gh_stride = objective.grad_hess_stride();

    let mut words_rest = bin_indices.map(|s| s.words());
    let mut targets_rest = targets;
    let mut scores_rest = scores;
    let mut gh_rest = grad_hess;

    let mut shards: Vec<Shard<'_>> = Vec::with_capacity(counts.len());
    for &count in &counts {
        let packed = match (words_rest.take(), items_per_word) {
            (Some(words), Some(k)) => {
                let (head, tail) = words.split_at(word_count(count, k));
                words_rest = Some(tail);
                Some((k, head))
            }
            _ => None,
        };
        let (t_head, t_tail) = targets_rest.split_at(count * target_stride);
        targets_rest = t_tail;
        let (s_head, s_tail) = std::mem::take(&mut scores_rest).split_at_mut(count * score_stride);
        scores_rest = s_tail;
        let (g_head, g_tail) = std::mem::take(&mut gh_rest).split_at_mut(count * gh_stride);
        gh_rest = g_tail;

        shards.push(Shard {
            n_samples: count,
            packed,
            targets: t_head,
            scores: s_head,
            grad_hess: g_head,
        });
    }

    let scratch_len = dynamic_scratch_len(objective);
    rayon::scope(|s| {
        for shard in shards {
            s.spawn(move |_| {
                let mut scratch = vec![0.0f32; scratch_len];
                dispatch(
                    objective,
                    update,
                    shard.n_samples,
                    shard.packed,
                    shard.targets,
                    shard.scores,
                    shard.grad_hess,
                    &mut scratch,
                );
            });
        }
    });
}

/// Scratch length a shard needs: the class count on the runtime-sized
/// multiclass path, zero everywhere else.
fn dynamic_scratch_len(objective: Objective) -> usize {
    match objective {
        Objective::MulticlassClassification { n_classes } if n_classes > MAX_SPECIALIZED_CLASSES => {
            n_classes
        }
        _ => 0,
    }
}

/// Split `n_samples` into up to `n_shards` disjoint contiguous shard sizes.
///
/// With a packed stream (`items_per_word = Some(k)`), shards are carved at
/// word boundaries: the first shard keeps the global remainder block, every
/// other shard is a multiple of `k` samples.
fn shard_sample_counts(
    n_samples: usize,
    items_per_word: Option<usize>,
    n_shards: usize,
) -> Vec<usize> {
    debug_assert!(n_samples >= 1 && n_shards >= 1);
    match items_per_word {
        None => {
            let n_shards = n_shards.min(n_samples);
            let base = n_samples / n_shards;
            let extra = n_samples % n_shards;
            (0..n_shards)
                .map(|i| base + usize::from(i < extra))
                .collect()
        }
        Some(k) => {
            let n_words = word_count(n_samples, k);
            let n_shards = n_shards.min(n_words);
            let base = n_words / n_shards;
            let extra = n_words % n_shards;
            let first = first_block_len(n_samples, k);
            (0..n_shards)
                .map(|i| {
                    let words = base + usize::from(i < extra);
                    if i == 0 {
                        first + (words - 1) * k
                    } else {
                        words * k
                    }
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_counts_cover_all_samples() {
        for (n, k, shards) in [(100usize, 8usize, 4usize), (17, 8, 4), (8, 8, 2), (4097, 64, 3)] {
            let counts = shard_sample_counts(n, Some(k), shards);
            assert_eq!(counts.iter().sum::<usize>(), n, "n={n} k={k}");
            // First shard carries the remainder, the rest are word-aligned.
            assert_eq!(counts[0] % k, n % k, "n={n} k={k}");
            for &c in &counts[1..] {
                assert_eq!(c % k, 0, "n={n} k={k}");
                assert!(c >= 1);
            }
        }
    }

    #[test]
    fn shard_counts_without_stream_are_near_even() {
        let counts = shard_sample_counts(10, None, 4);
        assert_eq!(counts, vec![3, 3, 2, 2]);
        let counts = shard_sample_counts(3, None, 8);
        assert_eq!(counts, vec![1, 1, 1]);
    }

    #[test]
    fn shard_count_clamped_by_words() {
        // 5 samples at k=8 is a single word; only one shard is possible.
        let counts = shard_sample_counts(5, Some(8), 4);
        assert_eq!(counts, vec![5]);
    }

    #[test]
    fn parallelism_from_threads() {
        assert_eq!(Parallelism::from_threads(1), Parallelism::Sequential);
        assert_eq!(Parallelism::from_threads(4), Parallelism::Parallel(4));
        assert!(matches!(Parallelism::from_threads(0), Parallelism::Parallel(_)));
    }
}
