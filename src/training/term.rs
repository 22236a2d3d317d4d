//! Term update tensors.

use thiserror::Error;

/// Error building a [`TermUpdate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TermUpdateError {
    /// A tensor must have at least one bin row.
    #[error("update tensor has no rows")]
    Empty,

    /// Row length must be positive.
    #[error("n_scores must be positive")]
    ZeroScores,

    /// The flat delta buffer does not divide into whole rows.
    #[error("delta count {len} is not a multiple of n_scores {n_scores}")]
    RaggedRows { len: usize, n_scores: usize },
}

/// A fitted term update: per-bin score deltas for one feature or feature
/// interaction.
///
/// The tensor is flat and row-major: row `b` holds the `n_scores` deltas
/// applied to a sample whose decoded bin index is `b`. Learning rate and
/// regularization are already folded into the deltas by the term-growing
/// code; this type only carries them to the update kernels.
///
/// An intercept-only term (a term over zero features) is simply a tensor
/// with a single row; see [`TermUpdate::intercept`].
#[derive(Debug, Clone)]
pub struct TermUpdate {
    deltas: Box<[f32]>,
    n_bins: usize,
    n_scores: usize,
}

impl TermUpdate {
    /// Build a tensor from a flat row-major delta buffer.
    pub fn new(deltas: Vec<f32>, n_scores: usize) -> Result<Self, TermUpdateError> {
        if n_scores == 0 {
            return Err(TermUpdateError::ZeroScores);
        }
        if deltas.is_empty() {
            return Err(TermUpdateError::Empty);
        }
        if deltas.len() % n_scores != 0 {
            return Err(TermUpdateError::RaggedRows {
                len: deltas.len(),
                n_scores,
            });
        }
        let n_bins = deltas.len() / n_scores;
        Ok(Self {
            deltas: deltas.into_boxed_slice(),
            n_bins,
            n_scores,
        })
    }

    /// Build a single-row tensor for an intercept-only term.
    pub fn intercept(deltas: Vec<f32>) -> Result<Self, TermUpdateError> {
        let n_scores = deltas.len();
        Self::new(deltas, n_scores)
    }

    /// Number of bin rows.
    #[inline]
    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Deltas per row.
    #[inline]
    pub fn n_scores(&self) -> usize {
        self.n_scores
    }

    /// The delta row for `bin`.
    #[inline]
    pub fn row(&self, bin: usize) -> &[f32] {
        debug_assert!(bin < self.n_bins, "bin {bin} >= n_bins {}", self.n_bins);
        &self.deltas[bin * self.n_scores..(bin + 1) * self.n_scores]
    }

    /// Single delta of a single-score row (regression / binary hot paths).
    #[inline]
    pub(crate) fn scalar(&self, bin: usize) -> f32 {
        debug_assert_eq!(self.n_scores, 1);
        debug_assert!(bin < self.n_bins, "bin {bin} >= n_bins {}", self.n_bins);
        self.deltas[bin]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_addressed_by_bin() {
        let t = TermUpdate::new(vec![0.1, 0.2, -0.3, 0.0, 0.5, -0.5], 3).unwrap();
        assert_eq!(t.n_bins(), 2);
        assert_eq!(t.row(0), &[0.1, 0.2, -0.3]);
        assert_eq!(t.row(1), &[0.0, 0.5, -0.5]);
    }

    #[test]
    fn intercept_is_one_row() {
        let t = TermUpdate::intercept(vec![0.25, -0.25]).unwrap();
        assert_eq!(t.n_bins(), 1);
        assert_eq!(t.n_scores(), 2);
    }

    #[test]
    fn rejects_ragged_and_empty() {
        assert_eq!(
            TermUpdate::new(vec![1.0, 2.0, 3.0], 2).unwrap_err(),
            TermUpdateError::RaggedRows { len: 3, n_scores: 2 }
        );
        assert_eq!(
            TermUpdate::new(vec![], 2).unwrap_err(),
            TermUpdateError::Empty
        );
        assert_eq!(
            TermUpdate::new(vec![1.0], 0).unwrap_err(),
            TermUpdateError::ZeroScores
        );
    }
}
