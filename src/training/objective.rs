//! Objective family descriptor.

/// Largest class count with a monomorphized multiclass kernel.
///
/// The dispatcher probes class counts up to this value and selects a variant
/// compiled for that exact count (fixed-size softmax scratch, unrollable
/// inner loops). Larger counts fall back to the runtime-sized variant, which
/// requires a caller-supplied scratch buffer.
pub const MAX_SPECIALIZED_CLASSES: usize = 8;

/// The objective family a term update is being applied under.
///
/// This is the class-count descriptor of the update kernels: it fixes the
/// number of score slots per sample and the gradient/hessian policy for the
/// whole call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Objective {
    /// Squared-error regression. One score slot; gradients only, no hessian.
    Regression,
    /// Binary classification on a single logit. One score slot; interleaved
    /// gradient/hessian output.
    BinaryClassification,
    /// Multiclass classification over `n_classes >= 3` logits.
    MulticlassClassification { n_classes: usize },
}

impl Objective {
    /// Multiclass descriptor. Two-class problems use
    /// [`Objective::BinaryClassification`] and its cheaper single-logit path.
    #[inline]
    pub fn multiclass(n_classes: usize) -> Self {
        debug_assert!(n_classes >= 3, "multiclass needs n_classes >= 3");
        Self::MulticlassClassification { n_classes }
    }

    /// Score slots per sample: 1 for regression and binary, `K` for
    /// `K`-class multiclass.
    #[inline]
    pub fn n_scores(&self) -> usize {
        match self {
            Self::Regression | Self::BinaryClassification => 1,
            Self::MulticlassClassification { n_classes } => *n_classes,
        }
    }

    /// Whether this objective produces interleaved gradient/hessian pairs.
    #[inline]
    pub fn is_classification(&self) -> bool {
        !matches!(self, Self::Regression)
    }

    /// Gradient-buffer entries per sample: `n_scores` for regression,
    /// `2 * n_scores` interleaved pairs for classification.
    #[inline]
    pub fn grad_hess_stride(&self) -> usize {
        if self.is_classification() {
            2 * self.n_scores()
        } else {
            self.n_scores()
        }
    }

    /// Objective name (for diagnostics).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Regression => "regression",
            Self::BinaryClassification => "binary",
            Self::MulticlassClassification { .. } => "multiclass",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_and_stride_layout() {
        assert_eq!(Objective::Regression.n_scores(), 1);
        assert_eq!(Objective::Regression.grad_hess_stride(), 1);
        assert_eq!(Objective::BinaryClassification.n_scores(), 1);
        assert_eq!(Objective::BinaryClassification.grad_hess_stride(), 2);
        let mc = Objective::multiclass(5);
        assert_eq!(mc.n_scores(), 5);
        assert_eq!(mc.grad_hess_stride(), 10);
    }
}
