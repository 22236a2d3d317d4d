//! Training-side update kernels.
//!
//! This module provides the pieces the outer boosting loop needs each round:
//!
//! - [`Objective`]: which gradient/hessian policy applies for the call
//! - [`TermUpdate`]: the fitted per-bin delta tensor for one term
//! - [`apply_term_update`]: apply a term update and recompute gradients
//! - [`apply_term_update_parallel`]: the same, sharded over `rayon`
//!
//! The outer loop itself (iteration control, term growing, binning) lives
//! outside this crate; these kernels only apply a given update.

mod objective;
mod stats;
mod term;
mod update;

pub use objective::{Objective, MAX_SPECIALIZED_CLASSES};
pub use term::{TermUpdate, TermUpdateError};
pub use update::{apply_term_update, apply_term_update_parallel, Parallelism, TermUpdateJob};
