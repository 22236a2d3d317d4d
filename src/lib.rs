//! cycleboost: cyclic gradient-boosting update kernels for additive models.
//!
//! This crate provides the innermost training primitives of a cyclic
//! (term-at-a-time) boosting loop: once the outer loop has fitted a term
//! update (a small tensor of per-bin score deltas for one feature or feature
//! interaction), the kernels here apply it to every sample's running score
//! and recompute the per-sample gradients and hessians for the next round.
//!
//! The kernels are single-threaded, allocation-free, and trust their caller's
//! preconditions. Construction-time types ([`training::TermUpdate`],
//! [`data::PackedIndexStream`]) validate their input once so the per-round
//! hot path does not have to.

pub mod data;
pub mod math;
pub mod testing;
pub mod training;
