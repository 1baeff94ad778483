//! Backtracking search over a stabilizer chain.
//!
//! The engine in [`search`] walks the tree of partial base images of a
//! read-only, verified [`cayley_core::StabilizerChain`], pruned by a
//! problem-specific [`predicate::Predicate`], an optional partition
//! [`rbase::RBase`], and double-coset-minimality tests against the subgroup
//! found so far. The concrete searches in [`searches`] differ only in their
//! predicate and refinement choices, not in the engine.

pub mod partition;
pub mod predicate;
pub mod rbase;
pub mod refinement;
pub mod search;
pub mod searches;

pub use partition::OrderedPartition;
pub use predicate::{
    GroupIntersection, Predicate, SearchPredicate, SetImage, SmallerImage, VectorStabilizer,
};
pub use rbase::RBase;
pub use refinement::{FixFingerprint, FixPoints, FixVector, Refine, Refinement};
pub use search::BacktrackSearch;
pub use searches::{
    SearchError, intersection, lex_smallest_image, set_image_representative, set_stabilizer,
    vector_stabilizer,
};
