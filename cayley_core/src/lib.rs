//! Stabilizer chains for permutation groups.
//!
//! This crate builds a base and strong generating set (BSGS) for a
//! permutation group given only a finite list of generators, using the
//! Schreier-Sims algorithm in both its deterministic and randomized
//! (Las Vegas) forms. The resulting [`chain::StabilizerChain`] answers order,
//! membership, and random-sampling queries in polynomial time and supports
//! base changes, which the search layer in `cayley_search` relies on.

#[macro_export]
macro_rules! start {
    ($msg:expr) => {
        concat!("⏳ ", $msg)
    };
}

#[macro_export]
macro_rules! working {
    ($msg:expr) => {
        concat!("🛠  ", $msg)
    };
}

#[macro_export]
macro_rules! success {
    ($msg:expr) => {
        concat!("✅ ", $msg)
    };
}

pub mod base_change;
pub mod chain;
pub mod discrete;
pub mod group;
pub mod notation;
pub mod orbit;
pub mod permutation;
pub mod schreier_sims;
pub mod transversal;

pub use chain::{ChainError, StabilizerChain, Verification};
pub use group::{GroupError, PermutationGroup};
pub use notation::{IndexOrigin, NotationError};
pub use orbit::{Action, Orbit, OrbitLookup, PointAction, PointSet, SetAction, VectorAction};
pub use permutation::{Permutation, PermutationError};
pub use transversal::{Transversal, TransversalKind};
