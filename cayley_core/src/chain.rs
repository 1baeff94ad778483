//! The stabilizer chain (base and strong generating set).
//!
//! A chain is built by [`crate::schreier_sims`] and mutated only by
//! construction and [`crate::base_change`]; during searches it is read-only
//! and safe to share. Randomized construction tags its result
//! [`Verification::Randomized`], and callers that need a deterministic
//! guarantee must check [`StabilizerChain::require_verified`].

use std::sync::Arc;

use bnum::types::U512;
use thiserror::Error;

use crate::{
    orbit::PointSet,
    permutation::Permutation,
    transversal::{GenPair, Transversal, TransversalKind},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("the stabilizer chain is randomized and unverified; run `verify` first")]
    Unverified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Every Schreier generator was enumerated and sifted; the chain is
    /// exact.
    Deterministic,
    /// Built by the Las-Vegas construction and not yet verified.
    Randomized,
}

#[derive(Debug, Clone)]
pub(crate) struct Level {
    pub(crate) base_point: usize,
    pub(crate) generators: Vec<GenPair>,
    pub(crate) transversal: Transversal,
}

impl Level {
    pub(crate) fn new(base_point: usize, point_count: usize, kind: TransversalKind) -> Level {
        Level {
            base_point,
            generators: vec![],
            transversal: Transversal::new(kind, base_point, point_count),
        }
    }
}

/// The residue of sifting a permutation through the chain.
///
/// `levels_passed` counts how many levels reduced the permutation before the
/// sift got stuck; a full pass with an identity residue is membership.
#[derive(Debug, Clone)]
pub struct SiftResult {
    pub residue: Permutation,
    pub levels_passed: usize,
}

#[derive(Debug, Clone)]
pub struct StabilizerChain {
    point_count: usize,
    pub(crate) kind: TransversalKind,
    pub(crate) levels: Vec<Level>,
    pub(crate) verification: Verification,
}

impl StabilizerChain {
    /// The chain of the trivial group: empty base, order one.
    #[must_use]
    pub fn trivial(point_count: usize) -> StabilizerChain {
        StabilizerChain {
            point_count,
            kind: TransversalKind::Tree,
            levels: vec![],
            verification: Verification::Deterministic,
        }
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// The chain depth, the length of the base.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn base(&self) -> Vec<usize> {
        self.levels.iter().map(|level| level.base_point).collect()
    }

    #[must_use]
    pub fn base_point(&self, level: usize) -> usize {
        self.levels[level].base_point
    }

    #[must_use]
    pub fn transversal_sizes(&self) -> Vec<usize> {
        self.levels
            .iter()
            .map(|level| level.transversal.len())
            .collect()
    }

    /// The group order, the product of the transversal sizes.
    #[must_use]
    pub fn order(&self) -> U512 {
        self.levels.iter().fold(U512::ONE, |acc, level| {
            acc * U512::from(level.transversal.len() as u64)
        })
    }

    #[must_use]
    pub fn verification(&self) -> Verification {
        self.verification
    }

    /// Fail unless the chain carries a deterministic guarantee.
    pub fn require_verified(&self) -> Result<(), ChainError> {
        match self.verification {
            Verification::Deterministic => Ok(()),
            Verification::Randomized => Err(ChainError::Unverified),
        }
    }

    /// Reduce `permutation` level by level, dividing out the transversal
    /// representative of the base point's image at each step.
    #[must_use]
    pub fn sift(&self, permutation: &Permutation) -> SiftResult {
        self.sift_from(0, permutation)
    }

    pub(crate) fn sift_from(&self, start: usize, permutation: &Permutation) -> SiftResult {
        let mut residue = permutation.clone();
        let mut levels_passed = 0;

        for level in &self.levels[start..] {
            let image = residue.image(level.base_point);

            let Some(inverse_rep) = level.transversal.inverse_representative(image) else {
                break;
            };

            residue.compose_into(&inverse_rep);
            levels_passed += 1;
        }

        SiftResult {
            residue,
            levels_passed,
        }
    }

    /// Determine if a permutation is a member of the group
    #[must_use]
    pub fn is_member(&self, permutation: &Permutation) -> bool {
        let sift = self.sift(permutation);
        sift.levels_passed == self.levels.len() && sift.residue.is_identity()
    }

    /// A uniformly random group element: one random transversal
    /// representative per level, multiplied deepest level first.
    pub fn random_element(&self, rng: &mut fastrand::Rng) -> Permutation {
        self.random_element_from(0, rng)
    }

    /// A uniformly random element of the subgroup at `start`.
    pub(crate) fn random_element_from(&self, start: usize, rng: &mut fastrand::Rng) -> Permutation {
        let mut element = Permutation::identity(self.point_count);

        for level in self.levels[start..].iter().rev() {
            let points = level.transversal.orbit_points();
            let choice = points[rng.usize(0..points.len())];

            element.compose_into(&level.transversal.representative(choice).unwrap());
        }

        element
    }

    /// The orbit of the level's base point, ascending.
    #[must_use]
    pub fn level_orbit(&self, level: usize) -> Vec<usize> {
        self.levels[level].transversal.orbit_points()
    }

    #[must_use]
    pub fn level_representative(&self, level: usize, point: usize) -> Option<Permutation> {
        self.levels[level].transversal.representative(point)
    }

    pub fn level_generators(&self, level: usize) -> impl Iterator<Item = &Arc<Permutation>> {
        self.levels[level]
            .generators
            .iter()
            .map(|(generator, _)| generator)
    }

    /// Generators of the subgroup at `level`: every strong generator fixing
    /// the base prefix before it, which is the union of the generators
    /// stored at `level` and deeper.
    #[must_use]
    pub fn subgroup_generators(&self, level: usize) -> Vec<Arc<Permutation>> {
        self.levels[level..]
            .iter()
            .flat_map(|deeper| deeper.generators.iter().map(|(g, _)| Arc::clone(g)))
            .collect()
    }

    /// Like [`Self::subgroup_generators`], but keeping the cached inverses.
    pub(crate) fn effective_generators(&self, level: usize) -> Vec<GenPair> {
        self.levels[level..]
            .iter()
            .flat_map(|deeper| deeper.generators.iter().cloned())
            .collect()
    }

    /// The strong generating set: every level's generators together.
    #[must_use]
    pub fn strong_generators(&self) -> Vec<Arc<Permutation>> {
        self.subgroup_generators(0)
    }

    /// Points fixed by the whole subgroup at `level`. `level == depth()` is
    /// the trivial group, which fixes everything.
    #[must_use]
    pub fn fixed_points_of_level(&self, level: usize) -> PointSet {
        let generators = if level >= self.levels.len() {
            vec![]
        } else {
            self.subgroup_generators(level)
        };

        (0..self.point_count)
            .filter(|&point| {
                generators
                    .iter()
                    .all(|generator| generator.image(point) == point)
            })
            .collect()
    }

    /// Convert every tree transversal to an explicit one, for
    /// representative-lookup-heavy work like backtrack searches.
    pub fn materialize_transversals(&mut self) {
        for level in &mut self.levels {
            level.transversal.materialize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_chain() {
        let chain = StabilizerChain::trivial(5);

        assert_eq!(chain.order(), U512::ONE);
        assert_eq!(chain.depth(), 0);
        assert!(chain.base().is_empty());
        assert!(chain.is_member(&Permutation::identity(5)));
        assert!(!chain.is_member(&Permutation::from_cycles(5, vec![vec![0, 1]]).unwrap()));
        assert!(chain.require_verified().is_ok());

        let mut rng = fastrand::Rng::with_seed(1);
        assert!(chain.random_element(&mut rng).is_identity());
    }
}
