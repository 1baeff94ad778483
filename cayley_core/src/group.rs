use std::sync::Arc;

use internment::ArcIntern;
use thiserror::Error;

use crate::{
    orbit::{Orbit, OrbitLookup, PointAction, PointSet},
    permutation::Permutation,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GroupError {
    #[error("the domain must contain at least one point")]
    EmptyDomain,
    #[error("generator `{name}` acts on {found} points but the domain has only {expected}")]
    DomainMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// A permutation group on `0..point_count`, presented by named generators.
///
/// An empty generator list is the trivial group, not an error. Generators on
/// a smaller domain are padded up to `point_count`; generators on a larger
/// one are rejected.
#[derive(Clone, Debug)]
pub struct PermutationGroup {
    point_count: usize,
    generators: Vec<(ArcIntern<String>, Arc<Permutation>)>,
}

impl PermutationGroup {
    /// Build a group from anonymous generators, naming them `g0`, `g1`, ...
    pub fn new(
        point_count: usize,
        generators: Vec<Permutation>,
    ) -> Result<PermutationGroup, GroupError> {
        Self::with_named_generators(
            point_count,
            generators
                .into_iter()
                .enumerate()
                .map(|(at, generator)| (format!("g{at}"), generator))
                .collect(),
        )
    }

    pub fn with_named_generators(
        point_count: usize,
        generators: Vec<(String, Permutation)>,
    ) -> Result<PermutationGroup, GroupError> {
        if point_count == 0 {
            return Err(GroupError::EmptyDomain);
        }

        let mut named = Vec::with_capacity(generators.len());

        for (name, mut generator) in generators {
            if generator.point_count() > point_count {
                return Err(GroupError::DomainMismatch {
                    name,
                    expected: point_count,
                    found: generator.point_count(),
                });
            }

            generator.pad_to(point_count);
            named.push((ArcIntern::new(name), Arc::new(generator)));
        }

        Ok(PermutationGroup {
            point_count,
            generators: named,
        })
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.point_count
    }

    #[must_use]
    pub fn identity(&self) -> Permutation {
        Permutation::identity(self.point_count)
    }

    pub fn generators(&self) -> impl Iterator<Item = (&str, &Arc<Permutation>)> {
        self.generators.iter().map(|(name, perm)| (&***name, perm))
    }

    #[must_use]
    pub fn generator_permutations(&self) -> Vec<Arc<Permutation>> {
        self.generators
            .iter()
            .map(|(_, perm)| Arc::clone(perm))
            .collect()
    }

    #[must_use]
    pub fn generator(&self, name: &str) -> Option<&Arc<Permutation>> {
        self.generators
            .iter()
            .find(|(candidate, _)| ***candidate == *name)
            .map(|(_, perm)| perm)
    }

    #[must_use]
    pub fn generator_count(&self) -> usize {
        self.generators.len()
    }

    /// Whether every generator is the identity (including the no-generator
    /// case).
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.generators.iter().all(|(_, perm)| perm.is_identity())
    }

    /// The orbit partition of the domain.
    #[must_use]
    pub fn orbits(&self) -> Vec<PointSet> {
        let generators = self.generator_permutations();
        let mut covered = vec![false; self.point_count];
        let mut orbits = vec![];

        for point in 0..self.point_count {
            if covered[point] {
                continue;
            }

            let orbit = Orbit::compute(point, &generators, &PointAction, OrbitLookup::Sorted);

            for &reached in orbit.iter() {
                covered[reached] = true;
            }

            orbits.push(orbit.iter().copied().collect());
        }

        orbits
    }

    /// A product of `length` uniformly chosen generators or generator
    /// inverses. Not a uniform group element; the randomized chain
    /// construction mixes these into better-distributed residues.
    pub fn random_word(&self, rng: &mut fastrand::Rng, length: usize) -> Permutation {
        let mut word = self.identity();

        if self.generators.is_empty() {
            return word;
        }

        for _ in 0..length {
            let (_, generator) = &self.generators[rng.usize(0..self.generators.len())];

            if rng.bool() {
                word.compose_into(generator);
            } else {
                word.compose_into(&generator.inverse());
            }
        }

        word
    }
}
