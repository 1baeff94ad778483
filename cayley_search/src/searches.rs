//! The concrete search problems.
//!
//! Each of these is the engine plus a predicate/refinement choice, nothing
//! more. Coset-type problems return an optional witness; subgroup-type
//! problems return a fresh deterministic chain for the solution subgroup.

use cayley_core::{
    ChainError, Permutation, PermutationGroup, PointSet, StabilizerChain, base_change,
    schreier_sims,
};
use log::debug;
use thiserror::Error;

use crate::{
    predicate::{GroupIntersection, Predicate, SetImage, SmallerImage, VectorStabilizer},
    rbase::RBase,
    refinement::{FixPoints, FixVector, Refinement},
    search::BacktrackSearch,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("the groups act on different domains ({0} and {1} points)")]
    DomainMismatch(usize, usize),
    #[error("the vector has {found} entries but the domain has {expected} points")]
    VectorLength { expected: usize, found: usize },
}

/// An element mapping `from` onto `to`, or `None` when no such element
/// exists — including for size mismatches and out-of-range target points.
pub fn set_image_representative(
    chain: &StabilizerChain,
    from: &PointSet,
    to: &PointSet,
) -> Result<Option<Permutation>, SearchError> {
    if from.len() != to.len() {
        return Ok(None);
    }

    let out_of_range = |set: &PointSet| {
        set.max_point()
            .is_some_and(|point| point >= chain.point_count())
    };
    if out_of_range(from) || out_of_range(to) {
        debug!("set image target leaves the domain, no representative");
        return Ok(None);
    }

    let search = BacktrackSearch::new(
        chain,
        Predicate::from(SetImage::mapping(from.clone(), to.clone())),
    )?;

    Ok(search.find_one())
}

/// The subgroup of elements fixing `set` as a set.
pub fn set_stabilizer(
    chain: &StabilizerChain,
    set: &PointSet,
) -> Result<StabilizerChain, SearchError> {
    let rbase = RBase::build(
        chain,
        vec![Refinement::from(FixPoints::stabilizing(set.clone()))],
    );

    let search = BacktrackSearch::new(chain, Predicate::from(SetImage::stabilizing(set.clone())))?
        .with_rbase(rbase);

    Ok(subgroup_chain(chain, search.find_subgroup()))
}

/// The subgroup of elements preserving every entry of `vector` under the
/// position action.
pub fn vector_stabilizer(
    chain: &StabilizerChain,
    vector: &[i64],
) -> Result<StabilizerChain, SearchError> {
    if vector.len() != chain.point_count() {
        return Err(SearchError::VectorLength {
            expected: chain.point_count(),
            found: vector.len(),
        });
    }

    let rbase = RBase::build(chain, vec![Refinement::from(FixVector::new(vector))]);

    let search = BacktrackSearch::new(
        chain,
        Predicate::from(VectorStabilizer::new(vector.to_vec())),
    )?
    .with_rbase(rbase);

    Ok(subgroup_chain(chain, search.find_subgroup()))
}

/// The intersection of two groups over the same domain. The second chain is
/// rebased onto the first one's base so the per-level membership prune
/// stays sound.
pub fn intersection(
    chain: &StabilizerChain,
    other: &StabilizerChain,
    rng: &mut fastrand::Rng,
) -> Result<StabilizerChain, SearchError> {
    if chain.point_count() != other.point_count() {
        return Err(SearchError::DomainMismatch(
            chain.point_count(),
            other.point_count(),
        ));
    }
    other.require_verified()?;

    let mut aligned = other.clone();
    base_change::change_base_prefix(&mut aligned, &chain.base(), rng);

    let search = BacktrackSearch::new(chain, Predicate::from(GroupIntersection::new(aligned)))?;

    Ok(subgroup_chain(chain, search.find_subgroup()))
}

/// The lexicographically smallest set in the orbit of `set`, with a witness
/// mapping `set` onto it.
///
/// Implemented by iterating the `SmallerImage` predicate: each round asks
/// for any element beating the current bound, and the bound strictly
/// decreases in a finite orbit, so the loop terminates at the minimum.
pub fn lex_smallest_image(
    chain: &StabilizerChain,
    set: &PointSet,
) -> Result<(PointSet, Permutation), SearchError> {
    let mut best = set.clone();
    let mut witness = Permutation::identity(chain.point_count());

    loop {
        let search = BacktrackSearch::new(
            chain,
            Predicate::from(SmallerImage::new(set.clone(), best.clone())),
        )?;

        match search.find_one() {
            Some(better) => {
                best = set.image(&better);
                debug!("improved image to {best}");
                witness = better;
            }
            None => break,
        }
    }

    Ok((best, witness))
}

fn subgroup_chain(chain: &StabilizerChain, generators: Vec<Permutation>) -> StabilizerChain {
    let group = PermutationGroup::new(chain.point_count(), generators)
        .expect("subgroup generators act on the chain's domain");

    schreier_sims::deterministic(&group)
}
