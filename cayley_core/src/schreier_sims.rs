//! Schreier-Sims construction of a stabilizer chain.
//!
//! The deterministic construction sifts every Schreier generator and is
//! exact. The randomized construction is Las Vegas: it sifts random products
//! until the chain stops growing, runs much faster on large groups, and tags
//! its result unverified until [`verify`] has run the deterministic closure
//! over it.

use bnum::types::U512;
use log::{debug, info, trace};
use std::sync::Arc;

use crate::{
    chain::{Level, StabilizerChain, Verification},
    group::PermutationGroup,
    permutation::Permutation,
    transversal::{GenPair, Transversal, TransversalKind},
};

/// Build an exact stabilizer chain for the group.
#[must_use]
pub fn deterministic(group: &PermutationGroup) -> StabilizerChain {
    deterministic_with_kind(group, TransversalKind::Tree)
}

#[must_use]
pub fn deterministic_with_kind(
    group: &PermutationGroup,
    kind: TransversalKind,
) -> StabilizerChain {
    info!(
        start!("building a stabilizer chain from {} generators on {} points"),
        group.generator_count(),
        group.point_count()
    );

    let mut chain = StabilizerChain::trivial(group.point_count());
    chain.kind = kind;

    for (name, generator) in group.generators() {
        debug!("inserting generator {name} = {generator}");
        insert(&mut chain, 0, (**generator).clone());
    }

    chain.verification = Verification::Deterministic;

    info!(
        success!("chain of depth {} with order {}"),
        chain.depth(),
        chain.order()
    );

    chain
}

/// Knobs for the randomized construction.
pub struct RandomizedOptions {
    /// Consecutive trivially-sifting random elements required before the
    /// construction stops.
    pub quiet_rounds: usize,
    /// Stop early once the chain order reaches this externally known value.
    pub target_order: Option<U512>,
    /// Length of the random generator words mixed into each round.
    pub word_length: usize,
}

impl Default for RandomizedOptions {
    fn default() -> RandomizedOptions {
        RandomizedOptions {
            quiet_rounds: 16,
            target_order: None,
            word_length: 12,
        }
    }
}

/// Las-Vegas construction: absorb random products until the chain looks
/// complete. The result is tagged [`Verification::Randomized`]; callers that
/// need an exact chain must run [`verify`].
pub fn randomized(
    group: &PermutationGroup,
    rng: &mut fastrand::Rng,
    options: &RandomizedOptions,
) -> StabilizerChain {
    info!(
        start!("randomized chain construction from {} generators"),
        group.generator_count()
    );

    let mut chain = StabilizerChain::trivial(group.point_count());

    // Every input generator has to sift, or the chain misses part of the
    // group no matter how lucky the random rounds get.
    for (_, generator) in group.generators() {
        sift_and_absorb(&mut chain, (**generator).clone());
    }

    let mut quiet = 0;

    while quiet < options.quiet_rounds {
        if let Some(target) = options.target_order {
            if chain.order() == target {
                debug!("reached the target order {target}");
                break;
            }
        }

        let mut candidate = chain.random_element(rng);
        candidate.compose_into(&group.random_word(rng, options.word_length));

        if sift_and_absorb(&mut chain, candidate) {
            debug!(working!("chain grew to order {}"), chain.order());
            quiet = 0;
        } else {
            quiet += 1;
        }
    }

    chain.verification = Verification::Randomized;

    info!(
        success!("unverified chain of depth {} with order at least {}"),
        chain.depth(),
        chain.order()
    );

    chain
}

/// Run the deterministic Schreier closure over an existing chain, upgrading
/// it to [`Verification::Deterministic`]. Returns whether the chain was
/// already complete, which for a randomized chain is the Las-Vegas success
/// check.
pub fn verify(chain: &mut StabilizerChain) -> bool {
    let before = chain.order();

    let mut level = 0;
    while level < chain.depth() {
        for generator in collect_schreier_generators(chain, level) {
            insert(chain, level + 1, generator);
        }

        level += 1;
    }

    chain.verification = Verification::Deterministic;

    let converged = before == chain.order();

    if converged {
        debug!(success!("chain verified at order {}"), before);
    } else {
        debug!(
            "verification grew the chain from order {} to {}",
            before,
            chain.order()
        );
    }

    converged
}

/// Insert a generator known to fix the base points before `level`, extending
/// the base on demand and restoring the chain invariant by sifting every new
/// Schreier generator into the levels below.
pub(crate) fn insert(chain: &mut StabilizerChain, level: usize, generator: Permutation) {
    if generator.is_identity() {
        return;
    }

    // A generator fixing this level's base point still belongs here: it can
    // grow the orbit through other points, and the Schreier closure pushes a
    // copy of it down to the level it stabilizes.
    if level == chain.depth() {
        let base_point = generator.moved_point().unwrap();
        trace!("extending the base with {base_point}");

        chain
            .levels
            .push(Level::new(base_point, chain.point_count(), chain.kind));
    }

    let sift = chain.sift_from(level, &generator);
    if sift.levels_passed == chain.depth() - level && sift.residue.is_identity() {
        return;
    }

    trace!("new strong generator {generator} at level {level}");
    push_generator(chain, level, generator);

    for schreier in collect_schreier_generators(chain, level) {
        insert(chain, level + 1, schreier);
    }
}

/// Append a strong generator to a level, without the Schreier closure. The
/// generator fixes every earlier base point, so it acts on each shallower
/// level's orbit too; all of those transversal closures are kept current.
fn push_generator(chain: &mut StabilizerChain, level: usize, generator: Permutation) {
    let pair: GenPair = {
        let inverse = Arc::new(generator.inverse());
        (Arc::new(generator), inverse)
    };

    chain.levels[level].generators.push(pair.clone());

    for at in (0..=level).rev() {
        let generators = chain.effective_generators(at);
        chain.levels[at].transversal.extend(&generators, &pair);
    }
}

/// Absorb a random product into the chain at whichever level its sift gets
/// stuck, skipping the Schreier closure. Returns whether the chain grew.
pub(crate) fn sift_and_absorb(chain: &mut StabilizerChain, candidate: Permutation) -> bool {
    let sift = chain.sift(&candidate);

    if sift.levels_passed == chain.depth() && sift.residue.is_identity() {
        return false;
    }

    // The residue fixes every base point of the levels it passed, so it
    // belongs to the level where the sift got stuck; a residue that passed
    // the whole chain fixes the entire base and needs a new base point.
    let level = sift.levels_passed;
    let residue = sift.residue;

    if level == chain.depth() {
        chain.levels.push(Level::new(
            residue.moved_point().unwrap(),
            chain.point_count(),
            chain.kind,
        ));
    }

    push_generator(chain, level, residue);
    true
}

/// Every Schreier generator `u_v · s · u_{s(v)}⁻¹` of a level, with the
/// trivial ones dropped.
pub(crate) fn collect_schreier_generators(
    chain: &StabilizerChain,
    level: usize,
) -> Vec<Permutation> {
    schreier_generators(
        &chain.levels[level].transversal,
        &chain.effective_generators(level),
    )
}

/// Schreier generators of a transversal with respect to a generator list.
/// By Schreier's lemma these generate the stabilizer of the base point
/// within the group the list generates.
pub(crate) fn schreier_generators(
    transversal: &Transversal,
    generators: &[GenPair],
) -> Vec<Permutation> {
    let base_point = transversal.base_point();
    let mut schreier = vec![];

    for point in transversal.orbit_points() {
        let rep = transversal.representative(point).unwrap();

        for (generator, _) in generators {
            let mut candidate = rep.clone();
            candidate.compose_into(generator);

            let image = candidate.image(base_point);
            let inverse_rep = transversal
                .inverse_representative(image)
                .expect("the transversal is closed under its own generators");
            candidate.compose_into(&inverse_rep);

            if !candidate.is_identity() {
                schreier.push(candidate);
            }
        }
    }

    schreier
}
