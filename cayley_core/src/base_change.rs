//! Base changes for a stabilizer chain.
//!
//! Adjacent base points can be exchanged in place while preserving the
//! group-order invariant, and the whole base can be rebuilt behind a desired
//! prefix with a randomized reconstruction whose result is confirmed by the
//! deterministic closure (a Las-Vegas guarantee). Failures of the size
//! invariants here are engine bugs and panic rather than surface as errors.

use std::sync::Arc;

use log::debug;

use crate::{
    chain::{Level, StabilizerChain, Verification},
    permutation::Permutation,
    schreier_sims,
    transversal::{GenPair, Transversal},
};

/// Where [`transpose_with`] draws the generators for the swapped-in upper
/// level.
pub enum GeneratorSource<'a> {
    /// Enumerate every Schreier generator of the new lower level. Complete
    /// by Schreier's lemma, so exhaustion before the size target is an
    /// engine bug.
    Deterministic,
    /// Sample random elements of the lower level's subgroup, at most
    /// `budget` of them.
    Randomized {
        rng: &'a mut fastrand::Rng,
        budget: usize,
    },
}

/// Exchange the base points of `level` and `level + 1`, preserving
/// `|U[i]| * |U[i+1]|`.
pub fn transpose(chain: &mut StabilizerChain, level: usize) {
    transpose_with(chain, level, GeneratorSource::Deterministic);
}

pub fn transpose_with(chain: &mut StabilizerChain, level: usize, source: GeneratorSource) {
    let upper = level + 1;
    assert!(
        upper < chain.depth(),
        "transposition needs two adjacent base points"
    );

    let beta_lower = chain.base_point(level);
    let beta_upper = chain.base_point(upper);
    let target_product =
        chain.levels[level].transversal.len() * chain.levels[upper].transversal.len();

    debug!("transposing base points {beta_lower} and {beta_upper}");

    // The lower level keeps its generators; only its base point changes, so
    // its transversal is a fresh orbit closure under the level's subgroup.
    let lower_generators_effective = chain.effective_generators(level);
    let mut lower_transversal = Transversal::new(chain.kind, beta_upper, chain.point_count());
    lower_transversal.rebuild(&lower_generators_effective);

    assert!(
        target_product % lower_transversal.len() == 0,
        "internal invariant violated: transversal product {target_product} is not divisible \
         by the new orbit size {}",
        lower_transversal.len()
    );
    let target_upper = target_product / lower_transversal.len();

    // The upper level starts from the generators below it, which fix both
    // points, and grows until the product invariant is restored.
    let mut upper_generators: Vec<GenPair> = if upper + 1 < chain.depth() {
        chain.effective_generators(upper + 1)
    } else {
        vec![]
    };
    let mut upper_transversal = Transversal::new(chain.kind, beta_lower, chain.point_count());
    upper_transversal.rebuild(&upper_generators);

    match source {
        GeneratorSource::Deterministic => {
            let mut pool =
                schreier_sims::schreier_generators(&lower_transversal, &lower_generators_effective)
                    .into_iter();

            while upper_transversal.len() < target_upper {
                let Some(candidate) = pool.next() else {
                    panic!(
                        "internal invariant violated: Schreier generators exhausted at orbit \
                         size {} of {target_upper}",
                        upper_transversal.len()
                    );
                };

                absorb(&mut upper_generators, &mut upper_transversal, candidate);
            }
        }
        GeneratorSource::Randomized { rng, mut budget } => {
            while upper_transversal.len() < target_upper {
                assert!(
                    budget > 0,
                    "internal invariant violated: the randomized generator source ran out of \
                     draws at orbit size {} of {target_upper}",
                    upper_transversal.len()
                );
                budget -= 1;

                // A random element of the lower level's subgroup, reduced to
                // fix the new lower base point.
                let element = chain.random_element_from(level, rng);
                let reached = element.image(beta_upper);
                let inverse_rep = lower_transversal
                    .inverse_representative(reached)
                    .expect("the lower orbit is closed under the level's subgroup");

                let mut candidate = element;
                candidate.compose_into(&inverse_rep);

                absorb(&mut upper_generators, &mut upper_transversal, candidate);
            }
        }
    }

    let lower_generators = std::mem::take(&mut chain.levels[level].generators);

    chain.levels[level] = Level {
        base_point: beta_upper,
        generators: lower_generators,
        transversal: lower_transversal,
    };
    chain.levels[upper] = Level {
        base_point: beta_lower,
        generators: upper_generators,
        transversal: upper_transversal,
    };
}

fn absorb(generators: &mut Vec<GenPair>, transversal: &mut Transversal, candidate: Permutation) {
    if candidate.is_identity() {
        return;
    }

    let pair: GenPair = {
        let inverse = Arc::new(candidate.inverse());
        (Arc::new(candidate), inverse)
    };

    // Kept even when the orbit does not grow right away; a generator can
    // become productive once later draws enlarge the orbit.
    transversal.extend(generators, &pair);
    generators.push(pair);
}

/// Rebuild the chain so that `prefix` is a prefix of the new base, via
/// randomized Schreier-Sims seeded with the existing strong generating set,
/// then confirm with the deterministic closure.
///
/// For a verified chain the group-order invariant is checked and a mismatch
/// panics; for an unverified chain the rebuilt order may legitimately exceed
/// the (understated) old one, and the result is exact for the strong
/// generating set either way.
pub fn change_base_prefix(chain: &mut StabilizerChain, prefix: &[usize], rng: &mut fastrand::Rng) {
    let old_order = chain.order();
    let strong = chain.strong_generators();

    let mut rebuilt = StabilizerChain::trivial(chain.point_count());
    rebuilt.kind = chain.kind;

    for (at, &point) in prefix.iter().enumerate() {
        assert!(point < chain.point_count());
        assert!(
            !prefix[..at].contains(&point),
            "base prefix points must be distinct"
        );

        rebuilt
            .levels
            .push(Level::new(point, chain.point_count(), chain.kind));
    }

    for generator in &strong {
        schreier_sims::sift_and_absorb(&mut rebuilt, (**generator).clone());
    }

    // Randomized rounds do most of the work; the closure below makes the
    // result exact regardless of how lucky they were.
    let mut quiet = 0;
    while quiet < 16 && rebuilt.order() != old_order {
        let mut candidate = rebuilt.random_element(rng);
        candidate.compose_into(&random_strong_word(&strong, rng, 8, chain.point_count()));

        if schreier_sims::sift_and_absorb(&mut rebuilt, candidate) {
            quiet = 0;
        } else {
            quiet += 1;
        }
    }

    schreier_sims::verify(&mut rebuilt);

    if chain.verification() == Verification::Deterministic {
        assert!(
            rebuilt.order() == old_order,
            "internal invariant violated: base change moved the group order from {old_order} \
             to {}",
            rebuilt.order()
        );
    }

    debug!(
        "rebased chain onto prefix {prefix:?}, new base {:?}",
        rebuilt.base()
    );

    *chain = rebuilt;
}

fn random_strong_word(
    strong: &[Arc<Permutation>],
    rng: &mut fastrand::Rng,
    length: usize,
    point_count: usize,
) -> Permutation {
    let mut word = Permutation::identity(point_count);

    if strong.is_empty() {
        return word;
    }

    for _ in 0..length {
        let generator = &strong[rng.usize(0..strong.len())];

        if rng.bool() {
            word.compose_into(generator);
        } else {
            word.compose_into(&generator.inverse());
        }
    }

    word
}

/// Drop base points that the stabilizer of the earlier base already fixes.
/// Detection scans each level's strong generators; a level all of whose
/// generators fix its own base point has a one-element orbit and contributes
/// nothing to the order.
pub fn remove_redundant_base_points(chain: &mut StabilizerChain) {
    let before = chain.order();

    chain.levels.retain(|level| {
        let redundant = level
            .generators
            .iter()
            .all(|(generator, _)| generator.image(level.base_point) == level.base_point);

        if redundant {
            debug!("dropping redundant base point {}", level.base_point);
        }

        !redundant
    });

    debug_assert_eq!(before, chain.order());
}
