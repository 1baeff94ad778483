use bnum::types::U512;
use cayley_core::{
    ChainError, Permutation, PermutationGroup, PointSet, StabilizerChain, discrete::factorial,
    schreier_sims::{RandomizedOptions, deterministic, randomized},
};
use cayley_search::{
    BacktrackSearch, Predicate, SearchError, SetImage, intersection, lex_smallest_image,
    set_image_representative, set_stabilizer, vector_stabilizer,
};

fn symmetric_chain(n: usize) -> StabilizerChain {
    deterministic(
        &PermutationGroup::new(
            n,
            vec![
                Permutation::from_cycles(n, vec![(0..n).collect()]).unwrap(),
                Permutation::from_cycles(n, vec![vec![0, 1]]).unwrap(),
            ],
        )
        .unwrap(),
    )
}

fn cyclic_chain(n: usize, points: usize) -> StabilizerChain {
    deterministic(
        &PermutationGroup::new(
            points,
            vec![Permutation::from_cycles(points, vec![(0..n).collect()]).unwrap()],
        )
        .unwrap(),
    )
}

#[test_log::test]
fn set_stabilizer_in_s10() {
    let chain = symmetric_chain(10);
    let stabilizer = set_stabilizer(&chain, &PointSet::new(vec![0, 4, 7, 8])).unwrap();

    // S4 on the set times S6 on its complement
    assert_eq!(stabilizer.order(), factorial(4) * factorial(6));

    let mut rng = fastrand::Rng::with_seed(2);
    for _ in 0..20 {
        let element = stabilizer.random_element(&mut rng);
        assert_eq!(
            PointSet::new(vec![0, 4, 7, 8]).image(&element),
            PointSet::new(vec![0, 4, 7, 8])
        );
        assert!(chain.is_member(&element));
    }
}

#[test_log::test]
fn set_image_finds_an_exact_witness() {
    let chain = symmetric_chain(10);
    let from = PointSet::new(vec![0, 4, 7, 8]);
    let to = PointSet::new(vec![2, 6, 0, 9]);

    let witness = set_image_representative(&chain, &from, &to)
        .unwrap()
        .expect("the symmetric group maps any 4-set to any other");

    assert_eq!(from.image(&witness), to);
    assert!(chain.is_member(&witness));
}

#[test_log::test]
fn set_image_reports_no_representative_instead_of_crashing() {
    let chain = symmetric_chain(10);
    let from = PointSet::new(vec![0, 4, 7, 8]);

    // out-of-range target point
    assert_eq!(
        set_image_representative(&chain, &from, &PointSet::new(vec![2, 6, 10, 9])).unwrap(),
        None
    );

    // size mismatch
    assert_eq!(
        set_image_representative(&chain, &from, &PointSet::new(vec![2, 6])).unwrap(),
        None
    );

    // in-range but in a different orbit
    let cyclic = cyclic_chain(3, 5);
    assert_eq!(
        set_image_representative(&cyclic, &PointSet::new(vec![0]), &PointSet::new(vec![3]))
            .unwrap(),
        None
    );
    assert!(
        set_image_representative(&cyclic, &PointSet::new(vec![0]), &PointSet::new(vec![1]))
            .unwrap()
            .is_some()
    );
}

#[test_log::test]
fn set_image_of_a_set_onto_itself_always_succeeds() {
    let chain = symmetric_chain(8);
    let set = PointSet::new(vec![1, 3, 5]);

    let witness = set_image_representative(&chain, &set, &set)
        .unwrap()
        .expect("the identity is always a witness");

    assert_eq!(set.image(&witness), set);
}

#[test_log::test]
fn intersection_of_a_group_with_itself_is_the_whole_group() {
    let chain = symmetric_chain(6);
    let mut rng = fastrand::Rng::with_seed(31);

    let meet = intersection(&chain, &chain, &mut rng).unwrap();

    assert_eq!(meet.order(), chain.order());

    // every generator of the original group passes the intersection
    let group = PermutationGroup::new(
        6,
        vec![
            Permutation::from_cycles(6, vec![(0..6).collect()]).unwrap(),
            Permutation::from_cycles(6, vec![vec![0, 1]]).unwrap(),
        ],
    )
    .unwrap();

    for (_, generator) in group.generators() {
        assert!(meet.is_member(generator));
    }
}

#[test_log::test]
fn intersection_of_distinct_subgroups() {
    let mut rng = fastrand::Rng::with_seed(37);

    // A4 ∩ D4 is the Klein four-group of double transpositions
    let alternating = deterministic(
        &PermutationGroup::new(
            4,
            vec![
                Permutation::from_cycles(4, vec![vec![0, 1, 2]]).unwrap(),
                Permutation::from_cycles(4, vec![vec![1, 2, 3]]).unwrap(),
            ],
        )
        .unwrap(),
    );
    let dihedral = deterministic(
        &PermutationGroup::new(
            4,
            vec![
                Permutation::from_cycles(4, vec![vec![0, 1, 2, 3]]).unwrap(),
                Permutation::from_cycles(4, vec![vec![0, 2]]).unwrap(),
            ],
        )
        .unwrap(),
    );

    let meet = intersection(&alternating, &dihedral, &mut rng).unwrap();
    assert_eq!(meet.order(), U512::from(4_u64));
    assert!(meet.is_member(
        &Permutation::from_cycles(4, vec![vec![0, 1], vec![2, 3]]).unwrap()
    ));

    // C4 ∩ ⟨(0 1), (2 3)⟩ is trivial
    let cyclic = cyclic_chain(4, 4);
    let klein = deterministic(
        &PermutationGroup::new(
            4,
            vec![
                Permutation::from_cycles(4, vec![vec![0, 1]]).unwrap(),
                Permutation::from_cycles(4, vec![vec![2, 3]]).unwrap(),
            ],
        )
        .unwrap(),
    );

    let trivial = intersection(&cyclic, &klein, &mut rng).unwrap();
    assert_eq!(trivial.order(), U512::ONE);
}

#[test_log::test]
fn vector_stabilizer_preserves_level_sets() {
    let chain = symmetric_chain(5);
    let vector = [0, 1, 0, 1, 2];

    let stabilizer = vector_stabilizer(&chain, &vector).unwrap();

    // swaps within {0, 2} and within {1, 3}
    assert_eq!(stabilizer.order(), U512::from(4_u64));

    let mut rng = fastrand::Rng::with_seed(41);
    for _ in 0..10 {
        let element = stabilizer.random_element(&mut rng);
        for point in 0..5 {
            assert_eq!(vector[element.image(point)], vector[point]);
        }
    }

    assert_eq!(
        vector_stabilizer(&chain, &[0, 1]).unwrap_err(),
        SearchError::VectorLength {
            expected: 5,
            found: 2
        }
    );
}

#[test_log::test]
fn lex_smallest_image_minimizes_over_the_orbit() {
    let chain = symmetric_chain(6);
    let set = PointSet::new(vec![2, 5]);

    let (best, witness) = lex_smallest_image(&chain, &set).unwrap();
    assert_eq!(best, PointSet::new(vec![0, 1]));
    assert_eq!(set.image(&witness), best);

    // in a 5-cycle the images of {2, 4} are the five rotations; {0, 2} wins
    let cyclic = cyclic_chain(5, 5);
    let (best, witness) = lex_smallest_image(&cyclic, &PointSet::new(vec![2, 4])).unwrap();
    assert_eq!(best, PointSet::new(vec![0, 2]));
    assert_eq!(PointSet::new(vec![2, 4]).image(&witness), best);

    // an already-minimal set keeps the identity witness
    let (best, witness) = lex_smallest_image(&chain, &PointSet::new(vec![0, 1])).unwrap();
    assert_eq!(best, PointSet::new(vec![0, 1]));
    assert!(witness.is_identity());
}

#[test_log::test]
fn unverified_chains_are_refused() {
    let group = PermutationGroup::new(
        6,
        vec![
            Permutation::from_cycles(6, vec![(0..6).collect()]).unwrap(),
            Permutation::from_cycles(6, vec![vec![0, 1]]).unwrap(),
        ],
    )
    .unwrap();

    let mut rng = fastrand::Rng::with_seed(53);
    let unverified = randomized(&group, &mut rng, &RandomizedOptions::default());

    assert_eq!(
        set_stabilizer(&unverified, &PointSet::new(vec![0, 1])).unwrap_err(),
        SearchError::Chain(ChainError::Unverified)
    );
}

#[test_log::test]
fn cancellation_abandons_the_search() {
    let chain = symmetric_chain(8);
    let set = PointSet::new(vec![0, 3]);

    let search = BacktrackSearch::new(&chain, Predicate::from(SetImage::stabilizing(set)))
        .unwrap()
        .with_cancellation(|| true);

    assert_eq!(search.find_one(), None);
}

#[test_log::test]
fn dcm_pruning_does_not_change_the_answer() {
    let chain = symmetric_chain(6);
    let set = PointSet::new(vec![1, 4]);

    let pruned = BacktrackSearch::new(
        &chain,
        Predicate::from(SetImage::stabilizing(set.clone())),
    )
    .unwrap()
    .find_subgroup();

    let unpruned = BacktrackSearch::new(&chain, Predicate::from(SetImage::stabilizing(set)))
        .unwrap()
        .with_dcm(false)
        .find_subgroup();

    let order_of = |generators: Vec<Permutation>| {
        deterministic(&PermutationGroup::new(6, generators).unwrap()).order()
    };

    let order = order_of(pruned);
    assert_eq!(order, order_of(unpruned));
    assert_eq!(order, factorial(2) * factorial(4));
}
