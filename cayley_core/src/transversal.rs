//! Coset representatives for one stabilizer-chain level.
//!
//! For a base point `β`, a transversal stores, for every point `v` in the
//! orbit of `β`, some group element mapping `β` to `v`. The representative of
//! `β` itself is always the identity, and a point outside the orbit is an
//! explicit `None`, never a sentinel.

use std::{collections::VecDeque, sync::Arc};

use crate::permutation::Permutation;

/// A strong generator paired with its inverse, shared across the chain level
/// and its transversal.
pub type GenPair = (Arc<Permutation>, Arc<Permutation>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransversalKind {
    /// Store a full representative per orbit point: O(1) lookup, one stored
    /// permutation per point.
    Explicit,
    /// Store only the generator edge used to reach each orbit point and walk
    /// back to the base point on lookup: O(depth) lookup, one shared edge per
    /// point.
    Tree,
}

#[derive(Debug, Clone)]
pub enum Transversal {
    Explicit(ExplicitTransversal),
    Tree(TreeTransversal),
}

impl Transversal {
    #[must_use]
    pub fn new(kind: TransversalKind, base_point: usize, point_count: usize) -> Transversal {
        assert!(base_point < point_count);

        match kind {
            TransversalKind::Explicit => {
                let mut reps = vec![None; point_count];
                reps[base_point] = Some(Permutation::identity(point_count));

                Transversal::Explicit(ExplicitTransversal { base_point, reps })
            }
            TransversalKind::Tree => Transversal::Tree(TreeTransversal {
                base_point,
                edges: vec![None; point_count],
            }),
        }
    }

    #[must_use]
    pub fn kind(&self) -> TransversalKind {
        match self {
            Transversal::Explicit(_) => TransversalKind::Explicit,
            Transversal::Tree(_) => TransversalKind::Tree,
        }
    }

    #[must_use]
    pub fn base_point(&self) -> usize {
        match self {
            Transversal::Explicit(explicit) => explicit.base_point,
            Transversal::Tree(tree) => tree.base_point,
        }
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        match self {
            Transversal::Explicit(explicit) => explicit.reps.len(),
            Transversal::Tree(tree) => tree.edges.len(),
        }
    }

    #[must_use]
    pub fn contains(&self, point: usize) -> bool {
        if point >= self.point_count() {
            return false;
        }

        match self {
            Transversal::Explicit(explicit) => explicit.reps[point].is_some(),
            Transversal::Tree(tree) => point == tree.base_point || tree.edges[point].is_some(),
        }
    }

    /// The orbit size.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Transversal::Explicit(explicit) => {
                explicit.reps.iter().filter(|rep| rep.is_some()).count()
            }
            Transversal::Tree(tree) => {
                1 + tree.edges.iter().filter(|edge| edge.is_some()).count()
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The orbit of the base point, ascending.
    #[must_use]
    pub fn orbit_points(&self) -> Vec<usize> {
        (0..self.point_count())
            .filter(|&point| self.contains(point))
            .collect()
    }

    /// A representative mapping the base point to `point`, or `None` if the
    /// point is outside the orbit.
    #[must_use]
    pub fn representative(&self, point: usize) -> Option<Permutation> {
        match self {
            Transversal::Explicit(explicit) => explicit.reps.get(point)?.clone(),
            Transversal::Tree(tree) => tree.representative(point),
        }
    }

    /// A representative mapping `point` back to the base point.
    #[must_use]
    pub fn inverse_representative(&self, point: usize) -> Option<Permutation> {
        match self {
            Transversal::Explicit(explicit) => {
                explicit.reps.get(point)?.as_ref().map(Permutation::inverse)
            }
            Transversal::Tree(tree) => tree.inverse_representative(point),
        }
    }

    /// Recompute the whole orbit closure from scratch.
    pub fn rebuild(&mut self, generators: &[GenPair]) {
        let (kind, base_point, point_count) =
            (self.kind(), self.base_point(), self.point_count());

        *self = Transversal::new(kind, base_point, point_count);

        let mut queue = VecDeque::from([base_point]);

        while let Some(point) = queue.pop_front() {
            for pair in generators {
                if let Some(image) = self.register_move(point, pair) {
                    queue.push_back(image);
                }
            }
        }
    }

    /// Extend the orbit after one new strong generator is learned. The orbit
    /// is first closed under the new generator alone; the general closure is
    /// re-run only if that discovered anything. Returns whether the orbit
    /// grew.
    pub fn extend(&mut self, generators: &[GenPair], new_generator: &GenPair) -> bool {
        let mut added = VecDeque::new();

        for point in self.orbit_points() {
            let mut cursor = point;

            while let Some(image) = self.register_move(cursor, new_generator) {
                added.push_back(image);
                cursor = image;
            }
        }

        if added.is_empty() {
            return false;
        }

        while let Some(point) = added.pop_front() {
            for pair in generators.iter().chain(std::iter::once(new_generator)) {
                if let Some(image) = self.register_move(point, pair) {
                    added.push_back(image);
                }
            }
        }

        true
    }

    /// Record that `pair` maps the in-orbit `point` somewhere. Returns the
    /// image if it was new to the orbit.
    fn register_move(&mut self, point: usize, pair: &GenPair) -> Option<usize> {
        let image = pair.0.image(point);

        if self.contains(image) {
            return None;
        }

        match self {
            Transversal::Explicit(explicit) => {
                let mut rep = explicit.reps[point]
                    .clone()
                    .expect("moves are registered from in-orbit points");
                rep.compose_into(&pair.0);
                explicit.reps[image] = Some(rep);
            }
            Transversal::Tree(tree) => {
                tree.edges[image] = Some(TreeEdge {
                    forward: Arc::clone(&pair.0),
                    inverse: Arc::clone(&pair.1),
                });
            }
        }

        Some(image)
    }

    /// Conjugate every stored representative by `g`, moving the transversal
    /// to the base point `g(β)`. Used when the chain is conjugated during a
    /// base change.
    pub fn conjugate(&mut self, g: &Permutation, g_inverse: &Permutation) {
        let conjugated = |perm: &Permutation| {
            let mut conj = g_inverse.clone();
            conj.compose_into(perm);
            conj.compose_into(g);
            conj
        };

        match self {
            Transversal::Explicit(explicit) => {
                let mut reps = vec![None; explicit.reps.len()];

                for (point, rep) in explicit.reps.iter().enumerate() {
                    if let Some(rep) = rep {
                        reps[g.image(point)] = Some(conjugated(rep));
                    }
                }

                explicit.base_point = g.image(explicit.base_point);
                explicit.reps = reps;
            }
            Transversal::Tree(tree) => {
                let mut edges = vec![None; tree.edges.len()];

                for (point, edge) in tree.edges.iter().enumerate() {
                    if let Some(edge) = edge {
                        edges[g.image(point)] = Some(TreeEdge {
                            forward: Arc::new(conjugated(&edge.forward)),
                            inverse: Arc::new(conjugated(&edge.inverse)),
                        });
                    }
                }

                tree.base_point = g.image(tree.base_point);
                tree.edges = edges;
            }
        }
    }

    /// Convert a tree transversal into an explicit one in place, trading
    /// memory for O(1) representative lookups.
    pub fn materialize(&mut self) {
        let replacement = match self {
            Transversal::Explicit(_) => None,
            Transversal::Tree(tree) => {
                let point_count = tree.edges.len();
                let mut reps = vec![None; point_count];

                for (point, rep) in reps.iter_mut().enumerate() {
                    *rep = tree.representative(point);
                }

                Some(ExplicitTransversal {
                    base_point: tree.base_point,
                    reps,
                })
            }
        };

        if let Some(explicit) = replacement {
            *self = Transversal::Explicit(explicit);
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExplicitTransversal {
    base_point: usize,
    reps: Vec<Option<Permutation>>,
}

#[derive(Debug, Clone)]
struct TreeEdge {
    forward: Arc<Permutation>,
    inverse: Arc<Permutation>,
}

#[derive(Debug, Clone)]
pub struct TreeTransversal {
    base_point: usize,
    edges: Vec<Option<TreeEdge>>,
}

impl TreeTransversal {
    fn representative(&self, point: usize) -> Option<Permutation> {
        if point >= self.edges.len() {
            return None;
        }

        if point == self.base_point {
            return Some(Permutation::identity(self.edges.len()));
        }

        let mut path = vec![];
        let mut cursor = point;

        while cursor != self.base_point {
            let edge = self.edges[cursor].as_ref()?;
            path.push(edge);
            cursor = edge.inverse.image(cursor);
        }

        let mut rep = Permutation::identity(self.edges.len());

        for edge in path.iter().rev() {
            rep.compose_into(&edge.forward);
        }

        Some(rep)
    }

    fn inverse_representative(&self, point: usize) -> Option<Permutation> {
        if point >= self.edges.len() {
            return None;
        }

        let mut inverse = Permutation::identity(self.edges.len());
        let mut cursor = point;

        while cursor != self.base_point {
            let edge = self.edges[cursor].as_ref()?;
            inverse.compose_into(&edge.inverse);
            cursor = edge.inverse.image(cursor);
        }

        Some(inverse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(perm: Permutation) -> GenPair {
        let inverse = Arc::new(perm.inverse());
        (Arc::new(perm), inverse)
    }

    fn check_representatives(transversal: &Transversal) {
        let base = transversal.base_point();

        for point in transversal.orbit_points() {
            let rep = transversal.representative(point).unwrap();
            assert_eq!(rep.image(base), point);

            let inv = transversal.inverse_representative(point).unwrap();
            assert_eq!(inv.image(point), base);
        }

        assert!(
            transversal
                .representative(base)
                .unwrap()
                .is_identity()
        );
    }

    #[test]
    fn builds_the_full_orbit() {
        let generators = vec![
            pair(Permutation::from_cycles(6, vec![vec![0, 1, 2]]).unwrap()),
            pair(Permutation::from_cycles(6, vec![vec![2, 3]]).unwrap()),
        ];

        for kind in [TransversalKind::Explicit, TransversalKind::Tree] {
            let mut transversal = Transversal::new(kind, 0, 6);
            transversal.rebuild(&generators);

            assert_eq!(transversal.orbit_points(), vec![0, 1, 2, 3]);
            assert_eq!(transversal.len(), 4);
            assert!(!transversal.contains(4));
            assert!(transversal.representative(4).is_none());
            check_representatives(&transversal);
        }
    }

    #[test]
    fn incremental_extend_matches_rebuild() {
        let old = vec![pair(Permutation::from_cycles(6, vec![vec![0, 1]]).unwrap())];
        let new_generator = pair(Permutation::from_cycles(6, vec![vec![1, 2, 3]]).unwrap());

        for kind in [TransversalKind::Explicit, TransversalKind::Tree] {
            let mut transversal = Transversal::new(kind, 0, 6);
            transversal.rebuild(&old);
            assert_eq!(transversal.len(), 2);

            assert!(transversal.extend(&old, &new_generator));

            let mut all = old.clone();
            all.push(new_generator.clone());
            let mut fresh = Transversal::new(kind, 0, 6);
            fresh.rebuild(&all);

            assert_eq!(transversal.orbit_points(), fresh.orbit_points());
            check_representatives(&transversal);

            // a second extend with the same generator is a no-op
            assert!(!transversal.extend(&all, &new_generator));
        }
    }

    #[test]
    fn conjugation_moves_the_base_point() {
        let generators = vec![pair(
            Permutation::from_cycles(5, vec![vec![0, 1, 2]]).unwrap(),
        )];
        let g = Permutation::from_cycles(5, vec![vec![0, 3]]).unwrap();
        let g_inverse = g.inverse();

        for kind in [TransversalKind::Explicit, TransversalKind::Tree] {
            let mut transversal = Transversal::new(kind, 0, 5);
            transversal.rebuild(&generators);

            transversal.conjugate(&g, &g_inverse);

            assert_eq!(transversal.base_point(), 3);
            assert_eq!(transversal.orbit_points(), vec![1, 2, 3]);
            check_representatives(&transversal);

            transversal.conjugate(&g_inverse, &g);
            assert_eq!(transversal.base_point(), 0);
            assert_eq!(transversal.orbit_points(), vec![0, 1, 2]);
            check_representatives(&transversal);
        }
    }

    #[test]
    fn materialize_preserves_representatives() {
        let generators = vec![pair(
            Permutation::from_cycles(7, vec![vec![0, 2, 4, 6]]).unwrap(),
        )];

        let mut tree = Transversal::new(TransversalKind::Tree, 0, 7);
        tree.rebuild(&generators);

        let mut explicit = tree.clone();
        explicit.materialize();
        assert_eq!(explicit.kind(), TransversalKind::Explicit);

        for point in tree.orbit_points() {
            assert_eq!(
                tree.representative(point),
                explicit.representative(point)
            );
        }
    }
}
