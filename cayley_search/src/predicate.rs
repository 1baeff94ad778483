//! Search predicates: the accept/reject logic of a concrete search problem.
//!
//! A predicate supplies the full test on a complete candidate, a cheap
//! per-level restriction consulted as the search fixes one more base-point
//! image, and the depth at which the test becomes conclusive for a whole
//! subtree. Stateful predicates push per-level state from an accepted
//! `child_restriction` and unwind it in `retract`; the engine pairs the two
//! calls exactly.

use cayley_core::{Permutation, PointSet, StabilizerChain};
use enum_dispatch::enum_dispatch;

#[enum_dispatch]
pub trait SearchPredicate {
    /// Bind to the chain the search will run over; called once before the
    /// tree walk starts.
    fn bind(&mut self, chain: &StabilizerChain);

    /// The depth at which `test` decides a whole subtree, or `None` for the
    /// full chain depth.
    fn limit(&self) -> Option<usize>;

    /// Whether a partial candidate that additionally maps `base_point` to
    /// `image` at `level` can still extend to a solution.
    fn child_restriction(&mut self, level: usize, base_point: usize, image: usize) -> bool;

    /// Unwind the per-level state pushed by an accepted `child_restriction`.
    fn retract(&mut self, level: usize);

    /// The full test on a complete candidate.
    fn test(&self, candidate: &Permutation) -> bool;
}

#[enum_dispatch(SearchPredicate)]
#[derive(Debug, Clone)]
pub enum Predicate {
    SetImage(SetImage),
    VectorStabilizer(VectorStabilizer),
    GroupIntersection(GroupIntersection),
    SmallerImage(SmallerImage),
}

/// Accepts elements mapping `from` onto `to`; with `from == to` this is the
/// set stabilizer.
#[derive(Debug, Clone)]
pub struct SetImage {
    from: PointSet,
    to: PointSet,
    limit: Option<usize>,
}

impl SetImage {
    #[must_use]
    pub fn stabilizing(set: PointSet) -> SetImage {
        SetImage {
            from: set.clone(),
            to: set,
            limit: None,
        }
    }

    #[must_use]
    pub fn mapping(from: PointSet, to: PointSet) -> SetImage {
        SetImage {
            from,
            to,
            limit: None,
        }
    }
}

impl SearchPredicate for SetImage {
    fn bind(&mut self, chain: &StabilizerChain) {
        // Once the whole subgroup at some level fixes every `from` point,
        // deeper choices cannot change the image of `from` any more.
        for level in 0..=chain.depth() {
            let fixed = chain.fixed_points_of_level(level);

            if self.from.iter().all(|point| fixed.contains(point)) {
                self.limit = Some(level);
                return;
            }
        }
    }

    fn limit(&self) -> Option<usize> {
        self.limit
    }

    fn child_restriction(&mut self, _level: usize, base_point: usize, image: usize) -> bool {
        // points of `from` must land in `to`, points outside must stay
        // outside
        self.from.contains(base_point) == self.to.contains(image)
    }

    fn retract(&mut self, _level: usize) {}

    fn test(&self, candidate: &Permutation) -> bool {
        self.from.image(candidate) == self.to
    }
}

/// Accepts elements preserving every entry of an integer vector under the
/// position action.
#[derive(Debug, Clone)]
pub struct VectorStabilizer {
    vector: Vec<i64>,
    limit: Option<usize>,
}

impl VectorStabilizer {
    #[must_use]
    pub fn new(vector: Vec<i64>) -> VectorStabilizer {
        VectorStabilizer {
            vector,
            limit: None,
        }
    }

    fn stabilizes(&self, candidate: &Permutation) -> bool {
        (0..self.vector.len()).all(|point| self.vector[candidate.image(point)] == self.vector[point])
    }
}

impl SearchPredicate for VectorStabilizer {
    fn bind(&mut self, chain: &StabilizerChain) {
        for level in 0..chain.depth() {
            if chain
                .subgroup_generators(level)
                .iter()
                .all(|generator| self.stabilizes(generator))
            {
                self.limit = Some(level);
                return;
            }
        }

        self.limit = Some(chain.depth());
    }

    fn limit(&self) -> Option<usize> {
        self.limit
    }

    fn child_restriction(&mut self, _level: usize, base_point: usize, image: usize) -> bool {
        self.vector[image] == self.vector[base_point]
    }

    fn retract(&mut self, _level: usize) {}

    fn test(&self, candidate: &Permutation) -> bool {
        self.stabilizes(candidate)
    }
}

/// Accepts elements that also belong to a second group, given by a chain
/// whose base starts with the searched chain's base.
///
/// The per-level restriction threads a parallel partial product through the
/// second chain: an image survives only if some element of the other group
/// agrees with every base image chosen so far.
#[derive(Debug, Clone)]
pub struct GroupIntersection {
    other: StabilizerChain,
    partial: Vec<Permutation>,
}

impl GroupIntersection {
    /// `other` must already be base-aligned; `searches::intersection`
    /// arranges that with a base change.
    #[must_use]
    pub fn new(other: StabilizerChain) -> GroupIntersection {
        GroupIntersection {
            other,
            partial: vec![],
        }
    }
}

impl SearchPredicate for GroupIntersection {
    fn bind(&mut self, chain: &StabilizerChain) {
        for level in 0..chain.depth().min(self.other.depth()) {
            assert_eq!(
                chain.base_point(level),
                self.other.base_point(level),
                "the intersection chain must be base-aligned before searching"
            );
        }

        self.partial = vec![Permutation::identity(self.other.point_count())];
    }

    fn limit(&self) -> Option<usize> {
        None
    }

    fn child_restriction(&mut self, level: usize, base_point: usize, image: usize) -> bool {
        let current = self.partial.last().unwrap();

        if level >= self.other.depth() {
            // beyond the other chain's base only one extension exists
            if current.image(base_point) != image {
                return false;
            }

            let unchanged = current.clone();
            self.partial.push(unchanged);
            return true;
        }

        let needed = current.preimage(image);
        let Some(representative) = self.other.level_representative(level, needed) else {
            return false;
        };

        let mut next = representative;
        next.compose_into(current);
        self.partial.push(next);

        true
    }

    fn retract(&mut self, _level: usize) {
        self.partial.pop();
    }

    fn test(&self, candidate: &Permutation) -> bool {
        self.other.is_member(candidate)
    }
}

/// Accepts elements whose image of `set` is lexicographically smaller than
/// `bound`. Iterating this predicate to exhaustion finds the minimal set in
/// the orbit.
#[derive(Debug, Clone)]
pub struct SmallerImage {
    set: PointSet,
    bound: PointSet,
}

impl SmallerImage {
    #[must_use]
    pub fn new(set: PointSet, bound: PointSet) -> SmallerImage {
        SmallerImage { set, bound }
    }
}

impl SearchPredicate for SmallerImage {
    fn bind(&mut self, _chain: &StabilizerChain) {}

    fn limit(&self) -> Option<usize> {
        None
    }

    fn child_restriction(&mut self, _level: usize, _base_point: usize, _image: usize) -> bool {
        true
    }

    fn retract(&mut self, _level: usize) {}

    fn test(&self, candidate: &Permutation) -> bool {
        self.set.image(candidate) < self.bound
    }
}
