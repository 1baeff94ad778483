//! The backtracking search engine over a stabilizer chain.
//!
//! The engine walks partial base images: at `level` the candidate images of
//! the base point are the partial product's images of the level's transversal
//! orbit. Candidates survive the predicate's `child_restriction`, the
//! optional R-base cell and shape tests, and — in subgroup mode —
//! double-coset-minimality against the subgroup found so far. Reaching the
//! predicate's conclusive depth applies the full test. Exhausting level 0 is
//! the explicit "no representative exists" outcome.

use cayley_core::{
    ChainError, Orbit, OrbitLookup, Permutation, PermutationGroup, PointAction, StabilizerChain,
    schreier_sims,
};
use log::{Level, debug, log_enabled, trace};

use crate::{
    partition::OrderedPartition,
    predicate::{Predicate, SearchPredicate},
    rbase::RBase,
};

pub struct BacktrackSearch<'a> {
    chain: &'a StabilizerChain,
    predicate: Predicate,
    rbase: Option<RBase>,
    use_dcm: bool,
    cancel: Option<Box<dyn Fn() -> bool + 'a>>,
}

struct SearchState {
    partition: Option<OrderedPartition>,
    found: Vec<Permutation>,
    found_chain: StabilizerChain,
    solution: Option<Permutation>,
    collect: bool,
    limit: usize,
    nodes_visited: u64,
    cancelled: bool,
}

impl<'a> BacktrackSearch<'a> {
    /// A search over a read-only chain. Unverified chains are refused: a
    /// randomized chain that missed part of the group would silently turn
    /// "no representative" answers into lies.
    pub fn new(chain: &'a StabilizerChain, predicate: Predicate) -> Result<Self, ChainError> {
        chain.require_verified()?;

        Ok(BacktrackSearch {
            chain,
            predicate,
            rbase: None,
            use_dcm: true,
            cancel: None,
        })
    }

    /// Guide the search with a partition R-base.
    #[must_use]
    pub fn with_rbase(mut self, rbase: RBase) -> Self {
        self.rbase = Some(rbase);
        self
    }

    /// Toggle double-coset-minimality pruning in subgroup searches.
    #[must_use]
    pub fn with_dcm(mut self, use_dcm: bool) -> Self {
        self.use_dcm = use_dcm;
        self
    }

    /// A cancellation check evaluated once per recursion level; returning
    /// `true` abandons the search, which then reports no result.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: impl Fn() -> bool + 'a) -> Self {
        self.cancel = Some(Box::new(cancel));
        self
    }

    /// The first element satisfying the predicate, or `None`.
    pub fn find_one(mut self) -> Option<Permutation> {
        self.run(false).solution
    }

    /// Generators of the full subgroup of elements satisfying the predicate.
    /// The predicate's solution set must actually be a subgroup.
    pub fn find_subgroup(mut self) -> Vec<Permutation> {
        self.run(true).found
    }

    fn run(&mut self, collect: bool) -> SearchState {
        self.predicate.bind(self.chain);

        let depth = self.chain.depth();
        let limit = self.predicate.limit().unwrap_or(depth).min(depth);

        let mut state = SearchState {
            partition: self.rbase.as_ref().map(RBase::initial_partition),
            found: vec![],
            found_chain: StabilizerChain::trivial(self.chain.point_count()),
            solution: None,
            collect,
            limit,
            nodes_visited: 0,
            cancelled: false,
        };

        let identity = Permutation::identity(self.chain.point_count());

        // A conclusive depth above the leaves means the whole subgroup there
        // is inside the solution set; its generators seed the found set.
        if collect && limit < depth && self.predicate.test(&identity) {
            let seeds: Vec<Permutation> = self
                .chain
                .subgroup_generators(limit)
                .iter()
                .map(|generator| (**generator).clone())
                .collect();

            for seed in seeds {
                if !state.found_chain.is_member(&seed) {
                    self.register_found(&mut state, seed);
                }
            }
        }

        self.dfs(&mut state, 0, identity);

        debug!(
            "search visited {} nodes, cancelled: {}",
            state.nodes_visited, state.cancelled
        );

        state
    }

    /// Returns `true` to stop the whole search.
    fn dfs(&mut self, state: &mut SearchState, level: usize, partial: Permutation) -> bool {
        if let Some(cancel) = &self.cancel {
            if cancel() {
                state.cancelled = true;
                return true;
            }
        }

        if log_enabled!(Level::Debug) {
            state.nodes_visited += 1;
        }

        if level == state.limit {
            if self.predicate.test(&partial) {
                if state.collect {
                    if !partial.is_identity() && !state.found_chain.is_member(&partial) {
                        trace!("new subgroup generator {partial}");
                        self.register_found(state, partial);
                    }

                    return false;
                }

                state.solution = Some(partial);
                return true;
            }

            return false;
        }

        let base_point = self.chain.base_point(level);

        // candidate images of the base point, ascending
        let mut candidates: Vec<(usize, usize)> = self
            .chain
            .level_orbit(level)
            .iter()
            .map(|&orbit_point| (partial.image(orbit_point), orbit_point))
            .collect();
        candidates.sort_unstable();

        for (image, orbit_point) in candidates {
            if state.collect && self.use_dcm && !self.dcm_minimal(state, level, image, &partial) {
                continue;
            }

            if !self.predicate.child_restriction(level, base_point, image) {
                continue;
            }

            let mut partition_mark = None;

            if let (Some(rbase), Some(partition)) = (&mut self.rbase, &mut state.partition) {
                if partition.cell_of(image) != rbase.level_cell(level) {
                    self.predicate.retract(level);
                    continue;
                }

                let mark = partition.split_count();

                if !rbase.image_refine(partition, level, image, &partial) {
                    self.predicate.retract(level);
                    continue;
                }

                partition_mark = Some(mark);
            }

            let representative = self
                .chain
                .level_representative(level, orbit_point)
                .expect("orbit points come from the transversal");
            let next = representative.compose(&partial);

            let stop = self.dfs(state, level + 1, next);

            self.predicate.retract(level);

            if let Some(mark) = partition_mark {
                state.partition.as_mut().unwrap().undo_to(mark);
            }

            if stop {
                return true;
            }
        }

        false
    }

    /// Double-coset-minimality: in a subgroup search, a candidate image that
    /// is not minimal in its orbit under the already-found subgroup elements
    /// fixing the earlier images leads to a branch equivalent to one already
    /// explored.
    fn dcm_minimal(
        &self,
        state: &SearchState,
        level: usize,
        image: usize,
        partial: &Permutation,
    ) -> bool {
        if state.found.is_empty() {
            return true;
        }

        let earlier: Vec<usize> = (0..level)
            .map(|at| partial.image(self.chain.base_point(at)))
            .collect();

        let usable: Vec<&Permutation> = state
            .found
            .iter()
            .filter(|found| earlier.iter().all(|&point| found.image(point) == point))
            .collect();

        if usable.is_empty() {
            return true;
        }

        let orbit = Orbit::compute(image, &usable, &PointAction, OrbitLookup::Sorted);
        orbit.iter().min() == Some(&image)
    }

    fn register_found(&self, state: &mut SearchState, element: Permutation) {
        state.found.push(element);

        let group = PermutationGroup::new(self.chain.point_count(), state.found.clone())
            .expect("found elements act on the chain's domain");
        state.found_chain = schreier_sims::deterministic(&group);
    }
}
