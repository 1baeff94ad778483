//! The R-base: a refinement sequence bound to the chain's actual base.
//!
//! Building the R-base replays the refinements once on the search side,
//! fixing each base point in chain order and recording, per level, the cell
//! the base point sat in and the cell-size shape after refinement. During
//! search the image side replays the same sequence against each candidate
//! image; a candidate whose cell or resulting shape disagrees cannot extend
//! to a solution and is pruned. The search tree depth stays bounded by the
//! base length.

use cayley_core::{Permutation, StabilizerChain};
use log::debug;

use crate::{
    partition::OrderedPartition,
    refinement::{Refine, Refinement},
};

#[derive(Debug, Clone)]
struct RBaseLevel {
    cell: usize,
    shape: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct RBase {
    initial: OrderedPartition,
    levels: Vec<RBaseLevel>,
    refinements: Vec<Refinement>,
}

impl RBase {
    #[must_use]
    pub fn build(chain: &StabilizerChain, mut refinements: Vec<Refinement>) -> RBase {
        let mut partition = OrderedPartition::unit(chain.point_count());

        refinements.retain_mut(|refinement| refinement.init(&partition));
        refine_to_fixpoint(&mut refinements, &mut partition);

        let initial = partition.clone();
        let mut levels = vec![];

        for level in 0..chain.depth() {
            let base_point = chain.base_point(level);
            let cell = partition.cell_of(base_point);

            partition.fix_point(base_point);
            refine_to_fixpoint(&mut refinements, &mut partition);

            levels.push(RBaseLevel {
                cell,
                shape: partition.shape(),
            });
        }

        debug!(
            "r-base over {} refinements, {} levels",
            refinements.len(),
            levels.len()
        );

        RBase {
            initial,
            levels,
            refinements,
        }
    }

    /// The refined partition the image side starts from.
    #[must_use]
    pub fn initial_partition(&self) -> OrderedPartition {
        self.initial.clone()
    }

    /// The cell the level's base point occupied before it was fixed; a
    /// candidate image outside the corresponding image cell is pruned.
    #[must_use]
    pub fn level_cell(&self, level: usize) -> usize {
        self.levels[level].cell
    }

    /// Replay the image-side refinement sequence for one accepted candidate
    /// image, then compare against the recorded shape. On mismatch the
    /// splits are already undone and `false` is returned.
    pub fn image_refine(
        &mut self,
        partition: &mut OrderedPartition,
        level: usize,
        image: usize,
        candidate: &Permutation,
    ) -> bool {
        let mark = partition.split_count();

        partition.fix_point(image);

        loop {
            let splits: usize = self
                .refinements
                .iter_mut()
                .map(|refinement| refinement.apply_image(partition, candidate))
                .sum();

            if splits == 0 {
                break;
            }
        }

        if partition.shape() == self.levels[level].shape {
            true
        } else {
            partition.undo_to(mark);
            false
        }
    }
}

fn refine_to_fixpoint(refinements: &mut [Refinement], partition: &mut OrderedPartition) {
    loop {
        let splits: usize = refinements
            .iter_mut()
            .map(|refinement| refinement.apply(partition))
            .sum();

        if splits == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refinement::FixPoints;
    use cayley_core::{Permutation, PermutationGroup, PointSet, schreier_sims::deterministic};

    fn s4_chain() -> StabilizerChain {
        deterministic(
            &PermutationGroup::new(
                4,
                vec![
                    Permutation::from_cycles(4, vec![vec![0, 1, 2, 3]]).unwrap(),
                    Permutation::from_cycles(4, vec![vec![0, 1]]).unwrap(),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn build_records_one_level_per_base_point() {
        let chain = s4_chain();
        let rbase = RBase::build(
            &chain,
            vec![Refinement::from(FixPoints::stabilizing(PointSet::new(
                vec![0, 1],
            )))],
        );

        assert_eq!(rbase.levels.len(), chain.depth());

        // the initial partition already separates the target set
        let initial = rbase.initial_partition();
        assert_eq!(initial.cell_of(0), initial.cell_of(1));
        assert_ne!(initial.cell_of(0), initial.cell_of(2));
    }

    #[test]
    fn image_refine_accepts_solutions_and_rejects_mismatches() {
        let chain = s4_chain();
        let set = PointSet::new(vec![0, 1]);
        let mut rbase = RBase::build(
            &chain,
            vec![Refinement::from(FixPoints::stabilizing(set.clone()))],
        );

        let base_point = chain.base_point(0);
        let mut partition = rbase.initial_partition();

        // a set-stabilizing candidate image stays inside the base point's
        // cell and reproduces the recorded shape
        let good_image = if set.contains(base_point) { 1 } else { 3 };
        assert_eq!(partition.cell_of(good_image), rbase.level_cell(0));
        assert!(rbase.image_refine(
            &mut partition,
            0,
            good_image,
            &Permutation::identity(4)
        ));

        // an image from the wrong cell is pruned before refinement
        let bad_image = if set.contains(base_point) { 2 } else { 0 };
        assert_ne!(partition.cell_of(bad_image), rbase.level_cell(0));
    }
}
