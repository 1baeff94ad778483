//! Partition refinements.
//!
//! A refinement narrows a partition consistently with a target invariant. The
//! search side applies [`Refine::apply`]; the image side, which tracks what a
//! candidate moves the target to, applies [`Refine::apply_image`]. Both
//! report how many real splits they performed, which the caller feeds back
//! into [`OrderedPartition::undo_to`] on backtrack.

use cayley_core::{Permutation, PointSet};
use enum_dispatch::enum_dispatch;
use itertools::Itertools;

use crate::partition::OrderedPartition;

#[enum_dispatch]
pub trait Refine {
    /// Whether this refinement can distinguish anything against the initial
    /// partition; refinements that cannot are dropped up front.
    fn init(&mut self, partition: &OrderedPartition) -> bool;

    /// Left action on the partition being explored. Returns the split count.
    fn apply(&mut self, partition: &mut OrderedPartition) -> usize;

    /// Right action on the image partition. Returns the split count.
    fn apply_image(&mut self, partition: &mut OrderedPartition, candidate: &Permutation) -> usize;
}

#[enum_dispatch(Refine)]
#[derive(Debug, Clone)]
pub enum Refinement {
    FixPoints(FixPoints),
    FixVector(FixVector),
    FixFingerprint(FixFingerprint),
}

/// Split every cell against each of the sets in order.
fn refine_by_sets(partition: &mut OrderedPartition, sets: &[PointSet]) -> usize {
    let mut splits = 0;

    for set in sets {
        // cells appended while splitting against this set are already pure
        let cell_count = partition.cell_count();

        for cell in 0..cell_count {
            if partition.intersect(set, cell) {
                splits += 1;
            }
        }
    }

    splits
}

/// Distinguish a fixed point set. For a set stabilizer both sides use the
/// same set; for a set image the image side uses the target set.
#[derive(Debug, Clone)]
pub struct FixPoints {
    points: PointSet,
    image_points: PointSet,
}

impl FixPoints {
    #[must_use]
    pub fn stabilizing(points: PointSet) -> FixPoints {
        FixPoints {
            image_points: points.clone(),
            points,
        }
    }

    #[must_use]
    pub fn mapping(points: PointSet, image_points: PointSet) -> FixPoints {
        FixPoints {
            points,
            image_points,
        }
    }
}

impl Refine for FixPoints {
    fn init(&mut self, partition: &OrderedPartition) -> bool {
        !self.points.is_empty() && self.points.len() < partition.point_count()
    }

    fn apply(&mut self, partition: &mut OrderedPartition) -> usize {
        refine_by_sets(partition, std::slice::from_ref(&self.points))
    }

    fn apply_image(&mut self, partition: &mut OrderedPartition, _candidate: &Permutation) -> usize {
        refine_by_sets(partition, std::slice::from_ref(&self.image_points))
    }
}

/// Distinguish the level sets of an integer vector, for vector stabilizers.
#[derive(Debug, Clone)]
pub struct FixVector {
    classes: Vec<PointSet>,
}

impl FixVector {
    #[must_use]
    pub fn new(vector: &[i64]) -> FixVector {
        let classes = vector
            .iter()
            .copied()
            .sorted_unstable()
            .dedup()
            .map(|value| {
                vector
                    .iter()
                    .enumerate()
                    .filter(|&(_, &entry)| entry == value)
                    .map(|(point, _)| point)
                    .collect()
            })
            .collect();

        FixVector { classes }
    }
}

impl Refine for FixVector {
    fn init(&mut self, _partition: &OrderedPartition) -> bool {
        self.classes.len() > 1
    }

    fn apply(&mut self, partition: &mut OrderedPartition) -> usize {
        refine_by_sets(partition, &self.classes)
    }

    fn apply_image(&mut self, partition: &mut OrderedPartition, _candidate: &Permutation) -> usize {
        // a vector stabilizer preserves each level set, so the image side
        // distinguishes the same classes
        refine_by_sets(partition, &self.classes)
    }
}

/// Distinguish rows of a symmetric relation by their diagonal entry and row
/// fingerprint, for matrix-automorphism style searches.
#[derive(Debug, Clone)]
pub struct FixFingerprint {
    classes: Vec<PointSet>,
}

impl FixFingerprint {
    /// # Panics
    ///
    /// Panics if the matrix is not square and symmetric.
    #[must_use]
    pub fn new(matrix: &[Vec<u32>]) -> FixFingerprint {
        let size = matrix.len();

        for (row_at, row) in matrix.iter().enumerate() {
            assert_eq!(row.len(), size, "the relation must be square");

            for (column_at, &entry) in row.iter().enumerate() {
                assert_eq!(
                    entry, matrix[column_at][row_at],
                    "the relation must be symmetric"
                );
            }
        }

        let fingerprint = |point: usize| {
            let mut row = matrix[point].clone();
            row.sort_unstable();
            (matrix[point][point], row)
        };

        let mut keys: Vec<_> = (0..size).map(fingerprint).collect();
        keys.sort();
        keys.dedup();

        let classes = keys
            .iter()
            .map(|key| (0..size).filter(|&point| fingerprint(point) == *key).collect())
            .collect();

        FixFingerprint { classes }
    }
}

impl Refine for FixFingerprint {
    fn init(&mut self, _partition: &OrderedPartition) -> bool {
        self.classes.len() > 1
    }

    fn apply(&mut self, partition: &mut OrderedPartition) -> usize {
        refine_by_sets(partition, &self.classes)
    }

    fn apply_image(&mut self, partition: &mut OrderedPartition, _candidate: &Permutation) -> usize {
        // an automorphism of the relation preserves each fingerprint class
        refine_by_sets(partition, &self.classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_set_refinement_splits_once() {
        let mut partition = OrderedPartition::unit(6);
        let mut refinement = FixPoints::stabilizing(PointSet::new(vec![0, 4]));

        assert!(refinement.init(&partition));
        assert_eq!(refinement.apply(&mut partition), 1);
        assert_eq!(partition.cell(0), &[0, 4]);
        assert_eq!(partition.cell(1), &[1, 2, 3, 5]);

        // already refined: applying again does nothing
        assert_eq!(refinement.apply(&mut partition), 0);
    }

    #[test]
    fn degenerate_point_sets_do_not_apply() {
        let partition = OrderedPartition::unit(4);

        assert!(!FixPoints::stabilizing(PointSet::new(vec![])).init(&partition));
        assert!(!FixPoints::stabilizing(PointSet::new(vec![0, 1, 2, 3])).init(&partition));
    }

    #[test]
    fn vector_refinement_builds_level_sets() {
        let mut partition = OrderedPartition::unit(5);
        let mut refinement = FixVector::new(&[3, 1, 3, 1, 2]);

        assert!(refinement.init(&partition));
        refinement.apply(&mut partition);

        let mut cells: Vec<Vec<usize>> = (0..partition.cell_count())
            .map(|cell| partition.cell(cell).to_vec())
            .collect();
        cells.sort();

        assert_eq!(cells, vec![vec![0, 2], vec![1, 3], vec![4]]);
    }

    #[test]
    fn fingerprint_refinement_separates_matrix_rows() {
        // a path relation 0 - 1 - 2: the endpoints look alike, the middle
        // differs
        let matrix = vec![vec![0, 1, 0], vec![1, 0, 1], vec![0, 1, 0]];

        let mut partition = OrderedPartition::unit(3);
        let mut refinement = FixFingerprint::new(&matrix);

        assert!(refinement.init(&partition));
        refinement.apply(&mut partition);

        assert_eq!(partition.cell_of(0), partition.cell_of(2));
        assert_ne!(partition.cell_of(0), partition.cell_of(1));
    }

    #[test]
    #[should_panic(expected = "symmetric")]
    fn asymmetric_relations_are_rejected() {
        FixFingerprint::new(&[vec![0, 1], vec![0, 0]]);
    }

    #[test]
    fn refinement_splits_are_undoable() {
        let mut partition = OrderedPartition::unit(6);
        let mark = partition.split_count();

        let mut refinement = Refinement::from(FixVector::new(&[0, 0, 1, 1, 2, 2]));
        let splits = refinement.apply(&mut partition);
        assert!(splits > 0);

        partition.undo_to(mark);
        assert_eq!(partition.cell_count(), 1);
    }
}
