//! Ordered partitions with explicit, LIFO undo.
//!
//! The search refines a partition as it descends and backtracks by undoing
//! splits, never by copying the whole structure. Every split pushes an undo
//! record; [`OrderedPartition::split_count`] before a group of splits is the
//! opaque token that [`OrderedPartition::undo_to`] rewinds to.

use cayley_core::PointSet;
use log::trace;

#[derive(Debug, Clone)]
struct SplitRecord {
    cell: usize,
    original: Vec<usize>,
}

/// An ordered sequence of disjoint, non-empty cells covering `0..point_count`.
#[derive(Debug, Clone)]
pub struct OrderedPartition {
    cells: Vec<Vec<usize>>,
    cell_of: Vec<usize>,
    history: Vec<SplitRecord>,
}

impl OrderedPartition {
    /// The one-cell partition of the whole domain.
    #[must_use]
    pub fn unit(point_count: usize) -> OrderedPartition {
        assert!(point_count > 0);

        OrderedPartition {
            cells: vec![(0..point_count).collect()],
            cell_of: vec![0; point_count],
            history: vec![],
        }
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.cell_of.len()
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn cell(&self, at: usize) -> &[usize] {
        &self.cells[at]
    }

    /// The index of the cell currently containing `point`.
    #[must_use]
    pub fn cell_of(&self, point: usize) -> usize {
        self.cell_of[point]
    }

    /// Split the named cell against `target`, keeping the intersection in
    /// place and appending the remainder as a new cell. Returns whether a
    /// real split occurred; only real splits push an undo record.
    pub fn intersect(&mut self, target: &PointSet, cell: usize) -> bool {
        let inside: Vec<usize> = self.cells[cell]
            .iter()
            .copied()
            .filter(|&point| target.contains(point))
            .collect();

        if inside.is_empty() || inside.len() == self.cells[cell].len() {
            return false;
        }

        let original = std::mem::replace(&mut self.cells[cell], inside);
        let outside: Vec<usize> = original
            .iter()
            .copied()
            .filter(|&point| !target.contains(point))
            .collect();

        let appended = self.cells.len();
        for &point in &outside {
            self.cell_of[point] = appended;
        }

        trace!(
            "split cell {cell} into {} | {}",
            self.cells[cell].len(),
            outside.len()
        );

        self.cells.push(outside);
        self.history.push(SplitRecord { cell, original });

        true
    }

    /// Shrink `point`'s cell to the singleton `{point}`.
    pub fn fix_point(&mut self, point: usize) -> bool {
        self.intersect(&PointSet::new(vec![point]), self.cell_of[point])
    }

    /// Undo the most recent split, merging the two halves back in their
    /// original order. Returns `false` when there is nothing to undo.
    pub fn undo_intersection(&mut self) -> bool {
        let Some(record) = self.history.pop() else {
            return false;
        };

        // The remainder of the most recent split is always the last cell
        let outside = self.cells.pop().unwrap();
        debug_assert!(outside.iter().all(|point| record.original.contains(point)));

        self.cells[record.cell] = record.original;

        for &point in &self.cells[record.cell] {
            self.cell_of[point] = record.cell;
        }

        true
    }

    /// The number of splits performed so far; use with [`Self::undo_to`].
    #[must_use]
    pub fn split_count(&self) -> usize {
        self.history.len()
    }

    /// Rewind to a previous [`Self::split_count`] value.
    pub fn undo_to(&mut self, split_count: usize) {
        while self.history.len() > split_count {
            self.undo_intersection();
        }
    }

    /// Whether every cell is a singleton.
    #[must_use]
    pub fn is_discrete(&self) -> bool {
        self.cells.iter().all(|cell| cell.len() == 1)
    }

    #[must_use]
    pub fn first_nonsingleton(&self) -> Option<usize> {
        self.cells.iter().position(|cell| cell.len() > 1)
    }

    /// The cell sizes in cell order, the fingerprint compared between the
    /// search side and the image side.
    #[must_use]
    pub fn shape(&self) -> Vec<usize> {
        self.cells.iter().map(Vec::len).collect()
    }
}
