use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::OnceLock,
};

use bnum::types::U512;
use itertools::Itertools;
use thiserror::Error;

use crate::discrete::lcm_iter;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermutationError {
    #[error("point {point} is out of range for a permutation on {point_count} points")]
    PointOutOfRange { point: usize, point_count: usize },
    #[error("point {point} appears more than once in the cycle list")]
    RepeatedPoint { point: usize },
    #[error("image {image} appears more than once, so the image list is not a bijection")]
    RepeatedImage { image: usize },
}

/// A permutation of the points `0..point_count`.
///
/// One of `mapping` or `cycles` is always defined; the other is materialized
/// lazily on first use. Products are formed with [`Permutation::compose_into`],
/// which applies `self` first and the argument second.
#[derive(Clone)]
pub struct Permutation {
    point_count: usize,
    // One of these two must be defined
    mapping: OnceLock<Vec<usize>>,
    cycles: OnceLock<Vec<Vec<usize>>>,
}

impl Permutation {
    #[must_use]
    pub fn identity(point_count: usize) -> Permutation {
        Permutation {
            point_count,
            // Map every value to itself
            mapping: OnceLock::from((0..point_count).collect::<Vec<_>>()),
            cycles: OnceLock::new(),
        }
    }

    /// Create a permutation from its disjoint cycle decomposition.
    ///
    /// Trivial one-element cycles are allowed and ignored. A point repeated
    /// within or across cycles, or a point outside `0..point_count`, is an
    /// error.
    pub fn from_cycles(
        point_count: usize,
        mut cycles: Vec<Vec<usize>>,
    ) -> Result<Permutation, PermutationError> {
        for &point in cycles.iter().flatten() {
            if point >= point_count {
                return Err(PermutationError::PointOutOfRange { point, point_count });
            }
        }

        cycles.retain(|v| v.len() > 1);

        let mut seen = vec![false; point_count];

        for &point in cycles.iter().flatten() {
            if seen[point] {
                return Err(PermutationError::RepeatedPoint { point });
            }

            seen[point] = true;
        }

        Ok(Permutation {
            point_count,
            mapping: OnceLock::new(),
            cycles: OnceLock::from(cycles),
        })
    }

    /// Create a permutation from the list of images of `0..images.len()`.
    pub fn from_images(images: Vec<usize>) -> Result<Permutation, PermutationError> {
        let point_count = images.len();
        let mut seen = vec![false; point_count];

        for &image in &images {
            if image >= point_count {
                return Err(PermutationError::PointOutOfRange {
                    point: image,
                    point_count,
                });
            }

            if seen[image] {
                return Err(PermutationError::RepeatedImage { image });
            }

            seen[image] = true;
        }

        Ok(Permutation {
            point_count,
            mapping: OnceLock::from(images),
            cycles: OnceLock::new(),
        })
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.point_count
    }

    pub fn mapping(&self) -> &[usize] {
        self.mapping.get_or_init(|| {
            let cycles = self
                .cycles
                .get()
                .expect("either `mapping` or `cycles` to be defined");

            // Start with the identity permutation
            let mut mapping = (0..self.point_count).collect::<Vec<_>>();

            for cycle in cycles {
                for (start, end) in cycle.iter().cycle().tuple_windows().take(cycle.len()) {
                    mapping[*start] = *end;
                }
            }

            mapping
        })
    }

    /// The proper (length at least two) cycles of this permutation.
    pub fn cycles(&self) -> &[Vec<usize>] {
        self.cycles.get_or_init(|| {
            let mapping = self
                .mapping
                .get()
                .expect("either `mapping` or `cycles` to be defined");

            let mut covered = vec![false; self.point_count];
            let mut cycles = vec![];

            for i in 0..self.point_count {
                if covered[i] {
                    continue;
                }

                covered[i] = true;
                let mut cycle = vec![i];

                loop {
                    let next = mapping[*cycle.last().unwrap()];

                    if cycle[0] == next {
                        break;
                    }

                    covered[next] = true;
                    cycle.push(next);
                }

                if cycle.len() > 1 {
                    cycles.push(cycle);
                }
            }

            cycles
        })
    }

    /// Cycle decomposition with fixed points included as one-element cycles.
    #[must_use]
    pub fn cycles_including_trivial(&self) -> Vec<Vec<usize>> {
        let mut covered = vec![false; self.point_count];
        let mut all = vec![];

        for cycle in self.cycles() {
            for &point in cycle {
                covered[point] = true;
            }

            all.push(cycle.clone());
        }

        for point in 0..self.point_count {
            if !covered[point] {
                all.push(vec![point]);
            }
        }

        all.sort_by_key(|cycle| cycle[0]);
        all
    }

    #[must_use]
    pub fn image(&self, point: usize) -> usize {
        self.mapping().get(point).copied().unwrap_or(point)
    }

    #[must_use]
    pub fn preimage(&self, point: usize) -> usize {
        self.mapping()
            .iter()
            .position(|&image| image == point)
            .unwrap_or(point)
    }

    fn mapping_mut(&mut self) -> &mut Vec<usize> {
        self.mapping();

        self.mapping.get_mut().unwrap()
    }

    /// Compose in place: apply `self` first, then `other`.
    pub fn compose_into(&mut self, other: &Permutation) {
        assert_eq!(self.point_count, other.point_count);

        let other_mapping = other.mapping();
        let my_mapping = self.mapping_mut();

        for value in my_mapping.iter_mut() {
            *value = other_mapping[*value];
        }

        // Invalidate `cycles`
        self.cycles = OnceLock::new();
    }

    /// The product that applies `self` first, then `other`.
    #[must_use]
    pub fn compose(&self, other: &Permutation) -> Permutation {
        let mut product = self.clone();
        product.compose_into(other);
        product
    }

    #[must_use]
    pub fn inverse(&self) -> Permutation {
        let mut inverse = vec![0; self.point_count];

        for (point, &image) in self.mapping().iter().enumerate() {
            inverse[image] = point;
        }

        Permutation {
            point_count: self.point_count,
            mapping: OnceLock::from(inverse),
            cycles: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.mapping()
            .iter()
            .enumerate()
            .all(|(point, &image)| point == image)
    }

    /// Some point this permutation moves, or `None` for the identity.
    #[must_use]
    pub fn moved_point(&self) -> Option<usize> {
        self.mapping()
            .iter()
            .enumerate()
            .find(|&(point, &image)| point != image)
            .map(|(point, _)| point)
    }

    /// The order of this permutation, the LCM of its cycle lengths.
    #[must_use]
    pub fn order(&self) -> U512 {
        let cycles = self.cycles();

        if cycles.is_empty() {
            return U512::ONE;
        }

        lcm_iter(cycles.iter().map(|cycle| U512::from(cycle.len() as u64)))
    }

    /// Grow the domain to `point_count`, fixing every new point.
    pub(crate) fn pad_to(&mut self, point_count: usize) {
        if point_count <= self.point_count {
            return;
        }

        if let Some(mapping) = self.mapping.get_mut() {
            mapping.extend(self.point_count..point_count);
        }

        self.point_count = point_count;
    }
}

impl fmt::Display for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cycles = self.cycles();

        if cycles.is_empty() {
            return f.write_str("()");
        }

        for cycle in cycles {
            write!(f, "({})", cycle.iter().join(" "))?;
        }

        Ok(())
    }
}

impl fmt::Debug for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl PartialEq for Permutation {
    fn eq(&self, other: &Permutation) -> bool {
        self.point_count == other.point_count && self.mapping() == other.mapping()
    }
}

impl Eq for Permutation {}

impl Hash for Permutation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mapping().hash(state);
    }
}
