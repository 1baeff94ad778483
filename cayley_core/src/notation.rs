//! Disjoint-cycle notation parsing.
//!
//! Accepts the usual `(0 2 4)(1 3)` style, with points separated by
//! whitespace or commas. Both zero-based and one-based conventions are
//! supported; one-based input is shifted down by one at this boundary so the
//! rest of the crate only ever sees points in `0..point_count`.

use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

use crate::permutation::{Permutation, PermutationError};

#[derive(Parser)]
#[grammar = "cycles.pest"]
struct CycleNotationParser;

/// Which convention the textual input uses for its smallest point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOrigin {
    ZeroBased,
    OneBased,
}

#[derive(Debug, Error)]
pub enum NotationError {
    #[error("malformed cycle notation: {0}")]
    Syntax(Box<pest::error::Error<Rule>>),
    #[error("point `{0}` is too large to represent")]
    Unrepresentable(String),
    #[error("point 0 cannot appear in one-based cycle notation")]
    ZeroPoint,
    #[error(transparent)]
    Permutation(#[from] PermutationError),
}

/// Parse a cycle-notation string into a list of cycles over `0..`.
pub fn parse_cycles(input: &str, origin: IndexOrigin) -> Result<Vec<Vec<usize>>, NotationError> {
    let parsed = CycleNotationParser::parse(Rule::cycles, input)
        .map_err(|e| NotationError::Syntax(Box::new(e)))?
        .next()
        .unwrap();

    let mut cycles = vec![];

    for cycle_pair in parsed.into_inner() {
        if cycle_pair.as_rule() == Rule::EOI {
            continue;
        }

        let mut cycle = vec![];

        for value in cycle_pair.into_inner() {
            let text = value.as_str();
            let point: usize = text
                .parse()
                .map_err(|_| NotationError::Unrepresentable(text.to_owned()))?;

            let point = match origin {
                IndexOrigin::ZeroBased => point,
                IndexOrigin::OneBased => point.checked_sub(1).ok_or(NotationError::ZeroPoint)?,
            };

            cycle.push(point);
        }

        cycles.push(cycle);
    }

    Ok(cycles)
}

/// Parse a cycle-notation string directly into a [`Permutation`].
pub fn parse_permutation(
    point_count: usize,
    input: &str,
    origin: IndexOrigin,
) -> Result<Permutation, NotationError> {
    let cycles = parse_cycles(input, origin)?;

    Ok(Permutation::from_cycles(point_count, cycles)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_one_based_agree() {
        let zero = parse_permutation(6, "(0 2 4)(1 3)", IndexOrigin::ZeroBased).unwrap();
        let one = parse_permutation(6, "(1 3 5)(2 4)", IndexOrigin::OneBased).unwrap();

        assert_eq!(zero, one);
    }

    #[test]
    fn separators_and_identity() {
        let commas = parse_permutation(5, "(0,2,4)", IndexOrigin::ZeroBased).unwrap();
        let spaces = parse_permutation(5, "(0 2 4)", IndexOrigin::ZeroBased).unwrap();
        assert_eq!(commas, spaces);

        assert!(
            parse_permutation(5, "", IndexOrigin::ZeroBased)
                .unwrap()
                .is_identity()
        );
        assert!(
            parse_permutation(5, "()", IndexOrigin::ZeroBased)
                .unwrap()
                .is_identity()
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            parse_cycles("(0 2", IndexOrigin::ZeroBased),
            Err(NotationError::Syntax(_))
        ));

        assert!(matches!(
            parse_cycles("(0 1 2)", IndexOrigin::OneBased),
            Err(NotationError::ZeroPoint)
        ));

        assert!(matches!(
            parse_permutation(3, "(0 7)", IndexOrigin::ZeroBased),
            Err(NotationError::Permutation(
                PermutationError::PointOutOfRange { .. }
            ))
        ));
    }
}
