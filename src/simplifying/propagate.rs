use crate::{
    sets::PositionSet,
    syntax_tree::ltl::{BinaryConnective, Interval, UnaryConnective},
};

/// The positions at which the operand of a unary connective must be
/// simplified so that the connective itself can be simplified over
/// `positions`. Requires a non-empty evaluation set.
pub fn unary(positions: &PositionSet, connective: &UnaryConnective) -> PositionSet {
    match connective {
        UnaryConnective::Negation => positions.clone(),

        UnaryConnective::Always(interval) | UnaryConnective::Eventually(interval) => {
            let Interval { lower: a, upper: b } = *interval;
            match b {
                Some(b) if !positions.is_infinite() => PositionSet::from_interval(
                    positions.min() + a,
                    Some(positions.max().unwrap() + b),
                ),
                _ => PositionSet::new([positions.min() + a], true),
            }
        }

        UnaryConnective::Next(interval) => positions.addition(interval.lower as isize),

        UnaryConnective::Previously(interval) => positions.addition(-(interval.lower as isize)),

        UnaryConnective::Once(interval) => {
            let Interval { lower: a, upper: b } = *interval;
            if positions.is_infinite() {
                match b {
                    None => PositionSet::all(),
                    Some(b) => PositionSet::new([positions.min().saturating_sub(b)], true),
                }
            } else {
                let lower = match b {
                    None => 0,
                    Some(b) => positions.min().saturating_sub(b),
                };
                match positions.max().unwrap().checked_sub(a) {
                    Some(upper) => PositionSet::from_interval(lower, Some(upper)),
                    None => PositionSet::empty(),
                }
            }
        }
    }
}

/// The evaluation sets for both operands of a binary connective. The logical
/// connectives pass `positions` through; Until widens it so that every
/// position the operator semantics can reach is covered.
pub fn binary(
    positions: &PositionSet,
    connective: &BinaryConnective,
) -> (PositionSet, PositionSet) {
    match connective {
        BinaryConnective::Until(interval) => {
            let Interval { lower: a, upper: b } = *interval;
            let left = match b {
                Some(b) if !positions.is_infinite() => PositionSet::from_interval(
                    positions.min(),
                    Some(positions.max().unwrap() + b),
                ),
                _ => PositionSet::new([positions.min()], true),
            };
            let right = match b {
                Some(b) if !positions.is_infinite() => PositionSet::from_interval(
                    positions.min() + a,
                    Some(positions.max().unwrap() + b + 1),
                ),
                _ => PositionSet::new([positions.min() + a], true),
            };
            (left, right)
        }
        _ => (positions.clone(), positions.clone()),
    }
}
