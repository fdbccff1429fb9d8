pub mod map;
pub mod propagate;
pub mod support;

use {
    crate::{
        knowledge::Oracle,
        sets::PositionSet,
        syntax_tree::ltl::{
            Atom, AtomicFormula, BinaryConnective, Constant, Formula, Interval, MultiConnective,
            Term, UnaryConnective,
        },
    },
    map::SimplificationMap,
    support::Support,
};

use std::cmp;

/// Simplifies `formula` at every position in `positions`, using what the
/// oracle knows about predicate instances. The resulting map assigns every
/// position a residual formula; wherever the oracle pins the value down the
/// residual is `#true` or `#false`.
pub fn simplify(
    formula: &Formula,
    positions: &PositionSet,
    oracle: &mut impl Oracle,
) -> SimplificationMap {
    log::trace!("simplifying {formula} over {positions}");

    match formula {
        Formula::AtomicFormula(AtomicFormula::Truth) => {
            let mut map = SimplificationMap::new();
            map.insert_in(Formula::truth(), positions.clone());
            map
        }

        Formula::AtomicFormula(AtomicFormula::Falsity) => {
            let mut map = SimplificationMap::new();
            map.insert_in(Formula::falsity(), positions.clone());
            map
        }

        Formula::AtomicFormula(AtomicFormula::Proposition(_)) => {
            // Propositions carry no oracle-checkable instance.
            let mut map = SimplificationMap::new();
            map.insert_in(formula.clone(), positions.clone());
            map
        }

        Formula::AtomicFormula(AtomicFormula::Atom(atom)) => match ground_terms(atom) {
            Some(constants) => {
                let Support { truth, falsity } = oracle.check(&atom.predicate, &constants);
                let mut map = SimplificationMap::new();
                map.insert_in(Formula::truth(), truth.intersection(positions));
                map.insert_in(Formula::falsity(), falsity.intersection(positions));
                map.insert_in(formula.clone(), positions.without(&truth.union(&falsity)));
                map
            }
            // The oracle answers for constant tuples only; an atom with free
            // variables stays as it is.
            None => {
                let mut map = SimplificationMap::new();
                map.insert_in(formula.clone(), positions.clone());
                map
            }
        },

        Formula::UnaryFormula {
            connective,
            formula: operand,
        } => {
            if let UnaryConnective::Previously(_) | UnaryConnective::Once(_) = connective {
                panic!("no reducer for the past connective `{connective}`");
            }

            let operand_positions = propagate::unary(positions, connective);
            let operand_map = simplify(operand, &operand_positions, oracle);

            match connective {
                UnaryConnective::Negation => simplify_negation(&operand_map),
                UnaryConnective::Always(interval) => {
                    simplify_always(positions, &operand_map, *interval)
                }
                UnaryConnective::Eventually(interval) => {
                    simplify_eventually(positions, &operand_map, *interval)
                }
                UnaryConnective::Next(interval) => {
                    simplify_next(positions, &operand_map, interval.lower)
                }
                UnaryConnective::Previously(_) | UnaryConnective::Once(_) => unreachable!(),
            }
        }

        Formula::BinaryFormula {
            connective,
            lhs,
            rhs,
        } => {
            let (left_positions, right_positions) = propagate::binary(positions, connective);
            let left = simplify(lhs, &left_positions, oracle);
            let right = simplify(rhs, &right_positions, oracle);

            match connective {
                BinaryConnective::Conjunction => simplify_conjunction(positions, &left, &right),
                BinaryConnective::Disjunction => simplify_disjunction(positions, &left, &right),
                BinaryConnective::Implication => simplify_implication(positions, &left, &right),
                BinaryConnective::Equivalence => simplify_equivalence(positions, &left, &right),
                BinaryConnective::Until(interval) => {
                    simplify_until(positions, &left, &right, *interval)
                }
            }
        }

        Formula::MultiFormula {
            connective,
            formulas,
        } => {
            let maps: Vec<SimplificationMap> = formulas
                .iter()
                .map(|formula| simplify(formula, positions, oracle))
                .collect();
            let fold: fn(&PositionSet, &SimplificationMap, &SimplificationMap) -> SimplificationMap =
                match connective {
                    MultiConnective::Conjunction => simplify_conjunction,
                    MultiConnective::Disjunction => simplify_disjunction,
                };
            maps.into_iter()
                .reduce(|folded, operand| fold(positions, &folded, &operand))
                .expect("multi formulas have at least one operand")
        }
    }
}

fn ground_terms(atom: &Atom) -> Option<Vec<Constant>> {
    atom.terms
        .iter()
        .map(|term| match term {
            Term::Constant(constant) => Some(constant.clone()),
            Term::Variable(_) => None,
        })
        .collect()
}

fn child_support(map: &SimplificationMap) -> Support {
    Support::new(
        map.positions(&Formula::truth()),
        map.positions(&Formula::falsity()),
    )
}

fn merge_starts(left: Option<usize>, right: Option<usize>) -> Option<usize> {
    match (left, right) {
        (Some(left), Some(right)) => Some(cmp::max(left, right)),
        (known, None) | (None, known) => known,
    }
}

fn stop_reached(stop: Option<usize>, position: usize) -> bool {
    stop.map_or(true, |start| position >= start)
}

/// Remaining positions from `position` on, as a single tail entry.
fn rest_from(position: usize, remaining: &PositionSet) -> PositionSet {
    PositionSet::new([position], true).intersection(remaining)
}

fn simplify_negation(operand: &SimplificationMap) -> SimplificationMap {
    let mut map = SimplificationMap::new();
    for (formula, positions) in operand.iter() {
        let negated = match formula {
            Formula::AtomicFormula(AtomicFormula::Truth) => Formula::falsity(),
            Formula::AtomicFormula(AtomicFormula::Falsity) => Formula::truth(),
            residual => residual.clone().negate(),
        };
        map.insert_in(negated, positions.clone());
    }
    map
}

fn simplify_conjunction(
    positions: &PositionSet,
    left: &SimplificationMap,
    right: &SimplificationMap,
) -> SimplificationMap {
    let Support { truth, falsity } =
        support::conjunction(&child_support(left), &child_support(right));
    let mut map = SimplificationMap::new();
    map.insert_in(Formula::truth(), truth.clone());
    map.insert_in(Formula::falsity(), falsity.clone());
    let remaining = positions.without(&truth.union(&falsity));

    let stop = merge_starts(left.no_change_start(), right.no_change_start());
    for t in remaining.iter() {
        let lhs = residual_at(left, t);
        let rhs = residual_at(right, t);
        let simplified = if lhs == Formula::truth() {
            rhs
        } else if rhs == Formula::truth() {
            lhs
        } else {
            lhs.and(rhs)
        };

        if stop_reached(stop, t) {
            map.insert_in(simplified, rest_from(t, &remaining));
            break;
        }
        map.insert_at(simplified, t);
    }
    map
}

fn simplify_disjunction(
    positions: &PositionSet,
    left: &SimplificationMap,
    right: &SimplificationMap,
) -> SimplificationMap {
    let Support { truth, falsity } =
        support::disjunction(&child_support(left), &child_support(right));
    let mut map = SimplificationMap::new();
    map.insert_in(Formula::truth(), truth.clone());
    map.insert_in(Formula::falsity(), falsity.clone());
    let remaining = positions.without(&truth.union(&falsity));

    let stop = merge_starts(left.no_change_start(), right.no_change_start());
    for t in remaining.iter() {
        let lhs = residual_at(left, t);
        let rhs = residual_at(right, t);
        let simplified = if lhs == Formula::falsity() {
            rhs
        } else if rhs == Formula::falsity() {
            lhs
        } else {
            lhs.or(rhs)
        };

        if stop_reached(stop, t) {
            map.insert_in(simplified, rest_from(t, &remaining));
            break;
        }
        map.insert_at(simplified, t);
    }
    map
}

fn simplify_implication(
    positions: &PositionSet,
    left: &SimplificationMap,
    right: &SimplificationMap,
) -> SimplificationMap {
    let negated = simplify_negation(left);
    simplify_disjunction(positions, &negated, right)
}

fn simplify_equivalence(
    positions: &PositionSet,
    left: &SimplificationMap,
    right: &SimplificationMap,
) -> SimplificationMap {
    let Support { truth, falsity } =
        support::equivalence(&child_support(left), &child_support(right));
    let mut map = SimplificationMap::new();
    map.insert_in(Formula::truth(), truth.clone());
    map.insert_in(Formula::falsity(), falsity.clone());
    let remaining = positions.without(&truth.union(&falsity));

    let stop = merge_starts(left.no_change_start(), right.no_change_start());
    for t in remaining.iter() {
        let lhs = residual_at(left, t);
        let rhs = residual_at(right, t);
        let simplified = if lhs == Formula::truth() {
            rhs
        } else if rhs == Formula::truth() {
            lhs
        } else if lhs == Formula::falsity() {
            rhs.negate()
        } else if rhs == Formula::falsity() {
            lhs.negate()
        } else {
            lhs.iff(rhs)
        };

        if stop_reached(stop, t) {
            map.insert_in(simplified, rest_from(t, &remaining));
            break;
        }
        map.insert_at(simplified, t);
    }
    map
}

fn simplify_next(
    positions: &PositionSet,
    operand: &SimplificationMap,
    shift: usize,
) -> SimplificationMap {
    let Support { truth, falsity } =
        support::next(&child_support(operand), Interval::unbounded(shift));
    let mut map = SimplificationMap::new();
    map.insert_in(Formula::truth(), truth.clone());
    map.insert_in(Formula::falsity(), falsity.clone());
    let remaining = positions.without(&truth.union(&falsity));

    let stop = operand.no_change_start();
    for t in remaining.iter() {
        let simplified = residual_at(operand, t + shift).next(shift);

        if stop_reached(stop, t) {
            map.insert_in(simplified, rest_from(t, &remaining));
            break;
        }
        map.insert_at(simplified, t);
    }
    map
}

fn simplify_always(
    positions: &PositionSet,
    operand: &SimplificationMap,
    interval: Interval,
) -> SimplificationMap {
    let Interval { lower: a, upper: b } = interval;
    let Support { truth, falsity } = support::always(&child_support(operand), interval);
    let mut map = SimplificationMap::new();
    map.insert_in(Formula::truth(), truth.clone());
    map.insert_in(Formula::falsity(), falsity.clone());
    let remaining = positions.without(&truth.union(&falsity));

    let stop = operand.no_change_start();
    for t in remaining.iter() {
        let window = PositionSet::from_interval(a + t, b.map(|b| b + t));
        let mut conjuncts = Vec::new();
        for residual in operand.residuals() {
            let obligations: Vec<Formula> = operand
                .positions(residual)
                .intersection(&window)
                .partition()
                .into_iter()
                .map(|(x, y)| {
                    residual
                        .clone()
                        .always(Interval::new(x - t, y.map(|y| y - t)))
                })
                .collect();
            if obligations.is_empty() {
                continue;
            }
            conjuncts.push(Formula::conjoin(obligations));
        }
        if conjuncts.is_empty() {
            continue;
        }
        let simplified = Formula::conjoin(conjuncts);

        if stop_reached(stop, t) {
            map.insert_in(simplified, rest_from(t, &remaining));
            break;
        }
        map.insert_at(simplified, t);
    }
    map
}

fn simplify_eventually(
    positions: &PositionSet,
    operand: &SimplificationMap,
    interval: Interval,
) -> SimplificationMap {
    let Interval { lower: a, upper: b } = interval;
    let Support { truth, falsity } = support::eventually(&child_support(operand), interval);
    let mut map = SimplificationMap::new();
    map.insert_in(Formula::truth(), truth.clone());
    map.insert_in(Formula::falsity(), falsity.clone());
    let remaining = positions.without(&truth.union(&falsity));

    let stop = operand.no_change_start();
    for t in remaining.iter() {
        let window = PositionSet::from_interval(a + t, b.map(|b| b + t));
        let mut disjuncts = Vec::new();
        for residual in operand.residuals() {
            let chances: Vec<Formula> = operand
                .positions(residual)
                .intersection(&window)
                .partition()
                .into_iter()
                .map(|(x, y)| {
                    residual
                        .clone()
                        .eventually(Interval::new(x - t, y.map(|y| y - t)))
                })
                .collect();
            if chances.is_empty() {
                continue;
            }
            disjuncts.push(Formula::disjoin(chances));
        }
        if disjuncts.is_empty() {
            continue;
        }
        let simplified = Formula::disjoin(disjuncts);

        if stop_reached(stop, t) {
            map.insert_in(simplified, rest_from(t, &remaining));
            break;
        }
        map.insert_at(simplified, t);
    }
    map
}

fn simplify_until(
    positions: &PositionSet,
    left: &SimplificationMap,
    right: &SimplificationMap,
    interval: Interval,
) -> SimplificationMap {
    let Interval { lower: a, upper: b } = interval;
    let Support { truth, falsity } =
        support::until(&child_support(left), &child_support(right), interval);
    let mut map = SimplificationMap::new();
    map.insert_in(Formula::truth(), truth.clone());
    map.insert_in(Formula::falsity(), falsity.clone());
    let remaining = positions.without(&truth.union(&falsity));

    let stop = merge_starts(left.no_change_start(), right.no_change_start());
    for t in remaining.iter() {
        let window = PositionSet::from_interval(a + t, b.map(|b| b + t));
        let splits = PositionSet::split(&left.position_sets(), &right.position_sets(), &window);

        let mut disjuncts = Vec::new();
        for (x, y) in splits {
            // The left operand must hold from t up to the block; a block
            // starting at t itself needs no such guard.
            let guard = if x == t {
                Formula::truth()
            } else {
                let at_t = PositionSet::new([t], false);
                let guarded = simplify_always(&at_t, left, Interval::new(0, Some(x - t - 1)));
                residual_at(&guarded, t)
            };

            let left_residual = residual_at(left, x);
            let right_residual = residual_at(right, x);

            let advance = if left_residual == Formula::truth() {
                right_residual.eventually(Interval::new(x - t, y.map(|y| y - t)))
            } else {
                left_residual
                    .until(right_residual, Interval::new(0, y.map(|y| y - x)))
                    .next(x - t)
            };

            disjuncts.push(if guard == Formula::truth() {
                advance
            } else {
                guard.and(advance)
            });
        }
        if disjuncts.is_empty() {
            continue;
        }
        let simplified = Formula::disjoin(disjuncts);

        if stop_reached(stop, t) {
            map.insert_in(simplified, rest_from(t, &remaining));
            break;
        }
        map.insert_at(simplified, t);
    }
    map
}

fn residual_at(map: &SimplificationMap, position: usize) -> Formula {
    map.formula_at(position)
        .unwrap_or_else(|| panic!("no residual at position {position}"))
        .clone()
}
