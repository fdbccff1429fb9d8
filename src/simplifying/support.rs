use crate::{sets::PositionSet, syntax_tree::ltl::Interval};

use std::cmp;

/// The positions where a subformula is known to hold and where it is known to
/// fail. Disjointness of the two sets is the provider's obligation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Support {
    pub truth: PositionSet,
    pub falsity: PositionSet,
}

impl Support {
    pub fn new(truth: PositionSet, falsity: PositionSet) -> Self {
        Support { truth, falsity }
    }

    /// No information at any position.
    pub fn unknown() -> Self {
        Support::default()
    }
}

pub fn negation(operand: &Support) -> Support {
    Support::new(operand.falsity.clone(), operand.truth.clone())
}

pub fn conjunction(left: &Support, right: &Support) -> Support {
    Support::new(
        left.truth.intersection(&right.truth),
        left.falsity.union(&right.falsity),
    )
}

pub fn disjunction(left: &Support, right: &Support) -> Support {
    Support::new(
        left.truth.union(&right.truth),
        left.falsity.intersection(&right.falsity),
    )
}

pub fn implication(left: &Support, right: &Support) -> Support {
    Support::new(
        left.falsity.union(&right.truth),
        left.truth.intersection(&right.falsity),
    )
}

pub fn equivalence(left: &Support, right: &Support) -> Support {
    Support::new(
        left.truth
            .intersection(&right.truth)
            .union(&left.falsity.intersection(&right.falsity)),
        left.truth
            .intersection(&right.falsity)
            .union(&left.falsity.intersection(&right.truth)),
    )
}

/// `X[a] φ` holds at `t` exactly when `φ` holds at `t + a`, so both support
/// sets shift down by the step width.
pub fn next(operand: &Support, interval: Interval) -> Support {
    let shift = -(interval.lower as isize);
    Support::new(
        operand.truth.addition(shift),
        operand.falsity.addition(shift),
    )
}

/// `G[a,b] φ` is known to hold at `t` when `[t+a, t+b]` lies inside the
/// positions where `φ` holds, and known to fail as soon as one position in
/// the window lies where `φ` fails.
///
/// With an unbounded window and only finitely many positions known to hold,
/// the true set stays empty: over a total trace model "holds forever" can
/// never be concluded from a finite support.
pub fn always(operand: &Support, interval: Interval) -> Support {
    let Interval { lower: a, upper: b } = interval;
    let holds = &operand.truth;
    let fails = &operand.falsity;

    let truth = if holds.is_empty() {
        PositionSet::empty()
    } else {
        match (b, holds.is_infinite()) {
            (None, true) => PositionSet::new([holds.min_inf_start().saturating_sub(a)], true),
            (None, false) => PositionSet::empty(),
            (Some(b), true) => {
                let horizon = holds.min_inf_start();
                PositionSet::new(
                    (0..=horizon).filter(|&t| holds.contains_all(t + a, Some(t + b))),
                    false,
                )
                .union(&PositionSet::new(
                    [holds.min_inf_start().saturating_sub(a)],
                    true,
                ))
            }
            (Some(b), false) => {
                let horizon = holds.max().unwrap();
                PositionSet::new(
                    (0..=horizon).filter(|&t| holds.contains_all(t + a, Some(t + b))),
                    false,
                )
            }
        }
    };

    let falsity = if fails.is_empty() {
        PositionSet::empty()
    } else {
        match (b, fails.is_infinite()) {
            (None, true) => PositionSet::all(),
            (None, false) => {
                let max = fails.max().unwrap();
                match (max + 1).checked_sub(a) {
                    Some(len) if len > 0 => PositionSet::new(0..len, false),
                    _ => PositionSet::empty(),
                }
            }
            (Some(b), true) => {
                let horizon = fails.min_inf_start();
                PositionSet::new(
                    (0..=horizon).filter(|&t| fails.contains_any(t + a, Some(t + b))),
                    false,
                )
                .union(&PositionSet::new(
                    [fails.min_inf_start().saturating_sub(b)],
                    true,
                ))
            }
            (Some(b), false) => {
                let horizon = fails.max().unwrap();
                PositionSet::new(
                    (0..=horizon).filter(|&t| fails.contains_any(t + a, Some(t + b))),
                    false,
                )
            }
        }
    };

    Support::new(truth, falsity)
}

/// The dual of [`always`], implemented directly for symmetry.
pub fn eventually(operand: &Support, interval: Interval) -> Support {
    let Interval { lower: a, upper: b } = interval;
    let holds = &operand.truth;
    let fails = &operand.falsity;

    let truth = if holds.is_empty() {
        PositionSet::empty()
    } else {
        match (b, holds.is_infinite()) {
            (None, true) => PositionSet::all(),
            (None, false) => {
                let max = holds.max().unwrap();
                PositionSet::new(0..=max, false).addition(-(a as isize))
            }
            (Some(b), true) => {
                let horizon = holds.min_inf_start();
                PositionSet::new(
                    (0..=horizon).filter(|&t| holds.contains_any(t + a, Some(t + b))),
                    true,
                )
            }
            (Some(b), false) => {
                let horizon = holds.max().unwrap();
                PositionSet::new(
                    (0..=horizon).filter(|&t| holds.contains_any(t + a, Some(t + b))),
                    false,
                )
            }
        }
    };

    let falsity = if fails.is_empty() {
        PositionSet::empty()
    } else {
        match (b, fails.is_infinite()) {
            (None, true) => PositionSet::new([fails.min_inf_start().saturating_sub(a)], true),
            (None, false) => PositionSet::empty(),
            (Some(b), true) => {
                let horizon = fails.min_inf_start();
                PositionSet::new(
                    (0..=horizon).filter(|&t| fails.contains_all(t + a, Some(t + b))),
                    false,
                )
                .union(&PositionSet::new([fails.min_inf_start()], true))
            }
            (Some(b), false) => {
                let horizon = fails.max().unwrap();
                PositionSet::new(
                    (0..=horizon).filter(|&t| fails.contains_all(t + a, Some(t + b))),
                    false,
                )
            }
        }
    };

    Support::new(truth, falsity)
}

/// `φ U[a,b] ψ` holds at `t` when some `n ∈ [a,b]` has `ψ` holding at `t+n`
/// and `φ` holding everywhere before it; it fails when `ψ` fails throughout
/// the window, or when `φ` fails at some point that `ψ` has failed up to.
/// Each side splits four ways on which operand supports are tail-infinite.
pub fn until(left: &Support, right: &Support, interval: Interval) -> Support {
    let Interval { lower: a, upper: b } = interval;

    let left_holds_before =
        |t: usize, n: usize| n == 0 || left.truth.contains_all(t, Some(t + n - 1));
    let witness =
        |t: usize, n: usize| right.truth.contains(t + n) && left_holds_before(t, n);

    let truth = if right.truth.is_empty() {
        PositionSet::empty()
    } else {
        match (b, left.truth.is_infinite(), right.truth.is_infinite()) {
            (None, false, false) | (None, true, false) => {
                let n_max = right.truth.max().unwrap();
                PositionSet::new(
                    (0..=n_max).filter(|&t| (a..=a + n_max).any(|n| witness(t, n))),
                    false,
                )
            }
            (None, false, true) => {
                let n_max = cmp::max(
                    left.truth.max().unwrap_or(0),
                    right.truth.min_inf_start(),
                );
                let scanned = PositionSet::new(
                    (0..=n_max).filter(|&t| (a..=a + n_max).any(|n| witness(t, n))),
                    false,
                );
                if a == 0 {
                    scanned.union(&right.truth)
                } else {
                    scanned
                }
            }
            (None, true, true) => {
                let n_max = cmp::max(left.truth.min_inf_start(), right.truth.min_inf_start());
                PositionSet::new(
                    (0..=n_max).filter(|&t| (a..=a + n_max).any(|n| witness(t, n))),
                    true,
                )
            }
            (Some(b), false, false) => {
                let n_max = cmp::max(
                    left.truth.max().unwrap_or(0),
                    right.truth.max().unwrap(),
                );
                PositionSet::new(
                    (0..=n_max).filter(|&t| (a..=b).any(|n| witness(t, n))),
                    false,
                )
            }
            (Some(b), true, false) => {
                let n_max = right.truth.max().unwrap();
                PositionSet::new(
                    (0..=n_max).filter(|&t| (a..=b).any(|n| witness(t, n))),
                    false,
                )
            }
            (Some(b), false, true) => {
                let n_max = cmp::max(
                    left.truth.max().unwrap_or(0),
                    right.truth.min_inf_start(),
                );
                let scanned = PositionSet::new(
                    (0..=n_max).filter(|&t| (a..=b).any(|n| witness(t, n))),
                    false,
                );
                if a == 0 {
                    scanned.union(&right.truth)
                } else {
                    scanned
                }
            }
            (Some(b), true, true) => {
                let n_max = cmp::max(left.truth.min_inf_start(), right.truth.min_inf_start());
                PositionSet::new(
                    (0..=n_max).filter(|&t| (a..=b).any(|n| witness(t, n))),
                    false,
                )
                .union(&PositionSet::new([n_max], true))
            }
        }
    };

    // A position fails before the window opens when the left operand breaks
    // down within [t, t+a-1].
    let fails_before_window =
        |t: usize| a > 0 && left.falsity.contains_any(t, Some(t + a - 1));
    // ... and within the window when the left operand fails at a point the
    // right operand has failed up to.
    let fails_through =
        |t: usize, n: usize| {
            left.falsity.contains(t + n) && right.falsity.contains_all(t + a, Some(t + n))
        };

    let falsity = match (b, left.falsity.is_infinite(), right.falsity.is_infinite()) {
        (None, false, false) => {
            let n_max = cmp::max(
                left.falsity.max().unwrap_or(0),
                right.falsity.max().unwrap_or(0),
            );
            let before = (0..=n_max).filter(|&t| fails_before_window(t));
            let through = (0..=n_max)
                .filter(|&t| (a..=n_max - t).any(|n| fails_through(t, n)));
            PositionSet::new(before, false).union(&PositionSet::new(through, false))
        }
        (None, true, false) => {
            let n_max = cmp::max(
                left.falsity.min_inf_start(),
                right.falsity.max().unwrap_or(0),
            );
            let before = PositionSet::new(
                (0..=n_max).filter(|&t| fails_before_window(t)),
                a > 0,
            );
            let through = PositionSet::new(
                (0..=n_max).filter(|&t| (a..=n_max - t).any(|n| fails_through(t, n))),
                false,
            );
            before.union(&through)
        }
        (None, false, true) => {
            let n_max = cmp::max(
                left.falsity.max().unwrap_or(0),
                right.falsity.min_inf_start(),
            );
            let throughout = PositionSet::new(
                [right.falsity.min_inf_start().saturating_sub(a)],
                true,
            );
            let before = PositionSet::new((0..=n_max).filter(|&t| fails_before_window(t)), false);
            let through = PositionSet::new(
                (0..=n_max).filter(|&t| (a..=n_max).any(|n| fails_through(t, n))),
                false,
            );
            throughout.union(&before).union(&through)
        }
        (None, true, true) => {
            let n_max = cmp::max(
                left.falsity.min_inf_start(),
                right.falsity.min_inf_start(),
            );
            let throughout = PositionSet::new(
                [right.falsity.min_inf_start().saturating_sub(a)],
                true,
            );
            let before = PositionSet::new((0..=n_max).filter(|&t| fails_before_window(t)), false);
            let through = PositionSet::new(
                (0..=n_max).filter(|&t| (a..=n_max).any(|n| fails_through(t, n))),
                false,
            );
            throughout.union(&before).union(&through)
        }
        (Some(b), left_inf, right_inf) => {
            let n_max = match (left_inf, right_inf) {
                (false, false) => cmp::max(
                    left.falsity.max().unwrap_or(0),
                    right.falsity.max().unwrap_or(0),
                ),
                (true, false) => cmp::max(
                    left.falsity.min_inf_start(),
                    right.falsity.max().unwrap_or(0),
                ),
                (false, true) => right.falsity.min_inf_start(),
                (true, true) => cmp::max(
                    left.falsity.min_inf_start(),
                    right.falsity.min_inf_start(),
                ),
            };
            let tail = match (left_inf, right_inf) {
                (false, false) => false,
                (true, false) => a > 0,
                (false, true) | (true, true) => true,
            };
            let throughout = (0..=n_max)
                .filter(|&t| right.falsity.contains_all(t + a, Some(t + b)));
            let through = (0..=n_max)
                .filter(|&t| (0..=b).any(|n| fails_through(t, n)));
            PositionSet::new(
                throughout.chain(through).collect::<Vec<usize>>(),
                tail,
            )
        }
    };

    Support::new(truth, falsity)
}

#[cfg(test)]
mod tests {
    use {
        super::{always, eventually, next, until, Support},
        crate::{sets::PositionSet, syntax_tree::ltl::Interval},
        rand::{rngs::StdRng, Rng, SeedableRng},
    };

    const HORIZON: usize = 200;

    /// Total membership function: within the horizon the unfolded prefix
    /// decides, beyond it the tail flag does.
    struct Unfolded {
        known: Vec<bool>,
        tail: bool,
    }

    impl Unfolded {
        fn contains(&self, position: usize) -> bool {
            if position < self.known.len() {
                self.known[position]
            } else {
                self.tail
            }
        }
    }

    fn random_set(rng: &mut StdRng) -> (PositionSet, Unfolded) {
        let bound = rng.gen_range(0..60);
        let elements: Vec<usize> = (0..bound).filter(|_| rng.gen::<bool>()).collect();
        let tail = rng.gen::<bool>();
        let set = PositionSet::new(elements, tail);
        let known = (0..HORIZON).map(|i| set.contains(i)).collect();
        (set, Unfolded { known, tail })
    }

    fn random_interval(rng: &mut StdRng) -> Interval {
        let lower = rng.gen_range(0..=20);
        let upper = rng
            .gen::<bool>()
            .then(|| lower + rng.gen_range(0..=20usize));
        Interval::new(lower, upper)
    }

    fn check_agreement(name: &str, computed: &PositionSet, reference: impl Fn(usize) -> bool) {
        for t in 0..HORIZON {
            assert_eq!(
                computed.contains(t),
                reference(t),
                "{name} disagrees at position {t}: computed {computed}"
            );
        }
    }

    #[test]
    fn fuzz_next_against_direct_evaluation() {
        let mut rng = StdRng::seed_from_u64(0x1e47);

        for _ in 0..300 {
            let (truth, truth_ref) = random_set(&mut rng);
            let (falsity, falsity_ref) = random_set(&mut rng);
            let a = rng.gen_range(0..=20);

            let result = next(&Support::new(truth, falsity), Interval::unbounded(a));
            check_agreement("next truth", &result.truth, |t| truth_ref.contains(t + a));
            check_agreement("next falsity", &result.falsity, |t| {
                falsity_ref.contains(t + a)
            });
        }
    }

    #[test]
    fn fuzz_always_against_direct_evaluation() {
        let mut rng = StdRng::seed_from_u64(0xa14a);

        for _ in 0..300 {
            let (truth, truth_ref) = random_set(&mut rng);
            let (falsity, falsity_ref) = random_set(&mut rng);
            let interval = random_interval(&mut rng);
            let Interval { lower: a, upper: b } = interval;
            let b = b.unwrap_or(HORIZON - 1);

            let result = always(&Support::new(truth, falsity), interval);
            check_agreement("always truth", &result.truth, |t| {
                (a..=b).all(|n| truth_ref.contains(t + n))
            });
            check_agreement("always falsity", &result.falsity, |t| {
                (a..=b).any(|n| falsity_ref.contains(t + n))
            });
        }
    }

    #[test]
    fn fuzz_eventually_against_direct_evaluation() {
        let mut rng = StdRng::seed_from_u64(0xeeee);

        for _ in 0..300 {
            let (truth, truth_ref) = random_set(&mut rng);
            let (falsity, falsity_ref) = random_set(&mut rng);
            let interval = random_interval(&mut rng);
            let Interval { lower: a, upper: b } = interval;
            let b = b.unwrap_or(HORIZON - 1);

            let result = eventually(&Support::new(truth, falsity), interval);
            check_agreement("eventually truth", &result.truth, |t| {
                (a..=b).any(|n| truth_ref.contains(t + n))
            });
            check_agreement("eventually falsity", &result.falsity, |t| {
                (a..=b).all(|n| falsity_ref.contains(t + n))
            });
        }
    }

    #[test]
    fn fuzz_until_against_direct_evaluation() {
        let mut rng = StdRng::seed_from_u64(0x0171);

        for _ in 0..300 {
            let (left_truth, left_truth_ref) = random_set(&mut rng);
            let (left_falsity, left_falsity_ref) = random_set(&mut rng);
            let (right_truth, right_truth_ref) = random_set(&mut rng);
            let (right_falsity, right_falsity_ref) = random_set(&mut rng);
            let interval = random_interval(&mut rng);
            let Interval { lower: a, upper: b } = interval;
            let b = b.unwrap_or(HORIZON - 1);

            let result = until(
                &Support::new(left_truth, left_falsity),
                &Support::new(right_truth, right_falsity),
                interval,
            );

            check_agreement("until truth", &result.truth, |t| {
                (a..=b).any(|n| {
                    right_truth_ref.contains(t + n)
                        && (0..n).all(|m| left_truth_ref.contains(t + m))
                })
            });
            check_agreement("until falsity", &result.falsity, |t| {
                (a..=b).all(|n| right_falsity_ref.contains(t + n))
                    || (0..a).any(|n| left_falsity_ref.contains(t + n))
                    || (a..=b).any(|n| {
                        left_falsity_ref.contains(t + n)
                            && (a..=n).all(|m| right_falsity_ref.contains(t + m))
                    })
            });
        }
    }

    #[test]
    fn supports_of_disjoint_operands_stay_disjoint() {
        let mut rng = StdRng::seed_from_u64(0xd15);

        for _ in 0..200 {
            // A consistent operand: every position is known true, known
            // false, or unknown, with at most one of the sets tail-infinite.
            let operand = |rng: &mut StdRng| {
                let bound = rng.gen_range(0..40);
                let mut truth = Vec::new();
                let mut falsity = Vec::new();
                for i in 0..bound {
                    match rng.gen_range(0..3) {
                        0 => truth.push(i),
                        1 => falsity.push(i),
                        _ => {}
                    }
                }
                let (truth_tail, falsity_tail) = match rng.gen_range(0..3) {
                    0 => (true, false),
                    1 => (false, true),
                    _ => (false, false),
                };
                let truth = PositionSet::new(truth, truth_tail);
                let falsity = PositionSet::new(falsity, falsity_tail);
                Support::new(truth.without(&falsity), falsity.without(&truth))
            };

            let left = operand(&mut rng);
            let right = operand(&mut rng);
            let interval = random_interval(&mut rng);

            for (name, support) in [
                ("always", always(&right, interval)),
                ("eventually", eventually(&right, interval)),
                ("next", next(&right, Interval::unbounded(interval.lower))),
                ("until", until(&left, &right, interval)),
            ] {
                assert!(
                    support.truth.intersection(&support.falsity).is_empty(),
                    "{name} produced overlapping supports"
                );
            }
        }
    }
}
