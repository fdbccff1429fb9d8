use std::{
    cmp,
    collections::{btree_set, BTreeSet},
    fmt::{self, Display, Formatter},
};

/// A set of non-negative trace positions that may extend to infinity.
///
/// The representation is a finite witness set plus a tail flag. With the tail
/// set, every position strictly greater than the largest witness belongs to
/// the set as well; positions up to the largest witness belong iff they are
/// witnesses. This keeps the algebra closed: union, intersection, complement
/// and shift of eventually periodic sets are again eventually periodic.
///
/// A tail-infinite set without witnesses is not a valid representation; the
/// constructor normalizes it to a witness set of `{0}`, i.e. all of ℕ₀.
#[derive(Clone, Debug, Default)]
pub struct PositionSet {
    elements: BTreeSet<usize>,
    tail: bool,
}

impl PositionSet {
    pub fn new(elements: impl IntoIterator<Item = usize>, tail: bool) -> Self {
        let mut elements: BTreeSet<usize> = elements.into_iter().collect();
        if tail && elements.is_empty() {
            elements.insert(0);
        }
        PositionSet { elements, tail }
    }

    pub fn empty() -> Self {
        PositionSet::new([], false)
    }

    /// All of ℕ₀.
    pub fn all() -> Self {
        PositionSet::new([0], true)
    }

    /// The contiguous run from `lower` to `upper`; an absent `upper` extends
    /// the run to infinity. An inverted pair yields the empty set.
    pub fn from_interval(lower: usize, upper: Option<usize>) -> Self {
        match upper {
            Some(upper) if upper < lower => PositionSet::empty(),
            Some(upper) => PositionSet::new(lower..=upper, false),
            None => PositionSet::new([lower], true),
        }
    }

    pub fn contains(&self, position: usize) -> bool {
        match self.elements.last() {
            Some(&last) => self.elements.contains(&position) || (self.tail && position > last),
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn is_infinite(&self) -> bool {
        self.tail
    }

    /// Whether the set is all of ℕ₀.
    pub fn is_all(&self) -> bool {
        self.tail && self.elements.len() == self.elements.last().map_or(0, |last| last + 1)
    }

    pub fn min(&self) -> usize {
        assert!(!self.is_empty(), "min of the empty set");
        *self.elements.first().unwrap()
    }

    /// The largest position, or `None` for the empty set. Asking a
    /// tail-infinite set for its maximum is a bug.
    pub fn max(&self) -> Option<usize> {
        assert!(!self.tail, "max of a tail-infinite set");
        self.elements.last().copied()
    }

    /// The smallest position from which the set is contiguously populated to
    /// infinity. Only tail-infinite sets have one.
    pub fn min_inf_start(&self) -> usize {
        assert!(self.tail, "min_inf_start of a finite set");
        self.run_start_at_last_witness()
    }

    /// The smallest position from which the set is contiguously populated up
    /// to its maximum.
    pub fn min_complete_to_max_start(&self) -> usize {
        assert!(!self.is_empty(), "min_complete_to_max_start of the empty set");
        self.run_start_at_last_witness()
    }

    fn run_start_at_last_witness(&self) -> usize {
        let mut start = *self.elements.last().unwrap();
        for position in (0..start).rev() {
            if self.elements.contains(&position) {
                start = position;
            } else {
                break;
            }
        }
        start
    }

    pub fn union(&self, other: &Self) -> Self {
        match (self.tail, other.tail) {
            (false, false) => PositionSet {
                elements: self.elements.union(&other.elements).copied().collect(),
                tail: false,
            },
            (true, false) => self.union_within(other, self.min_inf_start()),
            (false, true) => self.union_within(other, other.min_inf_start()),
            (true, true) => {
                self.union_within(other, cmp::max(self.min_inf_start(), other.min_inf_start()))
            }
        }
    }

    fn union_within(&self, other: &Self, horizon: usize) -> Self {
        PositionSet::new(
            (0..=horizon).filter(|&position| self.contains(position) || other.contains(position)),
            true,
        )
    }

    pub fn intersection(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return PositionSet::empty();
        }

        match (self.tail, other.tail) {
            (false, false) => PositionSet {
                elements: self.elements.intersection(&other.elements).copied().collect(),
                tail: false,
            },
            (true, false) => PositionSet {
                elements: other
                    .elements
                    .iter()
                    .copied()
                    .filter(|&position| self.contains(position))
                    .collect(),
                tail: false,
            },
            (false, true) => other.intersection(self),
            (true, true) => {
                let horizon = cmp::max(self.min_inf_start(), other.min_inf_start()) + 1;
                PositionSet::new(
                    (0..=horizon)
                        .filter(|&position| self.contains(position) && other.contains(position)),
                    true,
                )
            }
        }
    }

    pub fn complement(&self) -> Self {
        if self.is_empty() {
            return PositionSet::all();
        }

        if self.tail {
            let horizon = self.min_inf_start();
            PositionSet::new(
                (0..horizon).filter(|&position| !self.contains(position)),
                false,
            )
        } else {
            let horizon = self.max().unwrap() + 1;
            PositionSet::new(
                (0..=horizon).filter(|&position| !self.contains(position)),
                true,
            )
        }
    }

    pub fn without(&self, other: &Self) -> Self {
        self.intersection(&other.complement())
    }

    /// Shifts every position by `offset`; positions that would become
    /// negative are dropped. The tail flag survives the shift.
    pub fn addition(&self, offset: isize) -> Self {
        PositionSet::new(
            self.elements.iter().filter_map(|&position| {
                let shifted = position as isize + offset;
                (shifted >= 0).then_some(shifted as usize)
            }),
            self.tail,
        )
    }

    /// Building aid: inserts a single position. On a tail-infinite set,
    /// positions at or above the largest witness are refused — they are
    /// already covered and storing them would corrupt the representation.
    pub fn add(&mut self, position: usize) {
        if self.tail {
            if position < *self.elements.last().unwrap() {
                self.elements.insert(position);
            }
        } else {
            self.elements.insert(position);
        }
    }

    /// Whether any position in `[lower, upper]` (to infinity for an absent
    /// `upper`) belongs to the set.
    pub fn contains_any(&self, lower: usize, upper: Option<usize>) -> bool {
        if self.is_empty() {
            return false;
        }

        match upper {
            Some(upper) => (lower..=upper).any(|position| self.contains(position)),
            None => self.tail || self.elements.range(lower..).next().is_some(),
        }
    }

    /// Whether every position in `[lower, upper]` belongs to the set. An
    /// inverted bounded pair holds vacuously; an absent `upper` demands the
    /// tail from `lower` on.
    pub fn contains_all(&self, lower: usize, upper: Option<usize>) -> bool {
        match upper {
            Some(upper) if upper < lower => true,
            Some(upper) => (lower..=upper).all(|position| self.contains(position)),
            None => self.tail && self.min_inf_start() <= lower,
        }
    }

    /// Decomposes the set into maximal contiguous runs, in ascending order.
    /// A tail-infinite set ends in an open run `(start, None)`.
    pub fn partition(&self) -> Vec<(usize, Option<usize>)> {
        if self.is_empty() {
            return Vec::new();
        }

        let horizon = if self.tail {
            self.min_inf_start()
        } else {
            self.max().unwrap()
        };

        let mut runs = Vec::new();
        let mut open = None;
        for position in 0..=horizon {
            if self.contains(position) {
                open.get_or_insert(position);
            } else if let Some(start) = open.take() {
                runs.push((start, Some(position - 1)));
            }
        }
        if let Some(start) = open {
            runs.push((start, if self.tail { None } else { Some(horizon) }));
        }
        runs
    }

    /// Enumerates the non-empty contiguous intersections of any run of `left`
    /// with any run of `right`, clipped to `window`. Runs are drawn from the
    /// partitions of every set in each family.
    pub fn split(
        left: &[&PositionSet],
        right: &[&PositionSet],
        window: &PositionSet,
    ) -> Vec<(usize, Option<usize>)> {
        let runs = |family: &[&PositionSet]| -> Vec<(usize, Option<usize>)> {
            family
                .iter()
                .filter(|set| !set.is_empty())
                .flat_map(|set| set.partition())
                .collect()
        };

        let left_runs = runs(left);
        let right_runs = runs(right);

        let mut result = Vec::new();
        for &(left_start, left_end) in &left_runs {
            for &(right_start, right_end) in &right_runs {
                let overlap = PositionSet::from_interval(left_start, left_end)
                    .intersection(&PositionSet::from_interval(right_start, right_end))
                    .intersection(window);
                if !overlap.is_empty() {
                    let end = if overlap.is_infinite() {
                        None
                    } else {
                        overlap.max()
                    };
                    result.push((overlap.min(), end));
                }
            }
        }
        result
    }

    /// Ascending traversal; endless past `min_inf_start` for tail-infinite
    /// sets, so consumers must break out at their own horizon.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            elements: self.elements.iter(),
            tail: self.tail,
            last: None,
            exhausted: false,
        }
    }
}

impl PartialEq for PositionSet {
    fn eq(&self, other: &Self) -> bool {
        match (self.tail, other.tail) {
            (true, true) => {
                let horizon = cmp::max(self.min_inf_start(), other.min_inf_start());
                (0..horizon).all(|position| self.contains(position) == other.contains(position))
            }
            (false, false) => self.elements == other.elements,
            _ => false,
        }
    }
}

impl Eq for PositionSet {}

impl Display for PositionSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, position) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{position}")?;
        }
        if self.tail {
            write!(f, ", ..")?;
        }
        write!(f, "}}")
    }
}

pub struct Iter<'a> {
    elements: btree_set::Iter<'a, usize>,
    tail: bool,
    last: Option<usize>,
    exhausted: bool,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if !self.exhausted {
            if let Some(&position) = self.elements.next() {
                self.last = Some(position);
                return Some(position);
            }
            self.exhausted = true;
        }

        if self.tail {
            let position = match self.last {
                Some(last) => last + 1,
                None => 0,
            };
            self.last = Some(position);
            Some(position)
        } else {
            None
        }
    }
}

impl<'a> IntoIterator for &'a PositionSet {
    type Item = usize;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::PositionSet,
        rand::{rngs::StdRng, Rng, SeedableRng},
        std::collections::BTreeSet,
    };

    const HORIZON: usize = 150;

    /// Membership within the horizon, computed from the raw representation
    /// without going through any `PositionSet` operation.
    fn unfold(elements: &BTreeSet<usize>, tail: bool, horizon: usize) -> Vec<bool> {
        let mut elements = elements.clone();
        if tail && elements.is_empty() {
            elements.insert(0);
        }
        let last = elements.last().copied();
        (0..horizon)
            .map(|i| elements.contains(&i) || (tail && last.is_some_and(|last| i > last)))
            .collect()
    }

    fn random_set(rng: &mut StdRng) -> (PositionSet, Vec<bool>) {
        let bound = rng.gen_range(0..60);
        let elements: BTreeSet<usize> = (0..bound).filter(|_| rng.gen::<bool>()).collect();
        let tail = rng.gen::<bool>();
        let reference = unfold(&elements, tail, HORIZON);
        (PositionSet::new(elements, tail), reference)
    }

    fn unfold_set(set: &PositionSet, horizon: usize) -> Vec<bool> {
        (0..horizon).map(|i| set.contains(i)).collect()
    }

    #[test]
    fn construction_normalizes_the_empty_tail() {
        assert_eq!(PositionSet::new([], true), PositionSet::all());
        assert!(PositionSet::new([], true).contains(0));
        assert!(PositionSet::all().is_all());
        assert!(!PositionSet::empty().is_all());
        assert!(!PositionSet::new([0, 2], true).is_all());
        assert!(PositionSet::new([0, 1, 2], true).is_all());
    }

    #[test]
    fn eventually_periodic_witness() {
        let set = PositionSet::new([0, 2, 5], true);
        assert_eq!(set.min_inf_start(), 5);
        assert_eq!(set.min(), 0);
        assert!(set.contains(100));
        assert!(!set.contains(1));
        assert_eq!(set.complement(), PositionSet::new([1, 3, 4], false));
    }

    #[test]
    fn complement_round_trips() {
        assert_eq!(PositionSet::empty().complement(), PositionSet::all());
        assert_eq!(PositionSet::all().complement(), PositionSet::empty());
        let set = PositionSet::new([1, 3], false);
        assert_eq!(set.complement().complement(), set);
        assert!(!set.complement().complement().is_infinite());
    }

    #[test]
    fn intersection_with_the_empty_set_is_finite() {
        let result = PositionSet::all().intersection(&PositionSet::empty());
        assert!(result.is_empty());
        assert!(!result.is_infinite());
    }

    #[test]
    fn addition_shifts_and_clamps() {
        let set = PositionSet::new([0, 1, 5], true);
        assert_eq!(set.addition(2), PositionSet::new([2, 3, 7], true));
        assert_eq!(set.addition(-1), PositionSet::new([0, 4], true));
        // Shifting the whole witness set below zero leaves the tail, which
        // normalizes to all of ℕ₀.
        assert_eq!(PositionSet::new([5], true).addition(-10), PositionSet::all());
        assert_eq!(
            PositionSet::new([5], false).addition(-10),
            PositionSet::empty()
        );
    }

    #[test]
    fn add_refuses_positions_beyond_a_tail() {
        let mut set = PositionSet::new([0, 5], true);
        set.add(3);
        assert_eq!(set, PositionSet::new([0, 3, 5], true));
        set.add(7);
        assert_eq!(set, PositionSet::new([0, 3, 5], true));

        let mut set = PositionSet::new([0], false);
        set.add(7);
        assert_eq!(set, PositionSet::new([0, 7], false));
    }

    #[test]
    fn quantified_membership() {
        let set = PositionSet::new([2, 4], false);
        assert!(set.contains_any(0, Some(2)));
        assert!(!set.contains_any(5, Some(10)));
        assert!(!set.contains_any(5, None));
        assert!(set.contains_any(4, None));
        assert!(set.contains_all(4, Some(3)));
        assert!(!set.contains_all(2, Some(4)));
        assert!(!set.contains_all(2, None));

        let tail = PositionSet::new([0, 3, 4], true);
        assert!(tail.contains_any(100, None));
        assert!(tail.contains_all(3, None));
        assert!(!tail.contains_all(2, None));
        assert!(tail.contains_all(5, Some(1000)));
    }

    #[test]
    fn partition_into_maximal_runs() {
        assert_eq!(PositionSet::empty().partition(), vec![]);
        assert_eq!(
            PositionSet::new([0, 1, 3], false).partition(),
            vec![(0, Some(1)), (3, Some(3))]
        );
        assert_eq!(
            PositionSet::new([1, 2, 5], true).partition(),
            vec![(1, Some(2)), (5, None)]
        );
        assert_eq!(PositionSet::all().partition(), vec![(0, None)]);
    }

    #[test]
    fn split_refines_two_families() {
        let a = PositionSet::new([0, 1, 2, 6], true);
        let b = PositionSet::new([1, 2, 3, 4], false);
        let window = PositionSet::from_interval(0, None);
        assert_eq!(
            PositionSet::split(&[&a], &[&b], &window),
            vec![(1, Some(2))]
        );

        let window = PositionSet::from_interval(2, Some(8));
        assert_eq!(
            PositionSet::split(&[&a], &[&b], &window),
            vec![(2, Some(2))]
        );
    }

    #[test]
    fn iteration_ascends_and_extends_past_the_witnesses() {
        let set = PositionSet::new([1, 4, 5], true);
        let prefix: Vec<usize> = set.iter().take(6).collect();
        assert_eq!(prefix, vec![1, 4, 5, 6, 7, 8]);

        let set = PositionSet::new([2, 9], false);
        assert_eq!(set.iter().collect::<Vec<usize>>(), vec![2, 9]);
        assert_eq!(PositionSet::empty().iter().next(), None);
    }

    #[test]
    fn fuzz_operations_against_deterministic_unfolding() {
        let mut rng = StdRng::seed_from_u64(0x5e75);

        for _ in 0..500 {
            let (s, s_ref) = random_set(&mut rng);
            let (t, t_ref) = random_set(&mut rng);

            let union = s.union(&t);
            let intersection = s.intersection(&t);
            let complement = s.complement();
            let without = s.without(&t);
            for i in 0..HORIZON {
                assert_eq!(union.contains(i), s_ref[i] || t_ref[i], "union at {i}");
                assert_eq!(
                    intersection.contains(i),
                    s_ref[i] && t_ref[i],
                    "intersection at {i}"
                );
                assert_eq!(complement.contains(i), !s_ref[i], "complement at {i}");
                assert_eq!(without.contains(i), s_ref[i] && !t_ref[i], "without at {i}");
            }

            assert_eq!(
                s == t,
                s_ref == t_ref,
                "semantic equality disagrees for {s} and {t}"
            );
            assert_eq!(s.is_empty(), s_ref.iter().all(|&known| !known));
            assert_eq!(s.is_all(), s_ref.iter().all(|&known| known));

            let offset = rng.gen_range(-10..=10isize);
            let shifted = s.addition(offset);
            for i in 0..HORIZON - 20 {
                let expected = {
                    let origin = i as isize - offset;
                    origin >= 0 && s_ref[origin as usize]
                };
                assert_eq!(shifted.contains(i), expected, "addition({offset}) at {i}");
            }

            let lower = rng.gen_range(0..60);
            let upper = rng.gen::<bool>().then(|| rng.gen_range(0..60));
            let bound = upper.unwrap_or(HORIZON - 1);
            assert_eq!(
                s.contains_any(lower, upper),
                (lower..=bound).any(|i| s_ref[i]),
                "contains_any({lower}, {upper:?}) on {s}"
            );
            assert_eq!(
                s.contains_all(lower, upper),
                lower > bound || (lower..=bound).all(|i| s_ref[i]),
                "contains_all({lower}, {upper:?}) on {s}"
            );

            if s.is_infinite() {
                let start = s.min_inf_start();
                assert!((start..HORIZON).all(|i| s_ref[i]));
                assert!(start == 0 || !s_ref[start - 1]);
            }
        }
    }

    #[test]
    fn fuzz_partition_covers_and_separates() {
        let mut rng = StdRng::seed_from_u64(0x9a37);

        for _ in 0..200 {
            let (s, s_ref) = random_set(&mut rng);
            let runs = s.partition();

            let mut covered = vec![false; HORIZON];
            for &(start, end) in &runs {
                for (i, slot) in covered.iter_mut().enumerate() {
                    if i >= start && end.map_or(true, |end| i <= end) {
                        assert!(!*slot, "runs overlap at {i}");
                        *slot = true;
                    }
                }
            }
            assert_eq!(covered, s_ref, "partition of {s} misses positions");

            for window in runs.windows(2) {
                let (_, end) = window[0];
                let (start, _) = window[1];
                assert!(end.unwrap() + 1 < start, "runs are not maximal");
            }
        }
    }

    #[test]
    fn fuzz_iteration_matches_membership() {
        let mut rng = StdRng::seed_from_u64(0xb221);

        for _ in 0..200 {
            let (s, s_ref) = random_set(&mut rng);
            let expected: Vec<usize> = (0..HORIZON).filter(|&i| s_ref[i]).collect();
            let actual: Vec<usize> = s.iter().take_while(|&i| i < HORIZON).collect();
            assert_eq!(actual, expected);
            assert_eq!(unfold_set(&s, HORIZON), s_ref);
        }
    }
}
