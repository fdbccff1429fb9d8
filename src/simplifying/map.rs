use {
    crate::{
        sets::PositionSet,
        syntax_tree::ltl::{AtomicFormula, Formula},
    },
    indexmap::{map::Entry, IndexMap},
    itertools::Itertools,
};

/// The result of a simplification pass: a bi-association between residual
/// formulas and the position sets where they stand in for the original.
///
/// The simplifier keeps the position sets of distinct entries disjoint; the
/// map itself only accumulates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimplificationMap {
    entries: IndexMap<Formula, PositionSet>,
}

impl SimplificationMap {
    pub fn new() -> Self {
        SimplificationMap::default()
    }

    pub fn insert_at(&mut self, formula: Formula, position: usize) {
        self.insert_in(formula, PositionSet::new([position], false));
    }

    /// Associates `formula` with `positions`, unioning into any positions it
    /// already covers.
    pub fn insert_in(&mut self, formula: Formula, positions: PositionSet) {
        match self.entries.entry(formula) {
            Entry::Occupied(mut entry) => {
                let merged = entry.get().union(&positions);
                *entry.get_mut() = merged;
            }
            Entry::Vacant(entry) => {
                entry.insert(positions);
            }
        }
    }

    /// The positions where `formula` is the residual; empty if it never is.
    pub fn positions(&self, formula: &Formula) -> PositionSet {
        self.entries
            .get(formula)
            .cloned()
            .unwrap_or_else(PositionSet::empty)
    }

    /// The unique residual covering `position`, if any.
    pub fn formula_at(&self, position: usize) -> Option<&Formula> {
        self.entries
            .iter()
            .find(|(_, positions)| positions.contains(position))
            .map(|(formula, _)| formula)
    }

    pub fn formulas(&self) -> impl Iterator<Item = &Formula> {
        self.entries.keys()
    }

    /// The residuals that are not `#true` or `#false`.
    pub fn residuals(&self) -> Vec<&Formula> {
        self.entries
            .keys()
            .filter(|formula| {
                !matches!(
                    formula,
                    Formula::AtomicFormula(AtomicFormula::Truth | AtomicFormula::Falsity)
                )
            })
            .collect_vec()
    }

    pub fn position_sets(&self) -> Vec<&PositionSet> {
        self.entries.values().collect_vec()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Formula, &PositionSet)> {
        self.entries.iter()
    }

    /// The least position from which the residual no longer changes: a
    /// tail-infinite entry decides with its `min_inf_start` (entries are
    /// disjoint, so at most one can be tail-infinite), otherwise the finite
    /// entries' contiguous-to-max starts bound it. `None` means nothing is
    /// known and iteration may stop immediately.
    pub fn no_change_start(&self) -> Option<usize> {
        let mut start = None;
        for positions in self.entries.values() {
            if positions.is_infinite() {
                return Some(positions.min_inf_start());
            }
            if !positions.is_empty() {
                let candidate = positions.min_complete_to_max_start();
                start = Some(start.map_or(candidate, |known: usize| known.max(candidate)));
            }
        }
        start
    }
}
