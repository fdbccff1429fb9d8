use crate::{
    formatting::ltl::default::Format,
    parsing::ltl::{
        AtomParser, AtomicFormulaParser, BinaryConnectiveParser, ConstantParser, FormulaParser,
        IntervalParser, TermParser, UnaryConnectiveParser, VariableParser,
    },
    syntax_tree::impl_node,
};

use std::fmt::{self, Display, Formatter};

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Constant {
    pub name: String,
}

impl_node!(Constant, Format, ConstantParser);

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Variable {
    pub name: String,
}

impl_node!(Variable, Format, VariableParser);

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Term {
    Constant(Constant),
    Variable(Variable),
}

impl_node!(Term, Format, TermParser);

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Atom {
    pub predicate: String,
    pub terms: Vec<Term>,
}

impl_node!(Atom, Format, AtomParser);

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum AtomicFormula {
    Truth,
    Falsity,
    Proposition(String),
    Atom(Atom),
}

impl_node!(AtomicFormula, Format, AtomicFormulaParser);

/// A discrete time window `[lower, upper]`; an absent upper bound stands for
/// infinity.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Interval {
    pub lower: usize,
    pub upper: Option<usize>,
}

impl_node!(Interval, Format, IntervalParser);

impl Interval {
    pub fn new(lower: usize, upper: Option<usize>) -> Self {
        Interval { lower, upper }
    }

    pub fn unbounded(lower: usize) -> Self {
        Interval::new(lower, None)
    }
}

impl Default for Interval {
    fn default() -> Self {
        Interval::new(0, None)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UnaryConnective {
    Negation,
    Always(Interval),
    Eventually(Interval),
    Next(Interval),
    Previously(Interval),
    Once(Interval),
}

impl_node!(UnaryConnective, Format, UnaryConnectiveParser);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BinaryConnective {
    Conjunction,
    Disjunction,
    Implication,
    Equivalence,
    Until(Interval),
}

impl_node!(BinaryConnective, Format, BinaryConnectiveParser);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MultiConnective {
    Conjunction,
    Disjunction,
}

impl Display for MultiConnective {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&Format(self), f)
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Formula {
    AtomicFormula(AtomicFormula),
    UnaryFormula {
        connective: UnaryConnective,
        formula: Box<Formula>,
    },
    BinaryFormula {
        connective: BinaryConnective,
        lhs: Box<Formula>,
        rhs: Box<Formula>,
    },
    MultiFormula {
        connective: MultiConnective,
        formulas: Vec<Formula>,
    },
}

impl_node!(Formula, Format, FormulaParser);

impl Formula {
    pub fn truth() -> Self {
        Formula::AtomicFormula(AtomicFormula::Truth)
    }

    pub fn falsity() -> Self {
        Formula::AtomicFormula(AtomicFormula::Falsity)
    }

    pub fn proposition(name: &str) -> Self {
        Formula::AtomicFormula(AtomicFormula::Proposition(name.into()))
    }

    pub fn atom(predicate: &str, terms: impl IntoIterator<Item = Term>) -> Self {
        Formula::AtomicFormula(AtomicFormula::Atom(Atom {
            predicate: predicate.into(),
            terms: terms.into_iter().collect(),
        }))
    }

    pub fn negate(self) -> Self {
        Formula::UnaryFormula {
            connective: UnaryConnective::Negation,
            formula: self.into(),
        }
    }

    pub fn and(self, rhs: Self) -> Self {
        Formula::BinaryFormula {
            connective: BinaryConnective::Conjunction,
            lhs: self.into(),
            rhs: rhs.into(),
        }
    }

    pub fn or(self, rhs: Self) -> Self {
        Formula::BinaryFormula {
            connective: BinaryConnective::Disjunction,
            lhs: self.into(),
            rhs: rhs.into(),
        }
    }

    pub fn implies(self, rhs: Self) -> Self {
        Formula::BinaryFormula {
            connective: BinaryConnective::Implication,
            lhs: self.into(),
            rhs: rhs.into(),
        }
    }

    pub fn iff(self, rhs: Self) -> Self {
        Formula::BinaryFormula {
            connective: BinaryConnective::Equivalence,
            lhs: self.into(),
            rhs: rhs.into(),
        }
    }

    pub fn until(self, rhs: Self, interval: Interval) -> Self {
        Formula::BinaryFormula {
            connective: BinaryConnective::Until(interval),
            lhs: self.into(),
            rhs: rhs.into(),
        }
    }

    pub fn always(self, interval: Interval) -> Self {
        Formula::UnaryFormula {
            connective: UnaryConnective::Always(interval),
            formula: self.into(),
        }
    }

    pub fn eventually(self, interval: Interval) -> Self {
        Formula::UnaryFormula {
            connective: UnaryConnective::Eventually(interval),
            formula: self.into(),
        }
    }

    pub fn next(self, shift: usize) -> Self {
        Formula::UnaryFormula {
            connective: UnaryConnective::Next(Interval::unbounded(shift)),
            formula: self.into(),
        }
    }

    pub fn previously(self, shift: usize) -> Self {
        Formula::UnaryFormula {
            connective: UnaryConnective::Previously(Interval::unbounded(shift)),
            formula: self.into(),
        }
    }

    pub fn once(self, interval: Interval) -> Self {
        Formula::UnaryFormula {
            connective: UnaryConnective::Once(interval),
            formula: self.into(),
        }
    }

    /// Conjoins the given formulas; a single formula stays bare, none at all
    /// collapse to `#true`.
    pub fn conjoin(formulas: impl IntoIterator<Item = Formula>) -> Formula {
        let mut formulas: Vec<Formula> = formulas.into_iter().collect();
        match formulas.len() {
            0 => Formula::truth(),
            1 => formulas.remove(0),
            _ => Formula::MultiFormula {
                connective: MultiConnective::Conjunction,
                formulas,
            },
        }
    }

    /// Disjoins the given formulas; a single formula stays bare, none at all
    /// collapse to `#false`.
    pub fn disjoin(formulas: impl IntoIterator<Item = Formula>) -> Formula {
        let mut formulas: Vec<Formula> = formulas.into_iter().collect();
        match formulas.len() {
            0 => Formula::falsity(),
            1 => formulas.remove(0),
            _ => Formula::MultiFormula {
                connective: MultiConnective::Disjunction,
                formulas,
            },
        }
    }

    /// Grounds every occurrence of `variable` to `constant`.
    pub fn replace_variable(self, variable: &Variable, constant: &Constant) -> Self {
        match self {
            Formula::AtomicFormula(AtomicFormula::Atom(Atom { predicate, terms })) => {
                Formula::AtomicFormula(AtomicFormula::Atom(Atom {
                    predicate,
                    terms: terms
                        .into_iter()
                        .map(|term| match term {
                            Term::Variable(ref v) if v == variable => {
                                Term::Constant(constant.clone())
                            }
                            other => other,
                        })
                        .collect(),
                }))
            }

            x @ Formula::AtomicFormula(_) => x,

            Formula::UnaryFormula {
                connective,
                formula,
            } => Formula::UnaryFormula {
                connective,
                formula: formula.replace_variable(variable, constant).into(),
            },

            Formula::BinaryFormula {
                connective,
                lhs,
                rhs,
            } => Formula::BinaryFormula {
                connective,
                lhs: lhs.replace_variable(variable, constant).into(),
                rhs: rhs.replace_variable(variable, constant).into(),
            },

            Formula::MultiFormula {
                connective,
                formulas,
            } => Formula::MultiFormula {
                connective,
                formulas: formulas
                    .into_iter()
                    .map(|formula| formula.replace_variable(variable, constant))
                    .collect(),
            },
        }
    }

    pub fn contains_variable(&self, variable: &Variable) -> bool {
        match self {
            Formula::AtomicFormula(AtomicFormula::Atom(atom)) => atom
                .terms
                .iter()
                .any(|term| matches!(term, Term::Variable(v) if v == variable)),
            Formula::AtomicFormula(_) => false,
            Formula::UnaryFormula { formula, .. } => formula.contains_variable(variable),
            Formula::BinaryFormula { lhs, rhs, .. } => {
                lhs.contains_variable(variable) || rhs.contains_variable(variable)
            }
            Formula::MultiFormula { formulas, .. } => formulas
                .iter()
                .any(|formula| formula.contains_variable(variable)),
        }
    }

    pub fn contains_variable_named(&self, name: &str) -> bool {
        self.contains_variable(&Variable { name: name.into() })
    }
}
