use {
    crate::syntax_tree::ltl::{
        Atom, AtomicFormula, BinaryConnective, Constant, Formula, Interval, MultiConnective, Term,
        UnaryConnective, Variable,
    },
    std::fmt::{self, Display, Formatter},
};

pub struct Format<'a, N>(pub &'a N);

impl Display for Format<'_, Constant> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

impl Display for Format<'_, Variable> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

impl Display for Format<'_, Term> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Term::Constant(c) => Format(c).fmt(f),
            Term::Variable(v) => Format(v).fmt(f),
        }
    }
}

impl Display for Format<'_, Atom> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.0.predicate)?;
        for (i, term) in self.0.terms.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            Format(term).fmt(f)?;
        }
        write!(f, ")")
    }
}

impl Display for Format<'_, AtomicFormula> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            AtomicFormula::Truth => write!(f, "#true"),
            AtomicFormula::Falsity => write!(f, "#false"),
            AtomicFormula::Proposition(name) => write!(f, "{name}"),
            AtomicFormula::Atom(atom) => Format(atom).fmt(f),
        }
    }
}

impl Display for Format<'_, Interval> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0.upper {
            Some(upper) => write!(f, "[{},{}]", self.0.lower, upper),
            None => write!(f, "[{},inf]", self.0.lower),
        }
    }
}

/// Temporal connectives keep their default window implicit: `G` is
/// `G[0,inf]`, `X` is `X[1]`. The single-bound form `X[a]` stands for a shift
/// whose window never closes.
impl Display for Format<'_, UnaryConnective> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let shift = |f: &mut Formatter<'_>, letter: &str, interval: &Interval| match interval {
            Interval {
                lower: 1,
                upper: None,
            } => write!(f, "{letter}"),
            Interval { lower, upper: None } => write!(f, "{letter}[{lower}]"),
            interval => write!(f, "{letter}{}", Format(interval)),
        };

        let window = |f: &mut Formatter<'_>, letter: &str, interval: &Interval| {
            if *interval == Interval::default() {
                write!(f, "{letter}")
            } else {
                write!(f, "{letter}{}", Format(interval))
            }
        };

        match self.0 {
            UnaryConnective::Negation => write!(f, "not"),
            UnaryConnective::Always(interval) => window(f, "G", interval),
            UnaryConnective::Eventually(interval) => window(f, "F", interval),
            UnaryConnective::Next(interval) => shift(f, "X", interval),
            UnaryConnective::Previously(interval) => shift(f, "P", interval),
            UnaryConnective::Once(interval) => window(f, "O", interval),
        }
    }
}

impl Display for Format<'_, BinaryConnective> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            BinaryConnective::Conjunction => write!(f, "and"),
            BinaryConnective::Disjunction => write!(f, "or"),
            BinaryConnective::Implication => write!(f, "->"),
            BinaryConnective::Equivalence => write!(f, "<->"),
            BinaryConnective::Until(interval) => {
                if *interval == Interval::default() {
                    write!(f, "U")
                } else {
                    write!(f, "U{}", Format(interval))
                }
            }
        }
    }
}

impl Display for Format<'_, MultiConnective> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            MultiConnective::Conjunction => write!(f, "and"),
            MultiConnective::Disjunction => write!(f, "or"),
        }
    }
}

impl Display for Format<'_, Formula> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Formula::AtomicFormula(a) => Format(a).fmt(f),

            Formula::UnaryFormula {
                connective,
                formula,
            } => write!(f, "{} {}", Format(connective), Format(&**formula)),

            Formula::BinaryFormula {
                connective,
                lhs,
                rhs,
            } => write!(
                f,
                "({} {} {})",
                Format(&**lhs),
                Format(connective),
                Format(&**rhs)
            ),

            Formula::MultiFormula {
                connective,
                formulas,
            } => {
                write!(f, "(")?;
                for (i, formula) in formulas.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", Format(connective))?;
                    }
                    Format(formula).fmt(f)?;
                }
                write!(f, ")")
            }
        }
    }
}
