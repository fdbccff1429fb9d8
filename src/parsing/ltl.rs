use crate::{
    parsing::PestParser,
    syntax_tree::ltl::{
        Atom, AtomicFormula, BinaryConnective, Constant, Formula, Interval, Term, UnaryConnective,
        Variable,
    },
};

mod internal {
    use pest::pratt_parser::PrattParser;

    #[derive(pest_derive::Parser)]
    #[grammar = "parsing/ltl/grammar.pest"]
    pub struct Parser;

    lazy_static::lazy_static! {
        pub static ref FORMULA_PRATT_PARSER: PrattParser<Rule> = {
            use pest::pratt_parser::{Assoc::*, Op};
            use Rule::*;

            PrattParser::new()
                .op(Op::infix(equivalence, Right) | Op::infix(implication, Right))
                .op(Op::infix(disjunction, Left))
                .op(Op::infix(conjunction, Left))
                .op(Op::infix(until, Right))
                .op(Op::prefix(negation)
                    | Op::prefix(always)
                    | Op::prefix(eventually)
                    | Op::prefix(next)
                    | Op::prefix(previously)
                    | Op::prefix(once))
        };
    }
}

fn translate_numeral(pair: pest::iterators::Pair<'_, internal::Rule>) -> usize {
    pair.as_str()
        .parse()
        .unwrap_or_else(|_| panic!("numeral out of range: {}", pair.as_str()))
}

/// The window attached to a temporal connective pair, if any.
fn interval_of(
    pair: pest::iterators::Pair<'_, internal::Rule>,
) -> Option<pest::iterators::Pair<'_, internal::Rule>> {
    pair.into_inner()
        .find(|pair| pair.as_rule() == internal::Rule::interval)
}

fn translate_interval(
    pair: Option<pest::iterators::Pair<'_, internal::Rule>>,
    default: Interval,
) -> Interval {
    let Some(pair) = pair else {
        return default;
    };

    match pair.as_rule() {
        internal::Rule::interval => {
            let mut pairs = pair.into_inner();
            let lower = match pairs.next() {
                Some(pair) if pair.as_rule() == internal::Rule::numeral => translate_numeral(pair),
                Some(pair) => panic!("in interval: unexpected pair found: {pair}"),
                None => panic!("in interval: no pair found"),
            };
            let upper = match pairs.next() {
                None => None,
                Some(pair) if pair.as_rule() == internal::Rule::numeral => {
                    Some(translate_numeral(pair))
                }
                Some(pair) if pair.as_rule() == internal::Rule::infinity => None,
                Some(pair) => panic!("in interval: unexpected pair found: {pair}"),
            };
            Interval::new(lower, upper)
        }
        _ => panic!("in interval: unexpected pair found: {pair}"),
    }
}

pub struct ConstantParser;

impl PestParser for ConstantParser {
    type Node = Constant;

    type InternalParser = internal::Parser;
    type Rule = internal::Rule;
    const RULE: internal::Rule = internal::Rule::constant;

    fn translate_pair(pair: pest::iterators::Pair<'_, Self::Rule>) -> Self::Node {
        match pair.as_rule() {
            internal::Rule::constant => Constant {
                name: pair.as_str().into(),
            },
            _ => Self::report_unexpected_pair(pair),
        }
    }
}

pub struct VariableParser;

impl PestParser for VariableParser {
    type Node = Variable;

    type InternalParser = internal::Parser;
    type Rule = internal::Rule;
    const RULE: internal::Rule = internal::Rule::variable;

    fn translate_pair(pair: pest::iterators::Pair<'_, Self::Rule>) -> Self::Node {
        match pair.as_rule() {
            internal::Rule::variable => Variable {
                name: pair.as_str().into(),
            },
            _ => Self::report_unexpected_pair(pair),
        }
    }
}

pub struct TermParser;

impl PestParser for TermParser {
    type Node = Term;

    type InternalParser = internal::Parser;
    type Rule = internal::Rule;
    const RULE: internal::Rule = internal::Rule::term;

    fn translate_pair(pair: pest::iterators::Pair<'_, Self::Rule>) -> Self::Node {
        match pair.as_rule() {
            internal::Rule::term => Self::translate_pairs(pair.into_inner()),
            internal::Rule::constant => Term::Constant(ConstantParser::translate_pair(pair)),
            internal::Rule::variable => Term::Variable(VariableParser::translate_pair(pair)),
            _ => Self::report_unexpected_pair(pair),
        }
    }
}

pub struct AtomParser;

impl PestParser for AtomParser {
    type Node = Atom;

    type InternalParser = internal::Parser;
    type Rule = internal::Rule;
    const RULE: internal::Rule = internal::Rule::atom;

    fn translate_pair(pair: pest::iterators::Pair<'_, Self::Rule>) -> Self::Node {
        match pair.as_rule() {
            internal::Rule::atom => {
                let mut pairs = pair.into_inner();
                let predicate = match pairs.next() {
                    Some(pair) if pair.as_rule() == internal::Rule::predicate => {
                        pair.as_str().to_string()
                    }
                    Some(pair) => Self::report_unexpected_pair(pair),
                    None => Self::report_missing_pair(),
                };
                Atom {
                    predicate,
                    terms: pairs.map(TermParser::translate_pair).collect(),
                }
            }
            _ => Self::report_unexpected_pair(pair),
        }
    }
}

pub struct AtomicFormulaParser;

impl PestParser for AtomicFormulaParser {
    type Node = AtomicFormula;

    type InternalParser = internal::Parser;
    type Rule = internal::Rule;
    const RULE: internal::Rule = internal::Rule::atomic_formula;

    fn translate_pair(pair: pest::iterators::Pair<'_, Self::Rule>) -> Self::Node {
        match pair.as_rule() {
            internal::Rule::atomic_formula => Self::translate_pairs(pair.into_inner()),
            internal::Rule::truth => AtomicFormula::Truth,
            internal::Rule::falsity => AtomicFormula::Falsity,
            internal::Rule::atom => AtomicFormula::Atom(AtomParser::translate_pair(pair)),
            internal::Rule::proposition => AtomicFormula::Proposition(pair.as_str().into()),
            _ => Self::report_unexpected_pair(pair),
        }
    }
}

pub struct IntervalParser;

impl PestParser for IntervalParser {
    type Node = Interval;

    type InternalParser = internal::Parser;
    type Rule = internal::Rule;
    const RULE: internal::Rule = internal::Rule::interval;

    fn translate_pair(pair: pest::iterators::Pair<'_, Self::Rule>) -> Self::Node {
        translate_interval(Some(pair), Interval::default())
    }
}

pub struct UnaryConnectiveParser;

impl PestParser for UnaryConnectiveParser {
    type Node = UnaryConnective;

    type InternalParser = internal::Parser;
    type Rule = internal::Rule;
    const RULE: internal::Rule = internal::Rule::unary_connective;

    fn translate_pair(pair: pest::iterators::Pair<'_, Self::Rule>) -> Self::Node {
        match pair.as_rule() {
            internal::Rule::unary_connective => Self::translate_pairs(pair.into_inner()),
            internal::Rule::negation => UnaryConnective::Negation,
            internal::Rule::always => {
                UnaryConnective::Always(translate_interval(interval_of(pair), Interval::default()))
            }
            internal::Rule::eventually => UnaryConnective::Eventually(translate_interval(
                interval_of(pair),
                Interval::default(),
            )),
            internal::Rule::next => UnaryConnective::Next(translate_interval(
                interval_of(pair),
                Interval::unbounded(1),
            )),
            internal::Rule::previously => UnaryConnective::Previously(translate_interval(
                interval_of(pair),
                Interval::unbounded(1),
            )),
            internal::Rule::once => {
                UnaryConnective::Once(translate_interval(interval_of(pair), Interval::default()))
            }
            _ => Self::report_unexpected_pair(pair),
        }
    }
}

pub struct BinaryConnectiveParser;

impl PestParser for BinaryConnectiveParser {
    type Node = BinaryConnective;

    type InternalParser = internal::Parser;
    type Rule = internal::Rule;
    const RULE: internal::Rule = internal::Rule::binary_connective;

    fn translate_pair(pair: pest::iterators::Pair<'_, Self::Rule>) -> Self::Node {
        match pair.as_rule() {
            internal::Rule::binary_connective => Self::translate_pairs(pair.into_inner()),
            internal::Rule::conjunction => BinaryConnective::Conjunction,
            internal::Rule::disjunction => BinaryConnective::Disjunction,
            internal::Rule::implication => BinaryConnective::Implication,
            internal::Rule::equivalence => BinaryConnective::Equivalence,
            internal::Rule::until => {
                BinaryConnective::Until(translate_interval(interval_of(pair), Interval::default()))
            }
            _ => Self::report_unexpected_pair(pair),
        }
    }
}

pub struct FormulaParser;

impl PestParser for FormulaParser {
    type Node = Formula;

    type InternalParser = internal::Parser;
    type Rule = internal::Rule;
    const RULE: internal::Rule = internal::Rule::formula;

    fn translate_pair(pair: pest::iterators::Pair<'_, Self::Rule>) -> Self::Node {
        match pair.as_rule() {
            internal::Rule::formula => internal::FORMULA_PRATT_PARSER
                .map_primary(|primary| match primary.as_rule() {
                    internal::Rule::formula => FormulaParser::translate_pair(primary),
                    internal::Rule::atomic_formula => {
                        Formula::AtomicFormula(AtomicFormulaParser::translate_pair(primary))
                    }
                    _ => Self::report_unexpected_pair(primary),
                })
                .map_prefix(|op, operand| Formula::UnaryFormula {
                    connective: UnaryConnectiveParser::translate_pair(op),
                    formula: operand.into(),
                })
                .map_infix(|lhs, op, rhs| Formula::BinaryFormula {
                    connective: BinaryConnectiveParser::translate_pair(op),
                    lhs: lhs.into(),
                    rhs: rhs.into(),
                })
                .parse(pair.into_inner()),
            _ => Self::report_unexpected_pair(pair),
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::internal,
        crate::syntax_tree::ltl::{
            AtomicFormula, BinaryConnective, Formula, Interval, Term, UnaryConnective,
        },
        pest::Parser as _,
    };

    fn recognize(rule: internal::Rule, accept: Vec<&str>, reject: Vec<&str>) {
        for example in accept {
            assert!(
                internal::Parser::parse(rule, example).is_ok(),
                "assertion failed: rule {rule:?} rejects '{example}'"
            );
        }

        for example in reject {
            assert!(
                internal::Parser::parse(rule, example).is_err(),
                "assertion failed: rule {rule:?} accepts '{example}'"
            );
        }
    }

    #[test]
    fn recognize_terms() {
        recognize(
            internal::Rule::constant,
            vec!["ego", "v8", "lane_1"],
            vec!["Ego", "8v", "_x"],
        );
        recognize(
            internal::Rule::variable,
            vec!["X", "X_other", "V8"],
            vec!["x", "8"],
        );
    }

    #[test]
    fn recognize_intervals() {
        recognize(
            internal::Rule::interval,
            vec!["[0,2]", "[1,inf]", "[3]", "[ 0, 2 ]"],
            vec!["[]", "[,2]", "[2", "[a,b]"],
        );
    }

    #[test]
    fn parse_terms() {
        assert_eq!(
            "ego".parse::<Term>().unwrap(),
            Term::Constant(crate::syntax_tree::ltl::Constant { name: "ego".into() })
        );
        assert_eq!(
            "X_o".parse::<Term>().unwrap(),
            Term::Variable(crate::syntax_tree::ltl::Variable { name: "X_o".into() })
        );
    }

    #[test]
    fn parse_atomic_formulas() {
        assert_eq!(
            "#true".parse::<AtomicFormula>().unwrap(),
            AtomicFormula::Truth
        );
        assert_eq!(
            "p".parse::<AtomicFormula>().unwrap(),
            AtomicFormula::Proposition("p".into())
        );
        assert!(matches!(
            "on_ramp(v8)".parse::<AtomicFormula>().unwrap(),
            AtomicFormula::Atom(_)
        ));
        assert!("Ramp".parse::<AtomicFormula>().is_err());
    }

    #[test]
    fn parse_connectives() {
        assert_eq!(
            "G[1,3]".parse::<UnaryConnective>().unwrap(),
            UnaryConnective::Always(Interval::new(1, Some(3)))
        );
        assert_eq!(
            "X".parse::<UnaryConnective>().unwrap(),
            UnaryConnective::Next(Interval::unbounded(1))
        );
        assert_eq!(
            "U[0,inf]".parse::<BinaryConnective>().unwrap(),
            BinaryConnective::Until(Interval::default())
        );
        assert_eq!(
            "and".parse::<BinaryConnective>().unwrap(),
            BinaryConnective::Conjunction
        );
    }

    #[test]
    fn parse_formulas() {
        let p = Formula::proposition("p");
        let q = Formula::proposition("q");
        let r = Formula::proposition("r");

        for (src, target) in [
            ("p", p.clone()),
            ("not p", p.clone().negate()),
            ("not not p", p.clone().negate().negate()),
            ("p and q", p.clone().and(q.clone())),
            ("p and q and r", p.clone().and(q.clone()).and(r.clone())),
            ("p or q and r", p.clone().or(q.clone().and(r.clone()))),
            ("p -> q -> r", p.clone().implies(q.clone().implies(r.clone()))),
            ("p <-> q", p.clone().iff(q.clone())),
            ("G p", p.clone().always(Interval::default())),
            ("G[1,3] p", p.clone().always(Interval::new(1, Some(3)))),
            ("F[0,inf] p", p.clone().eventually(Interval::default())),
            ("X[2] p", p.clone().next(2)),
            ("G F p", p.clone().eventually(Interval::default()).always(Interval::default())),
            ("p U q", p.clone().until(q.clone(), Interval::default())),
            (
                "p U[0,5] q",
                p.clone().until(q.clone(), Interval::new(0, Some(5))),
            ),
            // Until binds tighter than the boolean connectives, prefix
            // operators tighter still.
            (
                "p U q and r",
                p.clone().until(q.clone(), Interval::default()).and(r.clone()),
            ),
            (
                "G p U q",
                p.clone().always(Interval::default()).until(q.clone(), Interval::default()),
            ),
            ("(p and q) U r", p.clone().and(q.clone()).until(r.clone(), Interval::default())),
            ("not (p and q)", p.clone().and(q.clone()).negate()),
        ] {
            assert_eq!(
                src.parse::<Formula>().unwrap(),
                target,
                "'{src}' does not parse to the expected formula"
            );
        }
    }

    #[test]
    fn reject_malformed_formulas() {
        for src in ["", "p and", "Gp", "p (", "(p", "p q", "p U U q", "X[a] p"] {
            assert!(
                src.parse::<Formula>().is_err(),
                "'{src}' should not parse"
            );
        }
    }

    #[test]
    fn round_trip_through_the_formatter() {
        for src in [
            "#true",
            "not G p",
            "(p and q)",
            "G[1,3] (p or q)",
            "F[0,2] (p U q)",
            "(on_ramp(v8) -> X[2] braking(v8))",
            "(p U[1,4] q)",
        ] {
            let formula: Formula = src.parse().unwrap();
            assert_eq!(
                formula.to_string().parse::<Formula>().unwrap(),
                formula,
                "'{src}' does not survive a round trip"
            );
            assert_eq!(formula.to_string(), src);
        }
    }
}
