pub mod ltl;

use std::{
    fmt::{Debug, Display},
    hash::Hash,
    str::FromStr,
};

pub trait Node: Clone + Debug + Display + Eq + Hash + PartialEq + FromStr {}

macro_rules! impl_node {
    ($node:path, $format:ident, $parser:path) => {
        impl crate::syntax_tree::Node for $node {}

        impl std::fmt::Display for $node {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&$format(self), f)
            }
        }

        impl std::str::FromStr for $node {
            type Err = pest::error::Error<<$parser as crate::parsing::PestParser>::Rule>;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                use crate::parsing::PestParser as _;
                <$parser>::parse(s)
            }
        }
    };
}

pub(crate) use impl_node;
