pub mod formatting;
pub mod knowledge;
pub mod parsing;
pub mod sets;
pub mod simplifying;
pub mod syntax_tree;
