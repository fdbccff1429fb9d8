pub mod ltl;
