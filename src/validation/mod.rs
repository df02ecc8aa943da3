pub mod clause_tree;
pub mod keywords;
pub mod sql_validator;

pub use sql_validator::*;
