//! Parser module producing the script AST

#[allow(clippy::module_inception)]
mod parser;

pub use parser::Parser;
