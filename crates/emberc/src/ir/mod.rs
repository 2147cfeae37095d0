//! Typed intermediate representation
//!
//! The analyzers produce one IR node per analyzed AST node. Every
//! expression carries its resolved type, and every conversion the
//! analyzers decided on is an explicit [`CastIr`] wrapper around the
//! converted child.

mod node;
mod display;

pub use node::*;
