//! Abstract Syntax Tree definitions
//!
//! Nodes hold only their syntactic children and a span. Every node gets a
//! [`NodeId`] when it is built; analysis results are stored against that id
//! in the semantic scope, never on the node.

mod names;
mod expr;
mod stmt;

pub use crate::common::NodeId;
pub use names::{Ident, Interner, NodeIdGen};
pub use expr::*;
pub use stmt::*;

/// A complete script: the statements of its body plus the names they use
#[derive(Debug)]
pub struct Script {
    pub body: Block,
    pub names: Interner,
    /// Number of node ids handed out while building the tree
    pub node_count: u32,
}

impl Script {
    pub fn new(body: Block, names: Interner, node_count: u32) -> Self {
        Self { body, names, node_count }
    }
}
