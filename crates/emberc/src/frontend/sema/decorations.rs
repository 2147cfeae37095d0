//! Per-node analysis results
//!
//! The AST holds no analysis state. Everything the analyzers learn about a
//! node is stored here against its [`NodeId`]: value decorations carry a
//! payload and may be set once per pass, conditions are plain flags.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::common::{CompileError, CompileResult, NodeId};
use crate::ir::Local;
use crate::types::{CastPlan, ScriptType};

/// Key of a value decoration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecorationKind {
    ValueType,
    TargetType,
    StaticType,
    PartialCanonicalTypeName,
    ExpressionCast,
    StandardLocal,
}

impl DecorationKind {
    pub fn name(self) -> &'static str {
        match self {
            DecorationKind::ValueType => "ValueType",
            DecorationKind::TargetType => "TargetType",
            DecorationKind::StaticType => "StaticType",
            DecorationKind::PartialCanonicalTypeName => "PartialCanonicalTypeName",
            DecorationKind::ExpressionCast => "ExpressionCast",
            DecorationKind::StandardLocal => "StandardLocal",
        }
    }
}

impl fmt::Display for DecorationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value decoration
#[derive(Debug, Clone, PartialEq)]
pub enum Decoration {
    /// Type of the value the node produces
    ValueType(ScriptType),
    /// Type the parent needs the value converted to
    TargetType(ScriptType),
    /// The node names a type rather than a value
    StaticType(ScriptType),
    /// The node names a dotted prefix of some type name
    PartialCanonicalTypeName(String),
    ExpressionCast(CastPlan),
    StandardLocal(Local),
}

impl Decoration {
    pub fn kind(&self) -> DecorationKind {
        match self {
            Decoration::ValueType(_) => DecorationKind::ValueType,
            Decoration::TargetType(_) => DecorationKind::TargetType,
            Decoration::StaticType(_) => DecorationKind::StaticType,
            Decoration::PartialCanonicalTypeName(_) => DecorationKind::PartialCanonicalTypeName,
            Decoration::ExpressionCast(_) => DecorationKind::ExpressionCast,
            Decoration::StandardLocal(_) => DecorationKind::StandardLocal,
        }
    }
}

/// Presence-only facts about a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    /// The block is a loop body
    BeginLoop,
    InLoop,
    /// The statement is the last one executed before a loop iterates
    LastLoop,
    /// The statement is the last one of the script
    LastSource,
    /// No path continues past the node
    AllEscape,
    AnyBreak,
    AnyContinue,
    /// Every path leaves the script
    MethodEscape,
    /// Every path leaves the enclosing loop
    LoopEscape,
    /// A conversion on this node was written by the author
    Explicit,
    /// A conversion on this node was inserted by the compiler
    Internal,
    Read,
    Write,
    ContinuousLoop,
}

/// Decoration store for one analysis pass
#[derive(Debug, Default)]
pub struct Decorations {
    values: HashMap<(NodeId, DecorationKind), Decoration>,
    conditions: HashSet<(NodeId, Condition)>,
}

impl Decorations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a value decoration; each kind may be set once per node
    pub fn set(&mut self, node: NodeId, decoration: Decoration) -> CompileResult<()> {
        let kind = decoration.kind();
        if self.values.contains_key(&(node, kind)) {
            return Err(CompileError::DecorationAlreadySet {
                node,
                kind: kind.name(),
            });
        }
        self.values.insert((node, kind), decoration);
        Ok(())
    }

    pub fn get(&self, node: NodeId, kind: DecorationKind) -> CompileResult<&Decoration> {
        self.find(node, kind).ok_or(CompileError::MissingDecoration {
            node,
            kind: kind.name(),
        })
    }

    pub fn find(&self, node: NodeId, kind: DecorationKind) -> Option<&Decoration> {
        self.values.get(&(node, kind))
    }

    pub fn has(&self, node: NodeId, kind: DecorationKind) -> bool {
        self.values.contains_key(&(node, kind))
    }

    pub fn remove(&mut self, node: NodeId, kind: DecorationKind) -> Option<Decoration> {
        self.values.remove(&(node, kind))
    }

    /// Copy a value decoration from one node to another, if present
    pub fn replicate(&mut self, from: NodeId, to: NodeId, kind: DecorationKind) -> CompileResult<()> {
        match self.find(from, kind).cloned() {
            Some(decoration) => self.set(to, decoration),
            None => Ok(()),
        }
    }

    pub fn set_condition(&mut self, node: NodeId, condition: Condition) {
        self.conditions.insert((node, condition));
    }

    pub fn condition(&self, node: NodeId, condition: Condition) -> bool {
        self.conditions.contains(&(node, condition))
    }

    pub fn clear_condition(&mut self, node: NodeId, condition: Condition) {
        self.conditions.remove(&(node, condition));
    }

    /// Set `condition` on `to` when it is set on `from`
    pub fn replicate_condition(&mut self, from: NodeId, to: NodeId, condition: Condition) {
        if self.condition(from, condition) {
            self.set_condition(to, condition);
        }
    }

    pub fn value_type(&self, node: NodeId) -> CompileResult<&ScriptType> {
        match self.get(node, DecorationKind::ValueType)? {
            Decoration::ValueType(ty) => Ok(ty),
            _ => Err(CompileError::MissingDecoration {
                node,
                kind: DecorationKind::ValueType.name(),
            }),
        }
    }

    pub fn target_type(&self, node: NodeId) -> Option<&ScriptType> {
        match self.find(node, DecorationKind::TargetType)? {
            Decoration::TargetType(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn static_type(&self, node: NodeId) -> Option<&ScriptType> {
        match self.find(node, DecorationKind::StaticType)? {
            Decoration::StaticType(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn partial_canonical_type_name(&self, node: NodeId) -> Option<&str> {
        match self.find(node, DecorationKind::PartialCanonicalTypeName)? {
            Decoration::PartialCanonicalTypeName(name) => Some(name),
            _ => None,
        }
    }

    pub fn expression_cast(&self, node: NodeId) -> Option<&CastPlan> {
        match self.find(node, DecorationKind::ExpressionCast)? {
            Decoration::ExpressionCast(plan) => Some(plan),
            _ => None,
        }
    }

    pub fn standard_local(&self, node: NodeId) -> Option<&Local> {
        match self.find(node, DecorationKind::StandardLocal)? {
            Decoration::StandardLocal(local) => Some(local),
            _ => None,
        }
    }

    /// Number of value decorations and conditions stored
    pub fn len(&self) -> usize {
        self.values.len() + self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.conditions.is_empty()
    }
}
