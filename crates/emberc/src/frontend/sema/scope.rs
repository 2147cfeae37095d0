//! Semantic scope: decorations, lexical variables and host access

use std::collections::HashMap;

use crate::common::{CompileError, CompileResult, NodeId, Span};
use crate::frontend::ast::{Ident, Interner};
use crate::ir::Local;
use crate::types::{ClassDef, ScriptType, TypeLookup, OBJECT};
use super::decorations::{Condition, Decoration, Decorations};

/// One lexical frame of variables
#[derive(Debug, Default)]
struct Frame {
    variables: HashMap<String, Local>,
    parent: Option<Box<Frame>>,
}

impl Frame {
    fn define(&mut self, local: Local) -> Result<(), String> {
        if self.variables.contains_key(&local.name) {
            return Err(format!("variable [{}] is already defined", local.name));
        }
        self.variables.insert(local.name.clone(), local);
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<&Local> {
        if let Some(local) = self.variables.get(name) {
            Some(local)
        } else if let Some(parent) = &self.parent {
            parent.lookup(name)
        } else {
            None
        }
    }

    fn push_child(&mut self) {
        let old = std::mem::take(self);
        self.parent = Some(Box::new(old));
    }

    fn pop_to_parent(&mut self) -> bool {
        if let Some(parent) = self.parent.take() {
            *self = *parent;
            true
        } else {
            false
        }
    }
}

/// Everything the analyzers share during one pass over a script
pub struct SemanticScope<'a> {
    lookup: &'a dyn TypeLookup,
    names: &'a Interner,
    return_type: ScriptType,
    decorations: Decorations,
    variables: Frame,
    locals: Vec<Local>,
}

impl<'a> SemanticScope<'a> {
    pub fn new(lookup: &'a dyn TypeLookup, names: &'a Interner, return_type: ScriptType) -> Self {
        Self {
            lookup,
            names,
            return_type,
            decorations: Decorations::new(),
            variables: Frame::default(),
            locals: Vec::new(),
        }
    }

    pub fn lookup(&self) -> &'a dyn TypeLookup {
        self.lookup
    }

    pub fn name(&self, ident: Ident) -> &'a str {
        self.names.resolve(ident)
    }

    pub fn return_type(&self) -> &ScriptType {
        &self.return_type
    }

    pub fn decorations(&self) -> &Decorations {
        &self.decorations
    }

    pub fn set(&mut self, node: NodeId, decoration: Decoration) -> CompileResult<()> {
        self.decorations.set(node, decoration)
    }

    pub fn set_condition(&mut self, node: NodeId, condition: Condition) {
        self.decorations.set_condition(node, condition);
    }

    pub fn condition(&self, node: NodeId, condition: Condition) -> bool {
        self.decorations.condition(node, condition)
    }

    pub fn replicate_condition(&mut self, from: NodeId, to: NodeId, condition: Condition) {
        self.decorations.replicate_condition(from, to, condition);
    }

    /// Resolve a written type name, failing when the host does not know it
    pub fn resolve_type(&self, name: &str, span: Span) -> CompileResult<ScriptType> {
        self.lookup
            .resolve_type(name)
            .ok_or_else(|| CompileError::semantic(format!("cannot resolve type [{}]", name), span))
    }

    /// The host's root reference type
    pub fn object_type(&self) -> ScriptType {
        self.lookup
            .resolve_type(OBJECT)
            .unwrap_or_else(|| ScriptType::Class(ClassDef::new(OBJECT, None)))
    }

    pub fn push_frame(&mut self) {
        self.variables.push_child();
    }

    pub fn pop_frame(&mut self) {
        self.variables.pop_to_parent();
    }

    /// Declare a variable in the innermost frame and give it the next slot
    pub fn define_variable(
        &mut self,
        name: &str,
        ty: ScriptType,
        read_only: bool,
        span: Span,
    ) -> CompileResult<Local> {
        let slot = u32::try_from(self.locals.len())
            .map_err(|_| CompileError::semantic("too many local variables", span))?;
        let local = Local {
            name: name.to_string(),
            ty,
            slot,
            read_only,
        };
        self.variables
            .define(local.clone())
            .map_err(|message| CompileError::semantic(message, span))?;
        self.locals.push(local.clone());
        Ok(local)
    }

    pub fn lookup_variable(&self, name: &str) -> Option<&Local> {
        self.variables.lookup(name)
    }

    /// Finish the pass, keeping the decorations and the local table
    pub fn into_parts(self) -> (Decorations, Vec<Local>) {
        (self.decorations, self.locals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BuiltinLookup;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_frames_and_slots() {
        let lookup = BuiltinLookup::new();
        let names = Interner::new();
        let mut scope = SemanticScope::new(&lookup, &names, ScriptType::Def);

        let x = scope
            .define_variable("x", ScriptType::int(), false, Span::default())
            .unwrap();
        assert_eq!(x.slot, 0);

        scope.push_frame();
        let shadow = scope
            .define_variable("x", ScriptType::long(), false, Span::default())
            .unwrap();
        assert_eq!(shadow.slot, 1);
        assert_eq!(scope.lookup_variable("x").unwrap().ty, ScriptType::long());
        assert!(scope
            .define_variable("x", ScriptType::int(), false, Span::default())
            .is_err());
        scope.pop_frame();

        assert_eq!(scope.lookup_variable("x").unwrap().ty, ScriptType::int());
        let (_, locals) = scope.into_parts();
        assert_eq!(locals.len(), 2);
    }

    #[test]
    fn test_unknown_type() {
        let lookup = BuiltinLookup::new();
        let names = Interner::new();
        let scope = SemanticScope::new(&lookup, &names, ScriptType::Def);
        assert!(scope.resolve_type("Nope", Span::new(0, 4)).is_err());
        assert!(scope.object_type().is_class(OBJECT));
    }
}
