//! Interned identifiers and node id allocation

use std::fmt;

use string_interner::{DefaultStringInterner, DefaultSymbol};

use crate::common::NodeId;

/// An interned identifier
pub type Ident = DefaultSymbol;

/// Identifier table for one script
#[derive(Default)]
pub struct Interner {
    inner: DefaultStringInterner,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> Ident {
        self.inner.get_or_intern(name)
    }

    /// Look up an identifier without interning it
    pub fn get(&self, name: &str) -> Option<Ident> {
        self.inner.get(name)
    }

    pub fn resolve(&self, ident: Ident) -> &str {
        self.inner.resolve(ident).unwrap_or("<unknown>")
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interner").field("len", &self.inner.len()).finish()
    }
}

/// Hands out node ids in construction order
#[derive(Debug, Default)]
pub struct NodeIdGen {
    next: u32,
}

impl NodeIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far
    pub fn count(&self) -> u32 {
        self.next
    }
}
