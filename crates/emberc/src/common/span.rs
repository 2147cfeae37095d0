//! Source locations and node identities

use std::fmt;

/// Byte range into the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Identity of one AST node within a compilation unit.
///
/// Allocated once when the node is built and never reused, so it can key
/// per-node analysis state without touching the node itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_orders_endpoints() {
        let a = Span::new(10, 14);
        let b = Span::new(2, 6);
        assert_eq!(a.merge(b), Span::new(2, 14));
        assert_eq!(b.merge(a), Span::new(2, 14));
    }

    #[test]
    fn test_empty_span() {
        assert!(Span::default().is_empty());
        assert_eq!(Span::new(3, 8).len(), 5);
    }
}
