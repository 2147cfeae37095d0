//! Resolved script types

use std::fmt;
use std::sync::Arc;

/// Canonical name of the root reference type
pub const OBJECT: &str = "Object";

/// Canonical name of the supertype of every boxed numeric
pub const NUMBER: &str = "Number";

/// Primitive value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl Primitive {
    pub const ALL: [Primitive; 8] = [
        Primitive::Boolean,
        Primitive::Byte,
        Primitive::Short,
        Primitive::Char,
        Primitive::Int,
        Primitive::Long,
        Primitive::Float,
        Primitive::Double,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Char => "char",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    /// Name of the reference type this primitive boxes into
    pub fn boxed_name(self) -> &'static str {
        match self {
            Primitive::Boolean => "Boolean",
            Primitive::Byte => "Byte",
            Primitive::Short => "Short",
            Primitive::Char => "Character",
            Primitive::Int => "Integer",
            Primitive::Long => "Long",
            Primitive::Float => "Float",
            Primitive::Double => "Double",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, Primitive::Boolean)
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            Primitive::Byte | Primitive::Short | Primitive::Char | Primitive::Int | Primitive::Long
        )
    }

    fn rank(self) -> Option<u8> {
        match self {
            Primitive::Boolean => None,
            Primitive::Byte => Some(1),
            Primitive::Short | Primitive::Char => Some(2),
            Primitive::Int => Some(3),
            Primitive::Long => Some(4),
            Primitive::Float => Some(5),
            Primitive::Double => Some(6),
        }
    }

    /// Whether a value of `self` converts to `to` without losing range.
    ///
    /// `char` is unsigned: it widens to `int` and up but not to `short`,
    /// and nothing widens into `char`.
    pub fn widens_to(self, to: Primitive) -> bool {
        if self == to {
            return true;
        }
        match (self, to) {
            (_, Primitive::Char) | (Primitive::Char, Primitive::Byte | Primitive::Short) => false,
            _ => match (self.rank(), to.rank()) {
                (Some(from), Some(to)) => from < to,
                _ => false,
            },
        }
    }
}

/// A reference type known to the host.
///
/// Equality is by canonical name; the superclass chain is what makes
/// upcast/downcast decisions possible without consulting the host again.
#[derive(Debug)]
pub struct ClassDef {
    pub name: String,
    pub superclass: Option<Arc<ClassDef>>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>, superclass: Option<Arc<ClassDef>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            superclass,
        })
    }

    /// True when `self` is `other` or inherits from it
    pub fn is_subclass_of(&self, other: &ClassDef) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class == other {
                return true;
            }
            current = class.superclass.as_deref();
        }
        // every reference type is an Object, even if the host forgot to say so
        other.name == OBJECT
    }

    /// Iterate `self` followed by its superclasses
    pub fn ancestry(&self) -> impl Iterator<Item = &ClassDef> {
        std::iter::successors(Some(self), |class| class.superclass.as_deref())
    }
}

impl PartialEq for ClassDef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ClassDef {}

/// A fully resolved type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptType {
    /// No value; only valid as a method result or statement type
    Void,
    /// Dynamic type, checked at run time
    Def,
    Primitive(Primitive),
    /// Reference wrapper of a primitive (`Integer`, `Double`, ...)
    Boxed(Primitive),
    Class(Arc<ClassDef>),
}

impl ScriptType {
    pub fn boolean() -> Self {
        Self::Primitive(Primitive::Boolean)
    }

    pub fn int() -> Self {
        Self::Primitive(Primitive::Int)
    }

    pub fn long() -> Self {
        Self::Primitive(Primitive::Long)
    }

    pub fn float() -> Self {
        Self::Primitive(Primitive::Float)
    }

    pub fn double() -> Self {
        Self::Primitive(Primitive::Double)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    pub fn is_def(&self) -> bool {
        matches!(self, Self::Def)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }

    /// Boxed and class types; `def` is not counted as a reference
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Boxed(_) | Self::Class(_))
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Primitive(Primitive::Boolean) | Self::Boxed(Primitive::Boolean))
    }

    /// The primitive behind a primitive or boxed type
    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            Self::Primitive(p) | Self::Boxed(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_primitive().is_some_and(Primitive::is_numeric)
    }

    pub fn is_class(&self, name: &str) -> bool {
        matches!(self, Self::Class(class) if class.name == name)
    }

    pub fn name(&self) -> String {
        match self {
            Self::Void => "void".to_string(),
            Self::Def => "def".to_string(),
            Self::Primitive(p) => p.name().to_string(),
            Self::Boxed(p) => p.boxed_name().to_string(),
            Self::Class(class) => class.name.clone(),
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
