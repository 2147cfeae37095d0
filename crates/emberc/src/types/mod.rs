//! Script type system
//!
//! Resolved types, the cast legality rules between them, and the host
//! type lookup the analyzers query for names, fields and methods.

mod script_type;
mod cast;
mod lookup;

pub use script_type::{ClassDef, Primitive, ScriptType, NUMBER, OBJECT};
pub use cast::{
    CastKind, CastPlan, binary_numeric_promotion, conditional_promotion, integral_promotion,
    resolve_cast, unary_numeric_promotion,
};
pub use lookup::{BuiltinLookup, FieldSig, MethodSig, TypeLookup};
