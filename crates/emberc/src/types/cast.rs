//! Cast legality
//!
//! [`resolve_cast`] decides whether a value of one resolved type may be
//! converted to another and how. It is a pure function of its inputs: the
//! analyzers call it once per conversion site and the answer never depends
//! on anything but the two types and the explicit/internal flags.
//!
//! The promotion helpers pick the common operand type for unary, binary
//! and conditional operators; casts to that type are then resolved with
//! [`resolve_cast`] like any other.

use crate::common::{CompileError, CompileResult, Span};
use super::script_type::{Primitive, ScriptType, NUMBER, OBJECT};

/// How a conversion is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
    /// Numeric conversion to a wider primitive
    Widen,
    /// Numeric conversion that may lose range or precision
    Narrow,
    /// Primitive into its own boxed type
    Box,
    /// Boxed value back into its primitive
    Unbox,
    UnboxWiden,
    UnboxNarrow,
    WidenBox,
    /// Primitive boxed and viewed as `Object`/`Number`
    BoxUpcast,
    Upcast,
    /// Checked reference conversion to a subtype
    Downcast,
    ToDef,
    /// Run-time checked conversion out of `def`
    FromDef,
}

impl CastKind {
    /// Conversions that need the author's (or the compiler's) explicit consent
    pub fn requires_consent(self) -> bool {
        matches!(
            self,
            CastKind::Narrow | CastKind::UnboxNarrow | CastKind::WidenBox | CastKind::Downcast
        )
    }
}

/// A resolved conversion between two types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastPlan {
    pub source: ScriptType,
    pub target: ScriptType,
    pub kind: CastKind,
    /// The conversion was written by the script author
    pub explicit: bool,
}

/// Resolve the conversion from `source` to `target`.
///
/// Returns `Ok(None)` when no conversion is needed. Narrowing and
/// downcasting conversions are only legal with `explicit` or `internal`
/// set; anything without a legal path fails with `InvalidCast`.
pub fn resolve_cast(
    span: Span,
    source: &ScriptType,
    target: &ScriptType,
    explicit: bool,
    internal: bool,
) -> CompileResult<Option<CastPlan>> {
    if source == target {
        return Ok(None);
    }

    let kind = cast_kind(source, target)
        .filter(|kind| !kind.requires_consent() || explicit || internal)
        .ok_or_else(|| CompileError::invalid_cast(source.name(), target.name(), span))?;

    Ok(Some(CastPlan {
        source: source.clone(),
        target: target.clone(),
        kind,
        explicit,
    }))
}

/// The conversion path between two distinct types, ignoring consent
fn cast_kind(source: &ScriptType, target: &ScriptType) -> Option<CastKind> {
    use ScriptType::{Boxed, Class, Def, Primitive as Prim, Void};

    match (source, target) {
        (Void, _) | (_, Void) => None,
        (Def, _) => Some(CastKind::FromDef),
        (_, Def) => Some(CastKind::ToDef),

        (Prim(from), Prim(to)) => {
            if !from.is_numeric() || !to.is_numeric() {
                None
            } else if from.widens_to(*to) {
                Some(CastKind::Widen)
            } else {
                Some(CastKind::Narrow)
            }
        }
        (Prim(from), Boxed(to)) => {
            if from == to {
                Some(CastKind::Box)
            } else if from.is_numeric() && from.widens_to(*to) {
                Some(CastKind::WidenBox)
            } else {
                None
            }
        }
        (Prim(from), Class(class)) => {
            is_box_supertype(*from, &class.name).then_some(CastKind::BoxUpcast)
        }

        (Boxed(from), Prim(to)) => {
            if from == to {
                Some(CastKind::Unbox)
            } else if !from.is_numeric() || !to.is_numeric() {
                None
            } else if from.widens_to(*to) {
                Some(CastKind::UnboxWiden)
            } else {
                Some(CastKind::UnboxNarrow)
            }
        }
        (Boxed(_), Boxed(_)) => None,
        (Boxed(from), Class(class)) => {
            is_box_supertype(*from, &class.name).then_some(CastKind::Upcast)
        }

        (Class(class), Boxed(to)) => {
            is_box_supertype(*to, &class.name).then_some(CastKind::Downcast)
        }
        (Class(from), Class(to)) => {
            if from.is_subclass_of(to) {
                Some(CastKind::Upcast)
            } else if to.is_subclass_of(from) {
                Some(CastKind::Downcast)
            } else {
                None
            }
        }
        (Class(_), Prim(_)) => None,
    }
}

fn is_box_supertype(primitive: Primitive, class: &str) -> bool {
    class == OBJECT || (class == NUMBER && primitive.is_numeric())
}

fn numeric_primitive(ty: &ScriptType) -> Option<Primitive> {
    ty.as_primitive().filter(|p| p.is_numeric())
}

/// Operand type for unary `-` and `+`: `int` for anything narrower
pub fn unary_numeric_promotion(operand: &ScriptType) -> Option<ScriptType> {
    if operand.is_def() {
        return Some(ScriptType::Def);
    }
    let p = numeric_primitive(operand)?;
    Some(ScriptType::Primitive(promote_one(p)))
}

fn promote_one(p: Primitive) -> Primitive {
    match p {
        Primitive::Byte | Primitive::Short | Primitive::Char => Primitive::Int,
        other => other,
    }
}

/// Common operand type for arithmetic and ordering operators
pub fn binary_numeric_promotion(lhs: &ScriptType, rhs: &ScriptType) -> Option<ScriptType> {
    if lhs.is_def() || rhs.is_def() {
        return Some(ScriptType::Def);
    }
    let (a, b) = (numeric_primitive(lhs)?, numeric_primitive(rhs)?);
    let promoted = [Primitive::Double, Primitive::Float, Primitive::Long]
        .into_iter()
        .find(|wide| a == *wide || b == *wide)
        .unwrap_or(Primitive::Int);
    Some(ScriptType::Primitive(promoted))
}

/// Operand type for bitwise and shift operators.
///
/// With `allow_boolean` the non-short-circuit `& | ^` also accept two
/// booleans. Pass `None` for `rhs` to promote a shift's left operand alone.
pub fn integral_promotion(
    lhs: &ScriptType,
    rhs: Option<&ScriptType>,
    allow_boolean: bool,
) -> Option<ScriptType> {
    if lhs.is_def() || rhs.is_some_and(ScriptType::is_def) {
        return Some(ScriptType::Def);
    }
    if allow_boolean && lhs.is_boolean() && rhs.is_none_or(ScriptType::is_boolean) {
        return Some(ScriptType::boolean());
    }
    let a = lhs.as_primitive().filter(|p| p.is_integral())?;
    let b = match rhs {
        Some(rhs) => rhs.as_primitive().filter(|p| p.is_integral())?,
        None => Primitive::Int,
    };
    let promoted = if a == Primitive::Long || b == Primitive::Long {
        Primitive::Long
    } else {
        Primitive::Int
    };
    Some(ScriptType::Primitive(promoted))
}

/// Result type of `c ? a : b`.
///
/// `object` is the host's root reference type, used when two unrelated
/// reference branches meet.
pub fn conditional_promotion(
    lhs: &ScriptType,
    rhs: &ScriptType,
    object: &ScriptType,
) -> Option<ScriptType> {
    if lhs == rhs {
        return Some(lhs.clone());
    }
    if lhs.is_void() || rhs.is_void() {
        return None;
    }
    if lhs.is_def() || rhs.is_def() {
        return Some(ScriptType::Def);
    }
    if let Some(numeric) = binary_numeric_promotion(lhs, rhs) {
        return Some(numeric);
    }
    if lhs.is_boolean() && rhs.is_boolean() {
        return Some(ScriptType::boolean());
    }
    match (lhs, rhs) {
        (ScriptType::Class(a), ScriptType::Class(b)) if a.is_subclass_of(b) => Some(rhs.clone()),
        (ScriptType::Class(a), ScriptType::Class(b)) if b.is_subclass_of(a) => Some(lhs.clone()),
        _ if lhs.is_reference() && rhs.is_reference() => Some(object.clone()),
        _ => None,
    }
}
