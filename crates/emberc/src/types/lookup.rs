//! Host type lookup
//!
//! The analyzers never decide on their own which types, fields or methods
//! exist. They ask a [`TypeLookup`], which answers with a signature or
//! `None` for "not found". [`BuiltinLookup`] is the default host: a small
//! standard library of reference types reachable by short and by qualified
//! name.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::script_type::{ClassDef, Primitive, ScriptType, NUMBER, OBJECT};

/// A resolved method, static method or constructor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    pub owner: ScriptType,
    pub name: String,
    pub params: Vec<ScriptType>,
    pub return_type: ScriptType,
    pub is_static: bool,
}

/// A resolved field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSig {
    pub owner: ScriptType,
    pub name: String,
    pub ty: ScriptType,
    pub is_static: bool,
    pub read_only: bool,
}

/// Type and member resolution supplied by the host system.
///
/// One lookup may serve any number of concurrent compilations; it is only
/// ever read during analysis.
pub trait TypeLookup: Send + Sync {
    /// Resolve a complete type name (`int`, `String`, `java.util.List`)
    fn resolve_type(&self, name: &str) -> Option<ScriptType>;

    /// Whether `partial` is a proper dotted prefix of some known type name
    fn is_type_prefix(&self, partial: &str) -> bool;

    fn field(&self, owner: &ScriptType, name: &str) -> Option<FieldSig>;

    fn static_field(&self, owner: &ScriptType, name: &str) -> Option<FieldSig>;

    fn method(&self, owner: &ScriptType, name: &str, arity: usize) -> Option<MethodSig>;

    fn static_method(&self, owner: &ScriptType, name: &str, arity: usize) -> Option<MethodSig>;

    fn constructor(&self, owner: &ScriptType, arity: usize) -> Option<MethodSig>;
}

#[derive(Debug, Default)]
struct Members {
    fields: Vec<FieldSig>,
    methods: Vec<MethodSig>,
    constructors: Vec<MethodSig>,
}

/// Built-in host types
#[derive(Debug)]
pub struct BuiltinLookup {
    types: HashMap<String, ScriptType>,
    prefixes: HashSet<String>,
    members: HashMap<String, Members>,
}

impl BuiltinLookup {
    /// An empty host that only knows the primitives, `void` and `def`
    pub fn empty() -> Self {
        let mut lookup = Self {
            types: HashMap::new(),
            prefixes: HashSet::new(),
            members: HashMap::new(),
        };
        lookup.types.insert("void".to_string(), ScriptType::Void);
        lookup.types.insert("def".to_string(), ScriptType::Def);
        for p in Primitive::ALL {
            lookup.types.insert(p.name().to_string(), ScriptType::Primitive(p));
        }
        lookup
    }

    /// The default standard library
    pub fn new() -> Self {
        let mut lookup = Self::empty();

        let object = lookup.register_class(OBJECT, &["java.lang.Object"], None);
        let number = lookup.register_class(NUMBER, &["java.lang.Number"], Some(&object));
        let string = lookup.register_class("String", &["java.lang.String"], Some(&object));
        let math = lookup.register_class("Math", &["java.lang.Math"], Some(&object));
        let exception = lookup.register_class("Exception", &["java.lang.Exception"], Some(&object));
        let illegal = lookup.register_class(
            "IllegalArgumentException",
            &["java.lang.IllegalArgumentException"],
            Some(&exception),
        );
        let list = lookup.register_class("List", &["java.util.List"], Some(&object));
        let array_list = lookup.register_class("ArrayList", &["java.util.ArrayList"], Some(&list));
        let map = lookup.register_class("Map", &["java.util.Map"], Some(&object));
        let hash_map = lookup.register_class("HashMap", &["java.util.HashMap"], Some(&map));

        for p in Primitive::ALL {
            let boxed = ScriptType::Boxed(p);
            lookup.register_alias(p.boxed_name(), boxed.clone());
            lookup.register_alias(&format!("java.lang.{}", p.boxed_name()), boxed);
        }

        let int = ScriptType::int;
        let long = ScriptType::long;
        let double = ScriptType::double;
        let boolean = ScriptType::boolean;
        let def = || ScriptType::Def;

        lookup.add_method(&object, "toString", vec![], string.clone());
        lookup.add_method(&object, "hashCode", vec![], int());
        lookup.add_method(&object, "equals", vec![object.clone()], boolean());

        lookup.add_method(&number, "intValue", vec![], int());
        lookup.add_method(&number, "longValue", vec![], long());
        lookup.add_method(&number, "doubleValue", vec![], double());

        lookup.add_method(&string, "length", vec![], int());
        lookup.add_method(&string, "isEmpty", vec![], boolean());
        lookup.add_method(&string, "substring", vec![int(), int()], string.clone());
        lookup.add_method(&string, "charAt", vec![int()], ScriptType::Primitive(Primitive::Char));
        lookup.add_method(&string, "contains", vec![string.clone()], boolean());
        lookup.add_method(&string, "toUpperCase", vec![], string.clone());
        lookup.add_static_method(&string, "valueOf", vec![def()], string.clone());

        lookup.add_static_method(&math, "abs", vec![double()], double());
        lookup.add_static_method(&math, "max", vec![double(), double()], double());
        lookup.add_static_method(&math, "min", vec![double(), double()], double());
        lookup.add_static_method(&math, "sqrt", vec![double()], double());
        lookup.add_static_method(&math, "pow", vec![double(), double()], double());
        lookup.add_static_field(&math, "PI", double());
        lookup.add_static_field(&math, "E", double());

        let integer = ScriptType::Boxed(Primitive::Int);
        lookup.add_static_method(&integer, "parseInt", vec![string.clone()], int());
        lookup.add_static_method(&integer, "valueOf", vec![int()], integer.clone());
        lookup.add_static_field(&integer, "MAX_VALUE", int());
        lookup.add_static_field(&integer, "MIN_VALUE", int());
        lookup.add_static_method(&ScriptType::Boxed(Primitive::Long), "parseLong", vec![string.clone()], long());
        lookup.add_static_method(&ScriptType::Boxed(Primitive::Double), "parseDouble", vec![string.clone()], double());

        lookup.add_constructor(&exception, vec![]);
        lookup.add_constructor(&exception, vec![string.clone()]);
        lookup.add_method(&exception, "getMessage", vec![], string.clone());
        lookup.add_constructor(&illegal, vec![]);
        lookup.add_constructor(&illegal, vec![string.clone()]);

        lookup.add_method(&list, "size", vec![], int());
        lookup.add_method(&list, "isEmpty", vec![], boolean());
        lookup.add_method(&list, "get", vec![int()], def());
        lookup.add_method(&list, "add", vec![def()], boolean());
        lookup.add_method(&list, "contains", vec![def()], boolean());
        lookup.add_constructor(&array_list, vec![]);

        lookup.add_method(&map, "size", vec![], int());
        lookup.add_method(&map, "get", vec![def()], def());
        lookup.add_method(&map, "put", vec![def(), def()], def());
        lookup.add_method(&map, "containsKey", vec![def()], boolean());
        lookup.add_constructor(&hash_map, vec![]);

        lookup
    }

    /// Register a reference type under its canonical name and aliases
    pub fn register_class(
        &mut self,
        name: &str,
        aliases: &[&str],
        superclass: Option<&ScriptType>,
    ) -> ScriptType {
        let superclass = match superclass {
            Some(ScriptType::Class(class)) => Some(Arc::clone(class)),
            _ => None,
        };
        let ty = ScriptType::Class(ClassDef::new(name, superclass));
        self.register_alias(name, ty.clone());
        for alias in aliases {
            self.register_alias(alias, ty.clone());
        }
        ty
    }

    /// Make `ty` reachable under `name`, recording every dotted prefix
    pub fn register_alias(&mut self, name: &str, ty: ScriptType) {
        let mut end = 0;
        while let Some(dot) = name[end..].find('.') {
            end += dot;
            self.prefixes.insert(name[..end].to_string());
            end += 1;
        }
        self.types.insert(name.to_string(), ty);
    }

    fn members_mut(&mut self, owner: &ScriptType) -> &mut Members {
        self.members.entry(owner.name()).or_default()
    }

    pub fn add_method(&mut self, owner: &ScriptType, name: &str, params: Vec<ScriptType>, ret: ScriptType) {
        let sig = MethodSig {
            owner: owner.clone(),
            name: name.to_string(),
            params,
            return_type: ret,
            is_static: false,
        };
        self.members_mut(owner).methods.push(sig);
    }

    pub fn add_static_method(&mut self, owner: &ScriptType, name: &str, params: Vec<ScriptType>, ret: ScriptType) {
        let sig = MethodSig {
            owner: owner.clone(),
            name: name.to_string(),
            params,
            return_type: ret,
            is_static: true,
        };
        self.members_mut(owner).methods.push(sig);
    }

    pub fn add_constructor(&mut self, owner: &ScriptType, params: Vec<ScriptType>) {
        let sig = MethodSig {
            owner: owner.clone(),
            name: "<init>".to_string(),
            params,
            return_type: owner.clone(),
            is_static: true,
        };
        self.members_mut(owner).constructors.push(sig);
    }

    pub fn add_field(&mut self, owner: &ScriptType, name: &str, ty: ScriptType, read_only: bool) {
        let sig = FieldSig {
            owner: owner.clone(),
            name: name.to_string(),
            ty,
            is_static: false,
            read_only,
        };
        self.members_mut(owner).fields.push(sig);
    }

    pub fn add_static_field(&mut self, owner: &ScriptType, name: &str, ty: ScriptType) {
        let sig = FieldSig {
            owner: owner.clone(),
            name: name.to_string(),
            ty,
            is_static: true,
            read_only: true,
        };
        self.members_mut(owner).fields.push(sig);
    }

    /// Names searched for instance members of `owner`, most specific first
    fn member_owners(&self, owner: &ScriptType) -> Vec<String> {
        match owner {
            ScriptType::Class(class) => {
                let mut names: Vec<String> = class.ancestry().map(|c| c.name.clone()).collect();
                if !names.iter().any(|n| n == OBJECT) {
                    names.push(OBJECT.to_string());
                }
                names
            }
            ScriptType::Boxed(p) => {
                let mut names = vec![p.boxed_name().to_string()];
                if p.is_numeric() {
                    names.push(NUMBER.to_string());
                }
                names.push(OBJECT.to_string());
                names
            }
            _ => Vec::new(),
        }
    }
}

impl Default for BuiltinLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeLookup for BuiltinLookup {
    fn resolve_type(&self, name: &str) -> Option<ScriptType> {
        self.types.get(name).cloned()
    }

    fn is_type_prefix(&self, partial: &str) -> bool {
        self.prefixes.contains(partial)
    }

    fn field(&self, owner: &ScriptType, name: &str) -> Option<FieldSig> {
        self.member_owners(owner)
            .iter()
            .filter_map(|owner| self.members.get(owner))
            .flat_map(|members| &members.fields)
            .find(|f| !f.is_static && f.name == name)
            .cloned()
    }

    fn static_field(&self, owner: &ScriptType, name: &str) -> Option<FieldSig> {
        self.members
            .get(&owner.name())?
            .fields
            .iter()
            .find(|f| f.is_static && f.name == name)
            .cloned()
    }

    fn method(&self, owner: &ScriptType, name: &str, arity: usize) -> Option<MethodSig> {
        self.member_owners(owner)
            .iter()
            .filter_map(|owner| self.members.get(owner))
            .flat_map(|members| &members.methods)
            .find(|m| !m.is_static && m.name == name && m.params.len() == arity)
            .cloned()
    }

    fn static_method(&self, owner: &ScriptType, name: &str, arity: usize) -> Option<MethodSig> {
        self.members
            .get(&owner.name())?
            .methods
            .iter()
            .find(|m| m.is_static && m.name == name && m.params.len() == arity)
            .cloned()
    }

    fn constructor(&self, owner: &ScriptType, arity: usize) -> Option<MethodSig> {
        self.members
            .get(&owner.name())?
            .constructors
            .iter()
            .find(|c| c.params.len() == arity)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_and_qualified_names() {
        let lookup = BuiltinLookup::new();
        let short = lookup.resolve_type("List").unwrap();
        let qualified = lookup.resolve_type("java.util.List").unwrap();
        assert_eq!(short, qualified);
        assert_eq!(lookup.resolve_type("int"), Some(ScriptType::int()));
        assert_eq!(lookup.resolve_type("Integer"), Some(ScriptType::Boxed(Primitive::Int)));
        assert_eq!(lookup.resolve_type("Nope"), None);
    }

    #[test]
    fn test_prefixes() {
        let lookup = BuiltinLookup::new();
        assert!(lookup.is_type_prefix("java"));
        assert!(lookup.is_type_prefix("java.util"));
        assert!(!lookup.is_type_prefix("java.util.List"));
        assert!(!lookup.is_type_prefix("jav"));
    }

    #[test]
    fn test_inherited_methods() {
        let lookup = BuiltinLookup::new();
        let array_list = lookup.resolve_type("ArrayList").unwrap();

        let size = lookup.method(&array_list, "size", 0).unwrap();
        assert_eq!(size.return_type, ScriptType::int());
        assert!(lookup.method(&array_list, "toString", 0).is_some());
        assert!(lookup.method(&array_list, "size", 1).is_none());

        let integer = ScriptType::Boxed(Primitive::Int);
        assert!(lookup.method(&integer, "doubleValue", 0).is_some());
    }

    #[test]
    fn test_static_members_are_not_inherited() {
        let lookup = BuiltinLookup::new();
        let math = lookup.resolve_type("Math").unwrap();
        assert!(lookup.static_method(&math, "max", 2).is_some());
        assert!(lookup.method(&math, "max", 2).is_none());
        assert_eq!(lookup.static_field(&math, "PI").unwrap().ty, ScriptType::double());

        let array_list = lookup.resolve_type("ArrayList").unwrap();
        assert!(lookup.constructor(&array_list, 0).is_some());
        let list = lookup.resolve_type("List").unwrap();
        assert!(lookup.constructor(&list, 0).is_none());
    }
}
