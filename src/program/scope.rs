//! Declared objects and the scopes that hold them.

use std::collections::HashMap;

use super::types::{BasicKind, Signature, TypeKind, TypeRef, TypeTable};
use super::PackageId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Append,
    Cap,
    Clear,
    Close,
    Complex,
    Copy,
    Delete,
    Imag,
    Len,
    Make,
    Max,
    Min,
    New,
    Panic,
    Print,
    Println,
    Real,
    Recover,
}

/// What a name in scope denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Object {
    TypeName(TypeRef),
    Var(TypeRef),
    /// Constant; its type may be untyped.
    Const(TypeRef),
    Func(TypeRef),
    /// Imported package; `None` when the import was not loaded.
    PkgName(Option<PackageId>),
    Builtin(Builtin),
    Nil,
}

#[derive(Debug, Clone, Default)]
pub struct Scope {
    objects: HashMap<String, Object>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn lookup(&self, name: &str) -> Option<Object> {
        self.objects.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// Declares `name`; the blank identifier is never declared.
    pub fn insert(&mut self, name: &str, obj: Object) {
        if name != "_" {
            self.objects.insert(name.to_owned(), obj);
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.objects.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// An imported package as seen from one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub path: String,
    pub pkg: Option<PackageId>,
}

/// Names visible in one file beyond its package scope: the imports.
#[derive(Debug, Clone, Default)]
pub struct FileScope {
    pub imports: HashMap<String, ImportBinding>,
    pub dot_imports: Vec<PackageId>,
}

/// Builds the universe scope: predeclared types, constants, `nil` and builtins.
pub fn universe(types: &mut TypeTable) -> Scope {
    use BasicKind::*;

    let mut scope = Scope::new();
    for kind in [
        Bool, Int, Int8, Int16, Int32, Int64, Uint, Uint8, Uint16, Uint32, Uint64, Uintptr,
        Float32, Float64, Complex64, Complex128, String,
    ] {
        let t = types.basic(kind);
        scope.insert(kind.name(), Object::TypeName(t));
    }
    let byte = types.basic(Uint8);
    let rune = types.basic(Int32);
    scope.insert("byte", Object::TypeName(byte));
    scope.insert("rune", Object::TypeName(rune));

    let any = types.empty_interface();
    scope.insert("any", Object::TypeName(any));

    let string = types.basic(String);
    let error_sig = types.func(Signature {
        params: Vec::new(),
        results: vec![string],
        variadic: false,
    });
    let (error_obj, error) = types.new_named("", "error");
    let error_under = types.intern(TypeKind::Interface {
        methods: vec![("Error".to_owned(), error_sig)],
        embeds: Vec::new(),
    });
    types.named_mut(error_obj).underlying = Some(error_under);
    scope.insert("error", Object::TypeName(error));

    let (comparable_obj, comparable) = types.new_named("", "comparable");
    types.named_mut(comparable_obj).underlying = Some(any);
    scope.insert("comparable", Object::TypeName(comparable));

    let untyped_bool = types.basic(UntypedBool);
    let untyped_int = types.basic(UntypedInt);
    scope.insert("true", Object::Const(untyped_bool));
    scope.insert("false", Object::Const(untyped_bool));
    scope.insert("iota", Object::Const(untyped_int));
    scope.insert("nil", Object::Nil);

    for (name, b) in [
        ("append", Builtin::Append),
        ("cap", Builtin::Cap),
        ("clear", Builtin::Clear),
        ("close", Builtin::Close),
        ("complex", Builtin::Complex),
        ("copy", Builtin::Copy),
        ("delete", Builtin::Delete),
        ("imag", Builtin::Imag),
        ("len", Builtin::Len),
        ("make", Builtin::Make),
        ("max", Builtin::Max),
        ("min", Builtin::Min),
        ("new", Builtin::New),
        ("panic", Builtin::Panic),
        ("print", Builtin::Print),
        ("println", Builtin::Println),
        ("real", Builtin::Real),
        ("recover", Builtin::Recover),
    ] {
        scope.insert(name, Object::Builtin(b));
    }
    scope
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn universe_has_error_with_error_method() {
        let mut types = TypeTable::new();
        let u = universe(&mut types);
        let Some(Object::TypeName(error)) = u.lookup("error") else {
            panic!("error not declared");
        };
        assert_eq!(types.type_string(error), "error");
        let methods = types.interface_methods(error);
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].0, "Error");
        assert_eq!(u.lookup("byte"), u.lookup("uint8"));
    }

    #[test]
    fn blank_is_never_declared() {
        let mut s = Scope::new();
        s.insert("_", Object::Nil);
        assert!(s.is_empty());
    }
}
