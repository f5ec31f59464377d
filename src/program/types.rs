//! Hash-consed Go types.
//!
//! Every structurally distinct type is stored once in a `TypeTable` and addressed by a
//! `TypeRef`, so type identity is `TypeRef` equality. Named types are the exception: each
//! declaration gets its own `NamedId`, and a named type with no type arguments is interned as
//! `TypeKind::Named { obj, args: [] }`.
//!
//! Anything the checker cannot resolve becomes `External` (a type from a package that was not
//! loaded, identified by path and name) or a fresh `Invalid`, which is identical to nothing.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use go_syntax::ast::ChanDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamedId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedComplex,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint => "uint",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Uintptr => "uintptr",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Complex64 => "complex64",
            Self::Complex128 => "complex128",
            Self::String => "string",
            Self::UnsafePointer => "unsafe.Pointer",
            Self::UntypedBool => "untyped bool",
            Self::UntypedInt => "untyped int",
            Self::UntypedRune => "untyped rune",
            Self::UntypedFloat => "untyped float",
            Self::UntypedComplex => "untyped complex",
            Self::UntypedString => "untyped string",
            Self::UntypedNil => "untyped nil",
        }
    }

    pub const fn is_untyped(self) -> bool {
        matches!(
            self,
            Self::UntypedBool
                | Self::UntypedInt
                | Self::UntypedRune
                | Self::UntypedFloat
                | Self::UntypedComplex
                | Self::UntypedString
                | Self::UntypedNil
        )
    }

    /// Type an untyped constant takes when nothing else constrains it.
    pub const fn default_type(self) -> Option<BasicKind> {
        Some(match self {
            Self::UntypedBool => Self::Bool,
            Self::UntypedInt => Self::Int,
            Self::UntypedRune => Self::Int32,
            Self::UntypedFloat => Self::Float64,
            Self::UntypedComplex => Self::Complex128,
            Self::UntypedString => Self::String,
            Self::UntypedNil => return None,
            typed => typed,
        })
    }

    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Int
                | Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::Uint
                | Self::Uint8
                | Self::Uint16
                | Self::Uint32
                | Self::Uint64
                | Self::Uintptr
                | Self::UntypedInt
                | Self::UntypedRune
        )
    }
}

/// Function type. Parameter names are not part of type identity and are not stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Vec<TypeRef>,
    pub results: Vec<TypeRef>,
    /// The last parameter is `...T`, stored as `[]T`.
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldInfo {
    pub name: String,
    pub typ: TypeRef,
    pub embedded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Basic(BasicKind),
    Named {
        obj: NamedId,
        args: Vec<TypeRef>,
    },
    Pointer(TypeRef),
    Slice(TypeRef),
    Array {
        len: Option<u64>,
        elem: TypeRef,
    },
    Map {
        key: TypeRef,
        val: TypeRef,
    },
    Chan {
        dir: ChanDir,
        elem: TypeRef,
    },
    Func(Signature),
    Struct(Vec<FieldInfo>),
    /// Explicit methods sorted by name; embedded interfaces are flattened on lookup.
    Interface {
        methods: Vec<(String, TypeRef)>,
        embeds: Vec<TypeRef>,
    },
    Tuple(Vec<TypeRef>),
    TypeParam {
        name: String,
        id: u32,
    },
    /// Named type from a package that was not loaded.
    External {
        path: String,
        name: String,
    },
    Invalid(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: String,
    pub sig: TypeRef,
    pub ptr_recv: bool,
}

#[derive(Debug, Clone)]
pub struct NamedInfo {
    /// Empty for universe types (`error`, `comparable`).
    pub pkg_path: String,
    pub name: String,
    pub underlying: Option<TypeRef>,
    pub methods: Vec<MethodDecl>,
    pub type_params: Vec<TypeRef>,
}

/// What a selector `x.name` denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    Field(TypeRef),
    /// Method declared on a named type.
    Method { sig: TypeRef, ptr_recv: bool },
    /// Method of an interface type (including one embedded in a struct).
    InterfaceMethod(TypeRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    pub member: Member,
    /// A pointer was dereferenced on the way to the member.
    pub indirect: bool,
    /// Embedding depth (0 for members of the type itself).
    pub depth: usize,
}

const MAX_CHAIN: usize = 64;

#[derive(Debug, Default)]
pub struct TypeTable {
    kinds: Vec<TypeKind>,
    index: HashMap<TypeKind, TypeRef>,
    named: Vec<NamedInfo>,
    fresh: u32,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, kind: TypeKind) -> TypeRef {
        if let Some(&t) = self.index.get(&kind) {
            return t;
        }
        let t = TypeRef(self.kinds.len() as u32);
        self.kinds.push(kind.clone());
        self.index.insert(kind, t);
        t
    }

    #[inline]
    pub fn kind(&self, t: TypeRef) -> &TypeKind {
        &self.kinds[t.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn basic(&mut self, kind: BasicKind) -> TypeRef {
        self.intern(TypeKind::Basic(kind))
    }

    pub fn pointer(&mut self, elem: TypeRef) -> TypeRef {
        self.intern(TypeKind::Pointer(elem))
    }

    pub fn slice(&mut self, elem: TypeRef) -> TypeRef {
        self.intern(TypeKind::Slice(elem))
    }

    pub fn tuple(&mut self, elems: Vec<TypeRef>) -> TypeRef {
        self.intern(TypeKind::Tuple(elems))
    }

    pub fn func(&mut self, sig: Signature) -> TypeRef {
        self.intern(TypeKind::Func(sig))
    }

    pub fn empty_interface(&mut self) -> TypeRef {
        self.intern(TypeKind::Interface {
            methods: Vec::new(),
            embeds: Vec::new(),
        })
    }

    /// A type identical to no other type.
    pub fn invalid(&mut self) -> TypeRef {
        self.fresh += 1;
        let n = self.fresh;
        self.intern(TypeKind::Invalid(n))
    }

    pub fn type_param(&mut self, name: &str) -> TypeRef {
        self.fresh += 1;
        let id = self.fresh;
        self.intern(TypeKind::TypeParam {
            name: name.to_owned(),
            id,
        })
    }

    /// Declares a new named type and returns it uninstantiated.
    pub fn new_named(&mut self, pkg_path: &str, name: &str) -> (NamedId, TypeRef) {
        let obj = NamedId(self.named.len() as u32);
        self.named.push(NamedInfo {
            pkg_path: pkg_path.to_owned(),
            name: name.to_owned(),
            underlying: None,
            methods: Vec::new(),
            type_params: Vec::new(),
        });
        let t = self.intern(TypeKind::Named {
            obj,
            args: Vec::new(),
        });
        (obj, t)
    }

    #[inline]
    pub fn named(&self, obj: NamedId) -> &NamedInfo {
        &self.named[obj.0 as usize]
    }

    #[inline]
    pub fn named_mut(&mut self, obj: NamedId) -> &mut NamedInfo {
        &mut self.named[obj.0 as usize]
    }

    /// The declaration behind a named type (instantiated or not).
    pub fn named_of(&self, t: TypeRef) -> Option<NamedId> {
        match self.kind(t) {
            TypeKind::Named { obj, .. } => Some(*obj),
            _ => None,
        }
    }

    /// Underlying type; `None` while a named type is still unresolved.
    pub fn underlying(&self, mut t: TypeRef) -> Option<TypeRef> {
        for _ in 0..MAX_CHAIN {
            match self.kind(t) {
                TypeKind::Named { obj, .. } => t = self.named(*obj).underlying?,
                _ => return Some(t),
            }
        }
        None
    }

    pub fn is_invalid(&self, t: TypeRef) -> bool {
        matches!(self.kind(t), TypeKind::Invalid(_))
    }

    pub fn is_untyped(&self, t: TypeRef) -> bool {
        matches!(self.kind(t), TypeKind::Basic(b) if b.is_untyped())
    }

    pub fn is_interface(&self, t: TypeRef) -> bool {
        self.underlying(t)
            .is_some_and(|u| matches!(self.kind(u), TypeKind::Interface { .. }))
    }

    /// Signature behind a function type, following named types.
    pub fn signature(&self, t: TypeRef) -> Option<&Signature> {
        match self.kind(self.underlying(t)?) {
            TypeKind::Func(sig) => Some(sig),
            _ => None,
        }
    }

    /// Replaces an untyped constant type by its default type.
    pub fn default_type(&mut self, t: TypeRef) -> Option<TypeRef> {
        match *self.kind(t) {
            TypeKind::Basic(b) => b.default_type().map(|d| self.basic(d)),
            _ => Some(t),
        }
    }

    /// Flattened method set of an interface type, sorted by name.
    pub fn interface_methods(&self, t: TypeRef) -> Vec<(String, TypeRef)> {
        let mut out: Vec<(String, TypeRef)> = Vec::new();
        let mut seen = HashSet::new();
        self.collect_interface_methods(t, &mut out, &mut seen);
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out.dedup_by(|a, b| a.0 == b.0);
        out
    }

    fn collect_interface_methods(
        &self,
        t: TypeRef,
        out: &mut Vec<(String, TypeRef)>,
        seen: &mut HashSet<TypeRef>,
    ) {
        let Some(u) = self.underlying(t) else {
            return;
        };
        if !seen.insert(u) {
            return;
        }
        if let TypeKind::Interface { methods, embeds } = self.kind(u) {
            out.extend(methods.iter().cloned());
            for &e in embeds {
                self.collect_interface_methods(e, out, seen);
            }
        }
    }

    /// Finds the field or method `name` of `t`, following Go's selector rules: a pointer to a
    /// named type is dereferenced once, embedded fields are searched breadth first, and a
    /// name found twice at the shallowest depth is ambiguous.
    pub fn lookup_field_or_method(&self, t: TypeRef, name: &str) -> Option<Lookup> {
        let (start, indirect) = match self.kind(t) {
            TypeKind::Pointer(elem) => (*elem, true),
            _ => (t, false),
        };
        if let TypeKind::Pointer(_) = self.kind(start) {
            return None;
        }

        let mut current = vec![(start, indirect)];
        let mut seen_named = HashSet::new();

        for depth in 0..MAX_CHAIN {
            let mut found: Option<Lookup> = None;
            let mut count = 0usize;
            let mut next = Vec::new();

            for (typ, ind) in current {
                let mut typ = typ;
                if let Some(obj) = self.named_of(typ) {
                    if !seen_named.insert(obj) {
                        continue;
                    }
                    if let Some(m) = self.named(obj).methods.iter().find(|m| m.name == name) {
                        count += 1;
                        found = Some(Lookup {
                            member: Member::Method {
                                sig: m.sig,
                                ptr_recv: m.ptr_recv,
                            },
                            indirect: ind,
                            depth,
                        });
                        continue;
                    }
                    match self.underlying(typ) {
                        Some(u) => typ = u,
                        None => continue,
                    }
                }

                match self.kind(typ) {
                    TypeKind::Struct(fields) => {
                        for f in fields {
                            if f.name == name {
                                count += 1;
                                found = Some(Lookup {
                                    member: Member::Field(f.typ),
                                    indirect: ind,
                                    depth,
                                });
                            }
                            if f.embedded {
                                match self.kind(f.typ) {
                                    TypeKind::Pointer(elem) => next.push((*elem, true)),
                                    _ => next.push((f.typ, ind)),
                                }
                            }
                        }
                    }
                    TypeKind::Interface { .. } => {
                        if let Some((_, sig)) = self
                            .interface_methods(typ)
                            .into_iter()
                            .find(|(m, _)| m == name)
                        {
                            count += 1;
                            found = Some(Lookup {
                                member: Member::InterfaceMethod(sig),
                                indirect: ind,
                                depth,
                            });
                        }
                    }
                    _ => {}
                }
            }

            match count {
                0 if next.is_empty() => return None,
                0 => current = next,
                1 => return found,
                _ => return None,
            }
        }
        None
    }

    /// First interface method `t` lacks (or has with a different signature).
    pub fn missing_method(&self, t: TypeRef, iface: TypeRef) -> Option<String> {
        let wanted = self.interface_methods(iface);

        if self.is_interface(t) {
            let have = self.interface_methods(t);
            return wanted
                .into_iter()
                .find(|(name, sig)| !have.iter().any(|(n, s)| n == name && s == sig))
                .map(|(name, _)| name);
        }
        if matches!(
            self.kind(t),
            TypeKind::TypeParam { .. } | TypeKind::External { .. } | TypeKind::Invalid(_)
        ) {
            return wanted.into_iter().next().map(|(name, _)| name);
        }

        wanted
            .into_iter()
            .find(|(name, sig)| {
                let ok = match self.lookup_field_or_method(t, name) {
                    Some(Lookup {
                        member: Member::Method { sig: s, ptr_recv },
                        indirect,
                        ..
                    }) => s == *sig && (!ptr_recv || indirect),
                    Some(Lookup {
                        member: Member::InterfaceMethod(s),
                        ..
                    }) => s == *sig,
                    _ => false,
                };
                !ok
            })
            .map(|(name, _)| name)
    }

    /// Whether the method set of `t` contains every method of interface `iface`.
    pub fn implements(&self, t: TypeRef, iface: TypeRef) -> bool {
        self.is_interface(iface) && self.missing_method(t, iface).is_none()
    }

    /// Type string in the form of Go's `types.TypeString` with full package paths.
    pub fn type_string(&self, t: TypeRef) -> String {
        let mut out = String::new();
        self.write_type(&mut out, t, 0);
        out
    }

    fn write_type(&self, out: &mut String, t: TypeRef, depth: usize) {
        if depth > MAX_CHAIN {
            out.push_str("...");
            return;
        }
        let d = depth + 1;
        match self.kind(t) {
            TypeKind::Basic(b) => out.push_str(b.name()),
            TypeKind::Named { obj, args } => {
                let info = self.named(*obj);
                if !info.pkg_path.is_empty() {
                    out.push_str(&info.pkg_path);
                    out.push('.');
                }
                out.push_str(&info.name);
                if !args.is_empty() {
                    out.push('[');
                    self.write_list(out, args, d);
                    out.push(']');
                }
            }
            TypeKind::Pointer(elem) => {
                out.push('*');
                self.write_type(out, *elem, d);
            }
            TypeKind::Slice(elem) => {
                out.push_str("[]");
                self.write_type(out, *elem, d);
            }
            TypeKind::Array { len, elem } => {
                match len {
                    Some(n) => {
                        let _ = write!(out, "[{n}]");
                    }
                    None => out.push_str("[?]"),
                }
                self.write_type(out, *elem, d);
            }
            TypeKind::Map { key, val } => {
                out.push_str("map[");
                self.write_type(out, *key, d);
                out.push(']');
                self.write_type(out, *val, d);
            }
            TypeKind::Chan { dir, elem } => {
                out.push_str(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                self.write_type(out, *elem, d);
            }
            TypeKind::Func(sig) => {
                out.push_str("func");
                self.write_signature(out, sig, d);
            }
            TypeKind::Struct(fields) => {
                out.push_str("struct{");
                for (i, f) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    if !f.embedded {
                        out.push_str(&f.name);
                        out.push(' ');
                    }
                    self.write_type(out, f.typ, d);
                }
                out.push('}');
            }
            TypeKind::Interface { methods, embeds } => {
                if methods.is_empty() && embeds.is_empty() {
                    out.push_str("any");
                    return;
                }
                out.push_str("interface{");
                let mut first = true;
                for &e in embeds {
                    if !first {
                        out.push_str("; ");
                    }
                    first = false;
                    self.write_type(out, e, d);
                }
                for (name, sig) in methods {
                    if !first {
                        out.push_str("; ");
                    }
                    first = false;
                    out.push_str(name);
                    match self.kind(*sig) {
                        TypeKind::Func(s) => self.write_signature(out, s, d),
                        _ => self.write_type(out, *sig, d),
                    }
                }
                out.push('}');
            }
            TypeKind::Tuple(elems) => {
                out.push('(');
                self.write_list(out, elems, d);
                out.push(')');
            }
            TypeKind::TypeParam { name, .. } => out.push_str(name),
            TypeKind::External { path, name } => {
                out.push_str(path);
                out.push('.');
                out.push_str(name);
            }
            TypeKind::Invalid(_) => out.push_str("invalid type"),
        }
    }

    fn write_list(&self, out: &mut String, list: &[TypeRef], depth: usize) {
        for (i, &t) in list.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_type(out, t, depth);
        }
    }

    fn write_signature(&self, out: &mut String, sig: &Signature, depth: usize) {
        out.push('(');
        for (i, &p) in sig.params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let last = i + 1 == sig.params.len();
            match self.kind(p) {
                TypeKind::Slice(elem) if sig.variadic && last => {
                    out.push_str("...");
                    self.write_type(out, *elem, depth);
                }
                _ => self.write_type(out, p, depth),
            }
        }
        out.push(')');
        match sig.results.as_slice() {
            [] => {}
            [one] => {
                out.push(' ');
                self.write_type(out, *one, depth);
            }
            many => {
                out.push_str(" (");
                self.write_list(out, many, depth);
                out.push(')');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(t: &mut TypeTable, params: Vec<TypeRef>, results: Vec<TypeRef>) -> TypeRef {
        t.func(Signature {
            params,
            results,
            variadic: false,
        })
    }

    /// `type Wibbler interface { Wibble(int) int }` plus a value-receiver implementation.
    fn wibbler(t: &mut TypeTable) -> (TypeRef, TypeRef, TypeRef) {
        let int = t.basic(BasicKind::Int);
        let wibble = sig(t, vec![int], vec![int]);

        let (iface_obj, iface) = t.new_named("example.com/m/example", "Wibbler");
        let under = t.intern(TypeKind::Interface {
            methods: vec![("Wibble".into(), wibble)],
            embeds: vec![],
        });
        t.named_mut(iface_obj).underlying = Some(under);

        let (client_obj, client) = t.new_named("example.com/m/example", "WibbleClient");
        let empty = t.intern(TypeKind::Struct(vec![]));
        t.named_mut(client_obj).underlying = Some(empty);
        t.named_mut(client_obj).methods.push(MethodDecl {
            name: "Wibble".into(),
            sig: wibble,
            ptr_recv: false,
        });
        (iface, client, wibble)
    }

    #[test]
    fn interning_gives_identity() {
        let mut t = TypeTable::new();
        let a = t.basic(BasicKind::Int);
        let b = t.basic(BasicKind::Int);
        assert_eq!(a, b);
        let s1 = t.slice(a);
        let s2 = t.slice(b);
        assert_eq!(s1, s2);
        assert_ne!(t.invalid(), t.invalid());
    }

    #[test]
    fn type_strings() {
        let mut t = TypeTable::new();
        let (_, ctx) = t.new_named("context", "Context");
        let int = t.basic(BasicKind::Int);
        let string = t.basic(BasicKind::String);
        let p = t.pointer(ctx);
        assert_eq!(t.type_string(ctx), "context.Context");
        assert_eq!(t.type_string(p), "*context.Context");

        let m = t.intern(TypeKind::Map { key: string, val: int });
        assert_eq!(t.type_string(m), "map[string]int");

        let strs = t.slice(string);
        let f = t.func(Signature {
            params: vec![int, strs],
            results: vec![int, string],
            variadic: true,
        });
        assert_eq!(t.type_string(f), "func(int, ...string) (int, string)");

        let nil = t.basic(BasicKind::UntypedNil);
        assert_eq!(t.type_string(nil), "untyped nil");
        let ch = t.intern(TypeKind::Chan {
            dir: ChanDir::Recv,
            elem: int,
        });
        assert_eq!(t.type_string(ch), "<-chan int");
    }

    #[test]
    fn value_receiver_methods_implement() {
        let mut t = TypeTable::new();
        let (iface, client, _) = wibbler(&mut t);
        assert!(t.implements(client, iface));
        let ptr = t.pointer(client);
        assert!(t.implements(ptr, iface));
    }

    #[test]
    fn pointer_receiver_methods_need_pointer() {
        let mut t = TypeTable::new();
        let (iface, client, _) = wibbler(&mut t);
        let obj = t.named_of(client).unwrap();
        t.named_mut(obj).methods[0].ptr_recv = true;
        assert!(!t.implements(client, iface));
        let ptr = t.pointer(client);
        assert!(t.implements(ptr, iface));
    }

    #[test]
    fn signatures_must_be_identical() {
        let mut t = TypeTable::new();
        let (iface, client, _) = wibbler(&mut t);
        let string = t.basic(BasicKind::String);
        let other = sig(&mut t, vec![string], vec![]);
        let obj = t.named_of(client).unwrap();
        t.named_mut(obj).methods[0].sig = other;
        assert_eq!(t.missing_method(client, iface).as_deref(), Some("Wibble"));
    }

    #[test]
    fn embedded_methods_are_promoted() {
        let mut t = TypeTable::new();
        let (iface, client, wibble) = wibbler(&mut t);
        let (wrapper_obj, wrapper) = t.new_named("example.com/m/example", "Wrapper");
        let st = t.intern(TypeKind::Struct(vec![FieldInfo {
            name: "WibbleClient".into(),
            typ: client,
            embedded: true,
        }]));
        t.named_mut(wrapper_obj).underlying = Some(st);

        let found = t.lookup_field_or_method(wrapper, "Wibble").unwrap();
        assert_eq!(found.depth, 1);
        assert_eq!(
            found.member,
            Member::Method {
                sig: wibble,
                ptr_recv: false
            }
        );
        assert!(t.implements(wrapper, iface));
        assert!(t.lookup_field_or_method(wrapper, "Wobble").is_none());
    }

    #[test]
    fn same_depth_duplicates_are_ambiguous() {
        let mut t = TypeTable::new();
        let (_, a, _) = wibbler(&mut t);
        let (b_obj, b) = t.new_named("p", "B");
        let empty = t.intern(TypeKind::Struct(vec![]));
        t.named_mut(b_obj).underlying = Some(empty);
        let int = t.basic(BasicKind::Int);
        let wibble = sig(&mut t, vec![int], vec![int]);
        t.named_mut(b_obj).methods.push(MethodDecl {
            name: "Wibble".into(),
            sig: wibble,
            ptr_recv: false,
        });
        let st = t.intern(TypeKind::Struct(vec![
            FieldInfo {
                name: "WibbleClient".into(),
                typ: a,
                embedded: true,
            },
            FieldInfo {
                name: "B".into(),
                typ: b,
                embedded: true,
            },
        ]));
        assert!(t.lookup_field_or_method(st, "Wibble").is_none());
    }

    #[test]
    fn embedded_interfaces_are_flattened() {
        let mut t = TypeTable::new();
        let (iface, _, wibble) = wibbler(&mut t);
        let close = sig(&mut t, vec![], vec![]);
        let outer = t.intern(TypeKind::Interface {
            methods: vec![("Close".into(), close)],
            embeds: vec![iface],
        });
        let names: Vec<_> = t.interface_methods(outer).into_iter().collect();
        assert_eq!(
            names,
            vec![("Close".to_string(), close), ("Wibble".to_string(), wibble)]
        );
        assert!(t.implements(outer, iface));
        assert!(!t.implements(iface, outer));
    }
}
