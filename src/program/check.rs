//! Best-effort Go type checker.
//!
//! Runs in phases over every loaded package:
//!
//! 1. declare type names in package scopes
//! 2. resolve aliases, underlying types, method declarations and function signatures
//! 3. infer package-level variables declared without a type (two passes, so one initializer
//!    may depend on another declared later)
//! 4. check function bodies of root packages, recording expression types and selections
//!
//! Whatever cannot be resolved is left out of `TypeInfo`, or typed as a fresh invalid type
//! so that it shadows outer names without matching anything.

use std::collections::HashMap;
use std::mem;

use go_syntax::ast::{
    ArrayLen, AstArena, BasicLit, BasicLitKind, BinaryOp, CommClause, CommStmt, Decl, DeclId,
    Element, Expr, ExprId, ExprOrType, FieldId, ForKind, FuncDeclId, GenDeclKind, IdentName,
    ImportName, InterfaceElem, ListRef, LiteralValue, RangeLhs, Results, SignatureId, SimpleStmt,
    SimpleStmtId, Spec, Stmt, StmtId, SwitchClause, TopLevelDecl, Type, TypeCaseElem, TypeId,
    TypeParamsId, TypeSpec, TypeTerm, UnaryOp, ValueSpec,
};

use super::scope::{universe, Builtin, FileScope, ImportBinding, Object, Scope};
use super::types::{
    BasicKind, FieldInfo, Member, MethodDecl, NamedId, Signature, TypeKind, TypeRef, TypeTable,
};
use super::{
    guess_package_name, NodeRef, Package, PackageId, PackageKind, Program, Selection,
    SelectionKind, SourceUnit, TypeInfo, UnitId,
};

pub(super) fn check(prog: &mut Program) {
    let Program {
        packages,
        units,
        types,
        info,
        ..
    } = prog;

    let scopes: Vec<Scope> = packages.iter_mut().map(|p| mem::take(&mut p.scope)).collect();
    let mut ck = Checker::new(packages, units, types, info, scopes);
    ck.run();
    let scopes = ck.scopes;

    for (pkg, scope) in packages.iter_mut().zip(scopes) {
        pkg.scope = scope;
    }
}

/// What an expression denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    Value(TypeRef),
    Type(TypeRef),
    Package(PackageId),
    Builtin(Builtin),
    Nil,
}

/// Lookup context: a file, its package and the enclosing local scopes.
struct Env {
    unit: UnitId,
    pkg: PackageId,
    locals: Vec<Scope>,
    record: bool,
}

impl Env {
    fn new(unit: UnitId, pkg: PackageId, record: bool) -> Self {
        Self {
            unit,
            pkg,
            locals: Vec::new(),
            record,
        }
    }

    fn push(&mut self) {
        self.locals.push(Scope::new());
    }

    fn pop(&mut self) {
        self.locals.pop();
    }

    fn declare(&mut self, name: &str, obj: Object) {
        if let Some(top) = self.locals.last_mut() {
            top.insert(name, obj);
        }
    }

    fn declared_here(&self, name: &str) -> bool {
        self.locals.last().is_some_and(|s| s.contains(name))
    }
}

struct TypeDeclItem {
    unit: UnitId,
    spec: TypeSpec,
    obj: NamedId,
}

struct AliasItem {
    unit: UnitId,
    spec: TypeSpec,
}

/// A const or var spec after implicit repetition of const groups.
#[derive(Clone, Copy)]
struct ValueItem {
    unit: UnitId,
    spec: ValueSpec,
    is_const: bool,
}

#[derive(Default)]
struct Decls {
    types: Vec<TypeDeclItem>,
    aliases: Vec<AliasItem>,
    funcs: Vec<(UnitId, FuncDeclId)>,
    values: Vec<ValueItem>,
}

struct Checker<'p> {
    packages: &'p [Package],
    units: &'p [SourceUnit],
    by_path: HashMap<&'p str, PackageId>,
    types: &'p mut TypeTable,
    info: &'p mut TypeInfo,
    universe: Scope,
    scopes: Vec<Scope>,
    files: Vec<FileScope>,
}

impl<'p> Checker<'p> {
    fn new(
        packages: &'p [Package],
        units: &'p [SourceUnit],
        types: &'p mut TypeTable,
        info: &'p mut TypeInfo,
        scopes: Vec<Scope>,
    ) -> Self {
        let universe = universe(types);
        let by_path = packages
            .iter()
            .enumerate()
            .map(|(i, p)| (p.path.as_str(), PackageId(i as u32)))
            .collect();
        Self {
            packages,
            units,
            by_path,
            types,
            info,
            universe,
            scopes,
            files: Vec::new(),
        }
    }

    fn run(&mut self) {
        self.build_file_scopes();
        let decls = self.declare_type_names();
        self.resolve_aliases(&decls.aliases);
        self.resolve_named_types(&decls.types);
        self.declare_funcs(&decls.funcs);
        let untyped = self.declare_typed_values(&decls.values);
        self.infer_values(&untyped, false);
        self.infer_values(&untyped, true);
        self.check_bodies(&decls);
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[inline]
    fn unit(&self, id: UnitId) -> &'p SourceUnit {
        &self.units[id.0 as usize]
    }

    #[inline]
    fn arena(&self, id: UnitId) -> &'p AstArena {
        &self.unit(id).tree.arena
    }

    #[inline]
    fn name(&self, unit: UnitId, ident: IdentName) -> &'p str {
        self.unit(unit).tree.interner.resolve(ident.sym)
    }

    fn is_root(&self, pkg: PackageId) -> bool {
        self.packages[pkg.0 as usize].kind == PackageKind::Root
    }

    fn basic(&mut self, kind: BasicKind) -> TypeRef {
        self.types.basic(kind)
    }

    fn lookup(&self, env: &Env, name: &str) -> Option<Object> {
        if name == "_" {
            return None;
        }
        for scope in env.locals.iter().rev() {
            if let Some(obj) = scope.lookup(name) {
                return Some(obj);
            }
        }
        let file = &self.files[env.unit.0 as usize];
        if let Some(binding) = file.imports.get(name) {
            return Some(Object::PkgName(binding.pkg));
        }
        if let Some(obj) = self.scopes[env.pkg.0 as usize].lookup(name) {
            return Some(obj);
        }
        for &p in &file.dot_imports {
            if let Some(obj) = self.scopes[p.0 as usize].lookup(name) {
                return Some(obj);
            }
        }
        self.universe.lookup(name)
    }

    // -------------------------------------------------------------------------
    // Phase 0: imports
    // -------------------------------------------------------------------------

    fn build_file_scopes(&mut self) {
        let mut files = Vec::with_capacity(self.units.len());
        for unit in self.units {
            let mut fs = FileScope::default();
            for (path, name) in unit.imports() {
                let pkg = self.by_path.get(path).copied();
                let binding = ImportBinding {
                    path: path.to_owned(),
                    pkg,
                };
                match name {
                    Some(ImportName::Blank(_)) => {}
                    Some(ImportName::Dot(_)) => fs.dot_imports.extend(pkg),
                    Some(ImportName::Name(alias)) => {
                        let local = unit.tree.interner.resolve(alias.sym).to_owned();
                        fs.imports.insert(local, binding);
                    }
                    None => {
                        let local = match pkg {
                            Some(p) => self.packages[p.0 as usize].name.clone(),
                            None => guess_package_name(path),
                        };
                        fs.imports.insert(local, binding);
                    }
                }
            }
            files.push(fs);
        }
        self.files = files;
    }

    // -------------------------------------------------------------------------
    // Phase 1: type names
    // -------------------------------------------------------------------------

    fn declare_type_names(&mut self) -> Decls {
        let mut decls = Decls::default();
        let packages = self.packages;
        for (pi, pkg) in packages.iter().enumerate() {
            for &u in &pkg.units {
                let a = self.arena(u);
                let file = self.unit(u).tree.file;
                for top in a.top_decls(file.decls) {
                    let did = match *top {
                        TopLevelDecl::Func(fid) => {
                            decls.funcs.push((u, fid));
                            continue;
                        }
                        TopLevelDecl::Decl(did) => did,
                    };
                    let Decl::Gen(g) = a.decls[did] else {
                        continue;
                    };
                    match g.kind {
                        GenDeclKind::Import => {}
                        GenDeclKind::Type => {
                            for spec in a.specs_list(g.specs) {
                                let Spec::Type(ts) = *spec else { continue };
                                if ts.alias {
                                    decls.aliases.push(AliasItem { unit: u, spec: ts });
                                    continue;
                                }
                                let name = self.name(u, ts.name);
                                let (obj, t) = self.types.new_named(&pkg.path, name);
                                self.scopes[pi].insert(name, Object::TypeName(t));
                                decls.types.push(TypeDeclItem {
                                    unit: u,
                                    spec: ts,
                                    obj,
                                });
                            }
                        }
                        GenDeclKind::Const | GenDeclKind::Var => {
                            let is_const = g.kind == GenDeclKind::Const;
                            decls
                                .values
                                .extend(value_items(a, g.specs, is_const).map(|spec| ValueItem {
                                    unit: u,
                                    spec,
                                    is_const,
                                }));
                        }
                    }
                }
            }
        }
        decls
    }

    // -------------------------------------------------------------------------
    // Phase 2: aliases, named types, methods, functions, typed values
    // -------------------------------------------------------------------------

    fn resolve_aliases(&mut self, aliases: &[AliasItem]) {
        let mut pending: Vec<&AliasItem> = aliases.iter().collect();
        loop {
            let before = pending.len();
            let mut still = Vec::new();
            for item in pending {
                let pkg = self.unit(item.unit).package;
                let mut env = Env::new(item.unit, pkg, false);
                let t = self.resolve_type(&mut env, item.spec.typ);
                if self.types.is_invalid(t) {
                    still.push(item);
                } else {
                    let name = self.name(item.unit, item.spec.name);
                    self.scopes[pkg.0 as usize].insert(name, Object::TypeName(t));
                }
            }
            pending = still;
            if pending.is_empty() || pending.len() == before {
                break;
            }
        }
    }

    fn resolve_named_types(&mut self, items: &[TypeDeclItem]) {
        for item in items {
            let pkg = self.unit(item.unit).package;
            let mut env = Env::new(item.unit, pkg, false);
            env.push();
            if let Some(tp) = item.spec.type_params {
                let params = self.declare_type_params(&mut env, tp);
                self.types.named_mut(item.obj).type_params = params;
            }
            let t = self.resolve_type(&mut env, item.spec.typ);
            self.types.named_mut(item.obj).underlying = Some(t);
        }
    }

    fn declare_funcs(&mut self, funcs: &[(UnitId, FuncDeclId)]) {
        for &(u, fid) in funcs {
            let pkg = self.unit(u).package;
            let f = self.arena(u).funcs[fid];
            let name = self.name(u, f.name);
            let mut env = Env::new(u, pkg, false);
            env.push();

            match f.recv {
                Some(recv) => {
                    let Some((obj, ptr_recv)) = self.receiver_base(u, pkg, recv.typ) else {
                        continue;
                    };
                    self.bind_receiver_type_params(&mut env, obj, recv.type_params);
                    let sig = self.signature(&mut env, f.signature);
                    if name != "_" {
                        self.types.named_mut(obj).methods.push(MethodDecl {
                            name: name.to_owned(),
                            sig,
                            ptr_recv,
                        });
                    }
                }
                None => {
                    if let Some(tp) = f.type_params {
                        self.declare_type_params(&mut env, tp);
                    }
                    let sig = self.signature(&mut env, f.signature);
                    if name != "init" {
                        self.scopes[pkg.0 as usize].insert(name, Object::Func(sig));
                    }
                }
            }
        }
    }

    /// Named type a method is declared on, and whether the receiver is a pointer.
    fn receiver_base(&self, u: UnitId, pkg: PackageId, typ: TypeId) -> Option<(NamedId, bool)> {
        let a = self.arena(u);
        let mut t = typ;
        let mut ptr = false;
        loop {
            match a.types[t] {
                Type::Paren { typ } => t = typ,
                Type::Pointer { elem } => {
                    ptr = true;
                    t = elem;
                }
                Type::Named {
                    pkg: None, name, ..
                } => {
                    let Object::TypeName(named) =
                        self.scopes[pkg.0 as usize].lookup(self.name(u, name))?
                    else {
                        return None;
                    };
                    return self.types.named_of(named).map(|obj| (obj, ptr));
                }
                _ => return None,
            }
        }
    }

    fn bind_receiver_type_params(&mut self, env: &mut Env, obj: NamedId, names: ListRef<IdentName>) {
        let a = self.arena(env.unit);
        for (i, &ident) in a.ident_names(names).iter().enumerate() {
            let name = self.name(env.unit, ident);
            let t = match self.types.named(obj).type_params.get(i) {
                Some(&t) => t,
                None => self.types.type_param(name),
            };
            env.declare(name, Object::TypeName(t));
        }
    }

    fn declare_type_params(&mut self, env: &mut Env, id: TypeParamsId) -> Vec<TypeRef> {
        let a = self.arena(env.unit);
        let mut out = Vec::new();
        for decl in a.type_param_decls(a.type_params[id].params) {
            for &ident in a.ident_names(decl.names) {
                let name = self.name(env.unit, ident);
                let t = self.types.type_param(name);
                env.declare(name, Object::TypeName(t));
                out.push(t);
            }
        }
        out
    }

    /// Declares values with an explicit type; returns the rest for inference.
    fn declare_typed_values(&mut self, items: &[ValueItem]) -> Vec<ValueItem> {
        let mut untyped = Vec::new();
        for item in items {
            let Some(typ) = item.spec.typ else {
                untyped.push(*item);
                continue;
            };
            let pkg = self.unit(item.unit).package;
            let mut env = Env::new(item.unit, pkg, false);
            let t = self.resolve_type(&mut env, typ);
            let a = self.arena(item.unit);
            for &ident in a.ident_names(item.spec.names) {
                let obj = if item.is_const {
                    Object::Const(t)
                } else {
                    Object::Var(t)
                };
                let name = self.name(item.unit, ident);
                self.scopes[pkg.0 as usize].insert(name, obj);
            }
        }
        untyped
    }

    // -------------------------------------------------------------------------
    // Phase 3: package-level inference
    // -------------------------------------------------------------------------

    fn infer_values(&mut self, items: &[ValueItem], last_pass: bool) {
        for item in items {
            let pkg = self.unit(item.unit).package;
            let record = last_pass && self.is_root(pkg);
            let mut env = Env::new(item.unit, pkg, record);
            let a = self.arena(item.unit);
            let names = a.ident_names(item.spec.names);
            let inferred = self.value_types(&mut env, names.len(), item.spec.values, !item.is_const);

            for (&ident, t) in names.iter().zip(inferred) {
                let t = match t {
                    Some(t) => t,
                    None if last_pass => self.types.invalid(),
                    None => continue,
                };
                let obj = if item.is_const {
                    Object::Const(t)
                } else {
                    Object::Var(t)
                };
                let name = self.name(item.unit, ident);
                self.scopes[pkg.0 as usize].insert(name, obj);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Phase 4: bodies
    // -------------------------------------------------------------------------

    fn check_bodies(&mut self, decls: &Decls) {
        for item in &decls.values {
            let pkg = self.unit(item.unit).package;
            if !self.is_root(pkg) || item.spec.typ.is_none() {
                continue;
            }
            let mut env = Env::new(item.unit, pkg, true);
            for &v in self.arena(item.unit).exprs_list(item.spec.values) {
                self.expr(&mut env, v);
            }
        }
        for &(u, fid) in &decls.funcs {
            let pkg = self.unit(u).package;
            if self.is_root(pkg) {
                self.func_body(u, pkg, fid);
            }
        }
    }

    fn func_body(&mut self, u: UnitId, pkg: PackageId, fid: FuncDeclId) {
        let a = self.arena(u);
        let f = a.funcs[fid];
        let Some(body) = f.body else {
            return;
        };

        let mut env = Env::new(u, pkg, true);
        env.push();
        if let Some(recv) = f.recv {
            if let Some((obj, _)) = self.receiver_base(u, pkg, recv.typ) {
                self.bind_receiver_type_params(&mut env, obj, recv.type_params);
            }
            let t = self.resolve_type(&mut env, recv.typ);
            if let Some(name) = recv.name {
                env.declare(self.name(u, name), Object::Var(t));
            }
        }
        if let Some(tp) = f.type_params {
            self.declare_type_params(&mut env, tp);
        }
        self.declare_signature_names(&mut env, f.signature);
        self.stmt_list(&mut env, body.stmts);
    }

    fn declare_signature_names(&mut self, env: &mut Env, sid: SignatureId) {
        let sig = self.arena(env.unit).signatures[sid];
        self.declare_fields(env, sig.params.fields);
        if let Some(Results::Params(results)) = sig.results {
            self.declare_fields(env, results.fields);
        }
    }

    fn declare_fields(&mut self, env: &mut Env, fields: ListRef<FieldId>) {
        let a = self.arena(env.unit);
        for &fid in a.fields_list(fields) {
            let f = a.fields[fid];
            let mut t = self.resolve_type(env, f.typ);
            if f.ellipsis_pos.is_some() {
                t = self.types.slice(t);
            }
            for &ident in a.ident_names(f.names) {
                env.declare(self.name(env.unit, ident), Object::Var(t));
            }
        }
    }

    // -------------------------------------------------------------------------
    // Types
    // -------------------------------------------------------------------------

    fn resolve_type(&mut self, env: &mut Env, id: TypeId) -> TypeRef {
        let a = self.arena(env.unit);
        match a.types[id] {
            Type::Named { pkg, name, args } => {
                let base = match pkg {
                    Some(pkg) => self.qualified_type(env, pkg, name),
                    None => match self.lookup(env, self.name(env.unit, name)) {
                        Some(Object::TypeName(t)) => Some(t),
                        _ => None,
                    },
                };
                let Some(base) = base else {
                    return self.types.invalid();
                };
                if args.is_empty() {
                    return base;
                }
                let args: Vec<TypeRef> = a
                    .types_list(args)
                    .iter()
                    .map(|&t| self.resolve_type(env, t))
                    .collect();
                self.instantiate(base, args)
            }
            Type::Pointer { elem } => {
                let elem = self.resolve_type(env, elem);
                self.types.pointer(elem)
            }
            Type::Array { len, elem } => {
                let len = match len {
                    ArrayLen::Expr(e) => const_int(a, &self.unit(env.unit).src, e),
                    ArrayLen::Ellipsis => None,
                };
                let elem = self.resolve_type(env, elem);
                self.types.intern(TypeKind::Array { len, elem })
            }
            Type::Slice { elem } => {
                let elem = self.resolve_type(env, elem);
                self.types.slice(elem)
            }
            Type::Map { key, val } => {
                let key = self.resolve_type(env, key);
                let val = self.resolve_type(env, val);
                self.types.intern(TypeKind::Map { key, val })
            }
            Type::Chan { dir, elem } => {
                let elem = self.resolve_type(env, elem);
                self.types.intern(TypeKind::Chan { dir, elem })
            }
            Type::Struct { fields } => self.struct_type(env, fields),
            Type::Interface { elems } => {
                let mut methods = Vec::new();
                let mut embeds = Vec::new();
                for elem in a.interface_elems(elems) {
                    match *elem {
                        InterfaceElem::Method { name, sig } => {
                            let sig = self.signature(env, sig);
                            methods.push((self.name(env.unit, name).to_owned(), sig));
                        }
                        InterfaceElem::TypeElem(te) => {
                            if let [TypeTerm::Type { typ }] = a.type_terms(te.terms) {
                                let t = self.resolve_type(env, *typ);
                                embeds.push(t);
                            }
                        }
                    }
                }
                methods.sort_by(|x, y| x.0.cmp(&y.0));
                self.types.intern(TypeKind::Interface { methods, embeds })
            }
            Type::Func { sig } => self.signature(env, sig),
            Type::Paren { typ } => self.resolve_type(env, typ),
            Type::Bad => self.types.invalid(),
        }
    }

    /// `pkg.Name` in type position.
    fn qualified_type(&mut self, env: &Env, pkg: IdentName, name: IdentName) -> Option<TypeRef> {
        let pkg_name = self.name(env.unit, pkg);
        let type_name = self.name(env.unit, name);
        let binding = self.files[env.unit.0 as usize].imports.get(pkg_name)?;
        match binding.pkg {
            Some(p) => match self.scopes[p.0 as usize].lookup(type_name)? {
                Object::TypeName(t) => Some(t),
                _ => None,
            },
            None => {
                let path = binding.path.clone();
                Some(self.types.intern(TypeKind::External {
                    path,
                    name: type_name.to_owned(),
                }))
            }
        }
    }

    fn instantiate(&mut self, base: TypeRef, args: Vec<TypeRef>) -> TypeRef {
        match *self.types.kind(base) {
            TypeKind::Named { obj, .. } => self.types.intern(TypeKind::Named { obj, args }),
            _ => base,
        }
    }

    fn struct_type(&mut self, env: &mut Env, fields: ListRef<FieldId>) -> TypeRef {
        let a = self.arena(env.unit);
        let mut out = Vec::new();
        for &fid in a.fields_list(fields) {
            let f = a.fields[fid];
            let typ = self.resolve_type(env, f.typ);
            if f.names.is_empty() {
                out.push(FieldInfo {
                    name: embedded_name(a, f.typ)
                        .map(|n| self.name(env.unit, n).to_owned())
                        .unwrap_or_default(),
                    typ,
                    embedded: true,
                });
            } else {
                for &ident in a.ident_names(f.names) {
                    out.push(FieldInfo {
                        name: self.name(env.unit, ident).to_owned(),
                        typ,
                        embedded: false,
                    });
                }
            }
        }
        self.types.intern(TypeKind::Struct(out))
    }

    fn signature(&mut self, env: &mut Env, id: SignatureId) -> TypeRef {
        let sig = self.arena(env.unit).signatures[id];
        let (params, variadic) = self.field_types(env, sig.params.fields);
        let results = match sig.results {
            None => Vec::new(),
            Some(Results::Params(list)) => self.field_types(env, list.fields).0,
            Some(Results::Type(t)) => vec![self.resolve_type(env, t)],
        };
        self.types.func(Signature {
            params,
            results,
            variadic,
        })
    }

    fn field_types(&mut self, env: &mut Env, fields: ListRef<FieldId>) -> (Vec<TypeRef>, bool) {
        let a = self.arena(env.unit);
        let mut out = Vec::new();
        let mut variadic = false;
        for &fid in a.fields_list(fields) {
            let f = a.fields[fid];
            let mut t = self.resolve_type(env, f.typ);
            if f.ellipsis_pos.is_some() {
                t = self.types.slice(t);
                variadic = true;
            }
            let n = f.names.len().max(1);
            out.extend(std::iter::repeat(t).take(n as usize));
        }
        (out, variadic)
    }

    // -------------------------------------------------------------------------
    // Statements
    // -------------------------------------------------------------------------

    fn stmt_list(&mut self, env: &mut Env, stmts: ListRef<StmtId>) {
        env.push();
        for &s in self.arena(env.unit).stmts_list(stmts) {
            self.stmt(env, s);
        }
        env.pop();
    }

    fn stmt(&mut self, env: &mut Env, id: StmtId) {
        let a = self.arena(env.unit);
        match a.stmts[id] {
            Stmt::Simple(s) => self.simple_stmt(env, s),
            Stmt::Decl(d) => self.local_decl(env, d),
            Stmt::Labeled { stmt, .. } => self.stmt(env, stmt),
            Stmt::Go { call } | Stmt::Defer { call } => {
                self.expr(env, call);
            }
            Stmt::Return { results } => {
                for &r in a.exprs_list(results) {
                    self.expr(env, r);
                }
            }
            Stmt::Branch(_) | Stmt::Bad(_) => {}
            Stmt::Block(b) => self.stmt_list(env, b.stmts),
            Stmt::If {
                init,
                cond,
                then_block,
                else_stmt,
            } => {
                env.push();
                if let Some(init) = init {
                    self.simple_stmt(env, init);
                }
                self.expr(env, cond);
                self.stmt_list(env, then_block.stmts);
                if let Some(e) = else_stmt {
                    self.stmt(env, e);
                }
                env.pop();
            }
            Stmt::For { kind, block } => {
                env.push();
                self.for_header(env, kind);
                self.stmt_list(env, block.stmts);
                env.pop();
            }
            Stmt::Switch { init, tag, clauses } => {
                env.push();
                if let Some(init) = init {
                    self.simple_stmt(env, init);
                }
                if let Some(tag) = tag {
                    self.expr(env, tag);
                }
                for &c in a.switch_clause_ids(clauses) {
                    if let SwitchClause::ExprCase { items, stmts, .. } = a.switch_clauses[c] {
                        for &item in a.exprs_list(items) {
                            self.expr(env, item);
                        }
                        self.stmt_list(env, stmts);
                    }
                }
                env.pop();
            }
            Stmt::TypeSwitch {
                init,
                guard,
                clauses,
            } => {
                env.push();
                if let Some(init) = init {
                    self.simple_stmt(env, init);
                }
                let x = self.value_of(env, guard.x);
                for &c in a.switch_clause_ids(clauses) {
                    let SwitchClause::TypeCase { items, stmts, .. } = a.switch_clauses[c] else {
                        continue;
                    };
                    let mut cases = Vec::new();
                    for item in a.type_case_elems(items) {
                        cases.push(match *item {
                            TypeCaseElem::Type(t) => Some(self.resolve_type(env, t)),
                            TypeCaseElem::Nil(_) => None,
                        });
                    }
                    env.push();
                    if let Some(bind) = guard.bind {
                        let t = match cases.as_slice() {
                            [Some(t)] => *t,
                            _ => x.unwrap_or_else(|| self.types.invalid()),
                        };
                        env.declare(self.name(env.unit, bind), Object::Var(t));
                    }
                    for &s in a.stmts_list(stmts) {
                        self.stmt(env, s);
                    }
                    env.pop();
                }
                env.pop();
            }
            Stmt::Select { clauses } => {
                for &c in a.comm_clause_ids(clauses) {
                    match a.comm_clauses[c] {
                        CommClause::Case { comm, stmts } => {
                            env.push();
                            self.comm_stmt(env, comm);
                            for &s in a.stmts_list(stmts) {
                                self.stmt(env, s);
                            }
                            env.pop();
                        }
                        CommClause::Default { stmts } => self.stmt_list(env, stmts),
                    }
                }
            }
        }
    }

    fn comm_stmt(&mut self, env: &mut Env, comm: CommStmt) {
        match comm {
            CommStmt::Send { chan, value } => {
                self.expr(env, chan);
                self.expr(env, value);
            }
            CommStmt::Recv { lhs, expr } => {
                let t = self.value_of(env, expr);
                let ok = self.basic(BasicKind::Bool);
                self.bind_lhs(env, lhs, [t, Some(ok)]);
            }
        }
    }

    fn for_header(&mut self, env: &mut Env, kind: ForKind) {
        match kind {
            ForKind::Infinite => {}
            ForKind::Cond(cond) => {
                self.expr(env, cond);
            }
            ForKind::ForClause { init, cond, post } => {
                if let Some(init) = init {
                    self.simple_stmt(env, init);
                }
                if let Some(cond) = cond {
                    self.expr(env, cond);
                }
                if let Some(post) = post {
                    self.simple_stmt(env, post);
                }
            }
            ForKind::Range { lhs, expr } => {
                let (k, v) = match self.value_of(env, expr) {
                    Some(t) => self.range_types(t),
                    None => (None, None),
                };
                self.bind_lhs(env, lhs, [k, v]);
            }
        }
    }

    /// Declares (`k, v :=`) or checks (`k, v =`) the left side of a range or receive.
    fn bind_lhs(&mut self, env: &mut Env, lhs: Option<RangeLhs>, types: [Option<TypeRef>; 2]) {
        let a = self.arena(env.unit);
        match lhs {
            Some(RangeLhs::Def { idents }) => {
                for (i, &ident) in a.ident_names(idents).iter().enumerate() {
                    let t = match types.get(i).copied().flatten() {
                        Some(t) => t,
                        None => self.types.invalid(),
                    };
                    env.declare(self.name(env.unit, ident), Object::Var(t));
                }
            }
            Some(RangeLhs::Assign { exprs }) => {
                for &e in a.exprs_list(exprs) {
                    self.expr(env, e);
                }
            }
            None => {}
        }
    }

    fn range_types(&mut self, t: TypeRef) -> (Option<TypeRef>, Option<TypeRef>) {
        let int = self.basic(BasicKind::Int);
        let Some(u) = self.types.underlying(t) else {
            return (None, None);
        };
        match self.types.kind(u).clone() {
            TypeKind::Slice(elem) | TypeKind::Array { elem, .. } => (Some(int), Some(elem)),
            TypeKind::Pointer(p) => match self.types.underlying(p).map(|p| self.types.kind(p)) {
                Some(TypeKind::Array { elem, .. }) => (Some(int), Some(*elem)),
                _ => (None, None),
            },
            TypeKind::Basic(BasicKind::String | BasicKind::UntypedString) => {
                (Some(int), Some(self.basic(BasicKind::Int32)))
            }
            TypeKind::Basic(b) if b.is_integer() => (self.types.default_type(t), None),
            TypeKind::Map { key, val } => (Some(key), Some(val)),
            TypeKind::Chan { elem, .. } => (Some(elem), None),
            TypeKind::Func(sig) => {
                let yield_params = sig
                    .params
                    .first()
                    .and_then(|&y| self.types.signature(y))
                    .map(|s| s.params.clone())
                    .unwrap_or_default();
                (yield_params.first().copied(), yield_params.get(1).copied())
            }
            _ => (None, None),
        }
    }

    fn simple_stmt(&mut self, env: &mut Env, id: SimpleStmtId) {
        let a = self.arena(env.unit);
        match a.simple_stmts[id] {
            SimpleStmt::Empty(_) => {}
            SimpleStmt::Expr(e) => {
                self.expr(env, e);
            }
            SimpleStmt::Send { chan, value } => {
                self.expr(env, chan);
                self.expr(env, value);
            }
            SimpleStmt::IncDec { expr, .. } => {
                self.expr(env, expr);
            }
            SimpleStmt::Assign { lhs, rhs, .. } => {
                for &l in a.exprs_list(lhs) {
                    if !self.is_blank(env.unit, l) {
                        self.expr(env, l);
                    }
                }
                for &r in a.exprs_list(rhs) {
                    self.expr(env, r);
                }
            }
            SimpleStmt::ShortVarDecl { names, values } => {
                let idents = a.ident_names(names);
                let types = self.value_types(env, idents.len(), values, true);
                for (&ident, t) in idents.iter().zip(types) {
                    let name = self.name(env.unit, ident);
                    if env.declared_here(name) {
                        continue;
                    }
                    let t = t.unwrap_or_else(|| self.types.invalid());
                    env.declare(name, Object::Var(t));
                }
            }
        }
    }

    fn local_decl(&mut self, env: &mut Env, id: DeclId) {
        let a = self.arena(env.unit);
        let Decl::Gen(g) = a.decls[id] else {
            return;
        };
        match g.kind {
            GenDeclKind::Import => {}
            GenDeclKind::Const | GenDeclKind::Var => {
                let is_const = g.kind == GenDeclKind::Const;
                for spec in value_items(a, g.specs, is_const) {
                    let idents = a.ident_names(spec.names);
                    let types: Vec<Option<TypeRef>> = match spec.typ {
                        Some(typ) => {
                            for &v in a.exprs_list(spec.values) {
                                self.expr(env, v);
                            }
                            vec![Some(self.resolve_type(env, typ)); idents.len()]
                        }
                        None => self.value_types(env, idents.len(), spec.values, !is_const),
                    };
                    for (&ident, t) in idents.iter().zip(types) {
                        let t = t.unwrap_or_else(|| self.types.invalid());
                        let obj = if is_const {
                            Object::Const(t)
                        } else {
                            Object::Var(t)
                        };
                        env.declare(self.name(env.unit, ident), obj);
                    }
                }
            }
            GenDeclKind::Type => {
                for spec in a.specs_list(g.specs) {
                    let Spec::Type(ts) = *spec else { continue };
                    let name = self.name(env.unit, ts.name);
                    if ts.alias {
                        let t = self.resolve_type(env, ts.typ);
                        env.declare(name, Object::TypeName(t));
                        continue;
                    }
                    let path = self.packages[env.pkg.0 as usize].path.clone();
                    let (obj, t) = self.types.new_named(&path, name);
                    env.declare(name, Object::TypeName(t));
                    env.push();
                    if let Some(tp) = ts.type_params {
                        let params = self.declare_type_params(env, tp);
                        self.types.named_mut(obj).type_params = params;
                    }
                    let under = self.resolve_type(env, ts.typ);
                    env.pop();
                    self.types.named_mut(obj).underlying = Some(under);
                }
            }
        }
    }

    fn is_blank(&self, unit: UnitId, e: ExprId) -> bool {
        matches!(self.arena(unit).exprs[e], Expr::Ident(id) if self.name(unit, id) == "_")
    }

    // -------------------------------------------------------------------------
    // Expressions
    // -------------------------------------------------------------------------

    /// Types of `n` names initialized from `values`, one entry per name.
    fn value_types(
        &mut self,
        env: &mut Env,
        n: usize,
        values: ListRef<ExprId>,
        default: bool,
    ) -> Vec<Option<TypeRef>> {
        let a = self.arena(env.unit);
        let vals = a.exprs_list(values);
        let mut out: Vec<Option<TypeRef>> = if vals.len() == n {
            vals.iter().map(|&v| self.value_of(env, v)).collect()
        } else if let (&[single], true) = (vals, n > 1) {
            self.multi_value(env, single, n)
        } else {
            for &v in vals {
                self.expr(env, v);
            }
            vec![None; n]
        };
        if default {
            for t in out.iter_mut() {
                *t = t.and_then(|t| self.types.default_type(t));
            }
        }
        out
    }

    /// `a, b := f()` and the comma-ok forms `v, ok := m[k]`, `x.(T)`, `<-ch`.
    fn multi_value(&mut self, env: &mut Env, e: ExprId, n: usize) -> Vec<Option<TypeRef>> {
        let a = self.arena(env.unit);
        let t = self.value_of(env, e);
        let mut out = match t.map(|t| self.types.kind(t).clone()) {
            Some(TypeKind::Tuple(elems)) => elems.into_iter().map(Some).collect(),
            Some(_) if n == 2 && is_comma_ok(a, e) => {
                vec![t, Some(self.basic(BasicKind::Bool))]
            }
            _ => vec![t],
        };
        out.resize(n, None);
        out
    }

    fn value_of(&mut self, env: &mut Env, e: ExprId) -> Option<TypeRef> {
        match self.expr(env, e)? {
            Operand::Value(t) => Some(t),
            Operand::Nil => Some(self.basic(BasicKind::UntypedNil)),
            _ => None,
        }
    }

    fn type_operand(&mut self, env: &mut Env, e: ExprId) -> Option<TypeRef> {
        match self.expr(env, e)? {
            Operand::Type(t) => Some(t),
            _ => None,
        }
    }

    fn object_operand(obj: Object) -> Option<Operand> {
        Some(match obj {
            Object::TypeName(t) => Operand::Type(t),
            Object::Var(t) | Object::Const(t) | Object::Func(t) => Operand::Value(t),
            Object::PkgName(p) => Operand::Package(p?),
            Object::Builtin(b) => Operand::Builtin(b),
            Object::Nil => Operand::Nil,
        })
    }

    fn expr(&mut self, env: &mut Env, e: ExprId) -> Option<Operand> {
        let op = self.expr_inner(env, e);
        if env.record {
            let t = match op {
                Some(Operand::Value(t) | Operand::Type(t)) => Some(t),
                Some(Operand::Nil) => Some(self.basic(BasicKind::UntypedNil)),
                _ => None,
            };
            if let Some(t) = t.filter(|&t| !self.types.is_invalid(t)) {
                self.info.types.insert(
                    NodeRef {
                        unit: env.unit,
                        expr: e,
                    },
                    t,
                );
            }
        }
        op
    }

    fn expr_inner(&mut self, env: &mut Env, e: ExprId) -> Option<Operand> {
        let a = self.arena(env.unit);
        match a.exprs[e] {
            Expr::Ident(ident) => {
                let obj = self.lookup(env, self.name(env.unit, ident))?;
                Self::object_operand(obj)
            }
            Expr::BasicLit(BasicLit { kind, .. }) => {
                let b = match kind {
                    BasicLitKind::Int => BasicKind::UntypedInt,
                    BasicLitKind::Float => BasicKind::UntypedFloat,
                    BasicLitKind::Imag => BasicKind::UntypedComplex,
                    BasicLitKind::Rune => BasicKind::UntypedRune,
                    BasicLitKind::String => BasicKind::UntypedString,
                };
                Some(Operand::Value(self.basic(b)))
            }
            Expr::FuncLit { sig, body } => {
                let t = self.signature(env, sig);
                env.push();
                self.declare_signature_names(env, sig);
                self.stmt_list(env, body.stmts);
                env.pop();
                Some(Operand::Value(t))
            }
            Expr::CompositeLit { typ, lit } => {
                let t = typ.map(|typ| self.resolve_type(env, typ));
                self.literal(env, t, lit);
                t.map(Operand::Value)
            }
            Expr::IndexOrInstantiate { base, args } => self.index(env, base, args),
            Expr::Paren { expr } => self.expr(env, expr),
            Expr::Selector { expr, ident } => self.selector(env, e, expr, ident),
            Expr::Slice { expr, lo, hi, max } => {
                let t = self.value_of(env, expr);
                for bound in [lo, hi, max].into_iter().flatten() {
                    self.expr(env, bound);
                }
                let t = t?;
                let u = self.types.underlying(t)?;
                let sliced = match self.types.kind(u).clone() {
                    TypeKind::Basic(BasicKind::String | BasicKind::UntypedString) => {
                        self.basic(BasicKind::String)
                    }
                    TypeKind::Slice(_) => t,
                    TypeKind::Array { elem, .. } => self.types.slice(elem),
                    TypeKind::Pointer(p) => match self.types.underlying(p).map(|p| self.types.kind(p)) {
                        Some(&TypeKind::Array { elem, .. }) => self.types.slice(elem),
                        _ => return None,
                    },
                    _ => return None,
                };
                Some(Operand::Value(sliced))
            }
            Expr::TypeAssert { expr, typ } => {
                self.expr(env, expr);
                let t = self.resolve_type(env, typ?);
                Some(Operand::Value(t))
            }
            Expr::Call { callee, args, .. } => {
                if env.record && !args.is_empty() && matches!(a.exprs[callee], Expr::Selector { .. }) {
                    self.record_locals(env, e);
                }
                self.call(env, callee, args)
            }
            Expr::Unary { op, expr } => {
                let x = self.expr(env, expr)?;
                match (op, x) {
                    (UnaryOp::Addr, Operand::Value(t)) => Some(Operand::Value(self.types.pointer(t))),
                    (UnaryOp::Deref, Operand::Type(t)) => Some(Operand::Type(self.types.pointer(t))),
                    (UnaryOp::Deref, Operand::Value(t)) => {
                        match self.types.kind(self.types.underlying(t)?) {
                            TypeKind::Pointer(elem) => Some(Operand::Value(*elem)),
                            _ => None,
                        }
                    }
                    (UnaryOp::Recv, Operand::Value(t)) => {
                        match self.types.kind(self.types.underlying(t)?) {
                            TypeKind::Chan { elem, .. } => Some(Operand::Value(*elem)),
                            _ => None,
                        }
                    }
                    (
                        UnaryOp::Add | UnaryOp::Sub | UnaryOp::Not | UnaryOp::Xor,
                        Operand::Value(t),
                    ) => Some(Operand::Value(t)),
                    _ => None,
                }
            }
            Expr::Binary { left, op, right } => {
                let l = self.value_of(env, left);
                let r = self.value_of(env, right);
                if op.is_comparison() {
                    return Some(Operand::Value(self.basic(BasicKind::UntypedBool)));
                }
                let t = match op {
                    BinaryOp::Shl | BinaryOp::Shr => l,
                    _ => match (l, r) {
                        (Some(l), Some(r)) if self.types.is_untyped(l) && !self.types.is_untyped(r) => {
                            Some(r)
                        }
                        (Some(l), _) => Some(l),
                        (None, r) => r,
                    },
                };
                t.map(Operand::Value)
            }
            Expr::TypeExpr(t) => Some(Operand::Type(self.resolve_type(env, t))),
            Expr::QualifiedRef { .. } | Expr::Bad(_) => None,
        }
    }

    fn selector(&mut self, env: &mut Env, e: ExprId, x: ExprId, ident: IdentName) -> Option<Operand> {
        let name = self.name(env.unit, ident);
        let (kind, recv, lookup) = match self.expr(env, x)? {
            Operand::Package(p) => {
                let obj = self.scopes[p.0 as usize].lookup(name)?;
                return Self::object_operand(obj);
            }
            Operand::Type(t) => (SelectionKind::MethodExpr, t, self.types.lookup_field_or_method(t, name)?),
            Operand::Value(t) => (SelectionKind::MethodVal, t, self.types.lookup_field_or_method(t, name)?),
            _ => return None,
        };

        let (kind, typ) = match (kind, lookup.member) {
            (SelectionKind::MethodExpr, Member::Field(_)) => return None,
            (SelectionKind::MethodExpr, Member::Method { sig, .. } | Member::InterfaceMethod(sig)) => {
                let mut s = self.types.signature(sig)?.clone();
                s.params.insert(0, recv);
                (SelectionKind::MethodExpr, self.types.func(s))
            }
            (_, Member::Field(ft)) => (SelectionKind::FieldVal, ft),
            (_, Member::Method { sig, .. } | Member::InterfaceMethod(sig)) => (SelectionKind::MethodVal, sig),
        };

        if env.record {
            self.info.selections.insert(
                NodeRef {
                    unit: env.unit,
                    expr: e,
                },
                Selection {
                    kind,
                    recv,
                    typ,
                    indirect: lookup.indirect,
                },
            );
        }
        Some(Operand::Value(typ))
    }

    /// Remembers the local names visible at the method call `e`.
    fn record_locals(&mut self, env: &Env, e: ExprId) {
        let mut names: Vec<String> = env
            .locals
            .iter()
            .flat_map(|s| s.names())
            .map(str::to_owned)
            .collect();
        if names.is_empty() {
            return;
        }
        names.sort_unstable();
        names.dedup();
        self.info.locals.insert(
            NodeRef {
                unit: env.unit,
                expr: e,
            },
            names,
        );
    }

    fn call(&mut self, env: &mut Env, callee: ExprId, args: ListRef<ExprId>) -> Option<Operand> {
        let a = self.arena(env.unit);
        let args = a.exprs_list(args);
        match self.expr(env, callee) {
            Some(Operand::Type(t)) => {
                for &x in args {
                    self.expr(env, x);
                }
                Some(Operand::Value(t))
            }
            Some(Operand::Builtin(b)) => self.builtin(env, b, args),
            Some(Operand::Value(f)) => {
                for &x in args {
                    self.expr(env, x);
                }
                let results = self.types.signature(f)?.results.clone();
                Some(Operand::Value(match results.as_slice() {
                    [one] => *one,
                    _ => self.types.tuple(results),
                }))
            }
            _ => {
                for &x in args {
                    self.expr(env, x);
                }
                None
            }
        }
    }

    fn builtin(&mut self, env: &mut Env, b: Builtin, args: &[ExprId]) -> Option<Operand> {
        let (first, rest) = match args.split_first() {
            Some((&first, rest)) => (Some(first), rest),
            None => (None, args),
        };
        let t = match b {
            Builtin::Make | Builtin::New => {
                let t = first.and_then(|x| self.type_operand(env, x));
                for &x in rest {
                    self.expr(env, x);
                }
                let t = t?;
                if b == Builtin::New {
                    self.types.pointer(t)
                } else {
                    t
                }
            }
            _ => {
                let types: Vec<Option<TypeRef>> = args.iter().map(|&x| self.value_of(env, x)).collect();
                match b {
                    Builtin::Len | Builtin::Cap | Builtin::Copy => self.basic(BasicKind::Int),
                    Builtin::Append | Builtin::Min | Builtin::Max => types.first().copied().flatten()?,
                    Builtin::Complex => self.basic(BasicKind::Complex128),
                    Builtin::Real | Builtin::Imag => self.basic(BasicKind::Float64),
                    Builtin::Recover => self.types.empty_interface(),
                    _ => self.types.tuple(Vec::new()),
                }
            }
        };
        Some(Operand::Value(t))
    }

    fn index(&mut self, env: &mut Env, base: ExprId, args: ListRef<ExprOrType>) -> Option<Operand> {
        let a = self.arena(env.unit);
        let items = a.expr_or_types(args);
        match self.expr(env, base) {
            Some(Operand::Type(t)) => {
                let targs: Vec<TypeRef> = items
                    .iter()
                    .map(|item| match *item {
                        ExprOrType::Type(tid) => self.resolve_type(env, tid),
                        ExprOrType::Expr(x) => match self.type_operand(env, x) {
                            Some(t) => t,
                            None => self.types.invalid(),
                        },
                    })
                    .collect();
                Some(Operand::Type(self.instantiate(t, targs)))
            }
            Some(Operand::Value(t)) => {
                for item in items {
                    match *item {
                        ExprOrType::Expr(x) => {
                            self.expr(env, x);
                        }
                        ExprOrType::Type(tid) => {
                            self.resolve_type(env, tid);
                        }
                    }
                }
                let u = self.types.underlying(t)?;
                let elem = match self.types.kind(u).clone() {
                    TypeKind::Slice(elem) | TypeKind::Array { elem, .. } => elem,
                    TypeKind::Map { val, .. } => val,
                    TypeKind::Pointer(p) => match self.types.underlying(p).map(|p| self.types.kind(p)) {
                        Some(&TypeKind::Array { elem, .. }) => elem,
                        _ => return None,
                    },
                    TypeKind::Basic(BasicKind::String | BasicKind::UntypedString) => {
                        self.basic(BasicKind::Uint8)
                    }
                    // Explicit instantiation of a generic function.
                    TypeKind::Func(_) => t,
                    _ => return None,
                };
                Some(Operand::Value(elem))
            }
            _ => {
                for item in items {
                    if let ExprOrType::Expr(x) = *item {
                        self.expr(env, x);
                    }
                }
                None
            }
        }
    }

    /// Checks the elements of a composite literal of type `t`.
    fn literal(&mut self, env: &mut Env, t: Option<TypeRef>, lit: LiteralValue) {
        let a = self.arena(env.unit);
        let under = t
            .and_then(|t| self.types.underlying(t))
            .map(|u| match *self.types.kind(u) {
                TypeKind::Pointer(p) => self.types.underlying(p).unwrap_or(p),
                _ => u,
            })
            .map(|u| self.types.kind(u).clone());

        for (i, ke) in a.keyed_elems_list(lit.elements).iter().enumerate() {
            let mut field_type = None;
            match ke.key {
                Some(Element::Expr(k)) => match &under {
                    Some(TypeKind::Struct(fields)) => {
                        if let Expr::Ident(id) = a.exprs[k] {
                            let name = self.name(env.unit, id);
                            field_type = fields.iter().find(|f| f.name == name).map(|f| f.typ);
                        }
                    }
                    _ => {
                        self.expr(env, k);
                    }
                },
                Some(Element::Literal(l)) => {
                    let key = match &under {
                        Some(TypeKind::Map { key, .. }) => Some(*key),
                        _ => None,
                    };
                    self.literal(env, key, l);
                }
                None => {
                    if let Some(TypeKind::Struct(fields)) = &under {
                        field_type = fields.get(i).map(|f| f.typ);
                    }
                }
            }

            match ke.value {
                Element::Expr(v) => {
                    self.expr(env, v);
                }
                Element::Literal(l) => {
                    let elem = match &under {
                        Some(TypeKind::Struct(_)) => field_type,
                        Some(TypeKind::Slice(elem) | TypeKind::Array { elem, .. }) => Some(*elem),
                        Some(TypeKind::Map { val, .. }) => Some(*val),
                        _ => None,
                    };
                    self.literal(env, elem, l);
                }
            }
        }
    }
}

/// Specs of a const or var declaration; a const spec without type and values repeats the
/// previous one.
fn value_items<'a>(
    a: &'a AstArena,
    specs: ListRef<Spec>,
    is_const: bool,
) -> impl Iterator<Item = ValueSpec> + 'a {
    let mut last: Option<ValueSpec> = None;
    a.specs_list(specs).iter().filter_map(move |spec| {
        let Spec::Value(mut vs) = *spec else {
            return None;
        };
        if is_const {
            match last {
                Some(prev) if vs.typ.is_none() && vs.values.is_empty() => {
                    vs.typ = prev.typ;
                    vs.values = prev.values;
                }
                _ => last = Some(vs),
            }
        }
        Some(vs)
    })
}

fn is_comma_ok(a: &AstArena, e: ExprId) -> bool {
    match a.exprs[e] {
        Expr::Paren { expr } => is_comma_ok(a, expr),
        Expr::IndexOrInstantiate { .. } | Expr::TypeAssert { .. } => true,
        Expr::Unary {
            op: UnaryOp::Recv, ..
        } => true,
        _ => false,
    }
}

/// Field name of an embedded field: the type name without pointer or package.
fn embedded_name(a: &AstArena, mut t: TypeId) -> Option<IdentName> {
    loop {
        match a.types[t] {
            Type::Pointer { elem } | Type::Paren { typ: elem } => t = elem,
            Type::Named { name, .. } => return Some(name),
            _ => return None,
        }
    }
}

fn const_int(a: &AstArena, src: &str, e: ExprId) -> Option<u64> {
    match a.exprs[e] {
        Expr::Paren { expr } => const_int(a, src, expr),
        Expr::BasicLit(BasicLit {
            kind: BasicLitKind::Int,
            raw,
        }) => parse_int(raw.text(src)?),
        _ => None,
    }
}

fn parse_int(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|&c| c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    let (body, radix) = if let Some(rest) = lower.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (rest, 2)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (rest, 8)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (&lower[1..], 8)
    } else {
        (lower.as_str(), 10)
    };
    u64::from_str_radix(body, radix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::fixture::program;
    use go_syntax::walk::preorder_exprs;
    use pretty_assertions::assert_eq;

    /// Recorded type of the first argument of every `note(...)` call, in source order.
    fn noted(src: &str) -> Vec<(String, String)> {
        let (_dir, prog) = program(&[("w.go", src)]);
        let unit = prog.root_units()[0];
        let u = prog.unit(unit);
        let a = &u.tree.arena;
        preorder_exprs(a, &u.tree.file)
            .into_iter()
            .filter_map(|e| {
                let Expr::Call { callee, args, .. } = a.exprs[e] else {
                    return None;
                };
                let Expr::Ident(id) = a.exprs[callee] else {
                    return None;
                };
                if u.tree.interner.resolve(id.sym) != "note" {
                    return None;
                }
                let arg = *a.exprs_list(args).first()?;
                let text = u.expr_span(arg).text(&u.src)?.to_owned();
                let typ = prog
                    .type_of(unit, arg)
                    .map_or_else(|| "-".to_owned(), |t| prog.types.type_string(t));
                Some((text, typ))
            })
            .collect()
    }

    fn pairs(want: &[(&str, &str)]) -> Vec<(String, String)> {
        want.iter()
            .map(|(x, t)| ((*x).to_owned(), (*t).to_owned()))
            .collect()
    }

    #[test]
    fn expression_types() {
        let src = r#"package w

import (
	"context"
	"strings"
)

type T struct {
	N    int
	Next *T
}

func (t *T) Len() int { return t.N }

func note(xs ...any) {}

func f(ctx context.Context, t T, m map[string][]int, ch <-chan string) {
	note(ctx)
	note(t.Next)
	note(t.Next.N)
	note(m["a"])
	note(m["a"][0])
	note(<-ch)
	note(strings.ToUpper("x"))
	note(len(m))
	note(&t)
	note(t.Len)
	note(10)
	note(nil)
	note(func() int { return 1 })
}
"#;
        assert_eq!(
            noted(src),
            pairs(&[
                ("ctx", "context.Context"),
                ("t.Next", "*example.com/m.T"),
                ("t.Next.N", "int"),
                ("m[\"a\"]", "[]int"),
                ("m[\"a\"][0]", "int"),
                ("<-ch", "string"),
                ("strings.ToUpper(\"x\")", "string"),
                ("len(m)", "int"),
                ("&t", "*example.com/m.T"),
                ("t.Len", "func() int"),
                ("10", "untyped int"),
                ("nil", "untyped nil"),
                ("func() int { return 1 }", "func() int"),
            ])
        );
    }

    #[test]
    fn statement_bindings() {
        let src = r#"package w

import "context"

type T struct{ N int }

func note(xs ...any) {}

func f(ctx context.Context, m map[string][]int) {
	for k, v := range m {
		note(k)
		note(v)
	}
	x, ok := m["b"]
	note(x)
	note(ok)
	c, cancel := context.WithCancel(ctx)
	note(c)
	note(cancel)
	var v any = T{}
	switch y := v.(type) {
	case *T:
		note(y)
	case int, string:
		note(y)
	}
	if n := len(m); n > 0 {
		note(n)
	}
}
"#;
        assert_eq!(
            noted(src),
            pairs(&[
                ("k", "string"),
                ("v", "[]int"),
                ("x", "[]int"),
                ("ok", "bool"),
                ("c", "context.Context"),
                ("cancel", "context.CancelFunc"),
                ("y", "*example.com/m.T"),
                ("y", "any"),
                ("n", "int"),
            ])
        );
    }

    #[test]
    fn package_level_values() {
        let src = r#"package w

const k int64 = 3

var y int64

var d = z

var x, s = 10, "a"

var z = 1.5

func note(xs ...any) {}

func f() {
	note(k)
	note(y)
	note(x)
	note(s)
	note(d)
}
"#;
        assert_eq!(
            noted(src),
            pairs(&[
                ("k", "int64"),
                ("y", "int64"),
                ("x", "int"),
                ("s", "string"),
                ("d", "float64"),
            ])
        );
    }

    #[test]
    fn selections_distinguish_fields_methods_and_method_expressions() {
        let src = r#"package w

type T struct{ N int }

func (t *T) Len() int { return t.N }

func f(t *T) {
	_ = t.N
	_ = t.Len()
	_ = (*T).Len(t)
}
"#;
        let (_dir, prog) = program(&[("w.go", src)]);
        let unit = prog.root_units()[0];
        let u = prog.unit(unit);
        let mut kinds: Vec<(String, SelectionKind)> = preorder_exprs(&u.tree.arena, &u.tree.file)
            .into_iter()
            .filter_map(|e| {
                let sel = prog.selection(unit, e)?;
                Some((u.expr_span(e).text(&u.src)?.to_owned(), sel.kind))
            })
            .collect();
        kinds.sort_by(|x, y| x.0.cmp(&y.0));
        assert_eq!(
            kinds,
            vec![
                ("(*T).Len".to_owned(), SelectionKind::MethodExpr),
                ("t.Len".to_owned(), SelectionKind::MethodVal),
                ("t.N".to_owned(), SelectionKind::FieldVal),
                ("t.N".to_owned(), SelectionKind::FieldVal),
            ]
        );
    }

    #[test]
    fn integer_literals() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("0x_ff"), Some(255));
        assert_eq!(parse_int("0o17"), Some(15));
        assert_eq!(parse_int("017"), Some(15));
        assert_eq!(parse_int("0b101"), Some(5));
        assert_eq!(parse_int("1_000"), Some(1000));
        assert_eq!(parse_int("0"), Some(0));
    }
}
