//! # Go syntax tree
//!
//! Arena-allocated Abstract Syntax Tree for Go source files.
//!
//! ## Design
//!
//! - **Arenas**: every node kind lives in a typed `SpannedArena<T>` and is addressed by `Id<T>`
//! - **Lists**: children sequences are stored in shared buffers (`ExtraData`) and addressed by
//!   `ListRef<T>`, so nodes stay `Copy`
//! - **Spans**: byte ranges are kept in side tables next to each arena
//! - **Symbols**: identifiers are interned once per file
//!
//! ## Mutation
//!
//! The tree is mutable after parsing. Nodes allocated by a rewrite carry `Span::DETACHED`;
//! printers treat such nodes as new text and everything else as a slice of the original
//! source. `Expr::QualifiedRef` exists only for such synthesized nodes: it names a package
//! member by import path and leaves the choice of local package name to the printer.
//!
//! Walk/Visitor infrastructure lives in `crate::walk`; `#[derive(WalkAst)]` generates the
//! `Walk` impls below.

use ast_derive::WalkAst;
use core::marker::PhantomData;
use core::ops::{Index, IndexMut};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::hash::{BuildHasher, BuildHasherDefault, Hasher, RandomState};

// =============================================================================
// Spans, ids and list references
// =============================================================================

/// Byte range in the source file (end exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Span of a node that has no source text (created after parsing).
    pub const DETACHED: Span = Span {
        start: u32::MAX,
        end: u32::MAX,
    };

    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        let s = if start > u32::MAX as usize {
            u32::MAX
        } else {
            start as u32
        };
        let e = if end > u32::MAX as usize {
            u32::MAX
        } else {
            end as u32
        };
        Self { start: s, end: e }
    }

    #[inline]
    pub const fn empty_at(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    #[inline]
    pub const fn from_range(range: std::ops::Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }

    /// Smallest span covering both `self` and `other`.
    #[inline]
    pub const fn to(self, other: Span) -> Span {
        let start = if self.start < other.start {
            self.start
        } else {
            other.start
        };
        let end = if self.end > other.end {
            self.end
        } else {
            other.end
        };
        Span { start, end }
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub const fn is_detached(&self) -> bool {
        self.start == u32::MAX
    }

    /// Source text covered by the span, `None` for detached spans.
    #[inline]
    pub fn text<'s>(&self, src: &'s str) -> Option<&'s str> {
        if self.is_detached() {
            return None;
        }
        src.get(self.start as usize..self.end as usize)
    }
}

/// Type-safe index of an arena-allocated node.
///
/// Trait impls are written by hand so they do not require bounds on `T`.
#[repr(transparent)]
pub struct Id<T> {
    raw: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Copy for Id<T> {}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> std::hash::Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Id({})", self.raw)
    }
}

impl<T> Id<T> {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn to_usize(&self) -> usize {
        self.raw as usize
    }

    #[inline]
    pub const fn raw(&self) -> u32 {
        self.raw
    }
}

/// Typed reference into one of the `ExtraData` list buffers.
pub struct ListRef<T> {
    start: u32,
    len: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Copy for ListRef<T> {}

impl<T> PartialEq for ListRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.len == other.len
    }
}

impl<T> Eq for ListRef<T> {}

impl<T> std::fmt::Debug for ListRef<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ListRef({}..{})", self.start, self.end())
    }
}

impl<T> Clone for ListRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Default for ListRef<T> {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl<T> ListRef<T> {
    pub const EMPTY: Self = Self {
        start: 0,
        len: 0,
        _marker: PhantomData,
    };

    #[inline]
    pub const fn new(start: u32, len: u32) -> Self {
        Self {
            start,
            len,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    pub const fn start(&self) -> u32 {
        self.start
    }

    #[inline]
    pub const fn end(&self) -> u32 {
        self.start + self.len
    }
}

// =============================================================================
// Symbol interning
// =============================================================================

/// Interned identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Symbol(u32);

pub type Ident = Symbol;

impl Symbol {
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// Identifier occurrence: symbol plus the position of this occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentName {
    pub sym: Ident,
    pub pos: Span,
}

#[derive(Default)]
struct U64IdentityHasher(u64);

impl Hasher for U64IdentityHasher {
    fn write(&mut self, _b: &[u8]) {
        unreachable!("U64IdentityHasher only supports write_u64")
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
}

/// String interner: each distinct string is stored once, buckets keyed by its hash.
#[derive(Debug, Default)]
pub struct Interner {
    strings: Vec<Box<str>>,
    buckets: HashMap<u64, SmallVec<[Symbol; 1]>, BuildHasherDefault<U64IdentityHasher>>,
    state: RandomState,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, s: &str) -> Symbol {
        let h = self.state.hash_one(s);
        let bucket = self.buckets.entry(h).or_default();
        if let Some(&sym) = bucket
            .iter()
            .find(|sym| self.strings[sym.0 as usize].as_ref() == s)
        {
            return sym;
        }
        let sym = Symbol(self.strings.len() as u32);
        self.strings.push(s.into());
        bucket.push(sym);
        sym
    }

    /// Looks a string up without interning it.
    pub fn get(&self, s: &str) -> Option<Symbol> {
        let h = self.state.hash_one(s);
        self.buckets
            .get(&h)?
            .iter()
            .copied()
            .find(|sym| self.strings[sym.0 as usize].as_ref() == s)
    }

    /// # Panics
    /// Panics if `sym` was produced by another interner.
    #[inline]
    pub fn resolve(&self, sym: Symbol) -> &str {
        &self.strings[sym.0 as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

// =============================================================================
// Arenas
// =============================================================================

/// Nodes and their spans, stored in parallel vectors.
#[derive(Debug)]
pub struct SpannedArena<T> {
    data: Vec<T>,
    spans: Vec<Span>,
}

impl<T> Default for SpannedArena<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            spans: Vec::new(),
        }
    }
}

impl<T> SpannedArena<T> {
    #[inline]
    pub fn alloc(&mut self, node: T, span: Span) -> Id<T> {
        let id = Id::from_raw(self.data.len() as u32);
        self.data.push(node);
        self.spans.push(span);
        id
    }

    #[inline]
    pub fn get(&self, id: Id<T>) -> &T {
        &self.data[id.to_usize()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: Id<T>) -> &mut T {
        &mut self.data[id.to_usize()]
    }

    #[inline]
    pub fn span(&self, id: Id<T>) -> Span {
        self.spans[id.to_usize()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// All ids in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = Id<T>> + '_ {
        (0..self.data.len() as u32).map(Id::from_raw)
    }
}

impl<T> Index<Id<T>> for SpannedArena<T> {
    type Output = T;
    fn index(&self, id: Id<T>) -> &T {
        self.get(id)
    }
}

impl<T> IndexMut<Id<T>> for SpannedArena<T> {
    fn index_mut(&mut self, id: Id<T>) -> &mut T {
        self.get_mut(id)
    }
}

pub type DeclId = Id<Decl>;
pub type StmtId = Id<Stmt>;
pub type SimpleStmtId = Id<SimpleStmt>;
pub type ExprId = Id<Expr>;
pub type TypeId = Id<Type>;
pub type FieldId = Id<Field>;
pub type SignatureId = Id<Signature>;
pub type FuncDeclId = Id<FuncDecl>;
pub type SwitchClauseId = Id<SwitchClause>;
pub type CommClauseId = Id<CommClause>;
pub type TypeParamsId = Id<TypeParams>;

/// Shared list buffers that `ListRef<T>` points into.
#[derive(Debug, Default)]
pub struct ExtraData {
    pub ident_names: Vec<IdentName>,
    pub exprs: Vec<ExprId>,
    pub stmts: Vec<StmtId>,
    pub types: Vec<TypeId>,
    pub fields: Vec<FieldId>,
    pub specs: Vec<Spec>,
    pub keyed_elems: Vec<KeyedElement>,
    pub top_decls: Vec<TopLevelDecl>,
    pub switch_clause_ids: Vec<SwitchClauseId>,
    pub comm_clause_ids: Vec<CommClauseId>,
    pub type_case_elems: Vec<TypeCaseElem>,
    pub type_terms: Vec<TypeTerm>,
    pub interface_elems: Vec<InterfaceElem>,
    pub type_param_decls: Vec<TypeParamDecl>,
    pub expr_or_types: Vec<ExprOrType>,
}

/// Owner of every node and list buffer of one file.
#[derive(Debug, Default)]
pub struct AstArena {
    pub decls: SpannedArena<Decl>,
    pub stmts: SpannedArena<Stmt>,
    pub simple_stmts: SpannedArena<SimpleStmt>,
    pub exprs: SpannedArena<Expr>,
    pub types: SpannedArena<Type>,
    pub signatures: SpannedArena<Signature>,
    pub funcs: SpannedArena<FuncDecl>,
    pub fields: SpannedArena<Field>,
    pub switch_clauses: SpannedArena<SwitchClause>,
    pub comm_clauses: SpannedArena<CommClause>,
    pub type_params: SpannedArena<TypeParams>,
    pub extras: ExtraData,
}

macro_rules! list_accessors {
    ($($t:ty => $buf:ident, $build:ident, $get:ident;)*) => {
        impl AstArena {
            $(
                pub fn $build(&mut self, items: impl IntoIterator<Item = $t>) -> ListRef<$t> {
                    Self::push_list(&mut self.extras.$buf, items)
                }

                pub fn $get(&self, r: ListRef<$t>) -> &[$t] {
                    Self::slice(&self.extras.$buf, r)
                }
            )*
        }
    };
}

impl AstArena {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn push_list<T>(buf: &mut Vec<T>, items: impl IntoIterator<Item = T>) -> ListRef<T> {
        let start = buf.len();
        buf.extend(items);
        let len = buf.len() - start;
        if len == 0 {
            return ListRef::EMPTY;
        }
        ListRef::new(start as u32, len as u32)
    }

    #[inline]
    fn slice<T>(buf: &[T], r: ListRef<T>) -> &[T] {
        &buf[r.start() as usize..r.end() as usize]
    }
}

list_accessors! {
    IdentName => ident_names, list_ident_names, ident_names;
    ExprId => exprs, list_exprs, exprs_list;
    StmtId => stmts, list_stmts, stmts_list;
    TypeId => types, list_types, types_list;
    FieldId => fields, list_fields, fields_list;
    Spec => specs, list_specs, specs_list;
    KeyedElement => keyed_elems, list_keyed_elems, keyed_elems_list;
    TopLevelDecl => top_decls, list_top_decls, top_decls;
    SwitchClauseId => switch_clause_ids, list_switch_clause_ids, switch_clause_ids;
    CommClauseId => comm_clause_ids, list_comm_clause_ids, comm_clause_ids;
    TypeCaseElem => type_case_elems, list_type_cases, type_case_elems;
    TypeTerm => type_terms, list_type_terms, type_terms;
    InterfaceElem => interface_elems, list_interface_elems, interface_elems;
    TypeParamDecl => type_param_decls, list_type_param_decls, type_param_decls;
    ExprOrType => expr_or_types, list_expr_or_types, expr_or_types;
}

// =============================================================================
// Source file and declarations
// =============================================================================

/// `SourceFile = PackageClause ";" { ImportDecl ";" } { TopLevelDecl ";" }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct SourceFile {
    #[walk(skip)]
    pub package_pos: Span,
    #[walk(skip)]
    pub name: IdentName,
    /// Imports included, in source order.
    pub decls: ListRef<TopLevelDecl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum TopLevelDecl {
    Decl(DeclId),
    Func(FuncDeclId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Decl {
    Gen(GenDecl),
    Bad(#[walk(skip)] Span),
}

/// `import`, `const`, `type` or `var` declaration, grouped or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct GenDecl {
    #[walk(skip)]
    pub kw_pos: Span,
    #[walk(skip)]
    pub kind: GenDeclKind,
    #[walk(skip)]
    pub l_paren: Option<Span>,
    pub specs: ListRef<Spec>,
    #[walk(skip)]
    pub r_paren: Option<Span>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GenDeclKind {
    Import,
    Const,
    Type,
    Var,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Spec {
    Import(#[walk(skip)] ImportSpec),
    Value(ValueSpec),
    Type(TypeSpec),
}

/// `ImportSpec = [ "." | PackageName ] ImportPath`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSpec {
    pub name: Option<ImportName>,
    pub path: StringLit,
    /// From the name (if any) to the end of the path literal.
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportName {
    Dot(Span),
    Blank(Span),
    Name(IdentName),
}

/// `const`/`var` spec: `IdentifierList [ Type ] [ "=" ExpressionList ]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct ValueSpec {
    #[walk(skip)]
    pub names: ListRef<IdentName>,
    pub typ: Option<TypeId>,
    pub values: ListRef<ExprId>,
    /// Index of this spec inside its declaration group (`iota`).
    #[walk(skip)]
    pub iota: u32,
}

/// `TypeSpec = AliasDecl | TypeDef`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct TypeSpec {
    #[walk(skip)]
    pub name: IdentName,
    pub type_params: Option<TypeParamsId>,
    #[walk(skip)]
    pub alias: bool,
    pub typ: TypeId,
}

/// Function or method declaration; `body` is `None` for external functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct FuncDecl {
    #[walk(skip)]
    pub func_pos: Span,
    pub recv: Option<Receiver>,
    #[walk(skip)]
    pub name: IdentName,
    pub type_params: Option<TypeParamsId>,
    pub signature: SignatureId,
    pub body: Option<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct Receiver {
    #[walk(skip)]
    pub name: Option<IdentName>,
    pub typ: TypeId,
    /// `func (l *List[T]) ...` binds `T`.
    #[walk(skip)]
    pub type_params: ListRef<IdentName>,
}

// =============================================================================
// Generics
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct TypeParams {
    pub params: ListRef<TypeParamDecl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct TypeParamDecl {
    #[walk(skip)]
    pub names: ListRef<IdentName>,
    pub constraint: TypeElem,
}

/// `TypeTerm { "|" TypeTerm }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct TypeElem {
    pub terms: ListRef<TypeTerm>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum TypeTerm {
    Tilde {
        #[walk(skip)]
        tilde_pos: Span,
        typ: TypeId,
    },
    Type {
        typ: TypeId,
    },
}

// =============================================================================
// Signatures and fields
// =============================================================================

/// `Signature = Parameters [ Result ]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct Signature {
    pub params: FieldList,
    pub results: Option<Results>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Results {
    Params(FieldList),
    Type(TypeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct FieldList {
    #[walk(skip)]
    pub l_paren: Span,
    pub fields: ListRef<FieldId>,
    #[walk(skip)]
    pub r_paren: Span,
}

/// Parameter, result or struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct Field {
    /// Empty for anonymous parameters and embedded fields.
    #[walk(skip)]
    pub names: ListRef<IdentName>,
    #[walk(skip)]
    pub ellipsis_pos: Option<Span>,
    pub typ: TypeId,
    #[walk(skip)]
    pub tag: Option<StringLit>,
    #[walk(skip)]
    pub is_embed: bool,
}

// =============================================================================
// Statements
// =============================================================================

/// `SimpleStmt = EmptyStmt | ExpressionStmt | SendStmt | IncDecStmt | Assignment | ShortVarDecl`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum SimpleStmt {
    Empty(#[walk(skip)] Span),
    Expr(ExprId),
    Send {
        chan: ExprId,
        value: ExprId,
    },
    IncDec {
        expr: ExprId,
        #[walk(skip)]
        op: IncDecOp,
    },
    Assign {
        lhs: ListRef<ExprId>,
        #[walk(skip)]
        op: AssignOp,
        rhs: ListRef<ExprId>,
    },
    ShortVarDecl {
        #[walk(skip)]
        names: ListRef<IdentName>,
        values: ListRef<ExprId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Stmt {
    Simple(SimpleStmtId),
    Decl(DeclId),
    Labeled {
        #[walk(skip)]
        label: IdentName,
        stmt: StmtId,
    },
    Go {
        call: ExprId,
    },
    Defer {
        call: ExprId,
    },
    Return {
        results: ListRef<ExprId>,
    },
    Branch(#[walk(skip)] BranchStmt),
    Block(Block),
    If {
        init: Option<SimpleStmtId>,
        cond: ExprId,
        then_block: Block,
        else_stmt: Option<StmtId>,
    },
    For {
        kind: ForKind,
        block: Block,
    },
    Switch {
        init: Option<SimpleStmtId>,
        tag: Option<ExprId>,
        clauses: ListRef<SwitchClauseId>,
    },
    TypeSwitch {
        init: Option<SimpleStmtId>,
        guard: TypeSwitchGuard,
        clauses: ListRef<SwitchClauseId>,
    },
    Select {
        clauses: ListRef<CommClauseId>,
    },
    Bad(#[walk(skip)] Span),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum ForKind {
    Infinite,
    Cond(ExprId),
    ForClause {
        init: Option<SimpleStmtId>,
        cond: Option<ExprId>,
        post: Option<SimpleStmtId>,
    },
    Range {
        lhs: Option<RangeLhs>,
        expr: ExprId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum RangeLhs {
    /// `k, v :=`
    Def {
        #[walk(skip)]
        idents: ListRef<IdentName>,
    },
    /// `k, v =`
    Assign { exprs: ListRef<ExprId> },
}

/// `case` / `default` clause; `default` has no items and `is_default` set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum SwitchClause {
    ExprCase {
        #[walk(skip)]
        is_default: bool,
        items: ListRef<ExprId>,
        stmts: ListRef<StmtId>,
    },
    TypeCase {
        #[walk(skip)]
        is_default: bool,
        items: ListRef<TypeCaseElem>,
        stmts: ListRef<StmtId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum CommClause {
    Case {
        comm: CommStmt,
        stmts: ListRef<StmtId>,
    },
    Default {
        stmts: ListRef<StmtId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum CommStmt {
    Send { chan: ExprId, value: ExprId },
    Recv { lhs: Option<RangeLhs>, expr: ExprId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchStmt {
    Break { label: Option<IdentName> },
    Continue { label: Option<IdentName> },
    Goto { label: IdentName },
    Fallthrough,
}

/// `Block = "{" StatementList "}"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub l_brace: Span,
    pub stmts: ListRef<StmtId>,
    pub r_brace: Span,
}

/// `[ identifier ":=" ] PrimaryExpr "." "(" "type" ")"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct TypeSwitchGuard {
    #[walk(skip)]
    pub bind: Option<IdentName>,
    pub x: ExprId,
}

// =============================================================================
// Expressions
// =============================================================================

/// `LiteralValue = "{" [ ElementList [ "," ] ] "}"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct LiteralValue {
    #[walk(skip)]
    pub l_brace: Span,
    pub elements: ListRef<KeyedElement>,
    #[walk(skip)]
    pub r_brace: Span,
}

/// `KeyedElement = [ Key ":" ] Element`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct KeyedElement {
    pub key: Option<Element>,
    pub value: Element,
}

/// Key or value of a keyed element.
///
/// Struct field names are parsed as `Expr::Ident`; only the checker knows which one it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Element {
    Expr(ExprId),
    Literal(LiteralValue),
}

/// Bracket item that may be an index expression or a type argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum ExprOrType {
    Expr(ExprId),
    Type(TypeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Expr {
    Ident(#[walk(skip)] IdentName),

    BasicLit(#[walk(skip)] BasicLit),

    /// `func(x int) int { return x }`
    FuncLit { sig: SignatureId, body: Block },

    /// `T{...}`; `typ` is `None` for elided nested literals.
    CompositeLit {
        typ: Option<TypeId>,
        lit: LiteralValue,
    },

    /// `a[i]` or `F[T]`, disambiguated by the checker.
    IndexOrInstantiate {
        base: ExprId,
        args: ListRef<ExprOrType>,
    },

    Paren { expr: ExprId },

    /// `x.y`
    Selector {
        expr: ExprId,
        #[walk(skip)]
        ident: IdentName,
    },

    /// `a[lo:hi]` or `a[lo:hi:max]`
    Slice {
        expr: ExprId,
        lo: Option<ExprId>,
        hi: Option<ExprId>,
        max: Option<ExprId>,
    },

    /// `x.(T)`; `typ` is `None` for `x.(type)`.
    TypeAssert { expr: ExprId, typ: Option<TypeId> },

    /// Call or conversion: `f(args...)`, `T(x)`, `make([]int, n)`.
    Call {
        callee: ExprId,
        #[walk(skip)]
        l_paren: Span,
        args: ListRef<ExprId>,
        #[walk(skip)]
        ellipsis: Option<Span>,
        #[walk(skip)]
        r_paren: Span,
    },

    Unary {
        #[walk(skip)]
        op: UnaryOp,
        expr: ExprId,
    },

    Binary {
        left: ExprId,
        #[walk(skip)]
        op: BinaryOp,
        right: ExprId,
    },

    /// Type in expression position: `[]int{}`, `map[K]V(m)`, `make(chan T)`.
    TypeExpr(TypeId),

    /// Package member referenced by import path; never produced by the parser.
    QualifiedRef {
        #[walk(skip)]
        path: Symbol,
        #[walk(skip)]
        name: Symbol,
    },

    Bad(#[walk(skip)] Span),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicLit {
    pub kind: BasicLitKind,
    pub raw: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BasicLitKind {
    Int,
    Float,
    Imag,
    Rune,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringLit {
    pub raw: Span,
}

impl StringLit {
    /// Literal contents without quotes; escapes are left as written.
    pub fn value<'s>(&self, src: &'s str) -> &'s str {
        let raw = self.raw.text(src).unwrap_or("");
        if raw.len() >= 2 {
            &raw[1..raw.len() - 1]
        } else {
            raw
        }
    }
}

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Type {
    /// `Name`, `pkg.Name`, `Name[T]`
    Named {
        #[walk(skip)]
        pkg: Option<IdentName>,
        #[walk(skip)]
        name: IdentName,
        args: ListRef<TypeId>,
    },
    Pointer {
        elem: TypeId,
    },
    Array {
        len: ArrayLen,
        elem: TypeId,
    },
    Slice {
        elem: TypeId,
    },
    Map {
        key: TypeId,
        val: TypeId,
    },
    Chan {
        #[walk(skip)]
        dir: ChanDir,
        elem: TypeId,
    },
    Struct {
        fields: ListRef<FieldId>,
    },
    Interface {
        elems: ListRef<InterfaceElem>,
    },
    Func {
        sig: SignatureId,
    },
    Paren {
        typ: TypeId,
    },
    Bad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum ArrayLen {
    Expr(ExprId),
    /// `[...]T`
    Ellipsis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum TypeCaseElem {
    Type(TypeId),
    Nil(#[walk(skip)] Span),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum InterfaceElem {
    Method {
        #[walk(skip)]
        name: IdentName,
        sig: SignatureId,
    },
    /// Embedded interface (`io.Reader`) or union (`~int | ~string`).
    TypeElem(TypeElem),
}

// =============================================================================
// Operators
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Add,   // +
    Sub,   // -
    Not,   // !
    Xor,   // ^
    Deref, // *
    Addr,  // &
    Recv,  // <-
    Tilde, // ~ (constraint position only)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,
    LAnd,
    LOr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    /// Go operator precedence (5 binds tightest).
    pub const fn precedence(self) -> u8 {
        match self {
            Self::LOr => 1,
            Self::LAnd => 2,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge => 3,
            Self::Add | Self::Sub | Self::Or | Self::Xor => 4,
            Self::Mul
            | Self::Div
            | Self::Mod
            | Self::Shl
            | Self::Shr
            | Self::And
            | Self::AndNot => 5,
        }
    }

    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShlAssign,
    ShrAssign,
    AndNotAssign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncDecOp {
    Inc,
    Dec,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interner_dedups() {
        let mut i = Interner::new();
        let a = i.intern("Wibble");
        let b = i.intern("Wobble");
        assert_ne!(a, b);
        assert_eq!(i.intern("Wibble"), a);
        assert_eq!(i.resolve(b), "Wobble");
        assert_eq!(i.get("Wobble"), Some(b));
        assert_eq!(i.get("missing"), None);
        assert_eq!(i.len(), 2);
    }

    #[test]
    fn empty_lists_do_not_grow_buffers() {
        let mut a = AstArena::new();
        let r = a.list_exprs(std::iter::empty());
        assert!(r.is_empty());
        assert!(a.extras.exprs.is_empty());
    }

    #[test]
    fn detached_span_has_no_text() {
        assert_eq!(Span::DETACHED.text("abc"), None);
        assert_eq!(Span::new(1, 3).text("abc"), Some("bc"));
        assert_eq!(Span::new(4, 6).to(Span::new(1, 2)), Span::new(1, 6));
    }
}
