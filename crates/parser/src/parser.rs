//! Recursive-descent parser for Go source files.
//!
//! The parser stops at the first syntax error. Lexer diagnostics are collected first and
//! reported together.
//!
//! Composite literals and blocks share `{`; inside control clause headers (`if`, `for`,
//! `switch`) a bare type name followed by `{` opens the block, exactly as in Go. `expr_lev`
//! tracks that: it is `-1` in a header and grows inside any bracket pair.

use crate::ast::*;
use crate::error::{Diag, ParseFailure};
use crate::lexer::{Lexer, Spanned, Tok};
use crate::parser_support::{resolve_param_list, ParamDecl};

type PResult<T> = Result<T, Diag>;

/// A parsed file together with the arena and interner that own its nodes.
#[derive(Debug)]
pub struct SyntaxTree {
    pub arena: AstArena,
    pub interner: Interner,
    pub file: SourceFile,
}

impl SyntaxTree {
    /// Package name from the package clause.
    pub fn package_name(&self) -> &str {
        self.interner.resolve(self.file.name.sym)
    }
}

pub fn parse_source(src: &str) -> Result<SyntaxTree, ParseFailure> {
    let mut lexer = Lexer::new(src);
    let mut toks: Vec<Spanned<'_>> = lexer.by_ref().collect();
    let diags = lexer.take_diags();
    if !diags.is_empty() {
        return Err(ParseFailure { diags });
    }
    toks.push((src.len(), Tok::Eof, src.len()));

    let mut p = Parser {
        toks,
        pos: 0,
        prev_end: 0,
        expr_lev: 0,
        arena: AstArena::new(),
        interner: Interner::new(),
    };
    match p.source_file() {
        Ok(file) => Ok(SyntaxTree {
            arena: p.arena,
            interner: p.interner,
            file,
        }),
        Err(diag) => Err(ParseFailure { diags: vec![diag] }),
    }
}

/// Range clause or plain simple statement in a `for` header.
enum Header {
    Simple(SimpleStmtId),
    Range {
        lhs: Option<RangeLhs>,
        expr: ExprId,
    },
}

struct Parser<'src> {
    toks: Vec<Spanned<'src>>,
    pos: usize,
    prev_end: usize,
    expr_lev: i32,
    arena: AstArena,
    interner: Interner,
}

#[inline]
fn starts_type(t: Tok<'_>) -> bool {
    matches!(
        t,
        Tok::Ident(_)
            | Tok::LBrack
            | Tok::Star
            | Tok::KwMap
            | Tok::KwChan
            | Tok::KwFunc
            | Tok::KwStruct
            | Tok::KwInterface
            | Tok::Arrow
            | Tok::LParen
    )
}

fn binary_op(t: Tok<'_>) -> Option<BinaryOp> {
    Some(match t {
        Tok::LOr => BinaryOp::LOr,
        Tok::LAnd => BinaryOp::LAnd,
        Tok::EqEq => BinaryOp::Eq,
        Tok::NotEq => BinaryOp::Ne,
        Tok::Lt => BinaryOp::Lt,
        Tok::Le => BinaryOp::Le,
        Tok::Gt => BinaryOp::Gt,
        Tok::Ge => BinaryOp::Ge,
        Tok::Plus => BinaryOp::Add,
        Tok::Minus => BinaryOp::Sub,
        Tok::Pipe => BinaryOp::Or,
        Tok::Caret => BinaryOp::Xor,
        Tok::Star => BinaryOp::Mul,
        Tok::Slash => BinaryOp::Div,
        Tok::Percent => BinaryOp::Mod,
        Tok::Shl => BinaryOp::Shl,
        Tok::Shr => BinaryOp::Shr,
        Tok::Amp => BinaryOp::And,
        Tok::AndNot => BinaryOp::AndNot,
        _ => return None,
    })
}

fn assign_op(t: Tok<'_>) -> Option<AssignOp> {
    Some(match t {
        Tok::Assign => AssignOp::Assign,
        Tok::AddAssign => AssignOp::AddAssign,
        Tok::SubAssign => AssignOp::SubAssign,
        Tok::MulAssign => AssignOp::MulAssign,
        Tok::DivAssign => AssignOp::DivAssign,
        Tok::ModAssign => AssignOp::ModAssign,
        Tok::AndAssign => AssignOp::AndAssign,
        Tok::OrAssign => AssignOp::OrAssign,
        Tok::XorAssign => AssignOp::XorAssign,
        Tok::ShlAssign => AssignOp::ShlAssign,
        Tok::ShrAssign => AssignOp::ShrAssign,
        Tok::AndNotAssign => AssignOp::AndNotAssign,
        _ => return None,
    })
}

impl<'src> Parser<'src> {
    // -------------------------------------------------------------------------
    // Token cursor
    // -------------------------------------------------------------------------

    #[inline]
    fn cur(&self) -> Spanned<'src> {
        self.peek_tok(0)
    }

    #[inline]
    fn peek_tok(&self, n: usize) -> Spanned<'src> {
        match self.toks.get(self.pos + n).or(self.toks.last()) {
            Some(&t) => t,
            None => (0, Tok::Eof, 0),
        }
    }

    #[inline]
    fn peek(&self) -> Tok<'src> {
        self.cur().1
    }

    #[inline]
    fn peek_at(&self, n: usize) -> Tok<'src> {
        self.peek_tok(n).1
    }

    #[inline]
    fn at(&self, t: Tok<'_>) -> bool {
        self.peek() == t
    }

    fn bump(&mut self) -> Span {
        let (start, tok, end) = self.cur();
        if tok != Tok::Eof {
            self.pos += 1;
            self.prev_end = end;
        }
        Span::new(start, end)
    }

    fn eat(&mut self, t: Tok<'_>) -> Option<Span> {
        if self.at(t) {
            Some(self.bump())
        } else {
            None
        }
    }

    fn expect(&mut self, t: Tok<'_>) -> PResult<Span> {
        match self.eat(t) {
            Some(span) => Ok(span),
            None => Err(self.unexpected(&format!("{t}"))),
        }
    }

    /// `;` or a position where Go allows it to be omitted.
    fn expect_semi(&mut self) -> PResult<()> {
        match self.peek() {
            Tok::Semi => {
                self.bump();
                Ok(())
            }
            Tok::RParen | Tok::RBrace | Tok::Eof => Ok(()),
            _ => Err(self.unexpected("`;` or newline")),
        }
    }

    fn unexpected(&self, expected: &str) -> Diag {
        let (start, tok, end) = self.cur();
        let found = match tok {
            Tok::Semi if start == end => "newline".to_string(),
            Tok::Eof => "end of file".to_string(),
            other => format!("`{other}`"),
        };
        Diag::parse(
            Span::new(start, end),
            format!("expected {expected}, found {found}"),
        )
    }

    #[inline]
    fn start(&self) -> usize {
        self.cur().0
    }

    #[inline]
    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.prev_end.max(start))
    }

    fn with_lev<T>(&mut self, lev: i32, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let old = std::mem::replace(&mut self.expr_lev, lev);
        let out = f(self);
        self.expr_lev = old;
        out
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        self.with_lev(self.expr_lev + 1, f)
    }

    fn ident(&mut self) -> PResult<IdentName> {
        match self.peek() {
            Tok::Ident(name) => {
                let sym = self.interner.intern(name);
                let pos = self.bump();
                Ok(IdentName { sym, pos })
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn ident_list(&mut self) -> PResult<ListRef<IdentName>> {
        let mut names = vec![self.ident()?];
        while self.eat(Tok::Comma).is_some() {
            names.push(self.ident()?);
        }
        Ok(self.arena.list_ident_names(names))
    }

    fn string_lit(&mut self) -> PResult<StringLit> {
        match self.peek() {
            Tok::StringLit(_) | Tok::RawStringLit(_) => Ok(StringLit { raw: self.bump() }),
            _ => Err(self.unexpected("string literal")),
        }
    }

    #[inline]
    fn alloc_expr(&mut self, e: Expr, start: usize) -> ExprId {
        let span = self.span_from(start);
        self.arena.exprs.alloc(e, span)
    }

    #[inline]
    fn alloc_type(&mut self, t: Type, start: usize) -> TypeId {
        let span = self.span_from(start);
        self.arena.types.alloc(t, span)
    }

    #[inline]
    fn alloc_simple(&mut self, s: SimpleStmt, start: usize) -> SimpleStmtId {
        let span = self.span_from(start);
        self.arena.simple_stmts.alloc(s, span)
    }

    #[inline]
    fn alloc_stmt(&mut self, s: Stmt, start: usize) -> StmtId {
        let span = self.span_from(start);
        self.arena.stmts.alloc(s, span)
    }

    /// With the cursor on `[` at token index `at`: does `name [` start an array or slice
    /// type (`buf [4]byte`, `xs []int`) rather than a generic instantiation (`List[T]`)?
    fn name_then_array(&self, at: usize) -> bool {
        let mut depth = 0usize;
        let mut i = at;
        while let Some(&(_, tok, _)) = self.toks.get(i) {
            match tok {
                Tok::LBrack | Tok::LParen | Tok::LBrace => depth += 1,
                Tok::RBrack | Tok::RParen | Tok::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        if i == at + 1 {
                            return true;
                        }
                        return self
                            .toks
                            .get(i + 1)
                            .is_some_and(|&(_, next, _)| starts_type(next));
                    }
                }
                Tok::Eof => return false,
                _ => {}
            }
            i += 1;
        }
        false
    }

    // -------------------------------------------------------------------------
    // Declarations
    // -------------------------------------------------------------------------

    fn source_file(&mut self) -> PResult<SourceFile> {
        let package_pos = self.expect(Tok::KwPackage)?;
        let name = self.ident()?;
        self.expect_semi()?;

        let mut decls = Vec::new();
        while self.at(Tok::KwImport) {
            decls.push(TopLevelDecl::Decl(self.gen_decl()?));
            self.expect_semi()?;
        }
        while !self.at(Tok::Eof) {
            let decl = match self.peek() {
                Tok::KwFunc => TopLevelDecl::Func(self.func_decl()?),
                Tok::KwConst | Tok::KwVar | Tok::KwType => TopLevelDecl::Decl(self.gen_decl()?),
                Tok::KwImport => {
                    return Err(Diag::parse(
                        self.bump(),
                        "imports must appear before other declarations",
                    ))
                }
                Tok::Semi => {
                    self.bump();
                    continue;
                }
                _ => return Err(self.unexpected("declaration")),
            };
            decls.push(decl);
            self.expect_semi()?;
        }

        let decls = self.arena.list_top_decls(decls);
        Ok(SourceFile {
            package_pos,
            name,
            decls,
        })
    }

    fn gen_decl(&mut self) -> PResult<DeclId> {
        let start = self.start();
        let kind = match self.peek() {
            Tok::KwImport => GenDeclKind::Import,
            Tok::KwConst => GenDeclKind::Const,
            Tok::KwType => GenDeclKind::Type,
            Tok::KwVar => GenDeclKind::Var,
            _ => return Err(self.unexpected("declaration keyword")),
        };
        let kw_pos = self.bump();

        let mut specs = Vec::new();
        let (l_paren, r_paren) = match self.eat(Tok::LParen) {
            Some(l_paren) => {
                let mut iota = 0;
                while !self.at(Tok::RParen) && !self.at(Tok::Eof) {
                    specs.push(self.spec(kind, iota)?);
                    iota += 1;
                    self.expect_semi()?;
                }
                (Some(l_paren), Some(self.expect(Tok::RParen)?))
            }
            None => {
                specs.push(self.spec(kind, 0)?);
                (None, None)
            }
        };

        let specs = self.arena.list_specs(specs);
        let decl = Decl::Gen(GenDecl {
            kw_pos,
            kind,
            l_paren,
            specs,
            r_paren,
        });
        let span = self.span_from(start);
        Ok(self.arena.decls.alloc(decl, span))
    }

    fn spec(&mut self, kind: GenDeclKind, iota: u32) -> PResult<Spec> {
        Ok(match kind {
            GenDeclKind::Import => Spec::Import(self.import_spec()?),
            GenDeclKind::Type => Spec::Type(self.type_spec()?),
            GenDeclKind::Const | GenDeclKind::Var => Spec::Value(self.value_spec(iota)?),
        })
    }

    fn import_spec(&mut self) -> PResult<ImportSpec> {
        let start = self.start();
        let name = match self.peek() {
            Tok::Dot => Some(ImportName::Dot(self.bump())),
            Tok::Ident("_") => Some(ImportName::Blank(self.bump())),
            Tok::Ident(_) => Some(ImportName::Name(self.ident()?)),
            _ => None,
        };
        let path = self.string_lit()?;
        Ok(ImportSpec {
            name,
            path,
            span: self.span_from(start),
        })
    }

    fn value_spec(&mut self, iota: u32) -> PResult<ValueSpec> {
        let names = self.ident_list()?;
        let typ = match self.peek() {
            Tok::Assign | Tok::Semi | Tok::RParen | Tok::Eof => None,
            _ => Some(self.ty()?),
        };
        let values = match self.eat(Tok::Assign) {
            Some(_) => {
                let values = self.expr_list()?;
                self.arena.list_exprs(values)
            }
            None => ListRef::EMPTY,
        };
        Ok(ValueSpec {
            names,
            typ,
            values,
            iota,
        })
    }

    /// `type A [N]int` declares an array; `type L[T any] ...` declares type parameters.
    fn bracket_starts_type_params(&self) -> bool {
        matches!(self.peek_at(1), Tok::Ident(_))
            && matches!(
                self.peek_at(2),
                Tok::Ident(_)
                    | Tok::Comma
                    | Tok::Tilde
                    | Tok::Star
                    | Tok::LBrack
                    | Tok::LParen
                    | Tok::KwInterface
                    | Tok::KwMap
                    | Tok::KwChan
                    | Tok::KwFunc
                    | Tok::KwStruct
            )
    }

    fn type_spec(&mut self) -> PResult<TypeSpec> {
        let name = self.ident()?;
        let type_params = if self.at(Tok::LBrack) && self.bracket_starts_type_params() {
            Some(self.type_params()?)
        } else {
            None
        };
        let alias = self.eat(Tok::Assign).is_some();
        let typ = self.ty()?;
        Ok(TypeSpec {
            name,
            type_params,
            alias,
            typ,
        })
    }

    fn func_decl(&mut self) -> PResult<FuncDeclId> {
        let start = self.start();
        let func_pos = self.expect(Tok::KwFunc)?;
        let recv = if self.at(Tok::LParen) {
            Some(self.receiver()?)
        } else {
            None
        };
        let name = self.ident()?;
        let type_params = if self.at(Tok::LBrack) {
            Some(self.type_params()?)
        } else {
            None
        };
        let signature = self.signature()?;
        let body = if self.at(Tok::LBrace) {
            Some(self.with_lev(0, |p| p.block())?)
        } else {
            None
        };

        let decl = FuncDecl {
            func_pos,
            recv,
            name,
            type_params,
            signature,
            body,
        };
        let span = self.span_from(start);
        Ok(self.arena.funcs.alloc(decl, span))
    }

    fn receiver(&mut self) -> PResult<Receiver> {
        self.expect(Tok::LParen)?;
        let name = match (self.peek(), self.peek_at(1)) {
            (Tok::Ident(_), Tok::Ident(_) | Tok::Star) => Some(self.ident()?),
            _ => None,
        };
        let typ = self.ty()?;
        self.eat(Tok::Comma);
        self.expect(Tok::RParen)?;

        let mut base = typ;
        while let Type::Pointer { elem } | Type::Paren { typ: elem } = self.arena.types[base] {
            base = elem;
        }
        let mut params = Vec::new();
        if let Type::Named { args, .. } = self.arena.types[base] {
            for &arg in self.arena.types_list(args) {
                match self.arena.types[arg] {
                    Type::Named {
                        pkg: None, name, ..
                    } => params.push(name),
                    _ => {
                        return Err(Diag::parse(
                            self.arena.types.span(arg),
                            "receiver type parameter must be an identifier",
                        ))
                    }
                }
            }
        }
        let type_params = self.arena.list_ident_names(params);

        Ok(Receiver {
            name,
            typ,
            type_params,
        })
    }

    fn type_params(&mut self) -> PResult<TypeParamsId> {
        let start = self.start();
        self.expect(Tok::LBrack)?;
        let mut decls = Vec::new();
        while !self.at(Tok::RBrack) {
            let names = self.ident_list()?;
            let constraint = self.type_elem()?;
            decls.push(TypeParamDecl { names, constraint });
            if self.eat(Tok::Comma).is_none() {
                break;
            }
        }
        self.expect(Tok::RBrack)?;
        let params = self.arena.list_type_param_decls(decls);
        let span = self.span_from(start);
        Ok(self.arena.type_params.alloc(TypeParams { params }, span))
    }

    fn type_elem(&mut self) -> PResult<TypeElem> {
        let mut terms = Vec::new();
        loop {
            let term = match self.eat(Tok::Tilde) {
                Some(tilde_pos) => TypeTerm::Tilde {
                    tilde_pos,
                    typ: self.ty()?,
                },
                None => TypeTerm::Type { typ: self.ty()? },
            };
            terms.push(term);
            if self.eat(Tok::Pipe).is_none() {
                break;
            }
        }
        Ok(TypeElem {
            terms: self.arena.list_type_terms(terms),
        })
    }

    // -------------------------------------------------------------------------
    // Signatures and types
    // -------------------------------------------------------------------------

    fn signature(&mut self) -> PResult<SignatureId> {
        let start = self.start();
        let params = self.params()?;
        let results = match self.peek() {
            Tok::LParen => Some(Results::Params(self.params()?)),
            t if starts_type(t) => Some(Results::Type(self.ty()?)),
            _ => None,
        };
        let span = self.span_from(start);
        Ok(self
            .arena
            .signatures
            .alloc(Signature { params, results }, span))
    }

    fn params(&mut self) -> PResult<FieldList> {
        let l_paren = self.expect(Tok::LParen)?;
        let mut entries = Vec::new();
        while !self.at(Tok::RParen) {
            entries.push(self.param_decl()?);
            if self.eat(Tok::Comma).is_none() {
                break;
            }
        }
        let r_paren = self.expect(Tok::RParen)?;

        let fields = resolve_param_list(&mut self.arena, entries)
            .map_err(|span| Diag::parse(span, "mixed named and unnamed parameters"))?;
        let fields = self.arena.list_fields(fields);
        Ok(FieldList {
            l_paren,
            fields,
            r_paren,
        })
    }

    fn param_decl(&mut self) -> PResult<ParamDecl> {
        let start = self.start();
        let (name, ellipsis_pos, typ) = match (self.peek(), self.peek_at(1)) {
            (Tok::Ident(_), Tok::Comma | Tok::RParen) => (Some(self.ident()?), None, None),
            (Tok::Ident(_), Tok::Dot) => (None, None, Some(self.ty()?)),
            (Tok::Ident(_), Tok::LBrack) if !self.name_then_array(self.pos + 1) => {
                (None, None, Some(self.ty()?))
            }
            (Tok::Ident(_), Tok::Ellipsis) => {
                let name = self.ident()?;
                let ellipsis = self.bump();
                (Some(name), Some(ellipsis), Some(self.ty()?))
            }
            (Tok::Ident(_), _) => {
                let name = self.ident()?;
                (Some(name), None, Some(self.ty()?))
            }
            (Tok::Ellipsis, _) => {
                let ellipsis = self.bump();
                (None, Some(ellipsis), Some(self.ty()?))
            }
            _ => (None, None, Some(self.ty()?)),
        };
        Ok(ParamDecl {
            name,
            ellipsis_pos,
            typ,
            span: self.span_from(start),
        })
    }

    fn ty(&mut self) -> PResult<TypeId> {
        let start = self.start();
        let t = match self.peek() {
            Tok::Ident(_) => {
                let first = self.ident()?;
                let (pkg, name) = match self.eat(Tok::Dot) {
                    Some(_) => (Some(first), self.ident()?),
                    None => (None, first),
                };
                let args = if self.at(Tok::LBrack) {
                    self.type_args()?
                } else {
                    ListRef::EMPTY
                };
                Type::Named { pkg, name, args }
            }
            Tok::Star => {
                self.bump();
                Type::Pointer { elem: self.ty()? }
            }
            Tok::LBrack => {
                self.bump();
                if self.eat(Tok::RBrack).is_some() {
                    Type::Slice { elem: self.ty()? }
                } else {
                    let len = match self.eat(Tok::Ellipsis) {
                        Some(_) => ArrayLen::Ellipsis,
                        None => ArrayLen::Expr(self.nested(|p| p.expr())?),
                    };
                    self.expect(Tok::RBrack)?;
                    Type::Array {
                        len,
                        elem: self.ty()?,
                    }
                }
            }
            Tok::KwMap => {
                self.bump();
                self.expect(Tok::LBrack)?;
                let key = self.ty()?;
                self.expect(Tok::RBrack)?;
                Type::Map {
                    key,
                    val: self.ty()?,
                }
            }
            Tok::KwChan => {
                self.bump();
                let dir = match self.eat(Tok::Arrow) {
                    Some(_) => ChanDir::Send,
                    None => ChanDir::Both,
                };
                Type::Chan {
                    dir,
                    elem: self.ty()?,
                }
            }
            Tok::Arrow => {
                self.bump();
                self.expect(Tok::KwChan)?;
                Type::Chan {
                    dir: ChanDir::Recv,
                    elem: self.ty()?,
                }
            }
            Tok::KwFunc => {
                self.bump();
                Type::Func {
                    sig: self.signature()?,
                }
            }
            Tok::KwStruct => self.struct_type()?,
            Tok::KwInterface => self.interface_type()?,
            Tok::LParen => {
                self.bump();
                let typ = self.ty()?;
                self.expect(Tok::RParen)?;
                Type::Paren { typ }
            }
            _ => return Err(self.unexpected("type")),
        };
        Ok(self.alloc_type(t, start))
    }

    fn type_args(&mut self) -> PResult<ListRef<TypeId>> {
        self.expect(Tok::LBrack)?;
        let mut args = Vec::new();
        while !self.at(Tok::RBrack) {
            args.push(self.ty()?);
            if self.eat(Tok::Comma).is_none() {
                break;
            }
        }
        self.expect(Tok::RBrack)?;
        Ok(self.arena.list_types(args))
    }

    fn struct_type(&mut self) -> PResult<Type> {
        self.expect(Tok::KwStruct)?;
        self.expect(Tok::LBrace)?;
        let mut fields = Vec::new();
        while !self.at(Tok::RBrace) && !self.at(Tok::Eof) {
            fields.push(self.struct_field()?);
            self.expect_semi()?;
        }
        self.expect(Tok::RBrace)?;
        Ok(Type::Struct {
            fields: self.arena.list_fields(fields),
        })
    }

    fn struct_field(&mut self) -> PResult<FieldId> {
        let start = self.start();
        let is_embed = match (self.peek(), self.peek_at(1)) {
            (Tok::Star, _) => true,
            (
                Tok::Ident(_),
                Tok::Dot | Tok::Semi | Tok::RBrace | Tok::StringLit(_) | Tok::RawStringLit(_),
            ) => true,
            (Tok::Ident(_), Tok::LBrack) => !self.name_then_array(self.pos + 1),
            _ => false,
        };
        let names = if is_embed {
            ListRef::EMPTY
        } else {
            self.ident_list()?
        };
        let typ = self.ty()?;
        let tag = match self.peek() {
            Tok::StringLit(_) | Tok::RawStringLit(_) => Some(self.string_lit()?),
            _ => None,
        };
        let field = Field {
            names,
            ellipsis_pos: None,
            typ,
            tag,
            is_embed,
        };
        let span = self.span_from(start);
        Ok(self.arena.fields.alloc(field, span))
    }

    fn interface_type(&mut self) -> PResult<Type> {
        self.expect(Tok::KwInterface)?;
        self.expect(Tok::LBrace)?;
        let mut elems = Vec::new();
        while !self.at(Tok::RBrace) && !self.at(Tok::Eof) {
            let elem = match (self.peek(), self.peek_at(1)) {
                (Tok::Ident(_), Tok::LParen) => {
                    let name = self.ident()?;
                    InterfaceElem::Method {
                        name,
                        sig: self.signature()?,
                    }
                }
                _ => InterfaceElem::TypeElem(self.type_elem()?),
            };
            elems.push(elem);
            self.expect_semi()?;
        }
        self.expect(Tok::RBrace)?;
        Ok(Type::Interface {
            elems: self.arena.list_interface_elems(elems),
        })
    }

    // -------------------------------------------------------------------------
    // Expressions
    // -------------------------------------------------------------------------

    fn expr_list(&mut self) -> PResult<Vec<ExprId>> {
        let mut out = vec![self.expr()?];
        while self.eat(Tok::Comma).is_some() {
            out.push(self.expr()?);
        }
        Ok(out)
    }

    fn expr(&mut self) -> PResult<ExprId> {
        self.binary_expr(1)
    }

    fn binary_expr(&mut self, min_prec: u8) -> PResult<ExprId> {
        let start = self.start();
        let mut left = self.unary_expr()?;
        while let Some(op) = binary_op(self.peek()) {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.bump();
            let right = self.binary_expr(prec + 1)?;
            left = self.alloc_expr(Expr::Binary { left, op, right }, start);
        }
        Ok(left)
    }

    fn unary_expr(&mut self) -> PResult<ExprId> {
        let start = self.start();
        let op = match self.peek() {
            Tok::Plus => UnaryOp::Add,
            Tok::Minus => UnaryOp::Sub,
            Tok::Bang => UnaryOp::Not,
            Tok::Caret => UnaryOp::Xor,
            Tok::Star => UnaryOp::Deref,
            Tok::Amp => UnaryOp::Addr,
            Tok::Arrow if self.peek_at(1) == Tok::KwChan => {
                let typ = self.ty()?;
                return Ok(self.alloc_expr(Expr::TypeExpr(typ), start));
            }
            Tok::Arrow => UnaryOp::Recv,
            _ => return self.primary_expr(),
        };
        self.bump();
        let expr = self.unary_expr()?;
        Ok(self.alloc_expr(Expr::Unary { op, expr }, start))
    }

    fn primary_expr(&mut self) -> PResult<ExprId> {
        let start = self.start();
        let mut x = self.operand()?;
        loop {
            match self.peek() {
                Tok::Dot => {
                    self.bump();
                    if self.eat(Tok::LParen).is_some() {
                        let typ = match self.eat(Tok::KwType) {
                            Some(_) => None,
                            None => Some(self.ty()?),
                        };
                        self.expect(Tok::RParen)?;
                        x = self.alloc_expr(Expr::TypeAssert { expr: x, typ }, start);
                    } else {
                        let ident = self.ident()?;
                        x = self.alloc_expr(Expr::Selector { expr: x, ident }, start);
                    }
                }
                Tok::LBrack => x = self.index_or_slice(x, start)?,
                Tok::LParen => x = self.call(x, start)?,
                Tok::LBrace
                    if self.is_literal_type(x) && (self.expr_lev >= 0 || !self.is_type_name(x)) =>
                {
                    let typ = self.expr_to_type(x)?;
                    let lit = self.literal_value()?;
                    x = self.alloc_expr(
                        Expr::CompositeLit {
                            typ: Some(typ),
                            lit,
                        },
                        start,
                    );
                }
                _ => return Ok(x),
            }
        }
    }

    fn operand(&mut self) -> PResult<ExprId> {
        let start = self.start();
        let e = match self.peek() {
            Tok::Ident(_) => Expr::Ident(self.ident()?),
            Tok::IntLit(_) => self.basic_lit(BasicLitKind::Int),
            Tok::FloatLit(_) => self.basic_lit(BasicLitKind::Float),
            Tok::ImagLit(_) => self.basic_lit(BasicLitKind::Imag),
            Tok::RuneLit(_) => self.basic_lit(BasicLitKind::Rune),
            Tok::StringLit(_) | Tok::RawStringLit(_) => self.basic_lit(BasicLitKind::String),
            Tok::LParen => {
                self.bump();
                let expr = self.nested(|p| p.expr())?;
                self.expect(Tok::RParen)?;
                Expr::Paren { expr }
            }
            Tok::KwFunc => {
                self.bump();
                let sig = self.signature()?;
                if self.at(Tok::LBrace) {
                    let body = self.with_lev(0, |p| p.block())?;
                    Expr::FuncLit { sig, body }
                } else {
                    Expr::TypeExpr(self.alloc_type(Type::Func { sig }, start))
                }
            }
            Tok::LBrack | Tok::KwMap | Tok::KwChan | Tok::KwStruct | Tok::KwInterface => {
                Expr::TypeExpr(self.ty()?)
            }
            _ => return Err(self.unexpected("expression")),
        };
        Ok(self.alloc_expr(e, start))
    }

    fn basic_lit(&mut self, kind: BasicLitKind) -> Expr {
        let raw = self.bump();
        Expr::BasicLit(BasicLit { kind, raw })
    }

    fn index_or_slice(&mut self, base: ExprId, start: usize) -> PResult<ExprId> {
        self.expect(Tok::LBrack)?;
        let e = self.nested(|p| {
            let first = if p.at(Tok::Colon) {
                None
            } else {
                Some(p.expr_or_type()?)
            };

            if p.eat(Tok::Colon).is_some() {
                let lo = match first {
                    Some(ExprOrType::Expr(e)) => Some(e),
                    Some(ExprOrType::Type(t)) => {
                        return Err(Diag::parse(p.arena.types.span(t), "expected expression"))
                    }
                    None => None,
                };
                let hi = match p.peek() {
                    Tok::Colon | Tok::RBrack => None,
                    _ => Some(p.expr()?),
                };
                let max = match p.eat(Tok::Colon) {
                    Some(_) => Some(p.expr()?),
                    None => None,
                };
                return Ok(Expr::Slice {
                    expr: base,
                    lo,
                    hi,
                    max,
                });
            }

            let mut args: Vec<ExprOrType> = first.into_iter().collect();
            while p.eat(Tok::Comma).is_some() {
                if p.at(Tok::RBrack) {
                    break;
                }
                args.push(p.expr_or_type()?);
            }
            Ok(Expr::IndexOrInstantiate {
                base,
                args: p.arena.list_expr_or_types(args),
            })
        })?;
        self.expect(Tok::RBrack)?;
        Ok(self.alloc_expr(e, start))
    }

    fn expr_or_type(&mut self) -> PResult<ExprOrType> {
        let e = self.expr()?;
        Ok(match self.arena.exprs[e] {
            Expr::TypeExpr(t) => ExprOrType::Type(t),
            _ => ExprOrType::Expr(e),
        })
    }

    fn call(&mut self, callee: ExprId, start: usize) -> PResult<ExprId> {
        let l_paren = self.expect(Tok::LParen)?;
        let (args, ellipsis) = self.nested(|p| {
            let mut args = Vec::new();
            let mut ellipsis = None;
            while !p.at(Tok::RParen) {
                args.push(p.expr()?);
                if let Some(span) = p.eat(Tok::Ellipsis) {
                    ellipsis = Some(span);
                }
                if p.eat(Tok::Comma).is_none() {
                    break;
                }
            }
            Ok((args, ellipsis))
        })?;
        let r_paren = self.expect(Tok::RParen)?;
        let args = self.arena.list_exprs(args);
        Ok(self.alloc_expr(
            Expr::Call {
                callee,
                l_paren,
                args,
                ellipsis,
                r_paren,
            },
            start,
        ))
    }

    fn is_type_name(&self, e: ExprId) -> bool {
        match self.arena.exprs[e] {
            Expr::Ident(_) => true,
            Expr::Selector { expr, .. } => matches!(self.arena.exprs[expr], Expr::Ident(_)),
            Expr::IndexOrInstantiate { base, .. } => self.is_type_name(base),
            _ => false,
        }
    }

    fn is_literal_type(&self, e: ExprId) -> bool {
        match self.arena.exprs[e] {
            Expr::TypeExpr(t) => matches!(
                self.arena.types[t],
                Type::Array { .. } | Type::Slice { .. } | Type::Map { .. } | Type::Struct { .. }
            ),
            _ => self.is_type_name(e),
        }
    }

    /// Reinterprets an expression that names a type (`T`, `pkg.T`, `T[int]`).
    fn expr_to_type(&mut self, e: ExprId) -> PResult<TypeId> {
        let span = self.arena.exprs.span(e);
        let t = match self.arena.exprs[e] {
            Expr::TypeExpr(t) => return Ok(t),
            Expr::Ident(name) => Type::Named {
                pkg: None,
                name,
                args: ListRef::EMPTY,
            },
            Expr::Selector { expr, ident } => match self.arena.exprs[expr] {
                Expr::Ident(pkg) => Type::Named {
                    pkg: Some(pkg),
                    name: ident,
                    args: ListRef::EMPTY,
                },
                _ => return Err(Diag::parse(span, "expected type")),
            },
            Expr::IndexOrInstantiate { base, args } => {
                let base = self.expr_to_type(base)?;
                let Type::Named { pkg, name, .. } = self.arena.types[base] else {
                    return Err(Diag::parse(span, "expected generic type"));
                };
                let mut targs = Vec::new();
                for i in 0..args.len() as usize {
                    let arg = self.arena.expr_or_types(args)[i];
                    targs.push(match arg {
                        ExprOrType::Type(t) => t,
                        ExprOrType::Expr(e) => self.expr_to_type(e)?,
                    });
                }
                Type::Named {
                    pkg,
                    name,
                    args: self.arena.list_types(targs),
                }
            }
            Expr::Paren { expr } => return self.expr_to_type(expr),
            Expr::Unary {
                op: UnaryOp::Deref,
                expr,
            } => Type::Pointer {
                elem: self.expr_to_type(expr)?,
            },
            _ => return Err(Diag::parse(span, "expected type")),
        };
        Ok(self.arena.types.alloc(t, span))
    }

    fn literal_value(&mut self) -> PResult<LiteralValue> {
        let l_brace = self.expect(Tok::LBrace)?;
        let elements = self.nested(|p| {
            let mut elems = Vec::new();
            while !p.at(Tok::RBrace) {
                let first = p.element()?;
                let elem = match p.eat(Tok::Colon) {
                    Some(_) => KeyedElement {
                        key: Some(first),
                        value: p.element()?,
                    },
                    None => KeyedElement {
                        key: None,
                        value: first,
                    },
                };
                elems.push(elem);
                if p.eat(Tok::Comma).is_none() {
                    break;
                }
            }
            Ok(p.arena.list_keyed_elems(elems))
        })?;
        let r_brace = self.expect(Tok::RBrace)?;
        Ok(LiteralValue {
            l_brace,
            elements,
            r_brace,
        })
    }

    fn element(&mut self) -> PResult<Element> {
        if self.at(Tok::LBrace) {
            Ok(Element::Literal(self.literal_value()?))
        } else {
            Ok(Element::Expr(self.expr()?))
        }
    }

    // -------------------------------------------------------------------------
    // Statements
    // -------------------------------------------------------------------------

    fn block(&mut self) -> PResult<Block> {
        let l_brace = self.expect(Tok::LBrace)?;
        let stmts = self.stmt_list()?;
        let r_brace = self.expect(Tok::RBrace)?;
        Ok(Block {
            l_brace,
            stmts,
            r_brace,
        })
    }

    fn stmt_list(&mut self) -> PResult<ListRef<StmtId>> {
        let mut out = Vec::new();
        while !matches!(
            self.peek(),
            Tok::RBrace | Tok::KwCase | Tok::KwDefault | Tok::Eof
        ) {
            if self.eat(Tok::Semi).is_some() {
                continue;
            }
            out.push(self.stmt()?);
            if !matches!(self.peek(), Tok::KwCase | Tok::KwDefault) {
                self.expect_semi()?;
            }
        }
        Ok(self.arena.list_stmts(out))
    }

    fn stmt(&mut self) -> PResult<StmtId> {
        let start = self.start();
        let s = match self.peek() {
            Tok::KwVar | Tok::KwConst | Tok::KwType => Stmt::Decl(self.gen_decl()?),
            Tok::KwGo => {
                self.bump();
                Stmt::Go { call: self.expr()? }
            }
            Tok::KwDefer => {
                self.bump();
                Stmt::Defer { call: self.expr()? }
            }
            Tok::KwReturn => {
                self.bump();
                let results = match self.peek() {
                    Tok::Semi | Tok::RBrace => ListRef::EMPTY,
                    _ => {
                        let results = self.expr_list()?;
                        self.arena.list_exprs(results)
                    }
                };
                Stmt::Return { results }
            }
            Tok::KwBreak => {
                self.bump();
                Stmt::Branch(BranchStmt::Break {
                    label: self.opt_label()?,
                })
            }
            Tok::KwContinue => {
                self.bump();
                Stmt::Branch(BranchStmt::Continue {
                    label: self.opt_label()?,
                })
            }
            Tok::KwGoto => {
                self.bump();
                Stmt::Branch(BranchStmt::Goto {
                    label: self.ident()?,
                })
            }
            Tok::KwFallthrough => {
                self.bump();
                Stmt::Branch(BranchStmt::Fallthrough)
            }
            Tok::LBrace => Stmt::Block(self.block()?),
            Tok::KwIf => self.if_stmt()?,
            Tok::KwFor => self.for_stmt()?,
            Tok::KwSwitch => self.switch_stmt()?,
            Tok::KwSelect => self.select_stmt()?,
            Tok::Ident(_) if self.peek_at(1) == Tok::Colon => {
                let label = self.ident()?;
                self.bump();
                let stmt = match self.peek() {
                    Tok::RBrace | Tok::Semi => {
                        let at = self.start();
                        let empty = self.alloc_simple(SimpleStmt::Empty(Span::empty_at(at)), at);
                        self.alloc_stmt(Stmt::Simple(empty), at)
                    }
                    _ => self.stmt()?,
                };
                Stmt::Labeled { label, stmt }
            }
            _ => Stmt::Simple(self.simple_stmt()?),
        };
        Ok(self.alloc_stmt(s, start))
    }

    fn opt_label(&mut self) -> PResult<Option<IdentName>> {
        match self.peek() {
            Tok::Ident(_) => Ok(Some(self.ident()?)),
            _ => Ok(None),
        }
    }

    fn simple_stmt(&mut self) -> PResult<SimpleStmtId> {
        match self.simple_or_range(false)? {
            Header::Simple(s) => Ok(s),
            Header::Range { expr, .. } => Err(Diag::parse(
                self.arena.exprs.span(expr),
                "range clause outside of for statement",
            )),
        }
    }

    fn simple_or_range(&mut self, range_ok: bool) -> PResult<Header> {
        let start = self.start();
        let lhs = self.expr_list()?;
        let tok = self.peek();

        let s = if tok == Tok::Define || tok == Tok::Assign {
            self.bump();
            let define = tok == Tok::Define;
            if range_ok && self.eat(Tok::KwRange).is_some() {
                let expr = self.expr()?;
                let lhs = if define {
                    RangeLhs::Def {
                        idents: self.idents_of(&lhs)?,
                    }
                } else {
                    RangeLhs::Assign {
                        exprs: self.arena.list_exprs(lhs),
                    }
                };
                return Ok(Header::Range {
                    lhs: Some(lhs),
                    expr,
                });
            }
            let rhs = self.expr_list()?;
            if define {
                SimpleStmt::ShortVarDecl {
                    names: self.idents_of(&lhs)?,
                    values: self.arena.list_exprs(rhs),
                }
            } else {
                SimpleStmt::Assign {
                    lhs: self.arena.list_exprs(lhs),
                    op: AssignOp::Assign,
                    rhs: self.arena.list_exprs(rhs),
                }
            }
        } else if let Some(op) = assign_op(tok) {
            self.bump();
            let rhs = self.expr_list()?;
            SimpleStmt::Assign {
                lhs: self.arena.list_exprs(lhs),
                op,
                rhs: self.arena.list_exprs(rhs),
            }
        } else {
            let &[x] = lhs.as_slice() else {
                return Err(self.unexpected("`:=`, `=` or assignment operator"));
            };
            match tok {
                Tok::Inc | Tok::Dec => {
                    self.bump();
                    let op = if tok == Tok::Inc {
                        IncDecOp::Inc
                    } else {
                        IncDecOp::Dec
                    };
                    SimpleStmt::IncDec { expr: x, op }
                }
                Tok::Arrow => {
                    self.bump();
                    SimpleStmt::Send {
                        chan: x,
                        value: self.expr()?,
                    }
                }
                _ => SimpleStmt::Expr(x),
            }
        };
        Ok(Header::Simple(self.alloc_simple(s, start)))
    }

    fn idents_of(&mut self, exprs: &[ExprId]) -> PResult<ListRef<IdentName>> {
        let mut names = Vec::with_capacity(exprs.len());
        for &e in exprs {
            match self.arena.exprs[e] {
                Expr::Ident(name) => names.push(name),
                _ => {
                    return Err(Diag::parse(
                        self.arena.exprs.span(e),
                        "non-name on left side of :=",
                    ))
                }
            }
        }
        Ok(self.arena.list_ident_names(names))
    }

    fn stmt_expr(&self, s: SimpleStmtId) -> PResult<ExprId> {
        match self.arena.simple_stmts[s] {
            SimpleStmt::Expr(e) => Ok(e),
            _ => Err(Diag::parse(
                self.arena.simple_stmts.span(s),
                "expected expression",
            )),
        }
    }

    fn if_stmt(&mut self) -> PResult<Stmt> {
        let if_pos = self.expect(Tok::KwIf)?;
        let (init, cond) = self.with_lev(-1, |p| {
            if p.at(Tok::LBrace) {
                return Err(Diag::parse(if_pos, "missing condition in if statement"));
            }
            let first = if p.at(Tok::Semi) {
                None
            } else {
                Some(p.simple_stmt()?)
            };
            match (p.eat(Tok::Semi), first) {
                (Some(_), init) => Ok((init, p.expr()?)),
                (None, Some(s)) => Ok((None, p.stmt_expr(s)?)),
                (None, None) => Err(p.unexpected("condition")),
            }
        })?;
        let then_block = self.block()?;

        let else_stmt = match self.eat(Tok::KwElse) {
            Some(_) => {
                let start = self.start();
                let s = match self.peek() {
                    Tok::KwIf => self.if_stmt()?,
                    Tok::LBrace => Stmt::Block(self.block()?),
                    _ => return Err(self.unexpected("`if` or block after else")),
                };
                Some(self.alloc_stmt(s, start))
            }
            None => None,
        };

        Ok(Stmt::If {
            init,
            cond,
            then_block,
            else_stmt,
        })
    }

    fn for_stmt(&mut self) -> PResult<Stmt> {
        self.expect(Tok::KwFor)?;
        let kind = self.with_lev(-1, |p| {
            if p.at(Tok::LBrace) {
                return Ok(ForKind::Infinite);
            }
            if p.eat(Tok::KwRange).is_some() {
                return Ok(ForKind::Range {
                    lhs: None,
                    expr: p.expr()?,
                });
            }

            let init = if p.at(Tok::Semi) {
                None
            } else {
                match p.simple_or_range(true)? {
                    Header::Range { lhs, expr } => return Ok(ForKind::Range { lhs, expr }),
                    Header::Simple(s) => Some(s),
                }
            };
            if p.eat(Tok::Semi).is_none() {
                return match init {
                    Some(s) => Ok(ForKind::Cond(p.stmt_expr(s)?)),
                    None => Err(p.unexpected("for clause")),
                };
            }
            let cond = match p.peek() {
                Tok::Semi => None,
                _ => Some(p.expr()?),
            };
            p.expect(Tok::Semi)?;
            let post = match p.peek() {
                Tok::LBrace => None,
                _ => Some(p.simple_stmt()?),
            };
            Ok(ForKind::ForClause { init, cond, post })
        })?;
        let block = self.block()?;
        Ok(Stmt::For { kind, block })
    }

    fn switch_stmt(&mut self) -> PResult<Stmt> {
        self.expect(Tok::KwSwitch)?;
        let (init, tag) = self.with_lev(-1, |p| {
            if p.at(Tok::LBrace) {
                return Ok((None, None));
            }
            let first = if p.at(Tok::Semi) {
                None
            } else {
                Some(p.simple_stmt()?)
            };
            if p.eat(Tok::Semi).is_none() {
                return Ok((None, first));
            }
            let tag = if p.at(Tok::LBrace) {
                None
            } else {
                Some(p.simple_stmt()?)
            };
            Ok((first, tag))
        })?;

        if let Some(guard) = tag.and_then(|s| self.type_switch_guard(s)) {
            let clauses = self.switch_body(true)?;
            return Ok(Stmt::TypeSwitch {
                init,
                guard,
                clauses,
            });
        }
        let tag = match tag {
            Some(s) => Some(self.stmt_expr(s)?),
            None => None,
        };
        let clauses = self.switch_body(false)?;
        Ok(Stmt::Switch { init, tag, clauses })
    }

    fn type_switch_guard(&self, s: SimpleStmtId) -> Option<TypeSwitchGuard> {
        let asserted = |e: ExprId| match self.arena.exprs[e] {
            Expr::TypeAssert { expr, typ: None } => Some(expr),
            _ => None,
        };
        match self.arena.simple_stmts[s] {
            SimpleStmt::Expr(e) => Some(TypeSwitchGuard {
                bind: None,
                x: asserted(e)?,
            }),
            SimpleStmt::ShortVarDecl { names, values } => {
                let (&[bind], &[value]) =
                    (self.arena.ident_names(names), self.arena.exprs_list(values))
                else {
                    return None;
                };
                Some(TypeSwitchGuard {
                    bind: Some(bind),
                    x: asserted(value)?,
                })
            }
            _ => None,
        }
    }

    fn switch_body(&mut self, type_switch: bool) -> PResult<ListRef<SwitchClauseId>> {
        self.expect(Tok::LBrace)?;
        let mut clauses = Vec::new();
        while !self.at(Tok::RBrace) && !self.at(Tok::Eof) {
            let start = self.start();
            let is_default = match self.peek() {
                Tok::KwCase => false,
                Tok::KwDefault => true,
                _ => return Err(self.unexpected("`case` or `default`")),
            };
            self.bump();

            let clause = if type_switch {
                let items = if is_default {
                    ListRef::EMPTY
                } else {
                    self.type_case_list()?
                };
                self.expect(Tok::Colon)?;
                SwitchClause::TypeCase {
                    is_default,
                    items,
                    stmts: self.stmt_list()?,
                }
            } else {
                let items = if is_default {
                    ListRef::EMPTY
                } else {
                    let items = self.expr_list()?;
                    self.arena.list_exprs(items)
                };
                self.expect(Tok::Colon)?;
                SwitchClause::ExprCase {
                    is_default,
                    items,
                    stmts: self.stmt_list()?,
                }
            };
            let span = self.span_from(start);
            clauses.push(self.arena.switch_clauses.alloc(clause, span));
        }
        self.expect(Tok::RBrace)?;
        Ok(self.arena.list_switch_clause_ids(clauses))
    }

    fn type_case_list(&mut self) -> PResult<ListRef<TypeCaseElem>> {
        let mut items = Vec::new();
        loop {
            let item = match self.peek() {
                Tok::Ident("nil") => TypeCaseElem::Nil(self.bump()),
                _ => TypeCaseElem::Type(self.ty()?),
            };
            items.push(item);
            if self.eat(Tok::Comma).is_none() {
                break;
            }
        }
        Ok(self.arena.list_type_cases(items))
    }

    fn select_stmt(&mut self) -> PResult<Stmt> {
        self.expect(Tok::KwSelect)?;
        self.expect(Tok::LBrace)?;
        let mut clauses = Vec::new();
        while !self.at(Tok::RBrace) && !self.at(Tok::Eof) {
            let start = self.start();
            let clause = match self.peek() {
                Tok::KwCase => {
                    self.bump();
                    let comm = self.comm_stmt()?;
                    self.expect(Tok::Colon)?;
                    CommClause::Case {
                        comm,
                        stmts: self.stmt_list()?,
                    }
                }
                Tok::KwDefault => {
                    self.bump();
                    self.expect(Tok::Colon)?;
                    CommClause::Default {
                        stmts: self.stmt_list()?,
                    }
                }
                _ => return Err(self.unexpected("`case` or `default`")),
            };
            let span = self.span_from(start);
            clauses.push(self.arena.comm_clauses.alloc(clause, span));
        }
        self.expect(Tok::RBrace)?;
        Ok(Stmt::Select {
            clauses: self.arena.list_comm_clause_ids(clauses),
        })
    }

    fn comm_stmt(&mut self) -> PResult<CommStmt> {
        let s = self.simple_stmt()?;
        let bad = || Diag::parse(self.arena.simple_stmts.span(s), "select case must be receive or send");
        Ok(match self.arena.simple_stmts[s] {
            SimpleStmt::Send { chan, value } => CommStmt::Send { chan, value },
            SimpleStmt::Expr(expr) => CommStmt::Recv { lhs: None, expr },
            SimpleStmt::ShortVarDecl { names, values } => match self.arena.exprs_list(values) {
                &[expr] => CommStmt::Recv {
                    lhs: Some(RangeLhs::Def { idents: names }),
                    expr,
                },
                _ => return Err(bad()),
            },
            SimpleStmt::Assign {
                lhs,
                op: AssignOp::Assign,
                rhs,
            } => match self.arena.exprs_list(rhs) {
                &[expr] => CommStmt::Recv {
                    lhs: Some(RangeLhs::Assign { exprs: lhs }),
                    expr,
                },
                _ => return Err(bad()),
            },
            _ => return Err(bad()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walk::preorder_exprs;

    fn parse(src: &str) -> SyntaxTree {
        match parse_source(src) {
            Ok(tree) => tree,
            Err(e) => panic!("{e}: {:?}", e.diags),
        }
    }

    fn func_body<'a>(tree: &'a SyntaxTree, name: &str) -> &'a [StmtId] {
        for d in tree.arena.top_decls(tree.file.decls) {
            if let TopLevelDecl::Func(f) = *d {
                let f = &tree.arena.funcs[f];
                if tree.interner.resolve(f.name.sym) == name {
                    let body = f.body.expect("body");
                    return tree.arena.stmts_list(body.stmts);
                }
            }
        }
        panic!("no func {name}");
    }

    #[test]
    fn parses_package_and_imports() {
        let tree = parse("package p\n\nimport (\n\t\"context\"\n\tstdio \"io\"\n)\n");
        assert_eq!(tree.package_name(), "p");
        let decls = tree.arena.top_decls(tree.file.decls);
        assert_eq!(decls.len(), 1);
    }

    #[test]
    fn composite_literal_in_if_header_needs_parens() {
        let src = "package p\nfunc f() {\n\tif x == (T{}) {\n\t}\n\tif x {\n\t}\n}\n";
        let tree = parse(src);
        let body = func_body(&tree, "f");
        assert_eq!(body.len(), 2);
        assert!(matches!(tree.arena.stmts[body[1]], Stmt::If { .. }));
    }

    #[test]
    fn grouped_params_share_a_field() {
        let tree = parse("package p\nfunc f(a, b int, c string) {}\n");
        let TopLevelDecl::Func(f) = tree.arena.top_decls(tree.file.decls)[0] else {
            panic!("not a func")
        };
        let sig = tree.arena.signatures[tree.arena.funcs[f].signature];
        let fields = tree.arena.fields_list(sig.params.fields);
        assert_eq!(fields.len(), 2);
        assert_eq!(tree.arena.ident_names(tree.arena.fields[fields[0]].names).len(), 2);
    }

    #[test]
    fn anonymous_params_are_types() {
        let tree = parse("package p\ntype F func(int, string) error\n");
        assert_eq!(tree.arena.fields.len(), 2);
        assert!(tree
            .arena
            .fields
            .ids()
            .all(|f| tree.arena.fields[f].names.is_empty()));
    }

    #[test]
    fn type_switch_is_detected() {
        let src = "package p\nfunc f(v any) {\n\tswitch x := v.(type) {\n\tcase nil, int:\n\t\t_ = x\n\tdefault:\n\t}\n}\n";
        let tree = parse(src);
        let body = func_body(&tree, "f");
        let Stmt::TypeSwitch { guard, clauses, .. } = tree.arena.stmts[body[0]] else {
            panic!("expected type switch");
        };
        assert!(guard.bind.is_some());
        assert_eq!(tree.arena.switch_clause_ids(clauses).len(), 2);
    }

    #[test]
    fn generics_parse() {
        let src = "package p\ntype List[T any] struct{ items []T }\nfunc (l *List[T]) Len() int { return len(l.items) }\nfunc Map[K comparable, V any](m map[K]V) []K { return nil }\nvar x = Map[string, int](nil)\n";
        let tree = parse(src);
        assert_eq!(tree.arena.top_decls(tree.file.decls).len(), 4);
    }

    #[test]
    fn calls_are_visited_in_source_order() {
        let src = "package p\nfunc f() {\n\ta(b(), c())\n}\n";
        let tree = parse(src);
        let calls: Vec<_> = preorder_exprs(&tree.arena, &tree.file)
            .into_iter()
            .filter(|&e| matches!(tree.arena.exprs[e], Expr::Call { .. }))
            .map(|e| tree.arena.exprs.span(e).text(src).unwrap_or(""))
            .collect();
        assert_eq!(calls, vec!["a(b(), c())", "b()", "c()"]);
    }

    #[test]
    fn syntax_error_is_reported() {
        let err = parse_source("package p\nfunc f( {\n").unwrap_err();
        assert_eq!(err.diags.len(), 1);
    }

    #[test]
    fn statements_cover_the_grammar() {
        let src = r#"package p

func f(ch chan int, xs []int) (n int, err error) {
L:
	for i := 0; i < len(xs); i++ {
		if xs[i] > 0 {
			continue L
		}
	}
	for k, v := range map[string]int{"a": 1} {
		_, _ = k, v
	}
	for range xs {
	}
	select {
	case v, ok := <-ch:
		_, _ = v, ok
	case ch <- 1:
	default:
	}
	go func() { defer close(ch) }()
	var s = xs[1:2:3]
	n += len(s)
	switch {
	case n > 1:
		fallthrough
	default:
	}
	return n, nil
}
"#;
        let tree = parse(src);
        assert_eq!(func_body(&tree, "f").len(), 9);
    }
}
