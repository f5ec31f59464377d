use crate::error::{Diag, LexError, LexErrorKind};
use logos::{Lexer as LogosLexer, Logos};
use std::ops::Range;

// =============================================================================
// 1. Trivia scanners
// =============================================================================

#[inline]
fn first_newline_offset(s: &str) -> Option<usize> {
    memchr::memchr2(b'\n', b'\r', s.as_bytes())
}

fn lex_block_comment(lex: &mut LogosLexer<'_, RawTok>) -> Result<(), LexErrorKind> {
    let rem = lex.remainder().as_bytes();
    let mut from = 0;

    while let Some(star) = memchr::memchr(b'*', &rem[from..]) {
        let at = from + star;
        if rem.get(at + 1) == Some(&b'/') {
            lex.bump(at + 2);
            return Ok(());
        }
        from = at + 1;
    }

    lex.bump(rem.len());
    Err(LexErrorKind::UnterminatedComment)
}

// =============================================================================
// 2. Literal validation
// =============================================================================

/// Checks `\` escapes of an interpreted string or rune body (quotes stripped).
fn validate_escapes(body: &[u8], quote: u8) -> Result<(), LexErrorKind> {
    let mut i = 0;
    while i < body.len() {
        if body[i] != b'\\' {
            i += 1;
            continue;
        }
        let esc = *body.get(i + 1).ok_or(LexErrorKind::InvalidEscape)?;
        let digits = match esc {
            b'a' | b'b' | b'f' | b'n' | b'r' | b't' | b'v' | b'\\' => 0,
            b'x' => 2,
            b'u' => 4,
            b'U' => 8,
            b'0'..=b'7' => {
                let oct = body.get(i + 1..i + 4).ok_or(LexErrorKind::InvalidEscape)?;
                if !oct.iter().all(|b| (b'0'..=b'7').contains(b)) {
                    return Err(LexErrorKind::InvalidEscape);
                }
                i += 4;
                continue;
            }
            q if q == quote => 0,
            _ => return Err(LexErrorKind::InvalidEscape),
        };
        let hex = body
            .get(i + 2..i + 2 + digits)
            .ok_or(LexErrorKind::InvalidEscape)?;
        if !hex.iter().all(u8::is_ascii_hexdigit) {
            return Err(LexErrorKind::InvalidEscape);
        }
        i += 2 + digits;
    }
    Ok(())
}

fn validate_string(lex: &mut LogosLexer<'_, RawTok>) -> Result<(), LexErrorKind> {
    let s = lex.slice().as_bytes();
    validate_escapes(&s[1..s.len() - 1], b'"')
}

fn validate_rune(lex: &mut LogosLexer<'_, RawTok>) -> Result<(), LexErrorKind> {
    let s = lex.slice();
    let body = &s[1..s.len() - 1];
    if body.starts_with('\\') {
        return validate_escapes(body.as_bytes(), b'\'');
    }
    match body.chars().count() {
        1 => Ok(()),
        _ => Err(LexErrorKind::InvalidToken),
    }
}

// =============================================================================
// 3. Numbers (maximal munch, then classification)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumKind {
    Int,
    Float,
    Imag,
}

mod num {
    use super::*;

    /// Consumes the rest of a numeric literal whose first byte logos already matched.
    pub(super) fn lex_number(lex: &mut LogosLexer<'_, RawTok>) -> Result<NumKind, LexErrorKind> {
        let first = lex.slice().as_bytes();
        let rem = lex.remainder().as_bytes();

        let hex = first == b"0" && matches!(rem.first(), Some(b'x' | b'X'));
        let mut seen_dot = first.first() == Some(&b'.');
        let mut prev = *first.last().unwrap_or(&b'0');
        let mut n = 0;

        while let Some(&b) = rem.get(n) {
            let exp_sign = matches!(b, b'+' | b'-')
                && if hex {
                    matches!(prev, b'p' | b'P')
                } else {
                    matches!(prev, b'e' | b'E')
                };
            let take = b.is_ascii_alphanumeric() || b == b'_' || exp_sign || (b == b'.' && !seen_dot);
            if !take {
                break;
            }
            if b == b'.' {
                if rem.get(n + 1) == Some(&b'.') {
                    break;
                }
                seen_dot = true;
            }
            prev = b;
            n += 1;
        }
        lex.bump(n);

        classify(lex.slice().as_bytes())
    }

    pub(super) fn classify(lit: &[u8]) -> Result<NumKind, LexErrorKind> {
        let (body, imag) = match lit.split_last() {
            Some((b'i', rest)) => (rest, true),
            _ => (lit, false),
        };
        if body.is_empty() || body.ends_with(b"_") {
            return Err(LexErrorKind::InvalidNumber);
        }

        let lower: Vec<u8> = body.iter().map(u8::to_ascii_lowercase).collect();
        let (base, digits): (u32, &[u8]) = match lower.as_slice() {
            [b'0', b'x', rest @ ..] => (16, rest),
            [b'0', b'o', rest @ ..] => (8, rest),
            [b'0', b'b', rest @ ..] => (2, rest),
            other => (10, other),
        };

        let (mantissa, exponent) = match base {
            16 => split_at_byte(digits, b'p'),
            10 => split_at_byte(digits, b'e'),
            _ => (digits, None),
        };
        let is_float = mantissa.contains(&b'.') || exponent.is_some();

        if matches!(base, 2 | 8) && is_float {
            return Err(LexErrorKind::InvalidNumber);
        }
        if base == 16 && mantissa.contains(&b'.') && exponent.is_none() {
            return Err(LexErrorKind::InvalidNumber);
        }

        let mut any_digit = false;
        for &b in mantissa {
            match b {
                b'_' | b'.' => {}
                _ if (b as char).is_digit(base) => any_digit = true,
                _ => return Err(LexErrorKind::InvalidNumber),
            }
        }
        if !any_digit {
            return Err(LexErrorKind::InvalidNumber);
        }

        if let Some(exp) = exponent {
            let exp = exp.strip_prefix(b"+").or_else(|| exp.strip_prefix(b"-")).unwrap_or(exp);
            if exp.is_empty() || !exp.iter().all(|b| b.is_ascii_digit() || *b == b'_') {
                return Err(LexErrorKind::InvalidNumber);
            }
        }

        Ok(match (imag, is_float) {
            (true, _) => NumKind::Imag,
            (false, true) => NumKind::Float,
            (false, false) => NumKind::Int,
        })
    }

    fn split_at_byte(s: &[u8], sep: u8) -> (&[u8], Option<&[u8]>) {
        match s.iter().position(|&b| b == sep) {
            Some(i) => (&s[..i], Some(&s[i + 1..])),
            None => (s, None),
        }
    }
}

// =============================================================================
// 4. Raw tokens (logos)
// =============================================================================

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t\f]+")]
#[rustfmt::skip]
enum RawTok {
    #[token("\u{FEFF}")] Bom,

    // Trivia
    #[regex(r"\r\n|\n|\r")] Newline,
    #[regex(r"//[^\n\r]*", allow_greedy = true)] LineComment,
    #[token("/*", lex_block_comment)] BlockComment,

    // Keywords (before Ident)
    #[token("break")] KwBreak,
    #[token("case")] KwCase,
    #[token("chan")] KwChan,
    #[token("const")] KwConst,
    #[token("continue")] KwContinue,
    #[token("default")] KwDefault,
    #[token("defer")] KwDefer,
    #[token("else")] KwElse,
    #[token("fallthrough")] KwFallthrough,
    #[token("for")] KwFor,
    #[token("func")] KwFunc,
    #[token("go")] KwGo,
    #[token("goto")] KwGoto,
    #[token("if")] KwIf,
    #[token("import")] KwImport,
    #[token("interface")] KwInterface,
    #[token("map")] KwMap,
    #[token("package")] KwPackage,
    #[token("range")] KwRange,
    #[token("return")] KwReturn,
    #[token("select")] KwSelect,
    #[token("struct")] KwStruct,
    #[token("switch")] KwSwitch,
    #[token("type")] KwType,
    #[token("var")] KwVar,

    #[regex(r"[_\p{L}][_\p{L}\p{Nd}]*")] Ident,

    #[regex(r"[0-9]|\.[0-9]", num::lex_number)] Number(NumKind),

    #[regex(r"`[^`]*`")] RawString,
    #[regex(r#""([^"\\\n\r]|\\.)*""#, validate_string)] String,
    #[regex(r"'([^'\\\n\r]|\\.)+'", validate_rune)] Rune,

    // Operators
    #[token("...")] Ellipsis,
    #[token("<<=")] ShlAssign,
    #[token(">>=")] ShrAssign,
    #[token("&^=")] AndNotAssign,
    #[token("+=")] AddAssign,
    #[token("-=")] SubAssign,
    #[token("*=")] MulAssign,
    #[token("/=")] DivAssign,
    #[token("%=")] ModAssign,
    #[token("&=")] AndAssign,
    #[token("|=")] OrAssign,
    #[token("^=")] XorAssign,
    #[token("<<")] Shl,
    #[token(">>")] Shr,
    #[token("&^")] AndNot,
    #[token("&&")] LAnd,
    #[token("||")] LOr,
    #[token("==")] EqEq,
    #[token("!=")] NotEq,
    #[token("<=")] Le,
    #[token(">=")] Ge,
    #[token("++")] Inc,
    #[token("--")] Dec,
    #[token(":=")] Define,
    #[token("<-")] Arrow,
    #[token("=")] Assign,
    #[token("+")] Plus,
    #[token("-")] Minus,
    #[token("*")] Star,
    #[token("/")] Slash,
    #[token("%")] Percent,
    #[token("&")] Amp,
    #[token("|")] Pipe,
    #[token("^")] Caret,
    #[token("~")] Tilde,
    #[token("!")] Bang,
    #[token("<")] Lt,
    #[token(">")] Gt,

    // Delimiters
    #[token("(")] LParen,
    #[token(")")] RParen,
    #[token("[")] LBrack,
    #[token("]")] RBrack,
    #[token("{")] LBrace,
    #[token("}")] RBrace,
    #[token(",")] Comma,
    #[token(";")] Semi,
    #[token(":")] Colon,
    #[token(".")] Dot,
}

impl RawTok {
    /// Go spec: a newline after one of these tokens ends the statement.
    #[inline]
    const fn can_insert_semicolon(self) -> bool {
        matches!(
            self,
            Self::Ident
                | Self::Number(_)
                | Self::Rune
                | Self::String
                | Self::RawString
                | Self::KwBreak
                | Self::KwContinue
                | Self::KwFallthrough
                | Self::KwReturn
                | Self::Inc
                | Self::Dec
                | Self::RParen
                | Self::RBrack
                | Self::RBrace
        )
    }

    #[inline]
    fn to_token(self, slice: &str) -> Tok<'_> {
        macro_rules! same {
            ($($v:ident),* $(,)?) => {
                match self {
                    $(Self::$v => return Tok::$v,)*
                    _ => {}
                }
            };
        }

        match self {
            Self::Ident => return Tok::Ident(slice),
            Self::Number(NumKind::Int) => return Tok::IntLit(slice),
            Self::Number(NumKind::Float) => return Tok::FloatLit(slice),
            Self::Number(NumKind::Imag) => return Tok::ImagLit(slice),
            Self::Rune => return Tok::RuneLit(slice),
            Self::String => return Tok::StringLit(slice),
            Self::RawString => return Tok::RawStringLit(slice),
            _ => {}
        }

        same! {
            KwBreak, KwCase, KwChan, KwConst, KwContinue, KwDefault, KwDefer, KwElse,
            KwFallthrough, KwFor, KwFunc, KwGo, KwGoto, KwIf, KwImport, KwInterface,
            KwMap, KwPackage, KwRange, KwReturn, KwSelect, KwStruct, KwSwitch, KwType, KwVar,
            Ellipsis, ShlAssign, ShrAssign, AndNotAssign, AddAssign, SubAssign, MulAssign,
            DivAssign, ModAssign, AndAssign, OrAssign, XorAssign, Shl, Shr, AndNot, LAnd, LOr,
            EqEq, NotEq, Le, Ge, Inc, Dec, Define, Arrow, Assign, Plus, Minus, Star, Slash,
            Percent, Amp, Pipe, Caret, Tilde, Bang, Lt, Gt,
            LParen, RParen, LBrack, RBrack, LBrace, RBrace, Comma, Semi, Colon, Dot,
        }

        Tok::Error
    }
}

// =============================================================================
// 5. Public tokens (zero-copy)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tok<'input> {
    Ident(&'input str),
    IntLit(&'input str),
    FloatLit(&'input str),
    ImagLit(&'input str),
    RuneLit(&'input str),
    StringLit(&'input str),
    RawStringLit(&'input str),

    KwBreak,
    KwCase,
    KwChan,
    KwConst,
    KwContinue,
    KwDefault,
    KwDefer,
    KwElse,
    KwFallthrough,
    KwFor,
    KwFunc,
    KwGo,
    KwGoto,
    KwIf,
    KwImport,
    KwInterface,
    KwMap,
    KwPackage,
    KwRange,
    KwReturn,
    KwSelect,
    KwStruct,
    KwSwitch,
    KwType,
    KwVar,

    Ellipsis,
    ShlAssign,
    ShrAssign,
    AndNotAssign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    Shl,
    Shr,
    AndNot,
    LAnd,
    LOr,
    EqEq,
    NotEq,
    Le,
    Ge,
    Inc,
    Dec,
    Define,
    Arrow,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Bang,
    Lt,
    Gt,
    LParen,
    RParen,
    LBrack,
    RBrack,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Colon,
    Dot,

    Error,
    /// End of input; never produced by `Lexer`, appended by the parser.
    Eof,
}

impl std::fmt::Display for Tok<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tok::Ident(s)
            | Tok::IntLit(s)
            | Tok::FloatLit(s)
            | Tok::ImagLit(s)
            | Tok::RuneLit(s)
            | Tok::StringLit(s)
            | Tok::RawStringLit(s) => write!(f, "{s}"),
            other => write!(f, "{other:?}"),
        }
    }
}

// =============================================================================
// 6. Lexer wrapper: semicolon insertion + diagnostics
// =============================================================================

pub type Spanned<'src> = (usize, Tok<'src>, usize);

pub struct Lexer<'src> {
    logos: LogosLexer<'src, RawTok>,
    pending: Option<Spanned<'src>>,
    diags: Vec<Diag>,
    last_can_insert_semi: bool,
    src_len: usize,
    eof_done: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(input: &'src str) -> Self {
        Self {
            logos: RawTok::lexer(input),
            pending: None,
            diags: Vec::new(),
            last_can_insert_semi: false,
            src_len: input.len(),
            eof_done: false,
        }
    }

    pub fn take_diags(&mut self) -> Vec<Diag> {
        std::mem::take(&mut self.diags)
    }

    fn push_diag(&mut self, kind: LexErrorKind, span: Range<usize>) {
        let span = crate::ast::Span::from_range(span);
        self.diags.push(LexError { kind, span }.diag());
    }

    /// Inserted semicolons are zero-width.
    #[inline]
    fn emit_semi_at(&mut self, pos: usize) {
        self.pending = Some((pos, Tok::Semi, pos));
    }

    fn error_token(&mut self, kind: LexErrorKind) -> Spanned<'src> {
        let span = self.logos.span();
        self.push_diag(kind, span.clone());
        self.last_can_insert_semi = false;
        (span.start, Tok::Error, span.end)
    }

    /// Handles a raw token; `None` means "nothing to emit, keep going".
    fn handle_raw(&mut self, raw: RawTok) -> Option<Spanned<'src>> {
        let span = self.logos.span();
        let slice = self.logos.slice();

        match raw {
            RawTok::Bom if span.start == 0 => None,
            RawTok::Bom => Some(self.error_token(LexErrorKind::InvalidToken)),
            RawTok::Newline => {
                if std::mem::take(&mut self.last_can_insert_semi) {
                    self.emit_semi_at(span.start);
                }
                None
            }
            RawTok::LineComment => None,
            RawTok::BlockComment => {
                if self.last_can_insert_semi {
                    if let Some(off) = first_newline_offset(slice) {
                        self.last_can_insert_semi = false;
                        self.emit_semi_at(span.start + off);
                    }
                }
                None
            }
            _ => {
                self.last_can_insert_semi = raw.can_insert_semicolon();
                Some((span.start, raw.to_token(slice), span.end))
            }
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Spanned<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(tok) = self.pending.take() {
                return Some(tok);
            }
            if self.eof_done {
                return None;
            }
            match self.logos.next() {
                None => {
                    self.eof_done = true;
                    if std::mem::take(&mut self.last_can_insert_semi) {
                        self.emit_semi_at(self.src_len);
                    }
                }
                Some(Err(kind)) => return Some(self.error_token(kind)),
                Some(Ok(raw)) => {
                    if let Some(tok) = self.handle_raw(raw) {
                        return Some(tok);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::num::classify;
    use super::*;

    fn toks(src: &str) -> Vec<Tok<'_>> {
        Lexer::new(src).map(|(_, t, _)| t).collect()
    }

    #[test]
    fn classifies_numbers() {
        assert_eq!(classify(b"42"), Ok(NumKind::Int));
        assert_eq!(classify(b"1_000"), Ok(NumKind::Int));
        assert_eq!(classify(b"0x1F"), Ok(NumKind::Int));
        assert_eq!(classify(b"0b1010"), Ok(NumKind::Int));
        assert_eq!(classify(b"0o17"), Ok(NumKind::Int));
        assert_eq!(classify(b"1.5"), Ok(NumKind::Float));
        assert_eq!(classify(b".5e-3"), Ok(NumKind::Float));
        assert_eq!(classify(b"0x1.8p3"), Ok(NumKind::Float));
        assert_eq!(classify(b"2i"), Ok(NumKind::Imag));
        assert_eq!(classify(b"0b12"), Err(LexErrorKind::InvalidNumber));
        assert_eq!(classify(b"1_"), Err(LexErrorKind::InvalidNumber));
        assert_eq!(classify(b"0x1.8"), Err(LexErrorKind::InvalidNumber));
    }

    #[test]
    fn inserts_semicolons_at_newlines() {
        assert_eq!(
            toks("x := f(a)\nreturn\n"),
            vec![
                Tok::Ident("x"),
                Tok::Define,
                Tok::Ident("f"),
                Tok::LParen,
                Tok::Ident("a"),
                Tok::RParen,
                Tok::Semi,
                Tok::KwReturn,
                Tok::Semi,
            ]
        );
    }

    #[test]
    fn comments_are_trivia() {
        assert_eq!(
            toks("a // trailing\n/* block */ b /* multi\nline */ c"),
            vec![
                Tok::Ident("a"),
                Tok::Semi,
                Tok::Ident("b"),
                Tok::Semi,
                Tok::Ident("c"),
                Tok::Semi,
            ]
        );
    }

    #[test]
    fn invalid_escape_is_reported() {
        let mut lx = Lexer::new(r#""bad \q""#);
        let all: Vec<_> = lx.by_ref().collect();
        assert!(all.iter().any(|(_, t, _)| *t == Tok::Error));
        assert!(!lx.take_diags().is_empty());
    }

    #[test]
    fn numbers_stop_before_range_dots() {
        assert_eq!(
            toks("a[1:]"),
            vec![
                Tok::Ident("a"),
                Tok::LBrack,
                Tok::IntLit("1"),
                Tok::Colon,
                Tok::RBrack,
                Tok::Semi,
            ]
        );
    }
}
