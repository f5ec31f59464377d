use std::fs;
use std::hint::black_box as bb;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use ctxrewrite::locate::locate_interface;
use ctxrewrite::matcher::Matcher;
use ctxrewrite::program::{load, LoadOptions};
use go_syntax::ast::Interner;
use go_syntax::{parse_source, Lexer};

// =============================================================================
// Test Corpus - Different sizes of Go code
// =============================================================================

const SMALL_HELLO_WORLD: &str = r#"
package main

func main() {
    println("Hello, World!")
}
"#;

const MEDIUM_STRUCT_METHODS: &str = r#"
package geometry

type Point struct {
    X, Y float64
}

func (p Point) Abs() float64 {
    return sqrt(p.X*p.X + p.Y*p.Y)
}

func (p *Point) Scale(f float64) {
    p.X = p.X * f
    p.Y = p.Y * f
}

type Rectangle struct {
    Width, Height float64
}

func (r Rectangle) Area() float64 {
    return r.Width * r.Height
}

func (r *Rectangle) Grow(delta float64) {
    r.Width += delta
    r.Height += delta
}
"#;

const LARGE_COMPLEX: &str = r#"
package compiler

import (
    "fmt"
    "strings"
)

type TokenKind int

const (
    TokEOF TokenKind = iota
    TokIdent
    TokNumber
    TokString
)

type Token struct {
    Kind TokenKind
    Text string
    Line int
}

type Lexer struct {
    input  []byte
    pos    int
    line   int
    tokens []Token
}

func NewLexer(source string) *Lexer {
    return &Lexer{
        input: []byte(source),
        pos:   0,
        line:  1,
    }
}

func (l *Lexer) NextToken() Token {
    if l.pos >= len(l.input) {
        return Token{Kind: TokEOF, Line: l.line}
    }

    ch := l.input[l.pos]
    if isLetter(ch) {
        return l.readIdent()
    }
    if isDigit(ch) {
        return l.readNumber()
    }

    l.pos++
    return Token{Kind: TokIdent, Text: string(ch), Line: l.line}
}

func (l *Lexer) readIdent() Token {
    start := l.pos
    for l.pos < len(l.input) && isLetter(l.input[l.pos]) {
        l.pos++
    }
    return Token{
        Kind: TokIdent,
        Text: string(l.input[start:l.pos]),
        Line: l.line,
    }
}

func (l *Lexer) readNumber() Token {
    start := l.pos
    for l.pos < len(l.input) && isDigit(l.input[l.pos]) {
        l.pos++
    }
    return Token{
        Kind: TokNumber,
        Text: string(l.input[start:l.pos]),
        Line: l.line,
    }
}

func isLetter(ch byte) bool {
    return (ch >= 'a' && ch <= 'z') || (ch >= 'A' && ch <= 'Z') || ch == '_'
}

func isDigit(ch byte) bool {
    return ch >= '0' && ch <= '9'
}
"#;

const WIBBLE_DECLS: &str = r#"package w

type Wibbler interface {
    Wibble(i int) int
}

type WibbleClient struct{}

func (WibbleClient) Wibble(i int) int { return i }

type WibbleClientWrapper struct {
    WibbleClient
}

func (w *WibbleClientWrapper) Wobble(j int) int { return j }
"#;

// =============================================================================
// Helpers: precompute inputs outside measurement
// =============================================================================

fn token_count(input: &str) -> usize {
    Lexer::new(input).count()
}

fn make_mixed_names(prefix: &str, n: usize, dup: &str) -> Vec<String> {
    // 50% unique, 50% duplicates.
    (0..n)
        .map(|i| {
            if i % 2 == 0 {
                format!("{prefix}{i}")
            } else {
                dup.to_string()
            }
        })
        .collect()
}

/// A Go file with `n` functions, each calling `Wibble` through three receivers.
fn make_wibble_user(n: usize) -> String {
    let mut src = String::from("package w\n\n");
    for i in 0..n {
        src.push_str(&format!(
            "func use{i}(wc WibbleClient, wcw *WibbleClientWrapper, iw Wibbler) int {{\n    \
             wcw.Wobble({i})\n    \
             return wc.Wibble({i}) + wcw.Wibble(wc.Wibble({i})) + iw.Wibble({i})\n}}\n\n"
        ));
    }
    src
}

// =============================================================================
// Benchmark 1: Lexer
// =============================================================================

fn bench_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");

    let corpora = [
        ("small", SMALL_HELLO_WORLD),
        ("medium", MEDIUM_STRUCT_METHODS),
        ("large", LARGE_COMPLEX),
    ];

    for (name, input) in corpora {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("iterate_bytes", name), &input, |b, &input| {
            b.iter(|| {
                let mut acc: u64 = 0;
                for (l, _, r) in Lexer::new(bb(input)) {
                    acc = acc.wrapping_add(l as u64).wrapping_add(r as u64);
                }
                bb(acc)
            });
        });

        let tok_count = token_count(input);
        group.throughput(Throughput::Elements(tok_count as u64));
        group.bench_with_input(BenchmarkId::new("collect_tokens", name), &input, |b, &input| {
            b.iter(|| {
                let mut v = Vec::with_capacity(tok_count);
                v.extend(Lexer::new(bb(input)));
                bb(v)
            });
        });
    }

    group.finish();
}

// =============================================================================
// Benchmark 2: Parser
// =============================================================================

fn bench_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");

    for (name, input) in [
        ("small", SMALL_HELLO_WORLD),
        ("medium", MEDIUM_STRUCT_METHODS),
        ("large", LARGE_COMPLEX),
    ] {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_source", name), &input, |b, &input| {
            b.iter(|| bb(parse_source(bb(input)).is_ok()));
        });
    }

    group.finish();
}

// =============================================================================
// Benchmark 3: String Interning
// =============================================================================

fn bench_string_interning(c: &mut Criterion) {
    let mut group = c.benchmark_group("string_interning");
    group.throughput(Throughput::Elements(1000));

    let mixed = make_mixed_names("ident_", 1000, "ident_dup");

    group.bench_function("mixed_1000", |b| {
        b.iter_batched(
            || &mixed,
            |names| {
                let mut interner = Interner::new();
                for s in names.iter() {
                    bb(interner.intern(s.as_str()));
                }
                bb(interner);
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

// =============================================================================
// Benchmark 4: Load + match
//  - load: parse and type check a one-package module from disk
//  - match: walk every call of the loaded program against `Wibbler`
// =============================================================================

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(20);

    for n in [10usize, 100] {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("go.mod"), "module example.com/m\n\ngo 1.22\n").unwrap();
        fs::write(dir.path().join("w.go"), WIBBLE_DECLS).unwrap();
        fs::write(dir.path().join("use.go"), make_wibble_user(n)).unwrap();
        let opts = LoadOptions::default();

        group.bench_with_input(BenchmarkId::new("load", n), &n, |b, _| {
            b.iter(|| bb(load(dir.path(), &opts).unwrap()));
        });

        let prog = load(dir.path(), &opts).unwrap();
        let iface = locate_interface(&prog, "example.com/m", "Wibbler").unwrap();
        group.throughput(Throughput::Elements(4 * n as u64));
        group.bench_with_input(BenchmarkId::new("match", n), &n, |b, _| {
            b.iter(|| {
                let mut m = Matcher::new(&prog, &iface);
                let mut found = 0usize;
                for unit in prog.root_units() {
                    found += m.call_sites(unit).count();
                }
                bb(found)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_lexer,
    bench_parser,
    bench_string_interning,
    bench_pipeline
);
criterion_main!(benches);
