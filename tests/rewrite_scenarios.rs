use std::fs;
use std::path::Path;

use ctxrewrite::{
    run, InterfaceTarget, LoadError, Overrides, RewriteConfig, RewriteError, RunSummary,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const WIBBLER: &str = r#"package w

type Wibbler interface {
	Wibble(i int) int
}

type WibbleClient struct{}

func (wc WibbleClient) Wibble(i int) int { return i }

type WibbleClientWrapper struct {
	WibbleClient
}

func (w *WibbleClientWrapper) Wobble(j int) int { return j }
"#;

fn module(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("go.mod"), "module example.com/m\n\ngo 1.22\n").unwrap();
    for (name, src) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, src).unwrap();
    }
    dir
}

fn config(root: &Path, package: &str, name: &str) -> RewriteConfig {
    RewriteConfig::new(
        root,
        InterfaceTarget {
            package: package.to_owned(),
            name: name.to_owned(),
        },
    )
}

fn wibbler(root: &Path) -> RewriteConfig {
    config(root, "example.com/m", "Wibbler")
}

fn read(dir: &TempDir, name: &str) -> String {
    fs::read_to_string(dir.path().join(name)).unwrap()
}

#[test]
fn wibble_gets_a_background_context() {
    let dir = module(&[
        ("w.go", WIBBLER),
        (
            "use.go",
            "package w\n\nfunc use() {\n\twc := WibbleClient{}\n\twc.Wibble(10)\n}\n",
        ),
    ]);
    let summary = run(&wibbler(dir.path())).unwrap();
    assert_eq!(
        summary,
        RunSummary {
            sites: 1,
            files: 1,
            dry_run: false,
        }
    );
    assert_eq!(
        read(&dir, "use.go"),
        "package w\n\nimport \"context\"\n\nfunc use() {\n\twc := WibbleClient{}\n\twc.Wibble(context.Background(), 10)\n}\n"
    );
    assert_eq!(read(&dir, "w.go"), WIBBLER);
}

#[test]
fn promoted_methods_match_and_others_do_not() {
    let src = r#"package w

func use() {
	wcw := &WibbleClientWrapper{}
	wcw.Wobble(10)
	wcw.Wibble(10)
}
"#;
    let dir = module(&[("w.go", WIBBLER), ("use.go", src)]);
    run(&wibbler(dir.path())).unwrap();
    assert_eq!(
        read(&dir, "use.go"),
        r#"package w

import "context"

func use() {
	wcw := &WibbleClientWrapper{}
	wcw.Wobble(10)
	wcw.Wibble(context.Background(), 10)
}
"#
    );
}

#[test]
fn calls_that_already_pass_a_context_leave_the_file_untouched() {
    let decls = r#"package w

import "context"

type Wibbler interface {
	Wibble(ctx context.Context, i int) int
}

type WibbleClient struct{}

func (WibbleClient) Wibble(ctx context.Context, i int) int { return i }

func use(ctx context.Context, wc WibbleClient) int {
	return wc.Wibble(ctx, 10)
}
"#;
    let dir = module(&[("w.go", decls)]);
    let path = dir.path().join("w.go");
    let before = fs::metadata(&path).unwrap().modified().unwrap();

    let summary = run(&wibbler(dir.path())).unwrap();

    assert_eq!(summary.sites, 0);
    assert_eq!(summary.files, 0);
    assert_eq!(read(&dir, "w.go"), decls);
    assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), before);
}

#[test]
fn second_run_changes_nothing() {
    let dir = module(&[
        ("w.go", WIBBLER),
        (
            "use.go",
            "package w\n\nfunc use(wc WibbleClient) int {\n\treturn wc.Wibble(wc.Wibble(1))\n}\n",
        ),
    ]);
    let first = run(&wibbler(dir.path())).unwrap();
    assert_eq!(first.sites, 2);
    let once = read(&dir, "use.go");

    let second = run(&wibbler(dir.path())).unwrap();
    assert_eq!(second.sites, 0);
    assert_eq!(read(&dir, "use.go"), once);
}

#[test]
fn types_that_never_name_the_interface_still_match() {
    let store = r#"package store

type Store interface {
	Get(key string) (string, error)
}
"#;
    let mem = r#"package mem

import (
	"errors"
)

type Mem struct{ m map[string]string }

func (s *Mem) Get(key string) (string, error) {
	v, ok := s.m[key]
	if !ok {
		return "", errors.New("missing")
	}
	return v, nil
}

func Lookup(s *Mem) string {
	v, _ := s.Get("a")
	return v
}
"#;
    let dir = module(&[("store/store.go", store), ("mem/mem.go", mem)]);
    run(&config(dir.path(), "example.com/m/store", "Store")).unwrap();

    let out = read(&dir, "mem/mem.go");
    assert!(out.contains("v, _ := s.Get(context.Background(), \"a\")"), "{out}");
    assert!(out.contains("import (\n\t\"context\"\n\t\"errors\"\n)"), "{out}");
    assert_eq!(read(&dir, "store/store.go"), store);
}

#[test]
fn same_named_methods_without_the_full_method_set_are_ignored() {
    let src = r#"package w

type Pair interface {
	Wibble(i int) int
	Wobble(j int) int
}

type Half struct{}

func (Half) Wibble(i int) int { return i }

type Wrong struct{}

func (Wrong) Wibble(s string) int { return 0 }
func (Wrong) Wobble(j int) int    { return j }

func use(h Half, w Wrong) {
	h.Wibble(1)
	w.Wibble("x")
	w.Wobble(2)
}
"#;
    let dir = module(&[("w.go", src)]);
    let summary = run(&config(dir.path(), "example.com/m", "Pair")).unwrap();
    assert_eq!(summary.sites, 0);
    assert_eq!(read(&dir, "w.go"), src);
}

#[test]
fn marker_goes_first_and_the_rest_keep_their_order() {
    let src = r#"package w

type Putter interface {
	Put(k string, v int, more ...int)
}

type P struct{}

func (P) Put(k string, v int, more ...int) {}

func use(p P, k string) {
	p.Put(k, len(k), 1, 2)
}
"#;
    let dir = module(&[("w.go", src)]);
    run(&config(dir.path(), "example.com/m", "Putter")).unwrap();
    let out = read(&dir, "w.go");
    assert!(
        out.contains("\tp.Put(context.Background(), k, len(k), 1, 2)\n"),
        "{out}"
    );
}

#[test]
fn existing_context_import_alias_is_reused() {
    let src = r#"package w

import (
	stdctx "context"
	"fmt"
)

func use(wc WibbleClient, ctx stdctx.Context) {
	fmt.Println(wc.Wibble(1))
}
"#;
    let dir = module(&[("w.go", WIBBLER), ("use.go", src)]);
    run(&wibbler(dir.path())).unwrap();
    assert_eq!(
        read(&dir, "use.go"),
        src.replace("wc.Wibble(1)", "wc.Wibble(stdctx.Background(), 1)")
    );
}

#[test]
fn test_files_follow_the_tests_option() {
    let test_src = "package w\n\nfunc check() int {\n\treturn WibbleClient{}.Wibble(1)\n}\n";
    let dir = module(&[("w.go", WIBBLER), ("w_test.go", test_src)]);

    let mut cfg = wibbler(dir.path());
    cfg.load.tests = false;
    assert_eq!(run(&cfg).unwrap().sites, 0);
    assert_eq!(read(&dir, "w_test.go"), test_src);

    cfg.load.tests = true;
    assert_eq!(run(&cfg).unwrap().sites, 1);
    assert!(read(&dir, "w_test.go").contains("WibbleClient{}.Wibble(context.Background(), 1)"));
}

#[test]
fn missing_interfaces_are_fatal_and_write_nothing() {
    let use_src = "package w\n\nfunc use(wc WibbleClient) { wc.Wibble(1) }\n";
    let dir = module(&[("w.go", WIBBLER), ("use.go", use_src)]);

    let err = run(&config(dir.path(), "example.com/m", "WibbleClient")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "interface example.com/m.WibbleClient not found: type is not an interface"
    );
    let err = run(&config(dir.path(), "example.com/elsewhere", "Wibbler")).unwrap_err();
    assert!(matches!(err, RewriteError::InterfaceNotFound { .. }));
    assert_eq!(read(&dir, "use.go"), use_src);
}

#[test]
fn syntax_errors_abort_the_run() {
    let use_src = "package w\n\nfunc use(wc WibbleClient) { wc.Wibble(1) }\n";
    let dir = module(&[
        ("w.go", WIBBLER),
        ("use.go", use_src),
        ("broken/b.go", "package broken\n\nfunc f( {\n"),
    ]);
    let err = run(&wibbler(dir.path())).unwrap_err();
    assert!(
        matches!(err, RewriteError::Load(LoadError::Syntax { .. })),
        "{err}"
    );
    assert_eq!(read(&dir, "use.go"), use_src);
}

#[test]
fn dry_run_reports_without_writing() {
    let use_src = "package w\n\nfunc use(wc WibbleClient) { wc.Wibble(1) }\n";
    let dir = module(&[("w.go", WIBBLER), ("use.go", use_src)]);
    let mut cfg = wibbler(dir.path());
    cfg.dry_run = true;
    assert_eq!(
        run(&cfg).unwrap(),
        RunSummary {
            sites: 1,
            files: 1,
            dry_run: true,
        }
    );
    assert_eq!(read(&dir, "use.go"), use_src);
}

#[test]
fn config_file_in_the_root_drives_the_run() {
    let marker = r#"package rpc

type Ctx struct{}

func NewCtx() Ctx { return Ctx{} }
"#;
    let svc = r#"package svc

import "example.com/m/rpc"

type Caller interface {
	Call(c rpc.Ctx, n int) int
	Ping(n int) int
}

type C struct{}

func (C) Call(c rpc.Ctx, n int) int { return n }
func (C) Ping(n int) int            { return n }

func use(c C) {
	c.Call(rpc.NewCtx(), 1)
	c.Ping(2)
}
"#;
    let dir = module(&[
        ("rpc/rpc.go", marker),
        ("svc/svc.go", svc),
        (
            "ctxrewrite.toml",
            r#"
[interface]
package = "example.com/m/svc"
name = "Caller"

[marker]
type = "example.com/m/rpc.Ctx"
factory_package = "example.com/m/rpc"
factory = "NewCtx"

[load]
patterns = ["./svc"]
"#,
        ),
    ]);
    let cfg = RewriteConfig::resolve(Overrides {
        root: Some(dir.path().to_path_buf()),
        ..Overrides::default()
    })
    .unwrap();
    assert_eq!(run(&cfg).unwrap().sites, 1);
    assert_eq!(
        read(&dir, "svc/svc.go"),
        svc.replace("c.Ping(2)", "c.Ping(rpc.NewCtx(), 2)")
    );
}
