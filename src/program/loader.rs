//! Builds a `Program` from a directory: finds the module, expands the load patterns, parses
//! every file, groups files into packages and loads what the root packages import.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use go_syntax::pos::LineIndex;
use go_syntax::{parse_source, SyntaxTree};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use super::scope::Scope;
use super::stubs::stub_source;
use super::types::TypeTable;
use super::{check, Package, PackageId, PackageKind, Program, SourceUnit, TypeInfo, UnitId};
use crate::error::LoadError;

/// Which packages to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// `./...`, `./dir`, `./dir/...` or module-qualified forms of these.
    pub patterns: Vec<String>,
    /// Include `_test.go` files of root packages.
    pub tests: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            patterns: vec!["./...".to_owned()],
            tests: true,
        }
    }
}

/// Loads and type checks the packages matched by `opts` under `root`.
pub fn load(root: &Path, opts: &LoadOptions) -> Result<Program, LoadError> {
    let root = fs::canonicalize(root).map_err(|source| LoadError::Io {
        path: root.to_path_buf(),
        source,
    })?;
    let (module_dir, module_path) = find_module(&root)?;
    debug!(module = %module_path, dir = %module_dir.display(), "module found");

    let mut b = Builder {
        module_dir,
        module_path,
        packages: Vec::new(),
        units: Vec::new(),
        by_path: HashMap::new(),
    };

    for pattern in &opts.patterns {
        let dirs = b.expand_pattern(&root, pattern);
        let mut matched = false;
        for dir in dirs {
            for group in read_dir_packages(&dir, opts.tests)? {
                matched = true;
                let path = b.import_path(&dir, group.external_test);
                if b.by_path.contains_key(&path) {
                    continue;
                }
                debug!(package = %path, files = group.files.len(), "root package");
                b.add_package(path, group.name, PackageKind::Root, group.files);
            }
        }
        if !matched {
            return Err(LoadError::EmptyPattern(pattern.clone()));
        }
    }

    b.load_imports()?;

    let mut prog = Program {
        module_path: b.module_path,
        module_dir: b.module_dir,
        packages: b.packages,
        units: b.units,
        types: TypeTable::new(),
        info: TypeInfo::default(),
    };
    check::check(&mut prog);
    debug!(
        packages = prog.packages.len(),
        units = prog.units.len(),
        types = prog.types.len(),
        "program checked"
    );
    Ok(prog)
}

/// Nearest `go.mod` at or above `dir`, with its module path.
fn find_module(dir: &Path) -> Result<(PathBuf, String), LoadError> {
    for candidate in dir.ancestors() {
        let gomod = candidate.join("go.mod");
        if !gomod.is_file() {
            continue;
        }
        let text = fs::read_to_string(&gomod).map_err(|source| LoadError::Io {
            path: gomod.clone(),
            source,
        })?;
        return match module_directive(&text) {
            Some(path) => Ok((candidate.to_path_buf(), path)),
            None => Err(LoadError::NoModulePath(gomod)),
        };
    }
    Err(LoadError::NoModule(dir.to_path_buf()))
}

fn module_directive(gomod: &str) -> Option<String> {
    gomod.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or("").trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let path = rest.trim().trim_matches('"');
        (!path.is_empty()).then(|| path.to_owned())
    })
}

struct ParsedFile {
    path: PathBuf,
    src: String,
    tree: SyntaxTree,
}

/// Files of one directory that share a package clause.
struct PackageFiles {
    name: String,
    external_test: bool,
    files: Vec<ParsedFile>,
}

struct Builder {
    module_dir: PathBuf,
    module_path: String,
    packages: Vec<Package>,
    units: Vec<SourceUnit>,
    by_path: HashMap<String, PackageId>,
}

impl Builder {
    /// Directories matched by one pattern, sorted.
    fn expand_pattern(&self, root: &Path, pattern: &str) -> BTreeSet<PathBuf> {
        let (base, recursive) = match pattern.strip_suffix("...") {
            Some(base) => (base.trim_end_matches('/'), true),
            None => (pattern.trim_end_matches('/'), false),
        };

        let dir = if base == self.module_path {
            self.module_dir.clone()
        } else if let Some(rel) = base
            .strip_prefix(self.module_path.as_str())
            .and_then(|r| r.strip_prefix('/'))
        {
            self.module_dir.join(rel)
        } else {
            let rel = base.trim_start_matches("./");
            if rel.is_empty() || rel == "." {
                root.to_path_buf()
            } else {
                root.join(rel)
            }
        };

        let mut out = BTreeSet::new();
        if !recursive {
            if dir.is_dir() {
                out.insert(dir);
            }
            return out;
        }
        let walker = WalkDir::new(&dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !skip_dir(e));
        for entry in walker.filter_map(|e| e.ok()) {
            if entry.file_type().is_dir() {
                out.insert(entry.into_path());
            }
        }
        out
    }

    /// Import path of the package in `dir`.
    fn import_path(&self, dir: &Path, external_test: bool) -> String {
        let rel = dir
            .strip_prefix(&self.module_dir)
            .map(|r| {
                r.components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_default();
        let mut path = if rel.is_empty() {
            self.module_path.clone()
        } else {
            format!("{}/{rel}", self.module_path)
        };
        if external_test {
            path.push_str("_test");
        }
        path
    }

    fn add_package(
        &mut self,
        path: String,
        name: String,
        kind: PackageKind,
        files: Vec<ParsedFile>,
    ) -> PackageId {
        let id = PackageId(self.packages.len() as u32);
        let mut units = Vec::with_capacity(files.len());
        let mut imports: Vec<String> = Vec::new();

        for f in files {
            let unit = SourceUnit {
                lines: LineIndex::new(&f.src),
                path: f.path,
                src: f.src,
                tree: f.tree,
                package: id,
            };
            for (imp, _) in unit.imports() {
                if !imports.iter().any(|i| i == imp) {
                    imports.push(imp.to_owned());
                }
            }
            units.push(UnitId(self.units.len() as u32));
            self.units.push(unit);
        }

        self.by_path.insert(path.clone(), id);
        self.packages.push(Package {
            path,
            name,
            kind,
            units,
            imports,
            scope: Scope::new(),
        });
        id
    }

    /// Loads module-local imports and stubbed standard-library imports, transitively.
    fn load_imports(&mut self) -> Result<(), LoadError> {
        let mut queue: VecDeque<String> = self
            .packages
            .iter()
            .flat_map(|p| p.imports.iter().cloned())
            .collect();

        while let Some(path) = queue.pop_front() {
            if self.by_path.contains_key(&path) {
                continue;
            }

            let loaded = if let Some(rel) = self.module_relative(&path) {
                let dir = self.module_dir.join(rel);
                let group = if dir.is_dir() {
                    read_dir_packages(&dir, false)?
                        .into_iter()
                        .find(|g| !g.external_test)
                } else {
                    None
                };
                group.map(|g| {
                    debug!(package = %path, files = g.files.len(), "dependency package");
                    self.add_package(path.clone(), g.name, PackageKind::Dependency, g.files)
                })
            } else if let Some(src) = stub_source(&path) {
                let tree = parse_source(src).map_err(|f| {
                    let lines = LineIndex::new(src);
                    LoadError::Syntax {
                        path: PathBuf::from(&path),
                        errors: f
                            .diags
                            .iter()
                            .map(|d| format!("{path}:{}: {}", lines.line_col(d.span.start), d.message))
                            .collect(),
                    }
                })?;
                let name = tree.package_name().to_owned();
                let file = ParsedFile {
                    path: PathBuf::from(format!("$stub/{path}.go")),
                    src: src.to_owned(),
                    tree,
                };
                debug!(package = %path, "stub package");
                Some(self.add_package(path.clone(), name, PackageKind::Stub, vec![file]))
            } else {
                None
            };

            match loaded {
                Some(id) => queue.extend(self.packages[id.0 as usize].imports.iter().cloned()),
                None => debug!(package = %path, "import not loaded; its types stay opaque"),
            }
        }
        Ok(())
    }

    fn module_relative<'a>(&self, path: &'a str) -> Option<&'a str> {
        if path == self.module_path {
            return Some("");
        }
        path.strip_prefix(self.module_path.as_str())?.strip_prefix('/')
    }
}

fn skip_dir(e: &DirEntry) -> bool {
    if !e.file_type().is_dir() {
        return false;
    }
    let name = e.file_name().to_string_lossy();
    name == "testdata"
        || name == "vendor"
        || name.starts_with('.')
        || name.starts_with('_')
        || e.path().join("go.mod").is_file()
}

/// Parses the `.go` files directly inside `dir`, grouped by package clause.
fn read_dir_packages(dir: &Path, tests: bool) -> Result<Vec<PackageFiles>, LoadError> {
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_source_file(p, tests))
        .collect();
    paths.sort();

    let mut groups: Vec<PackageFiles> = Vec::new();
    for path in paths {
        let src = fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        if build_ignored(&src) {
            debug!(file = %path.display(), "skipping build-ignored file");
            continue;
        }
        let tree = parse_file(&path, &src)?;
        let name = tree.package_name().to_owned();
        let is_test_file = path.to_string_lossy().ends_with("_test.go");
        let external_test = is_test_file && name.ends_with("_test");

        match groups.iter_mut().find(|g| g.name == name) {
            Some(g) => g.files.push(ParsedFile { path, src, tree }),
            None => {
                if let Some(other) = groups.iter().find(|g| !g.external_test && !external_test) {
                    return Err(LoadError::MixedPackages {
                        dir: dir.to_path_buf(),
                        first: other.name.clone(),
                        second: name,
                    });
                }
                groups.push(PackageFiles {
                    name,
                    external_test,
                    files: vec![ParsedFile { path, src, tree }],
                });
            }
        }
    }
    Ok(groups)
}

fn is_source_file(path: &Path, tests: bool) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".go")
        && !name.starts_with('.')
        && !name.starts_with('_')
        && (tests || !name.ends_with("_test.go"))
}

/// `//go:build ignore` (or the legacy `// +build ignore`) before the package clause.
fn build_ignored(src: &str) -> bool {
    src.lines()
        .map(str::trim)
        .take_while(|l| !l.starts_with("package"))
        .any(|l| {
            let constraint = l
                .strip_prefix("//go:build")
                .or_else(|| l.strip_prefix("// +build"));
            constraint.is_some_and(|c| c.split_whitespace().any(|w| w == "ignore"))
        })
}

fn parse_file(path: &Path, src: &str) -> Result<SyntaxTree, LoadError> {
    parse_source(src).map_err(|failure| {
        let lines = LineIndex::new(src);
        LoadError::Syntax {
            path: path.to_path_buf(),
            errors: failure
                .diags
                .iter()
                .map(|d| {
                    format!(
                        "{}:{}: {}",
                        path.display(),
                        lines.line_col(d.span.start),
                        d.message
                    )
                })
                .collect(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::fixture::module;

    #[test]
    fn reads_module_directive() {
        assert_eq!(
            module_directive("// comment\nmodule example.com/m // trailing\n").as_deref(),
            Some("example.com/m")
        );
        assert_eq!(module_directive("module \"quoted/path\"\n").as_deref(), Some("quoted/path"));
        assert_eq!(module_directive("modules x\n"), None);
        assert_eq!(module_directive("go 1.22\n"), None);
    }

    #[test]
    fn build_ignore_constraint() {
        assert!(build_ignored("//go:build ignore\n\npackage main\n"));
        assert!(build_ignored("// +build ignore\n\npackage main\n"));
        assert!(!build_ignored("//go:build linux\n\npackage main\n"));
        assert!(!build_ignored("package main\n\n//go:build ignore\n"));
    }

    #[test]
    fn groups_packages_and_loads_local_imports() {
        let dir = module(&[
            (
                "main.go",
                "package main\n\nimport \"example.com/m/lib\"\n\nfunc main() { lib.F() }\n",
            ),
            ("lib/lib.go", "package lib\n\nfunc F() {}\n"),
            ("lib/lib_test.go", "package lib_test\n\nfunc TestF() {}\n"),
            ("testdata/skip.go", "package broken {\n"),
            (".hidden/x.go", "package broken {\n"),
        ]);
        let opts = LoadOptions {
            patterns: vec![".".to_owned()],
            tests: true,
        };
        let prog = load(dir.path(), &opts).unwrap();

        assert_eq!(prog.module_path, "example.com/m");
        let paths: Vec<(&str, PackageKind)> =
            prog.packages.iter().map(|p| (p.path.as_str(), p.kind)).collect();
        assert_eq!(
            paths,
            vec![
                ("example.com/m", PackageKind::Root),
                ("example.com/m/lib", PackageKind::Dependency),
            ]
        );
    }

    #[test]
    fn recursive_pattern_finds_external_test_packages() {
        let dir = module(&[
            ("a/a.go", "package a\n"),
            ("a/a_test.go", "package a_test\n"),
            ("a/internal_test.go", "package a\n"),
        ]);
        let prog = load(dir.path(), &LoadOptions::default()).unwrap();
        let names: Vec<&str> = prog.packages.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(names, vec!["example.com/m/a", "example.com/m/a_test"]);
        assert_eq!(prog.packages[0].units.len(), 2);
    }

    #[test]
    fn tests_can_be_excluded() {
        let dir = module(&[("a.go", "package a\n"), ("a_test.go", "package a\n")]);
        let opts = LoadOptions {
            tests: false,
            ..LoadOptions::default()
        };
        let prog = load(dir.path(), &opts).unwrap();
        assert_eq!(prog.units.len(), 1);
    }

    #[test]
    fn stubs_are_loaded_transitively() {
        let dir = module(&[(
            "a.go",
            "package a\n\nimport \"context\"\n\nvar ctx = context.Background()\n",
        )]);
        let prog = load(dir.path(), &LoadOptions::default()).unwrap();
        let kinds: Vec<(&str, PackageKind)> =
            prog.packages.iter().map(|p| (p.path.as_str(), p.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("example.com/m", PackageKind::Root),
                ("context", PackageKind::Stub),
                ("time", PackageKind::Stub),
            ]
        );
    }

    #[test]
    fn syntax_errors_carry_positions() {
        let dir = module(&[("a.go", "package a\n\nvar x = )\n")]);
        let err = load(dir.path(), &LoadOptions::default()).unwrap_err();
        let LoadError::Syntax { errors, .. } = err else {
            panic!("expected a syntax error, got {err}");
        };
        assert!(errors[0].contains("a.go:3:"), "{errors:?}");
    }

    #[test]
    fn mixed_packages_are_rejected() {
        let dir = module(&[("a.go", "package a\n"), ("b.go", "package b\n")]);
        let err = load(dir.path(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::MixedPackages { .. }), "{err}");
    }

    #[test]
    fn missing_module_and_empty_patterns() {
        let bare = tempfile::tempdir().unwrap();
        fs::write(bare.path().join("a.go"), "package a\n").unwrap();
        if bare.path().ancestors().skip(1).any(|d| d.join("go.mod").is_file()) {
            return;
        }
        let err = load(bare.path(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::NoModule(_)), "{err}");

        let dir = module(&[("a.go", "package a\n")]);
        let opts = LoadOptions {
            patterns: vec!["./nothing/...".to_owned()],
            tests: true,
        };
        let err = load(dir.path(), &opts).unwrap_err();
        assert!(matches!(err, LoadError::EmptyPattern(p) if p == "./nothing/..."));
    }
}
