//! The in-memory program: parsed source units grouped into packages, plus the type tables
//! the checker fills in.

mod check;
pub mod loader;
pub mod scope;
pub mod stubs;
pub mod types;

use std::collections::HashMap;
use std::path::PathBuf;

use go_syntax::ast::{ExprId, Span};
use go_syntax::pos::LineIndex;
use go_syntax::SyntaxTree;

pub use loader::{load, LoadOptions};
use scope::Scope;
use types::{TypeRef, TypeTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(pub u32);

/// One parsed `.go` file.
#[derive(Debug)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub src: String,
    pub tree: SyntaxTree,
    pub lines: LineIndex,
    pub package: PackageId,
}

impl SourceUnit {
    /// `file:line:col` of a byte offset.
    pub fn position(&self, offset: u32) -> String {
        format!("{}:{}", self.path.display(), self.lines.line_col(offset))
    }

    pub fn expr_span(&self, id: ExprId) -> Span {
        self.tree.arena.exprs.span(id)
    }

    /// Import paths of this file, in source order, with their declared names.
    pub fn imports(&self) -> impl Iterator<Item = (&str, Option<go_syntax::ast::ImportName>)> + '_ {
        use go_syntax::ast::{Decl, GenDeclKind, Spec, TopLevelDecl};

        let a = &self.tree.arena;
        a.top_decls(self.tree.file.decls)
            .iter()
            .filter_map(move |d| match d {
                TopLevelDecl::Decl(id) => match a.decls[*id] {
                    Decl::Gen(g) if g.kind == GenDeclKind::Import => Some(g.specs),
                    _ => None,
                },
                TopLevelDecl::Func(_) => None,
            })
            .flat_map(move |specs| a.specs_list(specs).iter())
            .filter_map(move |spec| match spec {
                Spec::Import(imp) => Some((imp.path.value(&self.src), imp.name)),
                _ => None,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    /// Matched by the load patterns; its files may be rewritten.
    Root,
    /// Module-local package imported by a root package.
    Dependency,
    /// Embedded standard-library declarations.
    Stub,
}

#[derive(Debug)]
pub struct Package {
    pub path: String,
    pub name: String,
    pub kind: PackageKind,
    pub units: Vec<UnitId>,
    /// Distinct import paths of all units, in first-seen order.
    pub imports: Vec<String>,
    pub scope: Scope,
}

/// Key of an expression across the whole program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub unit: UnitId,
    pub expr: ExprId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    /// `x.f` where `f` is a field.
    FieldVal,
    /// `x.m` where `m` is a method bound to the value `x`.
    MethodVal,
    /// `T.m`, a method used as a function taking the receiver first.
    MethodExpr,
}

/// Resolved `x.name` member access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub kind: SelectionKind,
    /// Type of `x`.
    pub recv: TypeRef,
    /// Type of the selected field, or the method signature.
    pub typ: TypeRef,
    pub indirect: bool,
}

/// Expression types and selections, recorded for root packages only.
#[derive(Debug, Default)]
pub struct TypeInfo {
    pub types: HashMap<NodeRef, TypeRef>,
    pub selections: HashMap<NodeRef, Selection>,
    /// Sorted local names in scope at each method call with arguments.
    pub locals: HashMap<NodeRef, Vec<String>>,
}

#[derive(Debug)]
pub struct Program {
    pub module_path: String,
    pub module_dir: PathBuf,
    pub packages: Vec<Package>,
    pub units: Vec<SourceUnit>,
    pub types: TypeTable,
    pub info: TypeInfo,
}

impl Program {
    #[inline]
    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.0 as usize]
    }

    #[inline]
    pub fn unit(&self, id: UnitId) -> &SourceUnit {
        &self.units[id.0 as usize]
    }

    #[inline]
    pub fn unit_mut(&mut self, id: UnitId) -> &mut SourceUnit {
        &mut self.units[id.0 as usize]
    }

    pub fn package_by_path(&self, path: &str) -> Option<PackageId> {
        self.packages
            .iter()
            .position(|p| p.path == path)
            .map(|i| PackageId(i as u32))
    }

    pub fn root_packages(&self) -> impl Iterator<Item = (PackageId, &Package)> + '_ {
        self.packages
            .iter()
            .enumerate()
            .filter(|(_, p)| p.kind == PackageKind::Root)
            .map(|(i, p)| (PackageId(i as u32), p))
    }

    /// Units of root packages, in load order.
    pub fn root_units(&self) -> Vec<UnitId> {
        self.root_packages()
            .flat_map(|(_, p)| p.units.iter().copied())
            .collect()
    }

    pub fn type_of(&self, unit: UnitId, expr: ExprId) -> Option<TypeRef> {
        self.info.types.get(&NodeRef { unit, expr }).copied()
    }

    pub fn selection(&self, unit: UnitId, expr: ExprId) -> Option<&Selection> {
        self.info.selections.get(&NodeRef { unit, expr })
    }

    /// Function-local names visible at the call `expr`.
    pub fn locals_at(&self, unit: UnitId, expr: ExprId) -> &[String] {
        self.info
            .locals
            .get(&NodeRef { unit, expr })
            .map_or(&[], Vec::as_slice)
    }
}

/// Package name assumed for an import path whose sources are not available.
///
/// Follows the usual conventions: the last path element, skipping a major version suffix
/// (`/v2`), without a `.v3` suffix or `go-` prefix, reduced to identifier characters.
pub fn guess_package_name(path: &str) -> String {
    let mut segments = path.rsplit('/');
    let mut last = segments.next().unwrap_or(path);
    if is_major_version(last) {
        if let Some(prev) = segments.next() {
            last = prev;
        }
    }
    if let Some((base, suffix)) = last.rsplit_once('.') {
        if is_major_version(suffix) {
            last = base;
        }
    }
    let last = last.strip_prefix("go-").unwrap_or(last);
    last.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

fn is_major_version(s: &str) -> bool {
    s.strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// On-disk module fixtures for unit tests.
#[cfg(test)]
pub(crate) mod fixture {
    use std::fs;

    use tempfile::TempDir;

    use super::{load, LoadOptions, Program};

    /// Writes `files` into a fresh module `example.com/m`.
    pub(crate) fn module(files: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("go.mod"), "module example.com/m\n\ngo 1.22\n").unwrap();
        for (name, src) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, src).unwrap();
        }
        dir
    }

    pub(crate) fn program(files: &[(&str, &str)]) -> (TempDir, Program) {
        let dir = module(files);
        let prog = load(dir.path(), &LoadOptions::default()).unwrap();
        (dir, prog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_names_from_import_paths() {
        assert_eq!(guess_package_name("context"), "context");
        assert_eq!(guess_package_name("net/http"), "http");
        assert_eq!(guess_package_name("github.com/jackc/pgx/v5"), "pgx");
        assert_eq!(guess_package_name("gopkg.in/yaml.v3"), "yaml");
        assert_eq!(guess_package_name("github.com/mattn/go-sqlite3"), "sqlite3");
        assert_eq!(guess_package_name("example.com/my-lib"), "mylib");
    }
}
