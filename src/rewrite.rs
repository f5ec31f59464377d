//! Applies rewrite records to syntax trees and prints the changed units back to text.
//!
//! Printing is span preserving: the original source is copied verbatim and only nodes
//! without a position are rendered, spliced in next to their attached neighbours. Imports
//! needed by rendered qualifiers are added to the file's import section.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{self, Write as _};
use std::path::Path;

use go_syntax::ast::{
    AstArena, Decl, Expr, ExprId, GenDecl, GenDeclKind, ImportName, ImportSpec, ListRef, Span,
    Spec, TopLevelDecl,
};
use go_syntax::walk::preorder_exprs;

use crate::policy::RewriteRecord;
use crate::program::{guess_package_name, Program, SourceUnit, UnitId};

/// Prepends each record's synthetic argument to its call's argument list.
pub fn apply(unit: &mut SourceUnit, records: &[RewriteRecord]) {
    let tree = &mut unit.tree;
    for rec in records {
        let path = tree.interner.intern(&rec.arg.package);
        let name = tree.interner.intern(&rec.arg.func);
        let a = &mut tree.arena;

        let Expr::Call { args, .. } = a.exprs[rec.site.call] else {
            continue;
        };
        let callee = a.exprs.alloc(Expr::QualifiedRef { path, name }, Span::DETACHED);
        let synth = a.exprs.alloc(
            Expr::Call {
                callee,
                l_paren: Span::DETACHED,
                args: ListRef::EMPTY,
                ellipsis: None,
                r_paren: Span::DETACHED,
            },
            Span::DETACHED,
        );
        let orig = a.exprs_list(args).to_vec();
        let new_args = a.list_exprs(std::iter::once(synth).chain(orig));
        if let Expr::Call { args, .. } = &mut a.exprs[rec.site.call] {
            *args = new_args;
        }
    }
}

/// What the emitter needs to know about the program to pick import names.
#[derive(Debug, Clone, Default)]
pub struct ImportEnv {
    /// Declared package name of every loaded package, by import path.
    package_names: HashMap<String, String>,
    /// Package-level names of the unit's package; an import must not shadow them.
    reserved: HashSet<String>,
    /// Function-local names visible at each of the unit's method calls.
    locals: HashMap<ExprId, HashSet<String>>,
}

impl ImportEnv {
    pub fn new(prog: &Program, unit: UnitId) -> Self {
        let package_names = prog
            .packages
            .iter()
            .map(|p| (p.path.clone(), p.name.clone()))
            .collect();
        let pkg = prog.package(prog.unit(unit).package);
        let reserved = pkg.scope.names().map(str::to_owned).collect();
        let locals = prog
            .info
            .locals
            .iter()
            .filter(|(node, _)| node.unit == unit)
            .map(|(node, names)| (node.expr, names.iter().cloned().collect()))
            .collect();
        Self {
            package_names,
            reserved,
            locals,
        }
    }

    /// Whether `name` refers to a file-level binding at the call `site`.
    fn visible_at(&self, site: ExprId, name: &str) -> bool {
        self.locals.get(&site).map_or(true, |l| !l.contains(name))
    }

    fn package_name(&self, path: &str) -> String {
        self.package_names
            .get(path)
            .cloned()
            .unwrap_or_else(|| guess_package_name(path))
    }
}

/// How a file refers to an imported package.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Qualifier {
    Name(String),
    Dot,
}

/// One text insertion; `order` breaks ties between insertions at the same offset.
struct Edit {
    offset: u32,
    order: usize,
    text: String,
}

/// Prints `unit`, rendering every detached node and adding the imports they need.
pub fn emit(unit: &SourceUnit, env: &ImportEnv) -> String {
    let mut printer = Printer::new(unit, env);
    let mut edits = printer.argument_edits();
    edits.extend(printer.import_edits());
    splice(&unit.src, edits)
}

fn splice(src: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by(|x, y| (y.offset, y.order).cmp(&(x.offset, x.order)));
    let mut out = src.to_owned();
    for e in edits {
        out.insert_str(e.offset as usize, &e.text);
    }
    out
}

struct Printer<'u> {
    unit: &'u SourceUnit,
    env: &'u ImportEnv,
    /// Qualifiers per import path, names before dot imports (blank imports excluded).
    imported: HashMap<String, Vec<Qualifier>>,
    /// Local names already bound by imports.
    taken: HashSet<String>,
    /// Imports to add: path and local name, if it differs from the package name.
    added: Vec<(String, Option<String>)>,
}

impl<'u> Printer<'u> {
    fn new(unit: &'u SourceUnit, env: &'u ImportEnv) -> Self {
        let mut imported = HashMap::new();
        let mut taken = HashSet::new();
        for (path, name) in unit.imports() {
            let q = match name {
                Some(ImportName::Blank(_)) => continue,
                Some(ImportName::Dot(_)) => Qualifier::Dot,
                Some(ImportName::Name(id)) => {
                    Qualifier::Name(unit.tree.interner.resolve(id.sym).to_owned())
                }
                None => Qualifier::Name(env.package_name(path)),
            };
            if let Qualifier::Name(n) = &q {
                taken.insert(n.clone());
            }
            imported
                .entry(path.to_owned())
                .or_insert_with(Vec::new)
                .push(q);
        }
        for qs in imported.values_mut() {
            qs.sort_by_key(|q| *q == Qualifier::Dot);
        }
        Self {
            unit,
            env,
            imported,
            taken,
            added: Vec::new(),
        }
    }

    fn arena(&self) -> &'u AstArena {
        &self.unit.tree.arena
    }

    /// Insertions for detached arguments of calls that are still in the source.
    fn argument_edits(&mut self) -> Vec<Edit> {
        let a = self.arena();
        let mut edits = Vec::new();
        for id in preorder_exprs(a, &self.unit.tree.file) {
            let Expr::Call { l_paren, args, .. } = a.exprs[id] else {
                continue;
            };
            if a.exprs.span(id).is_detached() {
                continue;
            }
            let args = a.exprs_list(args);
            for (i, &arg) in args.iter().enumerate() {
                if !a.exprs.span(arg).is_detached() {
                    continue;
                }
                let text = self.render(arg, id);
                let next = args[i + 1..]
                    .iter()
                    .map(|&x| a.exprs.span(x))
                    .find(|s| !s.is_detached());
                let prev = args[..i]
                    .iter()
                    .rev()
                    .map(|&x| a.exprs.span(x))
                    .find(|s| !s.is_detached());
                let edit = match (next, prev) {
                    (Some(next), _) => Edit {
                        offset: next.start,
                        order: i,
                        text: format!("{text}, "),
                    },
                    (None, Some(prev)) => Edit {
                        offset: prev.end,
                        order: i,
                        text: format!(", {text}"),
                    },
                    (None, None) => Edit {
                        offset: l_paren.end,
                        order: i,
                        text,
                    },
                };
                edits.push(edit);
            }
        }
        edits
    }

    /// Source of `id`; detached nodes are rendered for use inside the call `site`.
    fn render(&mut self, id: ExprId, site: ExprId) -> String {
        let unit = self.unit;
        let a = &unit.tree.arena;
        if let Some(text) = a.exprs.span(id).text(&unit.src) {
            return text.to_owned();
        }
        let interner = &unit.tree.interner;
        match a.exprs[id] {
            Expr::QualifiedRef { path, name } => {
                let name = interner.resolve(name);
                match self.qualifier(interner.resolve(path), name, site) {
                    Qualifier::Dot => name.to_owned(),
                    Qualifier::Name(q) => format!("{q}.{name}"),
                }
            }
            Expr::Call { callee, args, .. } => {
                let callee = self.render(callee, site);
                let args: Vec<String> = a
                    .exprs_list(args)
                    .iter()
                    .map(|&x| self.render(x, site))
                    .collect();
                format!("{callee}({})", args.join(", "))
            }
            Expr::Ident(id) => interner.resolve(id.sym).to_owned(),
            Expr::Paren { expr } => format!("({})", self.render(expr, site)),
            Expr::Selector { expr, ident } => {
                let x = self.render(expr, site);
                format!("{x}.{}", interner.resolve(ident.sym))
            }
            _ => String::new(),
        }
    }

    /// Qualifier for `path.member` at the call `site`, adding an import if no existing one
    /// is visible there.
    fn qualifier(&mut self, path: &str, member: &str, site: ExprId) -> Qualifier {
        let env = self.env;
        let usable = self
            .imported
            .get(path)
            .and_then(|qs| {
                qs.iter().find(|q| match q {
                    Qualifier::Name(n) => env.visible_at(site, n),
                    Qualifier::Dot => env.visible_at(site, member),
                })
            })
            .cloned();
        if let Some(q) = usable {
            return q;
        }

        let base = env.package_name(path);
        let mut local = base.clone();
        let mut n = 2;
        while self.taken.contains(&local)
            || env.reserved.contains(&local)
            || !env.visible_at(site, &local)
        {
            local = format!("{base}{n}");
            n += 1;
        }
        let alias = (local != base).then(|| local.clone());
        self.added.push((path.to_owned(), alias));
        self.taken.insert(local.clone());
        self.imported
            .entry(path.to_owned())
            .or_insert_with(Vec::new)
            .push(Qualifier::Name(local.clone()));
        Qualifier::Name(local)
    }

    /// Insertions that add the imports collected while rendering.
    fn import_edits(&self) -> Vec<Edit> {
        let a = self.arena();
        let unit = self.unit;
        let decls: Vec<(Span, GenDecl)> = a
            .top_decls(unit.tree.file.decls)
            .iter()
            .filter_map(|d| match *d {
                TopLevelDecl::Decl(id) => match a.decls[id] {
                    Decl::Gen(g) if g.kind == GenDeclKind::Import => Some((a.decls.span(id), g)),
                    _ => None,
                },
                TopLevelDecl::Func(_) => None,
            })
            .collect();
        let grouped = decls.iter().find(|(_, g)| g.l_paren.is_some());

        let mut edits = Vec::new();
        for (order, (path, alias)) in self.added.iter().enumerate() {
            let spec = match alias {
                Some(alias) => format!("{alias} \"{path}\""),
                None => format!("\"{path}\""),
            };
            let edit = if let Some(&(_, g)) = grouped {
                self.grouped_import(g, path, &spec)
            } else if let Some((span, _)) = decls.last() {
                let line = unit.lines.line_of(span.end);
                (unit.lines.line_end(line), format!("\nimport {spec}"))
            } else {
                let line = unit.lines.line_of(unit.tree.file.name.pos.end);
                (unit.lines.line_end(line), format!("\n\nimport {spec}"))
            };
            edits.push(Edit {
                offset: edit.0,
                order,
                text: edit.1,
            });
        }
        edits
    }

    /// Insertion of `spec` into the first group of a parenthesized import declaration,
    /// keeping the group sorted by path.
    fn grouped_import(&self, g: GenDecl, path: &str, spec: &str) -> (u32, String) {
        let unit = self.unit;
        let lines = &unit.lines;
        let src = unit.src.as_str();
        let specs: Vec<ImportSpec> = self
            .arena()
            .specs_list(g.specs)
            .iter()
            .filter_map(|s| match s {
                Spec::Import(imp) => Some(*imp),
                _ => None,
            })
            .collect();
        let (Some(l_paren), Some(r_paren)) = (g.l_paren, g.r_paren) else {
            return (0, String::new());
        };
        let Some(first) = specs.first() else {
            return (l_paren.end, format!("\n\t{spec}\n"));
        };

        if lines.line_of(l_paren.start) == lines.line_of(r_paren.start) {
            let last = specs.last().unwrap_or(first);
            return (last.span.end, format!("; {spec}"));
        }

        let mut group = vec![*first];
        for s in &specs[1..] {
            let prev_line = lines.line_of(group[group.len() - 1].span.end);
            if lines.line_of(s.span.start) > prev_line + 1 {
                break;
            }
            group.push(*s);
        }

        let indent_of = |s: &ImportSpec| {
            let line_start = lines.line_start(lines.line_of(s.span.start));
            let lead = &src[line_start as usize..s.span.start as usize];
            if lead.chars().all(char::is_whitespace) {
                Some(lead.to_owned())
            } else {
                None
            }
        };

        if let Some(next) = group.iter().find(|s| s.path.value(src) > path) {
            if let Some(indent) = indent_of(next) {
                return (next.span.start, format!("{spec}\n{indent}"));
            }
            return (next.span.start, format!("{spec}; "));
        }
        let last = group[group.len() - 1];
        let indent = indent_of(&last).unwrap_or_else(|| "\t".to_owned());
        let line = lines.line_of(last.span.end);
        if line == lines.line_of(r_paren.start) {
            return (last.span.end, format!("; {spec}"));
        }
        (lines.line_end(line), format!("\n{indent}{spec}"))
    }
}

/// Replaces `path` with `contents` through a temporary file in the same directory, keeping
/// the original permissions.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let perms = fs::metadata(path)?.permissions();
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    fs::set_permissions(tmp.path(), perms)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
