//! Finds the calls of interface methods on receivers that implement the interface.

use std::collections::HashMap;

use go_syntax::ast::{Expr, ExprId};
use go_syntax::walk::preorder_exprs;
use tracing::debug;

use crate::error::SkipReason;
use crate::locate::InterfaceType;
use crate::program::types::TypeRef;
use crate::program::{Program, SelectionKind, UnitId};

/// `receiver.Method(args...)` matched against the target interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub unit: UnitId,
    pub call: ExprId,
    pub method: String,
    /// Resolved type of `receiver`.
    pub receiver: TypeRef,
    pub args: Vec<ExprId>,
    /// `file:line:col` of the call.
    pub position: String,
}

/// Matches calls against one interface; `implements` answers are cached per receiver type.
pub struct Matcher<'p> {
    prog: &'p Program,
    iface: &'p InterfaceType,
    implements: HashMap<TypeRef, bool>,
}

impl<'p> Matcher<'p> {
    pub fn new(prog: &'p Program, iface: &'p InterfaceType) -> Self {
        Self {
            prog,
            iface,
            implements: HashMap::new(),
        }
    }

    /// Matching calls of `unit`, outer calls before the calls nested in them.
    pub fn call_sites<'m>(&'m mut self, unit: UnitId) -> CallSites<'m, 'p> {
        let u = self.prog.unit(unit);
        let exprs = preorder_exprs(&u.tree.arena, &u.tree.file);
        CallSites {
            matcher: self,
            unit,
            exprs: exprs.into_iter(),
        }
    }

    /// `None` if `id` is not a method call with arguments at all.
    fn check(&mut self, unit: UnitId, id: ExprId) -> Option<Result<CallSite, SkipReason>> {
        let u = self.prog.unit(unit);
        let a = &u.tree.arena;
        let Expr::Call { callee, args, .. } = a.exprs[id] else {
            return None;
        };
        if args.is_empty() {
            return None;
        }
        let Expr::Selector { ident, .. } = a.exprs[callee] else {
            return None;
        };

        Some(self.match_selection(unit, callee).map(|receiver| CallSite {
            unit,
            call: id,
            method: u.tree.interner.resolve(ident.sym).to_owned(),
            receiver,
            args: a.exprs_list(args).to_vec(),
            position: u.position(u.expr_span(id).start),
        }))
    }

    /// Receiver type of the selector `callee` if the call targets the interface.
    fn match_selection(
        &mut self,
        unit: UnitId,
        callee: ExprId,
    ) -> Result<TypeRef, SkipReason> {
        let u = self.prog.unit(unit);
        let sel = self
            .prog
            .selection(unit, callee)
            .ok_or(SkipReason::UnresolvedSelection)?;
        if sel.kind != SelectionKind::MethodVal {
            return Err(SkipReason::NotMethodValue);
        }
        if !self.implements(sel.recv) {
            return Err(SkipReason::ReceiverDoesNotImplement);
        }
        let Expr::Selector { ident, .. } = u.tree.arena.exprs[callee] else {
            return Err(SkipReason::UnresolvedSelection);
        };
        if !self.iface.has_method(u.tree.interner.resolve(ident.sym)) {
            return Err(SkipReason::MethodNotInInterface);
        }
        Ok(sel.recv)
    }

    fn implements(&mut self, t: TypeRef) -> bool {
        let (prog, iface) = (self.prog, self.iface);
        *self
            .implements
            .entry(t)
            .or_insert_with(|| prog.types.implements(t, iface.typ))
    }
}

/// Lazy sequence of the matching calls of one unit.
pub struct CallSites<'m, 'p> {
    matcher: &'m mut Matcher<'p>,
    unit: UnitId,
    exprs: std::vec::IntoIter<ExprId>,
}

impl Iterator for CallSites<'_, '_> {
    type Item = CallSite;

    fn next(&mut self) -> Option<CallSite> {
        for id in self.exprs.by_ref() {
            match self.matcher.check(self.unit, id) {
                None => {}
                Some(Ok(site)) => return Some(site),
                Some(Err(reason)) => {
                    let u = self.matcher.prog.unit(self.unit);
                    debug!(
                        position = %u.position(u.expr_span(id).start),
                        %reason,
                        "call skipped"
                    );
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::locate_interface;
    use crate::program::fixture::program;

    const WIBBLE: &str = r#"package w

type Wibbler interface {
	Wibble(i int) int
}

type WibbleClient struct{}

func (wc WibbleClient) Wibble(i int) int { return i }

type WibbleClientWrapper struct {
	WibbleClient
}

func (w *WibbleClientWrapper) Wobble(j int) int { return j }

type Impostor struct{}

func (Impostor) Wibble(s string) int { return 0 }

func use() {
	wc := WibbleClient{}
	wc.Wibble(10)
	wcw := &WibbleClientWrapper{}
	wcw.Wobble(10)
	wcw.Wibble(wc.Wibble(1))
	var iw Wibbler = wc
	iw.Wibble(2)
	Impostor{}.Wibble("x")
	f := WibbleClient.Wibble
	f(wc, 3)
	WibbleClient.Wibble(wc, 4)
}
"#;

    fn matched(src: &str) -> Vec<(String, String)> {
        let (_dir, prog) = program(&[("w.go", src)]);
        let iface = locate_interface(&prog, "example.com/m", "Wibbler").unwrap();
        let mut m = Matcher::new(&prog, &iface);
        let unit = prog.root_units()[0];
        let u = prog.unit(unit);
        m.call_sites(unit)
            .map(|site| {
                let text = u.expr_span(site.call).text(&u.src).unwrap().to_owned();
                let line_col = site.position.rsplitn(3, ':').take(2).collect::<Vec<_>>();
                (text, format!("{}:{}", line_col[1], line_col[0]))
            })
            .collect()
    }

    #[test]
    fn matches_by_method_set_and_name() {
        assert_eq!(
            matched(WIBBLE),
            vec![
                ("wc.Wibble(10)".to_owned(), "23:2".to_owned()),
                ("wcw.Wibble(wc.Wibble(1))".to_owned(), "26:2".to_owned()),
                ("wc.Wibble(1)".to_owned(), "26:13".to_owned()),
                ("iw.Wibble(2)".to_owned(), "28:2".to_owned()),
            ]
        );
    }

    #[test]
    fn receiver_types_are_reported() {
        let (_dir, prog) = program(&[("w.go", WIBBLE)]);
        let iface = locate_interface(&prog, "example.com/m", "Wibbler").unwrap();
        let mut m = Matcher::new(&prog, &iface);
        let unit = prog.root_units()[0];
        let receivers: Vec<String> = m
            .call_sites(unit)
            .map(|s| format!("{} {}", prog.types.type_string(s.receiver), s.method))
            .collect();
        assert_eq!(
            receivers,
            vec![
                "example.com/m.WibbleClient Wibble",
                "*example.com/m.WibbleClientWrapper Wibble",
                "example.com/m.WibbleClient Wibble",
                "example.com/m.Wibbler Wibble",
            ]
        );
    }

    #[test]
    fn calls_without_arguments_are_not_candidates() {
        let src = r#"package w

type Wibbler interface {
	Wibble(i int) int
}

type P struct{}

func (P) Ping()            {}
func (P) Wibble(i int) int { return i }

func use(p P) {
	p.Ping()
}
"#;
        assert!(matched(src).is_empty());
    }
}
