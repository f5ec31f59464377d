//! Decides whether a matched call needs the marker argument.

use crate::config::MarkerPolicy;
use crate::error::SkipReason;
use crate::matcher::CallSite;
use crate::program::types::TypeKind;
use crate::program::Program;

/// Argument to prepend: a call of `package.func()`, rendered without a source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticArg {
    /// Import path of the factory's package.
    pub package: String,
    pub func: String,
}

/// A call site together with the argument it gets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRecord {
    pub site: CallSite,
    pub arg: SyntheticArg,
}

pub struct ArgumentPolicy<'a> {
    marker: &'a MarkerPolicy,
}

impl<'a> ArgumentPolicy<'a> {
    pub fn new(marker: &'a MarkerPolicy) -> Self {
        Self { marker }
    }

    /// A record for `site`, or why the call is left alone.
    ///
    /// A first argument whose type is unknown, or only known as a type parameter, is left
    /// alone: it may already be the marker.
    pub fn decide(&self, prog: &Program, site: &CallSite) -> Result<RewriteRecord, SkipReason> {
        let first = *site.args.first().ok_or(SkipReason::UnresolvedArgumentType)?;
        let t = prog
            .type_of(site.unit, first)
            .ok_or(SkipReason::UnresolvedArgumentType)?;
        if matches!(
            prog.types.kind(t),
            TypeKind::Invalid(_) | TypeKind::TypeParam { .. }
        ) {
            return Err(SkipReason::UnresolvedArgumentType);
        }
        if prog.types.type_string(t) == self.marker.type_name {
            return Err(SkipReason::AlreadyMarked);
        }
        Ok(RewriteRecord {
            site: site.clone(),
            arg: SyntheticArg {
                package: self.marker.factory_package.clone(),
                func: self.marker.factory_func.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::locate_interface;
    use crate::matcher::Matcher;
    use crate::program::fixture::program;

    const SRC: &str = r#"package w

import "context"

type Doer interface {
	Do(x any) int
}

type D struct{}

func (D) Do(x any) int { return 0 }

type Box[T any] struct{ d D }

func (b Box[T]) run(v T) {
	b.d.Do(v)
}

func use(ctx context.Context, d D) {
	d.Do(ctx)
	d.Do(context.TODO())
	d.Do(10)
	d.Do(nil)
	d.Do(undefined)
	c, cancel := context.WithCancel(ctx)
	defer cancel()
	d.Do(c)
}
"#;

    fn decisions() -> Vec<Result<String, SkipReason>> {
        let (_dir, prog) = program(&[("w.go", SRC)]);
        let iface = locate_interface(&prog, "example.com/m", "Doer").unwrap();
        let marker = MarkerPolicy::default();
        let policy = ArgumentPolicy::new(&marker);
        let unit = prog.root_units()[0];
        let u = prog.unit(unit);
        let mut m = Matcher::new(&prog, &iface);
        m.call_sites(unit)
            .map(|site| {
                policy.decide(&prog, &site).map(|rec| {
                    let call = u.expr_span(rec.site.call).text(&u.src).unwrap();
                    format!("{call} <- {}.{}()", rec.arg.package, rec.arg.func)
                })
            })
            .collect()
    }

    #[test]
    fn marker_typed_first_arguments_are_left_alone() {
        assert_eq!(
            decisions(),
            vec![
                Err(SkipReason::UnresolvedArgumentType),
                Err(SkipReason::AlreadyMarked),
                Err(SkipReason::AlreadyMarked),
                Ok("d.Do(10) <- context.Background()".to_owned()),
                Ok("d.Do(nil) <- context.Background()".to_owned()),
                Err(SkipReason::UnresolvedArgumentType),
                Err(SkipReason::AlreadyMarked),
            ]
        );
    }
}
