//! The batch pipeline: load, locate, then match and rewrite each root unit.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::RewriteConfig;
use crate::error::{RewriteError, WriteFailure};
use crate::locate::locate_interface;
use crate::matcher::Matcher;
use crate::policy::{ArgumentPolicy, RewriteRecord};
use crate::program::{self, UnitId};
use crate::rewrite::{self, ImportEnv};

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Call sites that got the marker argument.
    pub sites: usize,
    /// Files written, or that would have been written in a dry run.
    pub files: usize,
    pub dry_run: bool,
}

/// Runs one rewrite over the program under `config.root`.
///
/// Nothing is written unless the program loads and the interface is found. Per-file write
/// failures do not stop the run; they are returned together once every unit is done.
pub fn run(config: &RewriteConfig) -> Result<RunSummary, RewriteError> {
    run_with(config, rewrite::write_atomic)
}

fn run_with<W>(config: &RewriteConfig, mut write: W) -> Result<RunSummary, RewriteError>
where
    W: FnMut(&Path, &str) -> io::Result<()>,
{
    config.validate()?;
    let mut prog = program::load(&config.root, &config.load)?;
    let iface = locate_interface(&prog, &config.interface.package, &config.interface.name)?;

    // Read-only pass: every record is decided before any tree changes.
    let policy = ArgumentPolicy::new(&config.marker);
    let mut matcher = Matcher::new(&prog, &iface);
    let mut plan: BTreeMap<UnitId, Vec<RewriteRecord>> = BTreeMap::new();
    for unit in prog.root_units() {
        for site in matcher.call_sites(unit) {
            match policy.decide(&prog, &site) {
                Ok(rec) => {
                    info!(position = %site.position, method = %site.method, "match found");
                    plan.entry(unit).or_default().push(rec);
                }
                Err(reason) => debug!(position = %site.position, %reason, "call skipped"),
            }
        }
    }
    drop(matcher);

    let envs: Vec<(UnitId, ImportEnv)> = plan
        .keys()
        .map(|&unit| (unit, ImportEnv::new(&prog, unit)))
        .collect();

    let mut summary = RunSummary {
        dry_run: config.dry_run,
        ..RunSummary::default()
    };
    let mut failures = Vec::new();
    for (unit, env) in envs {
        let records = &plan[&unit];
        rewrite::apply(prog.unit_mut(unit), records);
        let u = prog.unit(unit);
        let out = rewrite::emit(u, &env);
        summary.sites += records.len();
        summary.files += 1;

        if config.dry_run {
            info!(path = %u.path.display(), sites = records.len(), "would write");
            continue;
        }
        match write(&u.path, &out) {
            Ok(()) => info!(path = %u.path.display(), sites = records.len(), "file written"),
            Err(source) => {
                warn!(path = %u.path.display(), error = %source, "write failed");
                failures.push(WriteFailure {
                    path: u.path.clone(),
                    source,
                });
            }
        }
    }

    if !failures.is_empty() {
        return Err(RewriteError::Write(failures));
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::config::InterfaceTarget;
    use crate::program::fixture::module;

    const SRC: &str = r#"package w

type Wibbler interface {
	Wibble(i int) int
}

type WibbleClient struct{}

func (WibbleClient) Wibble(i int) int { return i }

func use(wc WibbleClient) {
	wc.Wibble(1)
	wc.Wibble(wc.Wibble(2))
}
"#;

    fn config(root: &std::path::Path) -> RewriteConfig {
        RewriteConfig::new(
            root,
            InterfaceTarget {
                package: "example.com/m".to_owned(),
                name: "Wibbler".to_owned(),
            },
        )
    }

    #[test]
    fn summary_counts_sites_and_files() {
        let dir = module(&[("w.go", SRC)]);
        let summary = run(&config(dir.path())).unwrap();
        assert_eq!(
            summary,
            RunSummary {
                sites: 3,
                files: 1,
                dry_run: false,
            }
        );
        let out = fs::read_to_string(dir.path().join("w.go")).unwrap();
        assert!(out.contains(
            "wc.Wibble(context.Background(), wc.Wibble(context.Background(), 2))"
        ));
    }

    #[test]
    fn dry_run_leaves_files_alone() {
        let dir = module(&[("w.go", SRC)]);
        let mut cfg = config(dir.path());
        cfg.dry_run = true;
        let summary = run(&cfg).unwrap();
        assert_eq!(summary.sites, 3);
        assert!(summary.dry_run);
        assert_eq!(fs::read_to_string(dir.path().join("w.go")).unwrap(), SRC);
    }

    #[test]
    fn write_failures_are_collected_and_other_files_still_written() {
        let call =
            |name: &str| format!("package w\n\nfunc {name}(wc WibbleClient) {{ wc.Wibble(1) }}\n");
        let dir = module(&[("w.go", SRC), ("a.go", &call("a")), ("b.go", &call("b"))]);

        // b.go turns into a non-empty directory before it is written, so it cannot be
        // replaced by a rename.
        let err = run_with(&config(dir.path()), |path, text| {
            if path.ends_with("b.go") {
                fs::remove_file(path)?;
                fs::create_dir(path)?;
                fs::write(path.join("keep"), "")?;
            }
            rewrite::write_atomic(path, text)
        })
        .unwrap_err();

        let RewriteError::Write(failures) = err else {
            panic!("expected write failures, got {err:?}");
        };
        let failed: Vec<_> = failures
            .iter()
            .map(|f| f.path.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(failed, vec![Some("b.go")]);
        assert!(dir.path().join("b.go").is_dir());

        assert!(fs::read_to_string(dir.path().join("a.go"))
            .unwrap()
            .contains("wc.Wibble(context.Background(), 1)"));
        assert!(fs::read_to_string(dir.path().join("w.go"))
            .unwrap()
            .contains("wc.Wibble(context.Background(), wc.Wibble(context.Background(), 2))"));
    }

    #[test]
    fn missing_interface_aborts_before_writing() {
        let dir = module(&[("w.go", SRC)]);
        let mut cfg = config(dir.path());
        cfg.interface.name = "Wobbler".to_owned();
        assert!(matches!(
            run(&cfg),
            Err(RewriteError::InterfaceNotFound { .. })
        ));
        assert_eq!(fs::read_to_string(dir.path().join("w.go")).unwrap(), SRC);
    }
}
