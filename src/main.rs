use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ctxrewrite::{Overrides, RewriteConfig};

fn cli() -> Command {
    Command::new("ctxrewrite")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Prepends a marker argument to calls of an interface's methods in Go code")
        .arg(
            Arg::new("root")
                .value_name("ROOT")
                .help("Directory to rewrite (default: current directory)"),
        )
        .arg(
            Arg::new("interface-pkg")
                .long("interface-pkg")
                .value_name("PATH")
                .help("Import path of the package declaring the interface"),
        )
        .arg(
            Arg::new("interface")
                .long("interface")
                .value_name("NAME")
                .help("Name of the interface"),
        )
        .arg(
            Arg::new("marker")
                .long("marker")
                .value_name("TYPE")
                .help("Qualified type of an argument that already counts as the marker [default: context.Context]"),
        )
        .arg(
            Arg::new("factory-pkg")
                .long("factory-pkg")
                .value_name("PATH")
                .help("Import path of the package with the marker factory [default: context]"),
        )
        .arg(
            Arg::new("factory")
                .long("factory")
                .value_name("FUNC")
                .help("Function called to build the marker [default: Background]"),
        )
        .arg(
            Arg::new("pattern")
                .short('p')
                .long("pattern")
                .value_name("PAT")
                .action(ArgAction::Append)
                .help("Package pattern relative to ROOT, repeatable [default: ./...]"),
        )
        .arg(
            Arg::new("no-tests")
                .long("no-tests")
                .action(ArgAction::SetTrue)
                .help("Skip _test.go files"),
        )
        .arg(
            Arg::new("dry-run")
                .short('n')
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Report what would change without writing"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML config file (default: ROOT/ctxrewrite.toml if present)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .conflicts_with("quiet")
                .help("Log skipped calls and load progress"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Only log warnings and errors"),
        )
}

fn overrides(m: &ArgMatches) -> Overrides {
    let string = |id: &str| m.get_one::<String>(id).cloned();
    Overrides {
        root: string("root").map(PathBuf::from),
        config_file: string("config").map(PathBuf::from),
        interface_package: string("interface-pkg"),
        interface_name: string("interface"),
        marker_type: string("marker"),
        factory_package: string("factory-pkg"),
        factory_func: string("factory"),
        patterns: m
            .get_many::<String>("pattern")
            .map(|ps| ps.cloned().collect())
            .unwrap_or_default(),
        no_tests: m.get_flag("no-tests"),
        dry_run: m.get_flag("dry-run"),
    }
}

fn init_tracing(m: &ArgMatches) {
    let level = if m.get_flag("verbose") {
        "ctxrewrite=debug"
    } else if m.get_flag("quiet") {
        "ctxrewrite=warn"
    } else {
        "ctxrewrite=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(m: &ArgMatches) -> anyhow::Result<()> {
    let config = RewriteConfig::resolve(overrides(m)).context("invalid configuration")?;
    let summary = ctxrewrite::run(&config).with_context(|| {
        format!(
            "rewriting calls of {}.{} under {}",
            config.interface.package,
            config.interface.name,
            config.root.display()
        )
    })?;
    info!(
        sites = summary.sites,
        files = summary.files,
        dry_run = summary.dry_run,
        "done"
    );
    Ok(())
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(&matches);
    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn flags_become_overrides() {
        let m = cli().get_matches_from([
            "ctxrewrite",
            "svc",
            "--interface-pkg",
            "example.com/m/store",
            "--interface",
            "Store",
            "-p",
            "./a/...",
            "-p",
            "./b",
            "--no-tests",
            "-n",
        ]);
        let o = overrides(&m);
        assert_eq!(o.root, Some(PathBuf::from("svc")));
        assert_eq!(o.interface_package.as_deref(), Some("example.com/m/store"));
        assert_eq!(o.interface_name.as_deref(), Some("Store"));
        assert_eq!(o.patterns, vec!["./a/...", "./b"]);
        assert!(o.no_tests && o.dry_run);
        assert_eq!(o.marker_type, None);
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(cli()
            .try_get_matches_from(["ctxrewrite", "-v", "-q"])
            .is_err());
    }
}
