use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures while finding, reading, parsing or grouping the program's sources.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no go.mod found in {0} or any parent directory")]
    NoModule(PathBuf),

    #[error("{0} has no module directive")]
    NoModulePath(PathBuf),

    #[error("reading {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("syntax errors in {path}:\n{}", errors.join("\n"))]
    Syntax { path: PathBuf, errors: Vec<String> },

    #[error("pattern {0:?} matched no packages")]
    EmptyPattern(String),

    #[error("{dir}: found packages {first} and {second}")]
    MixedPackages {
        dir: PathBuf,
        first: String,
        second: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parsing config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no target interface given (need both its package path and name)")]
    MissingInterface,

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("marker type {0:?} is not package-qualified (expected e.g. \"context.Context\")")]
    BadMarker(String),
}

/// One file that could not be written back.
#[derive(Debug, Error)]
#[error("{path}: {source}")]
pub struct WriteFailure {
    pub path: PathBuf,
    pub source: io::Error,
}

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("interface {package}.{name} not found: {reason}")]
    InterfaceNotFound {
        package: String,
        name: String,
        reason: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to write {} file(s):\n{}", .0.len(), join_failures(.0))]
    Write(Vec<WriteFailure>),
}

fn join_failures(failures: &[WriteFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("  {f}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Why a call expression was passed over. Logged, never returned as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("selector could not be resolved")]
    UnresolvedSelection,
    #[error("callee is not a method value")]
    NotMethodValue,
    #[error("method is not declared by the interface")]
    MethodNotInInterface,
    #[error("receiver does not implement the interface")]
    ReceiverDoesNotImplement,
    #[error("first argument already has the marker type")]
    AlreadyMarked,
    #[error("first argument type is unknown")]
    UnresolvedArgumentType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_failures_are_listed() {
        let err = RewriteError::Write(vec![
            WriteFailure {
                path: PathBuf::from("a.go"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            },
            WriteFailure {
                path: PathBuf::from("b.go"),
                source: io::Error::new(io::ErrorKind::Other, "disk full"),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "failed to write 2 file(s):\n  a.go: denied\n  b.go: disk full"
        );
    }

    #[test]
    fn skip_reasons_read_as_log_text() {
        assert_eq!(
            SkipReason::ReceiverDoesNotImplement.to_string(),
            "receiver does not implement the interface"
        );
        assert_eq!(
            SkipReason::AlreadyMarked.to_string(),
            "first argument already has the marker type"
        );
        let failure = WriteFailure {
            path: PathBuf::from("dir/a.go"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(failure.to_string(), "dir/a.go: gone");
        assert!(std::error::Error::source(&failure).is_some());
    }

    #[test]
    fn syntax_errors_are_one_per_line() {
        let err = LoadError::Syntax {
            path: PathBuf::from("x.go"),
            errors: vec!["x.go:1:1: bad".into(), "x.go:2:3: worse".into()],
        };
        assert_eq!(
            err.to_string(),
            "syntax errors in x.go:\nx.go:1:1: bad\nx.go:2:3: worse"
        );
    }
}
