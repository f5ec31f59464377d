//! Type-aware rewriter for Go programs.
//!
//! - Loads a module's packages with [`program::load`] and type checks them.
//! - Finds calls of a target interface's methods on any receiver whose method set covers
//!   the interface, and prepends a marker argument (`context.Background()` by default)
//!   unless the first argument already has the marker type.
//! - Writes changed files back in place, keeping everything else byte for byte.

pub mod config;
pub mod engine;
pub mod error;
pub mod locate;
pub mod matcher;
pub mod policy;
pub mod program;
pub mod rewrite;

pub use config::{InterfaceTarget, MarkerPolicy, Overrides, RewriteConfig};
pub use engine::{run, RunSummary};
pub use error::{ConfigError, LoadError, RewriteError, SkipReason};
