//! Run configuration: defaults, then an optional `ctxrewrite.toml`, then command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::program::LoadOptions;

/// File looked up in the root directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "ctxrewrite.toml";

/// Interface whose method calls are rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceTarget {
    /// Import path of the declaring package.
    pub package: String,
    pub name: String,
}

/// Which first argument counts as present, and how to build it when it is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPolicy {
    /// Fully qualified type name, as printed by the type checker (`context.Context`).
    pub type_name: String,
    pub factory_package: String,
    pub factory_func: String,
}

impl Default for MarkerPolicy {
    fn default() -> Self {
        Self {
            type_name: "context.Context".to_owned(),
            factory_package: "context".to_owned(),
            factory_func: "Background".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteConfig {
    pub root: PathBuf,
    pub interface: InterfaceTarget,
    pub marker: MarkerPolicy,
    pub load: LoadOptions,
    /// Report what would change without writing.
    pub dry_run: bool,
}

impl RewriteConfig {
    pub fn new(root: impl Into<PathBuf>, interface: InterfaceTarget) -> Self {
        Self {
            root: root.into(),
            interface,
            marker: MarkerPolicy::default(),
            load: LoadOptions::default(),
            dry_run: false,
        }
    }

    /// Merges the config file (if any) and `overrides` over the defaults, then validates.
    pub fn resolve(overrides: Overrides) -> Result<Self, ConfigError> {
        let root = overrides.root.clone().unwrap_or_else(|| PathBuf::from("."));
        let raw = match &overrides.config_file {
            Some(path) => RawConfig::read(path)?,
            None => {
                let default = root.join(CONFIG_FILE_NAME);
                if default.is_file() {
                    RawConfig::read(&default)?
                } else {
                    RawConfig::default()
                }
            }
        };
        let config = Self::from_raw(root, &raw, &overrides)?;
        config.validate()?;
        Ok(config)
    }

    fn from_raw(root: PathBuf, raw: &RawConfig, cli: &Overrides) -> Result<Self, ConfigError> {
        let package = cli
            .interface_package
            .clone()
            .or_else(|| raw.interface.package.clone());
        let name = cli
            .interface_name
            .clone()
            .or_else(|| raw.interface.name.clone());
        let (Some(package), Some(name)) = (package, name) else {
            return Err(ConfigError::MissingInterface);
        };

        let mut config = Self::new(root, InterfaceTarget { package, name });

        let marker = &mut config.marker;
        for (slot, file, flag) in [
            (&mut marker.type_name, &raw.marker.type_name, &cli.marker_type),
            (
                &mut marker.factory_package,
                &raw.marker.factory_package,
                &cli.factory_package,
            ),
            (&mut marker.factory_func, &raw.marker.factory, &cli.factory_func),
        ] {
            if let Some(v) = flag.as_ref().or(file.as_ref()) {
                slot.clone_from(v);
            }
        }

        if let Some(patterns) = &raw.load.patterns {
            config.load.patterns.clone_from(patterns);
        }
        if !cli.patterns.is_empty() {
            config.load.patterns.clone_from(&cli.patterns);
        }
        if let Some(tests) = raw.load.tests {
            config.load.tests = tests;
        }
        if cli.no_tests {
            config.load.tests = false;
        }
        config.dry_run = cli.dry_run || raw.dry_run.unwrap_or(false);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("interface package", &self.interface.package),
            ("interface name", &self.interface.name),
            ("marker type", &self.marker.type_name),
            ("factory package", &self.marker.factory_package),
            ("factory function", &self.marker.factory_func),
        ];
        for (what, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty(what));
            }
        }
        if self.load.patterns.iter().all(|p| p.trim().is_empty()) {
            return Err(ConfigError::Empty("load patterns"));
        }
        match self.marker.type_name.trim_start_matches('*').rsplit_once('.') {
            Some((pkg, name)) if !pkg.is_empty() && !name.is_empty() => Ok(()),
            _ => Err(ConfigError::BadMarker(self.marker.type_name.clone())),
        }
    }
}

/// Values given on the command line; `None`/empty means "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub root: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub interface_package: Option<String>,
    pub interface_name: Option<String>,
    pub marker_type: Option<String>,
    pub factory_package: Option<String>,
    pub factory_func: Option<String>,
    pub patterns: Vec<String>,
    pub no_tests: bool,
    pub dry_run: bool,
}

/// `ctxrewrite.toml` as written; every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    pub interface: RawInterface,
    pub marker: RawMarker,
    pub load: RawLoad,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawInterface {
    pub package: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawMarker {
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub factory_package: Option<String>,
    pub factory: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawLoad {
    pub patterns: Option<Vec<String>>,
    pub tests: Option<bool>,
}

impl RawConfig {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn flags(pkg: &str, name: &str) -> Overrides {
        Overrides {
            interface_package: Some(pkg.to_owned()),
            interface_name: Some(name.to_owned()),
            ..Overrides::default()
        }
    }

    #[test]
    fn defaults_fill_everything_but_the_interface() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = RewriteConfig::resolve(Overrides {
            root: Some(dir.path().to_path_buf()),
            ..flags("example.com/m", "Wibbler")
        })
        .unwrap();
        assert_eq!(cfg.marker, MarkerPolicy::default());
        assert_eq!(cfg.load, LoadOptions::default());
        assert!(!cfg.dry_run);
        assert_eq!(cfg.interface.name, "Wibbler");
    }

    #[test]
    fn file_in_root_is_picked_up_and_flags_win() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"
dry_run = true

[interface]
package = "example.com/m/store"
name = "Store"

[marker]
type = "example.com/m/rpc.Ctx"
factory_package = "example.com/m/rpc"
factory = "NewCtx"

[load]
patterns = ["./store/..."]
tests = false
"#,
        )
        .unwrap();

        let cfg = RewriteConfig::resolve(Overrides {
            root: Some(dir.path().to_path_buf()),
            interface_name: Some("Reader".to_owned()),
            factory_func: Some("Background".to_owned()),
            ..Overrides::default()
        })
        .unwrap();

        assert_eq!(
            cfg.interface,
            InterfaceTarget {
                package: "example.com/m/store".to_owned(),
                name: "Reader".to_owned(),
            }
        );
        assert_eq!(
            cfg.marker,
            MarkerPolicy {
                type_name: "example.com/m/rpc.Ctx".to_owned(),
                factory_package: "example.com/m/rpc".to_owned(),
                factory_func: "Background".to_owned(),
            }
        );
        assert_eq!(cfg.load.patterns, vec!["./store/...".to_owned()]);
        assert!(!cfg.load.tests);
        assert!(cfg.dry_run);
    }

    #[test]
    fn interface_is_required() {
        let dir = tempfile::tempdir().unwrap();
        let err = RewriteConfig::resolve(Overrides {
            root: Some(dir.path().to_path_buf()),
            interface_name: Some("Wibbler".to_owned()),
            ..Overrides::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingInterface));
    }

    #[test]
    fn rejects_unknown_keys_and_bad_markers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[marker]\nkind = \"x\"\n").unwrap();
        let err = RewriteConfig::resolve(Overrides {
            config_file: Some(path),
            ..flags("p", "I")
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "{err}");

        let err = RewriteConfig::resolve(Overrides {
            root: Some(dir.path().to_path_buf()),
            marker_type: Some("Context".to_owned()),
            ..flags("p", "I")
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::BadMarker(m) if m == "Context"));

        let err = RewriteConfig::resolve(Overrides {
            root: Some(dir.path().to_path_buf()),
            ..flags("p", " ")
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Empty("interface name")));
    }

    #[test]
    fn pointer_markers_are_qualified() {
        let mut cfg = RewriteConfig::new(
            ".",
            InterfaceTarget {
                package: "p".to_owned(),
                name: "I".to_owned(),
            },
        );
        cfg.marker.type_name = "*example.com/m/rpc.Ctx".to_owned();
        assert!(cfg.validate().is_ok());
    }
}
