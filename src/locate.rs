//! Resolves the target interface by package path and name.

use tracing::debug;

use crate::error::RewriteError;
use crate::program::scope::Object;
use crate::program::types::TypeRef;
use crate::program::{PackageId, Program};

/// The located interface: its type and flattened method set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceType {
    pub package: String,
    pub name: String,
    pub typ: TypeRef,
    /// Method names and signatures, sorted by name, embedded interfaces included.
    pub methods: Vec<(String, TypeRef)>,
}

impl InterfaceType {
    pub fn has_method(&self, name: &str) -> bool {
        self.methods
            .binary_search_by(|(m, _)| m.as_str().cmp(name))
            .is_ok()
    }
}

/// Finds `package.name` among the root packages, then among their direct imports.
///
/// The first package whose path matches decides: a missing name there is an error even if
/// another candidate would have had it.
pub fn locate_interface(
    prog: &Program,
    package: &str,
    name: &str,
) -> Result<InterfaceType, RewriteError> {
    let not_found = |reason: &str| RewriteError::InterfaceNotFound {
        package: package.to_owned(),
        name: name.to_owned(),
        reason: reason.to_owned(),
    };

    let Some(pkg) = find_package(prog, package) else {
        let imported = prog
            .root_packages()
            .any(|(_, p)| p.imports.iter().any(|i| i == package));
        return Err(not_found(if imported {
            "package is imported but its sources are not available"
        } else {
            "no root package has this path or imports it"
        }));
    };

    let t = match prog.package(pkg).scope.lookup(name) {
        Some(Object::TypeName(t)) => t,
        Some(_) => return Err(not_found("name is not a type")),
        None => return Err(not_found("no such name in package")),
    };
    if !prog.types.is_interface(t) {
        return Err(not_found("type is not an interface"));
    }

    let methods = prog.types.interface_methods(t);
    debug!(
        interface = %format_args!("{package}.{name}"),
        methods = methods.len(),
        "interface located"
    );
    Ok(InterfaceType {
        package: package.to_owned(),
        name: name.to_owned(),
        typ: t,
        methods,
    })
}

fn find_package(prog: &Program, path: &str) -> Option<PackageId> {
    if let Some((id, _)) = prog.root_packages().find(|(_, p)| p.path == path) {
        return Some(id);
    }
    prog.root_packages()
        .flat_map(|(_, p)| p.imports.iter())
        .find(|imp| imp.as_str() == path)
        .and_then(|imp| prog.package_by_path(imp))
}
