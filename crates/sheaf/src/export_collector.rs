//! Collects the names a module exports
//!
//! Recognises the same `exports.name = ...` and `module.exports = { ... }`
//! shapes as the classifier and gathers every exported name, in source
//! order. Callers use this to check that the foreign imports a compiled
//! module declares are actually provided by its hand-written twin; the
//! bundle tests use it to re-extract export sets from emitted output.

use swc_ecma_ast::{ModuleItem, Program, Stmt};

use crate::{
    classifier::{match_exports_list, match_exports_member},
    errors::BundleError,
    types::ModuleIdentifier,
};

/// Every name the program exports, in source order.
///
/// Statements outside the two export shapes are ignored. A recognised
/// `module.exports = { ... }` object with an unsupported property shape
/// fails with [`BundleError::UnsupportedExport`] wrapped in the module's
/// foreign identity.
pub fn exported_names(module_name: &str, program: &Program) -> Result<Vec<String>, BundleError> {
    let stmts: Vec<&Stmt> = match program {
        Program::Script(script) => script.body.iter().collect(),
        Program::Module(module) => module
            .body
            .iter()
            .filter_map(|item| match item {
                ModuleItem::Stmt(stmt) => Some(stmt),
                ModuleItem::ModuleDecl(_) => None,
            })
            .collect(),
    };

    let mut names = Vec::new();
    for stmt in stmts {
        if let Some(name) = match_exports_member(stmt) {
            names.push(name);
            continue;
        }
        if let Some(object) = match_exports_list(stmt) {
            let entries = crate::classifier::exports_entries(object)
                .map_err(|err| err.in_module(&ModuleIdentifier::foreign(module_name)))?;
            names.extend(entries.into_iter().map(|entry| entry.name));
        }
    }
    Ok(names)
}
