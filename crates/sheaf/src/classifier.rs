//! Module classifier for the restricted CommonJS subset
//!
//! Walks a program's top-level statements and assigns each one a role in
//! the module model. Patterns are tried in order: `require` binding,
//! plain member, exported member, exports list; the first match wins and
//! anything else is preserved as an opaque statement. Each recognizer is
//! a small predicate returning the extracted pieces or nothing.

use log::trace;
use swc_ecma_ast::{
    AssignOp, AssignTarget, Callee, Decl, Expr, Lit, MemberExpr, MemberProp, ModuleItem, ObjectLit,
    Pat, Program, Prop, PropName, PropOrSpread, SimpleAssignTarget, Stmt, VarDeclKind,
};

use crate::{
    errors::BundleError,
    module::{
        ExportEntry, ExportType, ExportsListElement, MemberElement, Module, ModuleElement,
        RequireElement, RequireTarget,
    },
    types::{FxIndexSet, ModuleIdentifier},
};

/// Require path that resolves to the module's own foreign twin
pub const FOREIGN_REQUIRE: &str = "./foreign";

/// Default prefix stripped from require paths before module lookup
pub const DEFAULT_REQUIRE_PATH: &str = "../";

/// Local alias compiled modules bind their foreign twin to
const FOREIGN_ALIAS: &str = "$foreign";

/// Classify every top-level statement of a parsed module.
///
/// The AST root must be a plain statement list: a script, or a module
/// whose items are all statements. An ECMAScript import or export
/// declaration makes the root unusable and fails with
/// [`BundleError::InvalidTopLevel`].
pub fn classify_program(
    require_path: Option<&str>,
    known_modules: &FxIndexSet<String>,
    id: ModuleIdentifier,
    program: Program,
) -> Result<Module, BundleError> {
    let stmts = program_statements(program).map_err(|err| err.in_module(&id))?;

    let mut elements = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        let element = classify_stmt(require_path, known_modules, &id, stmt)
            .map_err(|err| err.in_module(&id))?;
        elements.push(element);
    }

    Ok(Module::new(id, elements))
}

fn program_statements(program: Program) -> Result<Vec<Stmt>, BundleError> {
    match program {
        Program::Script(script) => Ok(script.body),
        Program::Module(module) => module
            .body
            .into_iter()
            .map(|item| match item {
                ModuleItem::Stmt(stmt) => Ok(stmt),
                ModuleItem::ModuleDecl(_) => Err(BundleError::InvalidTopLevel),
            })
            .collect(),
    }
}

fn classify_stmt(
    require_path: Option<&str>,
    known_modules: &FxIndexSet<String>,
    id: &ModuleIdentifier,
    stmt: Stmt,
) -> Result<ModuleElement, BundleError> {
    if let Some((local, path)) = match_require(&stmt) {
        let target = resolve_require(&path, &id.name, known_modules, require_path);
        trace!("{id}: require {local} -> {target:?}");
        return Ok(ModuleElement::Require(RequireElement { raw: stmt, local, target }));
    }

    if let Some(name) = match_var_member(&stmt) {
        return Ok(ModuleElement::Member(MemberElement {
            raw: stmt,
            exported: false,
            name,
            deps: Vec::new(),
        }));
    }

    if let Some(name) = match_exports_member(&stmt) {
        return Ok(ModuleElement::Member(MemberElement {
            raw: stmt,
            exported: true,
            name,
            deps: Vec::new(),
        }));
    }

    if let Some(object) = match_exports_list(&stmt) {
        let entries = exports_entries(object)?;
        return Ok(ModuleElement::ExportsList(ExportsListElement { entries }));
    }

    Ok(ModuleElement::Other(stmt))
}

/// `var LOCAL = EXPR;` with a single declarator and an initializer
fn match_var_binding(stmt: &Stmt) -> Option<(&str, &Expr)> {
    if let Stmt::Decl(Decl::Var(var)) = stmt
        && var.kind == VarDeclKind::Var
        && let [decl] = var.decls.as_slice()
        && let Pat::Ident(name) = &decl.name
        && let Some(init) = &decl.init
    {
        Some((&*name.id.sym, &**init))
    } else {
        None
    }
}

/// `var LOCAL = require("path");`
fn match_require(stmt: &Stmt) -> Option<(String, String)> {
    let (name, init) = match_var_binding(stmt)?;
    if let Expr::Call(call) = init
        && let Callee::Expr(callee) = &call.callee
        && let Expr::Ident(func) = &**callee
        && &*func.sym == "require"
        && let [arg] = call.args.as_slice()
        && arg.spread.is_none()
        && let Expr::Lit(Lit::Str(path)) = &*arg.expr
    {
        Some((name.to_string(), path.value.to_string()))
    } else {
        None
    }
}

/// `var NAME = EXPR;`
fn match_var_member(stmt: &Stmt) -> Option<String> {
    match_var_binding(stmt).map(|(name, _)| name.to_string())
}

/// `exports.NAME = EXPR;` or `exports["NAME"] = EXPR;`
pub(crate) fn match_exports_member(stmt: &Stmt) -> Option<String> {
    let (object, member) = match_assignment_target(stmt)?;
    if object == "exports" {
        member_label(&member.prop)
    } else {
        None
    }
}

/// `module.exports = { ... };`
pub(crate) fn match_exports_list(stmt: &Stmt) -> Option<&ObjectLit> {
    let (object, member) = match_assignment_target(stmt)?;
    if object == "module" && member_label(&member.prop).as_deref() == Some("exports") {
        if let Stmt::Expr(expr_stmt) = stmt
            && let Expr::Assign(assign) = &*expr_stmt.expr
            && let Expr::Object(literal) = &*assign.right
        {
            return Some(literal);
        }
    }
    None
}

/// A plain `A.B = EXPR;` statement, yielding the object name and the
/// member target
fn match_assignment_target(stmt: &Stmt) -> Option<(&str, &MemberExpr)> {
    if let Stmt::Expr(expr_stmt) = stmt
        && let Expr::Assign(assign) = &*expr_stmt.expr
        && assign.op == AssignOp::Assign
        && let AssignTarget::Simple(SimpleAssignTarget::Member(member)) = &assign.left
        && let Expr::Ident(object) = &*member.obj
    {
        Some((&*object.sym, member))
    } else {
        None
    }
}

pub(crate) fn exports_entries(object: &ObjectLit) -> Result<Vec<ExportEntry>, BundleError> {
    let mut entries = Vec::with_capacity(object.props.len());
    for prop in &object.props {
        let PropOrSpread::Prop(prop) = prop else {
            return Err(BundleError::UnsupportedExport);
        };
        match &**prop {
            // `{ name }` is `name: name` after parsing the shorthand.
            Prop::Shorthand(ident) => entries.push(ExportEntry {
                export_type: ExportType::Regular { source: ident.sym.to_string() },
                name: ident.sym.to_string(),
                value: Expr::Ident(ident.clone()),
                deps: Vec::new(),
            }),
            Prop::KeyValue(kv) => {
                let Some(name) = property_label(&kv.key) else {
                    return Err(BundleError::UnsupportedExport);
                };
                let export_type = classify_export_value(&kv.value)?;
                entries.push(ExportEntry {
                    export_type,
                    name,
                    value: (*kv.value).clone(),
                    deps: Vec::new(),
                });
            }
            _ => return Err(BundleError::UnsupportedExport),
        }
    }
    Ok(entries)
}

fn classify_export_value(value: &Expr) -> Result<ExportType, BundleError> {
    match value {
        Expr::Ident(ident) => Ok(ExportType::Regular { source: ident.sym.to_string() }),
        Expr::Member(member) if is_foreign_accessor(member) => Ok(ExportType::ForeignReexport),
        _ => Err(BundleError::UnsupportedExport),
    }
}

/// `$foreign.X` or `$foreign["X"]`
fn is_foreign_accessor(member: &MemberExpr) -> bool {
    if let Expr::Ident(object) = &*member.obj
        && &*object.sym == FOREIGN_ALIAS
    {
        member_label(&member.prop).is_some()
    } else {
        false
    }
}

/// Unquoted text of a member access: `.name` or `["name"]`
pub(crate) fn member_label(prop: &MemberProp) -> Option<String> {
    match prop {
        MemberProp::Ident(name) => Some(name.sym.to_string()),
        MemberProp::Computed(computed) => match &*computed.expr {
            Expr::Lit(Lit::Str(label)) => Some(label.value.to_string()),
            _ => None,
        },
        MemberProp::PrivateName(_) => None,
    }
}

/// Unquoted text of an object property key: `name:` or `"name":`
pub(crate) fn property_label(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(name) => Some(name.sym.to_string()),
        PropName::Str(label) => Some(label.value.to_string()),
        _ => None,
    }
}

/// Resolve a require path, falling back to a literal `require` call in
/// the output when the path is not recognised.
pub fn resolve_require(
    path: &str,
    module_name: &str,
    known_modules: &FxIndexSet<String>,
    require_path: Option<&str>,
) -> RequireTarget {
    match resolve_require_strict(path, module_name, known_modules, require_path) {
        Ok(id) => RequireTarget::Resolved(id),
        Err(_) => RequireTarget::Unresolved(path.to_string()),
    }
}

/// Strict require resolution: `./foreign` names the module's foreign
/// twin, anything else must be the require prefix followed by a known
/// module name. Unrecognised paths are fatal here instead of falling
/// back to a literal `require` call.
pub fn resolve_require_strict(
    path: &str,
    module_name: &str,
    known_modules: &FxIndexSet<String>,
    require_path: Option<&str>,
) -> Result<ModuleIdentifier, BundleError> {
    if path == FOREIGN_REQUIRE {
        return Ok(ModuleIdentifier::foreign(module_name));
    }
    let prefix = require_path.unwrap_or(DEFAULT_REQUIRE_PATH);
    if let Some(rest) = path.strip_prefix(prefix)
        && known_modules.contains(rest)
    {
        return Ok(ModuleIdentifier::regular(rest));
    }
    Err(BundleError::UnsupportedModulePath(path.to_string()))
}
