//! Restricted module model produced by classification
//!
//! Every top-level statement of an input module is classified into one of
//! four element roles. Each element keeps the unmodified AST node it was
//! built from, so the emitter can print retained code verbatim. Element
//! order is source order and is preserved through every later stage.

use swc_ecma_ast::{Decl, Expr, Stmt};

use crate::types::{Key, ModuleIdentifier};

/// Where a `require` call points after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequireTarget {
    /// An input module; emitted as a namespace lookup
    Resolved(ModuleIdentifier),
    /// Anything else; left as a literal `require` call in the output
    Unresolved(String),
}

/// `var LOCAL = require("...");`
#[derive(Debug, Clone)]
pub struct RequireElement {
    /// Original statement, emitted verbatim when the target is unresolved
    pub raw: Stmt,
    /// Local alias the require is bound to
    pub local: String,
    /// Resolution result for the require path
    pub target: RequireTarget,
}

/// A top-level binding: `var name = EXPR;` or `exports.name = EXPR;`
#[derive(Debug, Clone)]
pub struct MemberElement {
    /// Original statement, emitted verbatim
    pub raw: Stmt,
    /// True for the `exports.name = EXPR;` form
    pub exported: bool,
    /// Binding or export name
    pub name: String,
    /// Members this declaration references, first-seen order, no duplicates
    pub deps: Vec<Key>,
}

impl MemberElement {
    /// The right-hand side of the binding
    pub fn decl(&self) -> Option<&Expr> {
        match &self.raw {
            Stmt::Decl(Decl::Var(var)) => var.decls.first().and_then(|decl| decl.init.as_deref()),
            Stmt::Expr(stmt) => match &*stmt.expr {
                Expr::Assign(assign) => Some(&*assign.right),
                _ => None,
            },
            _ => None,
        }
    }

    /// Mutable access to the right-hand side, for member-body transforms
    pub(crate) fn decl_mut(&mut self) -> Option<&mut Expr> {
        match &mut self.raw {
            Stmt::Decl(Decl::Var(var)) => {
                var.decls.first_mut().and_then(|decl| decl.init.as_deref_mut())
            }
            Stmt::Expr(stmt) => match &mut *stmt.expr {
                Expr::Assign(assign) => Some(&mut *assign.right),
                _ => None,
            },
            _ => None,
        }
    }
}

/// How an `ExportsList` entry forwards its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportType {
    /// `name: source` where the value is a plain identifier
    Regular {
        /// Identifier the export forwards
        source: String,
    },
    /// `name: $foreign.x`, forwarding a foreign-module binding
    ForeignReexport,
}

/// One property of a `module.exports = { ... };` object
#[derive(Debug, Clone)]
pub struct ExportEntry {
    /// Shape of the forwarded value
    pub export_type: ExportType,
    /// Name the value is exported under
    pub name: String,
    /// Original value expression, emitted verbatim
    pub value: Expr,
    /// Members the value references
    pub deps: Vec<Key>,
}

/// `module.exports = { ... };`
///
/// A module may combine `exports.foo = ...` members with an exports list;
/// the two are treated as additive.
#[derive(Debug, Clone)]
pub struct ExportsListElement {
    /// Entries in source order
    pub entries: Vec<ExportEntry>,
}

/// Role of one top-level statement
#[derive(Debug, Clone)]
pub enum ModuleElement {
    /// `var LOCAL = require("...");`
    Require(RequireElement),
    /// `var name = EXPR;` or `exports.name = EXPR;`
    Member(MemberElement),
    /// `module.exports = { ... };`
    ExportsList(ExportsListElement),
    /// Any other top-level statement, preserved verbatim
    Other(Stmt),
}

/// A classified input module
#[derive(Debug, Clone)]
pub struct Module {
    /// Module identity
    pub id: ModuleIdentifier,
    /// Classified statements in source order
    pub elements: Vec<ModuleElement>,
}

impl Module {
    /// Build a module from its classified elements
    pub fn new(id: ModuleIdentifier, elements: Vec<ModuleElement>) -> Self {
        Self { id, elements }
    }

    /// True when nothing in the module is worth emitting: only requires,
    /// unrecognised statements, and export lists whose entries are gone
    pub fn is_empty(&self) -> bool {
        self.elements.iter().all(|element| match element {
            ModuleElement::Require(_) | ModuleElement::Other(_) => true,
            ModuleElement::ExportsList(list) => list.entries.is_empty(),
            ModuleElement::Member(_) => false,
        })
    }

    /// The module's member elements in source order
    pub fn members(&self) -> impl Iterator<Item = &MemberElement> {
        self.elements.iter().filter_map(|element| match element {
            ModuleElement::Member(member) => Some(member),
            _ => None,
        })
    }
}
