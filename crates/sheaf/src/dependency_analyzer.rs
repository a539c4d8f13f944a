//! Dependency analysis at member granularity
//!
//! Populates the `deps` list on every member and every exports-list entry
//! by walking the element's expression with a read-only visitor. The walk
//! is purely syntactic: it does not model scopes, shadowing, or control
//! flow, which matches what the input language's code generator emits at
//! the top level. Requires and unrecognised statements contribute no
//! edges.

use rustc_hash::{FxHashMap, FxHashSet};
use swc_ecma_ast::{Expr, Ident, MemberExpr};
use swc_ecma_visit::{Visit, VisitWith};

use crate::{
    classifier::member_label,
    module::{Module, ModuleElement, RequireTarget},
    types::{FxIndexSet, Key, ModuleIdentifier},
};

/// Recompute the `deps` lists of every module in place.
///
/// Safe to run repeatedly; each run replaces the previous lists, so the
/// pipeline re-runs it after every member-body transform.
pub fn analyze_modules(modules: &mut [Module]) {
    for module in modules {
        analyze_module(module);
    }
}

fn analyze_module(module: &mut Module) {
    let imports = collect_imports(module);
    let bound = collect_bound_names(module);
    let id = module.id.clone();

    for element in &mut module.elements {
        match element {
            ModuleElement::Member(member) => {
                member.deps = match member.decl() {
                    Some(expr) => collect_deps(&id, &imports, &bound, expr),
                    None => Vec::new(),
                };
            }
            ModuleElement::ExportsList(list) => {
                for entry in &mut list.entries {
                    entry.deps = collect_deps(&id, &imports, &bound, &entry.value);
                }
            }
            ModuleElement::Require(_) | ModuleElement::Other(_) => {}
        }
    }
}

/// Local require aliases that resolved to an input module
fn collect_imports(module: &Module) -> FxHashMap<String, ModuleIdentifier> {
    let mut imports = FxHashMap::default();
    for element in &module.elements {
        if let ModuleElement::Require(require) = element
            && let RequireTarget::Resolved(target) = &require.target
        {
            imports.insert(require.local.clone(), target.clone());
        }
    }
    imports
}

/// Names bound by the module's own members
fn collect_bound_names(module: &Module) -> FxHashSet<String> {
    module.members().map(|member| member.name.clone()).collect()
}

fn collect_deps(
    module: &ModuleIdentifier,
    imports: &FxHashMap<String, ModuleIdentifier>,
    bound: &FxHashSet<String>,
    expr: &Expr,
) -> Vec<Key> {
    let mut collector = DepCollector {
        module,
        imports,
        bound,
        deps: FxIndexSet::default(),
    };
    expr.visit_with(&mut collector);
    collector.deps.into_iter().collect()
}

/// Visitor that records references to members of this or other modules
struct DepCollector<'a> {
    module: &'a ModuleIdentifier,
    imports: &'a FxHashMap<String, ModuleIdentifier>,
    bound: &'a FxHashSet<String>,
    deps: FxIndexSet<Key>,
}

impl Visit for DepCollector<'_> {
    fn visit_member_expr(&mut self, node: &MemberExpr) {
        // `A.B` or `A["B"]` where `A` is a resolved require alias.
        if let Expr::Ident(object) = &*node.obj
            && let Some(target) = self.imports.get(&*object.sym)
            && let Some(member) = member_label(&node.prop)
        {
            self.deps.insert(Key::new(target.clone(), member));
            return;
        }
        node.visit_children_with(self);
    }

    fn visit_ident(&mut self, node: &Ident) {
        if self.bound.contains(&*node.sym) {
            self.deps.insert(Key::new(self.module.clone(), &*node.sym));
        }
    }
}
