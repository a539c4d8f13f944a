//! Saturated-application uncurrying
//!
//! The input language compiles n-ary functions to chains of one-parameter
//! function expressions, so every call site pays one closure allocation
//! per argument. This transform flattens eligible top-level members into a
//! sibling `f$$n` taking all n parameters at once and rewrites fully
//! saturated call chains in the same module to a single call of the
//! sibling. Cross-module call sites keep the curried form because the
//! sibling is not exported. The rewrite is syntactic, like the dependency
//! walk: a member name shadowed inside a body is still treated as the
//! top-level member, which the input language's code generator never
//! produces.

use log::debug;
use swc_common::{DUMMY_SP, SyntaxContext, util::take::Take};
use swc_ecma_ast::{
    BindingIdent, BlockStmt, CallExpr, Callee, Decl, Expr, FnExpr, Function, Ident, Param, Pat,
    Stmt, VarDecl, VarDeclKind, VarDeclarator,
};
use swc_ecma_visit::{VisitMut, VisitMutWith};

use crate::{
    module::{MemberElement, Module, ModuleElement},
    transform::ModuleTransform,
    types::{FxIndexMap, FxIndexSet, ModuleIdentifier},
};

/// Minimum chain depth worth flattening
const MIN_ARITY: usize = 2;

/// Uncurries saturated applications of same-module members
pub struct Uncurry;

impl ModuleTransform for Uncurry {
    fn name(&self) -> &'static str {
        "uncurry"
    }

    fn apply(&self, mut modules: Vec<Module>, _entry_points: &[ModuleIdentifier]) -> Vec<Module> {
        for module in &mut modules {
            uncurry_module(module);
        }
        modules
    }
}

/// A member whose declaration is a flattenable curried chain
struct CurriedMember {
    arity: usize,
    params: Vec<Pat>,
    body: BlockStmt,
}

fn uncurry_module(module: &mut Module) {
    let candidates = find_candidates(module);
    if candidates.is_empty() {
        return;
    }

    let mut rewriter = CallRewriter {
        candidates: &candidates,
        used: FxIndexSet::default(),
    };
    for element in &mut module.elements {
        if let ModuleElement::Member(member) = element
            && let Some(expr) = member.decl_mut()
        {
            expr.visit_mut_with(&mut rewriter);
        }
    }
    if rewriter.used.is_empty() {
        return;
    }
    debug!("{}: uncurried {} call targets", module.id, rewriter.used.len());

    // Insert each flattened sibling right after the first member with the
    // mirrored name; `var f = ...` and `exports.f = f` share that name.
    let used = rewriter.used;
    let mut inserted: FxIndexSet<String> = FxIndexSet::default();
    let mut elements = Vec::with_capacity(module.elements.len() + used.len());
    for element in module.elements.drain(..) {
        let name = match &element {
            ModuleElement::Member(member) => Some(member.name.clone()),
            _ => None,
        };
        elements.push(element);
        if let Some(name) = name
            && used.contains(&name)
            && !inserted.contains(&name)
            && let Some(candidate) = candidates.get(&name)
        {
            inserted.insert(name.clone());
            elements.push(ModuleElement::Member(flattened_member(&name, candidate)));
        }
    }
    module.elements = elements;
}

fn find_candidates(module: &Module) -> FxIndexMap<String, CurriedMember> {
    let member_names: FxIndexSet<String> =
        module.members().map(|member| member.name.clone()).collect();

    let mut candidates = FxIndexMap::default();
    for member in module.members() {
        if let Some(expr) = member.decl()
            && let Some(candidate) = match_curried_chain(expr)
            && !member_names.contains(&uncurried_name(&member.name, candidate.arity))
        {
            candidates.insert(member.name.clone(), candidate);
        }
    }
    candidates
}

/// Match a chain of one-parameter function expressions where every level
/// but the last is exactly `return <next level>;`. Flattening such a
/// chain preserves semantics for saturated calls because no level does
/// anything besides closing over its parameter.
fn match_curried_chain(expr: &Expr) -> Option<CurriedMember> {
    let mut params: Vec<Pat> = Vec::new();
    let mut current = expr;
    let body = loop {
        let Expr::Fn(fn_expr) = current else {
            return None;
        };
        let function = &*fn_expr.function;
        if function.is_async || function.is_generator {
            return None;
        }
        let [param] = function.params.as_slice() else {
            return None;
        };
        if !matches!(param.pat, Pat::Ident(_)) {
            return None;
        }
        let block = function.body.as_ref()?;
        params.push(param.pat.clone());

        if let [Stmt::Return(ret)] = block.stmts.as_slice()
            && let Some(arg) = &ret.arg
            && matches!(&**arg, Expr::Fn(_))
        {
            current = arg;
            continue;
        }
        break block.clone();
    };

    if params.len() < MIN_ARITY {
        return None;
    }
    Some(CurriedMember {
        arity: params.len(),
        params,
        body,
    })
}

fn uncurried_name(name: &str, arity: usize) -> String {
    format!("{name}$${arity}")
}

/// Rewrites saturated application chains of candidate members
struct CallRewriter<'a> {
    candidates: &'a FxIndexMap<String, CurriedMember>,
    used: FxIndexSet<String>,
}

impl CallRewriter<'_> {
    /// Base member name and arity when `expr` is a single-argument
    /// application chain long enough to saturate a candidate
    fn match_saturated(&self, expr: &Expr) -> Option<(String, usize)> {
        let mut depth = 0;
        let mut current = expr;
        while let Expr::Call(call) = current
            && let Callee::Expr(callee) = &call.callee
            && let [arg] = call.args.as_slice()
            && arg.spread.is_none()
        {
            depth += 1;
            current = callee;
        }
        if depth == 0 {
            return None;
        }
        let Expr::Ident(base) = current else {
            return None;
        };
        let candidate = self.candidates.get(&*base.sym)?;
        (depth >= candidate.arity).then(|| (base.sym.to_string(), candidate.arity))
    }
}

impl VisitMut for CallRewriter<'_> {
    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        // Bottom-up, so inner chains are already in final form.
        expr.visit_mut_children_with(self);
        if let Some((name, arity)) = self.match_saturated(expr) {
            let owned = expr.take();
            *expr = rebuild_saturated(owned, &name, arity);
            self.used.insert(name);
        }
    }
}

/// Replace the first `arity` applications with one call of the flattened
/// sibling, re-applying any remaining arguments one at a time.
fn rebuild_saturated(expr: Expr, name: &str, arity: usize) -> Expr {
    let mut args_outer_first = Vec::new();
    let mut current = expr;
    while let Expr::Call(call) = current {
        let CallExpr { callee, mut args, .. } = call;
        let Callee::Expr(callee) = callee else {
            unreachable!("application chain was checked by match_saturated");
        };
        args_outer_first.push(args.remove(0));
        current = *callee;
    }

    let mut args_inner_first = args_outer_first;
    args_inner_first.reverse();
    let saturated = args_inner_first.drain(..arity).collect();

    let mut result = Expr::Call(CallExpr {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        callee: Callee::Expr(Box::new(Expr::Ident(new_ident(uncurried_name(name, arity))))),
        args: saturated,
        type_args: None,
    });
    for arg in args_inner_first {
        result = Expr::Call(CallExpr {
            span: DUMMY_SP,
            ctxt: SyntaxContext::empty(),
            callee: Callee::Expr(Box::new(result)),
            args: vec![arg],
            type_args: None,
        });
    }
    result
}

/// `var name$$n = function (p1, ..., pn) { <innermost body> };`
fn flattened_member(name: &str, candidate: &CurriedMember) -> MemberElement {
    let uncurried = uncurried_name(name, candidate.arity);
    let params = candidate
        .params
        .iter()
        .cloned()
        .map(|pat| Param {
            span: DUMMY_SP,
            decorators: Vec::new(),
            pat,
        })
        .collect();
    let function = Function {
        params,
        decorators: Vec::new(),
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        body: Some(candidate.body.clone()),
        is_generator: false,
        is_async: false,
        type_params: None,
        return_type: None,
    };
    let raw = Stmt::Decl(Decl::Var(Box::new(VarDecl {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        kind: VarDeclKind::Var,
        declare: false,
        decls: vec![VarDeclarator {
            span: DUMMY_SP,
            name: Pat::Ident(BindingIdent {
                id: new_ident(uncurried.clone()),
                type_ann: None,
            }),
            init: Some(Box::new(Expr::Fn(FnExpr {
                ident: None,
                function: Box::new(function),
            }))),
            definite: false,
        }],
    })));

    MemberElement {
        raw,
        exported: false,
        name: uncurried,
        deps: Vec::new(),
    }
}

fn new_ident(sym: String) -> Ident {
    Ident {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        sym: sym.into(),
        optional: false,
    }
}
