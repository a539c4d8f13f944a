//! sheaf bundles independently compiled CommonJS modules into a single
//! namespaced JavaScript program.
//!
//! Each input module is the output of a compiler for a functional
//! language, written in a restricted CommonJS convention: `require`
//! bindings, top-level `var` members, `exports.name` assignments, and
//! `module.exports = { ... }` lists. The pipeline parses every module,
//! classifies its statements into that model, computes a member-level
//! reference graph, eliminates code unreachable from the entry points,
//! optionally runs rewrite transforms (each followed by a fresh analysis
//! and elimination pass), drops empty modules, orders the rest by their
//! require edges, and emits one IIFE per module installing onto a shared
//! namespace object.
//!
//! The core does no file or network I/O and the output is
//! byte-reproducible for identical inputs.

pub mod classifier;
pub mod code_generator;
pub mod dependency_analyzer;
pub mod errors;
pub mod export_collector;
pub mod module;
pub mod module_graph;
pub mod parser;
pub mod transform;
pub mod tree_shaking;
pub mod types;
pub mod uncurry;

use log::debug;
use swc_common::{SourceMap, sync::Lrc};

pub use crate::{
    errors::BundleError,
    module::{
        ExportEntry, ExportType, ExportsListElement, MemberElement, Module, ModuleElement,
        RequireElement, RequireTarget,
    },
    transform::ModuleTransform,
    types::{Key, ModuleIdentifier, ModuleKind},
};
use crate::types::FxIndexSet;

/// Options controlling a [`bundle`] run
#[derive(Debug, Clone)]
pub struct BundleOptions {
    /// Modules whose members are all elimination roots; empty disables
    /// dead code elimination
    pub entry_points: Vec<ModuleIdentifier>,
    /// Module whose `main` export is invoked at the end of the bundle
    pub main_module: Option<String>,
    /// Identifier of the shared namespace object
    pub namespace: String,
    /// Prefix stripped from require paths before module lookup
    pub require_path: Option<String>,
    /// Optimization selector; `uncurry`, `u`, `all`, and `a` enable the
    /// uncurrying transform
    pub optimize: Option<String>,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            entry_points: Vec::new(),
            main_module: None,
            namespace: "PS".to_string(),
            require_path: None,
            optimize: None,
        }
    }
}

/// Bundle the given `(identifier, source)` pairs into one program.
///
/// Transforms are selected by `options.optimize`; everything else is
/// [`bundle_with`].
pub fn bundle(
    inputs: &[(ModuleIdentifier, String)],
    options: &BundleOptions,
) -> Result<String, BundleError> {
    bundle_with(
        inputs,
        options,
        &transform::transforms_for(options.optimize.as_deref()),
    )
}

/// Bundle with an explicit transform list.
///
/// Runs the full pipeline: parse, classify, analyse, eliminate, then for
/// each transform apply + re-analyse + re-eliminate, drop empty modules,
/// sort, and emit. The first error aborts the run.
pub fn bundle_with(
    inputs: &[(ModuleIdentifier, String)],
    options: &BundleOptions,
    transforms: &[Box<dyn ModuleTransform>],
) -> Result<String, BundleError> {
    let cm: Lrc<SourceMap> = Lrc::default();
    let known_modules: FxIndexSet<String> =
        inputs.iter().map(|(id, _)| id.name.clone()).collect();
    debug!(
        "bundling {} modules with {} entry points",
        inputs.len(),
        options.entry_points.len()
    );

    let mut modules = Vec::with_capacity(inputs.len());
    for (id, source) in inputs {
        let program = parser::parse_program(&cm, id, source)?;
        modules.push(classifier::classify_program(
            options.require_path.as_deref(),
            &known_modules,
            id.clone(),
            program,
        )?);
    }

    dependency_analyzer::analyze_modules(&mut modules);
    let mut modules = tree_shaking::shake(modules, &options.entry_points);

    for transform in transforms {
        debug!("applying {} transform", transform.name());
        modules = transform.apply(modules, &options.entry_points);
        dependency_analyzer::analyze_modules(&mut modules);
        modules = tree_shaking::shake(modules, &options.entry_points);
    }

    let modules = module_graph::sort_modules(modules);
    Ok(code_generator::generate(&cm, &modules, options))
}
