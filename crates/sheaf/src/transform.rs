//! Optional module transforms run between elimination passes
//!
//! A transform is a pure rewrite of member bodies. The pipeline runs
//! dead code elimination once, then for each transform: apply it,
//! recompute dependencies, and eliminate again, so code a rewrite made
//! unreachable is cleaned up.

use crate::{module::Module, types::ModuleIdentifier, uncurry::Uncurry};

/// A pure rewrite of the module list.
///
/// Implementations may rewrite member bodies but must not alter module
/// identifiers or invent new modules.
pub trait ModuleTransform {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Rewrite the modules; element order must be preserved
    fn apply(&self, modules: Vec<Module>, entry_points: &[ModuleIdentifier]) -> Vec<Module>;
}

/// Transforms selected by the `optimize` option.
///
/// Unrecognised selectors select nothing rather than failing; the option
/// is advisory and the bundle is correct without any transform.
pub fn transforms_for(optimize: Option<&str>) -> Vec<Box<dyn ModuleTransform>> {
    match optimize {
        Some("uncurry" | "u" | "all" | "a") => vec![Box::new(Uncurry)],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimize_selectors() {
        for selector in ["uncurry", "u", "all", "a"] {
            let transforms = transforms_for(Some(selector));
            assert_eq!(transforms.len(), 1);
            assert_eq!(transforms[0].name(), "uncurry");
        }
        assert!(transforms_for(None).is_empty());
        assert!(transforms_for(Some("minify")).is_empty());
    }
}
