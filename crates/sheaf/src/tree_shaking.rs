//! Reachability-based dead code elimination over the member graph
//!
//! Vertices are `(module, member)` keys; edges are the `deps` lists the
//! analyzer computed. Every member of an entry-point module is a root, as
//! is every renaming or foreign reexport of one. Members and export
//! entries that no root reaches are dropped; requires and unrecognised
//! statements always survive because they may carry trivial side effects.

use std::collections::VecDeque;

use log::{debug, trace};

use crate::{
    module::{ExportType, Module, ModuleElement},
    types::{FxIndexMap, FxIndexSet, Key, ModuleIdentifier},
};

/// Tree shaker that removes members unreachable from the entry points
#[derive(Debug)]
pub struct TreeShaker {
    /// Outgoing edges per vertex, in module and source order
    vertices: FxIndexMap<Key, Vec<Key>>,
    /// Vertices reachable from the entry roots
    used: FxIndexSet<Key>,
}

impl TreeShaker {
    /// Build the member graph for a module list.
    ///
    /// `var a = ...` and `exports.a = a` share one vertex: their deps are
    /// merged, and filtering later keeps or drops them together.
    pub fn from_modules(modules: &[Module]) -> Self {
        let mut vertices: FxIndexMap<Key, Vec<Key>> = FxIndexMap::default();
        for module in modules {
            for element in &module.elements {
                match element {
                    ModuleElement::Member(member) => {
                        add_vertex(
                            &mut vertices,
                            Key::new(module.id.clone(), member.name.clone()),
                            &member.deps,
                        );
                    }
                    ModuleElement::ExportsList(list) => {
                        for entry in &list.entries {
                            let own_vertex = match &entry.export_type {
                                ExportType::ForeignReexport => true,
                                // A renaming reexport is reachable under its
                                // exported name, not the source member's.
                                ExportType::Regular { source } => source != &entry.name,
                            };
                            if own_vertex {
                                add_vertex(
                                    &mut vertices,
                                    Key::new(module.id.clone(), entry.name.clone()),
                                    &entry.deps,
                                );
                            }
                        }
                    }
                    ModuleElement::Require(_) | ModuleElement::Other(_) => {}
                }
            }
        }
        Self {
            vertices,
            used: FxIndexSet::default(),
        }
    }

    /// Mark every vertex reachable from the entry-point modules.
    pub fn analyze(&mut self, entry_points: &[ModuleIdentifier]) {
        let mut worklist: VecDeque<Key> = self
            .vertices
            .keys()
            .filter(|key| entry_points.contains(&key.module))
            .cloned()
            .collect();
        debug!("tree shaking from {} entry roots", worklist.len());

        while let Some(key) = worklist.pop_front() {
            if !self.used.insert(key.clone()) {
                continue;
            }
            trace!("keeping {key}");
            if let Some(deps) = self.vertices.get(&key) {
                for dep in deps {
                    // Edges to keys with no vertex are skipped; the target
                    // lives in a module that is not part of this bundle.
                    if self.vertices.contains_key(dep) && !self.used.contains(dep) {
                        worklist.push_back(dep.clone());
                    }
                }
            }
        }

        debug!(
            "tree shaking kept {} of {} vertices",
            self.used.len(),
            self.vertices.len()
        );
    }

    /// Check if a member survived the reachability pass
    pub fn is_used(&self, key: &Key) -> bool {
        self.used.contains(key)
    }

    /// Produce the filtered module list.
    ///
    /// A plain same-named export entry has no vertex of its own; it is
    /// tested through the member it aliases, so it survives exactly when
    /// that member does.
    pub fn filter_modules(&self, modules: Vec<Module>) -> Vec<Module> {
        modules
            .into_iter()
            .map(|module| {
                let id = module.id;
                let elements = module
                    .elements
                    .into_iter()
                    .filter_map(|element| match element {
                        ModuleElement::Member(member) => {
                            let key = Key::new(id.clone(), member.name.clone());
                            if self.is_used(&key) {
                                Some(ModuleElement::Member(member))
                            } else {
                                trace!("dropping member {key}");
                                None
                            }
                        }
                        ModuleElement::ExportsList(mut list) => {
                            list.entries.retain(|entry| {
                                self.is_used(&Key::new(id.clone(), entry.name.clone()))
                            });
                            Some(ModuleElement::ExportsList(list))
                        }
                        keep @ (ModuleElement::Require(_) | ModuleElement::Other(_)) => Some(keep),
                    })
                    .collect();
                Module::new(id, elements)
            })
            .collect()
    }
}

fn add_vertex(vertices: &mut FxIndexMap<Key, Vec<Key>>, key: Key, deps: &[Key]) {
    let edges = vertices.entry(key).or_default();
    for dep in deps {
        if !edges.contains(dep) {
            edges.push(dep.clone());
        }
    }
}

/// Run dead code elimination from the entry points.
///
/// An empty entry-point set disables elimination entirely and the module
/// list passes through unchanged.
pub fn shake(modules: Vec<Module>, entry_points: &[ModuleIdentifier]) -> Vec<Module> {
    if entry_points.is_empty() {
        debug!("no entry points, skipping dead code elimination");
        return modules;
    }
    let mut shaker = TreeShaker::from_modules(&modules);
    shaker.analyze(entry_points);
    shaker.filter_modules(modules)
}

#[cfg(test)]
mod tests {
    use swc_common::{SourceMap, sync::Lrc};

    use super::*;
    use crate::{classifier, dependency_analyzer, parser};

    fn build_modules(sources: &[(&str, &str)]) -> Vec<Module> {
        let cm: Lrc<SourceMap> = Lrc::default();
        let known: FxIndexSet<String> = sources.iter().map(|(name, _)| name.to_string()).collect();
        let mut modules = Vec::new();
        for (name, source) in sources {
            let id = ModuleIdentifier::regular(*name);
            let program = parser::parse_program(&cm, &id, source).expect("source parses");
            modules
                .push(classifier::classify_program(None, &known, id, program).expect("classifies"));
        }
        dependency_analyzer::analyze_modules(&mut modules);
        modules
    }

    fn member_names(module: &Module) -> Vec<&str> {
        module.members().map(|member| member.name.as_str()).collect()
    }

    #[test]
    fn test_unreachable_members_are_dropped() {
        let modules = build_modules(&[
            (
                "A",
                "var a = 1;\nvar b = 2;\nexports.a = a;\nexports.b = b;\n",
            ),
            ("B", "var A = require(\"../A\");\nexports.c = A.a;\n"),
        ]);

        let shaken = shake(modules, &[ModuleIdentifier::regular("B")]);

        assert_eq!(member_names(&shaken[0]), ["a", "a"]);
        assert_eq!(member_names(&shaken[1]), ["c"]);
    }

    #[test]
    fn test_renaming_reexport_has_its_own_vertex() {
        let modules = build_modules(&[
            ("A", "var x = 1;\nvar y = 2;\nmodule.exports = { renamed: x };\n"),
            ("B", "var A = require(\"../A\");\nexports.r = A.renamed;\n"),
        ]);

        let shaken = shake(modules, &[ModuleIdentifier::regular("B")]);

        // The renamed entry pulls in `x`; `y` has no path from the roots.
        assert_eq!(member_names(&shaken[0]), ["x"]);
        let ModuleElement::ExportsList(list) = &shaken[0].elements[2] else {
            panic!("expected an exports list");
        };
        assert_eq!(list.entries.len(), 1);
        assert_eq!(list.entries[0].name, "renamed");
    }

    #[test]
    fn test_same_named_entry_follows_its_member() {
        let modules = build_modules(&[
            ("A", "var a = 1;\nvar b = 2;\nmodule.exports = { a: a, b: b };\n"),
            ("B", "var A = require(\"../A\");\nexports.r = A.a;\n"),
        ]);

        let shaken = shake(modules, &[ModuleIdentifier::regular("B")]);

        assert_eq!(member_names(&shaken[0]), ["a"]);
        let ModuleElement::ExportsList(list) = &shaken[0].elements[2] else {
            panic!("expected an exports list");
        };
        assert_eq!(list.entries.len(), 1);
        assert_eq!(list.entries[0].name, "a");
    }

    #[test]
    fn test_edges_to_absent_modules_are_skipped() {
        let modules = build_modules(&[(
            "A",
            "var Missing = require(\"../Missing\");\nexports.a = Missing.x;\n",
        )]);

        // "Missing" is not a known module, so the require is unresolved and
        // the member expression draws no edge; nothing panics.
        let shaken = shake(modules, &[ModuleIdentifier::regular("A")]);
        assert_eq!(member_names(&shaken[0]), ["a"]);
    }

    #[test]
    fn test_requires_and_opaque_statements_survive() {
        let modules = build_modules(&[
            (
                "A",
                "var util = require(\"util\");\nconsole.log(\"boot\");\nvar a = 1;\nexports.a = a;\n",
            ),
            ("B", "var A = require(\"../A\");\nexports.c = A.a;\n"),
        ]);

        let shaken = shake(modules, &[ModuleIdentifier::regular("B")]);

        assert!(matches!(shaken[0].elements[0], ModuleElement::Require(_)));
        assert!(matches!(shaken[0].elements[1], ModuleElement::Other(_)));
    }

    #[test]
    fn test_entry_modules_keep_everything_reachable_from_their_roots() {
        let modules = build_modules(&[("A", "var x = 1;\nexports.y = x;\n")]);

        let shaken = shake(modules, &[ModuleIdentifier::regular("A")]);

        // `exports.y = x` is a root and pulls `x` with it.
        assert_eq!(member_names(&shaken[0]), ["x", "y"]);
    }
}
