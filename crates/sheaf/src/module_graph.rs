//! Module-level dependency graph and emission ordering
//!
//! After dead code elimination the surviving modules are ordered so that
//! every module's resolved require targets are emitted before it. Empty
//! modules are dropped first. The input language guarantees the module
//! graph is acyclic.

use log::debug;
use petgraph::{algo::toposort, graph::DiGraph};
use rustc_hash::FxHashMap;

use crate::module::{Module, ModuleElement, RequireTarget};

/// Drop empty modules and order the rest dependencies-first.
pub fn sort_modules(modules: Vec<Module>) -> Vec<Module> {
    let modules: Vec<Module> = modules
        .into_iter()
        .filter(|module| {
            let empty = module.is_empty();
            if empty {
                debug!("dropping empty module {}", module.id);
            }
            !empty
        })
        .collect();

    let mut graph = DiGraph::<usize, ()>::new();
    let mut nodes = FxHashMap::default();
    for (index, module) in modules.iter().enumerate() {
        nodes.insert(module.id.clone(), graph.add_node(index));
    }
    for module in &modules {
        let from = nodes[&module.id];
        for element in &module.elements {
            // Targets outside the surviving list get no edge; a foreign
            // twin's self-require would otherwise be a one-node cycle.
            if let ModuleElement::Require(require) = element
                && let RequireTarget::Resolved(target) = &require.target
                && let Some(&to) = nodes.get(target)
                && to != from
            {
                graph.add_edge(from, to, ());
            }
        }
    }

    let order = match toposort(&graph, None) {
        Ok(order) => order,
        Err(_) => {
            // The module graph is a DAG by construction of the input
            // language; keep input order if that contract is broken.
            debug!("module graph has a cycle, keeping input order");
            return modules;
        }
    };

    let mut slots: Vec<Option<Module>> = modules.into_iter().map(Some).collect();
    order
        .into_iter()
        .rev()
        .filter_map(|node| slots[graph[node]].take())
        .collect()
}

#[cfg(test)]
mod tests {
    use swc_common::{SourceMap, sync::Lrc};

    use super::*;
    use crate::{
        classifier, dependency_analyzer, parser,
        types::{FxIndexSet, ModuleIdentifier},
    };

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

    fn position(modules: &[Module], name: &str) -> usize {
        modules
            .iter()
            .position(|module| module.id.name == name)
            .expect("module is present")
    }

    #[test]
    fn test_dependencies_precede_dependents() {
        let modules = build_modules(&[
            ("A", "var B = require(\"../B\");\nexports.a = B.b;\n"),
            ("B", "var C = require(\"../C\");\nexports.b = C.c;\n"),
            ("C", "var c = 1;\nexports.c = c;\n"),
        ]);

        let sorted = sort_modules(modules);

        assert_eq!(sorted.len(), 3);
        assert!(position(&sorted, "C") < position(&sorted, "B"));
        assert!(position(&sorted, "B") < position(&sorted, "A"));
    }

    #[test]
    fn test_empty_modules_are_dropped() {
        let modules = build_modules(&[
            ("A", "var util = require(\"util\");\nconsole.log(util);\n"),
            ("B", "module.exports = {};\n"),
            ("C", "var c = 1;\n"),
        ]);

        let sorted = sort_modules(modules);

        // A is requires and opaque statements only, B's export list is
        // empty, C still declares a member.
        assert_eq!(sorted.len(), 1);
        assert_eq!(sorted[0].id.name, "C");
    }

    #[test]
    fn test_foreign_self_require_is_harmless() {
        let cm: Lrc<SourceMap> = Lrc::default();
        let known: FxIndexSet<String> = FxIndexSet::default();
        let id = ModuleIdentifier::foreign("A");
        let program = parser::parse_program(
            &cm,
            &id,
            "var $foreign = require(\"./foreign\");\nexports.f = 1;\n",
        )
        .expect("source parses");
        let module =
            classifier::classify_program(None, &known, id, program).expect("classifies");

        let sorted = sort_modules(vec![module]);
        assert_eq!(sorted.len(), 1);
    }

    #[test]
    fn test_requires_of_dropped_modules_are_skipped() {
        let modules = build_modules(&[
            ("A", "var B = require(\"../B\");\nvar a = 1;\nexports.a = a;\n"),
            ("B", "var noise = require(\"util\");\n"),
        ]);

        let sorted = sort_modules(modules);
        assert_eq!(sorted.len(), 1);
        assert_eq!(sorted[0].id.name, "A");
    }
}
