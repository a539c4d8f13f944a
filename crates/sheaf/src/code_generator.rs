//! Final bundle emission
//!
//! Renders the namespace prelude, one IIFE per module installing onto the
//! shared namespace object, and the optional main call. Retained raw
//! statements are printed verbatim through the swc code generator; the
//! two-space indentation inside each wrapper is cosmetic only. Output is
//! byte-reproducible for identical inputs.

use log::debug;
use swc_common::{SourceMap, sync::Lrc};
use swc_ecma_ast::{Expr, Stmt};
use swc_ecma_codegen::{Config, Emitter, Node, text_writer::JsWriter};

use crate::{
    BundleOptions,
    module::{Module, ModuleElement, RequireTarget},
};

/// Render the final bundle for an ordered module list.
pub fn generate(cm: &Lrc<SourceMap>, modules: &[Module], options: &BundleOptions) -> String {
    let ns = options.namespace.as_str();
    let mut out = String::new();
    out.push_str(&format!(
        "// Generated by {} {}\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    ));
    out.push_str(&format!("var {ns} = {{}};\n"));

    for module in modules {
        debug!("emitting module {}", module.id);
        let slot = format!("{ns}[{}]", js_string(&module.id.name));
        out.push_str("(function(exports) {\n");
        for element in &module.elements {
            for line in element_code(cm, ns, element).lines() {
                if line.is_empty() {
                    out.push('\n');
                } else {
                    out.push_str("  ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        out.push_str(&format!("}})({slot} = {slot} || {{}});\n"));
    }

    if let Some(main) = &options.main_module {
        out.push_str(&format!("{ns}[{}].main();\n", js_string(main)));
    }
    out
}

fn element_code(cm: &Lrc<SourceMap>, ns: &str, element: &ModuleElement) -> String {
    match element {
        ModuleElement::Member(member) => print_stmt(cm, &member.raw),
        ModuleElement::Other(stmt) => print_stmt(cm, stmt),
        ModuleElement::Require(require) => match &require.target {
            RequireTarget::Resolved(target) => {
                format!("var {} = {}[{}];", require.local, ns, js_string(&target.name))
            }
            RequireTarget::Unresolved(_) => print_stmt(cm, &require.raw),
        },
        ModuleElement::ExportsList(list) => {
            let mut code = String::new();
            for entry in &list.entries {
                code.push_str(&format!(
                    "exports[{}] = {};\n",
                    js_string(&entry.name),
                    print_expr(cm, &entry.value)
                ));
            }
            code
        }
    }
}

/// Print a retained statement exactly as the parser saw it.
pub(crate) fn print_stmt(cm: &Lrc<SourceMap>, stmt: &Stmt) -> String {
    print_node(cm, stmt)
}

fn print_expr(cm: &Lrc<SourceMap>, expr: &Expr) -> String {
    print_node(cm, expr)
}

fn print_node<N: Node>(cm: &Lrc<SourceMap>, node: &N) -> String {
    let mut buf = Vec::new();
    {
        let mut emitter = Emitter {
            cfg: Config::default(),
            cm: cm.clone(),
            comments: None,
            wr: JsWriter::new(cm.clone(), "\n", &mut buf, None),
        };
        node.emit_with(&mut emitter)
            .expect("emitting into an in-memory buffer cannot fail");
    }
    String::from_utf8(buf).expect("the code generator emits UTF-8")
}

/// Quote a name for use as a string literal in the output.
fn js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classifier, dependency_analyzer, parser,
        types::{FxIndexSet, ModuleIdentifier},
    };

    fn build(sources: &[(&str, &str)]) -> (Vec<Module>, Lrc<SourceMap>) {
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
        (modules, cm)
    }

    #[test]
    fn test_resolved_requires_become_namespace_lookups() {
        let (modules, cm) = build(&[(
            "Main",
            "var Data_Maybe = require(\"../Data.Maybe\");\nexports.m = Data_Maybe;\n",
        ), ("Data.Maybe", "var x = 1;\nexports.x = x;\n")]);

        let bundle = generate(&cm, &modules, &BundleOptions::default());
        assert!(bundle.contains("var Data_Maybe = PS[\"Data.Maybe\"];"));
    }

    #[test]
    fn test_unresolved_requires_are_verbatim() {
        let (modules, cm) = build(&[(
            "Main",
            "var util = require(\"util\");\nexports.u = util;\n",
        )]);

        let bundle = generate(&cm, &modules, &BundleOptions::default());
        assert!(bundle.contains("var util = require(\"util\");"));
    }

    #[test]
    fn test_exports_list_entries_use_bracket_form() {
        let (modules, cm) = build(&[(
            "Main",
            "var a = 1;\nmodule.exports = { renamed: a, \"with space\": a };\n",
        )]);

        let bundle = generate(&cm, &modules, &BundleOptions::default());
        assert!(bundle.contains("exports[\"renamed\"] = a;"));
        assert!(bundle.contains("exports[\"with space\"] = a;"));
    }

    #[test]
    fn test_wrapper_and_main_call_shape() {
        let (modules, cm) = build(&[("Main", "var a = 1;\nexports.main = a;\n")]);

        let options = BundleOptions {
            main_module: Some("Main".to_string()),
            namespace: "NS".to_string(),
            ..Default::default()
        };
        let bundle = generate(&cm, &modules, &options);

        assert!(bundle.starts_with("// Generated by sheaf"));
        assert!(bundle.contains("var NS = {};"));
        assert!(bundle.contains("(function(exports) {"));
        assert!(bundle.contains("})(NS[\"Main\"] = NS[\"Main\"] || {});"));
        assert!(bundle.ends_with("NS[\"Main\"].main();\n"));
    }

    #[test]
    fn test_body_is_indented_two_spaces() {
        let (modules, cm) = build(&[("Main", "var a = 1;\nexports.a = a;\n")]);

        let bundle = generate(&cm, &modules, &BundleOptions::default());
        assert!(bundle.contains("\n  var a = 1;\n"));
        assert!(bundle.contains("\n  exports.a = a;\n"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let sources = [
            ("A", "var a = 1;\nexports.a = a;\n"),
            ("B", "var A = require(\"../A\");\nexports.b = A.a;\n"),
        ];
        let (modules, cm) = build(&sources);
        let first = generate(&cm, &modules, &BundleOptions::default());

        let (modules, cm) = build(&sources);
        let second = generate(&cm, &modules, &BundleOptions::default());

        assert_eq!(first, second);
    }
}
