//! Parser adapter over the swc ECMAScript parser
//!
//! The bundler core never reads files; callers hand it pre-read source
//! strings and this adapter turns them into ASTs. Parse diagnostics are
//! not recovered: the first one aborts the run, wrapped with the identity
//! of the module that failed.

use swc_common::{FileName, SourceMap, sync::Lrc};
use swc_ecma_ast::{EsVersion, Program};
use swc_ecma_parser::{Parser, StringInput, Syntax, lexer::Lexer};

use crate::{errors::BundleError, types::ModuleIdentifier};

/// Parse one module source into a swc [`Program`].
///
/// The source is registered with the shared [`SourceMap`] under the
/// module's display name so downstream printing can resolve its spans.
pub fn parse_program(
    cm: &Lrc<SourceMap>,
    id: &ModuleIdentifier,
    source: &str,
) -> Result<Program, BundleError> {
    let fm = cm.new_source_file(FileName::Custom(id.to_string()).into(), source.to_string());
    let lexer = Lexer::new(
        Syntax::Es(Default::default()),
        EsVersion::Es2022,
        StringInput::from(&*fm),
        None,
    );
    let mut parser = Parser::new_from(lexer);

    let program = parser
        .parse_program()
        .map_err(|err| parse_error(id, err.kind().msg().as_ref()))?;

    // Recovered diagnostics are still fatal for this restricted subset.
    if let Some(err) = parser.take_errors().into_iter().next() {
        return Err(parse_error(id, err.kind().msg().as_ref()));
    }

    Ok(program)
}

fn parse_error(id: &ModuleIdentifier, message: &str) -> BundleError {
    BundleError::UnableToParseModule(message.to_string()).in_module(id)
}
