//! Error taxonomy for the bundling pipeline
//!
//! The taxonomy is deliberately coarse: parser diagnostics propagate as
//! opaque strings, and the first error aborts the pipeline. There is no
//! recovery and no warning channel.

use thiserror::Error;

use crate::types::ModuleIdentifier;

/// Every way a bundle run can fail
#[derive(Debug, Error)]
pub enum BundleError {
    /// A `require` path that neither names the foreign twin nor a known
    /// module, under strict resolution. The classifier itself falls back
    /// to leaving the call in the output instead.
    #[error("unsupported module path: {0:?}")]
    UnsupportedModulePath(String),

    /// The AST root is not a plain list of statements
    #[error("expected a top-level list of statements")]
    InvalidTopLevel,

    /// The parser rejected the module source
    #[error("unable to parse module: {0}")]
    UnableToParseModule(String),

    /// An exports shape was recognised but its value is neither an
    /// identifier nor a `$foreign` accessor
    #[error("unsupported export shape")]
    UnsupportedExport,

    /// An error raised while processing a specific module, wrapped once
    /// with that module's identity
    #[error("error in module {0}: {1}")]
    ErrorInModule(ModuleIdentifier, Box<BundleError>),
}

impl BundleError {
    /// Attach the identity of the module the error occurred in.
    ///
    /// Already-wrapped errors pass through unchanged, so the identity is
    /// attached exactly once however deep the failure happened.
    pub(crate) fn in_module(self, id: &ModuleIdentifier) -> BundleError {
        match self {
            BundleError::ErrorInModule(..) => self,
            other => BundleError::ErrorInModule(id.clone(), Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapping_is_idempotent() {
        let id = ModuleIdentifier::regular("Data.Maybe");
        let other = ModuleIdentifier::regular("Main");

        let wrapped = BundleError::UnsupportedExport.in_module(&id);
        let rewrapped = wrapped.in_module(&other);

        match rewrapped {
            BundleError::ErrorInModule(module, inner) => {
                assert_eq!(module, id);
                assert!(matches!(*inner, BundleError::UnsupportedExport));
            }
            err => panic!("expected ErrorInModule, got {err}"),
        }
    }

    #[test]
    fn test_display_includes_module_identity() {
        let err = BundleError::UnsupportedExport.in_module(&ModuleIdentifier::foreign("Main"));
        assert_eq!(
            err.to_string(),
            "error in module Main (foreign): unsupported export shape"
        );
    }
}
