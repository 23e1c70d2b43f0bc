//! Errors reported while registering, resolving and invoking dependencies.
//!
//! Every message carries the owning injector's name as a `(di: <name>)`
//! suffix; failures tied to a concrete function additionally render the
//! function's origin path and textual signature, when known, as trailing
//! indented lines.

use crate::loader::LoadError;
use thiserror::Error;

/// Diagnostic context of the function involved in a failure.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FnContext {
    /// Path the function was loaded from, when it came from a module.
    pub origin: Option<String>,
    /// Textual parameter-list form, e.g. `fn(server, port)`.
    pub signature: Option<String>,
}

impl FnContext {
    fn render(&self) -> String {
        let mut out = String::new();
        if let Some(origin) = &self.origin {
            out.push_str("\n  at ");
            out.push_str(origin);
        }
        if let Some(signature) = &self.signature {
            out.push_str("\n  ");
            out.push_str(signature);
        }
        out
    }
}

/// Errors related to registering, resolving and invoking dependencies.
#[derive(Error, Debug)]
pub enum DiError {
    /// The module-load collaborator failed; the underlying failure is kept
    /// as the error source so the root cause stays visible in the chain.
    #[error("could not load module '{path}' (di: {injector})")]
    CouldNotLoad {
        injector: String,
        path: String,
        #[source]
        source: LoadError,
    },

    /// A loaded module was used where a callable was required.
    #[error("'{target}' is not a function (di: {injector}){}", .context.render())]
    NotAFunction {
        injector: String,
        target: String,
        context: FnContext,
    },

    /// One or more required names could not be resolved. `missing` keeps
    /// the offending parameter names in declaration order.
    #[error("dependency not found: {} (di: {injector}){}", .missing.join(", "), .context.render())]
    DependencyNotFound {
        injector: String,
        missing: Vec<String>,
        context: FnContext,
    },

    /// A factory (transitively) required the name it is registered under.
    #[error("circular dependency detected for '{name}' (di: {injector})")]
    DependencyCycle { injector: String, name: String },
}
