//! The module-load collaborator.
//!
//! Loading code or data from a path is outside the container's concern; it
//! only needs something which, given a path specifier, answers with either
//! a plain value or a callable. Load failures surface to callers as
//! [CouldNotLoad](crate::DiError::CouldNotLoad), tagged with the
//! originating path and chained to the underlying cause.

use crate::function::{InjectFn, Value};
use derivative::Derivative;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

/// Result of loading a module by path.
#[derive(Derivative)]
#[derivative(Debug)]
pub enum Loaded {
    /// A plain value payload.
    Value(#[derivative(Debug = "ignore")] Value),
    /// A callable; registrable as a factory or invocable directly.
    Function(InjectFn),
}

/// Failure of the underlying load mechanism, tagged with the originating
/// path.
#[derive(Error, Debug)]
#[error("cannot load '{path}'")]
pub struct LoadError {
    path: String,
    #[source]
    cause: Box<dyn std::error::Error + 'static>,
}

impl LoadError {
    pub fn new(path: impl Into<String>, cause: impl Into<Box<dyn std::error::Error + 'static>>) -> Self {
        Self {
            path: path.into(),
            cause: cause.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Loads modules by path specifier.
#[cfg_attr(test, automock)]
pub trait ModuleLoader {
    fn load(&self, path: &str) -> Result<Loaded, LoadError>;
}
