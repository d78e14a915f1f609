//! Top-level error type.

use thiserror::Error;
use wren_automap_core::InterpretResult;
use wren_automap_registry::{ModuleError, RegistrationError};

/// Errors returned by [`AutoMapper`](crate::AutoMapper) mapping calls.
#[derive(Debug, Error)]
pub enum AutoMapError {
    /// A type's description is invalid.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// The target module rejected the classes.
    #[error(transparent)]
    Module(#[from] ModuleError),

    /// The VM failed to compile or run a main-module class.
    #[error("interpreting class '{class}' in the main module failed: {result:?}")]
    InterpretFailed {
        class: String,
        result: InterpretResult,
    },
}

impl AutoMapError {
    /// Whether the error is a write to an already loaded module.
    pub fn is_frozen_module(&self) -> bool {
        matches!(self, AutoMapError::Module(ModuleError::Frozen { .. }))
    }
}

/// Result type for mapping calls.
pub type AutoMapResult<T> = Result<T, AutoMapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_errors_pass_through() {
        let err: AutoMapError = ModuleError::Frozen {
            module: "util".into(),
        }
        .into();
        assert!(err.is_frozen_module());
        assert_eq!(err.to_string(), "module 'util' was modified after it was loaded");
    }

    #[test]
    fn interpret_failure_message() {
        let err = AutoMapError::InterpretFailed {
            class: "Point".into(),
            result: InterpretResult::CompileError,
        };
        assert!(!err.is_frozen_module());
        assert_eq!(
            err.to_string(),
            "interpreting class 'Point' in the main module failed: CompileError"
        );
    }
}
