//! Errors raised while describing classes and filling modules.

use thiserror::Error;
use wren_automap_core::DeclarationError;

/// Errors that can occur while building a [`ClassDescriptor`].
///
/// All of them are fatal to the mapping attempt: the type cannot be mapped
/// until its description is fixed.
///
/// [`ClassDescriptor`]: crate::ClassDescriptor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The member declaration could not be parsed.
    #[error("invalid declaration '{decl}': {source}")]
    InvalidDeclaration {
        decl: String,
        #[source]
        source: DeclarationError,
    },

    /// The declaration lists a different number of parameters than the
    /// bound callable takes.
    #[error("'{decl}' declares {expected} parameters but the callable takes {actual}")]
    ArityMismatch {
        decl: String,
        expected: usize,
        actual: usize,
    },

    /// Two members of one class reduce to the same signature.
    #[error("class '{class}': '{signature}' is already bound")]
    AmbiguousMember { class: String, signature: String },

    /// Operators dispatch on an instance and cannot be static.
    #[error("operator '{decl}' cannot be static")]
    StaticOperator { decl: String },

    /// `operator` was called with something that is not an operator.
    #[error("'{decl}' is not an operator or subscript")]
    NotAnOperator { decl: String },

    /// Constructors must be declared with a plain name.
    #[error("'{decl}' is not a valid constructor declaration")]
    InvalidConstructor { decl: String },
}

impl RegistrationError {
    pub(crate) fn invalid(decl: &str, source: DeclarationError) -> Self {
        RegistrationError::InvalidDeclaration {
            decl: decl.to_string(),
            source,
        }
    }
}

/// Errors raised when adding classes to a module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    /// The module's source has already been delivered to the VM.
    #[error("module '{module}' was modified after it was loaded")]
    Frozen { module: String },

    /// A class of this name already exists in the module.
    #[error("module '{module}' already contains a class named '{class}'")]
    DuplicateClass { module: String, class: String },
}
