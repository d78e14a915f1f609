//! Error types for slot conversion, trampolines and declarations.

use thiserror::Error;

/// Errors that can occur when converting between Rust and slot values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The slot holds a different kind of value than the Rust type needs.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// A number slot holds a value with a fractional part.
    #[error("number {value} is not an integer (target {target_type})")]
    NotAnInteger { value: f64, target_type: &'static str },

    /// Integer overflow during conversion
    #[error("integer overflow: value {value} does not fit in {target_type}")]
    IntegerOverflow { value: f64, target_type: &'static str },

    /// Foreign handle refers to an instance that has been freed
    #[error("stale foreign handle: object at index {index} has been freed")]
    StaleHandle { index: u32 },

    /// Foreign handle refers to an instance of another host type
    #[error("foreign object is not a {expected}")]
    ForeignTypeMismatch { expected: &'static str },
}

/// Errors raised while a trampoline runs.
///
/// The engine surfaces every variant as a script-level runtime error at the
/// call site; none of them escape into the host.
#[derive(Debug, Error)]
pub enum NativeError {
    /// A script argument's dynamic kind does not match the host parameter.
    #[error("argument {index} has kind {actual}, expected {expected}")]
    ArgumentKindMismatch {
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },

    /// Argument index out of bounds
    #[error("argument index {index} out of bounds (call has {count} arguments)")]
    ArgumentIndexOutOfBounds { index: usize, count: usize },

    /// Argument had the right kind but could not be converted
    #[error("argument {index}: {source}")]
    Conversion {
        index: usize,
        #[source]
        source: ConversionError,
    },

    /// Invalid receiver in slot 0
    #[error("invalid receiver: {message}")]
    InvalidThis { message: String },

    /// The host callable returned an error
    #[error("host call failed: {message}")]
    HostInvocation { message: String },

    /// The host callable panicked
    #[error("host call panicked: {message}")]
    Panic { message: String },

    /// The allocator found no constructor taking this many arguments
    #[error("{class} has no constructor taking {arity} arguments")]
    NoConstructor { class: String, arity: usize },

    /// Generic native error
    #[error("native error: {message}")]
    Other { message: String },
}

impl NativeError {
    /// Create an "invalid this" error with a message.
    pub fn invalid_this(message: impl Into<String>) -> Self {
        NativeError::InvalidThis {
            message: message.into(),
        }
    }

    /// Create a host invocation failure.
    pub fn host(message: impl Into<String>) -> Self {
        NativeError::HostInvocation {
            message: message.into(),
        }
    }

    /// Create a generic native error.
    pub fn other(message: impl Into<String>) -> Self {
        NativeError::Other {
            message: message.into(),
        }
    }

    /// Attach an argument index to a conversion failure.
    ///
    /// Kind mismatches become [`NativeError::ArgumentKindMismatch`]; everything
    /// else is wrapped as [`NativeError::Conversion`].
    pub fn for_argument(index: usize, err: ConversionError) -> Self {
        match err {
            ConversionError::TypeMismatch { expected, actual } => {
                NativeError::ArgumentKindMismatch {
                    index,
                    expected,
                    actual,
                }
            }
            source => NativeError::Conversion { index, source },
        }
    }

    /// Whether this error came from the host callable rather than marshalling.
    pub fn is_host_failure(&self) -> bool {
        matches!(
            self,
            NativeError::HostInvocation { .. } | NativeError::Panic { .. }
        )
    }
}

/// Errors produced while parsing a member declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error("empty declaration")]
    Empty,

    #[error("invalid member name '{name}'")]
    InvalidName { name: String },

    #[error("invalid parameter name '{name}' in '{decl}'")]
    InvalidParameter { decl: String, name: String },

    #[error("unbalanced brackets in '{decl}'")]
    Unbalanced { decl: String },

    #[error("unexpected trailing input '{rest}' in '{decl}'")]
    TrailingInput { decl: String, rest: String },

    #[error("setter '{decl}' must take exactly one value")]
    SetterArity { decl: String },

    #[error("operator '{decl}' has the wrong number of operands")]
    OperatorArity { decl: String },
}
