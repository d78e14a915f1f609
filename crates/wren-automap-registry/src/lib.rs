//! Descriptors for foreign classes and the modules that hold them.
//!
//! - [`MemberDescriptor`]: one member's signature, source line and trampoline
//! - [`ClassDescriptor`]: a whole foreign class, built by [`ClassBuilder`]
//! - [`ForeignModule`]: classes behind an importable module name
//!
//! Typed host callables are adapted through [`StaticFn`], [`MethodFn`],
//! [`MethodMutFn`] and [`ConstructorFn`].

mod builder;
mod class;
mod error;
mod host_fn;
mod member;
mod module;

pub use builder::{ClassBuilder, ForeignType};
pub use class::ClassDescriptor;
pub use error::{ModuleError, RegistrationError};
pub use host_fn::{ConstructorFn, MethodFn, MethodMutFn, StaticFn};
pub use member::MemberDescriptor;
pub use module::ForeignModule;

// Re-exported for generated code.
pub use wren_automap_core;
