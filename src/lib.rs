//! Automatic foreign class bindings for an embedded Wren VM.
//!
//! Host types are described once, either with a [`ClassBuilder`] or with
//! `#[derive(ForeignType)]`. An [`AutoMapper`] then generates the matching
//! `foreign class` source and answers the VM's binding hooks with the
//! trampolines behind each signature.
//!
//! ```ignore
//! use wren_automap::{AutoMapper, ClassBuilder, Foreign};
//!
//! let point = ClassBuilder::<Point>::new("Point")
//!     .constructor("new(x, y)", |x: f64, y: f64| Point { x, y })?
//!     .getter("x", |p: &Point| p.x)?
//!     .method("plus(other)", |p: &Point, o: Foreign<Point>| Foreign(p.plus(&o.0)))?
//!     .build();
//!
//! let mapper = AutoMapper::new();
//! mapper.map(&mut vm, "geometry", [point])?;
//! // `import "geometry" for Point` now delivers the generated class.
//! ```
//!
//! Classes mapped into [`MAIN_MODULE`] are interpreted immediately. Classes
//! in any other module wait until the VM imports that module, after which
//! the module is frozen (see [`AutoMapperConfig::with_strict_modules`]).

mod config;
mod error;
mod resolution;
mod session;

pub use config::AutoMapperConfig;
pub use error::{AutoMapError, AutoMapResult};
pub use session::AutoMapper;

pub use wren_automap_core::{
    BindForeignClassFn, BindForeignMethodFn, CallContext, ConversionError, DeclForm,
    Declaration, DeclarationError, FinalizeFn, Foreign, ForeignClassMethods, ForeignHandle,
    ForeignHeap, ForeignVm, FromSlot, HostReturn, IntoSlot, InterpretResult, LoadModuleFn,
    MAIN_MODULE, MemberKind, NativeCallable, NativeError, NativeFn, Signature, Slot, SlotKind,
    VmConfig, VmId,
};
pub use wren_automap_macros::ForeignType;
pub use wren_automap_registry::{
    ClassBuilder, ClassDescriptor, ConstructorFn, ForeignModule, ForeignType, MemberDescriptor,
    MethodFn, MethodMutFn, ModuleError, RegistrationError, StaticFn,
};
