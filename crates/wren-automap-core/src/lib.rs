//! Core types for binding host types to an embedded Wren VM.
//!
//! This crate holds everything a trampoline touches at call time and the
//! seam to the VM itself:
//!
//! - [`Slot`] / [`SlotKind`]: the dynamic values in the VM's API slots
//! - [`ForeignHeap`] / [`ForeignHandle`]: host storage for foreign instances
//! - [`CallContext`]: borrowed view of one foreign call
//! - [`NativeFn`]: type-erased unmarshal-invoke-marshal trampoline
//! - [`FromSlot`] / [`IntoSlot`]: the per-kind marshalling functions
//! - [`Declaration`] / [`Signature`]: member syntax and binding keys
//! - [`ForeignVm`] / [`VmConfig`]: the VM's extension points

mod call_context;
mod convert;
mod error;
mod heap;
mod native_fn;
mod signature;
mod slot;
mod vm;

pub use call_context::CallContext;
pub use convert::{Foreign, FromSlot, HostReturn, IntoSlot};
pub use error::{ConversionError, DeclarationError, NativeError};
pub use heap::{ForeignHandle, ForeignHeap};
pub use native_fn::{FinalizeFn, ForeignClassMethods, NativeCallable, NativeFn};
pub use signature::{
    DeclForm, Declaration, INFIX_OPERATORS, MemberKind, PREFIX_OPERATORS, Signature,
};
pub use slot::{Slot, SlotKind};
pub use vm::{
    BindForeignClassFn, BindForeignMethodFn, ForeignVm, InterpretResult, LoadModuleFn,
    MAIN_MODULE, VmConfig, VmId,
};
