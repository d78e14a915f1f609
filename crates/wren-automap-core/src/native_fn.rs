//! Type-erased trampolines handed to the VM.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::call_context::CallContext;
use crate::error::NativeError;

/// Type-erased native function.
///
/// Every foreign method, accessor and allocator is stored as a `NativeFn`
/// with the same unmarshal-invoke-marshal shape, so the VM can call any of
/// them through one entry point. Cloning shares the underlying callable.
#[derive(Clone)]
pub struct NativeFn {
    inner: Arc<dyn NativeCallable + Send + Sync>,
}

impl NativeFn {
    pub fn new<F>(f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Call this native function with the given context.
    pub fn call(&self, ctx: &mut CallContext) -> Result<(), NativeError> {
        self.inner.call(ctx)
    }

    /// Whether two handles share the same callable.
    pub fn ptr_eq(&self, other: &NativeFn) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn").finish_non_exhaustive()
    }
}

/// Trait for callable native functions.
pub trait NativeCallable {
    fn call(&self, ctx: &mut CallContext) -> Result<(), NativeError>;
}

impl<F> NativeCallable for F
where
    F: Fn(&mut CallContext) -> Result<(), NativeError>,
{
    fn call(&self, ctx: &mut CallContext) -> Result<(), NativeError> {
        (self)(ctx)
    }
}

/// Finalizer run by the collector when a foreign object becomes unreachable.
///
/// It receives the instance by value and nothing else: no call is in
/// progress, so there is no context to touch. Finalizers must not panic.
pub type FinalizeFn = Arc<dyn Fn(Box<dyn Any + Send + Sync>) + Send + Sync>;

/// Allocator/finalizer pair for one foreign class.
#[derive(Clone)]
pub struct ForeignClassMethods {
    /// Runs for `ClassName.new(...)` and binds the new instance to slot 0.
    pub allocate: NativeFn,
    pub finalize: Option<FinalizeFn>,
}

impl ForeignClassMethods {
    pub fn new(allocate: NativeFn) -> Self {
        Self {
            allocate,
            finalize: None,
        }
    }

    pub fn with_finalizer(mut self, finalize: FinalizeFn) -> Self {
        self.finalize = Some(finalize);
        self
    }
}

impl fmt::Debug for ForeignClassMethods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignClassMethods")
            .field("allocate", &self.allocate)
            .field("finalize", &self.finalize.is_some())
            .finish()
    }
}
