//! The seam between binding code and the embedded VM.
//!
//! The VM itself is a black box. It exposes an identity, a configuration
//! holding three hook lists, and an `interpret` entry point; everything else
//! happens through the hooks when the VM compiles code.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::native_fn::{ForeignClassMethods, NativeFn};

/// Name of the module that `interpret` runs code in.
///
/// This module is never imported; it is the program itself.
pub const MAIN_MODULE: &str = "main";

/// Opaque identity of one VM instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VmId(u64);

static NEXT_VM_ID: AtomicU64 = AtomicU64::new(1);

impl VmId {
    /// Hand out a process-unique id.
    pub fn next() -> Self {
        Self(NEXT_VM_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap an identity supplied by a VM adapter.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vm#{}", self.0)
    }
}

/// Outcome of interpreting a chunk of source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
    Success,
    CompileError,
    RuntimeError,
}

impl InterpretResult {
    pub fn is_success(self) -> bool {
        self == InterpretResult::Success
    }
}

/// Resolves an imported module name to its source.
pub type LoadModuleFn = Arc<dyn Fn(VmId, &str) -> Option<String> + Send + Sync>;

/// Resolves `(module, class)` to the class's allocator and finalizer.
pub type BindForeignClassFn =
    Arc<dyn Fn(VmId, &str, &str) -> Option<ForeignClassMethods> + Send + Sync>;

/// Resolves `(module, class, is_static, signature)` to a trampoline.
pub type BindForeignMethodFn =
    Arc<dyn Fn(VmId, &str, &str, bool, &str) -> Option<NativeFn> + Send + Sync>;

/// Hook lists the VM consults while compiling.
///
/// Hooks compose: adding one never replaces another. Each query runs the
/// hooks in registration order and returns the first answer; `None` from
/// every hook lets the VM fall back to its own behaviour.
#[derive(Default, Clone)]
pub struct VmConfig {
    load_module: Vec<LoadModuleFn>,
    bind_foreign_class: Vec<BindForeignClassFn>,
    bind_foreign_method: Vec<BindForeignMethodFn>,
}

impl VmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_load_module(&mut self, hook: LoadModuleFn) {
        self.load_module.push(hook);
    }

    pub fn add_bind_foreign_class(&mut self, hook: BindForeignClassFn) {
        self.bind_foreign_class.push(hook);
    }

    pub fn add_bind_foreign_method(&mut self, hook: BindForeignMethodFn) {
        self.bind_foreign_method.push(hook);
    }

    pub fn load_module(&self, vm: VmId, name: &str) -> Option<String> {
        self.load_module.iter().find_map(|hook| hook(vm, name))
    }

    pub fn bind_foreign_class(
        &self,
        vm: VmId,
        module: &str,
        class_name: &str,
    ) -> Option<ForeignClassMethods> {
        self.bind_foreign_class
            .iter()
            .find_map(|hook| hook(vm, module, class_name))
    }

    pub fn bind_foreign_method(
        &self,
        vm: VmId,
        module: &str,
        class_name: &str,
        is_static: bool,
        signature: &str,
    ) -> Option<NativeFn> {
        self.bind_foreign_method
            .iter()
            .find_map(|hook| hook(vm, module, class_name, is_static, signature))
    }

    /// Number of hooks installed, per slot: (loader, class, method).
    pub fn hook_counts(&self) -> (usize, usize, usize) {
        (
            self.load_module.len(),
            self.bind_foreign_class.len(),
            self.bind_foreign_method.len(),
        )
    }
}

impl fmt::Debug for VmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VmConfig")
            .field("load_module", &self.load_module.len())
            .field("bind_foreign_class", &self.bind_foreign_class.len())
            .field("bind_foreign_method", &self.bind_foreign_method.len())
            .finish()
    }
}

/// What binding code needs from a VM instance.
pub trait ForeignVm {
    fn id(&self) -> VmId;

    fn config_mut(&mut self) -> &mut VmConfig;

    /// Compile and run `source` in `module`.
    fn interpret(&mut self, module: &str, source: &str) -> InterpretResult;
}
