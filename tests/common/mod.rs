//! In-memory stand-in for a Wren VM.
//!
//! It understands just enough of the language to exercise the binding
//! hooks the way the real VM does: `import "m" for A` asks the module loader
//! once per module, every `foreign class` header asks the class binder, and
//! every `foreign` member line asks the method binder with the signature the
//! VM would derive from it. A missing binding fails the interpretation.

#![allow(dead_code)]

use rustc_hash::FxHashMap;
use wren_automap::{
    CallContext, Declaration, ForeignClassMethods, ForeignHandle, ForeignHeap, ForeignVm,
    InterpretResult, NativeError, NativeFn, Slot, VmConfig, VmId,
};

/// Bindings the VM resolved for one class.
pub struct BoundClass {
    pub methods: ForeignClassMethods,
    pub members: FxHashMap<(bool, String), NativeFn>,
}

pub struct MockVm {
    id: VmId,
    config: VmConfig,
    pub heap: ForeignHeap,
    /// Every `(module, source)` passed to `interpret` or compiled on import.
    pub compiled: Vec<(String, String)>,
    /// Module sources the VM has cached after import.
    pub loaded: FxHashMap<String, String>,
    pub classes: FxHashMap<(String, String), BoundClass>,
    /// Count of loader hook calls, per module.
    pub load_requests: FxHashMap<String, usize>,
}

impl Default for MockVm {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVm {
    pub fn new() -> Self {
        Self {
            id: VmId::next(),
            config: VmConfig::new(),
            heap: ForeignHeap::new(),
            compiled: Vec::new(),
            loaded: FxHashMap::default(),
            classes: FxHashMap::default(),
            load_requests: FxHashMap::default(),
        }
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    fn import(&mut self, module: &str) -> InterpretResult {
        if self.loaded.contains_key(module) {
            return InterpretResult::Success;
        }
        *self.load_requests.entry(module.to_string()).or_default() += 1;
        let Some(source) = self.config.load_module(self.id, module) else {
            return InterpretResult::CompileError;
        };
        self.loaded.insert(module.to_string(), source.clone());
        self.compile(module, &source)
    }

    fn compile(&mut self, module: &str, source: &str) -> InterpretResult {
        self.compiled.push((module.to_string(), source.to_string()));

        let mut current: Option<(String, BoundClass)> = None;
        for line in source.lines().map(str::trim) {
            if let Some(rest) = line.strip_prefix("import \"") {
                let Some(end) = rest.find('"') else {
                    return InterpretResult::CompileError;
                };
                let result = self.import(&rest[..end]);
                if !result.is_success() {
                    return result;
                }
            } else if let Some(header) = line.strip_prefix("foreign class ") {
                let name = header
                    .split(|c: char| c.is_whitespace() || c == '{')
                    .next()
                    .unwrap_or_default()
                    .to_string();
                let Some(methods) = self.config.bind_foreign_class(self.id, module, &name) else {
                    return InterpretResult::RuntimeError;
                };
                current = Some((
                    name,
                    BoundClass {
                        methods,
                        members: FxHashMap::default(),
                    },
                ));
            } else if let Some(member) = line.strip_prefix("foreign ") {
                let Some((class_name, bound)) = current.as_mut() else {
                    return InterpretResult::CompileError;
                };
                let (is_static, decl) = match member.strip_prefix("static ") {
                    Some(decl) => (true, decl),
                    None => (false, member),
                };
                let Ok(decl) = Declaration::parse(decl) else {
                    return InterpretResult::CompileError;
                };
                let signature = decl.signature(decl.declared_arity().unwrap_or(0));
                let Some(native) = self.config.bind_foreign_method(
                    self.id,
                    module,
                    class_name,
                    is_static,
                    signature.as_str(),
                ) else {
                    return InterpretResult::RuntimeError;
                };
                bound.members.insert((is_static, signature.to_string()), native);
            } else if line == "}" {
                if let Some((name, bound)) = current.take() {
                    self.classes.insert((module.to_string(), name), bound);
                }
            }
        }
        InterpretResult::Success
    }

    fn class(&self, module: &str, class: &str) -> Result<&BoundClass, NativeError> {
        self.classes
            .get(&(module.to_string(), class.to_string()))
            .ok_or_else(|| NativeError::other(format!("class {} not bound in {}", class, module)))
    }

    /// `Class.new(args...)`: run the allocator and return the new instance.
    pub fn construct(&mut self, module: &str, class: &str, args: Vec<Slot>) -> Result<Slot, NativeError> {
        let allocate = self.class(module, class)?.methods.allocate.clone();
        let mut slots = vec![Slot::Null];
        slots.extend(args);
        allocate.call(&mut CallContext::new(&mut slots, &mut self.heap, false))?;
        Ok(slots.swap_remove(0))
    }

    /// Call an instance member on `receiver`.
    pub fn call(
        &mut self,
        module: &str,
        class: &str,
        receiver: Slot,
        signature: &str,
        args: Vec<Slot>,
    ) -> Result<Slot, NativeError> {
        self.invoke(module, class, receiver, false, signature, args)
    }

    /// Call a static member of `class`.
    pub fn call_static(
        &mut self,
        module: &str,
        class: &str,
        signature: &str,
        args: Vec<Slot>,
    ) -> Result<Slot, NativeError> {
        self.invoke(module, class, Slot::Null, true, signature, args)
    }

    fn invoke(
        &mut self,
        module: &str,
        class: &str,
        receiver: Slot,
        is_static: bool,
        signature: &str,
        args: Vec<Slot>,
    ) -> Result<Slot, NativeError> {
        let native = self
            .class(module, class)?
            .members
            .get(&(is_static, signature.to_string()))
            .cloned()
            .ok_or_else(|| NativeError::other(format!("{} has no method {}", class, signature)))?;
        let mut slots = vec![receiver];
        slots.extend(args);
        native.call(&mut CallContext::new(&mut slots, &mut self.heap, is_static))?;
        Ok(slots.swap_remove(0))
    }

    /// Collect `handle` the way the garbage collector would.
    pub fn collect(&mut self, module: &str, class: &str, handle: ForeignHandle) {
        let finalize = self
            .classes
            .get(&(module.to_string(), class.to_string()))
            .and_then(|bound| bound.methods.finalize.clone());
        if let Some(instance) = self.heap.take(handle) {
            if let Some(finalize) = finalize {
                finalize(instance);
            }
        }
    }
}

impl ForeignVm for MockVm {
    fn id(&self) -> VmId {
        self.id
    }

    fn config_mut(&mut self) -> &mut VmConfig {
        &mut self.config
    }

    fn interpret(&mut self, module: &str, source: &str) -> InterpretResult {
        self.compile(module, source)
    }
}
