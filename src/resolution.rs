//! The three hooks the VM calls while compiling.
//!
//! Each is a pure lookup over the session table. `None` means "not ours":
//! the VM falls through to its next hook or its own default behaviour.

use std::sync::Arc;

use tracing::trace;
use wren_automap_core::{ForeignClassMethods, NativeFn, VmConfig, VmId};

use crate::session::{AutoMapper, Shared};

/// Add the mapper's hooks to a VM configuration, after any already present.
pub(crate) fn install(shared: &Arc<Shared>, config: &mut VmConfig) {
    let loader = Arc::clone(shared);
    config.add_load_module(Arc::new(move |vm: VmId, name: &str| {
        loader.load_module(vm, name)
    }));

    let class_binder = Arc::clone(shared);
    config.add_bind_foreign_class(Arc::new(move |vm: VmId, module: &str, class: &str| {
        class_binder.bind_foreign_class(vm, module, class)
    }));

    let method_binder = Arc::clone(shared);
    config.add_bind_foreign_method(Arc::new(
        move |vm: VmId, module: &str, class: &str, is_static: bool, signature: &str| {
            method_binder.bind_foreign_method(vm, module, class, is_static, signature)
        },
    ));
}

impl Shared {
    /// Source of a mapped module, marking it loaded.
    pub(crate) fn load_module(&self, vm: VmId, name: &str) -> Option<String> {
        let session = self.session(vm)?;
        let mut session = session.lock();
        match session.modules.get_mut(name) {
            Some(module) => {
                trace!(vm = %vm, module = name, "module source delivered");
                Some(module.load())
            }
            None => {
                trace!(vm = %vm, module = name, "module not mapped");
                None
            }
        }
    }

    pub(crate) fn bind_foreign_class(
        &self,
        vm: VmId,
        module: &str,
        class_name: &str,
    ) -> Option<ForeignClassMethods> {
        let session = self.session(vm)?;
        let session = session.lock();
        let methods = session.find_class(module, class_name).map(|class| class.bind());
        trace!(vm = %vm, module, class = class_name, found = methods.is_some(), "bind foreign class");
        methods
    }

    pub(crate) fn bind_foreign_method(
        &self,
        vm: VmId,
        module: &str,
        class_name: &str,
        is_static: bool,
        signature: &str,
    ) -> Option<NativeFn> {
        let session = self.session(vm)?;
        let session = session.lock();
        let native = session
            .find_class(module, class_name)?
            .resolve_method(signature, is_static)
            .map(|member| member.trampoline());
        trace!(
            vm = %vm,
            module,
            class = class_name,
            is_static,
            signature,
            found = native.is_some(),
            "bind foreign method"
        );
        native
    }
}

impl AutoMapper {
    /// What the installed module loader answers for `name`.
    ///
    /// Marks the module loaded, exactly as an import would.
    pub fn load_module(&self, vm: VmId, name: &str) -> Option<String> {
        self.shared.load_module(vm, name)
    }

    /// What the installed class binder answers for `(module, class_name)`.
    pub fn bind_foreign_class(
        &self,
        vm: VmId,
        module: &str,
        class_name: &str,
    ) -> Option<ForeignClassMethods> {
        self.shared.bind_foreign_class(vm, module, class_name)
    }

    /// What the installed method binder answers for a foreign method.
    pub fn bind_foreign_method(
        &self,
        vm: VmId,
        module: &str,
        class_name: &str,
        is_static: bool,
        signature: &str,
    ) -> Option<NativeFn> {
        self.shared
            .bind_foreign_method(vm, module, class_name, is_static, signature)
    }
}
