//! Per-VM binding state.
//!
//! An [`AutoMapper`] owns one session per VM it has mapped types into. A
//! session holds the named modules waiting to be imported and the classes
//! already interpreted into the main module. The VM reaches a session only
//! through the hooks installed on first use, which carry the VM's id.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};
use wren_automap_core::{ForeignVm, MAIN_MODULE, VmId};
use wren_automap_registry::{ClassDescriptor, ForeignModule, ForeignType, ModuleError};

use crate::config::AutoMapperConfig;
use crate::error::{AutoMapError, AutoMapResult};
use crate::resolution;

/// Binding state for one VM.
#[derive(Debug, Default)]
pub(crate) struct Session {
    pub(crate) modules: FxHashMap<String, ForeignModule>,
    pub(crate) main_classes: FxHashMap<String, ClassDescriptor>,
}

impl Session {
    /// Class lookup the way the VM addresses it.
    pub(crate) fn find_class(&self, module: &str, class_name: &str) -> Option<&ClassDescriptor> {
        if module == MAIN_MODULE {
            self.main_classes.get(class_name)
        } else {
            self.modules.get(module)?.class(class_name)
        }
    }
}

pub(crate) type SessionRef = Arc<Mutex<Session>>;

/// State shared between a mapper and the hooks it installed.
pub(crate) struct Shared {
    sessions: Mutex<FxHashMap<VmId, SessionRef>>,
    strict: AtomicBool,
}

impl Shared {
    pub(crate) fn session(&self, vm: VmId) -> Option<SessionRef> {
        self.sessions.lock().get(&vm).cloned()
    }
}

/// Session table mapping VMs to their foreign modules and classes.
///
/// Cloning is cheap and shares the table. Distinct VMs never see each
/// other's bindings, so one mapper can serve VMs on different threads; a
/// single VM must be driven from one thread at a time.
///
/// ```ignore
/// let mapper = AutoMapper::new();
/// mapper.map_type::<Point>(&mut vm, "geometry")?;
/// vm.interpret("main", "import \"geometry\" for Point");
/// ```
#[derive(Clone)]
pub struct AutoMapper {
    pub(crate) shared: Arc<Shared>,
}

impl Default for AutoMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoMapper {
    /// Mapper with default settings.
    pub fn new() -> Self {
        AutoMapperConfig::default().build()
    }

    pub(crate) fn with_config(config: &AutoMapperConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                sessions: Mutex::new(FxHashMap::default()),
                strict: AtomicBool::new(config.strict_modules()),
            }),
        }
    }

    pub fn strict_modules(&self) -> bool {
        self.shared.strict.load(Ordering::Relaxed)
    }

    /// Toggle strict module checking for every VM of this mapper.
    pub fn set_strict_modules(&self, strict: bool) {
        self.shared.strict.store(strict, Ordering::Relaxed);
    }

    /// Install the resolution hooks into `vm` unless already done.
    ///
    /// Returns `true` when the hooks were installed by this call.
    pub fn ensure_registered<V: ForeignVm + ?Sized>(&self, vm: &mut V) -> bool {
        let (_, installed) = self.session_for(vm);
        installed
    }

    fn session_for<V: ForeignVm + ?Sized>(&self, vm: &mut V) -> (SessionRef, bool) {
        let id = vm.id();
        let session = {
            let mut sessions = self.shared.sessions.lock();
            if let Some(session) = sessions.get(&id) {
                return (Arc::clone(session), false);
            }
            let session = SessionRef::default();
            sessions.insert(id, Arc::clone(&session));
            session
        };

        resolution::install(&self.shared, vm.config_mut());
        debug!(vm = %id, "resolution hooks installed");
        (session, true)
    }

    /// Make `classes` available to `vm` under `module`.
    ///
    /// Classes for [`MAIN_MODULE`] are interpreted immediately (see
    /// [`AutoMapper::map_main`]). Classes for any other module are held until
    /// the VM imports that module.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn map<V, I>(&self, vm: &mut V, module: &str, classes: I) -> AutoMapResult<()>
    where
        V: ForeignVm + ?Sized,
        I: IntoIterator<Item = ClassDescriptor>,
    {
        if module == MAIN_MODULE {
            return self.map_main(vm, classes);
        }

        let (session, _) = self.session_for(vm);
        let strict = self.strict_modules();
        let mut session = session.lock();
        if let Some(target) = session.modules.get_mut(module) {
            target.add(classes, strict)?;
            return Ok(());
        }

        // A module only becomes visible to the loader once its first batch is accepted.
        let mut created = ForeignModule::new(module);
        created.add(classes, strict)?;
        debug!(vm = %vm.id(), module, "module created");
        session.modules.insert(module.to_string(), created);
        Ok(())
    }

    /// Describe `T` and map it into `module`.
    pub fn map_type<T, V>(&self, vm: &mut V, module: &str) -> AutoMapResult<()>
    where
        T: ForeignType,
        V: ForeignVm + ?Sized,
    {
        let class = ClassDescriptor::of::<T>()?;
        self.map(vm, module, [class])
    }

    /// Interpret `classes` into the main module, one class at a time.
    ///
    /// The main module is never frozen; it can be extended by later calls. A
    /// class the VM fails to interpret is removed again and the remaining
    /// classes are not mapped.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn map_main<V, I>(&self, vm: &mut V, classes: I) -> AutoMapResult<()>
    where
        V: ForeignVm + ?Sized,
        I: IntoIterator<Item = ClassDescriptor>,
    {
        let (session, _) = self.session_for(vm);
        let id = vm.id();

        for class in classes {
            let class_name = class.name().to_string();
            let source = class.source();
            {
                let mut session = session.lock();
                if session.main_classes.contains_key(&class_name) {
                    return Err(ModuleError::DuplicateClass {
                        module: MAIN_MODULE.to_string(),
                        class: class_name,
                    }
                    .into());
                }
                session.main_classes.insert(class_name.clone(), class);
            }

            // No lock held: the VM calls back into the hooks while compiling.
            let result = vm.interpret(MAIN_MODULE, &source);
            if !result.is_success() {
                session.lock().main_classes.remove(&class_name);
                warn!(vm = %id, class = %class_name, ?result, "main-module class failed to interpret");
                return Err(AutoMapError::InterpretFailed {
                    class: class_name,
                    result,
                });
            }
            debug!(vm = %id, class = %class_name, "class interpreted into main module");
        }
        Ok(())
    }

    /// Drop all state for `vm`.
    ///
    /// Call this when the VM is destroyed. Hooks already installed in that VM
    /// resolve nothing afterwards.
    pub fn forget(&self, vm: VmId) -> bool {
        let removed = self.shared.sessions.lock().remove(&vm).is_some();
        if removed {
            debug!(vm = %vm, "session dropped");
        }
        removed
    }

    pub fn is_registered(&self, vm: VmId) -> bool {
        self.shared.sessions.lock().contains_key(&vm)
    }

    /// Names of the named modules mapped for `vm`, sorted.
    pub fn module_names(&self, vm: VmId) -> Vec<String> {
        let Some(session) = self.shared.session(vm) else {
            return Vec::new();
        };
        let mut names: Vec<String> = session.lock().modules.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether `module` has been loaded by `vm`; `None` if it is not mapped.
    pub fn is_module_loaded(&self, vm: VmId, module: &str) -> Option<bool> {
        let session = self.shared.session(vm)?;
        let session = session.lock();
        session.modules.get(module).map(ForeignModule::is_used)
    }

    /// Source `module` would deliver, without marking it loaded.
    pub fn module_source(&self, vm: VmId, module: &str) -> Option<String> {
        let session = self.shared.session(vm)?;
        let session = session.lock();
        session.modules.get(module).map(ForeignModule::source)
    }

    /// Names of the classes interpreted into `vm`'s main module, sorted.
    pub fn main_class_names(&self, vm: VmId) -> Vec<String> {
        let Some(session) = self.shared.session(vm) else {
            return Vec::new();
        };
        let mut names: Vec<String> = session.lock().main_classes.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for AutoMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoMapper")
            .field("sessions", &self.shared.sessions.lock().len())
            .field("strict_modules", &self.strict_modules())
            .finish()
    }
}
