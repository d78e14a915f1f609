//! Importable modules of generated classes.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::class::ClassDescriptor;
use crate::error::ModuleError;

/// Classes grouped behind one importable module name.
///
/// A module is open until its source is loaded by the VM, then frozen: the
/// VM caches a module after its first import and never asks for it again, so
/// anything added later would never be compiled.
#[derive(Debug, Clone)]
pub struct ForeignModule {
    name: String,
    classes: Vec<ClassDescriptor>,
    index: FxHashMap<String, usize>,
    used: bool,
}

impl ForeignModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classes: Vec::new(),
            index: FxHashMap::default(),
            used: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the source has been delivered to the VM. Never reverts.
    pub fn is_used(&self) -> bool {
        self.used
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn class(&self, name: &str) -> Option<&ClassDescriptor> {
        self.index.get(name).map(|&i| &self.classes[i])
    }

    /// Classes in the order they were added.
    pub fn classes(&self) -> &[ClassDescriptor] {
        &self.classes
    }

    /// Add classes to the module.
    ///
    /// With `strict` set, a module that was already loaded rejects the whole
    /// batch with [`ModuleError::Frozen`]. Without it the classes are added,
    /// but the VM has already compiled the old source and will not see them.
    /// A class name already present, or repeated within the batch, fails with
    /// [`ModuleError::DuplicateClass`]. Either error leaves the module
    /// unchanged.
    pub fn add(
        &mut self,
        classes: impl IntoIterator<Item = ClassDescriptor>,
        strict: bool,
    ) -> Result<(), ModuleError> {
        if self.used && strict {
            warn!(module = %self.name, "attempt to modify a loaded module");
            return Err(ModuleError::Frozen {
                module: self.name.clone(),
            });
        }

        let classes: Vec<ClassDescriptor> = classes.into_iter().collect();
        {
            let mut seen = FxHashSet::default();
            for class in &classes {
                if self.index.contains_key(class.name()) || !seen.insert(class.name()) {
                    return Err(ModuleError::DuplicateClass {
                        module: self.name.clone(),
                        class: class.name().to_string(),
                    });
                }
            }
        }

        if self.used {
            warn!(
                module = %self.name,
                count = classes.len(),
                "adding classes to a loaded module; the VM will not see them"
            );
        }

        for class in classes {
            debug!(module = %self.name, class = %class.name(), "class added to module");
            self.index.insert(class.name().to_string(), self.classes.len());
            self.classes.push(class);
        }
        Ok(())
    }

    /// Concatenated source of every class, without marking the module used.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn source(&self) -> String {
        self.classes
            .iter()
            .map(ClassDescriptor::source)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Deliver the module's source to the VM, freezing the module.
    ///
    /// Call this exactly once per real import.
    pub fn load(&mut self) -> String {
        self.used = true;
        debug!(module = %self.name, classes = self.classes.len(), "module loaded");
        self.source()
    }
}
