//! Mapper configuration.

use crate::session::AutoMapper;

/// Settings for a new [`AutoMapper`].
///
/// ```ignore
/// let mapper = AutoMapperConfig::new()
///     .with_strict_modules(false)
///     .build();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoMapperConfig {
    strict_modules: bool,
}

impl Default for AutoMapperConfig {
    fn default() -> Self {
        Self {
            strict_modules: true,
        }
    }
}

impl AutoMapperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject additions to a module after the VM has loaded it. On by default.
    ///
    /// When off, late additions succeed but never reach the VM, which has
    /// already compiled the module.
    pub fn with_strict_modules(mut self, strict: bool) -> Self {
        self.strict_modules = strict;
        self
    }

    pub fn strict_modules(&self) -> bool {
        self.strict_modules
    }

    pub fn build(self) -> AutoMapper {
        AutoMapper::with_config(&self)
    }
}
