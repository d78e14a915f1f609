//! Complete description of one foreign class.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use wren_automap_core::{
    CallContext, FinalizeFn, ForeignClassMethods, NativeError, NativeFn, Signature,
};
use xxhash_rust::xxh64::xxh64;

use crate::builder::{ClassBuilder, ForeignType};
use crate::error::RegistrationError;
use crate::member::MemberDescriptor;

/// Everything the VM needs to know about one host type.
///
/// Built once by a [`ClassBuilder`] and immutable afterwards. Constructors are
/// kept apart from the other members: the VM reaches them through the
/// allocator, never through a method lookup.
#[derive(Clone)]
pub struct ClassDescriptor {
    pub(crate) name: String,
    pub(crate) superclass: Option<String>,
    pub(crate) host_type: &'static str,
    pub(crate) constructors: Vec<MemberDescriptor>,
    pub(crate) members: Vec<MemberDescriptor>,
    pub(crate) index: FxHashMap<Signature, usize>,
    pub(crate) finalizer: Option<FinalizeFn>,
}

impl ClassDescriptor {
    /// Describe `T` through its [`ForeignType`] implementation.
    pub fn of<T: ForeignType>() -> Result<Self, RegistrationError> {
        let builder = T::describe(ClassBuilder::new(T::NAME))?;
        Ok(builder.build())
    }

    /// Script-side class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn superclass(&self) -> Option<&str> {
        self.superclass.as_deref()
    }

    /// Rust type name of the wrapped host type.
    pub fn host_type(&self) -> &'static str {
        self.host_type
    }

    pub fn constructors(&self) -> &[MemberDescriptor] {
        &self.constructors
    }

    /// Non-constructor members in the order they were added.
    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    /// The constructor taking `arity` arguments.
    pub fn constructor(&self, arity: usize) -> Option<&MemberDescriptor> {
        self.constructors.iter().find(|c| c.arity() == arity)
    }

    pub fn has_finalizer(&self) -> bool {
        self.finalizer.is_some()
    }

    /// Find the member bound to `signature`.
    ///
    /// Static and instance members never answer for each other. `None` is not
    /// an error here; the VM reports the unresolved method itself.
    pub fn resolve_method(&self, signature: &str, is_static: bool) -> Option<&MemberDescriptor> {
        let member = &self.members[*self.index.get(signature)?];
        (member.is_static() == is_static).then_some(member)
    }

    /// The `foreign class` declaration for this type.
    ///
    /// Constructors come first, then members in insertion order, so the same
    /// description always yields byte-identical source.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn source(&self) -> String {
        let mut out = format!("foreign class {}", self.name);
        if let Some(superclass) = &self.superclass {
            out.push_str(" is ");
            out.push_str(superclass);
        }
        out.push_str(" {\n");
        for member in self.constructors.iter().chain(&self.members) {
            out.push_str("  ");
            out.push_str(member.source());
            out.push('\n');
        }
        out.push_str("}\n");
        out
    }

    /// Fingerprint of [`ClassDescriptor::source`].
    pub fn source_hash(&self) -> u64 {
        xxh64(self.source().as_bytes(), 0)
    }

    /// Allocator and finalizer for the VM's foreign class binding.
    ///
    /// The allocator picks the constructor by argument count and lets it move
    /// the new instance into slot 0.
    pub fn bind(&self) -> ForeignClassMethods {
        let class = self.name.clone();
        let constructors: Vec<(usize, NativeFn)> = self
            .constructors
            .iter()
            .map(|c| (c.arity(), c.trampoline()))
            .collect();

        let allocate = NativeFn::new(move |ctx: &mut CallContext| {
            let arity = ctx.arg_count();
            match constructors.iter().find(|(n, _)| *n == arity) {
                Some((_, constructor)) => constructor.call(ctx),
                None => Err(NativeError::NoConstructor {
                    class: class.clone(),
                    arity,
                }),
            }
        });

        let methods = ForeignClassMethods::new(allocate);
        match &self.finalizer {
            Some(finalize) => methods.with_finalizer(Arc::clone(finalize)),
            None => methods,
        }
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("superclass", &self.superclass)
            .field("host_type", &self.host_type)
            .field("constructors", &self.constructors.len())
            .field("members", &self.members.len())
            .field("finalizer", &self.finalizer.is_some())
            .finish()
    }
}
