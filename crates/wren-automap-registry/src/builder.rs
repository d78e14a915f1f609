//! Fluent construction of class descriptors.
//!
//! # Example
//!
//! ```ignore
//! let point = ClassBuilder::<Point>::new("Point")
//!     .constructor("new(x, y)", |x: f64, y: f64| Point { x, y })?
//!     .property("x", |p: &Point| p.x, |p: &mut Point, x: f64| p.x = x)?
//!     .method("distanceTo(other)", |p: &Point, o: Foreign<Point>| p.distance(&o.0))?
//!     .operator("+(other)", |p: &Point, o: Foreign<Point>| Foreign(p.add(&o.0)))?
//!     .static_method("origin", || Foreign(Point::default()))?
//!     .build();
//! ```

use std::any::{Any, type_name};
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{trace, warn};
use wren_automap_core::{
    DeclForm, Declaration, DeclarationError, FinalizeFn, NativeCallable, NativeFn, Signature,
};

use crate::class::ClassDescriptor;
use crate::error::RegistrationError;
use crate::host_fn::{ConstructorFn, MethodFn, MethodMutFn, StaticFn, panic_message};
use crate::member::MemberDescriptor;

/// A host type with a fixed script-side description.
///
/// Usually derived with `#[derive(ForeignType)]`.
pub trait ForeignType: Any + Send + Sync + Sized {
    /// Script-side class name.
    const NAME: &'static str;

    /// Add this type's members to `builder`.
    fn describe(builder: ClassBuilder<Self>) -> Result<ClassBuilder<Self>, RegistrationError>;
}

/// Builder for a [`ClassDescriptor`] wrapping host type `T`.
///
/// Every member call parses its declaration and checks it against the
/// members already added, so a malformed or clashing member fails at the
/// call that introduced it.
pub struct ClassBuilder<T> {
    name: String,
    superclass: Option<String>,
    constructors: Vec<MemberDescriptor>,
    members: Vec<MemberDescriptor>,
    index: FxHashMap<Signature, usize>,
    finalizer: Option<FinalizeFn>,
    _marker: PhantomData<fn() -> T>,
}

fn parse(decl: &str) -> Result<Declaration, RegistrationError> {
    Declaration::parse(decl).map_err(|err| RegistrationError::invalid(decl, err))
}

/// Parse an accessor name, which must be a plain identifier.
fn parse_name(name: &str) -> Result<Declaration, RegistrationError> {
    let decl = parse(name)?;
    match decl.form {
        DeclForm::Bare { .. } => Ok(decl),
        _ => Err(RegistrationError::invalid(
            name,
            DeclarationError::InvalidName {
                name: name.to_string(),
            },
        )),
    }
}

impl<T: Any + Send + Sync> ClassBuilder<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            constructors: Vec::new(),
            members: Vec::new(),
            index: FxHashMap::default(),
            finalizer: None,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Emit `is <name>` in the class header.
    pub fn superclass(mut self, name: impl Into<String>) -> Self {
        self.superclass = Some(name.into());
        self
    }

    fn push_member(&mut self, member: MemberDescriptor) -> Result<(), RegistrationError> {
        if self.index.contains_key(member.signature()) {
            return Err(RegistrationError::AmbiguousMember {
                class: self.name.clone(),
                signature: member.signature().to_string(),
            });
        }
        trace!(
            class = %self.name,
            signature = %member.signature(),
            is_static = member.is_static(),
            "member added"
        );
        self.index.insert(member.signature().clone(), self.members.len());
        self.members.push(member);
        Ok(())
    }

    fn add(
        mut self,
        decl: &Declaration,
        arity: usize,
        is_static: bool,
        native: NativeFn,
    ) -> Result<Self, RegistrationError> {
        let member = MemberDescriptor::new(decl, arity, is_static, native)?;
        self.push_member(member)?;
        Ok(self)
    }

    /// Register a constructor.
    ///
    /// The allocator only sees the argument count, so each constructor needs
    /// a distinct arity.
    pub fn constructor<F, Args>(mut self, decl: &str, f: F) -> Result<Self, RegistrationError>
    where
        F: ConstructorFn<T, Args>,
    {
        let parsed = parse(decl)?;
        let member = MemberDescriptor::constructor(&parsed, F::ARITY, f.into_native())?;
        if self.constructors.iter().any(|c| c.arity() == F::ARITY) {
            return Err(RegistrationError::AmbiguousMember {
                class: self.name.clone(),
                signature: member.signature().to_string(),
            });
        }
        self.constructors.push(member);
        Ok(self)
    }

    /// Register an instance method taking `&T`.
    ///
    /// `decl` is the member as written in a class body: `foo(a, b)`,
    /// `reset()`, or a bare `foo` whose arity comes from the callable.
    pub fn method<F, Args>(self, decl: &str, f: F) -> Result<Self, RegistrationError>
    where
        F: MethodFn<T, Args>,
    {
        let parsed = parse(decl)?;
        self.add(&parsed, F::ARITY, false, f.into_native())
    }

    /// Register an instance method taking `&mut T`.
    pub fn method_mut<F, Args>(self, decl: &str, f: F) -> Result<Self, RegistrationError>
    where
        F: MethodMutFn<T, Args>,
    {
        let parsed = parse(decl)?;
        self.add(&parsed, F::ARITY, false, f.into_native())
    }

    /// Register a static method.
    pub fn static_method<F, Args>(self, decl: &str, f: F) -> Result<Self, RegistrationError>
    where
        F: StaticFn<Args>,
    {
        let parsed = parse(decl)?;
        self.add(&parsed, F::ARITY, true, f.into_native())
    }

    /// Register a method with raw [`CallContext`] access.
    ///
    /// [`CallContext`]: wren_automap_core::CallContext
    pub fn method_raw<F>(
        self,
        decl: &str,
        arity: usize,
        is_static: bool,
        f: F,
    ) -> Result<Self, RegistrationError>
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        let parsed = parse(decl)?;
        self.add(&parsed, arity, is_static, NativeFn::new(f))
    }

    /// Register an instance getter `name`.
    pub fn getter<F>(self, name: &str, f: F) -> Result<Self, RegistrationError>
    where
        F: MethodFn<T, ()>,
    {
        let parsed = parse_name(name)?;
        self.add(&parsed, 0, false, f.into_native())
    }

    /// Register an instance setter `name=(value)`.
    pub fn setter<F, V>(self, name: &str, f: F) -> Result<Self, RegistrationError>
    where
        F: MethodMutFn<T, (V,)>,
    {
        parse_name(name)?;
        let parsed = parse(&format!("{}=(value)", name))?;
        self.add(&parsed, 1, false, f.into_native())
    }

    /// Register a getter and setter pair for one field.
    pub fn property<G, S, V>(self, name: &str, get: G, set: S) -> Result<Self, RegistrationError>
    where
        G: MethodFn<T, ()>,
        S: MethodMutFn<T, (V,)>,
    {
        self.getter(name, get)?.setter(name, set)
    }

    /// Register a static getter `name`.
    pub fn static_getter<F>(self, name: &str, f: F) -> Result<Self, RegistrationError>
    where
        F: StaticFn<()>,
    {
        let parsed = parse_name(name)?;
        self.add(&parsed, 0, true, f.into_native())
    }

    /// Register an operator or subscript: `+(other)`, `-`, `[i]`, `[i]=(v)`.
    pub fn operator<F, Args>(self, decl: &str, f: F) -> Result<Self, RegistrationError>
    where
        F: MethodFn<T, Args>,
    {
        let parsed = parse(decl)?;
        if !parsed.kind(F::ARITY).is_operator() {
            return Err(RegistrationError::NotAnOperator {
                decl: decl.to_string(),
            });
        }
        self.add(&parsed, F::ARITY, false, f.into_native())
    }

    /// Like [`ClassBuilder::operator`] with a `&mut T` receiver, for
    /// subscript setters.
    pub fn operator_mut<F, Args>(self, decl: &str, f: F) -> Result<Self, RegistrationError>
    where
        F: MethodMutFn<T, Args>,
    {
        let parsed = parse(decl)?;
        if !parsed.kind(F::ARITY).is_operator() {
            return Err(RegistrationError::NotAnOperator {
                decl: decl.to_string(),
            });
        }
        self.add(&parsed, F::ARITY, false, f.into_native())
    }

    /// Run `f` on each instance the collector releases.
    ///
    /// A panic inside `f` is logged and swallowed.
    pub fn finalizer<F>(mut self, f: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let class = self.name.clone();
        self.finalizer = Some(Arc::new(move |instance: Box<dyn Any + Send + Sync>| {
            let value = match instance.downcast::<T>() {
                Ok(value) => *value,
                Err(_) => {
                    warn!(
                        class = %class,
                        expected = type_name::<T>(),
                        "finalizer got a foreign object of another type"
                    );
                    return;
                }
            };
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| f(value))) {
                warn!(
                    class = %class,
                    message = %panic_message(payload.as_ref()),
                    "finalizer panicked"
                );
            }
        }));
        self
    }

    pub fn build(self) -> ClassDescriptor {
        ClassDescriptor {
            name: self.name,
            superclass: self.superclass,
            host_type: type_name::<T>(),
            constructors: self.constructors,
            members: self.members,
            index: self.index,
            finalizer: self.finalizer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wren_automap_core::{CallContext, Foreign, ForeignHeap, MemberKind, Slot};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Grid {
        width: usize,
        cells: Vec<f64>,
    }

    impl ForeignType for Grid {
        const NAME: &'static str = "Grid";

        fn describe(builder: ClassBuilder<Self>) -> Result<ClassBuilder<Self>, RegistrationError> {
            builder
                .constructor("new(width, height)", |w: usize, h: usize| Grid {
                    width: w,
                    cells: vec![0.0; w * h],
                })?
                .getter("width", |g: &Grid| g.width)?
                .operator("[x, y]", |g: &Grid, x: usize, y: usize| {
                    g.cells.get(y * g.width + x).copied()
                })?
                .operator_mut("[x, y]=(value)", |g: &mut Grid, x: usize, y: usize, v: f64| {
                    let w = g.width;
                    if let Some(cell) = g.cells.get_mut(y * w + x) {
                        *cell = v;
                    }
                })?
                .method_mut("fill(value)", |g: &mut Grid, v: f64| g.cells.fill(v))?
                .static_getter("maxWidth", || 1024)
        }
    }

    #[test]
    fn describe_via_trait() {
        let class = ClassDescriptor::of::<Grid>().unwrap();
        assert_eq!(class.name(), "Grid");
        assert!(class.host_type().ends_with("Grid"));

        let sigs: Vec<&str> = class.members().iter().map(|m| m.signature().as_str()).collect();
        assert_eq!(sigs, vec!["width", "[_,_]", "[_,_]=(_)", "fill(_)", "maxWidth"]);
        assert_eq!(class.constructor(2).unwrap().signature().as_str(), "init new(_,_)");
        assert_eq!(
            class.resolve_method("[_,_]", false).unwrap().kind(),
            MemberKind::SubscriptGetter
        );
    }

    #[test]
    fn subscript_round_trip_through_trampolines() {
        let class = ClassDescriptor::of::<Grid>().unwrap();
        let mut heap = ForeignHeap::new();
        let handle = heap.allocate(Grid {
            width: 2,
            cells: vec![0.0; 4],
        });

        let set = class.resolve_method("[_,_]=(_)", false).unwrap();
        let mut slots = vec![
            Slot::Foreign(handle),
            Slot::Num(1.0),
            Slot::Num(1.0),
            Slot::Num(7.5),
        ];
        set.invoke(&mut CallContext::new(&mut slots, &mut heap, false))
            .unwrap();

        let get = class.resolve_method("[_,_]", false).unwrap();
        let mut slots = vec![Slot::Foreign(handle), Slot::Num(1.0), Slot::Num(1.0)];
        get.invoke(&mut CallContext::new(&mut slots, &mut heap, false))
            .unwrap();
        assert_eq!(slots[0], Slot::Num(7.5));

        let mut slots = vec![Slot::Foreign(handle), Slot::Num(5.0), Slot::Num(5.0)];
        get.invoke(&mut CallContext::new(&mut slots, &mut heap, false))
            .unwrap();
        assert_eq!(slots[0], Slot::Null);
    }

    #[test]
    fn duplicate_signature_is_ambiguous() {
        let err = ClassBuilder::<Grid>::new("Grid")
            .method("size", |g: &Grid| g.cells.len())
            .unwrap()
            .static_method("size", || 0)
            .err()
            .unwrap();
        assert_eq!(
            err,
            RegistrationError::AmbiguousMember {
                class: "Grid".into(),
                signature: "size".into(),
            }
        );
    }

    #[test]
    fn same_name_different_arity_coexist() {
        let class = ClassBuilder::<Grid>::new("Grid")
            .method("scale(f)", |g: &Grid, f: f64| g.width as f64 * f)
            .unwrap()
            .method("scale(fx, fy)", |g: &Grid, fx: f64, fy: f64| g.width as f64 * fx * fy)
            .unwrap()
            .build();
        assert!(class.resolve_method("scale(_)", false).is_some());
        assert!(class.resolve_method("scale(_,_)", false).is_some());
    }

    #[test]
    fn constructors_need_distinct_arity() {
        let err = ClassBuilder::<Grid>::new("Grid")
            .constructor("new(w)", |w: usize| Grid {
                width: w,
                cells: Vec::new(),
            })
            .unwrap()
            .constructor("square(side)", |s: usize| Grid {
                width: s,
                cells: vec![0.0; s * s],
            })
            .err()
            .unwrap();
        assert!(matches!(err, RegistrationError::AmbiguousMember { .. }));
    }

    #[test]
    fn malformed_declarations() {
        let b = || ClassBuilder::<Grid>::new("Grid");

        assert!(matches!(
            b().method("foo(a", |_: &Grid, _: f64| ()).err(),
            Some(RegistrationError::InvalidDeclaration { .. })
        ));
        assert!(matches!(
            b().method("foo(a, b)", |_: &Grid, _: f64| ()).err(),
            Some(RegistrationError::ArityMismatch { expected: 2, actual: 1, .. })
        ));
        assert!(matches!(
            b().getter("width()", |g: &Grid| g.width).err(),
            Some(RegistrationError::InvalidDeclaration { .. })
        ));
        assert!(matches!(
            b().operator("length", |g: &Grid| g.cells.len()).err(),
            Some(RegistrationError::NotAnOperator { .. })
        ));
        assert!(matches!(
            b().method_raw("-", 0, true, |_: &mut CallContext| Ok(())).err(),
            Some(RegistrationError::StaticOperator { .. })
        ));
    }

    #[test]
    fn foreign_values_cross_the_boundary() {
        let class = ClassBuilder::<Grid>::new("Grid")
            .method("copy", |g: &Grid| Foreign(g.clone()))
            .unwrap()
            .build();

        let mut heap = ForeignHeap::new();
        let original = heap.allocate(Grid {
            width: 3,
            cells: vec![1.0],
        });
        let mut slots = vec![Slot::Foreign(original)];
        class
            .resolve_method("copy", false)
            .unwrap()
            .invoke(&mut CallContext::new(&mut slots, &mut heap, false))
            .unwrap();

        let copy = slots[0].as_foreign().unwrap();
        assert_ne!(copy, original);
        assert_eq!(heap.get::<Grid>(copy).unwrap().width, 3);
    }
}
