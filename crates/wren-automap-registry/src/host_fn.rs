//! Adapters that turn typed Rust callables into trampolines.
//!
//! Each trait is implemented for closures and fn items of up to eight
//! parameters. The generated [`NativeFn`] reads every argument first, so a
//! kind mismatch fails before the host callable runs, then invokes the
//! callable with panics caught, then writes the result to slot 0.
//!
//! The `Args` type parameter is a marker tuple of parameter types; it is
//! always inferred.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use wren_automap_core::{CallContext, FromSlot, HostReturn, NativeError, NativeFn};

/// A callable without a receiver, bound as a static member.
pub trait StaticFn<Args>: Send + Sync + 'static {
    const ARITY: usize;

    fn into_native(self) -> NativeFn;
}

/// A callable taking `&T` as receiver.
pub trait MethodFn<T, Args>: Send + Sync + 'static {
    const ARITY: usize;

    fn into_native(self) -> NativeFn;
}

/// A callable taking `&mut T` as receiver.
pub trait MethodMutFn<T, Args>: Send + Sync + 'static {
    const ARITY: usize;

    fn into_native(self) -> NativeFn;
}

/// A callable producing a new `T`, bound as a constructor.
///
/// The instance is moved into the foreign heap and bound to slot 0.
pub trait ConstructorFn<T, Args>: Send + Sync + 'static {
    const ARITY: usize;

    fn into_native(self) -> NativeFn;
}

/// Run a host callable, turning a panic into [`NativeError::Panic`].
pub(crate) fn guard<R>(f: impl FnOnce() -> R) -> Result<R, NativeError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| NativeError::Panic {
        message: panic_message(payload.as_ref()),
    })
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn write_return<R: HostReturn>(ctx: &mut CallContext, ret: R) -> Result<(), NativeError> {
    let slot = ret.into_return(ctx.heap_mut())?;
    ctx.set_return_slot(slot)
}

macro_rules! impl_host_fns {
    ($arity:expr; $($ty:ident $var:ident $idx:tt),*) => {
        impl<F, R, $($ty,)*> StaticFn<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> R + Send + Sync + 'static,
            R: HostReturn,
            $($ty: FromSlot,)*
        {
            const ARITY: usize = $arity;

            fn into_native(self) -> NativeFn {
                NativeFn::new(move |ctx: &mut CallContext| {
                    $(let $var: $ty = ctx.arg($idx)?;)*
                    let ret = guard(|| (self)($($var),*))?;
                    write_return(ctx, ret)
                })
            }
        }

        impl<T, F, R, $($ty,)*> MethodFn<T, ($($ty,)*)> for F
        where
            T: Any,
            F: Fn(&T, $($ty),*) -> R + Send + Sync + 'static,
            R: HostReturn,
            $($ty: FromSlot,)*
        {
            const ARITY: usize = $arity;

            fn into_native(self) -> NativeFn {
                NativeFn::new(move |ctx: &mut CallContext| {
                    $(let $var: $ty = ctx.arg($idx)?;)*
                    let this: &T = ctx.this()?;
                    let ret = guard(|| (self)(this, $($var),*))?;
                    write_return(ctx, ret)
                })
            }
        }

        impl<T, F, R, $($ty,)*> MethodMutFn<T, ($($ty,)*)> for F
        where
            T: Any,
            F: Fn(&mut T, $($ty),*) -> R + Send + Sync + 'static,
            R: HostReturn,
            $($ty: FromSlot,)*
        {
            const ARITY: usize = $arity;

            fn into_native(self) -> NativeFn {
                NativeFn::new(move |ctx: &mut CallContext| {
                    $(let $var: $ty = ctx.arg($idx)?;)*
                    let this: &mut T = ctx.this_mut()?;
                    let ret = guard(|| (self)(this, $($var),*))?;
                    write_return(ctx, ret)
                })
            }
        }

        impl<T, F, $($ty,)*> ConstructorFn<T, ($($ty,)*)> for F
        where
            T: Any + Send + Sync,
            F: Fn($($ty),*) -> T + Send + Sync + 'static,
            $($ty: FromSlot,)*
        {
            const ARITY: usize = $arity;

            fn into_native(self) -> NativeFn {
                NativeFn::new(move |ctx: &mut CallContext| {
                    $(let $var: $ty = ctx.arg($idx)?;)*
                    let instance = guard(|| (self)($($var),*))?;
                    ctx.set_new_foreign(instance)?;
                    Ok(())
                })
            }
        }
    };
}

impl_host_fns!(0;);
impl_host_fns!(1; A0 a0 0);
impl_host_fns!(2; A0 a0 0, A1 a1 1);
impl_host_fns!(3; A0 a0 0, A1 a1 1, A2 a2 2);
impl_host_fns!(4; A0 a0 0, A1 a1 1, A2 a2 2, A3 a3 3);
impl_host_fns!(5; A0 a0 0, A1 a1 1, A2 a2 2, A3 a3 3, A4 a4 4);
impl_host_fns!(6; A0 a0 0, A1 a1 1, A2 a2 2, A3 a3 3, A4 a4 4, A5 a5 5);
impl_host_fns!(7; A0 a0 0, A1 a1 1, A2 a2 2, A3 a3 3, A4 a4 4, A5 a5 5, A6 a6 6);
impl_host_fns!(8; A0 a0 0, A1 a1 1, A2 a2 2, A3 a3 3, A4 a4 4, A5 a5 5, A6 a6 6, A7 a7 7);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wren_automap_core::{ForeignHeap, Slot};

    #[derive(Debug, Clone, PartialEq)]
    struct Counter {
        value: f64,
    }

    fn native_static<Args, F: StaticFn<Args>>(f: F) -> (usize, NativeFn) {
        (F::ARITY, f.into_native())
    }

    fn native_method<Args, F: MethodFn<Counter, Args>>(f: F) -> (usize, NativeFn) {
        (F::ARITY, f.into_native())
    }

    fn native_method_mut<Args, F: MethodMutFn<Counter, Args>>(f: F) -> NativeFn {
        f.into_native()
    }

    fn native_ctor<Args, F: ConstructorFn<Counter, Args>>(f: F) -> (usize, NativeFn) {
        (F::ARITY, f.into_native())
    }

    #[test]
    fn static_fn_reads_args_and_returns() {
        let (arity, f) = native_static(|a: f64, b: f64| a * b);
        assert_eq!(arity, 2);

        let mut slots = vec![Slot::Null, Slot::Num(3.0), Slot::Num(4.0)];
        let mut heap = ForeignHeap::new();
        let mut ctx = CallContext::new(&mut slots, &mut heap, true);
        f.call(&mut ctx).unwrap();
        assert_eq!(ctx.result(), Some(&Slot::Num(12.0)));
    }

    #[test]
    fn zero_arity_static() {
        let (arity, f) = native_static(|| "hello");
        assert_eq!(arity, 0);

        let mut slots = vec![Slot::Null];
        let mut heap = ForeignHeap::new();
        let mut ctx = CallContext::new(&mut slots, &mut heap, true);
        f.call(&mut ctx).unwrap();
        assert_eq!(ctx.result(), Some(&Slot::String("hello".into())));
    }

    #[test]
    fn kind_mismatch_skips_invocation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let (_, f) = native_static(move |x: f64| {
            seen.fetch_add(1, Ordering::SeqCst);
            x
        });

        let mut slots = vec![Slot::Null, Slot::String("1".into())];
        let mut heap = ForeignHeap::new();
        let mut ctx = CallContext::new(&mut slots, &mut heap, true);
        let err = f.call(&mut ctx).unwrap_err();
        assert!(matches!(err, NativeError::ArgumentKindMismatch { index: 0, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn method_borrows_receiver() {
        let (arity, f) = native_method(|c: &Counter, by: f64| c.value + by);
        assert_eq!(arity, 1);

        let mut heap = ForeignHeap::new();
        let handle = heap.allocate(Counter { value: 2.0 });
        let mut slots = vec![Slot::Foreign(handle), Slot::Num(5.0)];
        let mut ctx = CallContext::new(&mut slots, &mut heap, false);
        f.call(&mut ctx).unwrap();
        assert_eq!(ctx.result(), Some(&Slot::Num(7.0)));
    }

    #[test]
    fn method_mut_updates_receiver() {
        let f = native_method_mut(|c: &mut Counter, v: f64| c.value = v);

        let mut heap = ForeignHeap::new();
        let handle = heap.allocate(Counter { value: 0.0 });
        let mut slots = vec![Slot::Foreign(handle), Slot::Num(9.0)];
        let mut ctx = CallContext::new(&mut slots, &mut heap, false);
        f.call(&mut ctx).unwrap();
        drop(ctx);
        assert_eq!(heap.get::<Counter>(handle).unwrap().value, 9.0);
    }

    #[test]
    fn method_rejects_wrong_receiver() {
        let (_, f) = native_method(|c: &Counter| c.value);

        let mut heap = ForeignHeap::new();
        let handle = heap.allocate(String::from("not a counter"));
        let mut slots = vec![Slot::Foreign(handle)];
        let mut ctx = CallContext::new(&mut slots, &mut heap, false);
        assert!(matches!(
            f.call(&mut ctx),
            Err(NativeError::InvalidThis { .. })
        ));
    }

    #[test]
    fn host_error_becomes_invocation_failure() {
        let (_, f) = native_static(|x: f64| -> Result<f64, String> {
            if x < 0.0 {
                Err(format!("negative input {}", x))
            } else {
                Ok(x.sqrt())
            }
        });

        let mut slots = vec![Slot::Null, Slot::Num(-4.0)];
        let mut heap = ForeignHeap::new();
        let mut ctx = CallContext::new(&mut slots, &mut heap, true);
        let err = f.call(&mut ctx).unwrap_err();
        assert!(err.is_host_failure());
        assert_eq!(ctx.result(), Some(&Slot::Null));
    }

    #[test]
    fn panic_is_caught() {
        let (_, f) = native_static(|| -> f64 { panic!("host blew up") });

        let mut slots = vec![Slot::Null];
        let mut heap = ForeignHeap::new();
        let mut ctx = CallContext::new(&mut slots, &mut heap, true);
        match f.call(&mut ctx) {
            Err(NativeError::Panic { message }) => assert_eq!(message, "host blew up"),
            other => panic!("expected panic error, got {:?}", other),
        }
    }

    #[test]
    fn constructor_binds_slot_zero() {
        let (arity, f) = native_ctor(|value: f64| Counter { value });
        assert_eq!(arity, 1);

        let mut slots = vec![Slot::Null, Slot::Num(1.5)];
        let mut heap = ForeignHeap::new();
        let mut ctx = CallContext::new(&mut slots, &mut heap, false);
        f.call(&mut ctx).unwrap();
        assert_eq!(ctx.this::<Counter>().unwrap().value, 1.5);
    }

    #[test]
    fn eight_arguments() {
        let (arity, f) = native_static(
            |a: i32, b: i32, c: i32, d: i32, e: i32, g: i32, h: i32, i: i32| {
                a + b + c + d + e + g + h + i
            },
        );
        assert_eq!(arity, 8);

        let mut slots = vec![Slot::Null];
        slots.extend((1..=8).map(|n| Slot::Num(n as f64)));
        let mut heap = ForeignHeap::new();
        let mut ctx = CallContext::new(&mut slots, &mut heap, true);
        f.call(&mut ctx).unwrap();
        assert_eq!(ctx.result(), Some(&Slot::Num(36.0)));
    }
}
