//! Conversion traits between Rust values and VM slots.
//!
//! - [`FromSlot`]: read a host parameter out of an argument slot
//! - [`IntoSlot`]: write a host return value into the result slot
//! - [`HostReturn`]: what a bound host callable may return
//!
//! Every conversion goes through the fixed kind lookup of [`SlotKind`]:
//!
//! | Rust | Slot kind |
//! |------|-----------|
//! | `bool` | `Bool` |
//! | `f32`, `f64`, all integers | `Num` |
//! | `String`, `&str` | `String` |
//! | `Foreign<T>`, `ForeignHandle` | `Foreign` |
//! | `Option<T>` | `Null` or the kind of `T` |
//!
//! [`SlotKind`]: crate::SlotKind

use std::any::{Any, type_name};
use std::fmt;

use crate::error::{ConversionError, NativeError};
use crate::heap::{ForeignHandle, ForeignHeap};
use crate::slot::Slot;

/// Extract a value from a slot.
pub trait FromSlot: Sized {
    /// Convert the slot's value into this Rust type.
    ///
    /// Returns [`ConversionError::TypeMismatch`] when the slot's kind is not
    /// the one this type maps to.
    fn from_slot(slot: &Slot, heap: &ForeignHeap) -> Result<Self, ConversionError>;
}

/// Convert a value into a slot.
pub trait IntoSlot {
    fn into_slot(self, heap: &mut ForeignHeap) -> Slot;
}

fn mismatch(expected: &'static str, slot: &Slot) -> ConversionError {
    ConversionError::TypeMismatch {
        expected,
        actual: slot.type_name(),
    }
}

// ============================================================================
// Passthrough
// ============================================================================

impl FromSlot for Slot {
    fn from_slot(slot: &Slot, _heap: &ForeignHeap) -> Result<Self, ConversionError> {
        Ok(slot.clone())
    }
}

impl IntoSlot for Slot {
    fn into_slot(self, _heap: &mut ForeignHeap) -> Slot {
        self
    }
}

impl IntoSlot for () {
    fn into_slot(self, _heap: &mut ForeignHeap) -> Slot {
        Slot::Null
    }
}

// ============================================================================
// Bool / String
// ============================================================================

impl FromSlot for bool {
    fn from_slot(slot: &Slot, _heap: &ForeignHeap) -> Result<Self, ConversionError> {
        match slot {
            Slot::Bool(v) => Ok(*v),
            _ => Err(mismatch("Bool", slot)),
        }
    }
}

impl IntoSlot for bool {
    fn into_slot(self, _heap: &mut ForeignHeap) -> Slot {
        Slot::Bool(self)
    }
}

impl FromSlot for String {
    fn from_slot(slot: &Slot, _heap: &ForeignHeap) -> Result<Self, ConversionError> {
        match slot {
            Slot::String(s) => Ok(s.clone()),
            _ => Err(mismatch("String", slot)),
        }
    }
}

impl IntoSlot for String {
    fn into_slot(self, _heap: &mut ForeignHeap) -> Slot {
        Slot::String(self)
    }
}

impl IntoSlot for &str {
    fn into_slot(self, _heap: &mut ForeignHeap) -> Slot {
        Slot::String(self.to_string())
    }
}

// ============================================================================
// Numbers
// ============================================================================

impl FromSlot for f64 {
    fn from_slot(slot: &Slot, _heap: &ForeignHeap) -> Result<Self, ConversionError> {
        match slot {
            Slot::Num(v) => Ok(*v),
            _ => Err(mismatch("Num", slot)),
        }
    }
}

impl IntoSlot for f64 {
    fn into_slot(self, _heap: &mut ForeignHeap) -> Slot {
        Slot::Num(self)
    }
}

impl FromSlot for f32 {
    fn from_slot(slot: &Slot, _heap: &ForeignHeap) -> Result<Self, ConversionError> {
        match slot {
            Slot::Num(v) => Ok(*v as f32),
            _ => Err(mismatch("Num", slot)),
        }
    }
}

impl IntoSlot for f32 {
    fn into_slot(self, _heap: &mut ForeignHeap) -> Slot {
        Slot::Num(self as f64)
    }
}

macro_rules! impl_slot_int {
    ($($ty:ty),*) => {
        $(
            impl FromSlot for $ty {
                fn from_slot(slot: &Slot, _heap: &ForeignHeap) -> Result<Self, ConversionError> {
                    match slot {
                        Slot::Num(v) => {
                            if !v.is_finite() || v.fract() != 0.0 {
                                return Err(ConversionError::NotAnInteger {
                                    value: *v,
                                    target_type: stringify!($ty),
                                });
                            }
                            // MAX + 1 is a power of two, so the exclusive bound is exact
                            // even where MAX itself rounds up as an f64.
                            if *v < <$ty>::MIN as f64 || *v >= <$ty>::MAX as f64 + 1.0 {
                                return Err(ConversionError::IntegerOverflow {
                                    value: *v,
                                    target_type: stringify!($ty),
                                });
                            }
                            Ok(*v as $ty)
                        }
                        _ => Err(mismatch("Num", slot)),
                    }
                }
            }

            impl IntoSlot for $ty {
                fn into_slot(self, _heap: &mut ForeignHeap) -> Slot {
                    Slot::Num(self as f64)
                }
            }
        )*
    };
}

impl_slot_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

// ============================================================================
// Null / foreign
// ============================================================================

impl<T: FromSlot> FromSlot for Option<T> {
    fn from_slot(slot: &Slot, heap: &ForeignHeap) -> Result<Self, ConversionError> {
        match slot {
            Slot::Null => Ok(None),
            _ => T::from_slot(slot, heap).map(Some),
        }
    }
}

impl<T: IntoSlot> IntoSlot for Option<T> {
    fn into_slot(self, heap: &mut ForeignHeap) -> Slot {
        match self {
            Some(value) => value.into_slot(heap),
            None => Slot::Null,
        }
    }
}

impl FromSlot for ForeignHandle {
    fn from_slot(slot: &Slot, _heap: &ForeignHeap) -> Result<Self, ConversionError> {
        slot.as_foreign().ok_or_else(|| mismatch("Foreign", slot))
    }
}

impl IntoSlot for ForeignHandle {
    fn into_slot(self, _heap: &mut ForeignHeap) -> Slot {
        Slot::Foreign(self)
    }
}

/// A foreign instance passed by value.
///
/// As a parameter the instance behind the argument's handle is cloned out of
/// the heap; as a return value the instance is moved into a new heap entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Foreign<T>(pub T);

impl<T> Foreign<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Any + Clone> FromSlot for Foreign<T> {
    fn from_slot(slot: &Slot, heap: &ForeignHeap) -> Result<Self, ConversionError> {
        let handle = slot.as_foreign().ok_or_else(|| mismatch("Foreign", slot))?;
        match heap.get::<T>(handle) {
            Some(value) => Ok(Foreign(value.clone())),
            None if !heap.contains(handle) => Err(ConversionError::StaleHandle {
                index: handle.index,
            }),
            None => Err(ConversionError::ForeignTypeMismatch {
                expected: type_name::<T>(),
            }),
        }
    }
}

impl<T: Any + Send + Sync> IntoSlot for Foreign<T> {
    fn into_slot(self, heap: &mut ForeignHeap) -> Slot {
        Slot::Foreign(heap.allocate(self.0))
    }
}

// ============================================================================
// Host return values
// ============================================================================

/// Return type of a bound host callable.
///
/// Plain values are written to the result slot. A `Result` writes its `Ok`
/// value, while its `Err` becomes [`NativeError::HostInvocation`] and leaves
/// the slot untouched.
pub trait HostReturn {
    fn into_return(self, heap: &mut ForeignHeap) -> Result<Slot, NativeError>;
}

impl<T: IntoSlot> HostReturn for T {
    fn into_return(self, heap: &mut ForeignHeap) -> Result<Slot, NativeError> {
        Ok(self.into_slot(heap))
    }
}

impl<V: IntoSlot, E: fmt::Display> HostReturn for Result<V, E> {
    fn into_return(self, heap: &mut ForeignHeap) -> Result<Slot, NativeError> {
        match self {
            Ok(value) => Ok(value.into_slot(heap)),
            Err(err) => Err(NativeError::host(err.to_string())),
        }
    }
}
