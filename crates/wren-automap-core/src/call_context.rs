//! Call context bridging the VM's slot API and native Rust functions.

use std::any::{Any, TypeId, type_name};
use std::fmt;

use crate::convert::{FromSlot, IntoSlot};
use crate::error::NativeError;
use crate::heap::{ForeignHandle, ForeignHeap};
use crate::slot::Slot;

/// Context for one foreign call.
///
/// Borrows the engine's API slots for the duration of a trampoline. Slot 0
/// holds the receiver (or the class, for static calls and allocators) and is
/// also where the result is written; arguments start at slot 1.
///
/// ```ignore
/// let x: f64 = ctx.arg(0)?;
/// let y: f64 = ctx.arg(1)?;
/// ctx.set_return(x + y)?;
/// ```
pub struct CallContext<'vm> {
    slots: &'vm mut [Slot],
    heap: &'vm mut ForeignHeap,
    is_static: bool,
}

impl<'vm> CallContext<'vm> {
    /// Create a new call context.
    ///
    /// * `slots` - The API slots, receiver first
    /// * `heap` - Storage for foreign instances
    /// * `is_static` - Whether the call targets a static member
    pub fn new(slots: &'vm mut [Slot], heap: &'vm mut ForeignHeap, is_static: bool) -> Self {
        Self {
            slots,
            heap,
            is_static,
        }
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Number of arguments, excluding the receiver slot.
    pub fn arg_count(&self) -> usize {
        self.slots.len().saturating_sub(1)
    }

    /// Raw access to an argument slot.
    pub fn arg_slot(&self, index: usize) -> Result<&Slot, NativeError> {
        self.slots
            .get(index + 1)
            .ok_or(NativeError::ArgumentIndexOutOfBounds {
                index,
                count: self.arg_count(),
            })
    }

    /// Read a typed argument.
    ///
    /// A slot of the wrong kind yields [`NativeError::ArgumentKindMismatch`].
    pub fn arg<T: FromSlot>(&self, index: usize) -> Result<T, NativeError> {
        let slot = self.arg_slot(index)?;
        T::from_slot(slot, self.heap).map_err(|err| NativeError::for_argument(index, err))
    }

    /// Write a raw value into the result slot.
    pub fn set_return_slot(&mut self, slot: Slot) -> Result<(), NativeError> {
        match self.slots.first_mut() {
            Some(result) => {
                *result = slot;
                Ok(())
            }
            None => Err(NativeError::other("call context has no result slot")),
        }
    }

    /// Write a typed value into the result slot.
    pub fn set_return<T: IntoSlot>(&mut self, value: T) -> Result<(), NativeError> {
        let slot = value.into_slot(self.heap);
        self.set_return_slot(slot)
    }

    /// Current value of the result slot.
    pub fn result(&self) -> Option<&Slot> {
        self.slots.first()
    }

    /// Move a new foreign instance into the heap and bind it to slot 0.
    pub fn set_new_foreign<T: Any + Send + Sync>(
        &mut self,
        value: T,
    ) -> Result<ForeignHandle, NativeError> {
        self.set_new_foreign_boxed(TypeId::of::<T>(), Box::new(value))
    }

    /// Boxed variant of [`CallContext::set_new_foreign`].
    pub fn set_new_foreign_boxed(
        &mut self,
        type_id: TypeId,
        value: Box<dyn Any + Send + Sync>,
    ) -> Result<ForeignHandle, NativeError> {
        if self.slots.is_empty() {
            return Err(NativeError::other("call context has no result slot"));
        }
        let handle = self.heap.allocate_boxed(type_id, value);
        self.slots[0] = Slot::Foreign(handle);
        Ok(handle)
    }

    fn receiver(&self) -> Result<ForeignHandle, NativeError> {
        match self.slots.first() {
            Some(Slot::Foreign(handle)) => Ok(*handle),
            Some(other) => Err(NativeError::invalid_this(format!(
                "expected foreign receiver, got {}",
                other.type_name()
            ))),
            None => Err(NativeError::invalid_this("no slots available")),
        }
    }

    /// Borrow the receiver in slot 0.
    pub fn this<T: Any>(&self) -> Result<&T, NativeError> {
        let handle = self.receiver()?;
        self.heap.get::<T>(handle).ok_or_else(|| {
            NativeError::invalid_this(format!(
                "stale handle or receiver is not a {}",
                type_name::<T>()
            ))
        })
    }

    /// Mutably borrow the receiver in slot 0.
    pub fn this_mut<T: Any>(&mut self) -> Result<&mut T, NativeError> {
        let handle = self.receiver()?;
        self.heap.get_mut::<T>(handle).ok_or_else(|| {
            NativeError::invalid_this(format!(
                "stale handle or receiver is not a {}",
                type_name::<T>()
            ))
        })
    }

    pub fn heap(&self) -> &ForeignHeap {
        self.heap
    }

    pub fn heap_mut(&mut self) -> &mut ForeignHeap {
        self.heap
    }
}

impl fmt::Debug for CallContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("arg_count", &self.arg_count())
            .field("is_static", &self.is_static)
            .finish()
    }
}
