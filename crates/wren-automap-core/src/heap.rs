//! Generational storage for foreign instances.

use std::any::{Any, TypeId};
use std::fmt;

/// Handle to a foreign instance owned by a [`ForeignHeap`].
///
/// Handles are copyable and never dereferenced directly; the generation lets
/// the heap reject handles to freed instances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ForeignHandle {
    /// Index into ForeignHeap.slots
    pub index: u32,
    /// Generation for use-after-free detection
    pub generation: u32,
    /// Rust TypeId of the stored instance
    pub type_id: TypeId,
}

impl ForeignHandle {
    pub fn new(index: u32, generation: u32, type_id: TypeId) -> Self {
        Self {
            index,
            generation,
            type_id,
        }
    }

    /// Whether this handle was created for a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

/// Host-side storage for the instances behind foreign objects.
///
/// The VM owns one heap per engine. Allocators place new instances here and
/// the engine's collector hands them back through [`ForeignHeap::take`] before
/// running a finalizer.
#[derive(Default)]
pub struct ForeignHeap {
    slots: Vec<HeapSlot>,
    free_list: Vec<u32>,
}

struct HeapSlot {
    generation: u32,
    value: Option<Box<dyn Any + Send + Sync>>,
}

impl ForeignHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new instance and return its handle.
    pub fn allocate<T: Any + Send + Sync>(&mut self, value: T) -> ForeignHandle {
        self.allocate_boxed(TypeId::of::<T>(), Box::new(value))
    }

    /// Store an already boxed instance.
    pub fn allocate_boxed(
        &mut self,
        type_id: TypeId,
        boxed: Box<dyn Any + Send + Sync>,
    ) -> ForeignHandle {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(boxed);
            ForeignHandle::new(index, slot.generation, type_id)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(HeapSlot {
                generation: 0,
                value: Some(boxed),
            });
            ForeignHandle::new(index, 0, type_id)
        }
    }

    /// Borrow an instance.
    ///
    /// Returns None if the handle is stale or the type doesn't match.
    pub fn get<T: Any>(&self, handle: ForeignHandle) -> Option<&T> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_ref()?.downcast_ref::<T>()
    }

    /// Mutably borrow an instance.
    ///
    /// Returns None if the handle is stale or the type doesn't match.
    pub fn get_mut<T: Any>(&mut self, handle: ForeignHandle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_mut()?.downcast_mut::<T>()
    }

    /// Whether the handle still refers to a live instance.
    pub fn contains(&self, handle: ForeignHandle) -> bool {
        self.slots
            .get(handle.index as usize)
            .is_some_and(|slot| slot.generation == handle.generation && slot.value.is_some())
    }

    /// Remove an instance, invalidating every copy of its handle.
    pub fn take(&mut self, handle: ForeignHandle) -> Option<Box<dyn Any + Send + Sync>> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index);
        Some(value)
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ForeignHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignHeap")
            .field("live", &self.len())
            .field("capacity", &self.slots.len())
            .finish()
    }
}
