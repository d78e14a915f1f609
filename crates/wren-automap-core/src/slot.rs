//! Slot values exchanged with the VM.

use std::fmt;

use crate::heap::ForeignHandle;

/// The kinds of value a slot can hold.
///
/// This is the fixed kind lookup used when marshalling: every host parameter
/// type maps onto exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Null,
    Bool,
    Num,
    String,
    Foreign,
}

impl SlotKind {
    /// Name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            SlotKind::Null => "Null",
            SlotKind::Bool => "Bool",
            SlotKind::Num => "Num",
            SlotKind::String => "String",
            SlotKind::Foreign => "Foreign",
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value in one of the VM's API slots.
///
/// Wren has a single number type, so every numeric host type travels as
/// `Num(f64)`. Foreign instances live in the [`ForeignHeap`](crate::ForeignHeap)
/// and slots only carry their handle.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Slot {
    #[default]
    Null,
    Bool(bool),
    Num(f64),
    String(String),
    Foreign(ForeignHandle),
}

impl Slot {
    /// Kind of the value held in this slot.
    pub fn kind(&self) -> SlotKind {
        match self {
            Slot::Null => SlotKind::Null,
            Slot::Bool(_) => SlotKind::Bool,
            Slot::Num(_) => SlotKind::Num,
            Slot::String(_) => SlotKind::String,
            Slot::Foreign(_) => SlotKind::Foreign,
        }
    }

    /// Human-readable name of the slot's kind.
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Slot::Null)
    }

    /// Foreign handle held by this slot, if any.
    pub fn as_foreign(&self) -> Option<ForeignHandle> {
        match self {
            Slot::Foreign(handle) => Some(*handle),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_kinds() {
        assert_eq!(Slot::Null.kind(), SlotKind::Null);
        assert_eq!(Slot::Bool(true).kind(), SlotKind::Bool);
        assert_eq!(Slot::Num(1.0).kind(), SlotKind::Num);
        assert_eq!(Slot::String("x".into()).kind(), SlotKind::String);
    }

    #[test]
    fn slot_type_names() {
        assert_eq!(Slot::Null.type_name(), "Null");
        assert_eq!(Slot::Num(0.0).type_name(), "Num");
        assert_eq!(SlotKind::Foreign.to_string(), "Foreign");
    }

    #[test]
    fn default_slot_is_null() {
        assert!(Slot::default().is_null());
        assert!(Slot::Num(0.0).as_foreign().is_none());
    }
}
