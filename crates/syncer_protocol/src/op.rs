//! JSON Patch operation kinds.

use json_patch::PatchOperation;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A routable JSON Patch operation.
///
/// Only the operations the server ever emits are routable. Each kind is a
/// single bit so that sets of kinds can be built with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PatchOp {
    /// A value was added.
    Add = 1,
    /// A value was removed.
    Remove = 2,
    /// A value was replaced.
    Replace = 4,
}

impl PatchOp {
    /// Returns the bit for this operation.
    pub fn bit(self) -> u8 {
        self as u8
    }

    /// Returns the kind of a decoded patch operation.
    ///
    /// Returns `None` for move, copy and test.
    pub fn from_operation(op: &PatchOperation) -> Option<Self> {
        match op {
            PatchOperation::Add(_) => Some(PatchOp::Add),
            PatchOperation::Remove(_) => Some(PatchOp::Remove),
            PatchOperation::Replace(_) => Some(PatchOp::Replace),
            _ => None,
        }
    }

    /// Returns the RFC 6902 name of the operation.
    pub fn as_str(self) -> &'static str {
        match self {
            PatchOp::Add => "add",
            PatchOp::Remove => "remove",
            PatchOp::Replace => "replace",
        }
    }
}

impl fmt::Display for PatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of [`PatchOp`]s, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PatchOpSet(u8);

impl PatchOpSet {
    /// The empty set.
    pub const NONE: Self = Self(0);
    /// Add only.
    pub const ADD: Self = Self(PatchOp::Add as u8);
    /// Remove only.
    pub const REMOVE: Self = Self(PatchOp::Remove as u8);
    /// Replace only.
    pub const REPLACE: Self = Self(PatchOp::Replace as u8);
    /// Any of add, remove and replace.
    pub const ANY: Self = Self(PatchOp::Add as u8 | PatchOp::Remove as u8 | PatchOp::Replace as u8);

    /// Creates a set from raw bits, ignoring unknown bits.
    pub fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::ANY.0)
    }

    /// Returns the raw bits.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if the set contains `op`.
    pub fn contains(self, op: PatchOp) -> bool {
        self.0 & op.bit() != 0
    }

    /// Returns true if the set is empty.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<PatchOp> for PatchOpSet {
    fn from(op: PatchOp) -> Self {
        Self(op.bit())
    }
}

impl BitOr for PatchOpSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOr<PatchOp> for PatchOpSet {
    type Output = Self;

    fn bitor(self, rhs: PatchOp) -> Self {
        Self(self.0 | rhs.bit())
    }
}

impl BitOr for PatchOp {
    type Output = PatchOpSet;

    fn bitor(self, rhs: Self) -> PatchOpSet {
        PatchOpSet(self.bit() | rhs.bit())
    }
}

impl BitOrAssign for PatchOpSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitOrAssign<PatchOp> for PatchOpSet {
    fn bitor_assign(&mut self, rhs: PatchOp) {
        self.0 |= rhs.bit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn op_bits_match_wire_values() {
        assert_eq!(PatchOp::Add.bit(), 1);
        assert_eq!(PatchOp::Remove.bit(), 2);
        assert_eq!(PatchOp::Replace.bit(), 4);
        assert_eq!(PatchOpSet::ANY.bits(), 7);
    }

    #[test]
    fn set_membership() {
        let set = PatchOp::Add | PatchOp::Replace;
        assert!(set.contains(PatchOp::Add));
        assert!(set.contains(PatchOp::Replace));
        assert!(!set.contains(PatchOp::Remove));

        let mut set = PatchOpSet::NONE;
        assert!(set.is_empty());
        set |= PatchOp::Remove;
        assert!(set.contains(PatchOp::Remove));
        assert_eq!(set, PatchOpSet::REMOVE);
        assert_eq!(set | PatchOpSet::ADD | PatchOp::Replace, PatchOpSet::ANY);
    }

    #[test]
    fn truncate_drops_unknown_bits() {
        assert_eq!(PatchOpSet::from_bits_truncate(0xff), PatchOpSet::ANY);
        assert_eq!(PatchOpSet::from_bits_truncate(0x08), PatchOpSet::NONE);
    }

    #[test]
    fn kind_of_decoded_operations() {
        let patch: json_patch::Patch = serde_json::from_value(json!([
            {"op": "add", "path": "/a", "value": 1},
            {"op": "remove", "path": "/b"},
            {"op": "replace", "path": "/c", "value": 2},
            {"op": "move", "from": "/c", "path": "/d"},
        ]))
        .unwrap();
        let kinds: Vec<_> = patch.0.iter().map(PatchOp::from_operation).collect();
        assert_eq!(
            kinds,
            vec![
                Some(PatchOp::Add),
                Some(PatchOp::Remove),
                Some(PatchOp::Replace),
                None
            ]
        );
    }
}
