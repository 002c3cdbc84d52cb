//! Element roles relative to a partition, and the access mode each implies.

use serde::{Deserialize, Serialize};

/// Role of an element as seen from one partition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Owned by the partition and referenced by no other partition.
    Private,
    /// Owned by the partition and referenced by at least one other partition.
    Shared,
    /// Owned by another partition, visible through an interior face.
    Ghost,
}

impl Role {
    /// Access a task needs on the element's accumulation slot.
    #[inline]
    pub const fn access_mode(self) -> AccessMode {
        match self {
            Role::Private => AccessMode::ReadWrite,
            Role::Shared | Role::Ghost => AccessMode::Reduce,
        }
    }

    /// True if contributions go through the reduction operator.
    #[inline]
    pub const fn is_reduced(self) -> bool {
        matches!(self.access_mode(), AccessMode::Reduce)
    }
}

/// Privilege a scheduler must grant a per-partition task on a region.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessMode {
    ReadOnly,
    /// Exclusive read/write; no other task touches the region.
    ReadWrite,
    /// Concurrent associative/commutative reduction only.
    Reduce,
}

/// Roles of both endpoints of an interior face, relative to the face owner.
///
/// The owner is the partition of the left element, so `left` is never
/// [`Role::Ghost`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceRoles {
    pub left: Role,
    pub right: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_private_is_exclusive() {
        assert_eq!(Role::Private.access_mode(), AccessMode::ReadWrite);
        assert!(!Role::Private.is_reduced());
        assert!(Role::Shared.is_reduced());
        assert!(Role::Ghost.is_reduced());
    }
}
