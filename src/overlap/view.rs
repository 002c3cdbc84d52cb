//! Per-partition index sets handed to a scheduler.
//!
//! A [`PartitionView`] describes, for one partition, which global element ids
//! it owns privately, which it owns but shares, which it sees as ghosts, and
//! which interior faces it computes. Every list is sorted ascending.

use crate::overlap::role::{AccessMode, Role};
use crate::topology::{ElementId, FaceId, PartitionId};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionView {
    pub part: PartitionId,
    pub private: Vec<ElementId>,
    pub shared: Vec<ElementId>,
    pub ghost: Vec<ElementId>,
    /// Faces whose left element this partition owns.
    pub faces: Vec<FaceId>,
}

/// Which index set a [`Region`] refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionKind {
    Faces,
    Private,
    Shared,
    Ghost,
}

/// An index set plus the privilege a task needs on it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Region<'a> {
    pub kind: RegionKind,
    pub indices: &'a [usize],
    pub mode: AccessMode,
}

impl PartitionView {
    /// private ∪ shared, sorted.
    pub fn owned(&self) -> Vec<ElementId> {
        self.private
            .iter()
            .copied()
            .merge(self.shared.iter().copied())
            .collect()
    }

    /// owned ∪ ghost, sorted.
    pub fn owned_with_halo(&self) -> Vec<ElementId> {
        self.owned()
            .into_iter()
            .merge(self.ghost.iter().copied())
            .collect()
    }

    #[inline]
    pub fn n_owned(&self) -> usize {
        self.private.len() + self.shared.len()
    }

    /// Role of `e` in this partition, or `None` if `e` is not visible here.
    pub fn role_of(&self, e: ElementId) -> Option<Role> {
        if self.private.binary_search(&e).is_ok() {
            Some(Role::Private)
        } else if self.shared.binary_search(&e).is_ok() {
            Some(Role::Shared)
        } else if self.ghost.binary_search(&e).is_ok() {
            Some(Role::Ghost)
        } else {
            None
        }
    }

    /// Regions a face-accumulation task for this partition touches.
    pub fn regions(&self) -> [Region<'_>; 4] {
        [
            Region {
                kind: RegionKind::Faces,
                indices: &self.faces,
                mode: AccessMode::ReadOnly,
            },
            Region {
                kind: RegionKind::Private,
                indices: &self.private,
                mode: Role::Private.access_mode(),
            },
            Region {
                kind: RegionKind::Shared,
                indices: &self.shared,
                mode: Role::Shared.access_mode(),
            },
            Region {
                kind: RegionKind::Ghost,
                indices: &self.ghost,
                mode: Role::Ghost.access_mode(),
            },
        ]
    }
}
