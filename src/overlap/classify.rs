//! Halo/ghost classification of a partitioned mesh.
//!
//! For every partition `p`:
//! 1. owned(p) = `{e : partition_of(e) == p}`.
//! 2. every interior face `(l, r)` crossing partitions makes `l` visible to
//!    `partition_of(r)` and `r` visible to `partition_of(l)`; both become
//!    shared in their own partition.
//! 3. ghost(p) = elements visible to `p` that `p` does not own.
//! 4. private(p) = owned(p) \ shared(p).
//!
//! Roles are computed once and stored; they are invalid as soon as the mesh
//! or the partition count changes.

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshHaloError;
use crate::overlap::mask::{GhostMask, check_capacity};
use crate::overlap::role::{FaceRoles, Role};
use crate::overlap::summary::{PartCounts, PartitionSummary};
use crate::overlap::view::PartitionView;
use crate::topology::{ElementId, FaceId, MeshAdjacency, PartitionId};
use rayon::prelude::*;

/// Result of [`classify`]: per-element masks, per-face roles and per-partition views.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    n_parts: usize,
    partition_of: Vec<PartitionId>,
    masks: Vec<GhostMask>,
    face_owner: Vec<PartitionId>,
    face_roles: Vec<FaceRoles>,
    views: Vec<PartitionView>,
}

/// Reject partition counts before any classification work starts.
pub fn check_partition_count(n_parts: usize) -> Result<(), MeshHaloError> {
    if n_parts == 0 {
        return Err(MeshHaloError::InvalidConfig(
            "partition count must be at least 1".into(),
        ));
    }
    check_capacity(n_parts)
}

/// Classify every element of `adj` for `n_parts` partitions.
///
/// # Errors
/// - [`MeshHaloError::PartitionCountExceedsCapacity`] if `n_parts` does not fit
///   in a [`GhostMask`]; checked before anything else.
/// - [`MeshHaloError::InvalidConfig`] if `n_parts == 0`.
/// - [`MeshHaloError::PartitionOutOfRange`] if an element is assigned to a
///   partition `>= n_parts`.
pub fn classify(adj: &MeshAdjacency, n_parts: usize) -> Result<Classification, MeshHaloError> {
    check_partition_count(n_parts)?;
    let partition_of = adj.partitions();
    if let Some((element, &partition)) = partition_of
        .iter()
        .enumerate()
        .find(|&(_, &p)| p >= n_parts)
    {
        return Err(MeshHaloError::PartitionOutOfRange {
            element,
            partition,
            n_parts,
        });
    }

    let n = adj.n_elements();
    let mut masks = vec![GhostMask::EMPTY; n];
    for face in adj.faces() {
        let (pl, pr) = (partition_of[face.left], partition_of[face.right]);
        if pl != pr {
            masks[face.left].insert(pr);
            masks[face.right].insert(pl);
        }
    }

    let role_in_owner = |e: ElementId| {
        if masks[e].is_empty() {
            Role::Private
        } else {
            Role::Shared
        }
    };

    let mut face_owner = Vec::with_capacity(adj.n_faces());
    let mut face_roles = Vec::with_capacity(adj.n_faces());
    let mut faces_by_part: Vec<Vec<FaceId>> = vec![Vec::new(); n_parts];
    for (f, face) in adj.faces().iter().enumerate() {
        let (pl, pr) = (partition_of[face.left], partition_of[face.right]);
        face_owner.push(pl);
        faces_by_part[pl].push(f);
        let right = if pl != pr {
            Role::Ghost
        } else {
            role_in_owner(face.right)
        };
        face_roles.push(FaceRoles {
            left: role_in_owner(face.left),
            right,
        });
    }

    let mut owned_by: Vec<Vec<ElementId>> = vec![Vec::new(); n_parts];
    let mut ghost_by: Vec<Vec<ElementId>> = vec![Vec::new(); n_parts];
    for (e, &p) in partition_of.iter().enumerate() {
        owned_by[p].push(e);
        for k in masks[e].iter() {
            ghost_by[k].push(e);
        }
    }

    // one task per partition
    let views: Vec<PartitionView> = owned_by
        .into_par_iter()
        .zip(ghost_by)
        .zip(faces_by_part)
        .enumerate()
        .map(|(part, ((owned, ghost), faces))| {
            let (shared, private): (Vec<_>, Vec<_>) =
                owned.into_iter().partition(|&e| !masks[e].is_empty());
            PartitionView {
                part,
                private,
                shared,
                ghost,
                faces,
            }
        })
        .collect();

    let c = Classification {
        n_parts,
        partition_of: partition_of.to_vec(),
        masks,
        face_owner,
        face_roles,
        views,
    };
    c.debug_assert_invariants();
    log::info!("classified mesh:\n{}", c.summary());
    Ok(c)
}

impl Classification {
    #[inline]
    pub fn n_parts(&self) -> usize {
        self.n_parts
    }

    #[inline]
    pub fn n_elements(&self) -> usize {
        self.partition_of.len()
    }

    #[inline]
    pub fn n_faces(&self) -> usize {
        self.face_roles.len()
    }

    #[inline]
    pub fn partition_of(&self, e: ElementId) -> PartitionId {
        self.partition_of[e]
    }

    /// Ghost mask of `e`.
    #[inline]
    pub fn mask(&self, e: ElementId) -> GhostMask {
        self.masks[e]
    }

    #[inline]
    pub fn masks(&self) -> &[GhostMask] {
        &self.masks
    }

    /// True if `e` is shared by its owner (visible to another partition).
    #[inline]
    pub fn is_shared(&self, e: ElementId) -> bool {
        !self.masks[e].is_empty()
    }

    /// Role of `e` in its owning partition (never [`Role::Ghost`]).
    #[inline]
    pub fn owner_role(&self, e: ElementId) -> Role {
        if self.is_shared(e) {
            Role::Shared
        } else {
            Role::Private
        }
    }

    /// Role of `e` relative to partition `p`, or `None` if `p` cannot see `e`.
    pub fn role_of(&self, e: ElementId, p: PartitionId) -> Option<Role> {
        if self.partition_of[e] == p {
            Some(self.owner_role(e))
        } else if self.masks[e].contains(p) {
            Some(Role::Ghost)
        } else {
            None
        }
    }

    pub fn view(&self, p: PartitionId) -> Option<&PartitionView> {
        self.views.get(p)
    }

    pub fn views(&self) -> &[PartitionView] {
        &self.views
    }

    /// Partition computing face `f` (the owner of its left element).
    #[inline]
    pub fn face_owner(&self, f: FaceId) -> PartitionId {
        self.face_owner[f]
    }

    #[inline]
    pub fn face_roles(&self, f: FaceId) -> FaceRoles {
        self.face_roles[f]
    }

    /// Partitions that see `e` as a ghost.
    pub fn sharing_partitions(&self, e: ElementId) -> Vec<PartitionId> {
        self.masks[e].iter().collect()
    }

    /// Shared elements of `p` with the partitions each one is visible to.
    pub fn shared_report(&self, p: PartitionId) -> Vec<(ElementId, Vec<PartitionId>)> {
        self.report(p, |v| &v.shared)
    }

    /// Ghost elements of `p` with every partition each one is a ghost for.
    pub fn ghost_report(&self, p: PartitionId) -> Vec<(ElementId, Vec<PartitionId>)> {
        self.report(p, |v| &v.ghost)
    }

    fn report<F>(&self, p: PartitionId, pick: F) -> Vec<(ElementId, Vec<PartitionId>)>
    where
        F: Fn(&PartitionView) -> &Vec<ElementId>,
    {
        self.views
            .get(p)
            .map(|v| {
                pick(v)
                    .iter()
                    .map(|&e| (e, self.sharing_partitions(e)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fail with [`MeshHaloError::StaleClassification`] unless this
    /// classification was computed from `adj`'s elements, faces and assignment.
    pub fn ensure_matches(&self, adj: &MeshAdjacency) -> Result<(), MeshHaloError> {
        let same_faces = adj
            .faces()
            .iter()
            .zip(&self.face_owner)
            .all(|(face, &owner)| self.partition_of.get(face.left) == Some(&owner));
        if adj.n_elements() != self.n_elements()
            || adj.n_faces() != self.n_faces()
            || adj.partitions() != self.partition_of.as_slice()
            || !same_faces
        {
            return Err(MeshHaloError::StaleClassification {
                expected_elements: self.n_elements(),
                expected_faces: self.n_faces(),
                found_elements: adj.n_elements(),
                found_faces: adj.n_faces(),
            });
        }
        Ok(())
    }

    /// Element and face counts per partition.
    pub fn summary(&self) -> PartitionSummary {
        PartitionSummary {
            n_elements: self.n_elements(),
            n_faces: self.n_faces(),
            parts: self
                .views
                .iter()
                .map(|v| PartCounts {
                    part: v.part,
                    owned: v.n_owned(),
                    private: v.private.len(),
                    shared: v.shared.len(),
                    ghost: v.ghost.len(),
                    faces: v.faces.len(),
                })
                .collect(),
        }
    }
}

impl DebugInvariants for Classification {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Classification");
    }

    fn validate_invariants(&self) -> Result<(), MeshHaloError> {
        crate::ensure_invariant!(
            self.views.len() == self.n_parts,
            "{} views for {} partitions",
            self.views.len(),
            self.n_parts
        );
        let mut owned_total = 0;
        let mut ghost_total = 0;
        for v in &self.views {
            let p = v.part;
            for list in [&v.private, &v.shared, &v.ghost, &v.faces] {
                crate::ensure_invariant!(
                    list.windows(2).all(|w| w[0] < w[1]),
                    "partition {p}: index set not strictly sorted"
                );
            }
            for &e in &v.private {
                crate::ensure_invariant!(
                    self.partition_of[e] == p && self.masks[e].is_empty(),
                    "partition {p}: private element {e} is foreign or masked"
                );
            }
            for &e in &v.shared {
                crate::ensure_invariant!(
                    self.partition_of[e] == p && !self.masks[e].is_empty(),
                    "partition {p}: shared element {e} is foreign or unmasked"
                );
            }
            for &e in &v.ghost {
                crate::ensure_invariant!(
                    self.partition_of[e] != p && self.masks[e].contains(p),
                    "partition {p}: ghost element {e} is owned locally or lacks bit {p}"
                );
            }
            for &f in &v.faces {
                crate::ensure_invariant!(
                    self.face_owner[f] == p && self.face_roles[f].left != Role::Ghost,
                    "partition {p}: face {f} has a foreign or ghost left element"
                );
            }
            owned_total += v.n_owned();
            ghost_total += v.ghost.len();
        }
        crate::ensure_invariant!(
            owned_total == self.n_elements(),
            "owned sets cover {owned_total} of {} elements",
            self.n_elements()
        );
        let mask_bits: usize = self.masks.iter().map(GhostMask::count).sum();
        crate::ensure_invariant!(
            mask_bits == ghost_total,
            "{mask_bits} mask bits but {ghost_total} ghost entries"
        );
        Ok(())
    }
}
