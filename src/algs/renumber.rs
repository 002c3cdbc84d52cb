//! Element reindexing that clusters elements by partition and ghost mask.
//!
//! Sorting by `(partition, mask, id)` places every element with the same
//! ghost-visibility pattern in one contiguous range, so an accumulator needs
//! one reduction target per distinct `(partition, mask)` group instead of
//! one per element.

use crate::mesh_error::MeshHaloError;
use crate::overlap::{Classification, GhostMask, classify};
use crate::topology::{ElementId, InteriorFace, MeshAdjacency, PartitionAssignment, PartitionId};
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Bijection on element ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permutation {
    new_to_old: Vec<ElementId>,
    old_to_new: Vec<ElementId>,
}

impl Permutation {
    pub fn identity(n: usize) -> Self {
        Self {
            new_to_old: (0..n).collect(),
            old_to_new: (0..n).collect(),
        }
    }

    /// Build from the new order: entry `i` is the old id of new element `i`.
    ///
    /// # Errors
    /// [`MeshHaloError::InvalidPermutation`] unless `new_to_old` is a
    /// permutation of `0..new_to_old.len()`.
    pub fn from_new_to_old(new_to_old: Vec<ElementId>) -> Result<Self, MeshHaloError> {
        let n = new_to_old.len();
        let mut old_to_new = vec![usize::MAX; n];
        for (new, &old) in new_to_old.iter().enumerate() {
            if old >= n {
                return Err(MeshHaloError::InvalidPermutation(format!(
                    "unknown element {old} (expected ids below {n})"
                )));
            }
            if old_to_new[old] != usize::MAX {
                return Err(MeshHaloError::InvalidPermutation(format!(
                    "duplicate element {old}"
                )));
            }
            old_to_new[old] = new;
        }
        Ok(Self {
            new_to_old,
            old_to_new,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.new_to_old.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.new_to_old.is_empty()
    }

    #[inline]
    pub fn new_id(&self, old: ElementId) -> ElementId {
        self.old_to_new[old]
    }

    #[inline]
    pub fn old_id(&self, new: ElementId) -> ElementId {
        self.new_to_old[new]
    }

    pub fn new_to_old(&self) -> &[ElementId] {
        &self.new_to_old
    }

    pub fn old_to_new(&self) -> &[ElementId] {
        &self.old_to_new
    }

    pub fn is_identity(&self) -> bool {
        self.new_to_old.iter().enumerate().all(|(i, &o)| i == o)
    }

    pub fn inverse(&self) -> Self {
        Self {
            new_to_old: self.old_to_new.clone(),
            old_to_new: self.new_to_old.clone(),
        }
    }

    /// `self` followed by `next`: maps an original id to `next.new_id(self.new_id(id))`.
    pub fn then(&self, next: &Permutation) -> Result<Self, MeshHaloError> {
        self.check_len(next.len())?;
        Self::from_new_to_old(
            next.new_to_old
                .iter()
                .map(|&mid| self.new_to_old[mid])
                .collect(),
        )
    }

    fn check_len(&self, n: usize) -> Result<(), MeshHaloError> {
        if n != self.len() {
            return Err(MeshHaloError::InvalidPermutation(format!(
                "permutation covers {} elements, mesh has {n}",
                self.len()
            )));
        }
        Ok(())
    }

    /// Relabel `adj` old→new: the partition of new element `i` is the
    /// partition of old element `old_id(i)`; every face keeps its id and its
    /// left/right orientation.
    pub fn relabel(&self, adj: &MeshAdjacency) -> Result<MeshAdjacency, MeshHaloError> {
        self.check_len(adj.n_elements())?;
        let parts: Vec<PartitionId> = self
            .new_to_old
            .iter()
            .map(|&old| adj.partition_of(old))
            .collect();
        let faces = adj
            .faces()
            .iter()
            .map(|f| InteriorFace::new(self.old_to_new[f.left], self.old_to_new[f.right]))
            .collect();
        MeshAdjacency::try_new(adj.n_elements(), &PartitionAssignment::new(parts), faces)
    }

    /// Reorder row-major per-element data (`width` values per element) into
    /// the new numbering.
    pub fn permute_rows<T: Clone>(&self, rows: &[T], width: usize) -> Result<Vec<T>, MeshHaloError> {
        if rows.len() != self.len() * width {
            return Err(MeshHaloError::WidthMismatch {
                expected: self.len() * width,
                found: rows.len(),
            });
        }
        let mut out = Vec::with_capacity(rows.len());
        for &old in &self.new_to_old {
            out.extend_from_slice(&rows[old * width..(old + 1) * width]);
        }
        Ok(out)
    }
}

/// Order elements by `(partition, mask as unsigned integer, original id)`.
///
/// Reindexing an already ordered mesh yields the identity.
pub fn reindex(
    partition_of: &[PartitionId],
    masks: &[GhostMask],
) -> Result<Permutation, MeshHaloError> {
    if partition_of.len() != masks.len() {
        return Err(MeshHaloError::InvalidPermutation(format!(
            "{} partition ids but {} masks",
            partition_of.len(),
            masks.len()
        )));
    }
    let mut order: Vec<ElementId> = (0..partition_of.len()).collect();
    order.sort_unstable_by_key(|&e| (partition_of[e], masks[e], e));
    Permutation::from_new_to_old(order)
}

/// Outcome of [`reindex_classified`].
#[derive(Clone, Debug)]
pub struct Reindexed {
    pub permutation: Permutation,
    pub adjacency: MeshAdjacency,
    pub classification: Classification,
}

/// Reindex `adj`, relabel it and classify again with the same partition count.
pub fn reindex_classified(
    adj: &MeshAdjacency,
    classification: &Classification,
) -> Result<Reindexed, MeshHaloError> {
    classification.ensure_matches(adj)?;
    let permutation = reindex(adj.partitions(), classification.masks())?;
    if permutation.is_identity() {
        log::debug!("reindex: mesh already ordered");
        return Ok(Reindexed {
            permutation,
            adjacency: adj.clone(),
            classification: classification.clone(),
        });
    }
    let adjacency = permutation.relabel(adj)?;
    let classification = classify(&adjacency, classification.n_parts())?;
    log::debug!(
        "reindex: {} elements moved",
        permutation
            .new_to_old()
            .iter()
            .enumerate()
            .filter(|&(i, &o)| i != o)
            .count()
    );
    Ok(Reindexed {
        permutation,
        adjacency,
        classification,
    })
}

/// A maximal run of consecutive element ids with one `(partition, mask)` key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReductionGroup {
    pub part: PartitionId,
    pub mask: GhostMask,
    pub range: Range<ElementId>,
}

/// Runs of equal `(partition, mask)` keys in element-id order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReductionGroups {
    groups: Vec<ReductionGroup>,
    distinct_keys: usize,
}

impl ReductionGroups {
    pub fn from_classification(c: &Classification) -> Self {
        let mut groups: Vec<ReductionGroup> = Vec::new();
        let mut keys = HashSet::new();
        for e in 0..c.n_elements() {
            let (part, mask) = (c.partition_of(e), c.mask(e));
            keys.insert((part, mask));
            match groups.last_mut() {
                Some(g) if g.part == part && g.mask == mask => g.range.end = e + 1,
                _ => groups.push(ReductionGroup {
                    part,
                    mask,
                    range: e..e + 1,
                }),
            }
        }
        Self {
            groups,
            distinct_keys: keys.len(),
        }
    }

    pub fn groups(&self) -> &[ReductionGroup] {
        &self.groups
    }

    /// Number of runs.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn distinct_keys(&self) -> usize {
        self.distinct_keys
    }

    /// Runs whose elements are visible to other partitions.
    pub fn boundary_groups(&self) -> impl Iterator<Item = &ReductionGroup> {
        self.groups.iter().filter(|g| !g.mask.is_empty())
    }

    /// True if every key occupies exactly one run.
    pub fn is_contiguous(&self) -> bool {
        self.groups.len() == self.distinct_keys
    }
}
