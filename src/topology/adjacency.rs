//! Element adjacency and partition assignment.
//!
//! [`MeshAdjacency`] is the read-only arena the classifier and accumulator work
//! over: elements and interior faces are addressed by dense ids, and the
//! element→face reverse map is stored in CSR form.

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshHaloError;
use crate::topology::{ElementId, FaceId, PartitionId};
use serde::{Deserialize, Serialize};

/// Sentinel partition id for an element the partitioner did not assign.
pub const UNASSIGNED: PartitionId = PartitionId::MAX;

/// Element → partition map produced by an external partitioner.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionAssignment {
    parts: Vec<PartitionId>,
}

impl PartitionAssignment {
    pub fn new(parts: Vec<PartitionId>) -> Self {
        Self { parts }
    }

    /// Build from raw partitioner output; negative ids mean "unassigned".
    pub fn from_raw(raw: &[i64]) -> Self {
        let parts = raw
            .iter()
            .map(|&p| {
                if p < 0 {
                    UNASSIGNED
                } else {
                    p as PartitionId
                }
            })
            .collect();
        Self { parts }
    }

    /// Assignment with every one of `n_elements` elements in partition 0.
    pub fn single(n_elements: usize) -> Self {
        Self {
            parts: vec![0; n_elements],
        }
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Partition of `e`, or `None` if `e` is out of range or unassigned.
    pub fn get(&self, e: ElementId) -> Option<PartitionId> {
        self.parts.get(e).copied().filter(|&p| p != UNASSIGNED)
    }

    /// Mark `e` as unassigned.
    pub fn unassign(&mut self, e: ElementId) {
        if let Some(p) = self.parts.get_mut(e) {
            *p = UNASSIGNED;
        }
    }

    pub fn as_slice(&self) -> &[PartitionId] {
        &self.parts
    }

    /// One past the largest assigned partition id (0 when nothing is assigned).
    pub fn n_parts(&self) -> usize {
        self.parts
            .iter()
            .filter(|&&p| p != UNASSIGNED)
            .max()
            .map_or(0, |&p| p + 1)
    }

    /// Number of elements per partition for `n_parts` partitions.
    ///
    /// Ids `>= n_parts` and unassigned entries are not counted.
    pub fn part_sizes(&self, n_parts: usize) -> Vec<usize> {
        let mut sizes = vec![0; n_parts];
        for &p in &self.parts {
            if p < n_parts {
                sizes[p] += 1;
            }
        }
        sizes
    }
}

impl From<Vec<PartitionId>> for PartitionAssignment {
    fn from(parts: Vec<PartitionId>) -> Self {
        Self::new(parts)
    }
}

/// An interior face between two distinct elements.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InteriorFace {
    pub left: ElementId,
    pub right: ElementId,
}

impl InteriorFace {
    #[inline]
    pub const fn new(left: ElementId, right: ElementId) -> Self {
        Self { left, right }
    }

    #[inline]
    pub const fn endpoints(&self) -> [ElementId; 2] {
        [self.left, self.right]
    }

    /// The endpoint opposite to `e`, if `e` is an endpoint of this face.
    #[inline]
    pub fn other(&self, e: ElementId) -> Option<ElementId> {
        if e == self.left {
            Some(self.right)
        } else if e == self.right {
            Some(self.left)
        } else {
            None
        }
    }
}

impl From<(ElementId, ElementId)> for InteriorFace {
    fn from((left, right): (ElementId, ElementId)) -> Self {
        Self::new(left, right)
    }
}

/// Read-only element/face adjacency with a partition id per element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeshAdjacency {
    partition_of: Vec<PartitionId>,
    faces: Vec<InteriorFace>,
    // CSR reverse map: faces of element e are element_faces[face_offsets[e]..face_offsets[e + 1]]
    face_offsets: Vec<usize>,
    element_faces: Vec<FaceId>,
}

impl MeshAdjacency {
    /// Validate and index `faces` over `n_elements` elements.
    ///
    /// # Errors
    /// - [`MeshHaloError::UnpartitionedElement`] if `assignment` has no
    ///   partition for some element in `[0, n_elements)`.
    /// - [`MeshHaloError::InvalidAdjacency`] if a face references an element
    ///   outside `[0, n_elements)`.
    /// - [`MeshHaloError::DegenerateFace`] if a face has identical endpoints.
    pub fn try_new(
        n_elements: usize,
        assignment: &PartitionAssignment,
        faces: Vec<InteriorFace>,
    ) -> Result<Self, MeshHaloError> {
        if assignment.len() > n_elements {
            log::warn!(
                "partition assignment has {} entries for {} elements; ignoring the tail",
                assignment.len(),
                n_elements
            );
        }
        let mut partition_of = Vec::with_capacity(n_elements);
        for e in 0..n_elements {
            let p = assignment
                .get(e)
                .ok_or(MeshHaloError::UnpartitionedElement(e))?;
            partition_of.push(p);
        }

        let mut counts = vec![0usize; n_elements];
        for (f, face) in faces.iter().enumerate() {
            for e in face.endpoints() {
                if e >= n_elements {
                    return Err(MeshHaloError::InvalidAdjacency {
                        face: f,
                        element: e,
                        n_elements,
                    });
                }
            }
            if face.left == face.right {
                return Err(MeshHaloError::DegenerateFace {
                    face: f,
                    element: face.left,
                });
            }
            counts[face.left] += 1;
            counts[face.right] += 1;
        }

        let mut face_offsets = Vec::with_capacity(n_elements + 1);
        face_offsets.push(0);
        for c in &counts {
            let last = *face_offsets.last().unwrap_or(&0);
            face_offsets.push(last + c);
        }
        let mut cursor = face_offsets[..n_elements].to_vec();
        let mut element_faces = vec![0; face_offsets[n_elements]];
        // faces are visited in ascending id, so every row ends up sorted
        for (f, face) in faces.iter().enumerate() {
            for e in face.endpoints() {
                element_faces[cursor[e]] = f;
                cursor[e] += 1;
            }
        }

        let adj = Self {
            partition_of,
            faces,
            face_offsets,
            element_faces,
        };
        adj.debug_assert_invariants();
        log::debug!(
            "mesh adjacency: {} elements, {} interior faces, {} partitions",
            adj.n_elements(),
            adj.n_faces(),
            adj.n_parts()
        );
        Ok(adj)
    }

    /// Convenience constructor from `(left, right)` pairs.
    pub fn from_pairs(
        assignment: &PartitionAssignment,
        pairs: &[(ElementId, ElementId)],
    ) -> Result<Self, MeshHaloError> {
        let faces = pairs.iter().copied().map(InteriorFace::from).collect();
        Self::try_new(assignment.len(), assignment, faces)
    }

    #[inline]
    pub fn n_elements(&self) -> usize {
        self.partition_of.len()
    }

    #[inline]
    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    /// One past the largest partition id in use.
    pub fn n_parts(&self) -> usize {
        self.partition_of.iter().max().map_or(0, |&p| p + 1)
    }

    /// Partition owning `e`.
    ///
    /// # Panics
    /// Panics if `e >= n_elements()`.
    #[inline]
    pub fn partition_of(&self, e: ElementId) -> PartitionId {
        self.partition_of[e]
    }

    #[inline]
    pub fn partitions(&self) -> &[PartitionId] {
        &self.partition_of
    }

    /// The partition assignment this adjacency was built from.
    pub fn assignment(&self) -> PartitionAssignment {
        PartitionAssignment::new(self.partition_of.clone())
    }

    #[inline]
    pub fn faces(&self) -> &[InteriorFace] {
        &self.faces
    }

    /// Faces touching `e` as left or right endpoint, in ascending id.
    ///
    /// # Panics
    /// Panics if `e >= n_elements()`.
    #[inline]
    pub fn faces_of(&self, e: ElementId) -> &[FaceId] {
        &self.element_faces[self.face_offsets[e]..self.face_offsets[e + 1]]
    }

    /// `(left, right)` of face `f`.
    ///
    /// # Panics
    /// Panics if `f >= n_faces()`.
    #[inline]
    pub fn endpoints_of(&self, f: FaceId) -> (ElementId, ElementId) {
        let face = self.faces[f];
        (face.left, face.right)
    }

    /// Elements sharing a face with `e`, one entry per face.
    pub fn neighbors_of(&self, e: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        self.faces_of(e)
            .iter()
            .filter_map(move |&f| self.faces[f].other(e))
    }

    /// True if the endpoints of `f` live in different partitions.
    #[inline]
    pub fn is_cross_partition(&self, f: FaceId) -> bool {
        let face = self.faces[f];
        self.partition_of[face.left] != self.partition_of[face.right]
    }
}

impl DebugInvariants for MeshAdjacency {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "MeshAdjacency");
    }

    fn validate_invariants(&self) -> Result<(), MeshHaloError> {
        let n = self.n_elements();
        crate::ensure_invariant!(
            self.face_offsets.len() == n + 1,
            "face offsets have length {}, expected {}",
            self.face_offsets.len(),
            n + 1
        );
        crate::ensure_invariant!(
            self.element_faces.len() == 2 * self.faces.len(),
            "reverse map holds {} entries for {} faces",
            self.element_faces.len(),
            self.faces.len()
        );
        for e in 0..n {
            for &f in self.faces_of(e) {
                crate::ensure_invariant!(
                    self.faces[f].other(e).is_some(),
                    "element {e} lists face {f} it is not an endpoint of"
                );
            }
        }
        Ok(())
    }
}
