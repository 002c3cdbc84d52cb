//! Per-element accumulation field with role-dependent merge strategies.
//!
//! The field keeps three instances:
//! - **private** rows, stored per partition in a [`PrivateBlock`]; only the
//!   owning partition ever writes them, so updates are plain in-place
//!   applications with no synchronization;
//! - **shared** rows for every element visible to another partition, mutated
//!   only through [`ReductionOp::apply`] under a per-row lock;
//! - **ghost** rows, a second reduction instance over the same elements that
//!   non-owning partitions reduce into. [`AccumulationField::finalize`] folds
//!   it back into the shared instance.
//!
//! Lifecycle: `Uninitialized → Zeroed → Accumulating → Finalized`. Zeroing is
//! an explicit step; rows are `NaN` until then.

use crate::data::reduction::{ReductionOp, SumReduction};
use crate::mesh_error::MeshHaloError;
use crate::overlap::{Classification, Role};
use crate::topology::{ElementId, PartitionId};
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Lifecycle state of an [`AccumulationField`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldState {
    /// Allocated; values are meaningless.
    Uninitialized,
    /// Every instance holds the reduction identity.
    Zeroed,
    /// At least one pass is accepting contributions.
    Accumulating,
    /// Ghost contributions folded back; values readable.
    Finalized,
}

/// Where an element's row lives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Slot {
    Private { part: PartitionId, index: usize },
    Boundary { part: PartitionId, index: usize },
}

impl Slot {
    #[inline]
    fn part(self) -> PartitionId {
        match self {
            Slot::Private { part, .. } | Slot::Boundary { part, .. } => part,
        }
    }
}

/// Private rows of one partition, exclusively owned by that partition.
#[derive(Clone, Debug)]
pub struct PrivateBlock {
    part: PartitionId,
    elements: Vec<ElementId>,
    values: Vec<f64>,
}

impl PrivateBlock {
    #[inline]
    pub fn part(&self) -> PartitionId {
        self.part
    }

    /// Private elements of this partition, ascending.
    #[inline]
    pub fn elements(&self) -> &[ElementId] {
        &self.elements
    }

    #[inline]
    fn row_mut(&mut self, index: usize, width: usize) -> &mut [f64] {
        &mut self.values[index * width..(index + 1) * width]
    }
}

/// Reduction target: one lock-guarded row per boundary element.
pub struct ReductionInstance<R> {
    width: usize,
    rows: Vec<Mutex<Box<[f64]>>>,
    _op: PhantomData<fn() -> R>,
}

impl<R: ReductionOp> ReductionInstance<R> {
    fn new(n_rows: usize, width: usize) -> Self {
        Self {
            width,
            rows: (0..n_rows)
                .map(|_| Mutex::new(vec![f64::NAN; width].into_boxed_slice()))
                .collect(),
            _op: PhantomData,
        }
    }

    fn reset(&mut self) {
        for row in &mut self.rows {
            R::identity(row.get_mut());
        }
    }

    /// `row ← row ⊕ values`; safe under arbitrary interleaving.
    #[inline]
    pub fn reduce(&self, index: usize, values: &[f64]) {
        debug_assert_eq!(values.len(), self.width);
        let mut row = self.rows[index].lock();
        R::apply(&mut row, values);
    }

    #[inline]
    fn reduce_exclusive(&mut self, index: usize, values: &[f64]) {
        R::apply(self.rows[index].get_mut(), values);
    }

    fn snapshot(&self, index: usize) -> Vec<f64> {
        self.rows[index].lock().to_vec()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<R> std::fmt::Debug for ReductionInstance<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReductionInstance")
            .field("width", &self.width)
            .field("rows", &self.rows.len())
            .finish()
    }
}

/// Per-element values of width `N`, accumulated across partitions.
#[derive(Debug)]
pub struct AccumulationField<R: ReductionOp = SumReduction> {
    width: usize,
    state: FieldState,
    slots: Vec<Slot>,
    private: Vec<PrivateBlock>,
    shared: ReductionInstance<R>,
    ghost: ReductionInstance<R>,
}

impl<R: ReductionOp> AccumulationField<R> {
    /// Allocate a field laid out for `classification`, `width` values per element.
    ///
    /// The field starts [`FieldState::Uninitialized`]; call
    /// [`zero`](Self::zero) before the first pass.
    pub fn new(classification: &Classification, width: usize) -> Result<Self, MeshHaloError> {
        if width == 0 {
            return Err(MeshHaloError::InvalidConfig(
                "accumulation width must be at least 1".into(),
            ));
        }
        let n = classification.n_elements();
        let mut slots = vec![Slot::Private { part: 0, index: 0 }; n];
        let mut private = Vec::with_capacity(classification.n_parts());
        let mut n_boundary = 0;
        for view in classification.views() {
            for (index, &e) in view.private.iter().enumerate() {
                slots[e] = Slot::Private {
                    part: view.part,
                    index,
                };
            }
            for &e in &view.shared {
                slots[e] = Slot::Boundary {
                    part: view.part,
                    index: n_boundary,
                };
                n_boundary += 1;
            }
            private.push(PrivateBlock {
                part: view.part,
                elements: view.private.clone(),
                values: vec![f64::NAN; view.private.len() * width],
            });
        }
        log::debug!(
            "accumulation field: {n} elements x {width}, {} private, {n_boundary} boundary rows",
            n - n_boundary
        );
        Ok(Self {
            width,
            state: FieldState::Uninitialized,
            slots,
            private,
            shared: ReductionInstance::new(n_boundary, width),
            ghost: ReductionInstance::new(n_boundary, width),
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn n_elements(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn n_parts(&self) -> usize {
        self.private.len()
    }

    #[inline]
    pub fn state(&self) -> FieldState {
        self.state
    }

    /// Number of rows in each reduction instance.
    #[inline]
    pub fn n_boundary(&self) -> usize {
        self.shared.len()
    }

    /// Fail with [`MeshHaloError::StaleClassification`] unless the field was
    /// laid out for `classification`.
    pub fn ensure_layout(&self, classification: &Classification) -> Result<(), MeshHaloError> {
        let same = self.n_elements() == classification.n_elements()
            && self.n_parts() == classification.n_parts()
            && self.slots.iter().enumerate().all(|(e, slot)| {
                slot.part() == classification.partition_of(e)
                    && matches!(slot, Slot::Boundary { .. }) == classification.is_shared(e)
            });
        if !same {
            return Err(MeshHaloError::StaleClassification {
                expected_elements: self.n_elements(),
                expected_faces: classification.n_faces(),
                found_elements: classification.n_elements(),
                found_faces: classification.n_faces(),
            });
        }
        Ok(())
    }

    /// Reset every instance to the reduction identity. Allowed from any state.
    pub fn zero(&mut self) {
        let width = self.width;
        self.private.par_iter_mut().for_each(|block| {
            for row in block.values.chunks_exact_mut(width) {
                R::identity(row);
            }
        });
        self.shared.reset();
        self.ghost.reset();
        self.state = FieldState::Zeroed;
    }

    /// Open a new accumulation pass on top of the current values.
    ///
    /// Allowed from any state but [`FieldState::Uninitialized`]; reopening a
    /// finalized field keeps its values, so repeated passes accumulate.
    pub fn begin_pass(&mut self) -> Result<(), MeshHaloError> {
        if self.state == FieldState::Uninitialized {
            return Err(MeshHaloError::InvalidFieldState {
                found: self.state,
                expected: "Zeroed, Accumulating or Finalized",
            });
        }
        self.state = FieldState::Accumulating;
        Ok(())
    }

    fn expect_open(&mut self) -> Result<(), MeshHaloError> {
        match self.state {
            FieldState::Zeroed | FieldState::Accumulating => {
                self.state = FieldState::Accumulating;
                Ok(())
            }
            found => Err(MeshHaloError::InvalidFieldState {
                found,
                expected: "Zeroed or Accumulating",
            }),
        }
    }

    fn expect_finalized(&self) -> Result<(), MeshHaloError> {
        if self.state != FieldState::Finalized {
            return Err(MeshHaloError::InvalidFieldState {
                found: self.state,
                expected: "Finalized",
            });
        }
        Ok(())
    }

    #[inline]
    fn slot(&self, e: ElementId) -> Result<Slot, MeshHaloError> {
        self.slots
            .get(e)
            .copied()
            .ok_or(MeshHaloError::ElementOutOfRange {
                element: e,
                n_elements: self.slots.len(),
            })
    }

    #[inline]
    fn check_width(&self, found: usize) -> Result<(), MeshHaloError> {
        if found != self.width {
            return Err(MeshHaloError::WidthMismatch {
                expected: self.width,
                found,
            });
        }
        Ok(())
    }

    /// Merge `values` into element `e` through the instance `role` selects.
    ///
    /// # Errors
    /// - [`MeshHaloError::InvalidFieldState`] unless the field is zeroed or
    ///   accumulating.
    /// - [`MeshHaloError::RoleMismatch`] if `role` is `Private` for a boundary
    ///   element or `Shared`/`Ghost` for a private one.
    /// - [`MeshHaloError::WidthMismatch`] if `values.len() != width`.
    pub fn contribute(
        &mut self,
        e: ElementId,
        role: Role,
        values: &[f64],
    ) -> Result<(), MeshHaloError> {
        self.check_width(values.len())?;
        let slot = self.slot(e)?;
        self.expect_open()?;
        let width = self.width;
        match (role, slot) {
            (Role::Private, Slot::Private { part, index }) => {
                R::apply(self.private[part].row_mut(index, width), values);
            }
            (Role::Shared, Slot::Boundary { index, .. }) => {
                self.shared.reduce_exclusive(index, values);
            }
            (Role::Ghost, Slot::Boundary { index, .. }) => {
                self.ghost.reduce_exclusive(index, values);
            }
            _ => return Err(MeshHaloError::RoleMismatch { element: e, role }),
        }
        Ok(())
    }

    /// Split the field into one [`PartitionSink`] per partition for a
    /// concurrent pass.
    pub fn partition_sinks(&mut self) -> Result<Vec<PartitionSink<'_, R>>, MeshHaloError> {
        self.expect_open()?;
        let Self {
            width,
            slots,
            private,
            shared,
            ghost,
            ..
        } = self;
        let (width, slots, shared, ghost) = (*width, &*slots, &*shared, &*ghost);
        Ok(private
            .iter_mut()
            .map(move |block| PartitionSink {
                width,
                slots,
                block,
                shared,
                ghost,
            })
            .collect())
    }

    /// Fold the ghost instance into the shared instance, reset the ghost
    /// instance and mark the field [`FieldState::Finalized`].
    pub fn finalize(&mut self) -> Result<(), MeshHaloError> {
        if self.state == FieldState::Finalized {
            return Ok(());
        }
        self.expect_open()?;
        self.shared
            .rows
            .par_iter_mut()
            .zip(self.ghost.rows.par_iter_mut())
            .for_each(|(shared, ghost)| {
                let ghost = ghost.get_mut();
                R::fold(shared.get_mut(), ghost);
                R::identity(ghost);
            });
        self.state = FieldState::Finalized;
        Ok(())
    }

    /// Final value of element `e`.
    pub fn value(&self, e: ElementId) -> Result<Vec<f64>, MeshHaloError> {
        self.expect_finalized()?;
        let slot = self.slot(e)?;
        Ok(self.final_row(slot).to_vec())
    }

    fn final_row(&self, slot: Slot) -> std::borrow::Cow<'_, [f64]> {
        match slot {
            Slot::Private { part, index } => std::borrow::Cow::Borrowed(
                &self.private[part].values[index * self.width..(index + 1) * self.width],
            ),
            Slot::Boundary { index, .. } => std::borrow::Cow::Owned(self.shared.snapshot(index)),
        }
    }

    /// All final values, row-major by element id.
    pub fn values(&self) -> Result<Vec<f64>, MeshHaloError> {
        self.expect_finalized()?;
        let mut out = Vec::with_capacity(self.n_elements() * self.width);
        for &slot in &self.slots {
            out.extend_from_slice(&self.final_row(slot));
        }
        Ok(out)
    }

    /// Current contents of one instance row, in any state but
    /// [`FieldState::Uninitialized`]. `None` if `e` has no row in that instance.
    pub fn instance_row(
        &self,
        role: Role,
        e: ElementId,
    ) -> Result<Option<Vec<f64>>, MeshHaloError> {
        if self.state == FieldState::Uninitialized {
            return Err(MeshHaloError::InvalidFieldState {
                found: self.state,
                expected: "Zeroed, Accumulating or Finalized",
            });
        }
        let width = self.width;
        Ok(match (role, self.slots.get(e).copied()) {
            (Role::Private, Some(Slot::Private { part, index })) => {
                Some(self.private[part].values[index * width..(index + 1) * width].to_vec())
            }
            (Role::Shared, Some(Slot::Boundary { index, .. })) => Some(self.shared.snapshot(index)),
            (Role::Ghost, Some(Slot::Boundary { index, .. })) => Some(self.ghost.snapshot(index)),
            _ => None,
        })
    }

    /// Sum over every element and component of the final values.
    ///
    /// Partial sums are formed per partition and combined in partition order,
    /// so the result does not depend on thread scheduling.
    pub fn compute_error_norm(&self) -> Result<f64, MeshHaloError> {
        self.expect_finalized()?;
        let private: Vec<f64> = self
            .private
            .par_iter()
            .map(|block| block.values.iter().sum::<f64>())
            .collect();
        let boundary: f64 = self
            .shared
            .rows
            .iter()
            .map(|row| row.lock().iter().sum::<f64>())
            .sum();
        Ok(private.iter().sum::<f64>() + boundary)
    }
}

/// Write access of one partition during a concurrent pass: its own private
/// rows exclusively, the shared and ghost instances through the reduction.
pub struct PartitionSink<'a, R: ReductionOp> {
    width: usize,
    slots: &'a [Slot],
    block: &'a mut PrivateBlock,
    shared: &'a ReductionInstance<R>,
    ghost: &'a ReductionInstance<R>,
}

impl<R: ReductionOp> PartitionSink<'_, R> {
    #[inline]
    pub fn part(&self) -> PartitionId {
        self.block.part
    }

    /// Merge `values` into `e` as seen from this partition.
    ///
    /// `Private` and `Shared` require `e` to be owned here, `Ghost` requires
    /// it to be owned elsewhere.
    pub fn add(&mut self, e: ElementId, role: Role, values: &[f64]) -> Result<(), MeshHaloError> {
        if values.len() != self.width {
            return Err(MeshHaloError::WidthMismatch {
                expected: self.width,
                found: values.len(),
            });
        }
        let here = self.block.part;
        match (role, self.slots.get(e).copied()) {
            (Role::Private, Some(Slot::Private { part, index })) if part == here => {
                R::apply(self.block.row_mut(index, self.width), values);
            }
            (Role::Shared, Some(Slot::Boundary { part, index })) if part == here => {
                self.shared.reduce(index, values);
            }
            (Role::Ghost, Some(Slot::Boundary { part, index })) if part != here => {
                self.ghost.reduce(index, values);
            }
            _ => return Err(MeshHaloError::RoleMismatch { element: e, role }),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlap::classify;
    use crate::topology::{MeshAdjacency, PartitionAssignment};

    // 0 1 | 2 3
    fn chain() -> Classification {
        let a = PartitionAssignment::new(vec![0, 0, 1, 1]);
        let adj = MeshAdjacency::from_pairs(&a, &[(0, 1), (1, 2), (2, 3)]).unwrap();
        classify(&adj, 2).unwrap()
    }

    #[test]
    fn lifecycle_is_enforced() {
        let c = chain();
        let mut f: AccumulationField = AccumulationField::new(&c, 2).unwrap();
        assert_eq!(f.state(), FieldState::Uninitialized);
        assert!(matches!(
            f.contribute(0, Role::Private, &[1.0, 1.0]),
            Err(MeshHaloError::InvalidFieldState { .. })
        ));
        assert!(f.begin_pass().is_err());
        assert!(f.value(0).is_err());
        f.zero();
        assert_eq!(f.state(), FieldState::Zeroed);
        f.contribute(0, Role::Private, &[1.0, 2.0]).unwrap();
        assert_eq!(f.state(), FieldState::Accumulating);
        assert!(f.values().is_err());
        f.finalize().unwrap();
        assert_eq!(f.value(0).unwrap(), vec![1.0, 2.0]);
        assert!(f.contribute(0, Role::Private, &[1.0, 2.0]).is_err());
        f.begin_pass().unwrap();
        f.contribute(0, Role::Private, &[1.0, 2.0]).unwrap();
        f.finalize().unwrap();
        assert_eq!(f.value(0).unwrap(), vec![2.0, 4.0]);
    }

    #[test]
    fn ghost_contributions_fold_into_shared() {
        let c = chain();
        let mut f: AccumulationField = AccumulationField::new(&c, 1).unwrap();
        f.zero();
        f.contribute(1, Role::Shared, &[1.0]).unwrap();
        f.contribute(1, Role::Ghost, &[10.0]).unwrap();
        assert_eq!(f.instance_row(Role::Ghost, 1).unwrap(), Some(vec![10.0]));
        f.finalize().unwrap();
        assert_eq!(f.value(1).unwrap(), vec![11.0]);
        assert_eq!(f.instance_row(Role::Ghost, 1).unwrap(), Some(vec![0.0]));
        assert_eq!(f.instance_row(Role::Ghost, 0).unwrap(), None);
    }

    #[test]
    fn role_and_width_are_checked() {
        let c = chain();
        let mut f: AccumulationField = AccumulationField::new(&c, 2).unwrap();
        f.zero();
        assert_eq!(
            f.contribute(0, Role::Shared, &[1.0, 1.0]),
            Err(MeshHaloError::RoleMismatch {
                element: 0,
                role: Role::Shared
            })
        );
        assert_eq!(
            f.contribute(1, Role::Private, &[1.0, 1.0]),
            Err(MeshHaloError::RoleMismatch {
                element: 1,
                role: Role::Private
            })
        );
        assert_eq!(
            f.contribute(1, Role::Shared, &[1.0]),
            Err(MeshHaloError::WidthMismatch {
                expected: 2,
                found: 1
            })
        );
        assert!(matches!(
            AccumulationField::<SumReduction>::new(&c, 0),
            Err(MeshHaloError::InvalidConfig(_))
        ));
    }

    #[test]
    fn sinks_respect_ownership() {
        let c = chain();
        let mut f: AccumulationField = AccumulationField::new(&c, 1).unwrap();
        f.zero();
        {
            let mut sinks = f.partition_sinks().unwrap();
            let (s0, s1) = sinks.split_at_mut(1);
            let (s0, s1) = (&mut s0[0], &mut s1[0]);
            s0.add(0, Role::Private, &[1.0]).unwrap();
            s0.add(1, Role::Shared, &[2.0]).unwrap();
            s0.add(2, Role::Ghost, &[3.0]).unwrap();
            assert!(s0.add(3, Role::Private, &[1.0]).is_err());
            assert!(s0.add(1, Role::Ghost, &[1.0]).is_err());
            s1.add(1, Role::Ghost, &[4.0]).unwrap();
            s1.add(2, Role::Shared, &[5.0]).unwrap();
        }
        f.finalize().unwrap();
        assert_eq!(f.values().unwrap(), vec![1.0, 6.0, 8.0, 0.0]);
        assert_eq!(f.compute_error_norm().unwrap(), 15.0);
    }

    #[test]
    fn layout_mismatch_is_stale() {
        let c = chain();
        let f: AccumulationField = AccumulationField::new(&c, 1).unwrap();
        let a = PartitionAssignment::new(vec![0, 1, 1, 1]);
        let adj = MeshAdjacency::from_pairs(&a, &[(0, 1), (1, 2), (2, 3)]).unwrap();
        let other = classify(&adj, 2).unwrap();
        assert!(f.ensure_layout(&c).is_ok());
        assert!(matches!(
            f.ensure_layout(&other),
            Err(MeshHaloError::StaleClassification { .. })
        ));
    }
}
