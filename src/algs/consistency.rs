//! Reference-based verification of the accumulation protocol.
//!
//! After a reference pass has been captured, a field that received
//! `pass_count` identical passes on top of one zeroing must equal
//! `pass_count × reference` component-wise. Any deviation beyond the
//! tolerance points at a merge that was lost or applied twice.

use crate::data::accumulation::AccumulationField;
use crate::data::reduction::ReductionOp;
use crate::mesh_error::MeshHaloError;
use serde::{Deserialize, Serialize};

/// Relative tolerance used by [`ConsistencyChecker::default`].
pub const DEFAULT_TOLERANCE: f64 = 1e-12;

/// One component that failed the check.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub element: usize,
    pub component: usize,
    pub iteration: usize,
    pub expected: f64,
    pub found: f64,
    /// Absolute error when `expected == 0`.
    pub relative_error: f64,
}

impl From<&Violation> for MeshHaloError {
    fn from(v: &Violation) -> Self {
        MeshHaloError::ReductionOrderingViolation {
            element: v.element,
            iteration: v.iteration,
            relative_error: v.relative_error,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ConsistencyChecker {
    tolerance: f64,
    width: usize,
    reference: Option<Vec<f64>>,
}

impl Default for ConsistencyChecker {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl ConsistencyChecker {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            width: 0,
            reference: None,
        }
    }

    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    #[inline]
    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Copy the finalized values of `field` as the reference pass.
    pub fn capture_reference<R: ReductionOp>(
        &mut self,
        field: &AccumulationField<R>,
    ) -> Result<(), MeshHaloError> {
        self.reference = Some(field.values()?);
        self.width = field.width();
        Ok(())
    }

    /// Compare `field` against `pass_count × reference`.
    ///
    /// # Errors
    /// - [`MeshHaloError::MissingReference`] before [`capture_reference`](Self::capture_reference).
    /// - [`MeshHaloError::WidthMismatch`] if the field layout changed.
    /// - [`MeshHaloError::InvalidFieldState`] unless the field is finalized.
    pub fn check<R: ReductionOp>(
        &self,
        field: &AccumulationField<R>,
        pass_count: usize,
        iteration: usize,
    ) -> Result<Vec<Violation>, MeshHaloError> {
        let reference = self
            .reference
            .as_deref()
            .ok_or(MeshHaloError::MissingReference)?;
        let values = field.values()?;
        if values.len() != reference.len() || field.width() != self.width {
            return Err(MeshHaloError::WidthMismatch {
                expected: reference.len(),
                found: values.len(),
            });
        }
        let scale = pass_count as f64;
        let violations: Vec<Violation> = values
            .iter()
            .zip(reference)
            .enumerate()
            .filter_map(|(i, (&found, &r))| {
                let expected = scale * r;
                let err = if expected == 0.0 {
                    found.abs()
                } else {
                    ((found - expected) / expected).abs()
                };
                // NaN fails the comparison
                (!(err < self.tolerance)).then(|| Violation {
                    element: i / self.width,
                    component: i % self.width,
                    iteration,
                    expected,
                    found,
                    relative_error: err,
                })
            })
            .collect();
        if violations.is_empty() {
            log::debug!("consistency check passed at iteration {iteration} (x{pass_count})");
        } else {
            log::warn!(
                "consistency check: {} violations at iteration {iteration}, first at element {}",
                violations.len(),
                violations[0].element
            );
        }
        Ok(violations)
    }

    /// Like [`check`](Self::check), but the first violation is an error.
    pub fn check_strict<R: ReductionOp>(
        &self,
        field: &AccumulationField<R>,
        pass_count: usize,
        iteration: usize,
    ) -> Result<(), MeshHaloError> {
        match self.check(field, pass_count, iteration)?.first() {
            Some(v) => Err(v.into()),
            None => Ok(()),
        }
    }
}
