//! Face-driven accumulation across partitions.
//!
//! Every partition walks the interior faces it owns, asks the kernel for one
//! contribution block per face, and merges that block into both endpoints
//! through the instance the endpoint's role selects:
//! 1. private endpoints are updated in place,
//! 2. shared endpoints reduce into the shared instance,
//! 3. ghost endpoints reduce into the ghost instance, which
//!    [`AccumulationField::finalize`] folds back into the owner's shared row.

use crate::data::accumulation::{AccumulationField, PartitionSink};
use crate::data::reduction::ReductionOp;
use crate::mesh_error::MeshHaloError;
use crate::overlap::{Classification, Role};
use crate::topology::{FaceId, MeshAdjacency};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Produces the contribution of one interior face.
///
/// `out` has the field width and is zero-filled before each call.
pub trait FaceKernel: Sync {
    fn contribution(&self, face: FaceId, out: &mut [f64]);
}

impl<F> FaceKernel for F
where
    F: Fn(FaceId, &mut [f64]) + Sync,
{
    #[inline]
    fn contribution(&self, face: FaceId, out: &mut [f64]) {
        self(face, out)
    }
}

/// Update counts of one accumulation pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassStats {
    pub faces: usize,
    pub private_updates: usize,
    pub shared_updates: usize,
    pub ghost_updates: usize,
}

impl PassStats {
    #[inline]
    fn record(&mut self, role: Role) {
        match role {
            Role::Private => self.private_updates += 1,
            Role::Shared => self.shared_updates += 1,
            Role::Ghost => self.ghost_updates += 1,
        }
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            faces: self.faces + other.faces,
            private_updates: self.private_updates + other.private_updates,
            shared_updates: self.shared_updates + other.shared_updates,
            ghost_updates: self.ghost_updates + other.ghost_updates,
        }
    }
}

/// Runs accumulation passes over a classified mesh.
#[derive(Copy, Clone, Debug)]
pub struct Accumulator<'a> {
    adjacency: &'a MeshAdjacency,
    classification: &'a Classification,
}

impl<'a> Accumulator<'a> {
    /// # Errors
    /// [`MeshHaloError::StaleClassification`] if `classification` was not
    /// computed from `adjacency`.
    pub fn new(
        adjacency: &'a MeshAdjacency,
        classification: &'a Classification,
    ) -> Result<Self, MeshHaloError> {
        classification.ensure_matches(adjacency)?;
        Ok(Self {
            adjacency,
            classification,
        })
    }

    pub fn classification(&self) -> &'a Classification {
        self.classification
    }

    /// One pass: every partition processes its faces concurrently.
    ///
    /// Returns after all partitions have finished; the field is left
    /// [`Accumulating`](crate::data::FieldState::Accumulating) until
    /// [`AccumulationField::finalize`].
    pub fn accumulate<R, K>(
        &self,
        field: &mut AccumulationField<R>,
        kernel: &K,
    ) -> Result<PassStats, MeshHaloError>
    where
        R: ReductionOp,
        K: FaceKernel + ?Sized,
    {
        field.ensure_layout(self.classification)?;
        let width = field.width();
        let sinks = field.partition_sinks()?;
        let per_part = sinks
            .into_par_iter()
            .zip(self.classification.views().par_iter())
            .map(|(mut sink, view)| {
                let mut buf = vec![0.0; width];
                let mut stats = PassStats::default();
                for &f in &view.faces {
                    self.apply_face(&mut sink, kernel, f, &mut buf, &mut stats)?;
                }
                Ok(stats)
            })
            .collect::<Result<Vec<_>, MeshHaloError>>()?;
        let stats = per_part.into_iter().fold(PassStats::default(), PassStats::merge);
        log::debug!("accumulation pass: {stats:?}");
        Ok(stats)
    }

    fn apply_face<R, K>(
        &self,
        sink: &mut PartitionSink<'_, R>,
        kernel: &K,
        f: FaceId,
        buf: &mut [f64],
        stats: &mut PassStats,
    ) -> Result<(), MeshHaloError>
    where
        R: ReductionOp,
        K: FaceKernel + ?Sized,
    {
        buf.fill(0.0);
        kernel.contribution(f, buf);
        let (l, r) = self.adjacency.endpoints_of(f);
        let roles = self.classification.face_roles(f);
        sink.add(l, roles.left, buf)?;
        sink.add(r, roles.right, buf)?;
        stats.faces += 1;
        stats.record(roles.left);
        stats.record(roles.right);
        Ok(())
    }

    /// Sequential pass applying faces in exactly the given order.
    ///
    /// `order` may list a face more than once or omit faces.
    pub fn accumulate_in_order<R, K>(
        &self,
        field: &mut AccumulationField<R>,
        kernel: &K,
        order: &[FaceId],
    ) -> Result<PassStats, MeshHaloError>
    where
        R: ReductionOp,
        K: FaceKernel + ?Sized,
    {
        field.ensure_layout(self.classification)?;
        let mut buf = vec![0.0; field.width()];
        let mut stats = PassStats::default();
        for &f in order {
            if f >= self.adjacency.n_faces() {
                return Err(MeshHaloError::InvalidPermutation(format!(
                    "face {f} out of range [0, {})",
                    self.adjacency.n_faces()
                )));
            }
            buf.fill(0.0);
            kernel.contribution(f, &mut buf);
            let (l, r) = self.adjacency.endpoints_of(f);
            let roles = self.classification.face_roles(f);
            field.contribute(l, roles.left, &buf)?;
            field.contribute(r, roles.right, &buf)?;
            stats.faces += 1;
            stats.record(roles.left);
            stats.record(roles.right);
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SumReduction;
    use crate::overlap::classify;
    use crate::topology::PartitionAssignment;

    fn setup() -> (MeshAdjacency, Classification) {
        // 0 1 | 2 3 | 4
        let a = PartitionAssignment::new(vec![0, 0, 1, 1, 2]);
        let adj = MeshAdjacency::from_pairs(&a, &[(0, 1), (1, 2), (2, 3), (4, 3)]).unwrap();
        let c = classify(&adj, 3).unwrap();
        (adj, c)
    }

    #[test]
    fn parallel_and_sequential_passes_agree() {
        let (adj, c) = setup();
        let acc = Accumulator::new(&adj, &c).unwrap();
        let kernel = |f: FaceId, out: &mut [f64]| {
            for (i, o) in out.iter_mut().enumerate() {
                *o = (f + 1) as f64 * 0.5 + i as f64;
            }
        };

        let mut par: AccumulationField<SumReduction> = AccumulationField::new(&c, 3).unwrap();
        par.zero();
        let stats = acc.accumulate(&mut par, &kernel).unwrap();
        par.finalize().unwrap();

        let mut seq: AccumulationField<SumReduction> = AccumulationField::new(&c, 3).unwrap();
        seq.zero();
        acc.accumulate_in_order(&mut seq, &kernel, &[3, 1, 0, 2]).unwrap();
        seq.finalize().unwrap();

        assert_eq!(par.values().unwrap(), seq.values().unwrap());
        assert_eq!(stats.faces, 4);
        assert_eq!(stats.ghost_updates, 2);
        assert_eq!(
            stats.private_updates + stats.shared_updates + stats.ghost_updates,
            8
        );
        // element 3 receives faces 2 and 3
        assert_eq!(par.value(3).unwrap(), vec![3.5, 5.5, 7.5]);
    }

    #[test]
    fn stale_inputs_are_rejected() {
        let (adj, c) = setup();
        let other = MeshAdjacency::from_pairs(
            &PartitionAssignment::new(vec![0, 0, 0, 1, 2]),
            &[(0, 1), (1, 2), (2, 3), (4, 3)],
        )
        .unwrap();
        assert!(matches!(
            Accumulator::new(&other, &c),
            Err(MeshHaloError::StaleClassification { .. })
        ));
        let acc = Accumulator::new(&adj, &c).unwrap();
        let mut f: AccumulationField = AccumulationField::new(&c, 1).unwrap();
        assert!(matches!(
            acc.accumulate(&mut f, &|_: FaceId, _: &mut [f64]| {}),
            Err(MeshHaloError::InvalidFieldState { .. })
        ));
        f.zero();
        assert!(acc.accumulate_in_order(&mut f, &|_: FaceId, _: &mut [f64]| {}, &[9]).is_err());
    }
}
