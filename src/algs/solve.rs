//! End-to-end driver: classify, reindex, accumulate, verify.
//!
//! The field is zeroed once; every iteration then runs one accumulation pass
//! on top of the previous ones, so after `k` iterations each value is `k`
//! times the first pass. The first pass is captured as the reference and
//! each later pass is checked against it.

use crate::algs::assembly::{Accumulator, FaceKernel, PassStats};
use crate::algs::consistency::{ConsistencyChecker, Violation};
use crate::algs::renumber::{Permutation, ReductionGroups, reindex_classified};
use crate::config::SolveConfig;
use crate::data::accumulation::AccumulationField;
use crate::data::reduction::SumReduction;
use crate::mesh_error::MeshHaloError;
use crate::overlap::{PartitionSummary, classify};
use crate::partitioning::{MeshPartitioner, partition_mesh};
use crate::topology::{ElementMesh, FaceId, InteriorFace, MeshAdjacency};
use serde::{Deserialize, Serialize};

/// Deterministic face kernel: component `k` of face `f` is
/// `(f + k) / (f + 1) / n_iter`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReferenceKernel {
    n_iter: usize,
}

impl ReferenceKernel {
    pub fn new(n_iter: usize) -> Self {
        Self {
            n_iter: n_iter.max(1),
        }
    }
}

impl FaceKernel for ReferenceKernel {
    fn contribution(&self, face: FaceId, out: &mut [f64]) {
        let f = face as f64;
        let scale = 1.0 / ((f + 1.0) * self.n_iter as f64);
        for (k, o) in out.iter_mut().enumerate() {
            *o = (f + k as f64) * scale;
        }
    }
}

/// What a [`HaloSolve`] run observed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolveReport {
    pub summary: PartitionSummary,
    /// Old→new element numbering applied before accumulation.
    pub permutation: Permutation,
    /// Distinct `(partition, mask)` reduction targets after reindexing.
    pub reduction_groups: usize,
    pub passes: Vec<PassStats>,
    /// Error norm after each iteration.
    pub norms: Vec<f64>,
    pub violations: Vec<Violation>,
    pub error_norm: f64,
}

impl SolveReport {
    /// First recorded violation as an error.
    pub fn ensure_consistent(&self) -> Result<(), MeshHaloError> {
        match self.violations.first() {
            Some(v) => Err(v.into()),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HaloSolve {
    config: SolveConfig,
}

impl HaloSolve {
    /// # Errors
    /// Any [`SolveConfig::validate`] failure, before work starts.
    pub fn new(config: SolveConfig) -> Result<Self, MeshHaloError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SolveConfig {
        &self.config
    }

    /// Run with [`ReferenceKernel`].
    pub fn run_reference(&self, adjacency: &MeshAdjacency) -> Result<SolveReport, MeshHaloError> {
        self.run(adjacency, &ReferenceKernel::new(self.config.iterations))
    }

    /// Partition `mesh` first, then run on its interior `faces`.
    pub fn run_partitioned<P, K>(
        &self,
        mesh: &ElementMesh,
        faces: Vec<InteriorFace>,
        partitioner: &P,
        kernel: &K,
    ) -> Result<SolveReport, MeshHaloError>
    where
        P: MeshPartitioner + ?Sized,
        K: FaceKernel + ?Sized,
    {
        let outcome = partition_mesh(
            partitioner,
            mesh,
            self.config.n_common_nodes,
            self.config.n_parts,
        )?;
        let adjacency = MeshAdjacency::try_new(mesh.n_elements(), &outcome.assignment, faces)?;
        self.run(&adjacency, kernel)
    }

    pub fn run<K>(&self, adjacency: &MeshAdjacency, kernel: &K) -> Result<SolveReport, MeshHaloError>
    where
        K: FaceKernel + ?Sized,
    {
        let cfg = &self.config;
        let classification = classify(adjacency, cfg.n_parts)?;
        let (permutation, adjacency, classification) = if cfg.reindex {
            let r = reindex_classified(adjacency, &classification)?;
            (r.permutation, r.adjacency, r.classification)
        } else {
            (
                Permutation::identity(adjacency.n_elements()),
                adjacency.clone(),
                classification,
            )
        };
        let reduction_groups = ReductionGroups::from_classification(&classification).distinct_keys();

        let accumulator = Accumulator::new(&adjacency, &classification)?;
        let mut field: AccumulationField<SumReduction> =
            AccumulationField::new(&classification, cfg.dofs_per_element)?;
        let mut checker = ConsistencyChecker::new(cfg.tolerance);
        field.zero();

        let mut passes = Vec::with_capacity(cfg.iterations);
        let mut norms = Vec::with_capacity(cfg.iterations);
        let mut violations = Vec::new();
        for it in 0..cfg.iterations {
            field.begin_pass()?;
            passes.push(accumulator.accumulate(&mut field, kernel)?);
            field.finalize()?;
            if cfg.check_consistency {
                if it == 0 {
                    checker.capture_reference(&field)?;
                } else {
                    violations.extend(checker.check(&field, it + 1, it)?);
                }
            }
            let norm = field.compute_error_norm()?;
            log::info!("iter {it}: error norm {norm:.10e}");
            norms.push(norm);
        }
        let error_norm = norms.last().copied().unwrap_or(0.0);
        Ok(SolveReport {
            summary: classification.summary(),
            permutation,
            reduction_groups,
            passes,
            norms,
            violations,
            error_norm,
        })
    }
}
