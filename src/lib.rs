#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-halo
//!
//! mesh-halo decomposes an unstructured mesh across a fixed number of
//! partitions and accumulates per-element quantities that straddle partition
//! boundaries without data races.
//!
//! ## Pipeline
//! 1. An element→partition assignment (from a [`MeshPartitioner`](partitioning::MeshPartitioner))
//!    and the interior faces form a [`MeshAdjacency`](topology::MeshAdjacency).
//! 2. [`classify`](overlap::classify) derives for every partition its
//!    private, shared and ghost elements plus a [`GhostMask`](overlap::GhostMask)
//!    per element.
//! 3. [`reindex`](algs::reindex) optionally renumbers elements by
//!    `(partition, mask)` so each reduction group is one contiguous range.
//! 4. An [`Accumulator`](algs::Accumulator) runs one task per partition,
//!    merging face contributions into an [`AccumulationField`](data::AccumulationField):
//!    private rows in place, shared and ghost rows through a
//!    [`ReductionOp`](data::ReductionOp).
//! 5. A [`ConsistencyChecker`](algs::ConsistencyChecker) verifies repeated
//!    passes against a captured reference.
//!
//! ## Determinism
//!
//! Classification, reindexing and the error norm do not depend on thread
//! scheduling. Accumulated boundary values are order independent up to
//! floating-point rounding.
//!
//! ## Features
//! - `metis-support`: METIS k-way partitioning of the element dual graph.
//! - `check-invariants` / `strict-invariants`: structural checks in release builds.

pub mod algs;
pub mod config;
pub mod data;
pub mod debug_invariants;
pub mod mesh_error;
pub mod overlap;
pub mod partitioning;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::{
        Accumulator, ConsistencyChecker, FaceKernel, HaloSolve, Permutation, ReferenceKernel,
        SolveReport, reindex, reindex_classified,
    };
    pub use crate::config::SolveConfig;
    pub use crate::data::{AccumulationField, FieldState, ReductionOp, SumReduction};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::mesh_error::MeshHaloError;
    pub use crate::overlap::{
        AccessMode, Classification, GhostMask, MAX_PARTITIONS, PartitionView, Role, classify,
    };
    #[cfg(feature = "metis-support")]
    pub use crate::partitioning::MetisPartitioner;
    pub use crate::partitioning::{BlockPartitioner, MeshPartitioner, PartitionerError};
    pub use crate::topology::{
        ElementId, ElementMesh, FaceId, InteriorFace, MeshAdjacency, PartitionAssignment,
        PartitionId,
    };
}
