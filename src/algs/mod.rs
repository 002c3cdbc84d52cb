//! Algorithms over a classified mesh: reindexing, accumulation passes,
//! consistency checking and the end-to-end driver.

pub mod assembly;
pub mod consistency;
pub mod renumber;
pub mod solve;

pub use assembly::{Accumulator, FaceKernel, PassStats};
pub use consistency::{ConsistencyChecker, DEFAULT_TOLERANCE, Violation};
pub use renumber::{
    Permutation, ReductionGroup, ReductionGroups, Reindexed, reindex, reindex_classified,
};
pub use solve::{HaloSolve, ReferenceKernel, SolveReport};
