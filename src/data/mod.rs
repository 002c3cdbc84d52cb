//! Per-element field storage and the reduction operators that merge into it.

pub mod accumulation;
pub mod reduction;

pub use accumulation::{AccumulationField, FieldState, PartitionSink, PrivateBlock, ReductionInstance};
pub use reduction::{ReductionOp, SumReduction};
