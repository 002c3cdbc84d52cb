//! Run configuration for a partitioned accumulation solve.

use crate::mesh_error::MeshHaloError;
use crate::overlap::{MAX_PARTITIONS, check_partition_count};
use serde::{Deserialize, Serialize};

/// Values per element for a second-order hexahedral discretization.
pub const DEFAULT_DOFS_PER_ELEMENT: usize = 135;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveConfig {
    #[serde(alias = "npartitions")]
    pub n_parts: usize,
    /// Accumulation passes; the first one is captured as the reference.
    #[serde(alias = "iter")]
    pub iterations: usize,
    pub dofs_per_element: usize,
    /// Nodes two elements must share to be neighbours in the partitioner's dual graph.
    pub n_common_nodes: usize,
    pub reindex: bool,
    pub check_consistency: bool,
    pub tolerance: f64,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            n_parts: 1,
            iterations: 5,
            dofs_per_element: DEFAULT_DOFS_PER_ELEMENT,
            n_common_nodes: 1,
            reindex: true,
            check_consistency: true,
            tolerance: crate::algs::consistency::DEFAULT_TOLERANCE,
        }
    }
}

impl SolveConfig {
    /// Reject settings that would fail later in the pipeline.
    pub fn validate(&self) -> Result<(), MeshHaloError> {
        check_partition_count(self.n_parts)?;
        if self.iterations == 0 {
            return Err(MeshHaloError::InvalidConfig(
                "iterations must be at least 1".into(),
            ));
        }
        if self.dofs_per_element == 0 {
            return Err(MeshHaloError::InvalidConfig(
                "dofs_per_element must be at least 1".into(),
            ));
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(MeshHaloError::InvalidConfig(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        debug_assert!(self.n_parts <= MAX_PARTITIONS);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(SolveConfig::default().validate().is_ok());
    }

    #[test]
    fn bad_values_are_rejected() {
        let cfg = SolveConfig {
            n_parts: MAX_PARTITIONS + 1,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(MeshHaloError::PartitionCountExceedsCapacity { .. })
        ));
        for cfg in [
            SolveConfig {
                n_parts: 0,
                ..Default::default()
            },
            SolveConfig {
                iterations: 0,
                ..Default::default()
            },
            SolveConfig {
                dofs_per_element: 0,
                ..Default::default()
            },
            SolveConfig {
                tolerance: f64::NAN,
                ..Default::default()
            },
        ] {
            assert!(matches!(cfg.validate(), Err(MeshHaloError::InvalidConfig(_))));
        }
    }
}
