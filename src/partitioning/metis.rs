//! METIS k-way partitioning of the element dual graph.

use super::{MeshPartitioner, PartitionOutcome, PartitionerError};
use crate::topology::dual_graph::build_dual;
use crate::topology::{ElementMesh, PartitionAssignment};
use metis::Idx;

/// Partitions the dual graph of an [`ElementMesh`] with `METIS_PartGraphKway`.
#[derive(Copy, Clone, Debug, Default)]
pub struct MetisPartitioner;

fn to_idx(values: &[usize]) -> Result<Vec<Idx>, PartitionerError> {
    values
        .iter()
        .map(|&v| {
            Idx::try_from(v).map_err(|_| PartitionerError::Other(format!("index {v} overflows idx_t")))
        })
        .collect()
}

impl MeshPartitioner for MetisPartitioner {
    fn partition(
        &self,
        mesh: &ElementMesh,
        n_common_nodes: usize,
        n_parts: usize,
    ) -> Result<PartitionOutcome, PartitionerError> {
        if n_parts == 0 {
            return Err(PartitionerError::InvalidPartCount(n_parts));
        }
        let n = mesh.n_elements();
        if n_parts == 1 || n == 0 {
            return Ok(PartitionOutcome {
                assignment: PartitionAssignment::single(n),
                objective: 0,
            });
        }
        let dual = build_dual(mesh, n_common_nodes);
        let xadj = to_idx(&dual.xadj)?;
        let adjncy = to_idx(&dual.adjncy)?;
        let nparts = Idx::try_from(n_parts).map_err(|_| PartitionerError::InvalidPartCount(n_parts))?;
        let mut part: Vec<Idx> = vec![0; n];
        let objective = metis::Graph::new(1, nparts, &xadj, &adjncy)
            .map_err(|e| PartitionerError::Other(e.to_string()))?
            .part_kway(&mut part)
            .map_err(|e| PartitionerError::Other(e.to_string()))?;
        let raw: Vec<i64> = part.iter().map(|&p| i64::from(p)).collect();
        Ok(PartitionOutcome {
            assignment: PartitionAssignment::from_raw(&raw),
            objective: i64::from(objective),
        })
    }
}
