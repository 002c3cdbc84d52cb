//! Partition quality metrics.
//!
//! Intended for logging, testing and comparing partitioner backends.

use crate::topology::{DualGraph, MeshAdjacency, PartitionAssignment};
use rayon::prelude::*;

/// Number of dual-graph edges whose endpoints lie in different parts.
pub fn edge_cut(g: &DualGraph, assignment: &PartitionAssignment) -> usize {
    let parts = assignment.as_slice();
    g.edges().filter(|&(u, v)| parts[u] != parts[v]).count()
}

/// Number of interior faces crossing partitions.
pub fn face_cut(adj: &MeshAdjacency) -> usize {
    (0..adj.n_faces())
        .filter(|&f| adj.is_cross_partition(f))
        .count()
}

/// Average number of parts each vertex is present in, counting the parts of
/// its neighbours (1.0 when nothing is cut).
pub fn replication_factor(g: &DualGraph, assignment: &PartitionAssignment) -> f64 {
    let n = g.n_vertices();
    if n == 0 {
        return 0.0;
    }
    let parts = assignment.as_slice();
    let total: usize = (0..n)
        .into_par_iter()
        .map(|u| {
            let mut seen: Vec<usize> = std::iter::once(parts[u])
                .chain(g.neighbors(u).iter().map(|&v| parts[v]))
                .collect();
            seen.sort_unstable();
            seen.dedup();
            seen.len()
        })
        .sum();
    total as f64 / n as f64
}
