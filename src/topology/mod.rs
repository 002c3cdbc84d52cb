//! Top-level module for mesh topology.
//!
//! This module provides the id types and the read-only structures the rest of
//! the crate is built on:
//! - [`MeshAdjacency`]: elements, interior faces and the element→partition map
//! - [`ElementMesh`]: element→node connectivity, the partitioner's input
//! - [`DualGraph`]: CSR element graphs for partitioners and metrics

pub mod adjacency;
pub mod dual_graph;
pub mod element_mesh;

pub use adjacency::{InteriorFace, MeshAdjacency, PartitionAssignment, UNASSIGNED};
pub use dual_graph::DualGraph;
pub use element_mesh::ElementMesh;

/// Global element id, `0..n_elements`.
pub type ElementId = usize;
/// Global interior-face id, `0..n_faces`.
pub type FaceId = usize;
/// Partition id, `0..n_parts`.
pub type PartitionId = usize;
