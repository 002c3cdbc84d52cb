//! Build a CSR (compressed-sparse-row) *dual graph* of a mesh.
//
// Each *element* is a vertex; an undirected edge joins two elements that
// share at least `n_common` nodes (METIS `ncommon` semantics), or that share
// an interior face when built from a [`MeshAdjacency`].
//
// Returned in METIS-ready CSR triples:
//
// * `xadj[i] .. xadj[i+1]`   = neighbour list of element *i*
// * `adjncy`                 = concatenated neighbour vertices
// * `vwgt[i]`                = vertex weight, default = 1
//
// The dual graph is **symmetrised**, **self-free** and every neighbour list is
// sorted.

use crate::topology::adjacency::MeshAdjacency;
use crate::topology::element_mesh::ElementMesh;
use hashbrown::HashMap;

/// CSR triple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DualGraph {
    pub xadj: Vec<usize>,
    pub adjncy: Vec<usize>,
    pub vwgt: Vec<i32>,
}

impl DualGraph {
    #[inline]
    pub fn n_vertices(&self) -> usize {
        self.xadj.len() - 1
    }

    #[inline]
    pub fn neighbors(&self, v: usize) -> &[usize] {
        &self.adjncy[self.xadj[v]..self.xadj[v + 1]]
    }

    /// Undirected edges `(u, v)` with `u < v`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.n_vertices()).flat_map(move |u| {
            self.neighbors(u)
                .iter()
                .copied()
                .filter(move |&v| u < v)
                .map(move |v| (u, v))
        })
    }

    fn from_lists(adj: Vec<Vec<usize>>) -> Self {
        let n = adj.len();
        let mut xadj = Vec::with_capacity(n + 1);
        let mut adjncy = Vec::new();
        xadj.push(0);
        for mut nbrs in adj {
            nbrs.sort_unstable();
            nbrs.dedup();
            adjncy.extend(nbrs);
            xadj.push(adjncy.len());
        }
        Self {
            xadj,
            adjncy,
            vwgt: vec![1; n],
        }
    }
}

/// Dual graph of element→node connectivity: elements sharing at least
/// `n_common` nodes are adjacent. `n_common == 0` is treated as 1.
pub fn build_dual(mesh: &ElementMesh, n_common: usize) -> DualGraph {
    let n = mesh.n_elements();
    let n_common = n_common.max(1);

    // node -> elements touching it
    let mut node_elems: Vec<Vec<usize>> = vec![Vec::new(); mesh.n_nodes()];
    for e in 0..n {
        for &node in mesh.nodes_of(e) {
            node_elems[node].push(e);
        }
    }

    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut shared: HashMap<usize, usize> = HashMap::new();
    for (e, nbrs) in adj.iter_mut().enumerate() {
        shared.clear();
        for &node in mesh.nodes_of(e) {
            for &other in &node_elems[node] {
                if other != e {
                    *shared.entry(other).or_insert(0) += 1;
                }
            }
        }
        nbrs.extend(
            shared
                .iter()
                .filter(|&(_, &count)| count >= n_common)
                .map(|(&other, _)| other),
        );
    }
    DualGraph::from_lists(adj)
}

/// Dual graph whose edges are the interior faces of `adj`.
pub fn build_dual_from_faces(adj: &MeshAdjacency) -> DualGraph {
    let lists = (0..adj.n_elements())
        .map(|e| adj.neighbors_of(e).collect())
        .collect();
    DualGraph::from_lists(lists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::adjacency::PartitionAssignment;

    // three quads in a row: 0-1 share an edge (2 nodes), 1-2 share one node
    fn strip() -> ElementMesh {
        ElementMesh::uniform(
            9,
            4,
            vec![
                0, 1, 5, 4, //
                1, 2, 6, 5, //
                6, 3, 8, 7,
            ],
        )
        .unwrap()
    }

    #[test]
    fn n_common_controls_adjacency() {
        let mesh = strip();
        let face_dual = build_dual(&mesh, 2);
        assert_eq!(face_dual.xadj, vec![0, 1, 2, 2]);
        assert_eq!(face_dual.adjncy, vec![1, 0]);

        let node_dual = build_dual(&mesh, 1);
        assert_eq!(node_dual.xadj, vec![0, 1, 3, 4]);
        assert_eq!(node_dual.adjncy, vec![1, 0, 2, 1]);
        assert_eq!(node_dual.edges().collect::<Vec<_>>(), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn symmetric_and_self_free() {
        let dg = build_dual(&strip(), 1);
        for i in 0..dg.n_vertices() {
            assert!(!dg.neighbors(i).contains(&i));
            for &j in dg.neighbors(i) {
                assert!(dg.neighbors(j).contains(&i));
            }
        }
    }

    #[test]
    fn face_dual_deduplicates_parallel_faces() {
        let assignment = PartitionAssignment::single(3);
        let adj = MeshAdjacency::from_pairs(&assignment, &[(0, 1), (1, 0), (1, 2)]).unwrap();
        let dg = build_dual_from_faces(&adj);
        assert_eq!(dg.xadj, vec![0, 1, 3, 4]);
        assert_eq!(dg.vwgt, vec![1, 1, 1]);
    }
}
