//! Element→node connectivity handed over by mesh I/O.
//!
//! Stored in the `eptr`/`eind` CSR layout graph partitioners expect: the
//! nodes of element `e` are `eind[eptr[e]..eptr[e + 1]]`.

use crate::mesh_error::MeshHaloError;
use crate::topology::ElementId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementMesh {
    n_nodes: usize,
    eptr: Vec<usize>,
    eind: Vec<usize>,
}

impl ElementMesh {
    /// Validate CSR connectivity over `n_nodes` nodes.
    pub fn try_new(n_nodes: usize, eptr: Vec<usize>, eind: Vec<usize>) -> Result<Self, MeshHaloError> {
        if eptr.first().copied() != Some(0) {
            return Err(MeshHaloError::InvalidConnectivity(
                "eptr must start at 0".into(),
            ));
        }
        if let Some(w) = eptr.windows(2).position(|w| w[0] > w[1]) {
            return Err(MeshHaloError::InvalidConnectivity(format!(
                "eptr decreases at element {w}"
            )));
        }
        if eptr.last().copied() != Some(eind.len()) {
            return Err(MeshHaloError::InvalidConnectivity(format!(
                "eptr ends at {:?}, eind has {} entries",
                eptr.last(),
                eind.len()
            )));
        }
        if let Some(&node) = eind.iter().find(|&&node| node >= n_nodes) {
            return Err(MeshHaloError::InvalidConnectivity(format!(
                "node {node} outside [0, {n_nodes})"
            )));
        }
        Ok(Self { n_nodes, eptr, eind })
    }

    /// Connectivity where every element has `nodes_per_element` nodes.
    pub fn uniform(
        n_nodes: usize,
        nodes_per_element: usize,
        eind: Vec<usize>,
    ) -> Result<Self, MeshHaloError> {
        if nodes_per_element == 0 || eind.len() % nodes_per_element != 0 {
            return Err(MeshHaloError::InvalidConnectivity(format!(
                "{} node ids do not split into elements of {nodes_per_element}",
                eind.len()
            )));
        }
        let n_elements = eind.len() / nodes_per_element;
        let eptr = (0..=n_elements).map(|e| e * nodes_per_element).collect();
        Self::try_new(n_nodes, eptr, eind)
    }

    #[inline]
    pub fn n_elements(&self) -> usize {
        self.eptr.len() - 1
    }

    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    #[inline]
    pub fn nodes_of(&self, e: ElementId) -> &[usize] {
        &self.eind[self.eptr[e]..self.eptr[e + 1]]
    }

    pub fn eptr(&self) -> &[usize] {
        &self.eptr
    }

    pub fn eind(&self) -> &[usize] {
        &self.eind
    }
}
