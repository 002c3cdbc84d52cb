//! Human-readable partition report.

use crate::topology::PartitionId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element and face counts of one partition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartCounts {
    pub part: PartitionId,
    pub owned: usize,
    pub private: usize,
    pub shared: usize,
    pub ghost: usize,
    pub faces: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSummary {
    pub n_elements: usize,
    pub n_faces: usize,
    pub parts: Vec<PartCounts>,
}

impl PartitionSummary {
    /// Total halo entries over all partitions.
    pub fn total_ghost(&self) -> usize {
        self.parts.iter().map(|c| c.ghost).sum()
    }

    /// Ratio of largest to mean owned count; `1.0` for a perfect split.
    pub fn imbalance(&self) -> f64 {
        if self.parts.is_empty() || self.n_elements == 0 {
            return 1.0;
        }
        let max = self.parts.iter().map(|c| c.owned).max().unwrap_or(0) as f64;
        max * self.parts.len() as f64 / self.n_elements as f64
    }
}

impl fmt::Display for PartitionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} elements, {} interior faces, {} partitions (imbalance {:.3})",
            self.n_elements,
            self.n_faces,
            self.parts.len(),
            self.imbalance()
        )?;
        writeln!(
            f,
            "{:>6} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "part", "owned", "private", "shared", "ghost", "faces"
        )?;
        for c in &self.parts {
            writeln!(
                f,
                "{:>6} {:>10} {:>10} {:>10} {:>10} {:>10}",
                c.part, c.owned, c.private, c.shared, c.ghost, c.faces
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_has_a_row_per_partition() {
        let s = PartitionSummary {
            n_elements: 4,
            n_faces: 3,
            parts: vec![
                PartCounts {
                    part: 0,
                    owned: 2,
                    private: 1,
                    shared: 1,
                    ghost: 1,
                    faces: 2,
                },
                PartCounts {
                    part: 1,
                    owned: 2,
                    private: 1,
                    shared: 1,
                    ghost: 1,
                    faces: 1,
                },
            ],
        };
        let text = s.to_string();
        assert_eq!(text.lines().count(), 4);
        assert!(text.starts_with("4 elements, 3 interior faces, 2 partitions"));
        assert_eq!(s.total_ghost(), 2);
        assert!((s.imbalance() - 1.0).abs() < 1e-15);
    }
}
