mod util;

use mesh_halo::algs::reindex_classified;
use mesh_halo::mesh_error::MeshHaloError;
use mesh_halo::overlap::{Classification, MAX_PARTITIONS, Role, classify};
use mesh_halo::topology::{MeshAdjacency, PartitionAssignment};
use mesh_halo::DebugInvariants;
use proptest::prelude::*;
use util::*;

fn check_laws(adj: &MeshAdjacency, c: &Classification) {
    c.validate_invariants().unwrap();
    for v in c.views() {
        let owned: Vec<usize> = (0..adj.n_elements())
            .filter(|&e| adj.partition_of(e) == v.part)
            .collect();
        // private ∪ shared = owned, disjoint
        assert_eq!(v.owned(), owned);
        assert!(v.private.iter().all(|e| v.shared.binary_search(e).is_err()));
    }
    // ghost symmetry
    for face in adj.faces() {
        let (pl, pr) = (adj.partition_of(face.left), adj.partition_of(face.right));
        if pl != pr {
            assert!(c.view(pl).unwrap().ghost.contains(&face.right));
            assert!(c.view(pr).unwrap().ghost.contains(&face.left));
        }
    }
    // bit k set iff ghost for k
    for e in 0..adj.n_elements() {
        for k in 0..c.n_parts() {
            let is_ghost = c.view(k).unwrap().ghost.binary_search(&e).is_ok();
            assert_eq!(c.mask(e).contains(k), is_ghost, "element {e}, partition {k}");
            assert_eq!(c.role_of(e, k) == Some(Role::Ghost), is_ghost);
        }
    }
}

/// Mask bits of every element keyed by original id.
fn masks_by_original(c: &Classification, new_to_old: &[usize]) -> Vec<Vec<usize>> {
    let mut out = vec![Vec::new(); new_to_old.len()];
    for (new, &old) in new_to_old.iter().enumerate() {
        out[old] = c.sharing_partitions(new);
    }
    out
}

#[test]
fn single_partition_has_no_halo() {
    let adj = chain(vec![0; 10]);
    let c = classify(&adj, 1).unwrap();
    check_laws(&adj, &c);
    let v = c.view(0).unwrap();
    assert_eq!(v.private, (0..10).collect::<Vec<_>>());
    assert!(v.shared.is_empty() && v.ghost.is_empty());
    assert_eq!(v.faces.len(), 9);
}

#[test]
fn quadrants_all_have_boundaries() {
    let adj = quadrant_grid(6, 6);
    let c = classify(&adj, 4).unwrap();
    check_laws(&adj, &c);
    for v in c.views() {
        assert!(!v.shared.is_empty(), "partition {} has no shared element", v.part);
        assert!(!v.ghost.is_empty(), "partition {} has no ghost element", v.part);
    }
    // quadrant corners touch two other partitions
    let corner = 2 * 6 + 2;
    assert_eq!(c.sharing_partitions(corner), vec![1, 2]);
}

#[test]
fn isolated_elements_are_private() {
    let a = PartitionAssignment::new(vec![0, 1, 2]);
    let adj = MeshAdjacency::try_new(3, &a, Vec::new()).unwrap();
    let c = classify(&adj, 3).unwrap();
    for e in 0..3 {
        assert_eq!(c.role_of(e, e), Some(Role::Private));
        assert!(c.mask(e).is_empty());
    }
}

#[test]
fn capacity_is_a_configuration_error() {
    let adj = chain(vec![0, 0, 1]);
    assert_eq!(
        classify(&adj, MAX_PARTITIONS + 1).unwrap_err(),
        MeshHaloError::PartitionCountExceedsCapacity {
            requested: MAX_PARTITIONS + 1,
            capacity: MAX_PARTITIONS
        }
    );
    assert!(classify(&adj, MAX_PARTITIONS).is_ok());
}

#[test]
fn highest_partition_bit_is_kept() {
    let last = MAX_PARTITIONS - 1;
    let adj = chain(vec![0, last]);
    let c = classify(&adj, MAX_PARTITIONS).unwrap();
    assert_eq!(c.sharing_partitions(0), vec![last]);
    assert_eq!(c.sharing_partitions(1), vec![0]);
}

#[test]
fn unassigned_element_is_rejected() {
    let mut a = PartitionAssignment::new(vec![0, 1, 1]);
    a.unassign(1);
    assert_eq!(
        MeshAdjacency::from_pairs(&a, &[(0, 1), (1, 2)]).unwrap_err(),
        MeshHaloError::UnpartitionedElement(1)
    );
}

proptest! {
    #[test]
    fn laws_hold_on_random_meshes(
        seed in any::<u64>(),
        n in 1usize..60,
        extra in 0usize..40,
        n_parts in 1usize..6,
    ) {
        let adj = random_mesh(seed, n, extra, n_parts);
        let c = classify(&adj, n_parts).unwrap();
        check_laws(&adj, &c);
        prop_assert_eq!(
            c.views().iter().map(|v| v.faces.len()).sum::<usize>(),
            adj.n_faces()
        );
    }

    #[test]
    fn masks_survive_reindexing(
        seed in any::<u64>(),
        n in 2usize..50,
        extra in 0usize..30,
        n_parts in 2usize..5,
    ) {
        let adj = random_mesh(seed, n, extra, n_parts);
        let c = classify(&adj, n_parts).unwrap();
        let r = reindex_classified(&adj, &c).unwrap();
        check_laws(&r.adjacency, &r.classification);
        let identity: Vec<usize> = (0..n).collect();
        prop_assert_eq!(
            masks_by_original(&c, &identity),
            masks_by_original(&r.classification, r.permutation.new_to_old())
        );
    }
}
