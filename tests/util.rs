#![allow(dead_code)]
use mesh_halo::topology::{ElementMesh, InteriorFace, MeshAdjacency, PartitionAssignment};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Chain `0 - 1 - ... - (n-1)`, face `i` joins `i` and `i + 1`.
pub fn chain_faces(n: usize) -> Vec<(usize, usize)> {
    (1..n).map(|e| (e - 1, e)).collect()
}

pub fn chain(parts: Vec<usize>) -> MeshAdjacency {
    let faces = chain_faces(parts.len());
    MeshAdjacency::from_pairs(&PartitionAssignment::new(parts), &faces).unwrap()
}

/// Interior faces of an `nx × ny` grid of quads, element `(i, j)` = `j * nx + i`.
pub fn grid_faces(nx: usize, ny: usize) -> Vec<InteriorFace> {
    let id = |i: usize, j: usize| j * nx + i;
    let mut faces = Vec::new();
    for j in 0..ny {
        for i in 0..nx {
            if i + 1 < nx {
                faces.push(InteriorFace::new(id(i, j), id(i + 1, j)));
            }
            if j + 1 < ny {
                faces.push(InteriorFace::new(id(i, j), id(i, j + 1)));
            }
        }
    }
    faces
}

/// Element→node connectivity of the same grid.
pub fn grid_mesh(nx: usize, ny: usize) -> ElementMesh {
    let node = |i: usize, j: usize| j * (nx + 1) + i;
    let mut eind = Vec::with_capacity(nx * ny * 4);
    for j in 0..ny {
        for i in 0..nx {
            eind.extend([node(i, j), node(i + 1, j), node(i + 1, j + 1), node(i, j + 1)]);
        }
    }
    ElementMesh::uniform((nx + 1) * (ny + 1), 4, eind).unwrap()
}

/// Grid split into four quadrants, numbered row-major.
pub fn quadrant_parts(nx: usize, ny: usize) -> Vec<usize> {
    let mut parts = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let right = usize::from(i >= nx / 2);
            let top = usize::from(j >= ny / 2);
            parts.push(2 * top + right);
        }
    }
    parts
}

pub fn quadrant_grid(nx: usize, ny: usize) -> MeshAdjacency {
    MeshAdjacency::try_new(
        nx * ny,
        &PartitionAssignment::new(quadrant_parts(nx, ny)),
        grid_faces(nx, ny),
    )
    .unwrap()
}

/// Random connected mesh: a shuffled chain plus `extra` random faces, with
/// random partition ids in `0..n_parts`. Faces may repeat; self-faces are skipped.
pub fn random_mesh(seed: u64, n: usize, extra: usize, n_parts: usize) -> MeshAdjacency {
    let mut rng = SmallRng::seed_from_u64(seed);
    let parts: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n_parts)).collect();
    let mut faces: Vec<InteriorFace> = (1..n)
        .map(|e| InteriorFace::new(rng.gen_range(0..e), e))
        .collect();
    while faces.len() < n.saturating_sub(1) + extra && n > 1 {
        let (l, r) = (rng.gen_range(0..n), rng.gen_range(0..n));
        if l != r {
            faces.push(InteriorFace::new(l, r));
        }
    }
    MeshAdjacency::try_new(n, &PartitionAssignment::new(parts), faces).unwrap()
}

/// Fisher–Yates shuffle driven by a seeded `SmallRng`.
pub fn shuffled(n: usize, seed: u64) -> Vec<usize> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut v: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        let j = rng.gen_range(0..=i);
        v.swap(i, j);
    }
    v
}

/// Assert vec is a permutation of another vec (order-agnostic).
pub fn assert_permutation<T: Ord + Copy + std::fmt::Debug>(got: &[T], want: &[T]) {
    let mut a = got.to_vec();
    a.sort_unstable();
    let mut b = want.to_vec();
    b.sort_unstable();
    assert_eq!(a, b, "not a permutation\n got={:?}\nwant={:?}", got, want);
}

/// Component-wise closeness with a relative tolerance.
pub fn assert_close(a: &[f64], b: &[f64], rel: f64) {
    assert_eq!(a.len(), b.len());
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        let scale = x.abs().max(y.abs()).max(1.0);
        assert!(
            (x - y).abs() <= rel * scale,
            "component {i}: {x} vs {y} (rel tol {rel})"
        );
    }
}
