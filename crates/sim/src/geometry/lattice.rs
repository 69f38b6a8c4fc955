//! Deterministic topologies: regular lattices, the complete graph and the star.
//!
//! Lattice nodes are numbered row-major (`x` fastest). Neighbours are listed
//! in the order of the offset tables below; with fixed boundaries offsets
//! that leave the lattice are skipped.

use super::{Boundary, LinkSet, Neighborhood};
use crate::errors::GeometryError;

const VON_NEUMANN: &[(isize, isize)] = &[(0, -1), (-1, 0), (1, 0), (0, 1)];
const SECOND_NEIGHBOR: &[(isize, isize)] = &[(-1, -1), (1, -1), (-1, 1), (1, 1)];
const MOORE: &[(isize, isize)] = &[
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];
const CUBIC: &[(isize, isize, isize)] = &[
    (0, 0, -1),
    (0, -1, 0),
    (-1, 0, 0),
    (1, 0, 0),
    (0, 1, 0),
    (0, 0, 1),
];
const HEX_EVEN_ROW: &[(isize, isize)] = &[(-1, 0), (1, 0), (-1, -1), (0, -1), (-1, 1), (0, 1)];
const HEX_ODD_ROW: &[(isize, isize)] = &[(-1, 0), (1, 0), (0, -1), (1, -1), (0, 1), (1, 1)];
const BRICK_UP: &[(isize, isize)] = &[(-1, 0), (1, 0), (0, -1)];
const BRICK_DOWN: &[(isize, isize)] = &[(-1, 0), (1, 0), (0, 1)];

/// Integer `k`-th root of `size`, if `size` is a perfect power.
fn exact_root(size: usize, k: u32) -> Option<usize> {
    let guess = (size as f64).powf(1.0 / k as f64).round() as usize;
    (guess.saturating_sub(1)..=guess + 1).find(|r| r.checked_pow(k) == Some(size))
}

fn invalid_size(kind: &'static str, size: usize, reason: impl Into<String>) -> GeometryError {
    GeometryError::InvalidSize {
        kind,
        size,
        reason: reason.into(),
    }
}

/// Wrap or reject a coordinate on an axis of length `side`.
#[inline]
fn coordinate(c: isize, side: usize, boundary: Boundary) -> Option<usize> {
    let side = side as isize;
    match boundary {
        Boundary::Periodic => Some(c.rem_euclid(side) as usize),
        Boundary::Fixed => (0..side).contains(&c).then_some(c as usize),
    }
}

/// Side length of a square grid over `size` nodes.
fn square_side(
    kind: &'static str,
    size: usize,
    boundary: Boundary,
    min_periodic: usize,
    even: bool,
) -> Result<usize, GeometryError> {
    let side = exact_root(size, 2)
        .ok_or_else(|| invalid_size(kind, size, "size must be a perfect square"))?;
    if boundary == Boundary::Periodic {
        if side < min_periodic {
            return Err(invalid_size(
                kind,
                size,
                format!("periodic lattice needs a side of at least {min_periodic}"),
            ));
        }
        if even && side % 2 != 0 {
            return Err(invalid_size(
                kind,
                size,
                "periodic lattice needs an even side length",
            ));
        }
    } else if side < 2 {
        return Err(invalid_size(kind, size, "lattice needs a side of at least 2"));
    }
    Ok(side)
}

/// Link every node to every other node, in index order.
pub(super) fn complete(size: usize) -> Result<Vec<Vec<usize>>, GeometryError> {
    if size < 2 {
        return Err(invalid_size("complete", size, "needs at least 2 nodes"));
    }
    Ok((0..size)
        .map(|i| (0..size).filter(|&j| j != i).collect())
        .collect())
}

/// Hub 0 linked to every leaf.
pub(super) fn star(size: usize) -> Result<Vec<Vec<usize>>, GeometryError> {
    if size < 2 {
        return Err(invalid_size("star", size, "needs a hub and at least one leaf"));
    }
    let mut links = LinkSet::new(size);
    for leaf in 1..size {
        links.link(0, leaf);
    }
    Ok(links.into_lists())
}

/// Ring or line where each node links to `neighbors / 2` nodes on each side,
/// listed from the farthest left to the farthest right.
pub(super) fn linear(
    size: usize,
    neighbors: usize,
    boundary: Boundary,
) -> Result<Vec<Vec<usize>>, GeometryError> {
    if neighbors == 0 || neighbors % 2 != 0 {
        return Err(GeometryError::InvalidDegree {
            kind: "linear",
            degree: neighbors,
            size,
            reason: "neighbour count must be even and positive".into(),
        });
    }
    if neighbors >= size {
        return Err(GeometryError::InvalidDegree {
            kind: "linear",
            degree: neighbors,
            size,
            reason: "neighbour count must be smaller than the size".into(),
        });
    }
    let half = (neighbors / 2) as isize;
    Ok((0..size)
        .map(|i| {
            (-half..=half)
                .filter(|&d| d != 0)
                .filter_map(|d| coordinate(i as isize + d, size, boundary))
                .collect()
        })
        .collect())
}

pub(super) fn square(
    size: usize,
    neighborhood: Neighborhood,
    boundary: Boundary,
) -> Result<Vec<Vec<usize>>, GeometryError> {
    let side = square_side("square", size, boundary, 3, false)?;
    let offsets = match neighborhood {
        Neighborhood::VonNeumann => VON_NEUMANN,
        Neighborhood::SecondNeighbor => SECOND_NEIGHBOR,
        Neighborhood::Moore => MOORE,
    };
    Ok(grid(side, boundary, |_, _| offsets))
}

/// Hexagonal lattice with odd rows shifted half a cell to the right.
pub(super) fn hexagonal(size: usize, boundary: Boundary) -> Result<Vec<Vec<usize>>, GeometryError> {
    let side = square_side("hexagonal", size, boundary, 4, true)?;
    Ok(grid(side, boundary, |_, y| {
        if y % 2 == 0 {
            HEX_EVEN_ROW
        } else {
            HEX_ODD_ROW
        }
    }))
}

/// Honeycomb drawn as a brick wall: left, right, and one vertical link that
/// points up when `x + y` is even and down otherwise.
pub(super) fn triangular(size: usize, boundary: Boundary) -> Result<Vec<Vec<usize>>, GeometryError> {
    let side = square_side("triangular", size, boundary, 4, true)?;
    Ok(grid(side, boundary, |x, y| {
        if (x + y) % 2 == 0 {
            BRICK_UP
        } else {
            BRICK_DOWN
        }
    }))
}

fn grid<'a, F>(side: usize, boundary: Boundary, offsets: F) -> Vec<Vec<usize>>
where
    F: Fn(usize, usize) -> &'a [(isize, isize)],
{
    let mut out = Vec::with_capacity(side * side);
    for y in 0..side {
        for x in 0..side {
            let neighbors = offsets(x, y)
                .iter()
                .filter_map(|&(dx, dy)| {
                    let nx = coordinate(x as isize + dx, side, boundary)?;
                    let ny = coordinate(y as isize + dy, side, boundary)?;
                    Some(ny * side + nx)
                })
                .collect();
            out.push(neighbors);
        }
    }
    out
}

pub(super) fn cubic(size: usize, boundary: Boundary) -> Result<Vec<Vec<usize>>, GeometryError> {
    let side = exact_root(size, 3)
        .ok_or_else(|| invalid_size("cubic", size, "size must be a perfect cube"))?;
    let min = if boundary == Boundary::Periodic { 3 } else { 2 };
    if side < min {
        return Err(invalid_size(
            "cubic",
            size,
            format!("lattice needs a side of at least {min}"),
        ));
    }
    let mut out = Vec::with_capacity(size);
    for z in 0..side {
        for y in 0..side {
            for x in 0..side {
                let neighbors = CUBIC
                    .iter()
                    .filter_map(|&(dx, dy, dz)| {
                        let nx = coordinate(x as isize + dx, side, boundary)?;
                        let ny = coordinate(y as isize + dy, side, boundary)?;
                        let nz = coordinate(z as isize + dz, side, boundary)?;
                        Some((nz * side + ny) * side + nx)
                    })
                    .collect();
                out.push(neighbors);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn degrees(lists: &[Vec<usize>]) -> Vec<usize> {
        lists.iter().map(Vec::len).collect()
    }

    fn is_symmetric(lists: &[Vec<usize>]) -> bool {
        lists
            .iter()
            .enumerate()
            .all(|(i, ns)| ns.iter().all(|&j| lists[j].contains(&i)))
    }

    #[test]
    fn test_exact_root() {
        assert_eq!(exact_root(100, 2), Some(10));
        assert_eq!(exact_root(99, 2), None);
        assert_eq!(exact_root(27, 3), Some(3));
        assert_eq!(exact_root(1_000_000, 3), Some(100));
    }

    #[test]
    fn test_square_neighbor_order() {
        let lists = square(9, Neighborhood::VonNeumann, Boundary::Periodic).unwrap();
        // node 4 is the centre of a 3x3 grid
        assert_eq!(lists[4], vec![1, 3, 5, 7]);
        // node 0 wraps around both axes
        assert_eq!(lists[0], vec![6, 2, 1, 3]);
    }

    #[test]
    fn test_square_fixed_boundary_corners() {
        let lists = square(16, Neighborhood::Moore, Boundary::Fixed).unwrap();
        assert_eq!(lists[0].len(), 3);
        assert_eq!(lists[1].len(), 5);
        assert_eq!(lists[5].len(), 8);
        assert!(is_symmetric(&lists));
    }

    #[test]
    fn test_second_neighbor_splits_sublattices() {
        let lists = square(16, Neighborhood::SecondNeighbor, Boundary::Periodic).unwrap();
        for (i, ns) in lists.iter().enumerate() {
            let parity = (i % 4 + i / 4) % 2;
            assert!(ns.iter().all(|&j| (j % 4 + j / 4) % 2 == parity));
        }
    }

    #[test]
    fn test_square_rejects_bad_sizes() {
        assert!(square(50, Neighborhood::Moore, Boundary::Periodic).is_err());
        assert!(square(4, Neighborhood::Moore, Boundary::Periodic).is_err());
        assert!(square(4, Neighborhood::Moore, Boundary::Fixed).is_ok());
    }

    #[test]
    fn test_linear_ring_and_line() {
        let ring = linear(10, 4, Boundary::Periodic).unwrap();
        assert_eq!(ring[0], vec![8, 9, 1, 2]);
        assert!(degrees(&ring).iter().all(|&d| d == 4));

        let line = linear(10, 2, Boundary::Fixed).unwrap();
        assert_eq!(line[0], vec![1]);
        assert_eq!(line[9], vec![8]);
        assert!(is_symmetric(&line));

        assert!(linear(10, 3, Boundary::Periodic).is_err());
        assert!(linear(4, 4, Boundary::Periodic).is_err());
    }

    #[test]
    fn test_cubic_degree() {
        let lists = cubic(64, Boundary::Periodic).unwrap();
        assert!(degrees(&lists).iter().all(|&d| d == 6));
        assert!(is_symmetric(&lists));
        assert!(cubic(60, Boundary::Periodic).is_err());
    }

    #[test]
    fn test_hexagonal_and_triangular() {
        let hex = hexagonal(36, Boundary::Periodic).unwrap();
        assert!(degrees(&hex).iter().all(|&d| d == 6));
        assert!(is_symmetric(&hex));
        assert!(hexagonal(25, Boundary::Periodic).is_err());

        let tri = triangular(36, Boundary::Periodic).unwrap();
        assert!(degrees(&tri).iter().all(|&d| d == 3));
        assert!(is_symmetric(&tri));

        let tri_fixed = triangular(25, Boundary::Fixed).unwrap();
        assert!(is_symmetric(&tri_fixed));
    }

    #[test]
    fn test_star_and_complete() {
        let s = star(5).unwrap();
        assert_eq!(s[0], vec![1, 2, 3, 4]);
        assert_eq!(s[3], vec![0]);
        let c = complete(4).unwrap();
        assert_eq!(c[2], vec![0, 1, 3]);
        assert!(star(1).is_err());
    }
}
