//! Randomized topologies.
//!
//! Every generator consumes the run's random stream in a fixed order, so the
//! graph is a pure function of the stream state when generation starts.

use super::LinkSet;
use crate::base::SimRng;
use crate::errors::GeometryError;

/// Restarts allowed when stub matching runs into a dead end.
const MAX_RESTARTS: usize = 1000;

/// Rejected draws allowed per requested link before giving up.
const MAX_REJECTS_PER_LINK: usize = 100;

fn check_degree(kind: &'static str, size: usize, degree: usize) -> Result<(), GeometryError> {
    if degree >= size {
        return Err(GeometryError::InvalidDegree {
            kind,
            degree,
            size,
            reason: "degree must be smaller than the size".into(),
        });
    }
    Ok(())
}

/// Random graph with exactly `round(size * degree / 2)` links.
///
/// Each attempt draws two endpoints with `random0n(size)`; self-links and
/// existing links are rejected and redrawn.
pub(super) fn random_graph(
    size: usize,
    degree: usize,
    rng: &mut SimRng,
) -> Result<Vec<Vec<usize>>, GeometryError> {
    const KIND: &str = "random graph";
    check_degree(KIND, size, degree)?;
    let target = (size * degree + 1) / 2;
    let budget = MAX_REJECTS_PER_LINK * target.max(1);
    let mut links = LinkSet::new(size);
    let mut placed = 0;
    let mut rejected = 0;
    while placed < target {
        let a = rng.random0n(size);
        let b = rng.random0n(size);
        if a == b || links.contains(a, b) {
            rejected += 1;
            if rejected > budget {
                return Err(GeometryError::GenerationFailed {
                    kind: KIND,
                    attempts: rejected,
                });
            }
            continue;
        }
        links.link(a, b);
        placed += 1;
    }
    Ok(links.into_lists())
}

/// Random regular graph by stub matching.
///
/// Stubs are kept in a list, initially `[0,0,..,1,1,..]` with `degree`
/// copies per node. Two list positions are drawn with `random0n(len)`; a
/// self-link or duplicate counts as a failure, otherwise the link is added
/// and both stubs are removed (higher position first, by swap-removal). After
/// too many consecutive failures the graph is discarded and matching
/// restarts from the full stub list.
pub(super) fn random_regular(
    size: usize,
    degree: usize,
    rng: &mut SimRng,
) -> Result<Vec<Vec<usize>>, GeometryError> {
    const KIND: &str = "random regular graph";
    check_degree(KIND, size, degree)?;
    if (size * degree) % 2 != 0 {
        return Err(GeometryError::InvalidDegree {
            kind: KIND,
            degree,
            size,
            reason: "size times degree must be even".into(),
        });
    }
    let mut links = LinkSet::new(size);
    for _ in 0..MAX_RESTARTS {
        links.clear();
        if match_stubs(&mut links, size, degree, rng) {
            return Ok(links.into_lists());
        }
    }
    Err(GeometryError::GenerationFailed {
        kind: KIND,
        attempts: MAX_RESTARTS,
    })
}

fn match_stubs(links: &mut LinkSet, size: usize, degree: usize, rng: &mut SimRng) -> bool {
    let mut stubs: Vec<usize> = (0..size)
        .flat_map(|node| std::iter::repeat(node).take(degree))
        .collect();
    let mut failures = 0;
    while !stubs.is_empty() {
        let len = stubs.len();
        let i = rng.random0n(len);
        let j = rng.random0n(len);
        let (a, b) = (stubs[i], stubs[j]);
        if i == j || a == b || links.contains(a, b) {
            failures += 1;
            if failures > len * len {
                return false;
            }
            continue;
        }
        failures = 0;
        links.link(a, b);
        stubs.swap_remove(i.max(j));
        stubs.swap_remove(i.min(j));
    }
    true
}

/// Directed graph in which every node, in index order, draws `degree`
/// distinct out-neighbours with `random0n(size)`.
pub(super) fn directed_random(
    size: usize,
    degree: usize,
    rng: &mut SimRng,
) -> Result<Vec<Vec<usize>>, GeometryError> {
    const KIND: &str = "directed random graph";
    check_degree(KIND, size, degree)?;
    let mut links = LinkSet::new(size);
    for node in 0..size {
        while links.degree(node) < degree {
            let target = rng.random0n(size);
            if target != node && !links.contains(node, target) {
                links.arc(node, target);
            }
        }
    }
    Ok(links.into_lists())
}

/// Preferential attachment.
///
/// Starts from a complete core of `m + 1` nodes with `m = degree / 2`. Each
/// further node draws `m` distinct targets from the list of link endpoints
/// (so a node is picked proportionally to its degree) and links to them in
/// draw order.
pub(super) fn scale_free(
    size: usize,
    degree: usize,
    rng: &mut SimRng,
) -> Result<Vec<Vec<usize>>, GeometryError> {
    const KIND: &str = "scale-free network";
    if degree < 2 || degree % 2 != 0 {
        return Err(GeometryError::InvalidDegree {
            kind: KIND,
            degree,
            size,
            reason: "degree must be even and at least 2".into(),
        });
    }
    let m = degree / 2;
    if size <= m + 1 {
        return Err(GeometryError::InvalidDegree {
            kind: KIND,
            degree,
            size,
            reason: format!("needs more than {} nodes", m + 1),
        });
    }
    let mut links = LinkSet::new(size);
    let mut endpoints = Vec::with_capacity(2 * m * size);
    for a in 0..=m {
        for b in (a + 1)..=m {
            links.link(a, b);
            endpoints.push(a);
            endpoints.push(b);
        }
    }
    let mut targets = Vec::with_capacity(m);
    for node in (m + 1)..size {
        targets.clear();
        while targets.len() < m {
            let t = endpoints[rng.random0n(endpoints.len())];
            if !targets.contains(&t) {
                targets.push(t);
            }
        }
        for &t in &targets {
            links.link(node, t);
            endpoints.push(node);
            endpoints.push(t);
        }
    }
    Ok(links.into_lists())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symmetric(lists: &[Vec<usize>]) -> bool {
        lists
            .iter()
            .enumerate()
            .all(|(i, ns)| ns.iter().all(|&j| j != i && lists[j].contains(&i)))
    }

    #[test]
    fn test_random_graph_link_count() {
        let mut rng = SimRng::new(5);
        let lists = random_graph(101, 3, &mut rng).unwrap();
        let arcs: usize = lists.iter().map(Vec::len).sum();
        assert_eq!(arcs / 2, (101 * 3 + 1) / 2);
        assert!(symmetric(&lists));
    }

    #[test]
    fn test_random_regular_degree() {
        let mut rng = SimRng::new(17);
        let lists = random_regular(50, 4, &mut rng).unwrap();
        assert!(lists.iter().all(|ns| ns.len() == 4));
        assert!(symmetric(&lists));
    }

    #[test]
    fn test_random_regular_rejects_odd_sum() {
        let mut rng = SimRng::new(1);
        let err = random_regular(11, 3, &mut rng).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidDegree { .. }));
    }

    #[test]
    fn test_same_seed_same_graph() {
        let a = random_regular(40, 3, &mut SimRng::new(99)).unwrap();
        let b = random_regular(40, 3, &mut SimRng::new(99)).unwrap();
        assert_eq!(a, b);
        let c = random_regular(40, 3, &mut SimRng::new(100)).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_directed_random_out_degree() {
        let mut rng = SimRng::new(3);
        let lists = directed_random(30, 5, &mut rng).unwrap();
        for (i, ns) in lists.iter().enumerate() {
            assert_eq!(ns.len(), 5);
            assert!(!ns.contains(&i));
        }
        assert!(directed_random(5, 5, &mut rng).is_err());
    }

    #[test]
    fn test_scale_free_mean_degree() {
        let mut rng = SimRng::new(8);
        let size = 500;
        let lists = scale_free(size, 4, &mut rng).unwrap();
        assert!(symmetric(&lists));
        let arcs: usize = lists.iter().map(Vec::len).sum();
        // core of 3 nodes with 3 links plus 2 links per later node
        assert_eq!(arcs / 2, 3 + 2 * (size - 3));
        assert!(lists.iter().all(|ns| ns.len() >= 2));
        assert!(scale_free(10, 3, &mut rng).is_err());
    }
}
