//! Hierarchical meta-populations.
//!
//! Node indices are read as mixed-radix numbers with digit `l` ranging over
//! `units[l]`. Digit 0 is the position inside a deme; higher digits address
//! nested groups of demes. A node links to every node that differs from it in
//! exactly one digit: the whole of its own deme, and at each higher level the
//! node at the same position in every sibling group.
//!
//! Neighbours are listed by level, then by digit value.

use crate::errors::GeometryError;

const KIND: &str = "hierarchical";

pub(super) fn hierarchical(size: usize, units: &[usize]) -> Result<Vec<Vec<usize>>, GeometryError> {
    if units.is_empty() {
        return Err(GeometryError::InvalidSize {
            kind: KIND,
            size,
            reason: "at least one level is required".into(),
        });
    }
    if let Some(&u) = units.iter().find(|&&u| u < 2) {
        return Err(GeometryError::InvalidSize {
            kind: KIND,
            size,
            reason: format!("every level needs at least 2 units, found {u}"),
        });
    }
    let product = units
        .iter()
        .try_fold(1usize, |acc, &u| acc.checked_mul(u))
        .filter(|&p| p == size);
    if product.is_none() {
        return Err(GeometryError::InvalidSize {
            kind: KIND,
            size,
            reason: format!("size must equal the product of units {units:?}"),
        });
    }

    let mut strides = Vec::with_capacity(units.len());
    let mut stride = 1;
    for &u in units {
        strides.push(stride);
        stride *= u;
    }

    let degree: usize = units.iter().map(|u| u - 1).sum();
    Ok((0..size)
        .map(|node| {
            let mut neighbors = Vec::with_capacity(degree);
            for (&u, &s) in units.iter().zip(&strides) {
                let digit = (node / s) % u;
                let base = node - digit * s;
                neighbors.extend((0..u).filter(|&v| v != digit).map(|v| base + v * s));
            }
            neighbors
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_level_is_complete() {
        let lists = hierarchical(4, &[4]).unwrap();
        assert_eq!(lists[0], vec![1, 2, 3]);
        assert_eq!(lists[2], vec![0, 1, 3]);
    }

    #[test]
    fn test_two_levels() {
        // three demes of four nodes
        let lists = hierarchical(12, &[4, 3]).unwrap();
        assert_eq!(lists[5], vec![4, 6, 7, 1, 9]);
        assert!(lists.iter().all(|ns| ns.len() == 5));
        for (i, ns) in lists.iter().enumerate() {
            for &j in ns {
                assert!(lists[j].contains(&i));
            }
        }
    }

    #[test]
    fn test_rejects_bad_units() {
        assert!(hierarchical(12, &[]).is_err());
        assert!(hierarchical(12, &[4, 4]).is_err());
        assert!(hierarchical(4, &[4, 1]).is_err());
    }
}
