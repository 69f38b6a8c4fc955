//! Interaction geometries.
//!
//! A [`Geometry`] is the graph over which agents interact and compete. It is
//! built once per run from a [`GeometryConfig`] and stays immutable while the
//! run advances. Randomized topologies draw from the run's single
//! [`SimRng`], so the same seed always yields the same graph.
//!
//! Undirected graphs store every link once in each direction; the in- and
//! out-neighbour lists are then identical. Neighbour order is deterministic
//! and documented per generator because player updates index into it.

mod hierarchy;
mod lattice;
mod random;

use crate::base::SimRng;
use crate::errors::GeometryError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Neighbourhood of a node on a square lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Neighborhood {
    /// The four orthogonal neighbours.
    VonNeumann,
    /// The four diagonal neighbours. Splits the lattice into two disjoint
    /// sub-lattices.
    SecondNeighbor,
    /// All eight surrounding nodes.
    Moore,
}

/// Boundary condition of a lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// Opposite edges are joined.
    #[default]
    Periodic,
    /// Non-periodic (reflective) edges: links that would cross an edge are
    /// dropped and boundary nodes have fewer neighbours. Also read as
    /// `reflective`.
    #[serde(alias = "reflective")]
    Fixed,
}

/// Topology family and its shape parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeometryType {
    /// Every agent interacts with every other agent; no explicit links.
    WellMixed,
    /// Explicit complete graph.
    Complete,
    /// Ring (periodic) or line (fixed) with `neighbors / 2` links per side.
    Linear { neighbors: usize },
    /// Square lattice of side `sqrt(N)`.
    Square { neighborhood: Neighborhood },
    /// Cubic lattice of side `cbrt(N)`, six neighbours.
    Cubic,
    /// Hexagonal lattice on a square grid with offset rows, six neighbours.
    Hexagonal,
    /// Honeycomb (brick-wall) lattice on a square grid, three neighbours.
    Triangular,
    /// Node 0 linked to every other node.
    Star,
    /// Random graph with `round(N * degree / 2)` links.
    RandomGraph { degree: usize },
    /// Random graph where every node has exactly `degree` links.
    RandomRegular { degree: usize },
    /// Directed random graph; every node has `degree` distinct out-links.
    DirectedRandom { degree: usize },
    /// Preferential attachment with `degree / 2` links per new node.
    ScaleFree { degree: usize },
    /// Nested demes; `units[0]` is the deme size, `units[l]` the number of
    /// sibling groups at level `l`. The product must equal the size.
    Hierarchical { units: Vec<usize> },
}

impl GeometryType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::WellMixed => "well-mixed",
            Self::Complete => "complete",
            Self::Linear { .. } => "linear",
            Self::Square { .. } => "square",
            Self::Cubic => "cubic",
            Self::Hexagonal => "hexagonal",
            Self::Triangular => "triangular",
            Self::Star => "star",
            Self::RandomGraph { .. } => "random graph",
            Self::RandomRegular { .. } => "random regular graph",
            Self::DirectedRandom { .. } => "directed random graph",
            Self::ScaleFree { .. } => "scale-free network",
            Self::Hierarchical { .. } => "hierarchical",
        }
    }

    /// Whether generating this topology consumes random draws.
    pub fn is_randomized(&self) -> bool {
        matches!(
            self,
            Self::RandomGraph { .. }
                | Self::RandomRegular { .. }
                | Self::DirectedRandom { .. }
                | Self::ScaleFree { .. }
        )
    }

    pub fn is_directed(&self) -> bool {
        matches!(self, Self::DirectedRandom { .. })
    }

    pub fn is_lattice(&self) -> bool {
        matches!(
            self,
            Self::Linear { .. }
                | Self::Square { .. }
                | Self::Cubic
                | Self::Hexagonal
                | Self::Triangular
        )
    }

    /// Degree every node has when the topology is regular, `None` otherwise.
    ///
    /// Lattices with fixed boundaries are not regular.
    pub fn regular_degree(&self, size: usize, boundary: Boundary) -> Option<usize> {
        if self.is_lattice() && boundary == Boundary::Fixed {
            return None;
        }
        match self {
            Self::WellMixed | Self::Complete => Some(size.saturating_sub(1)),
            Self::Linear { neighbors } => Some(*neighbors),
            Self::Square { neighborhood } => Some(match neighborhood {
                Neighborhood::VonNeumann | Neighborhood::SecondNeighbor => 4,
                Neighborhood::Moore => 8,
            }),
            Self::Cubic | Self::Hexagonal => Some(6),
            Self::Triangular => Some(3),
            Self::RandomRegular { degree } => Some(*degree),
            Self::Hierarchical { units } => {
                Some(units.iter().map(|u| u.saturating_sub(1)).sum())
            }
            Self::Star
            | Self::RandomGraph { .. }
            | Self::DirectedRandom { .. }
            | Self::ScaleFree { .. } => None,
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear { neighbors } => write!(f, "linear ({neighbors} neighbours)"),
            Self::Square { neighborhood } => write!(f, "square ({neighborhood:?})"),
            Self::RandomGraph { degree }
            | Self::RandomRegular { degree }
            | Self::DirectedRandom { degree }
            | Self::ScaleFree { degree } => write!(f, "{} (degree {degree})", self.name()),
            Self::Hierarchical { units } => write!(f, "hierarchical {units:?}"),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Geometry parameters as they appear in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Topology family
    pub topology: GeometryType,
    /// Number of nodes
    pub size: usize,
    /// Boundary condition (lattices only)
    #[serde(default)]
    pub boundary: Boundary,
}

impl GeometryConfig {
    pub fn new(topology: GeometryType, size: usize) -> Self {
        Self {
            topology,
            size,
            boundary: Boundary::Periodic,
        }
    }

    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn well_mixed(size: usize) -> Self {
        Self::new(GeometryType::WellMixed, size)
    }

    pub fn square(size: usize, neighborhood: Neighborhood) -> Self {
        Self::new(GeometryType::Square { neighborhood }, size)
    }
}

/// An interaction graph over `size` nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geometry {
    config: GeometryConfig,
    directed: bool,
    out: Vec<Vec<usize>>,
    inn: Vec<Vec<usize>>,
}

impl Geometry {
    /// Build the geometry described by `config`, drawing from `rng` for
    /// randomized topologies.
    pub fn new(config: &GeometryConfig, rng: &mut SimRng) -> Result<Self, GeometryError> {
        let size = config.size;
        if size == 0 {
            return Err(GeometryError::InvalidSize {
                kind: config.topology.name(),
                size,
                reason: "population must contain at least one node".into(),
            });
        }
        let boundary = config.boundary;
        let out = match &config.topology {
            GeometryType::WellMixed => Vec::new(),
            GeometryType::Complete => lattice::complete(size)?,
            GeometryType::Linear { neighbors } => lattice::linear(size, *neighbors, boundary)?,
            GeometryType::Square { neighborhood } => {
                lattice::square(size, *neighborhood, boundary)?
            }
            GeometryType::Cubic => lattice::cubic(size, boundary)?,
            GeometryType::Hexagonal => lattice::hexagonal(size, boundary)?,
            GeometryType::Triangular => lattice::triangular(size, boundary)?,
            GeometryType::Star => lattice::star(size)?,
            GeometryType::RandomGraph { degree } => random::random_graph(size, *degree, rng)?,
            GeometryType::RandomRegular { degree } => {
                random::random_regular(size, *degree, rng)?
            }
            GeometryType::DirectedRandom { degree } => {
                random::directed_random(size, *degree, rng)?
            }
            GeometryType::ScaleFree { degree } => random::scale_free(size, *degree, rng)?,
            GeometryType::Hierarchical { units } => hierarchy::hierarchical(size, units)?,
        };
        let geometry = Self::assemble(config.clone(), out);
        tracing::debug!(
            topology = %config.topology,
            size,
            links = geometry.link_count(),
            "geometry constructed"
        );
        Ok(geometry)
    }

    /// Rebuild a geometry from explicit out-neighbour lists (snapshot import).
    pub fn from_links(
        config: &GeometryConfig,
        out: Vec<Vec<usize>>,
    ) -> Result<Self, GeometryError> {
        if config.topology == GeometryType::WellMixed {
            if !out.is_empty() {
                return Err(GeometryError::Inconsistent(
                    "well-mixed geometry cannot carry explicit links".into(),
                ));
            }
        } else if out.len() != config.size {
            return Err(GeometryError::Inconsistent(format!(
                "expected {} neighbour lists, found {}",
                config.size,
                out.len()
            )));
        }
        if let Some(bad) = out.iter().flatten().find(|&&j| j >= config.size) {
            return Err(GeometryError::Inconsistent(format!(
                "neighbour index {bad} out of range for {} nodes",
                config.size
            )));
        }
        let geometry = Self::assemble(config.clone(), out);
        geometry.check_consistency()?;
        Ok(geometry)
    }

    fn assemble(config: GeometryConfig, out: Vec<Vec<usize>>) -> Self {
        let directed = config.topology.is_directed();
        let inn = if directed {
            let mut inn = vec![Vec::new(); config.size];
            for (i, targets) in out.iter().enumerate() {
                for &j in targets {
                    inn[j].push(i);
                }
            }
            inn
        } else {
            out.clone()
        };
        Self {
            config,
            directed,
            out,
            inn,
        }
    }

    pub fn config(&self) -> &GeometryConfig {
        &self.config
    }

    pub fn topology(&self) -> &GeometryType {
        &self.config.topology
    }

    pub fn boundary(&self) -> Boundary {
        self.config.boundary
    }

    /// Number of nodes.
    pub fn size(&self) -> usize {
        self.config.size
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// True when interactions are global and no explicit links exist.
    pub fn is_well_mixed(&self) -> bool {
        self.config.topology == GeometryType::WellMixed
    }

    /// Nodes that `node` looks at (interaction and reference partners).
    ///
    /// Empty for well-mixed populations, where every other node is a partner.
    #[inline]
    pub fn out_neighbors(&self, node: usize) -> &[usize] {
        self.out.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Nodes that look at `node`.
    #[inline]
    pub fn in_neighbors(&self, node: usize) -> &[usize] {
        self.inn.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of interaction partners of `node`.
    pub fn degree(&self, node: usize) -> usize {
        if self.is_well_mixed() {
            self.size().saturating_sub(1)
        } else {
            self.out_neighbors(node).len()
        }
    }

    pub fn in_degree(&self, node: usize) -> usize {
        if self.is_well_mixed() {
            self.size().saturating_sub(1)
        } else {
            self.in_neighbors(node).len()
        }
    }

    /// Explicit out-neighbour lists (empty for well-mixed geometries).
    pub fn links(&self) -> &[Vec<usize>] {
        &self.out
    }

    /// Number of links; undirected links are counted once.
    pub fn link_count(&self) -> usize {
        if self.is_well_mixed() {
            let n = self.size();
            return n * n.saturating_sub(1) / 2;
        }
        let arcs: usize = self.out.iter().map(Vec::len).sum();
        if self.directed {
            arcs
        } else {
            arcs / 2
        }
    }

    /// Minimum, maximum and mean degree.
    pub fn degree_stats(&self) -> (usize, usize, f64) {
        let n = self.size();
        let mut min = usize::MAX;
        let mut max = 0;
        let mut total = 0;
        for node in 0..n {
            let d = self.degree(node);
            min = min.min(d);
            max = max.max(d);
            total += d;
        }
        (min, max, total as f64 / n as f64)
    }

    /// Verify the structural invariants of the adjacency lists.
    ///
    /// Checks that there are no self-links or duplicate links, that
    /// undirected graphs are symmetric, and that the in-lists are the exact
    /// transpose of the out-lists.
    pub fn check_consistency(&self) -> Result<(), GeometryError> {
        if self.is_well_mixed() {
            return Ok(());
        }
        let n = self.size();
        if self.out.len() != n || self.inn.len() != n {
            return Err(GeometryError::Inconsistent(format!(
                "neighbour lists cover {} / {} nodes, expected {n}",
                self.out.len(),
                self.inn.len()
            )));
        }
        let mut transpose = vec![Vec::new(); n];
        for (i, targets) in self.out.iter().enumerate() {
            let mut sorted = targets.clone();
            sorted.sort_unstable();
            if sorted.windows(2).any(|w| w[0] == w[1]) {
                return Err(GeometryError::Inconsistent(format!(
                    "node {i} has duplicate links"
                )));
            }
            if sorted.binary_search(&i).is_ok() {
                return Err(GeometryError::Inconsistent(format!("node {i} links to itself")));
            }
            for &j in targets {
                transpose[j].push(i);
            }
        }
        for (i, sources) in transpose.iter_mut().enumerate() {
            sources.sort_unstable();
            let mut inn = self.inn[i].clone();
            inn.sort_unstable();
            if *sources != inn {
                return Err(GeometryError::Inconsistent(format!(
                    "in-links of node {i} do not match out-links"
                )));
            }
            if !self.directed {
                let mut out = self.out[i].clone();
                out.sort_unstable();
                if *sources != out {
                    return Err(GeometryError::Inconsistent(format!(
                        "undirected links of node {i} are not symmetric"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Adjacency under construction. Links are appended in creation order.
pub(crate) struct LinkSet {
    out: Vec<Vec<usize>>,
}

impl LinkSet {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            out: vec![Vec::new(); size],
        }
    }

    pub(crate) fn contains(&self, a: usize, b: usize) -> bool {
        self.out[a].contains(&b)
    }

    /// Add the undirected link `a - b`.
    pub(crate) fn link(&mut self, a: usize, b: usize) {
        self.out[a].push(b);
        self.out[b].push(a);
    }

    /// Add the directed link `a -> b`.
    pub(crate) fn arc(&mut self, a: usize, b: usize) {
        self.out[a].push(b);
    }

    pub(crate) fn degree(&self, a: usize) -> usize {
        self.out[a].len()
    }

    pub(crate) fn clear(&mut self) {
        self.out.iter_mut().for_each(Vec::clear);
    }

    pub(crate) fn into_lists(self) -> Vec<Vec<usize>> {
        self.out
    }
}
