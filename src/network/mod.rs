//! Road network model.
//!
//! A [`NetworkModel`] holds the nodes, the edges with their compiled cost
//! functions, the OD pairs with their candidate routes and the resulting
//! driver groups. It is built once per run and never mutated afterwards.
//!
//! # Building
//!
//! - From a network file: [`NetworkDefinition::from_file`] followed by
//!   [`NetworkDefinition::build`], which computes the k shortest routes of
//!   every OD pair with [`routing::k_shortest_paths`].
//! - By hand: [`NetworkModel::new`] with OD pairs whose routes are already
//!   known ([`OdPair::with_routes`]).
//!
//! # Group indexing
//!
//! Driver groups are laid out OD by OD, in OD declaration order. This order
//! defines the meaning of every assignment vector in the crate.

mod parser;
pub mod routing;

pub use parser::{DemandDeclaration, NetworkDefinition};

use crate::error::{Result, RouteChoiceError};
use crate::formula::CostFunction;
use std::fmt;

/// Index of an edge in [`NetworkModel::edges`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeIdx(pub usize);

impl fmt::Debug for EdgeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Index of an OD pair in [`NetworkModel::od_pairs`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OdIdx(pub usize);

impl fmt::Debug for OdIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "od{}", self.0)
    }
}

/// Opaque node identifier.
pub type NodeId = String;

/// A candidate route: the edges traversed, in order.
pub type Route = Vec<EdgeIdx>;

/// A directed road segment with a congestion cost function.
#[derive(Debug, Clone)]
pub struct Edge {
    pub name: String,
    pub start: NodeId,
    pub end: NodeId,
    /// Cost at the network's base flow; used as routing weight.
    pub free_flow_cost: f64,
    pub cost: CostFunction,
}

impl Edge {
    /// Creates an edge whose free-flow cost is its cost at zero flow.
    pub fn new(
        name: impl Into<String>,
        start: impl Into<NodeId>,
        end: impl Into<NodeId>,
        cost: CostFunction,
    ) -> Self {
        let free_flow_cost = cost.eval(0.0);
        Self {
            name: name.into(),
            start: start.into(),
            end: end.into(),
            free_flow_cost,
            cost,
        }
    }
}

/// An origin-destination demand bucket with its candidate routes.
#[derive(Debug, Clone)]
pub struct OdPair {
    pub origin: NodeId,
    pub destination: NodeId,
    /// Number of routes requested (`k`). The routes actually found may be
    /// fewer.
    pub num_routes: usize,
    pub num_groups: usize,
    pub routes: Vec<Route>,
}

impl OdPair {
    /// Creates an OD pair without routes.
    ///
    /// `travelers` must be a multiple of `group_size` (after rounding to
    /// the nearest integer); anything else is a configuration error.
    pub fn new(
        origin: impl Into<NodeId>,
        destination: impl Into<NodeId>,
        num_routes: usize,
        travelers: f64,
        group_size: usize,
    ) -> Result<Self> {
        let origin = origin.into();
        let destination = destination.into();
        if group_size == 0 {
            return Err(RouteChoiceError::config("group size must be positive"));
        }
        if !travelers.is_finite() || travelers < 0.0 {
            return Err(RouteChoiceError::config(format!(
                "OD {origin}|{destination}: invalid number of travelers {travelers}"
            )));
        }
        let travelers = travelers.round() as usize;
        if travelers % group_size != 0 {
            return Err(RouteChoiceError::config(format!(
                "OD {origin}|{destination}: {travelers} travelers is not a multiple of group size {group_size}"
            )));
        }
        Ok(Self {
            origin,
            destination,
            num_routes,
            num_groups: travelers / group_size,
            routes: Vec::new(),
        })
    }

    /// Sets the candidate routes.
    pub fn with_routes(mut self, routes: Vec<Route>) -> Self {
        self.routes = routes;
        self
    }

    /// Number of routes a group of this pair can choose from.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// `origin|destination`, the key used in reports and coupling files.
    pub fn label(&self) -> String {
        format!("{}|{}", self.origin, self.destination)
    }
}

/// A block of `group_size` travelers of one OD pair sharing one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverGroup {
    pub od: OdIdx,
}

/// Immutable network: nodes, edges, OD pairs, driver groups.
#[derive(Debug, Clone)]
pub struct NetworkModel {
    name: String,
    nodes: Vec<NodeId>,
    edges: Vec<Edge>,
    od_pairs: Vec<OdPair>,
    groups: Vec<DriverGroup>,
    group_size: usize,
}

impl NetworkModel {
    /// Assembles a network from OD pairs whose routes are already set.
    ///
    /// Fails if an OD pair has no route or a route refers to an edge that
    /// does not exist.
    pub fn new(
        name: impl Into<String>,
        nodes: Vec<NodeId>,
        edges: Vec<Edge>,
        od_pairs: Vec<OdPair>,
        group_size: usize,
    ) -> Result<Self> {
        if group_size == 0 {
            return Err(RouteChoiceError::config("group size must be positive"));
        }
        for od in &od_pairs {
            if od.routes.is_empty() {
                return Err(RouteChoiceError::config(format!(
                    "OD {} has no route",
                    od.label()
                )));
            }
            if let Some(edge) = od
                .routes
                .iter()
                .flatten()
                .find(|edge| edge.0 >= edges.len())
            {
                return Err(RouteChoiceError::config(format!(
                    "OD {} refers to unknown edge {edge:?}",
                    od.label()
                )));
            }
        }

        let groups = od_pairs
            .iter()
            .enumerate()
            .flat_map(|(i, od)| {
                std::iter::repeat(DriverGroup { od: OdIdx(i) }).take(od.num_groups)
            })
            .collect();

        Ok(Self {
            name: name.into(),
            nodes,
            edges,
            od_pairs,
            groups,
            group_size,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, idx: EdgeIdx) -> &Edge {
        &self.edges[idx.0]
    }

    pub fn od_pairs(&self) -> &[OdPair] {
        &self.od_pairs
    }

    pub fn od(&self, idx: OdIdx) -> &OdPair {
        &self.od_pairs[idx.0]
    }

    pub fn groups(&self) -> &[DriverGroup] {
        &self.groups
    }

    /// Travelers per driver group.
    pub fn group_size(&self) -> usize {
        self.group_size
    }

    /// Total number of travelers across all OD pairs.
    pub fn num_travelers(&self) -> usize {
        self.groups.len() * self.group_size
    }

    /// Number of routes available to each group, in group order.
    ///
    /// This is the gene domain of the optimizers: gene `i` ranges over
    /// `0..route_counts()[i]`.
    pub fn route_counts(&self) -> Vec<usize> {
        self.groups
            .iter()
            .map(|group| self.od(group.od).route_count())
            .collect()
    }

    /// Edge names in edge order.
    pub fn edge_names(&self) -> Vec<&str> {
        self.edges.iter().map(|edge| edge.name.as_str()).collect()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_follow_od_order() {
        let edges = vec![
            Edge::new("AB", "A", "B", CostFunction::constant(1.0)),
            Edge::new("BC", "B", "C", CostFunction::constant(1.0)),
        ];
        let od1 = OdPair::new("A", "B", 1, 20.0, 10)
            .unwrap()
            .with_routes(vec![vec![EdgeIdx(0)]]);
        let od2 = OdPair::new("B", "C", 1, 30.0, 10)
            .unwrap()
            .with_routes(vec![vec![EdgeIdx(1)]]);
        let net = NetworkModel::new("n", vec![], edges, vec![od1, od2], 10).unwrap();

        let ods: Vec<usize> = net.groups().iter().map(|g| g.od.0).collect();
        assert_eq!(ods, vec![0, 0, 1, 1, 1]);
        assert_eq!(net.num_travelers(), 50);
        assert_eq!(net.route_counts(), vec![1; 5]);
    }

    #[test]
    fn test_group_division_must_be_exact() {
        let err = OdPair::new("A", "B", 2, 105.0, 50).unwrap_err();
        assert!(matches!(err, RouteChoiceError::Configuration(_)));
        assert!(OdPair::new("A", "B", 2, 100.0, 0).is_err());
        // Rounded before division.
        assert_eq!(OdPair::new("A", "B", 2, 99.6, 50).unwrap().num_groups, 2);
    }

    #[test]
    fn test_routes_must_exist_and_reference_known_edges() {
        let edges = vec![Edge::new("AB", "A", "B", CostFunction::constant(1.0))];
        let no_routes = OdPair::new("A", "B", 1, 10.0, 10).unwrap();
        assert!(NetworkModel::new("n", vec![], edges.clone(), vec![no_routes], 10).is_err());

        let dangling = OdPair::new("A", "B", 1, 10.0, 10)
            .unwrap()
            .with_routes(vec![vec![EdgeIdx(5)]]);
        assert!(NetworkModel::new("n", vec![], edges, vec![dangling], 10).is_err());
    }

    #[test]
    fn test_fixture_shape() {
        let net = fixtures::two_route_network();
        assert_eq!(net.groups().len(), 2);
        assert_eq!(net.route_counts(), vec![2, 2]);
        assert_eq!(net.edge_names(), vec!["E1", "E2", "E3"]);
        assert_eq!(net.od(OdIdx(0)).label(), "A|B");
        assert!((net.edge(EdgeIdx(0)).free_flow_cost - 1.0).abs() < 1e-12);
    }
}
