//! K shortest loopless routes.
//!
//! Yen's algorithm over Dijkstra, weighted by edge free-flow costs. Routes
//! are returned cheapest first; ties are broken by fewer edges, then by
//! edge indices, so the result is deterministic.
//!
//! # References
//!
//! - Yen (1971), "Finding the K Shortest Loopless Paths in a Network"

use super::{Edge, EdgeIdx, NodeId, Route};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Adjacency view of a node/edge list.
struct Graph {
    index: HashMap<String, usize>,
    /// `(edge, head node, cost)` per tail node.
    out: Vec<Vec<(EdgeIdx, usize, f64)>>,
}

impl Graph {
    fn new(nodes: &[NodeId], edges: &[Edge]) -> Self {
        let mut index: HashMap<String, usize> = HashMap::new();
        for node in nodes
            .iter()
            .chain(edges.iter().flat_map(|e| [&e.start, &e.end]))
        {
            let next = index.len();
            index.entry(node.clone()).or_insert(next);
        }
        let mut out = vec![Vec::new(); index.len()];
        for (i, edge) in edges.iter().enumerate() {
            out[index[&edge.start]].push((EdgeIdx(i), index[&edge.end], edge.free_flow_cost));
        }
        Self { index, out }
    }

    /// Cheapest path from `source` to `target` avoiding banned edges and
    /// nodes.
    fn dijkstra(
        &self,
        source: usize,
        target: usize,
        banned_edges: &HashSet<EdgeIdx>,
        banned_nodes: &HashSet<usize>,
    ) -> Option<(f64, Route)> {
        let n = self.out.len();
        let mut dist = vec![f64::INFINITY; n];
        let mut prev: Vec<Option<(usize, EdgeIdx)>> = vec![None; n];
        let mut heap = BinaryHeap::new();

        dist[source] = 0.0;
        heap.push(State {
            cost: 0.0,
            node: source,
        });

        while let Some(State { cost, node }) = heap.pop() {
            if node == target {
                break;
            }
            if cost > dist[node] {
                continue;
            }
            for &(edge, head, weight) in &self.out[node] {
                if banned_edges.contains(&edge) || banned_nodes.contains(&head) {
                    continue;
                }
                let next = cost + weight;
                if next < dist[head] {
                    dist[head] = next;
                    prev[head] = Some((node, edge));
                    heap.push(State {
                        cost: next,
                        node: head,
                    });
                }
            }
        }

        if !dist[target].is_finite() {
            return None;
        }
        let mut route = Vec::new();
        let mut node = target;
        while let Some((from, edge)) = prev[node] {
            route.push(edge);
            node = from;
        }
        route.reverse();
        Some((dist[target], route))
    }

    fn route_nodes(&self, edges: &[Edge], source: usize, route: &[EdgeIdx]) -> Vec<usize> {
        let mut nodes = Vec::with_capacity(route.len() + 1);
        nodes.push(source);
        nodes.extend(route.iter().map(|e| self.index[&edges[e.0].end]));
        nodes
    }
}

#[derive(Debug, PartialEq)]
struct State {
    cost: f64,
    node: usize,
}

impl Eq for State {}

impl Ord for State {
    // Reversed for a min-heap.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn route_cost(edges: &[Edge], route: &[EdgeIdx]) -> f64 {
    route.iter().map(|e| edges[e.0].free_flow_cost).sum()
}

fn candidate_order(a: &(f64, Route), b: &(f64, Route)) -> Ordering {
    a.0.total_cmp(&b.0)
        .then_with(|| a.1.len().cmp(&b.1.len()))
        .then_with(|| a.1.cmp(&b.1))
}

/// Returns up to `k` loopless routes from `origin` to `destination`,
/// cheapest first.
///
/// Fewer than `k` routes are returned when fewer simple paths exist; none
/// when the destination is unreachable or either node is unknown.
pub fn k_shortest_paths(
    nodes: &[NodeId],
    edges: &[Edge],
    origin: &str,
    destination: &str,
    k: usize,
) -> Vec<Route> {
    let graph = Graph::new(nodes, edges);
    let (Some(&source), Some(&target)) = (graph.index.get(origin), graph.index.get(destination))
    else {
        return Vec::new();
    };
    if k == 0 {
        return Vec::new();
    }

    let Some(first) = graph.dijkstra(source, target, &HashSet::new(), &HashSet::new()) else {
        return Vec::new();
    };
    let mut accepted: Vec<Route> = vec![first.1];
    let mut candidates: Vec<(f64, Route)> = Vec::new();

    while accepted.len() < k {
        let last = &accepted[accepted.len() - 1];
        let last_nodes = graph.route_nodes(edges, source, last);

        for spur_index in 0..last.len() {
            let spur_node = last_nodes[spur_index];
            let root = &last[..spur_index];

            let banned_edges: HashSet<EdgeIdx> = accepted
                .iter()
                .filter(|route| route.len() > spur_index && &route[..spur_index] == root)
                .map(|route| route[spur_index])
                .collect();
            let banned_nodes: HashSet<usize> = last_nodes[..spur_index].iter().copied().collect();

            if let Some((_, spur)) =
                graph.dijkstra(spur_node, target, &banned_edges, &banned_nodes)
            {
                let mut route = root.to_vec();
                route.extend(spur);
                if !accepted.contains(&route) && !candidates.iter().any(|(_, r)| *r == route) {
                    candidates.push((route_cost(edges, &route), route));
                }
            }
        }

        let Some(best) = candidates
            .iter()
            .enumerate()
            .min_by(|a, b| candidate_order(a.1, b.1))
            .map(|(i, _)| i)
        else {
            break;
        };
        accepted.push(candidates.swap_remove(best).1);
    }

    accepted
}
