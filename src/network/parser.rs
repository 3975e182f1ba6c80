//! Network file reader.
//!
//! Line-oriented format; `#` starts a comment:
//!
//! ```text
//! function <name> (<variable>) <expression>
//! node <name>
//! dedge <name> <start> <end> <function> [constants...]
//! edge <name> <start> <end> <function> [constants...]
//! od <name> <origin> <destination> <travelers>
//! ```
//!
//! `dedge` declares a directed edge. `edge` declares it in both directions;
//! the reverse edge is named `<end>-<start>`. Constants bind to the
//! function's identifiers other than its variable, in order of first
//! appearance in the expression.

use super::routing::k_shortest_paths;
use super::{Edge, NetworkModel, NodeId, OdPair};
use crate::error::{Result, RouteChoiceError};
use crate::formula::Formula;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// One `od` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandDeclaration {
    pub name: String,
    pub origin: NodeId,
    pub destination: NodeId,
    pub travelers: f64,
}

/// Parsed network file, before routing.
#[derive(Debug, Clone)]
pub struct NetworkDefinition {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<Edge>,
    pub demands: Vec<DemandDeclaration>,
}

struct FunctionDecl {
    variable: String,
    formula: Formula,
}

fn config_error(line: usize, message: impl std::fmt::Display) -> RouteChoiceError {
    RouteChoiceError::config(format!("line {line}: {message}"))
}

impl NetworkDefinition {
    /// Reads and parses a network file.
    ///
    /// Free-flow costs are the cost functions evaluated at `base_flow`.
    pub fn from_file(path: impl AsRef<Path>, base_flow: f64) -> Result<Self> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| RouteChoiceError::resource(path, e))?;
        Self::parse(&text, base_flow)
    }

    /// Parses network file contents.
    pub fn parse(text: &str, base_flow: f64) -> Result<Self> {
        let lines: Vec<(usize, Vec<&str>)> = text
            .lines()
            .enumerate()
            .map(|(i, line)| {
                let content = line.split('#').next().unwrap_or("");
                (i + 1, content.split_whitespace().collect::<Vec<_>>())
            })
            .filter(|(_, tokens)| !tokens.is_empty())
            .collect();

        // Functions and nodes may be declared after the edges using them.
        let mut functions: HashMap<&str, FunctionDecl> = HashMap::new();
        let mut nodes: Vec<NodeId> = Vec::new();
        for (line, tokens) in &lines {
            match tokens[0] {
                "function" => {
                    if tokens.len() < 4 {
                        return Err(config_error(
                            *line,
                            "expected `function <name> (<variable>) <expression>`",
                        ));
                    }
                    let variables: Vec<&str> = tokens[2]
                        .trim_start_matches('(')
                        .trim_end_matches(')')
                        .split(',')
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .collect();
                    let variable = match variables.as_slice() {
                        [] => "f",
                        [single] => *single,
                        _ => {
                            return Err(config_error(
                                *line,
                                format!("function `{}` declares more than one variable", tokens[1]),
                            ))
                        }
                    };
                    let formula = Formula::parse(&tokens[3..].join(" "))?;
                    functions.insert(
                        tokens[1],
                        FunctionDecl {
                            variable: variable.to_string(),
                            formula,
                        },
                    );
                }
                "node" => {
                    if tokens.len() != 2 {
                        return Err(config_error(*line, "expected `node <name>`"));
                    }
                    if !nodes.iter().any(|n| n == tokens[1]) {
                        nodes.push(tokens[1].to_string());
                    }
                }
                "edge" | "dedge" | "od" => {}
                other => return Err(config_error(*line, format!("unknown declaration `{other}`"))),
            }
        }

        let mut edges = Vec::new();
        let mut demands = Vec::new();
        for (line, tokens) in &lines {
            match tokens[0] {
                kind @ ("edge" | "dedge") => {
                    if tokens.len() < 5 {
                        return Err(config_error(
                            *line,
                            format!("expected `{kind} <name> <start> <end> <function> [constants...]`"),
                        ));
                    }
                    let (name, start, end) = (tokens[1], tokens[2], tokens[3]);
                    for node in [start, end] {
                        if !nodes.iter().any(|n| n == node) {
                            return Err(config_error(*line, format!("unknown node `{node}`")));
                        }
                    }
                    let decl = functions.get(tokens[4]).ok_or_else(|| {
                        config_error(*line, format!("unknown function `{}`", tokens[4]))
                    })?;
                    let constants = tokens[5..]
                        .iter()
                        .map(|t| {
                            t.parse::<f64>().map_err(|_| {
                                config_error(*line, format!("invalid constant `{t}`"))
                            })
                        })
                        .collect::<Result<Vec<f64>>>()?;
                    let cost = decl.formula.bind_positional(&decl.variable, &constants)?;

                    let mut forward = Edge::new(name, start, end, cost.clone());
                    forward.free_flow_cost = cost.eval(base_flow);
                    edges.push(forward);
                    if kind == "edge" {
                        let mut reverse =
                            Edge::new(format!("{end}-{start}"), end, start, cost.clone());
                        reverse.free_flow_cost = cost.eval(base_flow);
                        edges.push(reverse);
                    }
                }
                "od" => {
                    if tokens.len() != 5 {
                        return Err(config_error(
                            *line,
                            "expected `od <name> <origin> <destination> <travelers>`",
                        ));
                    }
                    for node in [tokens[2], tokens[3]] {
                        if !nodes.iter().any(|n| n == node) {
                            return Err(config_error(*line, format!("unknown node `{node}`")));
                        }
                    }
                    let travelers = tokens[4].parse::<f64>().map_err(|_| {
                        config_error(*line, format!("invalid number of travelers `{}`", tokens[4]))
                    })?;
                    demands.push(DemandDeclaration {
                        name: tokens[1].to_string(),
                        origin: tokens[2].to_string(),
                        destination: tokens[3].to_string(),
                        travelers,
                    });
                }
                _ => {}
            }
        }

        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            demands = demands.len(),
            "network definition parsed"
        );
        Ok(Self {
            nodes,
            edges,
            demands,
        })
    }

    /// Splits the demand into groups of `group_size` travelers and computes
    /// the `k` shortest routes of every OD pair.
    pub fn build(self, name: &str, group_size: usize, k: usize) -> Result<NetworkModel> {
        if k == 0 {
            return Err(RouteChoiceError::config("k must be at least 1"));
        }
        let mut od_pairs = Vec::with_capacity(self.demands.len());
        for demand in &self.demands {
            let od = OdPair::new(
                demand.origin.clone(),
                demand.destination.clone(),
                k,
                demand.travelers,
                group_size,
            )?;
            let routes = k_shortest_paths(
                &self.nodes,
                &self.edges,
                &demand.origin,
                &demand.destination,
                k,
            );
            if routes.is_empty() {
                return Err(RouteChoiceError::config(format!(
                    "OD {} has no path",
                    od.label()
                )));
            }
            if routes.len() < k {
                warn!(
                    od = %od.label(),
                    requested = k,
                    found = routes.len(),
                    "fewer simple paths than requested"
                );
            }
            od_pairs.push(od.with_routes(routes));
        }
        NetworkModel::new(name, self.nodes, self.edges, od_pairs, group_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::EdgeIdx;

    const TWO_ROUTES: &str = "
        # two-route network
        function linear (f) 1 + f / c
        function constant () 2
        node A
        node B
        node C
        dedge E1 A B linear 100
        dedge E2 A C constant
        dedge E3 C B constant   # trailing comment
        od AB A B 100
    ";

    #[test]
    fn test_parse_two_route_network() {
        let def = NetworkDefinition::parse(TWO_ROUTES, 0.0).unwrap();
        assert_eq!(def.nodes, vec!["A", "B", "C"]);
        assert_eq!(def.edges.len(), 3);
        assert_eq!(def.edges[0].name, "E1");
        assert!((def.edges[0].cost.eval(100.0) - 2.0).abs() < 1e-12);
        assert!((def.edges[1].free_flow_cost - 2.0).abs() < 1e-12);
        assert_eq!(
            def.demands,
            vec![DemandDeclaration {
                name: "AB".into(),
                origin: "A".into(),
                destination: "B".into(),
                travelers: 100.0,
            }]
        );
    }

    #[test]
    fn test_build_routes_cheapest_first() {
        let net = NetworkDefinition::parse(TWO_ROUTES, 0.0)
            .unwrap()
            .build("two", 50, 2)
            .unwrap();
        assert_eq!(net.groups().len(), 2);
        assert_eq!(
            net.od_pairs()[0].routes,
            vec![vec![EdgeIdx(0)], vec![EdgeIdx(1), EdgeIdx(2)]]
        );
    }

    #[test]
    fn test_fewer_routes_than_requested() {
        let net = NetworkDefinition::parse(TWO_ROUTES, 0.0)
            .unwrap()
            .build("two", 50, 8)
            .unwrap();
        assert_eq!(net.od_pairs()[0].route_count(), 2);
        assert_eq!(net.od_pairs()[0].num_routes, 8);
    }

    #[test]
    fn test_base_flow_sets_free_flow_cost() {
        let def = NetworkDefinition::parse(TWO_ROUTES, 50.0).unwrap();
        assert!((def.edges[0].free_flow_cost - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_undirected_edge_adds_reverse() {
        let text = "
            function one () 1
            node X
            node Y
            edge XY X Y one
        ";
        let def = NetworkDefinition::parse(text, 0.0).unwrap();
        let names: Vec<_> = def.edges.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["XY", "Y-X"]);
        assert_eq!(def.edges[1].start, "Y");
        assert_eq!(def.edges[1].end, "X");
    }

    #[test]
    fn test_configuration_errors() {
        let cases = [
            "node A\nnode B\ndedge E A B missing",
            "function one () 1\nnode A\ndedge E A Z one",
            "function lin (f) f + c\nnode A\nnode B\ndedge E A B lin",
            "node A\nnode B\nod AB A B lots",
            "node A\nbridge A",
            "function two (f,g) f + g",
        ];
        for text in cases {
            assert!(
                NetworkDefinition::parse(text, 0.0).is_err(),
                "expected failure for:\n{text}"
            );
        }
    }

    #[test]
    fn test_group_division_checked_at_build() {
        let def = NetworkDefinition::parse(TWO_ROUTES, 0.0).unwrap();
        assert!(matches!(
            def.build("two", 30, 2),
            Err(RouteChoiceError::Configuration(_))
        ));
    }

    #[test]
    fn test_unreachable_destination() {
        let text = "
            function one () 1
            node A
            node B
            node C
            dedge AB A B one
            od CA C A 10
        ";
        let def = NetworkDefinition::parse(text, 0.0).unwrap();
        assert!(def.build("n", 10, 2).is_err());
    }

    #[test]
    fn test_missing_file_is_resource_error() {
        let err = NetworkDefinition::from_file("/definitely/not/here.net", 0.0).unwrap_err();
        assert!(matches!(err, RouteChoiceError::Resource { .. }));
    }
}
