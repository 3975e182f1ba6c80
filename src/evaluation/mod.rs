//! Congestion cost evaluation.
//!
//! [`CostEvaluationEngine`] turns an assignment (one route index per driver
//! group) into per-edge flows, per-edge travel times, per-group travel
//! times and the average travel time minimized by the optimizers.
//!
//! Flows are accumulated once per assignment and every other metric is
//! derived from them, so groups sharing an edge are counted exactly once
//! per traversal. All operations are pure: the same assignment always
//! yields bit-identical results.

use crate::error::{Result, RouteChoiceError};
use crate::network::{NetworkModel, OdIdx};
use std::sync::Arc;

/// Every metric of one assignment, computed in a single pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Travelers per edge, indexed by edge.
    pub flows: Vec<f64>,
    /// Travel time per edge at its flow, indexed by edge.
    pub edge_times: Vec<f64>,
    /// Travel time of each group's selected route, in group order.
    pub group_times: Vec<f64>,
    /// Mean of `group_times`.
    pub average: f64,
}

/// Evaluates assignments against a shared, immutable network.
///
/// Cloning is cheap (the network is behind an [`Arc`]).
#[derive(Debug, Clone)]
pub struct CostEvaluationEngine {
    network: Arc<NetworkModel>,
}

impl CostEvaluationEngine {
    pub fn new(network: Arc<NetworkModel>) -> Self {
        Self { network }
    }

    pub fn network(&self) -> &NetworkModel {
        &self.network
    }

    /// Checks length and route ranges.
    pub fn validate(&self, assignment: &[usize]) -> Result<()> {
        let groups = self.network.groups();
        if assignment.len() != groups.len() {
            return Err(RouteChoiceError::AssignmentLength {
                expected: groups.len(),
                actual: assignment.len(),
            });
        }
        for (group, (&route, driver)) in assignment.iter().zip(groups).enumerate() {
            let routes = self.network.od(driver.od).route_count();
            if route >= routes {
                return Err(RouteChoiceError::RouteIndex {
                    group,
                    route,
                    routes,
                });
            }
        }
        Ok(())
    }

    /// Travelers on every edge. Edges nobody uses are present with 0.
    pub fn flow_per_edge(&self, assignment: &[usize]) -> Result<Vec<f64>> {
        self.validate(assignment)?;
        Ok(self.accumulate_flows(assignment))
    }

    fn accumulate_flows(&self, assignment: &[usize]) -> Vec<f64> {
        let net = &self.network;
        let group_size = net.group_size() as f64;
        let mut flows = vec![0.0; net.edges().len()];
        for (&route, driver) in assignment.iter().zip(net.groups()) {
            for edge in &net.od(driver.od).routes[route] {
                flows[edge.0] += group_size;
            }
        }
        flows
    }

    fn times_from_flows(&self, flows: &[f64]) -> Result<Vec<f64>> {
        self.network
            .edges()
            .iter()
            .zip(flows)
            .map(|(edge, &flow)| {
                let time = edge.cost.eval(flow);
                if time.is_finite() {
                    Ok(time)
                } else {
                    Err(RouteChoiceError::FormulaEvaluation {
                        edge: edge.name.clone(),
                        flow,
                    })
                }
            })
            .collect()
    }

    /// Travel time of every edge at the flow the assignment puts on it.
    pub fn edge_travel_times(&self, assignment: &[usize]) -> Result<Vec<f64>> {
        let flows = self.flow_per_edge(assignment)?;
        self.times_from_flows(&flows)
    }

    fn route_time(&self, edge_times: &[f64], od: OdIdx, route: usize) -> f64 {
        self.network.od(od).routes[route]
            .iter()
            .map(|edge| edge_times[edge.0])
            .sum()
    }

    /// Travel time of `group` on its selected route.
    pub fn group_travel_time(&self, assignment: &[usize], group: usize) -> Result<f64> {
        let groups = self.network.groups().len();
        if group >= groups {
            return Err(RouteChoiceError::GroupIndex { group, groups });
        }
        let edge_times = self.edge_travel_times(assignment)?;
        let od = self.network.groups()[group].od;
        Ok(self.route_time(&edge_times, od, assignment[group]))
    }

    /// Computes all metrics of `assignment` at once.
    pub fn evaluate(&self, assignment: &[usize]) -> Result<Evaluation> {
        if assignment.is_empty() {
            return Err(RouteChoiceError::EmptyAssignment);
        }
        self.validate(assignment)?;
        let flows = self.accumulate_flows(assignment);
        let edge_times = self.times_from_flows(&flows)?;
        let group_times: Vec<f64> = assignment
            .iter()
            .zip(self.network.groups())
            .map(|(&route, driver)| self.route_time(&edge_times, driver.od, route))
            .collect();
        let average = group_times.iter().sum::<f64>() / group_times.len() as f64;
        Ok(Evaluation {
            flows,
            edge_times,
            group_times,
            average,
        })
    }

    /// Mean travel time over all groups: the fitness the GA minimizes.
    pub fn average_travel_time(&self, assignment: &[usize]) -> Result<f64> {
        Ok(self.evaluate(assignment)?.average)
    }

    /// Per-group travel times grouped by OD pair, indexed by OD.
    pub fn travel_time_by_od(&self, assignment: &[usize]) -> Result<Vec<Vec<f64>>> {
        let evaluation = self.evaluate(assignment)?;
        let mut by_od = vec![Vec::new(); self.network.od_pairs().len()];
        for (time, driver) in evaluation.group_times.iter().zip(self.network.groups()) {
            by_od[driver.od.0].push(*time);
        }
        Ok(by_od)
    }

    /// Mean travel time per OD pair; 0 for an OD pair without groups.
    pub fn average_travel_time_by_od(&self, assignment: &[usize]) -> Result<Vec<f64>> {
        Ok(self
            .travel_time_by_od(assignment)?
            .into_iter()
            .map(|times| {
                if times.is_empty() {
                    0.0
                } else {
                    times.iter().sum::<f64>() / times.len() as f64
                }
            })
            .collect())
    }

    /// Number of groups on each route of each OD pair, indexed by OD then
    /// route.
    pub fn route_counts(&self, assignment: &[usize]) -> Result<Vec<Vec<usize>>> {
        self.validate(assignment)?;
        let mut counts: Vec<Vec<usize>> = self
            .network
            .od_pairs()
            .iter()
            .map(|od| vec![0; od.route_count()])
            .collect();
        for (&route, driver) in assignment.iter().zip(self.network.groups()) {
            counts[driver.od.0][route] += 1;
        }
        Ok(counts)
    }
}
