//! Per-step progress reporting.
//!
//! Every optimizer step (GA generation or QL episode) produces one
//! [`StepRecord`]: the step index, the scores the running mode produces and
//! whatever optional per-edge / per-OD details the reporter asked for in
//! its [`ReportFlags`]. [`LogWriter`] persists records as a text log;
//! `Vec<StepRecord>` collects them in memory.

pub mod paths;
mod writer;

pub use writer::LogWriter;

use crate::error::Result;
use crate::evaluation::CostEvaluationEngine;
use serde::{Deserialize, Serialize};

/// Score columns of a log, fixed per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    QlOnly,
    GaOnly,
    Hybrid,
}

impl ReportKind {
    /// Name of the step column.
    pub fn step_label(self) -> &'static str {
        match self {
            ReportKind::QlOnly => "Episode",
            ReportKind::GaOnly | ReportKind::Hybrid => "Generation",
        }
    }

    pub fn score_labels(self) -> &'static [&'static str] {
        match self {
            ReportKind::QlOnly | ReportKind::GaOnly => &["AVG_TT"],
            ReportKind::Hybrid => &["AVG_TT", "QL_AVG_TT"],
        }
    }
}

/// Scores of one step; each mode carries only what it produces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepScores {
    QlOnly { ql: f64 },
    GaOnly { ga: f64 },
    Hybrid { ga: f64, ql: f64 },
}

impl StepScores {
    pub fn kind(&self) -> ReportKind {
        match self {
            StepScores::QlOnly { .. } => ReportKind::QlOnly,
            StepScores::GaOnly { .. } => ReportKind::GaOnly,
            StepScores::Hybrid { .. } => ReportKind::Hybrid,
        }
    }

    /// Values in the order of [`ReportKind::score_labels`].
    pub fn values(&self) -> Vec<f64> {
        match *self {
            StepScores::QlOnly { ql } => vec![ql],
            StepScores::GaOnly { ga } => vec![ga],
            StepScores::Hybrid { ga, ql } => vec![ga, ql],
        }
    }
}

/// Optional report columns and the step interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportFlags {
    /// Average travel time per OD pair.
    pub od_pairs: bool,
    /// Travel time per edge.
    pub edge_travel_times: bool,
    /// Travelers per edge.
    pub edge_flows: bool,
    /// Groups per route per OD pair.
    pub route_counts: bool,
    /// Only steps divisible by `interval` are recorded.
    pub interval: usize,
}

impl Default for ReportFlags {
    fn default() -> Self {
        Self {
            od_pairs: false,
            edge_travel_times: false,
            edge_flows: false,
            route_counts: false,
            interval: 1,
        }
    }
}

impl ReportFlags {
    pub fn records(&self, step: usize) -> bool {
        self.interval > 0 && step % self.interval == 0
    }

    fn any_detail(&self) -> bool {
        self.od_pairs || self.edge_travel_times || self.edge_flows || self.route_counts
    }
}

/// One reported step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub step: usize,
    pub scores: StepScores,
    pub od_average_times: Option<Vec<f64>>,
    pub edge_travel_times: Option<Vec<f64>>,
    pub edge_flows: Option<Vec<f64>>,
    pub route_counts: Option<Vec<Vec<usize>>>,
}

impl StepRecord {
    /// A record without optional details.
    pub fn new(step: usize, scores: StepScores) -> Self {
        Self {
            step,
            scores,
            od_average_times: None,
            edge_travel_times: None,
            edge_flows: None,
            route_counts: None,
        }
    }

    /// Fills the details enabled in `flags` from `assignment`.
    pub fn with_details(
        mut self,
        engine: &CostEvaluationEngine,
        assignment: &[usize],
        flags: &ReportFlags,
    ) -> Result<Self> {
        if !flags.any_detail() {
            return Ok(self);
        }
        if flags.od_pairs {
            self.od_average_times = Some(engine.average_travel_time_by_od(assignment)?);
        }
        if flags.route_counts {
            self.route_counts = Some(engine.route_counts(assignment)?);
        }
        if flags.edge_travel_times || flags.edge_flows {
            let evaluation = engine.evaluate(assignment)?;
            if flags.edge_travel_times {
                self.edge_travel_times = Some(evaluation.edge_times);
            }
            if flags.edge_flows {
                self.edge_flows = Some(evaluation.flows);
            }
        }
        Ok(self)
    }
}

/// Receives one record per optimizer step.
pub trait StepReporter {
    /// Details and interval this reporter wants. Defaults to scores only,
    /// every step.
    fn flags(&self) -> ReportFlags {
        ReportFlags::default()
    }

    fn record_step(&mut self, record: &StepRecord) -> Result<()>;
}

impl StepReporter for Vec<StepRecord> {
    fn record_step(&mut self, record: &StepRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Builds the record `reporter` asked for and hands it over. Steps outside
/// the reporter's interval are skipped without evaluation.
pub fn report_step<R: StepReporter + ?Sized>(
    reporter: &mut R,
    engine: &CostEvaluationEngine,
    step: usize,
    scores: StepScores,
    assignment: &[usize],
) -> Result<()> {
    let flags = reporter.flags();
    if !flags.records(step) {
        return Ok(());
    }
    let record = StepRecord::new(step, scores).with_details(engine, assignment, &flags)?;
    reporter.record_step(&record)
}
