//! Text log of a run.
//!
//! Layout:
//!
//! ```text
//! #Parameters:
//! #	Population=100
//! #	Mutation=0.001
//! #Generation AVG_TT QL_AVG_TT tt_A|B nd_E1
//! 0 2.75 3.1 2.75 50
//! ```
//!
//! `#` lines are written directly; data rows go through a space-delimited
//! `csv` writer.

use super::{ReportFlags, ReportKind, StepRecord, StepReporter};
use crate::error::{Result, RouteChoiceError};
use crate::network::NetworkModel;
use csv::WriterBuilder;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes one line per recorded step to a log file.
///
/// The file is flushed and closed when the writer is dropped; use
/// [`finish`](LogWriter::finish) to observe flush errors.
pub struct LogWriter {
    path: PathBuf,
    writer: csv::Writer<BufWriter<File>>,
    kind: ReportKind,
    flags: ReportFlags,
    rows: usize,
}

impl std::fmt::Debug for LogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogWriter")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("rows", &self.rows)
            .finish()
    }
}

impl LogWriter {
    /// Writes the parameter header and column line to `file`.
    pub fn new(
        path: impl Into<PathBuf>,
        file: File,
        network: &NetworkModel,
        kind: ReportKind,
        parameters: &[(String, String)],
        flags: ReportFlags,
    ) -> Result<Self> {
        let path = path.into();
        let mut out = BufWriter::new(file);
        let header = header_lines(network, kind, parameters, &flags);
        out.write_all(header.as_bytes())
            .map_err(|e| RouteChoiceError::resource(&path, e))?;

        let writer = WriterBuilder::new()
            .delimiter(b' ')
            .has_headers(false)
            .flexible(true)
            .from_writer(out);
        Ok(Self {
            path,
            writer,
            kind,
            flags,
            rows: 0,
        })
    }

    /// Creates (truncating) the file at `path`.
    pub fn create(
        path: &Path,
        network: &NetworkModel,
        kind: ReportKind,
        parameters: &[(String, String)],
        flags: ReportFlags,
    ) -> Result<Self> {
        let file = File::create(path).map_err(|e| RouteChoiceError::resource(path, e))?;
        Self::new(path, file, network, kind, parameters, flags)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Data rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flushes and closes the log, returning its path.
    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer
            .flush()
            .map_err(|e| RouteChoiceError::resource(&self.path, e))?;
        Ok(self.path.clone())
    }
}

impl StepReporter for LogWriter {
    fn flags(&self) -> ReportFlags {
        self.flags
    }

    fn record_step(&mut self, record: &StepRecord) -> Result<()> {
        if !self.flags.records(record.step) {
            return Ok(());
        }
        if record.scores.kind() != self.kind {
            return Err(RouteChoiceError::config(format!(
                "{:?} scores recorded in a {:?} log",
                record.scores.kind(),
                self.kind
            )));
        }

        let mut row = vec![record.step.to_string()];
        row.extend(record.scores.values().iter().map(f64::to_string));
        if self.flags.od_pairs {
            row.extend(detail(&record.od_average_times).iter().map(f64::to_string));
        }
        if self.flags.edge_travel_times {
            row.extend(detail(&record.edge_travel_times).iter().map(f64::to_string));
        }
        if self.flags.edge_flows {
            row.extend(detail(&record.edge_flows).iter().map(f64::to_string));
        }
        if self.flags.route_counts {
            if let Some(counts) = &record.route_counts {
                row.extend(counts.iter().flatten().map(usize::to_string));
            }
        }
        self.writer.write_record(&row)?;
        self.rows += 1;
        Ok(())
    }
}

fn detail(values: &Option<Vec<f64>>) -> &[f64] {
    values.as_deref().unwrap_or(&[])
}

fn header_lines(
    network: &NetworkModel,
    kind: ReportKind,
    parameters: &[(String, String)],
    flags: &ReportFlags,
) -> String {
    let mut header = String::from("#Parameters:\n");
    for (name, value) in parameters {
        header.push_str(&format!("#\t{name}={value}\n"));
    }

    let mut columns: Vec<String> = vec![kind.step_label().to_string()];
    columns.extend(kind.score_labels().iter().map(|s| s.to_string()));
    if flags.od_pairs {
        columns.extend(network.od_pairs().iter().map(|od| format!("tt_{}", od.label())));
    }
    if flags.edge_travel_times {
        columns.extend(network.edge_names().iter().map(|e| format!("tt_{e}")));
    }
    if flags.edge_flows {
        columns.extend(network.edge_names().iter().map(|e| format!("nd_{e}")));
    }
    if flags.route_counts {
        for od in network.od_pairs() {
            columns.extend(
                (1..=od.route_count()).map(|r| format!("{}to{}_{r}", od.origin, od.destination)),
            );
        }
    }
    header.push('#');
    header.push_str(&columns.join(" "));
    header.push('\n');
    header
}
