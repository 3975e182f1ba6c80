//! Route-choice simulation on congested road networks.
//!
//! Travelers of each origin-destination (OD) pair are split into driver
//! groups; every group picks one of the `k` shortest routes of its OD pair.
//! The crate evaluates how congested such an assignment is and searches
//! for assignments with a low average travel time:
//!
//! - **Cost evaluation** ([`evaluation`]): flows per edge, edge travel times
//!   from per-edge cost formulas, per-group and average travel times.
//! - **Genetic Algorithm** ([`ga`], [`assignment`]): generic population
//!   search with pluggable selection and a per-generation hook, plus the
//!   route-assignment problem definition.
//! - **Q-learning** ([`learning`]): stateless tabular learner producing
//!   assignments episode by episode.
//! - **Hybrid loop** ([`hybrid`]): injects Q-learning solutions into the
//!   ranked GA population every generation.
//! - **Experiments** ([`experiment`], [`report`]): parameter sweeps over
//!   YAML configurations, with one text log per run.
//!
//! # Architecture
//!
//! `formula` and `network` build an immutable [`network::NetworkModel`]
//! that is shared read-only (`Arc`) by the evaluation engine, the GA and
//! the learner. The `ga` module knows nothing about traffic; the
//! `assignment` and `hybrid` modules plug the domain into it.

pub mod assignment;
pub mod error;
pub mod evaluation;
pub mod experiment;
pub mod formula;
pub mod ga;
pub mod hybrid;
pub mod learning;
pub mod network;
pub mod random;
pub mod report;

pub use error::{Result, RouteChoiceError};
