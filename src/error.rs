//! Error taxonomy.
//!
//! Every variant is fatal for the run that raised it: evaluation is a pure
//! function over validated inputs, so an error always points at a
//! configuration problem or an integration defect, never at a transient
//! condition worth retrying.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, evaluating, optimizing or reporting.
#[derive(Debug, Error)]
pub enum RouteChoiceError {
    /// Invalid experiment or network configuration (bad group division,
    /// unknown node or function, invalid mode/interval combination, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A cost formula could not be compiled.
    #[error("cannot parse formula `{formula}`: {message}")]
    FormulaParse { formula: String, message: String },

    /// A compiled cost function produced a non-finite value.
    #[error("cost function of edge `{edge}` cannot be evaluated at flow {flow}")]
    FormulaEvaluation { edge: String, flow: f64 },

    /// An assignment selected a route the group's OD pair does not have.
    #[error("group {group} selects route {route}, but its OD pair has {routes} route(s)")]
    RouteIndex {
        group: usize,
        route: usize,
        routes: usize,
    },

    /// A group index outside the assignment.
    #[error("group index {group} out of range for {groups} group(s)")]
    GroupIndex { group: usize, groups: usize },

    /// An assignment whose length differs from the number of driver groups.
    #[error("assignment has {actual} element(s), expected {expected}")]
    AssignmentLength { expected: usize, actual: usize },

    /// Average travel time requested for an empty assignment.
    #[error("cannot evaluate an empty assignment")]
    EmptyAssignment,

    /// An input or output file could not be opened, read or written.
    #[error("resource error on {}: {source}", path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("log write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl RouteChoiceError {
    /// Shorthand for [`RouteChoiceError::Configuration`].
    pub fn config(message: impl Into<String>) -> Self {
        RouteChoiceError::Configuration(message.into())
    }

    /// Wraps an I/O error with the path it happened on.
    pub fn resource(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RouteChoiceError::Resource {
            path: path.into(),
            source,
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, RouteChoiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = RouteChoiceError::RouteIndex {
            group: 3,
            route: 4,
            routes: 2,
        };
        assert_eq!(
            err.to_string(),
            "group 3 selects route 4, but its OD pair has 2 route(s)"
        );

        let err = RouteChoiceError::config("interval must be positive");
        assert_eq!(
            err.to_string(),
            "configuration error: interval must be positive"
        );
    }

    #[test]
    fn test_resource_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = RouteChoiceError::resource("out/log.txt", io);
        assert!(err.to_string().contains("out/log.txt"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
