//! Coupling files: initial Q-values per OD pair.
//!
//! ```text
//! # comment
//! A|B -12.0 -14.5 -20.0
//! ```
//!
//! The first token is the OD key, the rest are the values of its routes in
//! route order.

use crate::error::{Result, RouteChoiceError};
use std::collections::HashMap;
use std::path::Path;

pub fn read_coupling_file(path: &Path) -> Result<HashMap<String, Vec<f64>>> {
    let text = std::fs::read_to_string(path).map_err(|e| RouteChoiceError::resource(path, e))?;
    parse_coupling(&text)
}

pub fn parse_coupling(text: &str) -> Result<HashMap<String, Vec<f64>>> {
    let mut table = HashMap::new();
    for (number, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        let Some(key) = tokens.next() else {
            continue;
        };
        if key.contains('#') {
            continue;
        }
        let values = tokens
            .map(|t| {
                t.parse::<f64>().map_err(|_| {
                    RouteChoiceError::config(format!(
                        "coupling line {}: invalid value `{t}`",
                        number + 1
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        table.insert(key.to_string(), values);
    }
    Ok(table)
}
