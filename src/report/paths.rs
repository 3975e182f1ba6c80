//! Log file naming.
//!
//! Logs live under `<output>/net_<network>/<MODE>/<parameter dirs...>/`
//! and are named `<stem><HH>h<MM>m<SS>s.txt`. Runs finishing within the
//! same second get `-1`, `-2`, ... appended before the extension.

use crate::error::{Result, RouteChoiceError};
use chrono::{Local, Timelike};
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Time tag such as `11h5m3s` (no zero padding).
pub fn time_tag<T: Timelike>(time: &T) -> String {
    format!("{}h{}m{}s", time.hour(), time.minute(), time.second())
}

/// Creates `dir` and a new log file in it named after `stem` and the
/// current local time.
pub fn create_log_file(dir: &Path, stem: &str) -> Result<(PathBuf, File)> {
    create_unique(dir, &format!("{stem}{}", time_tag(&Local::now())))
}

/// Creates `dir/<base>.txt`, or the first free `dir/<base>-<n>.txt`.
///
/// The file is created exclusively, so concurrent runs never share a log.
pub fn create_unique(dir: &Path, base: &str) -> Result<(PathBuf, File)> {
    std::fs::create_dir_all(dir).map_err(|e| RouteChoiceError::resource(dir, e))?;
    let mut suffix = 0usize;
    loop {
        let name = if suffix == 0 {
            format!("{base}.txt")
        } else {
            format!("{base}-{suffix}.txt")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => suffix += 1,
            Err(e) => return Err(RouteChoiceError::resource(path, e)),
        }
    }
}
