#![deny(clippy::all, clippy::pedantic)]

use std::fs;
use std::path::PathBuf;

use crate::client::CliError;

/// Prefer the file contents over an inline value; trailing newlines are
/// dropped so `echo secret > file` works.
pub fn read_value(val: Option<String>, file: Option<PathBuf>, what: &str) -> Result<String, CliError> {
    if let Some(path) = file {
        let data = fs::read_to_string(&path).map_err(|source| CliError::InputFile {
            path: path.display().to_string(),
            source,
        })?;
        Ok(data.trim_end_matches(['\r', '\n']).to_string())
    } else if let Some(v) = val {
        Ok(v)
    } else {
        Err(CliError::InvalidInput(format!("{what} required")))
    }
}
