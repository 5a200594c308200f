//! Output filename prefixes.

use crate::error::{Error, Result};
use crate::records::PredictionTarget;
use std::path::PathBuf;

/// Prefix for one target's structure and metric artifacts.
///
/// A target's own `outfile_prefix` column wins. Otherwise the global prefix is
/// suffixed with `_{targetid}`, or `_T{counter}` when there is no `targetid` column.
pub fn target_outfile_prefix(
    global: Option<&str>,
    target: &PredictionTarget,
    counter: usize,
) -> Result<String> {
    if let Some(prefix) = &target.outfile_prefix {
        return Ok(prefix.clone());
    }
    let global = global.ok_or(Error::MissingOutfilePrefix(counter))?;
    Ok(match &target.targetid {
        Some(targetid) => format!("{global}_{targetid}"),
        None => format!("{global}_T{counter}"),
    })
}

/// Prefix of the final metrics table.
///
/// `--final-outfile-prefix`, then `--outfile-prefix`, then the first target's
/// `outfile_prefix` column.
pub fn final_outfile_prefix(
    final_prefix: Option<&str>,
    global: Option<&str>,
    targets: &[PredictionTarget],
) -> Option<String> {
    final_prefix
        .or(global)
        .map(String::from)
        .or_else(|| targets.first().and_then(|t| t.outfile_prefix.clone()))
}

pub fn final_outfile_path(prefix: &str) -> PathBuf {
    PathBuf::from(format!("{prefix}_final.tsv"))
}
