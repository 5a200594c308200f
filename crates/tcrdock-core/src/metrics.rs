//! Per-model confidence aggregation.
//!
//! The structure predictor hands back, for each model, a per-residue plddt array
//! and optionally a pae matrix. These are reduced to mean values overall, per
//! chain and per ordered chain pair, under `{model}_...` column names.

use crate::chains::ChainBoundaries;
use crate::error::{Error, Result};
use crate::table::Table;
use ndarray::{s, Array1, Array2, ArrayBase, Data, Dimension};
use std::collections::BTreeMap;

/// Artifact tags whose file paths are copied into the output row as `{model}_{tag}_file`.
pub const ARTIFACT_TAGS: [&str; 4] = ["pdb", "plddt", "ptm", "predicted_aligned_error"];

#[derive(Debug, Clone, PartialEq)]
pub struct ModelMetrics {
    pub plddt: Array1<f64>,
    pub predicted_aligned_error: Option<Array2<f64>>,
    /// Artifact paths keyed by tag, e.g. `"pdb" -> "run_T0_model_2_ptm.pdb"`.
    pub files: BTreeMap<String, String>,
}

/// An output table row: the input row followed by metric columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputRow {
    values: Vec<(String, String)>,
}

impl OutputRow {
    pub fn new(values: Vec<(String, String)>) -> Self {
        Self { values }
    }

    /// Set a column, replacing an existing value in place.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.values.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.values.push((column, value)),
        }
    }

    pub fn extend(&mut self, values: impl IntoIterator<Item = (String, String)>) {
        for (c, v) in values {
            self.set(c, v);
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(c, _)| c.as_str())
    }

    pub fn values(&self) -> &[(String, String)] {
        &self.values
    }
}

/// Collect output rows into one table. Columns are the union of all rows' columns
/// in order of first appearance; a row lacking a column gets an empty cell.
pub fn output_table(rows: &[OutputRow]) -> Result<Table> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for c in row.columns() {
            if !columns.iter().any(|k| k == c) {
                columns.push(c.to_string());
            }
        }
    }
    let mut table = Table::new(columns.clone());
    for row in rows {
        let cells = columns.iter().map(|c| row.get(c).map(String::from)).collect();
        table.push_row(cells)?;
    }
    Ok(table)
}

fn mean<S, D>(a: &ArrayBase<S, D>) -> f64
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    a.mean().unwrap_or(f64::NAN)
}

fn format_value(v: f64) -> String {
    format!("{v}")
}

/// Reduce one model's metrics to output columns.
///
/// `num_res` is the ungapped query length; the chain boundaries must cover exactly
/// that many residues. A missing pae matrix drops every `_pae` column for the model.
pub fn aggregate_model_metrics(
    model_name: &str,
    chains: &ChainBoundaries,
    num_res: usize,
    metrics: &ModelMetrics,
) -> Result<Vec<(String, String)>> {
    let nres = chains.nres();
    if nres != num_res {
        return Err(Error::ChainLengthMismatch { nres, num_res });
    }
    let plddts = &metrics.plddt;
    if plddts.len() < nres {
        return Err(Error::MetricShape {
            model: model_name.to_string(),
            reason: format!("plddt has {} values, need {nres}", plddts.len()),
        });
    }
    let paes = metrics.predicted_aligned_error.as_ref();
    if let Some(pae) = paes {
        let (rows, cols) = pae.dim();
        if rows < nres || cols < nres {
            return Err(Error::MetricShape {
                model: model_name.to_string(),
                reason: format!("pae is {rows}x{cols}, need at least {nres}x{nres}"),
            });
        }
    }

    let mut out = Vec::new();
    for tag in ARTIFACT_TAGS {
        if let Some(fname) = metrics.files.get(tag) {
            out.push((format!("{model_name}_{tag}_file"), fname.clone()));
        }
    }

    out.push((
        format!("{model_name}_plddt"),
        format_value(mean(&plddts.slice(s![..nres]))),
    ));
    if let Some(pae) = paes {
        out.push((
            format!("{model_name}_pae"),
            format_value(mean(&pae.slice(s![..nres, ..nres]))),
        ));
    }

    for (chain1, r1) in chains.ranges().enumerate() {
        out.push((
            format!("{model_name}_plddt_{chain1}"),
            format_value(mean(&plddts.slice(s![r1.clone()]))),
        ));
        if let Some(pae) = paes {
            for (chain2, r2) in chains.ranges().enumerate() {
                let block = pae.slice(s![r1.clone(), r2]);
                out.push((
                    format!("{model_name}_pae_{chain1}_{chain2}"),
                    format_value(mean(&block)),
                ));
            }
        }
    }
    Ok(out)
}
