//! Wire types for the helper protocol.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tcrdock_core::backend::{PredictionRequest, TemplateFeatureRequest, TemplateFeatures};
use tcrdock_core::{ModelMetrics, ModelRunnerConfig, ModelingTarget, SetupParams, Table};

/// One request line. The `op` field names the helper function to call.
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request<'a> {
    CheckGenes {
        targets: &'a [ModelingTarget],
    },
    #[serde(rename = "mhc_class_1_alseq")]
    MhcClass1Alseq {
        allele: &'a str,
    },
    SetupForAlphafold {
        targets: &'a Table,
        output_dir: &'a str,
        params: &'a SetupParams,
    },
    LoadModelRunners(&'a ModelRunnerConfig),
    CreateSingleTemplateFeatures(&'a TemplateFeatureRequest),
    CompileTemplateFeatures {
        features: Vec<TemplateFeatures>,
    },
    RunAlphafoldPrediction(&'a PredictionRequest),
}

impl Request<'_> {
    pub fn op(&self) -> &'static str {
        match self {
            Request::CheckGenes { .. } => "check_genes",
            Request::MhcClass1Alseq { .. } => "mhc_class_1_alseq",
            Request::SetupForAlphafold { .. } => "setup_for_alphafold",
            Request::LoadModelRunners(_) => "load_model_runners",
            Request::CreateSingleTemplateFeatures(_) => "create_single_template_features",
            Request::CompileTemplateFeatures { .. } => "compile_template_features",
            Request::RunAlphafoldPrediction(_) => "run_alphafold_prediction",
        }
    }
}

/// Per-model prediction output as sent by the helper. Matrices travel as nested lists.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelResult {
    pub model_name: String,
    pub plddt: Vec<f64>,
    #[serde(default)]
    pub predicted_aligned_error: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub files: BTreeMap<String, String>,
}

impl ModelResult {
    pub fn into_metrics(self) -> Result<ModelMetrics, String> {
        let predicted_aligned_error = match self.predicted_aligned_error {
            Some(rows) => Some(to_matrix(&self.model_name, rows)?),
            None => None,
        };
        Ok(ModelMetrics {
            plddt: Array1::from(self.plddt),
            predicted_aligned_error,
            files: self.files,
        })
    }
}

fn to_matrix(model_name: &str, rows: Vec<Vec<f64>>) -> Result<Array2<f64>, String> {
    let nrows = rows.len();
    let ncols = rows.first().map_or(0, Vec::len);
    if let Some(bad) = rows.iter().position(|r| r.len() != ncols) {
        return Err(format!(
            "{model_name}: ragged pae matrix, row {bad} has {} columns, expected {ncols}",
            rows[bad].len()
        ));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((nrows, ncols), flat).map_err(|e| format!("{model_name}: {e}"))
}
