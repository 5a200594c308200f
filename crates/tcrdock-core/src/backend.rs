//! Backend traits for the external modeling stack.
//!
//! Gene tables, MHC allele sequences, docking-geometry template generation,
//! template featurization and AlphaFold inference all live outside this
//! workspace. The drivers only talk to them through these traits.

use crate::config::{ModelRunnerConfig, SetupParams};
use crate::metrics::ModelMetrics;
use crate::records::{ModelingTarget, TemplateAlignment};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Template features as produced by the featurizer. Opaque to this crate.
pub type TemplateFeatures = serde_json::Value;

/// Validates TCR gene names against the gene tables.
pub trait GeneChecker {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Every problem found across all targets. Empty means the genes are usable.
    fn check_genes(&mut self, targets: &[ModelingTarget]) -> Result<Vec<String>, Self::Error>;
}

/// Looks up MHC allele sequences.
pub trait MhcLookup {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Aligned class-I sequence for an allele such as `A*02:01`.
    fn mhc_class_1_alseq(&mut self, allele: &str) -> Result<String, Self::Error>;
}

/// Writes per-target alignment/template files and `<output_dir>/targets.tsv`.
pub trait DockingSetup {
    type Error: std::error::Error + Send + Sync + 'static;

    fn setup_for_alphafold(
        &mut self,
        targets: &Table,
        output_dir: &str,
        params: &SetupParams,
    ) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateFeatureRequest {
    pub query_sequence: String,
    pub template_pdbfile: PathBuf,
    pub target_to_template_alignment: BTreeMap<usize, usize>,
    pub template_name: String,
    pub allow_chainbreaks: bool,
    pub allow_skipped_lines: bool,
    /// Passed through untouched; `None` skips the identity check.
    pub expected_identities: Option<usize>,
    pub expected_template_len: Option<usize>,
}

impl TemplateFeatureRequest {
    /// Request for template number `tnum`, named `T000`, `T001`, ...
    pub fn new(
        query_sequence: &str,
        alignment: &TemplateAlignment,
        tnum: usize,
        ignore_identities: bool,
    ) -> Self {
        Self {
            query_sequence: query_sequence.to_string(),
            template_pdbfile: alignment.template_pdbfile.clone(),
            target_to_template_alignment: alignment.target_to_template_alignment.clone(),
            template_name: format!("T{tnum:03}"),
            allow_chainbreaks: true,
            allow_skipped_lines: true,
            expected_identities: (!ignore_identities).then_some(alignment.identities),
            expected_template_len: Some(alignment.template_len),
        }
    }
}

pub trait TemplateFeaturizer {
    type Error: std::error::Error + Send + Sync + 'static;

    fn create_single_template_features(
        &mut self,
        request: &TemplateFeatureRequest,
    ) -> Result<TemplateFeatures, Self::Error>;

    fn compile_template_features(
        &mut self,
        features: Vec<TemplateFeatures>,
    ) -> Result<TemplateFeatures, Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub query_sequence: String,
    pub msa: Vec<String>,
    pub deletion_matrix: Vec<Vec<u32>>,
    pub chainbreak_sequence: String,
    pub template_features: TemplateFeatures,
    pub out_prefix: String,
    pub crop_size: usize,
    pub dump_pdbs: bool,
    pub dump_metrics: bool,
}

impl PredictionRequest {
    /// Single-sequence MSA (just the query) with an all-zero deletion matrix.
    pub fn single_sequence(
        chainbreak_sequence: &str,
        template_features: TemplateFeatures,
        out_prefix: &str,
        crop_size: usize,
    ) -> Self {
        let query_sequence = chainbreak_sequence.replace('/', "");
        let deletion_matrix = vec![vec![0; query_sequence.chars().count()]];
        Self {
            msa: vec![query_sequence.clone()],
            query_sequence,
            deletion_matrix,
            chainbreak_sequence: chainbreak_sequence.to_string(),
            template_features,
            out_prefix: out_prefix.to_string(),
            crop_size,
            dump_pdbs: true,
            dump_metrics: true,
        }
    }

    pub fn with_dumps(mut self, dump_pdbs: bool, dump_metrics: bool) -> Self {
        self.dump_pdbs = dump_pdbs;
        self.dump_metrics = dump_metrics;
        self
    }
}

/// What the predictor reports after loading its model runners.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunnerInfo {
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub model_names: Vec<String>,
}

/// AlphaFold inference. Runners are loaded once and reused for every target.
pub trait StructurePredictor {
    type Error: std::error::Error + Send + Sync + 'static;

    fn load_model_runners(&mut self, config: &ModelRunnerConfig)
        -> Result<RunnerInfo, Self::Error>;

    /// Metrics per model, in model-runner order.
    fn run_alphafold_prediction(
        &mut self,
        request: &PredictionRequest,
    ) -> Result<Vec<(String, ModelMetrics)>, Self::Error>;
}
