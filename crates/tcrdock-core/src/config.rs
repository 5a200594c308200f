//! Parameters handed to the external modeling stack.

use bon::Builder;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Template-selection parameters for `setup_for_alphafold`.
///
/// Thresholds of `-1` disable the corresponding filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct SetupParams {
    #[builder(default = true)]
    pub clobber: bool,
    #[builder(default = false)]
    pub exclude_self_peptide_docking_geometries: bool,
    #[builder(default = -1.0)]
    pub min_single_chain_tcrdist: f64,
    #[builder(default = -1)]
    pub min_pmhc_peptide_mismatches: i32,
    #[builder(default = 3)]
    pub num_runs: u32,
    #[builder(default = -1)]
    pub min_dgeom_peptide_mismatches: i32,
    #[builder(default = -1.0)]
    pub min_dgeom_paired_tcrdist: f64,
    #[builder(default = -1.0)]
    pub min_dgeom_singlechain_tcrdist: f64,
    /// Column listing comma-separated pdbfiles to exclude for each target.
    pub exclude_pdbids_column: Option<String>,
    #[builder(default = false)]
    pub use_opt_dgeoms: bool,
}

impl SetupParams {
    /// Settings that exclude sequence-similar templates, for benchmarking.
    pub fn benchmark() -> Self {
        SetupParams::builder()
            .exclude_self_peptide_docking_geometries(true)
            .min_single_chain_tcrdist(36.0)
            .min_pmhc_peptide_mismatches(3)
            .min_dgeom_peptide_mismatches(3)
            .min_dgeom_paired_tcrdist(48.5)
            .min_dgeom_singlechain_tcrdist(0.5)
            .build()
    }
}

impl Default for SetupParams {
    fn default() -> Self {
        SetupParams::builder().build()
    }
}

/// How to load the AlphaFold model runners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct ModelRunnerConfig {
    #[builder(default = vec!["model_2_ptm".to_string()])]
    pub model_names: Vec<String>,
    pub crop_size: usize,
    /// Folder holding AlphaFold's `params/`.
    #[builder(into)]
    pub data_dir: Option<PathBuf>,
    /// Fine-tuned or relocated parameter files, one per model name.
    #[builder(default)]
    pub model_params_files: Vec<String>,
    #[builder(default = true)]
    pub resample_msa_in_recycling: bool,
}
