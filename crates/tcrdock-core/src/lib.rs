//! # tcrdock-core
//!
//! Data model and bookkeeping for AlphaFold modeling of TCR:peptide-MHC complexes.
//!
//! __tcrdock-core__ provides:
//! * [`Table`], a text-valued view of a TSV file with named columns
//! * typed records for modeling targets, prediction targets and template alignments
//! * chain boundaries derived from `/`-delimited chain sequences
//! * per-model confidence aggregation (plddt / pae) into output columns
//! * output prefix resolution
//! * the [`backend`] traits implemented by the external modeling stack
//!
mod chains;
mod config;
mod error;
mod metrics;
mod prefix;
mod records;
mod table;

pub mod backend;

pub use self::chains::ChainBoundaries;
pub use self::config::{ModelRunnerConfig, SetupParams};
pub use self::error::{Error, Result};
pub use self::metrics::{
    aggregate_model_metrics, output_table, ModelMetrics, OutputRow, ARTIFACT_TAGS,
};
pub use self::prefix::{final_outfile_prefix, final_outfile_path, target_outfile_prefix};
pub use self::records::{
    parse_alignstring, ModelingTarget, MhcClass, Organism, PredictionTarget, RequiredColumn,
    TemplateAlignment, ALIGNMENT_COLUMNS,
};
pub use self::table::{Row, Table};
