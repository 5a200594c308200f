use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("missing required columns: {0:?}")]
    MissingColumns(Vec<String>),

    #[error("row {row}: missing value for column `{column}`")]
    MissingValue { row: usize, column: String },

    #[error("row {row}: bad value {value:?} in column `{column}`: {reason}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    #[error("bad alignment pair {0:?}, expected `query_index:template_index`")]
    InvalidAlignPair(String),

    #[error("template {template}: target_len {declared} != query length {actual}")]
    TargetLengthMismatch {
        template: String,
        declared: usize,
        actual: usize,
    },

    #[error("templates alignment file does not exist: {0}")]
    MissingAlignFile(PathBuf),

    #[error("chain lengths sum to {nres} but the query has {num_res} residues")]
    ChainLengthMismatch { nres: usize, num_res: usize },

    #[error("model {model}: {reason}")]
    MetricShape { model: String, reason: String },

    #[error("row {0}: no outfile_prefix column and no --outfile-prefix given")]
    MissingOutfilePrefix(usize),

    #[error("row length {found} does not match header length {expected}")]
    RaggedRow { expected: usize, found: usize },
}
