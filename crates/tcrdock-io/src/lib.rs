//! tcrdock-io
//!
//! Tab-separated table files: the `setup` and `run` targets files, the per-target
//! templates alignment files and the final metrics table.
//!
//! Every column is read as text; typed access goes through the records in
//! `tcrdock-core`.
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tcrdock_core::{OutputRow, PredictionTarget, Table, TemplateAlignment};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: PolarsError },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: PolarsError },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Records {
        path: PathBuf,
        source: tcrdock_core::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

fn read_dataframe(path: &Path) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        // no schema inference: every column comes back as a string
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_separator(b'\t'))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}

fn dataframe_columns(df: &DataFrame) -> PolarsResult<(Vec<String>, Vec<Vec<Option<String>>>)> {
    let columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(columns.len()); df.height()];
    for name in &columns {
        let series = df
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        for (row, value) in cells.iter_mut().zip(series.str()?.into_iter()) {
            row.push(value.map(String::from));
        }
    }
    Ok((columns, cells))
}

fn table_to_dataframe(table: &Table) -> PolarsResult<DataFrame> {
    let columns = table
        .columns()
        .iter()
        .map(|name| {
            let values = table.column_values(name).unwrap_or_default();
            Column::new(name.as_str().into(), values)
        })
        .collect();
    DataFrame::new(columns)
}

/// Read a tab-separated file with a header row.
pub fn read_tsv(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let read_err = |source| Error::Read {
        path: path.to_path_buf(),
        source,
    };
    let df = read_dataframe(path).map_err(read_err)?;
    let (columns, cells) = dataframe_columns(&df).map_err(read_err)?;
    Table::from_rows(columns, cells).map_err(|source| Error::Records {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a table as tab-separated text with a header row. Empty cells stay empty.
pub fn write_tsv(path: impl AsRef<Path>, table: &Table) -> Result<()> {
    let path = path.as_ref();
    let write_err = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut df = table_to_dataframe(table).map_err(write_err)?;
    let mut file = std::fs::File::create(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b'\t')
        .finish(&mut df)
        .map_err(write_err)
}

/// Read the `run` targets file.
pub fn load_prediction_targets(path: impl AsRef<Path>) -> Result<Vec<PredictionTarget>> {
    let path = path.as_ref();
    let table = read_tsv(path)?;
    PredictionTarget::from_table(&table).map_err(|source| Error::Records {
        path: path.to_path_buf(),
        source,
    })
}

/// Read one templates alignment file.
pub fn load_alignments(path: impl AsRef<Path>) -> Result<Vec<TemplateAlignment>> {
    let path = path.as_ref();
    let table = read_tsv(path)?;
    TemplateAlignment::from_table(&table).map_err(|source| Error::Records {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the final metrics table.
pub fn write_output_rows(path: impl AsRef<Path>, rows: &[OutputRow]) -> Result<()> {
    let path = path.as_ref();
    let table = tcrdock_core::output_table(rows).map_err(|source| Error::Records {
        path: path.to_path_buf(),
        source,
    })?;
    write_tsv(path, &table)
}
