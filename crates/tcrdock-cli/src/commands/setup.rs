use super::spawn_bridge;
use anyhow::{bail, Context, Result};
use log::{error, info};
use std::path::{Path, PathBuf};
use tcrdock_core::backend::{DockingSetup, GeneChecker};
use tcrdock_core::{ModelingTarget, RequiredColumn, SetupParams, Table};

#[derive(Debug, Clone)]
pub struct SetupOptions {
    pub targets_tsvfile: PathBuf,
    pub output_dir: PathBuf,
    pub num_runs: u32,
    pub benchmark: bool,
    pub maintain_relative_paths: bool,
    pub exclude_pdbids_column: Option<String>,
    pub new_docking: bool,
}

impl SetupOptions {
    pub fn params(&self) -> SetupParams {
        let base = if self.benchmark {
            SetupParams::benchmark()
        } else {
            SetupParams::default()
        };
        SetupParams {
            clobber: true,
            num_runs: if self.new_docking { 1 } else { self.num_runs },
            use_opt_dgeoms: self.new_docking,
            exclude_pdbids_column: self.exclude_pdbids_column.clone(),
            ..base
        }
    }
}

/// Check that every required column (and the exclude column, if any) is present.
/// All missing columns are reported together.
pub fn validate_columns(table: &Table, opts: &SetupOptions) -> Result<Vec<ModelingTarget>> {
    let mut required: Vec<&str> = RequiredColumn::names();
    if let Some(col) = &opts.exclude_pdbids_column {
        required.push(col.as_str());
    }
    let missing = table.missing_columns(&required);
    if !missing.is_empty() {
        error!("required columns missing from {}", opts.targets_tsvfile.display());
        bail!("missing required columns: {missing:?}");
    }
    Ok(ModelingTarget::from_table(table)?)
}

/// `output_dir` as handed to the template setup: absolute unless asked otherwise,
/// always ending in `/`.
fn resolve_output_dir(output_dir: &Path, maintain_relative_paths: bool) -> Result<String> {
    let dir = if maintain_relative_paths {
        output_dir.to_path_buf()
    } else {
        std::path::absolute(output_dir)
            .with_context(|| format!("cannot resolve {}", output_dir.display()))?
    };
    let mut dir = dir.to_string_lossy().into_owned();
    if !dir.ends_with('/') {
        dir.push('/');
    }
    Ok(dir)
}

/// Gene check, output folder, then template setup.
pub fn setup_targets<B>(
    backend: &mut B,
    table: &Table,
    targets: &[ModelingTarget],
    opts: &SetupOptions,
) -> Result<String>
where
    B: GeneChecker + DockingSetup,
{
    let problems = backend.check_genes(targets)?;
    if !problems.is_empty() {
        for problem in &problems {
            error!("{problem}");
        }
        bail!("{} problem(s) with the TCR gene names", problems.len());
    }

    std::fs::create_dir_all(&opts.output_dir)
        .with_context(|| format!("cannot create {}", opts.output_dir.display()))?;
    let output_dir = resolve_output_dir(&opts.output_dir, opts.maintain_relative_paths)?;

    let params = opts.params();
    info!(
        "setting up {} targets in {output_dir} ({} runs each)",
        targets.len(),
        params.num_runs
    );
    backend.setup_for_alphafold(table, &output_dir, &params)?;
    info!("made: {output_dir}targets.tsv");
    Ok(output_dir)
}

pub fn execute(opts: SetupOptions, bridge: &str) -> Result<()> {
    let table = tcrdock_io::read_tsv(&opts.targets_tsvfile)?;
    let targets = validate_columns(&table, &opts)?;
    let mut backend = spawn_bridge(bridge)?;
    setup_targets(&mut backend, &table, &targets, &opts)?;
    Ok(())
}
