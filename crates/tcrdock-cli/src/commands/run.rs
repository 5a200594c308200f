use super::spawn_bridge;
use anyhow::{bail, Context, Result};
use itertools::Itertools;
use log::{info, warn};
use std::path::PathBuf;
use tcrdock_core::backend::{
    PredictionRequest, StructurePredictor, TemplateFeatureRequest, TemplateFeaturizer,
};
use tcrdock_core::{
    aggregate_model_metrics, final_outfile_path, final_outfile_prefix, target_outfile_prefix,
    ChainBoundaries, Error as CoreError, ModelRunnerConfig, OutputRow, PredictionTarget,
};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub targets: PathBuf,
    pub outfile_prefix: Option<String>,
    pub final_outfile_prefix: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub model_names: Vec<String>,
    pub model_params_files: Vec<String>,
    pub verbose: bool,
    pub ignore_identities: bool,
    pub write_pdbs: bool,
    pub terse: bool,
    pub resample_msa: bool,
}

impl RunOptions {
    fn runner_config(&self, crop_size: usize) -> ModelRunnerConfig {
        ModelRunnerConfig::builder()
            .model_names(self.model_names.clone())
            .crop_size(crop_size)
            .maybe_data_dir(self.data_dir.clone())
            .model_params_files(self.model_params_files.clone())
            .resample_msa_in_recycling(self.resample_msa)
            .build()
    }
}

/// Host name as reported by `hostname`, falling back to the kernel's.
fn hostname() -> String {
    std::process::Command::new("hostname")
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
        .or_else(|| std::fs::read_to_string("/proc/sys/kernel/hostname").ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Predict one target and return its output row.
fn predict_target<B>(
    backend: &mut B,
    target: &PredictionTarget,
    counter: usize,
    crop_size: usize,
    opts: &RunOptions,
) -> Result<OutputRow>
where
    B: TemplateFeaturizer + StructurePredictor,
{
    let alignfile = &target.templates_alignfile;
    if !alignfile.exists() {
        return Err(CoreError::MissingAlignFile(alignfile.clone()).into());
    }
    let outfile_prefix = target_outfile_prefix(opts.outfile_prefix.as_deref(), target, counter)?;

    let alignments = tcrdock_io::load_alignments(alignfile)?;
    let query_sequence = target.query_sequence();
    let query_len = target.num_res();
    for alignment in &alignments {
        alignment.check_target_len(query_len)?;
    }

    let features = alignments
        .iter()
        .enumerate()
        .map(|(tnum, alignment)| {
            let request = TemplateFeatureRequest::new(
                &query_sequence,
                alignment,
                tnum,
                opts.ignore_identities,
            );
            backend.create_single_template_features(&request)
        })
        .collect::<Result<Vec<_>, _>>()?;
    let template_features = backend.compile_template_features(features)?;

    let request = PredictionRequest::single_sequence(
        &target.target_chainseq,
        template_features,
        &outfile_prefix,
        crop_size,
    )
    .with_dumps(opts.write_pdbs && !opts.terse, !opts.terse);
    let results = backend.run_alphafold_prediction(&request)?;

    let chains = ChainBoundaries::from_chainseq(&target.target_chainseq);
    let mut row = OutputRow::new(target.row.clone());
    for (model_name, metrics) in &results {
        row.extend(aggregate_model_metrics(model_name, &chains, query_len, metrics)?);
    }
    Ok(row)
}

/// Predict every target in order. The first failure aborts the whole run.
pub fn run_targets<B>(
    backend: &mut B,
    targets: &[PredictionTarget],
    opts: &RunOptions,
) -> Result<Vec<OutputRow>>
where
    B: TemplateFeaturizer + StructurePredictor,
{
    let Some(crop_size) = targets.iter().map(PredictionTarget::num_res).max() else {
        bail!("no targets to model");
    };

    let runner_info = backend.load_model_runners(&opts.runner_config(crop_size))?;

    if opts.verbose {
        info!("cmd: {}", std::env::args().join(" "));
        info!("host: {}", hostname());
        info!(
            "platform: {}",
            runner_info.platform.as_deref().unwrap_or("unknown")
        );
        info!("models: {}", runner_info.model_names.join(" "));
        info!("num_targets: {} max_len: {crop_size}", targets.len());
    }

    let mut rows = Vec::with_capacity(targets.len());
    for (counter, target) in targets.iter().enumerate() {
        info!("START: {counter} of {}", targets.len());
        let row = predict_target(backend, target, counter, crop_size, opts).with_context(|| {
            format!(
                "row {} ({})",
                target.index,
                target.targetid.as_deref().unwrap_or(&target.target_chainseq)
            )
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Run all targets, then write the final metrics table.
pub fn run<B>(backend: &mut B, targets: &[PredictionTarget], opts: &RunOptions) -> Result<()>
where
    B: TemplateFeaturizer + StructurePredictor,
{
    let rows = run_targets(backend, targets, opts)?;
    match final_outfile_prefix(
        opts.final_outfile_prefix.as_deref(),
        opts.outfile_prefix.as_deref(),
        targets,
    ) {
        Some(prefix) => {
            let path = final_outfile_path(&prefix);
            tcrdock_io::write_output_rows(&path, &rows)?;
            info!("made: {}", path.display());
        }
        None => warn!("no outfile prefix given, not writing the final metrics table"),
    }
    Ok(())
}

pub fn execute(opts: RunOptions, bridge: &str) -> Result<()> {
    let targets = tcrdock_io::load_prediction_targets(&opts.targets)?;
    let mut backend = spawn_bridge(bridge)?;
    run(&mut backend, &targets, &opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};
    use std::collections::BTreeMap;
    use std::path::Path;
    use tcrdock_core::backend::{RunnerInfo, TemplateFeatures};
    use tcrdock_core::ModelMetrics;
    use tcrdock_test_data::TestFile;

    /// Records every request and answers with position-valued plddt/pae arrays.
    #[derive(Default)]
    struct FakeAlphafold {
        config: Option<ModelRunnerConfig>,
        template_requests: Vec<TemplateFeatureRequest>,
        predictions: Vec<PredictionRequest>,
        with_pae: bool,
    }

    impl TemplateFeaturizer for FakeAlphafold {
        type Error = std::io::Error;

        fn create_single_template_features(
            &mut self,
            request: &TemplateFeatureRequest,
        ) -> Result<TemplateFeatures, Self::Error> {
            self.template_requests.push(request.clone());
            Ok(serde_json::json!({ "name": request.template_name }))
        }

        fn compile_template_features(
            &mut self,
            features: Vec<TemplateFeatures>,
        ) -> Result<TemplateFeatures, Self::Error> {
            Ok(serde_json::Value::Array(features))
        }
    }

    impl StructurePredictor for FakeAlphafold {
        type Error = std::io::Error;

        fn load_model_runners(
            &mut self,
            config: &ModelRunnerConfig,
        ) -> Result<RunnerInfo, Self::Error> {
            self.config = Some(config.clone());
            Ok(RunnerInfo {
                platform: Some("cpu".into()),
                model_names: config.model_names.clone(),
            })
        }

        fn run_alphafold_prediction(
            &mut self,
            request: &PredictionRequest,
        ) -> Result<Vec<(String, ModelMetrics)>, Self::Error> {
            self.predictions.push(request.clone());
            let nres = request.query_sequence.len();
            let models = self
                .config
                .as_ref()
                .map(|c| c.model_names.clone())
                .unwrap_or_default();
            Ok(models
                .iter()
                .map(|name| {
                    let files = [("pdb".to_string(), format!("{}_{name}.pdb", request.out_prefix))]
                        .into_iter()
                        .collect::<BTreeMap<_, _>>();
                    let metrics = ModelMetrics {
                        plddt: Array1::from_iter((0..nres).map(|i| i as f64)),
                        predicted_aligned_error: self
                            .with_pae
                            .then(|| Array2::from_shape_fn((nres, nres), |(i, _)| i as f64)),
                        files,
                    };
                    (name.clone(), metrics)
                })
                .collect())
        }
    }

    fn options(outfile_prefix: Option<String>) -> RunOptions {
        RunOptions {
            targets: "targets.tsv".into(),
            outfile_prefix,
            final_outfile_prefix: None,
            data_dir: None,
            model_names: vec!["model_2_ptm".into()],
            model_params_files: Vec::new(),
            verbose: true,
            ignore_identities: false,
            write_pdbs: true,
            terse: false,
            resample_msa: true,
        }
    }

    fn target(
        index: usize,
        chainseq: &str,
        alignfile: &Path,
        targetid: Option<&str>,
    ) -> PredictionTarget {
        let mut row = vec![
            ("target_chainseq".to_string(), chainseq.to_string()),
            (
                "templates_alignfile".to_string(),
                alignfile.display().to_string(),
            ),
        ];
        if let Some(id) = targetid {
            row.push(("targetid".to_string(), id.to_string()));
        }
        PredictionTarget {
            index,
            target_chainseq: chainseq.to_string(),
            templates_alignfile: alignfile.to_path_buf(),
            outfile_prefix: None,
            targetid: targetid.map(String::from),
            row,
        }
    }

    #[test]
    fn test_single_target_two_chains() {
        let dir = tempfile::tempdir().unwrap();
        let alignfile = TestFile::alignments_two_chain()
            .write_to(dir.path(), "aln.tsv")
            .unwrap();
        let prefix = dir.path().join("run").display().to_string();
        let targets = vec![target(0, "ABCDE/FGHIJKL", Path::new(&alignfile), None)];
        let mut backend = FakeAlphafold {
            with_pae: true,
            ..Default::default()
        };

        let rows = run_targets(&mut backend, &targets, &options(Some(prefix.clone()))).unwrap();
        let row = &rows[0];
        assert_eq!(row.get("model_2_ptm_plddt_0"), Some("2"));
        assert_eq!(row.get("model_2_ptm_plddt_1"), Some("8"));
        assert!(row.get("model_2_ptm_pae_1_0").is_some());
        assert_eq!(
            row.get("model_2_ptm_pdb_file"),
            Some(format!("{prefix}_T0_model_2_ptm.pdb").as_str())
        );
        // input columns come first
        assert_eq!(row.columns().next(), Some("target_chainseq"));

        let config = backend.config.unwrap();
        assert_eq!(config.crop_size, 12);

        let names: Vec<_> = backend
            .template_requests
            .iter()
            .map(|r| r.template_name.as_str())
            .collect();
        assert_eq!(names, vec!["T000", "T001"]);
        assert_eq!(backend.template_requests[1].expected_identities, Some(6));

        let prediction = &backend.predictions[0];
        assert_eq!(prediction.msa, vec!["ABCDEFGHIJKL"]);
        assert_eq!(prediction.out_prefix, format!("{prefix}_T0"));
        assert!(prediction.dump_pdbs);
        assert!(prediction.dump_metrics);
    }

    #[test]
    fn test_terse_and_ignore_identities() {
        let dir = tempfile::tempdir().unwrap();
        let alignfile = TestFile::alignments_two_chain()
            .write_to(dir.path(), "aln.tsv")
            .unwrap();
        let targets = vec![target(0, "ABCDE/FGHIJKL", Path::new(&alignfile), Some("flu"))];
        let mut opts = options(Some("run".into()));
        opts.terse = true;
        opts.ignore_identities = true;
        let mut backend = FakeAlphafold::default();

        let rows = run_targets(&mut backend, &targets, &opts).unwrap();
        assert!(rows[0].columns().all(|c| !c.contains("_pae")));
        assert!(backend
            .template_requests
            .iter()
            .all(|r| r.expected_identities.is_none()));
        let prediction = &backend.predictions[0];
        assert_eq!(prediction.out_prefix, "run_flu");
        assert!(!prediction.dump_pdbs);
        assert!(!prediction.dump_metrics);
    }

    #[test]
    fn test_target_len_mismatch_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let alignfile = TestFile::alignments_two_chain()
            .write_to(dir.path(), "aln.tsv")
            .unwrap();
        // 11 residues against alignments declaring 12
        let targets = vec![target(0, "ABCDE/FGHIJK", Path::new(&alignfile), None)];
        let mut backend = FakeAlphafold::default();

        let err = run_targets(&mut backend, &targets, &options(Some("run".into()))).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::TargetLengthMismatch {
                declared: 12,
                actual: 11,
                ..
            })
        ));
        assert!(backend.predictions.is_empty());
    }

    #[test]
    fn test_missing_alignfile_writes_no_final_table() {
        let dir = tempfile::tempdir().unwrap();
        let alignfile = TestFile::alignments_two_chain()
            .write_to(dir.path(), "aln.tsv")
            .unwrap();
        let prefix = dir.path().join("run").display().to_string();
        let targets = vec![
            target(0, "ABCDE/FGHIJKL", Path::new(&alignfile), None),
            target(1, "ABCDE/FGHIJKL", &dir.path().join("missing.tsv"), None),
        ];
        let mut backend = FakeAlphafold::default();

        let err = run(&mut backend, &targets, &options(Some(prefix.clone()))).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::MissingAlignFile(_))
        ));
        // the first target was predicted, but nothing is written
        assert_eq!(backend.predictions.len(), 1);
        assert!(!final_outfile_path(&prefix).exists());
    }

    #[test]
    fn test_final_table_written() {
        let dir = tempfile::tempdir().unwrap();
        let alignfile = TestFile::alignments_two_chain()
            .write_to(dir.path(), "aln.tsv")
            .unwrap();
        let prefix = dir.path().join("run").display().to_string();
        let targets = vec![
            target(0, "ABCDE/FGHIJKL", Path::new(&alignfile), Some("a")),
            target(1, "ABCDEF/GHIJKL", Path::new(&alignfile), Some("b")),
        ];
        let mut opts = options(Some(prefix.clone()));
        opts.model_names = vec!["model_1".into(), "model_2_ptm".into()];
        let mut backend = FakeAlphafold {
            with_pae: true,
            ..Default::default()
        };

        run(&mut backend, &targets, &opts).unwrap();
        let table = tcrdock_io::read_tsv(final_outfile_path(&prefix)).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.has_column("model_1_plddt"));
        assert!(table.has_column("model_2_ptm_pae_0_1"));
        let second = table.row(1).unwrap();
        assert_eq!(second.get("targetid"), Some("b"));
        // mean of 0..6
        assert_eq!(second.get("model_1_plddt_0"), Some("2.5"));
    }

    #[test]
    fn test_empty_targets_rejected() {
        let mut backend = FakeAlphafold::default();
        let err = run(&mut backend, &[], &options(Some("run".into()))).unwrap_err();
        assert!(err.to_string().contains("no targets"));
        // runners are never loaded
        assert!(backend.config.is_none());
    }

    #[test]
    fn test_failure_names_the_row() {
        let dir = tempfile::tempdir().unwrap();
        let alignfile = TestFile::alignments_two_chain()
            .write_to(dir.path(), "aln.tsv")
            .unwrap();
        let targets = vec![
            target(0, "ABCDE/FGHIJKL", Path::new(&alignfile), Some("ok")),
            target(1, "ABC/DE", Path::new(&alignfile), Some("short")),
        ];
        let mut backend = FakeAlphafold::default();
        let err = run_targets(&mut backend, &targets, &options(Some("run".into()))).unwrap_err();
        assert_eq!(err.to_string(), "row 1 (short)");
        assert_eq!(backend.predictions.len(), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_hostname() {
        let name = hostname();
        assert_ne!(name, "unknown");
        assert_eq!(name, name.trim());
    }

    #[test]
    fn test_no_prefix_for_unnamed_target() {
        let dir = tempfile::tempdir().unwrap();
        let alignfile = TestFile::alignments_two_chain()
            .write_to(dir.path(), "aln.tsv")
            .unwrap();
        let targets = vec![target(0, "ABCDE/FGHIJKL", Path::new(&alignfile), None)];
        let err = run(&mut FakeAlphafold::default(), &targets, &options(None)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::MissingOutfilePrefix(0))
        ));
    }
}
