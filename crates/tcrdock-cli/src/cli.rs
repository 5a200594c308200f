use super::commands;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Command line of the helper process hosting the Python modeling stack.
    #[arg(long, global = true, env = "TCRDOCK_BRIDGE", default_value = tcrdock_bridge::DEFAULT_BRIDGE_COMMAND)]
    bridge: String,

    #[command(subcommand)]
    command: Commands,
}

fn existing_file(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("no such file: {s}"))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Pick templates and docking geometries, and write the inputs for `run`.
    Setup {
        /// TSV with organism, mhc_class, mhc, peptide, va, ja, cdr3a, vb, jb, cdr3b columns.
        #[arg(short, long, value_parser = existing_file)]
        targets_tsvfile: PathBuf,

        /// Where the alignment files and `targets.tsv` are written.
        #[arg(long)]
        output_dir: PathBuf,

        /// Docking-geometry runs per target.
        #[arg(long, default_value_t = 3)]
        num_runs: u32,

        /// Exclude templates too similar to each target.
        #[arg(long)]
        benchmark: bool,

        /// Keep `--output-dir` relative in the generated files.
        #[arg(long)]
        maintain_relative_paths: bool,

        /// Column holding comma-separated pdbids to exclude for each target.
        #[arg(long)]
        exclude_pdbids_column: Option<String>,

        /// One run per target using optimized docking geometries.
        #[arg(long)]
        new_docking: bool,
    },

    /// Run AlphaFold on the targets written by `setup`.
    Run {
        /// TSV with target_chainseq and templates_alignfile columns.
        #[arg(short, long, value_parser = existing_file)]
        targets: PathBuf,

        #[arg(long)]
        outfile_prefix: Option<String>,

        /// Prefix of the `_final.tsv` metrics table.
        #[arg(long)]
        final_outfile_prefix: Option<String>,

        /// AlphaFold data folder, containing `params/`.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        #[arg(long, num_args = 1.., default_values_t = vec!["model_2_ptm".to_string()])]
        model_names: Vec<String>,

        #[arg(long, num_args = 1..)]
        model_params_files: Vec<String>,

        #[arg(long)]
        verbose: bool,

        /// Skip the template identity check.
        #[arg(long)]
        ignore_identities: bool,

        #[arg(long, overrides_with = "no_pdbs")]
        write_pdbs: bool,

        #[arg(long, overrides_with = "write_pdbs")]
        no_pdbs: bool,

        /// Write neither structures nor metric files, only the final table.
        #[arg(long)]
        terse: bool,

        #[arg(long, overrides_with = "no_resample_msa")]
        resample_msa: bool,

        #[arg(long, overrides_with = "resample_msa")]
        no_resample_msa: bool,
    },

    /// Print the aligned class-I sequence of an MHC allele.
    CheckMhc {
        #[arg(short, long)]
        allele: String,
    },
}

impl Cli {
    pub fn execute(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Setup {
                targets_tsvfile,
                output_dir,
                num_runs,
                benchmark,
                maintain_relative_paths,
                exclude_pdbids_column,
                new_docking,
            } => commands::setup::execute(
                commands::setup::SetupOptions {
                    targets_tsvfile,
                    output_dir,
                    num_runs,
                    benchmark,
                    maintain_relative_paths,
                    exclude_pdbids_column,
                    new_docking,
                },
                &self.bridge,
            ),
            Commands::Run {
                targets,
                outfile_prefix,
                final_outfile_prefix,
                data_dir,
                model_names,
                model_params_files,
                verbose,
                ignore_identities,
                write_pdbs: _,
                no_pdbs,
                terse,
                resample_msa: _,
                no_resample_msa,
            } => commands::run::execute(
                commands::run::RunOptions {
                    targets,
                    outfile_prefix,
                    final_outfile_prefix,
                    data_dir,
                    model_names,
                    model_params_files,
                    verbose,
                    ignore_identities,
                    write_pdbs: !no_pdbs,
                    terse,
                    resample_msa: !no_resample_msa,
                },
                &self.bridge,
            ),
            Commands::CheckMhc { allele } => commands::check_mhc::execute(&allele, &self.bridge),
        }
    }
}
