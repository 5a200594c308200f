//! tcrdock-bridge
//!
//! Drives the Python modeling stack (gene tables, MHC alleles, docking-geometry
//! templates, AlphaFold) through one long-lived helper process.
//!
//! The helper reads one JSON request per line on stdin and answers each with one
//! JSON line on stdout:
//!
//! ```text
//! > {"op":"mhc_class_1_alseq","allele":"A*02:01"}
//! < {"ok":true,"result":"GSHSMRYFFTSVSRPGRGEPRFIAVGYVDDTQFVRF..."}
//! > {"op":"check_genes","targets":[...]}
//! < {"ok":false,"error":"unrecognized va gene TRAV99*01"}
//! ```
//!
//! Model runners are loaded by `load_model_runners` and stay resident in the
//! helper until it exits, so every prediction reuses them.
//!
//! Stdout is reserved for the protocol, but the hosted Python code prints
//! progress there too. Lines that are not a `{"ok": ...}` envelope are logged at
//! debug level and skipped. Once the helper breaks the protocol (an unreadable
//! reply, a failed write or read), the bridge refuses further calls with
//! [`Error::Closed`] rather than risk pairing a request with a stale reply.
mod protocol;

pub use protocol::{ModelResult, Request};

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tcrdock_core::backend::{
    DockingSetup, GeneChecker, MhcLookup, PredictionRequest, RunnerInfo, StructurePredictor,
    TemplateFeatureRequest, TemplateFeaturizer, TemplateFeatures,
};
use tcrdock_core::{ModelMetrics, ModelRunnerConfig, ModelingTarget, SetupParams, Table};
use thiserror::Error;

/// Command used when neither `--bridge` nor `TCRDOCK_BRIDGE` is set.
pub const DEFAULT_BRIDGE_COMMAND: &str = "python -m tcrdock_bridge";

#[derive(Error, Debug)]
pub enum Error {
    #[error("bridge command is empty")]
    EmptyCommand,

    #[error("failed to start bridge `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("bridge is closed, cannot answer `{0}`")]
    Closed(String),

    #[error("bridge i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad bridge response to `{op}`: {reason}")]
    Protocol { op: String, reason: String },

    #[error("bridge `{op}` failed: {message}")]
    Remote { op: String, message: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Deserialize)]
struct Response {
    ok: bool,
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

impl Response {
    /// `None` for anything that is not a reply envelope, e.g. a progress message.
    fn parse(line: &str) -> Option<Self> {
        serde_json::from_str(line.trim()).ok()
    }

    fn into_result<T: DeserializeOwned>(self, op: &str) -> Result<T> {
        if !self.ok {
            return Err(Error::Remote {
                op: op.to_string(),
                message: self.error.unwrap_or_else(|| "no error message".to_string()),
            });
        }
        serde_json::from_value(self.result).map_err(|e| Error::Protocol {
            op: op.to_string(),
            reason: e.to_string(),
        })
    }
}

/// A running helper process.
pub struct Bridge {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    poisoned: bool,
}

impl Bridge {
    /// Start the helper from a whitespace-separated command line.
    pub fn spawn(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next().ok_or(Error::EmptyCommand)?;
        Self::spawn_with(program, parts)
    }

    pub fn spawn_with<I, S>(program: &str, args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        let command = std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        info!("starting bridge: {command}");
        let spawn_err = |source| Error::Spawn {
            command: command.clone(),
            source,
        };
        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(spawn_err)?;
        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| spawn_err(std::io::Error::other("no stdout pipe")))?;
        Ok(Self {
            child,
            stdin,
            stdout,
            poisoned: false,
        })
    }

    /// Send one request and decode the `result` of its response.
    pub fn call<T: DeserializeOwned>(&mut self, request: &Request<'_>) -> Result<T> {
        let op = request.op();
        if self.poisoned {
            return Err(Error::Closed(op.to_string()));
        }
        let result = self
            .exchange(request, op)
            .and_then(|response| response.into_result(op));
        if matches!(
            result,
            Err(Error::Protocol { .. } | Error::Io(_) | Error::Closed(_))
        ) {
            self.poisoned = true;
        }
        result
    }

    fn exchange(&mut self, request: &Request<'_>, op: &str) -> Result<Response> {
        let mut line = serde_json::to_string(request)?;
        line.push('\n');
        debug!("bridge <- {op}");

        let stdin = self.stdin.as_mut().ok_or_else(|| Error::Closed(op.to_string()))?;
        let sent = stdin
            .write_all(line.as_bytes())
            .and_then(|_| stdin.flush());
        if let Err(e) = sent {
            return Err(match e.kind() {
                std::io::ErrorKind::BrokenPipe => Error::Closed(op.to_string()),
                _ => Error::Io(e),
            });
        }

        let mut reply = String::new();
        loop {
            reply.clear();
            if self.stdout.read_line(&mut reply)? == 0 {
                return Err(Error::Closed(op.to_string()));
            }
            match Response::parse(&reply) {
                Some(response) => {
                    debug!("bridge -> {op} ({} bytes)", reply.len());
                    return Ok(response);
                }
                None => debug!("bridge stdout: {}", reply.trim_end()),
            }
        }
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        // closing stdin tells the helper to exit
        drop(self.stdin.take());
        let _ = self.child.wait();
    }
}

impl GeneChecker for Bridge {
    type Error = Error;

    fn check_genes(&mut self, targets: &[ModelingTarget]) -> Result<Vec<String>> {
        self.call(&Request::CheckGenes { targets })
    }
}

impl MhcLookup for Bridge {
    type Error = Error;

    fn mhc_class_1_alseq(&mut self, allele: &str) -> Result<String> {
        self.call(&Request::MhcClass1Alseq { allele })
    }
}

impl DockingSetup for Bridge {
    type Error = Error;

    fn setup_for_alphafold(
        &mut self,
        targets: &Table,
        output_dir: &str,
        params: &SetupParams,
    ) -> Result<()> {
        let _: serde_json::Value = self.call(&Request::SetupForAlphafold {
            targets,
            output_dir,
            params,
        })?;
        Ok(())
    }
}

impl TemplateFeaturizer for Bridge {
    type Error = Error;

    fn create_single_template_features(
        &mut self,
        request: &TemplateFeatureRequest,
    ) -> Result<TemplateFeatures> {
        self.call(&Request::CreateSingleTemplateFeatures(request))
    }

    fn compile_template_features(
        &mut self,
        features: Vec<TemplateFeatures>,
    ) -> Result<TemplateFeatures> {
        self.call(&Request::CompileTemplateFeatures { features })
    }
}

impl StructurePredictor for Bridge {
    type Error = Error;

    fn load_model_runners(&mut self, config: &ModelRunnerConfig) -> Result<RunnerInfo> {
        self.call(&Request::LoadModelRunners(config))
    }

    fn run_alphafold_prediction(
        &mut self,
        request: &PredictionRequest,
    ) -> Result<Vec<(String, ModelMetrics)>> {
        let op = "run_alphafold_prediction";
        let results: Vec<ModelResult> = self.call(&Request::RunAlphafoldPrediction(request))?;
        results
            .into_iter()
            .map(|r| {
                let name = r.model_name.clone();
                r.into_metrics().map(|m| (name, m)).map_err(|reason| Error::Protocol {
                    op: op.to_string(),
                    reason,
                })
            })
            .collect()
    }
}
