//! tcrdock-test-data
//!
//! Targets and templates-alignment tables embedded in the crate for use in testing.
//!
//! The test files are represented as `TestFile` objects which package the raw bytes
//! and create temporary files for programs to operate on.
use std::fs;
use tempfile::{Builder, NamedTempFile};

#[derive(Debug)]
/// Test File
///
/// Example usage:
///
/// ```ignore
/// // returns (filepath, _tempfile_handle).
/// // _handle ensures the tempfile remains in scope
/// use tcrdock_test_data::TestFile;
/// let (targets, _temp) = TestFile::targets_single().create_temp().unwrap();
/// ```
pub struct TestFile {
    filebinary: &'static [u8],
    suffix: &'static str,
}

impl TestFile {
    /// One human class-I target (influenza M1 GILGFVFTL on A*02:01).
    pub fn targets_single() -> Self {
        Self {
            filebinary: include_bytes!("../data/targets/single_target.tsv"),
            suffix: "tsv",
        }
    }
    /// A human and a mouse class-I target.
    pub fn targets_two() -> Self {
        Self {
            filebinary: include_bytes!("../data/targets/two_targets.tsv"),
            suffix: "tsv",
        }
    }
    /// Same as `targets_single` without the `cdr3b` column.
    pub fn targets_missing_cdr3b() -> Self {
        Self {
            filebinary: include_bytes!("../data/targets/missing_cdr3b.tsv"),
            suffix: "tsv",
        }
    }
    /// Two template alignments for a 12-residue query.
    pub fn alignments_two_chain() -> Self {
        Self {
            filebinary: include_bytes!("../data/alignments/two_chain_alignments.tsv"),
            suffix: "tsv",
        }
    }

    pub fn create_temp(&self) -> std::io::Result<(String, NamedTempFile)> {
        let temp = Builder::new()
            .suffix(&format!(".{}", self.suffix))
            .tempfile()?;

        fs::write(&temp, self.filebinary)?;
        let path = temp.path().to_string_lossy().into_owned();

        Ok((path, temp))
    }

    /// Write the file into `dir` under `name`, for tests that need stable paths.
    pub fn write_to(&self, dir: &std::path::Path, name: &str) -> std::io::Result<String> {
        let path = dir.join(name);
        fs::write(&path, self.filebinary)?;
        Ok(path.to_string_lossy().into_owned())
    }
}
