//! Typed records read out of [`Table`] rows.
//!
//! - [`ModelingTarget`]: one row of the `setup` targets file.
//! - [`PredictionTarget`]: one row of the `run` targets file.
//! - [`TemplateAlignment`]: one row of a per-target templates alignment file.

use crate::error::{Error, Result};
use crate::table::{Row, Table};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Columns the `setup` targets file must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display, AsRefStr, IntoStaticStr)]
pub enum RequiredColumn {
    #[strum(serialize = "organism")]
    Organism,
    #[strum(serialize = "mhc_class")]
    MhcClass,
    #[strum(serialize = "mhc")]
    Mhc,
    #[strum(serialize = "peptide")]
    Peptide,
    #[strum(serialize = "va")]
    Va,
    #[strum(serialize = "ja")]
    Ja,
    #[strum(serialize = "cdr3a")]
    Cdr3a,
    #[strum(serialize = "vb")]
    Vb,
    #[strum(serialize = "jb")]
    Jb,
    #[strum(serialize = "cdr3b")]
    Cdr3b,
}

impl RequiredColumn {
    pub fn names() -> Vec<&'static str> {
        Self::iter().map(<&'static str>::from).collect()
    }
}

/// Columns every templates alignment file must carry.
pub const ALIGNMENT_COLUMNS: [&str; 5] = [
    "template_pdbfile",
    "target_to_template_alignstring",
    "identities",
    "target_len",
    "template_len",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Organism {
    Human,
    Mouse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum MhcClass {
    One,
    Two,
}

impl From<MhcClass> for u8 {
    fn from(value: MhcClass) -> Self {
        match value {
            MhcClass::One => 1,
            MhcClass::Two => 2,
        }
    }
}

impl TryFrom<u8> for MhcClass {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(MhcClass::One),
            2 => Ok(MhcClass::Two),
            other => Err(format!("mhc_class must be 1 or 2, got {other}")),
        }
    }
}

impl std::str::FromStr for MhcClass {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let n: u8 = s.parse().map_err(|_| format!("mhc_class must be 1 or 2, got {s:?}"))?;
        MhcClass::try_from(n)
    }
}

/// One row of the `setup` targets file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelingTarget {
    pub organism: Organism,
    pub mhc_class: MhcClass,
    pub mhc: String,
    pub peptide: String,
    pub va: String,
    pub ja: String,
    pub cdr3a: String,
    pub vb: String,
    pub jb: String,
    pub cdr3b: String,
    /// Every non-required column, e.g. `targetid` or an exclude-pdbids column.
    pub extra: BTreeMap<String, String>,
}

impl ModelingTarget {
    pub fn from_row(row: &Row<'_>) -> Result<Self> {
        let required: HashSet<&str> = RequiredColumn::names().into_iter().collect();
        let extra = row
            .to_pairs()
            .into_iter()
            .filter(|(c, _)| !required.contains(c.as_str()))
            .collect();
        Ok(Self {
            organism: row.parse(RequiredColumn::Organism.as_ref())?,
            mhc_class: row.parse(RequiredColumn::MhcClass.as_ref())?,
            mhc: row.require(RequiredColumn::Mhc.as_ref())?.to_string(),
            peptide: row.require(RequiredColumn::Peptide.as_ref())?.to_string(),
            va: row.require(RequiredColumn::Va.as_ref())?.to_string(),
            ja: row.require(RequiredColumn::Ja.as_ref())?.to_string(),
            cdr3a: row.require(RequiredColumn::Cdr3a.as_ref())?.to_string(),
            vb: row.require(RequiredColumn::Vb.as_ref())?.to_string(),
            jb: row.require(RequiredColumn::Jb.as_ref())?.to_string(),
            cdr3b: row.require(RequiredColumn::Cdr3b.as_ref())?.to_string(),
            extra,
        })
    }

    /// Checks the required columns first so that all of them are reported together.
    pub fn from_table(table: &Table) -> Result<Vec<Self>> {
        let missing = table.missing_columns(&RequiredColumn::names());
        if !missing.is_empty() {
            return Err(Error::MissingColumns(missing));
        }
        table.rows().map(|r| Self::from_row(&r)).collect()
    }
}

/// One row of the `run` targets file, normally written by `setup`.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionTarget {
    pub index: usize,
    pub target_chainseq: String,
    pub templates_alignfile: PathBuf,
    pub outfile_prefix: Option<String>,
    pub targetid: Option<String>,
    /// The whole input row, in column order, carried into the output table.
    pub row: Vec<(String, String)>,
}

impl PredictionTarget {
    pub const CHAINSEQ: &'static str = "target_chainseq";
    pub const ALIGNFILE: &'static str = "templates_alignfile";

    pub fn from_row(row: &Row<'_>) -> Result<Self> {
        Ok(Self {
            index: row.index(),
            target_chainseq: row.require(Self::CHAINSEQ)?.to_string(),
            templates_alignfile: PathBuf::from(row.require(Self::ALIGNFILE)?),
            outfile_prefix: row.get("outfile_prefix").map(String::from),
            targetid: row.get("targetid").map(String::from),
            row: row.to_pairs(),
        })
    }

    pub fn from_table(table: &Table) -> Result<Vec<Self>> {
        let missing = table.missing_columns(&[Self::CHAINSEQ, Self::ALIGNFILE]);
        if !missing.is_empty() {
            return Err(Error::MissingColumns(missing));
        }
        table.rows().map(|r| Self::from_row(&r)).collect()
    }

    /// Chain-concatenated sequence with the `/` separators removed.
    pub fn query_sequence(&self) -> String {
        self.target_chainseq.replace('/', "")
    }

    pub fn num_res(&self) -> usize {
        self.target_chainseq.chars().filter(|&c| c != '/').count()
    }
}

/// One row of a templates alignment file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateAlignment {
    pub template_pdbfile: PathBuf,
    /// 0-indexed `query -> template` residue correspondences.
    pub target_to_template_alignment: BTreeMap<usize, usize>,
    pub identities: usize,
    pub target_len: usize,
    pub template_len: usize,
}

impl TemplateAlignment {
    pub fn from_row(row: &Row<'_>) -> Result<Self> {
        let alignstring = row.require("target_to_template_alignstring")?;
        Ok(Self {
            template_pdbfile: PathBuf::from(row.require("template_pdbfile")?),
            target_to_template_alignment: parse_alignstring(alignstring)?,
            identities: row.parse("identities")?,
            target_len: row.parse("target_len")?,
            template_len: row.parse("template_len")?,
        })
    }

    pub fn from_table(table: &Table) -> Result<Vec<Self>> {
        let missing = table.missing_columns(&ALIGNMENT_COLUMNS);
        if !missing.is_empty() {
            return Err(Error::MissingColumns(missing));
        }
        table.rows().map(|r| Self::from_row(&r)).collect()
    }

    /// `target_len` must match the ungapped query length exactly.
    pub fn check_target_len(&self, query_len: usize) -> Result<()> {
        if self.target_len != query_len {
            return Err(Error::TargetLengthMismatch {
                template: self.template_pdbfile.display().to_string(),
                declared: self.target_len,
                actual: query_len,
            });
        }
        Ok(())
    }
}

/// Parse `"0:3;1:4;..."` into a `query -> template` map.
pub fn parse_alignstring(alignstring: &str) -> Result<BTreeMap<usize, usize>> {
    alignstring
        .split(';')
        .map(|pair| {
            let bad = || Error::InvalidAlignPair(pair.to_string());
            let (q, t) = pair.split_once(':').ok_or_else(bad)?;
            let q = q.trim().parse::<usize>().map_err(|_| bad())?;
            let t = t.trim().parse::<usize>().map_err(|_| bad())?;
            Ok((q, t))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table::from_rows(
            columns.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|v| Some(v.to_string())).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_required_column_names() {
        assert_eq!(
            RequiredColumn::names(),
            "organism mhc_class mhc peptide va ja cdr3a vb jb cdr3b"
                .split(' ')
                .collect::<Vec<_>>()
        );
        assert_eq!(RequiredColumn::Cdr3b.to_string(), "cdr3b");
    }

    #[test]
    fn test_missing_cdr3b_is_reported_alone() {
        let t = table(
            &["organism", "mhc_class", "mhc", "peptide", "va", "ja", "cdr3a", "vb", "jb"],
            &[&["human", "1", "A*02:01", "GILGFVFTL", "TRAV27*01", "TRAJ42*01", "CAGGGSQGNLIF", "TRBV19*01", "TRBJ2-7*01"]],
        );
        match ModelingTarget::from_table(&t) {
            Err(Error::MissingColumns(missing)) => assert_eq!(missing, vec!["cdr3b"]),
            other => panic!("expected missing columns, got {other:?}"),
        }
    }

    #[test]
    fn test_modeling_target_from_row() {
        let t = table(
            &["targetid", "organism", "mhc_class", "mhc", "peptide", "va", "ja", "cdr3a", "vb", "jb", "cdr3b"],
            &[&["flu", "human", "1", "A*02:01", "GILGFVFTL", "TRAV27*01", "TRAJ42*01", "CAGGGSQGNLIF", "TRBV19*01", "TRBJ2-7*01", "CASSIRSSYEQYF"]],
        );
        let targets = ModelingTarget::from_table(&t).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].organism, Organism::Human);
        assert_eq!(targets[0].mhc_class, MhcClass::One);
        assert_eq!(targets[0].extra.get("targetid").map(String::as_str), Some("flu"));
    }

    #[test]
    fn test_bad_mhc_class() {
        let t = table(
            &["organism", "mhc_class", "mhc", "peptide", "va", "ja", "cdr3a", "vb", "jb", "cdr3b"],
            &[&["mouse", "3", "H2Db", "ASNENMETM", "TRAV", "TRAJ", "CAF", "TRBV", "TRBJ", "CASF"]],
        );
        assert!(matches!(
            ModelingTarget::from_table(&t),
            Err(Error::InvalidValue { ref column, .. }) if column == "mhc_class"
        ));
    }

    #[test]
    fn test_parse_alignstring() {
        let aln = parse_alignstring("0:3;1:4").unwrap();
        assert_eq!(aln.into_iter().collect::<Vec<_>>(), vec![(0, 3), (1, 4)]);
        assert!(parse_alignstring("0:3;1-4").is_err());
        assert!(parse_alignstring("0:x").is_err());
    }

    #[test]
    fn test_template_alignment_target_len() {
        let t = table(
            &ALIGNMENT_COLUMNS,
            &[&["/data/t1.pdb", "0:0;1:1;2:2", "3", "12", "200"]],
        );
        let alns = TemplateAlignment::from_table(&t).unwrap();
        assert_eq!(alns[0].identities, 3);
        assert!(alns[0].check_target_len(12).is_ok());
        assert!(matches!(
            alns[0].check_target_len(11),
            Err(Error::TargetLengthMismatch { declared: 12, actual: 11, .. })
        ));
    }

    #[test]
    fn test_prediction_target() {
        let t = table(
            &["targetid", "target_chainseq", "templates_alignfile"],
            &[&["t1", "ABCDE/FGHIJKL", "aln.tsv"]],
        );
        let targets = PredictionTarget::from_table(&t).unwrap();
        assert_eq!(targets[0].query_sequence(), "ABCDEFGHIJKL");
        assert_eq!(targets[0].num_res(), 12);
        assert_eq!(targets[0].targetid.as_deref(), Some("t1"));
        assert_eq!(targets[0].outfile_prefix, None);
        assert_eq!(targets[0].row.len(), 3);
    }
}
