//! Table
//!
//! Text-valued rows with named columns. Every cell is kept as read from disk;
//! the record types in this crate do their own coercion.

use crate::error::{Error, Result};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from a header and rows. Every row must match the header length.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Result<Self> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Option<String>>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::RaggedRow {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All of `required` that are not columns of this table, in the order given.
    pub fn missing_columns<S: AsRef<str>>(&self, required: &[S]) -> Vec<String> {
        required
            .iter()
            .map(|s| s.as_ref())
            .filter(|name| !self.has_column(name))
            .map(String::from)
            .collect()
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        (index < self.rows.len()).then(|| Row { table: self, index })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.rows.len()).map(move |index| Row { table: self, index })
    }

    /// The values of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let col = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[col].as_deref()).collect())
    }
}

/// A borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Row<'a> {
    /// Position of this row in its table.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cell value. `None` for an absent column or an empty cell.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        let col = self.table.column_index(name)?;
        self.table.rows[self.index][col]
            .as_deref()
            .filter(|v| !v.is_empty())
    }

    pub fn require(&self, name: &str) -> Result<&'a str> {
        self.get(name).ok_or_else(|| Error::MissingValue {
            row: self.index,
            column: name.to_string(),
        })
    }

    /// Parse a required cell, reporting the column and row on failure.
    pub fn parse<T>(&self, name: &str) -> Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.require(name)?;
        value.trim().parse().map_err(|e: T::Err| Error::InvalidValue {
            row: self.index,
            column: name.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
    }

    /// `(column, value)` pairs in column order, empty cells as empty strings.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.table
            .columns
            .iter()
            .zip(&self.table.rows[self.index])
            .map(|(c, v)| (c.clone(), v.clone().unwrap_or_default()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Table {
        Table::from_rows(
            cols(&["targetid", "peptide", "mhc_class"]),
            vec![
                vec![Some("t1".into()), Some("GILGFVFTL".into()), Some("1".into())],
                vec![Some("t2".into()), None, Some("x".into())],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_missing_columns_reports_all_in_order() {
        let table = sample();
        let missing = table.missing_columns(&["organism", "peptide", "cdr3b"]);
        assert_eq!(missing, vec!["organism", "cdr3b"]);
    }

    #[test]
    fn test_row_access() {
        let table = sample();
        let row = table.row(1).unwrap();
        assert_eq!(row.get("targetid"), Some("t2"));
        assert_eq!(row.get("peptide"), None);
        assert_eq!(row.get("nope"), None);
        assert!(matches!(
            row.require("peptide"),
            Err(Error::MissingValue { row: 1, .. })
        ));
        assert!(matches!(
            row.parse::<u8>("mhc_class"),
            Err(Error::InvalidValue { row: 1, .. })
        ));
        assert_eq!(table.row(0).unwrap().parse::<u8>("mhc_class").unwrap(), 1);
        assert!(table.row(2).is_none());
    }

    #[test]
    fn test_ragged_row_rejected() {
        let mut table = Table::new(cols(&["a", "b"]));
        assert!(table.push_row(vec![Some("1".into())]).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_to_pairs_keeps_column_order() {
        let table = sample();
        let pairs = table.row(1).unwrap().to_pairs();
        assert_eq!(
            pairs,
            vec![
                ("targetid".to_string(), "t2".to_string()),
                ("peptide".to_string(), String::new()),
                ("mhc_class".to_string(), "x".to_string()),
            ]
        );
    }
}
