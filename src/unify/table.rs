//! Raw Tables
//!
//! Row-oriented string tables as handed over by a data source. Cells stay
//! untyped until the normalizer coerces them.

use super::error::{UnifyError, UnifyResult};
use super::normalize::parse_date;
use std::io::Read;
use std::path::Path;

/// A header row plus string cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Borrowed view of one table row
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    headers: &'a [String],
    cells: &'a [String],
}

impl<'a> RawRow<'a> {
    /// Cell for a named column; `None` when the column is missing
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.headers.iter().position(|h| h == column)?;
        Some(self.cells.get(idx).map(String::as_str).unwrap_or(""))
    }
}

impl RawTable {
    /// Create an empty table with the given header row
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Builder method: append a row
    pub fn row<S: Into<String>>(mut self, cells: impl IntoIterator<Item = S>) -> Self {
        self.push_row(cells);
        self
    }

    pub fn push_row<S: Into<String>>(&mut self, cells: impl IntoIterator<Item = S>) {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    /// Parse CSV text with a header row
    pub fn from_csv_str(data: &str) -> UnifyResult<Self> {
        Self::from_reader(data.as_bytes())
    }

    /// Read a CSV file with a header row
    pub fn from_csv_path(path: &Path) -> UnifyResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    fn from_reader<R: Read>(reader: R) -> UnifyResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.trim().to_string()).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = RawRow<'_>> {
        self.rows.iter().map(move |cells| RawRow {
            headers: &self.headers,
            cells,
        })
    }

    /// Project onto the listed columns that exist, in the listed order
    pub fn select(&self, columns: &[&str]) -> RawTable {
        let indices: Vec<usize> = columns
            .iter()
            .filter_map(|c| self.headers.iter().position(|h| h == c))
            .collect();

        RawTable {
            headers: indices.iter().map(|&i| self.headers[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| {
                    indices
                        .iter()
                        .map(|&i| row.get(i).cloned().unwrap_or_default())
                        .collect()
                })
                .collect(),
        }
    }

    /// Blank a column on rows 0, n, 2n, ... to simulate gaps in a source
    pub fn blank_every_nth(&mut self, column: &str, n: usize) {
        let Some(idx) = self.headers.iter().position(|h| h == column) else {
            return;
        };
        if n == 0 {
            return;
        }
        for row in self.rows.iter_mut().step_by(n) {
            if let Some(cell) = row.get_mut(idx) {
                cell.clear();
            }
        }
    }

    /// Stable sort by the `date` column. Unparsable dates are malformed input.
    pub fn sorted_by_date(&self) -> UnifyResult<RawTable> {
        let idx = self
            .headers
            .iter()
            .position(|h| h == "date")
            .ok_or_else(|| UnifyError::malformed(0, "missing 'date' column"))?;

        let mut keyed = Vec::with_capacity(self.rows.len());
        for (row_num, row) in self.rows.iter().enumerate() {
            let raw = row.get(idx).map(String::as_str).unwrap_or("");
            let date = parse_date(raw).ok_or_else(|| {
                UnifyError::malformed(row_num, format!("could not parse date '{}'", raw))
            })?;
            keyed.push((date, row.clone()));
        }
        keyed.sort_by_key(|(date, _)| *date);

        Ok(RawTable {
            headers: self.headers.clone(),
            rows: keyed.into_iter().map(|(_, row)| row).collect(),
        })
    }

    /// Keep only the last `n` rows
    pub fn tail(&self, n: usize) -> RawTable {
        let start = self.rows.len().saturating_sub(n);
        RawTable {
            headers: self.headers.clone(),
            rows: self.rows[start..].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_csv_str() {
        let table = RawTable::from_csv_str(
            "date,sleep_hours,steps
2024-01-15,7.5,8000
2024-01-16,,9100",
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.headers(), &["date", "sleep_hours", "steps"]);
        let second = table.rows().nth(1).unwrap();
        assert_eq!(second.get("sleep_hours"), Some(""));
        assert_eq!(second.get("steps"), Some("9100"));
        assert_eq!(second.get("calories"), None);
    }

    #[test]
    fn test_short_rows_read_as_blank() {
        let table = RawTable::from_csv_str("date,steps\n2024-01-15").unwrap();
        let row = table.rows().next().unwrap();
        assert_eq!(row.get("steps"), Some(""));
    }

    #[test]
    fn test_select_skips_missing_columns() {
        let table = RawTable::new(["date", "steps", "mood"]).row(["2024-01-15", "8000", "4"]);
        let projected = table.select(&["date", "sleep_hours", "steps"]);
        assert_eq!(projected.headers(), &["date", "steps"]);
        assert_eq!(projected.rows().next().unwrap().get("steps"), Some("8000"));
    }

    #[test]
    fn test_blank_every_nth() {
        let mut table = RawTable::new(["date", "steps"]);
        for day in 1..=7 {
            table.push_row([format!("2024-01-{:02}", day), "100".to_string()]);
        }
        table.blank_every_nth("steps", 3);

        let steps: Vec<&str> = table.rows().map(|r| r.get("steps").unwrap()).collect();
        assert_eq!(steps, vec!["", "100", "100", "", "100", "100", ""]);
    }

    #[test]
    fn test_sorted_by_date_and_tail() {
        let table = RawTable::new(["date"])
            .row(["2024-01-03"])
            .row(["2024-01-01"])
            .row(["2024-01-02"]);

        let sorted = table.sorted_by_date().unwrap().tail(2);
        let dates: Vec<&str> = sorted.rows().map(|r| r.get("date").unwrap()).collect();
        assert_eq!(dates, vec!["2024-01-02", "2024-01-03"]);
    }

    #[test]
    fn test_sorted_by_date_rejects_bad_date() {
        let table = RawTable::new(["date"]).row(["2024-01-03"]).row(["soon"]);
        let err = table.sorted_by_date().unwrap_err();
        assert!(matches!(err, UnifyError::MalformedInput { row: 1, .. }));
    }
}
