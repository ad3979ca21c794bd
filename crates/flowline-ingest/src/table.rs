//! In-memory tabular data read from CSV
//!
//! The Validator works on whole files, so the table is fully materialized:
//! a header row plus string-valued rows in source order.

use flowline_common::{FlowlineError, Result};

/// Column names added by the date-part derivation
pub const DERIVED_COLUMNS: [&str; 3] = ["Month", "Day", "Year"];

/// A parsed CSV table with a header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Parse CSV bytes with a header row
    pub fn from_csv(data: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(data);

        let headers = reader
            .headers()
            .map_err(|e| FlowlineError::Parse(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| FlowlineError::Parse(e.to_string()))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate rows as `(field, value)` pairs in header order
    pub fn records<'a>(
        &'a self,
    ) -> impl Iterator<Item = impl Iterator<Item = (&'a str, &'a str)> + 'a> + 'a {
        self.rows.iter().map(move |row| {
            self.headers
                .iter()
                .zip(row.iter())
                .map(|(h, v)| (h.as_str(), v.as_str()))
        })
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Append `Month`, `Day` and `Year` columns extracted from `date_field`
    ///
    /// Extraction is by fixed character offsets ([0:2], [3:5], [6:10]); the
    /// stored value is expected in a literal `MM?DD?YYYY` layout, not
    /// general date syntax. Values too short yield empty parts.
    pub fn add_date_parts(&mut self, date_field: &str) -> Result<()> {
        let idx = self.column_index(date_field).ok_or_else(|| {
            FlowlineError::Parse(format!("column not found: {date_field}"))
        })?;

        for row in &mut self.rows {
            let date = row.get(idx).cloned().unwrap_or_default();
            row.push(slice_or_empty(&date, 0, 2));
            row.push(slice_or_empty(&date, 3, 5));
            row.push(slice_or_empty(&date, 6, 10));
        }

        self.headers
            .extend(DERIVED_COLUMNS.iter().map(|c| c.to_string()));

        Ok(())
    }

    /// Serialize back to CSV bytes, headers first
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer
            .write_record(&self.headers)
            .map_err(|e| FlowlineError::Parse(e.to_string()))?;

        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| FlowlineError::Parse(e.to_string()))?;
        }

        writer
            .into_inner()
            .map_err(|e| FlowlineError::Parse(e.to_string()))
    }
}

fn slice_or_empty(s: &str, start: usize, end: usize) -> String {
    s.get(start..end).unwrap_or("").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALES_CSV: &str = "\
Date,Amount,Region
01/15/2023,120,north
02/28/2023,75,south
";

    #[test]
    fn test_from_csv_reads_headers_and_rows() {
        let table = Table::from_csv(SALES_CSV.as_bytes()).unwrap();
        assert_eq!(table.headers(), ["Date", "Amount", "Region"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_from_csv_rejects_ragged_rows() {
        let data = "Date,Amount\n01/15/2023,120,extra\n";
        assert!(matches!(
            Table::from_csv(data.as_bytes()),
            Err(FlowlineError::Parse(_))
        ));
    }

    #[test]
    fn test_empty_table_detected() {
        let table = Table::from_csv(b"Date,Amount,Region\n").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_records_pair_fields_with_values() {
        let table = Table::from_csv(SALES_CSV.as_bytes()).unwrap();
        let first: Vec<(&str, &str)> = table.records().next().unwrap().collect();
        assert_eq!(
            first,
            vec![("Date", "01/15/2023"), ("Amount", "120"), ("Region", "north")]
        );
    }

    #[test]
    fn test_add_date_parts_fixed_offsets() {
        let mut table = Table::from_csv(SALES_CSV.as_bytes()).unwrap();
        table.add_date_parts("Date").unwrap();

        assert_eq!(
            table.headers(),
            ["Date", "Amount", "Region", "Month", "Day", "Year"]
        );
        let first: Vec<(&str, &str)> = table.records().next().unwrap().collect();
        assert_eq!(first[3], ("Month", "01"));
        assert_eq!(first[4], ("Day", "15"));
        assert_eq!(first[5], ("Year", "2023"));
    }

    #[test]
    fn test_add_date_parts_short_value_yields_empty_parts() {
        let mut table = Table::from_csv(b"Date\n1/5\n").unwrap();
        table.add_date_parts("Date").unwrap();
        let first: Vec<(&str, &str)> = table.records().next().unwrap().collect();
        assert_eq!(first[1], ("Month", "1/"));
        assert_eq!(first[2], ("Day", ""));
        assert_eq!(first[3], ("Year", ""));
    }

    #[test]
    fn test_add_date_parts_missing_column() {
        let mut table = Table::from_csv(SALES_CSV.as_bytes()).unwrap();
        assert!(table.add_date_parts("Timestamp").is_err());
    }

    #[test]
    fn test_to_csv_round_trips() {
        let table = Table::from_csv(SALES_CSV.as_bytes()).unwrap();
        let bytes = table.to_csv().unwrap();
        let reparsed = Table::from_csv(&bytes).unwrap();
        assert_eq!(reparsed, table);
    }
}
