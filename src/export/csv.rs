//! Flattened CSV output.
//!
//! Output is UTF-8 with BOM for Excel compatibility.

use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Result, TmError};
use crate::model::record::EmailRecord;
use crate::stats::domains::{DomainCount, DomainShare};
use crate::stats::temporal::BucketRow;

/// A type that flattens to one CSV row.
pub trait CsvRow {
    /// Column names, in field order.
    fn header() -> &'static [&'static str];

    /// Field values, one per header column.
    fn fields(&self) -> Vec<String>;
}

impl CsvRow for EmailRecord {
    fn header() -> &'static [&'static str] {
        &[
            "message_id",
            "date",
            "from",
            "from_domain",
            "to",
            "subject",
            "folder",
            "body",
            "has_body",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.message_id.clone(),
            self.date.clone(),
            self.from.clone(),
            self.from_domain.clone(),
            self.to.clone(),
            self.subject.clone(),
            self.folder.clone(),
            self.body.clone(),
            self.has_body.to_string(),
        ]
    }
}

impl CsvRow for BucketRow {
    fn header() -> &'static [&'static str] {
        &["bucket", "total_emails", "emails_with_body", "body_percentage"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.bucket.clone(),
            self.total_emails.to_string(),
            self.emails_with_body.to_string(),
            format!("{:.2}", self.body_percentage),
        ]
    }
}

impl CsvRow for DomainCount {
    fn header() -> &'static [&'static str] {
        &["domain", "count"]
    }

    fn fields(&self) -> Vec<String> {
        vec![self.domain.clone(), self.count.to_string()]
    }
}

impl CsvRow for DomainShare {
    fn header() -> &'static [&'static str] {
        &["domain", "count", "percentage", "cumulative_percentage"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.domain.clone(),
            self.count.to_string(),
            format!("{:.2}", self.percentage),
            format!("{:.4}", self.cumulative_percentage),
        ]
    }
}

/// Write rows to a CSV file using `separator` between fields.
///
/// An empty row set produces an empty file.
pub fn write_csv<T: CsvRow>(rows: &[T], output_path: &Path, separator: char) -> Result<()> {
    let file = std::fs::File::create(output_path).map_err(|e| TmError::io(output_path, e))?;
    let mut out = BufWriter::new(file);
    write_rows(&mut out, rows, separator).map_err(|e| TmError::io(output_path, e))?;
    out.flush().map_err(|e| TmError::io(output_path, e))
}

fn write_rows<W: Write, T: CsvRow>(out: &mut W, rows: &[T], separator: char) -> std::io::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    // UTF-8 BOM for Excel
    out.write_all(&[0xEF, 0xBB, 0xBF])?;

    let sep = separator.to_string();
    writeln!(out, "{}", T::header().join(&sep))?;
    for row in rows {
        let line = row
            .fields()
            .iter()
            .map(|f| csv_escape(f, separator))
            .collect::<Vec<_>>()
            .join(&sep);
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Escape a value for CSV (RFC 4180).
///
/// Wraps in double quotes if the value contains the separator, quotes, or newlines.
fn csv_escape(value: &str, separator: char) -> String {
    if value.contains(separator) || value.contains('"') || value.contains('\n') || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record::RawMessage;

    #[test]
    fn test_csv_escape_simple() {
        assert_eq!(csv_escape("hello", ','), "hello");
    }

    #[test]
    fn test_csv_escape_separator() {
        assert_eq!(csv_escape("hello, world", ','), "\"hello, world\"");
        assert_eq!(csv_escape("a;b", ';'), "\"a;b\"");
        assert_eq!(csv_escape("a;b", ','), "a;b");
    }

    #[test]
    fn test_csv_escape_quotes() {
        assert_eq!(csv_escape("say \"hi\"", ','), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_csv_escape_newline() {
        assert_eq!(csv_escape("line1\nline2", ','), "\"line1\nline2\"");
    }

    #[test]
    fn test_record_rows() {
        let rec = EmailRecord::from_raw(RawMessage {
            from: Some("Shop, Inc <news@shop.edu>".into()),
            subject: Some("Sale".into()),
            ..Default::default()
        });
        let mut buf = Vec::new();
        write_rows(&mut buf, &[rec], ',').unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.trim_start_matches('\u{feff}').lines();
        assert_eq!(
            lines.next().unwrap(),
            "message_id,date,from,from_domain,to,subject,folder,body,has_body"
        );
        assert_eq!(
            lines.next().unwrap(),
            ",,\"Shop, Inc <news@shop.edu>\",shop.edu,,Sale,,,false"
        );
    }

    #[test]
    fn test_empty_rows_write_nothing() {
        let mut buf = Vec::new();
        write_rows::<_, EmailRecord>(&mut buf, &[], ',').unwrap();
        assert!(buf.is_empty());
    }
}
