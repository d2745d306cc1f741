//! Build frames from CSV text.
//!
//! The first record is the header. Fields are trimmed; an empty field becomes
//! the blank marker, a field that parses completely as a finite number becomes
//! a number, and anything else stays text.

use std::io::Read;

use error_stack::{Report, ResultExt};

use crate::frame::{Cell, Frame};
use crate::{Result, VizError};

pub fn parse_cell(field: &str) -> Cell {
    let field = field.trim();
    if field.is_empty() {
        return Cell::blank();
    }
    match field.parse::<f64>() {
        Ok(n) if n.is_finite() => Cell::Number(n),
        _ => Cell::Text(field.to_string()),
    }
}

pub fn frame_from_reader<R: Read>(reader: R) -> Result<Frame> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let header: Vec<String> = rdr
        .headers()
        .change_context(VizError::Csv)
        .attach("reading csv header")?
        .iter()
        .map(str::to_string)
        .collect();

    if header.iter().all(String::is_empty) {
        return Err(Report::new(VizError::Csv).attach("csv input has no header"));
    }

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| {
            Report::new(e)
                .change_context(VizError::Csv)
                .attach(format!("reading csv record {}", i + 1))
        })?;
        rows.push(record.iter().map(parse_cell).collect());
    }

    Frame::new(header, rows)
        .normalized()
        .change_context(VizError::Csv)
}

pub fn frame_from_csv(text: &str) -> Result<Frame> {
    frame_from_reader(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cells() {
        assert_eq!(parse_cell(" 12 "), Cell::Number(12.0));
        assert_eq!(parse_cell("-0.5"), Cell::Number(-0.5));
        assert_eq!(parse_cell("1e3"), Cell::Number(1000.0));
        assert!(parse_cell("").is_blank());
        assert!(parse_cell("   ").is_blank());
        assert_eq!(parse_cell("12abc"), Cell::from("12abc"));
        assert_eq!(parse_cell("NaN"), Cell::from("NaN"));
    }

    #[test]
    fn reads_header_and_rows() {
        let frame = frame_from_csv("position.x, size ,labels\n1,5,a\n2,,b\n").unwrap();
        assert_eq!(frame.header, vec!["position.x", "size", "labels"]);
        assert_eq!(frame.row_count(), 2);
        assert!(frame.rows[1][1].is_blank());
        assert_eq!(frame.rows[1][2], Cell::from("b"));
    }

    #[test]
    fn quoted_fields_keep_commas() {
        let frame = frame_from_csv("labels,size\n\"a, b\",3\n").unwrap();
        assert_eq!(frame.rows[0][0], Cell::from("a, b"));
    }

    #[test]
    fn rejects_ragged_records() {
        let err = frame_from_csv("a,b\n1,2\n3\n").unwrap_err();
        assert_eq!(*err.current_context(), VizError::Csv);
    }

    #[test]
    fn rejects_empty_input() {
        let err = frame_from_csv("").unwrap_err();
        assert_eq!(*err.current_context(), VizError::Csv);
    }
}
