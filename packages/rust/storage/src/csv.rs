//! Minimal delimited-text writer (CSV/TSV).

use std::io::{self, Write};

use topicscrape_shared::{RECORD_COLUMNS, TopicRecordSet};

fn needs_quotes(field: &str, sep: char) -> bool {
    field.contains(sep) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single row to any writer, quoting fields where required.
pub fn write_row<W, S>(mut w: W, row: &[S], sep: char) -> io::Result<()>
where
    W: Write,
    S: AsRef<str>,
{
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, "{sep}")?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell, sep) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}

/// Write a topic's records: header row, then one row per record in order.
pub fn write_records<W: Write>(mut w: W, set: &TopicRecordSet, sep: char) -> io::Result<()> {
    write_row(&mut w, &RECORD_COLUMNS, sep)?;
    for record in &set.records {
        write_row(&mut w, &record.to_row(), sep)?;
    }
    w.flush()
}

/// Serialize a topic's records into a string.
pub fn to_delimited(set: &TopicRecordSet, sep: char) -> io::Result<String> {
    let mut out = Vec::new();
    write_records(&mut out, set, sep)?;
    String::from_utf8(out).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
