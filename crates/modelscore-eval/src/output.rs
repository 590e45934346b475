use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use modelscore_core::Table;

/// Write a table as CSV in field order; missing values are empty cells.
/// Returns the number of bytes written.
pub fn write_table_csv(path: &Path, table: &Table) -> Result<u64, csv::Error> {
    let writer = BufWriter::new(File::create(path).map_err(csv::Error::from)?);
    write_table(CountingWriter::new(writer), table)
}

/// Render a table as an in-memory CSV string.
pub fn table_to_csv_string(table: &Table) -> Result<String, csv::Error> {
    let mut buffer = Vec::new();
    write_table(CountingWriter::new(&mut buffer), table)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn write_table<W: Write>(counting: CountingWriter<W>, table: &Table) -> Result<u64, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(counting);

    writer.write_record(table.column_names())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|value| value.render()))?;
    }

    writer.flush()?;
    let counting = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(counting.bytes_written())
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
