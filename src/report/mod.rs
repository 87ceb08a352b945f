//! Tab-separated statistics output
//!
//! The sink is opened once per invocation (truncating a named file) and
//! shared by every runner; each line is flushed as soon as it is written.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::models::record::BenchmarkRecord;
use crate::Result;

pub struct StatWriter {
    sink: Box<dyn Write + Send>,
}

impl StatWriter {
    /// Write to `outfile`, or standard output when there is none
    pub fn open(outfile: Option<&Path>) -> Result<Self> {
        match outfile {
            Some(path) => Self::create(path),
            None => Ok(Self::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Self::from_writer(io::stdout())
    }

    /// Create or truncate `path`
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }

    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Box::new(writer),
        }
    }

    pub fn print_header<S: AsRef<str>>(&mut self, columns: &[S]) -> Result<()> {
        self.print_line(columns)
    }

    pub fn print_fields<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<()> {
        self.print_line(fields)
    }

    pub fn print_record(&mut self, record: &BenchmarkRecord) -> Result<()> {
        self.print_line(&record.fields())
    }

    /// An empty field list still produces a (blank) line
    pub fn print_footer<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<()> {
        self.print_line(fields)
    }

    fn print_line<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<()> {
        let line = fields
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join("\t");
        writeln!(self.sink, "{}", line)?;
        self.sink.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{OpKind, RECORD_COLUMNS};
    use std::fs;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_tab_separated_lines() {
        let buf = SharedBuf::default();
        let mut writer = StatWriter::from_writer(buf.clone());

        writer.print_header(&RECORD_COLUMNS).unwrap();
        let record = BenchmarkRecord::new("a.txt", OpKind::Read, 42, Duration::from_millis(2));
        writer.print_record(&record).unwrap();
        writer.print_footer::<&str>(&[]).unwrap();

        assert_eq!(
            buf.contents(),
            "file\top\tsize\trepeat_count\ttime (millisecs)\na.txt\tread\t42\t1\t2.000\n\n"
        );
    }

    #[test]
    fn test_outfile_is_truncated_and_flushed_per_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats.tsv");
        fs::write(&path, "stale content from an earlier run\n").unwrap();

        let mut writer = StatWriter::open(Some(&path)).unwrap();
        writer.print_fields(&["x", "y"]).unwrap();
        // visible before the writer is dropped
        assert_eq!(fs::read_to_string(&path).unwrap(), "x\ty\n");
    }

    #[test]
    fn test_open_fails_for_missing_directory() {
        let dir = TempDir::new().unwrap();
        assert!(StatWriter::open(Some(&dir.path().join("no/such/dir/out.tsv"))).is_err());
    }
}
