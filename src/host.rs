//! Collaborators the engine talks to: where lines come from, where output
//! goes, and how failures are announced.

use std::{
    cell::RefCell,
    fs,
    io::{self, BufRead, Read, Write},
    path::PathBuf,
};

use tracing::warn;

/// Lines of the active document, terminators stripped.
pub trait LineSource {
    fn get_lines(&self) -> io::Result<Vec<String>>;
}

/// Receives the formatted output of a successful run.
pub trait OutputSink {
    /// Create a fresh output buffer and write `lines` into it.
    fn append_lines(&mut self, lines: &[String]) -> io::Result<()>;
}

/// Modal notification, shown on failures.
pub trait Notifier {
    fn notify(&self, title: &str, message: &str);
}

/// Fixed in-memory lines.
#[derive(Debug, Clone, Default)]
pub struct StaticLines(pub Vec<String>);

impl StaticLines {
    pub fn new<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        StaticLines(lines.into_iter().map(Into::into).collect())
    }
}

impl LineSource for StaticLines {
    fn get_lines(&self) -> io::Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

/// A file re-read on every request, so edits show up between runs.
#[derive(Debug, Clone)]
pub struct FileLines {
    path: PathBuf,
}

impl FileLines {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileLines { path: path.into() }
    }
}

impl LineSource for FileLines {
    fn get_lines(&self) -> io::Result<Vec<String>> {
        let text = fs::read_to_string(&self.path).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "cannot read input file");
            io::Error::new(e.kind(), format!("{}: {}", self.path.display(), e))
        })?;
        Ok(text.lines().map(str::to_string).collect())
    }
}

/// Lines read once, up front, from any reader such as stdin.
#[derive(Debug, Clone, Default)]
pub struct ReaderLines {
    lines: Vec<String>,
}

impl ReaderLines {
    pub fn read_from(reader: impl Read) -> io::Result<Self> {
        let lines = io::BufReader::new(reader)
            .lines()
            .map(|line| line.map(|l| l.trim_end_matches('\r').to_string()))
            .collect::<io::Result<Vec<_>>>()?;
        Ok(ReaderLines { lines })
    }
}

impl LineSource for ReaderLines {
    fn get_lines(&self) -> io::Result<Vec<String>> {
        Ok(self.lines.clone())
    }
}

/// Keeps every buffer it was asked to create.
#[derive(Debug, Clone, Default)]
pub struct BufferSink {
    pub buffers: Vec<Vec<String>>,
}

impl BufferSink {
    pub fn last(&self) -> Option<&[String]> {
        self.buffers.last().map(Vec::as_slice)
    }
}

impl OutputSink for BufferSink {
    fn append_lines(&mut self, lines: &[String]) -> io::Result<()> {
        self.buffers.push(lines.to_vec());
        Ok(())
    }
}

/// Writes each output line to a writer, newline terminated.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        WriterSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for WriterSink<W> {
    fn append_lines(&mut self, lines: &[String]) -> io::Result<()> {
        for line in lines {
            writeln!(self.writer, "{}", line)?;
        }
        self.writer.flush()
    }
}

/// Prints notifications to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, title: &str, message: &str) {
        eprintln!("== {} ==", title);
        eprintln!("{}", message.trim_end());
    }
}

/// Records notifications instead of showing them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub notes: RefCell<Vec<(String, String)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        self.notes
            .borrow_mut()
            .push((title.to_string(), message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn reader_lines_strip_carriage_returns() {
        let source = ReaderLines::read_from("one\r\ntwo\n".as_bytes()).unwrap();
        assert_eq!(source.get_lines().unwrap(), vec!["one", "two"]);
    }

    #[test]
    fn writer_sink_terminates_lines() {
        let mut sink = WriterSink::new(Vec::new());
        sink.append_lines(&["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(sink.into_inner(), b"a\nb\n");
    }

    #[test]
    fn writer_sink_reports_write_failures() {
        let mut sink = WriterSink::new(ClosedPipe);
        let err = sink.append_lines(&["a".to_string()]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn missing_file_is_an_error() {
        let source = FileLines::new("/nonexistent/lineq/input.txt");
        let err = source.get_lines().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("/nonexistent/lineq/input.txt"));
    }
}
