//! Host capabilities injected into a run
//!
//! The evaluator never touches the console or the disk directly. Output goes
//! through an [`OutputSink`] and file access through a [`FileSystem`], so tests
//! capture the ordered log and fake files without real I/O.

use super::errors::Exception;
use super::types::Stream;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};

/* ===================== Output ===================== */

/// Receives emitted lines in execution order
pub trait OutputSink: Send {
    fn emit(&mut self, stream: Stream, line: &str);
}

/// One emitted line together with its stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emission {
    pub stream: Stream,
    pub line: String,
}

/// In-memory sink that records every emission
#[derive(Debug, Clone, Default)]
pub struct OutputLog {
    emissions: Vec<Emission>,
}

impl OutputLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emissions(&self) -> &[Emission] {
        &self.emissions
    }

    /// Every line regardless of stream, in emission order
    pub fn lines(&self) -> Vec<&str> {
        self.emissions.iter().map(|e| e.line.as_str()).collect()
    }

    /// Lines written to `stream` only
    pub fn stream_lines(&self, stream: Stream) -> Vec<&str> {
        self.emissions
            .iter()
            .filter(|e| e.stream == stream)
            .map(|e| e.line.as_str())
            .collect()
    }

    pub fn clear(&mut self) {
        self.emissions.clear();
    }
}

impl OutputSink for OutputLog {
    fn emit(&mut self, stream: Stream, line: &str) {
        self.emissions.push(Emission {
            stream,
            line: line.to_string(),
        });
    }
}

/// Writes straight to the process stdout/stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn emit(&mut self, stream: Stream, line: &str) {
        match stream {
            Stream::Out => println!("{}", line),
            Stream::Err => eprintln!("{}", line),
        }
    }
}

/* ===================== Files ===================== */

/// An open, line-oriented file handle
pub trait LineReader: Send {
    /// Next line without its terminator, or None at end of input
    fn read_line(&mut self) -> Result<Option<String>, Exception>;

    fn close(&mut self) -> Result<(), Exception>;
}

/// File-reading capability; failures surface as ResourceFailure exceptions
pub trait FileSystem: Send {
    fn open(&mut self, path: &str) -> Result<Box<dyn LineReader>, Exception>;

    /// Open `path`, read its first line and close it again
    ///
    /// An empty file yields an empty string. A close failure is reported only
    /// when the read itself succeeded.
    fn read_first_line(&mut self, path: &str) -> Result<String, Exception> {
        let mut reader = self.open(path)?;
        let line = reader.read_line();
        let closed = reader.close();
        let line = line?;
        closed?;
        Ok(line.unwrap_or_default())
    }
}

/// `std::fs` backed file system, optionally confined to a root directory
#[derive(Debug, Clone, Default)]
pub struct DiskFileSystem {
    root: Option<PathBuf>,
}

impl DiskFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) if Path::new(path).is_relative() => root.join(path),
            _ => PathBuf::from(path),
        }
    }
}

impl FileSystem for DiskFileSystem {
    fn open(&mut self, path: &str) -> Result<Box<dyn LineReader>, Exception> {
        let resolved = self.resolve(path);
        let file = File::open(&resolved)
            .map_err(|e| Exception::resource(format!("{} ({})", path, e)))?;
        Ok(Box::new(DiskLineReader {
            path: path.to_string(),
            reader: Some(BufReader::new(file)),
        }))
    }
}

struct DiskLineReader {
    path: String,
    reader: Option<BufReader<File>>,
}

impl LineReader for DiskLineReader {
    fn read_line(&mut self) -> Result<Option<String>, Exception> {
        let Some(reader) = self.reader.as_mut() else {
            return Err(Exception::resource("Stream closed"));
        };
        read_terminated_line(reader)
            .map_err(|e| Exception::resource(format!("{} ({})", self.path, e)))
    }

    fn close(&mut self) -> Result<(), Exception> {
        self.reader = None;
        Ok(())
    }
}

/// Read one line ended by `\n`, `\r` or `\r\n`, without its terminator
///
/// Returns None at end of input. Invalid UTF-8 is replaced rather than
/// rejected.
fn read_terminated_line<R: BufRead + ?Sized>(reader: &mut R) -> io::Result<Option<String>> {
    let mut bytes = Vec::new();
    let mut saw_input = false;
    loop {
        let buf = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if buf.is_empty() {
            break;
        }
        saw_input = true;

        match buf.iter().position(|&b| b == b'\n' || b == b'\r') {
            Some(i) => {
                let carriage_return = buf[i] == b'\r';
                bytes.extend_from_slice(&buf[..i]);
                reader.consume(i + 1);
                // a CR may be followed by the LF of a CRLF pair in the next chunk
                if carriage_return && reader.fill_buf()?.first() == Some(&b'\n') {
                    reader.consume(1);
                }
                return Ok(Some(String::from_utf8_lossy(&bytes).into_owned()));
            }
            None => {
                let n = buf.len();
                bytes.extend_from_slice(buf);
                reader.consume(n);
            }
        }
    }

    if !saw_input {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

/// In-memory file system for tests
///
/// Paths registered with [`fail_on_close`](Self::fail_on_close) or
/// [`fail_on_read`](Self::fail_on_read) open normally and then fail with a
/// ResourceFailure at that operation.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: HashMap<String, String>,
    failing_close: HashSet<String>,
    failing_read: HashSet<String>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into());
    }

    pub fn fail_on_close(mut self, path: impl Into<String>) -> Self {
        self.failing_close.insert(path.into());
        self
    }

    pub fn fail_on_read(mut self, path: impl Into<String>) -> Self {
        self.failing_read.insert(path.into());
        self
    }
}

impl FileSystem for MemoryFileSystem {
    fn open(&mut self, path: &str) -> Result<Box<dyn LineReader>, Exception> {
        let contents = self.files.get(path).ok_or_else(|| {
            Exception::resource(format!("{} (No such file or directory)", path))
        })?;
        let mut cursor = Cursor::new(contents.as_bytes());
        let mut lines = Vec::new();
        while let Ok(Some(line)) = read_terminated_line(&mut cursor) {
            lines.push(line);
        }
        lines.reverse();
        Ok(Box::new(MemoryLineReader {
            path: path.to_string(),
            lines,
            closed: false,
            fail_close: self.failing_close.contains(path),
            fail_read: self.failing_read.contains(path),
        }))
    }
}

struct MemoryLineReader {
    path: String,
    /// Remaining lines, last line first
    lines: Vec<String>,
    closed: bool,
    fail_close: bool,
    fail_read: bool,
}

impl LineReader for MemoryLineReader {
    fn read_line(&mut self) -> Result<Option<String>, Exception> {
        if self.closed {
            return Err(Exception::resource("Stream closed"));
        }
        if self.fail_read {
            return Err(Exception::resource(format!("{}: read failed", self.path)));
        }
        Ok(self.lines.pop())
    }

    fn close(&mut self) -> Result<(), Exception> {
        self.closed = true;
        if self.fail_close {
            return Err(Exception::resource(format!("{}: close failed", self.path)));
        }
        Ok(())
    }
}
