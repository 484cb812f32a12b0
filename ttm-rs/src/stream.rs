//! Character streams.
//!
//! Every stream reads or writes whole text units.  Readers keep a small
//! pushback stack, which is what lets `\r\n` be folded into `\n` with one
//! unit of lookahead without losing a lookahead that turned out not to be
//! `\n`.

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::rc::Rc;

use crate::error::{Error, Result};

/// Units a reader can push back.
pub const PUSHBACK_DEPTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

enum Handle {
    Reader(Box<dyn BufRead>),
    Writer(Box<dyn Write>),
    Closed,
}

pub struct Stream {
    name: String,
    handle: Handle,
    pushback: Vec<char>,
    /// Bytes consumed so far, for error offsets.
    offset: usize,
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("name", &self.name)
            .field("mode", &self.mode())
            .finish()
    }
}

impl Stream {
    pub fn reader(name: impl Into<String>, reader: impl BufRead + 'static) -> Self {
        Self::with_handle(name, Handle::Reader(Box::new(reader)))
    }

    pub fn writer(name: impl Into<String>, writer: impl Write + 'static) -> Self {
        Self::with_handle(name, Handle::Writer(Box::new(writer)))
    }

    fn with_handle(name: impl Into<String>, handle: Handle) -> Self {
        Self { name: name.into(), handle, pushback: Vec::with_capacity(PUSHBACK_DEPTH), offset: 0 }
    }

    pub fn stdin() -> Self {
        Self::reader("stdin", BufReader::new(io::stdin()))
    }

    pub fn stdout() -> Self {
        Self::writer("stdout", io::stdout())
    }

    pub fn stderr() -> Self {
        Self::writer("stderr", io::stderr())
    }

    /// Open a named file.  Write mode truncates.
    pub fn open(path: &Path, mode: Mode) -> Result<Self> {
        let name = path.display().to_string();
        match mode {
            Mode::Read => {
                let file = File::open(path).map_err(|e| Error::io(&name, e))?;
                Ok(Self::reader(name, BufReader::new(file)))
            }
            Mode::Write => {
                let file = File::create(path).map_err(|e| Error::io(&name, e))?;
                Ok(Self::writer(name, BufWriter::new(file)))
            }
        }
    }

    /// A writer whose output can be inspected through the returned handle.
    pub fn capture(name: impl Into<String>) -> (Self, Capture) {
        let capture = Capture::default();
        (Self::writer(name, capture.clone()), capture)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> Option<Mode> {
        match self.handle {
            Handle::Reader(_) => Some(Mode::Read),
            Handle::Writer(_) => Some(Mode::Write),
            Handle::Closed => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.mode().is_some()
    }

    /// Flush and close.  Closing twice is harmless.
    pub fn close(&mut self) -> Result<()> {
        self.flush()?;
        self.handle = Handle::Closed;
        self.pushback.clear();
        Ok(())
    }

    // ── Reading ───────────────────────────────────────────────────────────────

    /// Read one unit, folding `\r\n` into `\n`.  `Ok(None)` at end of input.
    ///
    /// A pushed-back `\r` is folded like one read from the source.
    pub fn read_char(&mut self) -> Result<Option<char>> {
        let c = self.next_unit()?;
        if c == Some('\r') {
            match self.next_unit()? {
                Some('\n') => return Ok(Some('\n')),
                Some(other) => self.unread(other)?,
                None => {}
            }
        }
        Ok(c)
    }

    fn next_unit(&mut self) -> Result<Option<char>> {
        match self.pushback.pop() {
            Some(c) => Ok(Some(c)),
            None => self.read_raw(),
        }
    }

    /// Push `c` back so the next read returns it.
    pub fn unread(&mut self, c: char) -> Result<()> {
        if self.pushback.len() >= PUSHBACK_DEPTH {
            return Err(Error::PushbackFull { stream: self.name.clone() });
        }
        self.pushback.push(c);
        Ok(())
    }

    /// Read up to (not including) `stop`, which is consumed.
    ///
    /// Returns `None` when the input is already exhausted.
    pub fn read_until(&mut self, stop: char) -> Result<Option<String>> {
        let mut out = String::new();
        let mut any = false;
        while let Some(c) = self.read_char()? {
            any = true;
            if c == stop {
                break;
            }
            out.push(c);
        }
        Ok(any.then_some(out))
    }

    /// Read everything that is left.
    pub fn read_to_end(&mut self) -> Result<String> {
        let mut out = String::new();
        while let Some(c) = self.read_char()? {
            out.push(c);
        }
        Ok(out)
    }

    fn read_raw(&mut self) -> Result<Option<char>> {
        let Some(lead) = self.next_byte()? else {
            return Ok(None);
        };
        let start = self.offset - 1;
        let bad = Error::BadUnit { offset: start };
        let width = match lead {
            0x00..=0x7F => return Ok(Some(lead as char)),
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return Err(bad),
        };
        let mut seq = [lead, 0, 0, 0];
        for slot in seq.iter_mut().take(width).skip(1) {
            *slot = self.next_byte()?.ok_or_else(|| bad.clone())?;
        }
        std::str::from_utf8(&seq[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .map(Some)
            .ok_or(bad)
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        let Handle::Reader(reader) = &mut self.handle else {
            return Err(self.wrong_mode("reading"));
        };
        let buf = reader
            .fill_buf()
            .map_err(|e| Error::io(self.name.clone(), e))?;
        let Some(&b) = buf.first() else {
            return Ok(None);
        };
        reader.consume(1);
        self.offset += 1;
        Ok(Some(b))
    }

    // ── Writing ───────────────────────────────────────────────────────────────

    pub fn write_str(&mut self, s: &str) -> Result<()> {
        let Handle::Writer(writer) = &mut self.handle else {
            return Err(self.wrong_mode("writing"));
        };
        writer
            .write_all(s.as_bytes())
            .map_err(|e| Error::io(self.name.clone(), e))
    }

    pub fn flush(&mut self) -> Result<()> {
        match &mut self.handle {
            Handle::Writer(w) => w.flush().map_err(|e| Error::io(self.name.clone(), e)),
            _ => Ok(()),
        }
    }

    fn wrong_mode(&self, attempted: &str) -> Error {
        Error::Io {
            context: self.name.clone(),
            message: format!("stream not open for {attempted}"),
        }
    }
}

// ── Capture ───────────────────────────────────────────────────────────────────

/// Shared in-memory sink, used to observe output when embedding.
#[derive(Debug, Clone, Default)]
pub struct Capture(Rc<RefCell<Vec<u8>>>);

impl Capture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ── Streams ───────────────────────────────────────────────────────────────────

/// The streams an interpreter talks to.
///
/// Interactive programs always come from `stdin`.  `rs` reads from
/// `rs_input` when one is set and from `stdin` otherwise.
#[derive(Debug)]
pub struct Streams {
    pub stdin: Stream,
    pub stdout: Stream,
    pub stderr: Stream,
    pub rs_input: Option<Stream>,
}

impl Streams {
    pub fn standard() -> Self {
        Self {
            stdin: Stream::stdin(),
            stdout: Stream::stdout(),
            stderr: Stream::stderr(),
            rs_input: None,
        }
    }

    /// In-memory streams: `input` feeds stdin; stdout and stderr are captured.
    pub fn memory(input: &str) -> (Self, Capture, Capture) {
        let (stdout, out) = Stream::capture("stdout");
        let (stderr, err) = Stream::capture("stderr");
        let stdin = Stream::reader("stdin", io::Cursor::new(input.as_bytes().to_vec()));
        (Self { stdin, stdout, stderr, rs_input: None }, out, err)
    }

    /// The stream `rs` reads from.
    pub fn rs_source(&mut self) -> &mut Stream {
        self.rs_input.as_mut().unwrap_or(&mut self.stdin)
    }
}
