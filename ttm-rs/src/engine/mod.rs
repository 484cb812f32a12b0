//! The rewriting engine.
//!
//! A [`Ttm`] value holds the whole interpreter state: the dictionary, the
//! properties, the meta characters, the streams and the text buffer being
//! rewritten.  There are no globals; independent interpreters can coexist.
//!
//! # Quick start
//!
//! ```rust
//! use ttm::Ttm;
//!
//! let mut ttm = Ttm::new();
//! let out = ttm.eval("#<ds;greet;hello NAME!>#<ss;greet;NAME>#<greet;world>").unwrap();
//! assert_eq!(out, "hello world!");
//! ```
//!
//! # Buffer zones
//!
//! The program buffer is split by two offsets.  Bytes before `passive` are
//! finished output and are never scanned again.  Bytes from the buffer's
//! cursor on are the active text still to be scanned.  The bytes in between
//! are dead space that results are written into when they fit.

mod frame;
mod scan;

use std::time::Instant;

use tracing::info;

pub use frame::{Frame, FrameStack, MAX_ARGS};

use crate::buffer::Buffer;
use crate::builtins;
use crate::dict::Dictionary;
use crate::error::{Error, Failure, Result};
use crate::props::{Properties, EXECCOUNT};
use crate::stream::Streams;

/// Width of the zero-padded token substituted for creation marks.
pub const CREATE_WIDTH: usize = 4;

/// Units of context shown on each side of the cursor in a [`Failure`].
const CONTEXT_UNITS: usize = 40;

// ── Meta characters ───────────────────────────────────────────────────────────

/// The characters that give program text its structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meta {
    pub sharp: char,
    pub open: char,
    pub semi: char,
    pub close: char,
    pub escape: char,
    /// Terminates `rs` reads and interactive programs.
    pub read_end: char,
}

impl Default for Meta {
    fn default() -> Self {
        Self { sharp: '#', open: '<', semi: ';', close: '>', escape: '\\', read_end: '\n' }
    }
}

impl Meta {
    /// Rebind sharp, open, semicolon and close, plus escape when a fifth
    /// character is given.  The structural characters must be distinct.
    pub fn rebind(&mut self, chars: &str) -> Result<()> {
        let cs: Vec<char> = chars.chars().collect();
        if !(4..=5).contains(&cs.len()) {
            return Err(Error::BadMeta(format!("expected 4 or 5 characters, got {}", cs.len())));
        }
        let escape = cs.get(4).copied().unwrap_or(self.escape);
        let all = [cs[0], cs[1], cs[2], cs[3], escape];
        for (i, a) in all.iter().enumerate() {
            if all[i + 1..].contains(a) {
                return Err(Error::BadMeta(format!("'{a}' used twice")));
            }
        }
        self.sharp = cs[0];
        self.open = cs[1];
        self.semi = cs[2];
        self.close = cs[3];
        self.escape = escape;
        Ok(())
    }

    /// The four-character control sequence, e.g. `#<;>`.
    pub fn control(&self) -> String {
        [self.sharp, self.open, self.semi, self.close].iter().collect()
    }
}

// ── Outcome ───────────────────────────────────────────────────────────────────

/// Result of one successful top-level evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Scanned text left in the buffer.
    pub output: String,
    /// Status requested by `exit`, if it was called.
    pub exit: Option<i32>,
}

// ── Ttm ───────────────────────────────────────────────────────────────────────

pub struct Ttm {
    pub dict: Dictionary,
    pub props: Properties,
    pub meta: Meta,
    pub streams: Streams,
    /// Program arguments exposed through `argc` / `argv`.
    pub args: Vec<String>,
    /// Trace every call, regardless of per-function flags.
    pub trace_all: bool,
    buffer: Buffer,
    passive: usize,
    stack: FrameStack,
    /// Calls executed since the budget was last loaded.
    execs: u64,
    creations: u64,
    halt: Option<i32>,
    started: Instant,
}

impl Default for Ttm {
    fn default() -> Self {
        Self::new()
    }
}

impl Ttm {
    /// An interpreter attached to the process's standard streams.
    pub fn new() -> Self {
        Self::with_streams(Streams::standard())
    }

    pub fn with_streams(streams: Streams) -> Self {
        let mut dict = Dictionary::new();
        builtins::register_all(&mut dict);
        dict.lock_all();
        Ttm {
            dict,
            props: Properties::new(),
            meta: Meta::default(),
            streams,
            args: Vec::new(),
            trace_all: false,
            buffer: Buffer::new(),
            passive: 0,
            stack: FrameStack::new(),
            execs: 0,
            creations: 0,
            halt: None,
            started: Instant::now(),
        }
    }

    /// Time since this interpreter was created.
    pub fn elapsed(&self) -> std::time::Duration {
        self.started.elapsed()
    }

    /// Current frame depth.
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// Set a property.  Setting `execcount` loads a fresh call budget.
    pub fn set_prop(&mut self, name: &str, value: i64) -> Result<()> {
        self.props.set(name, value)?;
        if name == EXECCOUNT {
            self.execs = 0;
        }
        Ok(())
    }

    /// Restore every property default and load a fresh call budget.
    pub fn reset_props(&mut self) {
        self.props.reset();
        self.execs = 0;
    }

    /// Stop scanning as soon as control returns to the scanner.
    pub fn request_halt(&mut self, status: i32) {
        self.halt = Some(status);
    }

    /// Scan `text` to completion.
    ///
    /// This is the catch point: on error every frame pushed during this
    /// evaluation is unwound and the error is returned with the state it
    /// was raised in.  The call budget is shared by every evaluation of the
    /// run.
    pub fn evaluate(&mut self, text: &str) -> Result<Outcome, Failure> {
        self.buffer = Buffer::from(text);
        self.passive = 0;
        self.halt = None;
        let depth = self.stack.depth();

        match self.scan() {
            Ok(()) => {
                let output = self.passive_text();
                let exit = self.halt.take();
                self.buffer.clear();
                self.passive = 0;
                Ok(Outcome { output, exit })
            }
            Err(error) => {
                let failure = self.failure(error);
                self.stack.unwind(depth);
                self.buffer.clear();
                self.passive = 0;
                self.halt = None;
                Err(failure)
            }
        }
    }

    /// Evaluate and return the scanned text, discarding the failure context.
    pub fn eval(&mut self, text: &str) -> Result<String> {
        self.evaluate(text)
            .map(|o| o.output)
            .map_err(|f| f.error)
    }

    /// Evaluate a program as the command-line driver does: the final text
    /// goes to stdout when `showfinal` is set.  Returns the `exit` status,
    /// if one was requested.
    pub fn run(&mut self, text: &str) -> Result<Option<i32>, Failure> {
        let outcome = self.evaluate(text)?;
        if self.props.show_final() && !outcome.output.is_empty() {
            let written = self
                .streams
                .stdout
                .write_str(&outcome.output)
                .and_then(|()| self.streams.stdout.flush());
            if let Err(error) = written {
                return Err(self.failure(error));
            }
        }
        Ok(outcome.exit)
    }

    /// Read programs from stdin, one per read terminator, and run each in
    /// its own catch context.  A failing program is reported on stderr and
    /// the loop carries on.  Returns the status passed to `exit`, or 0 at
    /// end of input.
    pub fn interact(&mut self) -> Result<i32> {
        loop {
            let Some(program) = self.streams.stdin.read_until(self.meta.read_end)? else {
                return Ok(0);
            };
            match self.run(&program) {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(failure) => {
                    self.streams.stderr.write_str(&format!("{failure}\n"))?;
                    self.streams.stderr.flush()?;
                }
            }
        }
    }

    // ── Diagnostics ───────────────────────────────────────────────────────────

    fn passive_text(&self) -> String {
        String::from_utf8_lossy(&self.buffer.as_bytes()[..self.passive]).into_owned()
    }

    fn failure(&self, error: Error) -> Failure {
        let passive = self.passive_text();
        let skip = passive.chars().count().saturating_sub(CONTEXT_UNITS);
        let active = String::from_utf8_lossy(self.buffer.remaining());
        Failure {
            error,
            frames: self.stack.describe(&self.meta),
            passive: passive.chars().skip(skip).collect(),
            active: active.chars().take(CONTEXT_UNITS).collect(),
        }
    }

    fn trace_enter(&self) {
        if let Ok(frame) = self.stack.top() {
            info!(target: "ttm::trace", "[{:02}] begin {}", self.stack.depth(), frame.render(&self.meta));
        }
    }

    fn trace_exit(&self, result: &str) {
        if let Ok(frame) = self.stack.top() {
            info!(target: "ttm::trace", "[{:02}] end {} => {}", self.stack.depth(), frame.name(), result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn meta_rebind() {
        let mut m = Meta::default();
        m.rebind("$[,]").unwrap();
        assert_eq!(m.control(), "$[,]");
        assert_eq!(m.escape, '\\');
        m.rebind("#<;>@").unwrap();
        assert_eq!(m.escape, '@');
    }

    #[test]
    fn meta_rebind_rejects_duplicates_and_bad_length() {
        let mut m = Meta::default();
        assert!(matches!(m.rebind("##;>"), Err(Error::BadMeta(_))));
        assert!(matches!(m.rebind("#<;"), Err(Error::BadMeta(_))));
        assert!(matches!(m.rebind("#<;>#"), Err(Error::BadMeta(_))));
        assert_eq!(m, Meta::default());
    }

    #[test]
    fn failure_captures_frames_then_unwinds() {
        let mut ttm = Ttm::with_streams(Streams::memory("").0);
        let failure = ttm.evaluate("abc#<ds;x;#<nope;1>>").unwrap_err();
        assert_eq!(failure.kind(), ErrorKind::Lookup);
        assert_eq!(failure.frames, vec!["#<ds;x>", "#<nope;1>"]);
        assert_eq!(failure.passive, "abc");
        assert_eq!(ttm.depth(), 0);
        // the interpreter is still usable
        assert_eq!(ttm.eval("ok").unwrap(), "ok");
    }

    #[test]
    fn run_writes_final_text() {
        let (streams, out, _) = Streams::memory("");
        let mut ttm = Ttm::with_streams(streams);
        assert_eq!(ttm.run("hello").unwrap(), None);
        assert_eq!(out.contents(), "hello");
        ttm.props.set(crate::props::SHOWFINAL, 0).unwrap();
        ttm.run("again").unwrap();
        assert_eq!(out.contents(), "hello");
    }

    #[test]
    fn interact_survives_bad_program() {
        let (streams, out, err) = Streams::memory("#<nope>\n#<ds;a;A>#<a>\n");
        let mut ttm = Ttm::with_streams(streams);
        assert_eq!(ttm.interact().unwrap(), 0);
        assert_eq!(out.contents(), "A");
        assert!(err.contents().contains("undefined function: 'nope'"));
    }

    #[test]
    fn interact_stops_at_exit() {
        let (streams, out, _) = Streams::memory("one\n#<exit;3>\nnever\n");
        let mut ttm = Ttm::with_streams(streams);
        assert_eq!(ttm.interact().unwrap(), 3);
        assert_eq!(out.contents(), "one");
    }
}
