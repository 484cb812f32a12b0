//! Interpreter errors.
//!
//! Every failure the engine can report is a variant of [`Error`]; each
//! variant belongs to exactly one [`ErrorKind`].  An error that escapes a
//! top-level evaluation is wrapped in a [`Failure`], which also records the
//! frame stack and the buffer context at the point of failure.

use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ── ErrorKind ─────────────────────────────────────────────────────────────────

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed text unit.
    Encoding,
    /// Unterminated call or bracket, too many arguments or segments.
    Syntax,
    /// Undefined function, class or property name.
    Lookup,
    /// Locked entry, primitive misuse, wrong argument count, bad setting.
    Policy,
    /// Frame stack or execution budget exhausted.
    Resource,
    /// Stream failure or unexpected end of input.
    Io,
    /// Non-decimal or out-of-domain numbers.
    Numeric,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Encoding => "encoding",
            ErrorKind::Syntax => "syntax",
            ErrorKind::Lookup => "lookup",
            ErrorKind::Policy => "policy",
            ErrorKind::Resource => "resource",
            ErrorKind::Io => "io",
            ErrorKind::Numeric => "numeric",
        })
    }
}

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A byte sequence at `offset` is not a valid text unit or marker.
    BadUnit { offset: usize },

    /// End of text reached inside a call.
    UnterminatedCall,
    /// End of text reached inside `<...>`.
    UnbalancedBracket,
    /// A call carried more than `max` arguments (name included).
    TooManyArgs { max: usize },
    /// Segmenting `name` would exceed the segment-mark range.
    TooManySegments { name: String },

    UndefinedName(String),
    UndefinedClass(String),
    UnknownProperty(String),

    /// Attempt to redefine, erase or otherwise modify a locked entry.
    Locked(String),
    /// A builtin was used where a defined string is required.
    Primitive(String),
    TooFewArgs { name: String, min: usize, got: usize },
    /// Meta-character rebinding that would make the syntax ambiguous.
    BadMeta(String),
    /// A property value outside its permitted range.
    OutOfRange { name: String, value: i64 },

    StackOverflow { limit: usize },
    StackUnderflow,
    ExecsExhausted { limit: u64 },
    /// A stream's pushback stack is full.
    PushbackFull { stream: String },

    Io { context: String, message: String },
    Eof { stream: String },

    NotDecimal(String),
    Negative(String),
    /// An index past the end of a sequence of `len` items.
    BadIndex { index: i64, len: usize },
    DivideByZero,
    Overflow,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::BadUnit { .. } => ErrorKind::Encoding,
            Error::UnterminatedCall
            | Error::UnbalancedBracket
            | Error::TooManyArgs { .. }
            | Error::TooManySegments { .. } => ErrorKind::Syntax,
            Error::UndefinedName(_) | Error::UndefinedClass(_) | Error::UnknownProperty(_) => {
                ErrorKind::Lookup
            }
            Error::Locked(_)
            | Error::Primitive(_)
            | Error::TooFewArgs { .. }
            | Error::BadMeta(_)
            | Error::OutOfRange { .. } => ErrorKind::Policy,
            Error::StackOverflow { .. }
            | Error::StackUnderflow
            | Error::ExecsExhausted { .. }
            | Error::PushbackFull { .. } => ErrorKind::Resource,
            Error::Io { .. } | Error::Eof { .. } => ErrorKind::Io,
            Error::NotDecimal(_)
            | Error::Negative(_)
            | Error::BadIndex { .. }
            | Error::DivideByZero
            | Error::Overflow => ErrorKind::Numeric,
        }
    }

    /// Wrap a host I/O error with a short description of what was attempted.
    pub fn io(context: impl Into<String>, err: std::io::Error) -> Self {
        Error::Io { context: context.into(), message: err.to_string() }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadUnit { offset } => write!(f, "malformed text unit at byte {offset}"),
            Error::UnterminatedCall => f.write_str("unexpected end of text inside a call"),
            Error::UnbalancedBracket => f.write_str("unbalanced bracket"),
            Error::TooManyArgs { max } => write!(f, "too many arguments (max {max})"),
            Error::TooManySegments { name } => write!(f, "{name}: too many segment marks"),
            Error::UndefinedName(name) => write!(f, "undefined function: '{name}'"),
            Error::UndefinedClass(name) => write!(f, "undefined class: '{name}'"),
            Error::UnknownProperty(name) => write!(f, "unknown property: '{name}'"),
            Error::Locked(name) => write!(f, "{name}: entry is locked"),
            Error::Primitive(name) => write!(f, "{name}: builtin has no body"),
            Error::TooFewArgs { name, min, got } => {
                write!(f, "{name}: too few arguments ({got} given, {min} required)")
            }
            Error::BadMeta(msg) => write!(f, "bad meta characters: {msg}"),
            Error::OutOfRange { name, value } => write!(f, "{name}: value {value} out of range"),
            Error::StackOverflow { limit } => write!(f, "call stack overflow (depth {limit})"),
            Error::StackUnderflow => f.write_str("call stack underflow"),
            Error::ExecsExhausted { limit } => {
                write!(f, "execution limit exhausted ({limit} calls)")
            }
            Error::PushbackFull { stream } => write!(f, "{stream}: pushback stack full"),
            Error::Io { context, message } => write!(f, "{context}: {message}"),
            Error::Eof { stream } => write!(f, "{stream}: unexpected end of file"),
            Error::NotDecimal(text) => write!(f, "not a decimal number: '{text}'"),
            Error::Negative(text) => write!(f, "negative value not allowed: '{text}'"),
            Error::BadIndex { index, len } => {
                write!(f, "index {index} out of range (0..{len})")
            }
            Error::DivideByZero => f.write_str("division by zero"),
            Error::Overflow => f.write_str("arithmetic overflow"),
        }
    }
}

impl std::error::Error for Error {}

// ── Failure ───────────────────────────────────────────────────────────────────

/// An error that escaped a top-level evaluation, with the interpreter state
/// captured before the frame stack was unwound.
#[derive(Debug, Clone)]
pub struct Failure {
    pub error: Error,
    /// Calls in progress, outermost first.
    pub frames: Vec<String>,
    /// Tail of the already-scanned text.
    pub passive: String,
    /// Head of the not-yet-scanned text.
    pub active: String,
}

impl Failure {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.error.kind(), self.error)?;
        for (depth, frame) in self.frames.iter().enumerate().rev() {
            write!(f, "\n  [{depth:02}] {frame}")?;
        }
        write!(f, "\n  near: ...{}^{}...", self.passive, self.active)
    }
}

impl std::error::Error for Failure {}
