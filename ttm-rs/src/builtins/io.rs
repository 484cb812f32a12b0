//! Stream builtins.

use std::path::Path;

use crate::engine::{Frame, Ttm};
use crate::error::{Error, Result};
use crate::stream::{Mode, Stream};

/// `ps;text[;stream]`: print to stdout, or to stderr when asked.
pub(super) fn ps(t: &mut Ttm, f: &Frame, _: &mut String) -> Result<()> {
    let stream = match f.arg(2) {
        "" | "stdout" => &mut t.streams.stdout,
        "stderr" => &mut t.streams.stderr,
        other => {
            return Err(Error::Io {
                context: other.to_owned(),
                message: "no such stream".into(),
            })
        }
    };
    stream.write_str(f.arg(1))?;
    stream.flush()
}

/// Read up to the read terminator, which is consumed and dropped.  The
/// `rs` input is stdin unless a separate source was attached.
pub(super) fn rs(t: &mut Ttm, _: &Frame, out: &mut String) -> Result<()> {
    let input = t.streams.rs_source();
    let line = input
        .read_until(t.meta.read_end)?
        .ok_or_else(|| Error::Eof { stream: input.name().to_owned() })?;
    if t.props.echo() {
        t.streams.stdout.write_str(&line)?;
        t.streams.stdout.write_str(&t.meta.read_end.to_string())?;
        t.streams.stdout.flush()?;
    }
    out.push_str(&line);
    Ok(())
}

/// Prompt, then read.
pub(super) fn psr(t: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    t.streams.stdout.write_str(f.arg(1))?;
    t.streams.stdout.flush()?;
    rs(t, f, out)
}

/// Change the read terminator.
pub(super) fn cm(t: &mut Ttm, f: &Frame, _: &mut String) -> Result<()> {
    let mut chars = f.arg(1).chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => {
            t.meta.read_end = c;
            Ok(())
        }
        _ => Err(Error::BadMeta(format!("read terminator must be one character: '{}'", f.arg(1)))),
    }
}

/// The contents of a file, placed like any other result.
pub(super) fn include(_: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    let mut file = Stream::open(Path::new(f.arg(1)), Mode::Read)?;
    out.push_str(&file.read_to_end()?);
    file.close()
}
