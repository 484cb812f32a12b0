//! Scanner and evaluator.
//!
//! `scan` walks the active text; `exec` and `collect_args` are mutually
//! recursive, with recursion bounded by the frame-depth limit.  Nothing
//! here holds a reference into the buffer across an edit: positions are
//! byte offsets re-read after every call that may grow the buffer.

use tracing::trace;

use super::{Frame, Ttm, CREATE_WIDTH, MAX_ARGS};
use crate::codec::{self, Unit};
use crate::dict::{Defined, Disposition, FunctionKind};
use crate::error::{Error, Result};

impl Ttm {
    /// Scan until the active text is exhausted or a halt is requested.
    pub(super) fn scan(&mut self) -> Result<()> {
        while self.halt.is_none() {
            let Some(unit) = self.buffer.peek()? else {
                break;
            };
            let Unit::Char(c) = unit else {
                self.transfer(unit.width());
                continue;
            };
            if c == self.meta.escape {
                self.copy_escaped()?;
            } else if c == self.meta.open {
                self.copy_bracketed()?;
            } else if c == self.meta.sharp {
                match self.call_start()? {
                    Some(active) => self.exec(active)?,
                    None => self.transfer(unit.width()),
                }
            } else {
                self.transfer(unit.width());
            }
        }
        Ok(())
    }

    // ── Calls ─────────────────────────────────────────────────────────────────

    /// If a call starts at the cursor, whether it is active.
    fn call_start(&self) -> Result<Option<bool>> {
        let meta = self.meta;
        let pos = self.buffer.index() + meta.sharp.len_utf8();
        match self.buffer.unit_at(pos)? {
            Some(Unit::Char(c)) if c == meta.open => Ok(Some(true)),
            Some(Unit::Char(c)) if c == meta.sharp => {
                let next = self.buffer.unit_at(pos + c.len_utf8())?;
                Ok((next == Some(Unit::Char(meta.open))).then_some(false))
            }
            _ => Ok(None),
        }
    }

    fn exec(&mut self, active: bool) -> Result<()> {
        let limit = self.props.exec_count();
        if self.execs >= limit {
            return Err(Error::ExecsExhausted { limit });
        }
        self.execs += 1;

        let meta = self.meta;
        let mut skip = meta.sharp.len_utf8() + meta.open.len_utf8();
        if !active {
            skip += meta.sharp.len_utf8();
        }
        self.buffer.advance(skip);
        self.stack.push(Frame::new(active), self.props.stack_size())?;
        trace!(depth = self.stack.depth(), active, "exec");

        self.collect_args()?;
        if self.halt.is_some() {
            self.stack.pop()?;
            return Ok(());
        }

        let mut result = String::new();
        let disposition = self.invoke(&mut result)?;
        self.stack.pop()?;
        if disposition != Disposition::SideEffect && !result.is_empty() {
            self.splice(result.as_bytes(), active);
        }
        Ok(())
    }

    /// Collect arguments into the top frame up to the matching close.
    ///
    /// Each argument is built up in the passive zone starting at `start`,
    /// then detached.  Nested calls are evaluated in place, so their
    /// results become part of the argument.
    fn collect_args(&mut self) -> Result<()> {
        let start = self.passive;
        let meta = self.meta;
        loop {
            let Some(unit) = self.buffer.peek()? else {
                return Err(Error::UnterminatedCall);
            };
            let Unit::Char(c) = unit else {
                self.transfer(unit.width());
                continue;
            };
            if c == meta.escape {
                self.copy_escaped()?;
            } else if c == meta.semi || c == meta.close {
                self.detach_arg(start)?;
                self.buffer.advance(unit.width());
                if c == meta.close {
                    return Ok(());
                }
            } else if c == meta.open {
                self.copy_bracketed()?;
            } else if c == meta.sharp {
                match self.call_start()? {
                    Some(active) => {
                        self.exec(active)?;
                        if self.halt.is_some() {
                            self.passive = start;
                            return Ok(());
                        }
                    }
                    None => self.transfer(unit.width()),
                }
            } else {
                self.transfer(unit.width());
            }
        }
    }

    fn detach_arg(&mut self, start: usize) -> Result<()> {
        let text = codec::to_text(&self.buffer.as_bytes()[start..self.passive], start)?;
        let frame = self.stack.top_mut()?;
        if frame.args.len() >= MAX_ARGS {
            return Err(Error::TooManyArgs { max: MAX_ARGS });
        }
        frame.args.push(text);
        self.passive = start;
        Ok(())
    }

    /// Look up and run the function named by the top frame.
    fn invoke(&mut self, out: &mut String) -> Result<Disposition> {
        let frame = self.stack.top()?;
        let name = frame.name();
        let function = self
            .dict
            .function(name)
            .ok_or_else(|| Error::UndefinedName(name.to_owned()))?;
        if frame.argc() < function.min_args {
            return Err(Error::TooFewArgs {
                name: name.to_owned(),
                min: function.min_args,
                got: frame.argc(),
            });
        }
        let traced = self.trace_all || function.trace;
        let disposition = function.disposition;
        let builtin = match &function.kind {
            FunctionKind::Builtin(func) => Some(*func),
            FunctionKind::Defined(_) => None,
        };
        if traced {
            self.trace_enter();
        }

        match builtin {
            Some(func) => {
                let frame = std::mem::take(self.stack.top_mut()?);
                let result = func(self, &frame, out);
                *self.stack.top_mut()? = frame;
                result?;
            }
            None => {
                let frame = self.stack.top()?;
                let body = self.dict.defined(frame.name())?;
                substitute(body, frame, &mut self.creations, out)?;
            }
        }

        if traced {
            self.trace_exit(out);
        }
        Ok(disposition)
    }

    // ── Buffer movement ───────────────────────────────────────────────────────

    /// Move `n` bytes from the cursor to the end of the passive zone.
    fn transfer(&mut self, n: usize) {
        let index = self.buffer.index();
        if self.passive != index {
            self.buffer.copy_within(index, self.passive, n);
        }
        self.passive += n;
        self.buffer.advance(n);
    }

    /// Drop the escape and copy the unit after it.  A trailing escape is
    /// copied as itself.
    fn copy_escaped(&mut self) -> Result<()> {
        let width = self.meta.escape.len_utf8();
        match self.buffer.unit_at(self.buffer.index() + width)? {
            Some(next) => {
                self.buffer.advance(width);
                self.transfer(next.width());
            }
            None => self.transfer(width),
        }
        Ok(())
    }

    /// Copy a bracketed region without its outer brackets.  Nested
    /// brackets and escapes inside are copied verbatim.
    fn copy_bracketed(&mut self) -> Result<()> {
        let meta = self.meta;
        self.buffer.advance(meta.open.len_utf8());
        let mut depth = 1usize;
        loop {
            let Some(unit) = self.buffer.peek()? else {
                return Err(Error::UnbalancedBracket);
            };
            match unit {
                Unit::Char(c) if c == meta.escape => {
                    let mut width = unit.width();
                    if let Some(next) = self.buffer.unit_at(self.buffer.index() + width)? {
                        width += next.width();
                    }
                    self.transfer(width);
                }
                Unit::Char(c) if c == meta.open => {
                    depth += 1;
                    self.transfer(unit.width());
                }
                Unit::Char(c) if c == meta.close => {
                    depth -= 1;
                    if depth == 0 {
                        self.buffer.advance(unit.width());
                        return Ok(());
                    }
                    self.transfer(unit.width());
                }
                _ => self.transfer(unit.width()),
            }
        }
    }

    /// Place a call's result.  An active result goes just before the
    /// cursor to be scanned next; a passive one extends the passive zone.
    fn splice(&mut self, bytes: &[u8], active: bool) {
        let n = bytes.len();
        let gap = self.buffer.index() - self.passive;
        if gap < n {
            self.buffer.insert_at(self.passive, &vec![0; n - gap]);
        }
        if active {
            let at = self.buffer.index() - n;
            self.buffer.overwrite(at, bytes);
            self.buffer.set_index(at);
        } else {
            self.buffer.overwrite(self.passive, bytes);
            self.passive += n;
        }
    }
}

/// Expand a defined body: segment marks become the matching argument, and
/// every creation mark in one expansion becomes the same fresh token.
fn substitute(body: &Defined, frame: &Frame, creations: &mut u64, out: &mut String) -> Result<()> {
    let bytes = body.text.as_bytes();
    let mut token: Option<String> = None;
    let mut pos = 0;
    while let Some(unit) = codec::decode_at(bytes, pos)? {
        match unit {
            Unit::Char(c) => out.push(c),
            Unit::Segment(i) => out.push_str(frame.arg(usize::from(i))),
            Unit::Create => {
                let token = token.get_or_insert_with(|| {
                    *creations += 1;
                    format!("{:0width$}", *creations, width = CREATE_WIDTH)
                });
                out.push_str(token);
            }
        }
        pos += unit.width();
    }
    Ok(())
}
