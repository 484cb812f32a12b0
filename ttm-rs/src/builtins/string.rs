//! Stateful-string reads and plain text utilities.
//!
//! The stateful-string builtins read a defined body from its residual
//! pointer on and move the pointer past what they consume.  Marks inside
//! the body are stepped over.

use super::{count, decimal};
use crate::codec;
use crate::engine::{Frame, Meta, Ttm};
use crate::error::Result;

pub(super) fn cc(t: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    if let Some(c) = t.dict.defined_mut(f.arg(1))?.text.read_char()? {
        out.push(c);
    }
    Ok(())
}

pub(super) fn cn(t: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    let n = count(f.arg(2))?;
    out.push_str(&t.dict.defined_mut(f.arg(1))?.text.take_chars(n)?);
    Ok(())
}

pub(super) fn sn(t: &mut Ttm, f: &Frame, _: &mut String) -> Result<()> {
    let n = count(f.arg(2))?;
    t.dict.defined_mut(f.arg(1))?.text.skip_chars(n)?;
    Ok(())
}

/// Read up to the next semicolon outside brackets; the semicolon is
/// consumed but not returned.
pub(super) fn cp(t: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    let Meta { open, semi, close, .. } = t.meta;
    let text = &mut t.dict.defined_mut(f.arg(1))?.text;
    let mut depth = 0usize;
    while let Some(c) = text.read_char()? {
        if c == semi && depth == 0 {
            break;
        }
        if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.saturating_sub(1);
        }
        out.push(c);
    }
    Ok(())
}

pub(super) fn cs(t: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    out.push_str(&t.dict.defined_mut(f.arg(1))?.text.read_segment()?);
    Ok(())
}

/// `isc;text;name;t;f`: if the rest of `name` starts with `text`, move past
/// it and yield `t`; otherwise yield `f`.
pub(super) fn isc(t: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    let prefix = f.arg(1);
    let text = &mut t.dict.defined_mut(f.arg(2))?.text;
    let mut probe = text.clone();
    let matched = probe.take_chars(prefix.chars().count())? == prefix;
    if matched {
        text.set_index(probe.index());
    }
    out.push_str(if matched { f.arg(3) } else { f.arg(4) });
    Ok(())
}

/// `scn;text;name;f`: find `text` in the rest of `name`.  On a hit yield
/// what precedes it and move past it; otherwise yield `f`.
pub(super) fn scn(t: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    let needle = f.arg(1);
    let text = &mut t.dict.defined_mut(f.arg(2))?.text;
    let from = text.index();
    match codec::find(text.as_bytes(), needle.as_bytes(), from) {
        Some(hit) => {
            out.push_str(&codec::strip_markers(&text.as_bytes()[from..hit])?);
            text.set_index(hit + needle.len());
        }
        None => out.push_str(f.arg(3)),
    }
    Ok(())
}

pub(super) fn rrp(t: &mut Ttm, f: &Frame, _: &mut String) -> Result<()> {
    t.dict.defined_mut(f.arg(1))?.text.reset_index();
    Ok(())
}

/// `eos;name;t;f`: `t` once no characters remain.
pub(super) fn eos(t: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    let done = t.dict.defined(f.arg(1))?.text.peek_char()?.is_none();
    out.push_str(if done { f.arg(2) } else { f.arg(3) });
    Ok(())
}

// ── Text ──────────────────────────────────────────────────────────────────────

/// `gn;n;text`: the first `n` characters, or all but the first `-n`.
pub(super) fn gn(_: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    let n = decimal(f.arg(1))?;
    let skip = usize::try_from(n.unsigned_abs()).unwrap_or(usize::MAX);
    let chars = f.arg(2).chars();
    if n >= 0 {
        out.extend(chars.take(skip));
    } else {
        out.extend(chars.skip(skip));
    }
    Ok(())
}

/// Commas outside parentheses become semicolons.
pub(super) fn zlc(t: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    let escape = t.meta.escape;
    let mut depth = 0usize;
    let mut chars = f.arg(1).chars();
    while let Some(c) = chars.next() {
        match c {
            c if c == escape => {
                out.push(c);
                out.extend(chars.next());
            }
            ',' if depth == 0 => out.push(';'),
            '(' => {
                depth += 1;
                out.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    Ok(())
}

/// Like `zlc`, but a top-level parenthesised group is unwrapped and split
/// from its neighbours: `A(B,C)` becomes `A;B,C` and `A(B)C` becomes
/// `A;B;C`.
pub(super) fn zlcp(t: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    out.push_str(&split_parens(f.arg(1), t.meta.escape));
    Ok(())
}

fn split_parens(text: &str, escape: char) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        if c == escape {
            out.push(c);
            out.extend(chars.get(i));
            i += 1;
        } else if c == ',' {
            out.push(';');
        } else if c == '(' {
            if !out.is_empty() && !out.ends_with(';') {
                out.push(';');
            }
            let mut depth = 1usize;
            while i < chars.len() {
                let inner = chars[i];
                i += 1;
                if inner == escape {
                    out.push(inner);
                    out.extend(chars.get(i));
                    i += 1;
                    continue;
                }
                if inner == '(' {
                    depth += 1;
                } else if inner == ')' {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                out.push(inner);
            }
            if chars.get(i).is_some_and(|&next| next != ',') {
                out.push(';');
            }
        } else {
            out.push(c);
        }
    }
    out
}

pub(super) fn flip(_: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    out.extend(f.arg(1).chars().rev());
    Ok(())
}

/// Length in characters.
pub(super) fn norm(_: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    out.push_str(&f.arg(1).chars().count().to_string());
    Ok(())
}
