//! Dictionary builtins: defining, segmenting, erasing, locking, tracing.

use tracing::debug;

use crate::engine::{Frame, Ttm};
use crate::error::Result;

pub(super) fn ds(t: &mut Ttm, f: &Frame, _: &mut String) -> Result<()> {
    t.dict.define(f.arg(1), f.arg(2))
}

pub(super) fn ap(t: &mut Ttm, f: &Frame, _: &mut String) -> Result<()> {
    t.dict.append(f.arg(1), f.arg(2))
}

pub(super) fn cf(t: &mut Ttm, f: &Frame, _: &mut String) -> Result<()> {
    t.dict.copy(f.arg(1), f.arg(2))
}

pub(super) fn cr(t: &mut Ttm, f: &Frame, _: &mut String) -> Result<()> {
    t.dict.defined_mut(f.arg(1))?.mark_creation(f.arg(2));
    Ok(())
}

/// Erase each name; names that are not defined are skipped.
pub(super) fn es(t: &mut Ttm, f: &Frame, _: &mut String) -> Result<()> {
    for name in f.rest() {
        t.dict.erase(name)?;
    }
    Ok(())
}

pub(super) fn ss(t: &mut Ttm, f: &Frame, _: &mut String) -> Result<()> {
    segment(t, f).map(drop)
}

pub(super) fn sc(t: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    let n = segment(t, f)?;
    out.push_str(&n.to_string());
    Ok(())
}

fn segment(t: &mut Ttm, f: &Frame) -> Result<usize> {
    let name = f.arg(1);
    let n = t.dict.defined_mut(name)?.segment(name, f.rest().get(1..).unwrap_or(&[]))?;
    debug!(name, replaced = n, "segment");
    Ok(n)
}

/// `ndf;name;t;f`: `t` if `name` is defined, else `f`.
pub(super) fn ndf(t: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    let pick = if t.dict.contains(f.arg(1)) { f.arg(2) } else { f.arg(3) };
    out.push_str(pick);
    Ok(())
}

/// User-defined names, or every name when an argument is given.
pub(super) fn names(t: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    out.push_str(&t.dict.names(f.argc() > 0).join(","));
    Ok(())
}

pub(super) fn lf(t: &mut Ttm, f: &Frame, _: &mut String) -> Result<()> {
    set_lock(t, f, true)
}

pub(super) fn uf(t: &mut Ttm, f: &Frame, _: &mut String) -> Result<()> {
    set_lock(t, f, false)
}

fn set_lock(t: &mut Ttm, f: &Frame, locked: bool) -> Result<()> {
    for name in f.rest() {
        t.dict.function_mut(name)?.locked = locked;
        debug!(name = name.as_str(), locked, "lock");
    }
    Ok(())
}

pub(super) fn tn(t: &mut Ttm, f: &Frame, _: &mut String) -> Result<()> {
    set_trace(t, f, true)
}

pub(super) fn tf(t: &mut Ttm, f: &Frame, _: &mut String) -> Result<()> {
    set_trace(t, f, false)
}

/// With no names, switch global tracing.
fn set_trace(t: &mut Ttm, f: &Frame, on: bool) -> Result<()> {
    if f.argc() == 0 {
        t.trace_all = on;
        return Ok(());
    }
    for name in f.rest() {
        t.dict.function_mut(name)?.trace = on;
    }
    Ok(())
}
