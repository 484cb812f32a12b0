//! Builtin functions.
//!
//! Every builtin is a plain function with the [`BuiltinFn`] signature,
//! registered from the [`BUILTINS`] table together with its argument bounds
//! and result disposition.  Builtins see the interpreter through the frame
//! and the output accumulator; they never touch the scan buffer.

mod arith;
mod class;
mod dict;
mod io;
mod string;
mod sys;

use crate::dict::{BuiltinFn, Dictionary, Disposition, Function};
use crate::error::{Error, Result};

const S: Disposition = Disposition::SideEffect;
const V: Disposition = Disposition::Value;
const O: Disposition = Disposition::Optional;
/// No upper bound on the argument count.
const ANY: Option<usize> = None;

/// `(name, min args, max args, disposition, function)`.
pub const BUILTINS: &[(&str, usize, Option<usize>, Disposition, BuiltinFn)] = &[
    // ── Dictionary ───────────────────────────────────────────────────────────
    ("ds", 2, Some(2), S, dict::ds),
    ("ap", 2, Some(2), S, dict::ap),
    ("cf", 2, Some(2), S, dict::cf),
    ("cr", 2, Some(2), S, dict::cr),
    ("es", 1, ANY, S, dict::es),
    ("ss", 2, ANY, S, dict::ss),
    ("sc", 2, ANY, V, dict::sc),
    ("ndf", 3, Some(3), O, dict::ndf),
    ("names", 0, Some(1), V, dict::names),
    ("lf", 1, ANY, S, dict::lf),
    ("uf", 1, ANY, S, dict::uf),
    ("tn", 0, ANY, S, dict::tn),
    ("tf", 0, ANY, S, dict::tf),
    // ── Stateful strings ─────────────────────────────────────────────────────
    ("cc", 1, Some(1), O, string::cc),
    ("cn", 2, Some(2), O, string::cn),
    ("sn", 2, Some(2), S, string::sn),
    ("cp", 1, Some(1), O, string::cp),
    ("cs", 1, Some(1), O, string::cs),
    ("isc", 4, Some(4), O, string::isc),
    ("scn", 3, Some(3), O, string::scn),
    ("rrp", 1, Some(1), S, string::rrp),
    ("eos", 3, Some(3), O, string::eos),
    // ── Text ─────────────────────────────────────────────────────────────────
    ("gn", 2, Some(2), V, string::gn),
    ("zlc", 1, Some(1), V, string::zlc),
    ("zlcp", 1, Some(1), V, string::zlcp),
    ("flip", 1, Some(1), V, string::flip),
    ("norm", 1, Some(1), V, string::norm),
    // ── Classes ──────────────────────────────────────────────────────────────
    ("dcl", 2, Some(2), S, class::dcl),
    ("dncl", 2, Some(2), S, class::dncl),
    ("ecl", 1, ANY, S, class::ecl),
    ("ccl", 2, Some(2), O, class::ccl),
    ("scl", 2, Some(2), S, class::scl),
    ("tcl", 4, Some(4), O, class::tcl),
    ("classes", 0, Some(0), V, class::classes),
    // ── Arithmetic ───────────────────────────────────────────────────────────
    ("ad", 2, ANY, V, arith::ad),
    ("su", 2, Some(2), V, arith::su),
    ("mu", 2, ANY, V, arith::mu),
    ("dv", 2, Some(2), V, arith::dv),
    ("dvr", 2, Some(2), V, arith::dvr),
    ("abs", 1, Some(1), V, arith::abs),
    ("eq", 4, Some(4), O, arith::eq),
    ("gt", 4, Some(4), O, arith::gt),
    ("lt", 4, Some(4), O, arith::lt),
    ("eq?", 4, Some(4), O, arith::eq_text),
    ("gt?", 4, Some(4), O, arith::gt_text),
    ("lt?", 4, Some(4), O, arith::lt_text),
    // ── I/O ──────────────────────────────────────────────────────────────────
    ("ps", 1, Some(2), S, io::ps),
    ("rs", 0, Some(0), V, io::rs),
    ("psr", 1, Some(1), V, io::psr),
    ("cm", 1, Some(1), S, io::cm),
    ("include", 1, Some(1), V, io::include),
    // ── System ───────────────────────────────────────────────────────────────
    ("exit", 0, Some(1), S, sys::exit),
    ("time", 0, Some(0), V, sys::time),
    ("xtime", 0, Some(0), V, sys::xtime),
    ("ctime", 1, Some(1), V, sys::ctime),
    ("argc", 0, Some(0), V, sys::argc),
    ("argv", 1, Some(1), V, sys::argv),
    ("ttm", 1, ANY, O, sys::ttm),
];

/// Register every builtin.  The caller locks the dictionary afterwards.
pub fn register_all(dict: &mut Dictionary) {
    for &(name, min, max, disposition, func) in BUILTINS {
        dict.register(Function::builtin(name, min, max, disposition, func));
    }
}

// ── Argument helpers ──────────────────────────────────────────────────────────

/// Parse a decimal integer with an optional sign.
pub(crate) fn decimal(text: &str) -> Result<i64> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::NotDecimal(text.to_owned()));
    }
    text.parse().map_err(|_| Error::Overflow)
}

/// Parse a non-negative decimal count.
pub(crate) fn count(text: &str) -> Result<usize> {
    let n = decimal(text)?;
    usize::try_from(n).map_err(|_| Error::Negative(text.to_owned()))
}

#[cfg(test)]
pub(crate) fn eval(src: &str) -> Result<String> {
    crate::Ttm::with_streams(crate::stream::Streams::memory("").0).eval(src)
}
