//! Integer arithmetic and comparisons.
//!
//! Operands are signed decimal text; every operation is checked and
//! reports overflow instead of wrapping.

use std::cmp::Ordering;

use super::decimal;
use crate::engine::{Frame, Ttm};
use crate::error::{Error, Result};

fn operands(f: &Frame) -> Result<Vec<i64>> {
    f.rest().iter().map(|a| decimal(a)).collect()
}

fn fold(f: &Frame, op: fn(i64, i64) -> Option<i64>, out: &mut String) -> Result<()> {
    let mut values = operands(f)?.into_iter();
    let first = values.next().unwrap_or(0);
    let total = values.try_fold(first, |acc, v| op(acc, v).ok_or(Error::Overflow))?;
    out.push_str(&total.to_string());
    Ok(())
}

fn binary(f: &Frame) -> Result<(i64, i64)> {
    Ok((decimal(f.arg(1))?, decimal(f.arg(2))?))
}

pub(super) fn ad(_: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    fold(f, i64::checked_add, out)
}

pub(super) fn su(_: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    let (a, b) = binary(f)?;
    out.push_str(&a.checked_sub(b).ok_or(Error::Overflow)?.to_string());
    Ok(())
}

pub(super) fn mu(_: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    fold(f, i64::checked_mul, out)
}

/// Truncating division.
pub(super) fn dv(_: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    let (a, b) = binary(f)?;
    if b == 0 {
        return Err(Error::DivideByZero);
    }
    out.push_str(&a.checked_div(b).ok_or(Error::Overflow)?.to_string());
    Ok(())
}

pub(super) fn dvr(_: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    let (a, b) = binary(f)?;
    if b == 0 {
        return Err(Error::DivideByZero);
    }
    out.push_str(&a.checked_rem(b).ok_or(Error::Overflow)?.to_string());
    Ok(())
}

pub(super) fn abs(_: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    let a = decimal(f.arg(1))?;
    out.push_str(&a.checked_abs().ok_or(Error::Overflow)?.to_string());
    Ok(())
}

// ── Comparisons ───────────────────────────────────────────────────────────────
//
// `op;a;b;t;f` yields `t` when the relation holds and `f` otherwise.

fn numeric(f: &Frame, want: Ordering, out: &mut String) -> Result<()> {
    let (a, b) = binary(f)?;
    out.push_str(if a.cmp(&b) == want { f.arg(3) } else { f.arg(4) });
    Ok(())
}

fn textual(f: &Frame, want: Ordering, out: &mut String) -> Result<()> {
    let ord = f.arg(1).as_bytes().cmp(f.arg(2).as_bytes());
    out.push_str(if ord == want { f.arg(3) } else { f.arg(4) });
    Ok(())
}

pub(super) fn eq(_: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    numeric(f, Ordering::Equal, out)
}

pub(super) fn gt(_: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    numeric(f, Ordering::Greater, out)
}

pub(super) fn lt(_: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    numeric(f, Ordering::Less, out)
}

pub(super) fn eq_text(_: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    textual(f, Ordering::Equal, out)
}

pub(super) fn gt_text(_: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    textual(f, Ordering::Greater, out)
}

pub(super) fn lt_text(_: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    textual(f, Ordering::Less, out)
}

#[cfg(test)]
mod tests {
    use crate::builtins::eval;
    use crate::error::{Error, ErrorKind};

    #[test]
    fn add_and_multiply_many() {
        assert_eq!(eval("#<ad;1;2;3;-4>").unwrap(), "2");
        assert_eq!(eval("#<mu;2;3;-4>").unwrap(), "-24");
    }

    #[test]
    fn subtract_takes_two_operands() {
        assert_eq!(eval("#<su;10;+3>").unwrap(), "7");
        assert_eq!(eval("#<su;10;3;2>").unwrap(), "7");
        assert!(matches!(eval("#<su;-3>"), Err(Error::TooFewArgs { .. })));
    }

    #[test]
    fn division_truncates() {
        assert_eq!(eval("#<dv;7;2>").unwrap(), "3");
        assert_eq!(eval("#<dv;-7;2>").unwrap(), "-3");
        assert_eq!(eval("#<dvr;-7;2>").unwrap(), "-1");
        assert_eq!(eval("#<dv;1;0>"), Err(Error::DivideByZero));
        assert_eq!(eval("#<dvr;1;0>"), Err(Error::DivideByZero));
    }

    #[test]
    fn overflow_is_reported() {
        let max = i64::MAX;
        assert_eq!(eval(&format!("#<ad;{max};1>")), Err(Error::Overflow));
        assert_eq!(eval(&format!("#<abs;{}>", i64::MIN)), Err(Error::Overflow));
        assert_eq!(eval(&format!("#<dv;{};-1>", i64::MIN)), Err(Error::Overflow));
    }

    #[test]
    fn abs_value() {
        assert_eq!(eval("#<abs;-5>").unwrap(), "5");
    }

    #[test]
    fn non_decimal_operand() {
        let err = eval("#<ad;1;x>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Numeric);
    }

    #[test]
    fn numeric_comparisons() {
        assert_eq!(eval("#<eq;3;03;Y;N>").unwrap(), "Y");
        assert_eq!(eval("#<gt;10;9;Y;N>").unwrap(), "Y");
        assert_eq!(eval("#<lt;10;9;Y;N>").unwrap(), "N");
    }

    #[test]
    fn text_comparisons() {
        assert_eq!(eval("#<eq?;3;03;Y;N>").unwrap(), "N");
        assert_eq!(eval("#<gt?;10;9;Y;N>").unwrap(), "N");
        assert_eq!(eval("#<lt?;abc;abd;Y;N>").unwrap(), "Y");
    }
}
