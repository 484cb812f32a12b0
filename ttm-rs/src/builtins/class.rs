//! Character-class builtins.

use crate::engine::{Frame, Ttm};
use crate::error::Result;

pub(super) fn dcl(t: &mut Ttm, f: &Frame, _: &mut String) -> Result<()> {
    t.dict.define_class(f.arg(1), f.arg(2), false);
    Ok(())
}

pub(super) fn dncl(t: &mut Ttm, f: &Frame, _: &mut String) -> Result<()> {
    t.dict.define_class(f.arg(1), f.arg(2), true);
    Ok(())
}

pub(super) fn ecl(t: &mut Ttm, f: &Frame, _: &mut String) -> Result<()> {
    for name in f.rest() {
        t.dict.erase_class(name);
    }
    Ok(())
}

/// `ccl;class;name`: read characters of `name` while they are in `class`.
pub(super) fn ccl(t: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    let class = t.dict.class(f.arg(1))?.clone();
    let text = &mut t.dict.defined_mut(f.arg(2))?.text;
    out.push_str(&text.take_while(|c| class.contains(c))?);
    Ok(())
}

pub(super) fn scl(t: &mut Ttm, f: &Frame, _: &mut String) -> Result<()> {
    let class = t.dict.class(f.arg(1))?.clone();
    t.dict
        .defined_mut(f.arg(2))?
        .text
        .skip_while(|c| class.contains(c))
}

/// `tcl;class;name;t;f`: `t` if the next character of `name` is in `class`.
pub(super) fn tcl(t: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    let class = t.dict.class(f.arg(1))?;
    let next = t.dict.defined(f.arg(2))?.text.peek_char()?;
    let hit = next.is_some_and(|c| class.contains(c));
    out.push_str(if hit { f.arg(3) } else { f.arg(4) });
    Ok(())
}

pub(super) fn classes(t: &mut Ttm, _: &Frame, out: &mut String) -> Result<()> {
    out.push_str(&t.dict.class_names().join(","));
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::builtins::eval;
    use crate::error::Error;

    const DIGITS: &str = "#<dcl;digit;0123456789>";

    #[test]
    fn read_while_in_class() {
        let src = format!("{DIGITS}#<ds;s;123abc>#<ccl;digit;s>|#<cn;s;9>");
        assert_eq!(eval(&src).unwrap(), "123|abc");
    }

    #[test]
    fn skip_while_in_class() {
        let src = format!("{DIGITS}#<ds;s;42x>#<scl;digit;s>#<cc;s>");
        assert_eq!(eval(&src).unwrap(), "x");
    }

    #[test]
    fn negative_class() {
        let src = "#<dncl;nondigit;0123456789>#<ds;s;ab7>#<ccl;nondigit;s>";
        assert_eq!(eval(src).unwrap(), "ab");
    }

    #[test]
    fn test_next_char() {
        let src = format!("{DIGITS}#<ds;s;1a>#<tcl;digit;s;D;N>#<sn;s;1>#<tcl;digit;s;D;N>");
        assert_eq!(eval(&src).unwrap(), "DN");
        let src = format!("{DIGITS}#<ds;s;>#<tcl;digit;s;D;N>");
        assert_eq!(eval(&src).unwrap(), "N");
    }

    #[test]
    fn listing_and_erasing() {
        let src = format!("{DIGITS}#<dcl;alpha;ab>#<classes>|#<ecl;digit;none>#<classes>");
        assert_eq!(eval(&src).unwrap(), "alpha,digit|alpha");
    }

    #[test]
    fn undefined_class() {
        assert_eq!(
            eval("#<ds;s;x>#<ccl;nope;s>"),
            Err(Error::UndefinedClass("nope".into()))
        );
    }
}
