//! System builtins: exit, clocks, program arguments and the `ttm`
//! control function.

use chrono::DateTime;

use super::decimal;
use crate::engine::{Frame, Ttm};
use crate::error::{Error, Result};

const CTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

pub(super) fn exit(t: &mut Ttm, f: &Frame, _: &mut String) -> Result<()> {
    let status = match f.arg(1) {
        "" => 0,
        code => {
            let value = decimal(code)?;
            i32::try_from(value).map_err(|_| Error::OutOfRange { name: "exit".into(), value })?
        }
    };
    t.request_halt(status);
    Ok(())
}

/// Centiseconds since the Unix epoch.
pub(super) fn time(_: &mut Ttm, _: &Frame, out: &mut String) -> Result<()> {
    out.push_str(&(chrono::Utc::now().timestamp_millis() / 10).to_string());
    Ok(())
}

/// Centiseconds since the interpreter was created.
pub(super) fn xtime(t: &mut Ttm, _: &Frame, out: &mut String) -> Result<()> {
    out.push_str(&(t.elapsed().as_millis() / 10).to_string());
    Ok(())
}

/// Render a centisecond timestamp, in UTC.
pub(super) fn ctime(_: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    let value = decimal(f.arg(1))?;
    let secs = value.div_euclid(100);
    let nanos = u32::try_from(value.rem_euclid(100) * 10_000_000).unwrap_or(0);
    let stamp = DateTime::from_timestamp(secs, nanos)
        .ok_or_else(|| Error::OutOfRange { name: "ctime".into(), value })?;
    out.push_str(&stamp.format(CTIME_FORMAT).to_string());
    Ok(())
}

pub(super) fn argc(t: &mut Ttm, _: &Frame, out: &mut String) -> Result<()> {
    out.push_str(&t.args.len().to_string());
    Ok(())
}

pub(super) fn argv(t: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    let index = decimal(f.arg(1))?;
    let arg = usize::try_from(index)
        .ok()
        .and_then(|i| t.args.get(i))
        .ok_or(Error::BadIndex { index, len: t.args.len() })?;
    out.push_str(arg);
    Ok(())
}

// ── ttm ───────────────────────────────────────────────────────────────────────

/// `ttm;meta;chars`, `ttm;info;name|class;...`, `ttm;prop;name[;value]`,
/// `ttm;reset`.
pub(super) fn ttm(t: &mut Ttm, f: &Frame, out: &mut String) -> Result<()> {
    match f.arg(1) {
        "meta" => t.meta.rebind(f.arg(2)),
        "info" => info(t, f, out),
        "prop" if f.argc() < 2 => {
            let listing: Vec<String> =
                t.props.list().into_iter().map(|(name, value)| format!("{name}={value}")).collect();
            out.push_str(&listing.join("\n"));
            Ok(())
        }
        "prop" => {
            let name = f.arg(2);
            if f.argc() >= 3 {
                t.set_prop(name, decimal(f.arg(3))?)
            } else {
                out.push_str(&t.props.get(name)?.to_string());
                Ok(())
            }
        }
        "reset" => {
            t.reset_props();
            Ok(())
        }
        other => Err(Error::UndefinedName(format!("ttm;{other}"))),
    }
}

fn info(t: &Ttm, f: &Frame, out: &mut String) -> Result<()> {
    let names = f.rest().get(2..).unwrap_or(&[]);
    let lines = match f.arg(2) {
        "name" => names
            .iter()
            .map(|n| {
                t.dict
                    .function(n)
                    .map(|func| func.info())
                    .ok_or_else(|| Error::UndefinedName(n.clone()))
            })
            .collect::<Result<Vec<_>>>()?,
        "class" => names
            .iter()
            .map(|n| t.dict.class(n).map(|c| c.info()))
            .collect::<Result<Vec<_>>>()?,
        other => return Err(Error::UndefinedName(format!("ttm;info;{other}"))),
    };
    out.push_str(&lines.join("\n"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::builtins::eval;
    use crate::engine::Meta;
    use crate::error::{Error, ErrorKind};
    use crate::stream::Streams;
    use crate::Ttm;

    fn ttm() -> Ttm {
        Ttm::with_streams(Streams::memory("").0)
    }

    #[test]
    fn exit_status() {
        assert_eq!(ttm().evaluate("#<exit>").unwrap().exit, Some(0));
        assert_eq!(ttm().evaluate("#<exit;7>").unwrap().exit, Some(7));
        assert!(matches!(eval("#<exit;99999999999>"), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn clocks_are_decimal() {
        let now: i64 = eval("#<time>").unwrap().parse().unwrap();
        assert!(now > 160_000_000_000);
        let since: i64 = eval("#<xtime>").unwrap().parse().unwrap();
        assert!(since >= 0);
    }

    #[test]
    fn ctime_renders_utc() {
        assert_eq!(eval("#<ctime;0>").unwrap(), "Thu Jan  1 00:00:00 1970");
        assert_eq!(eval("#<ctime;8640000>").unwrap(), "Fri Jan  2 00:00:00 1970");
    }

    #[test]
    fn program_arguments() {
        let mut t = ttm();
        t.args = vec!["one".into(), "two".into()];
        assert_eq!(t.eval("#<argc>:#<argv;1>").unwrap(), "2:two");
        assert_eq!(t.eval("#<argv;2>"), Err(Error::BadIndex { index: 2, len: 2 }));
        assert_eq!(t.eval("#<argv;-1>").unwrap_err().kind(), ErrorKind::Numeric);
    }

    #[test]
    fn rebind_meta() {
        let mut t = ttm();
        assert_eq!(t.eval("#<ttm;meta;$[,]>$[ad,1,2]").unwrap(), "3");
        assert_eq!(t.meta.control(), "$[,]");
        t.eval("$[ttm,meta,#<;>]").unwrap();
        assert_eq!(t.meta, Meta::default());
    }

    #[test]
    fn info_tuples() {
        let src = "#<ds;f;x>#<ttm;info;name;ds;f;abs>";
        assert_eq!(eval(src).unwrap(), "ds,2,2,S\nf,0,*,V\nabs,1,1,V");
        let src = "#<dncl;c;xy>#<ttm;info;class;c>";
        assert_eq!(eval(src).unwrap(), "c,xy,1");
        assert_eq!(
            eval("#<ttm;info;name;nope>"),
            Err(Error::UndefinedName("nope".into()))
        );
    }

    #[test]
    fn properties() {
        let mut t = ttm();
        assert_eq!(t.eval("#<ttm;prop;stacksize>").unwrap(), "64");
        t.eval("#<ttm;prop;stacksize;10>").unwrap();
        assert_eq!(t.props.stack_size(), 10);
        assert_eq!(t.eval("#<ttm;prop;stacksize;0>").unwrap_err().kind(), ErrorKind::Policy);
        assert_eq!(t.eval("#<ttm;prop;bogus>").unwrap_err().kind(), ErrorKind::Lookup);
        assert_eq!(t.eval("#<ttm;prop;echo;x>").unwrap_err().kind(), ErrorKind::Numeric);
        t.eval("#<ttm;reset>").unwrap();
        assert_eq!(t.props.stack_size(), 64);
    }

    #[test]
    fn property_listing() {
        let mut t = ttm();
        t.eval("#<ttm;prop;echo;1>").unwrap();
        assert_eq!(
            t.eval("#<ttm;prop>").unwrap(),
            "echo=1\nexeccount=100000\nshowfinal=1\nstacksize=64"
        );
    }

    #[test]
    fn unknown_subcommand() {
        assert_eq!(eval("#<ttm;frob>"), Err(Error::UndefinedName("ttm;frob".into())));
    }
}
