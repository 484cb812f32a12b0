//! Command-line argument parsing.
//!
//! Usage:
//!   ttm [OPTIONS] [FILE] [-- ARGS...]

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::builtins::decimal;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "ttm",
    version,
    about = "TTM macro-expansion language interpreter",
    long_about = None
)]
pub struct CliArgs {
    /// Program to run; `-` or absent reads stdin
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Evaluate TEXT instead of a file (repeatable, run in order)
    #[arg(short = 'e', long = "expr", value_name = "TEXT")]
    pub exprs: Vec<String>,

    /// After the program, read further programs from stdin
    #[arg(short, long)]
    pub interactive: bool,

    /// Send printed and final output to PATH
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Take `rs` input from PATH
    #[arg(short, long, value_name = "PATH")]
    pub rsfile: Option<PathBuf>,

    /// Set a property, after the rc file is applied
    #[arg(short = 'p', long = "prop", value_name = "NAME=VALUE", value_parser = parse_prop)]
    pub props: Vec<(String, i64)>,

    /// Trace every call
    #[arg(short = 'T', long)]
    pub trace: bool,

    /// Do not print the final text of each program
    #[arg(short, long)]
    pub quiet: bool,

    /// Skip the rc file
    #[arg(long)]
    pub norc: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Arguments exposed to programs through `argc` and `argv`
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

/// Where the program text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Exprs(Vec<String>),
    File(PathBuf),
    Stdin,
}

impl CliArgs {
    pub fn source(&self) -> Source {
        if !self.exprs.is_empty() {
            return Source::Exprs(self.exprs.clone());
        }
        match &self.file {
            Some(path) if path != Path::new("-") => Source::File(path.clone()),
            _ => Source::Stdin,
        }
    }
}

/// `NAME=VALUE` with a decimal value.
fn parse_prop(s: &str) -> Result<(String, i64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("empty property name".to_owned());
    }
    let value = decimal(value.trim()).map_err(|e| e.to_string())?;
    Ok((name.to_owned(), value))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("ttm").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn empty_args_read_stdin() {
        let a = parse(&[]);
        assert_eq!(a.source(), Source::Stdin);
        assert!(!a.interactive && !a.quiet && !a.norc);
    }

    #[test]
    fn file_and_dash() {
        assert_eq!(parse(&["prog.ttm"]).source(), Source::File("prog.ttm".into()));
        assert_eq!(parse(&["-"]).source(), Source::Stdin);
    }

    #[test]
    fn exprs_win_over_file() {
        let a = parse(&["-e", "one", "--expr", "two", "prog.ttm"]);
        assert_eq!(a.source(), Source::Exprs(vec!["one".into(), "two".into()]));
    }

    #[test]
    fn props_are_parsed() {
        let a = parse(&["-p", "stacksize=8", "--prop", "echo = 1"]);
        assert_eq!(a.props, vec![("stacksize".into(), 8), ("echo".into(), 1)]);
    }

    #[test]
    fn bad_prop_is_rejected() {
        for bad in ["stacksize", "=3", "stacksize=x"] {
            let r = CliArgs::try_parse_from(["ttm", "-p", bad]);
            assert!(r.is_err(), "{bad}");
        }
    }

    #[test]
    fn flags() {
        let a = parse(&["-i", "-T", "-q", "-v", "--norc", "-o", "out.txt", "-r", "in.txt"]);
        assert!(a.interactive && a.trace && a.quiet && a.verbose && a.norc);
        assert_eq!(a.output, Some(PathBuf::from("out.txt")));
        assert_eq!(a.rsfile, Some(PathBuf::from("in.txt")));
    }

    #[test]
    fn trailing_program_args() {
        let a = parse(&["prog.ttm", "--", "x", "-y"]);
        assert_eq!(a.args, vec!["x", "-y"]);
        assert_eq!(a.source(), Source::File("prog.ttm".into()));
    }

    #[test]
    fn unknown_flag() {
        assert!(CliArgs::try_parse_from(["ttm", "-z"]).is_err());
    }
}
