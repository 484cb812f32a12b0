use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use ttm::cli::{CliArgs, Source};
use ttm::config;
use ttm::props::SHOWFINAL;
use ttm::stream::{Mode, Stream, Streams};
use ttm::Ttm;

const DEFAULT_FILTER: &str = "warn,ttm::trace=info";

fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(status) => ExitCode::from((status & 0xff) as u8),
        Err(e) => {
            eprintln!("ttm: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// `TTM_LOG`, then `RUST_LOG`, then the built-in default.
fn init_logging(verbose: bool) {
    let filter = std::env::var("TTM_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .and_then(|expr| EnvFilter::try_new(expr).ok())
        .unwrap_or_else(|| EnvFilter::new(if verbose { "debug" } else { DEFAULT_FILTER }));

    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .try_init();
}

fn run(args: CliArgs) -> Result<i32> {
    let mut streams = Streams::standard();
    if let Some(path) = &args.output {
        streams.stdout = Stream::open(path, Mode::Write)
            .with_context(|| format!("cannot open output {}", path.display()))?;
    }
    if let Some(path) = &args.rsfile {
        streams.rs_input = Some(
            Stream::open(path, Mode::Read)
                .with_context(|| format!("cannot open input {}", path.display()))?,
        );
    }

    let mut ttm = Ttm::with_streams(streams);
    ttm.args = args.args.clone();
    ttm.trace_all = args.trace;

    // ── Properties: defaults, then rc file, then flags ────────────────────────
    if !args.norc {
        if let Some(path) = config::find_rc() {
            debug!(path = %path.display(), "loading rc file");
            for e in config::load(&path, &mut ttm.props)? {
                warn!("{}: {e}", path.display());
            }
        }
    }
    for (name, value) in &args.props {
        ttm.set_prop(name, *value)
            .with_context(|| format!("--prop {name}={value}"))?;
    }
    if args.quiet {
        ttm.set_prop(SHOWFINAL, 0)?;
    }

    let stdin_is_tty = unsafe { libc::isatty(libc::STDIN_FILENO) != 0 };
    let source = args.source();
    let interactive = args.interactive || (source == Source::Stdin && stdin_is_tty);

    let programs = match source {
        Source::Exprs(exprs) => exprs,
        Source::File(path) => vec![std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?],
        Source::Stdin if interactive => Vec::new(),
        Source::Stdin => vec![io::read_to_string(io::stdin()).context("cannot read stdin")?],
    };

    // ── Evaluate ──────────────────────────────────────────────────────────────
    for program in &programs {
        match ttm.run(program) {
            Ok(Some(status)) => return finish(&mut ttm, status),
            Ok(None) => {}
            Err(failure) => {
                eprintln!("ttm: {failure}");
                finish(&mut ttm, 1)?;
                return Ok(1);
            }
        }
    }

    let status = if interactive { ttm.interact()? } else { 0 };
    finish(&mut ttm, status)
}

fn finish(ttm: &mut Ttm, status: i32) -> Result<i32> {
    ttm.streams.stdout.close()?;
    Ok(status)
}
