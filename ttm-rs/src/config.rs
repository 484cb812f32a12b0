//! `ttmrc` startup file.
//!
//! A plain list of property settings applied before the command line:
//!
//! ```text
//! # comment
//! stacksize = 128
//! execcount=500000
//! ```
//!
//! Malformed lines and unknown or out-of-range properties are collected as
//! [`ConfigError`]s; they never stop the interpreter from starting.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::builtins::decimal;
use crate::error::{Error, Result};
use crate::props::Properties;

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading the rc file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// One `name=value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub line: usize,
    pub name: String,
    pub value: i64,
}

/// Parse rc text into settings plus the lines that could not be parsed.
pub fn parse(text: &str) -> (Vec<Setting>, Vec<ConfigError>) {
    let mut settings = Vec::new();
    let mut errors = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let body = raw.split_once('#').map_or(raw, |(before, _)| before).trim();
        if body.is_empty() {
            continue;
        }
        let Some((name, value)) = body.split_once('=') else {
            errors.push(ConfigError { line, message: format!("expected name=value: '{body}'") });
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            errors.push(ConfigError { line, message: "missing property name".into() });
            continue;
        }
        match decimal(value.trim()) {
            Ok(value) => settings.push(Setting { line, name: name.to_owned(), value }),
            Err(e) => errors.push(ConfigError { line, message: e.to_string() }),
        }
    }

    (settings, errors)
}

/// Apply parsed settings in order.  Rejected settings are reported and
/// skipped.
pub fn apply(props: &mut Properties, settings: &[Setting]) -> Vec<ConfigError> {
    settings
        .iter()
        .filter_map(|s| {
            props
                .set(&s.name, s.value)
                .err()
                .map(|e| ConfigError { line: s.line, message: e.to_string() })
        })
        .collect()
}

/// Read, parse and apply an rc file.
pub fn load(path: &Path, props: &mut Properties) -> Result<Vec<ConfigError>> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path.display().to_string(), e))?;
    let (settings, mut errors) = parse(&text);
    errors.extend(apply(props, &settings));
    errors.sort_by_key(|e| e.line);
    Ok(errors)
}

// ── Search ────────────────────────────────────────────────────────────────────

/// Locations tried in order: `$TTMRC`, `<config dir>/ttm/ttmrc`, `./.ttmrc`.
pub fn candidates(env_override: Option<PathBuf>) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = env_override.into_iter().collect();
    if let Some(dirs) = BaseDirs::new() {
        paths.push(dirs.config_dir().join("ttm").join("ttmrc"));
    }
    paths.push(PathBuf::from("./.ttmrc"));
    paths
}

/// The first existing rc file, if any.
pub fn find_rc() -> Option<PathBuf> {
    let env_override = std::env::var_os("TTMRC").map(PathBuf::from);
    candidates(env_override).into_iter().find(|p| p.is_file())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn parse_settings_and_comments() {
        let text = "# header\n\nstacksize = 8\nexeccount=100 # trailing\n";
        let (settings, errors) = parse(text);
        assert!(errors.is_empty());
        assert_eq!(
            settings,
            vec![
                Setting { line: 3, name: "stacksize".into(), value: 8 },
                Setting { line: 4, name: "execcount".into(), value: 100 },
            ]
        );
    }

    #[test]
    fn malformed_lines_are_reported() {
        let (settings, errors) = parse("junk\n=4\necho=yes\nshowfinal=0\n");
        assert_eq!(settings.len(), 1);
        let lines: Vec<usize> = errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
        assert!(errors[2].to_string().starts_with("line 3: not a decimal number"));
    }

    #[test]
    fn apply_reports_rejected_properties() {
        let mut props = Properties::new();
        let (settings, _) = parse("bogus=1\nstacksize=0\nstacksize=12\n");
        let errors = apply(&mut props, &settings);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("unknown property"));
        assert_eq!(props.stack_size(), 12);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "showfinal=0\nnope\n").unwrap();
        let mut props = Properties::new();
        let errors = load(file.path(), &mut props).unwrap();
        assert_eq!(errors.len(), 1);
        assert!(!props.show_final());
        assert!(load(Path::new("/no/such/ttmrc"), &mut props).is_err());
    }

    #[test]
    fn search_order() {
        let paths = candidates(Some(PathBuf::from("/tmp/custom")));
        assert_eq!(paths.first(), Some(&PathBuf::from("/tmp/custom")));
        assert_eq!(paths.last(), Some(&PathBuf::from("./.ttmrc")));
        assert_eq!(candidates(None).last(), Some(&PathBuf::from("./.ttmrc")));
    }
}
