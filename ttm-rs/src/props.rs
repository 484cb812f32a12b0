//! Interpreter properties.
//!
//! A small set of named integer tunables kept in a [`SymbolTable`]: the
//! frame-depth limit, the per-evaluation call budget and the output-echo
//! flags.  Each property has a default and an allowed range; `reset`
//! restores every default.

use crate::error::{Error, Result};
use crate::symtab::SymbolTable;

pub const STACKSIZE: &str = "stacksize";
pub const EXECCOUNT: &str = "execcount";
pub const SHOWFINAL: &str = "showfinal";
pub const ECHO: &str = "echo";

/// Hard ceiling on the frame-depth limit; deeper recursion would risk the
/// host stack.
pub const MAX_STACKSIZE: i64 = 4096;

#[derive(Debug, Clone, Copy)]
struct Property {
    value: i64,
    default: i64,
    min: i64,
    max: i64,
}

const DEFAULTS: &[(&str, i64, i64, i64)] = &[
    (STACKSIZE, 64, 1, MAX_STACKSIZE),
    (EXECCOUNT, 100_000, 1, i64::MAX),
    (SHOWFINAL, 1, 0, 1),
    (ECHO, 0, 0, 1),
];

#[derive(Debug, Clone)]
pub struct Properties {
    table: SymbolTable<Property>,
}

impl Default for Properties {
    fn default() -> Self {
        Self::new()
    }
}

impl Properties {
    pub fn new() -> Self {
        let mut table = SymbolTable::new();
        for &(name, default, min, max) in DEFAULTS {
            table.insert(name, Property { value: default, default, min, max });
        }
        Self { table }
    }

    pub fn get(&self, name: &str) -> Result<i64> {
        self.table
            .get(name)
            .map(|p| p.value)
            .ok_or_else(|| Error::UnknownProperty(name.to_owned()))
    }

    pub fn set(&mut self, name: &str, value: i64) -> Result<()> {
        let prop = self
            .table
            .get_mut(name)
            .ok_or_else(|| Error::UnknownProperty(name.to_owned()))?;
        if !(prop.min..=prop.max).contains(&value) {
            return Err(Error::OutOfRange { name: name.to_owned(), value });
        }
        prop.value = value;
        Ok(())
    }

    /// Restore every property to its default.
    pub fn reset(&mut self) {
        for (_, prop) in self.table.iter_mut() {
            prop.value = prop.default;
        }
    }

    /// Sorted `(name, value)` pairs.
    pub fn list(&self) -> Vec<(String, i64)> {
        self.table
            .sorted_names(|_| true)
            .into_iter()
            .filter_map(|n| self.table.get(&n).map(|p| (n.clone(), p.value)))
            .collect()
    }

    fn value(&self, name: &str) -> i64 {
        self.table.get(name).map_or(0, |p| p.value)
    }

    pub fn stack_size(&self) -> usize {
        usize::try_from(self.value(STACKSIZE)).unwrap_or(0)
    }

    pub fn exec_count(&self) -> u64 {
        u64::try_from(self.value(EXECCOUNT)).unwrap_or(0)
    }

    pub fn show_final(&self) -> bool {
        self.value(SHOWFINAL) != 0
    }

    pub fn echo(&self) -> bool {
        self.value(ECHO) != 0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p = Properties::new();
        assert_eq!(p.stack_size(), 64);
        assert_eq!(p.exec_count(), 100_000);
        assert!(p.show_final());
        assert!(!p.echo());
    }

    #[test]
    fn set_and_get() {
        let mut p = Properties::new();
        p.set(STACKSIZE, 8).unwrap();
        assert_eq!(p.get(STACKSIZE).unwrap(), 8);
        assert_eq!(p.stack_size(), 8);
    }

    #[test]
    fn unknown_name() {
        let mut p = Properties::new();
        assert_eq!(p.get("nope"), Err(Error::UnknownProperty("nope".into())));
        assert!(p.set("nope", 1).is_err());
    }

    #[test]
    fn range_is_enforced() {
        let mut p = Properties::new();
        assert!(matches!(p.set(STACKSIZE, 0), Err(Error::OutOfRange { .. })));
        assert!(matches!(
            p.set(STACKSIZE, MAX_STACKSIZE + 1),
            Err(Error::OutOfRange { .. })
        ));
        assert!(p.set(SHOWFINAL, 2).is_err());
        assert_eq!(p.stack_size(), 64);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut p = Properties::new();
        p.set(EXECCOUNT, 5).unwrap();
        p.set(ECHO, 1).unwrap();
        p.reset();
        assert_eq!(p.exec_count(), 100_000);
        assert!(!p.echo());
    }

    #[test]
    fn list_is_sorted() {
        let names: Vec<String> = Properties::new().list().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["echo", "execcount", "showfinal", "stacksize"]);
    }
}
