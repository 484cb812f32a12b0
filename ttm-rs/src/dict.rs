//! The dictionary: functions and character classes.
//!
//! A function is either a builtin (a Rust function registered at startup) or
//! a defined string.  A defined string's body is a [`Buffer`] whose cursor is
//! the string's residual pointer; segment and creation marks are embedded in
//! it by the segmenting operations.

use tracing::debug;

use crate::buffer::Buffer;
use crate::codec::{self, Unit};
use crate::engine::{Frame, Ttm};
use crate::error::{Error, Result};
use crate::symtab::SymbolTable;

/// Signature of a builtin.  Output is appended to the accumulator; the
/// caller decides whether it is used.
pub type BuiltinFn = fn(&mut Ttm, &Frame, &mut String) -> Result<()>;

// ── Function ──────────────────────────────────────────────────────────────────

/// What happens to the text a function produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Called for its side effects; output is discarded.
    SideEffect,
    /// Always produces a value.
    Value,
    /// Produces a value depending on its arguments (possibly empty).
    Optional,
}

impl Disposition {
    /// Single-letter code used by `ttm;info`.
    pub fn code(self) -> char {
        match self {
            Disposition::SideEffect => 'S',
            Disposition::Value => 'V',
            Disposition::Optional => 'O',
        }
    }
}

/// Body and bookkeeping of a defined string.
#[derive(Debug, Clone, Default)]
pub struct Defined {
    /// Text with embedded marks; its cursor is the residual pointer.
    pub text: Buffer,
    /// Number of segment indices handed out so far.
    pub next_segment: u8,
}

impl Defined {
    pub fn new(text: &str) -> Self {
        Self { text: Buffer::from(text), next_segment: 0 }
    }

    /// Replace every occurrence of each pattern, from the residual pointer
    /// on, with the next segment mark.  Returns the number of replacements.
    ///
    /// Each pattern consumes one index even when it does not occur, so the
    /// `n`th pattern of a single call always maps to the same argument.
    pub fn segment(&mut self, name: &str, patterns: &[String]) -> Result<usize> {
        let mut count = 0;
        for pattern in patterns {
            let index = usize::from(self.next_segment) + 1;
            let unit = codec::segment(index)
                .ok_or_else(|| Error::TooManySegments { name: name.to_owned() })?;
            self.next_segment += 1;
            count += self.replace(pattern.as_bytes(), unit);
        }
        Ok(count)
    }

    /// Replace occurrences of `pattern` from the residual pointer on with a
    /// creation mark.
    pub fn mark_creation(&mut self, pattern: &str) -> usize {
        self.replace(pattern.as_bytes(), Unit::Create)
    }

    fn replace(&mut self, pattern: &[u8], unit: Unit) -> usize {
        if pattern.is_empty() {
            return 0;
        }
        let residual = self.text.index();
        let bytes = self.text.as_bytes();
        let mut out = bytes[..residual].to_vec();
        let mut pos = residual;
        let mut count = 0;
        while let Some(hit) = codec::find(bytes, pattern, pos) {
            out.extend_from_slice(&bytes[pos..hit]);
            codec::encode(unit, &mut out);
            pos = hit + pattern.len();
            count += 1;
        }
        if count > 0 {
            out.extend_from_slice(&bytes[pos..]);
            self.text = Buffer::from_bytes(out);
            self.text.set_index(residual);
        }
        count
    }
}

#[derive(Clone)]
pub enum FunctionKind {
    Builtin(BuiltinFn),
    Defined(Defined),
}

impl std::fmt::Debug for FunctionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FunctionKind::Builtin(_) => f.write_str("Builtin"),
            FunctionKind::Defined(body) => f.debug_tuple("Defined").field(body).finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub kind: FunctionKind,
    pub trace: bool,
    pub locked: bool,
    pub min_args: usize,
    /// `None` means no upper bound.
    pub max_args: Option<usize>,
    pub disposition: Disposition,
}

impl Function {
    pub fn builtin(
        name: &str,
        min_args: usize,
        max_args: Option<usize>,
        disposition: Disposition,
        func: BuiltinFn,
    ) -> Self {
        Self {
            name: name.to_owned(),
            kind: FunctionKind::Builtin(func),
            trace: false,
            locked: false,
            min_args,
            max_args,
            disposition,
        }
    }

    pub fn defined(name: &str, text: &str) -> Self {
        Self {
            name: name.to_owned(),
            kind: FunctionKind::Defined(Defined::new(text)),
            trace: false,
            locked: false,
            min_args: 0,
            max_args: None,
            disposition: Disposition::Value,
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.kind, FunctionKind::Builtin(_))
    }

    /// `name,minargs,maxargs,disposition`, with `*` for no maximum.
    pub fn info(&self) -> String {
        let max = self.max_args.map_or_else(|| "*".to_owned(), |m| m.to_string());
        format!("{},{},{},{}", self.name, self.min_args, max, self.disposition.code())
    }
}

// ── Character classes ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    pub name: String,
    pub chars: String,
    /// A negative class matches every character *not* listed.
    pub negative: bool,
}

impl CharClass {
    pub fn contains(&self, c: char) -> bool {
        self.chars.contains(c) != self.negative
    }

    /// `name,chars,negative`.
    pub fn info(&self) -> String {
        format!("{},{},{}", self.name, self.chars, u8::from(self.negative))
    }
}

// ── Dictionary ────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Dictionary {
    functions: SymbolTable<Function>,
    classes: SymbolTable<CharClass>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn function_mut(&mut self, name: &str) -> Result<&mut Function> {
        self.functions
            .get_mut(name)
            .ok_or_else(|| Error::UndefinedName(name.to_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Register a builtin at startup.
    pub fn register(&mut self, function: Function) {
        self.functions.insert(function.name.clone(), function);
    }

    /// Define (or redefine) `name` with body `text`.
    pub fn define(&mut self, name: &str, text: &str) -> Result<()> {
        let loc = self.functions.locate(name);
        if let Some(existing) = self.functions.get(name) {
            if existing.locked {
                return Err(Error::Locked(name.to_owned()));
            }
        }
        debug!(name, len = text.len(), "define");
        self.functions.insert_at(loc, name.to_owned(), Function::defined(name, text));
        Ok(())
    }

    /// Append to `name`'s body, defining it if absent.  The residual pointer
    /// moves to the new end.
    pub fn append(&mut self, name: &str, text: &str) -> Result<()> {
        if !self.functions.contains(name) {
            self.define(name, "")?;
        }
        let body = self.defined_mut(name)?;
        body.text.append(text.as_bytes());
        let end = body.text.len();
        body.text.set_index(end);
        Ok(())
    }

    /// Make `new` a copy of `old`'s body, marks and residual pointer included.
    pub fn copy(&mut self, new: &str, old: &str) -> Result<()> {
        let body = self.defined(old)?.clone();
        self.define(new, "")?;
        *self.defined_mut(new)? = body;
        Ok(())
    }

    /// Erase `name`.  Returns `false` if it was not defined.
    pub fn erase(&mut self, name: &str) -> Result<bool> {
        let loc = self.functions.locate(name);
        if let Some(f) = self.functions.get(name) {
            if f.locked {
                return Err(Error::Locked(name.to_owned()));
            }
        }
        let removed = self.functions.remove_at(loc).is_some();
        if removed {
            debug!(name, "erase");
        }
        Ok(removed)
    }

    /// The body of a defined string.
    pub fn defined(&self, name: &str) -> Result<&Defined> {
        match self.functions.get(name) {
            Some(Function { kind: FunctionKind::Defined(body), .. }) => Ok(body),
            Some(_) => Err(Error::Primitive(name.to_owned())),
            None => Err(Error::UndefinedName(name.to_owned())),
        }
    }

    pub fn defined_mut(&mut self, name: &str) -> Result<&mut Defined> {
        match self.functions.get_mut(name) {
            Some(Function { kind: FunctionKind::Defined(body), .. }) => Ok(body),
            Some(_) => Err(Error::Primitive(name.to_owned())),
            None => Err(Error::UndefinedName(name.to_owned())),
        }
    }

    /// Lock every entry currently defined.
    pub fn lock_all(&mut self) {
        for (_, f) in self.functions.iter_mut() {
            f.locked = true;
        }
    }

    /// Sorted names; builtins only when `all` is set.
    pub fn names(&self, all: bool) -> Vec<String> {
        self.functions.sorted_names(|f| all || !f.is_builtin())
    }

    // ── Classes ───────────────────────────────────────────────────────────────

    pub fn class(&self, name: &str) -> Result<&CharClass> {
        self.classes
            .get(name)
            .ok_or_else(|| Error::UndefinedClass(name.to_owned()))
    }

    pub fn define_class(&mut self, name: &str, chars: &str, negative: bool) {
        debug!(name, negative, "define class");
        self.classes.insert(
            name,
            CharClass { name: name.to_owned(), chars: chars.to_owned(), negative },
        );
    }

    pub fn erase_class(&mut self, name: &str) -> bool {
        self.classes.remove(name).is_some()
    }

    pub fn class_names(&self) -> Vec<String> {
        self.classes.sorted_names(|_| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut Ttm, _: &Frame, _: &mut String) -> Result<()> {
        Ok(())
    }

    fn body_units(d: &Defined) -> Vec<Unit> {
        let mut b = d.text.clone();
        b.reset_index();
        let mut out = Vec::new();
        while let Some(u) = b.read_unit().unwrap() {
            out.push(u);
        }
        out
    }

    #[test]
    fn define_and_lookup() {
        let mut d = Dictionary::new();
        d.define("greet", "hello").unwrap();
        let f = d.function("greet").unwrap();
        assert!(!f.is_builtin());
        assert_eq!(f.info(), "greet,0,*,V");
    }

    #[test]
    fn locked_entry_cannot_be_redefined_or_erased() {
        let mut d = Dictionary::new();
        d.define("x", "old").unwrap();
        d.function_mut("x").unwrap().locked = true;
        assert_eq!(d.define("x", "new"), Err(Error::Locked("x".into())));
        assert_eq!(d.erase("x"), Err(Error::Locked("x".into())));
        assert_eq!(d.defined("x").unwrap().text.as_bytes(), b"old");
    }

    #[test]
    fn builtin_has_no_body() {
        let mut d = Dictionary::new();
        d.register(Function::builtin("nop", 0, Some(0), Disposition::SideEffect, noop));
        assert_eq!(d.function("nop").unwrap().info(), "nop,0,0,S");
        assert_eq!(d.defined("nop").err(), Some(Error::Primitive("nop".into())));
    }

    #[test]
    fn segment_marks_replace_patterns() {
        let mut body = Defined::new("hello X world Y, X");
        let n = body.segment("f", &["X".into(), "Y".into()]).unwrap();
        assert_eq!(n, 3);
        assert_eq!(body.next_segment, 2);
        let units = body_units(&body);
        assert_eq!(units[6], Unit::Segment(1));
        assert!(units.contains(&Unit::Segment(2)));
        assert_eq!(units.last(), Some(&Unit::Segment(1)));
    }

    #[test]
    fn segmenting_starts_at_residual_pointer() {
        let mut body = Defined::new("aXbX");
        body.text.set_index(2);
        assert_eq!(body.segment("f", &["X".into()]).unwrap(), 1);
        assert_eq!(body.text.index(), 2);
        assert_eq!(&body.text.as_bytes()[..2], b"aX");
    }

    #[test]
    fn segment_index_exhaustion() {
        let mut body = Defined::new("abc");
        body.next_segment = codec::MAX_SEGMENT;
        assert_eq!(
            body.segment("f", &["a".into()]),
            Err(Error::TooManySegments { name: "f".into() })
        );
    }

    #[test]
    fn append_moves_residual_to_end() {
        let mut d = Dictionary::new();
        d.append("s", "ab").unwrap();
        d.append("s", "cd").unwrap();
        let body = d.defined("s").unwrap();
        assert_eq!(body.text.as_bytes(), b"abcd");
        assert!(body.text.at_end());
    }

    #[test]
    fn names_exclude_builtins_unless_all() {
        let mut d = Dictionary::new();
        d.register(Function::builtin("ds", 2, Some(2), Disposition::SideEffect, noop));
        d.define("b", "").unwrap();
        d.define("a", "").unwrap();
        assert_eq!(d.names(false), vec!["a", "b"]);
        assert_eq!(d.names(true), vec!["a", "b", "ds"]);
    }

    #[test]
    fn negative_class() {
        let mut d = Dictionary::new();
        d.define_class("vowel", "aeiou", false);
        d.define_class("other", "aeiou", true);
        assert!(d.class("vowel").unwrap().contains('e'));
        assert!(!d.class("other").unwrap().contains('e'));
        assert!(d.class("other").unwrap().contains('z'));
        assert_eq!(d.class("other").unwrap().info(), "other,aeiou,1");
        assert!(d.erase_class("vowel"));
        assert!(d.class("vowel").is_err());
    }
}
