//! Growable indexed buffer.
//!
//! A [`Buffer`] holds either the program text being rewritten or the body of
//! a defined string.  It carries a cursor (`index`) that the scanner uses as
//! the boundary of the unscanned text and that string operations use as the
//! residual pointer.
//!
//! Callers refer to positions only by byte offset.  Every operation that can
//! grow or shift the content keeps the cursor consistent; nothing hands out a
//! reference that outlives the call.
//!
//! Reading past the end yields `None` rather than a terminator byte.

use crate::codec::{self, Unit};
use crate::error::Result;

const MIN_CAPACITY: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    content: Vec<u8>,
    index: usize,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(content: Vec<u8>) -> Self {
        Self { content, index: 0 }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.content.capacity()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.content
    }

    /// Bytes from the cursor to the end.
    pub fn remaining(&self) -> &[u8] {
        &self.content[self.index..]
    }

    // ── Growth and editing ────────────────────────────────────────────────────

    /// Make room for at least `needed` bytes in total, doubling as required.
    pub fn ensure_capacity(&mut self, needed: usize) {
        let cap = self.content.capacity();
        if needed <= cap {
            return;
        }
        let mut target = cap.max(MIN_CAPACITY);
        while target < needed {
            target *= 2;
        }
        self.content.reserve_exact(target - self.content.len());
    }

    /// Truncate or zero-extend the content.  The cursor is clamped.
    pub fn set_length(&mut self, len: usize) {
        self.ensure_capacity(len);
        self.content.resize(len, 0);
        self.index = self.index.min(len);
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.ensure_capacity(self.content.len() + bytes.len());
        self.content.extend_from_slice(bytes);
    }

    pub fn push_unit(&mut self, unit: Unit) {
        self.ensure_capacity(self.content.len() + unit.width());
        codec::encode(unit, &mut self.content);
    }

    /// Insert `bytes` before offset `pos` (clamped to the length).
    ///
    /// The cursor keeps designating the same unit: it moves right when the
    /// insertion happens at or before it.
    pub fn insert_at(&mut self, pos: usize, bytes: &[u8]) {
        let pos = pos.min(self.content.len());
        self.ensure_capacity(self.content.len() + bytes.len());
        self.content.splice(pos..pos, bytes.iter().copied());
        if pos <= self.index {
            self.index += bytes.len();
        }
    }

    /// Remove up to `count` bytes starting at `pos`.
    pub fn remove_at(&mut self, pos: usize, count: usize) {
        let len = self.content.len();
        let start = pos.min(len);
        let end = pos.saturating_add(count).min(len);
        self.content.drain(start..end);
        if self.index > start {
            self.index -= (end - start).min(self.index - start);
        }
    }

    /// Overwrite bytes in place starting at `pos`; the range must already exist.
    pub fn overwrite(&mut self, pos: usize, bytes: &[u8]) {
        self.content[pos..pos + bytes.len()].copy_from_slice(bytes);
    }

    /// Copy `len` bytes from `src` to `dest` within the content.
    pub fn copy_within(&mut self, src: usize, dest: usize, len: usize) {
        self.content.copy_within(src..src + len, dest);
    }

    /// Detach the content, leaving the buffer empty with the cursor at zero.
    pub fn take(&mut self) -> Vec<u8> {
        self.index = 0;
        std::mem::take(&mut self.content)
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.index = 0;
    }

    // ── Cursor ────────────────────────────────────────────────────────────────

    /// Move the cursor, clamped to `[0, len]`.
    pub fn set_index(&mut self, index: usize) {
        self.index = index.min(self.content.len());
    }

    pub fn advance(&mut self, n: usize) {
        self.set_index(self.index.saturating_add(n));
    }

    pub fn reset_index(&mut self) {
        self.index = 0;
    }

    pub fn at_end(&self) -> bool {
        self.index >= self.content.len()
    }

    /// Decode the unit under the cursor without moving.
    pub fn peek(&self) -> Result<Option<Unit>> {
        codec::decode_at(&self.content, self.index)
    }

    /// Decode the unit at an arbitrary offset.
    pub fn unit_at(&self, pos: usize) -> Result<Option<Unit>> {
        codec::decode_at(&self.content, pos)
    }

    /// Decode the unit under the cursor and step past it.
    pub fn read_unit(&mut self) -> Result<Option<Unit>> {
        let unit = self.peek()?;
        if let Some(u) = unit {
            self.index += u.width();
        }
        Ok(unit)
    }

    // ── Residual-pointer string operations ────────────────────────────────────
    //
    // These treat the buffer as a string of characters; markers are stepped
    // over and never returned.

    /// Read the next character, skipping markers.
    pub fn read_char(&mut self) -> Result<Option<char>> {
        while let Some(unit) = self.read_unit()? {
            if let Unit::Char(c) = unit {
                return Ok(Some(c));
            }
        }
        Ok(None)
    }

    /// Read up to `n` characters.
    pub fn take_chars(&mut self, n: usize) -> Result<String> {
        let mut out = String::new();
        for _ in 0..n {
            match self.read_char()? {
                Some(c) => out.push(c),
                None => break,
            }
        }
        Ok(out)
    }

    /// Skip up to `n` characters.  Returns how many were skipped.
    pub fn skip_chars(&mut self, n: usize) -> Result<usize> {
        let mut skipped = 0;
        while skipped < n && self.read_char()?.is_some() {
            skipped += 1;
        }
        Ok(skipped)
    }

    /// Read characters while `pred` holds.  The first rejected character is
    /// left under the cursor.
    pub fn take_while(&mut self, mut pred: impl FnMut(char) -> bool) -> Result<String> {
        let mut out = String::new();
        while let Some(unit) = self.peek()? {
            match unit {
                Unit::Char(c) if pred(c) => out.push(c),
                Unit::Char(_) => break,
                _ => {}
            }
            self.index += unit.width();
        }
        Ok(out)
    }

    pub fn skip_while(&mut self, pred: impl FnMut(char) -> bool) -> Result<()> {
        self.take_while(pred).map(drop)
    }

    /// Read up to the next marker or the end.  The cursor is left just past
    /// the marker.
    pub fn read_segment(&mut self) -> Result<String> {
        let mut out = String::new();
        while let Some(unit) = self.read_unit()? {
            match unit {
                Unit::Char(c) => out.push(c),
                _ => break,
            }
        }
        Ok(out)
    }

    /// Next character without moving, skipping markers.
    pub fn peek_char(&self) -> Result<Option<char>> {
        let mut pos = self.index;
        while let Some(unit) = self.unit_at(pos)? {
            if let Unit::Char(c) = unit {
                return Ok(Some(c));
            }
            pos += unit.width();
        }
        Ok(None)
    }
}

impl From<&str> for Buffer {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marked(parts: &[Result<&str, Unit>]) -> Buffer {
        let mut b = Buffer::new();
        for p in parts {
            match p {
                Ok(s) => b.append(s.as_bytes()),
                Err(u) => b.push_unit(*u),
            }
        }
        b
    }

    #[test]
    fn capacity_grows_geometrically() {
        let mut b = Buffer::new();
        b.ensure_capacity(10);
        assert!(b.capacity() >= MIN_CAPACITY);
        b.ensure_capacity(MIN_CAPACITY * 3);
        assert!(b.capacity() >= MIN_CAPACITY * 4);
    }

    #[test]
    fn insert_before_cursor_shifts_it() {
        let mut b = Buffer::from("abcdef");
        b.set_index(3);
        b.insert_at(1, b"XY");
        assert_eq!(b.as_bytes(), b"aXYbcdef");
        assert_eq!(b.index(), 5);
        b.insert_at(7, b"!");
        assert_eq!(b.index(), 5);
    }

    #[test]
    fn insert_at_cursor_keeps_unit() {
        let mut b = Buffer::from("ab");
        b.set_index(1);
        b.insert_at(1, b"--");
        assert_eq!(b.peek().unwrap(), Some(Unit::Char('b')));
    }

    #[test]
    fn remove_adjusts_cursor() {
        let mut b = Buffer::from("abcdef");
        b.set_index(4);
        b.remove_at(1, 2);
        assert_eq!(b.as_bytes(), b"adef");
        assert_eq!(b.index(), 2);
        b.remove_at(1, 100);
        assert_eq!(b.as_bytes(), b"a");
        assert_eq!(b.index(), 1);
    }

    #[test]
    fn cursor_is_clamped() {
        let mut b = Buffer::from("abc");
        b.set_index(99);
        assert_eq!(b.index(), 3);
        assert!(b.at_end());
        b.set_length(1);
        assert_eq!(b.index(), 1);
    }

    #[test]
    fn take_resets() {
        let mut b = Buffer::from("xyz");
        b.advance(2);
        assert_eq!(b.take(), b"xyz".to_vec());
        assert!(b.is_empty());
        assert_eq!(b.index(), 0);
    }

    #[test]
    fn char_reads_skip_markers() {
        let mut b = marked(&[Ok("a"), Err(Unit::Segment(1)), Ok("bc")]);
        assert_eq!(b.read_char().unwrap(), Some('a'));
        assert_eq!(b.read_char().unwrap(), Some('b'));
        assert_eq!(b.take_chars(5).unwrap(), "c");
        assert_eq!(b.read_char().unwrap(), None);
    }

    #[test]
    fn read_segment_stops_after_marker() {
        let mut b = marked(&[Ok("ab"), Err(Unit::Create), Ok("cd")]);
        assert_eq!(b.read_segment().unwrap(), "ab");
        assert_eq!(b.read_segment().unwrap(), "cd");
        assert!(b.at_end());
        assert_eq!(b.read_segment().unwrap(), "");
    }

    #[test]
    fn take_while_leaves_rejected_char() {
        let mut b = Buffer::from("123abc");
        assert_eq!(b.take_while(|c| c.is_ascii_digit()).unwrap(), "123");
        assert_eq!(b.peek_char().unwrap(), Some('a'));
        b.skip_while(|c| c != 'c').unwrap();
        assert_eq!(b.read_char().unwrap(), Some('c'));
    }

    #[test]
    fn skip_counts_chars_not_bytes() {
        let mut b = Buffer::from("€€x");
        assert_eq!(b.skip_chars(2).unwrap(), 2);
        assert_eq!(b.read_char().unwrap(), Some('x'));
        assert_eq!(b.skip_chars(3).unwrap(), 0);
    }
}
