//! Text-unit codec.
//!
//! Text is stored as UTF-8.  The two structural markers used inside defined
//! string bodies live in the byte range UTF-8 never produces: a marker is
//! [`MARK_LEAD`] followed by `0x80 | index`.  Indices `1..=MAX_SEGMENT` are
//! segment marks; [`CREATE_INDEX`] is the creation mark.
//!
//! Nothing outside this module needs to know the byte layout; callers work
//! with [`Unit`] values.

use crate::error::{Error, Result};

/// Lead byte of every marker.  Never valid in UTF-8.
pub const MARK_LEAD: u8 = 0xFF;
/// Encoded width of a marker in bytes.
pub const MARK_WIDTH: usize = 2;
/// Highest segment-mark index.
pub const MAX_SEGMENT: u8 = 62;
/// Index reserved for the creation mark.
pub const CREATE_INDEX: u8 = 63;

const INDEX_TAG: u8 = 0x80;
const INDEX_MASK: u8 = 0x3F;

/// One decoded text unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Char(char),
    /// Stands for argument `n` of the call expanding the body.
    Segment(u8),
    /// Stands for the generated token of the current expansion.
    Create,
}

impl Unit {
    /// Encoded width in bytes.
    pub fn width(self) -> usize {
        match self {
            Unit::Char(c) => c.len_utf8(),
            Unit::Segment(_) | Unit::Create => MARK_WIDTH,
        }
    }

    pub fn is_marker(self) -> bool {
        !matches!(self, Unit::Char(_))
    }
}

/// Build a segment-mark unit, checking the index range.
pub fn segment(index: usize) -> Option<Unit> {
    u8::try_from(index)
        .ok()
        .filter(|i| (1..=MAX_SEGMENT).contains(i))
        .map(Unit::Segment)
}

/// Decode the unit starting at `pos`.
///
/// Returns `Ok(None)` at the end of `bytes`.  A malformed or truncated
/// sequence is an [`Error::BadUnit`] carrying `pos`.
pub fn decode_at(bytes: &[u8], pos: usize) -> Result<Option<Unit>> {
    let Some(&lead) = bytes.get(pos) else {
        return Ok(None);
    };
    let bad = || Error::BadUnit { offset: pos };

    if lead < 0x80 {
        return Ok(Some(Unit::Char(lead as char)));
    }
    if lead == MARK_LEAD {
        let tag = *bytes.get(pos + 1).ok_or_else(bad)?;
        if tag & !INDEX_MASK != INDEX_TAG {
            return Err(bad());
        }
        return match tag & INDEX_MASK {
            CREATE_INDEX => Ok(Some(Unit::Create)),
            i @ 1..=MAX_SEGMENT => Ok(Some(Unit::Segment(i))),
            _ => Err(bad()),
        };
    }

    let width = match lead {
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => return Err(bad()),
    };
    let seq = bytes.get(pos..pos + width).ok_or_else(bad)?;
    let s = std::str::from_utf8(seq).map_err(|_| bad())?;
    Ok(s.chars().next().map(Unit::Char))
}

/// Append the encoding of `unit` to `out`.
pub fn encode(unit: Unit, out: &mut Vec<u8>) {
    match unit {
        Unit::Char(c) => {
            let mut tmp = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
        }
        Unit::Segment(i) => {
            debug_assert!((1..=MAX_SEGMENT).contains(&i));
            out.extend_from_slice(&[MARK_LEAD, INDEX_TAG | (i & INDEX_MASK)]);
        }
        Unit::Create => out.extend_from_slice(&[MARK_LEAD, INDEX_TAG | CREATE_INDEX]),
    }
}

/// `true` if `bytes` begins with a well-formed marker.
pub fn is_marker(bytes: &[u8]) -> bool {
    bytes.first() == Some(&MARK_LEAD)
        && matches!(decode_at(bytes, 0), Ok(Some(u)) if u.is_marker())
}

/// Check that `bytes` is a sequence of well-formed units (markers allowed).
pub fn validate(bytes: &[u8]) -> Result<()> {
    let mut pos = 0;
    while let Some(unit) = decode_at(bytes, pos)? {
        pos += unit.width();
    }
    Ok(())
}

/// Interpret `bytes` as plain text.  Markers are rejected.
pub fn to_text(bytes: &[u8], base: usize) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| Error::BadUnit {
        offset: base + e.utf8_error().valid_up_to(),
    })
}

/// Render `bytes` as text with every marker dropped.
pub fn strip_markers(bytes: &[u8]) -> Result<String> {
    let mut out = String::with_capacity(bytes.len());
    let mut pos = 0;
    while let Some(unit) = decode_at(bytes, pos)? {
        if let Unit::Char(c) = unit {
            out.push(c);
        }
        pos += unit.width();
    }
    Ok(out)
}

/// Compare the leading units of two byte strings.
pub fn unit_eq(a: &[u8], b: &[u8]) -> bool {
    match (decode_at(a, 0), decode_at(b, 0)) {
        (Ok(Some(x)), Ok(Some(y))) => x == y,
        _ => false,
    }
}

/// Byte offset of the first occurrence of `needle` at or after `from`.
///
/// `needle` is plain UTF-8, so it can never match across a marker: the
/// marker lead byte does not occur in it, and its first byte is never a
/// continuation byte.
pub fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}
