use std::io::Cursor;

use proptest::prelude::*;
use ttm::buffer::Buffer;
use ttm::codec::{self, Unit, MARK_LEAD, MAX_SEGMENT};
use ttm::stream::{Stream, Streams};
use ttm::Ttm;

fn ttm() -> Ttm {
    Ttm::with_streams(Streams::memory("").0)
}

/// Text with none of the default meta characters.
fn inert_text() -> impl Strategy<Value = String> {
    "[^#<>\\\\]*"
}

fn any_unit() -> impl Strategy<Value = Unit> {
    prop_oneof![
        any::<char>().prop_map(Unit::Char),
        (1..=MAX_SEGMENT).prop_map(Unit::Segment),
        Just(Unit::Create),
    ]
}

proptest! {
    /// Text without calls or brackets scans to itself.
    #[test]
    fn inert_text_is_unchanged(s in inert_text()) {
        prop_assert_eq!(ttm().eval(&s).unwrap(), s);
    }

    /// Bracketing any inert text yields the text itself.
    #[test]
    fn brackets_are_stripped_once(s in inert_text()) {
        prop_assert_eq!(ttm().eval(&format!("<{s}>")).unwrap(), s);
    }

    /// The scanner never panics; it either succeeds or reports an error.
    #[test]
    fn scanner_does_not_panic(s in "\\PC{0,64}") {
        let _ = ttm().eval(&s);
    }

    /// Defining a string and calling it returns the body unchanged.
    #[test]
    fn define_then_call(body in "[a-z ,.]{0,40}") {
        let out = ttm().eval(&format!("#<ds;f;{body}>#<f>")).unwrap();
        prop_assert_eq!(out, body);
    }

    /// Addition agrees with i64 arithmetic inside the non-overflowing range.
    #[test]
    fn addition_matches_i64(a in -1_000_000_000i64..1_000_000_000, b in -1_000_000_000i64..1_000_000_000) {
        let out = ttm().eval(&format!("#<ad;{a};{b}>")).unwrap();
        prop_assert_eq!(out, (a + b).to_string());
    }
}

proptest! {
    /// Decoding what the encoder produced gives the same units back.
    #[test]
    fn codec_decodes_encoded_units(units in prop::collection::vec(any_unit(), 0..32)) {
        let mut bytes = Vec::new();
        for &u in &units {
            codec::encode(u, &mut bytes);
        }
        let mut buf = Buffer::from_bytes(bytes);
        let mut back = Vec::new();
        while let Some(u) = buf.read_unit().unwrap() {
            back.push(u);
        }
        prop_assert_eq!(back, units);
    }

    /// Bytes without the marker lead byte never decode as a marker.
    #[test]
    fn markers_need_the_lead_byte(bytes in prop::collection::vec(0u8..MARK_LEAD, 0..64)) {
        let mut pos = 0;
        while let Ok(Some(u)) = codec::decode_at(&bytes, pos) {
            prop_assert!(!u.is_marker());
            pos += u.width();
        }
    }

    /// Valid UTF-8 always validates.
    #[test]
    fn utf8_validates(s in "\\PC*") {
        prop_assert!(codec::validate(s.as_bytes()).is_ok());
    }

    /// CRLF pairs read back as LF; nothing else changes.
    #[test]
    fn stream_folds_crlf(lines in prop::collection::vec("[a-z\r]{0,8}", 0..8)) {
        let input = lines.join("\r\n");
        let mut stream = Stream::reader("test", Cursor::new(input.clone().into_bytes()));
        let got = stream.read_to_end().unwrap();
        let want = input.replace("\r\n", "\n");
        prop_assert_eq!(got, want);
    }
}
