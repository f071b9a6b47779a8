//! Atom-to-tag table and the payload layouts of each metadata atom.
//!
//! Every `ilst` child wraps a single `data` box whose payload is
//!
//! ```text
//! [1 version][3 type indicator][4 locale][value ...]
//! ```
//!
//! The codecs here work on `value` only.

use crate::boxes::FourCC;
use crate::error::{Error, Result};
use crate::tag::{Mp4Tag, TagField};
use byteorder::{BigEndian, ByteOrder};

/// Length of the version/type/locale prefix of a `data` payload.
pub const DATA_PREFIX_LEN: usize = 8;

pub const TYPE_IMPLICIT: u32 = 0;
pub const TYPE_UTF8: u32 = 1;
pub const TYPE_BE_SIGNED: u32 = 21;

/// How an atom's value bytes map onto tag fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// UTF-8 text.
    Text,
    /// `[2 reserved][current u16][total u16][2 reserved]`.
    Pair,
    /// 1 or 2 byte big-endian integer.
    Integer,
    /// 1-based index into the ID3v1 genre list.
    GenreCode,
    /// Encoded image bytes.
    Image,
}

#[derive(Debug, Clone, Copy)]
pub struct AtomSpec {
    pub atom: FourCC,
    pub field: TagField,
    pub codec: Codec,
}

const fn spec(atom: &[u8; 4], field: TagField, codec: Codec) -> AtomSpec {
    AtomSpec { atom: FourCC(*atom), field, codec }
}

/// Emission order of the rebuilt `ilst`.
pub static ATOM_TABLE: [AtomSpec; 15] = [
    spec(b"\xa9nam", TagField::Title, Codec::Text),
    spec(b"\xa9ART", TagField::Artist, Codec::Text),
    spec(b"aART", TagField::AlbumArtist, Codec::Text),
    spec(b"\xa9alb", TagField::Album, Codec::Text),
    spec(b"\xa9wrt", TagField::Composer, Codec::Text),
    spec(b"\xa9cmt", TagField::Comments, Codec::Text),
    spec(b"\xa9gen", TagField::Genre, Codec::Text),
    spec(b"gnre", TagField::Genre, Codec::GenreCode),
    spec(b"\xa9day", TagField::Year, Codec::Text),
    spec(b"trkn", TagField::TrackNumber, Codec::Pair),
    spec(b"disk", TagField::DiscNumber, Codec::Pair),
    spec(b"tmpo", TagField::Bpm, Codec::Integer),
    spec(b"\xa9too", TagField::Encoder, Codec::Text),
    spec(b"cprt", TagField::Copyright, Codec::Text),
    spec(b"covr", TagField::CoverArt, Codec::Image),
];

pub fn lookup(atom: FourCC) -> Option<&'static AtomSpec> {
    ATOM_TABLE.iter().find(|s| s.atom == atom)
}

/// The atom a field is written to. Totals share their number's atom;
/// genre is always written as text.
pub fn atom_for(field: TagField) -> Option<FourCC> {
    let field = match field {
        TagField::TrackTotal => TagField::TrackNumber,
        TagField::DiscTotal => TagField::DiscNumber,
        f => f,
    };
    ATOM_TABLE
        .iter()
        .find(|s| s.field == field && s.codec != Codec::GenreCode)
        .map(|s| s.atom)
}

/// The second field carried by a paired atom.
pub fn paired_total(field: TagField) -> Option<TagField> {
    match field {
        TagField::TrackNumber => Some(TagField::TrackTotal),
        TagField::DiscNumber => Some(TagField::DiscTotal),
        _ => None,
    }
}

/// Split a `data` payload into its type indicator and value bytes.
pub fn split_data_payload(atom: FourCC, payload: &[u8]) -> Result<(u32, &[u8])> {
    if payload.len() < DATA_PREFIX_LEN {
        return Err(Error::PayloadTooShort { atom, need: DATA_PREFIX_LEN, have: payload.len() });
    }
    let data_type = BigEndian::read_u32(&payload[0..4]) & 0x00FF_FFFF;
    Ok((data_type, &payload[DATA_PREFIX_LEN..]))
}

pub fn decode_text(value: &[u8]) -> String {
    String::from_utf8_lossy(value).into_owned()
}

pub fn decode_pair(atom: FourCC, value: &[u8]) -> Result<(u16, u16)> {
    if value.len() < 6 {
        return Err(Error::PayloadTooShort { atom, need: 6, have: value.len() });
    }
    Ok((BigEndian::read_u16(&value[2..4]), BigEndian::read_u16(&value[4..6])))
}

/// Single big-endian integer of one or two bytes; wider payloads keep
/// their leading two bytes.
pub fn decode_integer(atom: FourCC, value: &[u8]) -> Result<u16> {
    match value {
        [] => Err(Error::PayloadTooShort { atom, need: 1, have: 0 }),
        [b] => Ok(*b as u16),
        [hi, lo, ..] => Ok(u16::from_be_bytes([*hi, *lo])),
    }
}

pub fn encode_pair(current: u16, total: u16) -> Vec<u8> {
    let mut v = vec![0u8; 8];
    BigEndian::write_u16(&mut v[2..4], current);
    BigEndian::write_u16(&mut v[4..6], total);
    v
}

/// Type indicator and value bytes for one atom, or `None` when the
/// fields behind it are zero/empty and the atom must not be written.
pub fn encode(spec: &AtomSpec, tag: &Mp4Tag) -> Option<(u32, Vec<u8>)> {
    match spec.codec {
        Codec::Text => {
            let s = tag.text(spec.field).unwrap_or_default();
            if s.is_empty() {
                None
            } else {
                Some((TYPE_UTF8, s.as_bytes().to_vec()))
            }
        }
        Codec::Pair => {
            let total_field = paired_total(spec.field)?;
            let (cur, total) = (tag.number(spec.field), tag.number(total_field));
            if cur == 0 && total == 0 {
                None
            } else {
                Some((TYPE_IMPLICIT, encode_pair(cur, total)))
            }
        }
        Codec::Integer => match tag.number(spec.field) {
            0 => None,
            n => Some((TYPE_BE_SIGNED, n.to_be_bytes().to_vec())),
        },
        Codec::GenreCode => None,
        Codec::Image => tag.cover_art().map(|c| (c.data_type(), c.bytes().to_vec())),
    }
}
