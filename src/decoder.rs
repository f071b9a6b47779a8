use crate::atoms::{self, AtomSpec, Codec};
use crate::boxes::{self, BoxRef, FourCC};
use crate::cover::CoverArt;
use crate::error::Result;
use crate::genres::genre_for_code;
use crate::parser::{ParseError, parse_children, parse_file};
use crate::tag::Mp4Tag;
use std::io::{Read, Seek, SeekFrom};
use tracing::{debug, trace, warn};

/// Parse a whole stream and decode its metadata.
pub fn read_tag<R: Read + Seek>(r: &mut R) -> Result<Mp4Tag> {
    let tree = parse_file(r)?;
    decode_tree(r, &tree)
}

/// `moov → udta → meta → ilst`, if the whole chain is present.
pub fn find_ilst(tree: &[BoxRef]) -> Option<&BoxRef> {
    boxes::find(tree, FourCC::MOOV)?
        .child(FourCC::UDTA)?
        .child(FourCC::META)?
        .child(FourCC::ILST)
}

/// Decode the metadata atoms of an already parsed tree.
///
/// `r` must be the stream the tree was parsed from.
pub fn decode_tree<R: Read + Seek>(r: &mut R, tree: &[BoxRef]) -> Result<Mp4Tag> {
    let mut tag = Mp4Tag::new();
    let Some(ilst) = find_ilst(tree) else {
        debug!("no ilst found, tag is empty");
        return Ok(tag);
    };

    for atom in ilst.children() {
        let Some(spec) = atoms::lookup(atom.typ()) else {
            trace!(atom = %atom.typ(), "skipping unmapped ilst atom");
            continue;
        };
        r.seek(SeekFrom::Start(atom.hdr.payload_start()))?;
        let kids = parse_children(r, atom.hdr.end())?;
        for data in kids.iter().filter(|k| k.typ() == FourCC::DATA) {
            let payload = read_payload(r, data)?;
            apply(&mut tag, spec, &payload)?;
        }
    }
    Ok(tag)
}

fn read_payload<R: Read + Seek>(r: &mut R, b: &BoxRef) -> Result<Vec<u8>> {
    r.seek(SeekFrom::Start(b.hdr.payload_start()))?;
    let mut buf = Vec::new();
    r.by_ref().take(b.hdr.payload_len()).read_to_end(&mut buf)?;
    if (buf.len() as u64) < b.hdr.payload_len() {
        return Err(ParseError::SizeOverrun {
            typ: b.typ(),
            start: b.hdr.start,
            size: b.hdr.size,
            available: b.hdr.header_size + buf.len() as u64,
        }
        .into());
    }
    Ok(buf)
}

fn apply(tag: &mut Mp4Tag, spec: &AtomSpec, payload: &[u8]) -> Result<()> {
    let (_, value) = atoms::split_data_payload(spec.atom, payload)?;
    match spec.codec {
        Codec::Text => {
            let s = atoms::decode_text(value);
            // empty text never overwrites
            if !s.is_empty() {
                if let Some(slot) = tag.text_mut(spec.field) {
                    *slot = s;
                }
            }
        }
        Codec::Pair => {
            let (cur, total) = atoms::decode_pair(spec.atom, value)?;
            if let Some(slot) = tag.number_mut(spec.field) {
                *slot = cur;
            }
            if let Some(slot) = atoms::paired_total(spec.field).and_then(|f| tag.number_mut(f)) {
                *slot = total;
            }
        }
        Codec::Integer => {
            let n = atoms::decode_integer(spec.atom, value)?;
            if let Some(slot) = tag.number_mut(spec.field) {
                *slot = n;
            }
        }
        Codec::GenreCode => {
            let code = atoms::decode_integer(spec.atom, value)?;
            // textual genre wins regardless of atom order
            if !tag.genre().is_empty() {
                return Ok(());
            }
            match genre_for_code(code) {
                Some(name) => tag.set_genre(name),
                None => warn!(code, "ignoring out-of-range gnre code"),
            }
        }
        Codec::Image => {
            if value.is_empty() {
                return Ok(());
            }
            if tag.cover_art().is_none() {
                tag.set_cover_art(Some(CoverArt::from_bytes(value.to_vec())));
            } else {
                debug!("ignoring additional cover image");
            }
        }
    }
    Ok(())
}
