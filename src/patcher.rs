//! Second stage of a rewrite: shift chunk offsets by the `mdat` delta.
//!
//! Runs on the fully rebuilt buffer, since the delta is only final once the
//! whole metadata chain has been serialized. Tables are patched in place;
//! their length never changes.

use crate::boxes::FourCC;
use crate::error::{Error, Result};
use crate::known_boxes::KnownBox;
use crate::parser::{ParseError, read_box_header};
use byteorder::{BigEndian, ByteOrder};
use std::io::Cursor;
use tracing::{debug, trace};

/// Add `delta` to every entry of the chunk-offset tables whose headers sit
/// at `tables` in `buf`.
pub fn patch_chunk_offsets(buf: &mut [u8], tables: &[u64], delta: i64) -> Result<()> {
    if delta == 0 {
        debug!("mdat did not move, chunk offsets left as is");
        return Ok(());
    }
    for &at in tables {
        let n = patch_table(buf, at, delta)?;
        trace!(at, entries = n, delta, "patched chunk offset table");
    }
    debug!(tables = tables.len(), delta, "chunk offsets patched");
    Ok(())
}

fn patch_table(buf: &mut [u8], at: u64, delta: i64) -> Result<usize> {
    let hdr = {
        let mut cur = Cursor::new(&*buf);
        cur.set_position(at);
        read_box_header(&mut cur)?
    };
    let available = buf.len() as u64 - at;
    let size = if hdr.size == 0 { available } else { hdr.size };
    if size > available {
        return Err(ParseError::SizeOverrun { typ: hdr.typ, start: at, size, available }.into());
    }

    let width = match KnownBox::from(hdr.typ) {
        KnownBox::Stco => 4,
        KnownBox::Co64 => 8,
        _ => return Err(Error::UnexpectedBox { expected: "stco or co64", found: hdr.typ, at }),
    };

    let payload = &mut buf[(at + hdr.header_size) as usize..(at + size) as usize];
    // version/flags + entry_count
    if payload.len() < 8 {
        return Err(Error::PayloadTooShort { atom: hdr.typ, need: 8, have: payload.len() });
    }
    let count = BigEndian::read_u32(&payload[4..8]) as usize;
    let entries = &mut payload[8..];
    let need = count * width;
    if entries.len() < need {
        return Err(Error::PayloadTooShort { atom: hdr.typ, need: need + 8, have: entries.len() + 8 });
    }

    for slot in entries[..need].chunks_exact_mut(width) {
        if width == 4 {
            let v = BigEndian::read_u32(slot);
            let shifted = (v as i64)
                .checked_add(delta)
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| overflow(hdr.typ, v as u64, delta))?;
            BigEndian::write_u32(slot, shifted);
        } else {
            let v = BigEndian::read_u64(slot);
            let shifted = v.checked_add_signed(delta).ok_or_else(|| overflow(hdr.typ, v, delta))?;
            BigEndian::write_u64(slot, shifted);
        }
    }
    Ok(count)
}

fn overflow(table: FourCC, offset: u64, delta: i64) -> Error {
    Error::OffsetOverflow { table, offset, delta }
}
