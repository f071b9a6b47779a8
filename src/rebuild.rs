//! First stage of a rewrite: re-serialize the container with a fresh `ilst`.
//!
//! Everything outside `moov → udta → meta → ilst` is copied byte for byte.
//! The boxes on that chain are re-emitted through [`BoxWriter`] so their
//! sizes follow the regenerated metadata, and any missing link of the chain
//! is synthesized at the end of its parent. Chunk offsets are *not* touched
//! here; the pass only records where the tables landed and how far `mdat`
//! moved, which is what [`crate::patcher`] needs afterwards.

use crate::atoms::{self, ATOM_TABLE};
use crate::boxes::{self, BoxRef, FourCC, NodeKind};
use crate::error::{Error, Result};
use crate::known_boxes::KnownBox;
use crate::tag::Mp4Tag;
use crate::writer::BoxWriter;
use tracing::{debug, trace, warn};

/// Serialized container whose chunk offsets may still be stale.
#[derive(Debug)]
pub struct Rebuilt {
    /// The complete output container, chunk offsets not yet patched.
    pub buffer: Vec<u8>,
    /// Output position of `mdat` minus its input position.
    pub offset_delta: i64,
    /// Output offsets of every `stco` / `co64` box header.
    pub chunk_offset_tables: Vec<u64>,
}

struct Pass<'a> {
    src: &'a [u8],
    tag: &'a Mp4Tag,
    w: BoxWriter,
    mdat_delta: Option<i64>,
    tables: Vec<u64>,
}

/// Rebuild `src` (already parsed into `tree`) with the metadata of `tag`.
pub fn rebuild(src: &[u8], tree: &[BoxRef], tag: &Mp4Tag) -> Result<Rebuilt> {
    if boxes::find(tree, FourCC::MOOV).is_none() && !tag.is_empty() {
        return Err(Error::MissingMoov);
    }

    let mut pass = Pass {
        src,
        tag,
        w: BoxWriter::with_capacity(src.len() + 4096),
        mdat_delta: None,
        tables: Vec::new(),
    };

    let mut wrote_moov = false;
    for b in tree {
        match KnownBox::from(b.typ()) {
            KnownBox::Moov if !wrote_moov => {
                pass.write_moov(b)?;
                wrote_moov = true;
            }
            KnownBox::Mdat => {
                let delta = pass.w.position() as i64 - b.hdr.start as i64;
                match pass.mdat_delta {
                    None => pass.mdat_delta = Some(delta),
                    Some(d) if d != delta => {
                        warn!(first = d, this = delta, "mdat boxes moved by different amounts");
                    }
                    Some(_) => {}
                }
                pass.w.copy_box(src, &b.hdr)?;
            }
            _ => pass.copy(b)?,
        }
    }

    let offset_delta = pass.mdat_delta.unwrap_or(0);
    debug!(offset_delta, tables = pass.tables.len(), "rebuild finished");
    Ok(Rebuilt {
        buffer: pass.w.into_inner()?,
        offset_delta,
        chunk_offset_tables: pass.tables,
    })
}

impl Pass<'_> {
    fn copy(&mut self, b: &BoxRef) -> Result<()> {
        let at = self.w.copy_box(self.src, &b.hdr)?;
        if KnownBox::from(b.typ()).is_padding() {
            trace!(typ = %b.typ(), from = b.hdr.start, to = at, "padding kept");
        }
        self.record_tables(b, b.hdr.start, at);
        Ok(())
    }

    // Child of a re-emitted container. An open-ended header would swallow
    // whatever gets appended to the parent, so it is pinned to its real size.
    fn copy_child(&mut self, b: &BoxRef) -> Result<()> {
        let at = self.w.position();
        self.copy(b)?;
        if stored_size_is_zero(self.src, b) {
            debug!(typ = %b.typ(), size = b.hdr.size, "pinning open-ended box size");
            self.w.set_size(at, &b.hdr)?;
        }
        Ok(())
    }

    fn record_tables(&mut self, b: &BoxRef, src_base: u64, out_base: u64) {
        if KnownBox::from(b.typ()).is_chunk_offset_table() {
            self.tables.push(out_base + (b.hdr.start - src_base));
        }
        for c in b.children() {
            self.record_tables(c, src_base, out_base);
        }
    }

    fn write_moov(&mut self, moov: &BoxRef) -> Result<()> {
        self.w.start_box(FourCC::MOOV, moov.hdr.is_large())?;
        let mut wrote_udta = false;
        for c in moov.children() {
            if c.typ() == FourCC::UDTA && !wrote_udta {
                self.write_udta(c)?;
                wrote_udta = true;
            } else {
                self.copy_child(c)?;
            }
        }
        if !wrote_udta && !self.tag.is_empty() {
            debug!("moov has no udta, synthesizing udta/meta/ilst");
            self.w.start_box(FourCC::UDTA, false)?;
            self.write_new_meta()?;
            self.w.end_box()?;
        }
        self.w.end_box()?;
        Ok(())
    }

    fn write_udta(&mut self, udta: &BoxRef) -> Result<()> {
        self.w.start_box(FourCC::UDTA, udta.hdr.is_large())?;
        let mut wrote_meta = false;
        for c in udta.children() {
            if c.typ() == FourCC::META && !wrote_meta {
                self.write_meta(c)?;
                wrote_meta = true;
            } else {
                self.copy_child(c)?;
            }
        }
        if !wrote_meta && !self.tag.is_empty() {
            debug!("udta has no meta, synthesizing meta/ilst");
            self.write_new_meta()?;
        }
        self.w.end_box()?;
        Ok(())
    }

    fn write_meta(&mut self, meta: &BoxRef) -> Result<()> {
        self.w.start_box(FourCC::META, meta.hdr.is_large())?;
        if let NodeKind::FullContainer { version, flags, .. } = &meta.kind {
            self.w.write_version_flags(*version, *flags)?;
        }
        if meta.child(FourCC::HDLR).is_none() && !self.tag.is_empty() {
            debug!("meta has no handler, inserting one");
            self.write_hdlr()?;
        }
        let mut wrote_ilst = false;
        for c in meta.children() {
            if c.typ() == FourCC::ILST && !wrote_ilst {
                self.write_ilst(Some(c))?;
                wrote_ilst = true;
            } else {
                self.copy_child(c)?;
            }
        }
        if !wrote_ilst && !self.tag.is_empty() {
            debug!("meta has no ilst, synthesizing one");
            self.write_ilst(None)?;
        }
        self.w.end_box()?;
        Ok(())
    }

    fn write_new_meta(&mut self) -> Result<()> {
        self.w.start_box(FourCC::META, false)?;
        self.w.write_version_flags(0, 0)?;
        self.write_hdlr()?;
        self.write_ilst(None)?;
        self.w.end_box()?;
        Ok(())
    }

    // metadata handler: pre_defined, 'mdir', 'appl', reserved, empty name
    fn write_hdlr(&mut self) -> Result<()> {
        self.w.start_box(FourCC::HDLR, false)?;
        self.w.write_version_flags(0, 0)?;
        self.w.write_u32(0)?;
        self.w.write_bytes(b"mdir");
        self.w.write_bytes(b"appl");
        self.w.write_bytes(&[0u8; 8]);
        self.w.write_bytes(&[0u8]);
        self.w.end_box()?;
        Ok(())
    }

    fn write_ilst(&mut self, existing: Option<&BoxRef>) -> Result<()> {
        let large = existing.is_some_and(|b| b.hdr.is_large());
        self.w.start_box(FourCC::ILST, large)?;

        for spec in ATOM_TABLE.iter() {
            let Some((data_type, value)) = atoms::encode(spec, self.tag) else {
                continue;
            };
            self.w.start_box(spec.atom, false)?;
            self.w.start_box(FourCC::DATA, false)?;
            self.w.write_version_flags(0, data_type)?;
            self.w.write_u32(0)?; // locale
            self.w.write_bytes(&value);
            self.w.end_box()?;
            self.w.end_box()?;
        }

        // atoms outside the table pass through untouched
        if let Some(ilst) = existing {
            for c in ilst.children() {
                if atoms::lookup(c.typ()).is_none() {
                    self.copy_child(c)?;
                }
            }
        }

        self.w.end_box()?;
        Ok(())
    }
}

fn stored_size_is_zero(src: &[u8], b: &BoxRef) -> bool {
    let at = b.hdr.start as usize;
    let field = if b.hdr.is_large() { at + 8..at + 16 } else { at..at + 4 };
    src.get(field).is_some_and(|f| f.iter().all(|&x| x == 0))
}
