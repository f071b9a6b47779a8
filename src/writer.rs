//! In-memory box writer with size backpatching.
//!
//! `start_box` writes a header with a placeholder size and pushes a marker;
//! `end_box` pops it and fills in the real size once the children are out.

use crate::boxes::{BoxHeader, FourCC};
use crate::error::{Error, Result};
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use std::io;

#[derive(Debug)]
struct OpenBox {
    typ: FourCC,
    start: usize,
    large: bool,
}

#[derive(Debug, Default)]
pub struct BoxWriter {
    buf: Vec<u8>,
    open: Vec<OpenBox>,
}

impl BoxWriter {
    pub fn new() -> Self { Self::default() }

    pub fn with_capacity(cap: usize) -> Self {
        Self { buf: Vec::with_capacity(cap), open: Vec::new() }
    }

    pub fn position(&self) -> u64 { self.buf.len() as u64 }

    pub fn depth(&self) -> usize { self.open.len() }

    /// Open a box; `large` selects the 16-byte `largesize` header form.
    pub fn start_box(&mut self, typ: FourCC, large: bool) -> Result<()> {
        let start = self.buf.len();
        if large {
            self.buf.write_u32::<BigEndian>(1)?;
            self.buf.extend_from_slice(&typ.0);
            self.buf.write_u64::<BigEndian>(0)?;
        } else {
            self.buf.write_u32::<BigEndian>(0)?;
            self.buf.extend_from_slice(&typ.0);
        }
        self.open.push(OpenBox { typ, start, large });
        Ok(())
    }

    /// Close the innermost open box and return its final size.
    pub fn end_box(&mut self) -> Result<u64> {
        let open = self
            .open
            .pop()
            .ok_or_else(|| io::Error::other("end_box without matching start_box"))?;
        let size = (self.buf.len() - open.start) as u64;
        if open.large {
            BigEndian::write_u64(&mut self.buf[open.start + 8..open.start + 16], size);
        } else {
            let size32 = u32::try_from(size).map_err(|_| Error::BoxTooLarge { typ: open.typ, size })?;
            BigEndian::write_u32(&mut self.buf[open.start..open.start + 4], size32);
        }
        Ok(size)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        self.buf.write_u32::<BigEndian>(v)?;
        Ok(())
    }

    /// Version byte plus 24-bit flags.
    pub fn write_version_flags(&mut self, version: u8, flags: u32) -> Result<()> {
        self.buf.write_u8(version)?;
        self.buf.write_u24::<BigEndian>(flags & 0x00FF_FFFF)?;
        Ok(())
    }

    /// Copy a box verbatim from `src`; returns where it landed in the output.
    pub fn copy_box(&mut self, src: &[u8], hdr: &BoxHeader) -> Result<u64> {
        let at = self.position();
        let range = hdr.start as usize..hdr.end() as usize;
        let bytes = src.get(range).ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, format!("box '{}' runs past source", hdr.typ))
        })?;
        self.buf.extend_from_slice(bytes);
        Ok(at)
    }

    /// Overwrite the size field of an already written box at `at`.
    ///
    /// Used for boxes copied with an open-ended (size 0) header into a
    /// container that gains siblings after them.
    pub fn set_size(&mut self, at: u64, hdr: &BoxHeader) -> Result<()> {
        let at = at as usize;
        if hdr.is_large() {
            BigEndian::write_u64(&mut self.buf[at + 8..at + 16], hdr.size);
        } else {
            let size32 = u32::try_from(hdr.size).map_err(|_| Error::BoxTooLarge { typ: hdr.typ, size: hdr.size })?;
            BigEndian::write_u32(&mut self.buf[at..at + 4], size32);
        }
        Ok(())
    }

    /// Finish writing. All boxes must have been closed.
    pub fn into_inner(self) -> Result<Vec<u8>> {
        if let Some(open) = self.open.last() {
            return Err(io::Error::other(format!("box '{}' left open", open.typ)).into());
        }
        Ok(self.buf)
    }
}
