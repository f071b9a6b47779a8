use crate::boxes::{BoxHeader, BoxRef, FourCC, NodeKind};
use crate::known_boxes::KnownBox;
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid box size")]
    InvalidSize,
    #[error("box '{typ}' at {start} claims {size} bytes but only {available} remain")]
    SizeOverrun { typ: FourCC, start: u64, size: u64, available: u64 },
    #[error("truncated box header at {start}")]
    TruncatedHeader { start: u64 },
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Read one box header at the current position.
///
/// A size of 0 is returned as-is; [`parse_children`] resolves it against
/// the enclosing box.
pub fn read_box_header<R: Read + Seek>(r: &mut R) -> Result<BoxHeader> {
    let start = r.stream_position()?;
    let size32 = r.read_u32::<BigEndian>()?;
    let mut typ = [0u8; 4]; r.read_exact(&mut typ)?;
    let mut size = size32 as u64;

    if size32 == 1 {
        size = r.read_u64::<BigEndian>()?;
    }

    let header_size = if size32 == 1 { 16 } else { 8 };

    if size != 0 && size < header_size {
        return Err(ParseError::InvalidSize);
    }

    Ok(BoxHeader { size, typ: FourCC(typ), header_size, start })
}

/// Parse a whole stream into its top-level boxes.
pub fn parse_file<R: Read + Seek>(r: &mut R) -> Result<Vec<BoxRef>> {
    let len = r.seek(SeekFrom::End(0))?;
    r.seek(SeekFrom::Start(0))?;
    parse_children(r, len)
}

pub fn parse_children<R: Read + Seek>(r: &mut R, parent_end: u64) -> Result<Vec<BoxRef>> {
    let mut kids = Vec::new();
    loop {
        let pos = r.stream_position()?;
        if pos >= parent_end {
            break;
        }
        if parent_end - pos < 8 {
            return Err(ParseError::TruncatedHeader { start: pos });
        }
        let mut h = read_box_header(r)?;
        let available = parent_end - h.start;
        if h.size == 0 {
            h.size = available;
        } else if h.size > available {
            return Err(ParseError::SizeOverrun { typ: h.typ, start: h.start, size: h.size, available });
        }
        let box_end = h.end();

        let kind = match KnownBox::from(h.typ) {
            KnownBox::Meta => parse_meta(r, &h)?,
            kb if kb.is_container() => {
                r.seek(SeekFrom::Start(h.payload_start()))?;
                NodeKind::Container(parse_children(r, box_end)?)
            }
            _ => NodeKind::Leaf { data_offset: h.payload_start(), data_len: h.payload_len() },
        };

        // Skip to end of box
        r.seek(SeekFrom::Start(box_end))?;
        kids.push(BoxRef { hdr: h, kind });
    }
    Ok(kids)
}

// ISO `meta` carries a version/flags word before its children, and that
// word is always zero. QuickTime writers omit it, so a non-zero first word
// is already the size of the first child.
fn parse_meta<R: Read + Seek>(r: &mut R, h: &BoxHeader) -> Result<NodeKind> {
    let content_start = h.payload_start();
    let quicktime = if h.payload_len() >= 4 {
        r.seek(SeekFrom::Start(content_start))?;
        r.read_u32::<BigEndian>()? != 0
    } else {
        true
    };
    if quicktime {
        r.seek(SeekFrom::Start(content_start))?;
        return Ok(NodeKind::Container(parse_children(r, h.end())?));
    }

    r.seek(SeekFrom::Start(content_start))?;
    let version = r.read_u8()?;
    let mut f = [0u8; 3]; r.read_exact(&mut f)?;
    let flags = ((f[0] as u32) << 16) | ((f[1] as u32) << 8) | (f[2] as u32);
    let children = parse_children(r, h.end())?;
    Ok(NodeKind::FullContainer { version, flags, children })
}
