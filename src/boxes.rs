use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const MOOV: FourCC = FourCC(*b"moov");
    pub const UDTA: FourCC = FourCC(*b"udta");
    pub const META: FourCC = FourCC(*b"meta");
    pub const ILST: FourCC = FourCC(*b"ilst");
    pub const HDLR: FourCC = FourCC(*b"hdlr");
    pub const DATA: FourCC = FourCC(*b"data");
    pub const MDAT: FourCC = FourCC(*b"mdat");
    pub const STCO: FourCC = FourCC(*b"stco");
    pub const CO64: FourCC = FourCC(*b"co64");

    /// Printable form; the `©` lead byte (0xA9) of iTunes atoms is spelled out.
    pub fn as_str_lossy(&self) -> String {
        self.0
            .iter()
            .map(|&c| match c {
                32..=126 => c as char,
                0xA9 => '©',
                _ => '.',
            })
            .collect()
    }
}
impl fmt::Debug for FourCC { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str_lossy()) } }
impl fmt::Display for FourCC { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str_lossy()) } }

#[derive(Debug, Clone)]
pub struct BoxHeader {
    /// Total size including the header. A stored size of 0 is resolved to
    /// the end of the enclosing box.
    pub size: u64,
    /// Four-character box type
    pub typ: FourCC,
    /// 8, or 16 for the `largesize` form
    pub header_size: u64,
    /// Absolute offset of the header
    pub start: u64,
}

impl BoxHeader {
    /// Offset one past the last byte of the box.
    pub fn end(&self) -> u64 { self.start + self.size }
    pub fn payload_start(&self) -> u64 { self.start + self.header_size }
    pub fn payload_len(&self) -> u64 { self.size - self.header_size }
    /// Header used the 64-bit `largesize` form.
    pub fn is_large(&self) -> bool { self.header_size == 16 }
}

#[derive(Debug)]
pub enum NodeKind {
    Container(Vec<BoxRef>),
    /// Container whose children follow a version/flags word (ISO `meta`).
    FullContainer { version: u8, flags: u32, children: Vec<BoxRef> },
    Leaf { data_offset: u64, data_len: u64 },
}

#[derive(Debug)]
pub struct BoxRef {
    /// Header as read from the source
    pub hdr: BoxHeader,
    /// Children, or where the payload lives for leaves
    pub kind: NodeKind,
}

impl BoxRef {
    pub fn typ(&self) -> FourCC { self.hdr.typ }

    pub fn children(&self) -> &[BoxRef] {
        match &self.kind {
            NodeKind::Container(kids) | NodeKind::FullContainer { children: kids, .. } => kids,
            NodeKind::Leaf { .. } => &[],
        }
    }

    /// First direct child of the given type.
    pub fn child(&self, typ: FourCC) -> Option<&BoxRef> {
        self.children().iter().find(|c| c.hdr.typ == typ)
    }

    pub fn is_leaf(&self) -> bool { matches!(self.kind, NodeKind::Leaf { .. }) }
}

/// First box of the given type in a sibling list.
pub fn find<'a>(boxes: &'a [BoxRef], typ: FourCC) -> Option<&'a BoxRef> {
    boxes.iter().find(|b| b.hdr.typ == typ)
}
