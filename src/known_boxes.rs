use crate::boxes::FourCC;

/// Typed view over the box types this crate interprets.
///
/// Anything not in this list becomes `KnownBox::Unknown(fourcc)` and is
/// only ever copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownBox {
    // File-level / top-level
    Ftyp,
    Moov,
    Mdat,
    Free,
    Skip,
    Wide,

    // moov children
    Mvhd,
    Trak,
    Udta,

    // media structure
    Tkhd,
    Mdia,
    Mdhd,
    Minf,
    Stbl,
    Stco,
    Co64,

    // metadata chain
    Meta,
    Hdlr,
    Ilst,
    Data,

    // Anything else
    Unknown(FourCC),
}

impl From<FourCC> for KnownBox {
    fn from(cc: FourCC) -> Self {
        match &cc.0 {
            b"ftyp" => KnownBox::Ftyp,
            b"moov" => KnownBox::Moov,
            b"mdat" => KnownBox::Mdat,
            b"free" => KnownBox::Free,
            b"skip" => KnownBox::Skip,
            b"wide" => KnownBox::Wide,

            b"mvhd" => KnownBox::Mvhd,
            b"trak" => KnownBox::Trak,
            b"udta" => KnownBox::Udta,

            b"tkhd" => KnownBox::Tkhd,
            b"mdia" => KnownBox::Mdia,
            b"mdhd" => KnownBox::Mdhd,
            b"minf" => KnownBox::Minf,
            b"stbl" => KnownBox::Stbl,
            b"stco" => KnownBox::Stco,
            b"co64" => KnownBox::Co64,

            b"meta" => KnownBox::Meta,
            b"hdlr" => KnownBox::Hdlr,
            b"ilst" => KnownBox::Ilst,
            b"data" => KnownBox::Data,

            _ => KnownBox::Unknown(cc),
        }
    }
}

impl KnownBox {
    /// Does this box *contain* child boxes (container semantics)?
    ///
    /// The set is closed: unknown types are always leaves.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            KnownBox::Moov
                | KnownBox::Udta
                | KnownBox::Meta
                | KnownBox::Ilst
                | KnownBox::Trak
                | KnownBox::Mdia
                | KnownBox::Minf
                | KnownBox::Stbl
        )
    }

    /// Chunk-offset tables whose entries point into `mdat`.
    pub fn is_chunk_offset_table(&self) -> bool {
        matches!(self, KnownBox::Stco | KnownBox::Co64)
    }

    /// Padding boxes.
    pub fn is_padding(&self) -> bool {
        matches!(self, KnownBox::Free | KnownBox::Skip | KnownBox::Wide)
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            KnownBox::Ftyp => "File Type Box",
            KnownBox::Moov => "Movie Box",
            KnownBox::Mdat => "Media Data Box",
            KnownBox::Free => "Free Space Box",
            KnownBox::Skip => "Free Space Box",
            KnownBox::Wide => "Wide Placeholder Box",
            KnownBox::Mvhd => "Movie Header Box",
            KnownBox::Trak => "Track Box",
            KnownBox::Udta => "User Data Box",
            KnownBox::Tkhd => "Track Header Box",
            KnownBox::Mdia => "Media Box",
            KnownBox::Mdhd => "Media Header Box",
            KnownBox::Minf => "Media Information Box",
            KnownBox::Stbl => "Sample Table Box",
            KnownBox::Stco => "Chunk Offset Box",
            KnownBox::Co64 => "64-bit Chunk Offset Box",
            KnownBox::Meta => "Meta Box",
            KnownBox::Hdlr => "Handler Reference Box",
            KnownBox::Ilst => "Item List Box",
            KnownBox::Data => "Data Box",
            KnownBox::Unknown(_) => "Unknown Box",
        }
    }
}
