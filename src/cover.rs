use crate::error::Result;
use image::{DynamicImage, ImageFormat};
use serde::Serialize;
use serde::ser::SerializeStruct;
use std::io::Cursor;

// Well-known `data` type indicators for images.
const TYPE_JPEG: u32 = 13;
const TYPE_PNG: u32 = 14;
const TYPE_BMP: u32 = 27;
const TYPE_IMPLICIT: u32 = 0;

/// Embedded cover image.
///
/// Holds the encoded bytes exactly as stored in the `covr` atom; pixels
/// are only decoded on request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverArt {
    data: Vec<u8>,
    format: Option<ImageFormat>,
}

impl CoverArt {
    /// Wrap already-encoded image bytes, sniffing the format from the magic.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let format = image::guess_format(&data).ok();
        Self { data, format }
    }

    /// Encode a decoded image as PNG.
    pub fn from_image(img: &DynamicImage) -> Result<Self> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png)?;
        Ok(Self { data: buf.into_inner(), format: Some(ImageFormat::Png) })
    }

    pub fn decode(&self) -> Result<DynamicImage> {
        let img = match self.format {
            Some(fmt) => image::load_from_memory_with_format(&self.data, fmt)?,
            None => image::load_from_memory(&self.data)?,
        };
        Ok(img)
    }

    pub fn bytes(&self) -> &[u8] { &self.data }

    pub fn format(&self) -> Option<ImageFormat> { self.format }

    /// Type indicator written in the `data` box.
    pub fn data_type(&self) -> u32 {
        match self.format {
            Some(ImageFormat::Jpeg) => TYPE_JPEG,
            Some(ImageFormat::Png) => TYPE_PNG,
            Some(ImageFormat::Bmp) => TYPE_BMP,
            _ => TYPE_IMPLICIT,
        }
    }
}

impl Serialize for CoverArt {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        let mut st = s.serialize_struct("CoverArt", 2)?;
        st.serialize_field("mime", &self.format.map(|f| f.to_mime_type()))?;
        st.serialize_field("bytes", &self.data.len())?;
        st.end()
    }
}
