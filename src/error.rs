//! Error type shared by reading, rebuilding and patching.

use crate::boxes::FourCC;
use crate::parser::ParseError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Structural corruption in the box tree.
    #[error("parse: {0}")]
    Parse(#[from] ParseError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// A metadata payload is shorter than its codec requires.
    #[error("'{atom}' payload too short: need {need} bytes, have {have}")]
    PayloadTooShort { atom: FourCC, need: usize, have: usize },

    /// Shifting a chunk offset would leave the table's integer range.
    #[error("'{table}' offset {offset} cannot be shifted by {delta}")]
    OffsetOverflow { table: FourCC, offset: u64, delta: i64 },

    /// A rebuilt box no longer fits in its 32-bit size field.
    #[error("box '{typ}' grew to {size} bytes, too large for a 32-bit header")]
    BoxTooLarge { typ: FourCC, size: u64 },

    #[error("no moov box to hold metadata")]
    MissingMoov,

    #[error("expected '{expected}' at {at}, found '{found}'")]
    UnexpectedBox { expected: &'static str, found: FourCC, at: u64 },

    #[error("image: {0}")]
    Image(#[from] image::ImageError),
}
