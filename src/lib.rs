pub mod api;
pub mod atoms;
pub mod boxes;
pub mod cover;
pub mod decoder;
pub mod error;
pub mod genres;
pub mod known_boxes;
pub mod parser;
pub mod patcher;
pub mod rebuild;
pub mod tag;
pub mod writer;

pub use api::{Mp4File, rewrite, write_tag_to_path};
pub use boxes::{BoxHeader, BoxRef, FourCC, NodeKind};
pub use cover::CoverArt;
pub use decoder::{decode_tree, read_tag};
pub use error::{Error, Result};
pub use parser::{parse_children, parse_file, read_box_header};
pub use tag::{Mp4Tag, TagField, TagValue};
