use crate::{
    boxes::BoxRef,
    decoder::decode_tree,
    error::Result,
    parser::parse_file,
    patcher::patch_chunk_offsets,
    rebuild::{Rebuilt, rebuild},
    tag::Mp4Tag,
};
use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use tracing::debug;

/// Rewrite an in-memory container so its metadata matches `tag`.
///
/// Runs the rebuild stage, then patches chunk offsets in the rebuilt
/// buffer. On error nothing is returned; `src` is never modified.
///
/// ```no_run
/// use mp4tag::{read_tag, rewrite};
/// use std::io::Cursor;
///
/// let src = std::fs::read("song.m4a")?;
/// let mut tag = read_tag(&mut Cursor::new(&src))?;
/// tag.set_artist("Someone Else");
/// let out = rewrite(&src, &tag)?;
/// std::fs::write("song.m4a", out)?;
/// # Ok::<(), mp4tag::Error>(())
/// ```
pub fn rewrite(src: &[u8], tag: &Mp4Tag) -> Result<Vec<u8>> {
    let tree = parse_file(&mut Cursor::new(src))?;
    rewrite_tree(src, &tree, tag)
}

fn rewrite_tree(src: &[u8], tree: &[BoxRef], tag: &Mp4Tag) -> Result<Vec<u8>> {
    let Rebuilt { mut buffer, offset_delta, chunk_offset_tables } = rebuild(src, tree, tag)?;
    patch_chunk_offsets(&mut buffer, &chunk_offset_tables, offset_delta)?;
    Ok(buffer)
}

/// Read `path`, rewrite it with `tag` and replace the file contents.
pub fn write_tag_to_path(path: impl AsRef<Path>, tag: &Mp4Tag) -> Result<()> {
    let src = std::fs::read(&path)?;
    let out = rewrite(&src, tag)?;
    replace_file(path.as_ref(), &out)
}

// Truncate-then-write: the new length generally differs from the old one.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut f = File::create(path)?;
    f.write_all(bytes)?;
    f.flush()?;
    debug!(path = %path.display(), len = bytes.len(), "file replaced");
    Ok(())
}

/// A loaded container together with its decoded tag.
///
/// The source bytes serve as the template for every save; the tag is the
/// source of truth for the metadata.
#[derive(Debug)]
pub struct Mp4File {
    source: Vec<u8>,
    tree: Vec<BoxRef>,
    tag: Mp4Tag,
}

impl Mp4File {
    /// Parse an in-memory container and decode its tag.
    pub fn from_bytes(source: Vec<u8>) -> Result<Self> {
        let mut cur = Cursor::new(&source);
        let tree = parse_file(&mut cur)?;
        let tag = decode_tree(&mut cur, &tree)?;
        Ok(Self { source, tree, tag })
    }

    /// Read a whole stream into memory, then behave like [`Mp4File::from_bytes`].
    pub fn from_reader<R: Read>(mut r: R) -> Result<Self> {
        let mut source = Vec::new();
        r.read_to_end(&mut source)?;
        Self::from_bytes(source)
    }

    /// Load the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_bytes(std::fs::read(path)?)
    }

    /// The current tag; starts out as what the source holds.
    pub fn tag(&self) -> &Mp4Tag { &self.tag }

    /// Mutable tag, picked up by the next save.
    pub fn tag_mut(&mut self) -> &mut Mp4Tag { &mut self.tag }

    /// Replace the whole tag.
    pub fn set_tag(&mut self, tag: Mp4Tag) { self.tag = tag; }

    pub fn into_tag(self) -> Mp4Tag { self.tag }

    /// Bytes the next rewrite starts from: the loaded file, or the output
    /// of the last [`Mp4File::save_to_path`].
    pub fn source(&self) -> &[u8] { &self.source }

    /// Top-level boxes of [`Mp4File::source`].
    pub fn boxes(&self) -> &[BoxRef] { &self.tree }

    /// The rewritten container for the current tag.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        rewrite_tree(&self.source, &self.tree, &self.tag)
    }

    /// Write the rewritten container to `w`. Nothing is written on error.
    pub fn save<W: Write>(&self, w: &mut W) -> Result<()> {
        let out = self.to_bytes()?;
        w.write_all(&out)?;
        Ok(())
    }

    /// Replace the file at `path` with the rewritten container.
    ///
    /// On success the written bytes become the new template, so the same
    /// `Mp4File` can be edited and saved again.
    pub fn save_to_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let out = self.to_bytes()?;
        replace_file(path.as_ref(), &out)?;
        self.tree = parse_file(&mut Cursor::new(&out))?;
        self.source = out;
        Ok(())
    }
}
