mod common;

use common::*;
use mp4tag::{Mp4File, Mp4Tag, read_tag, write_tag_to_path};
use std::fs;
use std::io::Cursor;

fn tagged() -> Vec<u8> {
    m4a(Some(udta_with(&[
        text_atom(b"\xa9nam", "A rather long title that will be removed"),
        text_atom(b"\xa9cmt", "and a comment that goes with it"),
    ])))
}

#[test]
fn save_truncates_shrunk_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.m4a");
    let src = tagged();
    fs::write(&path, &src).unwrap();

    let mut file = Mp4File::open(&path).unwrap();
    file.tag_mut().clear_all();
    file.save_to_path(&path).unwrap();

    let on_disk = fs::read(&path).unwrap();
    assert!(on_disk.len() < src.len());
    assert_eq!(on_disk, file.source());
    assert!(read_tag(&mut Cursor::new(&on_disk)).unwrap().is_empty());
    assert_eq!(relative_chunk_offsets(&on_disk), relative_chunk_offsets(&src));
}

#[test]
fn write_tag_to_path_replaces_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.m4a");
    fs::write(&path, m4a(None)).unwrap();

    let mut tag = Mp4Tag::new();
    tag.set_album("On Disk");
    tag.set_disc_number(2);
    write_tag_to_path(&path, &tag).unwrap();

    let back = Mp4File::open(&path).unwrap();
    assert_eq!(back.tag(), &tag);
}

#[test]
fn same_file_can_be_saved_repeatedly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("twice.m4a");
    fs::write(&path, m4a(None)).unwrap();

    let mut file = Mp4File::open(&path).unwrap();
    file.tag_mut().set_title("first");
    file.save_to_path(&path).unwrap();
    file.tag_mut().set_artist("second");
    file.save_to_path(&path).unwrap();

    let back = Mp4File::open(&path).unwrap().into_tag();
    assert_eq!(back.title(), "first");
    assert_eq!(back.artist(), "second");
    let on_disk = fs::read(&path).unwrap();
    assert_eq!(relative_chunk_offsets(&on_disk), relative_chunk_offsets(&m4a(None)));
}

#[test]
fn save_to_writer_leaves_source_alone() {
    let src = tagged();
    let mut file = Mp4File::from_reader(Cursor::new(src.clone())).unwrap();
    file.tag_mut().set_bpm(128);

    let mut out = Vec::new();
    file.save(&mut out).unwrap();
    assert_eq!(file.source(), src.as_slice());
    assert_eq!(read_tag(&mut Cursor::new(&out)).unwrap().bpm(), 128);
    assert_eq!(out, file.to_bytes().unwrap());
}

#[test]
fn failed_save_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bare.mp4");
    let src = [ftyp(), mdat()].concat();
    fs::write(&path, &src).unwrap();

    let mut tag = Mp4Tag::new();
    tag.set_title("no moov");
    assert!(write_tag_to_path(&path, &tag).is_err());
    assert_eq!(fs::read(&path).unwrap(), src);
}
