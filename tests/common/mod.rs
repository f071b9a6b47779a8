#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use mp4tag::boxes::{self, BoxRef, FourCC};
use mp4tag::parse_file;
use std::io::Cursor;

pub const MDAT_PAYLOAD_LEN: usize = 300;
pub const CHUNK_STEPS: [u64; 3] = [0, 100, 200];

pub fn bx(typ: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&((8 + payload.len()) as u32).to_be_bytes());
    v.extend_from_slice(typ);
    v.extend_from_slice(payload);
    v
}

pub fn container(typ: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    bx(typ, &children.concat())
}

pub fn ftyp() -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(b"M4A ");
    p.extend_from_slice(&512u32.to_be_bytes());
    p.extend_from_slice(b"M4A isom");
    bx(b"ftyp", &p)
}

pub fn data_box(data_type: u32, value: &[u8]) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&data_type.to_be_bytes()); // version 0 + type
    p.extend_from_slice(&0u32.to_be_bytes()); // locale
    p.extend_from_slice(value);
    bx(b"data", &p)
}

pub fn atom(typ: &[u8; 4], data_type: u32, value: &[u8]) -> Vec<u8> {
    container(typ, &[data_box(data_type, value)])
}

pub fn text_atom(typ: &[u8; 4], s: &str) -> Vec<u8> {
    atom(typ, 1, s.as_bytes())
}

pub fn pair_atom(typ: &[u8; 4], cur: u16, total: u16) -> Vec<u8> {
    let mut v = vec![0u8, 0];
    v.extend_from_slice(&cur.to_be_bytes());
    v.extend_from_slice(&total.to_be_bytes());
    v.extend_from_slice(&[0, 0]);
    atom(typ, 0, &v)
}

pub fn hdlr() -> Vec<u8> {
    let mut p = vec![0u8; 8];
    p.extend_from_slice(b"mdir");
    p.extend_from_slice(b"appl");
    p.extend_from_slice(&[0u8; 9]);
    bx(b"hdlr", &p)
}

/// ISO-style meta: version/flags word, then children.
pub fn meta(children: &[Vec<u8>]) -> Vec<u8> {
    let mut p = vec![0u8; 4];
    p.extend_from_slice(&children.concat());
    bx(b"meta", &p)
}

pub fn ilst(items: &[Vec<u8>]) -> Vec<u8> {
    container(b"ilst", items)
}

/// udta → meta(hdlr, ilst(items))
pub fn udta_with(items: &[Vec<u8>]) -> Vec<u8> {
    container(b"udta", &[meta(&[hdlr(), ilst(items)])])
}

pub fn free(n: usize) -> Vec<u8> {
    bx(b"free", &vec![0u8; n])
}

pub fn stco(offsets: &[u64]) -> Vec<u8> {
    let mut p = vec![0u8; 4];
    p.extend_from_slice(&(offsets.len() as u32).to_be_bytes());
    for &o in offsets {
        p.extend_from_slice(&(o as u32).to_be_bytes());
    }
    bx(b"stco", &p)
}

pub fn co64(offsets: &[u64]) -> Vec<u8> {
    let mut p = vec![0u8; 4];
    p.extend_from_slice(&(offsets.len() as u32).to_be_bytes());
    for &o in offsets {
        p.extend_from_slice(&o.to_be_bytes());
    }
    bx(b"co64", &p)
}

pub fn trak(table: Vec<u8>) -> Vec<u8> {
    let stbl = container(b"stbl", &[bx(b"stsd", &[0u8; 16]), table]);
    let minf = container(b"minf", &[stbl]);
    let mdia = container(b"mdia", &[bx(b"mdhd", &[0u8; 24]), minf]);
    container(b"trak", &[bx(b"tkhd", &[0u8; 84]), mdia])
}

pub fn moov(udta: Option<Vec<u8>>, table: Vec<u8>) -> Vec<u8> {
    let mut kids = vec![bx(b"mvhd", &[0u8; 100]), trak(table)];
    kids.extend(udta);
    container(b"moov", &kids)
}

pub fn mdat() -> Vec<u8> {
    let payload: Vec<u8> = (0..MDAT_PAYLOAD_LEN).map(|i| (i % 251) as u8).collect();
    bx(b"mdat", &payload)
}

fn offsets(base: u64) -> Vec<u64> {
    CHUNK_STEPS.iter().map(|s| base + s).collect()
}

fn build(udta: Option<Vec<u8>>, mdat_first: bool, wide: bool) -> Vec<u8> {
    let table = |base: u64| if wide { co64(&offsets(base)) } else { stco(&offsets(base)) };
    let ftyp = ftyp();
    let placeholder = moov(udta.clone(), table(0));
    let mdat_start = (if mdat_first { ftyp.len() } else { ftyp.len() + placeholder.len() }) as u64;
    let moov = moov(udta, table(mdat_start + 8));
    if mdat_first {
        [ftyp, mdat(), moov].concat()
    } else {
        [ftyp, moov, mdat()].concat()
    }
}

/// ftyp, moov (with an stco pointing into mdat), mdat.
pub fn m4a(udta: Option<Vec<u8>>) -> Vec<u8> {
    build(udta, false, false)
}

/// Same as [`m4a`] but with a 64-bit chunk offset table.
pub fn m4a_co64(udta: Option<Vec<u8>>) -> Vec<u8> {
    build(udta, false, true)
}

/// ftyp, mdat, moov: metadata changes never move the media.
pub fn m4a_mdat_first(udta: Option<Vec<u8>>) -> Vec<u8> {
    build(udta, true, false)
}

pub fn tree(file: &[u8]) -> Vec<BoxRef> {
    parse_file(&mut Cursor::new(file)).unwrap()
}

pub fn box_bytes<'a>(file: &'a [u8], b: &BoxRef) -> &'a [u8] {
    &file[b.hdr.start as usize..b.hdr.end() as usize]
}

/// Bytes of the first top-level box of the given type.
pub fn top_level(file: &[u8], typ: &[u8; 4]) -> Vec<u8> {
    let t = tree(file);
    let b = boxes::find(&t, FourCC(*typ)).unwrap();
    box_bytes(file, b).to_vec()
}

/// Absolute offset of the first byte of mdat's payload.
pub fn mdat_payload_start(file: &[u8]) -> u64 {
    let t = tree(file);
    boxes::find(&t, FourCC::MDAT).unwrap().hdr.payload_start()
}

pub fn chunk_offsets(file: &[u8]) -> Vec<u64> {
    let t = tree(file);
    let stbl = boxes::find(&t, FourCC::MOOV)
        .and_then(|m| m.child(FourCC(*b"trak")))
        .and_then(|b| b.child(FourCC(*b"mdia")))
        .and_then(|b| b.child(FourCC(*b"minf")))
        .and_then(|b| b.child(FourCC(*b"stbl")))
        .unwrap();
    let table = stbl
        .children()
        .iter()
        .find(|c| c.typ() == FourCC::STCO || c.typ() == FourCC::CO64)
        .unwrap();
    let p = &file[table.hdr.payload_start() as usize..table.hdr.end() as usize];
    let count = u32::from_be_bytes(p[4..8].try_into().unwrap()) as usize;
    let width = if table.typ() == FourCC::CO64 { 8 } else { 4 };
    p[8..8 + count * width]
        .chunks(width)
        .map(|c| if width == 4 {
            u32::from_be_bytes(c.try_into().unwrap()) as u64
        } else {
            u64::from_be_bytes(c.try_into().unwrap())
        })
        .collect()
}

/// Chunk offsets relative to the start of mdat's payload.
pub fn relative_chunk_offsets(file: &[u8]) -> Vec<u64> {
    let base = mdat_payload_start(file);
    chunk_offsets(file).into_iter().map(|o| o - base).collect()
}

/// Whether any box header of this type appears in `file`.
pub fn contains_atom(file: &[u8], typ: &[u8; 4]) -> bool {
    file.windows(4).any(|w| w == typ)
}

pub fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 7) as u8, (y * 13) as u8, 0x80]));
    let mut cur = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut cur, format).unwrap();
    cur.into_inner()
}
