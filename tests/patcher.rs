mod common;

use common::*;
use mp4tag::patcher::patch_chunk_offsets;
use mp4tag::Error;

fn entries(buf: &[u8], width: usize) -> Vec<u64> {
    buf[16..]
        .chunks(width)
        .map(|c| if width == 4 {
            u32::from_be_bytes(c.try_into().unwrap()) as u64
        } else {
            u64::from_be_bytes(c.try_into().unwrap())
        })
        .collect()
}

#[test]
fn shifts_both_table_widths() {
    let mut buf = [stco(&[100, 200]), co64(&[5_000_000_000])].concat();
    let co64_at = stco(&[100, 200]).len() as u64;

    patch_chunk_offsets(&mut buf, &[0, co64_at], 50).unwrap();
    assert_eq!(entries(&buf[..co64_at as usize], 4), vec![150, 250]);
    assert_eq!(entries(&buf[co64_at as usize..], 8), vec![5_000_000_050]);

    patch_chunk_offsets(&mut buf, &[0], -150).unwrap();
    assert_eq!(entries(&buf[..co64_at as usize], 4), vec![0, 100]);
}

#[test]
fn zero_delta_touches_nothing() {
    // the position does not even point at a table
    let mut buf = free(8);
    let before = buf.clone();
    patch_chunk_offsets(&mut buf, &[3], 0).unwrap();
    assert_eq!(buf, before);
}

#[test]
fn wrong_box_is_rejected() {
    let mut buf = free(8);
    let err = patch_chunk_offsets(&mut buf, &[0], 4).unwrap_err();
    assert!(matches!(err, Error::UnexpectedBox { at: 0, .. }));
}

#[test]
fn count_past_payload_is_rejected() {
    // claims three entries, carries one
    let mut p = vec![0u8; 4];
    p.extend_from_slice(&3u32.to_be_bytes());
    p.extend_from_slice(&64u32.to_be_bytes());
    let mut buf = bx(b"stco", &p);

    let err = patch_chunk_offsets(&mut buf, &[0], 1).unwrap_err();
    assert!(matches!(err, Error::PayloadTooShort { need: 20, have: 12, .. }));
}

#[test]
fn u64_overflow_is_rejected() {
    let mut buf = co64(&[u64::MAX - 1]);
    assert!(matches!(
        patch_chunk_offsets(&mut buf, &[0], 2),
        Err(Error::OffsetOverflow { offset, delta: 2, .. }) if offset == u64::MAX - 1
    ));
}
