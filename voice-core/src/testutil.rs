//! In-memory SCD builder for tests.
//!
//! Layout: fixed header, sub-header at 0x30, entry/index/clip tables, one
//! 0x20-byte entry record and one 0x54-byte track record per clip, then the
//! clip payloads back to back in slot order.

use crate::scd::{FILE_SIZE_OFFSET, SCD_MAGIC, SUBHEADER_PTR_OFFSET, VERSION_OFFSET};

const SUBHEADER: usize = 0x30;
const ENTRY_RECORD_SIZE: usize = 0x20;
const TRACK_RECORD_SIZE: usize = 0x54;

struct Layout {
    entry_table: usize,
    index_table: usize,
    clip_table: usize,
    entries: usize,
    tracks: usize,
    header_len: usize,
}

fn layout(count: usize) -> Layout {
    let entry_table = SUBHEADER + 0x20;
    let index_table = entry_table + 4 * count;
    let clip_table = index_table + 4 * count;
    let entries = clip_table + 4 * count;
    let tracks = entries + ENTRY_RECORD_SIZE * count;
    Layout {
        entry_table,
        index_table,
        clip_table,
        entries,
        tracks,
        header_len: tracks + TRACK_RECORD_SIZE * count,
    }
}

fn put_u16(buf: &mut [u8], at: usize, value: u16) {
    buf[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

/// A clip payload of `len` bytes filled with `fill`, with the codec field
/// set to -1 for dummies.
pub(crate) fn payload(fill: u8, len: usize, dummy: bool) -> Vec<u8> {
    let mut data = vec![fill; len.max(0x10)];
    let codec: i32 = if dummy { -1 } else { 6 };
    data[0x0C..0x10].copy_from_slice(&codec.to_le_bytes());
    data
}

/// Absolute offset of the duration field for `slot` in a file built with
/// `count` clips.
pub(crate) fn track_duration_offset(count: usize, slot: usize) -> usize {
    layout(count).tracks + TRACK_RECORD_SIZE * slot + 0x50
}

/// Builds a container from `(payload, duration)` pairs. Dummy payloads get an
/// entry tagged 0x0100 so no duration is mapped to them.
pub(crate) fn build_scd(version: u32, clips: &[(Vec<u8>, u32)]) -> Vec<u8> {
    let n = clips.len();
    let l = layout(n);
    let total = l.header_len + clips.iter().map(|(p, _)| p.len()).sum::<usize>();

    let mut buf = vec![0u8; total];
    buf[..8].copy_from_slice(SCD_MAGIC);
    put_u32(&mut buf, VERSION_OFFSET, version);
    put_u16(&mut buf, SUBHEADER_PTR_OFFSET, SUBHEADER as u16);
    put_u32(&mut buf, FILE_SIZE_OFFSET, total as u32);

    put_u16(&mut buf, SUBHEADER, n as u16);
    put_u16(&mut buf, SUBHEADER + 2, n as u16);
    put_u16(&mut buf, SUBHEADER + 4, n as u16);
    put_u32(&mut buf, SUBHEADER + 8, l.index_table as u32);
    put_u32(&mut buf, SUBHEADER + 12, l.clip_table as u32);

    let mut cursor = l.header_len;
    for (i, (data, duration)) in clips.iter().enumerate() {
        let entry = l.entries + ENTRY_RECORD_SIZE * i;
        let track = l.tracks + TRACK_RECORD_SIZE * i;
        let dummy = i32::from_le_bytes([data[0x0C], data[0x0D], data[0x0E], data[0x0F]]) == -1;

        put_u32(&mut buf, l.entry_table + 4 * i, entry as u32);
        put_u32(&mut buf, l.index_table + 4 * i, track as u32);
        put_u32(&mut buf, l.clip_table + 4 * i, cursor as u32);

        put_u16(&mut buf, entry, if dummy { 0x0100 } else { 0 });
        put_u16(&mut buf, entry + 0x10, i as u16);
        put_u16(&mut buf, entry + 0x12, i as u16);
        put_u32(&mut buf, track + 0x50, *duration);

        buf[cursor..cursor + data.len()].copy_from_slice(data);
        cursor += data.len();
    }

    buf
}
