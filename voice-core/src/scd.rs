//! SCD sound container layout.
//!
//! An SCD holds a header region (tables, track records, entry records)
//! followed by the clip payloads. No table stores a clip's length: it is
//! implied by the gap to the next clip start, or to the end of the file for the
//! last one. All multi-byte fields are little-endian.

use thiserror::Error;

use crate::voice::{Voice, VoiceOrigin};

pub const SCD_MAGIC: &[u8; 8] = b"SEDBSSCF";

/// u32 format version.
pub const VERSION_OFFSET: usize = 0x08;
/// u16 pointer to the table sub-header.
pub const SUBHEADER_PTR_OFFSET: usize = 0x0E;
/// u32 total file size, rewritten on save.
pub const FILE_SIZE_OFFSET: usize = 0x10;

// Sub-header fields, relative to the sub-header pointer.
const ENTRY_COUNT_OFFSET: usize = 0x00; // u16
const INDEX_COUNT_OFFSET: usize = 0x02; // u16
const CLIP_COUNT_OFFSET: usize = 0x04; // u16
const INDEX_TABLE_PTR_OFFSET: usize = 0x08; // u32
const CLIP_TABLE_PTR_OFFSET: usize = 0x0C; // u32
const ENTRY_TABLE_OFFSET: usize = 0x20;

// Entry record fields, relative to the entry pointer.
const ENTRY_TAG_OFFSET: usize = 0x00; // u16
const ENTRY_INDEX_OFFSET: usize = 0x10; // u16, index into the index table
const ENTRY_CLIP_OFFSET: usize = 0x12; // u16, clip slot
const ENTRY_TAG_NO_DURATION: u16 = 0x0100;

/// u32 sample count, relative to the record an index-table entry points at.
const DURATION_FIELD_OFFSET: usize = 0x50;

/// Newest version whose track records carry per-clip durations.
pub const MAX_DURATION_VERSION: u32 = 3;

#[derive(Debug, Error)]
pub enum ScdError {
    #[error("missing SEDBSSCF signature")]
    BadMagic,

    #[error("{what} at 0x{offset:X} ({len} bytes) extends beyond end of data ({size} bytes)")]
    Truncated {
        what: &'static str,
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("clip {slot} starts at 0x{offset:X}, beyond end of file ({size} bytes)")]
    ClipOutOfRange { slot: usize, offset: usize, size: usize },

    #[error("more than one clip starts at offset 0x{offset:X}")]
    DuplicateClipOffset { offset: usize },

    #[error("clip {slot} is only {len} bytes, too short to hold a codec field")]
    ClipTooShort { slot: usize, len: usize },

    #[error("entry {entry} references index {index}, but the index table has {count} entries")]
    IndexOutOfRange { entry: usize, index: usize, count: usize },

    #[error("entry {entry} references clip {clip}, but only {count} clips exist")]
    ClipIndexOutOfRange { entry: usize, clip: usize, count: usize },

    #[error("expected {expected} voices, got {got}")]
    SlotCountMismatch { expected: usize, got: usize },

    #[error("slot {slot} holds a voice but has no duration field")]
    MissingDurationField { slot: usize },

    #[error("duration field for slot {slot} at 0x{offset:X} lies outside the rebuilt file")]
    DurationFieldOutOfRange { slot: usize, offset: usize },

    #[error("container of {size} bytes cannot be addressed with 32-bit offsets")]
    TooLarge { size: usize },
}

pub fn has_scd_magic(data: &[u8]) -> bool {
    data.starts_with(SCD_MAGIC)
}

fn read_bytes<const N: usize>(
    data: &[u8],
    offset: usize,
    what: &'static str,
) -> Result<[u8; N], ScdError> {
    match offset.checked_add(N).and_then(|end| data.get(offset..end)) {
        Some(bytes) => {
            let mut out = [0u8; N];
            out.copy_from_slice(bytes);
            Ok(out)
        }
        None => Err(ScdError::Truncated {
            what,
            offset,
            len: N,
            size: data.len(),
        }),
    }
}

fn read_u16(data: &[u8], offset: usize, what: &'static str) -> Result<u16, ScdError> {
    read_bytes::<2>(data, offset, what).map(u16::from_le_bytes)
}

fn read_u32(data: &[u8], offset: usize, what: &'static str) -> Result<u32, ScdError> {
    read_bytes::<4>(data, offset, what).map(u32::from_le_bytes)
}

fn read_u32_table(
    data: &[u8],
    start: usize,
    count: usize,
    what: &'static str,
) -> Result<Vec<usize>, ScdError> {
    (0..count)
        .map(|i| read_u32(data, start + i * 4, what).map(|v| v as usize))
        .collect()
}

fn write_u32(out: &mut [u8], offset: usize, value: u32) -> bool {
    match offset.checked_add(4).and_then(|end| out.get_mut(offset..end)) {
        Some(field) => {
            field.copy_from_slice(&value.to_le_bytes());
            true
        }
        None => false,
    }
}

/// Derives the header length and the byte length of every clip from the
/// clip-start table.
///
/// The starts are sorted together with `file_len` as a final bound; each clip
/// runs up to the next boundary after its own start, and the smallest
/// boundary is where the header ends. Shared starts are rejected rather than
/// resolved to zero-length clips.
pub fn clip_extents(offsets: &[usize], file_len: usize) -> Result<(usize, Vec<usize>), ScdError> {
    for (slot, &offset) in offsets.iter().enumerate() {
        if offset > file_len {
            return Err(ScdError::ClipOutOfRange {
                slot,
                offset,
                size: file_len,
            });
        }
    }

    let mut sorted = offsets.to_vec();
    sorted.sort_unstable();
    if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(ScdError::DuplicateClipOffset { offset: pair[0] });
    }
    sorted.push(file_len);
    sorted.sort_unstable();

    let header_len = sorted[0];
    let lengths = offsets
        .iter()
        .map(|&offset| {
            let pos = sorted.partition_point(|&b| b < offset);
            sorted[pos + 1] - offset
        })
        .collect();

    Ok((header_len, lengths))
}

/// One clip slot: where its start offset lives in the header, where its
/// duration lives (older versions only), and the voice it currently holds.
#[derive(Debug, Clone)]
pub struct Slot {
    offset_field: usize,
    duration_field: Option<usize>,
    voice: Voice,
}

impl Slot {
    pub fn offset_field(&self) -> usize {
        self.offset_field
    }

    pub fn duration_field(&self) -> Option<usize> {
        self.duration_field
    }

    pub fn voice(&self) -> &Voice {
        &self.voice
    }
}

#[derive(Debug, Clone)]
pub struct ScdFile {
    name: String,
    version: u32,
    header: Vec<u8>,
    slots: Vec<Slot>,
}

impl ScdFile {
    /// Parses a whole container held in memory. `name` is the container's
    /// path relative to the game root and tags every voice's origin.
    pub fn parse(data: &[u8], name: impl Into<String>) -> Result<Self, ScdError> {
        let name = name.into();
        if !has_scd_magic(data) {
            return Err(ScdError::BadMagic);
        }

        let version = read_u32(data, VERSION_OFFSET, "version")?;
        let sub = read_u16(data, SUBHEADER_PTR_OFFSET, "sub-header pointer")? as usize;

        let entry_count = read_u16(data, sub + ENTRY_COUNT_OFFSET, "entry count")? as usize;
        let index_count = read_u16(data, sub + INDEX_COUNT_OFFSET, "index count")? as usize;
        let clip_count = read_u16(data, sub + CLIP_COUNT_OFFSET, "clip count")? as usize;
        let index_table = read_u32(data, sub + INDEX_TABLE_PTR_OFFSET, "index table pointer")? as usize;
        let clip_table = read_u32(data, sub + CLIP_TABLE_PTR_OFFSET, "clip table pointer")? as usize;

        let entries = read_u32_table(data, sub + ENTRY_TABLE_OFFSET, entry_count, "entry table")?;
        let indices = read_u32_table(data, index_table, index_count, "index table")?;
        let clip_starts = read_u32_table(data, clip_table, clip_count, "clip table")?;

        let (header_len, lengths) = clip_extents(&clip_starts, data.len())?;

        let mut slots = Vec::with_capacity(clip_count);
        for (slot, (&start, &len)) in clip_starts.iter().zip(&lengths).enumerate() {
            let origin = VoiceOrigin {
                file: name.clone(),
                slot,
            };
            let voice = Voice::new(data[start..start + len].to_vec(), origin)
                .ok_or(ScdError::ClipTooShort { slot, len })?;
            slots.push(Slot {
                offset_field: clip_table + slot * 4,
                duration_field: None,
                voice,
            });
        }

        if version <= MAX_DURATION_VERSION {
            for (entry, &ptr) in entries.iter().enumerate() {
                if read_u16(data, ptr + ENTRY_TAG_OFFSET, "entry tag")? == ENTRY_TAG_NO_DURATION {
                    continue;
                }

                let index = read_u16(data, ptr + ENTRY_INDEX_OFFSET, "entry index")? as usize;
                let clip = read_u16(data, ptr + ENTRY_CLIP_OFFSET, "entry clip")? as usize;
                let record = *indices.get(index).ok_or(ScdError::IndexOutOfRange {
                    entry,
                    index,
                    count: indices.len(),
                })?;
                let field = record + DURATION_FIELD_OFFSET;
                let duration = read_u32(data, field, "duration field")?;

                let count = slots.len();
                let slot = slots
                    .get_mut(clip)
                    .ok_or(ScdError::ClipIndexOutOfRange { entry, clip, count })?;
                slot.duration_field = Some(field);
                slot.voice.set_duration(duration);
            }
        }

        log::debug!(
            "{}: version {}, {} entries, {} clips, header 0x{:X} bytes",
            name,
            version,
            entry_count,
            clip_count,
            header_len
        );

        Ok(Self {
            name,
            version,
            header: data[..header_len].to_vec(),
            slots,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn has_durations(&self) -> bool {
        self.version <= MAX_DURATION_VERSION
    }

    pub fn header_len(&self) -> usize {
        self.header.len()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn voices(&self) -> impl Iterator<Item = &Voice> {
        self.slots.iter().map(|s| &s.voice)
    }

    pub fn voices_mut(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.slots.iter_mut().map(|s| &mut s.voice)
    }

    /// Replaces every slot's voice at once. The slot count never changes.
    pub fn replace_voices(&mut self, voices: Vec<Voice>) -> Result<(), ScdError> {
        if voices.len() != self.slots.len() {
            return Err(ScdError::SlotCountMismatch {
                expected: self.slots.len(),
                got: voices.len(),
            });
        }
        for (slot, voice) in self.slots.iter_mut().zip(voices) {
            slot.voice = voice;
        }
        Ok(())
    }

    /// Rebuilds the container from the header and the current voices,
    /// recomputing every clip offset, duration and the total size.
    pub fn save(&self) -> Result<Vec<u8>, ScdError> {
        let total = self
            .slots
            .iter()
            .try_fold(self.header.len(), |acc, s| acc.checked_add(s.voice.len()))
            .ok_or(ScdError::TooLarge { size: usize::MAX })?;
        let total_u32 = u32::try_from(total).map_err(|_| ScdError::TooLarge { size: total })?;

        let mut out = vec![0u8; total];
        out[..self.header.len()].copy_from_slice(&self.header);

        let mut cursor = self.header.len();
        for (i, slot) in self.slots.iter().enumerate() {
            // cursor < total, which fits in u32.
            if !write_u32(&mut out, slot.offset_field, cursor as u32) {
                return Err(ScdError::Truncated {
                    what: "clip offset field",
                    offset: slot.offset_field,
                    len: 4,
                    size: total,
                });
            }

            let end = cursor + slot.voice.len();
            out[cursor..end].copy_from_slice(slot.voice.data());

            if !slot.voice.is_dummy() && self.has_durations() {
                let field = slot
                    .duration_field
                    .ok_or(ScdError::MissingDurationField { slot: i })?;
                match slot.voice.duration() {
                    Some(duration) => {
                        if !write_u32(&mut out, field, duration) {
                            return Err(ScdError::DurationFieldOutOfRange {
                                slot: i,
                                offset: field,
                            });
                        }
                    }
                    None => log::warn!(
                        "{}: slot {} received a voice from {} with no known duration; keeping the old value",
                        self.name,
                        i,
                        slot.voice.origin().file
                    ),
                }
            }

            cursor = end;
        }

        if !write_u32(&mut out, FILE_SIZE_OFFSET, total_u32) {
            return Err(ScdError::Truncated {
                what: "file size field",
                offset: FILE_SIZE_OFFSET,
                len: 4,
                size: total,
            });
        }

        Ok(out)
    }
}
