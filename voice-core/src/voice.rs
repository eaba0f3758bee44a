/// Payload offset of the codec field; a value of -1 marks a placeholder slot.
pub const DUMMY_MARKER_OFFSET: usize = 0x0C;
pub const DUMMY_MARKER: i32 = -1;

/// Where a clip was found when its container was parsed. Used for the
/// spoiler log and to check that a shuffle conserves the pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VoiceOrigin {
    pub file: String,
    pub slot: usize,
}

/// One audio entry from a container. The payload is never modified; the whole
/// value moves between slots when voices are redistributed.
#[derive(Debug, Clone)]
pub struct Voice {
    data: Vec<u8>,
    is_dummy: bool,
    duration: Option<u32>,
    origin: VoiceOrigin,
}

impl Voice {
    /// Returns `None` when the payload is too short to hold the codec field.
    pub fn new(data: Vec<u8>, origin: VoiceOrigin) -> Option<Self> {
        let marker = data.get(DUMMY_MARKER_OFFSET..DUMMY_MARKER_OFFSET + 4)?;
        let is_dummy = i32::from_le_bytes([marker[0], marker[1], marker[2], marker[3]]) == DUMMY_MARKER;
        Some(Self {
            data,
            is_dummy,
            duration: None,
            origin,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_dummy(&self) -> bool {
        self.is_dummy
    }

    /// Sample count read from the owning container's track table. Only
    /// version <= 3 containers carry one.
    pub fn duration(&self) -> Option<u32> {
        self.duration
    }

    pub fn set_duration(&mut self, duration: u32) {
        self.duration = Some(duration);
    }

    pub fn origin(&self) -> &VoiceOrigin {
        &self.origin
    }
}
