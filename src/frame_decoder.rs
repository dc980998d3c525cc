pub use crate::frame_shared::*;

// —————————————————————————————————————————————————————————————————————————————————————————————————
//                                           Frame Decoder
// —————————————————————————————————————————————————————————————————————————————————————————————————

use tracing::debug;

use crate::crc16::{checksum, verify};
use crate::scalar::decode_u16_be;

/// One piece of a scanned buffer.
#[derive(Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Bytes outside any frame, usually debug text printed by the device.
    Text(&'a [u8]),
    /// Payload of a frame whose checksum verified.
    Frame(&'a [u8]),
    /// A well delimited frame whose checksum did not match. Scanning resumes right after its
    /// marker, so its bytes come back as text or as frames nested inside it.
    Corrupt { received: u16, computed: u16 },
}

#[derive(Debug)]
pub struct FilterResult<'a> {
    /// Scanned data in stream order.
    pub segments:   Vec<Segment<'a>>,
    /// Everything before this index has been consumed.
    pub trim_index: usize,
}

impl FilterResult<'_> {
    pub fn frames(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Frame(payload) => Some(*payload),
            _ => None,
        })
    }
}

pub struct FrameDecoder<'a> {
    data:       &'a [u8],
    cursor:     usize,
    text_start: usize,
}

impl<'a> FrameDecoder<'a> {
    /// Zero-copy frame filter.
    ///
    /// Splits the input into text, verified frames and corrupt frames, and returns the index up
    /// to which the buffer can be drained. A frame still arriving at the end of the buffer stays
    /// past `trim_index`, so the caller appends new data and scans again.
    ///
    /// A marker is only trusted when the terminator sits where its length byte says. Otherwise
    /// the marker is treated as text and scanning resumes on the next byte. The same applies
    /// after a checksum mismatch, which is reported as [`Segment::Corrupt`] first.
    ///
    /// A marker whose length byte reaches past the end of `data` holds back everything after it,
    /// text included, until `5 + len` bytes (at most 260) are buffered.
    #[inline]
    pub fn filter_buffer(data: &'a [u8]) -> FilterResult<'a> {
        let mut decoder = Self {
            data,
            cursor: 0,
            text_start: 0,
        };
        let mut segments = Vec::new();

        while decoder.next_segment(&mut segments).is_some() {}

        FilterResult {
            segments,
            trim_index: decoder.text_start,
        }
    }

    /// Pushes the next frame (and the text before it). `None` once nothing more can be decoded.
    fn next_segment(&mut self, out: &mut Vec<Segment<'a>>) -> Option<()> {
        // ---- Find frame start
        let Some(found_rel) = self.data[self.cursor..].iter().position(|&b| b == MARKER)
        else {
            // No marker left, all of it is text
            self.flush_text(self.data.len(), out);
            return None;
        };

        let start_pos = self.cursor + found_rel;

        // ---- Extract Length
        let size_pos = start_pos + MARKER_LEN;
        if size_pos >= self.data.len() {
            self.flush_text(start_pos, out);
            return None;
        }
        let payload_len = self.data[size_pos] as usize;

        // Ensure frame fits in buffer
        let end_pos = start_pos + FRAME_OVERHEAD + payload_len;
        if end_pos > self.data.len() {
            self.flush_text(start_pos, out);
            return None;
        }

        // ---- Check terminator
        if self.data[end_pos - TERMINATOR_LEN] != TERMINATOR {
            // False marker, keep it as text
            self.cursor = start_pos + MARKER_LEN;
            return Some(());
        }

        // ---- Extract Payload
        let payload_start = start_pos + HEADER_LEN;
        let crc_pos = payload_start + payload_len;
        let payload = &self.data[payload_start..crc_pos];
        let received = decode_u16_be([self.data[crc_pos], self.data[crc_pos + 1]]);

        self.flush_text(start_pos, out);

        if !verify(payload, received) {
            let computed = checksum(payload);
            debug!(received, computed, len = payload_len, "dropping corrupt frame");
            out.push(Segment::Corrupt { received, computed });
            self.cursor = start_pos + MARKER_LEN;
            return Some(());
        }

        out.push(Segment::Frame(payload));
        self.cursor = end_pos;
        self.text_start = end_pos;
        Some(())
    }

    fn flush_text(&mut self, until: usize, out: &mut Vec<Segment<'a>>) {
        if until > self.text_start {
            out.push(Segment::Text(&self.data[self.text_start..until]));
        }
        self.text_start = until;
    }
}
