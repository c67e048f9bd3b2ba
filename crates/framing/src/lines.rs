use crate::Framer;
use core_types::Frame;

/// Buffers modem output and emits a frame for every `\n`-terminated line.
///
/// Serial reads hand over arbitrary slices of the response stream, so a
/// `+CMGL:` header or a PDU line can be split across several chunks. Bytes
/// after the last newline stay buffered until the next push.
/// Frames keep their terminator (`\r\n`); use [`Frame::text`] to strip it.
pub struct LineFramer {
    buffer: Vec<u8>,
    // Timestamp of the first byte currently in the buffer
    start_timestamp_us: Option<u64>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(512),
            start_timestamp_us: None,
        }
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framer for LineFramer {
    fn push(&mut self, bytes: &[u8], timestamp_us: u64) -> Vec<Frame> {
        let mut frames = Vec::new();

        for &b in bytes {
            if self.buffer.is_empty() && self.start_timestamp_us.is_none() {
                self.start_timestamp_us = Some(timestamp_us);
            }
            self.buffer.push(b);
            if b == b'\n' {
                let ts = self.start_timestamp_us.take().unwrap_or(timestamp_us);
                frames.push(Frame::new(std::mem::take(&mut self.buffer), ts));
            }
        }

        frames
    }
}
