//! Test signal tables
//!
//! One period of a 1 kHz sine in the three sample layouts the audio path can
//! carry. Frames are cut from a table with wraparound, continuing where the
//! previous frame stopped.

use crate::constants::MAX_AUDIO_FRAME_LENGTH;
use heapless::Vec;

/// One audio frame
pub type AudioFrame = Vec<u8, MAX_AUDIO_FRAME_LENGTH>;

const fn le_bytes<const N: usize, const M: usize>(samples: [i16; N]) -> [u8; M] {
    let mut out = [0u8; M];
    let mut i = 0;
    while i < N {
        let bytes = samples[i].to_le_bytes();
        out[2 * i] = bytes[0];
        out[2 * i + 1] = bytes[1];
        i += 1;
    }
    out
}

/// 8-bit unsigned PCM at 8 kHz
pub const TONE_8BIT: [u8; 8] = [128, 173, 192, 173, 128, 83, 64, 83];

/// 16-bit little-endian PCM at 8 kHz
pub const TONE_16BIT_8KHZ: [u8; 16] = le_bytes::<8, 16>([
    0, 11585, 16384, 11585, 0, -11585, -16384, -11585,
]);

/// 16-bit little-endian PCM at 16 kHz (wideband)
pub const TONE_16BIT_16KHZ: [u8; 32] = le_bytes::<16, 32>([
    0, 6270, 11585, 15137, 16384, 15137, 11585, 6270, 0, -6270, -11585, -15137, -16384, -15137,
    -11585, -6270,
]);

/// Cursor over a tone table
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ToneGenerator {
    cursor: usize,
}

impl ToneGenerator {
    /// Start at the beginning of the table
    #[must_use]
    pub const fn new() -> Self {
        Self { cursor: 0 }
    }

    /// Position of the next byte within the table
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Rewind to the start of the table
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Produce the next `length` bytes of `table`
    ///
    /// The frame is capped at the maximum frame length; the cursor advances by
    /// the number of bytes produced.
    pub fn next_frame(&mut self, table: &[u8], length: usize) -> AudioFrame {
        let mut frame = AudioFrame::new();
        if table.is_empty() {
            return frame;
        }
        self.cursor %= table.len();
        for _ in 0..length.min(MAX_AUDIO_FRAME_LENGTH) {
            if frame.push(table[self.cursor]).is_err() {
                break;
            }
            self.cursor = (self.cursor + 1) % table.len();
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_16bit_tables_are_little_endian() {
        assert_eq!(&TONE_16BIT_8KHZ[..6], &[0x00, 0x00, 0x41, 0x2D, 0x00, 0x40]);
        assert_eq!(&TONE_16BIT_8KHZ[10..12], &(-11585i16).to_le_bytes());
        assert_eq!(&TONE_16BIT_16KHZ[8..10], &16384i16.to_le_bytes());
    }

    #[test]
    fn test_frame_wraps_around() {
        let mut generator = ToneGenerator::new();

        let frame = generator.next_frame(&TONE_8BIT, 6);
        assert_eq!(frame.as_slice(), &TONE_8BIT[..6]);
        assert_eq!(generator.cursor(), 6);

        let frame = generator.next_frame(&TONE_8BIT, 5);
        assert_eq!(frame.as_slice(), &[64, 83, 128, 173, 192]);
        assert_eq!(generator.cursor(), 3);
    }

    #[test]
    fn test_frame_is_capped() {
        let mut generator = ToneGenerator::new();
        let frame = generator.next_frame(&TONE_16BIT_16KHZ, 1000);
        assert_eq!(frame.len(), MAX_AUDIO_FRAME_LENGTH);
        assert_eq!(generator.cursor(), MAX_AUDIO_FRAME_LENGTH % TONE_16BIT_16KHZ.len());
    }

    #[test]
    fn test_empty_request() {
        let mut generator = ToneGenerator::new();
        assert!(generator.next_frame(&TONE_8BIT, 0).is_empty());
        assert_eq!(generator.cursor(), 0);
    }
}
