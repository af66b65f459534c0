//! Double-buffered planar framebuffer management.
//!
//! A [`Screen`] owns two caller-supplied backing buffers, tracks which one
//! is front (being presented by an external transport) and which is back
//! (being drawn), and swaps the roles in O(1). It never allocates; the
//! backing memory is sized and owned at initialization and never resized.
//!
//! ## Framebuffer layout
//!
//! Pixels are stored as 4 interleaved bitplanes. Sixteen horizontally
//! adjacent pixels form a *block* of 64 bits: four 16-bit plane segments,
//! plane 0 first. A block occupies two consecutive `u32` words, low half
//! (planes 0 and 1) first. A scanline is therefore `width / 8` words.

use smart_default::SmartDefault;

use crate::mask::{BLOCK_PIXELS, NUM_PLANES};

/// Pixels stored per framebuffer word at the fixed 4-bit depth.
pub(crate) const PIXELS_PER_WORD: usize = 8;

/// Display geometry and depth, plus the reserved status-bar band.
///
/// `reserved_rows` is the number of rows at the bottom of the screen that
/// sprite and tile drawing must not touch (the text renderer may, so a HUD
/// can live there). It is layout configuration, not an engine invariant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, SmartDefault)]
pub struct Mode {
    #[default = 320]
    pub width: usize,
    #[default = 200]
    pub height: usize,
    /// Bits per pixel. Only 4 is supported.
    #[default = 4]
    pub color_bits: u8,
    #[default = 8]
    pub reserved_rows: usize,
}

impl Mode {
    /// Backing buffer length, in words, required for this mode.
    pub fn buffer_words(&self) -> usize {
        self.width / PIXELS_PER_WORD * self.height
    }
}

/// The standard 320x200 mode with an 8-row status bar.
pub const MODE_320X200: Mode = Mode {
    width: 320,
    height: 200,
    color_bits: 4,
    reserved_rows: 8,
};

/// Names one of the two backing buffers. Which one is front changes on
/// every [`Screen::swap`]; the identifier-to-memory assignment never does.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BufferId {
    A,
    B,
}

impl BufferId {
    /// The buffer's numeric identity: A is 0, B is 1.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            BufferId::A => 0,
            BufferId::B => 1,
        }
    }

    fn from_index(i: usize) -> Self {
        if i == 0 {
            BufferId::A
        } else {
            BufferId::B
        }
    }
}

/// Initialization failures. These are configuration errors reported once;
/// after a successful `new`, drawing calls cannot fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The requested depth is not the fixed 4 bits/pixel.
    UnsupportedDepth(u8),
    /// Zero-sized screen, or width not a multiple of the block size.
    BadGeometry { width: usize, height: usize },
    /// A backing buffer is not exactly `width * height / 8` words.
    BadBufferSize {
        id: BufferId,
        expected: usize,
        got: usize,
    },
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::UnsupportedDepth(bits) => {
                write!(f, "unsupported color depth: {} bits/pixel", bits)
            }
            ConfigError::BadGeometry { width, height } => {
                write!(f, "bad screen geometry: {}x{}", width, height)
            }
            ConfigError::BadBufferSize { id, expected, got } => write!(
                f,
                "backing buffer {:?} holds {} words, mode needs {}",
                id, got, expected
            ),
        }
    }
}

/// The double-buffered screen. All drawing targets the back buffer; the
/// front buffer is read-only from this crate's perspective until the next
/// swap.
pub struct Screen<'buf> {
    bufs: [&'buf mut [u32]; 2],
    /// Index into `bufs` of the front (presented) buffer.
    front: usize,
    width: usize,
    height: usize,
    color_bits: u8,
    reserved_rows: usize,
    words_per_line: usize,
}

impl<'buf> Screen<'buf> {
    /// Validates `mode` against the supplied backing buffers and sets up a
    /// screen with both buffers blanked and buffer A front.
    ///
    /// Blanking runs one clear/swap cycle per buffer so the starting state
    /// is blank no matter which buffer ends up presented first.
    pub fn new(
        mode: Mode,
        buf_a: &'buf mut [u32],
        buf_b: &'buf mut [u32],
    ) -> Result<Self, ConfigError> {
        if mode.color_bits as usize != NUM_PLANES {
            return Err(ConfigError::UnsupportedDepth(mode.color_bits));
        }
        if mode.width == 0 || mode.height == 0 || mode.width % BLOCK_PIXELS != 0 {
            return Err(ConfigError::BadGeometry {
                width: mode.width,
                height: mode.height,
            });
        }
        let expected = mode.buffer_words();
        if buf_a.len() != expected {
            return Err(ConfigError::BadBufferSize {
                id: BufferId::A,
                expected,
                got: buf_a.len(),
            });
        }
        if buf_b.len() != expected {
            return Err(ConfigError::BadBufferSize {
                id: BufferId::B,
                expected,
                got: buf_b.len(),
            });
        }

        let mut screen = Screen {
            bufs: [buf_a, buf_b],
            front: 0,
            width: mode.width,
            height: mode.height,
            color_bits: mode.color_bits,
            reserved_rows: mode.reserved_rows,
            words_per_line: mode.width / PIXELS_PER_WORD,
        };
        screen.clear(screen.back_id());
        screen.swap();
        screen.clear(screen.back_id());
        screen.swap();
        Ok(screen)
    }

    /// Zero-fills the addressed buffer.
    pub fn clear(&mut self, id: BufferId) {
        for word in self.bufs[id.index()].iter_mut() {
            *word = 0;
        }
    }

    /// Exchanges the front/back roles. Touches no pixel data. The caller
    /// owns the ordering: call this only when the back buffer's frame is
    /// complete.
    #[inline]
    pub fn swap(&mut self) {
        self.front ^= 1;
    }

    #[inline]
    pub fn front_id(&self) -> BufferId {
        BufferId::from_index(self.front)
    }

    #[inline]
    pub fn back_id(&self) -> BufferId {
        BufferId::from_index(self.front ^ 1)
    }

    /// The presented buffer's pixel words.
    pub fn front(&self) -> &[u32] {
        &self.bufs[self.front]
    }

    /// The drawing target. Borrowing the screen mutably here is what keeps
    /// the single-writer invariant: no handle to a mid-draw buffer can
    /// escape past the draw calls that produced it.
    pub fn back_mut(&mut self) -> &mut [u32] {
        &mut self.bufs[self.front ^ 1]
    }

    pub fn buffer(&self, id: BufferId) -> &[u32] {
        &self.bufs[id.index()]
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn color_bits(&self) -> u8 {
        self.color_bits
    }

    /// Rows available to sprite and tile drawing, i.e. everything above the
    /// reserved status-bar band.
    #[inline]
    pub fn drawable_height(&self) -> usize {
        self.height.saturating_sub(self.reserved_rows)
    }

    #[inline]
    pub fn words_per_line(&self) -> usize {
        self.words_per_line
    }

    /// Reads one pixel's palette index back out of the planar storage.
    ///
    /// Drawing never goes through this; it exists for diagnostics and
    /// tests.
    ///
    /// # Panics
    ///
    /// If `x` or `y` is out of range.
    pub fn pixel(&self, id: BufferId, x: usize, y: usize) -> u8 {
        assert!(x < self.width && y < self.height);
        let line = &self.bufs[id.index()][y * self.words_per_line..][..self.words_per_line];
        let bits = load_block(line, x / BLOCK_PIXELS);
        let pos = x % BLOCK_PIXELS;
        let mut index = 0u8;
        for plane in 0..NUM_PLANES {
            if bits >> (plane * 16 + (15 - pos)) & 1 != 0 {
                index |= 1 << plane;
            }
        }
        index
    }
}

/// Loads one 16-pixel block (two words, low half first) from a scanline.
#[inline]
pub(crate) fn load_block(line: &[u32], block: usize) -> u64 {
    line[2 * block] as u64 | (line[2 * block + 1] as u64) << 32
}

/// Stores one 16-pixel block back into a scanline.
#[inline]
pub(crate) fn store_block(line: &mut [u32], block: usize, value: u64) {
    line[2 * block] = value as u32;
    line[2 * block + 1] = (value >> 32) as u32;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::PIXEL_MASKS;

    fn mode_64x32() -> Mode {
        Mode {
            width: 64,
            height: 32,
            reserved_rows: 8,
            ..Mode::default()
        }
    }

    #[test]
    fn default_mode_is_320x200() {
        let mode = Mode::default();
        assert_eq!(mode, MODE_320X200);
        assert_eq!((mode.width, mode.height), (320, 200));
        assert_eq!(mode.color_bits, 4);
        assert_eq!(mode.reserved_rows, 8);
        assert_eq!(mode.buffer_words(), 320 / 8 * 200);
    }

    #[test]
    fn rejects_unsupported_depth() {
        let mut a = [0u32; 64 / 8 * 32];
        let mut b = [0u32; 64 / 8 * 32];
        let mode = Mode {
            color_bits: 8,
            ..mode_64x32()
        };
        assert_eq!(
            Screen::new(mode, &mut a, &mut b).err(),
            Some(ConfigError::UnsupportedDepth(8))
        );
    }

    #[test]
    fn rejects_unblocked_width() {
        let mut a = [0u32; 24 / 8 * 32];
        let mut b = [0u32; 24 / 8 * 32];
        let mode = Mode {
            width: 24,
            ..mode_64x32()
        };
        assert!(matches!(
            Screen::new(mode, &mut a, &mut b),
            Err(ConfigError::BadGeometry { .. })
        ));
    }

    #[test]
    fn rejects_wrong_buffer_size() {
        let mut a = [0u32; 64 / 8 * 32];
        let mut b = [0u32; 64 / 8 * 32 - 1];
        match Screen::new(mode_64x32(), &mut a, &mut b) {
            Err(ConfigError::BadBufferSize { id, expected, got }) => {
                assert_eq!(id, BufferId::B);
                assert_eq!(expected, 256);
                assert_eq!(got, 255);
            }
            other => panic!("unexpected result: {:?}", other.err()),
        }
    }

    #[test]
    fn init_blanks_both_buffers_and_fronts_a() {
        let mut a = [0xFFFF_FFFFu32; 64 / 8 * 32];
        let mut b = [0xFFFF_FFFFu32; 64 / 8 * 32];
        let screen = Screen::new(mode_64x32(), &mut a, &mut b).unwrap();
        assert_eq!(screen.front_id(), BufferId::A);
        assert_eq!(screen.back_id(), BufferId::B);
        assert!(screen.buffer(BufferId::A).iter().all(|&w| w == 0));
        assert!(screen.buffer(BufferId::B).iter().all(|&w| w == 0));
    }

    #[test]
    fn swap_is_an_involution_and_preserves_pixels() {
        let mut a = [0u32; 64 / 8 * 32];
        let mut b = [0u32; 64 / 8 * 32];
        let mut screen = Screen::new(mode_64x32(), &mut a, &mut b).unwrap();
        screen.back_mut()[3] = 0xDEAD_BEEF;

        screen.swap();
        assert_eq!(screen.front_id(), BufferId::B);
        assert_eq!(screen.front()[3], 0xDEAD_BEEF);

        screen.swap();
        assert_eq!(screen.front_id(), BufferId::A);
        assert_eq!(screen.buffer(BufferId::B)[3], 0xDEAD_BEEF);
        assert!(screen.buffer(BufferId::A).iter().all(|&w| w == 0));
    }

    #[test]
    fn pixel_readback_matches_mask_table() {
        let mut a = [0u32; 64 / 8 * 32];
        let mut b = [0u32; 64 / 8 * 32];
        let mut screen = Screen::new(mode_64x32(), &mut a, &mut b).unwrap();

        // Pack palette index 0b1011 at x=21, y=5 by hand.
        let wpl = screen.words_per_line();
        {
            let line = &mut screen.back_mut()[5 * wpl..][..wpl];
            store_block(line, 21 / 16, PIXEL_MASKS.entry(0b1011, 21 % 16));
        }
        let back = screen.back_id();
        assert_eq!(screen.pixel(back, 21, 5), 0b1011);
        assert_eq!(screen.pixel(back, 20, 5), 0);
        assert_eq!(screen.pixel(back, 22, 5), 0);
    }

    #[test]
    fn clear_zeroes_only_the_addressed_buffer() {
        let mut a = [0u32; 64 / 8 * 32];
        let mut b = [0u32; 64 / 8 * 32];
        let mut screen = Screen::new(mode_64x32(), &mut a, &mut b).unwrap();
        screen.back_mut().iter_mut().for_each(|w| *w = 7);
        let back = screen.back_id();
        screen.clear(screen.front_id());
        assert!(screen.buffer(back).iter().all(|&w| w == 7));
        screen.clear(back);
        assert!(screen.buffer(back).iter().all(|&w| w == 0));
    }
}
