//! Monospaced glyph rendering with alignment and outline.
//!
//! Text is a degenerate case of the transparent compositing rule: every
//! set bit in a glyph row becomes a one-pixel clear+set against the mask
//! table. Unlike sprites and tiles, text may draw into the reserved
//! status-bar band; that band exists for it.

use core::fmt;

use arrayvec::ArrayString;
use smart_default::SmartDefault;

use crate::mask::{BLOCK_PIXELS, COLOR_MASK, PIXEL_MASKS};
use crate::screen::{load_block, store_block, Screen};

/// A monospaced bitmap font: `height` row bytes per glyph, bit `i` of a
/// row byte is column `i` (LSB leftmost). Glyphs are at most 8 pixels
/// wide.
#[derive(Copy, Clone, Debug)]
pub struct Font {
    pub width: usize,
    pub height: usize,
    /// First representable character code.
    pub first_char: u8,
    /// Number of contiguous codes starting at `first_char`.
    pub num_chars: usize,
    pub data: &'static [u8],
}

impl Font {
    /// The built-in 8x8 ASCII font.
    pub const fn font_8x8() -> Self {
        Font {
            width: font_8x8::GLYPH_WIDTH,
            height: font_8x8::GLYPH_HEIGHT,
            first_char: font_8x8::FIRST_CHAR,
            num_chars: font_8x8::NUM_CHARS,
            data: &font_8x8::DATA,
        }
    }
}

/// Horizontal anchoring of a printed run relative to the pen position.
#[derive(Copy, Clone, Debug, PartialEq, Eq, SmartDefault)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Pen position and style for text drawing. One of these is the whole
/// renderer state: no per-call history, so printing is idempotent given
/// the same state and string.
pub struct Text {
    font: Font,
    x: i32,
    y: i32,
    align: Align,
    color: u8,
    border: Option<u8>,
}

impl Text {
    pub fn new(font: Font) -> Self {
        Text {
            font,
            x: 0,
            y: 0,
            align: Align::default(),
            color: COLOR_MASK,
            border: None,
        }
    }

    pub fn set_font(&mut self, font: Font) {
        self.font = font;
    }

    /// Sets the foreground color index, masked to the 4-bit color range.
    pub fn set_color(&mut self, color: u8) {
        self.color = color & COLOR_MASK;
    }

    /// Enables an outline in the given color index, or disables it.
    pub fn set_border(&mut self, border: Option<u8>) {
        self.border = border.map(|c| c & COLOR_MASK);
    }

    pub fn move_to(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    pub fn align(&mut self, align: Align) {
        self.align = align;
    }

    #[inline]
    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Prints `text` at the pen position.
    ///
    /// Center and Right alignment first pull the pen left by half or all
    /// of the run width. With a border enabled the run is drawn at the
    /// eight neighboring offsets in the border color, then once at the
    /// true position in the foreground color. Afterwards the pen advances
    /// past the run, except for Right alignment where the pen already
    /// anchors the run's end.
    pub fn print(&mut self, screen: &mut Screen<'_>, text: &str) {
        let run_width = text.len() as i32 * self.font.width as i32;
        match self.align {
            Align::Left => {}
            Align::Center => self.x -= run_width / 2,
            Align::Right => self.x -= run_width,
        }

        if let Some(border_color) = self.border {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    render_run(screen, &self.font, text, self.x + dx, self.y + dy, border_color);
                }
            }
        }
        let new_x = render_run(screen, &self.font, text, self.x, self.y, self.color);
        if self.align != Align::Right {
            self.x = new_x;
        }
    }

    /// Formatted-print convenience over [`print`](Self::print). Formats
    /// into a fixed 64-byte buffer; anything past that is truncated, as
    /// the output of a one-frame HUD line should never get near it.
    pub fn print_fmt(&mut self, screen: &mut Screen<'_>, args: fmt::Arguments<'_>) {
        let mut buf = ArrayString::<64>::new();
        let _ = fmt::Write::write_fmt(&mut buf, args);
        self.print(screen, buf.as_str());
    }
}

/// Draws one run of glyphs, returning the pen x after the last glyph.
///
/// Codes outside the font's range advance the pen but draw nothing, so
/// they act as spaces. All-zero glyph rows are skipped. Columns are
/// clipped to the screen; vertical clipping is per row, against the full
/// screen height.
fn render_run(
    screen: &mut Screen<'_>,
    font: &Font,
    text: &str,
    mut x: i32,
    y: i32,
    color: u8,
) -> i32 {
    let screen_width = screen.width() as i32;
    let screen_height = screen.height() as i32;
    let wpl = screen.words_per_line();
    let glyph_w = font.width as i32;
    let glyph_h = font.height as i32;
    let fb = screen.back_mut();

    for byte in text.bytes() {
        let index = (byte as usize).wrapping_sub(font.first_char as usize);
        if index >= font.num_chars {
            x += glyph_w;
            continue;
        }
        // Whole-glyph reject when entirely offscreen.
        if x + glyph_w <= 0 || x >= screen_width || y + glyph_h <= 0 || y >= screen_height {
            x += glyph_w;
            continue;
        }

        let rows = &font.data[index * font.height..][..font.height];

        // Visible column span, as local bit indices.
        let local_start = (-x).max(0) as u32;
        let local_end = (screen_width - x).min(glyph_w) as u32;

        for (row, &bits) in rows.iter().enumerate() {
            let py = y + row as i32;
            if py < 0 || py >= screen_height {
                continue;
            }
            if bits == 0 {
                continue;
            }

            let mut bits = bits as u32 & ((1u32 << font.width) - 1);
            bits &= !0 << local_start;
            if local_end < 32 {
                bits &= (1 << local_end) - 1;
            }

            let line = &mut fb[py as usize * wpl..][..wpl];
            while bits != 0 {
                let col = bits.trailing_zeros();
                bits &= bits - 1;
                let px = (x + col as i32) as usize;
                let pos = px % BLOCK_PIXELS;
                let block = px / BLOCK_PIXELS;
                let cur = load_block(line, block);
                store_block(
                    line,
                    block,
                    (cur & !PIXEL_MASKS.clear_entry(pos)) | PIXEL_MASKS.entry(color, pos),
                );
            }
        }
        x += glyph_w;
    }
    x
}
