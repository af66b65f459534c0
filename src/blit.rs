//! Sprite and tile compositing into the back buffer.
//!
//! All three primitives share the same clipping discipline: vertical clip
//! against the drawable area (screen height minus the reserved status-bar
//! band), horizontal clip against the screen width. Fully clipped or
//! degenerate requests are no-ops; out-of-range coordinates are defined
//! behavior, never errors.
//!
//! Source pixels arrive packed four to a 32-bit word, one byte per pixel,
//! little-endian, the low 6 bits of each byte a packed 2-bit B/G/R triple.
//! Each visible group is decoded through the palette LUT into position
//! masks from [`PIXEL_MASKS`] and merged into at most two adjacent 16-pixel
//! destination blocks.

use crate::mask::{
    palette_index, BLOCK_PIXELS, GROUP_PIXELS, PIXEL_MASKS, RGB6_MASK, TRANSPARENT_GROUP,
    TRANSPARENT_PIXEL,
};
use crate::screen::{load_block, store_block, Screen};

/// An immutable packed-pixel asset: sprite or background tile.
#[derive(Copy, Clone, Debug)]
pub struct Sprite<'a> {
    /// Width in pixels. May be any value; it need not be a multiple of the
    /// group size.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Source row pitch in 32-bit words.
    pub stride: usize,
    /// Packed pixel groups, `stride * height` words.
    pub data: &'a [u32],
}

impl<'a> Sprite<'a> {
    /// Bundles a descriptor, debug-checking the geometry invariants that
    /// drawing relies on. A malformed descriptor is a programming error,
    /// not a runtime failure mode.
    pub fn new(width: i32, height: i32, stride: usize, data: &'a [u32]) -> Self {
        debug_assert!(width >= 0 && height >= 0);
        debug_assert!(stride >= (width as usize + GROUP_PIXELS - 1) / GROUP_PIXELS);
        debug_assert!(data.len() >= stride * height as usize);
        Sprite {
            width,
            height,
            stride,
            data,
        }
    }
}

/// How [`draw_sprite`] composites. A two-case tagged choice, not subtyping.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Opacity {
    /// No transparent pixels present; compositing is a pure OR of set bits.
    Opaque,
    /// Pixels equal to the sentinel are skipped; visible pixels erase the
    /// destination across all planes before setting the new color.
    Transparent,
}

/// Dispatches to the opaque or transparent blit.
#[inline]
pub fn draw_sprite(screen: &mut Screen<'_>, spr: &Sprite<'_>, x: i32, y: i32, opacity: Opacity) {
    match opacity {
        Opacity::Opaque => draw_sprite_opaque(screen, spr, x, y),
        Opacity::Transparent => draw_sprite_transparent(screen, spr, x, y),
    }
}

/// Clip state shared by all three primitives.
struct Clip {
    /// First source row to read.
    src_row: usize,
    /// First source word to read within each row.
    src_word: usize,
    /// Pixels to skip at the start of the first word (left clip that did
    /// not land on a group boundary).
    shift: usize,
    /// Destination x of the first drawn pixel.
    x: usize,
    /// Destination y of the first drawn row.
    y: usize,
    /// Visible pixels per row.
    w: usize,
    /// Visible rows.
    h: usize,
}

impl Clip {
    /// Words covering the visible span of one source row.
    fn words_per_row(&self) -> usize {
        (self.shift + self.w + GROUP_PIXELS - 1) / GROUP_PIXELS
    }

    /// One past the last destination x.
    fn x_end(&self) -> usize {
        self.x + self.w
    }
}

/// Clips a placement against `max_w` x `max_h`, or `None` if nothing is
/// visible.
fn clip(spr: &Sprite<'_>, x: i32, y: i32, max_w: usize, max_h: usize) -> Option<Clip> {
    if spr.width <= 0 || spr.height <= 0 || max_w == 0 || max_h == 0 {
        return None;
    }

    let mut src_row = 0;
    let mut h = spr.height;
    let mut y = y;
    if y < 0 {
        src_row = (-y) as usize;
        h += y;
        y = 0;
    }
    let y = y as usize;
    if h <= 0 || y >= max_h {
        return None;
    }
    let h = (h as usize).min(max_h - y);

    let mut src_word = 0;
    let mut shift = 0;
    let mut w = spr.width;
    let mut x = x;
    if x < 0 {
        let skip = (-x) as usize;
        src_word = skip / GROUP_PIXELS;
        shift = skip % GROUP_PIXELS;
        w -= skip as i32;
        x = 0;
    }
    let x = x as usize;
    if w <= 0 || x >= max_w {
        return None;
    }
    let w = (w as usize).min(max_w - x);

    Some(Clip {
        src_row,
        src_word,
        shift,
        x,
        y,
        w,
        h,
    })
}

/// Unconditional background paint.
///
/// Assumes full opacity: each visible group's four position masks are ORed
/// into one 64-bit mask. When a group starts exactly on a block boundary
/// and all four pixels are visible, the destination block is overwritten
/// wholesale, skipping the read-modify-write; the remaining twelve pixels
/// of the block are zeroed and the tile's following groups merge into them.
/// Unaligned or clipped groups OR-merge instead. The overwrite is an
/// optimization, not a correctness requirement.
pub fn draw_tile(screen: &mut Screen<'_>, spr: &Sprite<'_>, x: i32, y: i32) {
    let wpl = screen.words_per_line();
    let (max_w, max_h) = (screen.width(), screen.drawable_height());
    let c = match clip(spr, x, y, max_w, max_h) {
        Some(c) => c,
        None => return,
    };
    let words = c.words_per_row();
    let fb = screen.back_mut();

    for row in 0..c.h {
        let src_base = (c.src_row + row) * spr.stride + c.src_word;
        let src = &spr.data[src_base..src_base + words];
        let line = &mut fb[(c.y + row) * wpl..][..wpl];

        for (k, &word) in src.iter().enumerate() {
            let first = if k == 0 { c.shift } else { 0 };
            let start = (c.x + k * GROUP_PIXELS) as isize - c.shift as isize;
            let sx0 = (start + first as isize) as usize;
            if sx0 >= c.x_end() {
                break;
            }
            let bytes = (word & RGB6_MASK).to_le_bytes();
            let anchor = sx0 / BLOCK_PIXELS;
            let mut merge = [0u64; 2];
            let mut drawn = 0;
            for p in first..GROUP_PIXELS {
                let sx = (start + p as isize) as usize;
                if sx >= c.x_end() {
                    break;
                }
                let slot = sx / BLOCK_PIXELS - anchor;
                merge[slot] |= PIXEL_MASKS.entry(palette_index(bytes[p]), sx % BLOCK_PIXELS);
                drawn += 1;
            }
            if sx0 % BLOCK_PIXELS == 0 && drawn == GROUP_PIXELS {
                // Aligned full group: whole-block overwrite, no RMW.
                store_block(line, anchor, merge[0]);
            } else {
                for slot in 0..2 {
                    if merge[slot] != 0 {
                        let block = anchor + slot;
                        store_block(line, block, load_block(line, block) | merge[slot]);
                    }
                }
            }
        }
    }
}

/// Sprite blit assuming no transparent pixels are present.
///
/// Strictly additive: the destination is assumed to already hold
/// background, so each group's set masks are ORed in without a prior
/// clear. A group straddling a block boundary splits its mask across both
/// blocks.
pub fn draw_sprite_opaque(screen: &mut Screen<'_>, spr: &Sprite<'_>, x: i32, y: i32) {
    let wpl = screen.words_per_line();
    let (max_w, max_h) = (screen.width(), screen.drawable_height());
    let c = match clip(spr, x, y, max_w, max_h) {
        Some(c) => c,
        None => return,
    };
    let words = c.words_per_row();
    let fb = screen.back_mut();

    for row in 0..c.h {
        let src_base = (c.src_row + row) * spr.stride + c.src_word;
        let src = &spr.data[src_base..src_base + words];
        let line = &mut fb[(c.y + row) * wpl..][..wpl];

        for (k, &word) in src.iter().enumerate() {
            let first = if k == 0 { c.shift } else { 0 };
            let start = (c.x + k * GROUP_PIXELS) as isize - c.shift as isize;
            let sx0 = (start + first as isize) as usize;
            if sx0 >= c.x_end() {
                break;
            }
            let bytes = word.to_le_bytes();
            let anchor = sx0 / BLOCK_PIXELS;
            let mut set = [0u64; 2];
            for p in first..GROUP_PIXELS {
                let sx = (start + p as isize) as usize;
                if sx >= c.x_end() {
                    break;
                }
                let slot = sx / BLOCK_PIXELS - anchor;
                set[slot] |= PIXEL_MASKS.entry(palette_index(bytes[p]), sx % BLOCK_PIXELS);
            }
            for slot in 0..2 {
                if set[slot] != 0 {
                    let block = anchor + slot;
                    store_block(line, block, load_block(line, block) | set[slot]);
                }
            }
        }
    }
}

/// Sprite blit honoring the per-pixel transparency sentinel.
///
/// Whole groups equal to [`TRANSPARENT_GROUP`] are rejected before any
/// table lookups. Visible pixels contribute both a clear mask (erasing all
/// planes at that position) and a set mask; the write is
/// `(old & !clear) | set`, which also handles pixels becoming
/// background-colored.
pub fn draw_sprite_transparent(screen: &mut Screen<'_>, spr: &Sprite<'_>, x: i32, y: i32) {
    let wpl = screen.words_per_line();
    let (max_w, max_h) = (screen.width(), screen.drawable_height());
    let c = match clip(spr, x, y, max_w, max_h) {
        Some(c) => c,
        None => return,
    };
    let words = c.words_per_row();
    let fb = screen.back_mut();

    for row in 0..c.h {
        let src_base = (c.src_row + row) * spr.stride + c.src_word;
        let src = &spr.data[src_base..src_base + words];
        let line = &mut fb[(c.y + row) * wpl..][..wpl];

        for (k, &word) in src.iter().enumerate() {
            let first = if k == 0 { c.shift } else { 0 };
            let start = (c.x + k * GROUP_PIXELS) as isize - c.shift as isize;
            let sx0 = (start + first as isize) as usize;
            if sx0 >= c.x_end() {
                break;
            }
            if word == TRANSPARENT_GROUP {
                continue;
            }
            let bytes = word.to_le_bytes();
            let anchor = sx0 / BLOCK_PIXELS;
            let mut clear = [0u64; 2];
            let mut set = [0u64; 2];
            for p in first..GROUP_PIXELS {
                let sx = (start + p as isize) as usize;
                if sx >= c.x_end() {
                    break;
                }
                if bytes[p] == TRANSPARENT_PIXEL {
                    continue;
                }
                let pos = sx % BLOCK_PIXELS;
                let slot = sx / BLOCK_PIXELS - anchor;
                clear[slot] |= PIXEL_MASKS.clear_entry(pos);
                set[slot] |= PIXEL_MASKS.entry(palette_index(bytes[p]), pos);
            }
            for slot in 0..2 {
                if clear[slot] != 0 {
                    let block = anchor + slot;
                    let cur = load_block(line, block);
                    store_block(line, block, (cur & !clear[slot]) | set[slot]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::Mode;

    const W: usize = 64;
    const H: usize = 32;
    const RESERVED: usize = 8;
    const WORDS: usize = W / 8 * H;

    fn test_mode() -> Mode {
        Mode {
            width: W,
            height: H,
            reserved_rows: RESERVED,
            ..Mode::default()
        }
    }

    /// Packs four palette-identity pixel bytes (values 0..=7 survive the
    /// LUT unchanged) into a group word.
    fn group(p: [u8; 4]) -> u32 {
        u32::from_le_bytes(p)
    }

    /// A solid sprite of `w` x `h` pixels, all the same packed color byte.
    fn solid(w: i32, h: i32, color: u8) -> (usize, std::vec::Vec<u32>) {
        let stride = (w as usize + 3) / 4;
        let word = u32::from_le_bytes([color; 4]);
        (stride, vec![word; stride * h as usize])
    }

    fn back_snapshot(screen: &Screen<'_>) -> std::vec::Vec<u32> {
        screen.buffer(screen.back_id()).to_vec()
    }

    #[test]
    fn fully_clipped_draws_are_no_ops() {
        let mut a = [0u32; WORDS];
        let mut b = [0u32; WORDS];
        let mut screen = Screen::new(test_mode(), &mut a, &mut b).unwrap();
        let (stride, data) = solid(8, 8, 0x05);
        let spr = Sprite::new(8, 8, stride, &data);

        let before = back_snapshot(&screen);
        for &(x, y) in &[
            (-8, 0),
            (W as i32, 0),
            (0, -8),
            (0, (H - RESERVED) as i32),
            (-100, -100),
        ] {
            draw_tile(&mut screen, &spr, x, y);
            draw_sprite(&mut screen, &spr, x, y, Opacity::Opaque);
            draw_sprite(&mut screen, &spr, x, y, Opacity::Transparent);
        }
        assert_eq!(back_snapshot(&screen), before);
    }

    #[test]
    fn all_sentinel_sprite_leaves_buffer_unchanged() {
        let mut a = [0u32; WORDS];
        let mut b = [0u32; WORDS];
        let mut screen = Screen::new(test_mode(), &mut a, &mut b).unwrap();
        // Scribble a recognizable background first.
        let (stride, data) = solid(W as i32, 4, 0x03);
        draw_tile(&mut screen, &Sprite::new(W as i32, 4, stride, &data), 0, 2);
        let before = back_snapshot(&screen);

        let ghost = vec![TRANSPARENT_GROUP; 2 * 4];
        draw_sprite_transparent(&mut screen, &Sprite::new(8, 4, 2, &ghost), 3, 3);
        assert_eq!(back_snapshot(&screen), before);
    }

    #[test]
    fn single_visible_pixel_changes_exactly_one_position() {
        let mut a = [0u32; WORDS];
        let mut b = [0u32; WORDS];
        let mut screen = Screen::new(test_mode(), &mut a, &mut b).unwrap();
        let mut data = vec![TRANSPARENT_GROUP; 2 * 2];
        // One visible pixel, color 5, at local (x=2, y=1).
        data[2] = group([TRANSPARENT_PIXEL, TRANSPARENT_PIXEL, 0x05, TRANSPARENT_PIXEL]);
        let spr = Sprite::new(8, 2, 2, &data);

        draw_sprite_transparent(&mut screen, &spr, 10, 4);
        let back = screen.back_id();
        for y in 0..H {
            for x in 0..W {
                let expected = if (x, y) == (12, 5) { 5 } else { 0 };
                assert_eq!(screen.pixel(back, x, y), expected, "at ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn transparent_pixel_can_restore_background_color() {
        let mut a = [0u32; WORDS];
        let mut b = [0u32; WORDS];
        let mut screen = Screen::new(test_mode(), &mut a, &mut b).unwrap();
        // Paint color 7 everywhere in one row band, then stamp a sprite
        // whose visible pixel is color 0 (background).
        let (stride, data) = solid(W as i32, 1, 0x07);
        draw_tile(&mut screen, &Sprite::new(W as i32, 1, stride, &data), 0, 0);

        let patch = [group([0x00, TRANSPARENT_PIXEL, TRANSPARENT_PIXEL, TRANSPARENT_PIXEL])];
        draw_sprite_transparent(&mut screen, &Sprite::new(4, 1, 1, &patch), 5, 0);

        let back = screen.back_id();
        assert_eq!(screen.pixel(back, 5, 0), 0);
        assert_eq!(screen.pixel(back, 4, 0), 7);
        assert_eq!(screen.pixel(back, 6, 0), 7);
    }

    #[test]
    fn opaque_equals_transparent_without_sentinels() {
        let mut a1 = [0u32; WORDS];
        let mut b1 = [0u32; WORDS];
        let mut s1 = Screen::new(test_mode(), &mut a1, &mut b1).unwrap();
        let mut a2 = [0u32; WORDS];
        let mut b2 = [0u32; WORDS];
        let mut s2 = Screen::new(test_mode(), &mut a2, &mut b2).unwrap();

        let data = [
            group([1, 2, 3, 4]),
            group([5, 6, 7, 0]),
            group([7, 7, 1, 1]),
            group([2, 0, 0, 2]),
        ];
        let spr = Sprite::new(8, 2, 2, &data);
        draw_sprite(&mut s1, &spr, 13, 3, Opacity::Opaque);
        draw_sprite(&mut s2, &spr, 13, 3, Opacity::Transparent);
        assert_eq!(back_snapshot(&s1), back_snapshot(&s2));
    }

    #[test]
    fn group_straddling_a_block_boundary_splits_correctly() {
        let mut a = [0u32; WORDS];
        let mut b = [0u32; WORDS];
        let mut screen = Screen::new(test_mode(), &mut a, &mut b).unwrap();
        // Group starts at pixel 14: positions 14, 15 land in block 0 and
        // 0, 1 in block 1.
        let data = [group([1, 2, 3, 4])];
        draw_sprite_opaque(&mut screen, &Sprite::new(4, 1, 1, &data), 14, 0);

        let back = screen.back_id();
        assert_eq!(screen.pixel(back, 14, 0), 1);
        assert_eq!(screen.pixel(back, 15, 0), 2);
        assert_eq!(screen.pixel(back, 16, 0), 3);
        assert_eq!(screen.pixel(back, 17, 0), 4);
        assert_eq!(screen.pixel(back, 13, 0), 0);
        assert_eq!(screen.pixel(back, 18, 0), 0);
    }

    #[test]
    fn aligned_tile_group_overwrites_the_block() {
        let mut a = [0u32; WORDS];
        let mut b = [0u32; WORDS];
        let mut screen = Screen::new(test_mode(), &mut a, &mut b).unwrap();
        // Dirty the first block of row 0.
        let (stride, junk) = solid(16, 1, 0x07);
        draw_tile(&mut screen, &Sprite::new(16, 1, stride, &junk), 0, 0);

        // A 4-pixel tile at x=0 overwrites block 0 wholesale: its own four
        // pixels plus zeroes for the other twelve.
        let data = [group([1, 2, 3, 4])];
        draw_tile(&mut screen, &Sprite::new(4, 1, 1, &data), 0, 0);

        let back = screen.back_id();
        assert_eq!(screen.pixel(back, 0, 0), 1);
        assert_eq!(screen.pixel(back, 1, 0), 2);
        assert_eq!(screen.pixel(back, 2, 0), 3);
        assert_eq!(screen.pixel(back, 3, 0), 4);
        for x in 4..16 {
            assert_eq!(screen.pixel(back, x, 0), 0, "pixel {} not cleared", x);
        }
    }

    #[test]
    fn unaligned_tile_merges_instead_of_overwriting() {
        let mut a = [0u32; WORDS];
        let mut b = [0u32; WORDS];
        let mut screen = Screen::new(test_mode(), &mut a, &mut b).unwrap();
        let dot = [group([7, 7, 7, 7])];
        draw_tile(&mut screen, &Sprite::new(4, 1, 1, &dot), 0, 0);
        // Starts mid-block, so the earlier pixels must survive.
        let data = [group([1, 2, 3, 4])];
        draw_tile(&mut screen, &Sprite::new(4, 1, 1, &data), 8, 0);

        let back = screen.back_id();
        assert_eq!(screen.pixel(back, 0, 0), 7);
        assert_eq!(screen.pixel(back, 3, 0), 7);
        assert_eq!(screen.pixel(back, 8, 0), 1);
        assert_eq!(screen.pixel(back, 11, 0), 4);
    }

    #[test]
    fn negative_x_trims_groups_and_carries_the_shift() {
        let mut a = [0u32; WORDS];
        let mut b = [0u32; WORDS];
        let mut screen = Screen::new(test_mode(), &mut a, &mut b).unwrap();
        // 12 source pixels 1,2,...,7,0,1,2,3,4 drawn at x = -5: source
        // pixel 5 (value 6) must land at screen x = 0.
        let data = [group([1, 2, 3, 4]), group([5, 6, 7, 0]), group([1, 2, 3, 4])];
        let spr = Sprite::new(12, 1, 3, &data);
        draw_sprite_opaque(&mut screen, &spr, -5, 0);

        let back = screen.back_id();
        assert_eq!(screen.pixel(back, 0, 0), 6);
        assert_eq!(screen.pixel(back, 1, 0), 7);
        assert_eq!(screen.pixel(back, 2, 0), 0);
        assert_eq!(screen.pixel(back, 3, 0), 1);
        assert_eq!(screen.pixel(back, 6, 0), 4);
        assert_eq!(screen.pixel(back, 7, 0), 0);
    }

    #[test]
    fn negative_y_trims_rows() {
        let mut a = [0u32; WORDS];
        let mut b = [0u32; WORDS];
        let mut screen = Screen::new(test_mode(), &mut a, &mut b).unwrap();
        let data = [group([1, 1, 1, 1]), group([2, 2, 2, 2]), group([3, 3, 3, 3])];
        let spr = Sprite::new(4, 3, 1, &data);
        draw_sprite_opaque(&mut screen, &spr, 0, -2);

        let back = screen.back_id();
        // Only the last source row survives, on screen row 0.
        assert_eq!(screen.pixel(back, 0, 0), 3);
        assert_eq!(screen.pixel(back, 0, 1), 0);
    }

    #[test]
    fn sprites_never_touch_the_status_bar_band() {
        let mut a = [0u32; WORDS];
        let mut b = [0u32; WORDS];
        let mut screen = Screen::new(test_mode(), &mut a, &mut b).unwrap();
        let (stride, data) = solid(16, 16, 0x07);
        let spr = Sprite::new(16, 16, stride, &data);
        let limit = (H - RESERVED) as i32;
        draw_tile(&mut screen, &spr, 0, limit - 4);
        draw_sprite(&mut screen, &spr, 16, limit - 4, Opacity::Opaque);
        draw_sprite(&mut screen, &spr, 32, limit - 4, Opacity::Transparent);

        let back = screen.back_id();
        for x in 0..48 {
            assert_eq!(screen.pixel(back, x, (limit - 1) as usize), 7);
        }
        for y in H - RESERVED..H {
            for x in 0..W {
                assert_eq!(screen.pixel(back, x, y), 0, "status bar hit at ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn right_edge_clipping_stops_at_the_screen() {
        let mut a = [0u32; WORDS];
        let mut b = [0u32; WORDS];
        let mut screen = Screen::new(test_mode(), &mut a, &mut b).unwrap();
        let (stride, data) = solid(16, 1, 0x05);
        let spr = Sprite::new(16, 1, stride, &data);
        draw_sprite_transparent(&mut screen, &spr, W as i32 - 6, 0);

        let back = screen.back_id();
        for x in W - 6..W {
            assert_eq!(screen.pixel(back, x, 0), 5);
        }
        assert_eq!(screen.pixel(back, W - 7, 0), 0);
    }
}
