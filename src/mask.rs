//! Precomputed pixel mask and palette lookup tables.
//!
//! All masked framebuffer writes in this crate go through one 256-entry
//! table: for every (palette index, pixel position) pair it holds a 64-bit
//! mask with the pixel's bit set in each bitplane segment selected by the
//! palette index. Compositing a pixel is then a table load and an OR, with
//! no per-plane shifting at draw time.

/// Number of bitplanes. The framebuffer format is fixed at 4 planes / 16
/// colors.
pub const NUM_PLANES: usize = 4;

/// Pixels per 32-bit packed source word.
pub const GROUP_PIXELS: usize = 4;

/// Pixels per 64-bit framebuffer block, the atomic unit of masked writes.
pub const BLOCK_PIXELS: usize = 16;

/// Mask selecting the valid 4-bit color range.
pub const COLOR_MASK: u8 = (1 << NUM_PLANES as u8) - 1;

/// Palette row of [`MaskTable`] whose entries have the bit set in *every*
/// plane, used to erase a pixel before setting its new color.
pub const CLEAR_MASK_KEY: u8 = 0xF;

/// Palette index assigned to packed color values that have no mapping.
///
/// Numerically equal to [`CLEAR_MASK_KEY`], but the two are distinct in
/// intent: one keys the all-planes mask row, the other is a safe default
/// color. Keep them separate if either ever changes.
pub const UNMAPPED_COLOR_INDEX: u8 = 15;

/// Byte value marking a fully transparent sprite pixel.
pub const TRANSPARENT_PIXEL: u8 = 0xCC;

/// A packed source word of four transparent pixels; lets the sprite path
/// reject a whole group before any table lookups.
pub const TRANSPARENT_GROUP: u32 = 0xCCCC_CCCC;

/// Mask keeping the low 6 (packed B/G/R) bits of each pixel byte in a group.
pub const RGB6_MASK: u32 = 0x3F3F_3F3F;

/// The 256-entry pixel mask table, indexed by `(palette << 4) | position`.
///
/// Each entry is one 64-bit framebuffer block: four 16-bit plane segments,
/// plane 0 in the least significant segment. Within a segment, pixel
/// position `k` maps to bit `15 - k` (leftmost pixel in the most significant
/// bit, matching the wire order of the planar format).
pub struct MaskTable([u64; 256]);

impl MaskTable {
    /// Computes the full table. Deterministic, so rebuilding it always
    /// produces identical values; the crate builds it once at compile time
    /// as [`PIXEL_MASKS`].
    pub const fn new() -> Self {
        let mut table = [0u64; 256];
        let mut index = 0;
        while index < 16 {
            let mut x = 0;
            while x < 16 {
                let mut mask = 0u64;
                let mut plane = 0;
                while plane < NUM_PLANES {
                    if index & (1 << plane) != 0 {
                        mask |= 1 << (plane * 16 + (15 - x));
                    }
                    plane += 1;
                }
                table[(index << 4) | x] = mask;
                x += 1;
            }
            index += 1;
        }
        MaskTable(table)
    }

    /// Mask that sets `palette`'s plane bits at pixel position `pos` within
    /// a block.
    #[inline]
    pub fn entry(&self, palette: u8, pos: usize) -> u64 {
        self.0[((palette & COLOR_MASK) as usize) << 4 | (pos & (BLOCK_PIXELS - 1))]
    }

    /// Mask that covers all four planes at position `pos`; ANDing its
    /// complement erases the pixel.
    #[inline]
    pub fn clear_entry(&self, pos: usize) -> u64 {
        self.entry(CLEAR_MASK_KEY, pos)
    }
}

/// The shared, compile-time-built mask table.
pub static PIXEL_MASKS: MaskTable = MaskTable::new();

/// Maps every packed 6-bit B/G/R value to a palette index.
///
/// The mapping is asset-defined and must stay bit-exact: sprite and tile
/// data is authored against exactly this table. Patterns outside the
/// authored palette fall back to [`UNMAPPED_COLOR_INDEX`].
static PALETTE_LUT: [u8; 64] = [
    0,  // 0b000000
    1,  // 0b000001
    2,  // 0b000010
    3,  // 0b000011
    4,  // 0b000100
    5,  // 0b000101
    6,  // 0b000110
    7,  // 0b000111
    15, // 0b001000
    15, // 0b001001
    15, // 0b001010
    11, // 0b001011
    12, // 0b001100
    15, // 0b001101
    15, // 0b001110
    15, // 0b001111
    8,  // 0b010000
    15, // 0b010001
    15, // 0b010010
    15, // 0b010011
    9,  // 0b010100
    10, // 0b010101
    6,  // 0b010110
    14, // 0b010111
    15, // 0b011000
    15, // 0b011001
    15, // 0b011010
    11, // 0b011011
    15, // 0b011100
    15, // 0b011101
    15, // 0b011110
    15, // 0b011111
    15, // 0b100000
    15, // 0b100001
    15, // 0b100010
    15, // 0b100011
    15, // 0b100100
    10, // 0b100101
    15, // 0b100110
    15, // 0b100111
    15, // 0b101000
    15, // 0b101001
    13, // 0b101010
    14, // 0b101011
    15, // 0b101100
    15, // 0b101101
    15, // 0b101110
    15, // 0b101111
    15, // 0b110000
    15, // 0b110001
    15, // 0b110010
    15, // 0b110011
    15, // 0b110100
    14, // 0b110101
    15, // 0b110110
    15, // 0b110111
    15, // 0b111000
    15, // 0b111001
    15, // 0b111010
    15, // 0b111011
    15, // 0b111100
    15, // 0b111101
    15, // 0b111110
    15, // 0b111111
];

/// Looks up the palette index for one packed pixel byte. The two high bits
/// carry no color information and are ignored.
#[inline]
pub fn palette_index(packed: u8) -> u8 {
    PALETTE_LUT[(packed & 0x3F) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_entries_have_one_bit_per_selected_plane() {
        for palette in 0..16u8 {
            for pos in 0..BLOCK_PIXELS {
                let mask = PIXEL_MASKS.entry(palette, pos);
                let mut expected = 0u64;
                for plane in 0..NUM_PLANES {
                    if palette & (1 << plane) != 0 {
                        expected |= 1 << (plane * 16 + (15 - pos));
                    }
                }
                assert_eq!(
                    mask, expected,
                    "mask mismatch at palette {} pos {}",
                    palette, pos
                );
                assert_eq!(
                    mask.count_ones(),
                    palette.count_ones(),
                    "bit count at palette {} pos {}",
                    palette,
                    pos
                );
            }
        }
    }

    #[test]
    fn clear_mask_covers_all_planes() {
        for pos in 0..BLOCK_PIXELS {
            let mask = PIXEL_MASKS.clear_entry(pos);
            assert_eq!(mask.count_ones(), NUM_PLANES as u32);
            for plane in 0..NUM_PLANES {
                assert_ne!(mask & 1 << (plane * 16 + (15 - pos)), 0);
            }
        }
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let again = MaskTable::new();
        for palette in 0..16u8 {
            for pos in 0..BLOCK_PIXELS {
                assert_eq!(again.entry(palette, pos), PIXEL_MASKS.entry(palette, pos));
            }
        }
    }

    #[test]
    fn palette_lut_identity_region() {
        // The first eight packed values map straight through.
        for v in 0..8u8 {
            assert_eq!(palette_index(v), v);
        }
    }

    #[test]
    fn palette_lut_unmapped_patterns() {
        assert_eq!(palette_index(0b001000), UNMAPPED_COLOR_INDEX);
        assert_eq!(palette_index(0b111111), UNMAPPED_COLOR_INDEX);
        assert_eq!(palette_index(0b011111), UNMAPPED_COLOR_INDEX);
    }

    #[test]
    fn palette_lut_ignores_high_bits() {
        // 0xCC & 0x3F == 0b001100, which is a mapped color; the sentinel
        // check happens before the lookup in the sprite path.
        assert_eq!(palette_index(0xCC), palette_index(0x0C));
        assert_eq!(palette_index(0x47), palette_index(0x07));
    }
}
