//! Double-buffered 4-bitplane planar rendering engine.
//!
//! This crate rasterizes sprites, background tiles, and bitmap glyphs into
//! a planar framebuffer fast enough to sustain full-frame animation on a
//! microcontroller without a graphics accelerator. Pixels live in four
//! interleaved 1-bit planes whose combination yields a 4-bit palette index;
//! sixteen adjacent pixels form the 64-bit *block* that every masked write
//! targets. A 256-entry precomputed mask table turns per-pixel plane math
//! into a single table load, which is what makes the inner loops cheap.
//!
//! The crate is deliberately architecture-independent so it can be tested
//! on the host. It performs no I/O and no allocation: the caller supplies
//! the two framebuffers and calls [`Screen::swap`] when a frame is
//! complete. Transporting the front buffer to an actual display is someone
//! else's problem.
//!
//! ```
//! use p4vga::{draw_sprite, draw_tile, Mode, Opacity, Screen, Sprite};
//!
//! let mode = Mode::default(); // 320x200, 4 bpp
//! let mut buf_a = [0u32; 320 / 8 * 200];
//! let mut buf_b = [0u32; 320 / 8 * 200];
//! let mut screen = Screen::new(mode, &mut buf_a, &mut buf_b).unwrap();
//!
//! let pixels = [0x0403_0201u32]; // one packed 4-pixel group
//! let dot = Sprite::new(4, 1, 1, &pixels);
//! draw_tile(&mut screen, &dot, 0, 0);
//! draw_sprite(&mut screen, &dot, 30, 20, Opacity::Transparent);
//! screen.swap();
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod blit;
pub mod mask;
pub mod screen;
pub mod text;

cfg_if::cfg_if! {
    if #[cfg(any(test, feature = "std"))] {
        pub mod dump;
    }
}

pub use crate::blit::{
    draw_sprite, draw_sprite_opaque, draw_sprite_transparent, draw_tile, Opacity, Sprite,
};
pub use crate::mask::{palette_index, MaskTable, PIXEL_MASKS};
pub use crate::screen::{BufferId, ConfigError, Mode, Screen, MODE_320X200};
pub use crate::text::{Align, Font, Text};
