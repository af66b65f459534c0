//! Host-side diagnostics. Not compiled into the no_std build.

use crate::screen::{BufferId, Screen};

/// Renders one buffer as ASCII art, one character per pixel: `.` for
/// palette index 0, the uppercase hex digit otherwise. Handy in test
/// failures and in the demo binary.
pub fn ascii_art(screen: &Screen<'_>, id: BufferId) -> String {
    let mut out = String::with_capacity((screen.width() + 1) * screen.height());
    for y in 0..screen.height() {
        for x in 0..screen.width() {
            let index = screen.pixel(id, x, y);
            out.push(match index {
                0 => '.',
                1..=9 => (b'0' + index) as char,
                _ => (b'A' + index - 10) as char,
            });
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blit::{draw_tile, Sprite};
    use crate::screen::Mode;

    #[test]
    fn dump_shows_drawn_pixels() {
        let mode = Mode {
            width: 16,
            height: 2,
            reserved_rows: 0,
            ..Mode::default()
        };
        let mut a = [0u32; 16 / 8 * 2];
        let mut b = [0u32; 16 / 8 * 2];
        let mut screen = Screen::new(mode, &mut a, &mut b).unwrap();
        let data = [u32::from_le_bytes([1, 2, 3, 7])];
        draw_tile(&mut screen, &Sprite::new(4, 1, 1, &data), 0, 0);

        let art = ascii_art(&screen, screen.back_id());
        assert_eq!(art, "1237............\n................\n");
    }
}
