//! Renders one frame into a small mode and dumps it as ASCII art.
//!
//! Run with `cargo run --bin demo --features std`.

use p4vga::{dump, draw_sprite, draw_tile, Align, Font, Mode, Opacity, Screen, Sprite, Text};

const WIDTH: usize = 64;
const HEIGHT: usize = 48;

/// Builds a checkered 16x8 tile out of two packed colors.
fn checker_tile(colors: [u8; 2]) -> Vec<u32> {
    let mut data = Vec::with_capacity(4 * 8);
    for y in 0..8 {
        for group in 0..4 {
            let c = colors[(group / 2 + y / 4) % 2];
            data.push(u32::from_le_bytes([c; 4]));
        }
    }
    data
}

/// A diamond-shaped sprite with transparent corners.
fn diamond_sprite(color: u8) -> Vec<u32> {
    let mut data = Vec::with_capacity(2 * 8);
    for y in 0..8i32 {
        let mut row = [0xCCu8; 8];
        let half = 4 - (y - 4).abs();
        for x in 0..8i32 {
            if (x - 4).abs() < half {
                row[x as usize] = color;
            }
        }
        data.push(u32::from_le_bytes([row[0], row[1], row[2], row[3]]));
        data.push(u32::from_le_bytes([row[4], row[5], row[6], row[7]]));
    }
    data
}

fn main() {
    let mode = Mode {
        width: WIDTH,
        height: HEIGHT,
        reserved_rows: 8,
        ..Mode::default()
    };
    let mut buf_a = vec![0u32; mode.buffer_words()];
    let mut buf_b = vec![0u32; mode.buffer_words()];
    let mut screen = Screen::new(mode, &mut buf_a, &mut buf_b).expect("mode and buffers agree");

    // Background: checkered tiles across the drawable area.
    let tile_data = checker_tile([0x01, 0x03]);
    let tile = Sprite::new(16, 8, 4, &tile_data);
    for ty in 0..(HEIGHT as i32) / 8 {
        for tx in 0..(WIDTH as i32) / 16 {
            draw_tile(&mut screen, &tile, tx * 16, ty * 8);
        }
    }

    // A few sprites, one deliberately clipped at the left edge.
    let diamond_data = diamond_sprite(0x07);
    let diamond = Sprite::new(8, 8, 2, &diamond_data);
    draw_sprite(&mut screen, &diamond, 12, 6, Opacity::Transparent);
    draw_sprite(&mut screen, &diamond, 40, 22, Opacity::Transparent);
    draw_sprite(&mut screen, &diamond, -3, 14, Opacity::Transparent);

    // HUD line in the reserved band, centered.
    let mut text = Text::new(Font::font_8x8());
    text.align(Align::Center);
    text.set_color(0xF);
    text.set_border(Some(0x1));
    text.move_to(WIDTH as i32 / 2, HEIGHT as i32 - 8);
    text.print_fmt(&mut screen, format_args!("F{:03}", 1));

    screen.swap();
    print!("{}", dump::ascii_art(&screen, screen.front_id()));
}
