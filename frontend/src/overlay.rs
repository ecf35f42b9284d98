//! Frame-rate readout drawn straight into the picture.

use nesplay_core::video::{FRAME_DEPTH, FRAME_HEIGHT, FRAME_WIDTH, FrameBuffer};

const GLYPH_W: usize = 3;
const GLYPH_H: usize = 5;
/// Top-left corner of the first glyph.
const ORIGIN: (usize, usize) = (2, 2);

/// 3x5 glyph rows, bit 2 is the leftmost pixel.
fn glyph(ch: char) -> [u8; GLYPH_H] {
    match ch {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b011, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '.' => [0, 0, 0, 0, 0b010],
        _ => [0; GLYPH_H],
    }
}

fn put(frame: &mut FrameBuffer, x: usize, y: usize, rgba: [u8; 4]) {
    if x >= FRAME_WIDTH || y >= FRAME_HEIGHT {
        return;
    }
    let offset = (y * FRAME_WIDTH + x) * FRAME_DEPTH;
    frame.as_bytes_mut()[offset..offset + FRAME_DEPTH].copy_from_slice(&rgba);
}

/// Draw `text` in white with a one-pixel black drop shadow.
pub fn draw_text(frame: &mut FrameBuffer, text: &str) {
    for (i, ch) in text.chars().enumerate() {
        let gx = ORIGIN.0 + i * (GLYPH_W + 1);
        for (row, bits) in glyph(ch).into_iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (0b100 >> col) != 0 {
                    let (x, y) = (gx + col, ORIGIN.1 + row);
                    put(frame, x + 1, y + 1, [0, 0, 0, 255]);
                    put(frame, x, y, [255, 255, 255, 255]);
                }
            }
        }
    }
}
