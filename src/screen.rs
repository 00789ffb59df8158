//! Frame compositor.
//!
//! Blends the background grid with decoded sprites into a 256×240 framebuffer (0xRRGGBB per
//! pixel, row-major) following the [PPU rendering](https://www.nesdev.org/wiki/PPU_rendering)
//! rules: left-column clipping, at most eight sprites per scanline with lower OAM index in
//! front, background-priority sprites hidden behind opaque background, and grayscale.

use crate::ppu::palette::NES_PALETTE_RGB;
use crate::ppu::registers::Mask;
use crate::ppu::render::{DecodedSprite, Frame, FrameSink, SPRITES_PER_SCANLINE};
use crate::ppu::scheduler::{VISIBLE_COLUMNS, VISIBLE_SCANLINES};

pub const SCREEN_WIDTH: usize = VISIBLE_COLUMNS as usize;
pub const SCREEN_HEIGHT: usize = VISIBLE_SCANLINES as usize;

pub struct Screen {
    pub framebuffer: Vec<u32>,
    /// Set on every present; the frontend clears it after displaying.
    pub frame_ready: bool,
    /// Number of the last frame presented.
    pub frame: u64,
}

impl Screen {
    pub fn new() -> Self {
        Self {
            framebuffer: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
            frame_ready: false,
            frame: 0,
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.framebuffer[y * SCREEN_WIDTH + x]
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSink for Screen {
    fn present(&mut self, frame: &Frame<'_>) {
        let mask = frame.mask;
        let show_bg = mask.contains(Mask::SHOW_BACKGROUND);
        let show_sprites = mask.contains(Mask::SHOW_SPRITES);
        let color_mask = if mask.contains(Mask::GRAYSCALE) { 0x30 } else { 0x3F };

        for y in 0..SCREEN_HEIGHT {
            // Sprite evaluation: first eight sprites in OAM order that cover this line
            let mut slots: [Option<(&DecodedSprite, &[u8; 8])>; SPRITES_PER_SCANLINE] =
                [None; SPRITES_PER_SCANLINE];
            let mut count = 0;
            for sprite in frame.sprites {
                if let Some(row) = sprite.row(y as u16) {
                    slots[count] = Some((sprite, row));
                    count += 1;
                    if count == SPRITES_PER_SCANLINE {
                        break;
                    }
                }
            }

            for x in 0..SCREEN_WIDTH {
                let left_column = x < 8;
                let (bg_palette, bg_pixel) =
                    if show_bg && !(left_column && !mask.contains(Mask::SHOW_BACKGROUND_LEFT)) {
                        frame.background_pixel(x as u32, y as u32)
                    } else {
                        (0, 0)
                    };
                let mut color = frame.palette.background_color(bg_palette, bg_pixel);

                if show_sprites && !(left_column && !mask.contains(Mask::SHOW_SPRITES_LEFT)) {
                    for &(sprite, row) in slots[..count].iter().flatten() {
                        let dx = x.wrapping_sub(sprite.x as usize);
                        if dx >= 8 || row[dx] == 0 {
                            continue;
                        }
                        // The frontmost opaque sprite wins even when it is behind the background
                        if !sprite.behind_background || bg_pixel == 0 {
                            color = frame.palette.sprite_color(sprite.palette, row[dx]);
                        }
                        break;
                    }
                }

                self.framebuffer[y * SCREEN_WIDTH + x] =
                    NES_PALETTE_RGB[(color & color_mask) as usize];
            }
        }

        self.frame = frame.number;
        self.frame_ready = true;
    }
}
