//! Sprite 0 hit prediction.
//!
//! [Sprite 0 hit](https://www.nesdev.org/wiki/PPU_OAM#Sprite_zero_hits) is computed once per frame
//! at the draw point: walk sprite 0's 8×8 footprint in raster order and find the first pixel
//! that is opaque in both sprite 0 and the background. The scheduler then jumps straight to
//! that cycle to set the flag. Opacity is decoded lazily for only the sprite rows and the (at
//! most four) background tiles the footprint touches.

use crate::bus::PpuBus;
use crate::error::{PpuError, Unsupported};
use crate::ppu::ppu::Ppu;
use crate::ppu::render::BackgroundGrid;
use crate::ppu::scheduler::{CYCLES_PER_SCANLINE, SPRITE0_CYCLE_OFFSET, VISIBLE_SCANLINES};
use crate::ppu::tile_cache::{Tile, TileCache};

/// Opacity of one tile row as a bitmask, bit 7 = leftmost pixel.
fn row_opacity(tile: &Tile, row: usize) -> u8 {
    tile[row * 8..row * 8 + 8]
        .iter()
        .fold(0u8, |bits, &px| (bits << 1) | (px != 0) as u8)
}

/// Lazily filled opacity masks for sprite 0 and the background beneath it.
struct Footprint {
    sprite_rows: [u8; 8],
    sprite_known: u8,
    /// 2×2 background tiles, row-major from (first_column, first_row).
    background_rows: [[u8; 8]; 4],
    background_known: u8,
    first_column: u32,
    first_row: u32,
}

impl Footprint {
    fn new(grid: &BackgroundGrid, left: u32, top: u32) -> Self {
        Self {
            sprite_rows: [0; 8],
            sprite_known: 0,
            background_rows: [[0; 8]; 4],
            background_known: 0,
            first_column: (left + grid.fine_x as u32) / 8,
            first_row: (top + grid.fine_y as u32) / 8,
        }
    }

    fn sprite_row<B: PpuBus + ?Sized>(
        &mut self,
        tiles: &mut TileCache,
        bus: &mut B,
        oam: &[u8],
        half: u8,
        dy: usize,
    ) -> u8 {
        if self.sprite_known & (1 << dy) == 0 {
            let attr = oam[2];
            let src_y = if attr & 0x80 != 0 { 7 - dy } else { dy };
            let bits = row_opacity(tiles.tile(bus, half, oam[1]), src_y);
            self.sprite_rows[dy] = if attr & 0x40 != 0 { bits.reverse_bits() } else { bits };
            self.sprite_known |= 1 << dy;
        }
        self.sprite_rows[dy]
    }

    fn background_opaque<B: PpuBus + ?Sized>(
        &mut self,
        tiles: &mut TileCache,
        bus: &mut B,
        grid: &BackgroundGrid,
        x: u32,
        y: u32,
    ) -> bool {
        let wx = x + grid.fine_x as u32;
        let wy = y + grid.fine_y as u32;
        let (column, row) = (wx / 8, wy / 8);
        let slot = ((row - self.first_row) * 2 + (column - self.first_column)) as usize;

        if self.background_known & (1 << slot) == 0 {
            let cell = grid.cell(column as usize, row as usize);
            let tile = tiles.tile(bus, grid.pattern_table, cell.tile_id);
            for (fine_y, bits) in self.background_rows[slot].iter_mut().enumerate() {
                *bits = row_opacity(tile, fine_y);
            }
            self.background_known |= 1 << slot;
        }
        self.background_rows[slot][(wy % 8) as usize] & (0x80 >> (wx % 8)) != 0
    }
}

impl Ppu {
    /// Absolute frame cycle of this frame's first sprite 0 hit, or `None`.
    pub fn predict_sprite_zero_hit<B: PpuBus + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> Result<Option<u32>, PpuError> {
        if !self.mask.rendering_both() {
            return Ok(None);
        }
        let top = self.oam[0] as u32 + 1;
        if top >= VISIBLE_SCANLINES {
            return Ok(None);
        }
        if self.ctrl.tall_sprites {
            return Err(Unsupported::TallSprites.into());
        }

        let left = self.oam[3] as u32;
        let clip_left = self.mask.clips_left_column();
        let half = self.ctrl.sprite_table;
        let oam = &self.oam[0..4];
        let grid = &self.background;
        let tiles = &mut self.tiles;
        let mut footprint = Footprint::new(grid, left, top);

        for dy in 0..8u32 {
            let y = top + dy;
            if y >= VISIBLE_SCANLINES {
                break;
            }
            let sprite_bits = footprint.sprite_row(tiles, bus, oam, half, dy as usize);
            if sprite_bits == 0 {
                continue;
            }
            for dx in 0..8u32 {
                let x = left + dx;
                // the hit check never fires on the last column
                if x >= 255 {
                    break;
                }
                if x < 8 && clip_left {
                    continue;
                }
                if sprite_bits & (0x80 >> dx) == 0 {
                    continue;
                }
                if footprint.background_opaque(tiles, bus, grid, x, y) {
                    return Ok(Some(y * CYCLES_PER_SCANLINE + x + SPRITE0_CYCLE_OFFSET));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_opacity_is_msb_first() {
        let mut tile = [0u8; 64];
        tile[8] = 2;
        tile[15] = 1;
        assert_eq!(row_opacity(&tile, 0), 0);
        assert_eq!(row_opacity(&tile, 1), 0b1000_0001);
    }
}
