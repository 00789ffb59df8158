//! Per-frame render pipeline.
//!
//! Runs at vblank end rather than per pixel: the background is resolved into a grid of
//! (tile id, palette selector) cells from the nametable and
//! [attribute table](https://www.nesdev.org/wiki/PPU_attribute_tables), and every OAM slot is
//! decoded into eight rows of flipped pixel indices. A [`FrameSink`] receives both at the draw
//! point and composites them. Mid-frame scroll or nametable changes show up on the next frame.

use crate::bus::PpuBus;
use crate::cartridge::mapper::Mirroring;
use crate::error::{PpuError, Unsupported};
use crate::ppu::palette::PaletteRam;
use crate::ppu::ppu::{OAM_LEN, Ppu};
use crate::ppu::registers::Mask;
use crate::ppu::scheduler::VISIBLE_SCANLINES;
use crate::ppu::tile_cache::{Tile, TileCache};

/// One column more than the 32 visible so fine X scroll can expose a partial tile.
pub const GRID_COLUMNS: usize = 33;
/// One row more than the 30 visible, for fine Y scroll.
pub const GRID_ROWS: usize = 31;

/// Most sprites the PPU can fetch for one scanline.
pub const SPRITES_PER_SCANLINE: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackgroundCell {
    pub tile_id: u8,
    /// Background palette 0..4 from the attribute table.
    pub palette: u8,
}

/// The background as seen from the scroll origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundGrid {
    pub cells: [[BackgroundCell; GRID_COLUMNS]; GRID_ROWS],
    /// Pixels of cell column 0 hidden off the left edge.
    pub fine_x: u8,
    /// Pixels of cell row 0 hidden off the top edge.
    pub fine_y: u8,
    /// Pattern table half the tile ids index into.
    pub pattern_table: u8,
}

impl Default for BackgroundGrid {
    fn default() -> Self {
        Self {
            cells: [[BackgroundCell::default(); GRID_COLUMNS]; GRID_ROWS],
            fine_x: 0,
            fine_y: 0,
            pattern_table: 0,
        }
    }
}

impl BackgroundGrid {
    pub fn cell(&self, column: usize, row: usize) -> BackgroundCell {
        self.cells[row][column]
    }

    /// Cell under screen pixel (x, y) and the pixel's position inside that tile.
    pub fn locate(&self, x: u32, y: u32) -> (BackgroundCell, usize, usize) {
        let wx = x + self.fine_x as u32;
        let wy = y + self.fine_y as u32;
        let cell = self.cells[(wy / 8) as usize][(wx / 8) as usize];
        (cell, (wx % 8) as usize, (wy % 8) as usize)
    }
}

/// Shift that selects a tile's 2-bit palette out of its attribute byte: each byte covers a
/// 4×4-tile area, top-left quadrant in bits 0–1, top-right 2–3, bottom-left 4–5,
/// bottom-right 6–7.
pub fn attribute_shift(column: u16, row: u16) -> u8 {
    (((row & 2) << 1) | (column & 2)) as u8
}

/// One OAM slot resolved to pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSprite {
    pub index: u8,
    pub x: u8,
    /// First scanline covered (OAM Y + 1).
    pub top: u16,
    pub tile: u8,
    /// Sprite palette 0..4.
    pub palette: u8,
    pub flip_h: bool,
    pub flip_v: bool,
    pub behind_background: bool,
    /// Rows top to bottom, pixels left to right, flips applied.
    pub rows: [[u8; 8]; 8],
}

impl DecodedSprite {
    /// Decode OAM entry `entry` (Y-1, tile, attr, X) with the tile's pixels.
    pub fn from_oam(index: u8, entry: &[u8], pixels: &Tile) -> Self {
        let attr = entry[2];
        let flip_v = attr & 0x80 != 0;
        let flip_h = attr & 0x40 != 0;

        let mut rows = [[0u8; 8]; 8];
        for (dy, row) in rows.iter_mut().enumerate() {
            let src_y = if flip_v { 7 - dy } else { dy };
            for (dx, px) in row.iter_mut().enumerate() {
                let src_x = if flip_h { 7 - dx } else { dx };
                *px = pixels[src_y * 8 + src_x];
            }
        }

        Self {
            index,
            x: entry[3],
            top: entry[0] as u16 + 1,
            tile: entry[1],
            palette: attr & 0x03,
            flip_h,
            flip_v,
            behind_background: attr & 0x20 != 0,
            rows,
        }
    }

    /// The sprite's pixels on `scanline`, if it covers it.
    pub fn row(&self, scanline: u16) -> Option<&[u8; 8]> {
        scanline
            .checked_sub(self.top)
            .filter(|dy| *dy < 8)
            .map(|dy| &self.rows[dy as usize])
    }
}

/// A finished frame, handed to the presentation layer once per frame.
pub struct Frame<'a> {
    pub number: u64,
    pub background: &'a BackgroundGrid,
    pub sprites: &'a [DecodedSprite],
    pub palette: &'a PaletteRam,
    pub mask: Mask,
    tiles: &'a TileCache,
}

impl Frame<'_> {
    /// Background palette and 2-bit pixel at screen position (x, y). Pixel 0 is transparent.
    pub fn background_pixel(&self, x: u32, y: u32) -> (u8, u8) {
        let (cell, px, py) = self.background.locate(x, y);
        let pixel = self
            .tiles
            .get(self.background.pattern_table, cell.tile_id)
            .map_or(0, |tile| tile[py * 8 + px]);
        (cell.palette, pixel)
    }
}

/// Receives each finished frame. Also the natural place for a frontend to poll input.
pub trait FrameSink {
    fn present(&mut self, frame: &Frame<'_>);
}

/// Headless: frames are dropped.
impl FrameSink for () {
    fn present(&mut self, _frame: &Frame<'_>) {}
}

impl Ppu {
    /// Resolve the 33×31 cells visible from the scroll origin into the background grid.
    pub(crate) fn rebuild_background<B: PpuBus + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> Result<(), PpuError> {
        let mirroring = bus.mirroring();
        if !matches!(mirroring, Mirroring::Horizontal | Mirroring::Vertical) {
            if self.mask.contains(Mask::SHOW_BACKGROUND) {
                return Err(Unsupported::Mirroring(mirroring).into());
            }
            // Nothing is shown; try again once the mapper is configured
            return Ok(());
        }

        // World coordinates across the 512×480 arrangement of four nametables
        let origin_x = (self.ctrl.nametable_base as u32 & 1) * 256 + self.scroll_x as u32;
        let origin_y =
            ((self.ctrl.nametable_base as u32 >> 1) * 240 + self.scroll_y as u32) % 480;
        let half = self.ctrl.background_table;

        let grid = &mut self.background;
        grid.fine_x = (origin_x % 8) as u8;
        grid.fine_y = (origin_y % 8) as u8;
        grid.pattern_table = half;

        for row in 0..GRID_ROWS {
            let tile_y = (origin_y / 8 + row as u32) % 60;
            for column in 0..GRID_COLUMNS {
                let tile_x = (origin_x / 8 + column as u32) % 64;
                let nametable = 0x2000 + ((tile_y / 30) * 2 + tile_x / 32) as u16 * 0x400;
                let (x, y) = ((tile_x % 32) as u16, (tile_y % 30) as u16);

                let tile_id = bus.ppu_read(nametable + y * 32 + x);
                let attr = bus.ppu_read(nametable + 0x3C0 + (y / 4) * 8 + x / 4);
                let palette = (attr >> attribute_shift(x, y)) & 0x03;

                self.tiles.tile(bus, half, tile_id);
                grid.cells[row][column] = BackgroundCell { tile_id, palette };
            }
        }

        self.background_dirty = false;
        Ok(())
    }

    /// Decode all 64 OAM slots and note whether any visible scanline holds more than eight.
    pub(crate) fn decode_sprites<B: PpuBus + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> Result<(), PpuError> {
        if self.ctrl.tall_sprites && self.mask.contains(Mask::SHOW_SPRITES) {
            return Err(Unsupported::TallSprites.into());
        }

        let half = self.ctrl.sprite_table;
        let mut per_line = [0u8; VISIBLE_SCANLINES as usize];
        self.sprites.clear();
        for (index, entry) in self.oam.chunks_exact(4).enumerate() {
            let pixels = self.tiles.tile(bus, half, entry[1]);
            let sprite = DecodedSprite::from_oam(index as u8, entry, pixels);

            let top = sprite.top as usize;
            let bottom = (top + 8).min(per_line.len());
            if top < bottom {
                for count in &mut per_line[top..bottom] {
                    *count += 1;
                }
            }
            self.sprites.push(sprite);
        }
        debug_assert_eq!(self.sprites.len(), OAM_LEN / 4);

        self.sprite_overflow_pending = per_line
            .iter()
            .any(|&count| count as usize > SPRITES_PER_SCANLINE);
        self.sprites_dirty = false;
        Ok(())
    }

    pub(crate) fn present<S: FrameSink + ?Sized>(&self, sink: &mut S) {
        sink.present(&Frame {
            number: self.frame,
            background: &self.background,
            sprites: &self.sprites,
            palette: &self.palette,
            mask: self.mask,
            tiles: &self.tiles,
        });
    }
}
