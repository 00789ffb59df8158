//! Decoded pattern-table tiles.
//!
//! A [pattern table](https://www.nesdev.org/wiki/PPU_pattern_tables) tile is 16 bytes: eight
//! rows of the low bitplane followed by eight rows of the high bitplane. Decoding yields 64
//! 2-bit color indices, row-major, leftmost pixel first. Tiles are decoded on first use and kept
//! until the pattern tables change underneath them.

use crate::bus::PpuBus;

/// 8×8 pixels of 2-bit color indices, row-major.
pub type Tile = [u8; 64];

/// Two pattern-table halves of 256 tiles each.
const TILE_SLOTS: usize = 512;

pub struct TileCache {
    tiles: Vec<Option<Tile>>,
}

impl TileCache {
    pub fn new() -> Self {
        Self {
            tiles: vec![None; TILE_SLOTS],
        }
    }

    fn slot(half: u8, id: u8) -> usize {
        ((half as usize & 1) << 8) | id as usize
    }

    /// Decoded tile `id` from pattern table `half` (0 = $0000, 1 = $1000), decoding through
    /// `bus` on a miss.
    pub fn tile<B: PpuBus + ?Sized>(&mut self, bus: &mut B, half: u8, id: u8) -> &Tile {
        let slot = Self::slot(half, id);
        self.tiles[slot].get_or_insert_with(|| Self::decode(bus, half, id))
    }

    /// Previously decoded tile, if any.
    pub fn get(&self, half: u8, id: u8) -> Option<&Tile> {
        self.tiles[Self::slot(half, id)].as_ref()
    }

    /// Drop the tile containing pattern-table address `addr` (after a CHR RAM write).
    pub fn invalidate_addr(&mut self, addr: u16) {
        self.tiles[((addr & 0x1FFF) >> 4) as usize] = None;
    }

    /// Drop everything (after a mapper CHR bank switch).
    pub fn invalidate_all(&mut self) {
        self.tiles.fill(None);
    }

    fn decode<B: PpuBus + ?Sized>(bus: &mut B, half: u8, id: u8) -> Tile {
        // bits 0-2 fine y, bit 3 bitplane, bits 4-11 tile id, bit 12 table half
        let base = ((half as u16 & 1) << 12) | ((id as u16) << 4);
        let mut tile = [0u8; 64];
        for fine_y in 0..8u16 {
            let low = bus.ppu_read(base | fine_y);
            let high = bus.ppu_read(base | fine_y | 8);
            for fine_x in 0..8 {
                // Most significant bit is the leftmost pixel
                let bit = 7 - fine_x;
                let color = ((low >> bit) & 1) | (((high >> bit) & 1) << 1);
                tile[fine_y as usize * 8 + fine_x] = color;
            }
        }
        tile
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new()
    }
}
