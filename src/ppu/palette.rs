//! Palette RAM ($3F00–$3FFF) and the 2C02 master palette.
//!
//! See [PPU palettes](https://www.nesdev.org/wiki/PPU_palettes). 32 bytes mirrored through $3FFF;
//! $3F10/$3F14/$3F18/$3F1C alias $3F00/$3F04/$3F08/$3F0C.

/// NES 2C02-style 64-color palette (0xRRGGBB). Index 0 = backdrop.
pub const NES_PALETTE_RGB: [u32; 64] = [
    0x545454, 0x001E74, 0x081090, 0x300088, 0x440064, 0x5C0030, 0x540400, 0x3C1800, 0x202A00,
    0x083A00, 0x004000, 0x003C00, 0x00302C, 0x000000, 0x000000, 0x000000, 0x989698, 0x084CC4,
    0x3032EC, 0x5C1EE4, 0x8814B0, 0xA01464, 0x982220, 0x783C00, 0x545A00, 0x287200, 0x087C00,
    0x007628, 0x006678, 0x000000, 0x000000, 0x000000, 0xECEEEC, 0x3C7EEC, 0x5C5CEC, 0x8844EC,
    0xB02CEC, 0xE028B0, 0xD83C50, 0xC45400, 0xAC7000, 0x808800, 0x409C30, 0x20A458, 0x209A88,
    0x404040, 0x000000, 0x000000, 0xECEEEC, 0xA8BCEC, 0xBCACEC, 0xD4A0EC, 0xEC94EC, 0xEC90D4,
    0xEC9CB4, 0xE4B090, 0xDCC878, 0xD4DC78, 0xB8EC98, 0xA8ECBC, 0xA0E4E4, 0xA0A0A0, 0x000000,
    0x000000,
];

/// Palette RAM, 32 bytes of 6-bit color indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaletteRam {
    entries: [u8; 32],
}

impl PaletteRam {
    /// Resolve a palette address ($3F00–$3FFF) to its storage slot.
    pub fn slot(addr: u16) -> usize {
        let i = (addr & 0x1F) as usize;
        // Sprite palette entry 0 of each group aliases the background one
        if i & 0x13 == 0x10 { i & 0x0F } else { i }
    }

    pub fn read(&self, addr: u16) -> u8 {
        self.entries[Self::slot(addr)]
    }

    /// Upper 2 bits of data are not stored.
    pub fn write(&mut self, addr: u16, data: u8) {
        self.entries[Self::slot(addr)] = data & 0x3F;
    }

    /// Color index for a background pixel: `palette` in 0..4, `pixel` 2-bit, 0 = backdrop.
    pub fn background_color(&self, palette: u8, pixel: u8) -> u8 {
        if pixel == 0 {
            self.entries[0]
        } else {
            self.entries[(palette as usize & 3) * 4 + pixel as usize]
        }
    }

    /// Color index for an opaque sprite pixel.
    pub fn sprite_color(&self, palette: u8, pixel: u8) -> u8 {
        self.read(0x3F10 + (palette as u16 & 3) * 4 + pixel as u16)
    }
}
