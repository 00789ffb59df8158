//! Decoded PPU register fields.
//!
//! See [PPU registers](https://www.nesdev.org/wiki/PPU_registers). PPUCTRL ($2000) and PPUSTATUS
//! ($2002) are kept as plain structs because they mix multi-bit fields and side-effect-only
//! flags; PPUMASK ($2001) is a set of independent bits.

use bitflags::bitflags;

/// Register indices within the 8-byte window at $2000 (mirrored through $3FFF).
pub const REG_PPUCTRL: u8 = 0;
pub const REG_PPUMASK: u8 = 1;
pub const REG_PPUSTATUS: u8 = 2;
pub const REG_OAMADDR: u8 = 3;
pub const REG_OAMDATA: u8 = 4;
pub const REG_PPUSCROLL: u8 = 5;
pub const REG_PPUADDR: u8 = 6;
pub const REG_PPUDATA: u8 = 7;

/// PPUCTRL ($2000), write-only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Control {
    /// Base nametable: 0 = $2000, 1 = $2400, 2 = $2800, 3 = $2C00.
    pub nametable_base: u8,
    /// VRAM increment per PPUDATA access: false = +1 (across), true = +32 (down).
    pub increment_down: bool,
    /// Sprite pattern table half for 8x8 sprites (0 = $0000, 1 = $1000).
    pub sprite_table: u8,
    /// Background pattern table half (0 = $0000, 1 = $1000).
    pub background_table: u8,
    /// 8x16 sprites.
    pub tall_sprites: bool,
    /// EXT pin direction. Must never be set.
    pub master_slave: bool,
    /// Generate an NMI at the start of vblank.
    pub nmi_enable: bool,
}

impl Control {
    pub fn from_byte(value: u8) -> Self {
        Self {
            nametable_base: value & 0x03,
            increment_down: value & 0x04 != 0,
            sprite_table: (value >> 3) & 1,
            background_table: (value >> 4) & 1,
            tall_sprites: value & 0x20 != 0,
            master_slave: value & 0x40 != 0,
            nmi_enable: value & 0x80 != 0,
        }
    }

    pub fn to_byte(self) -> u8 {
        self.nametable_base
            | (self.increment_down as u8) << 2
            | self.sprite_table << 3
            | self.background_table << 4
            | (self.tall_sprites as u8) << 5
            | (self.master_slave as u8) << 6
            | (self.nmi_enable as u8) << 7
    }

    /// Step applied to the VRAM pointer after each PPUDATA access.
    pub fn vram_increment(self) -> u16 {
        if self.increment_down { 32 } else { 1 }
    }
}

bitflags! {
    /// PPUMASK ($2001), write-only.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Mask: u8 {
        const GRAYSCALE = 0x01;
        /// Show background in the leftmost 8 pixels.
        const SHOW_BACKGROUND_LEFT = 0x02;
        /// Show sprites in the leftmost 8 pixels.
        const SHOW_SPRITES_LEFT = 0x04;
        const SHOW_BACKGROUND = 0x08;
        const SHOW_SPRITES = 0x10;
        const EMPHASIZE_RED = 0x20;
        const EMPHASIZE_GREEN = 0x40;
        const EMPHASIZE_BLUE = 0x80;
    }
}

impl Mask {
    /// Both layers enabled; required for sprite 0 hits.
    pub fn rendering_both(self) -> bool {
        self.contains(Mask::SHOW_BACKGROUND | Mask::SHOW_SPRITES)
    }

    /// Either left-column flag hides pixels 0–7.
    pub fn clips_left_column(self) -> bool {
        !self.contains(Mask::SHOW_BACKGROUND_LEFT | Mask::SHOW_SPRITES_LEFT)
    }
}

/// PPUSTATUS ($2002) flags. Each is set and cleared only by scheduler events, except vblank
/// which a status read also clears.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status {
    pub sprite_overflow: bool,
    pub sprite_zero_hit: bool,
    pub vblank: bool,
}

impl Status {
    /// Top three bits as they appear on a PPUSTATUS read.
    pub fn high_bits(self) -> u8 {
        (self.sprite_overflow as u8) << 5
            | (self.sprite_zero_hit as u8) << 6
            | (self.vblank as u8) << 7
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn control_decodes_every_field() {
        let ctrl = Control::from_byte(0b1011_1110);
        assert_eq!(
            ctrl,
            Control {
                nametable_base: 2,
                increment_down: true,
                sprite_table: 1,
                background_table: 1,
                tall_sprites: true,
                master_slave: false,
                nmi_enable: true,
            }
        );
        assert_eq!(ctrl.to_byte(), 0b1011_1110);
        assert_eq!(ctrl.vram_increment(), 32);
    }

    #[test]
    fn mask_helpers() {
        let mask = Mask::from_bits_retain(0x1E);
        assert!(mask.rendering_both());
        assert!(!mask.clips_left_column());
        assert!(Mask::from_bits_retain(0x18).clips_left_column());
        assert!(!Mask::from_bits_retain(0x08).rendering_both());
    }

    #[test]
    fn status_bits() {
        let status = Status {
            sprite_overflow: true,
            sprite_zero_hit: false,
            vblank: true,
        };
        assert_eq!(status.high_bits(), 0xA0);
    }
}
