//! NES mappers for PRG/CHR memory mapping.
//!
//! Mapper0 (NROM), Mapper1 (MMC1), and the nametable mirroring layouts they select.

pub mod mapper;

pub mod mapper0;
pub mod mapper1;

/// Nametable mirroring mode for PPU.
///
/// See [Mirroring](https://www.nesdev.org/wiki/Mirroring). The console has 2 KiB of nametable
/// RAM (CIRAM); the cartridge decides which of the four logical nametables share storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    OneScreenLower,
    OneScreenUpper,
}

impl Mirroring {
    /// Map a PPU nametable address ($2000–$3EFF) to an index into the 2 KiB CIRAM.
    /// $3000–$3EFF mirrors $2000–$2EFF.
    pub fn ciram_offset(self, addr: u16) -> usize {
        let addr = (addr - 0x2000) & 0x0FFF;
        let table = addr / 0x400;
        let offset = (addr & 0x3FF) as usize;

        let page = match self {
            // $2000/$2800 share a page, $2400/$2C00 share the other
            Mirroring::Vertical => table & 1,
            // $2000/$2400 share a page, $2800/$2C00 share the other
            Mirroring::Horizontal => table >> 1,
            Mirroring::OneScreenLower => 0,
            Mirroring::OneScreenUpper => 1,
        };
        page as usize * 0x400 + offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_pairs_left_and_right() {
        let m = Mirroring::Vertical;
        assert_eq!(m.ciram_offset(0x2000), m.ciram_offset(0x2800));
        assert_eq!(m.ciram_offset(0x2405), 0x405);
        assert_eq!(m.ciram_offset(0x2C05), 0x405);
    }

    #[test]
    fn horizontal_pairs_top_and_bottom() {
        let m = Mirroring::Horizontal;
        assert_eq!(m.ciram_offset(0x2400), 0);
        assert_eq!(m.ciram_offset(0x2801), 0x401);
        assert_eq!(m.ciram_offset(0x2C3F), 0x43F);
    }

    #[test]
    fn upper_mirror_region_folds_down() {
        let m = Mirroring::Vertical;
        assert_eq!(m.ciram_offset(0x3123), m.ciram_offset(0x2123));
        assert_eq!(Mirroring::OneScreenUpper.ciram_offset(0x3EFF), 0x6FF);
    }
}
