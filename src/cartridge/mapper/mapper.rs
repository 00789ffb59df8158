//! Mapper trait: PRG/CHR memory access and mirroring.

use crate::cartridge::mapper::Mirroring;

/// Trait for NES cartridge mappers. CPU and PPU use these for all cartridge address space.
pub trait Mapper {
    /// Read from PRG ROM/RAM ($6000–$FFFF).
    fn cpu_read(&self, addr: u16) -> u8;
    /// Write to PRG RAM or mapper registers (PRG ROM is read-only).
    fn cpu_write(&mut self, addr: u16, data: u8);
    /// Read from CHR ROM/RAM ($0000–$1FFF).
    fn chr_read(&self, addr: u16) -> u8;
    /// Write to CHR RAM; ignored for CHR ROM.
    fn chr_write(&mut self, addr: u16, data: u8);
    /// Current nametable mirroring for the PPU.
    fn mirroring(&self) -> Mirroring;
    /// True once after a bank switch changed what the pattern tables contain.
    fn take_chr_remap(&mut self) -> bool {
        false
    }
}
