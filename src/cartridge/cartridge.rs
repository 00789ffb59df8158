//! NES cartridge loading from iNES format (.nes files).
//!
//! Implements the [iNES](https://www.nesdev.org/wiki/INES) format: 16-byte header (magic "NES\x1A",
//! PRG size in 16 KiB units, CHR size in 8 KiB units, flags 6–7 for mapper, etc.), then PRG ROM,
//! then CHR ROM. CHR may be ROM or RAM depending on the header. [Mapper](https://www.nesdev.org/wiki/Mapper)
//! implements CPU PRG ($6000–$FFFF) and PPU CHR ($0000–$1FFF) address decoding and bank switching.
//!
//! The cartridge also fronts the console's 2 KiB nametable RAM: on real boards the cartridge
//! drives CIRAM A10, so the mirroring translation belongs here rather than in the PPU.

use std::fs;
use std::path::Path;

use log::info;

use crate::bus::PpuBus;
use crate::cartridge::mapper::Mirroring;
use crate::cartridge::mapper::mapper::Mapper;
use crate::cartridge::mapper::mapper0::Mapper0;
use crate::cartridge::mapper::mapper1::Mapper1;
use crate::error::CartridgeError;

const HEADER_LEN: usize = 16;
const PRG_UNIT: usize = 16 * 1024;
const CHR_UNIT: usize = 8 * 1024;

/// Cartridge: holds the mapper plus nametable RAM, and answers every PPU address below $3F00.
pub struct Cartridge {
    pub mapper: Box<dyn Mapper>,
    /// Console nametable RAM (CIRAM), addressed through the mapper's mirroring.
    pub ciram: [u8; 0x800],
}

impl Cartridge {
    /// Wrap an already-constructed mapper (used by tests and tools that build CHR in memory).
    pub fn new(mapper: Box<dyn Mapper>) -> Self {
        Self {
            mapper,
            ciram: [0; 0x800],
        }
    }

    /// Load cartridge from an iNES file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CartridgeError> {
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Parse an iNES image. Header bytes 4–5 = PRG/CHR size; bytes 6–7 = mapper number
    /// (high nibble of 6 | high nibble of 7). See iNES "File format".
    pub fn from_bytes(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < HEADER_LEN {
            return Err(CartridgeError::Truncated {
                expected: HEADER_LEN,
                actual: data.len(),
            });
        }
        if &data[0..4] != b"NES\x1A" {
            return Err(CartridgeError::BadMagic);
        }
        if data[6] & 0x04 != 0 {
            return Err(CartridgeError::Trainer);
        }

        let prg_rom_size = data[4] as usize * PRG_UNIT;
        let chr_rom_size = data[5] as usize * CHR_UNIT; // 0 → 8 KiB CHR RAM

        let prg_start = HEADER_LEN;
        let prg_end = prg_start + prg_rom_size;
        let chr_end = prg_end + chr_rom_size;
        if data.len() < chr_end {
            return Err(CartridgeError::Truncated {
                expected: chr_end,
                actual: data.len(),
            });
        }

        let prg_rom = data[prg_start..prg_end].to_vec();
        let chr_rom = data[prg_end..chr_end].to_vec();

        let mapper_id = (data[6] >> 4) | (data[7] & 0xF0);
        // Mirroring from iNES byte 6 bit 0: 0 = horizontal, 1 = vertical (board solder pads for NROM).
        let mirroring = if data[6] & 1 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        info!(
            "iNES: mapper {}, {} KiB PRG, {} KiB CHR {}, {:?} mirroring",
            mapper_id,
            prg_rom_size / 1024,
            chr_rom_size.max(CHR_UNIT) / 1024,
            if chr_rom_size == 0 { "RAM" } else { "ROM" },
            mirroring,
        );

        let mapper: Box<dyn Mapper> = match mapper_id {
            0 => Box::new(Mapper0::new(prg_rom, chr_rom, mirroring)),
            1 => Box::new(Mapper1::new(prg_rom, chr_rom)),
            _ => return Err(CartridgeError::UnsupportedMapper(mapper_id)),
        };

        Ok(Self::new(mapper))
    }

    /// CPU read of cartridge space ($4020–$FFFF).
    pub fn cpu_read(&self, addr: u16) -> u8 {
        self.mapper.cpu_read(addr)
    }

    /// CPU write: PRG RAM or mapper registers (e.g. MMC1 shift register).
    pub fn cpu_write(&mut self, addr: u16, data: u8) {
        self.mapper.cpu_write(addr, data);
    }

    /// Poll and clear the mapper's CHR bank remap signal.
    pub fn take_chr_remap(&mut self) -> bool {
        self.mapper.take_chr_remap()
    }
}

impl PpuBus for Cartridge {
    fn ppu_read(&mut self, addr: u16) -> u8 {
        match addr & 0x3FFF {
            0x0000..=0x1FFF => self.mapper.chr_read(addr),
            addr @ 0x2000..=0x3EFF => self.ciram[self.mapper.mirroring().ciram_offset(addr)],
            // Palette RAM is internal to the PPU
            _ => 0,
        }
    }

    fn ppu_write(&mut self, addr: u16, data: u8) {
        match addr & 0x3FFF {
            0x0000..=0x1FFF => self.mapper.chr_write(addr, data),
            addr @ 0x2000..=0x3EFF => {
                let offset = self.mapper.mirroring().ciram_offset(addr);
                self.ciram[offset] = data;
            }
            _ => {}
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring()
    }
}
