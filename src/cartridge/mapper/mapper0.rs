//! Mapper 0 (NROM): no bank switching, 16/32KB PRG, 8KB CHR ROM or RAM.

use crate::cartridge::mapper::{Mirroring, mapper::Mapper};

/// NROM mapper: fixed PRG and CHR, optionally 16KB PRG mirror. Mirroring is set by solder pads.
pub struct Mapper0 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    prg_ram: [u8; 0x2000],
    mirroring: Mirroring,
}

impl Mapper0 {
    /// Create Mapper0 with given PRG and CHR. An empty `chr_rom` selects 8 KiB CHR RAM.
    pub fn new(prg_rom: Vec<u8>, chr_rom: Vec<u8>, mirroring: Mirroring) -> Self {
        let chr_is_ram = chr_rom.is_empty();
        let chr = if chr_is_ram { vec![0; 0x2000] } else { chr_rom };
        Self {
            prg_rom,
            chr,
            chr_is_ram,
            prg_ram: [0; 0x2000],
            mirroring,
        }
    }
}

impl Mapper for Mapper0 {
    fn cpu_read(&self, addr: u16) -> u8 {
        match addr {
            // Family BASIC style PRG RAM
            0x6000..=0x7FFF => self.prg_ram[(addr - 0x6000) as usize],
            // PRG ROM: $8000-$FFFF, mirror if 16KB
            0x8000..=0xFFFF => {
                let addr = (addr - 0x8000) as usize;
                self.prg_rom[addr % self.prg_rom.len().max(1)]
            }
            _ => 0,
        }
    }

    fn cpu_write(&mut self, addr: u16, data: u8) {
        if let 0x6000..=0x7FFF = addr {
            self.prg_ram[(addr - 0x6000) as usize] = data;
        }
    }

    fn chr_read(&self, addr: u16) -> u8 {
        self.chr[(addr & 0x1FFF) as usize % self.chr.len()]
    }

    fn chr_write(&mut self, addr: u16, data: u8) {
        if self.chr_is_ram {
            self.chr[(addr & 0x1FFF) as usize] = data;
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_kib_prg_is_mirrored() {
        let mut prg = vec![0; 0x4000];
        prg[0x0010] = 0xAB;
        let m = Mapper0::new(prg, vec![0; 0x2000], Mirroring::Vertical);
        assert_eq!(m.cpu_read(0x8010), 0xAB);
        assert_eq!(m.cpu_read(0xC010), 0xAB);
    }

    #[test]
    fn chr_rom_ignores_writes_chr_ram_keeps_them() {
        let mut rom = Mapper0::new(vec![0; 0x4000], vec![0x11; 0x2000], Mirroring::Horizontal);
        rom.chr_write(0x0003, 0x99);
        assert_eq!(rom.chr_read(0x0003), 0x11);

        let mut ram = Mapper0::new(vec![0; 0x4000], Vec::new(), Mirroring::Horizontal);
        ram.chr_write(0x1FFF, 0x99);
        assert_eq!(ram.chr_read(0x1FFF), 0x99);
    }
}
