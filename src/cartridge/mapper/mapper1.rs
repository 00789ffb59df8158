//! Mapper 1 (MMC1): bank switching via 5-bit shift register.
//!
//! [MMC1](https://www.nesdev.org/wiki/MMC1): writes to $8000–$9FFF (control), $A000–$BFFF (CHR0),
//! $C000–$DFFF (CHR1), $E000–$FFFF (PRG bank). Any write with bit 7 set resets the shift register.
//! Otherwise, bit 0 is shifted in (LSB first); after 5 writes, the value is latched to the selected
//! register. Control (bits 0–1) = mirroring; bits 2–3 = PRG mode; bit 4 = CHR mode (8 KiB or
//! two 4 KiB banks).

use crate::cartridge::mapper::{Mirroring, mapper::Mapper};

/// MMC1 state: 5-bit shift register, control byte (mirroring + PRG/CHR mode), bank selects.
pub struct Mapper1 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    prg_ram: [u8; 0x2000],
    shift_reg: u8,
    shift_count: u8,
    control: u8,
    chr_bank0: u8,
    chr_bank1: u8,
    prg_bank: u8,
    /// Set whenever a register write changes the CHR window layout.
    chr_remapped: bool,
}

impl Mapper1 {
    /// Create MMC1 with PRG ROM and CHR. Control defaults to $0C (PRG mode 3: $8000 switchable,
    /// $C000 fixed last). An empty `chr_rom` selects 8 KiB CHR RAM.
    pub fn new(prg_rom: Vec<u8>, chr_rom: Vec<u8>) -> Self {
        let chr_is_ram = chr_rom.is_empty();
        let chr = if chr_is_ram { vec![0; 0x2000] } else { chr_rom };
        Self {
            prg_rom,
            chr,
            chr_is_ram,
            prg_ram: [0; 0x2000],
            shift_reg: 0,
            shift_count: 0,
            control: 0x0C,
            chr_bank0: 0,
            chr_bank1: 0,
            prg_bank: 0,
            chr_remapped: false,
        }
    }

    /// PRG bank mode from control bits 2–3: 0/1 = 32 KiB mode; 2 = $8000 fixed first, $C000 switchable; 3 = $8000 switchable, $C000 fixed last.
    fn prg_bank_mode(&self) -> u8 {
        (self.control >> 2) & 0b11
    }

    fn prg_bank_count(&self) -> usize {
        (self.prg_rom.len() / 0x4000).max(1)
    }

    /// Physical CHR offset for a PPU pattern-table address, honoring CHR mode (control bit 4).
    fn chr_offset(&self, addr: u16) -> usize {
        let addr = (addr & 0x1FFF) as usize;
        let offset = if self.control & 0x10 == 0 {
            // 8 KiB mode: low bit of CHR0 ignored
            (self.chr_bank0 & 0x1E) as usize * 0x1000 + addr
        } else if addr < 0x1000 {
            self.chr_bank0 as usize * 0x1000 + addr
        } else {
            self.chr_bank1 as usize * 0x1000 + (addr - 0x1000)
        };
        offset % self.chr.len()
    }

    fn latch_register(&mut self, addr: u16, value: u8) {
        match addr {
            0x8000..=0x9FFF => {
                if (self.control ^ value) & 0x10 != 0 {
                    self.chr_remapped = true;
                }
                self.control = value;
            }
            0xA000..=0xBFFF => {
                if self.chr_bank0 != value {
                    self.chr_remapped = true;
                }
                self.chr_bank0 = value;
            }
            0xC000..=0xDFFF => {
                // CHR1 only matters in 4 KiB mode
                if self.chr_bank1 != value && self.control & 0x10 != 0 {
                    self.chr_remapped = true;
                }
                self.chr_bank1 = value;
            }
            0xE000..=0xFFFF => self.prg_bank = value & 0x0F,
            _ => {}
        }
    }
}

impl Mapper for Mapper1 {
    fn cpu_read(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.prg_ram[(addr - 0x6000) as usize],
            // PRG: bank mode and prg_bank select which 16 KiB bank(s) appear at $8000 and $C000.
            0x8000..=0xFFFF => {
                let bank_count = self.prg_bank_count();
                let addr = addr as usize;
                let (bank, offset) = match self.prg_bank_mode() {
                    0 | 1 => {
                        let bank = (self.prg_bank & 0x0E) as usize + (addr >= 0xC000) as usize;
                        (bank, addr & 0x3FFF)
                    }
                    2 => {
                        if addr < 0xC000 {
                            (0, addr - 0x8000)
                        } else {
                            (self.prg_bank as usize, addr - 0xC000)
                        }
                    }
                    _ => {
                        if addr < 0xC000 {
                            (self.prg_bank as usize, addr - 0x8000)
                        } else {
                            (bank_count - 1, addr - 0xC000)
                        }
                    }
                };
                self.prg_rom[((bank % bank_count) * 0x4000 + offset) % self.prg_rom.len()]
            }
            _ => 0,
        }
    }

    fn cpu_write(&mut self, addr: u16, data: u8) {
        match addr {
            0x6000..=0x7FFF => self.prg_ram[(addr - 0x6000) as usize] = data,
            0x8000..=0xFFFF => {
                // MMC1: write with bit 7 set resets shift register and forces PRG mode 3.
                if data & 0x80 != 0 {
                    self.shift_reg = 0;
                    self.shift_count = 0;
                    self.control |= 0x0C;
                    return;
                }

                // Shift in LSB (bit 0); after 5 writes, latch to the register selected by address.
                self.shift_reg >>= 1;
                self.shift_reg |= (data & 1) << 4;
                self.shift_count += 1;

                if self.shift_count < 5 {
                    return;
                }

                let value = self.shift_reg & 0x1F;
                self.latch_register(addr, value);
                self.shift_reg = 0;
                self.shift_count = 0;
            }
            _ => {}
        }
    }

    fn chr_read(&self, addr: u16) -> u8 {
        self.chr[self.chr_offset(addr)]
    }

    fn chr_write(&mut self, addr: u16, data: u8) {
        if self.chr_is_ram {
            let offset = self.chr_offset(addr);
            self.chr[offset] = data;
        }
    }

    /// Mirroring from control bits 0–1: 0 = one-screen lower, 1 = one-screen upper, 2 = vertical, 3 = horizontal.
    fn mirroring(&self) -> Mirroring {
        match self.control & 0b11 {
            0 => Mirroring::OneScreenLower,
            1 => Mirroring::OneScreenUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        }
    }

    fn take_chr_remap(&mut self) -> bool {
        std::mem::take(&mut self.chr_remapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serial_write(m: &mut Mapper1, addr: u16, value: u8) {
        for bit in 0..5 {
            m.cpu_write(addr, (value >> bit) & 1);
        }
    }

    #[test]
    fn control_write_selects_mirroring() {
        let mut m = Mapper1::new(vec![0; 0x8000], vec![0; 0x2000]);
        assert_eq!(m.mirroring(), Mirroring::OneScreenLower);
        serial_write(&mut m, 0x8000, 0b0_1110);
        assert_eq!(m.mirroring(), Mirroring::Vertical);
        serial_write(&mut m, 0x8000, 0b0_1111);
        assert_eq!(m.mirroring(), Mirroring::Horizontal);
    }

    #[test]
    fn prg_mode_three_fixes_last_bank() {
        let mut prg = vec![0; 0x4000 * 4];
        for bank in 0..4 {
            prg[bank * 0x4000] = bank as u8;
        }
        let mut m = Mapper1::new(prg, vec![0; 0x2000]);
        serial_write(&mut m, 0xE000, 2);
        assert_eq!(m.cpu_read(0x8000), 2);
        assert_eq!(m.cpu_read(0xC000), 3);
    }

    #[test]
    fn chr_bank_switch_signals_remap_once() {
        let mut chr = vec![0; 0x1000 * 4];
        chr[0x3000] = 0x5A;
        let mut m = Mapper1::new(vec![0; 0x8000], chr);
        serial_write(&mut m, 0x8000, 0b1_1100);
        assert!(m.take_chr_remap());
        serial_write(&mut m, 0xA000, 3);
        assert!(m.take_chr_remap());
        assert!(!m.take_chr_remap());
        assert_eq!(m.chr_read(0x0000), 0x5A);
    }

    #[test]
    fn reset_bit_discards_partial_shift() {
        let mut m = Mapper1::new(vec![0; 0x8000], vec![0; 0x2000]);
        m.cpu_write(0x8000, 1);
        m.cpu_write(0x8000, 0x80);
        serial_write(&mut m, 0x8000, 0b0_1110);
        assert_eq!(m.mirroring(), Mirroring::Vertical);
    }
}
