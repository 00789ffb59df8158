//! Memory bus and address decoding for the NES.
//!
//! Maps CPU addresses to RAM, PPU registers, OAM DMA and the cartridge, and converts CPU cycles
//! into PPU cycles for the catch-up clock.

use log::warn;

use crate::cartridge::cartridge::Cartridge;
use crate::cartridge::mapper::Mirroring;
use crate::error::PpuError;
use crate::ppu::{Ppu, PpuConfig};
use crate::screen::Screen;

/// PPU cycles per CPU cycle (NTSC).
pub const PPU_CYCLES_PER_CPU_CYCLE: u64 = 3;

/// Value seen when reading unmapped APU and controller registers.
const OPEN_BUS: u8 = 0x40;

/// Trait for memory-mapped I/O and bus access used by the CPU.
pub trait Bus {
    fn read(&mut self, addr: u16) -> Result<u8, PpuError>;
    fn write(&mut self, addr: u16, data: u8) -> Result<(), PpuError>;
    /// Report `cycles` elapsed CPU cycles.
    fn tick(&mut self, cycles: usize) -> Result<(), PpuError>;
    fn poll_nmi(&mut self) -> bool;
}

/// The PPU's own address space below $3F00: pattern tables and nametables.
pub trait PpuBus {
    fn ppu_read(&mut self, addr: u16) -> u8;
    fn ppu_write(&mut self, addr: u16, data: u8);
    /// Nametable layout the cartridge currently selects.
    fn mirroring(&self) -> Mirroring;
}

/// Main NES bus: RAM, PPU, cartridge, and the screen frames are presented to.
pub struct NesBus {
    pub ram: [u8; 2048],
    pub cart: Cartridge,
    pub ppu: Ppu,
    pub screen: Screen,
}

impl NesBus {
    /// Create a new bus with the given cartridge.
    pub fn new(cart: Cartridge) -> Self {
        Self::with_config(cart, PpuConfig::default())
    }

    pub fn with_config(cart: Cartridge, config: PpuConfig) -> Self {
        Self {
            ram: [0; 2048],
            cart,
            ppu: Ppu::new(config),
            screen: Screen::new(),
        }
    }

    /// True once the PPU has presented a frame into the screen's framebuffer.
    pub fn frame_ready(&self) -> bool {
        self.screen.frame_ready
    }

    /// Clear frame_ready after presenting (so the next draw can set it).
    pub fn clear_frame_ready(&mut self) {
        self.screen.frame_ready = false;
    }

    /// OAM DMA ($4014): copy CPU page `page` into OAM.
    ///
    /// Every source byte is read through the CPU memory map. Register pages are peeked without
    /// side effects: PPU registers yield the I/O latch, APU/controller space the open-bus value.
    fn oam_dma(&mut self, page: u8) {
        let ram = &self.ram;
        let cart = &self.cart;
        let latch = self.ppu.latch;
        self.ppu.oam_dma(page, |addr| match addr {
            0x0000..=0x1FFF => ram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => latch,
            0x4000..=0x401F => OPEN_BUS,
            0x4020..=0xFFFF => cart.cpu_read(addr),
        });
    }
}

impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> Result<u8, PpuError> {
        Ok(match addr {
            // Internal RAM (mirrored 4x in 0x0000-0x1FFF)
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            // PPU registers $2000-$3FFF (mirrored every 8 bytes)
            0x2000..=0x3FFF => self.ppu.read_register((addr & 0x0007) as u8, &mut self.cart)?,
            // APU and controllers: open bus
            0x4000..=0x401F => OPEN_BUS,
            0x4020..=0xFFFF => self.cart.cpu_read(addr),
        })
    }

    fn write(&mut self, addr: u16, data: u8) -> Result<(), PpuError> {
        match addr {
            // Internal RAM
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = data,
            // PPU registers $2000-$3FFF (mirrored every 8 bytes)
            0x2000..=0x3FFF => {
                self.ppu
                    .write_register((addr & 0x0007) as u8, data, &mut self.cart)?
            }
            0x4014 => self.oam_dma(data),
            // APU, controllers: no-op
            0x4000..=0x401F => {}
            // Cartridge: PRG RAM and mapper registers (e.g. MMC1)
            0x4020..=0xFFFF => {
                self.cart.cpu_write(addr, data);
                if self.cart.take_chr_remap() {
                    self.ppu.invalidate_tiles();
                }
            }
        }
        Ok(())
    }

    fn tick(&mut self, cycles: usize) -> Result<(), PpuError> {
        let ppu_cycles = cycles as u64 * PPU_CYCLES_PER_CPU_CYCLE;
        self.ppu
            .advance(ppu_cycles, &mut self.cart, &mut self.screen)
            .inspect_err(|err| {
                if !err.is_fatal() {
                    warn!("PPU halted: {}", err);
                }
            })
    }

    fn poll_nmi(&mut self) -> bool {
        self.ppu.poll_nmi()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::mapper::mapper0::Mapper0;
    use crate::cartridge::mapper::mapper1::Mapper1;
    use crate::ppu::scheduler::VBLANK_START_CYCLE;

    fn nrom_bus() -> NesBus {
        let mapper = Mapper0::new(vec![0; 0x4000], Vec::new(), Mirroring::Vertical);
        NesBus::new(Cartridge::new(Box::new(mapper)))
    }

    #[test]
    fn registers_mirror_every_eight_bytes() {
        let mut bus = nrom_bus();
        bus.write(0x3FF6, 0x21).unwrap(); // $2006
        bus.write(0x2006, 0x08).unwrap();
        assert_eq!(bus.ppu.vram_addr, 0x2108);
        bus.write(0x200F, 0x55).unwrap(); // $2007
        assert_eq!(bus.cart.ppu_read(0x2108), 0x55);
    }

    #[test]
    fn oam_dma_copies_a_ram_page() {
        let mut bus = nrom_bus();
        for i in 0..256u16 {
            bus.write(0x0300 + i, i as u8).unwrap();
        }
        bus.write(0x2003, 0x00).unwrap();
        bus.write(0x4014, 0x03).unwrap();
        assert_eq!(bus.ppu.oam[0], 0x00);
        assert_eq!(bus.ppu.oam[0xFF], 0xFF);
    }

    #[test]
    fn oam_dma_from_register_pages_has_no_side_effects() {
        let mut bus = nrom_bus();
        bus.write(0x2003, 0x00).unwrap();
        bus.write(0x2005, 0x12).unwrap();
        bus.write(0x4014, 0x20).unwrap();
        assert!(bus.ppu.oam.iter().all(|&b| b == 0x12));
        // the PPUSCROLL toggle was not reset by peeking $2002
        assert_eq!(bus.ppu.next_scroll, 1);

        bus.write(0x4014, 0x40).unwrap();
        assert_eq!(bus.ppu.oam[0x00], OPEN_BUS);
        assert_eq!(bus.ppu.oam[0x1F], OPEN_BUS);
        assert_eq!(bus.ppu.oam[0x20], 0x00);
    }

    #[test]
    fn tick_runs_three_ppu_cycles_per_cpu_cycle() {
        let mut bus = nrom_bus();
        bus.write(0x2000, 0x80).unwrap();
        let cpu_cycles = (VBLANK_START_CYCLE as usize).div_ceil(3);
        bus.tick(cpu_cycles - 1).unwrap();
        assert!(!bus.poll_nmi());
        bus.tick(1).unwrap();
        assert!(bus.poll_nmi());
        assert!(!bus.poll_nmi());
    }

    #[test]
    fn chr_bank_switch_invalidates_tiles() {
        let mut chr = vec![0; 0x4000];
        chr[0x1000] = 0xFF;
        let mapper = Mapper1::new(vec![0; 0x8000], chr);
        let mut bus = NesBus::new(Cartridge::new(Box::new(mapper)));
        assert_eq!(bus.ppu.tiles.tile(&mut bus.cart, 0, 0)[0], 0);

        // 4 KiB CHR mode, then CHR0 = bank 1
        for value in [0b1_0000u8, 1] {
            let addr = if value == 1 { 0xA000 } else { 0x8000 };
            for bit in 0..5 {
                bus.write(addr, (value >> bit) & 1).unwrap();
            }
        }
        assert!(bus.ppu.tiles.get(0, 0).is_none());
        assert_eq!(bus.ppu.tiles.tile(&mut bus.cart, 0, 0)[0], 1);
    }
}
