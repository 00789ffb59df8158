//! NES PPU (Picture Processing Unit) state and register interface.
//!
//! Holds the decoded PPUCTRL/PPUMASK/PPUSTATUS fields, the shared I/O latch, the scroll and
//! address write toggles, OAM, palette RAM and the per-frame render products. Registers:
//! $2000–$2007 (mirrored every 8 bytes by the bus). Timing lives in [`super::scheduler`].

use std::fmt::Write as _;

use log::{debug, error, trace};

use crate::bus::PpuBus;
use crate::error::PpuError;
use crate::ppu::palette::PaletteRam;
use crate::ppu::registers::{
    Control, Mask, REG_OAMADDR, REG_OAMDATA, REG_PPUADDR, REG_PPUCTRL, REG_PPUDATA, REG_PPUMASK,
    REG_PPUSCROLL, REG_PPUSTATUS, Status,
};
use crate::ppu::render::{BackgroundGrid, DecodedSprite};
use crate::ppu::scheduler::{Action, CYCLES_PER_SCANLINE, VBLANK_START_CYCLE};
use crate::ppu::tile_cache::TileCache;

/// OAM (Object Attribute Memory): 64 sprites × 4 bytes. Each entry: Y-1, tile, attr, X.
pub const OAM_LEN: usize = 256;

/// How much the core reports through `log`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    #[default]
    Quiet,
    /// Scheduler events and suspicious register accesses.
    Events,
    /// Every register access as well.
    Registers,
}

/// Construction-time options for [`Ppu`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PpuConfig {
    pub verbosity: Verbosity,
}

/// PPU state: registers, latches, OAM, palette, clock position and render products.
pub struct Ppu {
    pub config: PpuConfig,
    /// Last value driven on the PPU data bus; returned by reads of write-only registers.
    pub latch: u8,
    pub ctrl: Control,
    pub mask: Mask,
    pub status: Status,
    /// OAM: 64 sprites × 4 bytes. Written via $2003/$2004 or $4014 DMA.
    pub oam: [u8; OAM_LEN],
    /// OAM address for $2003/$2004 (byte index 0..255).
    pub oam_addr: u8,
    pub scroll_x: u8,
    pub scroll_y: u8,
    /// PPUSCROLL toggle: 0 = next write is X, 1 = next write is Y.
    pub next_scroll: u8,
    /// PPUADDR toggle: 0 = next write is the high byte, 1 = the low byte.
    pub next_addr: u8,
    /// 14-bit VRAM pointer used by $2007.
    pub vram_addr: u16,
    /// PPUDATA read buffer (one access behind for addresses below $3F00).
    pub read_buffer: u8,
    /// Palette RAM $3F00-$3F1F (32 bytes, with NES mirroring).
    pub palette: PaletteRam,
    /// NMI line, set at vblank start when enabled; polled and cleared by the CPU.
    pub nmi: bool,
    /// Position in the frame, 0..CYCLES_PER_FRAME. Cycle 0 is dot 0 of scanline 0.
    pub cycle: u32,
    /// Frames presented since power-up.
    pub frame: u64,
    pub(crate) next_action_cycle: u32,
    pub(crate) next_action: Action,
    pub(crate) tiles: TileCache,
    pub(crate) background: BackgroundGrid,
    pub(crate) background_dirty: bool,
    pub(crate) sprites: Vec<DecodedSprite>,
    pub(crate) sprites_dirty: bool,
    pub(crate) sprite_overflow_pending: bool,
}

impl Ppu {
    /// Create PPU in its power-up state: all latches clear, next event is vblank start.
    pub fn new(config: PpuConfig) -> Self {
        Self {
            config,
            latch: 0,
            ctrl: Control::default(),
            mask: Mask::empty(),
            status: Status::default(),
            oam: [0; OAM_LEN],
            oam_addr: 0,
            scroll_x: 0,
            scroll_y: 0,
            next_scroll: 0,
            next_addr: 0,
            vram_addr: 0,
            read_buffer: 0,
            palette: PaletteRam::default(),
            nmi: false,
            cycle: 0,
            frame: 0,
            next_action_cycle: VBLANK_START_CYCLE,
            next_action: Action::VblankStart,
            tiles: TileCache::new(),
            background: BackgroundGrid::default(),
            background_dirty: true,
            sprites: Vec::with_capacity(OAM_LEN / 4),
            sprites_dirty: true,
            sprite_overflow_pending: false,
        }
    }

    /// Return to power-up state, keeping the configuration.
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    /// Read register `index` ($2000 + index). Write-only registers return the latch.
    pub fn read_register<B: PpuBus + ?Sized>(
        &mut self,
        index: u8,
        bus: &mut B,
    ) -> Result<u8, PpuError> {
        match index {
            REG_PPUSTATUS => {
                // keep the low five bits of the latch
                self.latch = (self.latch & 0x1F) | self.status.high_bits();
                self.status.vblank = false;
                self.next_scroll = 0;
                self.next_addr = 0;
            }
            REG_OAMDATA => self.latch = self.oam[self.oam_addr as usize],
            REG_PPUDATA => self.latch = self.read_data(bus),
            REG_PPUCTRL | REG_PPUMASK | REG_OAMADDR | REG_PPUSCROLL | REG_PPUADDR => {
                if self.config.verbosity >= Verbosity::Events {
                    debug!("read from write-only register $200{}", index);
                }
            }
            _ => return Err(self.fatal(PpuError::BadRegister(index))),
        }
        if self.config.verbosity >= Verbosity::Registers {
            trace!("read  $200{} -> ${:02X}", index, self.latch);
        }
        Ok(self.latch)
    }

    /// Write register `index` ($2000 + index). Every write lands in the latch first.
    pub fn write_register<B: PpuBus + ?Sized>(
        &mut self,
        index: u8,
        data: u8,
        bus: &mut B,
    ) -> Result<(), PpuError> {
        if self.config.verbosity >= Verbosity::Registers {
            trace!("write $200{} <- ${:02X}", index, data);
        }
        self.latch = data;
        match index {
            REG_PPUCTRL => self.write_ctrl(data)?,
            REG_PPUMASK => self.mask = Mask::from_bits_retain(data),
            REG_PPUSTATUS => {
                if self.config.verbosity >= Verbosity::Events {
                    debug!("write to read-only PPUSTATUS: ${:02X}", data);
                }
            }
            REG_OAMADDR => self.oam_addr = data,
            REG_OAMDATA => {
                self.oam[self.oam_addr as usize] = data;
                self.oam_addr = self.oam_addr.wrapping_add(1);
                self.sprites_dirty = true;
            }
            REG_PPUSCROLL => {
                // first write = fine/coarse X, second write = fine/coarse Y
                if self.next_scroll == 0 {
                    self.scroll_x = data;
                    self.next_scroll = 1;
                } else {
                    self.scroll_y = data;
                    self.next_scroll = 0;
                }
                self.background_dirty = true;
            }
            REG_PPUADDR => {
                // high byte first; addresses above $3FFF mirror down
                if self.next_addr == 0 {
                    self.vram_addr = ((data as u16 & 0x3F) << 8) | (self.vram_addr & 0x00FF);
                    self.next_addr = 1;
                } else {
                    self.vram_addr = (self.vram_addr & 0x3F00) | data as u16;
                    self.next_addr = 0;
                }
            }
            REG_PPUDATA => self.write_data(bus, data),
            _ => return Err(self.fatal(PpuError::BadRegister(index))),
        }
        Ok(())
    }

    fn write_ctrl(&mut self, data: u8) -> Result<(), PpuError> {
        let ctrl = Control::from_byte(data);
        if ctrl.master_slave {
            return Err(self.fatal(PpuError::MasterSlaveSelect { value: data }));
        }
        if ctrl.nametable_base != self.ctrl.nametable_base
            || ctrl.background_table != self.ctrl.background_table
        {
            self.background_dirty = true;
        }
        if ctrl.sprite_table != self.ctrl.sprite_table || ctrl.tall_sprites != self.ctrl.tall_sprites
        {
            self.sprites_dirty = true;
        }
        // Enabling NMI during vblank raises it immediately
        if ctrl.nmi_enable && !self.ctrl.nmi_enable && self.status.vblank {
            self.nmi = true;
        }
        self.ctrl = ctrl;
        Ok(())
    }

    /// PPUDATA read: buffered below $3F00, immediate for palette RAM. The buffer is always
    /// refilled; palette reads refill it with the nametable byte underneath.
    fn read_data<B: PpuBus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        let addr = self.vram_addr & 0x3FFF;
        let value = if addr >= 0x3F00 {
            self.read_buffer = bus.ppu_read(addr - 0x1000);
            // palette entries are 6 bits; the top two come from the latch
            (self.latch & 0xC0) | self.palette.read(addr)
        } else {
            let buffered = self.read_buffer;
            self.read_buffer = bus.ppu_read(addr);
            buffered
        };
        self.increment_vram_addr();
        value
    }

    /// PPUDATA write: CHR and nametables go to the cartridge, palette RAM stays here.
    fn write_data<B: PpuBus + ?Sized>(&mut self, bus: &mut B, data: u8) {
        let addr = self.vram_addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => {
                bus.ppu_write(addr, data);
                self.tiles.invalidate_addr(addr);
                self.background_dirty = true;
                self.sprites_dirty = true;
            }
            0x2000..=0x3EFF => {
                bus.ppu_write(addr, data);
                self.background_dirty = true;
            }
            _ => self.palette.write(addr, data),
        }
        self.increment_vram_addr();
    }

    fn increment_vram_addr(&mut self) {
        self.vram_addr = self.vram_addr.wrapping_add(self.ctrl.vram_increment()) & 0x3FFF;
    }

    /// OAM DMA ($4014): read the 256-byte page `page` through `read`, then copy it into OAM
    /// starting at OAMADDR. OAM is untouched until every source byte has been read.
    pub fn oam_dma<R: FnMut(u16) -> u8>(&mut self, page: u8, mut read: R) {
        let base = (page as u16) << 8;
        let mut buffer = [0u8; OAM_LEN];
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = read(base | i as u16);
        }
        for (i, byte) in buffer.into_iter().enumerate() {
            self.oam[self.oam_addr.wrapping_add(i as u8) as usize] = byte;
        }
        self.sprites_dirty = true;
    }

    /// Poll and clear the NMI line.
    pub fn poll_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi)
    }

    /// Forget every decoded tile. Called when the mapper remaps CHR banks.
    pub fn invalidate_tiles(&mut self) {
        self.tiles.invalidate_all();
        self.background_dirty = true;
        self.sprites_dirty = true;
    }

    /// Current scanline (0..262) and dot (0..341).
    pub fn position(&self) -> (u32, u32) {
        (self.cycle / CYCLES_PER_SCANLINE, self.cycle % CYCLES_PER_SCANLINE)
    }

    /// The cycle and kind of the next scheduled event.
    pub fn next_event(&self) -> (u32, Action) {
        (self.next_action_cycle, self.next_action)
    }

    /// The background grid as last built (33×31 cells from the scroll origin).
    pub fn background(&self) -> &BackgroundGrid {
        &self.background
    }

    /// Sprites as last decoded, in OAM order.
    pub fn sprites(&self) -> &[DecodedSprite] {
        &self.sprites
    }

    /// Register, clock and OAM state for fatal diagnostics.
    pub fn dump_state(&self) -> String {
        let (scanline, dot) = self.position();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "PPUCTRL=${:02X} PPUMASK=${:02X} PPUSTATUS=${:02X} OAMADDR=${:02X} latch=${:02X}",
            self.ctrl.to_byte(),
            self.mask.bits(),
            self.status.high_bits(),
            self.oam_addr,
            self.latch,
        );
        let _ = writeln!(
            out,
            "v=${:04X} buffer=${:02X} scroll=({}, {}) toggles: scroll={} addr={}",
            self.vram_addr,
            self.read_buffer,
            self.scroll_x,
            self.scroll_y,
            self.next_scroll,
            self.next_addr,
        );
        let _ = writeln!(
            out,
            "frame={} cycle={} (scanline {}, dot {}) next={:?}@{}",
            self.frame, self.cycle, scanline, dot, self.next_action, self.next_action_cycle,
        );
        out.push_str("OAM:");
        for (i, chunk) in self.oam.chunks(16).enumerate() {
            let _ = write!(out, "\n  {:02X}:", i * 16);
            for byte in chunk {
                let _ = write!(out, " {:02X}", byte);
            }
        }
        out
    }

    /// Operator-facing report for `err`: fatal or unsupported, the message, then the state
    /// from [`Self::dump_state`].
    pub fn diagnostic(&self, err: &PpuError) -> String {
        let class = if err.is_fatal() { "fatal" } else { "unsupported" };
        format!("{}: {}\n{}", class, err, self.dump_state())
    }

    /// Log a fatal condition together with the state that produced it.
    pub(crate) fn fatal(&self, err: PpuError) -> PpuError {
        error!("{}", self.diagnostic(&err));
        err
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new(PpuConfig::default())
    }
}
