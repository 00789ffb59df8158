//! Elaris PPU: a cycle-timed NES 2C02 picture processing unit.
//!
//! Implements the PPU as documented on the
//! [NESdev Wiki](https://www.nesdev.org/wiki/PPU) with a catch-up clock: the CPU reports elapsed
//! cycles and the PPU jumps between scheduled events (vblank start/end, draw, sprite 0 hit)
//! instead of stepping every dot.
//!
//! ## Modules (NESdev references)
//!
//! - **ppu** – [PPU registers](https://www.nesdev.org/wiki/PPU_registers), OAM, palette RAM,
//!   pattern-table cache, per-frame render pipeline, sprite 0 hit prediction, event scheduler
//! - **bus** – [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map): RAM, PPU registers,
//!   OAM DMA, cartridge; 3 PPU cycles per CPU cycle
//! - **cartridge** – [iNES](https://www.nesdev.org/wiki/INES) loading; [Mapper](https://www.nesdev.org/wiki/Mapper) NROM (0), MMC1 (1)
//! - **screen** – composites finished frames into a 256×240 RGB framebuffer
//! - **error** – fatal and unsupported-configuration errors

pub mod bus;
pub mod cartridge;
pub mod error;
pub mod ppu;
pub mod screen;

pub use error::{CartridgeError, PpuError, Unsupported};
