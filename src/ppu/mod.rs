//! PPU (Picture Processing Unit) emulation for the NES.
//!
//! See [PPU](https://www.nesdev.org/wiki/PPU), [PPU registers](https://www.nesdev.org/wiki/PPU_registers),
//! [PPU memory map](https://www.nesdev.org/wiki/PPU_memory_map). 341-dot scanlines, 262 scanlines
//! per frame, driven by an event scheduler that catches up with the CPU in bulk. Background and
//! sprites are resolved once per frame; sprite 0 hits are predicted rather than polled.

pub mod palette;
pub mod ppu;
pub mod registers;
pub mod render;
pub mod scheduler;
pub mod sprite_zero;
pub mod tile_cache;


pub use ppu::{OAM_LEN, Ppu, PpuConfig, Verbosity};
pub use render::{BackgroundCell, BackgroundGrid, DecodedSprite, Frame, FrameSink};
pub use scheduler::{Action, CYCLES_PER_FRAME, CYCLES_PER_SCANLINE};
