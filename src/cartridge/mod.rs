//! NES cartridge loading and mapper support.
//!
//! - **cartridge**: Loads iNES (.nes) files, holds the mapper and the console's nametable RAM.
//! - **mapper**: NROM (0), MMC1 (1); PRG/CHR bank switching and nametable mirroring.

pub mod cartridge;
pub mod mapper;
