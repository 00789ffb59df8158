//! Error taxonomy for the PPU core and cartridge loading.
//!
//! Fatal conditions abort the emulated session; unsupported configurations are reported
//! instead of being rendered wrongly. Accesses that real hardware ignores (reading a
//! write-only register, writing PPUSTATUS) are not errors at all.

use thiserror::Error;

use crate::cartridge::mapper::Mirroring;
use crate::ppu::scheduler::Action;

/// Features the core declines to emulate.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Unsupported {
    #[error("8x16 sprite mode (PPUCTRL bit 5)")]
    TallSprites,
    #[error("{0:?} nametable mirroring")]
    Mirroring(Mirroring),
}

/// Errors raised by the PPU while servicing the register bus or the clock.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PpuError {
    /// PPUCTRL bit 6 would drive the EXT pins against ground on an unmodified console.
    #[error("PPUCTRL master/slave select set (wrote ${value:02X})")]
    MasterSlaveSelect { value: u8 },
    #[error("register index {0} outside $2000-$2007")]
    BadRegister(u8),
    #[error("{action:?} scheduled at cycle {scheduled}, which does not advance past cycle {cycle}")]
    SchedulerStalled {
        action: Action,
        scheduled: u32,
        cycle: u32,
    },
    #[error("unsupported configuration: {0}")]
    Unsupported(#[from] Unsupported),
}

impl PpuError {
    /// True for conditions that indicate a core bug or hardware damage rather than a
    /// feature gap.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PpuError::Unsupported(_))
    }
}

/// Errors raised while parsing an iNES image.
#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("failed to read ROM: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing iNES magic \"NES\\x1A\"")]
    BadMagic,
    #[error("ROM truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("ROM images with a 512-byte trainer are not supported")]
    Trainer,
    #[error("unsupported mapper {0}")]
    UnsupportedMapper(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_is_not_fatal() {
        assert!(!PpuError::from(Unsupported::TallSprites).is_fatal());
        assert!(PpuError::BadRegister(9).is_fatal());
        assert!(PpuError::MasterSlaveSelect { value: 0x40 }.is_fatal());
    }

    #[test]
    fn messages_name_the_feature() {
        let err = PpuError::from(Unsupported::Mirroring(Mirroring::OneScreenUpper));
        assert_eq!(
            err.to_string(),
            "unsupported configuration: OneScreenUpper nametable mirroring"
        );
    }
}
