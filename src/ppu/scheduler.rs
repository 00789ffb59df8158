//! Event-driven PPU clock.
//!
//! Instead of stepping every dot, the PPU lags behind the CPU and catches up in bulk: the host
//! reports elapsed PPU cycles, and the clock jumps straight to the next scheduled event,
//! fires it, and carries the remainder forward. Exactly one event is outstanding at a time and
//! each event schedules its successor. See [PPU frame timing](https://www.nesdev.org/wiki/PPU_frame_timing).
//!
//! Events, in frame order:
//!
//! | event          | cycle                         | effect                                        |
//! |----------------|-------------------------------|-----------------------------------------------|
//! | draw           | 0 (end of previous frame)     | present frame, predict sprite 0 hit           |
//! | sprite 0 hit   | `y * 341 + x + 2` (optional)  | set PPUSTATUS bit 6                           |
//! | vblank start   | scanline 241, dot 1           | set vblank, raise NMI if enabled              |
//! | vblank end     | scanline 261, dot 1           | clear flags, rebuild background and sprites   |

use log::debug;

use crate::bus::PpuBus;
use crate::error::PpuError;
use crate::ppu::ppu::{Ppu, Verbosity};
use crate::ppu::render::FrameSink;

pub const CYCLES_PER_SCANLINE: u32 = 341;
pub const SCANLINES_PER_FRAME: u32 = 262;
pub const CYCLES_PER_FRAME: u32 = CYCLES_PER_SCANLINE * SCANLINES_PER_FRAME;
pub const VISIBLE_SCANLINES: u32 = 240;
pub const VISIBLE_COLUMNS: u32 = 256;

pub const VBLANK_START_CYCLE: u32 = 241 * CYCLES_PER_SCANLINE + 1;
pub const VBLANK_END_CYCLE: u32 = 261 * CYCLES_PER_SCANLINE + 1;
/// Fires as cycle 0 of the following frame.
pub const DRAW_CYCLE: u32 = CYCLES_PER_FRAME;
/// Pipeline latency between fetching a pixel and flagging a sprite 0 hit on it.
pub const SPRITE0_CYCLE_OFFSET: u32 = 2;

/// Scheduled PPU events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    VblankStart,
    VblankEnd,
    Draw,
    SpriteZeroHit,
}

impl Ppu {
    /// Catch up by `cycles` PPU cycles, firing every event that falls due. Splitting the same
    /// total across several calls produces the same state.
    pub fn advance<B, S>(&mut self, cycles: u64, bus: &mut B, sink: &mut S) -> Result<(), PpuError>
    where
        B: PpuBus + ?Sized,
        S: FrameSink + ?Sized,
    {
        let mut remaining = cycles;
        loop {
            let target = self.cycle as u64 + remaining;
            if target < self.next_action_cycle as u64 {
                // next_action_cycle <= CYCLES_PER_FRAME, so no wrap here
                self.cycle = target as u32;
                return Ok(());
            }

            remaining = target - self.next_action_cycle as u64;
            self.cycle = self.next_action_cycle % CYCLES_PER_FRAME;
            let action = self.next_action;
            self.fire(action, bus, sink)?;

            if self.next_action_cycle <= self.cycle {
                return Err(self.fatal(PpuError::SchedulerStalled {
                    action: self.next_action,
                    scheduled: self.next_action_cycle,
                    cycle: self.cycle,
                }));
            }
        }
    }

    fn schedule(&mut self, cycle: u32, action: Action) {
        self.next_action_cycle = cycle;
        self.next_action = action;
    }

    fn fire<B, S>(&mut self, action: Action, bus: &mut B, sink: &mut S) -> Result<(), PpuError>
    where
        B: PpuBus + ?Sized,
        S: FrameSink + ?Sized,
    {
        if self.config.verbosity >= Verbosity::Events {
            debug!("frame {} cycle {}: {:?}", self.frame, self.cycle, action);
        }
        match action {
            Action::VblankStart => {
                self.status.vblank = true;
                if self.ctrl.nmi_enable {
                    self.nmi = true;
                }
                self.schedule(VBLANK_END_CYCLE, Action::VblankEnd);
            }
            Action::VblankEnd => {
                self.status.vblank = false;
                self.status.sprite_zero_hit = false;
                self.status.sprite_overflow = false;
                self.rebuild_background(bus)?;
                self.decode_sprites(bus)?;
                self.schedule(DRAW_CYCLE, Action::Draw);
            }
            Action::Draw => {
                self.frame += 1;
                if self.background_dirty {
                    self.rebuild_background(bus)?;
                }
                if self.sprites_dirty {
                    self.decode_sprites(bus)?;
                }
                if self.sprite_overflow_pending {
                    self.status.sprite_overflow = true;
                }
                self.present(sink);
                match self.predict_sprite_zero_hit(bus)? {
                    Some(cycle) => self.schedule(cycle, Action::SpriteZeroHit),
                    None => self.schedule(VBLANK_START_CYCLE, Action::VblankStart),
                }
            }
            Action::SpriteZeroHit => {
                self.status.sprite_zero_hit = true;
                self.schedule(VBLANK_START_CYCLE, Action::VblankStart);
            }
        }
        Ok(())
    }
}
