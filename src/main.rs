//! Pattern table viewer.
//!
//! Loads a cartridge, lays its background pattern table out as a 16×16 grid of tiles through
//! the PPU's own register interface, and runs the PPU clock in CPU-instruction-sized steps with a
//! display window. No CPU program runs; the host plays the part of a minimal NMI handler.
//!
//! Usage: elaris-ppu <path/to/game.nes> [--ppu-debug] [--frames N]
//!
//! `--ppu-debug` logs scheduler events and every register access (enable the output with
//! `RUST_LOG=debug` or `RUST_LOG=trace`). `--frames N` runs N frames headless and exits.

use std::env;
use std::error::Error;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use ansi_term::Colour::{Green, Red};
use log::info;
use minifb::{Key, Window, WindowOptions};

use elaris_ppu::PpuError;
use elaris_ppu::bus::{Bus, NesBus};
use elaris_ppu::cartridge::cartridge::Cartridge;
use elaris_ppu::ppu::{PpuConfig, Verbosity};
use elaris_ppu::screen::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// NES runs at ~60.0988 Hz (NTSC). Target one frame per 16.67 ms for ~60 fps.
const FRAME_DURATION: Duration = Duration::from_nanos(16_666_667);

/// Typical 6502 instruction length in cycles; the PPU is caught up this often.
const CPU_STEP: usize = 7;

/// Grayscale background palettes, then colored sprite palettes.
const PALETTE: [u8; 32] = [
    0x0F, 0x00, 0x10, 0x30, 0x0F, 0x06, 0x16, 0x26, 0x0F, 0x09, 0x19, 0x29, 0x0F, 0x01, 0x11,
    0x21, 0x0F, 0x16, 0x27, 0x30, 0x0F, 0x1A, 0x2A, 0x30, 0x0F, 0x12, 0x22, 0x30, 0x0F, 0x14,
    0x24, 0x30,
];

struct Options {
    path: String,
    verbosity: Verbosity,
    frames: Option<u64>,
}

fn parse_args() -> Result<Options, String> {
    let mut args = env::args().skip(1);
    let mut path = None;
    let mut verbosity = Verbosity::Quiet;
    let mut frames = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--ppu-debug" => verbosity = Verbosity::Registers,
            "--frames" => {
                let n = args.next().ok_or("--frames needs a count")?;
                frames = Some(n.parse().map_err(|_| format!("bad frame count: {}", n))?);
            }
            _ if path.is_none() => path = Some(arg),
            _ => return Err(format!("unexpected argument: {}", arg)),
        }
    }

    Ok(Options {
        path: path.ok_or("usage: elaris-ppu <rom.nes> [--ppu-debug] [--frames N]")?,
        verbosity,
        frames,
    })
}

/// Select vertical mirroring and 4 KiB CHR banks on MMC1 boards, which power up in
/// one-screen mode. Harmless on NROM, where $8000 is ROM.
fn init_mapper(bus: &mut NesBus) -> Result<(), PpuError> {
    bus.write(0x8000, 0x80)?;
    let control = 0b1_1110u8;
    for bit in 0..5 {
        bus.write(0x8000, (control >> bit) & 1)?;
    }
    Ok(())
}

/// Fill the PPU through $2000-$2007 and $4014 the way a game's init code would.
fn setup(bus: &mut NesBus) -> Result<(), PpuError> {
    init_mapper(bus)?;
    // rendering off while VRAM is written
    bus.write(0x2001, 0x00)?;
    bus.read(0x2002)?;

    bus.write(0x2006, 0x3F)?;
    bus.write(0x2006, 0x00)?;
    for color in PALETTE {
        bus.write(0x2007, color)?;
    }

    // Tiles 0-255 in a 16×16 block at column 8, row 7 of the first nametable
    bus.write(0x2006, 0x20)?;
    bus.write(0x2006, 0x00)?;
    for row in 0..30u16 {
        for column in 0..32u16 {
            let inside = (8..24).contains(&column) && (7..23).contains(&row);
            let tile = if inside {
                ((row - 7) * 16 + (column - 8)) as u8
            } else {
                0
            };
            bus.write(0x2007, tile)?;
        }
    }
    // Checkerboard of the four background palettes in 32×32 pixel blocks
    for i in 0..64u16 {
        let (column, row) = (i % 8, i / 8);
        let palette = (column % 2 + row % 2 * 2) as u8;
        bus.write(0x2007, palette * 0b0101_0101)?;
    }

    // A sprite marker above the grid's top-left corner; the rest parked off screen
    for i in 0..256u16 {
        let byte = match i {
            0 => 46,
            1 => 0,
            2 => 0,
            3 => 64,
            _ if i % 4 == 0 => 0xFF,
            _ => 0,
        };
        bus.write(0x0200 + i, byte)?;
    }
    bus.write(0x2003, 0x00)?;
    bus.write(0x4014, 0x02)?;

    bus.write(0x2005, 0x00)?;
    bus.write(0x2005, 0x00)?;
    bus.write(0x2001, 0x1E)?;
    bus.write(0x2000, 0x80)
}

/// Minimal NMI handler: acknowledge vblank and restore the scroll.
fn vblank(bus: &mut NesBus) -> Result<(), PpuError> {
    bus.read(0x2002)?;
    bus.write(0x2005, 0x00)?;
    bus.write(0x2005, 0x00)
}

/// Run CPU time until the PPU presents the next frame.
fn run_frame(bus: &mut NesBus) -> Result<(), PpuError> {
    while !bus.frame_ready() {
        bus.tick(CPU_STEP)?;
        if bus.poll_nmi() {
            vblank(bus)?;
        }
    }
    Ok(())
}

fn run_headless(bus: &mut NesBus, frames: u64) -> Result<(), PpuError> {
    for _ in 0..frames {
        run_frame(bus)?;
        bus.clear_frame_ready();
    }
    let status = bus.read(0x2002)?;
    println!(
        "{} {} frames, PPUSTATUS=${:02X}, sprite 0 hit {}",
        Green.bold().paint("done"),
        bus.ppu.frame,
        status,
        if status & 0x40 != 0 { "set" } else { "clear" },
    );
    Ok(())
}

fn run_window(bus: &mut NesBus) -> Result<(), Box<dyn Error>> {
    let mut window = Window::new(
        "Elaris PPU",
        SCREEN_WIDTH,
        SCREEN_HEIGHT,
        WindowOptions {
            resize: true,
            scale: minifb::Scale::X2,
            scale_mode: minifb::ScaleMode::AspectRatioStretch,
            ..WindowOptions::default()
        },
    )?;
    window.set_target_fps(60);

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let frame_start = Instant::now();

        run_frame(bus)?;
        if bus.frame_ready() {
            window.update_with_buffer(&bus.screen.framebuffer, SCREEN_WIDTH, SCREEN_HEIGHT)?;
            bus.clear_frame_ready();
        } else {
            window.update();
        }

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }
    Ok(())
}

fn report(bus: &NesBus, err: &(dyn Error + 'static)) {
    match err.downcast_ref::<PpuError>() {
        Some(ppu_err) => eprintln!(
            "{} {}",
            Red.bold().paint("ERROR"),
            bus.ppu.diagnostic(ppu_err)
        ),
        None => eprintln!("{} {}", Red.bold().paint("ERROR"), err),
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let options = match parse_args() {
        Ok(options) => options,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::FAILURE;
        }
    };

    let cart = match Cartridge::load(&options.path) {
        Ok(cart) => cart,
        Err(err) => {
            eprintln!("{} {}: {}", Red.bold().paint("ERROR"), options.path, err);
            return ExitCode::FAILURE;
        }
    };
    let config = PpuConfig {
        verbosity: options.verbosity,
    };
    let mut bus = NesBus::with_config(cart, config);
    info!("loaded {}", options.path);

    let result: Result<(), Box<dyn Error>> = setup(&mut bus).map_err(Into::into).and_then(|()| {
        match options.frames {
            Some(frames) => run_headless(&mut bus, frames).map_err(Into::into),
            None => run_window(&mut bus),
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&bus, err.as_ref());
            ExitCode::FAILURE
        }
    }
}
