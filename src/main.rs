//! Headless runner: load a ROM, run some frames, report what happened.

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use log::{error, info};

use nescycle::{EmuError, Nes};

/// Run an iNES ROM without a display or audio device.
#[derive(Parser, Debug)]
#[command(name = "nescycle")]
#[command(about = "Cycle-level NES emulator core, headless runner", long_about = None)]
struct Args {
    /// Path to the iNES ROM file
    rom: PathBuf,

    /// Number of frames to run
    #[arg(short, long, default_value = "60")]
    frames: u64,

    /// Write a save state here after the last frame
    #[arg(short, long)]
    save_state: Option<PathBuf>,

    /// Write the last frame as a PNG (needs the `screenshot` feature)
    #[arg(long)]
    screenshot: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), EmuError> {
    let mut nes = Nes::from_ines_file(&args.rom)?;

    let samples = Rc::new(Cell::new(0u64));
    let counter = samples.clone();
    nes.set_sample_callback(move |_| counter.set(counter.get() + 1));

    let mut cycles = 0u64;
    for _ in 0..args.frames {
        cycles += nes.run_frame()?;
    }
    info!(
        "ran {} frames, {} cpu cycles, {} audio samples",
        nes.bus().ppu().frame(),
        cycles,
        samples.get()
    );

    if let Some(path) = &args.save_state {
        nes.save_state().save_to_file(path)?;
    }
    if let Some(path) = &args.screenshot {
        write_screenshot(&nes, path)?;
    }
    Ok(())
}

#[cfg(feature = "screenshot")]
fn write_screenshot(nes: &Nes, path: &std::path::Path) -> Result<(), EmuError> {
    use nescycle::ppu::{NES_HEIGHT, NES_WIDTH};

    let rgba: Vec<u8> = nes
        .frame_buffer()
        .iter()
        .flat_map(|px| px.to_le_bytes())
        .collect();
    let image = image::RgbaImage::from_raw(NES_WIDTH as u32, NES_HEIGHT as u32, rgba)
        .ok_or_else(|| std::io::Error::other("frame buffer has the wrong size"))?;
    image.save(path).map_err(std::io::Error::other)?;
    info!("screenshot written to {}", path.display());
    Ok(())
}

#[cfg(not(feature = "screenshot"))]
fn write_screenshot(_nes: &Nes, path: &std::path::Path) -> Result<(), EmuError> {
    log::warn!(
        "not writing {}: built without the `screenshot` feature",
        path.display()
    );
    Ok(())
}
