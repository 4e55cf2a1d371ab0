//! NES emulator entry point.
//!
//! Loads a cartridge and runs it in a minifb window.
//! Usage: nemus [--scale N] [--speed X] [--save FILE] path/to/game.nes

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ansi_term::Colour::Red;
use clap::Parser;
use minifb::{Key, Window, WindowOptions};
use thiserror::Error;

use nemus::controller::{Button, Controller};
use nemus::ppu::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};
use nemus::{Frontend, Nes, NesConfig};

/// NES emulator
#[derive(Parser, Debug)]
#[command(name = "nemus", version, about = "A NES emulator", long_about = None)]
struct Args {
    /// Path to the iNES ROM file
    rom: PathBuf,

    /// Screen scale factor (1-4)
    #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=4))]
    scale: u8,

    /// Emulation speed multiplier (0 = unthrottled)
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Battery save file; defaults to the ROM path with a .sav extension
    #[arg(long)]
    save: Option<PathBuf>,
}

#[derive(Error, Debug)]
enum RomFileError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

const KEY_MAP: [(Key, Button); 8] = [
    (Key::Z, Button::A),
    (Key::X, Button::B),
    (Key::RightShift, Button::Select),
    (Key::Enter, Button::Start),
    (Key::Up, Button::Up),
    (Key::Down, Button::Down),
    (Key::Left, Button::Left),
    (Key::Right, Button::Right),
];

struct WindowFrontend {
    window: Window,
    closed: bool,
}

impl Frontend for WindowFrontend {
    fn present(&mut self, pixels: &[u32]) {
        if let Err(err) = self
            .window
            .update_with_buffer(pixels, SCREEN_WIDTH, SCREEN_HEIGHT)
        {
            log::error!("failed to update window: {err}");
            self.closed = true;
        }
    }

    fn poll_input(&mut self, controller: &mut Controller) {
        for (key, button) in KEY_MAP {
            controller.set_button(button, self.window.is_key_down(key));
        }
    }

    fn quit_requested(&self) -> bool {
        self.closed || !self.window.is_open() || self.window.is_key_down(Key::Escape)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, RomFileError> {
    fs::read(path).map_err(|source| RomFileError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn run(args: Args) -> anyhow::Result<()> {
    let rom = read_file(&args.rom)?;
    let save_path = args
        .save
        .clone()
        .unwrap_or_else(|| args.rom.with_extension("sav"));

    let mut nes = Nes::new(NesConfig { speed: args.speed });
    if save_path.exists() {
        let save = read_file(&save_path)?;
        nes.load_game_with_save(&rom, &save)?;
    } else {
        nes.load_game(&rom)?;
    }

    let title = args
        .rom
        .file_stem()
        .map(|stem| format!("nemus - {}", stem.to_string_lossy()))
        .unwrap_or_else(|| "nemus".to_string());
    let scale = args.scale as usize;
    let window = Window::new(
        &title,
        SCREEN_WIDTH * scale,
        SCREEN_HEIGHT * scale,
        WindowOptions {
            resize: false,
            ..WindowOptions::default()
        },
    )?;
    let mut frontend = WindowFrontend {
        window,
        closed: false,
    };

    let result = nes.run(&mut frontend);

    // Keep whatever progress was made even if the CPU stopped
    if let Some(ram) = nes.save_ram() {
        fs::write(&save_path, ram).map_err(|source| RomFileError::Write {
            path: save_path.clone(),
            source,
        })?;
        log::info!("wrote save RAM to {}", save_path.display());
    }

    result?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", Red.bold().paint("error:"));
            ExitCode::FAILURE
        }
    }
}
