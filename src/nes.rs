//! Console driver: wires cartridge, bus, CPU and PPU together and clocks them.
//!
//! The CPU runs one instruction at a time and the PPU is stepped three dots per CPU cycle
//! afterwards. Finished frames are handed to a [`Frontend`] at roughly the NTSC frame rate.

use std::thread;
use std::time::{Duration, Instant};

use crate::bus::NesBus;
use crate::cartridge::cartridge::Cartridge;
use crate::controller::Controller;
use crate::cpu::cpu::{CPU, InterruptLine};
use crate::error::NesError;

/// NTSC frame rate.
pub const FRAMES_PER_SECOND: f64 = 60.0988;
/// PPU dots per CPU cycle.
pub const DOTS_PER_CPU_CYCLE: u32 = 3;

/// Presentation and input side of the emulator (a window, a test harness, ...).
pub trait Frontend {
    /// Show a finished 256×240 frame of 0xRRGGBB pixels.
    fn present(&mut self, pixels: &[u32]);

    /// Copy current button state into the controller before the next frame.
    fn poll_input(&mut self, _controller: &mut Controller) {}

    fn quit_requested(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NesConfig {
    /// Emulation speed multiplier; 0 or less runs unthrottled.
    pub speed: f64,
}

impl Default for NesConfig {
    fn default() -> Self {
        Self { speed: 1.0 }
    }
}

impl NesConfig {
    /// Wall-clock time one frame should take, or `None` when unthrottled (including speeds too
    /// small for the frame time to fit in a `Duration`).
    pub fn frame_duration(&self) -> Option<Duration> {
        if self.speed > 0.0 {
            Duration::try_from_secs_f64(1.0 / (FRAMES_PER_SECOND * self.speed)).ok()
        } else {
            None
        }
    }
}

/// The console. Holds no CPU until a game is loaded.
pub struct Nes {
    config: NesConfig,
    cpu: Option<CPU<NesBus>>,
}

impl Nes {
    pub fn new(config: NesConfig) -> Self {
        Self { config, cpu: None }
    }

    /// Parse an iNES image, build the console around it and reset.
    pub fn load_game(&mut self, rom: &[u8]) -> Result<(), NesError> {
        let cart = Cartridge::from_bytes(rom)?;
        let interrupt = InterruptLine::new();
        let bus = NesBus::new(cart, interrupt.clone());
        self.cpu = Some(CPU::new(bus, interrupt));
        self.reset()
    }

    /// Like [`Nes::load_game`], then restore battery-backed PRG RAM from `save`.
    pub fn load_game_with_save(&mut self, rom: &[u8], save: &[u8]) -> Result<(), NesError> {
        self.load_game(rom)?;
        let cpu = self.cpu_mut()?;
        if cpu.bus.cart.has_battery() {
            cpu.bus.cart.load_save_ram(save);
            log::info!("restored {} bytes of save RAM", save.len());
        } else {
            log::warn!("cartridge has no battery, ignoring save data");
        }
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.cpu.is_some()
    }

    /// CPU reset from the reset vector and PPU back to its power-up state.
    pub fn reset(&mut self) -> Result<(), NesError> {
        let cpu = self.cpu_mut()?;
        cpu.bus.ppu.reset();
        cpu.reset()?;
        Ok(())
    }

    /// One CPU instruction (or interrupt entry), then the matching PPU dots. Returns CPU cycles.
    pub fn step(&mut self) -> Result<u8, NesError> {
        let cpu = self.cpu_mut()?;
        let cycles = cpu.tick()?;
        cpu.bus.tick_ppu(cycles as u32 * DOTS_PER_CPU_CYCLE);
        Ok(cycles)
    }

    /// Run until the PPU finishes the current frame.
    pub fn step_frame(&mut self) -> Result<(), NesError> {
        let start = self.cpu()?.bus.ppu.frame_count();
        while self.cpu()?.bus.ppu.frame_count() == start {
            self.step()?;
        }
        Ok(())
    }

    /// Emulate until the front-end asks to quit or the CPU stops, presenting each frame.
    pub fn run(&mut self, frontend: &mut impl Frontend) -> Result<(), NesError> {
        let frame_duration = self.config.frame_duration();
        log::info!("running at {:.2}x speed", self.config.speed);

        while !frontend.quit_requested() {
            let frame_start = Instant::now();

            frontend.poll_input(&mut self.cpu_mut()?.bus.controller);
            self.step_frame()?;
            frontend.present(self.cpu()?.bus.ppu.pixels());

            if let Some(target) = frame_duration {
                let elapsed = frame_start.elapsed();
                if elapsed < target {
                    thread::sleep(target - elapsed);
                }
            }
        }
        Ok(())
    }

    /// Last completed frame.
    pub fn pixels(&self) -> Option<&[u32]> {
        self.cpu.as_ref().map(|cpu| cpu.bus.ppu.pixels())
    }

    pub fn controller_mut(&mut self) -> Option<&mut Controller> {
        self.cpu.as_mut().map(|cpu| &mut cpu.bus.controller)
    }

    /// PRG RAM contents for battery-backed cartridges.
    pub fn save_ram(&self) -> Option<Vec<u8>> {
        let cart = &self.cpu.as_ref()?.bus.cart;
        cart.has_battery().then(|| cart.save_ram())
    }

    pub fn cpu(&self) -> Result<&CPU<NesBus>, NesError> {
        self.cpu.as_ref().ok_or(NesError::NoGameLoaded)
    }

    pub fn cpu_mut(&mut self) -> Result<&mut CPU<NesBus>, NesError> {
        self.cpu.as_mut().ok_or(NesError::NoGameLoaded)
    }
}

impl Default for Nes {
    fn default() -> Self {
        Self::new(NesConfig::default())
    }
}
