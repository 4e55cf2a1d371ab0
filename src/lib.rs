//! Nemus: an NES (Nintendo Entertainment System) emulator core written in Rust.
//!
//! Implements the NES chipset as documented on the
//! [NESdev Wiki](https://www.nesdev.org/wiki/NES_reference_guide): the Ricoh 2A03 CPU core,
//! the 2C02 PPU, cartridge mappers, and controller I/O. Audio is not emulated.
//!
//! ## Modules (NESdev references)
//!
//! - **bus** – [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map): RAM, PPU, controller,
//!   cartridge; [PPU memory map](https://www.nesdev.org/wiki/PPU_memory_map): nametables, palette
//! - **cartridge** – [iNES](https://www.nesdev.org/wiki/INES) loading; [Mapper](https://www.nesdev.org/wiki/Mapper) NROM (0), MMC1 (1)
//! - **controller** – [Controller reading](https://www.nesdev.org/wiki/Controller_reading): $4016 strobe, serial read
//! - **cpu** – [6502](https://www.nesdev.org/wiki/CPU) / 2A03: table-driven, stable undocumented opcodes, [NMI](https://www.nesdev.org/wiki/NMI)
//! - **ppu** – [PPU](https://www.nesdev.org/wiki/PPU), [PPU registers](https://www.nesdev.org/wiki/PPU_registers), OAM, sprites, 256×240
//! - **nes** – the console driver: load, reset, step, frame pacing
//! - **error** – error types shared by the layers above

pub mod bus;
pub mod cartridge;
pub mod controller;
pub mod cpu;
pub mod error;
pub mod nes;
pub mod ppu;

pub use error::NesError;
pub use nes::{Frontend, Nes, NesConfig};
