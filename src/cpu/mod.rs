//! 6502 CPU emulation for the NES.
//!
//! Official instruction set plus the stable undocumented opcodes, table-driven decode, NMI/IRQ
//! service through an [`InterruptLine`](cpu::InterruptLine) shared with the PPU.

pub mod cpu;
pub mod flags;
pub mod opcodes;
