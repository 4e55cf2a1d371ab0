//! Error types for every layer of the emulator.
//!
//! Faults never cross a `tick()` silently: the bus reports illegal accesses, the CPU turns an
//! unknown opcode into a halt, and cartridge parsing separates fatal problems from degraded
//! loads (see [`LoadWarning`](crate::cartridge::cartridge::LoadWarning)).

use thiserror::Error;

use crate::cpu::opcodes::{AddressMode, Mnemonic};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    #[error("illegal read at ${address:04X}")]
    IllegalRead { address: u16 },
    #[error("illegal write of ${data:02X} at ${address:04X}")]
    IllegalWrite { address: u16, data: u8 },
    #[error("addressing mode {mode:?} has no memory operand")]
    NoEffectiveAddress { mode: AddressMode },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuError {
    #[error("unimplemented opcode ${opcode:02X} ({mnemonic}) at ${pc:04X}")]
    UnimplementedOpcode {
        opcode: u8,
        mnemonic: Mnemonic,
        pc: u16,
    },
    #[error("CPU is halted")]
    Halted,
    #[error("bus fault: {source}")]
    Bus {
        #[from]
        source: BusError,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CartridgeError {
    #[error("image is {len} bytes, shorter than the 16-byte iNES header")]
    TooShort { len: usize },
    #[error("missing iNES magic number")]
    BadMagic,
}

#[derive(Error, Debug)]
pub enum NesError {
    #[error("no game loaded")]
    NoGameLoaded,
    #[error("error loading cartridge: {source}")]
    Cartridge {
        #[from]
        source: CartridgeError,
    },
    #[error("error executing CPU instruction: {source}")]
    Cpu {
        #[from]
        source: CpuError,
    },
    #[error("bus fault: {source}")]
    Bus {
        #[from]
        source: BusError,
    },
}
