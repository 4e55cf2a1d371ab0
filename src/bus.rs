//! Memory bus and address decoding for the NES.
//!
//! Maps CPU addresses to RAM, PPU registers, cartridge, and controllers, and maps PPU addresses
//! to pattern tables, nametables and palette RAM.

use crate::cartridge::cartridge::Cartridge;
use crate::controller::Controller;
use crate::cpu::cpu::{InterruptLine, Registers};
use crate::cpu::opcodes::AddressMode;
use crate::error::BusError;
use crate::ppu::ppu::PPU;

/// Base of the hardware stack page.
pub const STACK_BASE: u16 = 0x0100;

/// Trait for memory-mapped I/O and bus access used by the CPU.
///
/// Only byte access is required; word reads, stack operations and operand address resolution
/// are provided on top of it.
pub trait Bus {
    fn read_byte(&mut self, addr: u16) -> Result<u8, BusError>;
    fn write_byte(&mut self, addr: u16, data: u8) -> Result<(), BusError>;

    /// Little-endian word.
    fn read_word(&mut self, addr: u16) -> Result<u16, BusError> {
        let lo = self.read_byte(addr)? as u16;
        let hi = self.read_byte(addr.wrapping_add(1))? as u16;
        Ok((hi << 8) | lo)
    }

    /// Word read with the 6502 page-wrap bug: the high byte comes from the start of the same
    /// page when `addr` is at $xxFF.
    fn read_word_bug(&mut self, addr: u16) -> Result<u16, BusError> {
        let lo = self.read_byte(addr)? as u16;
        let hi_addr = (addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF);
        let hi = self.read_byte(hi_addr)? as u16;
        Ok((hi << 8) | lo)
    }

    /// Push onto $0100 + SP, then decrement SP (wrapping).
    fn push(&mut self, data: u8, sp: &mut u8) -> Result<(), BusError> {
        self.write_byte(STACK_BASE | *sp as u16, data)?;
        *sp = sp.wrapping_sub(1);
        Ok(())
    }

    /// Increment SP (wrapping), then read $0100 + SP.
    fn pop(&mut self, sp: &mut u8) -> Result<u8, BusError> {
        *sp = sp.wrapping_add(1);
        self.read_byte(STACK_BASE | *sp as u16)
    }

    /// High byte first, so the word sits little-endian in memory.
    fn push16(&mut self, data: u16, sp: &mut u8) -> Result<(), BusError> {
        self.push((data >> 8) as u8, sp)?;
        self.push(data as u8, sp)
    }

    fn pop16(&mut self, sp: &mut u8) -> Result<u16, BusError> {
        let lo = self.pop(sp)? as u16;
        let hi = self.pop(sp)? as u16;
        Ok((hi << 8) | lo)
    }

    /// Effective address of the operand of the instruction whose opcode is at `regs.pc`.
    fn get_address(&mut self, regs: &Registers, mode: AddressMode) -> Result<u16, BusError> {
        let operand = regs.pc.wrapping_add(1);
        match mode {
            AddressMode::Immediate | AddressMode::Relative => Ok(operand),
            AddressMode::ZeroPage => Ok(self.read_byte(operand)? as u16),
            AddressMode::ZeroPageX => Ok(self.read_byte(operand)?.wrapping_add(regs.x) as u16),
            AddressMode::ZeroPageY => Ok(self.read_byte(operand)?.wrapping_add(regs.y) as u16),
            AddressMode::Absolute => self.read_word(operand),
            AddressMode::AbsoluteX => Ok(self.read_word(operand)?.wrapping_add(regs.x as u16)),
            AddressMode::AbsoluteY => Ok(self.read_word(operand)?.wrapping_add(regs.y as u16)),
            AddressMode::Indirect => {
                let pointer = self.read_word(operand)?;
                self.read_word_bug(pointer)
            }
            AddressMode::IndirectX => {
                let pointer = self.read_byte(operand)?.wrapping_add(regs.x);
                self.read_word_bug(pointer as u16)
            }
            AddressMode::IndirectY => {
                let pointer = self.read_byte(operand)?;
                Ok(self.read_word_bug(pointer as u16)?.wrapping_add(regs.y as u16))
            }
            AddressMode::Implied | AddressMode::Accumulator => {
                Err(BusError::NoEffectiveAddress { mode })
            }
        }
    }

    /// Whether indexing crosses a page for the indexed modes that pay a penalty cycle.
    fn check_page_cross(&mut self, regs: &Registers, mode: AddressMode) -> Result<bool, BusError> {
        let operand = regs.pc.wrapping_add(1);
        let (base, index) = match mode {
            AddressMode::AbsoluteX => (self.read_word(operand)?, regs.x),
            AddressMode::AbsoluteY => (self.read_word(operand)?, regs.y),
            AddressMode::IndirectY => {
                let pointer = self.read_byte(operand)?;
                (self.read_word_bug(pointer as u16)?, regs.y)
            }
            _ => return Ok(false),
        };
        Ok(base & 0xFF00 != base.wrapping_add(index as u16) & 0xFF00)
    }
}

/// PPU side of the bus: $0000–$3FFF (mirrored above).
pub trait PpuBus {
    fn read_ppu_byte(&self, addr: u16) -> u8;
    fn write_ppu_byte(&mut self, addr: u16, data: u8);
}

/// Console-side video memory: two physical nametables and 32 bytes of palette RAM.
#[derive(Clone)]
pub struct Vram {
    nametables: [[u8; 0x400]; 2],
    palette: [u8; 32],
}

impl Default for Vram {
    fn default() -> Self {
        Self {
            nametables: [[0; 0x400]; 2],
            palette: [0; 32],
        }
    }
}

impl Vram {
    /// $3F10/$3F14/$3F18/$3F1C alias the background entries below them.
    fn palette_index(addr: u16) -> usize {
        let index = (addr & 0x1F) as usize;
        if index >= 0x10 && index % 4 == 0 {
            index - 0x10
        } else {
            index
        }
    }

    fn read(&self, cart: &Cartridge, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => cart.read_ppu_byte(addr),
            0x2000..=0x3EFF => {
                let table = cart.mirroring_table((addr & 0x0FFF) | 0x2000);
                self.nametables[table][(addr & 0x3FF) as usize]
            }
            _ => self.palette[Self::palette_index(addr)],
        }
    }

    fn write(&mut self, cart: &mut Cartridge, addr: u16, data: u8) {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => cart.write_ppu_byte(addr, data),
            0x2000..=0x3EFF => {
                let table = cart.mirroring_table((addr & 0x0FFF) | 0x2000);
                self.nametables[table][(addr & 0x3FF) as usize] = data;
            }
            // Palette entries are 6 bits wide
            _ => self.palette[Self::palette_index(addr)] = data & 0x3F,
        }
    }
}

/// Borrowed view handed to the PPU for the duration of one tick or register access.
struct PpuMemory<'a> {
    cart: &'a mut Cartridge,
    vram: &'a mut Vram,
}

impl PpuBus for PpuMemory<'_> {
    fn read_ppu_byte(&self, addr: u16) -> u8 {
        self.vram.read(&*self.cart, addr)
    }

    fn write_ppu_byte(&mut self, addr: u16, data: u8) {
        self.vram.write(self.cart, addr, data);
    }
}

/// Main NES bus: RAM, PPU, cartridge, video memory and controller.
pub struct NesBus {
    pub ram: [u8; 0x800],
    pub cart: Cartridge,
    pub ppu: PPU,
    pub controller: Controller,
    vram: Vram,
}

impl NesBus {
    /// Create a new bus with the given cartridge. The PPU raises NMI on `interrupt`.
    pub fn new(cart: Cartridge, interrupt: InterruptLine) -> Self {
        Self {
            ram: [0; 0x800],
            cart,
            ppu: PPU::new(interrupt),
            controller: Controller::new(),
            vram: Vram::default(),
        }
    }

    /// Read the PPU address space directly, without touching PPU registers.
    pub fn read_ppu_byte(&self, addr: u16) -> u8 {
        self.vram.read(&self.cart, addr)
    }

    pub fn write_ppu_byte(&mut self, addr: u16, data: u8) {
        self.vram.write(&mut self.cart, addr, data);
    }

    /// Advance the PPU by `dots` cycles (three per CPU cycle).
    pub fn tick_ppu(&mut self, dots: u32) {
        let mut memory = PpuMemory {
            cart: &mut self.cart,
            vram: &mut self.vram,
        };
        for _ in 0..dots {
            self.ppu.tick(&mut memory);
        }
    }

    /// OAM DMA: copy CPU page `page` into OAM starting at OAMADDR.
    fn oam_dma(&mut self, page: u8) -> Result<(), BusError> {
        let base = (page as u16) << 8;
        let mut data = [0u8; 256];
        for (offset, byte) in data.iter_mut().enumerate() {
            *byte = self.read_byte(base | offset as u16)?;
        }
        self.ppu.write_oam_dma(&data);
        Ok(())
    }
}

impl Bus for NesBus {
    fn read_byte(&mut self, addr: u16) -> Result<u8, BusError> {
        match addr {
            // Internal RAM (mirrored 4x in 0x0000-0x1FFF)
            0x0000..=0x1FFF => Ok(self.ram[(addr & 0x07FF) as usize]),
            // PPU registers $2000-$3FFF (mirrored every 8 bytes)
            0x2000..=0x3FFF => {
                let mut memory = PpuMemory {
                    cart: &mut self.cart,
                    vram: &mut self.vram,
                };
                Ok(self.ppu.read_register(0x2000 + addr % 8, &mut memory))
            }
            0x4014 => Ok(self.ppu.open_bus()),
            // APU status and controller 2 are not connected
            0x4015 | 0x4017 => Ok(0),
            0x4016 => Ok(self.controller.read()),
            0x6000..=0xFFFF => Ok(self.cart.read_byte(addr)),
            _ => {
                log::error!("illegal read at ${addr:04X}");
                Err(BusError::IllegalRead { address: addr })
            }
        }
    }

    fn write_byte(&mut self, addr: u16, data: u8) -> Result<(), BusError> {
        match addr {
            // Internal RAM
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = data,
            // PPU registers $2000-$3FFF (mirrored every 8 bytes)
            0x2000..=0x3FFF => {
                let mut memory = PpuMemory {
                    cart: &mut self.cart,
                    vram: &mut self.vram,
                };
                self.ppu.write_register(0x2000 + addr % 8, data, &mut memory);
            }
            0x4014 => self.oam_dma(data)?,
            0x4016 => self.controller.write(data),
            // APU and test registers: discarded
            0x4000..=0x401F => {}
            // Cartridge: PRG RAM and mapper registers (e.g. MMC1)
            0x6000..=0xFFFF => self.cart.write_byte(addr, data),
            _ => {
                log::error!("illegal write of ${data:02X} at ${addr:04X}");
                return Err(BusError::IllegalWrite { address: addr, data });
            }
        }
        Ok(())
    }
}
