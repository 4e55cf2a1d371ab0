//! Table-driven 2A03 (6502 without decimal mode) interpreter.
//!
//! One [`CPU::tick`] either services a pending interrupt or executes one instruction, and reports
//! the cycles it cost so the caller can clock the PPU.

use std::cell::Cell;
use std::rc::Rc;

use crate::{
    bus::Bus,
    cpu::{
        flags::{
            FLAG_BREAK, FLAG_CARRY, FLAG_DECIMAL, FLAG_INTERRUPT_DISABLE, FLAG_NEGATIVE, FLAG_OVERFLOW,
            FLAG_UNUSED, FLAG_ZERO, STATUS_POWER_UP,
        },
        opcodes::{AddressMode, Mnemonic, OPCODES, Opcode},
    },
    error::{BusError, CpuError},
};

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Interrupt kinds the CPU can be asked to service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Nmi,
    Irq,
    /// Accepted and dropped; resets go through [`CPU::reset`].
    Reset,
}

/// Pending-interrupt slot shared between the CPU and the devices that raise interrupts.
///
/// Cloning yields another handle to the same slot.
#[derive(Debug, Clone, Default)]
pub struct InterruptLine(Rc<Cell<Option<Interrupt>>>);

impl InterruptLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch an interrupt. A pending NMI is not displaced by anything else.
    pub fn raise(&self, interrupt: Interrupt) {
        if self.0.get() != Some(Interrupt::Nmi) {
            self.0.set(Some(interrupt));
        }
    }

    pub fn pending(&self) -> Option<Interrupt> {
        self.0.get()
    }

    pub fn clear(&self) {
        self.0.set(None);
    }
}

/// Programmer-visible registers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub pc: u16,
    pub sp: u8,
    pub status: u8,
}

impl Registers {
    pub fn flag(&self, flag: u8) -> bool {
        self.status & flag != 0
    }

    pub fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.status |= flag;
        } else {
            self.status &= !flag;
        }
    }

    fn update_zero_and_negative_flags(&mut self, value: u8) {
        self.set_flag(FLAG_ZERO, value == 0);
        self.set_flag(FLAG_NEGATIVE, value & 0x80 != 0);
    }
}

pub struct CPU<B: Bus> {
    pub regs: Registers,
    pub bus: B,
    /// Total cycles since reset.
    pub cycles: u64,
    interrupt: InterruptLine,
    running: bool,
}

impl<B: Bus> CPU<B> {
    /// A CPU in its power-up register state. Call [`CPU::reset`] to load PC from the reset vector.
    pub fn new(bus: B, interrupt: InterruptLine) -> Self {
        Self {
            regs: Registers {
                sp: 0xFD,
                status: STATUS_POWER_UP,
                ..Registers::default()
            },
            bus,
            cycles: 0,
            interrupt,
            running: true,
        }
    }

    pub fn reset(&mut self) -> Result<(), BusError> {
        self.regs = Registers {
            pc: self.bus.read_word(RESET_VECTOR)?,
            sp: 0xFD, // resets at 0xFD instead of 0xFF for some reason
            status: STATUS_POWER_UP,
            ..Registers::default()
        };
        self.interrupt.clear();
        self.running = true;
        self.cycles = 7;
        log::debug!("CPU reset, PC=${:04X}", self.regs.pc);
        Ok(())
    }

    /// False once an unimplemented opcode has halted the CPU.
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn interrupt_line(&self) -> &InterruptLine {
        &self.interrupt
    }

    /// Service a pending interrupt (returning 0) or execute one instruction (returning its cycles).
    ///
    /// A bus fault aborts the instruction with PC still on its opcode. An unimplemented opcode
    /// halts the CPU; later ticks return [`CpuError::Halted`].
    pub fn tick(&mut self) -> Result<u8, CpuError> {
        if !self.running {
            return Err(CpuError::Halted);
        }

        if let Some(interrupt) = self.interrupt.pending() {
            if interrupt == Interrupt::Nmi || !self.regs.flag(FLAG_INTERRUPT_DISABLE) {
                self.service_interrupt(interrupt)?;
                return Ok(0);
            }
        }

        let pc = self.regs.pc;
        let opcode = self.bus.read_byte(pc)?;
        let op = &OPCODES[opcode as usize];
        if log::log_enabled!(log::Level::Trace) {
            self.trace(opcode, op);
        }

        let extra = self.execute(opcode, op)?;
        let cycles = op.cycles + extra;
        self.cycles += cycles as u64;
        Ok(cycles)
    }

    fn service_interrupt(&mut self, interrupt: Interrupt) -> Result<(), BusError> {
        let vector = match interrupt {
            Interrupt::Nmi => NMI_VECTOR,
            Interrupt::Irq => IRQ_VECTOR,
            Interrupt::Reset => {
                self.interrupt.clear();
                return Ok(());
            }
        };

        self.push16(self.regs.pc)?;
        self.push((self.regs.status & !FLAG_BREAK) | FLAG_UNUSED)?;
        self.regs.set_flag(FLAG_INTERRUPT_DISABLE, true);
        self.regs.pc = self.bus.read_word(vector)?;
        self.interrupt.clear();
        log::debug!("{interrupt:?} serviced, jumping to ${:04X}", self.regs.pc);
        Ok(())
    }

    fn trace(&self, opcode: u8, op: &Opcode) {
        let r = &self.regs;
        log::trace!(
            "{:04X}  {:02X}  {} {:?}  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            r.pc,
            opcode,
            op.mnemonic,
            op.mode,
            r.a,
            r.x,
            r.y,
            r.status,
            r.sp,
            self.cycles
        );
    }

    fn halt(&mut self, opcode: u8, op: &Opcode) -> CpuError {
        self.running = false;
        log::error!(
            "unimplemented opcode ${opcode:02X} ({}) at ${:04X}, halting",
            op.mnemonic,
            self.regs.pc
        );
        CpuError::UnimplementedOpcode {
            opcode,
            mnemonic: op.mnemonic,
            pc: self.regs.pc,
        }
    }

    /// Run one instruction with PC on its opcode. Returns the cycles owed beyond the base count.
    fn execute(&mut self, opcode: u8, op: &Opcode) -> Result<u8, CpuError> {
        use Mnemonic::*;

        let mode = op.mode;
        let pc = self.regs.pc;
        let mut next_pc = pc.wrapping_add(op.size as u16);
        let mut extra = 0;
        if op.page_penalty && self.bus.check_page_cross(&self.regs, mode)? {
            extra += 1;
        }

        match op.mnemonic {
            // Loads and stores
            Lda => {
                let value = self.read_operand(mode)?;
                self.regs.a = value;
                self.regs.update_zero_and_negative_flags(value);
            }
            Ldx => {
                let value = self.read_operand(mode)?;
                self.regs.x = value;
                self.regs.update_zero_and_negative_flags(value);
            }
            Ldy => {
                let value = self.read_operand(mode)?;
                self.regs.y = value;
                self.regs.update_zero_and_negative_flags(value);
            }
            Lax if mode == AddressMode::Immediate => return Err(self.halt(opcode, op)),
            Lax => {
                let value = self.read_operand(mode)?;
                self.regs.a = value;
                self.regs.x = value;
                self.regs.update_zero_and_negative_flags(value);
            }
            Sta => self.write_operand(mode, self.regs.a)?,
            Stx => self.write_operand(mode, self.regs.x)?,
            Sty => self.write_operand(mode, self.regs.y)?,
            Sax => self.write_operand(mode, self.regs.a & self.regs.x)?,

            // Transfers
            Tax => self.transfer(|r| r.a, |r, v| r.x = v),
            Tay => self.transfer(|r| r.a, |r, v| r.y = v),
            Txa => self.transfer(|r| r.x, |r, v| r.a = v),
            Tya => self.transfer(|r| r.y, |r, v| r.a = v),
            Tsx => self.transfer(|r| r.sp, |r, v| r.x = v),
            Txs => self.regs.sp = self.regs.x,

            // Stack
            Pha => self.push(self.regs.a)?,
            Php => self.push(self.regs.status | FLAG_BREAK | FLAG_UNUSED)?,
            Pla => {
                let value = self.pop()?;
                self.regs.a = value;
                self.regs.update_zero_and_negative_flags(value);
            }
            Plp => {
                let status = self.pop()?;
                self.restore_status(status);
            }

            // Arithmetic and logic
            Adc => {
                let value = self.read_operand(mode)?;
                self.add_with_carry(value);
            }
            Sbc => {
                let value = self.read_operand(mode)?;
                self.add_with_carry(value ^ 0xFF);
            }
            And => {
                let value = self.read_operand(mode)?;
                self.regs.a &= value;
                self.regs.update_zero_and_negative_flags(self.regs.a);
            }
            Ora => {
                let value = self.read_operand(mode)?;
                self.regs.a |= value;
                self.regs.update_zero_and_negative_flags(self.regs.a);
            }
            Eor => {
                let value = self.read_operand(mode)?;
                self.regs.a ^= value;
                self.regs.update_zero_and_negative_flags(self.regs.a);
            }
            Bit => {
                let value = self.read_operand(mode)?;
                self.regs.set_flag(FLAG_ZERO, self.regs.a & value == 0);
                self.regs.set_flag(FLAG_OVERFLOW, value & 0x40 != 0);
                self.regs.set_flag(FLAG_NEGATIVE, value & 0x80 != 0);
            }
            Cmp => {
                let value = self.read_operand(mode)?;
                self.compare(self.regs.a, value);
            }
            Cpx => {
                let value = self.read_operand(mode)?;
                self.compare(self.regs.x, value);
            }
            Cpy => {
                let value = self.read_operand(mode)?;
                self.compare(self.regs.y, value);
            }

            // Increments and decrements
            Inc => {
                self.modify(mode, |cpu, v| {
                    let r = v.wrapping_add(1);
                    cpu.regs.update_zero_and_negative_flags(r);
                    r
                })?;
            }
            Dec => {
                self.modify(mode, |cpu, v| {
                    let r = v.wrapping_sub(1);
                    cpu.regs.update_zero_and_negative_flags(r);
                    r
                })?;
            }
            Inx => self.transfer(|r| r.x.wrapping_add(1), |r, v| r.x = v),
            Iny => self.transfer(|r| r.y.wrapping_add(1), |r, v| r.y = v),
            Dex => self.transfer(|r| r.x.wrapping_sub(1), |r, v| r.x = v),
            Dey => self.transfer(|r| r.y.wrapping_sub(1), |r, v| r.y = v),

            // Shifts and rotates
            Asl => {
                self.modify(mode, Self::shift_left)?;
            }
            Lsr => {
                self.modify(mode, Self::shift_right)?;
            }
            Rol => {
                self.modify(mode, Self::rotate_left)?;
            }
            Ror => {
                self.modify(mode, Self::rotate_right)?;
            }

            // Jumps and calls
            Jmp => next_pc = self.bus.get_address(&self.regs, mode)?,
            Jsr => {
                let target = self.bus.get_address(&self.regs, mode)?;
                self.push16(pc.wrapping_add(2))?;
                next_pc = target;
            }
            Rts => next_pc = self.pop16()?.wrapping_add(1),
            Rti => {
                let status = self.pop()?;
                self.restore_status(status);
                next_pc = self.pop16()?;
            }
            Brk => {
                self.push16(next_pc)?;
                self.push(self.regs.status | FLAG_BREAK | FLAG_UNUSED)?;
                self.regs.set_flag(FLAG_INTERRUPT_DISABLE, true);
                next_pc = self.bus.read_word(IRQ_VECTOR)?;
            }

            // Branches
            Bcc => extra += self.branch(!self.regs.flag(FLAG_CARRY), &mut next_pc)?,
            Bcs => extra += self.branch(self.regs.flag(FLAG_CARRY), &mut next_pc)?,
            Bne => extra += self.branch(!self.regs.flag(FLAG_ZERO), &mut next_pc)?,
            Beq => extra += self.branch(self.regs.flag(FLAG_ZERO), &mut next_pc)?,
            Bpl => extra += self.branch(!self.regs.flag(FLAG_NEGATIVE), &mut next_pc)?,
            Bmi => extra += self.branch(self.regs.flag(FLAG_NEGATIVE), &mut next_pc)?,
            Bvc => extra += self.branch(!self.regs.flag(FLAG_OVERFLOW), &mut next_pc)?,
            Bvs => extra += self.branch(self.regs.flag(FLAG_OVERFLOW), &mut next_pc)?,

            // Flags
            Clc => self.regs.set_flag(FLAG_CARRY, false),
            Sec => self.regs.set_flag(FLAG_CARRY, true),
            Cli => self.regs.set_flag(FLAG_INTERRUPT_DISABLE, false),
            Sei => self.regs.set_flag(FLAG_INTERRUPT_DISABLE, true),
            Cld => self.regs.set_flag(FLAG_DECIMAL, false),
            Sed => self.regs.set_flag(FLAG_DECIMAL, true),
            Clv => self.regs.set_flag(FLAG_OVERFLOW, false),

            Nop => {}

            // Undocumented read-modify-write combinations
            Dcp => {
                let value = self.modify(mode, |_, v| v.wrapping_sub(1))?;
                self.compare(self.regs.a, value);
            }
            Isc => {
                let value = self.modify(mode, |_, v| v.wrapping_add(1))?;
                self.add_with_carry(value ^ 0xFF);
            }
            Slo => {
                let value = self.modify(mode, Self::shift_left)?;
                self.regs.a |= value;
                self.regs.update_zero_and_negative_flags(self.regs.a);
            }
            Rla => {
                let value = self.modify(mode, Self::rotate_left)?;
                self.regs.a &= value;
                self.regs.update_zero_and_negative_flags(self.regs.a);
            }
            Sre => {
                let value = self.modify(mode, Self::shift_right)?;
                self.regs.a ^= value;
                self.regs.update_zero_and_negative_flags(self.regs.a);
            }
            Rra => {
                let value = self.modify(mode, Self::rotate_right)?;
                self.add_with_carry(value);
            }

            // Undocumented immediate combinations
            Anc => {
                let value = self.read_operand(mode)?;
                self.regs.a &= value;
                self.regs.update_zero_and_negative_flags(self.regs.a);
                self.regs.set_flag(FLAG_CARRY, self.regs.a & 0x80 != 0);
            }
            Alr => {
                let value = self.read_operand(mode)?;
                let a = self.regs.a & value;
                self.regs.a = self.shift_right(a);
            }
            Arr => {
                let value = self.read_operand(mode)?;
                let carry_in = if self.regs.flag(FLAG_CARRY) { 0x80 } else { 0 };
                let a = ((self.regs.a & value) >> 1) | carry_in;
                self.regs.a = a;
                self.regs.update_zero_and_negative_flags(a);
                self.regs.set_flag(FLAG_CARRY, a & 0x40 != 0);
                self.regs.set_flag(FLAG_OVERFLOW, ((a >> 6) ^ (a >> 5)) & 1 != 0);
            }
            Axs => {
                let value = self.read_operand(mode)?;
                let masked = self.regs.a & self.regs.x;
                self.regs.set_flag(FLAG_CARRY, masked >= value);
                self.regs.x = masked.wrapping_sub(value);
                self.regs.update_zero_and_negative_flags(self.regs.x);
            }

            // Unstable or CPU-locking opcodes
            Kil | Xaa | Ahx | Tas | Shx | Shy | Las => return Err(self.halt(opcode, op)),
        }

        self.regs.pc = next_pc;
        Ok(extra)
    }

    fn push(&mut self, value: u8) -> Result<(), BusError> {
        self.bus.push(value, &mut self.regs.sp)
    }

    fn pop(&mut self) -> Result<u8, BusError> {
        self.bus.pop(&mut self.regs.sp)
    }

    fn push16(&mut self, value: u16) -> Result<(), BusError> {
        self.bus.push16(value, &mut self.regs.sp)
    }

    fn pop16(&mut self) -> Result<u16, BusError> {
        self.bus.pop16(&mut self.regs.sp)
    }

    /// B is dropped and bit 5 forced on when P comes off the stack.
    fn restore_status(&mut self, status: u8) {
        self.regs.status = (status & !FLAG_BREAK) | FLAG_UNUSED;
    }

    fn read_operand(&mut self, mode: AddressMode) -> Result<u8, BusError> {
        if mode == AddressMode::Accumulator {
            return Ok(self.regs.a);
        }
        let address = self.bus.get_address(&self.regs, mode)?;
        self.bus.read_byte(address)
    }

    fn write_operand(&mut self, mode: AddressMode, value: u8) -> Result<(), BusError> {
        let address = self.bus.get_address(&self.regs, mode)?;
        self.bus.write_byte(address, value)
    }

    /// Read-modify-write on A or memory. Returns the value written back.
    fn modify(
        &mut self,
        mode: AddressMode,
        f: impl FnOnce(&mut Self, u8) -> u8,
    ) -> Result<u8, BusError> {
        if mode == AddressMode::Accumulator {
            let value = self.regs.a;
            let result = f(self, value);
            self.regs.a = result;
            return Ok(result);
        }
        let address = self.bus.get_address(&self.regs, mode)?;
        let value = self.bus.read_byte(address)?;
        let result = f(self, value);
        self.bus.write_byte(address, result)?;
        Ok(result)
    }

    fn transfer(&mut self, from: impl Fn(&Registers) -> u8, to: impl Fn(&mut Registers, u8)) {
        let value = from(&self.regs);
        to(&mut self.regs, value);
        self.regs.update_zero_and_negative_flags(value);
    }

    /// Binary add with carry in/out; V set when both inputs share a sign the result lacks.
    fn add_with_carry(&mut self, value: u8) {
        let a = self.regs.a;
        let sum = a as u16 + value as u16 + self.regs.flag(FLAG_CARRY) as u16;
        let result = sum as u8;
        self.regs.set_flag(FLAG_CARRY, sum > 0xFF);
        self.regs
            .set_flag(FLAG_OVERFLOW, (!(a ^ value) & (a ^ result) & 0x80) != 0);
        self.regs.a = result;
        self.regs.update_zero_and_negative_flags(result);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.regs.set_flag(FLAG_CARRY, register >= value);
        self.regs
            .update_zero_and_negative_flags(register.wrapping_sub(value));
    }

    fn shift_left(&mut self, value: u8) -> u8 {
        self.regs.set_flag(FLAG_CARRY, value & 0x80 != 0);
        let result = value << 1;
        self.regs.update_zero_and_negative_flags(result);
        result
    }

    fn shift_right(&mut self, value: u8) -> u8 {
        self.regs.set_flag(FLAG_CARRY, value & 0x01 != 0);
        let result = value >> 1;
        self.regs.update_zero_and_negative_flags(result);
        result
    }

    fn rotate_left(&mut self, value: u8) -> u8 {
        let carry_in = self.regs.flag(FLAG_CARRY) as u8;
        self.regs.set_flag(FLAG_CARRY, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.regs.update_zero_and_negative_flags(result);
        result
    }

    fn rotate_right(&mut self, value: u8) -> u8 {
        let carry_in = if self.regs.flag(FLAG_CARRY) { 0x80 } else { 0 };
        self.regs.set_flag(FLAG_CARRY, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        self.regs.update_zero_and_negative_flags(result);
        result
    }

    /// Taken branches cost one cycle, plus one more when the target is on another page.
    fn branch(&mut self, condition: bool, next_pc: &mut u16) -> Result<u8, BusError> {
        let offset = self.bus.read_byte(self.regs.pc.wrapping_add(1))? as i8;
        if !condition {
            return Ok(0);
        }

        let target = next_pc.wrapping_add_signed(offset as i16);
        let extra = if target & 0xFF00 != *next_pc & 0xFF00 { 2 } else { 1 };
        *next_pc = target;
        Ok(extra)
    }
}
