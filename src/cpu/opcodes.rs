//! The 6502 instruction table.
//!
//! Every one of the 256 opcode slots carries a mnemonic, addressing mode, size and base cycle
//! count, including the undocumented ones, so diagnostics can name any byte the CPU fetches.
//! Cycle counts follow the [6502 reference](https://www.nesdev.org/obelisk-6502-guide/reference.html)
//! and the [undocumented opcode table](https://www.nesdev.org/wiki/CPU_unofficial_opcodes).

use std::fmt;

/// How an instruction locates its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    /// `JMP ($nnnn)` only.
    Indirect,
    /// `($nn,X)`
    IndirectX,
    /// `($nn),Y`
    IndirectY,
    /// Branch displacement.
    Relative,
}

impl AddressMode {
    /// Instruction length in bytes (opcode plus operand).
    pub const fn size(self) -> u8 {
        match self {
            Self::Implied | Self::Accumulator => 1,
            Self::Immediate
            | Self::ZeroPage
            | Self::ZeroPageX
            | Self::ZeroPageY
            | Self::IndirectX
            | Self::IndirectY
            | Self::Relative => 2,
            Self::Absolute | Self::AbsoluteX | Self::AbsoluteY | Self::Indirect => 3,
        }
    }
}

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    Adc, Ahx, Alr, Anc, And, Arr, Asl, Axs, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk,
    Bvc, Bvs, Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dcp, Dec, Dex, Dey, Eor, Inc, Inx,
    Iny, Isc, Jmp, Jsr, Kil, Las, Lax, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla,
    Plp, Rla, Rol, Ror, Rra, Rti, Rts, Sax, Sbc, Sec, Sed, Sei, Shx, Shy, Slo, Sre,
    Sta, Stx, Sty, Tas, Tax, Tay, Tsx, Txa, Txs, Tya, Xaa,
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = format!("{self:?}");
        f.write_str(&name.to_uppercase())
    }
}

/// One slot of the opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub mnemonic: Mnemonic,
    pub mode: AddressMode,
    pub size: u8,
    pub cycles: u8,
    /// Adds a cycle when the indexed operand address crosses a page.
    pub page_penalty: bool,
}

impl Opcode {
    const fn new(mnemonic: Mnemonic, mode: AddressMode, cycles: u8, page_penalty: bool) -> Self {
        Self {
            mnemonic,
            mode,
            size: mode.size(),
            cycles,
            page_penalty,
        }
    }

    const fn with_size(mnemonic: Mnemonic, mode: AddressMode, size: u8, cycles: u8) -> Self {
        Self {
            mnemonic,
            mode,
            size,
            cycles,
            page_penalty: false,
        }
    }
}

use AddressMode::*;
use Mnemonic::*;

/// Opcode byte → instruction. BRK is two bytes long: the byte after it is padding.
#[rustfmt::skip]
pub static OPCODES: [Opcode; 256] = [
    // $00
    Opcode::with_size(Brk, Implied, 2, 7),
    Opcode::new(Ora, IndirectX, 6, false),
    Opcode::new(Kil, Implied, 2, false),
    Opcode::new(Slo, IndirectX, 8, false),
    Opcode::new(Nop, ZeroPage, 3, false),
    Opcode::new(Ora, ZeroPage, 3, false),
    Opcode::new(Asl, ZeroPage, 5, false),
    Opcode::new(Slo, ZeroPage, 5, false),
    Opcode::new(Php, Implied, 3, false),
    Opcode::new(Ora, Immediate, 2, false),
    Opcode::new(Asl, Accumulator, 2, false),
    Opcode::new(Anc, Immediate, 2, false),
    Opcode::new(Nop, Absolute, 4, false),
    Opcode::new(Ora, Absolute, 4, false),
    Opcode::new(Asl, Absolute, 6, false),
    Opcode::new(Slo, Absolute, 6, false),
    // $10
    Opcode::new(Bpl, Relative, 2, false),
    Opcode::new(Ora, IndirectY, 5, true),
    Opcode::new(Kil, Implied, 2, false),
    Opcode::new(Slo, IndirectY, 8, false),
    Opcode::new(Nop, ZeroPageX, 4, false),
    Opcode::new(Ora, ZeroPageX, 4, false),
    Opcode::new(Asl, ZeroPageX, 6, false),
    Opcode::new(Slo, ZeroPageX, 6, false),
    Opcode::new(Clc, Implied, 2, false),
    Opcode::new(Ora, AbsoluteY, 4, true),
    Opcode::new(Nop, Implied, 2, false),
    Opcode::new(Slo, AbsoluteY, 7, false),
    Opcode::new(Nop, AbsoluteX, 4, true),
    Opcode::new(Ora, AbsoluteX, 4, true),
    Opcode::new(Asl, AbsoluteX, 7, false),
    Opcode::new(Slo, AbsoluteX, 7, false),
    // $20
    Opcode::new(Jsr, Absolute, 6, false),
    Opcode::new(And, IndirectX, 6, false),
    Opcode::new(Kil, Implied, 2, false),
    Opcode::new(Rla, IndirectX, 8, false),
    Opcode::new(Bit, ZeroPage, 3, false),
    Opcode::new(And, ZeroPage, 3, false),
    Opcode::new(Rol, ZeroPage, 5, false),
    Opcode::new(Rla, ZeroPage, 5, false),
    Opcode::new(Plp, Implied, 4, false),
    Opcode::new(And, Immediate, 2, false),
    Opcode::new(Rol, Accumulator, 2, false),
    Opcode::new(Anc, Immediate, 2, false),
    Opcode::new(Bit, Absolute, 4, false),
    Opcode::new(And, Absolute, 4, false),
    Opcode::new(Rol, Absolute, 6, false),
    Opcode::new(Rla, Absolute, 6, false),
    // $30
    Opcode::new(Bmi, Relative, 2, false),
    Opcode::new(And, IndirectY, 5, true),
    Opcode::new(Kil, Implied, 2, false),
    Opcode::new(Rla, IndirectY, 8, false),
    Opcode::new(Nop, ZeroPageX, 4, false),
    Opcode::new(And, ZeroPageX, 4, false),
    Opcode::new(Rol, ZeroPageX, 6, false),
    Opcode::new(Rla, ZeroPageX, 6, false),
    Opcode::new(Sec, Implied, 2, false),
    Opcode::new(And, AbsoluteY, 4, true),
    Opcode::new(Nop, Implied, 2, false),
    Opcode::new(Rla, AbsoluteY, 7, false),
    Opcode::new(Nop, AbsoluteX, 4, true),
    Opcode::new(And, AbsoluteX, 4, true),
    Opcode::new(Rol, AbsoluteX, 7, false),
    Opcode::new(Rla, AbsoluteX, 7, false),
    // $40
    Opcode::new(Rti, Implied, 6, false),
    Opcode::new(Eor, IndirectX, 6, false),
    Opcode::new(Kil, Implied, 2, false),
    Opcode::new(Sre, IndirectX, 8, false),
    Opcode::new(Nop, ZeroPage, 3, false),
    Opcode::new(Eor, ZeroPage, 3, false),
    Opcode::new(Lsr, ZeroPage, 5, false),
    Opcode::new(Sre, ZeroPage, 5, false),
    Opcode::new(Pha, Implied, 3, false),
    Opcode::new(Eor, Immediate, 2, false),
    Opcode::new(Lsr, Accumulator, 2, false),
    Opcode::new(Alr, Immediate, 2, false),
    Opcode::new(Jmp, Absolute, 3, false),
    Opcode::new(Eor, Absolute, 4, false),
    Opcode::new(Lsr, Absolute, 6, false),
    Opcode::new(Sre, Absolute, 6, false),
    // $50
    Opcode::new(Bvc, Relative, 2, false),
    Opcode::new(Eor, IndirectY, 5, true),
    Opcode::new(Kil, Implied, 2, false),
    Opcode::new(Sre, IndirectY, 8, false),
    Opcode::new(Nop, ZeroPageX, 4, false),
    Opcode::new(Eor, ZeroPageX, 4, false),
    Opcode::new(Lsr, ZeroPageX, 6, false),
    Opcode::new(Sre, ZeroPageX, 6, false),
    Opcode::new(Cli, Implied, 2, false),
    Opcode::new(Eor, AbsoluteY, 4, true),
    Opcode::new(Nop, Implied, 2, false),
    Opcode::new(Sre, AbsoluteY, 7, false),
    Opcode::new(Nop, AbsoluteX, 4, true),
    Opcode::new(Eor, AbsoluteX, 4, true),
    Opcode::new(Lsr, AbsoluteX, 7, false),
    Opcode::new(Sre, AbsoluteX, 7, false),
    // $60
    Opcode::new(Rts, Implied, 6, false),
    Opcode::new(Adc, IndirectX, 6, false),
    Opcode::new(Kil, Implied, 2, false),
    Opcode::new(Rra, IndirectX, 8, false),
    Opcode::new(Nop, ZeroPage, 3, false),
    Opcode::new(Adc, ZeroPage, 3, false),
    Opcode::new(Ror, ZeroPage, 5, false),
    Opcode::new(Rra, ZeroPage, 5, false),
    Opcode::new(Pla, Implied, 4, false),
    Opcode::new(Adc, Immediate, 2, false),
    Opcode::new(Ror, Accumulator, 2, false),
    Opcode::new(Arr, Immediate, 2, false),
    Opcode::new(Jmp, Indirect, 5, false),
    Opcode::new(Adc, Absolute, 4, false),
    Opcode::new(Ror, Absolute, 6, false),
    Opcode::new(Rra, Absolute, 6, false),
    // $70
    Opcode::new(Bvs, Relative, 2, false),
    Opcode::new(Adc, IndirectY, 5, true),
    Opcode::new(Kil, Implied, 2, false),
    Opcode::new(Rra, IndirectY, 8, false),
    Opcode::new(Nop, ZeroPageX, 4, false),
    Opcode::new(Adc, ZeroPageX, 4, false),
    Opcode::new(Ror, ZeroPageX, 6, false),
    Opcode::new(Rra, ZeroPageX, 6, false),
    Opcode::new(Sei, Implied, 2, false),
    Opcode::new(Adc, AbsoluteY, 4, true),
    Opcode::new(Nop, Implied, 2, false),
    Opcode::new(Rra, AbsoluteY, 7, false),
    Opcode::new(Nop, AbsoluteX, 4, true),
    Opcode::new(Adc, AbsoluteX, 4, true),
    Opcode::new(Ror, AbsoluteX, 7, false),
    Opcode::new(Rra, AbsoluteX, 7, false),
    // $80
    Opcode::new(Nop, Immediate, 2, false),
    Opcode::new(Sta, IndirectX, 6, false),
    Opcode::new(Nop, Immediate, 2, false),
    Opcode::new(Sax, IndirectX, 6, false),
    Opcode::new(Sty, ZeroPage, 3, false),
    Opcode::new(Sta, ZeroPage, 3, false),
    Opcode::new(Stx, ZeroPage, 3, false),
    Opcode::new(Sax, ZeroPage, 3, false),
    Opcode::new(Dey, Implied, 2, false),
    Opcode::new(Nop, Immediate, 2, false),
    Opcode::new(Txa, Implied, 2, false),
    Opcode::new(Xaa, Immediate, 2, false),
    Opcode::new(Sty, Absolute, 4, false),
    Opcode::new(Sta, Absolute, 4, false),
    Opcode::new(Stx, Absolute, 4, false),
    Opcode::new(Sax, Absolute, 4, false),
    // $90
    Opcode::new(Bcc, Relative, 2, false),
    Opcode::new(Sta, IndirectY, 6, false),
    Opcode::new(Kil, Implied, 2, false),
    Opcode::new(Ahx, IndirectY, 6, false),
    Opcode::new(Sty, ZeroPageX, 4, false),
    Opcode::new(Sta, ZeroPageX, 4, false),
    Opcode::new(Stx, ZeroPageY, 4, false),
    Opcode::new(Sax, ZeroPageY, 4, false),
    Opcode::new(Tya, Implied, 2, false),
    Opcode::new(Sta, AbsoluteY, 5, false),
    Opcode::new(Txs, Implied, 2, false),
    Opcode::new(Tas, AbsoluteY, 5, false),
    Opcode::new(Shy, AbsoluteX, 5, false),
    Opcode::new(Sta, AbsoluteX, 5, false),
    Opcode::new(Shx, AbsoluteY, 5, false),
    Opcode::new(Ahx, AbsoluteY, 5, false),
    // $A0
    Opcode::new(Ldy, Immediate, 2, false),
    Opcode::new(Lda, IndirectX, 6, false),
    Opcode::new(Ldx, Immediate, 2, false),
    Opcode::new(Lax, IndirectX, 6, false),
    Opcode::new(Ldy, ZeroPage, 3, false),
    Opcode::new(Lda, ZeroPage, 3, false),
    Opcode::new(Ldx, ZeroPage, 3, false),
    Opcode::new(Lax, ZeroPage, 3, false),
    Opcode::new(Tay, Implied, 2, false),
    Opcode::new(Lda, Immediate, 2, false),
    Opcode::new(Tax, Implied, 2, false),
    Opcode::new(Lax, Immediate, 2, false),
    Opcode::new(Ldy, Absolute, 4, false),
    Opcode::new(Lda, Absolute, 4, false),
    Opcode::new(Ldx, Absolute, 4, false),
    Opcode::new(Lax, Absolute, 4, false),
    // $B0
    Opcode::new(Bcs, Relative, 2, false),
    Opcode::new(Lda, IndirectY, 5, true),
    Opcode::new(Kil, Implied, 2, false),
    Opcode::new(Lax, IndirectY, 5, true),
    Opcode::new(Ldy, ZeroPageX, 4, false),
    Opcode::new(Lda, ZeroPageX, 4, false),
    Opcode::new(Ldx, ZeroPageY, 4, false),
    Opcode::new(Lax, ZeroPageY, 4, false),
    Opcode::new(Clv, Implied, 2, false),
    Opcode::new(Lda, AbsoluteY, 4, true),
    Opcode::new(Tsx, Implied, 2, false),
    Opcode::new(Las, AbsoluteY, 4, true),
    Opcode::new(Ldy, AbsoluteX, 4, true),
    Opcode::new(Lda, AbsoluteX, 4, true),
    Opcode::new(Ldx, AbsoluteY, 4, true),
    Opcode::new(Lax, AbsoluteY, 4, true),
    // $C0
    Opcode::new(Cpy, Immediate, 2, false),
    Opcode::new(Cmp, IndirectX, 6, false),
    Opcode::new(Nop, Immediate, 2, false),
    Opcode::new(Dcp, IndirectX, 8, false),
    Opcode::new(Cpy, ZeroPage, 3, false),
    Opcode::new(Cmp, ZeroPage, 3, false),
    Opcode::new(Dec, ZeroPage, 5, false),
    Opcode::new(Dcp, ZeroPage, 5, false),
    Opcode::new(Iny, Implied, 2, false),
    Opcode::new(Cmp, Immediate, 2, false),
    Opcode::new(Dex, Implied, 2, false),
    Opcode::new(Axs, Immediate, 2, false),
    Opcode::new(Cpy, Absolute, 4, false),
    Opcode::new(Cmp, Absolute, 4, false),
    Opcode::new(Dec, Absolute, 6, false),
    Opcode::new(Dcp, Absolute, 6, false),
    // $D0
    Opcode::new(Bne, Relative, 2, false),
    Opcode::new(Cmp, IndirectY, 5, true),
    Opcode::new(Kil, Implied, 2, false),
    Opcode::new(Dcp, IndirectY, 8, false),
    Opcode::new(Nop, ZeroPageX, 4, false),
    Opcode::new(Cmp, ZeroPageX, 4, false),
    Opcode::new(Dec, ZeroPageX, 6, false),
    Opcode::new(Dcp, ZeroPageX, 6, false),
    Opcode::new(Cld, Implied, 2, false),
    Opcode::new(Cmp, AbsoluteY, 4, true),
    Opcode::new(Nop, Implied, 2, false),
    Opcode::new(Dcp, AbsoluteY, 7, false),
    Opcode::new(Nop, AbsoluteX, 4, true),
    Opcode::new(Cmp, AbsoluteX, 4, true),
    Opcode::new(Dec, AbsoluteX, 7, false),
    Opcode::new(Dcp, AbsoluteX, 7, false),
    // $E0
    Opcode::new(Cpx, Immediate, 2, false),
    Opcode::new(Sbc, IndirectX, 6, false),
    Opcode::new(Nop, Immediate, 2, false),
    Opcode::new(Isc, IndirectX, 8, false),
    Opcode::new(Cpx, ZeroPage, 3, false),
    Opcode::new(Sbc, ZeroPage, 3, false),
    Opcode::new(Inc, ZeroPage, 5, false),
    Opcode::new(Isc, ZeroPage, 5, false),
    Opcode::new(Inx, Implied, 2, false),
    Opcode::new(Sbc, Immediate, 2, false),
    Opcode::new(Nop, Implied, 2, false),
    Opcode::new(Sbc, Immediate, 2, false),
    Opcode::new(Cpx, Absolute, 4, false),
    Opcode::new(Sbc, Absolute, 4, false),
    Opcode::new(Inc, Absolute, 6, false),
    Opcode::new(Isc, Absolute, 6, false),
    // $F0
    Opcode::new(Beq, Relative, 2, false),
    Opcode::new(Sbc, IndirectY, 5, true),
    Opcode::new(Kil, Implied, 2, false),
    Opcode::new(Isc, IndirectY, 8, false),
    Opcode::new(Nop, ZeroPageX, 4, false),
    Opcode::new(Sbc, ZeroPageX, 4, false),
    Opcode::new(Inc, ZeroPageX, 6, false),
    Opcode::new(Isc, ZeroPageX, 6, false),
    Opcode::new(Sed, Implied, 2, false),
    Opcode::new(Sbc, AbsoluteY, 4, true),
    Opcode::new(Nop, Implied, 2, false),
    Opcode::new(Isc, AbsoluteY, 7, false),
    Opcode::new(Nop, AbsoluteX, 4, true),
    Opcode::new(Sbc, AbsoluteX, 4, true),
    Opcode::new(Inc, AbsoluteX, 7, false),
    Opcode::new(Isc, AbsoluteX, 7, false),
];
