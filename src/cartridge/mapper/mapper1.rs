//! Mapper 1 (MMC1): bank switching via 5-bit shift register.
//!
//! [MMC1](https://www.nesdev.org/wiki/MMC1): writes to $8000–$9FFF (control), $A000–$BFFF (CHR0),
//! $C000–$DFFF (CHR1), $E000–$FFFF (PRG bank). Any write with bit 7 set resets the shift register.
//! Otherwise, bit 0 is shifted in (LSB first); the fifth write is detected by the marker bit
//! reaching bit 0 and latches the value into the register selected by the address. Control
//! (bits 0–1) = mirroring; bits 2–3 = PRG mode; bit 4 = CHR mode.

use crate::cartridge::mapper::{
    CHR_BANK_SIZE, ChrMemory, Mirroring, PRG_BANK_SIZE, PRG_RAM_SIZE, mapper::Mapper,
};

/// Shift register value after a reset: the marker bit sits at bit 4.
const SHIFT_RESET: u8 = 0x10;
const CHR_HALF_BANK: usize = CHR_BANK_SIZE / 2;

/// MMC1 state: shift register, the four internal registers, and the bank offsets derived from them.
pub struct Mapper1 {
    prg_rom: Vec<u8>,
    prg_ram: Vec<u8>,
    chr: ChrMemory,
    shift_register: u8,
    control: u8,
    chr_bank_0: u8,
    chr_bank_1: u8,
    prg_bank: u8,
    prg_offsets: [usize; 2],
    chr_offsets: [usize; 2],
}

impl Mapper1 {
    /// Create MMC1. Control powers up as $0C (PRG mode 3: $8000 switchable, $C000 fixed last).
    /// `prg_rom` must not be empty.
    pub fn new(prg_rom: Vec<u8>, chr: ChrMemory) -> Self {
        let mut mapper = Self {
            prg_rom,
            prg_ram: vec![0; PRG_RAM_SIZE],
            chr,
            shift_register: SHIFT_RESET,
            control: 0x0C,
            chr_bank_0: 0,
            chr_bank_1: 0,
            prg_bank: 0,
            prg_offsets: [0; 2],
            chr_offsets: [0; 2],
        };
        mapper.update_banks();
        mapper
    }

    pub fn shift_register(&self) -> u8 {
        self.shift_register
    }

    pub fn control(&self) -> u8 {
        self.control
    }

    /// Raw CHR bank registers as last written.
    pub fn chr_banks(&self) -> (u8, u8) {
        (self.chr_bank_0, self.chr_bank_1)
    }

    /// PRG bank mode from control bits 2–3: 0/1 = 32 KiB mode; 2 = $8000 fixed first, $C000 switchable; 3 = $8000 switchable, $C000 fixed last.
    fn prg_bank_mode(&self) -> u8 {
        (self.control >> 2) & 0b11
    }

    /// CHR bank mode from control bit 4: 0 = one 8 KiB bank, 1 = two 4 KiB banks.
    fn chr_bank_mode(&self) -> u8 {
        (self.control >> 4) & 1
    }

    fn prg_bank_count(&self) -> usize {
        (self.prg_rom.len() / PRG_BANK_SIZE).max(1)
    }

    fn chr_bank_count(&self) -> usize {
        (self.chr.len() / CHR_HALF_BANK).max(1)
    }

    fn load_register(&mut self, addr: u16, value: u8) {
        match addr {
            0x8000..=0x9FFF => self.control = value,
            0xA000..=0xBFFF => self.chr_bank_0 = value,
            0xC000..=0xDFFF => self.chr_bank_1 = value,
            _ => self.prg_bank = value & 0x0F,
        }
        log::debug!(
            "MMC1 register ${addr:04X} <- ${value:02X} (control ${:02X}, prg ${:02X}, chr ${:02X}/${:02X})",
            self.control,
            self.prg_bank,
            self.chr_bank_0,
            self.chr_bank_1
        );
        self.update_banks();
    }

    /// Recompute the 16 KiB PRG and 4 KiB CHR windows from the registers.
    fn update_banks(&mut self) {
        let prg_count = self.prg_bank_count();
        let prg = self.prg_bank as usize;
        let prg_banks = match self.prg_bank_mode() {
            0 | 1 => [prg & !1, prg | 1],
            2 => [0, prg],
            _ => [prg, prg_count - 1],
        };
        self.prg_offsets = prg_banks.map(|bank| (bank % prg_count) * PRG_BANK_SIZE);

        let chr_count = self.chr_bank_count();
        let chr_banks = if self.chr_bank_mode() == 0 {
            let bank = (self.chr_bank_0 & 0x1E) as usize;
            [bank, bank + 1]
        } else {
            [self.chr_bank_0 as usize, self.chr_bank_1 as usize]
        };
        self.chr_offsets = chr_banks.map(|bank| (bank % chr_count) * CHR_HALF_BANK);
    }
}

impl Mapper for Mapper1 {
    fn read_byte(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.prg_ram[(addr - 0x6000) as usize],
            0x8000..=0xFFFF => {
                let offset = (addr - 0x8000) as usize;
                let window = offset / PRG_BANK_SIZE;
                self.prg_rom[(self.prg_offsets[window] + offset % PRG_BANK_SIZE) % self.prg_rom.len()]
            }
            _ => 0,
        }
    }

    fn write_byte(&mut self, addr: u16, data: u8) {
        match addr {
            0x6000..=0x7FFF => self.prg_ram[(addr - 0x6000) as usize] = data,
            0x8000..=0xFFFF => {
                if data & 0x80 != 0 {
                    self.shift_register = SHIFT_RESET;
                    self.control |= 0x0C;
                    self.update_banks();
                    return;
                }

                let complete = self.shift_register & 1 != 0;
                self.shift_register = (self.shift_register >> 1) | ((data & 1) << 4);
                if complete {
                    let value = self.shift_register;
                    self.shift_register = SHIFT_RESET;
                    self.load_register(addr, value);
                }
            }
            _ => {}
        }
    }

    fn read_ppu_byte(&self, addr: u16) -> u8 {
        let offset = (addr & 0x1FFF) as usize;
        self.chr
            .read(self.chr_offsets[offset / CHR_HALF_BANK] + offset % CHR_HALF_BANK)
    }

    fn write_ppu_byte(&mut self, addr: u16, data: u8) {
        let offset = (addr & 0x1FFF) as usize;
        let target = self.chr_offsets[offset / CHR_HALF_BANK] + offset % CHR_HALF_BANK;
        self.chr.write(target, data);
    }

    /// Mirroring from control bits 0–1: 0 = one-screen lower, 1 = one-screen upper, 2 = vertical, 3 = horizontal.
    fn mirroring(&self) -> Mirroring {
        match self.control & 0b11 {
            0 => Mirroring::SingleScreenLower,
            1 => Mirroring::SingleScreenUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mmc1(prg_banks: usize, chr_banks: usize) -> Mapper1 {
        let mut prg = vec![0; prg_banks * PRG_BANK_SIZE];
        for (bank, chunk) in prg.chunks_mut(PRG_BANK_SIZE).enumerate() {
            chunk[0] = bank as u8;
        }
        let mut chr = vec![0; chr_banks * CHR_BANK_SIZE];
        for (bank, chunk) in chr.chunks_mut(CHR_HALF_BANK).enumerate() {
            chunk[0] = bank as u8;
        }
        Mapper1::new(prg, ChrMemory::new(chr))
    }

    fn load(mapper: &mut Mapper1, addr: u16, value: u8) {
        for bit in 0..5 {
            mapper.write_byte(addr, (value >> bit) & 1);
        }
    }

    #[test]
    fn five_writes_latch_chr_bank_0() {
        let mut mapper = mmc1(2, 2);
        for bit in [1, 0, 1, 1, 0] {
            mapper.write_byte(0xA000, bit);
        }
        assert_eq!(mapper.chr_banks().0, 0b01101);
        assert_eq!(mapper.shift_register(), SHIFT_RESET);

        // A reset write afterwards touches no bank register
        mapper.write_byte(0xA000, 0x80);
        assert_eq!(mapper.chr_banks(), (0b01101, 0));
        assert_eq!(mapper.shift_register(), SHIFT_RESET);
        assert_eq!(mapper.control() & 0x0C, 0x0C);
    }

    #[test]
    fn high_bit_write_resets_shift_register() {
        let mut mapper = mmc1(2, 2);
        mapper.write_byte(0x8000, 1);
        mapper.write_byte(0x8000, 0);
        mapper.write_byte(0x8000, 0x80);
        assert_eq!(mapper.shift_register(), SHIFT_RESET);
        assert_eq!(mapper.control() & 0x0C, 0x0C);

        // Another reset leaves the register unchanged
        mapper.write_byte(0xE000, 0xFF);
        assert_eq!(mapper.shift_register(), SHIFT_RESET);
    }

    #[test]
    fn mode_3_fixes_last_bank_at_c000() {
        let mut mapper = mmc1(4, 1);
        load(&mut mapper, 0xE000, 1);
        assert_eq!(mapper.read_byte(0x8000), 1);
        assert_eq!(mapper.read_byte(0xC000), 3);
    }

    #[test]
    fn mode_2_fixes_first_bank_at_8000() {
        let mut mapper = mmc1(4, 1);
        load(&mut mapper, 0x8000, 0b01000);
        load(&mut mapper, 0xE000, 2);
        assert_eq!(mapper.read_byte(0x8000), 0);
        assert_eq!(mapper.read_byte(0xC000), 2);
    }

    #[test]
    fn thirty_two_kilobyte_mode_ignores_low_bit() {
        let mut mapper = mmc1(4, 1);
        load(&mut mapper, 0x8000, 0b00000);
        load(&mut mapper, 0xE000, 3);
        assert_eq!(mapper.read_byte(0x8000), 2);
        assert_eq!(mapper.read_byte(0xC000), 3);
    }

    #[test]
    fn four_kilobyte_chr_banks_switch_independently() {
        let mut mapper = mmc1(2, 2);
        load(&mut mapper, 0x8000, 0b10000);
        load(&mut mapper, 0xA000, 3);
        load(&mut mapper, 0xC000, 1);
        assert_eq!(mapper.read_ppu_byte(0x0000), 3);
        assert_eq!(mapper.read_ppu_byte(0x1000), 1);
    }

    #[test]
    fn control_selects_mirroring() {
        let mut mapper = mmc1(2, 1);
        for (value, expected) in [
            (0, Mirroring::SingleScreenLower),
            (1, Mirroring::SingleScreenUpper),
            (2, Mirroring::Vertical),
            (3, Mirroring::Horizontal),
        ] {
            load(&mut mapper, 0x8000, 0x0C | value);
            assert_eq!(mapper.mirroring(), expected);
        }
    }

    #[test]
    fn out_of_range_bank_wraps() {
        let mut mapper = mmc1(2, 1);
        load(&mut mapper, 0xE000, 5);
        assert_eq!(mapper.read_byte(0x8000), 1);
    }
}
