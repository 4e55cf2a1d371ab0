//! Mapper 0 (NROM): no bank switching, 16/32KB PRG, 8KB CHR.

use crate::cartridge::mapper::{ChrMemory, Mirroring, PRG_RAM_SIZE, mapper::Mapper};

/// NROM mapper: fixed PRG and CHR, 16KB PRG mirrored into both halves of $8000–$FFFF.
pub struct Mapper0 {
    prg_rom: Vec<u8>,
    prg_ram: Vec<u8>,
    chr: ChrMemory,
    mirroring: Mirroring,
}

impl Mapper0 {
    /// Create Mapper0 with given PRG ROM, CHR ROM (empty for CHR RAM), and the header's mirroring.
    /// `prg_rom` must not be empty; [`Cartridge`](crate::cartridge::cartridge::Cartridge) pads it to 16 KiB.
    pub fn new(prg_rom: Vec<u8>, chr: ChrMemory, mirroring: Mirroring) -> Self {
        Self {
            prg_rom,
            prg_ram: vec![0; PRG_RAM_SIZE],
            chr,
            mirroring,
        }
    }
}

impl Mapper for Mapper0 {
    fn read_byte(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.prg_ram[(addr - 0x6000) as usize],
            // 16KB images repeat at $C000
            0x8000..=0xFFFF => self.prg_rom[(addr - 0x8000) as usize % self.prg_rom.len()],
            _ => 0,
        }
    }

    fn write_byte(&mut self, addr: u16, data: u8) {
        match addr {
            0x6000..=0x7FFF => self.prg_ram[(addr - 0x6000) as usize] = data,
            _ => log::debug!("NROM ignoring write of ${data:02X} to PRG ROM ${addr:04X}"),
        }
    }

    fn read_ppu_byte(&self, addr: u16) -> u8 {
        self.chr.read((addr & 0x1FFF) as usize)
    }

    fn write_ppu_byte(&mut self, addr: u16, data: u8) {
        self.chr.write((addr & 0x1FFF) as usize, data);
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}
