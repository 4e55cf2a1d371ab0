//! Mapper trait: PRG/CHR memory access and mirroring.

use crate::cartridge::mapper::Mirroring;

/// Trait for NES cartridge mappers. The bus routes every cartridge address through these.
pub trait Mapper {
    /// CPU read from PRG RAM ($6000–$7FFF) or PRG ROM ($8000–$FFFF).
    fn read_byte(&self, addr: u16) -> u8;
    /// CPU write to PRG RAM or to the mapper's registers.
    fn write_byte(&mut self, addr: u16, data: u8);
    /// PPU read from the pattern tables ($0000–$1FFF).
    fn read_ppu_byte(&self, addr: u16) -> u8;
    /// PPU write to the pattern tables (CHR RAM only).
    fn write_ppu_byte(&mut self, addr: u16, data: u8);
    /// Current nametable mirroring.
    fn mirroring(&self) -> Mirroring;

    /// Physical nametable (0 or 1) backing a PPU address in $2000–$2FFF.
    fn mirroring_table(&self, addr: u16) -> usize {
        self.mirroring().nametable(addr)
    }
}
