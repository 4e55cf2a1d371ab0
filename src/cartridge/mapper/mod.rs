//! NES mappers for PRG/CHR memory mapping.
//!
//! Mapper0 (NROM), Mapper1 (MMC1), and the storage and mirroring types they share.

pub mod mapper;

pub mod mapper0;
pub mod mapper1;

/// Size of the cartridge RAM window at $6000–$7FFF.
pub const PRG_RAM_SIZE: usize = 0x2000;
/// PRG ROM bank size as counted by the iNES header.
pub const PRG_BANK_SIZE: usize = 0x4000;
/// CHR bank size as counted by the iNES header.
pub const CHR_BANK_SIZE: usize = 0x2000;

/// Nametable mirroring mode for PPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    /// $2000 = $2400, $2800 = $2C00 (vertical scrolling games).
    Horizontal,
    /// $2000 = $2800, $2400 = $2C00 (horizontal scrolling games).
    Vertical,
    /// All four logical nametables show physical table 0.
    SingleScreenLower,
    /// All four logical nametables show physical table 1.
    SingleScreenUpper,
}

impl Mirroring {
    /// Physical nametable (0 or 1) backing a PPU address in $2000–$2FFF.
    pub fn nametable(self, addr: u16) -> usize {
        let logical = ((addr & 0x0FFF) / 0x400) as usize;
        match self {
            Mirroring::Horizontal => logical / 2,
            Mirroring::Vertical => logical % 2,
            Mirroring::SingleScreenLower => 0,
            Mirroring::SingleScreenUpper => 1,
        }
    }
}

/// Pattern table storage: CHR ROM from the image, or 8 KiB of CHR RAM when the header declares
/// no CHR banks.
pub struct ChrMemory {
    data: Vec<u8>,
    writable: bool,
}

impl ChrMemory {
    pub fn new(chr_rom: Vec<u8>) -> Self {
        if chr_rom.is_empty() {
            Self {
                data: vec![0; CHR_BANK_SIZE],
                writable: true,
            }
        } else {
            Self {
                data: chr_rom,
                writable: false,
            }
        }
    }

    /// Size in bytes; never zero, since empty CHR ROM becomes 8 KiB of CHR RAM.
    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_ram(&self) -> bool {
        self.writable
    }

    pub fn read(&self, offset: usize) -> u8 {
        self.data[offset % self.data.len()]
    }

    pub fn write(&mut self, offset: usize, data: u8) {
        if self.writable {
            let len = self.data.len();
            self.data[offset % len] = data;
        } else {
            log::warn!("ignoring write of ${data:02X} to CHR ROM offset ${offset:04X}");
        }
    }
}
