//! NES cartridge loading from iNES format (.nes images).
//!
//! Implements the [iNES](https://www.nesdev.org/wiki/INES) format: 16-byte header (magic "NES\x1A",
//! PRG size in 16 KiB units, CHR size in 8 KiB units, flags 6–7 for mirroring, battery and mapper),
//! then PRG ROM, then CHR ROM. A header without CHR banks gets 8 KiB of CHR RAM.
//! [Mapper](https://www.nesdev.org/wiki/Mapper) implements CPU PRG ($6000–$FFFF) and PPU CHR
//! ($0000–$1FFF) address decoding and bank switching.

use std::fmt;

use crate::cartridge::mapper::mapper::Mapper;
use crate::cartridge::mapper::mapper0::Mapper0;
use crate::cartridge::mapper::mapper1::Mapper1;
use crate::cartridge::mapper::{CHR_BANK_SIZE, ChrMemory, Mirroring, PRG_BANK_SIZE, PRG_RAM_SIZE};
use crate::error::CartridgeError;

pub const HEADER_SIZE: usize = 16;
const MAGIC: &[u8; 4] = b"NES\x1A";

/// Fields decoded from the 16-byte iNES header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// PRG ROM size in 16 KiB units.
    pub prg_banks: u8,
    /// CHR ROM size in 8 KiB units; 0 means CHR RAM.
    pub chr_banks: u8,
    pub mapper_id: u8,
    pub mirroring: Mirroring,
    pub battery: bool,
}

impl Header {
    pub fn parse(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < HEADER_SIZE {
            return Err(CartridgeError::TooShort { len: data.len() });
        }
        if &data[0..4] != MAGIC {
            return Err(CartridgeError::BadMagic);
        }

        let flags6 = data[6];
        let flags7 = data[7];
        Ok(Self {
            prg_banks: data[4],
            chr_banks: data[5],
            // Low nibble from the top of flags 6, high nibble from the top of flags 7
            mapper_id: (flags6 >> 4) | (flags7 & 0xF0),
            // Flags 6 bit 0: 0 = horizontal, 1 = vertical (board solder pads for NROM)
            mirroring: if flags6 & 1 != 0 {
                Mirroring::Vertical
            } else {
                Mirroring::Horizontal
            },
            battery: flags6 & 0b10 != 0,
        })
    }

    pub fn prg_rom_size(&self) -> usize {
        self.prg_banks as usize * PRG_BANK_SIZE
    }

    pub fn chr_rom_size(&self) -> usize {
        self.chr_banks as usize * CHR_BANK_SIZE
    }
}

/// Conditions that degrade a load without rejecting the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// Mapper not supported; the image runs as NROM.
    UnsupportedMapper(u8),
    /// Body shorter than the header promises; the rest is zero-filled.
    TruncatedBody { expected: usize, actual: usize },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::UnsupportedMapper(id) => {
                write!(f, "mapper {id} is not supported, falling back to NROM")
            }
            LoadWarning::TruncatedBody { expected, actual } => {
                write!(f, "ROM body is {actual} bytes, header declares {expected}; zero-filling")
            }
        }
    }
}

/// Cartridge: the parsed header and the mapper that owns PRG/CHR memory and nametable mirroring.
/// CPU reaches it via the bus at $6000–$FFFF; PPU reads CHR at $0000–$1FFF (pattern tables).
pub struct Cartridge {
    pub mapper: Box<dyn Mapper>,
    header: Header,
    warnings: Vec<LoadWarning>,
}

impl Cartridge {
    /// Parse an iNES image. Only a short image or a wrong magic number is fatal; a truncated
    /// body or an unknown mapper load anyway and are reported through [`Cartridge::warnings`].
    pub fn from_bytes(data: &[u8]) -> Result<Self, CartridgeError> {
        let header = Header::parse(data)?;
        let mut warnings = Vec::new();

        let prg_size = header.prg_rom_size();
        let chr_size = header.chr_rom_size();
        let expected = prg_size + chr_size;
        let mut body = data[HEADER_SIZE..].to_vec();
        if body.len() < expected {
            let warning = LoadWarning::TruncatedBody {
                expected,
                actual: body.len(),
            };
            log::warn!("{warning}");
            warnings.push(warning);
            body.resize(expected, 0);
        }

        let mut prg_rom = body[..prg_size].to_vec();
        if prg_rom.is_empty() {
            prg_rom = vec![0; PRG_BANK_SIZE];
        }
        let chr = ChrMemory::new(body[prg_size..prg_size + chr_size].to_vec());

        let mapper: Box<dyn Mapper> = match header.mapper_id {
            0 => Box::new(Mapper0::new(prg_rom, chr, header.mirroring)),
            1 => Box::new(Mapper1::new(prg_rom, chr)),
            id => {
                let warning = LoadWarning::UnsupportedMapper(id);
                log::warn!("{warning}");
                warnings.push(warning);
                Box::new(Mapper0::new(prg_rom, chr, header.mirroring))
            }
        };

        log::info!(
            "loaded cartridge: mapper {}, {} KiB PRG, {} KiB CHR {}, {:?} mirroring{}",
            header.mapper_id,
            prg_size / 1024,
            chr_size.max(CHR_BANK_SIZE) / 1024,
            if header.chr_banks == 0 { "RAM" } else { "ROM" },
            header.mirroring,
            if header.battery { ", battery" } else { "" }
        );

        Ok(Self {
            mapper,
            header,
            warnings,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    pub fn has_battery(&self) -> bool {
        self.header.battery
    }

    /// Read: PRG RAM ($6000–$7FFF) or PRG ROM ($8000–$FFFF). Mapper dispatches.
    pub fn read_byte(&self, addr: u16) -> u8 {
        self.mapper.read_byte(addr)
    }

    /// Write: PRG RAM or mapper registers (e.g. MMC1 shift register). PRG ROM is R/O.
    pub fn write_byte(&mut self, addr: u16, data: u8) {
        self.mapper.write_byte(addr, data);
    }

    pub fn read_ppu_byte(&self, addr: u16) -> u8 {
        self.mapper.read_ppu_byte(addr)
    }

    pub fn write_ppu_byte(&mut self, addr: u16, data: u8) {
        self.mapper.write_ppu_byte(addr, data);
    }

    /// Physical nametable for a PPU address in $2000–$2FFF.
    pub fn mirroring_table(&self, addr: u16) -> usize {
        self.mapper.mirroring_table(addr)
    }

    /// Snapshot of the 8 KiB PRG RAM window, for battery-backed saves.
    pub fn save_ram(&self) -> Vec<u8> {
        (0..PRG_RAM_SIZE as u16)
            .map(|offset| self.mapper.read_byte(0x6000 + offset))
            .collect()
    }

    /// Restore PRG RAM from a previous [`Cartridge::save_ram`]. Extra bytes are ignored.
    pub fn load_save_ram(&mut self, data: &[u8]) {
        for (offset, &byte) in data.iter().take(PRG_RAM_SIZE).enumerate() {
            self.mapper.write_byte(0x6000 + offset as u16, byte);
        }
    }
}
