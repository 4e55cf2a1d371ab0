//! NES cartridge loading and mapper support.
//!
//! - **cartridge**: Parses iNES (.nes) images, holds the header and mapper.
//! - **mapper**: NROM (0), MMC1 (1); PRG/CHR bank switching and nametable mirroring.

pub mod cartridge;
pub mod mapper;
