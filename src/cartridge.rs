/*!
Cartridge with iNES (v1) loader and Mapper construction.

Features:
- Parse the 16-byte iNES header from bytes or a file path
- Skip the optional 512-byte trainer
- Extract PRG ROM and CHR (ROM, or 8 KiB CHR RAM when the CHR page count is 0)
- Determine mirroring, PRG RAM presence and the mapper id
- Construct the concrete Mapper (NROM or MMC1) behind `Box<dyn Mapper>`

Notes:
- iNES 2.0 images are detected and rejected.
- PRG RAM (8 KiB) is always allocated at $6000..=$7FFF; header bit 1 of
  flags 6 is reported through `has_battery_ram`.
- Every failure is reported before a mapper is constructed.
*/

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{EmuError, LoadError};
use crate::mapper::{Mapper, Nrom};
use crate::mappers::Mmc1;

const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;
const PRG_PAGE: usize = 16 * 1024;
const CHR_PAGE: usize = 8 * 1024;
const PRG_RAM_LEN: usize = 8 * 1024;

/// Nametable mirroring arrangement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
    SingleScreenLower,
    SingleScreenUpper,
}

/// Parsed iNES header fields.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InesHeader {
    pub prg_pages: usize,
    pub chr_pages: usize,
    pub mirroring: Mirroring,
    pub has_prg_ram: bool,
    pub has_trainer: bool,
    pub mapper_id: u16,
}

impl InesHeader {
    pub fn parse(data: &[u8]) -> Result<Self, LoadError> {
        if data.len() < HEADER_LEN {
            return Err(LoadError::TooSmall(data.len()));
        }
        if &data[0..4] != b"NES\x1A" {
            return Err(LoadError::BadSignature);
        }

        let flags6 = data[6];
        let flags7 = data[7];
        if (flags7 & 0x0C) == 0x08 {
            return Err(LoadError::Ines2Unsupported);
        }

        let mirroring = if flags6 & 0b0000_1000 != 0 {
            Mirroring::FourScreen
        } else if flags6 & 0b0000_0001 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        Ok(Self {
            prg_pages: data[4] as usize,
            chr_pages: data[5] as usize,
            mirroring,
            has_prg_ram: flags6 & 0b0000_0010 != 0,
            has_trainer: flags6 & 0b0000_0100 != 0,
            mapper_id: (flags7 & 0xF0) as u16 | (flags6 >> 4) as u16,
        })
    }

    pub fn chr_is_ram(&self) -> bool {
        self.chr_pages == 0
    }
}

pub struct Cartridge {
    pub header: InesHeader,
    pub mapper: Box<dyn Mapper>,
}

impl std::fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cartridge")
            .field("header", &self.header)
            .field("mapper_id", &self.mapper.mapper_id())
            .finish()
    }
}

fn slice<'a>(
    data: &'a [u8],
    offset: usize,
    len: usize,
    section: &'static str,
) -> Result<&'a [u8], LoadError> {
    data.get(offset..offset + len).ok_or(LoadError::Truncated {
        section,
        needed: offset + len,
        available: data.len(),
    })
}

impl Cartridge {
    // -------------- Construction --------------

    /// Load a cartridge from raw iNES bytes and construct its mapper.
    pub fn from_ines_bytes(data: &[u8]) -> Result<Self, LoadError> {
        let header = InesHeader::parse(data)?;

        let mut offset = HEADER_LEN;
        if header.has_trainer {
            slice(data, offset, TRAINER_LEN, "trainer")?;
            offset += TRAINER_LEN;
        }

        let prg_len = header.prg_pages * PRG_PAGE;
        let prg_rom = slice(data, offset, prg_len, "PRG ROM")?.to_vec();
        offset += prg_len;

        let chr = if header.chr_is_ram() {
            vec![0; CHR_PAGE]
        } else {
            slice(data, offset, header.chr_pages * CHR_PAGE, "CHR ROM")?.to_vec()
        };
        let chr_is_ram = header.chr_is_ram();

        let mapper: Box<dyn Mapper> = match header.mapper_id {
            0 => Box::new(Nrom::new(prg_rom, chr, chr_is_ram, PRG_RAM_LEN)),
            1 => Box::new(Mmc1::new(prg_rom, vec![0; PRG_RAM_LEN], chr, chr_is_ram)),
            other => return Err(LoadError::UnsupportedMapper(other)),
        };

        info!(
            "cartridge: mapper {} PRG {}x16K CHR {} mirroring {:?}",
            header.mapper_id,
            header.prg_pages,
            if chr_is_ram {
                "RAM 8K".to_string()
            } else {
                format!("{}x8K", header.chr_pages)
            },
            header.mirroring
        );
        debug!("cartridge header: {header:?}");

        Ok(Self { header, mapper })
    }

    /// Load a cartridge from an iNES file (.nes).
    pub fn from_ines_file<P: AsRef<Path>>(path: P) -> Result<Self, EmuError> {
        let bytes = fs::read(path)?;
        Ok(Self::from_ines_bytes(&bytes)?)
    }

    // -------------- Accessors --------------

    pub fn mapper_id(&self) -> u16 {
        self.header.mapper_id
    }

    /// Header mirroring. The PPU asks the mapper for overrides separately.
    pub fn mirroring(&self) -> Mirroring {
        self.header.mirroring
    }

    pub fn has_battery_ram(&self) -> bool {
        self.header.has_prg_ram
    }
}
