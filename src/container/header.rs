use byteorder::{ByteOrder, LittleEndian};

use crate::error::ContainerError;

pub const SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
pub const HEADER_LEN: usize = 512;
pub const HEADER_DIFAT_LEN: usize = 109;

pub const MAX_REGULAR_SECTOR: u32 = 0xFFFF_FFFA;
pub const END_OF_CHAIN: u32 = 0xFFFF_FFFE;
pub const FREE_SECTOR: u32 = 0xFFFF_FFFF;

const BYTE_ORDER_MARK: u16 = 0xFFFE;
const MINI_SECTOR_SHIFT: u16 = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub major_version: u16,
    pub sector_shift: u16,
    pub mini_sector_shift: u16,
    pub fat_sector_count: u32,
    pub first_directory_sector: u32,
    pub mini_stream_cutoff: u32,
    pub first_mini_fat_sector: u32,
    pub mini_fat_sector_count: u32,
    pub first_difat_sector: u32,
    pub difat_sector_count: u32,
    pub difat: Vec<u32>,
}

impl Header {
    pub fn parse(bytes: &[u8]) -> Result<Self, ContainerError> {
        if bytes.len() < HEADER_LEN {
            return Err(ContainerError::HeaderTooShort { len: bytes.len() });
        }
        if bytes[..8] != SIGNATURE {
            return Err(ContainerError::InvalidSignature);
        }

        let u16_at = |offset: usize| LittleEndian::read_u16(&bytes[offset..offset + 2]);
        let u32_at = |offset: usize| LittleEndian::read_u32(&bytes[offset..offset + 4]);

        if u16_at(28) != BYTE_ORDER_MARK {
            return Err(ContainerError::unsupported_layout("byte order mark is not 0xFFFE"));
        }

        let major_version = u16_at(26);
        let sector_shift = u16_at(30);
        match (major_version, sector_shift) {
            (3, 9) | (4, 12) => {}
            _ => {
                return Err(ContainerError::unsupported_layout(format!(
                    "version {major_version} with sector shift {sector_shift}"
                )))
            }
        }

        let mini_sector_shift = u16_at(32);
        if mini_sector_shift != MINI_SECTOR_SHIFT {
            return Err(ContainerError::unsupported_layout(format!(
                "mini sector shift {mini_sector_shift}"
            )));
        }

        let mut difat = vec![0u32; HEADER_DIFAT_LEN];
        LittleEndian::read_u32_into(&bytes[76..76 + HEADER_DIFAT_LEN * 4], &mut difat);

        Ok(Self {
            major_version,
            sector_shift,
            mini_sector_shift,
            fat_sector_count: u32_at(44),
            first_directory_sector: u32_at(48),
            mini_stream_cutoff: u32_at(56),
            first_mini_fat_sector: u32_at(60),
            mini_fat_sector_count: u32_at(64),
            first_difat_sector: u32_at(68),
            difat_sector_count: u32_at(72),
            difat,
        })
    }

    pub fn sector_size(&self) -> usize {
        1 << self.sector_shift
    }

    pub fn mini_sector_size(&self) -> usize {
        1 << self.mini_sector_shift
    }
}
