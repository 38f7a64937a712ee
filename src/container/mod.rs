//! Read-only decoder for compound (structured storage) containers.
//!
//! Test definitions (`Test.tsp`) and action resources (`resource.mtr`) are
//! sector-based containers whose `ComponentInfo` stream holds UTF-16LE XML.
//! All table resolution works on an in-memory byte buffer so it can be
//! exercised against crafted fixtures.

pub mod alloc;
pub mod directory;
pub mod header;

use byteorder::{ByteOrder, LittleEndian};
use std::fs;
use std::path::Path;
use tracing::{debug, trace};

use crate::config::COMPONENT_INFO_STREAM;
use crate::error::ContainerError;
use alloc::AllocationTable;
use directory::{DirEntry, Directory};
use header::{Header, END_OF_CHAIN, FREE_SECTOR};

#[derive(Debug)]
pub struct Container {
    data: Vec<u8>,
    header: Header,
    fat: AllocationTable,
    mini_fat: AllocationTable,
    directory: Directory,
    mini_stream: Vec<u8>,
}

impl Container {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ContainerError> {
        let path = path.as_ref();
        trace!(path = %path.display(), "opening container");
        let data = fs::read(path).map_err(|e| ContainerError::open(path, e))?;
        Self::from_bytes(data)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self, ContainerError> {
        let header = Header::parse(&data)?;
        let mut container = Self {
            data,
            header,
            fat: AllocationTable::default(),
            mini_fat: AllocationTable::default(),
            directory: Directory::default(),
            mini_stream: Vec::new(),
        };

        let fat_sectors = container.fat_sector_ids()?;
        container.fat = AllocationTable::from_bytes(&container.read_sectors(&fat_sectors)?);

        let dir_chain = container.fat.chain(container.header.first_directory_sector)?;
        let dir_bytes = container.read_sectors(&dir_chain)?;
        container.directory = Directory::parse(&dir_bytes, container.header.major_version)?;

        if container.header.mini_fat_sector_count > 0
            && container.header.first_mini_fat_sector != END_OF_CHAIN
        {
            let chain = container.fat.chain(container.header.first_mini_fat_sector)?;
            container.mini_fat = AllocationTable::from_bytes(&container.read_sectors(&chain)?);
        }

        let root = container.directory.root()?.clone();
        if root.size > 0 {
            container.mini_stream = container.read_regular(&root)?;
        }

        debug!(
            sector_size = container.header.sector_size(),
            fat_entries = container.fat.len(),
            mini_fat_entries = container.mini_fat.len(),
            "container loaded"
        );
        Ok(container)
    }

    /// Returns the bytes of a stream directly under the root storage.
    pub fn stream(&self, name: &str) -> Result<Vec<u8>, ContainerError> {
        let entry = self.directory.find_root_stream(name)?;
        if entry.size == 0 {
            return Ok(Vec::new());
        }
        if entry.size < u64::from(self.header.mini_stream_cutoff) {
            self.read_mini(entry)
        } else {
            self.read_regular(entry)
        }
    }

    fn sector_count(&self) -> u32 {
        let sector_size = self.header.sector_size();
        (self.data.len().saturating_sub(sector_size)).div_ceil(sector_size) as u32
    }

    /// Sector ids of the FAT, from the header DIFAT and any DIFAT sectors.
    fn fat_sector_ids(&self) -> Result<Vec<u32>, ContainerError> {
        let wanted = self.header.fat_sector_count as usize;
        let mut ids: Vec<u32> = self
            .header
            .difat
            .iter()
            .copied()
            .filter(|&id| id != FREE_SECTOR)
            .take(wanted)
            .collect();

        let per_sector = self.header.sector_size() / 4 - 1;
        let mut next = self.header.first_difat_sector;
        let mut remaining = self.header.difat_sector_count;
        while ids.len() < wanted && next != END_OF_CHAIN && next != FREE_SECTOR {
            if remaining == 0 {
                return Err(ContainerError::unsupported_layout(
                    "DIFAT chain longer than declared",
                ));
            }
            remaining -= 1;

            let sector = self.sector(next)?;
            let mut entries = vec![0u32; per_sector + 1];
            LittleEndian::read_u32_into(sector, &mut entries);
            next = entries[per_sector];
            ids.extend(
                entries[..per_sector]
                    .iter()
                    .copied()
                    .filter(|&id| id != FREE_SECTOR)
                    .take(wanted - ids.len()),
            );
        }

        if ids.len() < wanted {
            return Err(ContainerError::unsupported_layout(format!(
                "expected {wanted} FAT sectors, found {}",
                ids.len()
            )));
        }
        Ok(ids)
    }

    fn sector(&self, id: u32) -> Result<&[u8], ContainerError> {
        let sector_size = self.header.sector_size();
        let start = (id as usize + 1) * sector_size;
        self.data
            .get(start..start + sector_size)
            .ok_or_else(|| ContainerError::SectorOutOfRange {
                sector: id,
                sector_count: self.sector_count(),
            })
    }

    fn read_sectors(&self, ids: &[u32]) -> Result<Vec<u8>, ContainerError> {
        let mut out = Vec::with_capacity(ids.len() * self.header.sector_size());
        for &id in ids {
            out.extend_from_slice(self.sector(id)?);
        }
        Ok(out)
    }

    fn read_regular(&self, entry: &DirEntry) -> Result<Vec<u8>, ContainerError> {
        let chain = self.fat.chain(entry.start_sector)?;
        let needed = sectors_needed(entry.size, self.header.sector_size());
        check_chain_len(entry, chain.len(), needed, self.header.sector_size())?;
        let mut bytes = self.read_sectors(&chain[..needed])?;
        bytes.truncate(entry.size as usize);
        Ok(bytes)
    }

    fn read_mini(&self, entry: &DirEntry) -> Result<Vec<u8>, ContainerError> {
        let mini_size = self.header.mini_sector_size();
        let chain = self.mini_fat.chain(entry.start_sector)?;
        let needed = sectors_needed(entry.size, mini_size);
        check_chain_len(entry, chain.len(), needed, mini_size)?;

        let mut bytes = Vec::with_capacity(needed * mini_size);
        for &id in &chain[..needed] {
            let start = id as usize * mini_size;
            let end = (start + mini_size).min(self.mini_stream.len());
            let sector = self
                .mini_stream
                .get(start..end)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| ContainerError::SectorOutOfRange {
                    sector: id,
                    sector_count: self.mini_stream.len().div_ceil(mini_size) as u32,
                })?;
            bytes.extend_from_slice(sector);
        }
        if (bytes.len() as u64) < entry.size {
            return Err(ContainerError::truncated_stream(
                &entry.name,
                entry.size,
                bytes.len() as u64,
            ));
        }
        bytes.truncate(entry.size as usize);
        Ok(bytes)
    }
}

fn sectors_needed(size: u64, sector_size: usize) -> usize {
    size.div_ceil(sector_size as u64) as usize
}

fn check_chain_len(
    entry: &DirEntry,
    chain_len: usize,
    needed: usize,
    sector_size: usize,
) -> Result<(), ContainerError> {
    if chain_len < needed {
        return Err(ContainerError::truncated_stream(
            &entry.name,
            entry.size,
            (chain_len * sector_size) as u64,
        ));
    }
    Ok(())
}

/// Decodes a UTF-16LE stream payload and returns the text from the first `<`.
///
/// Null code units are dropped. Returns an empty string when no markup is present.
pub fn extract_xml(payload: &[u8]) -> String {
    let mut units = vec![0u16; payload.len() / 2];
    LittleEndian::read_u16_into(&payload[..units.len() * 2], &mut units);
    let text: String = char::decode_utf16(units.into_iter().filter(|&u| u != 0))
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();

    match text.find('<') {
        Some(start) => text[start..].to_string(),
        None => String::new(),
    }
}

/// Opens a container file and returns the XML held in its `ComponentInfo` stream.
pub fn read_component_xml<P: AsRef<Path>>(path: P) -> Result<String, ContainerError> {
    let container = Container::open(path)?;
    let payload = container.stream(COMPONENT_INFO_STREAM)?;
    Ok(extract_xml(&payload))
}
