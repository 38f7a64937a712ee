use byteorder::{ByteOrder, LittleEndian};

use crate::error::ContainerError;

pub const ENTRY_LEN: usize = 128;
pub const NO_STREAM: u32 = 0xFFFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Unused,
    Storage,
    Stream,
    Root,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
    pub left: u32,
    pub right: u32,
    pub child: u32,
    pub start_sector: u32,
    pub size: u64,
}

impl DirEntry {
    /// Parses one 128-byte entry. Version 3 files only use the low half of the size.
    pub fn parse(index: u32, bytes: &[u8], major_version: u16) -> Result<Self, ContainerError> {
        let kind = match bytes[66] {
            0 => EntryKind::Unused,
            1 => EntryKind::Storage,
            2 => EntryKind::Stream,
            5 => EntryKind::Root,
            other => {
                return Err(ContainerError::invalid_directory_entry(
                    index,
                    format!("unknown object type {other}"),
                ))
            }
        };

        let name_len = LittleEndian::read_u16(&bytes[64..66]) as usize;
        let name = if kind == EntryKind::Unused || name_len == 0 {
            String::new()
        } else {
            if name_len > 64 || name_len % 2 != 0 {
                return Err(ContainerError::invalid_directory_entry(
                    index,
                    format!("name length {name_len}"),
                ));
            }
            let mut units = vec![0u16; name_len / 2];
            LittleEndian::read_u16_into(&bytes[..name_len], &mut units);
            let units = units.into_iter().take_while(|&u| u != 0);
            char::decode_utf16(units)
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
        };

        let raw_size = LittleEndian::read_u64(&bytes[120..128]);
        let size = if major_version == 3 {
            raw_size & 0xFFFF_FFFF
        } else {
            raw_size
        };

        Ok(Self {
            name,
            kind,
            left: LittleEndian::read_u32(&bytes[68..72]),
            right: LittleEndian::read_u32(&bytes[72..76]),
            child: LittleEndian::read_u32(&bytes[76..80]),
            start_sector: LittleEndian::read_u32(&bytes[116..120]),
            size,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Directory {
    entries: Vec<DirEntry>,
}

impl Directory {
    pub fn parse(bytes: &[u8], major_version: u16) -> Result<Self, ContainerError> {
        let entries = bytes
            .chunks_exact(ENTRY_LEN)
            .enumerate()
            .map(|(i, chunk)| DirEntry::parse(i as u32, chunk, major_version))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    pub fn root(&self) -> Result<&DirEntry, ContainerError> {
        self.entries
            .first()
            .filter(|e| e.kind == EntryKind::Root)
            .ok_or(ContainerError::MissingRootStorage)
    }

    /// Finds a stream among the direct children of the root storage.
    /// Names compare case-insensitively.
    pub fn find_root_stream(&self, name: &str) -> Result<&DirEntry, ContainerError> {
        let root = self.root()?;
        let mut visited = vec![false; self.entries.len()];
        let mut pending = vec![root.child];

        while let Some(id) = pending.pop() {
            if id == NO_STREAM {
                continue;
            }
            let entry = self.entries.get(id as usize).ok_or_else(|| {
                ContainerError::invalid_directory_entry(id, "sibling link out of range")
            })?;
            if std::mem::replace(&mut visited[id as usize], true) {
                return Err(ContainerError::invalid_directory_entry(
                    id,
                    "sibling tree is cyclic",
                ));
            }
            if entry.kind == EntryKind::Stream && entry.name.eq_ignore_ascii_case(name) {
                return Ok(entry);
            }
            pending.push(entry.left);
            pending.push(entry.right);
        }

        Err(ContainerError::stream_not_found(name))
    }
}
