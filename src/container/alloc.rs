use byteorder::{ByteOrder, LittleEndian};

use super::header::{END_OF_CHAIN, MAX_REGULAR_SECTOR};
use crate::error::ContainerError;

/// A sector allocation table (FAT or mini FAT): entry `n` holds the sector
/// that follows sector `n` in its chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationTable {
    entries: Vec<u32>,
}

impl AllocationTable {
    pub fn new(entries: Vec<u32>) -> Self {
        Self { entries }
    }

    /// Builds a table from the concatenated bytes of its sectors.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut entries = vec![0u32; bytes.len() / 4];
        LittleEndian::read_u32_into(&bytes[..entries.len() * 4], &mut entries);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Follows the chain starting at `start` until `END_OF_CHAIN`.
    ///
    /// Fails on an index outside the table, a special marker in the middle of
    /// the chain, or a revisited sector.
    pub fn chain(&self, start: u32) -> Result<Vec<u32>, ContainerError> {
        let mut chain = Vec::new();
        let mut visited = vec![false; self.entries.len()];
        let mut current = start;

        while current != END_OF_CHAIN {
            if current > MAX_REGULAR_SECTOR || current as usize >= self.entries.len() {
                return Err(ContainerError::SectorOutOfRange {
                    sector: current,
                    sector_count: self.entries.len() as u32,
                });
            }
            if visited[current as usize] {
                return Err(ContainerError::ChainCycle { start });
            }
            visited[current as usize] = true;
            chain.push(current);
            current = self.entries[current as usize];
        }

        Ok(chain)
    }
}
