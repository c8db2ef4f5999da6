use crate::types::{MAGIC, PAGE_NUM_SIZE, PageId};

/// The meta page: the single fixed entry point into the file.
///
/// Layout at offset 0 of page 0:
/// ```text
/// [0..4]   magic: 0xD00DB00D, u32 LE
/// [4..12]  root: u64 LE — page number of the root collection's root node
/// [12..20] freelist_page: u64 LE — page number holding the freelist
/// ```
///
/// Rewriting this page is the commit point: everything a transaction wrote
/// is unreachable until the meta page points at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meta {
    pub root: PageId,
    pub freelist_page: PageId,
}

impl Meta {
    pub fn new() -> Self {
        Self {
            root: 0,
            freelist_page: 0,
        }
    }

    pub fn serialize(&self, buf: &mut [u8]) {
        let mut pos = 0;
        buf[pos..pos + 4].copy_from_slice(&MAGIC.to_le_bytes());
        pos += 4;

        buf[pos..pos + PAGE_NUM_SIZE].copy_from_slice(&self.root.to_le_bytes());
        pos += PAGE_NUM_SIZE;

        buf[pos..pos + PAGE_NUM_SIZE].copy_from_slice(&self.freelist_page.to_le_bytes());
    }

    /// Parse a meta page.
    ///
    /// # Panics
    ///
    /// Panics if the magic number does not match: the file is not a LibraDB
    /// file (or is corrupt), which is not recoverable at the library level.
    pub fn deserialize(buf: &[u8]) -> Self {
        let mut pos = 0;
        let magic = u32::from_le_bytes(buf[pos..pos + 4].try_into().unwrap());
        pos += 4;

        if magic != MAGIC {
            panic!("the file is not a libra db file (bad magic: {magic:#010x})");
        }

        let root = u64::from_le_bytes(buf[pos..pos + PAGE_NUM_SIZE].try_into().unwrap());
        pos += PAGE_NUM_SIZE;

        let freelist_page = u64::from_le_bytes(buf[pos..pos + PAGE_NUM_SIZE].try_into().unwrap());

        Self {
            root,
            freelist_page,
        }
    }
}

impl Default for Meta {
    fn default() -> Self {
        Self::new()
    }
}
