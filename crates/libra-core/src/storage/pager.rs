use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::Path;

use crate::error::StorageError;
use crate::types::PageId;

/// A fixed-size page buffer together with the page number it belongs to.
///
/// `allocate_empty_page` returns pages with `num == 0`; the caller assigns
/// the real number before writing (page 0 itself is only ever written
/// through the meta path).
pub struct Page {
    pub num: PageId,
    pub data: Vec<u8>,
}

/// Low-level page I/O over the database file.
///
/// Reads and writes whole pages at `num * page_size` using `pread`/`pwrite`
/// (`FileExt::read_exact_at` / `write_all_at`), so no seek state is kept.
/// There is no caching beyond the OS page cache; every read hits the file.
pub struct Pager {
    file: File,
    page_size: usize,
}

impl Pager {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path, page_size: usize) -> Result<Self, StorageError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        Ok(Self { file, page_size })
    }

    /// The page size every read and write uses.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// A zero-filled page buffer with no page number assigned.
    pub fn allocate_empty_page(&self) -> Page {
        Page {
            num: 0,
            data: vec![0u8; self.page_size],
        }
    }

    /// Read the full page `num` from disk.
    pub fn read_page(&self, num: PageId) -> Result<Page, StorageError> {
        let mut page = self.allocate_empty_page();
        page.num = num;
        let offset = num * self.page_size as u64;
        self.file.read_exact_at(&mut page.data, offset)?;
        Ok(page)
    }

    /// Write the full page to disk at its assigned number.
    pub fn write_page(&self, page: &Page) -> Result<(), StorageError> {
        let offset = page.num * self.page_size as u64;
        self.file.write_all_at(&page.data, offset)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const TEST_PAGE_SIZE: usize = 4096;

    #[test]
    fn test_write_and_read_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let pager = Pager::open(&path, TEST_PAGE_SIZE).unwrap();

        let mut page = pager.allocate_empty_page();
        page.num = 3;
        page.data[0..5].copy_from_slice(b"hello");
        pager.write_page(&page).unwrap();

        let read_back = pager.read_page(3).unwrap();
        assert_eq!(&read_back.data[0..5], b"hello");
        assert_eq!(read_back.data.len(), TEST_PAGE_SIZE);
    }

    #[test]
    fn test_intermediate_pages_read_zeroed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let pager = Pager::open(&path, TEST_PAGE_SIZE).unwrap();

        let mut page = pager.allocate_empty_page();
        page.num = 2;
        page.data[10] = 0xAB;
        pager.write_page(&page).unwrap();

        // Pages 0 and 1 were never written but sit below EOF.
        let hole = pager.read_page(1).unwrap();
        assert!(hole.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_read_past_eof_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let pager = Pager::open(&path, TEST_PAGE_SIZE).unwrap();

        assert!(pager.read_page(7).is_err());
    }

    #[test]
    fn test_allocate_empty_page_is_zeroed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let pager = Pager::open(&path, TEST_PAGE_SIZE).unwrap();

        let page = pager.allocate_empty_page();
        assert_eq!(page.num, 0);
        assert_eq!(page.data, vec![0u8; TEST_PAGE_SIZE]);
    }
}
