use std::path::Path;

use parking_lot::RwLock;
use tracing::debug;

use crate::api::transaction::{Tx, TxLock};
use crate::btree::node::Node;
use crate::error::Result;
use crate::storage::freelist::Freelist;
use crate::storage::meta::Meta;
use crate::storage::pager::Pager;
use crate::types::{META_PAGE_NUM, Options};

/// Everything a transaction needs exclusive or shared access to: the file,
/// the page allocator, and the current meta page.
pub(crate) struct DbState {
    pub(crate) pager: Pager,
    pub(crate) freelist: Freelist,
    pub(crate) meta: Meta,
}

/// The database handle.
///
/// Owns the file and hands out transactions; one writer or any number of
/// readers may be active at a time.
pub struct Db {
    pub(crate) state: RwLock<DbState>,
    page_size: usize,
    options: Options,
}

impl Db {
    /// Open the database at `path`, creating the file if it does not exist.
    ///
    /// The page size is the OS page size at open time; reopening a file
    /// requires the same page size it was created with.
    ///
    /// # Panics
    ///
    /// Panics if the file exists but is not a LibraDB file (bad magic).
    pub fn open(path: impl AsRef<Path>, options: Options) -> Result<Self> {
        Self::open_with_page_size(path, options, page_size::get())
    }

    pub(crate) fn open_with_page_size(
        path: impl AsRef<Path>,
        options: Options,
        page_size: usize,
    ) -> Result<Self> {
        let path = path.as_ref();
        let exists = path.exists();
        let pager = Pager::open(path, page_size)?;

        let (freelist, meta) = if exists {
            let meta_page = pager.read_page(META_PAGE_NUM)?;
            let meta = Meta::deserialize(&meta_page.data);

            let freelist_page = pager.read_page(meta.freelist_page)?;
            let freelist = Freelist::deserialize(&freelist_page.data);

            debug!(path = %path.display(), page_size, root = meta.root, "opened database");
            (freelist, meta)
        } else {
            Self::initialize(&pager, path)?
        };

        Ok(Self {
            state: RwLock::new(DbState {
                pager,
                freelist,
                meta,
            }),
            page_size,
            options,
        })
    }

    /// Lay out a fresh file: an empty root-collection leaf, the freelist,
    /// and finally the meta page pointing at both.
    fn initialize(pager: &Pager, path: &Path) -> Result<(Freelist, Meta)> {
        let mut freelist = Freelist::new();
        let freelist_page_num = freelist.next_page();
        let root_page_num = freelist.next_page();

        let mut page = pager.allocate_empty_page();
        page.num = root_page_num;
        Node::new(Vec::new(), Vec::new()).serialize(&mut page.data);
        pager.write_page(&page)?;

        // Serialized after both allocations, so the stored high-water mark
        // covers the root page.
        let mut page = pager.allocate_empty_page();
        page.num = freelist_page_num;
        freelist.serialize(&mut page.data);
        pager.write_page(&page)?;

        let meta = Meta {
            root: root_page_num,
            freelist_page: freelist_page_num,
        };
        let mut page = pager.allocate_empty_page();
        page.num = META_PAGE_NUM;
        meta.serialize(&mut page.data);
        pager.write_page(&page)?;

        debug!(path = %path.display(), page_size = pager.page_size(), "created database");
        Ok((freelist, meta))
    }

    /// Begin a read transaction. Blocks while a writer holds the lock.
    pub fn read_tx(&self) -> Tx<'_> {
        Tx::new(TxLock::Read(self.state.read()), self.page_size, self.options)
    }

    /// Begin a write transaction. Blocks until neither readers nor another
    /// writer hold the lock.
    pub fn write_tx(&self) -> Tx<'_> {
        Tx::new(
            TxLock::Write(self.state.write()),
            self.page_size,
            self.options,
        )
    }

    /// Close the database. Consumes the handle; dropping it has the same
    /// effect.
    pub fn close(self) {
        debug!("database closed");
    }
}
