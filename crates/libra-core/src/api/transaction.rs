use std::collections::HashMap;

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace};

use crate::api::database::DbState;
use crate::btree::node::Node;
use crate::collection::Collection;
use crate::error::{Result, TxError};
use crate::storage::meta::Meta;
use crate::types::{Item, META_PAGE_NUM, NODE_HEADER_SIZE, Options, PageId};

/// The database lock held for the lifetime of a transaction. A write
/// transaction owns the state exclusively; read transactions share it.
pub(crate) enum TxLock<'db> {
    Read(RwLockReadGuard<'db, DbState>),
    Write(RwLockWriteGuard<'db, DbState>),
}

/// A transaction over the database.
///
/// Obtained from [`crate::api::database::Db::read_tx`] or
/// [`crate::api::database::Db::write_tx`]; the underlying reader/writer lock
/// is held until [`Tx::commit`], [`Tx::rollback`], or drop.
///
/// A write transaction stages every modified node in an in-memory dirty
/// buffer and tracks page allocations and pending releases. Nothing reaches
/// the freelist or the meta page until commit, and the meta-page write is
/// the commit point: a commit that fails earlier leaves the database in its
/// last-committed state.
///
/// Dropping a write transaction without committing rolls it back.
pub struct Tx<'db> {
    lock: TxLock<'db>,
    dirty_nodes: HashMap<PageId, Node>,
    pages_to_delete: Vec<PageId>,
    allocated_page_nums: Vec<PageId>,
    /// Snapshot of the root collection's root page, taken at start. Write
    /// transactions move it when the root collection's tree root moves;
    /// commit publishes it through the meta page.
    root: PageId,
    page_size: usize,
    min_fill_percent: f32,
    max_fill_percent: f32,
    done: bool,
}

impl<'db> Tx<'db> {
    pub(crate) fn new(lock: TxLock<'db>, page_size: usize, options: Options) -> Self {
        let root = match &lock {
            TxLock::Read(state) => state.meta.root,
            TxLock::Write(state) => state.meta.root,
        };
        Self {
            lock,
            dirty_nodes: HashMap::new(),
            pages_to_delete: Vec::new(),
            allocated_page_nums: Vec::new(),
            root,
            page_size,
            min_fill_percent: options.min_fill_percent,
            max_fill_percent: options.max_fill_percent,
            done: false,
        }
    }

    fn state(&self) -> &DbState {
        match &self.lock {
            TxLock::Read(state) => state,
            TxLock::Write(state) => state,
        }
    }

    /// Fail with [`TxError::WriteInsideReadTx`] unless this is a write
    /// transaction.
    pub(crate) fn require_write(&self) -> Result<()> {
        match self.lock {
            TxLock::Write(_) => Ok(()),
            TxLock::Read(_) => Err(TxError::WriteInsideReadTx.into()),
        }
    }

    /// Fetch a node: from the dirty buffer if this transaction already
    /// touched it, otherwise from disk. This is the only read path.
    pub(crate) fn get_node(&self, page_num: PageId) -> Result<Node> {
        if let Some(node) = self.dirty_nodes.get(&page_num) {
            return Ok(node.clone());
        }
        let page = self.state().pager.read_page(page_num)?;
        let mut node = Node::deserialize(&page.data);
        node.page_num = page_num;
        Ok(node)
    }

    /// Stage a node in the dirty buffer. Nothing is flushed to disk here.
    pub(crate) fn write_node(&mut self, node: Node) {
        self.dirty_nodes.insert(node.page_num, node);
    }

    /// Construct a node on a freshly allocated page. The allocation is
    /// recorded so rollback can return it to the freelist.
    pub(crate) fn new_node(&mut self, items: Vec<Item>, child_nodes: Vec<PageId>) -> Result<Node> {
        let page_num = match &mut self.lock {
            TxLock::Write(state) => state.freelist.next_page(),
            TxLock::Read(_) => return Err(TxError::WriteInsideReadTx.into()),
        };
        let mut node = Node::new(items, child_nodes);
        node.page_num = page_num;
        self.allocated_page_nums.push(page_num);
        Ok(node)
    }

    /// Queue a node's page for release on commit. The freelist is not
    /// touched until then.
    pub(crate) fn delete_node(&mut self, node: &Node) {
        self.pages_to_delete.push(node.page_num);
    }

    fn min_threshold(&self) -> f32 {
        self.min_fill_percent * self.page_size as f32
    }

    fn max_threshold(&self) -> f32 {
        self.max_fill_percent * self.page_size as f32
    }

    pub(crate) fn is_over_populated(&self, node: &Node) -> bool {
        node.node_size() as f32 > self.max_threshold()
    }

    pub(crate) fn is_under_populated(&self, node: &Node) -> bool {
        (node.node_size() as f32) < self.min_threshold()
    }

    /// The index at which to split `node`: one past the first item where the
    /// accumulated size clears the minimum threshold. `None` means the node
    /// is too small to give anything away.
    pub(crate) fn get_split_index(&self, node: &Node) -> Option<usize> {
        let mut size = NODE_HEADER_SIZE;
        for i in 0..node.items.len() {
            size += node.element_size(i);
            if size as f32 > self.min_threshold() && i < node.items.len() - 1 {
                return Some(i + 1);
            }
        }
        None
    }

    /// Whether `node` would still clear the minimum threshold after
    /// donating one element.
    pub(crate) fn can_spare_an_element(&self, node: &Node) -> bool {
        self.get_split_index(node).is_some()
    }

    /// A handle to the hidden root collection, whose items map collection
    /// names to their metadata records.
    fn root_collection(&self) -> Collection {
        Collection::new(Vec::new(), self.root)
    }

    /// Create a collection: allocate an empty root node for it and store its
    /// metadata record in the root collection.
    pub fn create_collection(&mut self, name: &[u8]) -> Result<Collection> {
        self.require_write()?;

        let node = self.new_node(Vec::new(), Vec::new())?;
        let collection_root = node.page_num;
        self.write_node(node);

        let collection = Collection::new(name.to_vec(), collection_root);
        let record = collection.serialize();

        let mut root_collection = self.root_collection();
        root_collection.put(self, name, &record.value)?;
        self.root = root_collection.root();

        Ok(collection)
    }

    /// Look up a collection by name. Returns `None` if it does not exist.
    pub fn get_collection(&self, name: &[u8]) -> Result<Option<Collection>> {
        let root_collection = self.root_collection();
        let Some(item) = root_collection.find(self, name)? else {
            return Ok(None);
        };
        Ok(Some(Collection::deserialize(&item)?))
    }

    /// Remove a collection's record from the root collection. The
    /// collection's data pages are not reclaimed.
    pub fn delete_collection(&mut self, name: &[u8]) -> Result<()> {
        self.require_write()?;

        let mut root_collection = self.root_collection();
        root_collection.remove(self, name)?;
        self.root = root_collection.root();
        Ok(())
    }

    /// Commit the transaction.
    ///
    /// For a write transaction: flush dirty nodes, fold pending releases
    /// into the freelist, rewrite the freelist on a fresh page, and finally
    /// rewrite the meta page to publish the new state. For a read
    /// transaction this only releases the shared lock.
    pub fn commit(mut self) -> Result<()> {
        let state = match &mut self.lock {
            TxLock::Read(_) => {
                self.done = true;
                return Ok(());
            }
            TxLock::Write(state) => &mut **state,
        };

        trace!(
            dirty = self.dirty_nodes.len(),
            pending_release = self.pages_to_delete.len(),
            "committing write transaction"
        );

        for node in self.dirty_nodes.values() {
            let mut page = state.pager.allocate_empty_page();
            page.num = node.page_num;
            node.serialize(&mut page.data);
            state.pager.write_page(&page)?;
        }

        for &page_num in &self.pages_to_delete {
            state.freelist.release_page(page_num);
        }

        // The freelist moves to a fresh page each commit; the previous one
        // is returned to the pool. Page 0 is the meta page and is never
        // released.
        if state.meta.freelist_page != META_PAGE_NUM {
            state.freelist.release_page(state.meta.freelist_page);
        }
        let freelist_page = state.freelist.next_page();
        let mut page = state.pager.allocate_empty_page();
        page.num = freelist_page;
        state.freelist.serialize(&mut page.data);
        state.pager.write_page(&page)?;

        // The meta-page write is the commit point.
        let meta = Meta {
            root: self.root,
            freelist_page,
        };
        let mut page = state.pager.allocate_empty_page();
        page.num = META_PAGE_NUM;
        meta.serialize(&mut page.data);
        state.pager.write_page(&page)?;
        state.meta = meta;

        debug!(root = meta.root, freelist_page, "write transaction committed");
        self.done = true;
        Ok(())
    }

    /// Abandon the transaction: drop the dirty buffer and the pending
    /// releases, and return every page allocated by this transaction to the
    /// freelist. Pages already written to disk stay there but are
    /// unreachable, because the meta page was never switched.
    pub fn rollback(mut self) {
        self.release_allocations();
        self.done = true;
    }

    fn release_allocations(&mut self) {
        if let TxLock::Write(state) = &mut self.lock {
            let returned = self.allocated_page_nums.len();
            for page_num in self.allocated_page_nums.drain(..) {
                state.freelist.release_page(page_num);
            }
            if returned > 0 {
                debug!(returned, "write transaction rolled back");
            }
        }
    }
}

impl Drop for Tx<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.release_allocations();
        }
    }
}
