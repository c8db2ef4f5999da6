//! A named B-tree rooted at one page.

use crate::api::transaction::Tx;
use crate::btree::node;
use crate::error::{Result, StorageError};
use crate::types::{
    COLLECTION_RECORD_SIZE, Item, MAX_KEY_SIZE, MAX_VALUE_SIZE, PAGE_NUM_SIZE, PageId,
};

/// A collection: a B-tree keyed by byte-strings.
///
/// The handle carries the collection's name, the page number of its tree
/// root, and a monotonic counter reserved for user-generated IDs. All
/// operations take the transaction explicitly; a collection handle obtained
/// from one transaction must not be reused with another.
#[derive(Debug, Clone)]
pub struct Collection {
    name: Vec<u8>,
    root: PageId,
    counter: u64,
}

impl Collection {
    pub(crate) fn new(name: Vec<u8>, root: PageId) -> Self {
        Self {
            name,
            root,
            counter: 0,
        }
    }

    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub(crate) fn root(&self) -> PageId {
        self.root
    }

    /// Hand out the next ID from the collection's counter.
    ///
    /// The counter is not persisted unless the collection record is written
    /// again, so IDs are only unique within the handle's lifetime.
    pub fn id(&mut self) -> u64 {
        let id = self.counter;
        self.counter += 1;
        id
    }

    /// Insert `value` under `key`, replacing any existing value.
    pub fn put(&mut self, tx: &mut Tx<'_>, key: &[u8], value: &[u8]) -> Result<()> {
        tx.require_write()?;
        if key.len() > MAX_KEY_SIZE {
            return Err(StorageError::KeyTooLarge {
                max: MAX_KEY_SIZE,
                actual: key.len(),
            }
            .into());
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(StorageError::ValueTooLarge {
                max: MAX_VALUE_SIZE,
                actual: value.len(),
            }
            .into());
        }

        let item = Item::new(key.to_vec(), value.to_vec());

        // On the first insertion the root node does not yet exist.
        if self.root == 0 {
            let root = tx.new_node(vec![item], Vec::new())?;
            self.root = root.page_num;
            tx.write_node(root);
            return Ok(());
        }

        let node::SearchResult {
            mut node,
            index,
            found,
            breadcrumb,
        } = node::locate(tx, self.root, key)?;

        if found {
            node.items[index] = item;
        } else {
            node.add_item(item, index);
        }
        tx.write_node(node);

        // Split over-populated nodes along the search path, deepest first,
        // excluding the root.
        let path = self.node_path(tx, &breadcrumb)?;
        for i in (0..path.len().saturating_sub(1)).rev() {
            let mut child = tx.get_node(path[i + 1])?;
            if tx.is_over_populated(&child) {
                let mut parent = tx.get_node(path[i])?;
                parent.split(tx, &mut child, breadcrumb[i + 1])?;
            }
        }

        // If the cascade left the root itself over-populated, grow the tree
        // by one level: a fresh root whose only child is the old root, then
        // split the old root through it.
        let root_node = tx.get_node(path[0])?;
        if tx.is_over_populated(&root_node) {
            let mut old_root = root_node;
            let mut new_root = tx.new_node(Vec::new(), vec![old_root.page_num])?;
            new_root.split(tx, &mut old_root, 0)?;
            self.root = new_root.page_num;
        }

        Ok(())
    }

    /// Look up `key`. Returns `None` if it is absent.
    pub fn find(&self, tx: &Tx<'_>, key: &[u8]) -> Result<Option<Item>> {
        if self.root == 0 {
            return Ok(None);
        }
        let Some(search) = node::lookup(tx, self.root, key)? else {
            return Ok(None);
        };
        Ok(Some(search.node.items[search.index].clone()))
    }

    /// Remove `key` from the tree. Removing an absent key is a no-op.
    pub fn remove(&mut self, tx: &mut Tx<'_>, key: &[u8]) -> Result<()> {
        tx.require_write()?;
        if self.root == 0 {
            return Ok(());
        }

        let Some(search) = node::lookup(tx, self.root, key)? else {
            return Ok(());
        };
        let node::SearchResult {
            mut node,
            index,
            mut breadcrumb,
            ..
        } = search;

        if node.is_leaf() {
            node.remove_item_from_leaf(tx, index);
        } else {
            let affected = node.remove_item_from_internal(tx, index)?;
            breadcrumb.extend(affected);
        }

        // Rebalance under-populated nodes along the affected path, deepest
        // first, excluding the root.
        let path = self.node_path(tx, &breadcrumb)?;
        for i in (0..path.len().saturating_sub(1)).rev() {
            let child = tx.get_node(path[i + 1])?;
            if tx.is_under_populated(&child) {
                let mut parent = tx.get_node(path[i])?;
                parent.rebalance_remove(tx, child, breadcrumb[i + 1])?;
            }
        }

        // The tree shrinks by one level when the root is left without items
        // but still has a child.
        let root_node = tx.get_node(path[0])?;
        if root_node.items.is_empty() && !root_node.child_nodes.is_empty() {
            self.root = root_node.child_nodes[0];
        }

        Ok(())
    }

    /// Materialize the page numbers along a breadcrumb, root first.
    fn node_path(&self, tx: &Tx<'_>, breadcrumb: &[usize]) -> Result<Vec<PageId>> {
        let mut pages = vec![self.root];
        let mut node = tx.get_node(self.root)?;
        for &index in &breadcrumb[1..] {
            let child_page = node.child_nodes[index];
            node = tx.get_node(child_page)?;
            pages.push(child_page);
        }
        Ok(pages)
    }

    /// The collection's metadata record as stored in the root collection:
    /// key = name, value = `[root: u64 LE][counter: u64 LE]`.
    pub(crate) fn serialize(&self) -> Item {
        let mut value = vec![0u8; COLLECTION_RECORD_SIZE];
        value[0..PAGE_NUM_SIZE].copy_from_slice(&self.root.to_le_bytes());
        value[PAGE_NUM_SIZE..COLLECTION_RECORD_SIZE].copy_from_slice(&self.counter.to_le_bytes());
        Item::new(self.name.clone(), value)
    }

    pub(crate) fn deserialize(item: &Item) -> Result<Self> {
        let mut collection = Self::new(item.key.clone(), 0);
        if item.value.is_empty() {
            return Ok(collection);
        }
        if item.value.len() != COLLECTION_RECORD_SIZE {
            return Err(StorageError::CorruptedRecord(format!(
                "expected {COLLECTION_RECORD_SIZE} bytes, got {}",
                item.value.len()
            ))
            .into());
        }
        collection.root = u64::from_le_bytes(item.value[0..PAGE_NUM_SIZE].try_into().unwrap());
        collection.counter = u64::from_le_bytes(
            item.value[PAGE_NUM_SIZE..COLLECTION_RECORD_SIZE]
                .try_into()
                .unwrap(),
        );
        Ok(collection)
    }
}
