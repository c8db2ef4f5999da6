//! # LibraDB
//!
//! An embeddable, single-file key-value store organized as a forest of
//! B-trees. Each named *collection* is a B-tree keyed by byte-strings; a
//! hidden root collection maps collection names to the page numbers of
//! their roots. Access is transactional with single-writer / multi-reader
//! isolation, and the meta-page switch on commit is the atomicity point.
//!
//! ## Quick Start
//!
//! ```no_run
//! use libra_core::api::Db;
//! use libra_core::types::Options;
//!
//! # fn main() -> libra_core::error::Result<()> {
//! let db = Db::open("libra.db", Options::default())?;
//!
//! let mut tx = db.write_tx();
//! let mut collection = tx.create_collection(b"users")?;
//! collection.put(&mut tx, b"alice", b"30")?;
//! tx.commit()?;
//!
//! let tx = db.read_tx();
//! let collection = tx.get_collection(b"users")?.expect("created above");
//! let item = collection.find(&tx, b"alice")?;
//! assert_eq!(item.map(|i| i.value), Some(b"30".to_vec()));
//! tx.commit()?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod btree;
pub mod collection;
pub mod error;
pub mod storage;
pub mod types;
