//! Slotted-page B-tree node and tree algorithms: search, insert with node
//! splitting, delete with rotation and merging.

pub mod node;

pub use node::Node;
