#![forbid(unsafe_code)]
//! A persistent AVL tree map. See the map module for details.

pub(crate) mod avl;
pub mod comparator;
pub mod error;
pub mod map;

pub use comparator::{Ascending, Comparator, Descending, FnComparator};
pub use error::NoSuchElement;
pub use map::AvlTree;
