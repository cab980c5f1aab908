use std::fmt;

/// Returned when the first or last element of an empty tree is
/// requested.
///
/// # Examples
/// ```
/// use immutable_avltree::{AvlTree, NoSuchElement};
///
/// let t: AvlTree<i32, i32> = AvlTree::new();
/// assert_eq!(t.remove_first().err(), Some(NoSuchElement));
/// assert_eq!(format!("{}", NoSuchElement), "no such element: the tree is empty");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoSuchElement;

impl fmt::Display for NoSuchElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no such element: the tree is empty")
    }
}

impl std::error::Error for NoSuchElement {}

pub type Result<T> = std::result::Result<T, NoSuchElement>;
