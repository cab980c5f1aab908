//! Orderings used to place keys in a tree.
//!
//! A tree never compares keys any way other than through its
//! comparator, and `Ordering::Equal` always means "same key".
use std::{cmp::Ordering, fmt};

/// A total order over `K`.
pub trait Comparator<K: ?Sized> {
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// The natural order of `K`. This is the default comparator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Ascending;

impl<K: Ord + ?Sized> Comparator<K> for Ascending {
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// The reverse of the natural order of `K`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Descending;

impl<K: Ord + ?Sized> Comparator<K> for Descending {
    fn compare(&self, a: &K, b: &K) -> Ordering {
        b.cmp(a)
    }
}

/// Use any `Fn(&K, &K) -> Ordering` as a comparator.
///
/// # Examples
/// ```
/// use immutable_avltree::{AvlTree, FnComparator};
///
/// let by_len = FnComparator(|a: &&str, b: &&str| a.len().cmp(&b.len()));
/// let t = AvlTree::with_comparator(by_len)
///     .put("ccc", 3)
///     .put("a", 1)
///     .put("bb", 2);
///
/// assert_eq!(t.keys().copied().collect::<Vec<_>>(), vec!["a", "bb", "ccc"]);
/// ```
#[derive(Clone, Copy)]
pub struct FnComparator<F>(pub F);

impl<K: ?Sized, F> Comparator<K> for FnComparator<F>
where
    F: Fn(&K, &K) -> Ordering,
{
    fn compare(&self, a: &K, b: &K) -> Ordering {
        (self.0)(a, b)
    }
}

impl<F> fmt::Debug for FnComparator<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("FnComparator")
    }
}
