use crate::{
    avl::{Entries, Tree},
    comparator::{Ascending, Comparator},
    error::{NoSuchElement, Result},
};
use std::{
    fmt::{self, Debug, Formatter},
    hash::{Hash, Hasher},
    iter::{FromIterator, FusedIterator},
    ops::Index,
    sync::Arc,
};

/// A persistent ordered map backed by an AVL tree.
///
/// Every operation that changes the map returns a new map and leaves
/// the old one untouched. The new map shares every subtree the change
/// did not touch with the old one, so a `put` or `remove` allocates
/// only the O(log(N)) nodes on the path to the changed key. Cloning is
/// O(1).
///
/// Keys are ordered by a [`Comparator`], by default [`Ascending`]. A
/// comparison returning `Ordering::Equal` means the two keys are the
/// same key.
///
/// Every node reachable from a map returned by any method other than
/// [`with_left`](AvlTree::with_left) and
/// [`with_right`](AvlTree::with_right) satisfies the AVL invariant:
/// the heights of its two subtrees differ by at most one.
///
/// # Examples
/// ```
/// use immutable_avltree::AvlTree;
///
/// let m = AvlTree::new().put(1, "one").put(2, "two").put(3, "three");
///
/// // a single left rotation made 2 the root
/// assert_eq!(m.root(), Some((&2, &"two")));
/// assert_eq!(m.height(), 2);
/// assert_eq!(m.balance(), 0);
///
/// let m2 = m.remove(&2);
/// assert_eq!(m.get(&2), Some(&"two"));
/// assert_eq!(m2.get(&2), None);
///
/// for (k, v) in &m2 {
///     println!("key {}, val: {}", k, v)
/// }
/// ```
pub struct AvlTree<K, V, C = Ascending> {
    root: Tree<K, V>,
    cmp: C,
}

impl<K, V, C: Clone> Clone for AvlTree<K, V, C> {
    fn clone(&self) -> Self {
        AvlTree {
            root: self.root.clone(),
            cmp: self.cmp.clone(),
        }
    }
}

impl<K, V, C> Default for AvlTree<K, V, C>
where
    C: Comparator<K> + Default + Clone,
{
    fn default() -> AvlTree<K, V, C> {
        AvlTree::with_comparator(C::default())
    }
}

impl<K, V, C> Debug for AvlTree<K, V, C>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.root.fmt(f)
    }
}

impl<K, V, C> PartialEq for AvlTree<K, V, C>
where
    K: PartialEq,
    V: PartialEq,
{
    fn eq(&self, other: &AvlTree<K, V, C>) -> bool {
        self.root.len() == other.root.len()
            && self
                .root
                .entries()
                .zip(other.root.entries())
                .all(|(e0, e1)| e0 == e1)
    }
}

impl<K: Eq, V: Eq, C> Eq for AvlTree<K, V, C> {}

impl<K, V, C> Hash for AvlTree<K, V, C>
where
    K: Hash,
    V: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.root.len());
        for elt in self.root.entries() {
            elt.hash(state)
        }
    }
}

impl<'a, K, V, C> Index<&'a K> for AvlTree<K, V, C>
where
    C: Comparator<K> + Clone,
{
    type Output = V;
    fn index(&self, k: &'a K) -> &V {
        self.get(k).expect("element not found for key")
    }
}

impl<K, V, C> FromIterator<(K, V)> for AvlTree<K, V, C>
where
    K: Clone,
    C: Comparator<K> + Default + Clone,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        AvlTree::default().insert_many(iter)
    }
}

/// In order iterator over the bindings of an [`AvlTree`].
pub struct Iter<'a, K, V>(Entries<'a, K, V>);

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|e| (&e.0, &e.1))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}
impl<'a, K, V> FusedIterator for Iter<'a, K, V> {}

impl<'a, K, V, C> IntoIterator for &'a AvlTree<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        Iter(self.root.entries())
    }
}

impl<K: Ord, V> AvlTree<K, V> {
    /// Create a new empty map in the natural order of K
    pub fn new() -> Self {
        AvlTree::with_comparator(Ascending)
    }

    /// Create a map in the natural order of K holding the single
    /// binding (k, v)
    pub fn singleton(k: K, v: V) -> Self {
        AvlTree::singleton_with(Ascending, k, v)
    }
}

impl<K, V, C> AvlTree<K, V, C>
where
    C: Comparator<K> + Clone,
{
    /// Create a new empty map ordered by cmp
    pub fn with_comparator(cmp: C) -> Self {
        AvlTree {
            root: Tree::new(),
            cmp,
        }
    }

    /// Create a map ordered by cmp holding the single binding (k, v)
    pub fn singleton_with(cmp: C, k: K, v: V) -> Self {
        AvlTree {
            root: Tree::singleton(Arc::new((k, v))),
            cmp,
        }
    }

    /// Build a node from a binding and two subtrees, and rebalance it
    /// before returning it.
    ///
    /// Every key in `left` must be below `k`, every key in `right`
    /// above it, both subtrees must already be balanced, and their
    /// heights may differ by at most two. Breaking these rules is a
    /// programming error, which is caught by a debug assertion when
    /// the heights are too far apart and is otherwise not detected.
    ///
    /// # Examples
    /// ```
    /// use immutable_avltree::{AvlTree, Ascending};
    ///
    /// let l = AvlTree::new().put(1, ()).put(2, ());
    /// let t = AvlTree::create(Ascending, 3, (), l, AvlTree::new());
    ///
    /// // a left-right double rotation made 2 the root
    /// assert_eq!(t.root(), Some((&2, &())));
    /// assert_eq!(t.balance(), 0);
    /// ```
    pub fn create(cmp: C, k: K, v: V, left: Self, right: Self) -> Self {
        AvlTree {
            root: Tree::create(left.root, Arc::new((k, v)), right.root),
            cmp,
        }
    }

    fn with_root(&self, root: Tree<K, V>) -> Self {
        AvlTree {
            root,
            cmp: self.cmp.clone(),
        }
    }

    /// the comparator that orders this map
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// get the number of elements in the map O(1) time and space
    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// The height of the tree. The empty tree has height 0, a single
    /// binding has height 1.
    pub fn height(&self) -> usize {
        self.root.height() as usize
    }

    /// The height of the left subtree minus the height of the right
    /// subtree. Always -1, 0, or 1 for a balanced tree, 0 for the
    /// empty tree.
    pub fn balance(&self) -> i32 {
        self.root.balance()
    }

    /// the binding at the root of the tree
    pub fn root(&self) -> Option<(&K, &V)> {
        self.root.entry().map(|e| (&e.0, &e.1))
    }

    /// The left subtree, ordered by the same comparator. Empty if the
    /// tree is empty.
    pub fn left(&self) -> Self {
        self.with_root(self.root.left())
    }

    /// The right subtree, ordered by the same comparator. Empty if the
    /// tree is empty.
    pub fn right(&self) -> Self {
        self.with_root(self.root.right())
    }

    /// Return a copy of this node with its left subtree replaced. No
    /// rebalancing is done, restoring the AVL invariant (and the order
    /// of the keys) is the caller's responsibility. The empty tree is
    /// returned unchanged.
    ///
    pub fn with_left(&self, left: Self) -> Self {
        self.with_root(self.root.with_left(left.root))
    }

    /// Return a copy of this node with its right subtree replaced. No
    /// rebalancing is done, see [`with_left`](AvlTree::with_left).
    pub fn with_right(&self, right: Self) -> Self {
        self.with_root(self.root.with_right(right.root))
    }

    /// lookup the mapping for k. If it doesn't exist return None. Runs
    /// in log(N) time and constant space.
    pub fn get<'a>(&'a self, k: &K) -> Option<&'a V> {
        self.root.get(&self.cmp, k).map(|e| &e.1)
    }

    /// lookup the mapping for k, returning both the stored key and the
    /// value.
    pub fn get_key_value<'a>(&'a self, k: &K) -> Option<(&'a K, &'a V)> {
        self.root.get(&self.cmp, k).map(|e| (&e.0, &e.1))
    }

    pub fn contains_key(&self, k: &K) -> bool {
        self.root.get(&self.cmp, k).is_some()
    }

    /// the smallest binding in the map
    pub fn first(&self) -> Result<(&K, &V)> {
        self.root
            .min_entry()
            .map(|e| (&e.0, &e.1))
            .ok_or(NoSuchElement)
    }

    /// the largest binding in the map
    pub fn last(&self) -> Result<(&K, &V)> {
        self.root
            .max_entry()
            .map(|e| (&e.0, &e.1))
            .ok_or(NoSuchElement)
    }

    /// The first binding of the map viewed as a sequence, same as
    /// [`first`](AvlTree::first).
    pub fn head(&self) -> Result<(&K, &V)> {
        self.first()
    }

    pub fn head_option(&self) -> Option<(&K, &V)> {
        self.first().ok()
    }

    /// The map viewed as a sequence without its head.
    pub fn tail(&self) -> Result<Self> {
        self.root
            .remove_min()
            .map(|(t, _)| self.with_root(t))
            .ok_or(NoSuchElement)
    }

    /// return a new map with the mapping under k removed. If k is not
    /// bound the returned map shares everything with this one. When
    /// the removed node has two children its in order successor takes
    /// its place. Runs in log(N) time.
    pub fn remove(&self, k: &K) -> Self {
        match self.root.remove(&self.cmp, k) {
            None => self.clone(),
            Some((root, _)) => self.with_root(root),
        }
    }

    /// Return a new map holding only the bindings whose key satisfies
    /// the predicate. The result is rebalanced from scratch when
    /// anything is dropped; if nothing is, it is this map.
    pub fn filter_keys<F: FnMut(&K) -> bool>(&self, mut f: F) -> Self {
        self.with_root(self.root.filter(&mut |k, _| f(k)))
    }

    /// Return a new map holding only the bindings whose value satisfies
    /// the predicate.
    pub fn filter_values<F: FnMut(&V) -> bool>(&self, mut f: F) -> Self {
        self.with_root(self.root.filter(&mut |_, v| f(v)))
    }

    /// iterate over the bindings in order
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.into_iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }
}

impl<K, V, C> AvlTree<K, V, C>
where
    K: Clone,
    C: Comparator<K> + Clone,
{
    /// return a new map with (k, v) inserted into it. If a key that
    /// compares equal to k already exists, that key stays in the map
    /// and only its value is replaced, in the same node, so the shape
    /// of the tree does not change. Runs in log(N) time.
    pub fn put(&self, k: K, v: V) -> Self {
        self.with_root(self.root.insert(&self.cmp, k, v))
    }

    /// Prepend a binding to the map viewed as a sequence. Since the map
    /// is ordered this is the same as [`put`](AvlTree::put).
    pub fn cons(&self, (k, v): (K, V)) -> Self {
        self.put(k, v)
    }

    /// Insert many bindings, later bindings replace earlier ones with
    /// the same key.
    pub fn insert_many<E: IntoIterator<Item = (K, V)>>(&self, elts: E) -> Self {
        let root = elts
            .into_iter()
            .fold(self.root.clone(), |t, (k, v)| t.insert(&self.cmp, k, v));
        self.with_root(root)
    }

    /// Return a map with the same keys and the same shape, with every
    /// value replaced by f(value). f is called in key order. Never
    /// rebalances, since the shape does not change.
    ///
    /// # Examples
    /// ```
    /// use immutable_avltree::AvlTree;
    ///
    /// let m: AvlTree<i32, i32> = (0..10).map(|k| (k, k)).collect();
    /// let m2 = m.map_values(|v| v.to_string());
    /// assert_eq!(m2.height(), m.height());
    /// assert_eq!(m2.get(&7).map(|s| s.as_str()), Some("7"));
    /// ```
    pub fn map_values<W, F: FnMut(&V) -> W>(&self, mut f: F) -> AvlTree<K, W, C> {
        AvlTree {
            root: self.root.map_values(&mut f),
            cmp: self.cmp.clone(),
        }
    }

    /// Same as [`map_values`](AvlTree::map_values), but maps large
    /// subtrees in parallel. f may be called in any order.
    #[cfg(feature = "rayon")]
    pub fn par_map_values<W, F>(&self, f: F) -> AvlTree<K, W, C>
    where
        K: Send + Sync,
        V: Send + Sync,
        W: Send + Sync,
        F: Fn(&V) -> W + Sync,
    {
        AvlTree {
            root: self.root.par_map_values(&f),
            cmp: self.cmp.clone(),
        }
    }
}

impl<K, V, C> AvlTree<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + Clone,
{
    /// Remove the smallest binding. Return the map without it, and the
    /// binding.
    ///
    /// # Examples
    /// ```
    /// use immutable_avltree::AvlTree;
    ///
    /// let m: AvlTree<i32, char> = vec![(2, 'b'), (1, 'a')].into_iter().collect();
    /// let (rest, first) = m.remove_first().unwrap();
    /// assert_eq!(first, (1, 'a'));
    /// assert_eq!(rest.len(), 1);
    /// assert!(AvlTree::<i32, char>::new().remove_first().is_err());
    /// ```
    pub fn remove_first(&self) -> Result<(Self, (K, V))> {
        let (root, elt) = self.root.remove_min().ok_or(NoSuchElement)?;
        Ok((self.with_root(root), (*elt).clone()))
    }

    /// Remove the largest binding. Return the map without it, and the
    /// binding.
    pub fn remove_last(&self) -> Result<(Self, (K, V))> {
        let (root, elt) = self.root.remove_max().ok_or(NoSuchElement)?;
        Ok((self.with_root(root), (*elt).clone()))
    }
}

impl<K, V, C> AvlTree<K, V, C>
where
    K: Debug,
    V: Debug,
    C: Comparator<K>,
{
    #[allow(dead_code)]
    pub(crate) fn invariant(&self) {
        self.root.invariant(&self.cmp)
    }
}

#[cfg(test)]
impl<K, V, C> AvlTree<K, V, C> {
    pub(crate) fn tree(&self) -> &Tree<K, V> {
        &self.root
    }
}

#[cfg(feature = "serde")]
mod serde_impls {
    use super::AvlTree;
    use crate::comparator::Comparator;
    use serde::{
        de::{MapAccess, Visitor},
        ser::SerializeMap,
        Deserialize, Deserializer, Serialize, Serializer,
    };
    use std::{fmt, marker::PhantomData};

    impl<K, V, C> Serialize for AvlTree<K, V, C>
    where
        K: Serialize,
        V: Serialize,
    {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.root.len()))?;
            for (k, v) in self {
                map.serialize_entry(k, v)?;
            }
            map.end()
        }
    }

    struct AvlTreeVisitor<K, V, C>(PhantomData<(K, V, C)>);

    impl<'de, K, V, C> Visitor<'de> for AvlTreeVisitor<K, V, C>
    where
        K: Deserialize<'de> + Clone,
        V: Deserialize<'de>,
        C: Comparator<K> + Default + Clone,
    {
        type Value = AvlTree<K, V, C>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut t = AvlTree::with_comparator(C::default());
            while let Some((k, v)) = access.next_entry()? {
                t = t.put(k, v);
            }
            Ok(t)
        }
    }

    impl<'de, K, V, C> Deserialize<'de> for AvlTree<K, V, C>
    where
        K: Deserialize<'de> + Clone,
        V: Deserialize<'de>,
        C: Comparator<K> + Default + Clone,
    {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_map(AvlTreeVisitor(PhantomData))
        }
    }
}
