use crate::comparator::Comparator;
use arrayvec::ArrayVec;
use std::{
    cmp::{max, Ordering},
    fmt::{self, Debug, Formatter},
    iter::FusedIterator,
    sync::Arc,
};

// an AVL tree of n elements is at most 1.44 * log2(n + 2) high, so this
// covers anything that fits in a 64 bit address space.
pub(crate) const MAX_DEPTH: usize = 96;

#[cfg(feature = "rayon")]
const PAR_THRESHOLD: usize = 1024;

pub(crate) struct Node<K, V> {
    entry: Arc<(K, V)>,
    left: Tree<K, V>,
    right: Tree<K, V>,
    len: usize,
    height: u16,
}

pub(crate) enum Tree<K, V> {
    Empty,
    Node(Arc<Node<K, V>>),
}

impl<K, V> Clone for Tree<K, V> {
    fn clone(&self) -> Self {
        match self {
            Tree::Empty => Tree::Empty,
            Tree::Node(n) => Tree::Node(Arc::clone(n)),
        }
    }
}

impl<K, V> Default for Tree<K, V> {
    fn default() -> Tree<K, V> {
        Tree::Empty
    }
}

impl<K, V> Debug for Tree<K, V>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_map()
            .entries(self.entries().map(|e| (&e.0, &e.1)))
            .finish()
    }
}

// the stack never grows past the height of the root. Only trees put
// together with the raw setters can be taller than MAX_DEPTH.
enum Stack<'a, K, V> {
    Inline(ArrayVec<&'a Node<K, V>, MAX_DEPTH>),
    Spilled(Vec<&'a Node<K, V>>),
}

impl<'a, K, V> Stack<'a, K, V> {
    fn for_height(height: usize) -> Self {
        if height <= MAX_DEPTH {
            Stack::Inline(ArrayVec::new())
        } else {
            Stack::Spilled(Vec::with_capacity(height))
        }
    }

    fn push(&mut self, n: &'a Node<K, V>) {
        match self {
            Stack::Inline(s) => s.push(n),
            Stack::Spilled(s) => s.push(n),
        }
    }

    fn pop(&mut self) -> Option<&'a Node<K, V>> {
        match self {
            Stack::Inline(s) => s.pop(),
            Stack::Spilled(s) => s.pop(),
        }
    }
}

/// In order traversal over the shared entries of a tree.
pub(crate) struct Entries<'a, K, V> {
    stack: Stack<'a, K, V>,
    remaining: usize,
}

impl<'a, K, V> Entries<'a, K, V> {
    fn push_left(&mut self, mut t: &'a Tree<K, V>) {
        while let Tree::Node(n) = t {
            self.stack.push(n);
            t = &n.left;
        }
    }
}

impl<'a, K, V> Iterator for Entries<'a, K, V> {
    type Item = &'a Arc<(K, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.stack.pop()?;
        self.push_left(&n.right);
        self.remaining -= 1;
        Some(&n.entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> ExactSizeIterator for Entries<'a, K, V> {}
impl<'a, K, V> FusedIterator for Entries<'a, K, V> {}

impl<K, V> Tree<K, V> {
    pub(crate) fn new() -> Self {
        Tree::Empty
    }

    pub(crate) fn is_empty(&self) -> bool {
        match self {
            Tree::Empty => true,
            Tree::Node(..) => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Tree::Empty => 0,
            Tree::Node(n) => n.len,
        }
    }

    pub(crate) fn height(&self) -> u16 {
        match self {
            Tree::Empty => 0,
            Tree::Node(n) => n.height,
        }
    }

    pub(crate) fn balance(&self) -> i32 {
        match self {
            Tree::Empty => 0,
            Tree::Node(n) => n.left.height() as i32 - n.right.height() as i32,
        }
    }

    pub(crate) fn entry(&self) -> Option<&Arc<(K, V)>> {
        match self {
            Tree::Empty => None,
            Tree::Node(n) => Some(&n.entry),
        }
    }

    pub(crate) fn left(&self) -> Tree<K, V> {
        match self {
            Tree::Empty => Tree::Empty,
            Tree::Node(n) => n.left.clone(),
        }
    }

    pub(crate) fn right(&self) -> Tree<K, V> {
        match self {
            Tree::Empty => Tree::Empty,
            Tree::Node(n) => n.right.clone(),
        }
    }

    /// build a node without looking at its balance. Everything except
    /// the setters and the balancer itself must go through `create`.
    fn raw(l: Tree<K, V>, entry: Arc<(K, V)>, r: Tree<K, V>) -> Self {
        let n = Node {
            entry,
            len: 1 + l.len() + r.len(),
            height: 1 + max(l.height(), r.height()),
            left: l,
            right: r,
        };
        Tree::Node(Arc::new(n))
    }

    /// replace the left subtree, no rebalancing is done
    pub(crate) fn with_left(&self, l: Tree<K, V>) -> Self {
        match self {
            Tree::Empty => Tree::Empty,
            Tree::Node(n) => Tree::raw(l, n.entry.clone(), n.right.clone()),
        }
    }

    /// replace the right subtree, no rebalancing is done
    pub(crate) fn with_right(&self, r: Tree<K, V>) -> Self {
        match self {
            Tree::Empty => Tree::Empty,
            Tree::Node(n) => Tree::raw(n.left.clone(), n.entry.clone(), r),
        }
    }

    //     n               r
    //    / \             / \
    //   a   r    =>     n   c
    //      / \         / \
    //     b   c       a   b
    fn rotate_left(&self) -> Self {
        let r = self.right();
        let n = self.with_right(r.left());
        r.with_left(n)
    }

    fn rotate_right(&self) -> Self {
        let l = self.left();
        let n = self.with_left(l.right());
        l.with_right(n)
    }

    // subtrees are balanced and differ in height by at most 2
    fn rebalance(self) -> Self {
        match self.balance() {
            -2 => match self.right().balance() {
                1 => self.with_right(self.right().rotate_right()).rotate_left(),
                // -1, or 0 which only happens after a removal on the left
                _ => self.rotate_left(),
            },
            2 => match self.left().balance() {
                -1 => self.with_left(self.left().rotate_left()).rotate_right(),
                _ => self.rotate_right(),
            },
            b => {
                debug_assert!((-1..=1).contains(&b), "balance factor {} out of range", b);
                self
            }
        }
    }

    /// The factory. The only way a node escapes to a caller is through
    /// here, so every reachable node is balanced.
    pub(crate) fn create(l: Tree<K, V>, entry: Arc<(K, V)>, r: Tree<K, V>) -> Self {
        debug_assert!(
            (l.height() as i32 - r.height() as i32).abs() <= 2,
            "tree heights wrong {} vs {}",
            l.height(),
            r.height()
        );
        Tree::raw(l, entry, r).rebalance()
    }

    pub(crate) fn singleton(entry: Arc<(K, V)>) -> Self {
        Tree::create(Tree::Empty, entry, Tree::Empty)
    }

    /// build a balanced tree from entries that are already sorted and
    /// free of duplicates
    pub(crate) fn from_sorted(elts: &[Arc<(K, V)>]) -> Self {
        if elts.is_empty() {
            return Tree::Empty;
        }
        let mid = elts.len() / 2;
        Tree::create(
            Tree::from_sorted(&elts[..mid]),
            elts[mid].clone(),
            Tree::from_sorted(&elts[mid + 1..]),
        )
    }

    pub(crate) fn entries(&self) -> Entries<'_, K, V> {
        let mut it = Entries {
            stack: Stack::for_height(self.height() as usize),
            remaining: self.len(),
        };
        it.push_left(self);
        it
    }

    pub(crate) fn min_entry(&self) -> Option<&Arc<(K, V)>> {
        let mut t = self;
        let mut min = None;
        while let Tree::Node(n) = t {
            min = Some(&n.entry);
            t = &n.left;
        }
        min
    }

    pub(crate) fn max_entry(&self) -> Option<&Arc<(K, V)>> {
        let mut t = self;
        let mut max = None;
        while let Tree::Node(n) = t {
            max = Some(&n.entry);
            t = &n.right;
        }
        max
    }

    pub(crate) fn remove_min(&self) -> Option<(Self, Arc<(K, V)>)> {
        match self {
            Tree::Empty => None,
            Tree::Node(tn) => match tn.left.remove_min() {
                None => Some((tn.right.clone(), tn.entry.clone())),
                Some((l, min)) => Some((Tree::create(l, tn.entry.clone(), tn.right.clone()), min)),
            },
        }
    }

    pub(crate) fn remove_max(&self) -> Option<(Self, Arc<(K, V)>)> {
        match self {
            Tree::Empty => None,
            Tree::Node(tn) => match tn.right.remove_max() {
                None => Some((tn.left.clone(), tn.entry.clone())),
                Some((r, max)) => Some((Tree::create(tn.left.clone(), tn.entry.clone(), r), max)),
            },
        }
    }

    // join the two children of a removed node. With two children the
    // in order successor takes the removed node's place.
    fn splice(l: &Tree<K, V>, r: &Tree<K, V>) -> Self {
        match (l, r) {
            (Tree::Empty, _) => r.clone(),
            (_, Tree::Empty) => l.clone(),
            (_, _) => match r.remove_min() {
                None => l.clone(),
                Some((r, succ)) => Tree::create(l.clone(), succ, r),
            },
        }
    }

    pub(crate) fn get<C>(&self, cmp: &C, k: &K) -> Option<&Arc<(K, V)>>
    where
        C: Comparator<K>,
    {
        let mut t = self;
        loop {
            match t {
                Tree::Empty => break None,
                Tree::Node(tn) => match cmp.compare(k, &tn.entry.0) {
                    Ordering::Less => t = &tn.left,
                    Ordering::Greater => t = &tn.right,
                    Ordering::Equal => break Some(&tn.entry),
                },
            }
        }
    }

    /// the key already in the tree is kept when k compares equal to it,
    /// only the value is replaced
    pub(crate) fn insert<C>(&self, cmp: &C, k: K, v: V) -> Self
    where
        K: Clone,
        C: Comparator<K>,
    {
        match self {
            Tree::Empty => Tree::singleton(Arc::new((k, v))),
            Tree::Node(tn) => match cmp.compare(&k, &tn.entry.0) {
                // same shape, so no need to look at the balance
                Ordering::Equal => {
                    let elt = Arc::new((tn.entry.0.clone(), v));
                    Tree::raw(tn.left.clone(), elt, tn.right.clone())
                }
                Ordering::Less => Tree::create(
                    tn.left.insert(cmp, k, v),
                    tn.entry.clone(),
                    tn.right.clone(),
                ),
                Ordering::Greater => Tree::create(
                    tn.left.clone(),
                    tn.entry.clone(),
                    tn.right.insert(cmp, k, v),
                ),
            },
        }
    }

    /// None if k is not in the tree, in which case the caller should
    /// keep the tree it has.
    pub(crate) fn remove<C>(&self, cmp: &C, k: &K) -> Option<(Self, Arc<(K, V)>)>
    where
        C: Comparator<K>,
    {
        match self {
            Tree::Empty => None,
            Tree::Node(tn) => match cmp.compare(k, &tn.entry.0) {
                Ordering::Less => {
                    let (l, elt) = tn.left.remove(cmp, k)?;
                    Some((Tree::create(l, tn.entry.clone(), tn.right.clone()), elt))
                }
                Ordering::Greater => {
                    let (r, elt) = tn.right.remove(cmp, k)?;
                    Some((Tree::create(tn.left.clone(), tn.entry.clone(), r), elt))
                }
                Ordering::Equal => Some((Tree::splice(&tn.left, &tn.right), tn.entry.clone())),
            },
        }
    }

    pub(crate) fn filter<F>(&self, f: &mut F) -> Self
    where
        F: FnMut(&K, &V) -> bool,
    {
        let mut kept = Vec::with_capacity(self.len());
        for elt in self.entries() {
            if f(&elt.0, &elt.1) {
                kept.push(elt.clone())
            }
        }
        if kept.len() == self.len() {
            self.clone()
        } else {
            Tree::from_sorted(&kept)
        }
    }

    pub(crate) fn map_values<W, F>(&self, f: &mut F) -> Tree<K, W>
    where
        K: Clone,
        F: FnMut(&V) -> W,
    {
        match self {
            Tree::Empty => Tree::Empty,
            Tree::Node(tn) => {
                let l = tn.left.map_values(f);
                let (k, v) = &*tn.entry;
                let elt = Arc::new((k.clone(), f(v)));
                let r = tn.right.map_values(f);
                Tree::raw(l, elt, r)
            }
        }
    }

    #[cfg(feature = "rayon")]
    pub(crate) fn par_map_values<W, F>(&self, f: &F) -> Tree<K, W>
    where
        K: Clone + Send + Sync,
        V: Send + Sync,
        W: Send + Sync,
        F: Fn(&V) -> W + Sync,
    {
        match self {
            Tree::Empty => Tree::Empty,
            Tree::Node(tn) if tn.len < PAR_THRESHOLD => self.map_values(&mut |v| f(v)),
            Tree::Node(tn) => {
                let (l, r) = rayon::join(
                    || tn.left.par_map_values(f),
                    || tn.right.par_map_values(f),
                );
                let (k, v) = &*tn.entry;
                Tree::raw(l, Arc::new((k.clone(), f(v))), r)
            }
        }
    }
}

impl<K, V> Tree<K, V>
where
    K: Debug,
    V: Debug,
{
    #[allow(dead_code)]
    pub(crate) fn invariant<C: Comparator<K>>(&self, cmp: &C) {
        fn check<K: Debug, V: Debug, C: Comparator<K>>(
            t: &Tree<K, V>,
            cmp: &C,
            lower: Option<&K>,
            upper: Option<&K>,
        ) -> (u16, usize) {
            match t {
                Tree::Empty => (0, 0),
                Tree::Node(tn) => {
                    let k = &tn.entry.0;
                    if let Some(lower) = lower {
                        if cmp.compare(lower, k) != Ordering::Less {
                            panic!("tree invariant violated {:?} is not above {:?}", k, lower)
                        }
                    }
                    if let Some(upper) = upper {
                        if cmp.compare(upper, k) != Ordering::Greater {
                            panic!("tree invariant violated {:?} is not below {:?}", k, upper)
                        }
                    }
                    let (hl, ll) = check(&tn.left, cmp, lower, Some(k));
                    let (hr, lr) = check(&tn.right, cmp, Some(k), upper);
                    if hl != tn.left.height() {
                        panic!("left node height is wrong")
                    }
                    if hr != tn.right.height() {
                        panic!("right node height is wrong")
                    }
                    let h = 1 + max(hl, hr);
                    if h != tn.height {
                        panic!("node height is wrong {} vs {}", h, tn.height)
                    }
                    let b = t.balance();
                    if !(-1..=1).contains(&b) {
                        panic!("tree is unbalanced {} at {:?} tree: {:#?}", b, k, t)
                    }
                    let len = 1 + ll + lr;
                    if len != tn.len {
                        panic!("len is wrong {} vs {}", len, tn.len)
                    }
                    (h, len)
                }
            }
        }

        check(self, cmp, None, None);
    }
}
