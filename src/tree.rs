//! Red-black tree storing disjoint ranges, keyed on the range start
//!
//! Nodes live in an arena and link to each other through [`NodeId`]s. Slot `0` is the nil
//! sentinel: it is black, terminates every leaf and acts as the parent of the root. It is only
//! ever recognised by its id, its stored addresses are filler.

use crate::{Address, AddressRange};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct NodeId(usize);

impl NodeId {
    pub(crate) const NIL: NodeId = NodeId(0);

    #[inline]
    pub(crate) fn is_nil(self) -> bool {
        self == Self::NIL
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Color {
    Red,
    Black,
}

#[derive(Debug, Clone)]
struct Node<A> {
    start: A,
    end: A,
    color: Color,
    left: NodeId,
    right: NodeId,
    parent: NodeId,
}

impl<A: Address> Node<A> {
    fn sentinel() -> Self {
        Node {
            start: A::MIN,
            end: A::MIN,
            color: Color::Black,
            left: NodeId::NIL,
            right: NodeId::NIL,
            parent: NodeId::NIL,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RangeTree<A> {
    nodes: Vec<Node<A>>,
    free: Vec<NodeId>,
    root: NodeId,
    len: usize,
}

impl<A: Address> Default for RangeTree<A> {
    fn default() -> Self {
        RangeTree {
            nodes: vec![Node::sentinel()],
            free: Vec::new(),
            root: NodeId::NIL,
            len: 0,
        }
    }
}

impl<A: Address> RangeTree<A> {
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    /// The stored range at `id`, which must not be the sentinel
    #[inline]
    pub(crate) fn range(&self, id: NodeId) -> AddressRange<A> {
        debug_assert!(!id.is_nil());
        let node = &self.nodes[id.0];
        AddressRange::between(node.start, node.end)
    }

    #[inline]
    fn node(&self, id: NodeId) -> &Node<A> {
        &self.nodes[id.0]
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node<A> {
        &mut self.nodes[id.0]
    }

    #[inline]
    fn left(&self, id: NodeId) -> NodeId {
        self.node(id).left
    }

    #[inline]
    fn right(&self, id: NodeId) -> NodeId {
        self.node(id).right
    }

    #[inline]
    fn parent(&self, id: NodeId) -> NodeId {
        self.node(id).parent
    }

    #[inline]
    fn color(&self, id: NodeId) -> Color {
        self.node(id).color
    }

    #[inline]
    fn set_color(&mut self, id: NodeId, color: Color) {
        self.node_mut(id).color = color;
    }

    /// Find the stored range that contains `address`
    pub(crate) fn find_containing(&self, address: &A) -> NodeId {
        let mut current = self.root;
        while !current.is_nil() {
            let node = self.node(current);
            if *address < node.start {
                current = node.left;
            } else if *address > node.end {
                current = node.right;
            } else {
                return current;
            }
        }

        NodeId::NIL
    }

    /// The last stored range starting at or before `address`
    pub(crate) fn find_floor(&self, address: &A) -> NodeId {
        let mut current = self.root;
        let mut found = NodeId::NIL;
        while !current.is_nil() {
            if *address < self.node(current).start {
                current = self.left(current);
            } else {
                found = current;
                current = self.right(current);
            }
        }

        found
    }

    /// The first stored range starting at or after `address`
    pub(crate) fn find_ceiling(&self, address: &A) -> NodeId {
        let mut current = self.root;
        let mut found = NodeId::NIL;
        while !current.is_nil() {
            if *address > self.node(current).start {
                current = self.right(current);
            } else {
                found = current;
                current = self.left(current);
            }
        }

        found
    }

    fn find_exact(&self, start: &A) -> NodeId {
        let floor = self.find_floor(start);
        if !floor.is_nil() && self.node(floor).start == *start {
            floor
        } else {
            NodeId::NIL
        }
    }

    fn minimum(&self, mut id: NodeId) -> NodeId {
        while !self.left(id).is_nil() {
            id = self.left(id);
        }
        id
    }

    fn maximum(&self, mut id: NodeId) -> NodeId {
        while !self.right(id).is_nil() {
            id = self.right(id);
        }
        id
    }

    pub(crate) fn first(&self) -> NodeId {
        if self.root.is_nil() {
            NodeId::NIL
        } else {
            self.minimum(self.root)
        }
    }

    pub(crate) fn last(&self) -> NodeId {
        if self.root.is_nil() {
            NodeId::NIL
        } else {
            self.maximum(self.root)
        }
    }

    pub(crate) fn successor(&self, id: NodeId) -> NodeId {
        if !self.right(id).is_nil() {
            return self.minimum(self.right(id));
        }

        let mut child = id;
        let mut parent = self.parent(id);
        while !parent.is_nil() && child == self.right(parent) {
            child = parent;
            parent = self.parent(parent);
        }
        parent
    }

    pub(crate) fn predecessor(&self, id: NodeId) -> NodeId {
        if !self.left(id).is_nil() {
            return self.maximum(self.left(id));
        }

        let mut child = id;
        let mut parent = self.parent(id);
        while !parent.is_nil() && child == self.left(parent) {
            child = parent;
            parent = self.parent(parent);
        }
        parent
    }

    fn allocate(&mut self, start: A, end: A) -> NodeId {
        let node = Node {
            start,
            end,
            color: Color::Red,
            left: NodeId::NIL,
            right: NodeId::NIL,
            parent: NodeId::NIL,
        };

        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = node;
                id
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn rotate_left(&mut self, x: NodeId) {
        let y = self.right(x);
        let y_left = self.left(y);

        self.node_mut(x).right = y_left;
        if !y_left.is_nil() {
            self.node_mut(y_left).parent = x;
        }

        let x_parent = self.parent(x);
        self.node_mut(y).parent = x_parent;
        if x_parent.is_nil() {
            self.root = y;
        } else if x == self.left(x_parent) {
            self.node_mut(x_parent).left = y;
        } else {
            self.node_mut(x_parent).right = y;
        }

        self.node_mut(y).left = x;
        self.node_mut(x).parent = y;
    }

    fn rotate_right(&mut self, y: NodeId) {
        let x = self.left(y);
        let x_right = self.right(x);

        self.node_mut(y).left = x_right;
        if !x_right.is_nil() {
            self.node_mut(x_right).parent = y;
        }

        let y_parent = self.parent(y);
        self.node_mut(x).parent = y_parent;
        if y_parent.is_nil() {
            self.root = x;
        } else if y == self.right(y_parent) {
            self.node_mut(y_parent).right = x;
        } else {
            self.node_mut(y_parent).left = x;
        }

        self.node_mut(x).right = y;
        self.node_mut(y).parent = x;
    }

    /// Insert a range, the caller guarantees it doesn't overlap any stored range
    pub(crate) fn insert(&mut self, start: A, end: A) -> NodeId {
        let z = self.allocate(start, end);

        let mut parent = NodeId::NIL;
        let mut current = self.root;
        while !current.is_nil() {
            parent = current;
            debug_assert!(start != self.node(current).start, "duplicate range start {:?}", start);
            current = if start < self.node(current).start {
                self.left(current)
            } else {
                self.right(current)
            };
        }

        self.node_mut(z).parent = parent;
        if parent.is_nil() {
            self.root = z;
        } else if start < self.node(parent).start {
            self.node_mut(parent).left = z;
        } else {
            self.node_mut(parent).right = z;
        }

        self.len += 1;
        self.insert_fixup(z);
        z
    }

    fn insert_fixup(&mut self, mut z: NodeId) {
        while self.color(self.parent(z)) == Color::Red {
            let parent = self.parent(z);
            let grandparent = self.parent(parent);

            if parent == self.left(grandparent) {
                let uncle = self.right(grandparent);
                if self.color(uncle) == Color::Red {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    z = grandparent;
                } else {
                    if z == self.right(parent) {
                        z = parent;
                        self.rotate_left(z);
                    }

                    let parent = self.parent(z);
                    let grandparent = self.parent(parent);
                    self.set_color(parent, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    self.rotate_right(grandparent);
                }
            } else {
                let uncle = self.left(grandparent);
                if self.color(uncle) == Color::Red {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    z = grandparent;
                } else {
                    if z == self.left(parent) {
                        z = parent;
                        self.rotate_right(z);
                    }

                    let parent = self.parent(z);
                    let grandparent = self.parent(parent);
                    self.set_color(parent, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    self.rotate_left(grandparent);
                }
            }
        }

        let root = self.root;
        self.set_color(root, Color::Black);
    }

    /// Replace the subtree rooted at `u` with the one rooted at `v`
    ///
    /// `v` may be the sentinel, its parent link is still updated as the delete fixup walks up
    /// from it.
    fn transplant(&mut self, u: NodeId, v: NodeId) {
        let u_parent = self.parent(u);
        if u_parent.is_nil() {
            self.root = v;
        } else if u == self.left(u_parent) {
            self.node_mut(u_parent).left = v;
        } else {
            self.node_mut(u_parent).right = v;
        }
        self.node_mut(v).parent = u_parent;
    }

    /// Remove the range starting at `start`, returning its end
    pub(crate) fn delete(&mut self, start: &A) -> Option<A> {
        let z = self.find_exact(start);
        if z.is_nil() {
            return None;
        }

        let end = self.node(z).end;
        self.delete_node(z);
        Some(end)
    }

    fn delete_node(&mut self, z: NodeId) {
        let mut removed_color = self.color(z);
        let x;

        if self.left(z).is_nil() {
            x = self.right(z);
            self.transplant(z, x);
        } else if self.right(z).is_nil() {
            x = self.left(z);
            self.transplant(z, x);
        } else {
            let y = self.minimum(self.right(z));
            removed_color = self.color(y);
            x = self.right(y);

            if self.parent(y) == z {
                self.node_mut(x).parent = y;
            } else {
                self.transplant(y, x);
                let z_right = self.right(z);
                self.node_mut(y).right = z_right;
                self.node_mut(z_right).parent = y;
            }

            self.transplant(z, y);
            let z_left = self.left(z);
            self.node_mut(y).left = z_left;
            self.node_mut(z_left).parent = y;
            let z_color = self.color(z);
            self.set_color(y, z_color);
        }

        if removed_color == Color::Black {
            self.delete_fixup(x);
        }

        // the fixup may have parked a parent on the sentinel
        self.nodes[NodeId::NIL.0] = Node::sentinel();
        self.release(z);
    }

    fn delete_fixup(&mut self, mut x: NodeId) {
        while x != self.root && self.color(x) == Color::Black {
            let parent = self.parent(x);

            if x == self.left(parent) {
                let mut w = self.right(parent);
                if self.color(w) == Color::Red {
                    self.set_color(w, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_left(parent);
                    w = self.right(self.parent(x));
                }

                if self.color(self.left(w)) == Color::Black && self.color(self.right(w)) == Color::Black {
                    self.set_color(w, Color::Red);
                    x = self.parent(x);
                } else {
                    if self.color(self.right(w)) == Color::Black {
                        let w_left = self.left(w);
                        self.set_color(w_left, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_right(w);
                        w = self.right(self.parent(x));
                    }

                    let parent = self.parent(x);
                    let parent_color = self.color(parent);
                    self.set_color(w, parent_color);
                    self.set_color(parent, Color::Black);
                    let w_right = self.right(w);
                    self.set_color(w_right, Color::Black);
                    self.rotate_left(parent);
                    x = self.root;
                }
            } else {
                let mut w = self.left(parent);
                if self.color(w) == Color::Red {
                    self.set_color(w, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_right(parent);
                    w = self.left(self.parent(x));
                }

                if self.color(self.right(w)) == Color::Black && self.color(self.left(w)) == Color::Black {
                    self.set_color(w, Color::Red);
                    x = self.parent(x);
                } else {
                    if self.color(self.left(w)) == Color::Black {
                        let w_right = self.right(w);
                        self.set_color(w_right, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_left(w);
                        w = self.left(self.parent(x));
                    }

                    let parent = self.parent(x);
                    let parent_color = self.color(parent);
                    self.set_color(w, parent_color);
                    self.set_color(parent, Color::Black);
                    let w_left = self.left(w);
                    self.set_color(w_left, Color::Black);
                    self.rotate_right(parent);
                    x = self.root;
                }
            }
        }

        self.set_color(x, Color::Black);
    }

    fn release(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        node.left = NodeId::NIL;
        node.right = NodeId::NIL;
        node.parent = NodeId::NIL;
        self.free.push(id);
        self.len -= 1;
    }

    /// Check the red-black and ordering properties, returning the black height
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> usize {
        assert_eq!(Color::Black, self.color(NodeId::NIL), "sentinel must stay black");
        assert_eq!(Color::Black, self.color(self.root), "root must be black");
        if !self.root.is_nil() {
            assert!(self.parent(self.root).is_nil(), "root must hang off the sentinel");
        }

        let mut count = 0;
        let height = self.check_subtree(self.root, None, None, &mut count);
        assert_eq!(self.len, count, "tracked length drifted");
        height
    }

    #[cfg(test)]
    fn check_subtree(&self, id: NodeId, low: Option<A>, high: Option<A>, count: &mut usize) -> usize {
        if id.is_nil() {
            return 1;
        }

        *count += 1;
        let node = self.node(id);
        assert!(node.start <= node.end);
        if let Some(low) = low {
            assert!(node.start > low, "{:?} out of order after {:?}", node.start, low);
        }
        if let Some(high) = high {
            assert!(node.end < high, "{:?} out of order before {:?}", node.end, high);
        }

        for child in [node.left, node.right] {
            if !child.is_nil() {
                assert_eq!(id, self.parent(child), "broken parent link");
                if node.color == Color::Red {
                    assert_eq!(Color::Black, self.color(child), "red node with red child");
                }
            }
        }

        let left = self.check_subtree(node.left, low, Some(node.start), count);
        let right = self.check_subtree(node.right, Some(node.end), high, count);
        assert_eq!(left, right, "black height mismatch below {:?}", node.start);

        left + usize::from(node.color == Color::Black)
    }
}
