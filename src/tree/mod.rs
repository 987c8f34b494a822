pub mod parse;

use indexmap::IndexMap;

use crate::utils::datastruct::arena::{Arena, Slot};

/// Handle of a node inside one `MathTree`.
/// Only meaningful for the tree that issued it.
pub type NodeId = Slot;

/// Local name of a formula root element
pub const MATH_ELEMENT: &str = "math";

/// Deepest element nesting the pipeline accepts.
/// Deeper markup is rejected with a parse error before any recursive walk.
pub const MAX_NESTING_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// local name, namespace prefix dropped
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<NodeId>,
}

/// Expression tree stored in a node table.
///
/// Nodes live in a generational arena and refer to their children by
/// `NodeId`. Copies between trees go through `subtree` / `deep_copy`,
/// which allocate a fresh compact table, so a copied tree never shares a
/// node with its source.
#[derive(Debug, Clone, Default)]
pub struct MathTree {
    arena: Arena<Node>,
    root: Option<NodeId>,
}

impl MathTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// number of live nodes (elements and text)
    #[inline]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Allocate a detached element
    pub fn element(&mut self, name: impl Into<String>) -> NodeId {
        self.arena.alloc(Node::Element(Element {
            name: name.into(),
            ..Element::default()
        }))
    }

    /// Allocate a detached text node
    pub fn text(&mut self, text: impl Into<String>) -> NodeId {
        self.arena.alloc(Node::Text(text.into()))
    }

    /// Append `child` to `parent`. Ignored when `parent` is not an element.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(el) = self.element_mut(parent) {
            el.children.push(child);
        }
    }

    pub fn set_attribute(&mut self, id: NodeId, key: impl Into<String>, value: impl Into<String>) {
        if let Some(el) = self.element_mut(id) {
            el.attributes.insert(key.into(), value.into());
        }
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    #[inline]
    pub fn element_ref(&self, id: NodeId) -> Option<&Element> {
        match self.arena.get(id)? {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    #[inline]
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.arena.get_mut(id)? {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    /// Element name, `None` for text nodes, stale ids and nameless elements
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.element_ref(id)
            .map(|el| el.name.as_str())
            .filter(|name| !name.is_empty())
    }

    #[inline]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.element_ref(id).is_some()
    }

    #[inline]
    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.arena.get(id), Some(Node::Text(_)))
    }

    /// Children of an element, empty for text nodes
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.element_ref(id)
            .map(|el| el.children.as_slice())
            .unwrap_or(&[])
    }

    /// Replace the child sequence. Nodes dropped from the sequence are not freed.
    pub fn set_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        if let Some(el) = self.element_mut(id) {
            el.children = children;
        }
    }

    pub fn rename(&mut self, id: NodeId, name: impl Into<String>) {
        if let Some(el) = self.element_mut(id) {
            el.name = name.into();
        }
    }

    pub fn attributes(&self, id: NodeId) -> Option<&IndexMap<String, String>> {
        self.element_ref(id).map(|el| &el.attributes)
    }

    pub fn attributes_mut(&mut self, id: NodeId) -> Option<&mut IndexMap<String, String>> {
        self.element_mut(id).map(|el| &mut el.attributes)
    }

    /// Concatenated text of the node and all its descendants
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.arena.get(id) {
            Some(Node::Text(t)) => out.push_str(t),
            Some(Node::Element(el)) => {
                for &child in &el.children {
                    self.collect_text(child, out);
                }
            }
            None => {}
        }
    }

    /// Replace every child of an element with a single text node.
    /// An empty `text` leaves the element without children.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        let old = match self.arena.get_mut(id) {
            Some(Node::Element(el)) => std::mem::take(&mut el.children),
            Some(Node::Text(t)) => {
                *t = text.to_string();
                return;
            }
            None => return,
        };
        for child in old {
            self.remove_subtree(child);
        }
        if !text.is_empty() {
            let leaf = self.text(text);
            self.append_child(id, leaf);
        }
    }

    /// Free a node and all its descendants.
    /// The caller is responsible for unlinking it from its parent.
    pub fn remove_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(Node::Element(el)) = self.arena.dealloc(current) {
                stack.extend(el.children);
            }
        }
        if self.root == Some(id) {
            self.root = None;
        }
    }

    /// Compact owned copy of the subtree rooted at `id`
    pub fn subtree(&self, id: NodeId) -> MathTree {
        let mut out = MathTree::new();
        out.root = self.copy_into(id, &mut out);
        out
    }

    /// Compact owned copy of the whole tree
    pub fn deep_copy(&self) -> MathTree {
        match self.root {
            Some(root) => self.subtree(root),
            None => MathTree::new(),
        }
    }

    fn copy_into(&self, id: NodeId, out: &mut MathTree) -> Option<NodeId> {
        match self.arena.get(id)? {
            Node::Text(t) => Some(out.text(t.clone())),
            Node::Element(el) => {
                let children = el
                    .children
                    .iter()
                    .filter_map(|&child| self.copy_into(child, out))
                    .collect();
                Some(out.arena.alloc(Node::Element(Element {
                    name: el.name.clone(),
                    attributes: el.attributes.clone(),
                    children,
                })))
            }
        }
    }

    /// Number of element nodes in the subtree, `id` included
    pub fn count_elements(&self, id: NodeId) -> usize {
        self.descendants(id)
            .into_iter()
            .filter(|&node| self.is_element(node))
            .count()
    }

    /// Element nesting depth of the subtree, 1 for a childless element.
    /// Text nodes do not count.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(id, 1)];
        while let Some((current, level)) = stack.pop() {
            if !self.is_element(current) {
                continue;
            }
            deepest = deepest.max(level);
            stack.extend(self.children(current).iter().map(|&child| (child, level + 1)));
        }
        deepest
    }

    /// Pre-order walk of the subtree, `id` first
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.arena.contains(current) {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Every `math` element in document order.
    /// A root found inside another root is not reported separately.
    pub fn math_roots(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(current) = stack.pop() {
            if self.name(current) == Some(MATH_ELEMENT) {
                out.push(current);
                continue;
            }
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Drop text children that are empty after trimming, recursively
    pub fn remove_whitespace_text(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        if children.is_empty() {
            return;
        }
        let mut kept = Vec::with_capacity(children.len());
        for child in children {
            let blank = match self.arena.get(child) {
                Some(Node::Text(t)) => t.trim().is_empty(),
                Some(Node::Element(_)) => false,
                None => continue,
            };
            if blank {
                self.remove_subtree(child);
            } else {
                self.remove_whitespace_text(child);
                kept.push(child);
            }
        }
        self.set_children(id, kept);
    }

    /// Remove every attribute of the subtree
    pub fn strip_attributes(&mut self, id: NodeId) {
        for node in self.descendants(id) {
            if let Some(attrs) = self.attributes_mut(node) {
                attrs.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (MathTree, NodeId) {
        let mut tree = MathTree::new();
        let row = tree.element("mrow");
        tree.set_root(row);
        let a = tree.element("mi");
        let a_text = tree.text("a");
        tree.append_child(a, a_text);
        let op = tree.element("mo");
        let op_text = tree.text("+");
        tree.append_child(op, op_text);
        let ws = tree.text("  \n");
        tree.append_child(row, a);
        tree.append_child(row, ws);
        tree.append_child(row, op);
        tree.set_attribute(a, "mathvariant", "bold");
        (tree, row)
    }

    #[test]
    fn text_content_and_counts() {
        let (tree, row) = sample();
        assert_eq!(tree.text_content(row), "a  \n+");
        assert_eq!(tree.count_elements(row), 3);
        assert_eq!(tree.descendants(row).len(), 6);
        assert_eq!(tree.depth(row), 2);
    }

    #[test]
    fn depth_of_long_chain() {
        let mut tree = MathTree::default();
        let mut parent = tree.element("msqrt");
        tree.set_root(parent);
        for _ in 0..5_000 {
            let child = tree.element("msqrt");
            tree.append_child(parent, child);
            parent = child;
        }
        let leaf = tree.text("x");
        tree.append_child(parent, leaf);
        let root = tree.root().unwrap();
        assert_eq!(tree.depth(root), 5_001);
        assert_eq!(tree.count_elements(root), 5_001);
    }

    #[test]
    fn subtree_copy_is_independent() {
        let (mut tree, row) = sample();
        let copy = tree.subtree(row);
        let copy_root = copy.root().unwrap();
        assert_eq!(copy.len(), tree.len());

        let first = tree.children(row)[0];
        tree.set_text_content(first, "z");
        tree.strip_attributes(row);
        assert_eq!(tree.text_content(row), "z  \n+");

        let copy_first = copy.children(copy_root)[0];
        assert_eq!(copy.text_content(copy_root), "a  \n+");
        assert_eq!(
            copy.attributes(copy_first).and_then(|a| a.get("mathvariant")).map(String::as_str),
            Some("bold")
        );
    }

    #[test]
    fn whitespace_text_is_removed_and_freed() {
        let (mut tree, row) = sample();
        let before = tree.len();
        tree.remove_whitespace_text(row);
        assert_eq!(tree.children(row).len(), 2);
        assert_eq!(tree.len(), before - 1);
        assert_eq!(tree.text_content(row), "a+");
    }

    #[test]
    fn set_text_content_replaces_children() {
        let (mut tree, row) = sample();
        tree.set_text_content(row, "x");
        assert_eq!(tree.children(row).len(), 1);
        assert_eq!(tree.len(), 2);
        tree.set_text_content(row, "");
        assert!(tree.children(row).is_empty());
    }

    #[test]
    fn math_roots_in_document_order() {
        let mut tree = MathTree::new();
        let body = tree.element("body");
        tree.set_root(body);
        let mut expected = Vec::new();
        for _ in 0..2 {
            let p = tree.element("p");
            let math = tree.element(MATH_ELEMENT);
            // nested roots are not reported on their own
            let inner = tree.element(MATH_ELEMENT);
            tree.append_child(math, inner);
            tree.append_child(p, math);
            tree.append_child(body, p);
            expected.push(math);
        }
        assert_eq!(tree.math_roots(), expected);
    }
}
