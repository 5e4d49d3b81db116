use std::fmt::{self, Display};

use anyhow::bail;
use hashbrown::HashSet;

use crate::Result;
use NodeIdx::{Internal as Int, Leaf};

mod tree_node;
pub mod tree_parser;

pub use tree_node::Node;

#[derive(Debug, PartialEq, Clone, Copy, PartialOrd, Eq, Ord, Hash)]
pub enum NodeIdx {
    Internal(usize),
    Leaf(usize),
}

impl Display for NodeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Int(idx) => write!(f, "Internal node {}", idx),
            Leaf(idx) => write!(f, "Leaf node {}", idx),
        }
    }
}

impl From<NodeIdx> for usize {
    fn from(node_idx: NodeIdx) -> usize {
        match node_idx {
            Int(idx) => idx,
            Leaf(idx) => idx,
        }
    }
}

impl From<&NodeIdx> for usize {
    fn from(node_idx: &NodeIdx) -> usize {
        usize::from(*node_idx)
    }
}

/// Rooted tree stored as an arena of nodes in preorder.
/// Parent and child links are indices into the arena, the tree is read-only once parsed.
#[derive(Debug, Clone)]
pub struct Tree {
    pub root: NodeIdx,
    pub(crate) nodes: Vec<Node>,
    pub preorder: Vec<NodeIdx>,
    /// Number of leaves.
    pub n: usize,
}

impl Tree {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: &NodeIdx) -> &Node {
        &self.nodes[usize::from(idx)]
    }

    pub fn node_id(&self, idx: &NodeIdx) -> &str {
        &self.nodes[usize::from(idx)].id
    }

    pub fn parent(&self, idx: &NodeIdx) -> Option<NodeIdx> {
        self.nodes[usize::from(idx)].parent
    }

    pub fn children(&self, idx: &NodeIdx) -> &[NodeIdx] {
        &self.nodes[usize::from(idx)].children
    }

    /// Leaves in the order they appear in the newick string.
    pub fn leaves(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| node.is_leaf())
    }

    /// Internal nodes in preorder.
    pub fn internals(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| !node.is_leaf())
    }

    pub fn leaf_ids(&self) -> Vec<String> {
        self.leaves().map(|node| node.id.clone()).collect()
    }

    pub fn internal_ids(&self) -> Vec<String> {
        self.internals().map(|node| node.id.clone()).collect()
    }

    pub fn try_idx(&self, id: &str) -> Result<NodeIdx> {
        match self.nodes.iter().find(|node| node.id == id) {
            Some(node) => Ok(node.idx),
            None => bail!("No node with id {} found in the tree", id),
        }
    }

    /// Returns the path from the node up to the root, the node itself first and the root last.
    pub fn path_to_root(&self, idx: &NodeIdx) -> Vec<NodeIdx> {
        let mut path = vec![*idx];
        let mut cur = *idx;
        while let Some(parent) = self.parent(&cur) {
            path.push(parent);
            cur = parent;
        }
        path
    }

    /// Gives every internal node without a label the name `Node{k}`, where `k` is the 1-based
    /// position of the node among all internal nodes in preorder. Existing labels are kept,
    /// so calling this again changes nothing.
    pub fn assign_internal_names(&mut self) {
        let mut k = 0;
        for i in 0..self.preorder.len() {
            let idx = self.preorder[i];
            if let Int(_) = idx {
                k += 1;
                let node = &mut self.nodes[usize::from(idx)];
                if node.id.is_empty() {
                    node.id = format!("Node{}", k);
                }
            }
        }
    }

    pub fn duplicate_leaf_ids(&self) -> Vec<String> {
        let mut seen = HashSet::with_capacity(self.n);
        let mut duplicates = Vec::new();
        for node in self.leaves() {
            if !seen.insert(node.id.as_str()) && !duplicates.contains(&node.id) {
                duplicates.push(node.id.clone());
            }
        }
        duplicates
    }

    pub(crate) fn compute_preorder(&mut self) {
        let mut order = Vec::<NodeIdx>::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(cur_root) = stack.pop() {
            order.push(cur_root);
            stack.extend(self.children(&cur_root).iter().rev().copied());
        }
        self.preorder = order;
    }
}
