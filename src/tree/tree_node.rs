use crate::tree::NodeIdx::{self, Internal as Int, Leaf};

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub idx: NodeIdx,
    pub parent: Option<NodeIdx>,
    pub children: Vec<NodeIdx>,
    pub id: String,
}

impl Node {
    pub(crate) fn new_leaf(idx: usize, id: String) -> Self {
        Self {
            idx: Leaf(idx),
            parent: None,
            children: Vec::new(),
            id,
        }
    }

    pub(crate) fn new_empty_internal(idx: usize) -> Self {
        Self {
            idx: Int(idx),
            parent: None,
            children: Vec::new(),
            id: String::new(),
        }
    }

    pub(crate) fn add_parent(&mut self, parent_idx: &NodeIdx) {
        debug_assert!(matches!(parent_idx, Int(_)));
        self.parent = Some(*parent_idx);
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.idx, Leaf(_))
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
