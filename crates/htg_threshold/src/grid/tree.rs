//! HyperTree - arena-and-index storage for one tree of a grid.
//!
//! Nodes live in a flat arena and reference their children through a
//! separate link table. Trees are built bottom-up by [`TreeBuilder`]: a
//! branch is only pushed once all of its kept children exist, so the root
//! is always the last node of the arena.
//!
//! ```text
//! nodes: [ leaf a | leaf b | leaf c | branch(links 0..3) ]
//! links: [ (slot 0 → a) (slot 1 → b) (slot 3 → c) ]
//! ```
//!
//! Links carry the geometric child slot, so a tree may be sparse (a pruned
//! output tree keeps only the children that survived).

use smallvec::SmallVec;

use super::CellId;
use crate::error::{try_push, ThresholdError, ThresholdResult};

/// Position of a node in a tree's arena.
pub type NodeIndex = u32;

/// Placeholder cell id for branches whose id is assigned after
/// construction (see [`HyperTree::number_branches`]).
pub const UNASSIGNED_CELL: CellId = CellId::MAX;

/// Edge from a branch to one of its children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChildLink {
  /// Geometric child slot within the parent (0..child_count).
  pub slot: u8,
  /// Arena index of the child.
  pub node: NodeIndex,
}

/// One node of a tree. A node without links is a leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeNode {
  /// Grid-unique cell id.
  pub cell: CellId,
  first_link: u32,
  link_count: u8,
}

impl TreeNode {
  #[inline]
  pub fn is_leaf(&self) -> bool {
    self.link_count == 0
  }

  #[inline]
  pub fn link_count(&self) -> usize {
    self.link_count as usize
  }
}

/// A single rooted tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HyperTree {
  nodes: Vec<TreeNode>,
  links: Vec<ChildLink>,
}

impl HyperTree {
  /// Arena index of the root.
  #[inline]
  pub fn root(&self) -> NodeIndex {
    (self.nodes.len() - 1) as NodeIndex
  }

  #[inline]
  pub fn node(&self, index: NodeIndex) -> Option<&TreeNode> {
    self.nodes.get(index as usize)
  }

  /// Child links of a node, in slot order.
  #[inline]
  pub fn children(&self, node: &TreeNode) -> &[ChildLink] {
    let start = node.first_link as usize;
    self
      .links
      .get(start..start + node.link_count())
      .unwrap_or(&[])
  }

  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  pub fn leaf_count(&self) -> usize {
    self.nodes.iter().filter(|n| n.is_leaf()).count()
  }

  /// Arena-order iteration over all nodes.
  pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> {
    self.nodes.iter()
  }

  /// Leaf cell ids in depth-first (slot) order.
  pub fn leaf_cells(&self) -> Vec<CellId> {
    let mut cells = Vec::with_capacity(self.leaf_count());
    self.visit_depth_first(|node, _| {
      if node.is_leaf() {
        cells.push(node.cell);
      }
    });
    cells
  }

  /// Maximum depth (root = 0).
  pub fn depth(&self) -> usize {
    let mut depth = 0;
    self.visit_depth_first(|_, d| depth = depth.max(d));
    depth
  }

  /// Same topology (slots at every level), ignoring cell ids.
  pub fn same_structure(&self, other: &HyperTree) -> bool {
    fn walk(a: &HyperTree, an: &TreeNode, b: &HyperTree, bn: &TreeNode) -> bool {
      let (ac, bc) = (a.children(an), b.children(bn));
      ac.len() == bc.len()
        && ac.iter().zip(bc).all(|(x, y)| {
          x.slot == y.slot
            && match (a.node(x.node), b.node(y.node)) {
              (Some(xn), Some(yn)) => walk(a, xn, b, yn),
              _ => false,
            }
        })
    }
    match (self.node(self.root()), other.node(other.root())) {
      (Some(a), Some(b)) => walk(self, a, other, b),
      _ => false,
    }
  }

  /// Pre-order walk with depth.
  pub fn visit_depth_first(&self, mut visit: impl FnMut(&TreeNode, usize)) {
    let mut stack: SmallVec<[(NodeIndex, usize); 32]> = SmallVec::new();
    stack.push((self.root(), 0));
    while let Some((index, depth)) = stack.pop() {
      let Some(node) = self.node(index) else {
        continue;
      };
      visit(node, depth);
      for link in self.children(node).iter().rev() {
        stack.push((link.node, depth + 1));
      }
    }
  }

  /// Assign ids to branches still holding [`UNASSIGNED_CELL`], in arena
  /// order, starting at `*next`.
  pub(crate) fn number_branches(&mut self, next: &mut CellId) {
    for node in self.nodes.iter_mut() {
      if !node.is_leaf() && node.cell == UNASSIGNED_CELL {
        node.cell = *next;
        *next += 1;
      }
    }
  }

  /// Check arena consistency against a branch arity and cell count.
  pub(crate) fn validate(&self, child_count: usize, cell_count: usize) -> ThresholdResult<()> {
    for (index, node) in self.nodes.iter().enumerate() {
      if node.cell >= cell_count {
        return Err(ThresholdError::structure(format!(
          "node {index} has cell id {} but the grid has {cell_count} cells",
          node.cell
        )));
      }
      if node.link_count() > child_count {
        return Err(ThresholdError::structure(format!(
          "node {index} has {} children, arity is {child_count}",
          node.link_count()
        )));
      }
      let start = node.first_link as usize;
      let Some(links) = self.links.get(start..start + node.link_count()) else {
        return Err(ThresholdError::structure(format!(
          "node {index} links past the end of the link table"
        )));
      };
      for link in links {
        if link.slot as usize >= child_count || link.node as usize >= index {
          return Err(ThresholdError::structure(format!(
            "node {index} has invalid child link {link:?}"
          )));
        }
      }
    }
    Ok(())
  }
}

/// Scratch child list of a branch under construction.
///
/// Children are collected here and only attached to the arena when the
/// branch is closed; dropping it discards the subdivision.
#[derive(Debug, Default)]
pub struct Subdivision {
  links: SmallVec<[ChildLink; 8]>,
  checkpoint: (usize, usize),
}

impl Subdivision {
  /// Record a kept child at a geometric slot.
  #[inline]
  pub fn attach(&mut self, slot: u8, node: NodeIndex) {
    self.links.push(ChildLink { slot, node });
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.links.is_empty()
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.links.len()
  }
}

/// Bottom-up writer for a [`HyperTree`].
#[derive(Debug, Default)]
pub struct TreeBuilder {
  nodes: Vec<TreeNode>,
  links: Vec<ChildLink>,
}

impl TreeBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of nodes pushed so far.
  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  /// Push a leaf.
  pub fn leaf(&mut self, cell: CellId) -> ThresholdResult<NodeIndex> {
    self.push_node(TreeNode {
      cell,
      first_link: 0,
      link_count: 0,
    })
  }

  /// Begin a speculative branch.
  pub fn open_subdivision(&self) -> Subdivision {
    Subdivision {
      links: SmallVec::new(),
      checkpoint: (self.nodes.len(), self.links.len()),
    }
  }

  /// Attach a subdivision as a branch node.
  pub fn close(&mut self, subdivision: Subdivision, cell: CellId) -> ThresholdResult<NodeIndex> {
    if subdivision.is_empty() {
      return Err(ThresholdError::structure("closing a branch without children"));
    }
    let link_count = u8::try_from(subdivision.len())
      .map_err(|_| ThresholdError::structure("branch with more than 255 children"))?;
    let first_link = self.links.len() as u32;
    for link in subdivision.links {
      try_push(&mut self.links, link)?;
    }
    self.push_node(TreeNode {
      cell,
      first_link,
      link_count,
    })
  }

  /// Drop a subdivision together with anything pushed since it was opened.
  #[inline]
  pub fn discard(&mut self, subdivision: Subdivision) {
    let (nodes, links) = subdivision.checkpoint;
    self.nodes.truncate(nodes);
    self.links.truncate(links);
  }

  /// Finish the tree; the last pushed node becomes the root.
  ///
  /// Returns None when nothing was kept.
  pub fn finish(self) -> Option<HyperTree> {
    if self.nodes.is_empty() {
      return None;
    }
    Some(HyperTree {
      nodes: self.nodes,
      links: self.links,
    })
  }

  fn push_node(&mut self, node: TreeNode) -> ThresholdResult<NodeIndex> {
    let index = NodeIndex::try_from(self.nodes.len())
      .map_err(|_| ThresholdError::structure("tree arena exceeds u32 nodes"))?;
    try_push(&mut self.nodes, node)?;
    Ok(index)
  }
}

#[cfg(test)]
#[path = "tree_test.rs"]
mod tree_test;
