//! Cursor traits and the grid's own cursor implementation.
//!
//! Traversal algorithms only see two capability groups:
//!
//! - [`Navigate`]: move through one tree (root, child, parent, leaf test)
//! - [`CellAccess`]: read the current cell (id, mask bit, active scalar)
//!
//! Anything implementing both is a [`HyperTreeCursor`].

use smallvec::SmallVec;

use super::field::CellArray;
use super::mask::BitMask;
use super::tree::{HyperTree, TreeNode};
use super::CellId;
use crate::error::{ThresholdError, ThresholdResult};

/// Tree navigation.
pub trait Navigate {
  /// Move back to the root.
  fn to_root(&mut self);

  /// Descend into the `child`-th child (0..child_count).
  fn to_child(&mut self, child: usize) -> ThresholdResult<()>;

  /// Ascend to the parent.
  fn to_parent(&mut self) -> ThresholdResult<()>;

  fn is_leaf(&self) -> bool;

  /// Number of children of the current node (0 for leaves).
  fn child_count(&self) -> usize;

  /// Geometric slot of the `child`-th child.
  fn child_slot(&self, child: usize) -> ThresholdResult<u8>;

  /// Depth of the current node (root = 0).
  fn depth(&self) -> usize;
}

/// Cell attribute access at the cursor position.
pub trait CellAccess {
  fn global_id(&self) -> CellId;

  /// True when the input mask hides the current cell.
  fn is_masked(&self) -> bool;

  /// Active scalar value of the current cell.
  fn scalar(&self) -> ThresholdResult<f64>;
}

/// Full cursor capability used by the threshold descents.
pub trait HyperTreeCursor: Navigate + CellAccess {}

impl<T: Navigate + CellAccess> HyperTreeCursor for T {}

/// Navigation-only cursor over a [`HyperTree`].
#[derive(Clone, Debug)]
pub struct TreeCursor<'a> {
  tree: &'a HyperTree,
  current: &'a TreeNode,
  ancestors: SmallVec<[&'a TreeNode; 16]>,
}

impl<'a> TreeCursor<'a> {
  /// Cursor positioned at the root.
  pub fn new(tree: &'a HyperTree) -> ThresholdResult<Self> {
    let current = tree
      .node(tree.root())
      .ok_or_else(|| ThresholdError::structure("tree without a root node"))?;
    Ok(Self {
      tree,
      current,
      ancestors: SmallVec::new(),
    })
  }

  pub fn tree(&self) -> &'a HyperTree {
    self.tree
  }

  /// Current node.
  #[inline]
  pub fn node(&self) -> &'a TreeNode {
    self.current
  }
}

impl Navigate for TreeCursor<'_> {
  fn to_root(&mut self) {
    if let Some(&root) = self.ancestors.first() {
      self.current = root;
    }
    self.ancestors.clear();
  }

  fn to_child(&mut self, child: usize) -> ThresholdResult<()> {
    let links = self.tree.children(self.current);
    let link = links.get(child).ok_or_else(|| {
      ThresholdError::structure(format!(
        "child {child} requested from a node with {} children",
        links.len()
      ))
    })?;
    let next = self.tree.node(link.node).ok_or_else(|| {
      ThresholdError::structure(format!("child link {link:?} points outside the tree"))
    })?;
    self.ancestors.push(self.current);
    self.current = next;
    Ok(())
  }

  fn to_parent(&mut self) -> ThresholdResult<()> {
    self.current = self
      .ancestors
      .pop()
      .ok_or_else(|| ThresholdError::structure("cannot ascend above the root"))?;
    Ok(())
  }

  #[inline]
  fn is_leaf(&self) -> bool {
    self.current.is_leaf()
  }

  #[inline]
  fn child_count(&self) -> usize {
    self.current.link_count()
  }

  fn child_slot(&self, child: usize) -> ThresholdResult<u8> {
    self
      .tree
      .children(self.current)
      .get(child)
      .map(|link| link.slot)
      .ok_or_else(|| ThresholdError::structure(format!("no child {child} at this node")))
  }

  #[inline]
  fn depth(&self) -> usize {
    self.ancestors.len()
  }
}

/// Cursor over one tree of a grid, with the grid's mask and active scalars.
#[derive(Clone, Debug)]
pub struct GridCursor<'a> {
  nav: TreeCursor<'a>,
  scalars: Option<&'a CellArray>,
  mask: Option<&'a BitMask>,
}

impl<'a> GridCursor<'a> {
  pub fn new(
    tree: &'a HyperTree,
    scalars: Option<&'a CellArray>,
    mask: Option<&'a BitMask>,
  ) -> ThresholdResult<Self> {
    Ok(Self {
      nav: TreeCursor::new(tree)?,
      scalars,
      mask,
    })
  }

  pub fn node(&self) -> &'a TreeNode {
    self.nav.node()
  }
}

impl Navigate for GridCursor<'_> {
  fn to_root(&mut self) {
    self.nav.to_root()
  }

  fn to_child(&mut self, child: usize) -> ThresholdResult<()> {
    self.nav.to_child(child)
  }

  fn to_parent(&mut self) -> ThresholdResult<()> {
    self.nav.to_parent()
  }

  fn is_leaf(&self) -> bool {
    self.nav.is_leaf()
  }

  fn child_count(&self) -> usize {
    self.nav.child_count()
  }

  fn child_slot(&self, child: usize) -> ThresholdResult<u8> {
    self.nav.child_slot(child)
  }

  fn depth(&self) -> usize {
    self.nav.depth()
  }
}

impl CellAccess for GridCursor<'_> {
  #[inline]
  fn global_id(&self) -> CellId {
    self.nav.node().cell
  }

  #[inline]
  fn is_masked(&self) -> bool {
    self.mask.is_some_and(|mask| mask.get(self.global_id()))
  }

  fn scalar(&self) -> ThresholdResult<f64> {
    let scalars = self.scalars.ok_or(ThresholdError::MissingActiveScalars)?;
    let id = self.global_id();
    scalars.value(id).ok_or_else(|| ThresholdError::CellOutOfRange {
      id,
      name: scalars.name().to_string(),
      len: scalars.len(),
    })
  }
}

#[cfg(test)]
#[path = "cursor_test.rs"]
mod cursor_test;
