use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::cell::Cell;
use crate::error::CellError;
use crate::hash::CellHash;

/// Handle of a cell inside a [`BagOfCells`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(u32);

impl CellId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An arena of cells plus a designated root: the unit of (de)serialization.
///
/// Responsibilities:
/// - Deduplication: cells with identical content share one id
/// - Acyclicity: a cell can only be added after all of its children, so
///   children always have smaller ids than their parents
///
/// Importing a tree adds every nested child too, so subtrees reachable via
/// several paths end up stored once.
#[derive(Debug, Default)]
pub struct BagOfCells {
    cells: Vec<Arc<Cell>>,
    children: Vec<Vec<CellId>>,
    index: HashMap<CellHash, CellId>,
    root: Option<CellId>,
}

impl BagOfCells {
    /// Creates a new empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bag holding the tree under `root`, with `root` as its root.
    pub fn with_root(root: &Arc<Cell>) -> Self {
        let mut bag = Self::new();
        let id = bag.import(root);
        bag.root = Some(id);
        bag
    }

    /// Adds an ordinary cell whose children are already in the bag.
    pub fn add(
        &mut self,
        data: Vec<u8>,
        bit_len: usize,
        children: &[CellId],
    ) -> Result<CellId, CellError> {
        self.add_with_descriptor(data, bit_len, children, false, 0)
    }

    /// Adds a cell with explicit descriptor flags.
    ///
    /// If a cell with the same content already exists, returns its id.
    pub fn add_with_descriptor(
        &mut self,
        data: Vec<u8>,
        bit_len: usize,
        children: &[CellId],
        exotic: bool,
        level_mask: u8,
    ) -> Result<CellId, CellError> {
        let refs = children
            .iter()
            .map(|id| self.get(*id).cloned().ok_or(CellError::UnknownCell(*id)))
            .collect::<Result<Vec<_>, _>>()?;
        let cell = Cell::with_descriptor(data, bit_len, refs, exotic, level_mask)?;

        let key = cell.hash();
        if let Some(existing) = self.index.get(&key) {
            return Ok(*existing);
        }
        Ok(self.push(key, Arc::new(cell), children.to_vec()))
    }

    /// Imports a cell tree, returning the id of its top cell.
    ///
    /// All nested children are imported first; already known content is
    /// reused rather than stored again.
    pub fn import(&mut self, cell: &Arc<Cell>) -> CellId {
        let key = cell.hash();
        if let Some(existing) = self.index.get(&key) {
            return *existing;
        }

        let children: Vec<CellId> = cell.refs().iter().map(|child| self.import(child)).collect();
        self.push(key, Arc::clone(cell), children)
    }

    fn push(&mut self, key: CellHash, cell: Arc<Cell>, children: Vec<CellId>) -> CellId {
        let id = CellId(self.cells.len() as u32);
        self.cells.push(cell);
        self.children.push(children);
        self.index.insert(key, id);
        id
    }

    pub fn set_root(&mut self, id: CellId) -> Result<(), CellError> {
        if id.index() >= self.cells.len() {
            return Err(CellError::UnknownCell(id));
        }
        self.root = Some(id);
        Ok(())
    }

    pub fn root(&self) -> Option<CellId> {
        self.root
    }

    /// Returns the root cell; an unset root is a structural failure.
    pub fn root_cell(&self) -> Result<Arc<Cell>, CellError> {
        self.root
            .and_then(|id| self.get(id))
            .cloned()
            .ok_or(CellError::NoRoot)
    }

    pub fn get(&self, id: CellId) -> Option<&Arc<Cell>> {
        self.cells.get(id.index())
    }

    pub fn children(&self, id: CellId) -> Option<&[CellId]> {
        self.children.get(id.index()).map(Vec::as_slice)
    }

    /// Looks up a cell by content hash.
    pub fn find(&self, hash: &CellHash) -> Option<CellId> {
        self.index.get(hash).copied()
    }

    /// Returns the number of distinct cells in the bag.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Ids of every cell reachable from the root, root first.
    ///
    /// Since children always have smaller ids, descending id order puts every
    /// cell before all of its descendants.
    pub fn reachable(&self) -> Result<Vec<CellId>, CellError> {
        let root = self.root.ok_or(CellError::NoRoot)?;
        if root.index() >= self.cells.len() {
            return Err(CellError::NoRoot);
        }

        let mut seen = vec![false; self.cells.len()];
        let mut pending = vec![root];
        seen[root.index()] = true;
        while let Some(id) = pending.pop() {
            for child in &self.children[id.index()] {
                if !seen[child.index()] {
                    seen[child.index()] = true;
                    pending.push(*child);
                }
            }
        }

        Ok(seen
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, reached)| **reached)
            .map(|(i, _)| CellId(i as u32))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(byte: u8) -> Arc<Cell> {
        Arc::new(Cell::new(vec![byte], 8, vec![]).unwrap())
    }

    #[test]
    fn bag_add_and_get() {
        let mut bag = BagOfCells::new();
        let id = bag.add(vec![0x42], 8, &[]).unwrap();

        assert_eq!(bag.len(), 1);
        assert_eq!(bag.get(id).unwrap().data(), &[0x42]);
        assert_eq!(bag.find(&bag.get(id).unwrap().hash()), Some(id));
    }

    #[test]
    fn bag_deduplication() {
        let mut bag = BagOfCells::new();
        let a = bag.add(vec![0x01], 8, &[]).unwrap();
        let b = bag.add(vec![0x01], 8, &[]).unwrap();

        assert_eq!(a, b);
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn bag_children_must_exist() {
        let mut bag = BagOfCells::new();
        let missing = CellId(7);
        assert!(matches!(
            bag.add(vec![], 0, &[missing]),
            Err(CellError::UnknownCell(id)) if id == missing
        ));
        assert!(bag.is_empty());
    }

    #[test]
    fn bag_children_precede_parents() {
        let mut bag = BagOfCells::new();
        let child = bag.add(vec![0x01], 8, &[]).unwrap();
        let parent = bag.add(vec![], 0, &[child, child]).unwrap();

        assert!(child < parent);
        assert_eq!(bag.children(parent).unwrap(), &[child, child]);
        let cell = bag.get(parent).unwrap();
        assert_eq!(cell.refs().len(), 2);
    }

    #[test]
    fn bag_import_shared_subtree_once() {
        let shared = leaf(0xaa);
        let left = Arc::new(Cell::new(vec![0x01], 8, vec![shared.clone()]).unwrap());
        let right = Arc::new(Cell::new(vec![0x02], 8, vec![shared.clone()]).unwrap());
        let root = Arc::new(Cell::new(vec![], 0, vec![left, right, shared]).unwrap());

        let bag = BagOfCells::with_root(&root);

        // root, left, right and one shared leaf
        assert_eq!(bag.len(), 4);
        assert_eq!(bag.root_cell().unwrap(), root);
    }

    #[test]
    fn bag_import_equal_content_from_distinct_arcs() {
        let root = Arc::new(Cell::new(vec![], 0, vec![leaf(7), leaf(7)]).unwrap());
        let bag = BagOfCells::with_root(&root);
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn bag_without_root() {
        let mut bag = BagOfCells::new();
        bag.add(vec![], 0, &[]).unwrap();
        assert!(matches!(bag.root_cell(), Err(CellError::NoRoot)));
        assert!(matches!(bag.reachable(), Err(CellError::NoRoot)));
        assert!(bag.set_root(CellId(3)).is_err());
    }

    #[test]
    fn bag_reachable_skips_unrelated_cells() {
        let mut bag = BagOfCells::new();
        let unrelated = bag.add(vec![0xff], 8, &[]).unwrap();
        let child = bag.add(vec![0x01], 8, &[]).unwrap();
        let root = bag.add(vec![0x02], 8, &[child]).unwrap();
        bag.set_root(root).unwrap();

        assert_eq!(bag.reachable().unwrap(), vec![root, child]);
        assert!(!bag.reachable().unwrap().contains(&unrelated));
    }
}
