use std::collections::HashMap;

use rand::Rng;

use crate::geometry::Cell;

/// Interior cells not covered by the snake or the food. Dense vector for
/// uniform picks, index map for constant-time removal.
#[derive(Debug, Default, Clone)]
pub struct FreeCells {
    cells: Vec<Cell>,
    index: HashMap<Cell, usize>,
}

impl FreeCells {
    pub fn with_capacity(capacity: usize) -> Self {
        FreeCells { cells: Vec::with_capacity(capacity), index: HashMap::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.index.contains_key(&cell)
    }

    /// Returns false if the cell was already free.
    pub fn insert(&mut self, cell: Cell) -> bool {
        if self.index.contains_key(&cell) {
            return false;
        }

        self.index.insert(cell, self.cells.len());
        self.cells.push(cell);
        true
    }

    /// Returns false if the cell was not free.
    pub fn remove(&mut self, cell: Cell) -> bool {
        let Some(pos) = self.index.remove(&cell) else {
            return false;
        };

        self.cells.swap_remove(pos);
        if let Some(moved) = self.cells.get(pos) {
            self.index.insert(*moved, pos);
        }
        true
    }

    /// Draws a cell uniformly at random, or None when nothing is free.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Cell> {
        if self.cells.is_empty() {
            return None;
        }

        Some(self.cells[rng.gen_range(0..self.cells.len())])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }
}

impl FromIterator<Cell> for FreeCells {
    fn from_iter<I: IntoIterator<Item = Cell>>(iter: I) -> Self {
        let mut free = FreeCells::default();
        for cell in iter {
            free.insert(cell);
        }
        free
    }
}
