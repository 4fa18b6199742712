use std::fmt;

use crate::snake::Direction::{self, *};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Cell { x, y }
    }

    /// The neighbouring cell one unit towards `direction`. Rows grow downwards.
    pub fn step(self, direction: Direction) -> Cell {
        let (dx, dy) = match direction {
            Up => (0, -1),
            Down => (0, 1),
            Left => (-1, 0),
            Right => (1, 0),
        };

        Cell::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Rectangle whose outermost ring of cells is the wall. `width` and `height`
/// count the wall too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arena {
    pub origin: Cell,
    pub width: i32,
    pub height: i32,
}

impl Arena {
    pub const fn new(origin: Cell, width: i32, height: i32) -> Self {
        Arena { origin, width, height }
    }

    pub fn left(&self) -> i32 {
        self.origin.x
    }

    pub fn top(&self) -> i32 {
        self.origin.y
    }

    pub fn right(&self) -> i32 {
        self.origin.x + self.width - 1
    }

    pub fn bottom(&self) -> i32 {
        self.origin.y + self.height - 1
    }

    pub fn is_border(&self, cell: Cell) -> bool {
        let on_column = (cell.x == self.left() || cell.x == self.right())
            && (self.top()..=self.bottom()).contains(&cell.y);
        let on_row = (cell.y == self.top() || cell.y == self.bottom())
            && (self.left()..=self.right()).contains(&cell.x);

        on_column || on_row
    }

    pub fn is_interior(&self, cell: Cell) -> bool {
        cell.x > self.left() && cell.x < self.right() && cell.y > self.top() && cell.y < self.bottom()
    }

    /// Whether the far edges can be expressed in `i32` coordinates.
    pub fn is_representable(&self) -> bool {
        let edge = |start: i32, len: i32| len.checked_sub(1).and_then(|l| start.checked_add(l)).is_some();
        edge(self.origin.x, self.width) && edge(self.origin.y, self.height)
    }

    /// Number of playable cells, zero for degenerate arenas.
    pub fn capacity(&self) -> usize {
        let w = self.width.saturating_sub(2).max(0) as usize;
        let h = self.height.saturating_sub(2).max(0) as usize;
        w.saturating_mul(h)
    }

    /// Interior cells in row-major order.
    pub fn interior(&self) -> impl Iterator<Item = Cell> {
        let (left, right, top, bottom) = (self.left(), self.right(), self.top(), self.bottom());
        (top + 1..bottom).flat_map(move |y| (left + 1..right).map(move |x| Cell::new(x, y)))
    }

    pub fn center(&self) -> Cell {
        Cell::new((self.left() + self.right()) / 2, (self.top() + self.bottom()) / 2)
    }
}
