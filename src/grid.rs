//! Board storage: a fixed-size grid of cells, each holding at most one token.

use crate::tokens::Token;
use std::fmt;
use thiserror::Error;

/// Cell coordinate. `y = 0` is the top row; gravity pulls towards larger `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Neighbour `(dx, dy)` steps away, or None if it would go below zero.
    /// Upper bounds are the grid's business.
    pub fn offset(self, dx: isize, dy: isize) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("coordinate ({x}, {y}) is outside the {cols}x{rows} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        cols: usize,
        rows: usize,
    },
}

/// Column-major grid of optional tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cols: usize,
    rows: usize,
    cells: Vec<Option<Token>>,
}

impl Grid {
    /// Empty grid.
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![None; cols * rows],
        }
    }

    /// Grid whose cells are produced by `fill`, called in iteration order.
    pub fn filled_with(cols: usize, rows: usize, mut fill: impl FnMut(Coord) -> Option<Token>) -> Self {
        let mut grid = Self::new(cols, rows);
        for x in 0..cols {
            for y in 0..rows {
                let i = grid.idx(Coord::new(x, y));
                grid.cells[i] = fill(Coord::new(x, y));
            }
        }
        grid
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn contains(&self, at: Coord) -> bool {
        at.x < self.cols && at.y < self.rows
    }

    #[inline]
    fn idx(&self, at: Coord) -> usize {
        at.x * self.rows + at.y
    }

    fn check(&self, at: Coord) -> Result<usize, GridError> {
        if self.contains(at) {
            Ok(self.idx(at))
        } else {
            Err(GridError::OutOfBounds {
                x: at.x,
                y: at.y,
                cols: self.cols,
                rows: self.rows,
            })
        }
    }

    pub fn get(&self, at: Coord) -> Result<Option<Token>, GridError> {
        let i = self.check(at)?;
        Ok(self.cells[i])
    }

    /// Lenient read for scans: None for empty cells and for coordinates off the grid.
    #[inline]
    pub fn token_at(&self, at: Coord) -> Option<Token> {
        if self.contains(at) {
            self.cells[self.idx(at)]
        } else {
            None
        }
    }

    pub fn set(&mut self, at: Coord, token: Token) -> Result<(), GridError> {
        let i = self.check(at)?;
        self.cells[i] = Some(token);
        Ok(())
    }

    /// Empty the cell, returning its previous occupant.
    pub fn clear(&mut self, at: Coord) -> Result<Option<Token>, GridError> {
        let i = self.check(at)?;
        Ok(self.cells[i].take())
    }

    /// Exchange the occupants of two cells.
    pub fn swap(&mut self, a: Coord, b: Coord) -> Result<(), GridError> {
        let ia = self.check(a)?;
        let ib = self.check(b)?;
        self.cells.swap(ia, ib);
        Ok(())
    }

    /// Axis-aligned neighbours only: differ by exactly 1 on exactly one axis.
    pub fn is_adjacent(a: Coord, b: Coord) -> bool {
        a.x.abs_diff(b.x) + a.y.abs_diff(b.y) == 1
    }

    /// Every coordinate, x outer and y inner.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + use<> {
        let rows = self.rows;
        (0..self.cols).flat_map(move |x| (0..rows).map(move |y| Coord::new(x, y)))
    }

    /// Visit every cell in `coords()` order.
    pub fn for_each_cell(&self, mut visit: impl FnMut(Coord, Option<&Token>)) {
        for at in self.coords() {
            visit(at, self.cells[self.idx(at)].as_ref());
        }
    }

    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.occupied() == self.cells.len()
    }

    /// Move every token of column `x` down over the empty cells beneath it.
    /// Returns how many tokens moved.
    pub(crate) fn settle_column(&mut self, x: usize) -> usize {
        let base = x * self.rows;
        let column = &mut self.cells[base..base + self.rows];
        let mut moved = 0;
        let mut write = self.rows;
        for read in (0..self.rows).rev() {
            if column[read].is_some() {
                write -= 1;
                if read != write {
                    column[write] = column[read].take();
                    moved += 1;
                }
            }
        }
        moved
    }
}
