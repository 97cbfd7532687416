//! Board: the grid plus the rules that keep it playable.
//!
//! Owns the grid, the token catalog and the random source. Collaborators talk
//! to the engine only through this type: build a board, ask whether a pick
//! can swap, request swaps, ask for a hint.

use crate::cascade::{self, CascadeReport, ScoreSink};
use crate::grid::{Coord, Grid, GridError};
use crate::matcher;
use crate::rng::{SeededSource, TokenSource};
use crate::tokens::TokenCatalog;
use thiserror::Error;

/// Fresh fills tried before giving up on a playable board.
pub const MAX_GENERATION_ATTEMPTS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error(transparent)]
    OutOfBounds(#[from] GridError),
    #[error("cell {0} holds no token")]
    EmptyCellSwap(Coord),
    #[error("cells {0} and {1} are not adjacent")]
    NonAdjacentSwap(Coord, Coord),
    #[error("cells {0} and {1} hold the same token type")]
    SameTypeSwap(Coord, Coord),
    #[error("no playable board found after {attempts} attempts")]
    GenerationExhausted { attempts: u32 },
}

/// Result of an accepted swap request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwapOutcome {
    /// The swap produced at least one match. When false the swap was undone.
    pub matched: bool,
    /// The board ran out of moves after the cascade and was regenerated.
    pub reshuffled: bool,
    /// The board ran out of moves and no playable replacement was found.
    /// The grid is left as the cascade settled it.
    pub deadlocked: bool,
    pub cascade: CascadeReport,
}

#[derive(Debug, Clone)]
pub struct Board<S: TokenSource = SeededSource> {
    grid: Grid,
    catalog: TokenCatalog,
    source: S,
}

impl<S: TokenSource> Board<S> {
    /// Build and fill a playable `cols` x `rows` board.
    pub fn new(cols: usize, rows: usize, catalog: TokenCatalog, source: S) -> Result<Self, BoardError> {
        let mut board = Self {
            grid: Grid::new(cols, rows),
            catalog,
            source,
        };
        board.initialize_board(cols, rows)?;
        Ok(board)
    }

    /// Adopt `grid` as is, without validating it.
    #[cfg(test)]
    pub(crate) fn with_grid(grid: Grid, catalog: TokenCatalog, source: S) -> Self {
        Self {
            grid,
            catalog,
            source,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn catalog(&self) -> &TokenCatalog {
        &self.catalog
    }

    /// Replace the grid with a fresh `cols` x `rows` fill that has no match and
    /// at least one possible move.
    pub fn initialize_board(&mut self, cols: usize, rows: usize) -> Result<(), BoardError> {
        if self.catalog.is_empty() {
            return Err(BoardError::GenerationExhausted { attempts: 0 });
        }
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let catalog = &self.catalog;
            let source = &mut self.source;
            let grid = Grid::filled_with(cols, rows, |_| Some(catalog.draw(&mut *source)));
            if matcher::has_match(&grid) || !matcher::has_possible_move(&grid) {
                continue;
            }
            log::debug!("generated {cols}x{rows} board after {attempt} attempt(s)");
            self.grid = grid;
            return Ok(());
        }
        log::warn!("gave up generating a {cols}x{rows} board");
        Err(BoardError::GenerationExhausted {
            attempts: MAX_GENERATION_ATTEMPTS,
        })
    }

    /// Regenerate the board at its current size.
    pub fn reshuffle(&mut self) -> Result<(), BoardError> {
        let (cols, rows) = (self.grid.cols(), self.grid.rows());
        log::debug!("reshuffling {cols}x{rows} board");
        self.initialize_board(cols, rows)
    }

    /// Reshuffle if no move is left. Returns whether it did.
    pub fn ensure_playable(&mut self) -> Result<bool, BoardError> {
        if self.has_possible_move() {
            return Ok(false);
        }
        self.reshuffle()?;
        Ok(true)
    }

    pub fn has_possible_move(&self) -> bool {
        matcher::has_possible_move(&self.grid)
    }

    /// A swap that would create a match, if any.
    pub fn hint(&self) -> Option<(Coord, Coord)> {
        matcher::possible_move(&self.grid)
    }

    /// Can `a` and `b` be swapped: adjacent, both occupied, different types.
    pub fn can_select(&self, a: Coord, b: Coord) -> bool {
        self.validate_swap(a, b).is_ok()
    }

    fn validate_swap(&self, a: Coord, b: Coord) -> Result<(), BoardError> {
        let ta = self.grid.get(a)?.ok_or(BoardError::EmptyCellSwap(a))?;
        let tb = self.grid.get(b)?.ok_or(BoardError::EmptyCellSwap(b))?;
        if !Grid::is_adjacent(a, b) {
            return Err(BoardError::NonAdjacentSwap(a, b));
        }
        if ta.kind == tb.kind {
            return Err(BoardError::SameTypeSwap(a, b));
        }
        Ok(())
    }

    /// Swap the tokens at `a` and `b` and resolve the cascade.
    ///
    /// Rejected requests leave the grid untouched. A valid swap that creates no
    /// match is undone and reported with `matched: false`. After the cascade the
    /// board is regenerated if no move is left; if that fails the cascade result
    /// is still returned, with `deadlocked` set.
    pub fn request_swap(
        &mut self,
        a: Coord,
        b: Coord,
        sink: &mut dyn ScoreSink,
    ) -> Result<SwapOutcome, BoardError> {
        self.validate_swap(a, b)?;
        self.grid.swap(a, b)?;

        if !matcher::has_match(&self.grid) {
            self.grid.swap(a, b)?;
            log::debug!("swap {a} <-> {b} made no match, undone");
            return Ok(SwapOutcome::default());
        }

        let cascade = cascade::resolve(&mut self.grid, &self.catalog, &mut self.source, sink);
        log::debug!(
            "swap {a} <-> {b}: {} round(s), {} token(s), {} point(s)",
            cascade.rounds.len(),
            cascade.destroyed(),
            cascade.score()
        );
        let (reshuffled, deadlocked) = match self.ensure_playable() {
            Ok(reshuffled) => (reshuffled, false),
            Err(err @ BoardError::GenerationExhausted { .. }) => {
                log::warn!("board left without moves: {err}");
                (false, true)
            }
            Err(err) => return Err(err),
        };
        Ok(SwapOutcome {
            matched: true,
            reshuffled,
            deadlocked,
            cascade,
        })
    }
}
