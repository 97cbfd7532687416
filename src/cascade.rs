//! Cascade resolution: match, collapse, refill and re-check until the grid is stable.

use crate::grid::{Coord, Grid};
use crate::matcher;
use crate::rng::TokenSource;
use crate::tokens::{Token, TokenCatalog};

/// Receives the score of every destroyed token, one call per token.
pub trait ScoreSink {
    fn on_score(&mut self, amount: u32);
}

impl<F: FnMut(u32)> ScoreSink for F {
    fn on_score(&mut self, amount: u32) {
        self(amount);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Stable,
    Matching,
    Collapsing,
    Refilling,
}

/// One Matching → Collapsing → Refilling pass that found matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Round {
    /// Destroyed tokens and the cells they were cleared from.
    pub destroyed: Vec<(Coord, Token)>,
    /// Tokens moved by gravity.
    pub fell: usize,
    /// Cells that received a new token.
    pub refilled: usize,
}

impl Round {
    /// Saturates at `u32::MAX`.
    pub fn score(&self) -> u32 {
        self.destroyed
            .iter()
            .fold(0, |total: u32, (_, t)| total.saturating_add(t.score))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub rounds: Vec<Round>,
}

impl CascadeReport {
    pub fn score(&self) -> u32 {
        self.rounds
            .iter()
            .fold(0, |total: u32, r| total.saturating_add(r.score()))
    }

    pub fn destroyed(&self) -> usize {
        self.rounds.iter().map(|r| r.destroyed.len()).sum()
    }
}

/// Run the cascade to a fixed point. Every destroyed token's score goes to `sink`
/// before the token is dropped.
pub fn resolve(
    grid: &mut Grid,
    catalog: &TokenCatalog,
    source: &mut dyn TokenSource,
    sink: &mut dyn ScoreSink,
) -> CascadeReport {
    let mut report = CascadeReport::default();
    let mut round = Round::default();
    let mut phase = Phase::Matching;

    while phase != Phase::Stable {
        log::trace!("cascade round {} phase {:?}", report.rounds.len() + 1, phase);
        phase = match phase {
            Phase::Matching => {
                let matched = matcher::find_matches(grid);
                if matched.is_empty() {
                    Phase::Stable
                } else {
                    for at in matched {
                        if let Ok(Some(token)) = grid.clear(at) {
                            sink.on_score(token.score);
                            round.destroyed.push((at, token));
                        }
                    }
                    Phase::Collapsing
                }
            }
            Phase::Collapsing => {
                round.fell = matcher::collapse(grid);
                Phase::Refilling
            }
            Phase::Refilling => {
                round.refilled = matcher::refill(grid, catalog, source);
                debug_assert!(grid.is_full());
                log::debug!(
                    "cascade round {}: destroyed {}, fell {}, refilled {}",
                    report.rounds.len() + 1,
                    round.destroyed.len(),
                    round.fell,
                    round.refilled
                );
                report.rounds.push(std::mem::take(&mut round));
                Phase::Matching
            }
            Phase::Stable => Phase::Stable,
        };
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::tests::grid_from;
    use crate::rng::{ScriptedSource, SeededSource};
    use crate::tokens::TokenType;

    #[test]
    fn test_stable_grid_is_untouched() {
        let mut grid = grid_from(&["MALK", "ALKM", "LKMA"]);
        let before = grid.clone();
        let mut calls = 0;
        let report = resolve(
            &mut grid,
            &TokenCatalog::standard(),
            &mut ScriptedSource::new([0]),
            &mut |_: u32| calls += 1,
        );
        assert!(report.rounds.is_empty());
        assert_eq!(calls, 0);
        assert_eq!(grid, before);
    }

    #[test]
    fn test_single_round_clears_and_refills() {
        // Bottom row Apples match; refill draws Milk, Lettuce, Carambola in turn.
        let mut grid = grid_from(&["MLK", "LKM", "AAA"]);
        let mut credited: Vec<u32> = Vec::new();
        let report = resolve(
            &mut grid,
            &TokenCatalog::standard(),
            &mut ScriptedSource::new([0, 4, 6]),
            &mut |s: u32| credited.push(s),
        );
        assert_eq!(report.rounds.len(), 1);
        assert_eq!(credited, vec![10, 10, 10]);
        let round = &report.rounds[0];
        assert_eq!(round.destroyed.len(), 3);
        assert_eq!(round.fell, 6);
        assert_eq!(round.refilled, 3);
        assert!(grid.is_full());
        // The old rows dropped by one.
        assert_eq!(grid.token_at(Coord::new(0, 2)).map(|t| t.kind), Some(TokenType::Lettuce));
        assert_eq!(grid.token_at(Coord::new(0, 1)).map(|t| t.kind), Some(TokenType::Milk));
        assert!(matcher::find_matches(&grid).is_empty());
    }

    #[test]
    fn test_huge_scores_saturate() {
        let catalog = TokenCatalog::from_scores([
            (TokenType::Milk, 4_000_000_000),
            (TokenType::Apple, 4_000_000_000),
            (TokenType::Lettuce, 4_000_000_000),
            (TokenType::Carambola, 4_000_000_000),
        ]);
        let layout = grid_from(&["MLK", "LKM", "AAA"]);
        let mut grid = Grid::filled_with(3, 3, |at| {
            layout.token_at(at).and_then(|t| catalog.token(t.kind))
        });
        let mut credited = 0u32;
        let report = resolve(
            &mut grid,
            &catalog,
            &mut ScriptedSource::new([0, 2, 3]),
            &mut |s: u32| credited = credited.saturating_add(s),
        );
        assert_eq!(report.rounds.len(), 1);
        assert_eq!(report.rounds[0].score(), u32::MAX);
        assert_eq!(report.score(), u32::MAX);
        assert_eq!(credited, report.score());
    }

    #[test]
    fn test_refill_can_chain() {
        // Column 0 clears and the refill (all Apples) lines up with the Apples in row 0.
        let mut grid = grid_from(&["BAA", "BLK", "BKL"]);
        let catalog = TokenCatalog::standard();
        let mut source = ScriptedSource::new([1, 1, 1, 0, 4, 6, 2, 3, 5]);
        let report = resolve(&mut grid, &catalog, &mut source, &mut |_: u32| {});
        assert!(report.rounds.len() >= 2);
        assert!(grid.is_full());
        assert!(matcher::find_matches(&grid).is_empty());
    }

    #[test]
    fn test_conservation_and_score_accounting() {
        let catalog = TokenCatalog::standard();
        let mut source = SeededSource::new(Some(99));
        for _ in 0..50 {
            let mut grid = Grid::filled_with(6, 6, |_| Some(catalog.draw(&mut source)));
            let mut credited = 0u32;
            let cells = grid.cols() * grid.rows();
            let report = resolve(&mut grid, &catalog, &mut source, &mut |s: u32| credited += s);
            for round in &report.rounds {
                assert_eq!(round.destroyed.len(), round.refilled);
            }
            assert_eq!(grid.occupied(), cells);
            assert_eq!(credited, report.score());
            assert!(grid.is_full());
            assert!(matcher::find_matches(&grid).is_empty());
        }
    }
}
