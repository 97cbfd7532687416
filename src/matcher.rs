//! Run detection, gravity, refill and move prediction over a [`Grid`].
//!
//! Everything here is stateless: functions take the grid they work on and keep
//! their scratch collections local.

use crate::grid::{Coord, Grid};
use crate::rng::TokenSource;
use crate::tokens::{TokenCatalog, TokenType};
use std::collections::BTreeSet;

/// Shortest run that counts as a match.
pub const MIN_RUN: usize = 3;

/// Same-type neighbours a cell needs on one axis (itself excluded) to sit in a run.
const RUN_NEIGHBOURS: usize = MIN_RUN - 1;

/// Direction pairs per axis: horizontal (left, right), vertical (up, down).
const AXES: [[(isize, isize); 2]; 2] = [[(-1, 0), (1, 0)], [(0, -1), (0, 1)]];

/// Same-type cells walking from `from` (exclusive) in direction `(dx, dy)`.
fn chain(grid: &Grid, from: Coord, (dx, dy): (isize, isize), kind: TokenType) -> Vec<Coord> {
    let mut cells = Vec::new();
    let mut at = from;
    while let Some(next) = at.offset(dx, dy) {
        match grid.token_at(next) {
            Some(t) if t.kind == kind => {
                cells.push(next);
                at = next;
            }
            _ => break,
        }
    }
    cells
}

/// Cells matched through `seed`: the seed plus every cell of each qualifying
/// horizontal/vertical run through it. Empty when the seed is in no run.
pub fn runs_through(grid: &Grid, seed: Coord) -> Vec<Coord> {
    let Some(token) = grid.token_at(seed) else {
        return Vec::new();
    };
    let mut matched = Vec::new();
    for [back, forth] in AXES {
        let mut line = chain(grid, seed, back, token.kind);
        line.extend(chain(grid, seed, forth, token.kind));
        if line.len() >= RUN_NEIGHBOURS {
            matched.extend(line);
        }
    }
    if !matched.is_empty() {
        matched.push(seed);
    }
    matched
}

/// Every matched cell on the grid. A cell on two crossing runs appears once.
pub fn find_matches(grid: &Grid) -> BTreeSet<Coord> {
    let mut matched = BTreeSet::new();
    for at in grid.coords() {
        if matched.contains(&at) {
            continue;
        }
        matched.extend(runs_through(grid, at));
    }
    matched
}

pub fn has_match(grid: &Grid) -> bool {
    grid.coords().any(|at| !runs_through(grid, at).is_empty())
}

/// Let tokens fall over every empty cell beneath them, column by column.
/// Returns how many tokens moved.
pub fn collapse(grid: &mut Grid) -> usize {
    (0..grid.cols()).map(|x| grid.settle_column(x)).sum()
}

/// Put a freshly drawn token in every empty cell. Returns how many were placed.
pub fn refill(grid: &mut Grid, catalog: &TokenCatalog, source: &mut dyn TokenSource) -> usize {
    let mut placed = 0;
    for at in grid.coords() {
        if grid.token_at(at).is_none() && grid.set(at, catalog.draw(source)).is_ok() {
            placed += 1;
        }
    }
    placed
}

/// Would a token of `kind` placed at `target` sit in a run?
///
/// Looks at most two cells each way on both axes. `vacated` is the slot the
/// token would come from; it holds the other swapped token afterwards, so a
/// walk stops there.
pub fn would_match(grid: &Grid, target: Coord, kind: TokenType, vacated: Coord) -> bool {
    AXES.iter().any(|axis| {
        let same: usize = axis
            .iter()
            .map(|&(dx, dy)| {
                let mut count = 0;
                let mut at = target;
                for _ in 0..RUN_NEIGHBOURS {
                    let Some(next) = at.offset(dx, dy) else { break };
                    if next == vacated {
                        break;
                    }
                    match grid.token_at(next) {
                        Some(t) if t.kind == kind => count += 1,
                        _ => break,
                    }
                    at = next;
                }
                count
            })
            .sum();
        same >= RUN_NEIGHBOURS
    })
}

/// Would swapping the tokens at `a` and `b` create a match? Only adjacent,
/// occupied cells with different types qualify.
pub fn swap_matches(grid: &Grid, a: Coord, b: Coord) -> bool {
    if !Grid::is_adjacent(a, b) {
        return false;
    }
    match (grid.token_at(a), grid.token_at(b)) {
        (Some(ta), Some(tb)) if ta.kind != tb.kind => {
            would_match(grid, a, tb.kind, b) || would_match(grid, b, ta.kind, a)
        }
        _ => false,
    }
}

/// First adjacent pair (in `coords()` order, right neighbour before down neighbour)
/// whose swap would create a match.
pub fn possible_move(grid: &Grid) -> Option<(Coord, Coord)> {
    grid.coords().find_map(|a| {
        [a.offset(1, 0), a.offset(0, 1)]
            .into_iter()
            .flatten()
            .find(|&b| grid.contains(b) && swap_matches(grid, a, b))
            .map(|b| (a, b))
    })
}

pub fn has_possible_move(grid: &Grid) -> bool {
    possible_move(grid).is_some()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::rng::{ScriptedSource, SeededSource};
    use crate::tokens::Token;

    /// Build a grid from rows of glyphs (top row first); '.' is empty.
    pub(crate) fn grid_from(rows: &[&str]) -> Grid {
        let catalog = TokenCatalog::standard();
        let height = rows.len();
        let width = rows[0].len();
        Grid::filled_with(width, height, |at| {
            let glyph = rows[at.y].as_bytes()[at.x] as char;
            TokenType::ALL
                .iter()
                .copied()
                .find(|k| k.glyph() == glyph)
                .and_then(|k| catalog.token(k))
        })
    }

    fn brute_force_has_move(grid: &Grid) -> bool {
        grid.coords().any(|a| {
            [a.offset(1, 0), a.offset(0, 1)]
                .into_iter()
                .flatten()
                .filter(|&b| grid.contains(b))
                .any(|b| {
                    let (Some(ta), Some(tb)) = (grid.token_at(a), grid.token_at(b)) else {
                        return false;
                    };
                    if ta.kind == tb.kind {
                        return false;
                    }
                    let mut swapped = grid.clone();
                    swapped.swap(a, b).unwrap();
                    has_match(&swapped)
                })
        })
    }

    #[test]
    fn test_horizontal_run() {
        let grid = grid_from(&["AAAB", "BMLK", "MLKC"]);
        let matched = find_matches(&grid);
        let expected: BTreeSet<_> = [Coord::new(0, 0), Coord::new(1, 0), Coord::new(2, 0)].into();
        assert_eq!(matched, expected);
    }

    #[test]
    fn test_vertical_run_of_four() {
        let grid = grid_from(&["AM", "AL", "AK", "AC", "MB"]);
        let matched = find_matches(&grid);
        assert_eq!(matched.len(), 4);
        assert!(matched.iter().all(|c| c.x == 0 && c.y < 4));
    }

    #[test]
    fn test_crossing_runs_count_once() {
        // Plus shape of Apples centred on (1, 1).
        let grid = grid_from(&["MAL", "AAA", "KAC"]);
        let matched = find_matches(&grid);
        assert_eq!(matched.len(), 5);
        assert!(matched.contains(&Coord::new(1, 1)));
    }

    #[test]
    fn test_pairs_and_gaps_do_not_match() {
        let grid = grid_from(&["AA.A", "MMLM", "A..A"]);
        assert!(find_matches(&grid).is_empty());
        assert!(!has_match(&grid));
    }

    #[test]
    fn test_runs_through_middle_seed() {
        let grid = grid_from(&["MAAAM"]);
        let mut cells = runs_through(&grid, Coord::new(2, 0));
        cells.sort();
        assert_eq!(cells, vec![Coord::new(1, 0), Coord::new(2, 0), Coord::new(3, 0)]);
        assert!(runs_through(&grid, Coord::new(0, 0)).is_empty());
    }

    #[test]
    fn test_detection_is_idempotent() {
        let grid = grid_from(&["MALK", "ALKM", "LKMA", "KMAL"]);
        assert!(find_matches(&grid).is_empty());
        assert!(find_matches(&grid).is_empty());
    }

    #[test]
    fn test_collapse_is_exhaustive() {
        // Column 0 has two separate gaps; column 1 is full.
        let mut grid = grid_from(&["AM", ".L", "BK", ".C", ".O"]);
        let moved = collapse(&mut grid);
        assert_eq!(moved, 2);
        assert_eq!(grid.token_at(Coord::new(0, 4)).map(|t| t.kind), Some(TokenType::Bread));
        assert_eq!(grid.token_at(Coord::new(0, 3)).map(|t| t.kind), Some(TokenType::Apple));
        for y in 0..3 {
            assert!(grid.token_at(Coord::new(0, y)).is_none());
        }
        // No token sits above an empty cell.
        for at in grid.coords() {
            if grid.token_at(at).is_some() {
                if let Some(below) = at.offset(0, 1) {
                    assert!(!grid.contains(below) || grid.token_at(below).is_some());
                }
            }
        }
    }

    #[test]
    fn test_refill_fills_only_empty_cells() {
        let mut grid = grid_from(&["..", "AM"]);
        let catalog = TokenCatalog::standard();
        let mut source = ScriptedSource::new([5]);
        assert_eq!(refill(&mut grid, &catalog, &mut source), 2);
        assert!(grid.is_full());
        assert_eq!(grid.token_at(Coord::new(0, 0)).map(|t| t.kind), Some(TokenType::Coconut));
        assert_eq!(grid.token_at(Coord::new(0, 1)).map(|t| t.kind), Some(TokenType::Apple));
    }

    #[test]
    fn test_would_match_ignores_vacated_slot() {
        // Moving the Apple at (1, 0) down to (1, 1) must not count (1, 0) itself.
        let grid = grid_from(&["MAL", "KBC", "OAO"]);
        assert!(!would_match(&grid, Coord::new(1, 1), TokenType::Apple, Coord::new(1, 0)));
        let grid = grid_from(&["MAL", "KBC", "OAO", "MAL"]);
        assert!(would_match(&grid, Coord::new(1, 1), TokenType::Apple, Coord::new(1, 0)));
    }

    #[test]
    fn test_possible_move_found() {
        // Swapping (2, 0) and (2, 1) puts an Apple next to two Apples.
        let grid = grid_from(&["AAML", "KCAO", "LOKC"]);
        assert!(has_possible_move(&grid));
        let (a, b) = possible_move(&grid).unwrap();
        assert!(swap_matches(&grid, a, b));
    }

    #[test]
    fn test_alternating_pairs_have_no_move() {
        let grid = grid_from(&[
            "ABABAB", "CLCLCL", "ABABAB", "CLCLCL", "ABABAB", "CLCLCL",
        ]);
        assert!(!has_match(&grid));
        assert!(!has_possible_move(&grid));
        assert!(!brute_force_has_move(&grid));
    }

    #[test]
    fn test_swap_matches_rejects_same_type_and_distance() {
        let grid = grid_from(&["AAMA", "KCLO"]);
        assert!(!swap_matches(&grid, Coord::new(0, 0), Coord::new(1, 0)));
        assert!(!swap_matches(&grid, Coord::new(2, 0), Coord::new(0, 1)));
        assert!(swap_matches(&grid, Coord::new(2, 0), Coord::new(3, 0)));
    }

    #[test]
    fn test_predictor_agrees_with_brute_force() {
        let catalog = TokenCatalog::from_scores([
            (TokenType::Milk, 1),
            (TokenType::Apple, 1),
            (TokenType::Orange, 1),
            (TokenType::Bread, 1),
        ]);
        let mut source = SeededSource::new(Some(2024));
        let mut checked = 0;
        for _ in 0..400 {
            let grid = Grid::filled_with(6, 6, |_| Some(catalog.draw(&mut source)));
            if has_match(&grid) {
                continue;
            }
            checked += 1;
            assert_eq!(has_possible_move(&grid), brute_force_has_move(&grid));
        }
        assert!(checked > 0);
    }

    #[test]
    fn test_empty_cells_never_match() {
        let mut grid = Grid::new(3, 1);
        grid.set(Coord::new(0, 0), Token::new(TokenType::Milk, 5)).unwrap();
        assert!(find_matches(&grid).is_empty());
        assert!(!has_possible_move(&grid));
    }
}
