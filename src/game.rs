//! Game state: board, score against the level goal, countdown, selection, popups.

use crate::board::{Board, BoardError, SwapOutcome};
use crate::config::GameConfig;
use crate::grid::Coord;
use crate::rng::{SeededSource, TokenSource};
use crate::theme::Theme;
use ratatui::style::Color;
use std::time::{Duration, Instant};

/// How long a score popup stays on screen.
const POPUP_LIFETIME_MS: u32 = 1500;
/// Popups float up one row per this many ms.
const POPUP_RISE_MS: u32 = 300;

/// Feedback for the player, shown in the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Selected,
    Swapped,
    NoMatch,
    Rejected,
    Reshuffled,
    /// No move left and the board could not be regenerated.
    NoMoves,
    LevelCleared,
    TimeUp,
}

impl Cue {
    pub fn message(self) -> &'static str {
        match self {
            Self::Selected => "Selected",
            Self::Swapped => "Match!",
            Self::NoMatch => "No match",
            Self::Rejected => "Can't do that now",
            Self::Reshuffled => "No moves left, reshuffled",
            Self::NoMoves => "No moves left, press R to restart",
            Self::LevelCleared => "Level cleared!",
            Self::TimeUp => "Time's up!",
        }
    }
}

/// `mm:ss` from a minute up, bare `ss` below.
pub fn format_clock(secs: u64) -> String {
    if secs >= 60 {
        format!("{:02}:{:02}", secs / 60, secs % 60)
    } else {
        format!("{secs:02}")
    }
}

/// Per-level countdown. Advanced explicitly with `tick(now)`.
#[derive(Debug, Clone)]
pub struct Countdown {
    remaining: Duration,
    last_tick: Instant,
    running: bool,
}

impl Countdown {
    pub fn start(total: Duration, now: Instant) -> Self {
        Self {
            remaining: total,
            last_tick: now,
            running: true,
        }
    }

    pub fn tick(&mut self, now: Instant) {
        if self.running {
            let elapsed = now.saturating_duration_since(self.last_tick);
            self.remaining = self.remaining.saturating_sub(elapsed);
        }
        self.last_tick = now;
    }

    pub fn stop(&mut self, now: Instant) {
        self.tick(now);
        self.running = false;
    }

    pub fn resume(&mut self, now: Instant) {
        self.last_tick = now;
        self.running = true;
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.remaining.is_zero()
    }

    /// Whole seconds left, rounded up so the clock only shows 00 at expiry.
    pub fn seconds_left(&self) -> u64 {
        u64::try_from(self.remaining().as_millis().div_ceil(1000)).unwrap_or(u64::MAX)
    }

    pub fn label(&self) -> String {
        format_clock(self.seconds_left())
    }
}

#[derive(Debug, Clone)]
pub struct ScorePopup {
    pub at: Coord,
    pub amount: u32,
    /// Cascade round that scored it, starting at 1.
    pub chain: u32,
    pub age_ms: u32,
    pub color: Color,
}

impl ScorePopup {
    /// Rows risen since it appeared.
    pub fn lift(&self) -> u16 {
        (self.age_ms / POPUP_RISE_MS) as u16
    }
}

/// Session: one board plus the level, score and clock rules around it.
#[derive(Debug)]
pub struct GameState<S: TokenSource = SeededSource> {
    pub theme: Theme,
    pub board: Board<S>,
    cols: usize,
    rows: usize,
    round: Duration,
    level_goal: u32,
    pub score: u32,
    pub level: u32,
    pub goal: u32,
    /// Swaps that matched on this level.
    pub swaps: u32,
    pub clock: Countdown,
    paused: bool,
    pub cursor: Coord,
    pub selected: Option<Coord>,
    pub hint: Option<(Coord, Coord)>,
    pub popups: Vec<ScorePopup>,
    /// Cells cleared by the last swap, flashed by the UI until `finish_flash`.
    pub flash_cells: Vec<Coord>,
    pub cue: Option<Cue>,
}

impl<S: TokenSource> GameState<S> {
    pub fn new(theme: Theme, config: &GameConfig, source: S, now: Instant) -> Result<Self, BoardError> {
        let board = Board::new(config.cols, config.rows, config.catalog.clone(), source)?;
        Ok(Self {
            theme,
            board,
            cols: config.cols,
            rows: config.rows,
            round: Duration::from_secs(config.round_seconds),
            level_goal: config.level_goal,
            score: 0,
            level: 1,
            goal: config.level_goal,
            swaps: 0,
            clock: Countdown::start(Duration::from_secs(config.round_seconds), now),
            paused: false,
            cursor: Coord::new(config.cols / 2, config.rows / 2),
            selected: None,
            hint: None,
            popups: Vec::new(),
            flash_cells: Vec::new(),
            cue: None,
        })
    }

    pub fn level_cleared(&self) -> bool {
        self.score >= self.goal
    }

    pub fn time_up(&self) -> bool {
        self.clock.is_expired() && !self.level_cleared()
    }

    /// Paused by the player.
    pub fn is_held(&self) -> bool {
        self.paused
    }

    /// True while the board must not take selections.
    pub fn is_paused(&self) -> bool {
        self.paused || self.level_cleared() || self.clock.is_expired()
    }

    /// Advance the clock. Returns `TimeUp` on the tick the countdown runs out.
    pub fn tick(&mut self, now: Instant) -> Option<Cue> {
        let was_expired = self.clock.is_expired();
        self.clock.tick(now);
        if was_expired || !self.clock.is_expired() {
            return None;
        }
        log::info!("time up on level {} at {}/{}", self.level, self.score, self.goal);
        self.selected = None;
        self.hint = None;
        self.cue = Some(Cue::TimeUp);
        Some(Cue::TimeUp)
    }

    /// Pause or resume. Returns whether the session is now held; a cleared or
    /// timed-out level cannot be toggled.
    pub fn toggle_pause(&mut self, now: Instant) -> bool {
        if self.level_cleared() || self.clock.is_expired() {
            return self.paused;
        }
        self.paused = !self.paused;
        if self.paused {
            self.clock.stop(now);
        } else {
            self.clock.resume(now);
        }
        self.paused
    }

    pub fn move_cursor(&mut self, dx: isize, dy: isize) {
        if let Some(next) = self.cursor.offset(dx, dy).filter(|&c| self.board.grid().contains(c)) {
            self.cursor = next;
        }
    }

    /// Select the cell under the cursor.
    pub fn pick(&mut self, now: Instant) -> Result<Cue, BoardError> {
        self.select(self.cursor, now)
    }

    /// First pick selects. A second pick that can swap with the first
    /// swaps them and clears the selection; any other pick moves the selection.
    pub fn select(&mut self, at: Coord, now: Instant) -> Result<Cue, BoardError> {
        self.tick(now);
        let cue = if self.is_paused() || !self.board.grid().contains(at) {
            Cue::Rejected
        } else {
            match self.selected {
                Some(first) if self.board.can_select(first, at) => {
                    self.selected = None;
                    self.swap(first, at, now)?
                }
                _ => {
                    self.selected = Some(at);
                    Cue::Selected
                }
            }
        };
        self.cue = Some(cue);
        Ok(cue)
    }

    fn swap(&mut self, a: Coord, b: Coord, now: Instant) -> Result<Cue, BoardError> {
        self.hint = None;
        let mut credited = 0u32;
        let outcome = self
            .board
            .request_swap(a, b, &mut |s: u32| credited = credited.saturating_add(s))?;
        if !outcome.matched {
            return Ok(Cue::NoMatch);
        }
        self.score = self.score.saturating_add(credited);
        self.swaps += 1;
        self.record_clears(&outcome);
        if self.level_cleared() {
            self.clock.stop(now);
            log::info!("level {} cleared with {}/{}", self.level, self.score, self.goal);
            return Ok(Cue::LevelCleared);
        }
        Ok(if outcome.deadlocked {
            Cue::NoMoves
        } else if outcome.reshuffled {
            Cue::Reshuffled
        } else {
            Cue::Swapped
        })
    }

    /// One popup per cascade round, plus the cells to flash.
    fn record_clears(&mut self, outcome: &SwapOutcome) {
        self.flash_cells.clear();
        for (chain, round) in outcome.cascade.rounds.iter().enumerate() {
            let Some(&(at, token)) = round.destroyed.first() else {
                continue;
            };
            self.popups.push(ScorePopup {
                at,
                amount: round.score(),
                chain: chain as u32 + 1,
                age_ms: 0,
                color: self.theme.token_color(token.kind),
            });
            if !outcome.reshuffled {
                self.flash_cells.extend(round.destroyed.iter().map(|&(at, _)| at));
            }
        }
        self.flash_cells.sort_unstable();
        self.flash_cells.dedup();
    }

    pub fn finish_flash(&mut self) {
        self.flash_cells.clear();
    }

    /// Highlight a swap that would match. Returns whether one was found.
    pub fn show_hint(&mut self) -> bool {
        if self.is_paused() {
            return false;
        }
        self.hint = self.board.hint();
        self.hint.is_some()
    }

    /// Advance after a cleared level. Returns false if the level is not cleared.
    pub fn next_level(&mut self, now: Instant) -> Result<bool, BoardError> {
        if !self.level_cleared() {
            return Ok(false);
        }
        self.level += 1;
        self.start_level(now)?;
        Ok(true)
    }

    /// Back to level 1 with a fresh board and clock.
    pub fn restart(&mut self, now: Instant) -> Result<(), BoardError> {
        self.level = 1;
        self.start_level(now)
    }

    fn start_level(&mut self, now: Instant) -> Result<(), BoardError> {
        self.board.initialize_board(self.cols, self.rows)?;
        self.score = 0;
        self.swaps = 0;
        self.goal = self.level_goal.saturating_mul(self.level);
        self.clock = Countdown::start(self.round, now);
        self.paused = false;
        self.selected = None;
        self.hint = None;
        self.popups.clear();
        self.flash_cells.clear();
        self.cue = None;
        log::info!("level {} started, goal {}", self.level, self.goal);
        Ok(())
    }

    pub fn tick_popups(&mut self, delta_ms: u32) {
        self.popups.retain_mut(|p| {
            p.age_ms = p.age_ms.saturating_add(delta_ms);
            p.age_ms < POPUP_LIFETIME_MS
        });
    }
}
