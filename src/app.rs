//! App: terminal init, main loop, tick and key handling.

use crate::Args;
use crate::config::GameConfig;
use crate::game::{Cue, GameState};
use crate::input::{Action, key_to_action};
use crate::rng::SeededSource;
use crate::theme::Theme;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    Restart,
    Exit,
}

impl QuitOption {
    fn next(self) -> Self {
        match self {
            Self::Resume => Self::Restart,
            Self::Restart => Self::Exit,
            Self::Exit => Self::Resume,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Resume => Self::Exit,
            Self::Restart => Self::Resume,
            Self::Exit => Self::Restart,
        }
    }
}

/// Whether the main loop keeps going after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub struct App {
    state: GameState,
    screen: Screen,
    quit_selected: QuitOption,
    /// The quit menu paused the clock and must resume it on close.
    menu_paused: bool,
    no_animation: bool,
    frame_duration: Duration,
    /// TachyonFX flash over the cells cleared by the last swap.
    flash_effect: Option<Effect>,
    /// Last time we processed the flash effect (for delta).
    flash_process_time: Option<Instant>,
    last_frame: Instant,
}

impl App {
    pub fn new(args: &Args, config: &GameConfig, theme: Theme) -> Result<Self> {
        let now = Instant::now();
        let state = GameState::new(theme, config, SeededSource::new(config.seed), now)?;
        let frame_rate = if args.frame_rate > 0.0 {
            args.frame_rate
        } else {
            60.0
        };
        Ok(Self {
            state,
            screen: Screen::Playing,
            quit_selected: QuitOption::Resume,
            menu_paused: false,
            no_animation: args.no_animation,
            frame_duration: Duration::from_secs_f64(1.0 / frame_rate),
            flash_effect: None,
            flash_process_time: None,
            last_frame: now,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            self.state.tick(now);
            let delta_ms = now
                .saturating_duration_since(self.last_frame)
                .as_millis()
                .min(u32::MAX as u128) as u32;
            self.last_frame = now;
            self.state.tick_popups(delta_ms);
            if self.no_animation && !self.state.flash_cells.is_empty() {
                self.finish_flash();
            }

            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.state,
                    self.quit_selected,
                    &mut self.flash_effect,
                    &mut self.flash_process_time,
                    now,
                    self.no_animation,
                );
            })?;

            if self.flash_effect.as_ref().is_some_and(Effect::done) {
                self.finish_flash();
            }

            let timeout = self.frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let Event::Key(key) = event::read()? else {
                        continue;
                    };
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    let action = key_to_action(key);
                    if self.handle_action(action, Instant::now())? == Flow::Exit {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn handle_action(&mut self, action: Action, now: Instant) -> Result<Flow> {
        match self.screen {
            Screen::Playing => match action {
                Action::Quit => self.open_quit_menu(now),
                Action::Pause => {
                    self.state.toggle_pause(now);
                }
                Action::Up => self.state.move_cursor(0, -1),
                Action::Down => self.state.move_cursor(0, 1),
                Action::Left => self.state.move_cursor(-1, 0),
                Action::Right => self.state.move_cursor(1, 0),
                Action::Pick => {
                    let cue = self.state.pick(now)?;
                    log::trace!("pick at {} -> {cue:?}", self.state.cursor);
                    if matches!(cue, Cue::Swapped | Cue::NoMoves | Cue::LevelCleared) {
                        self.reset_flash();
                    }
                }
                Action::Hint => {
                    self.state.show_hint();
                }
                Action::NextLevel => {
                    if self.state.next_level(now)? {
                        self.reset_flash();
                    }
                }
                Action::Restart => {
                    self.state.restart(now)?;
                    self.reset_flash();
                }
                Action::None => {}
            },
            Screen::QuitMenu => match action {
                Action::Down | Action::Right => self.quit_selected = self.quit_selected.next(),
                Action::Up | Action::Left => self.quit_selected = self.quit_selected.prev(),
                Action::Pick => match self.quit_selected {
                    QuitOption::Resume => self.close_quit_menu(now),
                    QuitOption::Restart => {
                        self.state.restart(now)?;
                        self.reset_flash();
                        self.menu_paused = false;
                        self.screen = Screen::Playing;
                    }
                    QuitOption::Exit => return Ok(Flow::Exit),
                },
                Action::Quit | Action::Pause => self.close_quit_menu(now),
                _ => {}
            },
        }
        Ok(Flow::Continue)
    }

    /// The clock does not run behind the quit menu.
    fn open_quit_menu(&mut self, now: Instant) {
        self.menu_paused = !self.state.is_paused() && self.state.toggle_pause(now);
        self.screen = Screen::QuitMenu;
        self.quit_selected = QuitOption::Resume;
    }

    fn close_quit_menu(&mut self, now: Instant) {
        if self.menu_paused {
            self.state.toggle_pause(now);
            self.menu_paused = false;
        }
        self.screen = Screen::Playing;
    }

    /// Drop the running effect so the next frame starts one for the current cells.
    fn reset_flash(&mut self) {
        self.flash_effect = None;
        self.flash_process_time = None;
    }

    fn finish_flash(&mut self) {
        self.state.finish_flash();
        self.reset_flash();
    }
}
