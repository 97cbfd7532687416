//! Layout and drawing: board, sidebar, overlays, score popups and the clear flash.

use crate::app::{QuitOption, Screen};
use crate::game::GameState;
use crate::grid::Coord;
use crate::rng::TokenSource;
use crate::theme::Theme;
use crate::tokens::Token;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

const SIDEBAR_WIDTH: u16 = 26;
/// Clock turns red below this many seconds.
const CLOCK_WARNING_SECS: u64 = 10;
/// Duration of the white fade-in over cleared cells.
const FLASH_MS: u32 = 350;

/// Terminal cells per board cell. Large cells get their own rounded border.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellMetrics {
    w: u16,
    h: u16,
    bordered: bool,
}

const LARGE_CELL: CellMetrics = CellMetrics {
    w: 5,
    h: 3,
    bordered: true,
};
const COMPACT_CELL: CellMetrics = CellMetrics {
    w: 3,
    h: 1,
    bordered: false,
};

/// Large cells when the whole board fits the terminal, compact otherwise.
fn cell_metrics(area: Rect, cols: usize, rows: usize) -> CellMetrics {
    let (w, h) = board_outer_size(cols, rows, LARGE_CELL);
    if w + SIDEBAR_WIDTH <= area.width && h <= area.height {
        LARGE_CELL
    } else {
        COMPACT_CELL
    }
}

/// Board size in terminal cells, border included.
fn board_outer_size(cols: usize, rows: usize, m: CellMetrics) -> (u16, u16) {
    (cols as u16 * m.w + 2, rows as u16 * m.h + 2)
}

fn sidebar_height(token_types: usize) -> u16 {
    // stats, gap, goal gauge, gap, legend, gap, status
    6 + 1 + 3 + 1 + (token_types as u16 + 3) + 1 + 3
}

/// Where everything goes for one frame.
#[derive(Debug, Clone, Copy)]
struct BoardLayout {
    board_outer: Rect,
    /// Inside the board border; cell (0, 0) is its top-left corner.
    board: Rect,
    sidebar: Rect,
    cell: CellMetrics,
}

impl BoardLayout {
    fn new<S: TokenSource>(area: Rect, state: &GameState<S>) -> Self {
        let grid = state.board.grid();
        let cell = cell_metrics(area, grid.cols(), grid.rows());
        let (pw, ph) = board_outer_size(grid.cols(), grid.rows(), cell);
        let total_w = pw + SIDEBAR_WIDTH;
        let total_h = ph.max(sidebar_height(state.board.catalog().len()));

        // Center horizontally
        let horiz = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(total_w),
                Constraint::Fill(1),
            ])
            .split(area);
        // Center vertically
        let vert = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(total_h),
                Constraint::Fill(1),
            ])
            .split(horiz[1]);
        let active = vert[1];
        let inner = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
            .split(active);
        let board_outer = Rect {
            height: ph.min(inner[0].height),
            ..inner[0]
        };
        Self {
            board_outer,
            board: Block::default().borders(Borders::ALL).inner(board_outer),
            sidebar: inner[1],
            cell,
        }
    }

    /// Terminal rect of a board cell, clipped to the board.
    fn cell_rect(&self, at: Coord) -> Rect {
        Rect {
            x: self.board.x + at.x as u16 * self.cell.w,
            y: self.board.y + at.y as u16 * self.cell.h,
            width: self.cell.w,
            height: self.cell.h,
        }
        .intersection(self.board)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Highlight {
    None,
    Hint,
    Cursor,
    Selected,
}

fn highlight_at<S: TokenSource>(state: &GameState<S>, at: Coord) -> Highlight {
    if state.selected == Some(at) {
        Highlight::Selected
    } else if state.cursor == at && !state.is_paused() {
        Highlight::Cursor
    } else if state.hint.is_some_and(|(a, b)| a == at || b == at) {
        Highlight::Hint
    } else {
        Highlight::None
    }
}

/// Draw the board, sidebar and whatever overlay the screen calls for.
/// While `state.flash_cells` is non-empty and animation is on, runs the
/// TachyonFX fade over those cells and updates `flash_effect` / `flash_process_time`.
pub fn draw<S: TokenSource>(
    frame: &mut Frame,
    screen: Screen,
    state: &GameState<S>,
    quit_selected: QuitOption,
    flash_effect: &mut Option<Effect>,
    flash_process_time: &mut Option<Instant>,
    now: Instant,
    no_animation: bool,
) {
    let area = frame.area();
    let layout = BoardLayout::new(area, state);
    draw_board(frame, state, &layout);
    draw_sidebar(frame, state, layout.sidebar);
    if !state.flash_cells.is_empty() && !no_animation {
        apply_flash_effect(frame, state, &layout, flash_effect, flash_process_time, now);
    }
    match screen {
        Screen::Playing => {
            if state.time_up() {
                draw_time_up_overlay(frame, state, area);
            } else if state.level_cleared() {
                draw_level_cleared_overlay(frame, state, area);
            } else if state.is_held() {
                draw_pause_overlay(frame, state, area);
            }
        }
        Screen::QuitMenu => draw_quit_menu(frame, state, quit_selected),
    }
}

fn draw_board<S: TokenSource>(frame: &mut Frame, state: &GameState<S>, layout: &BoardLayout) {
    let theme = &state.theme;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .style(Style::default().bg(theme.bg))
        .title(Span::styled(" swaptui ", theme.title))
        .title_bottom(Line::from(Span::styled(
            " hjkl move  space pick  ? hint ",
            Style::default().fg(theme.inactive_fg),
        )));
    let buf = frame.buffer_mut();
    block.render(layout.board_outer, buf);

    state.board.grid().for_each_cell(|at, token| {
        if let Some(token) = token {
            let rect = layout.cell_rect(at);
            draw_cell(buf, rect, token, highlight_at(state, at), theme, layout.cell);
        }
    });

    // Floating score popups
    let right = layout.board.x + layout.board.width;
    for popup in &state.popups {
        let rect = layout.cell_rect(popup.at);
        let y = rect.y.saturating_sub(popup.lift()).max(layout.board.y);
        if rect.x >= right || y >= layout.board.y + layout.board.height {
            continue;
        }
        let label = if popup.chain > 1 {
            format!("+{} x{}", popup.amount, popup.chain)
        } else {
            format!("+{}", popup.amount)
        };
        let style = Style::default().fg(popup.color).bg(theme.bg).bold();
        buf.set_stringn(rect.x, y, label, usize::from(right - rect.x), style);
    }
}

fn draw_cell(
    buf: &mut Buffer,
    rect: Rect,
    token: &Token,
    highlight: Highlight,
    theme: &Theme,
    m: CellMetrics,
) {
    let color = theme.token_color(token.kind);
    let glyph_style = Style::default().fg(Color::Black).bg(color).bold();
    if m.bordered {
        let (border_type, border_fg) = match highlight {
            Highlight::Selected => (BorderType::Double, Color::White),
            Highlight::Cursor => (BorderType::Thick, theme.title),
            Highlight::Hint => (BorderType::Plain, theme.main_fg),
            Highlight::None => (BorderType::Rounded, color),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(border_type)
            .border_style(Style::default().fg(border_fg).bg(theme.bg));
        let inner = block.inner(rect);
        block.render(rect, buf);
        Paragraph::new(Span::styled(token.kind.glyph().to_string(), glyph_style))
            .alignment(Alignment::Center)
            .style(Style::default().bg(color))
            .render(inner, buf);
    } else {
        let (left, right, style) = match highlight {
            Highlight::Selected => ('[', ']', glyph_style.fg(Color::White)),
            Highlight::Cursor => ('>', '<', glyph_style),
            Highlight::Hint => ('(', ')', glyph_style),
            Highlight::None => (' ', ' ', glyph_style),
        };
        let text = format!("{left}{}{right}", token.kind.glyph());
        buf.set_stringn(rect.x, rect.y, text, usize::from(rect.width), style);
    }
}

/// Buffer positions covered by the given board cells.
fn flash_buffer_positions(layout: &BoardLayout, cells: &[Coord]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &at in cells {
        let rect = layout.cell_rect(at);
        for by in rect.top()..rect.bottom() {
            for bx in rect.left()..rect.right() {
                set.insert((bx, by));
            }
        }
    }
    set
}

/// Create or advance the flash over cleared cells (TachyonFX fade from white).
fn apply_flash_effect<S: TokenSource>(
    frame: &mut Frame,
    state: &GameState<S>,
    layout: &BoardLayout,
    flash_effect: &mut Option<Effect>,
    flash_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let delta = flash_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *flash_process_time = Some(now);

    if flash_effect.is_none() {
        let cells = flash_buffer_positions(layout, &state.flash_cells);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            cells.contains(&(pos.x, pos.y))
        }));
        let effect = fx::fade_from(Color::White, Color::White, (FLASH_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(layout.board);
        *flash_effect = Some(effect);
    }

    if let Some(effect) = flash_effect {
        frame.render_effect(effect, layout.board, TfxDuration::from_millis(delta_ms));
    }
}

fn sidebar_block_style(theme: &Theme) -> Style {
    Style::default().fg(theme.div_line).bg(theme.bg)
}

fn draw_sidebar<S: TokenSource>(frame: &mut Frame, state: &GameState<S>, area: Rect) {
    let theme = &state.theme;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = sidebar_block_style(theme);
    let catalog = state.board.catalog();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Stats: score, level, time, swaps
            Constraint::Length(1),
            Constraint::Length(3), // Goal gauge
            Constraint::Length(1),
            Constraint::Length(catalog.len() as u16 + 3), // Legend
            Constraint::Length(1),
            Constraint::Length(3), // Status
        ])
        .split(area);
    let buf = frame.buffer_mut();

    // --- Stats ---
    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let stats_inner = stats_block.inner(chunks[0]);
    stats_block.render(chunks[0], buf);
    let secs = state.clock.seconds_left();
    let clock_style = if secs < CLOCK_WARNING_SECS {
        Style::default().fg(Color::Red).bold()
    } else {
        fg_style
    };
    let stats_lines = vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(format!("{}/{}", state.score, state.goal), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Level: ", title_style),
            Span::styled(state.level.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Time:  ", title_style),
            Span::styled(state.clock.label(), clock_style),
        ]),
        Line::from(vec![
            Span::styled("Swaps: ", title_style),
            Span::styled(state.swaps.to_string(), fg_style),
        ]),
    ];
    Paragraph::new(Text::from(stats_lines)).render(stats_inner, buf);

    // --- Goal ---
    let goal_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled("Goal", title_style));
    let goal_inner = goal_block.inner(chunks[2]);
    goal_block.render(chunks[2], buf);
    let ratio = if state.goal > 0 {
        (f64::from(state.score) / f64::from(state.goal)).min(1.0)
    } else {
        1.0
    };
    Gauge::default()
        .ratio(ratio)
        .label(format!("{:.0}%", ratio * 100.0))
        .gauge_style(Style::default().fg(theme.title).bg(theme.div_line))
        .render(goal_inner, buf);

    // --- Legend ---
    let legend_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled("Tokens", title_style));
    let legend_inner = legend_block.inner(chunks[4]);
    legend_block.render(chunks[4], buf);
    let mut legend: Vec<Line> = vec![Line::from(Span::styled(
        format!("{:<14}{:>5}", "", "pts"),
        Style::default().fg(theme.inactive_fg),
    ))];
    for token in catalog.tokens() {
        let color = theme.token_color(token.kind);
        legend.push(Line::from(vec![
            Span::styled(
                format!(" {} ", token.kind.glyph()),
                Style::default().fg(Color::Black).bg(color).bold(),
            ),
            Span::styled(format!(" {:<10}", token.kind.name()), fg_style),
            Span::styled(format!("{:>5}", token.score), fg_style),
        ]));
    }
    Paragraph::new(Text::from(legend)).render(legend_inner, buf);

    // --- Status ---
    let status_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled("Status", title_style));
    let status_inner = status_block.inner(chunks[6]);
    status_block.render(chunks[6], buf);
    let message = state.cue.map(|c| c.message()).unwrap_or("");
    Paragraph::new(Line::from(Span::styled(message, fg_style))).render(status_inner, buf);
}

/// Centered box of `width` x `height` with `lines` inside.
fn draw_overlay(frame: &mut Frame, theme: &Theme, area: Rect, width: u16, lines: Vec<Line>) {
    let height = lines.len() as u16 + 2;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    };
    Clear.render(popup, frame.buffer_mut());
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .style(Style::default().bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_pause_overlay<S: TokenSource>(frame: &mut Frame, state: &GameState<S>, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P  Resume    Q  Quit ",
            Style::default().fg(state.theme.main_fg),
        )),
    ];
    draw_overlay(frame, &state.theme, area, 28, lines);
}

fn draw_level_cleared_overlay<S: TokenSource>(frame: &mut Frame, state: &GameState<S>, area: Rect) {
    let fg = Style::default().fg(state.theme.main_fg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!(" Level {} cleared! ", state.level),
            Style::default().fg(Color::Black).bg(Color::Green).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {}/{} ", state.score, state.goal), fg)),
        Line::from(Span::styled(format!(" Time left: {} ", state.clock.label()), fg)),
        Line::from(""),
        Line::from(Span::styled(" N  Next level    Q  Quit ", fg)),
    ];
    draw_overlay(frame, &state.theme, area, 32, lines);
}

fn draw_time_up_overlay<S: TokenSource>(frame: &mut Frame, state: &GameState<S>, area: Rect) {
    let fg = Style::default().fg(state.theme.main_fg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Time's up! ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Level: {} ", state.level), fg)),
        Line::from(Span::styled(format!(" Score: {}/{} ", state.score, state.goal), fg)),
        Line::from(""),
        Line::from(Span::styled(" R  Restart    Q  Quit ", fg)),
    ];
    draw_overlay(frame, &state.theme, area, 32, lines);
}

pub fn draw_quit_menu<S: TokenSource>(frame: &mut Frame, state: &GameState<S>, selected: QuitOption) {
    let area = frame.area();
    let qw = 24;
    let qh = 8;
    let quit_rect = Rect {
        x: area.x + area.width.saturating_sub(qw) / 2,
        y: area.y + area.height.saturating_sub(qh) / 2,
        width: qw.min(area.width),
        height: qh.min(area.height),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(state.theme.title))
        .style(Style::default().bg(state.theme.bg))
        .title(" Quit? ");

    Clear.render(quit_rect, frame.buffer_mut());
    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::Restart, " Restart "),
        (QuitOption::Exit, " Exit "),
    ];

    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            Style::default()
                .fg(state.theme.bg)
                .bg(state.theme.title)
                .bold()
        } else {
            Style::default().fg(state.theme.title)
        };
        let rx = inner.x + (inner.width.saturating_sub(label.len() as u16)) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if ry < inner.y + inner.height {
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::rng::SeededSource;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn game() -> GameState {
        let config = GameConfig {
            seed: Some(3),
            ..GameConfig::default()
        };
        GameState::new(Theme::default(), &config, SeededSource::new(config.seed), Instant::now())
            .unwrap()
    }

    fn render(state: &GameState, width: u16, height: u16, screen: Screen) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|f| {
                draw(
                    f,
                    screen,
                    state,
                    QuitOption::Resume,
                    &mut None,
                    &mut None,
                    Instant::now(),
                    true,
                );
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_cell_metrics_fall_back_to_compact() {
        // 6x6 large: 32x20 board plus the sidebar.
        assert_eq!(cell_metrics(Rect::new(0, 0, 58, 20), 6, 6), LARGE_CELL);
        assert_eq!(cell_metrics(Rect::new(0, 0, 57, 20), 6, 6), COMPACT_CELL);
        assert_eq!(cell_metrics(Rect::new(0, 0, 58, 19), 6, 6), COMPACT_CELL);
        assert_eq!(cell_metrics(Rect::new(0, 0, 120, 30), 12, 12), COMPACT_CELL);
    }

    #[test]
    fn test_cell_rect_is_inside_board() {
        let state = game();
        let layout = BoardLayout::new(Rect::new(0, 0, 120, 40), &state);
        let first = layout.cell_rect(Coord::new(0, 0));
        let last = layout.cell_rect(Coord::new(5, 5));
        assert_eq!((first.x, first.y), (layout.board.x, layout.board.y));
        assert_eq!(first.width, LARGE_CELL.w);
        assert_eq!(last.right(), layout.board.right());
        assert_eq!(last.bottom(), layout.board.bottom());
    }

    #[test]
    fn test_renders_sidebar_and_glyphs() {
        let state = game();
        let screen = render(&state, 120, 40, Screen::Playing);
        assert!(screen.contains("Score: 0/100"));
        assert!(screen.contains("Level: 1"));
        assert!(screen.contains("Time:  02:00") || screen.contains("Time:  01:59"));
        let glyph = state.board.grid().token_at(Coord::new(0, 0)).unwrap().kind.glyph();
        assert!(screen.contains(glyph));
    }

    #[test]
    fn test_quit_menu_and_small_terminal() {
        let state = game();
        let screen = render(&state, 50, 20, Screen::QuitMenu);
        assert!(screen.contains("Resume"));
        assert!(screen.contains("Restart"));
    }
}
